use crate::error::{Result, ThemeError};
use crate::rules::{ColorTemperature, PersonalizationRules};
use crate::themes::{ThemeVariant, COOL_CATEGORIES, WARM_CATEGORIES};

const LAYOUT_BONUS: f64 = 0.3;
const ENERGY_BONUS: f64 = 0.2;
const TEMPERATURE_BONUS: f64 = 0.2;

/// Weighted score for one catalog entry: raw affinity (0 when unlisted),
/// a layout-match bonus, an energy-proximity bonus with linear falloff
/// (full credit at distance 0, none at distance >= 10), and a
/// color-temperature bonus when the category sits in the matching set.
pub fn score_theme(rules: &PersonalizationRules, theme: &ThemeVariant) -> f64 {
    let mut score = rules
        .theme_affinity
        .get(&theme.id)
        .copied()
        .unwrap_or(0.0);

    if rules.layout_preference.contains(&theme.layout) {
        score += LAYOUT_BONUS;
    }

    let distance = (theme.personality.energy as f64 - rules.energy_level as f64).abs();
    score += ENERGY_BONUS * (1.0 - distance / 10.0).max(0.0);

    let matches_temperature = match rules.color_temperature {
        ColorTemperature::Warm => WARM_CATEGORIES.contains(&theme.category),
        ColorTemperature::Cool => COOL_CATEGORIES.contains(&theme.category),
        ColorTemperature::Neutral => false,
    };
    if matches_temperature {
        score += TEMPERATURE_BONUS;
    }

    score
}

/// Pick the highest-scoring variant. Ties break toward catalog order:
/// the first variant with the maximal score wins, which keeps selection
/// deterministic for identical rules.
pub fn select_theme<'a>(
    rules: &PersonalizationRules,
    catalog: &'a [ThemeVariant],
) -> Result<&'a ThemeVariant> {
    let mut best: Option<(&ThemeVariant, f64)> = None;

    for theme in catalog {
        let score = score_theme(rules, theme);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((theme, score)),
        }
    }

    best.map(|(theme, _)| theme).ok_or(ThemeError::EmptyCatalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DeviceInfo, DeviceType, PerformanceTier, TimeOfDay, UserContext};
    use crate::rules::derive_rules;
    use crate::themes::{catalog, LayoutType, ThemeCategory};

    fn pick_id(rules: &PersonalizationRules, themes: &[ThemeVariant]) -> String {
        select_theme(rules, themes).unwrap().id.clone()
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let rules = PersonalizationRules::default();
        assert!(matches!(
            select_theme(&rules, &[]),
            Err(ThemeError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_selection_is_member_with_maximal_score() {
        let themes = catalog();
        for bucket in [
            TimeOfDay::Morning,
            TimeOfDay::Afternoon,
            TimeOfDay::Evening,
            TimeOfDay::Night,
        ] {
            let rules = derive_rules(&UserContext::bare(bucket));
            let selected = select_theme(&rules, &themes).unwrap();
            let selected_score = score_theme(&rules, selected);

            assert!(themes.iter().any(|t| t.id == selected.id));
            for theme in &themes {
                assert!(
                    selected_score >= score_theme(&rules, theme),
                    "{} outscored selection in {:?}",
                    theme.id,
                    bucket
                );
            }
        }
    }

    #[test]
    fn test_tie_breaks_to_first_in_catalog_order() {
        // Identical variants except id: every score component is equal.
        let themes = catalog();
        let mut first = themes[0].clone();
        let mut second = themes[0].clone();
        first.id = "tie-a".to_string();
        second.id = "tie-b".to_string();

        let rules = PersonalizationRules::default();
        assert_eq!(pick_id(&rules, &[first, second]), "tie-a");
    }

    #[test]
    fn test_unlisted_theme_scores_zero_affinity() {
        let themes = catalog();
        let gallery = themes.iter().find(|t| t.id == "gallery-noir").unwrap();
        let rules = PersonalizationRules::default();
        // No affinity, no layout preference, neutral temperature: only the
        // energy term remains.
        let expected = 0.2 * (1.0 - (5.0f64 - 5.0).abs() / 10.0);
        assert!((score_theme(&rules, gallery) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_morning_scenario_picks_minimal_zen() {
        let mut ctx = UserContext::bare(TimeOfDay::Morning);
        ctx.device = DeviceInfo {
            device_type: DeviceType::Desktop,
            tier: PerformanceTier::High,
            reduced_motion: false,
            viewport_width: 1920,
            viewport_height: 1080,
        };
        let rules = derive_rules(&ctx);

        let themes = catalog();
        let trimmed: Vec<ThemeVariant> = themes
            .iter()
            .filter(|t| ["minimal-zen", "organic-forest", "gallery-noir"].contains(&t.id.as_str()))
            .cloned()
            .collect();
        assert_eq!(trimmed.len(), 3);
        assert_eq!(pick_id(&rules, &trimmed), "minimal-zen");
    }

    #[test]
    fn test_layout_and_temperature_bonuses_apply() {
        let themes = catalog();
        let forest = themes.iter().find(|t| t.id == "organic-forest").unwrap();

        let mut rules = PersonalizationRules::default();
        let base = score_theme(&rules, forest);

        rules.layout_preference = vec![LayoutType::Flowing];
        let with_layout = score_theme(&rules, forest);
        assert!((with_layout - base - 0.3).abs() < 1e-9);

        rules.color_temperature = ColorTemperature::Warm;
        assert_eq!(forest.category, ThemeCategory::Organic);
        let with_temperature = score_theme(&rules, forest);
        assert!((with_temperature - with_layout - 0.2).abs() < 1e-9);
    }
}
