use std::collections::HashMap;
use serde::{Deserialize, Serialize};

use crate::context::{DeviceType, PerformanceTier, TimeOfDay, UserContext};
use crate::themes::LayoutType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorTemperature {
    Warm,
    Cool,
    #[default]
    Neutral,
}

impl std::fmt::Display for ColorTemperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorTemperature::Warm => write!(f, "warm"),
            ColorTemperature::Cool => write!(f, "cool"),
            ColorTemperature::Neutral => write!(f, "neutral"),
        }
    }
}

/// Derived per-session preferences the selector scores against.
/// Recomputed fresh from a context snapshot; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationRules {
    pub theme_affinity: HashMap<String, f64>,
    pub layout_preference: Vec<LayoutType>,
    pub animation_intensity: f64,
    pub color_temperature: ColorTemperature,
    pub energy_level: u8,
}

impl Default for PersonalizationRules {
    fn default() -> Self {
        PersonalizationRules {
            theme_affinity: HashMap::new(),
            layout_preference: Vec::new(),
            animation_intensity: 1.0,
            color_temperature: ColorTemperature::Neutral,
            energy_level: 5,
        }
    }
}

impl PersonalizationRules {
    fn bump(&mut self, theme_id: &str, delta: f64) {
        *self.theme_affinity.entry(theme_id.to_string()).or_insert(0.0) += delta;
    }
}

/// Map a context snapshot to personalization rules.
///
/// Pure and total: any well-formed context produces rules, and the same
/// context always produces the same rules. Blocks run in a fixed,
/// documented order -- time of day, weather, device type, performance
/// tier, motion preference, visit history. Affinity adjustments are
/// additive; categorical fields are last-writer-wins in that order. The
/// order is a transcribed design choice, not a derived optimum.
pub fn derive_rules(context: &UserContext) -> PersonalizationRules {
    let mut rules = PersonalizationRules::default();

    apply_time_of_day(&mut rules, context.time_of_day);
    if let Some(weather) = &context.weather {
        apply_weather(&mut rules, &weather.condition);
    }
    apply_device_type(&mut rules, context.device.device_type);
    apply_performance_tier(&mut rules, context.device.tier);
    if context.device.reduced_motion {
        apply_reduced_motion(&mut rules);
    }
    apply_history(&mut rules, context);

    rules
}

fn apply_time_of_day(rules: &mut PersonalizationRules, time_of_day: TimeOfDay) {
    match time_of_day {
        TimeOfDay::Morning => {
            rules.color_temperature = ColorTemperature::Warm;
            rules.energy_level = 6;
            rules.bump("minimal-zen", 0.8);
            rules.bump("organic-forest", 0.7);
        }
        TimeOfDay::Afternoon => {
            rules.color_temperature = ColorTemperature::Neutral;
            rules.energy_level = 7;
            rules.animation_intensity = 1.1;
            rules.bump("chrome-horizon", 0.8);
            rules.bump("paper-press", 0.6);
        }
        TimeOfDay::Evening => {
            rules.color_temperature = ColorTemperature::Warm;
            rules.energy_level = 5;
            rules.animation_intensity = 0.9;
            rules.bump("sunset-atelier", 0.8);
            rules.bump("retro-arcade", 0.7);
        }
        TimeOfDay::Night => {
            rules.color_temperature = ColorTemperature::Cool;
            rules.energy_level = 8;
            rules.animation_intensity = 1.2;
            rules.bump("cyberpunk-matrix", 0.9);
            rules.bump("cosmic-space", 0.8);
            rules.bump("neon-city", 0.7);
        }
    }
}

fn apply_weather(rules: &mut PersonalizationRules, condition: &str) {
    match condition.to_lowercase().as_str() {
        "clear" => {
            rules.bump("organic-forest", 0.3);
            rules.color_temperature = ColorTemperature::Warm;
        }
        "rain" | "drizzle" => {
            rules.bump("minimal-zen", 0.4);
            rules.bump("paper-press", 0.2);
            rules.animation_intensity *= 0.9;
        }
        "snow" => {
            rules.bump("cosmic-space", 0.4);
            rules.color_temperature = ColorTemperature::Cool;
        }
        "thunderstorm" => {
            rules.bump("cyberpunk-matrix", 0.4);
            rules.animation_intensity *= 1.2;
        }
        "clouds" | "mist" | "fog" => {
            rules.bump("paper-press", 0.3);
        }
        _ => {}
    }
}

fn apply_device_type(rules: &mut PersonalizationRules, device_type: DeviceType) {
    match device_type {
        DeviceType::Mobile => {
            rules.layout_preference = vec![LayoutType::Centered, LayoutType::Flowing];
            rules.animation_intensity *= 0.7;
        }
        DeviceType::Tablet => {
            rules.layout_preference = vec![LayoutType::Centered, LayoutType::Grid];
            rules.animation_intensity *= 0.85;
        }
        DeviceType::Desktop => {
            rules.layout_preference =
                vec![LayoutType::Grid, LayoutType::Split, LayoutType::Asymmetric];
        }
    }
}

fn apply_performance_tier(rules: &mut PersonalizationRules, tier: PerformanceTier) {
    match tier {
        PerformanceTier::Low => {
            rules.animation_intensity *= 0.5;
            rules.bump("minimal-zen", 0.3);
            rules.bump("paper-press", 0.2);
        }
        PerformanceTier::High => {
            rules.bump("cyberpunk-matrix", 0.1);
            rules.bump("cosmic-space", 0.1);
        }
        PerformanceTier::Medium => {}
    }
}

fn apply_reduced_motion(rules: &mut PersonalizationRules) {
    rules.animation_intensity = 0.0;
    rules.bump("minimal-zen", 0.4);
    rules.energy_level = rules.energy_level.min(3);
}

/// Stored preference scores feed straight into affinity; recently shown
/// themes are penalized with a linear falloff by recency position.
fn apply_history(rules: &mut PersonalizationRules, context: &UserContext) {
    for (theme_id, score) in &context.history.preferences {
        rules.bump(theme_id, *score);
    }

    for (position, theme_id) in context.history.last_themes.iter().enumerate() {
        let penalty = 0.15 * (1.0 - position as f64 / 10.0);
        rules.bump(theme_id, -penalty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DeviceInfo, Weather};

    fn context(time_of_day: TimeOfDay) -> UserContext {
        UserContext::bare(time_of_day)
    }

    fn affinity(rules: &PersonalizationRules, id: &str) -> f64 {
        rules.theme_affinity.get(id).copied().unwrap_or(0.0)
    }

    #[test]
    fn test_defaults_survive_every_bucket_without_weather() {
        for bucket in [
            TimeOfDay::Morning,
            TimeOfDay::Afternoon,
            TimeOfDay::Evening,
            TimeOfDay::Night,
        ] {
            let rules = derive_rules(&context(bucket));
            assert!(!rules.theme_affinity.is_empty());
            assert!(!rules.layout_preference.is_empty());
        }
    }

    #[test]
    fn test_absent_optionals_contribute_nothing_beyond_time_block() {
        // No weather, default device, empty history: only the morning
        // block fires, scalars it does not touch keep their defaults.
        let rules = derive_rules(&context(TimeOfDay::Morning));
        assert_eq!(rules.theme_affinity.len(), 2);
        assert_eq!(rules.color_temperature, ColorTemperature::Warm);
        assert_eq!(rules.energy_level, 6);
        assert!((rules.animation_intensity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_idempotent_for_identical_context() {
        let ctx = context(TimeOfDay::Evening);
        assert_eq!(derive_rules(&ctx), derive_rules(&ctx));
    }

    #[test]
    fn test_morning_high_performance_desktop_scenario() {
        let mut ctx = context(TimeOfDay::Morning);
        ctx.device = DeviceInfo {
            device_type: DeviceType::Desktop,
            tier: PerformanceTier::High,
            reduced_motion: false,
            viewport_width: 1920,
            viewport_height: 1080,
        };

        let rules = derive_rules(&ctx);
        assert_eq!(rules.color_temperature, ColorTemperature::Warm);
        assert!((affinity(&rules, "minimal-zen") - 0.8).abs() < 1e-9);
        assert!((affinity(&rules, "organic-forest") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_night_mobile_no_weather_scenario() {
        let mut ctx = context(TimeOfDay::Night);
        ctx.device.device_type = DeviceType::Mobile;

        let rules = derive_rules(&ctx);
        assert!((affinity(&rules, "cyberpunk-matrix") - 0.9).abs() < 1e-9);
        assert!((affinity(&rules, "cosmic-space") - 0.8).abs() < 1e-9);
        assert!((affinity(&rules, "neon-city") - 0.7).abs() < 1e-9);
        assert_eq!(rules.theme_affinity.len(), 3);
        assert_eq!(
            rules.layout_preference,
            vec![LayoutType::Centered, LayoutType::Flowing]
        );
        // Night base 1.2 scaled by the mobile multiplier
        assert!((rules.animation_intensity - 1.2 * 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_weather_block_skipped_when_absent() {
        let without = derive_rules(&context(TimeOfDay::Night));

        let mut ctx = context(TimeOfDay::Night);
        ctx.weather = Some(Weather {
            condition: "Thunderstorm".to_string(),
            temperature: Some(14.0),
            description: None,
        });
        let with = derive_rules(&ctx);

        assert!(affinity(&with, "cyberpunk-matrix") > affinity(&without, "cyberpunk-matrix"));
        assert!((without.animation_intensity - 1.2).abs() < 1e-9);
        assert!((with.animation_intensity - 1.2 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_weather_condition_case_insensitive() {
        let mut ctx = context(TimeOfDay::Afternoon);
        ctx.weather = Some(Weather {
            condition: "CLEAR".to_string(),
            temperature: None,
            description: None,
        });
        let rules = derive_rules(&ctx);
        assert_eq!(rules.color_temperature, ColorTemperature::Warm);
        assert!((affinity(&rules, "organic-forest") - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_reduced_motion_zeroes_intensity_last() {
        let mut ctx = context(TimeOfDay::Night);
        ctx.device.device_type = DeviceType::Mobile;
        ctx.device.reduced_motion = true;

        let rules = derive_rules(&ctx);
        assert_eq!(rules.animation_intensity, 0.0);
        assert!(rules.energy_level <= 3);
        assert!((affinity(&rules, "minimal-zen") - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_stored_preferences_and_recency_flow_into_affinity() {
        let mut ctx = context(TimeOfDay::Morning);
        ctx.history.preferences.insert("neon-city".to_string(), 0.5);
        ctx.history.preferences.insert("minimal-zen".to_string(), -0.2);
        ctx.history.last_themes = vec!["organic-forest".to_string(), "neon-city".to_string()];

        let rules = derive_rules(&ctx);
        // neon-city: stored 0.5 minus recency penalty at position 1
        assert!((affinity(&rules, "neon-city") - (0.5 - 0.15 * 0.9)).abs() < 1e-9);
        // minimal-zen: morning 0.8 plus stored -0.2
        assert!((affinity(&rules, "minimal-zen") - 0.6).abs() < 1e-9);
        // organic-forest: morning 0.7 minus full recency penalty
        assert!((affinity(&rules, "organic-forest") - (0.7 - 0.15)).abs() < 1e-9);
    }
}
