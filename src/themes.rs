use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeCategory {
    Cyberpunk,
    Minimalist,
    Organic,
    Retro,
    Futuristic,
    Artistic,
    Other,
}

impl std::fmt::Display for ThemeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeCategory::Cyberpunk => write!(f, "cyberpunk"),
            ThemeCategory::Minimalist => write!(f, "minimalist"),
            ThemeCategory::Organic => write!(f, "organic"),
            ThemeCategory::Retro => write!(f, "retro"),
            ThemeCategory::Futuristic => write!(f, "futuristic"),
            ThemeCategory::Artistic => write!(f, "artistic"),
            ThemeCategory::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for ThemeCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cyberpunk" => Ok(ThemeCategory::Cyberpunk),
            "minimalist" => Ok(ThemeCategory::Minimalist),
            "organic" => Ok(ThemeCategory::Organic),
            "retro" => Ok(ThemeCategory::Retro),
            "futuristic" => Ok(ThemeCategory::Futuristic),
            "artistic" => Ok(ThemeCategory::Artistic),
            "other" => Ok(ThemeCategory::Other),
            _ => Err(anyhow!("Unknown theme category: {}", s)),
        }
    }
}

/// Categories that read as warm vs. cool. Used by the selector's
/// color-temperature bonus; the two sets are fixed and disjoint.
pub const WARM_CATEGORIES: [ThemeCategory; 3] = [
    ThemeCategory::Organic,
    ThemeCategory::Artistic,
    ThemeCategory::Retro,
];

pub const COOL_CATEGORIES: [ThemeCategory; 3] = [
    ThemeCategory::Cyberpunk,
    ThemeCategory::Futuristic,
    ThemeCategory::Minimalist,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutType {
    Grid,
    Centered,
    Flowing,
    Split,
    Asymmetric,
}

impl std::fmt::Display for LayoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutType::Grid => write!(f, "grid"),
            LayoutType::Centered => write!(f, "centered"),
            LayoutType::Flowing => write!(f, "flowing"),
            LayoutType::Split => write!(f, "split"),
            LayoutType::Asymmetric => write!(f, "asymmetric"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScheme {
    pub background: String,
    pub surface: String,
    pub text: String,
    pub accent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemePersonality {
    pub mood: String,
    /// 0 (still) to 10 (frantic)
    pub energy: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeVariant {
    pub id: String,
    pub name: String,
    pub category: ThemeCategory,
    pub colors: ColorScheme,
    pub layout: LayoutType,
    pub personality: ThemePersonality,
}

fn variant(
    id: &str,
    name: &str,
    category: ThemeCategory,
    layout: LayoutType,
    mood: &str,
    energy: u8,
    colors: [&str; 4],
) -> ThemeVariant {
    ThemeVariant {
        id: id.to_string(),
        name: name.to_string(),
        category,
        colors: ColorScheme {
            background: colors[0].to_string(),
            surface: colors[1].to_string(),
            text: colors[2].to_string(),
            accent: colors[3].to_string(),
        },
        layout,
        personality: ThemePersonality {
            mood: mood.to_string(),
            energy,
        },
    }
}

/// The fixed theme catalog. Variants are never created or destroyed at
/// runtime, and catalog order doubles as the selector's tie-break order.
pub fn catalog() -> Vec<ThemeVariant> {
    vec![
        variant(
            "minimal-zen", "Minimal Zen",
            ThemeCategory::Minimalist, LayoutType::Grid,
            "calm", 2,
            ["#fafafa", "#ffffff", "#1a1a1a", "#8a9a8a"],
        ),
        variant(
            "organic-forest", "Organic Forest",
            ThemeCategory::Organic, LayoutType::Flowing,
            "grounded", 4,
            ["#1d2b1f", "#2a3d2c", "#e8f0e4", "#7fb069"],
        ),
        variant(
            "cyberpunk-matrix", "Cyberpunk Matrix",
            ThemeCategory::Cyberpunk, LayoutType::Asymmetric,
            "electric", 9,
            ["#0a0e12", "#121a22", "#c8ffdb", "#00ff88"],
        ),
        variant(
            "cosmic-space", "Cosmic Space",
            ThemeCategory::Futuristic, LayoutType::Centered,
            "vast", 7,
            ["#060614", "#10102a", "#dcdcf5", "#7b6cff"],
        ),
        variant(
            "neon-city", "Neon City",
            ThemeCategory::Cyberpunk, LayoutType::Split,
            "vivid", 8,
            ["#10030f", "#1e0a1e", "#ffe6fb", "#ff2ea6"],
        ),
        variant(
            "chrome-horizon", "Chrome Horizon",
            ThemeCategory::Futuristic, LayoutType::Grid,
            "sleek", 6,
            ["#101418", "#1c2228", "#e6ebf0", "#5ac8fa"],
        ),
        variant(
            "paper-press", "Paper Press",
            ThemeCategory::Minimalist, LayoutType::Centered,
            "quiet", 3,
            ["#f5f1e8", "#fdfbf5", "#2b2b2b", "#b5543a"],
        ),
        variant(
            "sunset-atelier", "Sunset Atelier",
            ThemeCategory::Artistic, LayoutType::Asymmetric,
            "expressive", 6,
            ["#2b1a26", "#3d2435", "#ffe9d6", "#ff9e5e"],
        ),
        variant(
            "retro-arcade", "Retro Arcade",
            ThemeCategory::Retro, LayoutType::Split,
            "playful", 8,
            ["#1a1033", "#2a1a4a", "#fff0c8", "#ffcc00"],
        ),
        variant(
            "gallery-noir", "Gallery Noir",
            ThemeCategory::Other, LayoutType::Centered,
            "moody", 5,
            ["#141414", "#1f1f1f", "#eaeaea", "#9a8866"],
        ),
    ]
}

/// Per-category presentation defaults, looked up instead of re-matching
/// the category in every consumer.
#[derive(Debug, Clone, Serialize)]
pub struct StyleDescriptor {
    pub font_stack: &'static str,
    pub border_radius_px: u8,
    pub animation_curve: &'static str,
}

pub fn style_for(category: ThemeCategory) -> StyleDescriptor {
    match category {
        ThemeCategory::Cyberpunk => StyleDescriptor {
            font_stack: "'JetBrains Mono', monospace",
            border_radius_px: 0,
            animation_curve: "steps(8)",
        },
        ThemeCategory::Minimalist => StyleDescriptor {
            font_stack: "'Inter', sans-serif",
            border_radius_px: 4,
            animation_curve: "ease-out",
        },
        ThemeCategory::Organic => StyleDescriptor {
            font_stack: "'Lora', serif",
            border_radius_px: 16,
            animation_curve: "ease-in-out",
        },
        ThemeCategory::Retro => StyleDescriptor {
            font_stack: "'Press Start 2P', monospace",
            border_radius_px: 2,
            animation_curve: "steps(4)",
        },
        ThemeCategory::Futuristic => StyleDescriptor {
            font_stack: "'Orbitron', sans-serif",
            border_radius_px: 8,
            animation_curve: "cubic-bezier(0.16, 1, 0.3, 1)",
        },
        ThemeCategory::Artistic => StyleDescriptor {
            font_stack: "'Playfair Display', serif",
            border_radius_px: 12,
            animation_curve: "ease",
        },
        ThemeCategory::Other => StyleDescriptor {
            font_stack: "system-ui, sans-serif",
            border_radius_px: 6,
            animation_curve: "ease",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_unique() {
        let themes = catalog();
        let ids: HashSet<_> = themes.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), themes.len());
    }

    #[test]
    fn test_catalog_contains_rule_targets() {
        let themes = catalog();
        for id in [
            "minimal-zen",
            "organic-forest",
            "cyberpunk-matrix",
            "cosmic-space",
            "neon-city",
            "chrome-horizon",
            "paper-press",
            "sunset-atelier",
            "retro-arcade",
        ] {
            assert!(themes.iter().any(|t| t.id == id), "missing {}", id);
        }
    }

    #[test]
    fn test_every_category_represented_and_styled() {
        let themes = catalog();
        for category in [
            ThemeCategory::Cyberpunk,
            ThemeCategory::Minimalist,
            ThemeCategory::Organic,
            ThemeCategory::Retro,
            ThemeCategory::Futuristic,
            ThemeCategory::Artistic,
            ThemeCategory::Other,
        ] {
            assert!(themes.iter().any(|t| t.category == category));
            assert!(!style_for(category).font_stack.is_empty());
        }
    }

    #[test]
    fn test_energy_levels_in_range() {
        for theme in catalog() {
            assert!(theme.personality.energy <= 10);
        }
    }

    #[test]
    fn test_category_round_trip() {
        for category in WARM_CATEGORIES.iter().chain(COOL_CATEGORIES.iter()) {
            let parsed: ThemeCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, *category);
        }
    }
}
