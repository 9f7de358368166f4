use std::collections::HashMap;
use std::path::Path;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{Result, ThemeError};

/// Bump when any persisted shape changes; a mismatched file is reset to
/// defaults rather than migrated.
pub const SCHEMA_VERSION: u32 = 1;

/// Most recently shown theme ids, newest first, oldest evicted.
pub const RECENCY_CAP: usize = 10;

/// Score delta applied per like/dislike. Scores are unbounded in both
/// directions; a negative score suppresses future recommendation.
pub const FEEDBACK_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Like,
    Dislike,
    Neutral,
}

impl Feedback {
    pub fn delta(self) -> f64 {
        match self {
            Feedback::Like => FEEDBACK_STEP,
            Feedback::Dislike => -FEEDBACK_STEP,
            Feedback::Neutral => 0.0,
        }
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feedback::Like => write!(f, "like"),
            Feedback::Dislike => write!(f, "dislike"),
            Feedback::Neutral => write!(f, "neutral"),
        }
    }
}

impl std::str::FromStr for Feedback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "like" | "+" => Ok(Feedback::Like),
            "dislike" | "-" => Ok(Feedback::Dislike),
            "neutral" => Ok(Feedback::Neutral),
            _ => Err(anyhow!("Unknown feedback kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceScores {
    pub schema_version: u32,
    pub scores: HashMap<String, f64>,
}

impl Default for PreferenceScores {
    fn default() -> Self {
        PreferenceScores {
            schema_version: SCHEMA_VERSION,
            scores: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentThemes {
    pub schema_version: u32,
    pub themes: Vec<String>,
}

impl Default for RecentThemes {
    fn default() -> Self {
        RecentThemes {
            schema_version: SCHEMA_VERSION,
            themes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitLog {
    pub schema_version: u32,
    pub count: u32,
    pub last_visit: Option<DateTime<Utc>>,
}

impl Default for VisitLog {
    fn default() -> Self {
        VisitLog {
            schema_version: SCHEMA_VERSION,
            count: 0,
            last_visit: None,
        }
    }
}

/// Snapshot of the durable state handed to the context collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitHistory {
    pub count: u32,
    pub last_themes: Vec<String>,
    pub preferences: HashMap<String, f64>,
}

impl Default for VisitHistory {
    fn default() -> Self {
        VisitHistory {
            count: 0,
            last_themes: Vec::new(),
            preferences: HashMap::new(),
        }
    }
}

/// Durable like/dislike state, one JSON file per concern under the data
/// dir. Every mutation persists synchronously; last write wins.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    config: Config,
    scores: PreferenceScores,
    recent: RecentThemes,
    visits: VisitLog,
}

impl PreferenceStore {
    pub fn new(config: &Config) -> Self {
        let scores = load_versioned(&config.preferences_file(), |s: &PreferenceScores| s.schema_version);
        let recent = load_versioned(&config.recent_themes_file(), |r: &RecentThemes| r.schema_version);
        let visits = load_versioned(&config.visits_file(), |v: &VisitLog| v.schema_version);

        PreferenceStore {
            config: config.clone(),
            scores,
            recent,
            visits,
        }
    }

    /// Like: +0.1, dislike: -0.1, neutral: recency touch only.
    /// Returns the theme's cumulative score after the update.
    pub fn record_feedback(&mut self, theme_id: &str, feedback: Feedback) -> Result<f64> {
        let entry = self.scores.scores.entry(theme_id.to_string()).or_insert(0.0);
        *entry += feedback.delta();
        let new_score = *entry;

        self.touch_recency(theme_id);
        self.save()?;

        Ok(new_score)
    }

    /// Called once per selection: bumps the visit counter and records the
    /// shown theme as most recent.
    pub fn record_visit(&mut self, theme_id: &str) -> Result<()> {
        self.visits.count += 1;
        self.visits.last_visit = Some(Utc::now());
        self.touch_recency(theme_id);
        self.save()
    }

    fn touch_recency(&mut self, theme_id: &str) {
        self.recent.themes.retain(|id| id != theme_id);
        self.recent.themes.insert(0, theme_id.to_string());
        self.recent.themes.truncate(RECENCY_CAP);
    }

    pub fn history(&self) -> VisitHistory {
        VisitHistory {
            count: self.visits.count,
            last_themes: self.recent.themes.clone(),
            preferences: self.scores.scores.clone(),
        }
    }

    pub fn score_for(&self, theme_id: &str) -> f64 {
        self.scores.scores.get(theme_id).copied().unwrap_or(0.0)
    }

    pub fn scores(&self) -> &HashMap<String, f64> {
        &self.scores.scores
    }

    pub fn recent_themes(&self) -> &[String] {
        &self.recent.themes
    }

    pub fn visit_count(&self) -> u32 {
        self.visits.count
    }

    pub fn last_visit(&self) -> Option<DateTime<Utc>> {
        self.visits.last_visit
    }

    fn save(&self) -> Result<()> {
        save_json(&self.config.preferences_file(), &self.scores)?;
        save_json(&self.config.recent_themes_file(), &self.recent)?;
        save_json(&self.config.visits_file(), &self.visits)?;
        Ok(())
    }
}

/// Missing, unparsable, or version-mismatched files load as defaults;
/// corruption of cosmetic state is never worth failing over.
fn load_versioned<T>(path: &Path, version_of: fn(&T) -> u32) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return T::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::warn!("Failed to read {}: {}, using defaults", path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_str::<T>(&content) {
        Ok(value) if version_of(&value) == SCHEMA_VERSION => value,
        Ok(value) => {
            log::warn!(
                "{} has schema version {} (expected {}), resetting",
                path.display(),
                version_of(&value),
                SCHEMA_VERSION
            );
            T::default()
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
            T::default()
        }
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).map_err(|e| {
        log::warn!("Failed to write {}: {}", path.display(), e);
        ThemeError::Io(e)
    })
}
