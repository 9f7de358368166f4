use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::context::ContextCollector;
use crate::error::Result;
use crate::preferences::{Feedback, PreferenceStore, SCHEMA_VERSION};
use crate::rules::derive_rules;
use crate::selector::select_theme;
use crate::themes::{catalog, ThemeVariant};

const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphEvent {
    pub id: String,
    pub at: DateTime<Utc>,
    pub from: Option<String>,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphHistory {
    pub schema_version: u32,
    pub events: Vec<MorphEvent>,
}

impl Default for MorphHistory {
    fn default() -> Self {
        MorphHistory {
            schema_version: SCHEMA_VERSION,
            events: Vec::new(),
        }
    }
}

/// User-facing events fed into the morphing loop. Any `Input` counts as
/// activity and resets the idle watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Input,
    Feedback(Feedback),
    Quit,
}

/// Resettable idle timer: morphing stays suspended while the user is
/// active and resumes once the threshold elapses untouched.
#[derive(Debug, Clone, Copy)]
pub struct IdleWatchdog {
    last_activity: Instant,
    threshold: Duration,
}

impl IdleWatchdog {
    pub fn new(threshold: Duration) -> Self {
        IdleWatchdog {
            last_activity: Instant::now(),
            threshold,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle_at(&self, now: Instant) -> bool {
        now.duration_since(self.last_activity) >= self.threshold
    }

    pub fn is_idle(&self) -> bool {
        self.is_idle_at(Instant::now())
    }
}

/// Periodically re-selects a theme from a fresh offline context while the
/// user is idle, keeping a capped, persisted trail of transitions.
pub struct MorphingEngine {
    config: Config,
    collector: ContextCollector,
    store: PreferenceStore,
    themes: Vec<ThemeVariant>,
    current: Option<String>,
    history: MorphHistory,
}

impl MorphingEngine {
    pub fn new(config: &Config) -> Self {
        let history = load_history(config);
        MorphingEngine {
            config: config.clone(),
            collector: ContextCollector::new(config),
            store: PreferenceStore::new(config),
            themes: catalog(),
            current: None,
            history,
        }
    }

    pub fn current_theme(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn history(&self) -> &[MorphEvent] {
        &self.history.events
    }

    /// One morph step: re-collect, re-derive, re-select. Returns the
    /// transition when the selection changed, `None` when it held.
    pub fn morph_once(&mut self) -> Result<Option<MorphEvent>> {
        let context = self.collector.collect_offline(&self.store);
        let rules = derive_rules(&context);
        let selected = select_theme(&rules, &self.themes)?;

        if self.current.as_deref() == Some(selected.id.as_str()) {
            return Ok(None);
        }

        let event = MorphEvent {
            id: uuid::Uuid::new_v4().to_string(),
            at: Utc::now(),
            from: self.current.clone(),
            to: selected.id.clone(),
        };

        self.current = Some(selected.id.clone());
        self.store.record_visit(&selected.id)?;

        self.history.events.push(event.clone());
        if self.history.events.len() > MAX_HISTORY {
            let overflow = self.history.events.len() - MAX_HISTORY;
            self.history.events.drain(..overflow);
        }
        self.save_history()?;

        Ok(Some(event))
    }

    /// Drive the loop until `Activity::Quit` or the activity channel
    /// closes. Ticks only morph once the watchdog reports idle.
    pub async fn run(&mut self, mut activity: mpsc::Receiver<Activity>) -> Result<()> {
        let mut watchdog = IdleWatchdog::new(Duration::from_secs(self.config.idle_threshold_secs));
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.config.morph_interval_secs.max(1)));
        // The first tick fires immediately; skip it so the idle gate is
        // measured from startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !watchdog.is_idle() {
                        continue;
                    }
                    match self.morph_once() {
                        Ok(Some(event)) => {
                            let from = event.from.as_deref().unwrap_or("(none)");
                            println!(
                                "{} {} -> {}",
                                "morph:".magenta(),
                                from,
                                event.to.green()
                            );
                        }
                        Ok(None) => {}
                        Err(e) => log::warn!("morph step failed: {}", e),
                    }
                }
                msg = activity.recv() => {
                    match msg {
                        Some(Activity::Input) => watchdog.touch(),
                        Some(Activity::Feedback(feedback)) => {
                            watchdog.touch();
                            if let Some(theme_id) = self.current.clone() {
                                match self.store.record_feedback(&theme_id, feedback) {
                                    Ok(score) => println!(
                                        "{} {} on {} (score {:+.1})",
                                        "noted".cyan(), feedback, theme_id, score
                                    ),
                                    Err(e) => log::warn!("feedback not persisted: {}", e),
                                }
                            } else {
                                println!("{}", "no theme shown yet".yellow());
                            }
                        }
                        Some(Activity::Quit) | None => break,
                    }
                }
            }
        }

        Ok(())
    }

    fn save_history(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.history)?;
        std::fs::write(self.config.morph_history_file(), content)?;
        Ok(())
    }
}

fn load_history(config: &Config) -> MorphHistory {
    let path = config.morph_history_file();
    if !path.exists() {
        return MorphHistory::default();
    }
    match std::fs::read_to_string(&path)
        .ok()
        .and_then(|content| serde_json::from_str::<MorphHistory>(&content).ok())
    {
        Some(history) if history.schema_version == SCHEMA_VERSION => history,
        _ => {
            log::warn!("{} unreadable or outdated, resetting", path.display());
            MorphHistory::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchdog_idle_after_threshold() {
        let watchdog = IdleWatchdog::new(Duration::from_secs(10));
        let now = watchdog.last_activity;
        assert!(!watchdog.is_idle_at(now + Duration::from_secs(9)));
        assert!(watchdog.is_idle_at(now + Duration::from_secs(10)));
    }

    #[test]
    fn test_watchdog_touch_resets_idle() {
        let mut watchdog = IdleWatchdog::new(Duration::from_millis(0));
        assert!(watchdog.is_idle());
        watchdog.threshold = Duration::from_secs(60);
        watchdog.touch();
        assert!(!watchdog.is_idle());
    }

    #[test]
    fn test_morph_once_records_transitions() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        let mut engine = MorphingEngine::new(&config);

        let first = engine.morph_once().unwrap().expect("first morph always transitions");
        let shown = engine.current_theme().unwrap().to_string();
        assert_eq!(first.to, shown);
        assert!(first.from.is_none());
        assert_eq!(engine.history().len(), 1);

        // The recency penalty may rotate the selection; either way the
        // event trail must match the current theme.
        match engine.morph_once().unwrap() {
            Some(event) => {
                assert_eq!(event.from.as_deref(), Some(shown.as_str()));
                assert_eq!(Some(event.to.as_str()), engine.current_theme());
                assert_eq!(engine.history().len(), 2);
            }
            None => {
                assert_eq!(engine.current_theme(), Some(shown.as_str()));
                assert_eq!(engine.history().len(), 1);
            }
        }
    }

    #[test]
    fn test_history_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(Some(dir.path().to_path_buf())).unwrap();
        {
            let mut engine = MorphingEngine::new(&config);
            engine.morph_once().unwrap();
        }
        let engine = MorphingEngine::new(&config);
        assert_eq!(engine.history().len(), 1);
    }
}
