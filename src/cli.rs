use std::path::PathBuf;
use anyhow::Result;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::context::{ContextCollector, UserContext};
use crate::morphing::{Activity, MorphingEngine};
use crate::preferences::{Feedback, PreferenceStore};
use crate::rules::derive_rules;
use crate::selector::{score_theme, select_theme};
use crate::themes::{catalog, style_for};

pub async fn handle_select(
    data_dir: Option<PathBuf>,
    offline: bool,
    format: String,
) -> Result<()> {
    let config = Config::new(data_dir)?;
    let mut store = PreferenceStore::new(&config);
    let collector = ContextCollector::new(&config);

    let context = if offline {
        collector.collect_offline(&store)
    } else {
        collector.collect(&store).await
    };

    let rules = derive_rules(&context);
    let themes = catalog();
    let selected = select_theme(&rules, &themes)?.clone();

    if let Err(e) = store.record_visit(&selected.id) {
        eprintln!("{} visit not recorded: {}", "warning:".yellow(), e);
    }

    match format.as_str() {
        "json" => {
            let payload = serde_json::json!({
                "theme": selected,
                "score": score_theme(&rules, &selected),
                "rules": rules,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        _ => {
            println!("{}: {} ({})", "Selected".cyan(), selected.name.green().bold(), selected.id);
            println!("  Category: {}", selected.category);
            println!("  Layout: {}", selected.layout);
            println!("  Mood: {} (energy {})", selected.personality.mood, selected.personality.energy);
            println!("  Accent: {}", selected.colors.accent);
            println!("  Score: {:.2}", score_theme(&rules, &selected));
            println!();
            println!("{}", "Rules snapshot:".cyan());
            println!("  Color temperature: {}", rules.color_temperature);
            println!("  Target energy: {}", rules.energy_level);
            println!("  Animation intensity: {:.2}", rules.animation_intensity);
        }
    }

    Ok(())
}

pub async fn handle_context(data_dir: Option<PathBuf>, offline: bool) -> Result<()> {
    let config = Config::new(data_dir)?;
    let store = PreferenceStore::new(&config);
    let collector = ContextCollector::new(&config);

    let context = if offline {
        collector.collect_offline(&store)
    } else {
        collector.collect(&store).await
    };

    print_context(&context);
    Ok(())
}

fn print_context(context: &UserContext) {
    println!("{}", "Context Snapshot".cyan().bold());
    println!("  Time of day: {}", context.time_of_day);
    println!(
        "  Device: {} ({} tier, {}x{})",
        context.device.device_type,
        context.device.tier,
        context.device.viewport_width,
        context.device.viewport_height
    );
    println!(
        "  Reduced motion: {}",
        if context.device.reduced_motion { "yes".yellow() } else { "no".normal() }
    );

    match &context.location {
        Some(location) => {
            let city = location.city.as_deref().unwrap_or("?");
            let country = location.country.as_deref().unwrap_or("?");
            let timezone = location.timezone.as_deref().unwrap_or("?");
            println!("  Location: {}, {} ({})", city, country, timezone);
        }
        None => println!("  Location: {}", "unavailable".yellow()),
    }

    match &context.weather {
        Some(weather) => {
            let temp = weather
                .temperature
                .map(|t| format!("{:.1}C", t))
                .unwrap_or_else(|| "?".to_string());
            println!("  Weather: {} ({})", weather.condition, temp);
        }
        None => println!("  Weather: {}", "unavailable".yellow()),
    }

    println!(
        "  Visits: {} (recent themes: {})",
        context.history.count,
        if context.history.last_themes.is_empty() {
            "none".to_string()
        } else {
            context.history.last_themes.join(", ")
        }
    );
}

pub fn handle_themes() -> Result<()> {
    let themes = catalog();
    println!("{} ({}):", "Theme Catalog".cyan().bold(), themes.len());
    for theme in &themes {
        let style = style_for(theme.category);
        println!(
            "  {} {} [{}] layout={} energy={} radius={}px",
            theme.id.green(),
            format!("({})", theme.name).normal(),
            theme.category,
            theme.layout,
            theme.personality.energy,
            style.border_radius_px
        );
    }
    Ok(())
}

pub fn handle_feedback(data_dir: Option<PathBuf>, theme_id: String, feedback: Feedback) -> Result<()> {
    let config = Config::new(data_dir)?;

    if !catalog().iter().any(|t| t.id == theme_id) {
        anyhow::bail!("unknown theme id: {}", theme_id);
    }

    let mut store = PreferenceStore::new(&config);
    match store.record_feedback(&theme_id, feedback) {
        Ok(score) => {
            let shown = format!("{:+.1}", score);
            let colored_score = if score >= 0.0 { shown.green() } else { shown.red() };
            println!("{} {} on {} (cumulative score {})", "Recorded".cyan(), feedback, theme_id, colored_score);
        }
        // Storage trouble is a warning, not a failure: the preference
        // layer is cosmetic.
        Err(e) => eprintln!("{} feedback not persisted: {}", "warning:".yellow(), e),
    }

    Ok(())
}

pub fn handle_history(data_dir: Option<PathBuf>) -> Result<()> {
    let config = Config::new(data_dir.clone())?;
    let store = PreferenceStore::new(&config);

    println!("{}", "Visit History".cyan().bold());
    println!("  Total visits: {}", store.visit_count());
    if let Some(last) = store.last_visit() {
        println!("  Last visit: {}", last.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    let recent = store.recent_themes();
    if recent.is_empty() {
        println!("  Recent themes: none");
    } else {
        println!("  Recent themes (newest first):");
        for (i, id) in recent.iter().enumerate() {
            println!("    {}. {}", i + 1, id);
        }
    }

    let mut scores: Vec<(&String, &f64)> = store.scores().iter().collect();
    scores.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    if !scores.is_empty() {
        println!("  Preference scores:");
        for (id, score) in scores {
            let shown = format!("{:+.1}", score);
            let colored_score = if *score >= 0.0 { shown.green() } else { shown.red() };
            println!("    {} {}", id, colored_score);
        }
    }

    let engine = MorphingEngine::new(&config);
    let events = engine.history();
    if !events.is_empty() {
        println!("  Morph transitions (last {}):", events.len().min(10));
        for event in events.iter().rev().take(10) {
            println!(
                "    {} {} -> {}",
                event.at.format("%H:%M:%S"),
                event.from.as_deref().unwrap_or("(none)"),
                event.to
            );
        }
    }

    Ok(())
}

pub async fn handle_morph(
    data_dir: Option<PathBuf>,
    interval: Option<u64>,
    idle: Option<u64>,
) -> Result<()> {
    let mut config = Config::new(data_dir)?;
    if let Some(interval) = interval {
        config.morph_interval_secs = interval;
    }
    if let Some(idle) = idle {
        config.idle_threshold_secs = idle;
    }

    println!(
        "{} every {}s after {}s idle. Lines: [enter]=activity, like/dislike, quit.",
        "Morphing".cyan().bold(),
        config.morph_interval_secs,
        config.idle_threshold_secs
    );

    let (tx, rx) = mpsc::channel(16);

    // stdin lines feed the idle watchdog; the reader task ends with the
    // loop because the receiver closes.
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let activity = match line.trim() {
                "quit" | "q" => Activity::Quit,
                "like" => Activity::Feedback(Feedback::Like),
                "dislike" => Activity::Feedback(Feedback::Dislike),
                _ => Activity::Input,
            };
            let quit = activity == Activity::Quit;
            if tx.send(activity).await.is_err() || quit {
                break;
            }
        }
    });

    let mut engine = MorphingEngine::new(&config);
    engine.run(rx).await?;

    println!("{}", "Morphing stopped.".cyan());
    Ok(())
}
