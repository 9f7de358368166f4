use chrono::{Local, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::enrichment::EnrichmentClient;
use crate::preferences::{PreferenceStore, VisitHistory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeOfDay::Morning => write!(f, "morning"),
            TimeOfDay::Afternoon => write!(f, "afternoon"),
            TimeOfDay::Evening => write!(f, "evening"),
            TimeOfDay::Night => write!(f, "night"),
        }
    }
}

/// Bucket a wall-clock hour: morning 5-11, afternoon 12-16, evening
/// 17-20, night 21-4.
pub fn time_of_day(hour: u32) -> TimeOfDay {
    match hour {
        5..=11 => TimeOfDay::Morning,
        12..=16 => TimeOfDay::Afternoon,
        17..=20 => TimeOfDay::Evening,
        _ => TimeOfDay::Night,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Mobile => write!(f, "mobile"),
            DeviceType::Tablet => write!(f, "tablet"),
            DeviceType::Desktop => write!(f, "desktop"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceTier::Low => write!(f, "low"),
            PerformanceTier::Medium => write!(f, "medium"),
            PerformanceTier::High => write!(f, "high"),
        }
    }
}

pub fn classify_device(viewport_width: u32) -> DeviceType {
    if viewport_width < 640 {
        DeviceType::Mobile
    } else if viewport_width < 1024 {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

/// High needs >= 8 GiB on a non-mobile device; low is <= 2 GiB or a slow
/// network hint; everything else (including no signal at all) is medium.
pub fn classify_tier(
    memory_gb: Option<f64>,
    device: DeviceType,
    slow_network: bool,
) -> PerformanceTier {
    if slow_network {
        return PerformanceTier::Low;
    }
    match memory_gb {
        Some(gb) if gb <= 2.0 => PerformanceTier::Low,
        Some(gb) if gb >= 8.0 && device != DeviceType::Mobile => PerformanceTier::High,
        _ => PerformanceTier::Medium,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: DeviceType,
    pub tier: PerformanceTier,
    pub reduced_motion: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        DeviceInfo {
            device_type: DeviceType::Desktop,
            tier: PerformanceTier::Medium,
            reduced_motion: false,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub condition: String,
    pub temperature: Option<f64>,
    pub description: Option<String>,
}

/// One immutable snapshot of every signal the rule engine consumes.
/// Optional fields stay `None` when their probe fails; nothing here can
/// fail collection as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub time_of_day: TimeOfDay,
    pub device: DeviceInfo,
    pub location: Option<Location>,
    pub weather: Option<Weather>,
    pub history: VisitHistory,
    pub collected_at: chrono::DateTime<Utc>,
}

impl UserContext {
    /// A context with every optional signal absent and default device
    /// characteristics, pinned to the given bucket.
    pub fn bare(time_of_day: TimeOfDay) -> Self {
        UserContext {
            time_of_day,
            device: DeviceInfo::default(),
            location: None,
            weather: None,
            history: VisitHistory::default(),
            collected_at: Utc::now(),
        }
    }
}

pub struct ContextCollector {
    config: Config,
}

impl ContextCollector {
    pub fn new(config: &Config) -> Self {
        ContextCollector {
            config: config.clone(),
        }
    }

    /// Snapshot from purely local signals: clock, device probes, stored
    /// history. Never touches the network.
    pub fn collect_offline(&self, store: &PreferenceStore) -> UserContext {
        UserContext {
            time_of_day: time_of_day(Local::now().hour()),
            device: probe_device(),
            location: None,
            weather: None,
            history: store.history(),
            collected_at: Utc::now(),
        }
    }

    /// Offline snapshot plus best-effort geolocation and weather. Each
    /// call runs under the configured timeout; any failure leaves the
    /// field absent. A slow lookup can delay this call by at most the
    /// timeout, never fail it.
    pub async fn collect(&self, store: &PreferenceStore) -> UserContext {
        let mut context = self.collect_offline(store);
        let client = EnrichmentClient::new(&self.config);

        match client.fetch_location().await {
            Ok(location) => {
                // Re-bucket the hour in the reported zone when it parses.
                if let Some(tz_name) = location.timezone.as_deref() {
                    if let Ok(tz) = tz_name.parse::<Tz>() {
                        context.time_of_day = time_of_day(Utc::now().with_timezone(&tz).hour());
                    }
                }

                if let (Some(lat), Some(lon)) = (location.lat, location.lon) {
                    match client.fetch_weather(lat, lon).await {
                        Ok(weather) => context.weather = Some(weather),
                        Err(e) => log::debug!("weather lookup skipped: {}", e),
                    }
                }

                context.location = Some(location);
            }
            Err(e) => log::debug!("geolocation lookup skipped: {}", e),
        }

        context
    }
}

fn probe_device() -> DeviceInfo {
    let (viewport_width, viewport_height) = probe_viewport();
    let device_type = classify_device(viewport_width);
    let tier = classify_tier(probe_memory_gb(), device_type, probe_slow_network());

    DeviceInfo {
        device_type,
        tier,
        reduced_motion: probe_reduced_motion(),
        viewport_width,
        viewport_height,
    }
}

/// Explicit `AITHEME_VIEWPORT=WxH` override, else an approximation from
/// the terminal cell grid, else the desktop default.
fn probe_viewport() -> (u32, u32) {
    if let Ok(spec) = std::env::var("AITHEME_VIEWPORT") {
        if let Some((w, h)) = spec.split_once('x') {
            if let (Ok(w), Ok(h)) = (w.trim().parse(), h.trim().parse()) {
                return (w, h);
            }
        }
        log::warn!("Ignoring malformed AITHEME_VIEWPORT '{}'", spec);
    }

    let cols = std::env::var("COLUMNS").ok().and_then(|v| v.parse::<u32>().ok());
    let lines = std::env::var("LINES").ok().and_then(|v| v.parse::<u32>().ok());
    if let (Some(cols), Some(lines)) = (cols, lines) {
        // Rough CSS-pixel estimate from cell counts.
        return (cols * 8, lines * 16);
    }

    let default = DeviceInfo::default();
    (default.viewport_width, default.viewport_height)
}

fn probe_memory_gb() -> Option<f64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kb: f64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb / (1024.0 * 1024.0))
}

fn probe_slow_network() -> bool {
    matches!(
        std::env::var("AITHEME_NETWORK").as_deref(),
        Ok("slow-2g") | Ok("2g") | Ok("3g")
    )
}

fn probe_reduced_motion() -> bool {
    matches!(
        std::env::var("AITHEME_REDUCED_MOTION").as_deref(),
        Ok("1") | Ok("true")
    )
}
