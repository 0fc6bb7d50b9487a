use serde::Deserialize;

/// Configuration of the periodic statistics sweep.
#[derive(Debug, Deserialize, Clone)]
pub struct StatisticsConfig {
    /// Whether the background sweep runs. Default: true.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Seconds between sweeps. Default: 3600.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// IANA time zone used for date, weekday and hour buckets.
    /// Default: "America/New_York".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// How many days of history feed the heatmaps. 0 means all history.
    #[serde(default)]
    pub heatmap_lookback_days: u32,
}

fn default_enabled() -> bool {
    true
}
fn default_interval_secs() -> u64 {
    3600
}
fn default_timezone() -> String {
    "America/New_York".into()
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval_secs(),
            timezone: default_timezone(),
            heatmap_lookback_days: 0,
        }
    }
}
