use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_PATHS: [&str; 2] = ["configs/dashboard.toml", "../../configs/dashboard.toml"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub snapshot_path: PathBuf,
    pub tick: Duration,
    pub default_tile_size: (u32, u32),
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            tick: Duration::from_millis(default_tick_ms()),
            default_tile_size: (4, 3),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DashboardToml {
    #[serde(default)]
    snapshot_path: Option<PathBuf>,
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
    #[serde(default)]
    default_tile: Option<TileSizeToml>,
}

#[derive(Debug, Clone, Deserialize)]
struct TileSizeToml {
    w: u32,
    h: u32,
}

fn default_tick_ms() -> u64 {
    1000
}

/// `<data_local_dir>/mosaic/tiles.json`, or `./tiles.json` when the platform has no data dir.
pub fn default_snapshot_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("mosaic").join("tiles.json"))
        .unwrap_or_else(|| PathBuf::from("tiles.json"))
}

/// Try the common relative locations for `configs/dashboard.toml`.
pub fn read_dashboard_toml_text() -> Option<String> {
    CONFIG_PATHS
        .iter()
        .find_map(|p| fs::read_to_string(p).ok())
}

pub fn parse_dashboard_settings(text: &str) -> anyhow::Result<DashboardSettings> {
    let raw: DashboardToml = toml::from_str(text)
        .map_err(|e| anyhow::anyhow!("Failed to parse dashboard.toml: {e}"))?;
    if raw.tick_ms == 0 {
        anyhow::bail!("dashboard.tick_ms must be greater than zero");
    }
    let default_tile_size = match raw.default_tile {
        Some(TileSizeToml { w, h }) if w == 0 || h == 0 => {
            anyhow::bail!("default_tile size must be at least 1x1 (got {w}x{h})")
        }
        Some(TileSizeToml { w, h }) => (w, h),
        None => DashboardSettings::default().default_tile_size,
    };
    Ok(DashboardSettings {
        snapshot_path: raw.snapshot_path.unwrap_or_else(default_snapshot_path),
        tick: Duration::from_millis(raw.tick_ms),
        default_tile_size,
    })
}

/// Load settings from an explicit file.
pub fn load_dashboard_settings_from(path: &Path) -> anyhow::Result<DashboardSettings> {
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Could not read {}: {e}", path.display()))?;
    parse_dashboard_settings(&text)
}

/// Load settings from the usual locations, falling back to defaults when no file exists.
pub fn load_dashboard_settings() -> anyhow::Result<DashboardSettings> {
    match read_dashboard_toml_text() {
        Some(text) => parse_dashboard_settings(&text),
        None => Ok(DashboardSettings::default()),
    }
}
