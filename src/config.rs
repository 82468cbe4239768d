use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use log::{info, warn};

use crate::game::timing_windows::{JudgePreset, JudgeWindows};

pub const CONFIG_PATH: &str = "beatline.ini";

// --- Minimal INI reader ---
#[derive(Debug, Default)]
pub struct SimpleIni {
    sections: HashMap<String, HashMap<String, String>>,
}

impl SimpleIni {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        self.sections.clear();

        let mut current_section: Option<String> = None;

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            // Section header: [SectionName]
            if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
                let name = &line[1..line.len() - 1];
                let section = name.trim().to_string();
                current_section = Some(section.clone());
                self.sections.entry(section).or_default();
                continue;
            }

            // Key/value pair: key=value
            if let Some(eq_idx) = line.find('=') {
                let (key_raw, value_raw) = line.split_at(eq_idx);
                let key = key_raw.trim();
                if key.is_empty() {
                    continue;
                }
                // Skip '=' and trim whitespace from the value.
                let value = value_raw[1..].trim().to_string();
                let section = current_section.clone().unwrap_or_default();
                self.sections
                    .entry(section)
                    .or_default()
                    .insert(key.to_string(), value);
            }
        }

        Ok(())
    }

    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.sections.get(section).and_then(|s| s.get(key)).cloned()
    }
}

/// Engine configuration, loaded once and passed into constructors. There is
/// deliberately no global instance: whoever builds a session owns the value
/// it was built with.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub windows: JudgeWindows,
    /// Milliseconds subtracted from every measured input offset to
    /// compensate for systematic input/audio latency.
    pub calibration_offset_ms: f64,
    /// 0..=100, mapped to the audio contract's 0..=1 volume.
    pub master_volume: u8,
    pub time_scale: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            windows: JudgeWindows::default(),
            calibration_offset_ms: 0.0,
            master_volume: 90,
            time_scale: 1.0,
        }
    }
}

// --- File I/O ---

fn create_default_config_file(path: &Path) -> Result<(), std::io::Error> {
    info!("'{}' not found, creating with default values.", path.display());
    let default = Config::default();

    let mut content = String::new();

    content.push_str("[Judge]\n");
    content.push_str(&format!("BestMs={}\n", default.windows.best_ms));
    content.push_str(&format!(
        "CalibrationOffsetMs={}\n",
        default.calibration_offset_ms
    ));
    content.push_str(&format!("CoolMs={}\n", default.windows.cool_ms));
    content.push_str(&format!("GoodMs={}\n", default.windows.good_ms));
    content.push_str(&format!("Preset={}\n", JudgePreset::Default.as_str()));
    content.push('\n');

    content.push_str("[Audio]\n");
    content.push_str(&format!("MasterVolume={}\n", default.master_volume));
    content.push('\n');

    content.push_str("[Gameplay]\n");
    content.push_str(&format!("TimeScale={}\n", default.time_scale));
    content.push('\n');

    std::fs::write(path, content)
}

/// Loads `beatline.ini` from the working directory.
pub fn load() -> Config {
    load_from(Path::new(CONFIG_PATH))
}

/// Loads a config file, creating it with defaults when missing. Malformed
/// values fall back to their defaults with a warning; an explicit window
/// triple only applies when it is ascending.
pub fn load_from(path: &Path) -> Config {
    if !path.exists()
        && let Err(e) = create_default_config_file(path)
    {
        warn!("Failed to create default config file: {e}");
    }

    let mut conf = SimpleIni::new();
    if let Err(e) = conf.load(path) {
        warn!("Failed to load '{}': {e}. Using default values.", path.display());
        return Config::default();
    }

    let default = Config::default();
    let mut cfg = default;

    cfg.windows = conf
        .get("Judge", "Preset")
        .and_then(|v| JudgePreset::from_str(&v).ok())
        .map_or(default.windows, JudgePreset::windows);
    let explicit = (
        conf.get("Judge", "BestMs").and_then(|v| v.parse::<f64>().ok()),
        conf.get("Judge", "CoolMs").and_then(|v| v.parse::<f64>().ok()),
        conf.get("Judge", "GoodMs").and_then(|v| v.parse::<f64>().ok()),
    );
    if let (Some(best), Some(cool), Some(good)) = explicit {
        match JudgeWindows::custom(best, cool, good) {
            Some(windows) => cfg.windows = windows,
            None => warn!("ignoring non-ascending window set {best}/{cool}/{good}"),
        }
    }
    cfg.calibration_offset_ms = conf
        .get("Judge", "CalibrationOffsetMs")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default.calibration_offset_ms);
    cfg.master_volume = conf
        .get("Audio", "MasterVolume")
        .and_then(|v| v.parse::<u8>().ok())
        .map_or(default.master_volume, |v| v.clamp(0, 100));
    cfg.time_scale = conf
        .get("Gameplay", "TimeScale")
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default.time_scale);

    info!("Configuration loaded from '{}'.", path.display());
    cfg
}
