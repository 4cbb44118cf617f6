use std::{collections::HashMap, fs, time::Duration};

use shared::domain::DeviceClass;

/// Pacing and narration constants for one session. Chosen once from the
/// device class at initialization and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TourConfig {
    pub read_speed_wpm: u32,
    pub min_pause: Duration,
    pub max_pause: Duration,
    pub scroll_duration: Duration,
    pub post_scroll_settle: Duration,
    pub footer_scroll_duration: Duration,
    pub restart_settle: Duration,
    pub countdown_start: u32,
    pub highlight_floor: Duration,
    pub highlight_steps_per_word: u32,
    pub quick_menu_attention_delay: Duration,
    pub speech_language: String,
    pub speech_rate: f32,
}

impl TourConfig {
    pub fn for_device(device: DeviceClass) -> Self {
        let (wpm, min_pause, max_pause, scroll_duration) = match device {
            DeviceClass::Compact => (6, 2200, 8000, 1300),
            DeviceClass::Full => (7, 2100, 7500, 1250),
        };
        Self {
            read_speed_wpm: wpm,
            min_pause: Duration::from_millis(min_pause),
            max_pause: Duration::from_millis(max_pause),
            scroll_duration: Duration::from_millis(scroll_duration),
            post_scroll_settle: Duration::from_millis(300),
            footer_scroll_duration: Duration::from_millis(1200),
            restart_settle: Duration::from_millis(600),
            countdown_start: 5,
            highlight_floor: Duration::from_millis(60),
            highlight_steps_per_word: 18,
            quick_menu_attention_delay: Duration::from_millis(2000),
            speech_language: "id-ID".into(),
            speech_rate: 1.15,
        }
    }

    /// Cadence of the word-highlight timer: the per-word reading budget
    /// divided into fixed steps, never faster than the floor.
    pub fn highlight_interval(&self) -> Duration {
        let step_ms = 60_000 / u64::from(self.read_speed_wpm.max(1))
            / u64::from(self.highlight_steps_per_word.max(1));
        Duration::from_millis(step_ms).max(self.highlight_floor)
    }
}

/// Loads the device profile, then overlays `tour.toml` (flat key/value) and
/// `TOUR__*` environment variables. Unparsable values are ignored.
pub fn load_config(device: DeviceClass) -> TourConfig {
    let mut config = TourConfig::for_device(device);

    if let Ok(raw) = fs::read_to_string("tour.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            apply_overrides(&mut config, |key| file_cfg.get(key).cloned());
        }
    }

    apply_overrides(&mut config, |key| {
        std::env::var(format!("TOUR__{}", key.to_ascii_uppercase())).ok()
    });

    config
}

fn apply_overrides(config: &mut TourConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("read_speed_wpm").and_then(|v| v.parse().ok()) {
        config.read_speed_wpm = v;
    }
    if let Some(v) = lookup("min_pause_ms").and_then(|v| v.parse().ok()) {
        config.min_pause = Duration::from_millis(v);
    }
    if let Some(v) = lookup("max_pause_ms").and_then(|v| v.parse().ok()) {
        config.max_pause = Duration::from_millis(v);
    }
    if let Some(v) = lookup("scroll_duration_ms").and_then(|v| v.parse().ok()) {
        config.scroll_duration = Duration::from_millis(v);
    }
    if let Some(v) = lookup("countdown_start").and_then(|v| v.parse().ok()) {
        config.countdown_start = v;
    }
    if let Some(v) = lookup("speech_language") {
        config.speech_language = v;
    }
    if let Some(v) = lookup("speech_rate").and_then(|v| v.parse().ok()) {
        config.speech_rate = v;
    }
}
