use serde::Deserialize;
use serde::Serialize;

use crate::config::SoundConfig;

pub const MAX_VOLUME: u8 = 100;

/// Feedback cue vocabulary. Playback is best effort and never fed back
/// into shell state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    Click,
    Enable,
    Error,
    Success,
    Notification,
}

impl Cue {
    pub fn label(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Enable => "enable",
            Self::Error => "error",
            Self::Success => "success",
            Self::Notification => "notification",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoundSettings {
    /// Whether the persona page emits cues at all.
    pub available: bool,
    pub enabled: bool,
    pub volume: u8,
}

impl SoundSettings {
    pub fn new(available: bool, config: &SoundConfig) -> Self {
        Self {
            available,
            enabled: config.enabled.unwrap_or(true),
            volume: config.volume.min(MAX_VOLUME),
        }
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(MAX_VOLUME);
    }

    pub fn audible(&self) -> bool {
        self.available && self.enabled
    }
}
