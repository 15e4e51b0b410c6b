use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::persona::PersonaId;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub shell: ShellConfig,
    pub sound: SoundConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    pub default_persona: Option<PersonaId>,
    /// Directory holding `<persona>.yaml` overrides of the built-in tables.
    pub persona_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled: Option<bool>,
    pub volume: u8,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            volume: 50,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    pub modal_enter_ms: u64,
    pub modal_exit_ms: u64,
    pub feed_latency_min_ms: u64,
    pub feed_latency_max_ms: u64,
    pub load_busy_ms: u64,
    pub login_redirect_ms: u64,
    pub login_error_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            modal_enter_ms: 300,
            modal_exit_ms: 200,
            feed_latency_min_ms: 1_000,
            feed_latency_max_ms: 2_000,
            load_busy_ms: 2_000,
            login_redirect_ms: 1_500,
            login_error_ms: 500,
        }
    }
}
