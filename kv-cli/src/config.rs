use kv::coordinator::Mode;
use serde_derive::{Deserialize, Serialize};

/// Persisted CLI configuration, loaded with `confy` from the platform
/// config directory (or a path given with `--config`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of shards the in-process demo cluster is split into.
    pub nshards: usize,

    /// One of `occ`, `lock`, `span_occ`, `span_lock` (spec §3).
    pub mode: String,

    /// TrueTime uncertainty bound used by `SystemTrueTime` in `span_occ`/
    /// `span_lock` mode.
    pub truetime_uncertainty_micros: u64,

    pub prompt: Option<String>,

    /// Show commit-wait duration after every commit in `span_*` modes.
    pub show_stats: Option<bool>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            nshards: 4,
            mode: "span_occ".to_string(),
            truetime_uncertainty_micros: 5_000,
            prompt: Some("kvcli".to_string()),
            show_stats: Some(false),
        }
    }
}

impl ClusterConfig {
    pub fn mode(&self) -> Mode {
        match self.mode.to_ascii_lowercase().as_str() {
            "occ" => Mode::Occ,
            "lock" => Mode::Lock,
            "span_lock" => Mode::SpanLock,
            _ => Mode::SpanOcc,
        }
    }

    pub fn terminal_update(&mut self) {
        self.show_stats = Some(true);
    }
}
