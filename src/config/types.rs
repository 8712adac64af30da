use serde::{Deserialize, Serialize};
use stickerforge_av::actions::EncodeSettings;
use stickerforge_av::capper::DurationCapper;
use stickerforge_av::ToolsConfig;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub workers: WorkersConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

/// Worker pool sizes per phase.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkersConfig {
    /// Concurrent downloads (default: 4)
    #[serde(default = "default_download_workers")]
    pub download: usize,

    /// Concurrent transcodes (default: 8)
    #[serde(default = "default_transcode_workers")]
    pub transcode: usize,
}

fn default_download_workers() -> usize {
    4
}
fn default_transcode_workers() -> usize {
    8
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            download: default_download_workers(),
            transcode: default_transcode_workers(),
        }
    }
}

/// Target platform constraints for encoded stickers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Hard ceiling on WebM playback time in seconds (default: 3.0)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,

    /// Soft ceiling on WebM size; exceeding it only warns (default: 256 KiB)
    #[serde(default = "default_max_size")]
    pub max_size_bytes: u64,

    /// Re-render attempts before accepting the closest result (default: 20)
    #[serde(default = "default_max_cap_iterations")]
    pub max_cap_iterations: u32,

    /// Speed factor growth per overshooting re-render (default: 1.05)
    #[serde(default = "default_cap_growth")]
    pub cap_growth: f64,

    /// `paletteuse` alpha threshold for GIF output (default: 10)
    #[serde(default = "default_gif_alpha_threshold")]
    pub gif_alpha_threshold: u8,

    /// Constant output framerate for WebM (default: 30)
    #[serde(default = "default_webm_framerate")]
    pub webm_framerate: u32,
}

fn default_max_duration() -> f64 {
    stickerforge_av::capper::DEFAULT_MAX_DURATION
}
fn default_max_size() -> u64 {
    stickerforge_av::capper::DEFAULT_MAX_SIZE
}
fn default_max_cap_iterations() -> u32 {
    stickerforge_av::capper::DEFAULT_MAX_ITERATIONS
}
fn default_cap_growth() -> f64 {
    stickerforge_av::capper::DEFAULT_GROWTH
}
fn default_gif_alpha_threshold() -> u8 {
    stickerforge_av::actions::DEFAULT_GIF_ALPHA_THRESHOLD
}
fn default_webm_framerate() -> u32 {
    stickerforge_av::actions::DEFAULT_WEBM_FRAMERATE
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration(),
            max_size_bytes: default_max_size(),
            max_cap_iterations: default_max_cap_iterations(),
            cap_growth: default_cap_growth(),
            gif_alpha_threshold: default_gif_alpha_threshold(),
            webm_framerate: default_webm_framerate(),
        }
    }
}

impl LimitsConfig {
    /// Encoder settings for a transcode run.
    pub fn to_encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            gif_alpha_threshold: self.gif_alpha_threshold,
            webm_framerate: self.webm_framerate,
            capper: DurationCapper {
                max_duration: self.max_duration_secs,
                max_size: self.max_size_bytes,
                max_iterations: self.max_cap_iterations,
                growth: self.cap_growth,
            },
        }
    }
}

/// HTTP client and retry behavior for asset downloads.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Proxy URL applied to all requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// User-Agent header; the store rejects unknown clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Total attempts per file, including the first (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry, doubled per attempt (default: 500ms)
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Upper bound on a single backoff (default: 10s)
    #[serde(default = "default_backoff_max")]
    pub backoff_max_ms: u64,

    /// Re-download files that already exist
    #[serde(default)]
    pub overwrite: bool,
}

fn default_user_agent() -> String {
    crate::catalog::BROWSER_USER_AGENT.to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    5
}
fn default_backoff_base() -> u64 {
    500
}
fn default_backoff_max() -> u64 {
    10_000
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            backoff_max_ms: default_backoff_max(),
            overwrite: false,
        }
    }
}
