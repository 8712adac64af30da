//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of the external
//! CLI tools the transcoder shells out to (ffmpeg, ffprobe, magick) and hands
//! out [`ToolCommand`] builders for them.

use crate::command::DEFAULT_TIMEOUT;
use crate::{Error, Result, ToolCommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Encoder used for every conversion.
pub const FFMPEG: &str = "ffmpeg";
/// Prober used for duration ground truth.
pub const FFPROBE: &str = "ffprobe";
/// Frame splitter and identifier.
pub const MAGICK: &str = "magick";

/// Known tool names that the registry manages.
pub const KNOWN_TOOLS: &[&str] = &[FFMPEG, FFPROBE, MAGICK];

/// Optional overrides for tool locations, plus the per-invocation timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,

    #[serde(default)]
    pub magick_path: Option<PathBuf>,

    /// Wall-clock limit for one tool invocation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            magick_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolsConfig {
    fn override_for(&self, name: &str) -> Option<&Path> {
        match name {
            FFMPEG => self.ffmpeg_path.as_deref(),
            FFPROBE => self.ffprobe_path.as_deref(),
            MAGICK => self.magick_path.as_deref(),
            _ => None,
        }
    }
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of version output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool locations.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
    timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            tools: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// A configured path is used only if it exists; otherwise [`which::which`]
    /// locates the tool. Tools that are not found are omitted from the
    /// registry and reported by [`ToolRegistry::require_all`].
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let resolved = match config.override_for(name) {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(tool = name, path = %p.display(), "configured tool path does not exist, searching PATH");
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            if let Some(path) = resolved {
                tracing::debug!(tool = name, path = %path.display(), "discovered tool");
                tools.insert(name.to_string(), path);
            }
        }

        Self {
            tools,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Build a registry from explicit locations.
    pub fn with_paths<I, S, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            tools: paths
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Replace the timeout applied to every command handed out.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout applied to every command handed out.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Path of a discovered tool.
    pub fn require(&self, name: &str) -> Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::tool_not_found(name))
    }

    /// Fail unless every known tool was discovered.
    ///
    /// The error names every missing tool at once so it can be reported a
    /// single time before any work starts.
    pub fn require_all(&self) -> Result<()> {
        let missing: Vec<&str> = KNOWN_TOOLS
            .iter()
            .copied()
            .filter(|name| !self.tools.contains_key(*name))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::tool_not_found(missing.join(", ")))
        }
    }

    /// A command builder for the named tool.
    pub fn command(&self, name: &str) -> Result<ToolCommand> {
        let mut cmd = ToolCommand::new(self.require(name)?);
        cmd.timeout(self.timeout);
        Ok(cmd)
    }

    /// A command builder for ffmpeg with overwrite and quiet logging preset.
    pub fn ffmpeg(&self) -> Result<ToolCommand> {
        let mut cmd = self.command(FFMPEG)?;
        cmd.args(["-hide_banner", "-loglevel", "error", "-y"]);
        Ok(cmd)
    }

    /// A command builder for ffprobe.
    pub fn ffprobe(&self) -> Result<ToolCommand> {
        self.command(FFPROBE)
    }

    /// A command builder for magick.
    pub fn magick(&self) -> Result<ToolCommand> {
        self.command(MAGICK)
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(name, path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

fn detect_version(name: &str, path: &Path) -> Option<String> {
    let version_arg = match name {
        FFMPEG | FFPROBE => "-version",
        _ => "--version",
    };

    let output = Command::new(path).arg(version_arg).output().ok()?;
    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_tool() {
        let registry = ToolRegistry::default();
        let err = registry.require(FFMPEG).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[test]
    fn test_require_all_names_every_missing_tool() {
        let registry = ToolRegistry::with_paths([(FFMPEG, "/opt/ffmpeg/bin/ffmpeg")]);
        let err = registry.require_all().unwrap_err();
        assert_eq!(err.to_string(), "tool not found: ffprobe, magick");
    }

    #[test]
    fn test_ffmpeg_preset_args() {
        let registry = ToolRegistry::with_paths([(FFMPEG, "/opt/ffmpeg/bin/ffmpeg")]);
        let cmd = registry.ffmpeg().unwrap();
        assert_eq!(cmd.program_name(), "ffmpeg");
        assert!(cmd.get_args().iter().any(|a| a == "-y"));
    }

    #[test]
    fn test_check_all_reports_unavailable() {
        let registry = ToolRegistry::default();
        let infos = registry.check_all();
        assert_eq!(infos.len(), KNOWN_TOOLS.len());
        assert!(infos.iter().all(|i| !i.available && i.path.is_none()));
    }

    #[test]
    fn test_discover_ignores_nonexistent_override() {
        let config = ToolsConfig {
            magick_path: Some(PathBuf::from("/nonexistent/magick_12345")),
            ..Default::default()
        };
        let registry = ToolRegistry::discover(&config);
        if let Ok(path) = registry.require(MAGICK) {
            assert_ne!(path, Path::new("/nonexistent/magick_12345"));
        }
    }

    #[test]
    fn test_timeout_from_config() {
        let config: ToolsConfig = serde_json::from_str(r#"{"timeout_secs": 7}"#).unwrap();
        assert_eq!(ToolRegistry::discover(&config).timeout(), Duration::from_secs(7));

        let defaults: ToolsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(defaults.timeout_secs, 300);
    }

    #[cfg(unix)]
    #[test]
    fn test_registry_commands_carry_timeout() {
        let registry = ToolRegistry::with_paths([(MAGICK, "sleep")])
            .with_timeout(Duration::from_millis(100));
        let err = registry.magick().unwrap().arg("10").execute().unwrap_err();
        assert!(err.to_string().contains("timed out"), "unexpected error: {err}");
    }
}
