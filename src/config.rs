use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::screen::Settings;
use crate::ui::{Theme, parse_hex_color};

/// Everything read from the optional YAML config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub source: Option<PathBuf>,
    pub settings: Settings,
    pub theme: Theme,
    /// Seconds between automatic reloads of the visible screen; 0 disables.
    pub refresh_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct KdeckConfigFile {
    page_size: usize,
    #[serde(alias = "tail_lines")]
    log_lines: i64,
    min_column_width: usize,
    refresh_secs: u64,
    timeouts: TimeoutSpec,
    theme: ThemeSpec,
}

impl Default for KdeckConfigFile {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            page_size: settings.page_size,
            log_lines: settings.log_lines,
            min_column_width: settings.min_column_width,
            refresh_secs: default_refresh_secs(),
            timeouts: TimeoutSpec::default(),
            theme: ThemeSpec::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TimeoutSpec {
    #[serde(alias = "list")]
    list_secs: u64,
    #[serde(alias = "detail")]
    detail_secs: u64,
}

impl Default for TimeoutSpec {
    fn default() -> Self {
        Self {
            list_secs: 3,
            detail_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct ThemeSpec {
    accent: Option<String>,
    muted: Option<String>,
    error: Option<String>,
    warn: Option<String>,
    highlight: Option<String>,
}

fn default_refresh_secs() -> u64 {
    5
}

impl LoadedConfig {
    /// Reads the first config file found; built-in defaults when there is none.
    pub fn discover() -> Result<Self> {
        match discover_config_path() {
            Some(path) => Self::load(&path),
            None => Self::from_file(None, KdeckConfigFile::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&raw, Some(path.to_path_buf()))
    }

    fn parse(raw: &str, source: Option<PathBuf>) -> Result<Self> {
        let label = source
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<inline>".to_string());
        // An empty document deserializes to null rather than an empty mapping.
        let parsed: KdeckConfigFile = if raw.trim().is_empty() {
            KdeckConfigFile::default()
        } else {
            serde_yaml::from_str(raw).with_context(|| format!("failed to parse config {label}"))?
        };
        Self::from_file(source, parsed).with_context(|| format!("invalid config {label}"))
    }

    fn from_file(source: Option<PathBuf>, file: KdeckConfigFile) -> Result<Self> {
        let mut theme = Theme::default();
        let overrides = [
            ("accent", file.theme.accent, &mut theme.accent),
            ("muted", file.theme.muted, &mut theme.muted),
            ("error", file.theme.error, &mut theme.error),
            ("warn", file.theme.warn, &mut theme.warn),
            ("highlight", file.theme.highlight, &mut theme.highlight),
        ];
        for (name, value, slot) in overrides {
            if let Some(value) = value {
                *slot = parse_hex_color(&value)
                    .with_context(|| format!("theme.{name} must be #rrggbb, got {value:?}"))?;
            }
        }

        anyhow::ensure!(file.log_lines > 0, "log_lines must be positive");
        anyhow::ensure!(
            file.timeouts.list_secs > 0 && file.timeouts.detail_secs > 0,
            "timeouts must be at least one second"
        );

        Ok(Self {
            source,
            settings: Settings {
                page_size: file.page_size,
                min_column_width: file.min_column_width.max(1),
                log_lines: file.log_lines,
                list_timeout: Duration::from_secs(file.timeouts.list_secs),
                detail_timeout: Duration::from_secs(file.timeouts.detail_secs),
            },
            theme,
            refresh_secs: file.refresh_secs,
        })
    }
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KDECK_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("kdeck.yaml"),
        PathBuf::from("kdeck.yml"),
        PathBuf::from(".kdeck.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/kdeck/config.yaml"),
            PathBuf::from(&home).join(".config/kdeck/config.yml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::LoadedConfig;
    use crate::screen::Settings;
    use crate::ui::Theme;
    use ratatui::style::Color;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn empty_file_uses_defaults() {
        let config = LoadedConfig::parse("", None).expect("defaults");
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.theme, Theme::default());
        assert_eq!(config.refresh_secs, 5);
    }

    #[test]
    fn fields_override_defaults() {
        let raw = r##"
page_size: 25
log_lines: 50
refresh_secs: 0
timeouts:
  list_secs: 10
theme:
  accent: "#ff0000"
"##;
        let config = LoadedConfig::parse(raw, None).expect("valid config");
        assert_eq!(config.settings.page_size, 25);
        assert_eq!(config.settings.log_lines, 50);
        assert_eq!(config.settings.list_timeout, Duration::from_secs(10));
        assert_eq!(config.settings.detail_timeout, Duration::from_secs(5));
        assert_eq!(config.theme.accent, Color::Rgb(255, 0, 0));
        assert_eq!(config.theme.muted, Theme::default().muted);
        assert_eq!(config.refresh_secs, 0);
    }

    #[test]
    fn bad_values_are_rejected_with_context() {
        let error = LoadedConfig::parse("theme:\n  accent: red\n", None).expect_err("bad colour");
        assert!(format!("{error:#}").contains("theme.accent"));

        assert!(LoadedConfig::parse("log_lines: 0\n", None).is_err());
        assert!(LoadedConfig::parse("page_sise: 3\n", None).is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "min_column_width: 8").expect("write");
        let config = LoadedConfig::load(file.path()).expect("load");
        assert_eq!(config.settings.min_column_width, 8);
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }
}
