use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use switchport_core::topology::DEFAULT_MAX_UPLINK_PORTS;
use switchport_core::TopologyPolicy;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";

/// Runtime settings for the dashboard client and migration policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub topology: TopologySettings,
    #[serde(default)]
    pub confirm: ConfirmSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Retries of a rate-limited (HTTP 429) request.
    pub max_retries: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl DashboardSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TopologySettings {
    pub strict_port_counts: bool,
    pub max_uplink_ports: usize,
}

impl Default for TopologySettings {
    fn default() -> Self {
        Self {
            strict_port_counts: true,
            max_uplink_ports: DEFAULT_MAX_UPLINK_PORTS,
        }
    }
}

impl TopologySettings {
    pub fn policy(&self) -> TopologyPolicy {
        if self.strict_port_counts {
            TopologyPolicy {
                max_uplink_ports: Some(self.max_uplink_ports),
            }
        } else {
            TopologyPolicy::lenient()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfirmSettings {
    pub timeout_secs: u64,
}

impl ConfirmSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Errors returned when loading a settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load settings from a TOML file. Missing keys take their defaults.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_settings(&raw, path.display().to_string())
}

/// Settings embedded in the binary.
pub fn default_settings() -> Settings {
    let embedded = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/defaults/settings.toml"
    ));
    parse_settings(embedded, "embedded settings".to_string()).unwrap_or_default()
}

fn parse_settings(raw: &str, path: String) -> Result<Settings, SettingsError> {
    toml::from_str(raw).map_err(|source| SettingsError::Parse { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn embedded_settings_parse() {
        let embedded = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/defaults/settings.toml"
        ));
        let settings =
            parse_settings(embedded, "embedded settings".to_string()).expect("embedded parses");
        assert_eq!(settings.dashboard.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.topology.policy(), TopologyPolicy::default());
        assert_eq!(settings.confirm.timeout(), None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[dashboard]
base_url = "http://127.0.0.1:9"

[topology]
strict_port_counts = false
"#,
        )
        .expect("write settings");

        let settings = load_settings(&path).expect("settings");
        assert_eq!(settings.dashboard.base_url, "http://127.0.0.1:9");
        assert_eq!(settings.dashboard.max_retries, 3);
        assert_eq!(settings.topology.policy(), TopologyPolicy::lenient());
        assert_eq!(settings.confirm, ConfirmSettings::default());
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[dashboard\nbase_url = 1").expect("write");

        match load_settings(&path).expect_err("should fail") {
            SettingsError::Parse { .. } => {}
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn confirm_timeout_is_optional() {
        let confirm = ConfirmSettings { timeout_secs: 45 };
        assert_eq!(confirm.timeout(), Some(Duration::from_secs(45)));
    }
}
