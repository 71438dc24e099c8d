//! Monitor configuration
//!
//! Loaded from YAML:
//!
//! ```yaml
//! refresh:
//!   interval_secs: 30
//!   request_timeout_secs: 10
//!   mark_loading: false
//!
//! sources:
//!   - http://localhost:8080/actuator
//!
//! groups:
//!   - name: payments
//!     members:
//!       - http://payments-1:8080/actuator
//!       - http://payments-2:8080/actuator
//! ```

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::client::ActuatorClient;
use crate::error::ConfigError;
use crate::monitor::Monitor;
use crate::source::Source;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub refresh: RefreshConfig,
    /// Standalone sources
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

/// Polling behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Reset non-successful slots to loading before each refresh
    #[serde(default)]
    pub mark_loading: bool,
}

fn default_interval_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            mark_loading: false,
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    pub members: Vec<String>,
}

impl MonitorConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse every URL and reject exact duplicates within one list.
    ///
    /// Entries that only share host and port are allowed, with a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_list(&self.sources)?;
        for group in &self.groups {
            if group.members.is_empty() {
                return Err(ConfigError::EmptyGroup {
                    group: group.name.clone(),
                });
            }
            check_list(&group.members)?;
        }
        Ok(())
    }

    /// Build a monitor with every configured source and group registered.
    pub async fn build_monitor(
        &self,
        client: Arc<dyn ActuatorClient>,
    ) -> Result<Monitor, ConfigError> {
        let monitor = Monitor::new(client).with_mark_loading(self.refresh.mark_loading);
        for url in &self.sources {
            monitor.add_source(url).await?;
        }
        for group in &self.groups {
            monitor
                .create_group(&group.name, group.members.as_slice())
                .await?;
        }
        Ok(monitor)
    }
}

fn check_list(urls: &[String]) -> Result<Vec<Source>, ConfigError> {
    let mut parsed: Vec<Source> = Vec::with_capacity(urls.len());
    for url in urls {
        let source = Source::parse(url)?;
        if parsed.contains(&source) {
            return Err(ConfigError::DuplicateSource(source.label()));
        }
        if let Some(other) = parsed.iter().find(|s| s.shares_host_port(&source)) {
            tracing::warn!(source = %source, other = %other, "sources share host and port");
        }
        parsed.push(source);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
refresh:
  interval_secs: 15
  mark_loading: true

sources:
  - http://localhost:8080/actuator

groups:
  - name: payments
    members:
      - http://payments-1:8080/actuator
      - http://payments-2:8080/actuator
"#;
        let config = MonitorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.refresh.interval_secs, 15);
        assert_eq!(config.refresh.request_timeout_secs, 10);
        assert!(config.refresh.mark_loading);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.groups[0].members.len(), 2);
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = MonitorConfig::from_yaml("{}").unwrap();
        assert_eq!(config.refresh.interval(), Duration::from_secs(30));
        assert!(config.sources.is_empty());
        assert!(config.groups.is_empty());
    }

    #[test]
    fn test_rejects_duplicate_member() {
        let yaml = r#"
groups:
  - name: g
    members:
      - http://a:8080/actuator
      - http://a:8080/actuator/
"#;
        assert!(matches!(
            MonitorConfig::from_yaml(yaml),
            Err(ConfigError::DuplicateSource(_))
        ));
    }

    #[test]
    fn test_host_port_overlap_is_allowed() {
        let yaml = r#"
sources:
  - http://a:8080/actuator
  - http://a:8080/management
"#;
        assert!(MonitorConfig::from_yaml(yaml).is_ok());
    }

    #[test]
    fn test_rejects_bad_url_and_empty_group() {
        assert!(matches!(
            MonitorConfig::from_yaml("sources: [\"nope\"]"),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            MonitorConfig::from_yaml("groups: [{name: g, members: []}]"),
            Err(ConfigError::EmptyGroup { .. })
        ));
    }
}
