use crate::compare::ComparisonReport;
use crate::error::{Result, TreatyError};
use crate::validation::PartialValidationConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_LOG_FILTER: &str = "treaty=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = TreatyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(TreatyError::ConfigError(format!(
                "unknown log format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// Which changes make `treaty diff` fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    #[default]
    Breaking,
    Any,
}

impl FailOn {
    pub fn is_met(self, report: &ComparisonReport) -> bool {
        match self {
            FailOn::Breaking => report.has_breaking_changes,
            FailOn::Any => !report.is_empty(),
        }
    }
}

impl FromStr for FailOn {
    type Err = TreatyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breaking" => Ok(FailOn::Breaking),
            "any" => Ok(FailOn::Any),
            other => Err(TreatyError::ConfigError(format!(
                "unknown fail-on policy '{}' (expected breaking or any)",
                other
            ))),
        }
    }
}

/// Process-wide settings: defaults, then an optional YAML file, then environment variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_filter: String,
    pub log_format: LogFormat,
    pub strict_mode: bool,
    pub ignore_extra_fields: bool,
    pub fail_on: FailOn,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::Text,
            strict_mode: false,
            ignore_extra_fields: false,
            fail_on: FailOn::Breaking,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Load from an optional YAML file, then let the environment override it
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path)?.with_env(|key| std::env::var(key).ok()),
            None => Self::from_env(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TreatyError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|e| {
            TreatyError::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply `TREATY_*` variables from `lookup` on top of the current values
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(filter) = lookup("TREATY_LOG") {
            self.log_filter = filter;
        }
        if let Some(format) = lookup("TREATY_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }
        if let Some(strict) = lookup("TREATY_STRICT") {
            self.strict_mode = parse_flag("TREATY_STRICT", &strict)?;
        }
        if let Some(ignore) = lookup("TREATY_IGNORE_EXTRA_FIELDS") {
            self.ignore_extra_fields = parse_flag("TREATY_IGNORE_EXTRA_FIELDS", &ignore)?;
        }
        if let Some(fail_on) = lookup("TREATY_FAIL_ON") {
            self.fail_on = fail_on.parse()?;
        }
        Ok(self)
    }

    /// Validation options for one run; `strict` and `ignore_extra` can only switch a flag on
    pub fn validation_config(
        &self,
        strict: bool,
        ignore_extra: bool,
        only: Vec<String>,
    ) -> PartialValidationConfig {
        PartialValidationConfig::default()
            .with_properties(only)
            .with_strict_mode(strict || self.strict_mode)
            .with_ignore_extra_fields(ignore_extra || self.ignore_extra_fields)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(TreatyError::ConfigError(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default().with_env(env(&[])).unwrap();
        assert_eq!(settings.log_filter, "treaty=info");
        assert_eq!(settings.log_format, LogFormat::Text);
        assert_eq!(settings.fail_on, FailOn::Breaking);
        assert!(!settings.strict_mode);
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::default()
            .with_env(env(&[
                ("TREATY_LOG", "treaty=debug"),
                ("TREATY_LOG_FORMAT", "JSON"),
                ("TREATY_STRICT", "yes"),
                ("TREATY_FAIL_ON", "any"),
            ]))
            .unwrap();

        assert_eq!(settings.log_filter, "treaty=debug");
        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(settings.strict_mode);
        assert_eq!(settings.fail_on, FailOn::Any);
        assert!(settings.validation_config(false, false, Vec::new()).strict_mode);
    }

    #[test]
    fn test_validation_config_merges_flags() {
        let settings = Settings {
            ignore_extra_fields: true,
            ..Settings::default()
        };

        let config = settings.validation_config(false, false, Vec::new());
        assert!(!config.strict_mode);
        assert!(config.ignore_extra_fields);
        assert_eq!(config.properties_to_validate, None);

        let config = settings.validation_config(true, false, vec!["name".to_string()]);
        assert!(config.strict_mode);
        assert!(config.selects("name"));
        assert!(!config.selects("age"));
    }

    #[test]
    fn test_file_settings_feed_validation_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"strict_mode: true\n").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert!(settings.strict_mode);
        assert!(settings.validation_config(false, false, Vec::new()).strict_mode);
    }

    #[test]
    fn test_invalid_environment_value() {
        let result = Settings::default().with_env(env(&[("TREATY_STRICT", "maybe")]));
        assert!(matches!(result, Err(TreatyError::ConfigError(_))));
    }

    #[test]
    fn test_file_then_environment() {
        let yaml = r#"
log_format: json
ignore_extra_fields: true
fail_on: any
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let settings = Settings::from_file(file.path())
            .unwrap()
            .with_env(env(&[("TREATY_FAIL_ON", "breaking")]))
            .unwrap();

        assert_eq!(settings.log_format, LogFormat::Json);
        assert!(settings.ignore_extra_fields);
        assert_eq!(settings.fail_on, FailOn::Breaking);
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_fail_on_policy() {
        let empty = ComparisonReport::default();
        assert!(!FailOn::Any.is_met(&empty));
        assert!(!FailOn::Breaking.is_met(&empty));
    }
}
