use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Platform};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAccount {
    pub platform: Platform,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Output directory name for this target; must be a single safe path component.
    pub label: String,
    #[serde(default)]
    pub accounts: Vec<TargetAccount>,
}

#[derive(Debug, Deserialize)]
pub struct TargetsFile {
    pub targets: Vec<TargetConfig>,
}

/// One (target, platform) unit of work for the batch driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetJob {
    pub label: String,
    pub platform: Platform,
    pub url: String,
}

impl TargetsFile {
    /// Flattens targets into jobs, preserving file order.
    #[must_use]
    pub fn jobs(&self) -> Vec<TargetJob> {
        self.targets
            .iter()
            .flat_map(|t| {
                t.accounts.iter().map(|a| TargetJob {
                    label: t.label.clone(),
                    platform: a.platform,
                    url: a.url.clone(),
                })
            })
            .collect()
    }
}

/// Load and validate the targets configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_targets(path: &Path) -> Result<TargetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_targets(&content)
}

fn parse_targets(content: &str) -> Result<TargetsFile, ConfigError> {
    let targets_file: TargetsFile = serde_yaml::from_str(content)?;
    validate_targets(&targets_file)?;
    Ok(targets_file)
}

fn is_safe_label(label: &str) -> bool {
    !label.starts_with('.')
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn validate_targets(targets_file: &TargetsFile) -> Result<(), ConfigError> {
    let mut seen_labels = HashSet::new();

    for target in &targets_file.targets {
        let label = target.label.trim();
        if label.is_empty() {
            return Err(ConfigError::Validation(
                "target label must be non-empty".to_string(),
            ));
        }

        if !is_safe_label(label) {
            return Err(ConfigError::Validation(format!(
                "target label '{label}' may only contain ASCII letters, digits, '-', '_' and '.'"
            )));
        }

        if !seen_labels.insert(label.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate target label: '{label}'"
            )));
        }

        if let Some(account) = target.accounts.iter().find(|a| a.url.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "target '{label}' has an empty {} url",
                account.platform
            )));
        }
    }

    Ok(())
}
