//! Sprint status record and its `development_status` values.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Value of a `development_status` entry.
///
/// `Optional` is only meaningful on retrospective keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DevelopmentStatusValue {
    Backlog,
    ReadyForDev,
    InProgress,
    Review,
    Done,
    Optional,
}

impl DevelopmentStatusValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::ReadyForDev => "ready-for-dev",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Optional => "optional",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "backlog" => Some(Self::Backlog),
            "ready-for-dev" => Some(Self::ReadyForDev),
            "in-progress" => Some(Self::InProgress),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            "optional" => Some(Self::Optional),
            _ => None,
        }
    }

    /// Status as seen on a story or epic key, where `optional` is not allowed
    /// and falls back to backlog.
    pub fn for_work_item(self) -> Self {
        match self {
            Self::Optional => Self::Backlog,
            other => other,
        }
    }
}

impl fmt::Display for DevelopmentStatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SprintStatus {
    #[serde(default)]
    pub generated: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub project_key: String,
    #[serde(default)]
    pub tracking_system: String,
    #[serde(default)]
    pub story_location: String,
    #[serde(default, deserialize_with = "deserialize_development_status")]
    pub development_status: BTreeMap<String, DevelopmentStatusValue>,
}

impl SprintStatus {
    /// Load a `sprint-status.yaml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sprint status from {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse sprint status from {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// `generated` as a calendar date, when it is one.
    pub fn generated_date(&self) -> Option<chrono::NaiveDate> {
        let head = self.generated.get(..10).unwrap_or(&self.generated);
        chrono::NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }
}

/// Read the status map leniently: entries whose value is not a known status are dropped.
fn deserialize_development_status<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, DevelopmentStatusValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;
    let mut statuses = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        match value.as_str().and_then(DevelopmentStatusValue::parse) {
            Some(status) => {
                statuses.insert(key, status);
            }
            None => {
                tracing::warn!("Ignoring invalid development status for {}: {:?}", key, value);
            }
        }
    }
    Ok(statuses)
}
