mod keys;
mod next_action;
mod parser;
mod sprint;

pub use keys::{classify_key, parse_story_key, SprintKey, StoryKeyParts};
pub use next_action::{get_next_action, NextAction, NextActionType};
pub use parser::{parse_story_content, slugify};
pub use sprint::{DevelopmentStatusValue, SprintStatus};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status of a single story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StoryStatusValue {
    #[default]
    Backlog,
    ReadyForDev,
    InProgress,
    Review,
    Done,
}

impl StoryStatusValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::ReadyForDev => "ready-for-dev",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::Done => "done",
        }
    }

    /// Parse a status string, case-insensitively. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "backlog" => Some(Self::Backlog),
            "ready-for-dev" => Some(Self::ReadyForDev),
            "in-progress" => Some(Self::InProgress),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::ReadyForDev => "Ready for Dev",
            Self::InProgress => "In Progress",
            Self::Review => "Review",
            Self::Done => "Done",
        }
    }

    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Backlog,
            Self::ReadyForDev,
            Self::InProgress,
            Self::Review,
            Self::Done,
        ]
        .into_iter()
    }
}

impl fmt::Display for StoryStatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an epic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EpicStatusValue {
    #[default]
    Backlog,
    InProgress,
    Done,
}

impl EpicStatusValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }
}

/// Numbered acceptance criterion from a story's `## Acceptance Criteria` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub number: u32,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorySubtask {
    /// `<task>.<n>`, e.g. "2.3"
    pub id: String,
    pub description: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryTask {
    pub number: u32,
    pub description: String,
    pub completed: bool,
    /// AC references from a trailing `(AC: ...)`. `None` when the task has no such suffix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<u32>>,
    #[serde(default)]
    pub subtasks: Vec<StorySubtask>,
}

/// Task and subtask totals, always recomputed from a task tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub total_subtasks: usize,
    pub completed_subtasks: usize,
}

impl TaskCounts {
    pub fn from_tasks(tasks: &[StoryTask]) -> Self {
        tasks.iter().fold(Self::default(), |mut acc, task| {
            acc.total_tasks += 1;
            if task.completed {
                acc.completed_tasks += 1;
            }
            acc.total_subtasks += task.subtasks.len();
            acc.completed_subtasks += task.subtasks.iter().filter(|s| s.completed).count();
            acc
        })
    }
}

/// A fully parsed story file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub key: String,
    pub epic_number: u32,
    pub story_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_suffix: Option<char>,
    pub title: String,
    #[serde(default)]
    pub user_story: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
    #[serde(default)]
    pub tasks: Vec<StoryTask>,
    pub file_path: String,
    #[serde(default)]
    pub status: StoryStatusValue,
    #[serde(default)]
    pub total_tasks: usize,
    #[serde(default)]
    pub completed_tasks: usize,
    #[serde(default)]
    pub total_subtasks: usize,
    #[serde(default)]
    pub completed_subtasks: usize,
}

impl Story {
    /// Display number, e.g. "3.5" or "5.6a"
    pub fn display_number(&self) -> String {
        story_number_label(self.epic_number, self.story_number, self.story_suffix)
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::from_tasks(&self.tasks)
    }

    /// Overwrite the stored totals with counts derived from `tasks`.
    pub fn recount(&mut self) {
        let counts = self.counts();
        self.total_tasks = counts.total_tasks;
        self.completed_tasks = counts.completed_tasks;
        self.total_subtasks = counts.total_subtasks;
        self.completed_subtasks = counts.completed_subtasks;
    }
}

pub(crate) fn story_number_label(epic: u32, story: u32, suffix: Option<char>) -> String {
    match suffix {
        Some(s) => format!("{}.{}{}", epic, story, s),
        None => format!("{}.{}", epic, story),
    }
}

/// Lightweight per-story projection used by list views and breadcrumb labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    pub key: String,
    pub epic_number: u32,
    pub story_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_suffix: Option<char>,
    pub title: String,
    #[serde(default)]
    pub status: StoryStatusValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub total_tasks: usize,
    #[serde(default)]
    pub completed_tasks: usize,
    #[serde(default)]
    pub total_subtasks: usize,
    #[serde(default)]
    pub completed_subtasks: usize,
}

impl StorySummary {
    pub fn from_story(story: &Story) -> Self {
        let counts = story.counts();
        Self {
            key: story.key.clone(),
            epic_number: story.epic_number,
            story_number: story.story_number,
            story_suffix: story.story_suffix,
            title: story.title.clone(),
            status: story.status,
            file_path: Some(story.file_path.clone()),
            total_tasks: counts.total_tasks,
            completed_tasks: counts.completed_tasks,
            total_subtasks: counts.total_subtasks,
            completed_subtasks: counts.completed_subtasks,
        }
    }

    pub fn display_number(&self) -> String {
        story_number_label(self.epic_number, self.story_number, self.story_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicStoryEntry {
    pub key: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StoryStatusValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epic {
    pub number: u32,
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub stories: Vec<EpicStoryEntry>,
    pub file_path: String,
    #[serde(default)]
    pub status: EpicStatusValue,
}

/// A workflow shortcut offered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowInfo {
    pub id: String,
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Installation metadata reported by the host. Unknown keys are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BmadMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Which planning documents exist for the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningArtifacts {
    #[serde(default)]
    pub has_prd: bool,
    #[serde(default)]
    pub has_architecture: bool,
    #[serde(default)]
    pub has_epics: bool,
    #[serde(default)]
    pub has_readiness_report: bool,
}

impl PlanningArtifacts {
    /// Detect planning documents by file name in `dir` (non-recursive).
    ///
    /// A missing directory means nothing has been planned yet.
    pub fn detect(dir: &std::path::Path) -> std::io::Result<Self> {
        let mut artifacts = Self::default();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(artifacts),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let name = entry?.file_name().to_string_lossy().to_lowercase();
            if !name.ends_with(".md") {
                continue;
            }
            if name.contains("prd") {
                artifacts.has_prd = true;
            }
            if name.contains("architecture") {
                artifacts.has_architecture = true;
            }
            if name.contains("epic") {
                artifacts.has_epics = true;
            }
            if name.contains("readiness") {
                artifacts.has_readiness_report = true;
            }
        }
        Ok(artifacts)
    }
}

/// How a plain click on a document link opens it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefaultClickBehavior {
    #[default]
    MarkdownPreview,
    Editor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardError {
    pub message: String,
    /// Always `true` today; kept so a non-recoverable kind can be added without a wire change.
    pub recoverable: bool,
}

impl DashboardError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            recoverable: true,
        }
    }
}

/// The full snapshot pushed by the host with every `STATE_UPDATE`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    #[serde(default)]
    pub sprint: Option<SprintStatus>,
    #[serde(default)]
    pub epics: Vec<Epic>,
    #[serde(default)]
    pub current_story: Option<Story>,
    #[serde(default)]
    pub errors: Vec<DashboardError>,
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub output_root: Option<String>,
    #[serde(default)]
    pub workflows: Vec<WorkflowInfo>,
    #[serde(default)]
    pub bmad_metadata: Option<BmadMetadata>,
    #[serde(default)]
    pub planning_artifacts: Option<PlanningArtifacts>,
    #[serde(default)]
    pub default_click_behavior: DefaultClickBehavior,
    #[serde(default)]
    pub story_summaries: Vec<StorySummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileTreeNodeType {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub node_type: FileTreeNodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
}

/// A document body delivered by `DOCUMENT_CONTENT`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub frontmatter: Option<serde_json::Value>,
}
