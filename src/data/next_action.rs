//! Next-action derivation.
//!
//! Rules are evaluated in order and the first match wins:
//!
//! 1. No sprint yet: walk the planning gates (PRD, architecture, epics, readiness)
//! 2. Current story in progress: continue it
//! 3. Current story in review: review it
//! 4. Current story ready for dev: start it
//! 5. Otherwise look at the whole sprint (complete, retrospective, backlog, fallback)

use super::keys::{classify_key, SprintKey, StoryKeyParts};
use super::{
    DevelopmentStatusValue, PlanningArtifacts, SprintStatus, Story, StoryStatusValue,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NextActionType {
    CreatePrd,
    CreateArchitecture,
    CreateEpics,
    CheckImplementationReadiness,
    SprintPlanning,
    CreateStory,
    DevStory,
    CodeReview,
    Retrospective,
    SprintComplete,
}

impl NextActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatePrd => "create-prd",
            Self::CreateArchitecture => "create-architecture",
            Self::CreateEpics => "create-epics",
            Self::CheckImplementationReadiness => "check-implementation-readiness",
            Self::SprintPlanning => "sprint-planning",
            Self::CreateStory => "create-story",
            Self::DevStory => "dev-story",
            Self::CodeReview => "code-review",
            Self::Retrospective => "retrospective",
            Self::SprintComplete => "sprint-complete",
        }
    }

    /// Workflow command to run for this action, if there is one.
    pub fn workflow_command(&self) -> Option<&'static str> {
        match self {
            Self::CreatePrd => Some("/bmad-bmm-create-prd"),
            Self::CreateArchitecture => Some("/bmad-bmm-create-architecture"),
            Self::CreateEpics => Some("/bmad-bmm-create-epics-and-stories"),
            Self::CheckImplementationReadiness => Some("/bmad-bmm-check-implementation-readiness"),
            Self::SprintPlanning => Some("/bmad-bmm-sprint-planning"),
            Self::CreateStory => Some("/bmad-bmm-create-story"),
            Self::DevStory => Some("/bmad-bmm-dev-story"),
            Self::CodeReview => Some("/bmad-bmm-code-review"),
            Self::Retrospective => Some("/bmad-bmm-retrospective"),
            Self::SprintComplete => None,
        }
    }
}

/// A single recommended workflow step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAction {
    #[serde(rename = "type")]
    pub action_type: NextActionType,
    pub label: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_key: Option<String>,
}

impl NextAction {
    fn new(action_type: NextActionType, label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            action_type,
            label: label.into(),
            description: description.into(),
            story_key: None,
        }
    }

    fn with_story(mut self, key: impl Into<String>) -> Self {
        self.story_key = Some(key.into());
        self
    }
}

/// Recommend the next workflow step. Pure and total.
pub fn get_next_action(
    sprint: Option<&SprintStatus>,
    current_story: Option<&Story>,
    planning_artifacts: Option<&PlanningArtifacts>,
) -> NextAction {
    let Some(sprint) = sprint else {
        return planning_action(planning_artifacts);
    };

    if let Some(story) = current_story {
        if let Some(action) = story_action(story) {
            return action;
        }
    }

    sprint_action(sprint)
}

fn planning_action(planning: Option<&PlanningArtifacts>) -> NextAction {
    let Some(planning) = planning else {
        return sprint_planning();
    };

    if !planning.has_prd {
        NextAction::new(
            NextActionType::CreatePrd,
            "Create PRD",
            "Start by writing the product requirements document",
        )
    } else if !planning.has_architecture {
        NextAction::new(
            NextActionType::CreateArchitecture,
            "Create Architecture",
            "PRD is ready. Design the architecture next",
        )
    } else if !planning.has_epics {
        NextAction::new(
            NextActionType::CreateEpics,
            "Create Epics & Stories",
            "Break the PRD and architecture down into epics and stories",
        )
    } else if !planning.has_readiness_report {
        NextAction::new(
            NextActionType::CheckImplementationReadiness,
            "Check Implementation Readiness",
            "Validate that planning artifacts are aligned before sprint planning",
        )
    } else {
        sprint_planning()
    }
}

fn sprint_planning() -> NextAction {
    NextAction::new(
        NextActionType::SprintPlanning,
        "Run Sprint Planning",
        "No sprint status found. Generate it from the epics",
    )
}

fn story_action(story: &Story) -> Option<NextAction> {
    // Labels carry the bare E.S pair; the suffix lives in the story key
    let number = format!("{}.{}", story.epic_number, story.story_number);
    let action = match story.status {
        StoryStatusValue::InProgress => NextAction::new(
            NextActionType::DevStory,
            format!("Continue Story {}", number),
            format!("Resume development of \"{}\"", story.title),
        ),
        StoryStatusValue::Review => NextAction::new(
            NextActionType::CodeReview,
            format!("Review Story {}", number),
            format!("\"{}\" is waiting for code review", story.title),
        ),
        StoryStatusValue::ReadyForDev => NextAction::new(
            NextActionType::DevStory,
            format!("Start Dev Story {}", number),
            format!("\"{}\" is ready for development", story.title),
        ),
        StoryStatusValue::Backlog | StoryStatusValue::Done => return None,
    };
    Some(action.with_story(story.key.clone()))
}

struct SprintStory<'a> {
    key: &'a str,
    parts: StoryKeyParts,
    status: DevelopmentStatusValue,
}

fn sprint_action(sprint: &SprintStatus) -> NextAction {
    let mut stories: Vec<SprintStory> = Vec::new();
    let mut retrospectives: BTreeMap<u32, DevelopmentStatusValue> = BTreeMap::new();

    for (key, status) in &sprint.development_status {
        match classify_key(key) {
            SprintKey::Story(parts) => stories.push(SprintStory {
                key,
                parts,
                status: status.for_work_item(),
            }),
            SprintKey::Retrospective(epic) => {
                retrospectives.insert(epic, *status);
            }
            SprintKey::Epic(_) => {}
            SprintKey::Unrecognized => {
                tracing::debug!("Skipping unrecognized sprint key {}", key);
            }
        }
    }

    if stories.is_empty() {
        return NextAction::new(
            NextActionType::CreateStory,
            "Create Story",
            "No stories found. Create the first story",
        );
    }

    if stories.iter().all(|s| s.status == DevelopmentStatusValue::Done) {
        return NextAction::new(
            NextActionType::SprintComplete,
            "Sprint Complete",
            "All stories are done",
        );
    }

    let mut by_epic: BTreeMap<u32, Vec<&SprintStory>> = BTreeMap::new();
    for story in &stories {
        by_epic.entry(story.parts.epic).or_default().push(story);
    }

    for (epic, epic_stories) in &by_epic {
        let epic_done = epic_stories
            .iter()
            .all(|s| s.status == DevelopmentStatusValue::Done);
        let retro_done = retrospectives.get(epic) == Some(&DevelopmentStatusValue::Done);
        if epic_done && !retro_done {
            return NextAction::new(
                NextActionType::Retrospective,
                format!("Epic {} Retrospective", epic),
                format!("All stories in Epic {} are done. Run the retrospective", epic),
            );
        }
    }

    let next_backlog = stories
        .iter()
        .filter(|s| s.status == DevelopmentStatusValue::Backlog)
        .min_by_key(|s| (s.parts.epic, s.parts.story, s.parts.suffix));
    if let Some(story) = next_backlog {
        let number = format!("{}.{}", story.parts.epic, story.parts.story);
        return NextAction::new(
            NextActionType::CreateStory,
            format!("Create Story {}", number),
            "Create the next story from the backlog",
        )
        .with_story(story.key);
    }

    NextAction::new(
        NextActionType::CreateStory,
        "Create Story",
        "No story is actionable right now. Check sprint status",
    )
}
