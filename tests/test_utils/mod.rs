//! Test utilities and fixtures for bmad-board tests

#![allow(dead_code)]

use bmad_board::data::{
    DevelopmentStatusValue, Epic, EpicStatusValue, SprintStatus, Story, StoryStatusValue,
    StorySummary,
};
use bmad_board::view::{HostChannel, OutboundMessage};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A complete story file exercising every section the parser reads
pub const FULL_STORY: &str = r#"---
story_id: 3.5
epic: 3
---

# Story 3.5: Login Flow

Status: In-Progress

## Story

As a **returning user**,
I want to sign in with my email,
so that I can see my saved boards.

## Acceptance Criteria

1. **Valid credentials sign the user in**
   Given a registered user
   When they submit the correct password
   Then the dashboard opens

2. **Invalid credentials are rejected** with a message

## Tasks / Subtasks

- [x] Task 1: Build the login form (AC: #1)
  - [x] 1.1: Email field
  - [X] 1.2: Password field
- [ ] Task 2: Wire up error handling (AC: 1, 2)
  - [x] 2.1: Show inline message
  - [ ] 2.2: Lock after repeated failures
- [ ] Task 3: Write docs

## Dev Notes

- [ ] Task 9: Not a real task
"#;

/// Records every outbound message for assertions
#[derive(Default)]
pub struct RecordingHost {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingHost {
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent.lock().unwrap().last().cloned()
    }
}

impl HostChannel for RecordingHost {
    fn post_message(&self, message: &OutboundMessage) {
        self.sent.lock().unwrap().push(message.clone());
    }
}

/// Build a sprint status from `(key, status)` pairs
pub fn sprint(entries: &[(&str, DevelopmentStatusValue)]) -> SprintStatus {
    SprintStatus {
        generated: "2025-01-15".to_string(),
        project: "Demo".to_string(),
        project_key: "DEMO".to_string(),
        tracking_system: "file-system".to_string(),
        story_location: "_bmad-output/implementation-artifacts".to_string(),
        development_status: entries
            .iter()
            .map(|(key, status)| (key.to_string(), *status))
            .collect(),
    }
}

/// Minimal story with the given numbers and status
pub fn story(epic: u32, number: u32, status: StoryStatusValue) -> Story {
    Story {
        key: format!("{}-{}-test-story", epic, number),
        epic_number: epic,
        story_number: number,
        story_suffix: None,
        title: format!("Story {}.{}", epic, number),
        user_story: String::new(),
        acceptance_criteria: vec![],
        tasks: vec![],
        file_path: format!("stories/{}-{}-test-story.md", epic, number),
        status,
        total_tasks: 0,
        completed_tasks: 0,
        total_subtasks: 0,
        completed_subtasks: 0,
    }
}

pub fn epic(number: u32, title: &str) -> Epic {
    Epic {
        number,
        key: format!("epic-{}", number),
        title: title.to_string(),
        description: String::new(),
        metadata: BTreeMap::new(),
        stories: vec![],
        file_path: "planning-artifacts/epics.md".to_string(),
        status: EpicStatusValue::InProgress,
    }
}

pub fn summary(key: &str, epic: u32, number: u32, title: &str) -> StorySummary {
    StorySummary {
        key: key.to_string(),
        epic_number: epic,
        story_number: number,
        story_suffix: None,
        title: title.to_string(),
        status: StoryStatusValue::Backlog,
        file_path: None,
        total_tasks: 0,
        completed_tasks: 0,
        total_subtasks: 0,
        completed_subtasks: 0,
    }
}
