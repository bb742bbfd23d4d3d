//! The view state store: the last snapshot pushed by the host plus local UI flags.

use crate::data::{
    get_next_action, BmadMetadata, DashboardError, DashboardState, DefaultClickBehavior, Epic,
    NextAction, PlanningArtifacts, SprintStatus, Story, StorySummary, WorkflowInfo,
};

/// System of record for the webview.
///
/// Every mutation bumps [`ViewStore::revision`], which lets consumers memoise
/// derived values with [`Memo`].
#[derive(Debug, Clone, Default)]
pub struct ViewStore {
    state: DashboardState,
    revision: u64,
}

impl ViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a snapshot, e.g. defaults from local config before the
    /// host has sent anything.
    pub fn with_state(state: DashboardState) -> Self {
        Self { state, revision: 0 }
    }

    /// Replace the whole snapshot. Nothing from the previous snapshot survives.
    pub fn update_state(&mut self, snapshot: DashboardState) {
        self.state = snapshot;
        self.bump();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.state.loading = loading;
        self.bump();
    }

    /// Append a recoverable error. Errors are never deduplicated or capped.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.state.errors.push(DashboardError::recoverable(message));
        self.bump();
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Recommendation for the current snapshot.
    pub fn next_action(&self) -> NextAction {
        get_next_action(
            self.state.sprint.as_ref(),
            self.state.current_story.as_ref(),
            self.state.planning_artifacts.as_ref(),
        )
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

// Narrow selectors, one per slice of the snapshot

pub fn select_sprint(store: &ViewStore) -> Option<&SprintStatus> {
    store.state.sprint.as_ref()
}

pub fn select_epics(store: &ViewStore) -> &[Epic] {
    &store.state.epics
}

pub fn select_current_story(store: &ViewStore) -> Option<&Story> {
    store.state.current_story.as_ref()
}

pub fn select_errors(store: &ViewStore) -> &[DashboardError] {
    &store.state.errors
}

pub fn select_loading(store: &ViewStore) -> bool {
    store.state.loading
}

pub fn select_output_root(store: &ViewStore) -> Option<&str> {
    store.state.output_root.as_deref()
}

pub fn select_workflows(store: &ViewStore) -> &[WorkflowInfo] {
    &store.state.workflows
}

pub fn select_bmad_metadata(store: &ViewStore) -> Option<&BmadMetadata> {
    store.state.bmad_metadata.as_ref()
}

pub fn select_planning_artifacts(store: &ViewStore) -> Option<&PlanningArtifacts> {
    store.state.planning_artifacts.as_ref()
}

pub fn select_default_click_behavior(store: &ViewStore) -> DefaultClickBehavior {
    store.state.default_click_behavior
}

pub fn select_story_summaries(store: &ViewStore) -> &[StorySummary] {
    &store.state.story_summaries
}

/// A value derived from the store, recomputed only when the store's revision moves.
#[derive(Debug, Clone)]
pub struct Memo<T> {
    cached: Option<(u64, T)>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self { cached: None }
    }
}

impl<T> Memo<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, store: &ViewStore, derive: impl FnOnce(&ViewStore) -> T) -> &T {
        let revision = store.revision();
        if !matches!(self.cached, Some((r, _)) if r == revision) {
            self.cached = None;
        }
        &self.cached.get_or_insert_with(|| (revision, derive(store))).1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NextActionType;

    #[test]
    fn test_set_error_grows_by_one_each_call() {
        let mut store = ViewStore::new();
        store.set_error("disconnected");
        store.set_error("disconnected");
        store.set_error("disconnected");

        let errors = select_errors(&store);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.recoverable));
    }

    #[test]
    fn test_set_loading_keeps_snapshot() {
        let mut store = ViewStore::new();
        store.update_state(DashboardState {
            output_root: Some("out".to_string()),
            ..Default::default()
        });
        store.set_loading(true);
        assert!(select_loading(&store));
        assert_eq!(select_output_root(&store), Some("out"));
    }

    #[test]
    fn test_memo_recomputes_on_revision_change() {
        let mut store = ViewStore::new();
        let mut memo: Memo<usize> = Memo::new();
        let mut calls = 0;

        memo.get(&store, |_| {
            calls += 1;
            0
        });
        memo.get(&store, |_| {
            calls += 1;
            0
        });
        assert_eq!(calls, 1);

        store.set_error("x");
        let len = *memo.get(&store, |s| {
            calls += 1;
            select_errors(s).len()
        });
        assert_eq!(calls, 2);
        assert_eq!(len, 1);
    }

    #[test]
    fn test_next_action_without_sprint() {
        let store = ViewStore::new();
        assert_eq!(store.next_action().action_type, NextActionType::SprintPlanning);
    }
}
