//! Route state for the editor panel: current route, bounded back-history, breadcrumbs.

use crate::data::{Epic, StorySummary};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Maximum number of routes kept for back navigation
pub const MAX_HISTORY: usize = 10;

pub const PARAM_EPIC_ID: &str = "epicId";
pub const PARAM_STORY_KEY: &str = "storyKey";
pub const PARAM_PATH: &str = "path";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Dashboard,
    Epics,
    Stories,
    Docs,
}

/// Where the panel is. Replaced wholesale on every navigation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewRoute {
    pub view: ViewKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,
}

impl ViewRoute {
    pub fn new(view: ViewKind) -> Self {
        Self { view, params: None }
    }

    pub fn dashboard() -> Self {
        Self::new(ViewKind::Dashboard)
    }

    pub fn epic(epic_id: impl Into<String>) -> Self {
        Self::new(ViewKind::Epics).with_param(PARAM_EPIC_ID, epic_id)
    }

    pub fn story(story_key: impl Into<String>) -> Self {
        Self::new(ViewKind::Stories).with_param(PARAM_STORY_KEY, story_key)
    }

    pub fn doc(path: impl Into<String>) -> Self {
        Self::new(ViewKind::Docs).with_param(PARAM_PATH, path)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .as_ref()
            .and_then(|p| p.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbItem {
    pub label: String,
    pub route: ViewRoute,
}

/// Data the breadcrumb labels are resolved against
#[derive(Debug, Clone, Copy)]
pub struct BreadcrumbContext<'a> {
    pub epics: &'a [Epic],
    pub story_summaries: &'a [StorySummary],
}

/// Build the trail for `route`: `Dashboard`, then one crumb per populated drill-down param.
pub fn build_breadcrumbs(route: &ViewRoute, ctx: BreadcrumbContext<'_>) -> Vec<BreadcrumbItem> {
    let mut crumbs = vec![BreadcrumbItem {
        label: "Dashboard".to_string(),
        route: ViewRoute::dashboard(),
    }];

    match route.view {
        ViewKind::Dashboard => {}
        ViewKind::Epics | ViewKind::Stories => {
            let epic_id = route.param(PARAM_EPIC_ID);
            if let Some(epic_id) = epic_id {
                crumbs.push(BreadcrumbItem {
                    label: epic_label(epic_id, ctx.epics),
                    route: ViewRoute::new(route.view).with_param(PARAM_EPIC_ID, epic_id),
                });
            }
            if let Some(story_key) = route.param(PARAM_STORY_KEY) {
                let mut story_route = ViewRoute::new(route.view);
                if let Some(epic_id) = epic_id {
                    story_route = story_route.with_param(PARAM_EPIC_ID, epic_id);
                }
                crumbs.push(BreadcrumbItem {
                    label: story_label(story_key, ctx.story_summaries),
                    route: story_route.with_param(PARAM_STORY_KEY, story_key),
                });
            }
        }
        ViewKind::Docs => {
            if let Some(path) = route.param(PARAM_PATH) {
                let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
                crumbs.push(BreadcrumbItem {
                    label: file_name.to_string(),
                    route: ViewRoute::doc(path),
                });
            }
        }
    }

    crumbs
}

fn epic_label(epic_id: &str, epics: &[Epic]) -> String {
    epics
        .iter()
        .find(|e| e.number.to_string() == epic_id || e.key == epic_id)
        .map(|e| format!("Epic {}: {}", e.number, e.title))
        .unwrap_or_else(|| epic_id.to_string())
}

fn story_label(story_key: &str, summaries: &[StorySummary]) -> String {
    summaries
        .iter()
        .find(|s| s.key == story_key)
        .map(|s| format!("Story {}: {}", s.display_number(), s.title))
        .unwrap_or_else(|| story_key.to_string())
}

/// Route state machine. Starts (and, with empty history, can only return) at the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationState {
    current_route: ViewRoute,
    history: VecDeque<ViewRoute>,
    breadcrumbs: Vec<BreadcrumbItem>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationState {
    pub fn new() -> Self {
        let current_route = ViewRoute::dashboard();
        let breadcrumbs = build_breadcrumbs(
            &current_route,
            BreadcrumbContext {
                epics: &[],
                story_summaries: &[],
            },
        );
        Self {
            current_route,
            history: VecDeque::with_capacity(MAX_HISTORY),
            breadcrumbs,
        }
    }

    pub fn current_route(&self) -> &ViewRoute {
        &self.current_route
    }

    /// Oldest first
    pub fn history(&self) -> &VecDeque<ViewRoute> {
        &self.history
    }

    pub fn breadcrumbs(&self) -> &[BreadcrumbItem] {
        &self.breadcrumbs
    }

    /// Push the current route to history and move to `route`.
    pub fn navigate_to(&mut self, route: ViewRoute, ctx: BreadcrumbContext<'_>) {
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        let previous = std::mem::replace(&mut self.current_route, route);
        self.history.push_back(previous);
        self.rebuild_breadcrumbs(ctx);
        tracing::debug!(
            "Navigated to {:?} (history: {})",
            self.current_route.view,
            self.history.len()
        );
    }

    /// Return to the most recent history entry. The abandoned route is discarded.
    ///
    /// Returns `false` when there is nothing to go back to.
    pub fn go_back(&mut self, ctx: BreadcrumbContext<'_>) -> bool {
        let Some(previous) = self.history.pop_back() else {
            return false;
        };
        self.current_route = previous;
        self.rebuild_breadcrumbs(ctx);
        true
    }

    /// Jump to the crumb at `index`, truncating crumbs to `[0..=index]` and history to
    /// its first `index` entries. Out-of-range indices are ignored.
    pub fn navigate_to_breadcrumb(&mut self, index: usize) -> bool {
        let Some(crumb) = self.breadcrumbs.get(index) else {
            return false;
        };
        self.current_route = crumb.route.clone();
        self.breadcrumbs.truncate(index + 1);
        self.history.truncate(index);
        true
    }

    /// Recompute crumbs for the current route, e.g. after epics or story summaries change.
    pub fn rebuild_breadcrumbs(&mut self, ctx: BreadcrumbContext<'_>) {
        self.breadcrumbs = build_breadcrumbs(&self.current_route, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EpicStatusValue, StoryStatusValue};
    use pretty_assertions::assert_eq;

    const EMPTY: BreadcrumbContext<'static> = BreadcrumbContext {
        epics: &[],
        story_summaries: &[],
    };

    fn epic(number: u32, title: &str) -> Epic {
        Epic {
            number,
            key: format!("epic-{}", number),
            title: title.to_string(),
            description: String::new(),
            metadata: BTreeMap::new(),
            stories: vec![],
            file_path: format!("epics/epic-{}.md", number),
            status: EpicStatusValue::InProgress,
        }
    }

    fn summary(key: &str, epic: u32, story: u32, title: &str) -> StorySummary {
        StorySummary {
            key: key.to_string(),
            epic_number: epic,
            story_number: story,
            story_suffix: None,
            title: title.to_string(),
            status: StoryStatusValue::InProgress,
            file_path: None,
            total_tasks: 0,
            completed_tasks: 0,
            total_subtasks: 0,
            completed_subtasks: 0,
        }
    }

    #[test]
    fn test_initial_state() {
        let nav = NavigationState::new();
        assert_eq!(nav.current_route(), &ViewRoute::dashboard());
        assert_eq!(nav.breadcrumbs().len(), 1);
        assert_eq!(nav.breadcrumbs()[0].label, "Dashboard");
        assert!(nav.history().is_empty());
    }

    #[test]
    fn test_breadcrumbs_resolve_labels() {
        let epics = vec![epic(2, "Payments")];
        let summaries = vec![summary("2-3-refunds", 2, 3, "Refunds")];
        let ctx = BreadcrumbContext {
            epics: &epics,
            story_summaries: &summaries,
        };

        let route = ViewRoute::epic("2").with_param(PARAM_STORY_KEY, "2-3-refunds");
        let crumbs = build_breadcrumbs(&route, ctx);

        let labels: Vec<&str> = crumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Dashboard", "Epic 2: Payments", "Story 2.3: Refunds"]);
        assert_eq!(crumbs[1].route, ViewRoute::epic("2"));
        assert_eq!(crumbs[2].route, route);
    }

    #[test]
    fn test_breadcrumbs_fall_back_to_raw_ids() {
        let route = ViewRoute::story("9-9-missing").with_param(PARAM_EPIC_ID, "9");
        let crumbs = build_breadcrumbs(&route, EMPTY);
        let labels: Vec<&str> = crumbs.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Dashboard", "9", "9-9-missing"]);
    }

    #[test]
    fn test_doc_breadcrumb_uses_file_name() {
        let crumbs = build_breadcrumbs(&ViewRoute::doc("planning/prd.md"), EMPTY);
        assert_eq!(crumbs.len(), 2);
        assert_eq!(crumbs[1].label, "prd.md");
    }

    #[test]
    fn test_crumb_count_follows_params_only() {
        assert_eq!(build_breadcrumbs(&ViewRoute::new(ViewKind::Epics), EMPTY).len(), 1);
        assert_eq!(build_breadcrumbs(&ViewRoute::new(ViewKind::Docs), EMPTY).len(), 1);
        let empty_param = ViewRoute::new(ViewKind::Epics).with_param(PARAM_EPIC_ID, "");
        assert_eq!(build_breadcrumbs(&empty_param, EMPTY).len(), 1);
    }

    #[test]
    fn test_go_back_on_empty_history_is_noop() {
        let mut nav = NavigationState::new();
        assert!(!nav.go_back(EMPTY));
        assert_eq!(nav, NavigationState::new());
    }

    #[test]
    fn test_out_of_range_breadcrumb_is_noop() {
        let mut nav = NavigationState::new();
        nav.navigate_to(ViewRoute::epic("1"), EMPTY);
        let before = nav.clone();
        assert!(!nav.navigate_to_breadcrumb(5));
        assert_eq!(nav, before);
    }
}
