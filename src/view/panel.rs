//! Editor-panel state: the base store plus routing, documents, and story detail.

use super::navigation::{BreadcrumbContext, BreadcrumbItem, NavigationState, ViewRoute};
use super::store::ViewStore;
use crate::data::{DashboardState, DocumentContent, FileTreeNode, Story};
use std::collections::VecDeque;

/// Which `REQUEST_DOCUMENT_CONTENT` is waiting for an answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingContent {
    /// Raw document for the docs view
    Document { path: String },
    /// Story file, parsed on arrival
    StoryDetail { path: String },
}

#[derive(Debug, Clone, Default)]
pub struct EditorPanelStore {
    base: ViewStore,
    nav: NavigationState,
    pub file_tree: Vec<FileTreeNode>,
    pub file_tree_loading: bool,
    pub selected_doc: Option<DocumentContent>,
    pub doc_loading: bool,
    pub story_detail: Option<Story>,
    pub story_detail_loading: bool,
    pub pending_content: Option<PendingContent>,
}

impl EditorPanelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: DashboardState) -> Self {
        Self {
            base: ViewStore::with_state(state),
            ..Default::default()
        }
    }

    pub fn base(&self) -> &ViewStore {
        &self.base
    }

    pub fn state(&self) -> &DashboardState {
        self.base.state()
    }

    /// Replace the snapshot and re-resolve breadcrumb labels against it.
    pub fn update_state(&mut self, snapshot: DashboardState) {
        self.base.update_state(snapshot);
        let Self { base, nav, .. } = self;
        nav.rebuild_breadcrumbs(breadcrumb_context(base));
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.base.set_loading(loading);
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.base.set_error(message);
    }

    pub fn current_route(&self) -> &ViewRoute {
        self.nav.current_route()
    }

    pub fn history(&self) -> &VecDeque<ViewRoute> {
        self.nav.history()
    }

    pub fn breadcrumbs(&self) -> &[BreadcrumbItem] {
        self.nav.breadcrumbs()
    }

    pub fn navigate_to(&mut self, route: ViewRoute) {
        let Self { base, nav, .. } = self;
        nav.navigate_to(route, breadcrumb_context(base));
    }

    pub fn go_back(&mut self) -> bool {
        let Self { base, nav, .. } = self;
        nav.go_back(breadcrumb_context(base))
    }

    pub fn navigate_to_breadcrumb(&mut self, index: usize) -> bool {
        self.nav.navigate_to_breadcrumb(index)
    }

    pub fn set_file_tree(&mut self, roots: Vec<FileTreeNode>) {
        self.file_tree = roots;
        self.file_tree_loading = false;
    }

    /// Unmount cleanup for the story detail view. Clears detail state unconditionally,
    /// so whatever request is still in flight is superseded by the next one.
    pub fn clear_story_detail(&mut self) {
        self.story_detail = None;
        self.story_detail_loading = false;
        if matches!(self.pending_content, Some(PendingContent::StoryDetail { .. })) {
            self.pending_content = None;
        }
    }
}

fn breadcrumb_context(store: &ViewStore) -> BreadcrumbContext<'_> {
    BreadcrumbContext {
        epics: &store.state().epics,
        story_summaries: &store.state().story_summaries,
    }
}
