//! Message bridge: inbound host messages become store mutations, user actions become
//! outbound host messages.
//!
//! Two views share the protocol. The dashboard only cares about state and errors; the
//! editor panel also routes, loads documents, and shows story detail.

use super::host::HostChannel;
use super::message::{InboundMessage, OutboundMessage};
use super::navigation::ViewRoute;
use super::panel::{EditorPanelStore, PendingContent};
use super::store::{Memo, ViewStore};
use crate::data::{parse_story_content, DashboardState, NextAction};
use anyhow::Result;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// Modifier keys held during a click on a document link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClickModifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Cmd on macOS
    pub meta: bool,
}

impl ClickModifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Keeps a view's message listener registered. Dropping it deregisters the listener.
#[must_use = "the listener is removed as soon as the guard is dropped"]
pub struct ListenerGuard {
    active: Rc<Cell<bool>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.active.set(false);
        tracing::debug!("Message listener removed");
    }
}

/// Something that consumes inbound host messages.
pub trait MessageHandler {
    fn handle(&mut self, message: InboundMessage);

    /// `false` while the view is unmounted; messages are then dropped.
    fn is_listening(&self) -> bool;

    /// Decode and handle one raw message.
    ///
    /// Returns `Ok(true)` if a message was handled, `Ok(false)` if it was ignored
    /// (unknown type or no listener), and an error for malformed known messages.
    fn handle_raw(&mut self, raw: &str) -> Result<bool> {
        if !self.is_listening() {
            tracing::debug!("No listener mounted, dropping inbound message");
            return Ok(false);
        }
        match InboundMessage::decode(raw)? {
            Some(message) => {
                self.handle(message);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn mount(listener: &Rc<Cell<bool>>) -> ListenerGuard {
    if listener.replace(true) {
        tracing::warn!("Message listener mounted twice");
    }
    ListenerGuard {
        active: Rc::clone(listener),
    }
}

/// Outbound actions available to every view
fn open_document_message(path: &str, modifiers: ClickModifiers) -> OutboundMessage {
    OutboundMessage::OpenDocument {
        path: path.to_string(),
        force_text_editor: modifiers.any().then_some(true),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dashboard
// ─────────────────────────────────────────────────────────────────────────────

pub struct DashboardBridge {
    store: ViewStore,
    host: Arc<dyn HostChannel>,
    listener: Rc<Cell<bool>>,
    next_action: Memo<NextAction>,
}

impl DashboardBridge {
    pub fn new(host: Arc<dyn HostChannel>) -> Self {
        Self {
            store: ViewStore::new(),
            host,
            listener: Rc::new(Cell::new(false)),
            next_action: Memo::new(),
        }
    }

    pub fn mount(&self) -> ListenerGuard {
        mount(&self.listener)
    }

    pub fn store(&self) -> &ViewStore {
        &self.store
    }

    pub fn next_action(&mut self) -> &NextAction {
        self.next_action.get(&self.store, ViewStore::next_action)
    }

    pub fn refresh(&mut self) {
        self.store.set_loading(true);
        self.host.post_message(&OutboundMessage::Refresh);
    }

    pub fn open_document(&self, path: &str, modifiers: ClickModifiers) {
        self.host
            .post_message(&open_document_message(path, modifiers));
    }

    pub fn execute_workflow(&self, command: &str) {
        self.host.post_message(&OutboundMessage::ExecuteWorkflow {
            command: command.to_string(),
        });
    }

    pub fn copy_command(&self, command: &str) {
        self.host.post_message(&OutboundMessage::CopyCommand {
            command: command.to_string(),
        });
    }

    /// Run the workflow behind the current recommendation, if it has one.
    pub fn run_next_action(&mut self) -> bool {
        let Some(command) = self.next_action().action_type.workflow_command() else {
            return false;
        };
        self.execute_workflow(command);
        true
    }
}

impl MessageHandler for DashboardBridge {
    fn handle(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::StateUpdate(snapshot) => self.store.update_state(snapshot),
            InboundMessage::Error(payload) => self.store.set_error(payload.message),
            InboundMessage::DocumentContent(_)
            | InboundMessage::FileTree(_)
            | InboundMessage::NavigateToView(_) => {
                tracing::debug!("Dashboard ignores {}", message.type_name());
            }
        }
    }

    fn is_listening(&self) -> bool {
        self.listener.get()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Editor panel
// ─────────────────────────────────────────────────────────────────────────────

pub struct EditorPanelBridge {
    store: EditorPanelStore,
    host: Arc<dyn HostChannel>,
    listener: Rc<Cell<bool>>,
}

impl EditorPanelBridge {
    pub fn new(host: Arc<dyn HostChannel>) -> Self {
        Self::with_state(host, DashboardState::default())
    }

    /// Start from a seeded snapshot (e.g. local config defaults) until the host sends one.
    pub fn with_state(host: Arc<dyn HostChannel>, state: DashboardState) -> Self {
        Self {
            store: EditorPanelStore::with_state(state),
            host,
            listener: Rc::new(Cell::new(false)),
        }
    }

    pub fn mount(&self) -> ListenerGuard {
        mount(&self.listener)
    }

    pub fn store(&self) -> &EditorPanelStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EditorPanelStore {
        &mut self.store
    }

    pub fn refresh(&mut self) {
        self.store.set_loading(true);
        self.host.post_message(&OutboundMessage::Refresh);
    }

    pub fn request_file_tree(&mut self) {
        self.store.file_tree_loading = true;
        self.host.post_message(&OutboundMessage::RequestFileTree);
    }

    /// Show a document in the docs view and ask the host for its content.
    pub fn open_doc(&mut self, path: &str) {
        self.store.navigate_to(ViewRoute::doc(path));
        self.store.selected_doc = None;
        self.store.doc_loading = true;
        self.store.pending_content = Some(PendingContent::Document {
            path: path.to_string(),
        });
        self.request_content(path);
    }

    /// Load a story file into the story detail view.
    pub fn open_story_detail(&mut self, path: &str) {
        self.store.story_detail = None;
        self.store.story_detail_loading = true;
        self.store.pending_content = Some(PendingContent::StoryDetail {
            path: path.to_string(),
        });
        self.request_content(path);
    }

    /// Story detail unmounted.
    pub fn close_story_detail(&mut self) {
        self.store.clear_story_detail();
    }

    pub fn open_document(&self, path: &str, modifiers: ClickModifiers) {
        self.host
            .post_message(&open_document_message(path, modifiers));
    }

    pub fn execute_workflow(&self, command: &str) {
        self.host.post_message(&OutboundMessage::ExecuteWorkflow {
            command: command.to_string(),
        });
    }

    pub fn copy_command(&self, command: &str) {
        self.host.post_message(&OutboundMessage::CopyCommand {
            command: command.to_string(),
        });
    }

    pub fn navigate_to(&mut self, route: ViewRoute) {
        self.store.navigate_to(route);
    }

    pub fn go_back(&mut self) -> bool {
        self.store.go_back()
    }

    pub fn navigate_to_breadcrumb(&mut self, index: usize) -> bool {
        self.store.navigate_to_breadcrumb(index)
    }

    fn request_content(&self, path: &str) {
        self.host.post_message(&OutboundMessage::RequestDocumentContent {
            path: path.to_string(),
        });
    }

    fn receive_content(&mut self, doc: crate::data::DocumentContent) {
        match self.store.pending_content.take() {
            Some(PendingContent::StoryDetail { .. }) => {
                self.store.story_detail = parse_story_content(&doc.content, &doc.path);
                if self.store.story_detail.is_none() {
                    tracing::debug!("{} is not a story file", doc.path);
                }
                self.store.story_detail_loading = false;
            }
            Some(PendingContent::Document { .. }) => {
                self.store.selected_doc = Some(doc);
                self.store.doc_loading = false;
            }
            None => {
                tracing::debug!("Dropping unrequested content for {}", doc.path);
            }
        }
    }
}

impl MessageHandler for EditorPanelBridge {
    fn handle(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::StateUpdate(snapshot) => self.store.update_state(snapshot),
            InboundMessage::Error(payload) => self.store.set_error(payload.message),
            InboundMessage::DocumentContent(doc) => self.receive_content(doc),
            InboundMessage::FileTree(tree) => self.store.set_file_tree(tree.roots),
            InboundMessage::NavigateToView(route) => self.store.navigate_to(route),
        }
    }

    fn is_listening(&self) -> bool {
        self.listener.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl HostChannel for Recorder {
        fn post_message(&self, message: &OutboundMessage) {
            self.sent.lock().unwrap().push(message.clone());
        }
    }

    #[test]
    fn test_unmounted_view_drops_messages() {
        let host = Arc::new(Recorder::default());
        let mut panel = EditorPanelBridge::new(host);
        let raw = r#"{"type":"ERROR","payload":{"message":"x"}}"#;

        assert!(!panel.handle_raw(raw).unwrap());
        {
            let _listener = panel.mount();
            assert!(panel.handle_raw(raw).unwrap());
        }
        assert!(!panel.handle_raw(raw).unwrap());
        assert_eq!(panel.store().state().errors.len(), 1);
    }

    #[test]
    fn test_modifier_click_forces_text_editor() {
        let host = Arc::new(Recorder::default());
        let dashboard = DashboardBridge::new(host.clone());
        dashboard.open_document("a.md", ClickModifiers::default());
        dashboard.open_document(
            "a.md",
            ClickModifiers {
                meta: true,
                ..Default::default()
            },
        );

        let sent = host.sent.lock().unwrap();
        assert_eq!(
            sent[0],
            OutboundMessage::OpenDocument {
                path: "a.md".to_string(),
                force_text_editor: None
            }
        );
        assert_eq!(
            sent[1],
            OutboundMessage::OpenDocument {
                path: "a.md".to_string(),
                force_text_editor: Some(true)
            }
        );
    }

    #[test]
    fn test_run_next_action_executes_workflow() {
        let host = Arc::new(Recorder::default());
        let mut dashboard = DashboardBridge::new(host.clone());
        assert!(dashboard.run_next_action());
        assert_eq!(
            host.sent.lock().unwrap().last(),
            Some(&OutboundMessage::ExecuteWorkflow {
                command: "/bmad-bmm-sprint-planning".to_string()
            })
        );
    }
}
