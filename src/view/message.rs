//! Messages exchanged with the extension host.
//!
//! Both directions are closed enums with the wire shape `{ "type": ..., "payload": ... }`.
//! Unknown inbound types are filtered out in [`InboundMessage::decode`] before typed
//! decoding, so a misspelled payload of a known type still surfaces as an error.

use super::navigation::ViewRoute;
use crate::data::{DashboardState, DocumentContent, FileTreeNode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreePayload {
    pub roots: Vec<FileTreeNode>,
}

/// Host -> webview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    /// Full snapshot replacement
    StateUpdate(DashboardState),
    Error(ErrorPayload),
    DocumentContent(DocumentContent),
    FileTree(FileTreePayload),
    /// Host-driven navigation, same effect as a local navigation
    NavigateToView(ViewRoute),
}

impl InboundMessage {
    pub const KNOWN_TYPES: [&'static str; 5] = [
        "STATE_UPDATE",
        "ERROR",
        "DOCUMENT_CONTENT",
        "FILE_TREE",
        "NAVIGATE_TO_VIEW",
    ];

    /// Decode one raw message. Returns `Ok(None)` for message types this view does not know.
    pub fn decode(raw: &str) -> Result<Option<Self>> {
        let value: serde_json::Value =
            serde_json::from_str(raw).context("Inbound message is not valid JSON")?;

        let Some(kind) = value.get("type").and_then(|t| t.as_str()) else {
            tracing::debug!("Ignoring inbound message without a type");
            return Ok(None);
        };
        if !Self::KNOWN_TYPES.iter().any(|known| *known == kind) {
            tracing::debug!("Ignoring unknown inbound message type {}", kind);
            return Ok(None);
        }

        let kind = kind.to_string();
        let message = serde_json::from_value(value)
            .with_context(|| format!("Malformed {} message", kind))?;
        Ok(Some(message))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::StateUpdate(_) => "STATE_UPDATE",
            Self::Error(_) => "ERROR",
            Self::DocumentContent(_) => "DOCUMENT_CONTENT",
            Self::FileTree(_) => "FILE_TREE",
            Self::NavigateToView(_) => "NAVIGATE_TO_VIEW",
        }
    }
}

/// Webview -> host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundMessage {
    /// Ask for a fresh `STATE_UPDATE`
    Refresh,
    OpenDocument {
        path: String,
        #[serde(
            rename = "forceTextEditor",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        force_text_editor: Option<bool>,
    },
    ExecuteWorkflow {
        command: String,
    },
    CopyCommand {
        command: String,
    },
    RequestFileTree,
    RequestDocumentContent {
        path: String,
    },
}

impl OutboundMessage {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize outbound message")
    }
}
