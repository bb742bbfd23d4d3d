//! bmad-board - view state, routing, and next-action derivation for a sprint dashboard webview
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod view;
