pub mod bridge;
pub mod host;
pub mod message;
pub mod navigation;
pub mod panel;
pub mod store;

use crate::config::Config;
use crate::data::DashboardState;
use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

pub use bridge::{ClickModifiers, DashboardBridge, EditorPanelBridge, ListenerGuard, MessageHandler};
pub use host::{host_api, install_host_api, HostChannel, JsonLineHost};
pub use message::{InboundMessage, OutboundMessage};
pub use navigation::{build_breadcrumbs, BreadcrumbItem, ViewKind, ViewRoute, MAX_HISTORY};
pub use panel::{EditorPanelStore, PendingContent};
pub use store::{Memo, ViewStore};

/// Drive an editor panel over stdio: inbound messages are JSON lines on stdin,
/// outbound messages go to stdout through the process-wide host handle.
///
/// Each line is handled to completion before the next one is read.
pub async fn run(config: Config) -> Result<()> {
    let seed = DashboardState {
        output_root: Some(config.project.output_root.clone()),
        default_click_behavior: config.ui.default_click_behavior,
        ..Default::default()
    };
    let mut panel = EditorPanelBridge::with_state(host_api(), seed);
    let _listener = panel.mount();

    panel.refresh();
    panel.request_file_tree();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        };
        let Some(line) = line else {
            break; // host closed the channel
        };
        if line.trim().is_empty() {
            continue;
        }

        if let Err(e) = panel.handle_raw(&line) {
            tracing::warn!("Bad inbound message: {:#}", e);
            panel.store_mut().set_error(format!("{:#}", e));
        }

        let store = panel.store();
        tracing::debug!(
            "route={:?} crumbs={} history={} loading={}",
            store.current_route().view,
            store.breadcrumbs().len(),
            store.history().len(),
            store.state().loading
        );
    }

    tracing::info!(
        "Session ended with {} error(s)",
        panel.store().state().errors.len()
    );
    Ok(())
}
