//! Access to the host's message channel.
//!
//! The host API can be acquired once per process. [`host_api`] hands out that single
//! handle, initialising it on first use; views take an `Arc<dyn HostChannel>` so tests
//! can inject their own channel instead.

use super::message::OutboundMessage;
use anyhow::Result;
use once_cell::sync::OnceCell;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Outbound side of the webview <-> host channel
pub trait HostChannel: Send + Sync {
    fn post_message(&self, message: &OutboundMessage);
}

static HOST_API: OnceCell<Arc<dyn HostChannel>> = OnceCell::new();

/// Install the process-wide host handle. Fails if a handle was already acquired.
pub fn install_host_api(host: Arc<dyn HostChannel>) -> Result<()> {
    HOST_API
        .set(host)
        .map_err(|_| anyhow::anyhow!("Host API has already been acquired"))
}

/// The process-wide host handle. Defaults to JSON lines on stdout.
pub fn host_api() -> Arc<dyn HostChannel> {
    HOST_API
        .get_or_init(|| Arc::new(JsonLineHost::new(std::io::stdout())))
        .clone()
}

/// Writes each outbound message as one line of JSON.
pub struct JsonLineHost<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineHost<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> HostChannel for JsonLineHost<W> {
    fn post_message(&self, message: &OutboundMessage) {
        let line = match message.to_json() {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to encode outbound message: {}", e);
                return;
            }
        };
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            tracing::warn!("Failed to post message to host: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_line_host_writes_one_line_per_message() {
        let host = JsonLineHost::new(Vec::new());
        host.post_message(&OutboundMessage::Refresh);
        host.post_message(&OutboundMessage::CopyCommand {
            command: "/bmad-bmm-dev-story".to_string(),
        });

        let out = String::from_utf8(host.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"type":"REFRESH"}"#);
        assert!(lines[1].contains("COPY_COMMAND"));
    }
}
