//! Panel-side command handling.
use std::sync::Arc;

use cast_logging::{cast_debug, cast_warn};
use promptcast_core::{HostCommand, PanelReply, SourceId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::adapters::{AdapterRegistry, SiteAdapter};
use crate::document::PanelDocument;
use crate::host::HostEvents;
use crate::waiter::WaitSettings;

/// Runs inside one panel: decodes commands, drives the adapter, replies.
#[derive(Clone)]
pub struct PanelAgent {
    hostname: String,
    adapter: SiteAdapter,
    document: Arc<dyn PanelDocument>,
    wait: WaitSettings,
}

impl PanelAgent {
    pub fn new(
        hostname: impl Into<String>,
        document: Arc<dyn PanelDocument>,
        registry: &AdapterRegistry,
        wait: WaitSettings,
    ) -> Self {
        let hostname = hostname.into();
        let adapter = registry.resolve(&hostname);
        Self {
            hostname,
            adapter,
            document,
            wait,
        }
    }

    pub fn adapter(&self) -> SiteAdapter {
        self.adapter
    }

    pub async fn handle(&self, command: HostCommand) -> Option<PanelReply> {
        match command {
            HostCommand::InjectPrompt { prompt } => {
                if let Err(err) = self
                    .adapter
                    .inject(self.document.as_ref(), &prompt, &self.wait)
                    .await
                {
                    cast_warn!("{}: {}", self.hostname, err);
                }
                None
            }
            HostCommand::GetLastOutput { request_id } => {
                let output = self.adapter.extract(self.document.as_ref());
                Some(PanelReply::last_output(
                    self.hostname.clone(),
                    Some(output),
                    request_id,
                ))
            }
        }
    }

    /// Handles one serialized command and returns the serialized reply.
    pub async fn handle_wire(&self, raw: &str) -> Option<String> {
        let command = match HostCommand::from_wire(raw) {
            Ok(command) => command,
            Err(err) => {
                cast_warn!("{}: ignoring command: {}", self.hostname, err);
                return None;
            }
        };
        let reply = self.handle(command).await?;
        match reply.to_wire() {
            Ok(raw) => Some(raw),
            Err(err) => {
                cast_warn!("{}: cannot encode reply: {}", self.hostname, err);
                None
            }
        }
    }

    /// Serves commands until the host drops the panel.
    ///
    /// Commands are handled concurrently, as in a page where a slow
    /// injection must not hold up an extraction.
    pub async fn run(
        self,
        source_id: SourceId,
        mut commands: mpsc::UnboundedReceiver<String>,
        events: HostEvents,
        cancel: CancellationToken,
    ) {
        loop {
            let raw = tokio::select! {
                _ = cancel.cancelled() => break,
                next = commands.recv() => match next {
                    Some(raw) => raw,
                    None => break,
                },
            };
            let agent = self.clone();
            let source_id = source_id.clone();
            let events = events.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let reply = tokio::select! {
                    _ = cancel.cancelled() => None,
                    reply = agent.handle_wire(&raw) => reply,
                };
                if let Some(reply) = reply {
                    events.post_reply(&source_id, &reply);
                }
            });
        }
        cast_debug!("{}: panel closed", self.hostname);
    }
}
