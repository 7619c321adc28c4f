#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Once};
use std::time::Duration;

use promptcast_core::{HostCommand, LoadId, PanelReply, PanelSource};
use promptcast_engine::{HostEvents, PanelConnector, PanelLink};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(cast_logging::initialize_for_tests);
}

pub fn sources(urls: &[&str]) -> Vec<PanelSource> {
    urls.iter()
        .enumerate()
        .map(|(index, url)| PanelSource::new(url, index as i64).expect("valid url"))
        .collect()
}

/// A chat page whose assistant turns use the ChatGPT markup.
pub fn chatgpt_page(turns: &[&str]) -> String {
    let turns: String = turns
        .iter()
        .map(|turn| format!(r#"<div data-message-author-role="assistant"><p>{turn}</p></div>"#))
        .collect();
    format!(
        r#"<html><body><main>{turns}</main><textarea id="prompt-textarea"></textarea><button data-testid="send-button">Send</button></body></html>"#
    )
}

/// How a scripted panel answers `getLastOutput`.
#[derive(Debug, Clone)]
pub enum Script {
    /// Replies with `text` after `delay`.
    Reply { text: String, delay: Duration },
    /// Never replies.
    Silent,
}

impl Script {
    pub fn reply(text: &str, delay_ms: u64) -> Self {
        Script::Reply {
            text: text.to_string(),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Panels that load instantly and answer per hostname script. Injected
/// prompts are recorded.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    scripts: HashMap<String, Script>,
    pub injected: Arc<std::sync::Mutex<Vec<(String, String)>>>,
    pub connects: Arc<std::sync::Mutex<Vec<String>>>,
}

impl ScriptedConnector {
    pub fn new(scripts: &[(&str, Script)]) -> Self {
        Self {
            scripts: scripts
                .iter()
                .map(|(host, script)| (host.to_string(), script.clone()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn injected(&self) -> Vec<(String, String)> {
        self.injected.lock().unwrap().clone()
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

impl PanelConnector for ScriptedConnector {
    fn connect(&self, source: &PanelSource, load: LoadId, events: HostEvents) -> PanelLink {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let hostname = source.hostname();
        let source_id = source.id.clone();
        let script = self.scripts.get(&hostname).cloned().unwrap_or(Script::Silent);
        let injected = self.injected.clone();
        self.connects.lock().unwrap().push(hostname.clone());

        events.panel_loaded(&source_id, load);
        tokio::spawn(async move {
            loop {
                let raw = tokio::select! {
                    _ = token.cancelled() => return,
                    raw = rx.recv() => match raw {
                        Some(raw) => raw,
                        None => return,
                    },
                };
                match HostCommand::from_wire(&raw).unwrap() {
                    HostCommand::InjectPrompt { prompt } => {
                        injected.lock().unwrap().push((hostname.clone(), prompt));
                    }
                    HostCommand::GetLastOutput { request_id } => {
                        let Script::Reply { text, delay } = script.clone() else {
                            continue;
                        };
                        let events = events.clone();
                        let source_id = source_id.clone();
                        let hostname = hostname.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            let reply = PanelReply::last_output(hostname, Some(text), request_id);
                            events.post_reply(&source_id, &reply.to_wire().unwrap());
                        });
                    }
                }
            }
        });
        PanelLink::new(tx, cancel)
    }
}
