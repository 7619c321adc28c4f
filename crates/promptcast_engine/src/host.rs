//! Host runner: owns the orchestration state and executes its effects.
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use cast_logging::{cast_debug, cast_error, cast_info, cast_warn};
use promptcast_core::{
    update, AppState, AppViewModel, BroadcastOutcome, CollectionReport, Effect, LoadId, Msg,
    Notice, PanelReply, PanelSource, RequestId, SourceId,
};
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::adapters::AdapterRegistry;
use crate::agent::PanelAgent;
use crate::clipboard::ClipboardSink;
use crate::loader::DocumentLoader;
use crate::store::ConfigStore;
use crate::waiter::WaitSettings;
use crate::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSettings {
    pub collect_deadline: Duration,
    pub load_timeout: Duration,
    pub wait: WaitSettings,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            collect_deadline: promptcast_core::DEFAULT_COLLECT_DEADLINE,
            load_timeout: Duration::from_secs(20),
            wait: WaitSettings::default(),
        }
    }
}

/// The only way panels and timers talk back to the host.
#[derive(Debug, Clone)]
pub struct HostEvents {
    tx: mpsc::UnboundedSender<Msg>,
}

impl HostEvents {
    pub fn send(&self, msg: Msg) {
        let _ = self.tx.send(msg);
    }

    pub fn panel_loaded(&self, source_id: &SourceId, load: LoadId) {
        self.send(Msg::PanelLoaded {
            source_id: source_id.clone(),
            load,
        });
    }

    pub fn panel_failed(&self, source_id: &SourceId, load: LoadId, reason: impl Into<String>) {
        self.send(Msg::PanelLoadFailed {
            source_id: source_id.clone(),
            load,
            reason: reason.into(),
        });
    }

    /// Accepts a serialized reply from the panel of `source_id`.
    pub fn post_reply(&self, source_id: &SourceId, raw: &str) {
        match PanelReply::from_wire(raw) {
            Ok(reply) => self.send(Msg::ReplyReceived {
                source_id: source_id.clone(),
                reply,
            }),
            Err(err) => cast_warn!("Dropping reply from {}: {}", source_id, err),
        }
    }

    fn deadline_elapsed(&self, request_id: RequestId) {
        self.send(Msg::DeadlineElapsed { request_id });
    }
}

/// Host end of one panel. Dropping it shuts the panel down.
#[derive(Debug)]
pub struct PanelLink {
    commands: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl PanelLink {
    pub fn new(commands: mpsc::UnboundedSender<String>, cancel: CancellationToken) -> Self {
        Self { commands, cancel }
    }

    /// Fire-and-forget; false if the panel is gone.
    pub fn post(&self, raw: String) -> bool {
        self.commands.send(raw).is_ok()
    }
}

impl Drop for PanelLink {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Creates panels.
pub trait PanelConnector: Send + Sync {
    /// Starts the panel for `source`. The panel must eventually report
    /// `PanelLoaded` or `PanelLoadFailed` for `load` through `events`,
    /// unless dropped.
    fn connect(&self, source: &PanelSource, load: LoadId, events: HostEvents) -> PanelLink;
}

/// Panels backed by a [`DocumentLoader`] and a [`PanelAgent`].
pub struct DocumentConnector<L> {
    loader: Arc<L>,
    registry: Arc<AdapterRegistry>,
    settings: HostSettings,
}

impl<L: DocumentLoader + 'static> DocumentConnector<L> {
    pub fn new(loader: L, registry: AdapterRegistry, settings: HostSettings) -> Self {
        Self {
            loader: Arc::new(loader),
            registry: Arc::new(registry),
            settings,
        }
    }
}

impl<L: DocumentLoader + 'static> PanelConnector for DocumentConnector<L> {
    fn connect(&self, source: &PanelSource, load: LoadId, events: HostEvents) -> PanelLink {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let loader = self.loader.clone();
        let registry = self.registry.clone();
        let settings = self.settings;
        let source = source.clone();
        let token = cancel.clone();

        tokio::spawn(async move {
            let loaded = tokio::select! {
                _ = token.cancelled() => return,
                loaded = time::timeout(settings.load_timeout, loader.load(&source)) => loaded,
            };
            let document = match loaded {
                Ok(Ok(document)) => document,
                Ok(Err(err)) => {
                    events.panel_failed(&source.id, load, err.to_string());
                    return;
                }
                Err(_) => {
                    let err = LoadError::Timeout(settings.load_timeout);
                    events.panel_failed(&source.id, load, err.to_string());
                    return;
                }
            };
            let agent = PanelAgent::new(source.hostname(), document, &registry, settings.wait);
            cast_debug!("{} served by {:?}", source.hostname(), agent.adapter());
            events.panel_loaded(&source.id, load);
            agent.run(source.id.clone(), rx, events, token).await;
        });

        PanelLink::new(tx, cancel)
    }
}

/// Owns the [`AppState`], the panel cache, and the side-effect sinks.
pub struct Host {
    state: AppState,
    panels: HashMap<SourceId, PanelLink>,
    connector: Arc<dyn PanelConnector>,
    clipboard: Arc<dyn ClipboardSink>,
    store: Option<Arc<dyn ConfigStore>>,
    events: HostEvents,
    inbox: mpsc::UnboundedReceiver<Msg>,
    finished: VecDeque<CollectionReport>,
}

impl Host {
    pub fn new(
        connector: Arc<dyn PanelConnector>,
        clipboard: Arc<dyn ClipboardSink>,
        settings: HostSettings,
    ) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        Self {
            state: AppState::new().with_collect_deadline(settings.collect_deadline),
            panels: HashMap::new(),
            connector,
            clipboard,
            store: None,
            events: HostEvents { tx },
            inbox,
            finished: VecDeque::new(),
        }
    }

    /// Persists source edits to `store`.
    pub fn with_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn events(&self) -> HostEvents {
        self.events.clone()
    }

    pub fn cached_panels(&self) -> usize {
        self.panels.len()
    }

    /// Reads sources and templates from the configured store.
    pub fn load_config(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        match store.prompts() {
            Ok(prompts) => self.dispatch(Msg::PromptsLoaded(prompts)),
            Err(err) => cast_error!("Cannot read prompt templates: {}", err),
        }
        match store.sources() {
            Ok(sources) => self.dispatch(Msg::SourcesLoaded(sources)),
            Err(err) => cast_error!("Cannot read sources: {}", err),
        }
    }

    /// Applies one message and runs the resulting effects.
    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Waits for the next panel or timer message and applies it.
    pub async fn step(&mut self) {
        // The host holds a sender itself, so the inbox never closes.
        if let Some(msg) = self.inbox.recv().await {
            self.dispatch(msg);
        }
    }

    /// Processes messages until no cached panel is still loading.
    pub async fn wait_for_panels(&mut self) {
        while self.state.loading_panels() > 0 {
            self.step().await;
        }
    }

    /// Processes messages for `period`, e.g. while injections complete.
    pub async fn run_for(&mut self, period: Duration) {
        let until = time::Instant::now() + period;
        while time::timeout_at(until, self.step()).await.is_ok() {}
    }

    /// Processes messages until a collection finishes.
    pub async fn next_report(&mut self) -> CollectionReport {
        loop {
            if let Some(report) = self.finished.pop_front() {
                return report;
            }
            self.step().await;
        }
    }

    /// Sends `prompt` to every selected, loaded panel.
    pub fn broadcast(&mut self, prompt: &str) -> BroadcastOutcome {
        self.dispatch(Msg::InputChanged(prompt.to_string()));
        self.dispatch(Msg::BroadcastClicked);
        self.last_broadcast()
    }

    /// Collects the latest output of every selected, loaded panel.
    pub async fn collect_all(&mut self) -> CollectionReport {
        self.dispatch(Msg::CollectAllClicked);
        self.next_report().await
    }

    /// Appends the latest output of one panel.
    pub async fn collect_one(&mut self, source_id: &SourceId) -> CollectionReport {
        self.dispatch(Msg::PanelCollectClicked {
            source_id: source_id.clone(),
        });
        self.next_report().await
    }

    fn last_broadcast(&self) -> BroadcastOutcome {
        match self.state.notice() {
            Some(Notice::Broadcast(outcome)) => *outcome,
            _ => BroadcastOutcome::NothingToSend,
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::LoadPanel { source, load } => {
                cast_info!("Loading panel {} ({}, {})", source.hostname(), source.url, load);
                let link = self.connector.connect(&source, load, self.events.clone());
                // Replacing a link drops (and stops) the previous panel.
                self.panels.insert(source.id, link);
            }
            Effect::DropPanel { source_id } => {
                if self.panels.remove(&source_id).is_some() {
                    cast_info!("Released panel {}", source_id);
                }
            }
            Effect::SendCommand { source_id, command } => {
                let Some(link) = self.panels.get(&source_id) else {
                    cast_warn!("No panel for {}; command dropped", source_id);
                    return;
                };
                match command.to_wire() {
                    Ok(raw) => {
                        if !link.post(raw) {
                            cast_warn!("Panel {} is gone; command dropped", source_id);
                        }
                    }
                    Err(err) => cast_error!("Cannot encode command: {}", err),
                }
            }
            Effect::ScheduleDeadline { request_id, after } => {
                let events = self.events.clone();
                tokio::spawn(async move {
                    time::sleep(after).await;
                    events.deadline_elapsed(request_id);
                });
            }
            Effect::CopyToClipboard { text } => {
                if let Err(err) = self.clipboard.copy(&text) {
                    cast_warn!("Clipboard copy failed: {}", err);
                }
            }
            Effect::PersistSources { sources } => {
                if let Some(store) = &self.store {
                    if let Err(err) = store.save_sources(&sources) {
                        cast_error!("Cannot persist sources: {}", err);
                    }
                }
            }
            Effect::CollectionFinished { report } => self.finished.push_back(report),
        }
    }
}
