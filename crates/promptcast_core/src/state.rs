use std::collections::BTreeMap;
use std::time::Duration;

use cast_logging::{cast_debug, cast_info, cast_warn};

use crate::collection::{Acceptance, FinishReason};
use crate::layout::menu_actions;
use crate::view_model::{
    AppViewModel, BroadcastOutcome, Notice, PanelRowStatus, PanelStatus, SourceRowView,
};
use crate::{
    append_to_composed, renumber, CollectedOutput, CollectionKind, CollectionReport, Effect,
    HostCommand, LoadId, PanelReply, PanelSource, PendingCollection, PromptTemplate, RequestId, SourceId,
};

pub const DEFAULT_COLLECT_DEADLINE: Duration = Duration::from_millis(1500);
pub const DEFAULT_LANGUAGE: &str = "English";

/// One cached panel: its status and the load attempt that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PanelSlot {
    status: PanelStatus,
    load: LoadId,
}

/// Host-side orchestration state. Owned by one runner; no globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    /// Sorted by `order`; this is the selection order.
    sources: Vec<PanelSource>,
    prompts: Vec<PromptTemplate>,
    language: String,
    input: String,
    composed: String,
    /// Panel handle cache, keyed by source id.
    panels: BTreeMap<SourceId, PanelSlot>,
    next_load: u64,
    /// Sources whose panel failed to load, with the reason.
    failed: BTreeMap<SourceId, String>,
    collections: BTreeMap<RequestId, PendingCollection>,
    /// The collection each source currently answers to, per kind. A newer
    /// collection only supersedes an older one of the same kind.
    active_requests: BTreeMap<(SourceId, CollectionKind), RequestId>,
    next_request: u64,
    collect_deadline: Duration,
    notice: Option<Notice>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            prompts: Vec::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            input: String::new(),
            composed: String::new(),
            panels: BTreeMap::new(),
            next_load: 1,
            failed: BTreeMap::new(),
            collections: BTreeMap::new(),
            active_requests: BTreeMap::new(),
            next_request: 1,
            collect_deadline: DEFAULT_COLLECT_DEADLINE,
            notice: None,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collect_deadline(mut self, deadline: Duration) -> Self {
        self.collect_deadline = deadline;
        self
    }

    pub fn sources(&self) -> &[PanelSource] {
        &self.sources
    }

    pub fn source(&self, source_id: &SourceId) -> Option<&PanelSource> {
        self.sources.iter().find(|source| &source.id == source_id)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn composed(&self) -> &str {
        &self.composed
    }

    pub fn panel_status(&self, source_id: &SourceId) -> Option<PanelStatus> {
        self.panels.get(source_id).map(|slot| slot.status)
    }

    pub fn collection(&self, request_id: &RequestId) -> Option<&PendingCollection> {
        self.collections.get(request_id)
    }

    /// Number of cached panels still loading.
    pub fn loading_panels(&self) -> usize {
        self.panels
            .values()
            .filter(|slot| slot.status == PanelStatus::Loading)
            .count()
    }

    pub fn pending_collections(&self) -> usize {
        self.collections.len()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            sources: self
                .sources
                .iter()
                .map(|source| SourceRowView {
                    source_id: source.id.clone(),
                    url: source.url.clone(),
                    hostname: source.hostname(),
                    selected: source.selected,
                    status: self.row_status(source),
                })
                .collect(),
            input: self.input.clone(),
            composed: self.composed.clone(),
            menu_actions: menu_actions(&self.prompts),
            pending_collections: self.collections.len(),
            notice: self.notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn row_status(&self, source: &PanelSource) -> PanelRowStatus {
        if let Some(reason) = self.failed.get(&source.id) {
            return PanelRowStatus::Failed(reason.clone());
        }
        match self.panel_status(&source.id) {
            Some(PanelStatus::Loading) => PanelRowStatus::Loading,
            Some(PanelStatus::Loaded) => PanelRowStatus::Ready,
            None => PanelRowStatus::Hidden,
        }
    }

    fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.mark_dirty();
    }

    // --- configuration ---------------------------------------------------

    pub(crate) fn replace_sources(&mut self, sources: Vec<PanelSource>) -> Vec<Effect> {
        let moved: Vec<SourceId> = sources
            .iter()
            .filter(|next| self.source(&next.id).is_some_and(|prev| prev.url != next.url))
            .map(|next| next.id.clone())
            .collect();
        self.sources = sources;
        self.mark_dirty();
        let mut effects = Vec::new();
        for source_id in moved {
            effects.extend(self.release_panel(&source_id));
        }
        effects.extend(self.reconcile_panels());
        effects
    }

    pub(crate) fn set_prompts(&mut self, prompts: Vec<PromptTemplate>) {
        self.prompts = prompts;
        self.mark_dirty();
    }

    pub(crate) fn set_language(&mut self, language: String) {
        self.language = language;
    }

    pub(crate) fn set_input(&mut self, input: String) {
        self.input = input;
        self.mark_dirty();
    }

    pub(crate) fn set_composed(&mut self, composed: String) {
        self.composed = composed;
        self.mark_dirty();
    }

    pub(crate) fn add_source(&mut self, url: &str) -> Vec<Effect> {
        let order = self.sources.len() as i64;
        match PanelSource::new(url, order) {
            Ok(source) => {
                cast_info!("Added source {} ({})", source.id, source.hostname());
                self.sources.push(source);
                renumber(&mut self.sources);
                self.after_source_change()
            }
            Err(err) => {
                cast_warn!("Rejected source: {}", err);
                self.set_notice(Notice::InvalidSource {
                    reason: err.to_string(),
                });
                Vec::new()
            }
        }
    }

    pub(crate) fn edit_source(&mut self, source_id: &SourceId, url: &str) -> Vec<Effect> {
        let Some(source) = self.sources.iter_mut().find(|s| &s.id == source_id) else {
            return Vec::new();
        };
        if source.url == url.trim() {
            return Vec::new();
        }
        if let Err(err) = source.set_url(url) {
            cast_warn!("Rejected edit of {}: {}", source_id, err);
            self.set_notice(Notice::InvalidSource {
                reason: err.to_string(),
            });
            return Vec::new();
        }
        // The old panel shows the old URL; reload it.
        let mut effects = self.release_panel(source_id);
        effects.extend(self.after_source_change());
        effects
    }

    pub(crate) fn delete_source(&mut self, source_id: &SourceId) -> Vec<Effect> {
        let before = self.sources.len();
        self.sources.retain(|source| &source.id != source_id);
        if self.sources.len() == before {
            return Vec::new();
        }
        renumber(&mut self.sources);
        let mut effects = self.release_panel(source_id);
        effects.extend(self.after_source_change());
        effects
    }

    pub(crate) fn toggle_source(&mut self, source_id: &SourceId, selected: bool) -> Vec<Effect> {
        let Some(source) = self.sources.iter_mut().find(|s| &s.id == source_id) else {
            return Vec::new();
        };
        if source.selected == selected {
            return Vec::new();
        }
        source.selected = selected;
        self.after_source_change()
    }

    pub(crate) fn move_source(&mut self, source_id: &SourceId, to_index: usize) -> Vec<Effect> {
        let Some(from) = self.sources.iter().position(|s| &s.id == source_id) else {
            return Vec::new();
        };
        let source = self.sources.remove(from);
        let to = to_index.min(self.sources.len());
        self.sources.insert(to, source);
        renumber(&mut self.sources);
        self.after_source_change()
    }

    fn after_source_change(&mut self) -> Vec<Effect> {
        self.mark_dirty();
        let mut effects = self.reconcile_panels();
        effects.push(Effect::PersistSources {
            sources: self.sources.clone(),
        });
        effects
    }

    // --- panel cache -----------------------------------------------------

    /// Loads selected sources that have no panel yet and releases panels of
    /// sources that are gone or deselected.
    fn reconcile_panels(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();

        let stale: Vec<SourceId> = self
            .panels
            .keys()
            .filter(|id| !self.source(id).is_some_and(|source| source.selected))
            .cloned()
            .collect();
        for source_id in stale {
            effects.extend(self.release_panel(&source_id));
        }
        self.failed
            .retain(|id, _| self.sources.iter().any(|s| &s.id == id && s.selected));

        let to_load: Vec<PanelSource> = self
            .sources
            .iter()
            .filter(|source| source.selected)
            .filter(|source| !self.panels.contains_key(&source.id))
            .filter(|source| !self.failed.contains_key(&source.id))
            .cloned()
            .collect();
        for source in to_load {
            effects.push(self.start_load(source));
        }
        effects
    }

    /// Caches a loading panel under a fresh load id.
    fn start_load(&mut self, source: PanelSource) -> Effect {
        let load = LoadId::new(self.next_load);
        self.next_load += 1;
        self.panels.insert(
            source.id.clone(),
            PanelSlot {
                status: PanelStatus::Loading,
                load,
            },
        );
        Effect::LoadPanel { source, load }
    }

    /// True when `load` is the attempt currently loading `source_id`.
    fn is_current_load(&self, source_id: &SourceId, load: LoadId) -> bool {
        self.panels
            .get(source_id)
            .is_some_and(|slot| slot.load == load && slot.status == PanelStatus::Loading)
    }

    /// Evicts one panel and removes the source from every open collection.
    fn release_panel(&mut self, source_id: &SourceId) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.panels.remove(source_id).is_some() {
            effects.push(Effect::DropPanel {
                source_id: source_id.clone(),
            });
        }
        effects.extend(self.exclude_from_collections(source_id));
        effects
    }

    pub(crate) fn panel_loaded(&mut self, source_id: &SourceId, load: LoadId) {
        if !self.is_current_load(source_id, load) {
            cast_debug!("Ignoring {} notification for {}", load, source_id);
            return;
        }
        self.panels.insert(
            source_id.clone(),
            PanelSlot {
                status: PanelStatus::Loaded,
                load,
            },
        );
        self.mark_dirty();
    }

    pub(crate) fn panel_failed(
        &mut self,
        source_id: &SourceId,
        load: LoadId,
        reason: String,
    ) -> Vec<Effect> {
        if !self.is_current_load(source_id, load) {
            cast_debug!("Ignoring failure of {} for {}", load, source_id);
            return Vec::new();
        }
        let hostname = self
            .source(source_id)
            .map(PanelSource::hostname)
            .unwrap_or_default();
        cast_warn!("Panel {} failed to load: {}", hostname, reason);
        let effects = self.release_panel(source_id);
        self.failed.insert(source_id.clone(), reason.clone());
        self.set_notice(Notice::PanelFailed { hostname, reason });
        effects
    }

    pub(crate) fn refresh_panel(&mut self, source_id: &SourceId) -> Vec<Effect> {
        let Some(source) = self.source(source_id).filter(|s| s.selected).cloned() else {
            return Vec::new();
        };
        self.failed.remove(source_id);
        let mut effects = self.release_panel(source_id);
        effects.push(self.start_load(source));
        self.mark_dirty();
        effects
    }

    /// Selected sources with a loaded panel, in selection order.
    fn ready_sources(&self) -> Vec<&PanelSource> {
        self.sources
            .iter()
            .filter(|source| source.selected)
            .filter(|source| self.panel_status(&source.id) == Some(PanelStatus::Loaded))
            .collect()
    }

    fn ready_source(&self, source_id: &SourceId) -> Option<&PanelSource> {
        self.ready_sources()
            .into_iter()
            .find(|source| &source.id == source_id)
    }

    // --- fan-out ---------------------------------------------------------

    pub(crate) fn broadcast(&mut self, prompt: String) -> Vec<Effect> {
        let targets: Vec<SourceId> = if prompt.trim().is_empty() {
            Vec::new()
        } else {
            self.ready_sources().iter().map(|s| s.id.clone()).collect()
        };
        self.inject_into(targets, prompt)
    }

    pub(crate) fn broadcast_template(&mut self, template_id: &str) -> Vec<Effect> {
        let Some(template) = self.prompts.iter().find(|t| t.id == template_id) else {
            cast_warn!("Unknown prompt template {}", template_id);
            return Vec::new();
        };
        let prompt = template.expand(&self.input, &self.language);
        self.broadcast(prompt)
    }

    pub(crate) fn send_to_panel(&mut self, source_id: &SourceId) -> Vec<Effect> {
        let targets = match self.ready_source(source_id) {
            Some(source) if !self.input.trim().is_empty() => vec![source.id.clone()],
            _ => Vec::new(),
        };
        let prompt = self.input.clone();
        self.inject_into(targets, prompt)
    }

    fn inject_into(&mut self, targets: Vec<SourceId>, prompt: String) -> Vec<Effect> {
        let outcome = if targets.is_empty() {
            BroadcastOutcome::NothingToSend
        } else {
            BroadcastOutcome::Sent {
                attempted: targets.len(),
            }
        };
        cast_info!("Broadcast: {:?}", outcome);
        self.set_notice(Notice::Broadcast(outcome));
        targets
            .into_iter()
            .map(|source_id| Effect::SendCommand {
                source_id,
                command: HostCommand::InjectPrompt {
                    prompt: prompt.clone(),
                },
            })
            .collect()
    }

    // --- fan-in ----------------------------------------------------------

    pub(crate) fn collect_all(&mut self) -> Vec<Effect> {
        let targets = self.ready_sources().iter().map(|s| s.id.clone()).collect();
        self.start_collection(CollectionKind::All, targets)
    }

    pub(crate) fn collect_one(&mut self, source_id: &SourceId) -> Vec<Effect> {
        let targets = self
            .ready_source(source_id)
            .map(|source| vec![source.id.clone()])
            .unwrap_or_default();
        self.start_collection(CollectionKind::Single, targets)
    }

    fn start_collection(&mut self, kind: CollectionKind, targets: Vec<SourceId>) -> Vec<Effect> {
        let request_id = RequestId::from_sequence(self.next_request);
        self.next_request += 1;

        let pending = PendingCollection::new(
            request_id.clone(),
            kind,
            targets.clone(),
            self.collect_deadline,
        );
        let deadline = pending.deadline();
        self.collections.insert(request_id.clone(), pending);
        if targets.is_empty() {
            return self.finish_collection(&request_id, FinishReason::Complete);
        }

        cast_info!(
            "Collecting {:?} as {} from {} panel(s)",
            kind,
            request_id,
            targets.len()
        );
        let mut effects = Vec::with_capacity(targets.len() + 1);
        for source_id in targets {
            // Supersedes an older collection of the same kind only.
            self.active_requests
                .insert((source_id.clone(), kind), request_id.clone());
            effects.push(Effect::SendCommand {
                source_id,
                command: HostCommand::GetLastOutput {
                    request_id: Some(request_id.clone()),
                },
            });
        }
        effects.push(Effect::ScheduleDeadline {
            request_id,
            after: deadline,
        });
        self.mark_dirty();
        effects
    }

    pub(crate) fn receive_reply(&mut self, source_id: &SourceId, reply: PanelReply) -> Vec<Effect> {
        let PanelReply::ReceiveLastOutput {
            output,
            source,
            request_id,
        } = reply;
        let Some(request_id) = request_id else {
            cast_debug!("Dropping uncorrelated reply from {}", source);
            return Vec::new();
        };
        let Some(kind) = self.collections.get(&request_id).map(PendingCollection::kind) else {
            cast_debug!("Dropping reply {} from {}: not pending", request_id, source);
            return Vec::new();
        };
        if self.active_requests.get(&(source_id.clone(), kind)) != Some(&request_id) {
            cast_debug!("Dropping stale reply {} from {}", request_id, source);
            return Vec::new();
        }
        let hostname = if source.is_empty() {
            self.source(source_id)
                .map(PanelSource::hostname)
                .unwrap_or_default()
        } else {
            source
        };
        let Some(pending) = self.collections.get_mut(&request_id) else {
            return Vec::new();
        };
        let acceptance = pending.accept(CollectedOutput {
            source_id: source_id.clone(),
            hostname,
            text: output.unwrap_or_default(),
        });
        match acceptance {
            Acceptance::Accepted { complete: true } => {
                self.finish_collection(&request_id, FinishReason::Complete)
            }
            Acceptance::Accepted { complete: false } => Vec::new(),
            Acceptance::Rejected(reason) => {
                cast_debug!("Reply for {} rejected: {:?}", request_id, reason);
                Vec::new()
            }
        }
    }

    pub(crate) fn deadline_elapsed(&mut self, request_id: &RequestId) -> Vec<Effect> {
        if !self.collections.contains_key(request_id) {
            return Vec::new();
        }
        self.finish_collection(request_id, FinishReason::Deadline)
    }

    fn exclude_from_collections(&mut self, source_id: &SourceId) -> Vec<Effect> {
        self.active_requests.retain(|(id, _), _| id != source_id);
        let completed: Vec<RequestId> = self
            .collections
            .iter_mut()
            .filter_map(|(id, pending)| pending.exclude(source_id).then(|| id.clone()))
            .collect();
        completed
            .iter()
            .flat_map(|id| self.finish_collection(id, FinishReason::Complete))
            .collect()
    }

    fn finish_collection(&mut self, request_id: &RequestId, reason: FinishReason) -> Vec<Effect> {
        let Some(mut pending) = self.collections.remove(request_id) else {
            return Vec::new();
        };
        self.active_requests.retain(|_, active| active != request_id);
        let Some(report) = pending.finalize(reason) else {
            return Vec::new();
        };
        self.apply_report(report)
    }

    fn apply_report(&mut self, report: CollectionReport) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        match report.aggregate() {
            Some(block) => {
                cast_info!(
                    "{} finished ({:?}) with {}/{} result(s)",
                    report.request_id,
                    report.reason,
                    report.results.len(),
                    report.expected_count
                );
                self.composed = append_to_composed(&self.composed, &block);
                self.set_notice(Notice::Collected {
                    sources: report.with_output().count(),
                    expected: report.expected_count,
                });
                effects.push(Effect::CopyToClipboard {
                    text: self.composed.clone(),
                });
            }
            None => {
                cast_info!("{} finished with no output", report.request_id);
                self.set_notice(Notice::NoOutputFound);
            }
        }
        effects.push(Effect::CollectionFinished { report });
        effects
    }
}
