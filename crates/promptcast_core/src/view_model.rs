use crate::{ActionDescriptor, SourceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Sent { attempted: usize },
    NothingToSend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Broadcast(BroadcastOutcome),
    Collected { sources: usize, expected: usize },
    NoOutputFound,
    PanelFailed { hostname: String, reason: String },
    InvalidSource { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelStatus {
    Loading,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelRowStatus {
    Hidden,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub sources: Vec<SourceRowView>,
    pub input: String,
    pub composed: String,
    pub menu_actions: Vec<ActionDescriptor>,
    pub pending_collections: usize,
    pub notice: Option<Notice>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRowView {
    pub source_id: SourceId,
    pub url: String,
    pub hostname: String,
    pub selected: bool,
    pub status: PanelRowStatus,
}
