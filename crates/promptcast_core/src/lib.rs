//! Promptcast core: pure orchestration state machine and data model.
mod collection;
mod effect;
mod layout;
mod msg;
mod protocol;
mod source;
mod state;
mod template;
mod update;
mod view_model;

pub use collection::{
    append_to_composed, Acceptance, CollectedOutput, CollectionKind, CollectionReport,
    FinishReason, PendingCollection, RejectReason, BLOCK_SEPARATOR,
};
pub use effect::{Effect, LoadId};
pub use layout::{compute_split, menu_actions, ActionDescriptor, ActionLayout, LayoutMetrics};
pub use msg::Msg;
pub use protocol::{HostCommand, PanelReply, RequestId, WireError};
pub use source::{
    default_sources, hostname_of, renumber, sanitize_sources, validate_url, ConfigError,
    PanelSource, SourceId,
};
pub use state::{AppState, DEFAULT_COLLECT_DEADLINE, DEFAULT_LANGUAGE};
pub use template::{default_templates, PromptTemplate, INPUT_PLACEHOLDER, LANG_PLACEHOLDER};
pub use update::update;
pub use view_model::{
    AppViewModel, BroadcastOutcome, Notice, PanelRowStatus, PanelStatus, SourceRowView,
};
