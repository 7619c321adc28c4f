use crate::{LoadId, PanelReply, PanelSource, PromptTemplate, RequestId, SourceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The configuration store delivered (or changed) the source list.
    SourcesLoaded(Vec<PanelSource>),
    /// The configuration store delivered (or changed) the template list.
    PromptsLoaded(Vec<PromptTemplate>),
    /// Target language used for `${lang}`.
    LanguageChanged(String),
    /// User edited the prompt input.
    InputChanged(String),
    /// User added a source by URL.
    SourceAdded { url: String },
    /// User edited a source URL in place.
    SourceEdited { source_id: SourceId, url: String },
    /// User removed a source.
    SourceDeleted { source_id: SourceId },
    /// User ticked or unticked a source.
    SourceToggled { source_id: SourceId, selected: bool },
    /// User dragged a source to a new position.
    SourceMoved { source_id: SourceId, to_index: usize },
    /// A panel finished loading.
    PanelLoaded { source_id: SourceId, load: LoadId },
    /// A panel failed to load or timed out.
    PanelLoadFailed {
        source_id: SourceId,
        load: LoadId,
        reason: String,
    },
    /// User asked to reload one panel.
    RefreshPanel { source_id: SourceId },
    /// User clicked Send: inject the input into every selected panel.
    BroadcastClicked,
    /// User clicked a prompt action: expand it and broadcast.
    TemplateActivated { template_id: String },
    /// User clicked Send on a single panel.
    PanelSendClicked { source_id: SourceId },
    /// User clicked "collect all outputs".
    CollectAllClicked,
    /// User clicked collect on a single panel.
    PanelCollectClicked { source_id: SourceId },
    /// A panel replied. `source_id` identifies the channel it came from.
    ReplyReceived { source_id: SourceId, reply: PanelReply },
    /// The deadline timer of a collection fired.
    DeadlineElapsed { request_id: RequestId },
    /// User edited the composed text.
    ComposedEdited(String),
    /// User cleared the composed text.
    ComposedCleared,
}
