use std::fmt;
use std::time::Duration;

use crate::{CollectionReport, HostCommand, PanelSource, RequestId, SourceId};

/// Identifies one load attempt of a panel, so notifications from an
/// abandoned attempt can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadId(u64);

impl LoadId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Create the panel for a selected source. Its load notifications must
    /// carry `load`.
    LoadPanel { source: PanelSource, load: LoadId },
    /// Release the cached panel of a source.
    DropPanel { source_id: SourceId },
    /// Post a command into one panel.
    SendCommand {
        source_id: SourceId,
        command: HostCommand,
    },
    /// Post `DeadlineElapsed` after `after`.
    ScheduleDeadline {
        request_id: RequestId,
        after: Duration,
    },
    CopyToClipboard { text: String },
    /// Write the source list back to the configuration store.
    PersistSources { sources: Vec<PanelSource> },
    CollectionFinished { report: CollectionReport },
}
