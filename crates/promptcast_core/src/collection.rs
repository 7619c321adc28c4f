use std::collections::BTreeMap;
use std::time::Duration;

use crate::{RequestId, SourceId};

/// Separator between per-source blocks in an aggregate.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionKind {
    /// Every selected, loaded panel.
    All,
    /// One panel's output appended on its own.
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Deadline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedOutput {
    pub source_id: SourceId,
    pub hostname: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accepted { complete: bool },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    AlreadyResolved,
    NotExpected,
    Duplicate,
}

/// Fan-in bookkeeping for one `getLastOutput` broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCollection {
    request_id: RequestId,
    kind: CollectionKind,
    /// Sources still taking part, in selection order.
    expected: Vec<SourceId>,
    received: BTreeMap<SourceId, CollectedOutput>,
    deadline: Duration,
    resolved: bool,
}

impl PendingCollection {
    pub fn new(
        request_id: RequestId,
        kind: CollectionKind,
        expected: Vec<SourceId>,
        deadline: Duration,
    ) -> Self {
        Self {
            request_id,
            kind,
            expected,
            received: BTreeMap::new(),
            deadline,
            resolved: false,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn expected_count(&self) -> usize {
        self.expected.len()
    }

    pub fn received_count(&self) -> usize {
        self.received.len()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn expects(&self, source_id: &SourceId) -> bool {
        self.expected.contains(source_id)
    }

    pub fn is_complete(&self) -> bool {
        self.received.len() == self.expected.len()
    }

    /// Records one reply. Never mutates a resolved collection.
    pub fn accept(&mut self, output: CollectedOutput) -> Acceptance {
        if self.resolved {
            return Acceptance::Rejected(RejectReason::AlreadyResolved);
        }
        if !self.expects(&output.source_id) {
            return Acceptance::Rejected(RejectReason::NotExpected);
        }
        if self.received.contains_key(&output.source_id) {
            return Acceptance::Rejected(RejectReason::Duplicate);
        }
        self.received.insert(output.source_id.clone(), output);
        Acceptance::Accepted {
            complete: self.is_complete(),
        }
    }

    /// Removes a deselected or deleted source. Returns true when the
    /// remaining sources have all answered.
    pub fn exclude(&mut self, source_id: &SourceId) -> bool {
        if self.resolved || !self.expects(source_id) {
            return false;
        }
        self.expected.retain(|id| id != source_id);
        self.received.remove(source_id);
        self.is_complete()
    }

    /// Resolves the collection. Returns `None` if it was already resolved.
    pub fn finalize(&mut self, reason: FinishReason) -> Option<CollectionReport> {
        if self.resolved {
            return None;
        }
        self.resolved = true;
        let results = self
            .expected
            .iter()
            .filter_map(|id| self.received.get(id))
            .cloned()
            .collect();
        Some(CollectionReport {
            request_id: self.request_id.clone(),
            kind: self.kind,
            expected_count: self.expected.len(),
            results,
            reason,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub request_id: RequestId,
    pub kind: CollectionKind,
    pub expected_count: usize,
    /// In selection order, never arrival order.
    pub results: Vec<CollectedOutput>,
    pub reason: FinishReason,
}

impl CollectionReport {
    pub fn is_partial(&self) -> bool {
        self.results.len() < self.expected_count
    }

    pub fn with_output(&self) -> impl Iterator<Item = &CollectedOutput> {
        self.results.iter().filter(|out| !out.text.trim().is_empty())
    }

    pub fn has_output(&self) -> bool {
        self.with_output().next().is_some()
    }

    /// One `### host` block per source with text, joined by a rule.
    pub fn aggregate(&self) -> Option<String> {
        let blocks: Vec<String> = self
            .with_output()
            .map(|out| format!("### {}\n\n{}", out.hostname, out.text.trim()))
            .collect();
        if blocks.is_empty() {
            None
        } else {
            Some(blocks.join(BLOCK_SEPARATOR))
        }
    }
}

/// Appends a block to the composed text without replacing it.
pub fn append_to_composed(composed: &str, block: &str) -> String {
    let existing = composed.trim_end();
    if existing.is_empty() {
        block.to_string()
    } else {
        format!("{existing}\n\n{block}")
    }
}
