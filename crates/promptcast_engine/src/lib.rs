//! Promptcast engine: panel documents, site adapters, and the host runner
//! that executes core effects.
mod adapters;
mod agent;
mod clipboard;
mod decode;
mod document;
mod fetch;
mod host;
mod layout_watch;
mod loader;
mod persist;
mod store;
mod types;
mod waiter;

pub use adapters::{AdapterRegistry, InjectError, InjectOutcome, SiteAdapter, SiteProfile};
pub use agent::PanelAgent;
pub use clipboard::{ClipboardError, ClipboardSink, MemoryClipboard};
pub use decode::{decode_markup, DecodeError, DecodedMarkup};
pub use document::{
    query_all, rendered_text, ContentMode, DocumentAction, ElementLocator, FoundElement,
    MarkupDocument, PanelDocument,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use host::{
    DocumentConnector, Host, HostEvents, HostSettings, PanelConnector, PanelLink,
};
pub use layout_watch::{
    spawn_layout_watch, ActionMeasure, LayoutWatch, TextWidthMeasure, DEFAULT_DEBOUNCE,
};
pub use loader::{DocumentLoader, HttpDocumentLoader, SnapshotLoader};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use store::{
    forward_changes, ConfigStore, MemoryConfigStore, RonConfigStore, StoreError, CONFIG_FILENAME,
};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, LoadError};
pub use waiter::{wait_for, wait_for_element, wait_for_enabled, WaitSettings};
