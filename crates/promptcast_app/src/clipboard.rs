use arboard::Clipboard;
use promptcast_engine::{ClipboardError, ClipboardSink};

/// The desktop clipboard. A handle is opened per copy.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            Clipboard::new().map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|err| ClipboardError::Unavailable(err.to_string()))
    }
}
