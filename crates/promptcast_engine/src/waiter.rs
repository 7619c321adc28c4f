//! Bounded waits for elements to show up in a panel document.
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::document::{query_all, FoundElement, PanelDocument};

/// Timeouts used by adapters while driving a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    pub input_timeout: Duration,
    pub send_timeout: Duration,
    /// Pause between writing the prompt and looking for the send control,
    /// so the page's input handling sees the change first.
    pub settle_delay: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            input_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_millis(100),
        }
    }
}

/// Resolves to the first element matching `selector` and `predicate`.
///
/// Checks immediately, then re-checks on every document mutation until
/// `timeout` elapses. Absence is `None`, never an error, and `None` is never
/// returned before the timeout.
pub async fn wait_for<P>(
    document: &dyn PanelDocument,
    selector: &str,
    predicate: P,
    timeout: Duration,
) -> Option<FoundElement>
where
    P: Fn(&FoundElement) -> bool,
{
    let deadline = Instant::now() + timeout;
    // Subscribe before the first check so no mutation slips between them.
    let mut mutations = document.mutations();
    loop {
        if let Some(found) = query_all(document, selector)
            .into_iter()
            .find(|element| predicate(element))
        {
            return Some(found);
        }
        tokio::select! {
            changed = mutations.changed() => {
                if changed.is_err() {
                    // The document can no longer change.
                    time::sleep_until(deadline).await;
                    return None;
                }
            }
            _ = time::sleep_until(deadline) => return None,
        }
    }
}

pub async fn wait_for_element(
    document: &dyn PanelDocument,
    selector: &str,
    timeout: Duration,
) -> Option<FoundElement> {
    wait_for(document, selector, |_| true, timeout).await
}

/// Like [`wait_for_element`], but disabled controls do not count.
pub async fn wait_for_enabled(
    document: &dyn PanelDocument,
    selector: &str,
    timeout: Duration,
) -> Option<FoundElement> {
    wait_for(document, selector, |element| element.enabled, timeout).await
}
