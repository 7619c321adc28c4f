//! Keeps an [`ActionLayout`] current while the bar is resized or the
//! action list changes.
use std::sync::Arc;
use std::time::Duration;

use cast_logging::cast_trace;
use promptcast_core::{ActionDescriptor, ActionLayout, LayoutMetrics};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(40);

/// Rendered width of one action.
pub trait ActionMeasure: Send + Sync {
    fn width(&self, action: &ActionDescriptor) -> u32;
}

/// Fixed-pitch estimate: every character is `char_width` wide, plus padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextWidthMeasure {
    pub char_width: u32,
    pub padding: u32,
}

impl Default for TextWidthMeasure {
    fn default() -> Self {
        Self {
            char_width: 8,
            padding: 24,
        }
    }
}

impl ActionMeasure for TextWidthMeasure {
    fn width(&self, action: &ActionDescriptor) -> u32 {
        let chars = u32::try_from(action.label.chars().count()).unwrap_or(u32::MAX);
        chars.saturating_mul(self.char_width).saturating_add(self.padding)
    }
}

#[derive(Debug, Clone)]
struct LayoutInputs {
    actions: Vec<ActionDescriptor>,
    container_width: u32,
}

/// Handle to a running layout watcher. Dropping it stops the watcher.
#[derive(Debug)]
pub struct LayoutWatch {
    inputs: watch::Sender<LayoutInputs>,
    layout: watch::Receiver<ActionLayout>,
    task: JoinHandle<()>,
}

/// Computes the first layout immediately, then recomputes after each burst
/// of changes once `debounce` passes without another one.
pub fn spawn_layout_watch(
    actions: Vec<ActionDescriptor>,
    container_width: u32,
    metrics: LayoutMetrics,
    measure: Arc<dyn ActionMeasure>,
    debounce: Duration,
) -> LayoutWatch {
    let initial = ActionLayout::compute(&actions, container_width, metrics, |action| {
        measure.width(action)
    });
    let (inputs, mut inputs_rx) = watch::channel(LayoutInputs {
        actions,
        container_width,
    });
    let (layout_tx, layout) = watch::channel(initial);

    let task = tokio::spawn(async move {
        while inputs_rx.changed().await.is_ok() {
            loop {
                tokio::select! {
                    changed = inputs_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    _ = time::sleep(debounce) => break,
                }
            }
            let current = inputs_rx.borrow_and_update().clone();
            let next = ActionLayout::compute(
                &current.actions,
                current.container_width,
                metrics,
                |action| measure.width(action),
            );
            cast_trace!(
                "Layout at {}px: {} inline, {} overflow",
                next.container_width,
                next.inline.len(),
                next.overflow.len()
            );
            layout_tx.send_replace(next);
        }
    });

    LayoutWatch {
        inputs,
        layout,
        task,
    }
}

impl LayoutWatch {
    pub fn resize(&self, container_width: u32) {
        self.inputs
            .send_modify(|inputs| inputs.container_width = container_width);
    }

    pub fn set_actions(&self, actions: Vec<ActionDescriptor>) {
        self.inputs.send_modify(|inputs| inputs.actions = actions);
    }

    /// The last committed layout.
    pub fn layout(&self) -> ActionLayout {
        self.layout.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionLayout> {
        self.layout.clone()
    }
}

impl Drop for LayoutWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
