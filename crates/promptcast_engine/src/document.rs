//! The panel document seam.
//!
//! A panel is only ever observed through its current markup and a mutation
//! counter, and only ever driven through the handful of user-level actions
//! below. Elements are addressed by `(selector, index)` against the markup
//! at the time they were found.
use std::sync::{Mutex, PoisonError};

use cast_logging::cast_warn;
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementLocator {
    pub selector: String,
    /// Position among the selector's matches, in document order.
    pub index: usize,
}

/// How text is written into an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    /// `contenteditable` hosts: replace the text content.
    RichText,
    /// `textarea`/`input`: assign the value.
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundElement {
    pub locator: ElementLocator,
    pub tag: String,
    pub enabled: bool,
    pub text: String,
}

impl FoundElement {
    fn from_element(selector: &str, index: usize, element: ElementRef<'_>) -> Self {
        let value = element.value();
        let enabled = value.attr("disabled").is_none()
            && !value
                .attr("aria-disabled")
                .is_some_and(|flag| flag.eq_ignore_ascii_case("true"));
        Self {
            locator: ElementLocator {
                selector: selector.to_string(),
                index,
            },
            tag: value.name().to_ascii_lowercase(),
            enabled,
            text: rendered_text(element),
        }
    }

    pub fn content_mode(&self) -> ContentMode {
        match self.tag.as_str() {
            "textarea" | "input" => ContentMode::Value,
            _ => ContentMode::RichText,
        }
    }
}

pub trait PanelDocument: Send + Sync {
    /// Serialized markup as currently rendered.
    fn markup(&self) -> String;
    /// Bumped on every mutation of the document.
    fn mutations(&self) -> watch::Receiver<u64>;
    fn set_content(&self, target: &ElementLocator, text: &str, mode: ContentMode);
    /// Fires the synthetic input notification frameworks listen for.
    fn dispatch_input(&self, target: &ElementLocator);
    fn activate(&self, target: &ElementLocator);
    fn press_enter(&self, target: &ElementLocator);
}

/// Every element matching `selector`, in document order. An unparsable
/// selector matches nothing.
pub fn query_all(document: &dyn PanelDocument, selector: &str) -> Vec<FoundElement> {
    let parsed = match Selector::parse(selector) {
        Ok(parsed) => parsed,
        Err(err) => {
            cast_warn!("Invalid selector {:?}: {}", selector, err);
            return Vec::new();
        }
    };
    let html = Html::parse_document(&document.markup());
    html.select(&parsed)
        .enumerate()
        .map(|(index, element)| FoundElement::from_element(selector, index, element))
        .collect()
}

/// Approximates what a browser shows for an element: block elements break
/// lines, runs of whitespace collapse, scripts and styles are skipped.
pub fn rendered_text(element: ElementRef<'_>) -> String {
    let mut builder = TextBuilder::default();
    for child in element.children() {
        builder.visit(child);
    }
    builder.finish()
}

#[derive(Default)]
struct TextBuilder {
    out: String,
    preformatted: usize,
}

impl TextBuilder {
    fn visit(&mut self, node: NodeRef<'_, Node>) {
        match node.value() {
            Node::Text(text) => self.push_text(text),
            Node::Element(element) => {
                let tag = element.name().to_ascii_lowercase();
                match tag.as_str() {
                    "script" | "style" | "noscript" | "template" | "svg" => {}
                    "br" => self.push_newline(),
                    "pre" => {
                        self.ensure_newline();
                        self.preformatted += 1;
                        self.visit_children(node);
                        self.preformatted -= 1;
                        self.ensure_newline();
                    }
                    "p" | "div" | "section" | "article" | "header" | "footer" | "ul" | "ol"
                    | "li" | "table" | "tr" | "blockquote" | "h1" | "h2" | "h3" | "h4" | "h5"
                    | "h6" => {
                        self.ensure_newline();
                        self.visit_children(node);
                        self.ensure_newline();
                    }
                    _ => self.visit_children(node),
                }
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: NodeRef<'_, Node>) {
        for child in node.children() {
            self.visit(child);
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.preformatted > 0 {
            self.out.push_str(text);
            return;
        }
        if text.trim().is_empty() {
            if !text.is_empty() {
                self.push_space();
            }
            return;
        }
        if text.starts_with(char::is_whitespace) {
            self.push_space();
        }
        for (index, word) in text.split_whitespace().enumerate() {
            if index > 0 {
                self.out.push(' ');
            }
            self.out.push_str(word);
        }
        if text.ends_with(char::is_whitespace) {
            self.push_space();
        }
    }

    fn push_space(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with(' ') && !self.out.ends_with('\n') {
            self.out.push(' ');
        }
    }

    fn push_newline(&mut self) {
        self.trim_trailing_spaces();
        self.out.push('\n');
    }

    fn ensure_newline(&mut self) {
        self.trim_trailing_spaces();
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn trim_trailing_spaces(&mut self) {
        let trimmed = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed);
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}

/// One user-level action performed on a [`MarkupDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentAction {
    SetContent {
        target: ElementLocator,
        text: String,
        mode: ContentMode,
    },
    Input {
        target: ElementLocator,
    },
    Activate {
        target: ElementLocator,
    },
    Enter {
        target: ElementLocator,
    },
}

/// A static-markup panel document. The markup changes only through
/// [`MarkupDocument::replace_markup`]; actions are recorded in order.
pub struct MarkupDocument {
    inner: Mutex<MarkupInner>,
    mutations: watch::Sender<u64>,
}

struct MarkupInner {
    markup: String,
    actions: Vec<DocumentAction>,
}

impl MarkupDocument {
    pub fn new(markup: impl Into<String>) -> Self {
        let (mutations, _) = watch::channel(0);
        Self {
            inner: Mutex::new(MarkupInner {
                markup: markup.into(),
                actions: Vec::new(),
            }),
            mutations,
        }
    }

    /// Swaps the markup, as a site re-render would, and notifies observers.
    pub fn replace_markup(&self, markup: impl Into<String>) {
        self.lock().markup = markup.into();
        self.mutations.send_modify(|generation| *generation += 1);
    }

    pub fn actions(&self) -> Vec<DocumentAction> {
        self.lock().actions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MarkupInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, action: DocumentAction) {
        self.lock().actions.push(action);
    }
}

impl PanelDocument for MarkupDocument {
    fn markup(&self) -> String {
        self.lock().markup.clone()
    }

    fn mutations(&self) -> watch::Receiver<u64> {
        self.mutations.subscribe()
    }

    fn set_content(&self, target: &ElementLocator, text: &str, mode: ContentMode) {
        self.record(DocumentAction::SetContent {
            target: target.clone(),
            text: text.to_string(),
            mode,
        });
    }

    fn dispatch_input(&self, target: &ElementLocator) {
        self.record(DocumentAction::Input {
            target: target.clone(),
        });
    }

    fn activate(&self, target: &ElementLocator) {
        self.record(DocumentAction::Activate {
            target: target.clone(),
        });
    }

    fn press_enter(&self, target: &ElementLocator) {
        self.record(DocumentAction::Enter {
            target: target.clone(),
        });
    }
}
