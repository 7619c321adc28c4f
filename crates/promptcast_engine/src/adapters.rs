//! Per-site inject/extract behaviour.
//!
//! Sites differ only in markup, so each adapter is a set of selectors and
//! all of them share one inject flow and one extract rule.
use std::collections::HashMap;
use std::time::Duration;

use cast_logging::{cast_debug, cast_info};
use tokio::time;

use crate::document::{query_all, PanelDocument};
use crate::waiter::{wait_for_element, wait_for_enabled, WaitSettings};

/// Markup shape of one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteProfile {
    /// Exact hostnames served by this profile.
    pub hostnames: &'static [&'static str],
    /// Prompt input.
    pub input: &'static str,
    /// Send control.
    pub send: &'static str,
    /// One element per model turn.
    pub response: &'static str,
}

const CHATGPT: SiteProfile = SiteProfile {
    hostnames: &["chatgpt.com", "chat.openai.com"],
    input: "#prompt-textarea",
    send: r#"button[data-testid="send-button"]"#,
    response: r#"div[data-message-author-role="assistant"]"#,
};

const CLAUDE: SiteProfile = SiteProfile {
    hostnames: &["claude.ai"],
    input: r#"div.ProseMirror[contenteditable="true"]"#,
    send: r#"button[aria-label="Send message"], button[aria-label="Send Message"]"#,
    response: "div.font-claude-message, div.font-claude-response",
};

const GEMINI: SiteProfile = SiteProfile {
    hostnames: &["gemini.google.com"],
    input: r#"rich-textarea div.ql-editor[contenteditable="true"]"#,
    send: "button.send-button",
    response: "message-content",
};

const DEEPSEEK: SiteProfile = SiteProfile {
    hostnames: &["chat.deepseek.com"],
    input: "textarea#chat-input",
    send: r#"div[role="button"].ds-button--primary"#,
    response: "div.ds-markdown",
};

const GROK: SiteProfile = SiteProfile {
    hostnames: &["grok.com"],
    input: r#"textarea[aria-label="Ask Grok anything"], div.tiptap[contenteditable="true"]"#,
    send: r#"button[type="submit"]"#,
    response: "div.message-bubble",
};

const PERPLEXITY: SiteProfile = SiteProfile {
    hostnames: &["www.perplexity.ai", "perplexity.ai"],
    input: r#"#ask-input, textarea[placeholder*="Ask"]"#,
    send: r#"button[aria-label="Submit"]"#,
    response: "div.prose",
};

const GENERIC: SiteProfile = SiteProfile {
    hostnames: &[],
    input: r#"textarea, [contenteditable="true"], input[type="text"], input[type="search"]"#,
    send: r#"button[type="submit"], button[aria-label*="Send"], button[aria-label*="send"], button[data-testid*="send"]"#,
    response: r#"[data-message-author-role="assistant"], .markdown, .prose, article"#,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteAdapter {
    ChatGpt,
    Claude,
    Gemini,
    DeepSeek,
    Grok,
    Perplexity,
    /// Fallback for any hostname without a dedicated entry.
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    /// The send control was activated.
    Sent,
    /// No enabled send control appeared; Enter was pressed in the input.
    SubmittedWithEnter,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    #[error("no prompt input matched {selector:?} within {waited:?}")]
    InputNotFound {
        selector: &'static str,
        waited: Duration,
    },
}

impl SiteAdapter {
    pub const KNOWN: [SiteAdapter; 6] = [
        SiteAdapter::ChatGpt,
        SiteAdapter::Claude,
        SiteAdapter::Gemini,
        SiteAdapter::DeepSeek,
        SiteAdapter::Grok,
        SiteAdapter::Perplexity,
    ];

    pub fn profile(self) -> &'static SiteProfile {
        match self {
            SiteAdapter::ChatGpt => &CHATGPT,
            SiteAdapter::Claude => &CLAUDE,
            SiteAdapter::Gemini => &GEMINI,
            SiteAdapter::DeepSeek => &DEEPSEEK,
            SiteAdapter::Grok => &GROK,
            SiteAdapter::Perplexity => &PERPLEXITY,
            SiteAdapter::Generic => &GENERIC,
        }
    }

    /// Writes `prompt` into the panel's input and submits it.
    pub async fn inject(
        self,
        document: &dyn PanelDocument,
        prompt: &str,
        settings: &WaitSettings,
    ) -> Result<InjectOutcome, InjectError> {
        let profile = self.profile();
        let Some(input) = wait_for_element(document, profile.input, settings.input_timeout).await
        else {
            return Err(InjectError::InputNotFound {
                selector: profile.input,
                waited: settings.input_timeout,
            });
        };

        document.set_content(&input.locator, prompt, input.content_mode());
        document.dispatch_input(&input.locator);
        time::sleep(settings.settle_delay).await;

        match wait_for_enabled(document, profile.send, settings.send_timeout).await {
            Some(control) => {
                document.activate(&control.locator);
                cast_info!("{:?}: prompt sent ({} chars)", self, prompt.len());
                Ok(InjectOutcome::Sent)
            }
            None => {
                cast_debug!("{:?}: no enabled send control, pressing Enter", self);
                document.press_enter(&input.locator);
                Ok(InjectOutcome::SubmittedWithEnter)
            }
        }
    }

    /// Rendered text of the newest response, or an empty string.
    pub fn extract(self, document: &dyn PanelDocument) -> String {
        query_all(document, self.profile().response)
            .pop()
            .map(|last| last.text)
            .unwrap_or_default()
    }
}

/// Exact-hostname lookup of adapters.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    by_hostname: HashMap<String, SiteAdapter>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            by_hostname: HashMap::new(),
        };
        for adapter in SiteAdapter::KNOWN {
            for hostname in adapter.profile().hostnames {
                registry.register(hostname, adapter);
            }
        }
        registry
    }

    /// Routes `hostname` to `adapter`, replacing any previous entry.
    pub fn register(&mut self, hostname: &str, adapter: SiteAdapter) {
        self.by_hostname
            .insert(hostname.to_ascii_lowercase(), adapter);
    }

    pub fn resolve(&self, hostname: &str) -> SiteAdapter {
        self.by_hostname
            .get(&hostname.to_ascii_lowercase())
            .copied()
            .unwrap_or(SiteAdapter::Generic)
    }
}
