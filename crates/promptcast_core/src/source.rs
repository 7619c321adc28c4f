use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Stable identity of a configured source. Survives URL edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("duplicate source id {0}")]
    DuplicateId(SourceId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSource {
    pub id: SourceId,
    pub url: String,
    pub selected: bool,
    pub order: i64,
}

impl PanelSource {
    /// Creates a selected source with a freshly generated id.
    pub fn new(url: &str, order: i64) -> Result<Self, ConfigError> {
        Ok(Self {
            id: SourceId::generate(),
            url: validate_url(url)?,
            selected: true,
            order,
        })
    }

    /// Hostname derived from the URL; empty if the URL no longer parses.
    pub fn hostname(&self) -> String {
        hostname_of(&self.url).unwrap_or_default()
    }

    /// Edits the URL in place, keeping the id.
    pub fn set_url(&mut self, url: &str) -> Result<(), ConfigError> {
        self.url = validate_url(url)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.url).map(|_| ())
    }
}

pub fn hostname_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().map(|host| host.to_ascii_lowercase())
}

/// Accepts absolute http(s) URLs with a host and returns the trimmed text.
pub fn validate_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    let parsed = Url::parse(trimmed).map_err(|err| invalid(&err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(trimmed.to_string())
}

/// Drops invalid and duplicate entries, then orders by `order` (stable).
pub fn sanitize_sources(sources: Vec<PanelSource>) -> Vec<PanelSource> {
    let mut kept: Vec<PanelSource> = Vec::with_capacity(sources.len());
    for source in sources {
        if let Err(err) = source.validate() {
            cast_logging::cast_warn!("Skipping source {}: {}", source.id, err);
            continue;
        }
        if kept.iter().any(|existing| existing.id == source.id) {
            cast_logging::cast_warn!(
                "Skipping source: {}",
                ConfigError::DuplicateId(source.id.clone())
            );
            continue;
        }
        kept.push(source);
    }
    kept.sort_by_key(|source| source.order);
    kept
}

/// Rewrites `order` so it matches the slice position.
pub fn renumber(sources: &mut [PanelSource]) {
    for (index, source) in sources.iter_mut().enumerate() {
        source.order = index as i64;
    }
}

const DEFAULT_SOURCES: &[(&str, bool)] = &[
    ("https://chatgpt.com/", true),
    ("https://claude.ai/new", true),
    ("https://gemini.google.com/app", true),
    ("https://chat.deepseek.com/", false),
    ("https://grok.com/", false),
];

/// First-run seed used when the store holds no sources.
pub fn default_sources() -> Vec<PanelSource> {
    DEFAULT_SOURCES
        .iter()
        .enumerate()
        .filter_map(|(index, (url, selected))| {
            let mut source = PanelSource::new(url, index as i64).ok()?;
            source.selected = *selected;
            Some(source)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hostname_is_derived_from_url() {
        let source = PanelSource::new(" https://Chat.DeepSeek.com/a/b ", 0).unwrap();
        assert_eq!(source.url, "https://Chat.DeepSeek.com/a/b");
        assert_eq!(source.hostname(), "chat.deepseek.com");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn editing_keeps_identity() {
        let mut source = PanelSource::new("https://claude.ai/", 0).unwrap();
        let id = source.id.clone();
        source.set_url("https://grok.com/").unwrap();
        assert_eq!(source.id, id);
        assert_eq!(source.hostname(), "grok.com");
    }

    #[test]
    fn sanitize_skips_bad_entries_and_sorts() {
        let good_b = PanelSource::new("https://b.example.com", 2).unwrap();
        let good_a = PanelSource::new("https://a.example.com", 1).unwrap();
        let mut duplicate = good_a.clone();
        duplicate.order = 0;
        let broken = PanelSource {
            id: SourceId::new("broken"),
            url: "::".to_string(),
            selected: true,
            order: 0,
        };

        let kept = sanitize_sources(vec![good_b.clone(), broken, good_a.clone(), duplicate]);
        assert_eq!(kept, vec![good_a, good_b]);
    }

    #[test]
    fn defaults_are_valid_and_ordered() {
        let defaults = default_sources();
        assert_eq!(defaults.len(), DEFAULT_SOURCES.len());
        assert!(defaults.windows(2).all(|w| w[0].order < w[1].order));
        assert_eq!(defaults[0].hostname(), "chatgpt.com");
    }
}
