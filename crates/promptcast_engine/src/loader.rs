//! Bringing panel documents up from a source URL.
use std::path::PathBuf;
use std::sync::Arc;

use cast_logging::cast_info;
use promptcast_core::PanelSource;

use crate::decode::decode_markup;
use crate::document::{MarkupDocument, PanelDocument};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::LoadError;

#[async_trait::async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, source: &PanelSource) -> Result<Arc<dyn PanelDocument>, LoadError>;
}

/// Loads the page behind the source URL over HTTP.
pub struct HttpDocumentLoader<F = ReqwestFetcher> {
    fetcher: F,
}

impl HttpDocumentLoader<ReqwestFetcher> {
    pub fn new(settings: FetchSettings) -> Self {
        Self::with_fetcher(ReqwestFetcher::new(settings))
    }
}

impl<F: Fetcher> HttpDocumentLoader<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl<F: Fetcher> DocumentLoader for HttpDocumentLoader<F> {
    async fn load(&self, source: &PanelSource) -> Result<Arc<dyn PanelDocument>, LoadError> {
        let output = self.fetcher.fetch(&source.url).await?;
        let decoded = decode_markup(&output.bytes, output.metadata.content_type.as_deref())?;
        cast_info!(
            "Loaded {} ({} bytes, {}, {} redirect(s))",
            output.metadata.final_url,
            output.metadata.byte_len,
            decoded.encoding_label,
            output.metadata.redirect_count
        );
        Ok(Arc::new(MarkupDocument::new(decoded.markup)))
    }
}

/// Loads `{hostname}.html` from a directory of saved pages.
#[derive(Debug, Clone)]
pub struct SnapshotLoader {
    dir: PathBuf,
}

impl SnapshotLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl DocumentLoader for SnapshotLoader {
    async fn load(&self, source: &PanelSource) -> Result<Arc<dyn PanelDocument>, LoadError> {
        let hostname = source.hostname();
        if hostname.is_empty() {
            return Err(LoadError::NoHostname);
        }
        let path = self.dir.join(format!("{hostname}.html"));
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| LoadError::Snapshot {
                path: path.clone(),
                source,
            })?;
        let decoded = decode_markup(&bytes, None)?;
        cast_info!("Loaded snapshot {:?}", path);
        Ok(Arc::new(MarkupDocument::new(decoded.markup)))
    }
}
