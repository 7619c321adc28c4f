//! Builds a [`Host`] from the command line and drives it.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use cast_logging::{cast_info, cast_warn};
use promptcast_core::{
    BroadcastOutcome, CollectionReport, Msg, Notice, PanelRowStatus, PromptTemplate,
};
use promptcast_engine::{
    AdapterRegistry, ClipboardSink, ConfigStore, DocumentConnector, FetchSettings, Host,
    HostSettings, HttpDocumentLoader, PanelConnector, RonConfigStore, SnapshotLoader,
};

use crate::cli::{Cli, PromptArgs};

pub struct Session {
    host: Host,
    store: Arc<RonConfigStore>,
}

impl Session {
    pub fn open(cli: &Cli, clipboard: Arc<dyn ClipboardSink>) -> Self {
        let settings = HostSettings {
            collect_deadline: Duration::from_millis(cli.deadline_ms),
            ..HostSettings::default()
        };
        let connector: Arc<dyn PanelConnector> = match &cli.snapshots {
            Some(dir) => Arc::new(DocumentConnector::new(
                SnapshotLoader::new(dir),
                AdapterRegistry::new(),
                settings,
            )),
            None => Arc::new(DocumentConnector::new(
                HttpDocumentLoader::new(FetchSettings::default()),
                AdapterRegistry::new(),
                settings,
            )),
        };
        let store = Arc::new(RonConfigStore::new(&cli.config));
        let mut host = Host::new(connector, clipboard, settings).with_store(store.clone());
        host.dispatch(Msg::LanguageChanged(cli.lang.clone()));
        Self { host, store }
    }

    pub fn store(&self) -> &RonConfigStore {
        &self.store
    }

    /// Reads the configuration and waits until every selected panel has
    /// loaded or failed.
    pub async fn start(&mut self) -> Result<()> {
        self.host.load_config();
        self.host.wait_for_panels().await;

        let view = self.host.view();
        let mut ready = 0;
        for row in &view.sources {
            match &row.status {
                PanelRowStatus::Ready => ready += 1,
                PanelRowStatus::Failed(reason) => {
                    cast_warn!("{} unavailable: {}", row.hostname, reason);
                    eprintln!("{}: {}", row.hostname, reason);
                }
                PanelRowStatus::Hidden | PanelRowStatus::Loading => {}
            }
        }
        if ready == 0 {
            bail!("no selected panel could be loaded");
        }
        cast_info!("{} panel(s) ready", ready);
        Ok(())
    }

    /// Injects the prompt and gives the panels `settle` to finish typing.
    pub async fn send(&mut self, args: &PromptArgs, settle: Duration) -> Result<usize> {
        let input = args.input();
        let attempted = match &args.template {
            Some(name) => {
                let template = self.find_template(name)?;
                self.host.dispatch(Msg::InputChanged(input));
                self.host.dispatch(Msg::TemplateActivated {
                    template_id: template.id,
                });
                self.attempted()
            }
            None => match self.host.broadcast(&input) {
                BroadcastOutcome::Sent { attempted } => attempted,
                BroadcastOutcome::NothingToSend => 0,
            },
        };
        if attempted == 0 {
            bail!("nothing was sent: empty prompt or no ready panel");
        }
        self.host.run_for(settle).await;
        Ok(attempted)
    }

    pub async fn collect(&mut self, host: Option<&str>) -> Result<CollectionReport> {
        let report = match host {
            Some(hostname) => {
                let source_id = self
                    .host
                    .state()
                    .sources()
                    .iter()
                    .find(|source| source.hostname().eq_ignore_ascii_case(hostname))
                    .map(|source| source.id.clone())
                    .ok_or_else(|| anyhow!("no configured source for {hostname}"))?;
                self.host.collect_one(&source_id).await
            }
            None => self.host.collect_all().await,
        };
        Ok(report)
    }

    pub fn composed(&self) -> &str {
        self.host.state().composed()
    }

    fn attempted(&self) -> usize {
        match self.host.state().notice() {
            Some(Notice::Broadcast(BroadcastOutcome::Sent { attempted })) => *attempted,
            _ => 0,
        }
    }

    fn find_template(&self, name: &str) -> Result<PromptTemplate> {
        let prompts = self
            .store
            .prompts()
            .context("reading prompt templates")?;
        prompts
            .into_iter()
            .find(|template| template.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("no prompt template named {name:?}"))
    }
}
