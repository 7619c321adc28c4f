//! Persisted sources and prompt templates.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cast_logging::{cast_debug, cast_info, cast_warn};
use promptcast_core::{
    default_sources, default_templates, Msg, PanelSource, PromptTemplate, SourceId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::host::HostEvents;
use crate::persist::{AtomicFileWriter, PersistError};

pub const CONFIG_FILENAME: &str = "config.ron";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("cannot encode configuration: {0}")]
    Encode(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

pub trait ConfigStore: Send + Sync {
    fn sources(&self) -> Result<Vec<PanelSource>, StoreError>;
    fn save_sources(&self, sources: &[PanelSource]) -> Result<(), StoreError>;
    fn prompts(&self) -> Result<Vec<PromptTemplate>, StoreError>;
    fn save_prompts(&self, prompts: &[PromptTemplate]) -> Result<(), StoreError>;
    /// Ticks after every save.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

#[derive(Debug, Clone, Default, Serialize)]
struct StoredConfig {
    #[serde(default)]
    sources: Vec<PanelSource>,
    #[serde(default)]
    prompts: Vec<PromptTemplate>,
}

/// In-process store. Like the file store, an empty list reads back as the
/// defaults, which are stored from then on.
#[derive(Debug)]
pub struct MemoryConfigStore {
    config: Mutex<StoredConfig>,
    changes: watch::Sender<u64>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::with_config(default_sources(), default_templates())
    }

    pub fn with_config(sources: Vec<PanelSource>, prompts: Vec<PromptTemplate>) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            config: Mutex::new(StoredConfig { sources, prompts }),
            changes,
        }
    }

    fn update(&self, apply: impl FnOnce(&mut StoredConfig)) {
        apply(&mut self.config.lock().unwrap_or_else(PoisonError::into_inner));
        self.changes.send_modify(|tick| *tick += 1);
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn sources(&self) -> Result<Vec<PanelSource>, StoreError> {
        let sources = self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sources
            .clone();
        if !sources.is_empty() {
            return Ok(sources);
        }
        cast_info!("Seeding default sources into the in-memory store");
        let seeded = default_sources();
        self.save_sources(&seeded)?;
        Ok(seeded)
    }

    fn save_sources(&self, sources: &[PanelSource]) -> Result<(), StoreError> {
        self.update(|config| config.sources = sources.to_vec());
        Ok(())
    }

    fn prompts(&self) -> Result<Vec<PromptTemplate>, StoreError> {
        let prompts = self
            .config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .prompts
            .clone();
        if !prompts.is_empty() {
            return Ok(prompts);
        }
        cast_info!("Seeding default prompt templates into the in-memory store");
        let seeded = default_templates();
        self.save_prompts(&seeded)?;
        Ok(seeded)
    }

    fn save_prompts(&self, prompts: &[PromptTemplate]) -> Result<(), StoreError> {
        self.update(|config| config.prompts = prompts.to_vec());
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

/// File layout as read back: entries stay untyped until checked one by one.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    sources: Vec<ron::Value>,
    #[serde(default)]
    prompts: Vec<ron::Value>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    id: String,
    url: String,
    #[serde(default = "yes")]
    selected: bool,
    #[serde(default)]
    order: i64,
}

#[derive(Debug, Deserialize)]
struct RawPrompt {
    #[serde(default)]
    id: String,
    name: String,
    content: String,
    #[serde(default = "yes")]
    show_in_menu: bool,
}

fn yes() -> bool {
    true
}

/// A decoded entry, and whether its id was generated because the file had none.
type Decoded<T> = (T, bool);

impl RawSource {
    fn into_source(self) -> Decoded<PanelSource> {
        let generated = self.id.trim().is_empty();
        let id = if generated {
            SourceId::generate()
        } else {
            SourceId::new(self.id)
        };
        let source = PanelSource {
            id,
            url: self.url,
            selected: self.selected,
            order: self.order,
        };
        (source, generated)
    }
}

impl RawPrompt {
    fn into_template(self) -> Decoded<PromptTemplate> {
        let mut template = PromptTemplate::new(self.name, self.content);
        let generated = self.id.trim().is_empty();
        if !generated {
            template.id = self.id;
        }
        template.show_in_menu = self.show_in_menu;
        (template, generated)
    }
}

/// Keeps the entries that decode, logging the rest.
fn decode_entries<T, U>(
    kind: &str,
    values: Vec<ron::Value>,
    convert: impl Fn(T) -> U,
) -> Vec<U>
where
    T: for<'de> Deserialize<'de>,
{
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match value.into_rust::<T>() {
            Ok(raw) => Some(convert(raw)),
            Err(err) => {
                cast_warn!("Skipping {} entry #{}: {}", kind, index, err);
                None
            }
        })
        .collect()
}

/// `config.ron` in a directory. Every save rewrites the whole file atomically.
#[derive(Debug)]
pub struct RonConfigStore {
    dir: PathBuf,
    writer: AtomicFileWriter,
    write_lock: Mutex<()>,
    changes: watch::Sender<u64>,
}

impl RonConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let (changes, _) = watch::channel(0);
        Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
            write_lock: Mutex::new(()),
            changes,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILENAME)
    }

    /// Reads the file; a missing file reads as empty. Also returns how many
    /// entries had no id and were given a fresh one.
    fn read(&self) -> Result<(StoredConfig, usize), StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                cast_debug!("No configuration at {:?}", path);
                return Ok((StoredConfig::default(), 0));
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        parse_config(&path, &content)
    }

    /// Reads the file and writes generated ids back, so an entry keeps the
    /// same id across reads.
    fn load(&self) -> Result<StoredConfig, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (config, generated) = self.read()?;
        if generated > 0 {
            cast_info!("Assigning ids to {} entries in {:?}", generated, self.path());
            if let Err(err) = self.write(&config) {
                cast_warn!("Generated ids not saved: {}", err);
            }
        }
        Ok(config)
    }

    fn write(&self, config: &StoredConfig) -> Result<(), StoreError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(config, pretty)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        let target = self.writer.write(CONFIG_FILENAME, &content)?;
        cast_debug!("Wrote configuration to {:?}", target);
        Ok(())
    }

    fn modify(&self, apply: impl FnOnce(&mut StoredConfig)) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut config, _) = self.read()?;
        apply(&mut config);
        self.write(&config)?;
        self.changes.send_modify(|tick| *tick += 1);
        Ok(())
    }
}

fn parse_config(path: &Path, content: &str) -> Result<(StoredConfig, usize), StoreError> {
    let raw: RawConfig = ron::from_str(content).map_err(|err| StoreError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let (sources, new_source_ids): (Vec<_>, Vec<_>) =
        decode_entries("source", raw.sources, RawSource::into_source)
            .into_iter()
            .unzip();
    let (prompts, new_prompt_ids): (Vec<_>, Vec<_>) =
        decode_entries("prompt", raw.prompts, RawPrompt::into_template)
            .into_iter()
            .unzip();
    let generated = new_source_ids
        .iter()
        .chain(&new_prompt_ids)
        .filter(|generated| **generated)
        .count();
    Ok((StoredConfig { sources, prompts }, generated))
}

impl ConfigStore for RonConfigStore {
    fn sources(&self) -> Result<Vec<PanelSource>, StoreError> {
        let sources = self.load()?.sources;
        if !sources.is_empty() {
            return Ok(sources);
        }
        cast_info!("Seeding default sources into {:?}", self.path());
        let seeded = default_sources();
        self.save_sources(&seeded)?;
        Ok(seeded)
    }

    fn save_sources(&self, sources: &[PanelSource]) -> Result<(), StoreError> {
        self.modify(|config| config.sources = sources.to_vec())
    }

    fn prompts(&self) -> Result<Vec<PromptTemplate>, StoreError> {
        let prompts = self.load()?.prompts;
        if !prompts.is_empty() {
            return Ok(prompts);
        }
        cast_info!("Seeding default prompt templates into {:?}", self.path());
        let seeded = default_templates();
        self.save_prompts(&seeded)?;
        Ok(seeded)
    }

    fn save_prompts(&self, prompts: &[PromptTemplate]) -> Result<(), StoreError> {
        self.modify(|config| config.prompts = prompts.to_vec())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

/// Re-reads the store after every save and feeds the result to the host.
pub fn forward_changes(
    store: std::sync::Arc<dyn ConfigStore>,
    events: HostEvents,
) -> JoinHandle<()> {
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            match store.sources() {
                Ok(sources) => events.send(Msg::SourcesLoaded(sources)),
                Err(err) => cast_warn!("Configuration change not applied: {}", err),
            }
            match store.prompts() {
                Ok(prompts) => events.send(Msg::PromptsLoaded(prompts)),
                Err(err) => cast_warn!("Configuration change not applied: {}", err),
            }
        }
    })
}
