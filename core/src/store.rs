//! The one mutable thing in the crate: which generation is current.
//!
//! Readers clone an `Arc` to the current generation under a short read lock and
//! then work on immutable data. Rebuilds are serialized by a separate mutex, build
//! the new generation without holding the pointer lock, and publish it with a
//! single write.

use crate::autocomplete::autocomplete;
use crate::config::SearchConfig;
use crate::error::IngestError;
use crate::index::Generation;
use crate::persist::{load_snapshot, save_snapshot, IndexPaths, MetaFile, SNAPSHOT_VERSION};
use crate::query::SearchRequest;
use crate::record::{RawRecord, Record};
use crate::search::{search, SearchResults};
use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

pub struct IndexStore {
    current: RwLock<Arc<Generation>>,
    rebuild_lock: Mutex<()>,
    config: SearchConfig,
    snapshot: Option<IndexPaths>,
}

impl IndexStore {
    /// An in-memory store in the empty state.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(Generation::empty(0))),
            rebuild_lock: Mutex::new(()),
            config,
            snapshot: None,
        }
    }

    /// A store that writes a snapshot after every install and starts from the last
    /// one found under `paths`, if any.
    pub fn open(config: SearchConfig, paths: IndexPaths) -> Result<Self> {
        let loaded = load_snapshot(&paths)?;
        let store = Self { snapshot: Some(paths), ..Self::new(config) };
        if let Some((records, meta)) = loaded {
            if records.is_empty() {
                tracing::info!(generation = meta.generation, "snapshot is empty, starting empty");
            } else {
                match Generation::build(meta.generation, records) {
                    Ok(gen) => *store.current.write() = Arc::new(gen),
                    Err(err) => tracing::warn!(error = %err, "snapshot could not be indexed, starting empty"),
                }
            }
        }
        Ok(store)
    }

    pub fn config(&self) -> &SearchConfig { &self.config }

    pub fn current(&self) -> Arc<Generation> { self.current.read().clone() }

    /// Build a new generation from `records` and make it current. On error the
    /// current generation is left untouched.
    pub fn rebuild(&self, records: Vec<Record>) -> Result<Arc<Generation>, IngestError> {
        let _guard = self.rebuild_lock.lock();
        let number = self.current().number() + 1;
        let gen = match Generation::build(number, records) {
            Ok(gen) => Arc::new(gen),
            Err(err) => {
                tracing::warn!(error = %err, "rebuild rejected, keeping current generation");
                return Err(err);
            }
        };
        self.install(gen.clone());
        Ok(gen)
    }

    /// Parse raw records at the field boundary, then rebuild.
    pub fn rebuild_raw(&self, raw: Vec<RawRecord>) -> Result<Arc<Generation>, IngestError> {
        self.rebuild(raw.into_iter().map(RawRecord::parse).collect())
    }

    /// Install a fresh empty generation. The old one stays alive for whoever still holds it.
    pub fn clear(&self) -> Arc<Generation> {
        let _guard = self.rebuild_lock.lock();
        let gen = Arc::new(Generation::empty(self.current().number() + 1));
        self.install(gen.clone());
        gen
    }

    fn install(&self, gen: Arc<Generation>) {
        *self.current.write() = gen.clone();
        tracing::info!(generation = gen.number(), num_docs = gen.num_docs(), "generation installed");
        if let Some(paths) = &self.snapshot {
            let meta = MetaFile {
                num_docs: gen.num_docs() as u32,
                generation: gen.number(),
                created_at: gen.stats().built_at,
                version: SNAPSHOT_VERSION,
            };
            if let Err(err) = save_snapshot(paths, gen.docs(), &meta) {
                tracing::warn!(error = %err, root = %paths.root.display(), "failed to write snapshot");
            }
        }
    }

    pub fn search(&self, req: &SearchRequest) -> SearchResults {
        search(&self.current(), req, &self.config)
    }

    pub fn autocomplete(&self, prefix: &str, max_suggestions: usize) -> Vec<String> {
        autocomplete(&self.current(), prefix, max_suggestions, self.config.result_window)
    }
}

impl Default for IndexStore {
    fn default() -> Self { Self::new(SearchConfig::default()) }
}
