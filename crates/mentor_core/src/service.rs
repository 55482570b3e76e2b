use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::{DEFAULT_SEARCH_TOP_K, SERVICE_VERSION};
use crate::embed::EmbeddingProvider;
use crate::error::{MentorError, Result};
use crate::evaluator::Evaluator;
use crate::model::{EvaluationResult, HealthStatus, QaRecord, SimilarMatch, TrainSummary};
use crate::store::QaStore;

/// The embedder plus whichever store snapshot is live.
///
/// Readers clone the `Arc` under a short read lock and then work on an
/// immutable snapshot, so a concurrent retrain never shows them a partially
/// replaced store. Readiness is simply "a snapshot is installed".
///
/// Writers embed concurrently but take `swap_lock` to persist and install,
/// so the last store written to disk is also the one left live.
pub struct MentorService {
    embedder: Arc<dyn EmbeddingProvider>,
    snapshot: RwLock<Option<Arc<QaStore>>>,
    swap_lock: Mutex<()>,
}

impl MentorService {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            snapshot: RwLock::new(None),
            swap_lock: Mutex::new(()),
        }
    }

    pub fn embedder(&self) -> &dyn EmbeddingProvider {
        self.embedder.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.read().is_some()
    }

    pub fn snapshot(&self) -> Result<Arc<QaStore>> {
        self.snapshot.read().clone().ok_or(MentorError::NotReady)
    }

    fn install(&self, store: QaStore) {
        *self.snapshot.write() = Some(Arc::new(store));
    }

    /// Full replace: embeds `records` off to the side, then swaps.
    pub fn replace_all(&self, records: Vec<QaRecord>) -> Result<usize> {
        let store = QaStore::build(records, self.embedder())?;
        let count = store.len();
        let _guard = self.swap_lock.lock();
        self.install(store);
        Ok(count)
    }

    /// Builds, persists, and only then swaps, so the live snapshot always
    /// matches what is on disk.
    pub fn train(&self, records: Vec<QaRecord>, location: &Path) -> Result<TrainSummary> {
        let store = QaStore::build(records, self.embedder())?;
        let item_count = store.len();

        let _guard = self.swap_lock.lock();
        store.persist(location)?;
        self.install(store);

        Ok(TrainSummary {
            status: "success".to_string(),
            item_count,
        })
    }

    pub fn restore(&self, location: &Path) -> Result<usize> {
        let _guard = self.swap_lock.lock();
        let store = QaStore::restore(location)?;
        let expected = self.embedder.dimension();
        if store.embeddings().dim() != expected {
            return Err(MentorError::corrupt(format!(
                "{} holds {}-wide embeddings from '{}', the active embedder '{}' produces {expected}",
                location.display(),
                store.embeddings().dim(),
                store.embedder(),
                self.embedder.name(),
            )));
        }
        let count = store.len();
        self.install(store);
        Ok(count)
    }

    pub fn evaluate(&self, question: &str, answer: &str) -> Result<EvaluationResult> {
        let store = self.snapshot()?;
        Evaluator::new(self.embedder(), &store).evaluate(question, answer)
    }

    pub fn search(&self, query: &str, top_k: Option<usize>) -> Result<Vec<SimilarMatch>> {
        let store = self.snapshot()?;
        Evaluator::new(self.embedder(), &store)
            .find_similar(query, top_k.unwrap_or(DEFAULT_SEARCH_TOP_K))
    }

    pub fn list_topics(&self) -> Result<BTreeSet<String>> {
        Ok(self.snapshot()?.topics())
    }

    pub fn health(&self) -> HealthStatus {
        let snapshot = self.snapshot.read().clone();
        let item_count = snapshot.as_ref().map_or(0, |s| s.len());
        HealthStatus {
            status: "healthy".to_string(),
            ready: item_count > 0,
            item_count,
            trained_at: snapshot.map(|s| s.trained_at()),
            version: SERVICE_VERSION.to_string(),
        }
    }
}
