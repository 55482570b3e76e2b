use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::embed::EmbeddingProvider;
use crate::error::{MentorError, Result};
use crate::matrix::EmbeddingMatrix;
use crate::model::QaRecord;

const STORE_FORMAT: &str = "mentor-store";
const STORE_VERSION: u32 = 1;

/// Immutable snapshot of the reference records and their question
/// embeddings. Row `i` of `embeddings` always belongs to `records[i]`.
#[derive(Debug, Clone)]
pub struct QaStore {
    records: Vec<QaRecord>,
    embeddings: EmbeddingMatrix,
    embedder: String,
    trained_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    format: &'a str,
    version: u32,
    embedder: &'a str,
    trained_at: DateTime<Utc>,
    records: &'a [QaRecord],
    embeddings: &'a EmbeddingMatrix,
}

#[derive(Deserialize)]
struct StoreFile {
    format: Option<String>,
    version: Option<u32>,
    embedder: Option<String>,
    trained_at: Option<DateTime<Utc>>,
    records: Option<Vec<QaRecord>>,
    embeddings: Option<EmbeddingMatrix>,
}

impl QaStore {
    /// Embeds every question in one batch and builds a fresh snapshot.
    pub fn build(records: Vec<QaRecord>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if records.is_empty() {
            return Err(MentorError::validation("No training data available"));
        }

        let questions: Vec<&str> = records.iter().map(|r| r.question.as_str()).collect();
        let rows = embedder
            .embed_batch(&questions)
            .map_err(MentorError::Embedding)?;
        if rows.len() != records.len() {
            return Err(MentorError::Embedding(anyhow::anyhow!(
                "embedder returned {} rows for {} questions",
                rows.len(),
                records.len()
            )));
        }
        let embeddings = EmbeddingMatrix::from_rows(rows)?;

        tracing::info!(
            records = records.len(),
            dim = embeddings.dim(),
            embedder = embedder.name(),
            "built qa store"
        );

        Ok(Self {
            records,
            embeddings,
            embedder: embedder.name().to_string(),
            trained_at: Utc::now(),
        })
    }

    pub fn records(&self) -> &[QaRecord] {
        &self.records
    }

    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn embedder(&self) -> &str {
        &self.embedder
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn topics(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.topic.clone()).collect()
    }

    /// Writes the snapshot to `path`, creating parent directories. The blob
    /// goes to a uniquely named sibling first and is renamed into place; a
    /// failed write leaves nothing behind.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(
                &mut writer,
                &StoreFileRef {
                    format: STORE_FORMAT,
                    version: STORE_VERSION,
                    embedder: &self.embedder,
                    trained_at: self.trained_at,
                    records: &self.records,
                    embeddings: &self.embeddings,
                },
            )?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| MentorError::Io(e.error))?;

        tracing::info!(path = %path.display(), records = self.records.len(), "persisted qa store");
        Ok(())
    }

    pub fn restore(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(MentorError::NotFound(path.to_path_buf()))
            }
            Err(err) => return Err(err.into()),
        };

        let file: StoreFile = serde_json::from_slice(&bytes)
            .map_err(|e| MentorError::corrupt(format!("{}: {e}", path.display())))?;

        if file.format.as_deref() != Some(STORE_FORMAT) || file.version != Some(STORE_VERSION) {
            return Err(MentorError::corrupt(format!(
                "{}: not a {STORE_FORMAT} v{STORE_VERSION} file",
                path.display()
            )));
        }
        let (Some(records), Some(embeddings)) = (file.records, file.embeddings) else {
            return Err(MentorError::corrupt(format!(
                "{}: missing records or embeddings",
                path.display()
            )));
        };
        if records.is_empty()
            || !embeddings.is_well_formed()
            || embeddings.row_count() != records.len()
        {
            return Err(MentorError::corrupt(format!(
                "{}: {} records against {} embedding rows",
                path.display(),
                records.len(),
                embeddings.row_count()
            )));
        }

        tracing::info!(path = %path.display(), records = records.len(), "restored qa store");
        Ok(Self {
            records,
            embeddings,
            embedder: file.embedder.unwrap_or_default(),
            trained_at: file.trained_at.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbeddingProvider;
    use crate::sample::sample_records;

    #[test]
    fn build_keeps_records_and_rows_aligned() {
        let embedder = HashEmbeddingProvider::new(32);
        let store = QaStore::build(sample_records(), &embedder).unwrap();

        assert_eq!(store.len(), 10);
        assert_eq!(store.embeddings().row_count(), store.len());
        assert_eq!(store.embeddings().dim(), 32);
        assert_eq!(store.embedder(), "hash");
    }

    #[test]
    fn build_rejects_empty_input() {
        let embedder = HashEmbeddingProvider::default();
        let err = QaStore::build(Vec::new(), &embedder).unwrap_err();
        assert!(matches!(err, MentorError::Validation(_)));
    }

    #[test]
    fn persist_then_restore_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/store.json");
        let embedder = HashEmbeddingProvider::new(16);
        let store = QaStore::build(sample_records(), &embedder).unwrap();

        store.persist(&path).unwrap();
        let restored = QaStore::restore(&path).unwrap();

        assert_eq!(restored.records(), store.records());
        assert_eq!(restored.embeddings(), store.embeddings());
        assert_eq!(restored.trained_at(), store.trained_at());
        let leftovers = fs::read_dir(dir.path().join("nested/dir")).unwrap().count();
        assert_eq!(leftovers, 1, "only the store file should remain");
    }

    #[test]
    fn failed_persist_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a directory squatting on the target makes the final rename fail
        let target = dir.path().join("store.json");
        fs::create_dir(&target).unwrap();
        let store = QaStore::build(sample_records(), &HashEmbeddingProvider::new(8)).unwrap();

        let err = store.persist(&target).unwrap_err();
        assert!(matches!(err, MentorError::Io(_)));
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
    }

    #[test]
    fn restore_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = QaStore::restore(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, MentorError::NotFound(_)));
    }

    #[test]
    fn restore_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"\x80\x04\x95 definitely not json").unwrap();

        let err = QaStore::restore(&path).unwrap_err();
        assert!(matches!(err, MentorError::CorruptData(_)));
    }

    #[test]
    fn restore_without_embeddings_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"format":"mentor-store","version":1,"records":[{"question":"q","answer":"a"}]}"#,
        )
        .unwrap();

        let err = QaStore::restore(&path).unwrap_err();
        assert!(matches!(err, MentorError::CorruptData(_)));
    }

    #[test]
    fn restore_with_mismatched_rows_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(
            &path,
            r#"{"format":"mentor-store","version":1,
                "records":[{"question":"q","answer":"a"},{"question":"q2","answer":"a2"}],
                "embeddings":{"dim":2,"data":[1.0,0.0]}}"#,
        )
        .unwrap();

        let err = QaStore::restore(&path).unwrap_err();
        assert!(matches!(err, MentorError::CorruptData(_)));
    }

    #[test]
    fn topics_are_distinct() {
        let embedder = HashEmbeddingProvider::new(16);
        let mut records = sample_records();
        records.reverse();
        let store = QaStore::build(records, &embedder).unwrap();

        let topics: Vec<String> = store.topics().into_iter().collect();
        assert_eq!(topics, vec!["math".to_string(), "python".to_string()]);
    }
}
