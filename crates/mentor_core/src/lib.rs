pub mod config;
pub mod embed;
pub mod error;
pub mod evaluator;
pub mod ingest;
pub mod matrix;
pub mod minilm_embed;
pub mod model;
pub mod retrieval;
pub mod sample;
pub mod service;
pub mod store;

pub use config::{
    DEFAULT_EMBEDDING_DIM, DEFAULT_MODEL_ID, DEFAULT_SEARCH_TOP_K, DEFAULT_STORE_PATH,
    DEFAULT_TOPIC, EVALUATION_TOP_K, INTERACTIVE_SEARCH_TOP_K,
};
pub use embed::{EmbeddingProvider, HashEmbeddingProvider};
pub use error::{MentorError, Result};
pub use evaluator::{feedback, Evaluator, FeedbackTier};
pub use ingest::{clean_records, load_records_file, parse_records, RawRecord, RecordFormat};
pub use matrix::EmbeddingMatrix;
pub use minilm_embed::MiniLmEmbeddingProvider;
pub use model::{EvaluationResult, HealthStatus, QaRecord, SimilarMatch, TrainSummary};
pub use retrieval::{cosine_similarity, rank};
pub use sample::sample_records;
pub use service::MentorService;
pub use store::QaStore;
