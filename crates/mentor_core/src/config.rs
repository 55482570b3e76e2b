pub const DEFAULT_MODEL_ID: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
pub const DEFAULT_STORE_PATH: &str = "data/mentor_store.json";
pub const DEFAULT_TOPIC: &str = "general";

pub const DEFAULT_SEARCH_TOP_K: usize = 5;
/// Evaluation only ever consumes the best candidate.
pub const EVALUATION_TOP_K: usize = 1;
pub const INTERACTIVE_SEARCH_TOP_K: usize = 3;

pub const EXCELLENT_THRESHOLD: f32 = 0.8;
pub const GOOD_THRESHOLD: f32 = 0.6;
pub const PARTIAL_THRESHOLD: f32 = 0.4;

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
