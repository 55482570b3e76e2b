use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_TOPIC;

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

/// A reference question/answer pair. Duplicates are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
    #[serde(default = "default_topic")]
    pub topic: String,
}

impl QaRecord {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            topic: topic.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub question_match_score: f32,
    pub answer_match_score: f32,
    pub overall_score: f32,
    pub expected_answer: String,
    pub feedback: String,
    pub topic: String,
    pub matched_question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarMatch {
    pub question: String,
    pub answer: String,
    pub topic: String,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainSummary {
    pub status: String,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub ready: bool,
    pub item_count: usize,
    pub trained_at: Option<DateTime<Utc>>,
    pub version: String,
}
