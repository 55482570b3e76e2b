use crate::config::{EVALUATION_TOP_K, EXCELLENT_THRESHOLD, GOOD_THRESHOLD, PARTIAL_THRESHOLD};
use crate::embed::EmbeddingProvider;
use crate::error::{MentorError, Result};
use crate::model::{EvaluationResult, SimilarMatch};
use crate::retrieval::{cosine_similarity, rank};
use crate::store::QaStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackTier {
    Excellent,
    Good,
    Partial,
    Review,
}

impl FeedbackTier {
    /// Cut points are checked highest first; the first one reached wins.
    pub fn for_score(answer_score: f32) -> Self {
        if answer_score >= EXCELLENT_THRESHOLD {
            Self::Excellent
        } else if answer_score >= GOOD_THRESHOLD {
            Self::Good
        } else if answer_score >= PARTIAL_THRESHOLD {
            Self::Partial
        } else {
            Self::Review
        }
    }

    pub fn message(self, expected_answer: &str) -> String {
        match self {
            Self::Excellent => format!("Excellent! Your answer is very accurate. {expected_answer}"),
            Self::Good => format!(
                "Good attempt! Your answer is mostly correct. The ideal answer would be: {expected_answer}"
            ),
            Self::Partial => format!("Partial understanding shown. Consider: {expected_answer}"),
            Self::Review => {
                format!("Let's review this topic. The correct answer is: {expected_answer}")
            }
        }
    }
}

pub fn feedback(answer_score: f32, expected_answer: &str) -> String {
    FeedbackTier::for_score(answer_score).message(expected_answer)
}

/// Scores learner answers against one store snapshot.
pub struct Evaluator<'a> {
    embedder: &'a dyn EmbeddingProvider,
    store: &'a QaStore,
}

impl<'a> Evaluator<'a> {
    pub fn new(embedder: &'a dyn EmbeddingProvider, store: &'a QaStore) -> Self {
        Self { embedder, store }
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embedder.embed(text).map_err(MentorError::Embedding)
    }

    pub fn evaluate(&self, question: &str, user_answer: &str) -> Result<EvaluationResult> {
        let query = self.embed(question)?;
        let (best_idx, question_match_score) =
            rank(&query, self.store.embeddings(), EVALUATION_TOP_K)
                .into_iter()
                .next()
                .ok_or(MentorError::NotReady)?;
        let best = &self.store.records()[best_idx];

        let answer_match_score =
            cosine_similarity(&self.embed(user_answer)?, &self.embed(&best.answer)?);
        let overall_score = (question_match_score + answer_match_score) / 2.0;

        tracing::debug!(
            matched = %best.question,
            question_match_score,
            answer_match_score,
            "evaluated answer"
        );

        Ok(EvaluationResult {
            question_match_score,
            answer_match_score,
            overall_score,
            expected_answer: best.answer.clone(),
            feedback: feedback(answer_match_score, &best.answer),
            topic: best.topic.clone(),
            matched_question: best.question.clone(),
        })
    }

    pub fn find_similar(&self, query: &str, top_k: usize) -> Result<Vec<SimilarMatch>> {
        let query = self.embed(query)?;
        Ok(rank(&query, self.store.embeddings(), top_k)
            .into_iter()
            .map(|(idx, similarity)| {
                let record = &self.store.records()[idx];
                SimilarMatch {
                    question: record.question.clone(),
                    answer: record.answer.clone(),
                    topic: record.topic.clone(),
                    similarity,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbeddingProvider;
    use crate::model::QaRecord;
    use crate::sample::sample_records;

    #[test]
    fn feedback_tiers_follow_cut_points() {
        assert_eq!(FeedbackTier::for_score(0.95), FeedbackTier::Excellent);
        assert_eq!(FeedbackTier::for_score(0.8), FeedbackTier::Excellent);
        assert_eq!(FeedbackTier::for_score(0.79), FeedbackTier::Good);
        assert_eq!(FeedbackTier::for_score(0.6), FeedbackTier::Good);
        assert_eq!(FeedbackTier::for_score(0.4), FeedbackTier::Partial);
        assert_eq!(FeedbackTier::for_score(0.39), FeedbackTier::Review);
        assert_eq!(FeedbackTier::for_score(-0.2), FeedbackTier::Review);
    }

    #[test]
    fn feedback_embeds_expected_answer() {
        assert_eq!(
            feedback(0.65, "2x"),
            "Good attempt! Your answer is mostly correct. The ideal answer would be: 2x"
        );
        assert_eq!(
            feedback(0.1, "2x"),
            "Let's review this topic. The correct answer is: 2x"
        );
        assert_eq!(feedback(0.5, "2x"), "Partial understanding shown. Consider: 2x");
    }

    #[test]
    fn identical_question_and_answer_scores_excellent() {
        let embedder = HashEmbeddingProvider::default();
        let store = QaStore::build(
            vec![QaRecord::new(
                "What is testing?",
                "Testing verifies software works correctly.",
                "general",
            )],
            &embedder,
        )
        .unwrap();

        let result = Evaluator::new(&embedder, &store)
            .evaluate("What is testing?", "Testing verifies software works correctly.")
            .unwrap();

        assert!((result.question_match_score - 1.0).abs() < 1e-5);
        assert!((result.answer_match_score - 1.0).abs() < 1e-5);
        assert!((result.overall_score - 1.0).abs() < 1e-5);
        assert!(result.feedback.contains("Excellent"));
        assert_eq!(result.topic, "general");
        assert_eq!(result.matched_question, "What is testing?");
    }

    #[test]
    fn overall_score_is_the_mean() {
        let embedder = HashEmbeddingProvider::default();
        let store = QaStore::build(sample_records(), &embedder).unwrap();

        let result = Evaluator::new(&embedder, &store)
            .evaluate("What is a prime number?", "A number divisible only by one and itself")
            .unwrap();

        assert_eq!(result.matched_question, "What is a prime number?");
        assert_eq!(result.topic, "math");
        let mean = (result.question_match_score + result.answer_match_score) / 2.0;
        assert!((result.overall_score - mean).abs() < 1e-6);
        assert!(result.feedback.ends_with(&result.expected_answer));
    }

    #[test]
    fn find_similar_returns_descending_matches() {
        let embedder = HashEmbeddingProvider::default();
        let store = QaStore::build(sample_records(), &embedder).unwrap();
        let evaluator = Evaluator::new(&embedder, &store);

        let top = evaluator.find_similar("derivative of x squared", 1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].question, "What is the derivative of x²?");

        let five = evaluator.find_similar("list in python", 5).unwrap();
        assert_eq!(five.len(), 5);
        assert!(five.windows(2).all(|w| w[0].similarity >= w[1].similarity));

        assert_eq!(evaluator.find_similar("anything", 100).unwrap().len(), 10);
    }
}
