use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::quiz::{score, Answer, QuizConfig, Recommendation};
use crate::storage::{StorageError, UserRepository};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Please answer all questions! ({got} of {expected} answered)")]
    Incomplete { expected: usize, got: usize },

    #[error("Answer refers to unknown question {0}")]
    UnknownQuestion(u32),

    #[error("Question {0} answered more than once")]
    DuplicateAnswer(u32),
}

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("user '{0}' not found")]
    UnknownUser(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Check that a submission answers every question exactly once.
///
/// Option labels are not checked here; the engine skips unknown labels.
pub fn check_submission(quiz: &QuizConfig, answers: &[Answer]) -> Result<(), SubmissionError> {
    if answers.len() != quiz.questions.len() {
        return Err(SubmissionError::Incomplete {
            expected: quiz.questions.len(),
            got: answers.len(),
        });
    }

    let mut seen = HashSet::new();
    for answer in answers {
        if quiz.question(answer.question_id).is_none() {
            return Err(SubmissionError::UnknownQuestion(answer.question_id));
        }
        if !seen.insert(answer.question_id) {
            return Err(SubmissionError::DuplicateAnswer(answer.question_id));
        }
    }

    Ok(())
}

/// Runs submissions through the scoring engine and keeps the latest result per user.
pub struct AssessmentService {
    quiz: Arc<QuizConfig>,
    repo: Arc<dyn UserRepository>,
}

impl AssessmentService {
    pub fn new(quiz: Arc<QuizConfig>, repo: Arc<dyn UserRepository>) -> Self {
        Self { quiz, repo }
    }

    pub fn quiz(&self) -> &QuizConfig {
        &self.quiz
    }

    /// Score a complete submission and overwrite the user's stored results.
    pub fn submit(
        &self,
        username: &str,
        answers: Vec<Answer>,
    ) -> Result<Vec<Recommendation>, AssessmentError> {
        check_submission(&self.quiz, &answers)?;

        let mut record = self
            .repo
            .get(username)?
            .ok_or_else(|| AssessmentError::UnknownUser(username.to_string()))?;

        let result = score(&self.quiz, &answers);
        tracing::info!(
            username,
            max_possible = result.max_possible,
            top = result.recommendations.first().map(|r| r.key.as_str()).unwrap_or("-"),
            "assessment scored"
        );

        record.answers = answers;
        record.results = result.recommendations.clone();
        record.assessed_at = Some(Utc::now());
        self.repo.update(record)?;

        Ok(result.recommendations)
    }

    /// Latest stored recommendations; empty if the user never submitted
    pub fn results(&self, username: &str) -> Result<Vec<Recommendation>, AssessmentError> {
        self.repo
            .get(username)?
            .map(|record| record.results)
            .ok_or_else(|| AssessmentError::UnknownUser(username.to_string()))
    }

    pub fn reset(&self, username: &str) -> Result<(), AssessmentError> {
        let mut record = self
            .repo
            .get(username)?
            .ok_or_else(|| AssessmentError::UnknownUser(username.to_string()))?;

        record.answers.clear();
        record.results.clear();
        record.assessed_at = None;
        self.repo.update(record)?;

        tracing::info!(username, "assessment reset");
        Ok(())
    }
}
