pub mod bank;
pub mod engine;
pub mod types;
pub mod validation;

pub use bank::QuizConfig;
pub use engine::{normalize, percentage, score, ScoreResult, Tally, TOP_N};
pub use types::{Answer, AnswerOption, Question, Recommendation, TraditionDescriptor};
pub use validation::{unmapped_keys, validate_quiz};
