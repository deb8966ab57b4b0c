use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A multiple-choice question from the question bank.
///
/// Example YAML:
/// ```yaml
/// - id: 1
///   prompt: "What is your view on the nature of the divine?"
///   options:
///     - label: "Multiple gods and goddesses"
///       points: { hinduism: 3, paganism: 3 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Question {
    pub id: u32,
    pub prompt: String,
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// Find an option by its exact label
    pub fn option(&self, label: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|o| o.label == label)
    }

    /// Highest base point value across every option of this question
    pub fn max_points(&self) -> u32 {
        self.options
            .iter()
            .flat_map(|o| o.points.values().copied())
            .max()
            .unwrap_or(0)
    }
}

/// One selectable answer and the traditions it contributes to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnswerOption {
    pub label: String,

    /// Raw tradition key -> base points. Keys may be aliases.
    pub points: BTreeMap<String, u32>,
}

/// Display data for a canonical tradition.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TraditionDescriptor {
    pub name: String,
    pub description: String,
    pub practices: String,
    pub core_beliefs: String,

    /// Extra reference text handed to the chat assistant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_curiosities: Option<String>,
}

/// A user's selection for one question.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Answer {
    pub question_id: u32,
    pub answer: String,
}

impl Answer {
    pub fn new(question_id: u32, answer: impl Into<String>) -> Self {
        Self {
            question_id,
            answer: answer.into(),
        }
    }
}

/// A ranked tradition returned to the user.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Recommendation {
    /// Empty on results saved before tradition keys were stored
    #[serde(default)]
    pub key: String,
    pub name: String,
    pub description: String,
    pub practices: String,
    pub core_beliefs: String,
    pub score: u32,
    pub percentage: u8,
}

impl Recommendation {
    pub fn new(key: &str, tradition: &TraditionDescriptor, score: u32, percentage: u8) -> Self {
        Self {
            key: key.to_string(),
            name: tradition.name.clone(),
            description: tradition.description.clone(),
            practices: tradition.practices.clone(),
            core_beliefs: tradition.core_beliefs.clone(),
            score,
            percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            id: 1,
            prompt: "Pick one".to_string(),
            options: vec![
                AnswerOption {
                    label: "A".to_string(),
                    points: BTreeMap::from([("buddhism".to_string(), 3)]),
                },
                AnswerOption {
                    label: "B".to_string(),
                    points: BTreeMap::from([
                        ("christianity".to_string(), 2),
                        ("islam".to_string(), 4),
                    ]),
                },
            ],
        }
    }

    #[test]
    fn test_option_lookup_is_exact() {
        let question = sample_question();
        assert!(question.option("A").is_some());
        assert!(question.option("a").is_none());
        assert!(question.option("C").is_none());
    }

    #[test]
    fn test_max_points_spans_all_options() {
        assert_eq!(sample_question().max_points(), 4);
    }

    #[test]
    fn test_max_points_without_options() {
        let question = Question {
            id: 2,
            prompt: "Empty".to_string(),
            options: vec![],
        };
        assert_eq!(question.max_points(), 0);
    }

    #[test]
    fn test_answer_wire_format() {
        let answers: Vec<Answer> =
            serde_json::from_str(r#"[{"question_id": 3, "answer": "Reincarnation until enlightenment"}]"#)
                .unwrap();
        assert_eq!(answers[0], Answer::new(3, "Reincarnation until enlightenment"));
    }

    #[test]
    fn test_recommendation_json_fields() {
        let tradition = TraditionDescriptor {
            name: "Buddhism".to_string(),
            description: "Path to enlightenment".to_string(),
            practices: "Meditation".to_string(),
            core_beliefs: "Four Noble Truths".to_string(),
            common_curiosities: Some("Do Buddhists believe in God?".to_string()),
        };
        let rec = Recommendation::new("buddhism", &tradition, 12, 80);
        let value = serde_json::to_value(&rec).unwrap();

        assert_eq!(value["name"], "Buddhism");
        assert_eq!(value["core_beliefs"], "Four Noble Truths");
        assert_eq!(value["score"], 12);
        assert_eq!(value["percentage"], 80);
        assert!(value.get("common_curiosities").is_none());
    }
}
