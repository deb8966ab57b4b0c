use std::collections::{BTreeSet, HashSet};

use super::bank::QuizConfig;
use super::engine::normalize;

/// Validate quiz data at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_quiz(quiz: &QuizConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if quiz.questions.is_empty() {
        errors.push("quiz.questions: at least one question is required".to_string());
    }

    let mut seen_ids = HashSet::new();
    for (i, question) in quiz.questions.iter().enumerate() {
        if question.id == 0 {
            errors.push(format!("quiz.questions[{}].id: must be positive", i));
        }
        if !seen_ids.insert(question.id) {
            errors.push(format!(
                "quiz.questions[{}].id: duplicate question id {}",
                i, question.id
            ));
        }
        if question.prompt.trim().is_empty() {
            errors.push(format!("quiz.questions[{}].prompt: must not be empty", i));
        }
        if question.options.is_empty() {
            errors.push(format!(
                "quiz.questions[{}].options: at least one option is required",
                i
            ));
        }

        let mut seen_labels = HashSet::new();
        for (j, option) in question.options.iter().enumerate() {
            if !seen_labels.insert(option.label.as_str()) {
                errors.push(format!(
                    "quiz.questions[{}].options[{}].label: duplicate label '{}'",
                    i, j, option.label
                ));
            }
            if option.points.is_empty() {
                errors.push(format!(
                    "quiz.questions[{}].options[{}].points: must name at least one tradition",
                    i, j
                ));
            }
            for (key, points) in &option.points {
                if *points == 0 {
                    errors.push(format!(
                        "quiz.questions[{}].options[{}].points.{}: must be positive",
                        i, j, key
                    ));
                }
            }
        }
    }

    for (id, weight) in &quiz.weights {
        if *weight == 0 {
            errors.push(format!("quiz.weights.{}: must be positive", id));
        }
        if !seen_ids.contains(id) {
            errors.push(format!("quiz.weights.{}: no question with this id", id));
        }
    }

    for (alias, canonical) in &quiz.aliases {
        if quiz.aliases.contains_key(canonical) {
            errors.push(format!(
                "quiz.aliases.{}: target '{}' is itself an alias",
                alias, canonical
            ));
        } else if !quiz.traditions.contains_key(canonical) {
            errors.push(format!(
                "quiz.aliases.{}: target '{}' has no tradition descriptor",
                alias, canonical
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Canonical keys that receive points but have no descriptor.
///
/// These are legal: they accumulate score but never appear in results.
pub fn unmapped_keys(quiz: &QuizConfig) -> BTreeSet<String> {
    quiz.questions
        .iter()
        .flat_map(|q| q.options.iter())
        .flat_map(|o| o.points.keys())
        .map(|key| normalize(key, &quiz.aliases))
        .filter(|key| !quiz.traditions.contains_key(*key))
        .map(str::to_string)
        .collect()
}
