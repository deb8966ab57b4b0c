use std::collections::{BTreeMap, HashMap, HashSet};

use super::bank::QuizConfig;
use super::types::{Answer, Question, Recommendation};

/// Number of recommendations returned for a submission
pub const TOP_N: usize = 3;

/// Accumulated score for one canonical tradition key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub key: String,
    pub score: u32,
    /// Distinct questions that contributed to this key
    pub coverage: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    /// Every touched key, ranked by (score, coverage) descending
    pub ranking: Vec<Tally>,
    pub max_possible: u32,
    pub recommendations: Vec<Recommendation>,
}

impl ScoreResult {
    pub fn tally(&self, key: &str) -> Option<&Tally> {
        self.ranking.iter().find(|t| t.key == key)
    }
}

/// Resolve a raw tradition key to its canonical key.
/// Aliases are not followed transitively.
pub fn normalize<'a>(key: &'a str, aliases: &'a BTreeMap<String, String>) -> &'a str {
    aliases.get(key).map(String::as_str).unwrap_or(key)
}

/// Score a submission against the quiz.
///
/// Answers naming an unknown question contribute nothing. Answers naming a
/// known question but an unknown option still count toward `max_possible`,
/// since the best option for that question was available to the user.
/// Keys with equal score and coverage keep the order in which they first
/// received points.
pub fn score(quiz: &QuizConfig, answers: &[Answer]) -> ScoreResult {
    let questions: HashMap<u32, &Question> = quiz.questions.iter().map(|q| (q.id, q)).collect();

    let mut ranking: Vec<Tally> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut max_possible: u32 = 0;

    for answer in answers {
        let Some(question) = questions.get(&answer.question_id) else {
            tracing::debug!(question_id = answer.question_id, "skipping answer for unknown question");
            continue;
        };
        let weight = quiz.weight(question.id);
        max_possible = max_possible.saturating_add(question.max_points().saturating_mul(weight));

        let Some(option) = question.option(&answer.answer) else {
            tracing::debug!(
                question_id = answer.question_id,
                answer = %answer.answer,
                "skipping unknown option"
            );
            continue;
        };

        // Several raw aliases may fold into one key; coverage counts the question once
        let mut touched: HashSet<usize> = HashSet::new();
        for (raw_key, points) in &option.points {
            let key = normalize(raw_key, &quiz.aliases);
            let slot = *slots.entry(key).or_insert_with(|| {
                ranking.push(Tally {
                    key: key.to_string(),
                    score: 0,
                    coverage: 0,
                });
                ranking.len() - 1
            });
            let tally = &mut ranking[slot];
            tally.score = tally.score.saturating_add(points.saturating_mul(weight));
            touched.insert(slot);
        }
        for slot in touched {
            ranking[slot].coverage += 1;
        }
    }

    // Stable sort keeps first-encountered order for full ties
    ranking.sort_by(|a, b| b.score.cmp(&a.score).then(b.coverage.cmp(&a.coverage)));

    let recommendations: Vec<Recommendation> = ranking
        .iter()
        .filter_map(|tally| {
            quiz.traditions.get(&tally.key).map(|tradition| {
                Recommendation::new(
                    &tally.key,
                    tradition,
                    tally.score,
                    percentage(tally.score, max_possible),
                )
            })
        })
        .take(TOP_N)
        .collect();

    tracing::debug!(
        answers = answers.len(),
        traditions = ranking.len(),
        max_possible,
        "scored submission"
    );

    ScoreResult {
        ranking,
        max_possible,
        recommendations,
    }
}

/// Share of the maximum possible score, rounded half to even and capped at 100.
/// Folded aliases can push a key past the per-question maximum, hence the cap.
pub fn percentage(score: u32, max_possible: u32) -> u8 {
    if max_possible == 0 {
        return 0;
    }
    let pct = (f64::from(score) / f64::from(max_possible) * 100.0).round_ties_even();
    pct.clamp(0.0, 100.0) as u8
}
