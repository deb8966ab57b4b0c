use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::quiz::{QuizConfig, Recommendation};

/// Width used for wrapping when stdout is not a terminal
const DEFAULT_WIDTH: usize = 80;

/// Indent of the detail lines under each recommendation ("  1.  " + percentage)
const DETAIL_INDENT: usize = 6;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(10);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn detail_block(label: &str, text: &str, width: usize) -> String {
    let indent = " ".repeat(DETAIL_INDENT);
    let body = if label.is_empty() {
        text.to_string()
    } else {
        format!("{}: {}", label, text)
    };
    wrap_text(&body, width.saturating_sub(DETAIL_INDENT))
        .into_iter()
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format recommendations as a ranked list
/// Header line: index, percentage, name, raw score; then the wrapped details
pub fn format_recommendations(recs: &[Recommendation], use_colors: bool) -> String {
    if recs.is_empty() {
        return "No results yet. Take the quiz with `path-finder take`.".to_string();
    }

    let width = get_terminal_width().unwrap_or(DEFAULT_WIDTH).min(100);

    recs.iter()
        .enumerate()
        .map(|(idx, rec)| {
            let index_str = format!("{:>2}.", idx + 1);
            let pct_str = format!("{:>3}%", rec.percentage);
            let score_str = format!("(score {})", rec.score);

            let header = if use_colors {
                format!(
                    "{} {}  {}  {}",
                    index_str.dimmed(),
                    pct_str.bold(),
                    rec.name.cyan().bold(),
                    score_str.dimmed()
                )
            } else {
                format!("{} {}  {}  {}", index_str, pct_str, rec.name, score_str)
            };

            [
                header,
                detail_block("", &rec.description, width),
                detail_block("Practices", &rec.practices, width),
                detail_block("Core beliefs", &rec.core_beliefs, width),
            ]
            .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format recommendations as tab-separated values for scripting
/// Columns: percentage, score, key, name (no headers, no colors)
pub fn format_tsv(recs: &[Recommendation]) -> String {
    recs.iter()
        .map(|rec| format!("{}\t{}\t{}\t{}", rec.percentage, rec.score, rec.key, rec.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_json(recs: &[Recommendation]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(recs)
}

/// Format the question bank with numbered options, as the quiz presents them
pub fn format_questions(quiz: &QuizConfig, use_colors: bool) -> String {
    quiz.questions
        .iter()
        .map(|q| {
            let weight = quiz.weight(q.id);
            let weight_note = if weight != 1 {
                format!(" (x{})", weight)
            } else {
                String::new()
            };

            let title = format!("Q{}. {}", q.id, q.prompt);
            let title = if use_colors {
                format!("{}{}", title.bold(), weight_note.dimmed())
            } else {
                format!("{}{}", title, weight_note)
            };

            let options = q
                .options
                .iter()
                .enumerate()
                .map(|(i, o)| format!("    {}) {}", i + 1, o.label))
                .collect::<Vec<_>>()
                .join("\n");

            format!("{}\n{}", title, options)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Lay out an assistant reply, putting each `*` bullet on its own line
/// e.g. "Practices: * Meditation * Chanting" becomes a heading and two bullets
pub fn format_reply(reply: &str) -> String {
    let mut parts = reply.split(" * ").map(str::trim);
    let head = parts.next().unwrap_or_default().trim_end_matches(" *");
    let head = head.strip_prefix("* ").map_or(head.to_string(), |item| format!("  • {}", item));

    std::iter::once(head)
        .chain(
            parts
                .filter(|item| !item.is_empty())
                .map(|item| format!("  • {}", item)),
        )
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(key: &str, name: &str, score: u32, percentage: u8) -> Recommendation {
        Recommendation {
            key: key.to_string(),
            name: name.to_string(),
            description: "Path to enlightenment through mindfulness and compassion.".to_string(),
            practices: "Meditation, mindfulness".to_string(),
            core_beliefs: "Four Noble Truths".to_string(),
            score,
            percentage,
        }
    }

    #[test]
    fn test_format_recommendations_empty() {
        assert_eq!(
            format_recommendations(&[], false),
            "No results yet. Take the quiz with `path-finder take`."
        );
    }

    #[test]
    fn test_format_recommendations_layout() {
        let recs = vec![
            sample("buddhism", "Buddhism", 18, 72),
            sample("taoism", "Taoism", 9, 36),
        ];
        let result = format_recommendations(&recs, false);
        assert!(result.starts_with(" 1.  72%  Buddhism  (score 18)"));
        assert!(result.contains("\n 2.  36%  Taoism  (score 9)"));
        assert!(result.contains("      Practices: Meditation, mindfulness"));
        assert!(result.contains("      Core beliefs: Four Noble Truths"));
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("one two three four five six", 10);
        assert_eq!(lines, vec!["one two", "three four", "five six"]);
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn test_wrap_text_long_word() {
        let lines = wrap_text("a supercalifragilistic word", 10);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "word"]);
    }

    #[test]
    fn test_format_tsv() {
        let recs = vec![
            sample("buddhism", "Buddhism", 18, 72),
            sample("new_age", "New Age Spirituality", 9, 36),
        ];
        assert_eq!(
            format_tsv(&recs),
            "72\t18\tbuddhism\tBuddhism\n36\t9\tnew_age\tNew Age Spirituality"
        );
        assert_eq!(format_tsv(&[]), "");
    }

    #[test]
    fn test_format_json_fields() {
        let json = format_json(&[sample("buddhism", "Buddhism", 18, 72)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let first = &value[0];
        for field in ["name", "description", "practices", "core_beliefs", "score", "percentage", "key"] {
            assert!(first.get(field).is_some(), "missing {field}");
        }
        assert_eq!(first["percentage"], 72);
    }

    #[test]
    fn test_format_questions() {
        let quiz = QuizConfig::default();
        let result = format_questions(&quiz, false);
        assert!(result.starts_with("Q1. What is your view on the nature of the divine? (x3)"));
        assert!(result.contains("    1) One supreme God who created everything"));
        assert_eq!(
            result.lines().filter(|l| l.starts_with('Q')).count(),
            quiz.questions.len()
        );
    }

    #[test]
    fn test_format_reply_bullets() {
        assert_eq!(
            format_reply("Practices: * Meditation * Chanting"),
            "Practices:\n  • Meditation\n  • Chanting"
        );
        assert_eq!(format_reply("Just a sentence."), "Just a sentence.");
    }
}
