use anyhow::{Context, Result};
use std::io::{BufRead, IsTerminal, Write};

use crate::quiz::{Answer, Question, QuizConfig};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    if read == 0 {
        anyhow::bail!("Input closed before the quiz was finished");
    }
    Ok(input.trim().to_string())
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
pub fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Print text with a typewriter effect, one character at a time.
/// Printed at once when stdout is not a terminal.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;

    let mut stdout = std::io::stdout();
    if !stdout.is_terminal() {
        println!("{}", text);
        return;
    }
    for c in text.chars() {
        print!("{}", c);
        stdout.flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

/// Parse a 1-based option number, returning the 0-based index
fn parse_choice(input: &str, option_count: usize) -> Result<usize, String> {
    match input.trim().parse::<usize>() {
        Ok(n) if (1..=option_count).contains(&n) => Ok(n - 1),
        _ => Err(format!("enter a number between 1 and {}", option_count)),
    }
}

fn ask(question: &Question, position: usize, total: usize) -> Result<Answer> {
    println!();
    typewriter(&format!("[{}/{}] {}", position, total, question.prompt));
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}) {}", i + 1, option.label);
    }

    let index = loop {
        let input = prompt("Your choice: ")?;
        match parse_choice(&input, question.options.len()) {
            Ok(index) => break index,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };

    Ok(Answer::new(question.id, question.options[index].label.clone()))
}

/// Walk the user through every question.
///
/// Returns None if the user declines to submit at the end.
pub fn run_quiz_wizard(quiz: &QuizConfig) -> Result<Option<Vec<Answer>>> {
    println!();
    typewriter("Path Finder");
    println!("===========");
    typewriter("Answer each question with the option that fits you best.");

    let total = quiz.questions.len();
    let answers = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| ask(q, i + 1, total))
        .collect::<Result<Vec<_>>>()?;

    println!();
    println!("Your answers:");
    for answer in &answers {
        println!("  Q{}: {}", answer.question_id, answer.answer);
    }
    println!();

    if prompt_yes_no("Submit these answers?", true)? {
        Ok(Some(answers))
    } else {
        println!("Aborted. Nothing was saved.");
        Ok(None)
    }
}
