use super::{ChatError, ChatMessage};
use crate::quiz::{normalize, QuizConfig, TraditionDescriptor};

/// Look up a tradition by canonical key, alias, or display name (case-insensitive).
pub fn find_tradition<'a>(
    quiz: &'a QuizConfig,
    query: &str,
) -> Option<(&'a str, &'a TraditionDescriptor)> {
    let query = query.trim();
    let lowered = query.to_lowercase();
    let key = normalize(&lowered, &quiz.aliases);

    if let Some((key, descriptor)) = quiz.traditions.get_key_value(key) {
        return Some((key.as_str(), descriptor));
    }

    quiz.traditions
        .iter()
        .find(|(_, descriptor)| descriptor.name.eq_ignore_ascii_case(query))
        .map(|(key, descriptor)| (key.as_str(), descriptor))
}

/// Reference text about a tradition, handed to the assistant as context.
pub fn reference_context(tradition: &TraditionDescriptor) -> String {
    let mut parts = vec![
        format!("Description: {}", tradition.description),
        format!("Practices: {}", tradition.practices),
        format!("Core Beliefs: {}", tradition.core_beliefs),
    ];
    if let Some(curiosities) = tradition.common_curiosities.as_deref() {
        parts.push(format!("Common Questions: {}", curiosities));
    }
    parts.join("\n\n")
}

pub fn system_prompt(tradition: &TraditionDescriptor) -> String {
    format!(
        "You're a spiritual guide for {name}.\n\
         Reference:\n{context}\n\
         Rules: Keep 30-50 words, be respectful, use * for bullet points \
         (format: \"Text: * item * item\"), answer directly.",
        name = tradition.name,
        context = reference_context(tradition),
    )
}

/// Assemble a chat request: system prompt, the last `history_limit` messages, then the new message.
pub fn build_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    message: &str,
    history_limit: usize,
) -> Result<Vec<ChatMessage>, ChatError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ChatError::MissingInput);
    }

    let recent = &history[history.len().saturating_sub(history_limit)..];

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(recent.iter().cloned());
    messages.push(ChatMessage::user(message));
    Ok(messages)
}
