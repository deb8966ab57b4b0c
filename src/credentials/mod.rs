pub mod prompt;

/// Environment variable holding the Together AI API key
pub const ENV_API_KEY_VAR: &str = "TOGETHER_API_KEY";

pub use prompt::{prompt_login, prompt_new_password, prompt_password, prompt_username};

/// Check for an API key in the TOGETHER_API_KEY environment variable.
/// Returns Some(key) if the env var is set and non-empty, None otherwise.
pub fn get_api_key_from_env() -> Option<String> {
    non_empty(std::env::var(ENV_API_KEY_VAR).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  key-123 \n".to_string())), Some("key-123".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }
}
