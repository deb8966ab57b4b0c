use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};

/// Prompts for a username on stdin
pub fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read username from stdin")?;

    let username = input.trim();
    if username.is_empty() {
        anyhow::bail!("Username cannot be empty");
    }
    Ok(username.to_string())
}

/// Prompts for a password without echoing it
pub fn prompt_password() -> Result<String> {
    let password =
        rpassword::prompt_password("Password: ").context("Failed to read password from stdin")?;

    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(password)
}

/// Prompts for a new password twice and checks both entries match
pub fn prompt_new_password() -> Result<String> {
    let password = prompt_password()?;
    let confirm = rpassword::prompt_password("Confirm password: ")
        .context("Failed to read password from stdin")?;

    check_confirmation(password, &confirm)
}

/// Username and password, taking the username from `preset` when given
pub fn prompt_login(preset: Option<String>) -> Result<(String, String)> {
    let username = match preset {
        Some(name) => name,
        None => prompt_username()?,
    };
    Ok((username, prompt_password()?))
}

fn check_confirmation(password: String, confirm: &str) -> Result<String> {
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation() {
        assert_eq!(
            check_confirmation("secret".to_string(), "secret").unwrap(),
            "secret"
        );
        assert!(check_confirmation("secret".to_string(), "Secret").is_err());
    }
}
