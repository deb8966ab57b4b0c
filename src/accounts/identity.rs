use async_trait::async_trait;
use serde::Deserialize;

use super::AccountError;
use crate::config::IdentityConfig;

/// An identity vouched for by a third-party provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub provider: String,
    pub subject: String,
    pub email: String,
}

/// Verifies ID tokens issued by an identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AccountError>;
}

/// Verifies Google ID tokens with the tokeninfo endpoint
pub struct GoogleIdentityVerifier {
    http: reqwest::Client,
    client_id: String,
    tokeninfo_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    #[serde(default)]
    email: Option<String>,
    // Google returns this as the string "true" / "false"
    #[serde(default)]
    email_verified: Option<String>,
}

impl GoogleIdentityVerifier {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            tokeninfo_url: config.tokeninfo_url.clone(),
        }
    }
}

fn check_token_info(info: TokenInfo, client_id: &str) -> Result<VerifiedIdentity, AccountError> {
    if info.aud != client_id {
        return Err(AccountError::IdentityRejected(
            "token was issued for a different client".to_string(),
        ));
    }
    if info.email_verified.as_deref() != Some("true") {
        return Err(AccountError::IdentityRejected(
            "email address is not verified".to_string(),
        ));
    }
    let email = info
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AccountError::IdentityRejected("token carries no email".to_string()))?;

    Ok(VerifiedIdentity {
        provider: "google".to_string(),
        subject: info.sub,
        email,
    })
}

/// Tokeninfo lookup URL with the token form-encoded into the query
fn tokeninfo_request_url(
    tokeninfo_url: &str,
    id_token: &str,
) -> Result<reqwest::Url, AccountError> {
    reqwest::Url::parse_with_params(tokeninfo_url, &[("id_token", id_token.trim())]).map_err(
        |e| AccountError::IdentityUnavailable(format!("invalid tokeninfo url {}: {}", tokeninfo_url, e)),
    )
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, AccountError> {
        let url = tokeninfo_request_url(&self.tokeninfo_url, id_token)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AccountError::IdentityUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AccountError::IdentityRejected(format!(
                "provider answered {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| AccountError::IdentityUnavailable(e.to_string()))?;

        check_token_info(info, &self.client_id)
    }
}
