//! Third-party check that an address's mail server accepts mail for it.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::EmailCheckConfig;

/// Key value shipped in sample configuration; treated as no key at all
pub const PLACEHOLDER_API_KEY: &str = "YOUR_APILAYER_KEY_HERE";

/// Shown to the user when the address is known to be undeliverable
pub const UNDELIVERABLE_MESSAGE: &str =
    "Invalid email ID. Please check for typos or use a different email.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Deliverable,
    Undeliverable,
    /// No check was made, or it could not complete
    Unchecked,
}

impl Verdict {
    /// Registration only stops on a definite negative answer
    pub fn allows_registration(self) -> bool {
        self != Verdict::Undeliverable
    }
}

#[derive(Error, Debug)]
pub enum ExternalServiceError {
    #[error("email check timed out")]
    Timeout,

    #[error("email check request failed: {0}")]
    Transport(reqwest::Error),

    #[error("email check returned HTTP {0}")]
    Status(u16),

    #[error("email check returned an unreadable body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for ExternalServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExternalServiceError::Timeout
        } else if err.is_decode() {
            ExternalServiceError::Body(err.to_string())
        } else {
            ExternalServiceError::Transport(err)
        }
    }
}

#[async_trait]
pub trait EmailVerifier: Send + Sync {
    async fn verify(&self, email: &str) -> Result<Verdict, ExternalServiceError>;
}

/// Runs the check, turning any failure of the third party into a warning.
pub async fn check_or_assume(verifier: &dyn EmailVerifier, email: &str) -> Verdict {
    match verifier.verify(email).await {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!("Email validation API error, allowing registration: {}", e);
            Verdict::Unchecked
        }
    }
}

/// Quota and error replies come back as 200 without the verdict fields
#[derive(Debug, Deserialize)]
struct CheckResponse {
    deliverable: Option<bool>,
    is_smtp_valid: Option<bool>,
}

/// apilayer `email_verification/check` client
pub struct ApilayerVerifier {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl ApilayerVerifier {
    pub fn new(config: &EmailCheckConfig) -> Result<Self, ExternalServiceError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ExternalServiceError::Transport)?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
            .map(str::to_string);

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl EmailVerifier for ApilayerVerifier {
    async fn verify(&self, email: &str) -> Result<Verdict, ExternalServiceError> {
        let Some(api_key) = &self.api_key else {
            warn!("Email validation API key not set. Skipping deliverability check.");
            return Ok(Verdict::Unchecked);
        };

        let response = self
            .client
            .get(format!("{}/email_verification/check", self.base_url))
            .query(&[("email", email)])
            .header("apikey", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalServiceError::Status(status.as_u16()));
        }

        let body: CheckResponse = response.json().await?;
        debug!("Email validation response for {}: {:?}", email, body);

        match (body.deliverable, body.is_smtp_valid) {
            (Some(true), Some(true)) => Ok(Verdict::Deliverable),
            (Some(_), Some(_)) => Ok(Verdict::Undeliverable),
            _ => Err(ExternalServiceError::Body(
                "missing deliverable or is_smtp_valid".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn config(api_key: Option<&str>, base_url: String) -> EmailCheckConfig {
        EmailCheckConfig {
            api_key: api_key.map(str::to_string),
            base_url,
            timeout_secs: 2,
        }
    }

    #[tokio::test]
    async fn test_deliverable_needs_both_flags() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/email_verification/check")
            .match_query(Matcher::UrlEncoded(
                "email".into(),
                "cook@example.com".into(),
            ))
            .match_header("apikey", "key-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"deliverable": true, "is_smtp_valid": true, "score": 0.8}"#)
            .create_async()
            .await;

        let verifier = ApilayerVerifier::new(&config(Some("key-123"), server.url())).unwrap();
        let verdict = verifier.verify("cook@example.com").await.unwrap();

        assert_eq!(verdict, Verdict::Deliverable);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_smtp_invalid_is_undeliverable() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/email_verification/check")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"deliverable": true, "is_smtp_valid": false}"#)
            .create_async()
            .await;

        let verifier = ApilayerVerifier::new(&config(Some("key-123"), server.url())).unwrap();
        assert_eq!(
            verifier.verify("cook@example.com").await.unwrap(),
            Verdict::Undeliverable
        );
    }

    #[tokio::test]
    async fn test_server_error_is_downgraded() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/email_verification/check")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let verifier = ApilayerVerifier::new(&config(Some("key-123"), server.url())).unwrap();
        assert!(matches!(
            verifier.verify("cook@example.com").await,
            Err(ExternalServiceError::Status(500))
        ));
        assert_eq!(
            check_or_assume(&verifier, "cook@example.com").await,
            Verdict::Unchecked
        );
    }

    #[tokio::test]
    async fn test_garbage_body_is_an_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/email_verification/check")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let verifier = ApilayerVerifier::new(&config(Some("key-123"), server.url())).unwrap();
        assert!(verifier.verify("cook@example.com").await.is_err());
    }

    #[tokio::test]
    async fn test_reply_without_verdict_is_downgraded() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/email_verification/check")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success": false, "error": {"code": 104, "type": "usage_limit_reached"}}"#,
            )
            .create_async()
            .await;

        let verifier = ApilayerVerifier::new(&config(Some("key-123"), server.url())).unwrap();
        assert!(matches!(
            verifier.verify("cook@example.com").await,
            Err(ExternalServiceError::Body(_))
        ));

        let verdict = check_or_assume(&verifier, "cook@example.com").await;
        assert_eq!(verdict, Verdict::Unchecked);
        assert!(verdict.allows_registration());
    }

    #[tokio::test]
    async fn test_missing_or_placeholder_key_skips_the_call() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        for key in [None, Some(PLACEHOLDER_API_KEY), Some("  ")] {
            let verifier = ApilayerVerifier::new(&config(key, server.url())).unwrap();
            assert!(!verifier.is_configured());
            assert_eq!(
                verifier.verify("cook@example.com").await.unwrap(),
                Verdict::Unchecked
            );
        }

        mock.assert_async().await;
    }

    #[test]
    fn test_only_undeliverable_blocks() {
        assert!(Verdict::Deliverable.allows_registration());
        assert!(Verdict::Unchecked.allows_registration());
        assert!(!Verdict::Undeliverable.allows_registration());
    }
}
