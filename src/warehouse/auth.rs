use crate::warehouse::error::LoadError;
use log::debug;
use tokio::process::Command;

pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Where BigQuery bearer tokens come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// A fixed token, e.g. from the environment.
    Static(String),
    /// `gcloud auth print-access-token`, run for every load job and again when a
    /// job poll is rejected.
    Gcloud,
}

impl TokenSource {
    /// Prefers an explicit token, then `GOOGLE_OAUTH_ACCESS_TOKEN`, then `gcloud`.
    pub fn resolve(explicit: Option<String>) -> Self {
        let non_blank = |t: &String| !t.trim().is_empty();
        explicit
            .filter(non_blank)
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok().filter(non_blank))
            .map(TokenSource::Static)
            .unwrap_or(TokenSource::Gcloud)
    }

    pub async fn access_token(&self) -> Result<String, LoadError> {
        match self {
            TokenSource::Static(token) => Ok(token.trim().to_string()),
            TokenSource::Gcloud => {
                debug!("Requesting access token from gcloud");
                let output = Command::new("gcloud")
                    .args(["auth", "print-access-token"])
                    .output()
                    .await
                    .map_err(|e| LoadError::AccessToken(format!("could not run gcloud: {e}")))?;
                if !output.status.success() {
                    return Err(LoadError::AccessToken(
                        String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    ));
                }
                let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if token.is_empty() {
                    return Err(LoadError::AccessToken("gcloud returned no token".to_string()));
                }
                Ok(token)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_token_wins() {
        let source = TokenSource::resolve(Some(" abc \n".to_string()));
        assert_eq!(source, TokenSource::Static(" abc \n".to_string()));
        assert_eq!(source.access_token().await.unwrap(), "abc");
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let source = TokenSource::resolve(Some("   ".to_string()));
        assert_ne!(source, TokenSource::Static("   ".to_string()));
    }
}
