use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::GoogleConfig;

/// Normalized identity-provider profile decoded from a verified ID token.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub aud: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> anyhow::Result<GoogleProfile>;
}

/// Validates ID tokens against Google's tokeninfo endpoint and an accepted
/// audience list supplied through configuration.
pub struct GoogleVerifier {
    client: reqwest::Client,
    tokeninfo_url: String,
    audiences: Vec<String>,
}

impl GoogleVerifier {
    pub fn new(config: &GoogleConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            tokeninfo_url: config.tokeninfo_url.clone(),
            audiences: config.client_ids.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, id_token: &str) -> anyhow::Result<GoogleProfile> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("token rejected by identity provider: {}", response.status());
        }
        let profile: GoogleProfile = response.json().await?;
        if profile.sub.is_empty() {
            anyhow::bail!("TOKEN IS NO LONGER AVAILABLE");
        }
        if !self.audiences.iter().any(|a| a == &profile.aud) {
            anyhow::bail!("audience {} is not an accepted client", profile.aud);
        }
        debug!(sub = %profile.sub, "id token verified");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn verifier(server: &MockServer, audiences: Vec<String>) -> GoogleVerifier {
        GoogleVerifier::new(&GoogleConfig {
            client_ids: audiences,
            tokeninfo_url: format!("{}/tokeninfo", server.uri()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_allow_listed_audience() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .and(query_param("id_token", "good-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "110169484474386276334",
                "aud": "client-a.apps.googleusercontent.com",
                "email": "alice@example.com",
                "name": "Alice Example",
                "picture": "https://lh3.example/photo.jpg",
            })))
            .mount(&server)
            .await;

        let verifier = verifier(&server, vec!["client-a.apps.googleusercontent.com".into()]);
        let profile = verifier.verify("good-token").await.unwrap();
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
        assert_eq!(profile.name.as_deref(), Some("Alice Example"));
    }

    #[tokio::test]
    async fn rejects_unknown_audience() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "110169484474386276334",
                "aud": "stranger.apps.googleusercontent.com",
                "email": "alice@example.com",
            })))
            .mount(&server)
            .await;

        let verifier = verifier(&server, vec!["client-a.apps.googleusercontent.com".into()]);
        let err = verifier.verify("good-token").await.unwrap_err();
        assert!(err.to_string().contains("not an accepted client"));
    }

    #[tokio::test]
    async fn surfaces_provider_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let verifier = verifier(&server, vec!["client-a.apps.googleusercontent.com".into()]);
        let err = verifier.verify("expired-token").await.unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }

    #[tokio::test]
    async fn rejects_payload_without_subject() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tokeninfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sub": "",
                "aud": "client-a.apps.googleusercontent.com",
            })))
            .mount(&server)
            .await;

        let verifier = verifier(&server, vec!["client-a.apps.googleusercontent.com".into()]);
        assert!(verifier.verify("odd-token").await.is_err());
    }
}
