use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::instrument;

/// Outbound notification delivery. Failures surface to the caller but are
/// never rolled back into prior writes.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, content: &str) -> anyhow::Result<()>;
}

const MAIL_AUTH_HEADER: &str = "X-Postmark-Server-Token";
const MESSAGE_STREAM: &str = "outbound";

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    message_stream: &'a str,
}

/// Postmark-style HTTP mail API client.
pub struct HttpMailer {
    client: Client,
    base_url: String,
    sender: String,
    token: String,
}

impl HttpMailer {
    pub fn new(base_url: String, sender: String, token: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url,
            sender,
            token,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    #[instrument(skip(self, content))]
    async fn send(&self, recipient: &str, subject: &str, content: &str) -> anyhow::Result<()> {
        let url = format!("{}/email", self.base_url.trim_end_matches('/'));
        let body = SendEmailRequest {
            from: &self.sender,
            to: recipient,
            subject,
            html_body: content,
            text_body: content,
            message_stream: MESSAGE_STREAM,
        };
        self.client
            .post(url)
            .header(MAIL_AUTH_HEADER, &self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Swallows everything; used by tests and local runs without mail credentials.
#[derive(Debug, Clone, Default)]
pub struct MockMailer;

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, _recipient: &str, _subject: &str, _content: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_postmark_shaped_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .and(header(MAIL_AUTH_HEADER, "server-token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = HttpMailer::new(
            server.uri(),
            "noreply@tradehub.app".into(),
            "server-token".into(),
        )
        .unwrap();
        mailer
            .send("user@example.com", "Subject", "Body")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn non_2xx_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/email"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mailer =
            HttpMailer::new(server.uri(), "noreply@tradehub.app".into(), "t".into()).unwrap();
        let err = mailer.send("user@example.com", "S", "B").await;
        assert!(err.is_err());
    }
}
