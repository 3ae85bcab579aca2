use std::future::Future;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::state::AnswerResult;

/// Anything that can answer a question on behalf of the chat controller.
pub trait AnswerService {
    fn ask(&self, question: &str) -> impl Future<Output = Result<AnswerResult>> + Send;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub faq_count: u64,
    #[serde(default)]
    pub service: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// HTTP client for the FAQ answer service
#[derive(Clone)]
pub struct AnswerClient {
    client: Client,
    base_url: String,
}

impl AnswerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Build the form-encoded `POST /ask` request for a question.
    pub fn ask_request(&self, question: &str) -> Result<reqwest::Request> {
        let request = self
            .client
            .post(self.endpoint("ask"))
            .form(&[("question", question)])
            .build()?;
        Ok(request)
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("health");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Could not reach answer service at {}", self.base_url))?;

        let status = response.status();
        let health: HealthStatus = response
            .json()
            .await
            .with_context(|| format!("Health check returned an unreadable body (status {})", status))?;

        tracing::debug!(status = %health.status, faq_count = health.faq_count, "health check");
        Ok(health)
    }
}

impl AnswerService for AnswerClient {
    async fn ask(&self, question: &str) -> Result<AnswerResult> {
        let request = self.ask_request(question)?;
        tracing::debug!(url = %request.url(), "sending question");

        let response = self
            .client
            .execute(request)
            .await
            .with_context(|| format!("Could not reach answer service at {}", self.base_url))?;

        // The service reports its own failures in the body, so the status is
        // only logged.
        let status = response.status();
        if !status.is_success() {
            tracing::info!(%status, "answer service returned a non-success status");
        }

        let body = response.text().await?;
        AnswerResult::from_json(&body)
            .with_context(|| format!("Answer service returned a non-JSON body (status {})", status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the raw request text.
    async fn serve_once(status_line: &str, body: &str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower.strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_ask_request_is_form_encoded() {
        let client = AnswerClient::new("http://localhost:5000/");
        let request = client.ask_request("fees & charges? 100%").unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), "http://localhost:5000/ask");
        assert_eq!(
            request.headers()["content-type"],
            "application/x-www-form-urlencoded"
        );
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"question=fees+%26+charges%3F+100%25");
    }

    #[tokio::test]
    async fn test_ask_parses_reply() {
        let body = r#"{"response": "Use the app.", "similarity_score": 0.8, "related_questions": []}"#;
        let (url, server) = serve_once("200 OK", body).await;

        let result = AnswerClient::new(&url).ask("How do I do KYC?").await.unwrap();
        assert_eq!(result.response, "Use the app.");
        assert_eq!(result.similarity_score, Some(0.8));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /ask "));
        assert!(request.ends_with("question=How+do+I+do+KYC%3F"));
    }

    #[tokio::test]
    async fn test_ask_reads_error_body_of_failed_status() {
        let body = r#"{"error": "An error occurred processing your request.", "response": "Sorry", "related_questions": []}"#;
        let (url, _server) = serve_once("500 Internal Server Error", body).await;

        let result = AnswerClient::new(&url).ask("anything").await.unwrap();
        assert_eq!(
            result.service_error(),
            Some("An error occurred processing your request.")
        );
    }

    #[tokio::test]
    async fn test_ask_rejects_non_json_body() {
        let (url, _server) = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;
        assert!(AnswerClient::new(&url).ask("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_ask_fails_when_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = AnswerClient::new(&format!("http://{}", addr)).ask("hello").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_check() {
        let body = r#"{"status": "healthy", "faq_count": 42, "service": "Jupiter FAQ Bot"}"#;
        let (url, _server) = serve_once("200 OK", body).await;

        let health = AnswerClient::new(&url).health().await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.faq_count, 42);
    }
}
