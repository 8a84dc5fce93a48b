use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt, Snafu};
use std::time::Duration;

pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRequest {
    pub text: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageReply {
    pub response: String,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BackendError {
    #[snafu(display("failed to reach {endpoint} on `{stage}`: {source}"))]
    SendRequest {
        stage: &'static str,
        endpoint: String,
        source: reqwest::Error,
    },
    #[snafu(display("failed to read reply body on `{stage}`: {source}"))]
    ReadBody {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("backend answered {status} on `{stage}`"))]
    UnexpectedStatus {
        stage: &'static str,
        status: reqwest::StatusCode,
    },
    #[snafu(display("reply is not a {{\"response\": string}} object on `{stage}`: {source}"))]
    DecodeReply {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("no reply within {after:?}"))]
    TimedOut { after: Duration },
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_message(&self, request: &MessageRequest) -> Result<String, BackendError>;
}

pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send_message(&self, request: &MessageRequest) -> Result<String, BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .context(SendRequestSnafu {
                stage: "post-message",
                endpoint: self.endpoint.clone(),
            })?;

        let status = response.status();
        ensure!(
            status.is_success(),
            UnexpectedStatusSnafu {
                stage: "check-status",
                status,
            }
        );

        let body = response.bytes().await.context(ReadBodySnafu {
            stage: "read-reply-body",
        })?;
        decode_reply(&body)
    }
}

pub fn decode_reply(body: &[u8]) -> Result<String, BackendError> {
    let reply: MessageReply = serde_json::from_slice(body).context(DecodeReplySnafu {
        stage: "decode-reply",
    })?;
    Ok(reply.response)
}

pub async fn send_with_timeout(
    backend: &dyn ChatBackend,
    request: &MessageRequest,
    limit: Duration,
) -> Result<String, BackendError> {
    match tokio::time::timeout(limit, backend.send_message(request)).await {
        Ok(result) => result,
        Err(_) => TimedOutSnafu { after: limit }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_reply, send_with_timeout, BackendError, ChatBackend, HttpBackend, MessageRequest,
    };
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn fever_request() -> MessageRequest {
        MessageRequest {
            text: "What to do for fever?".to_string(),
            language: "english".to_string(),
        }
    }

    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("listener should have address");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("client should connect");
            let mut raw = Vec::new();
            let mut buffer = [0u8; 4096];
            loop {
                let read = socket.read(&mut buffer).await.expect("request should read");
                if read == 0 {
                    break;
                }
                raw.extend_from_slice(&buffer[..read]);
                if request_complete(&raw) {
                    break;
                }
            }
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("response should write");
            String::from_utf8_lossy(&raw).to_string()
        });
        (format!("http://{address}/api/message"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + length
    }

    #[test]
    fn decode_reply_extracts_response_field() {
        let reply = decode_reply(br#"{"response": "Rest and hydrate."}"#).expect("valid reply");
        assert_eq!(reply, "Rest and hydrate.");
    }

    #[test]
    fn decode_reply_rejects_missing_field() {
        let error = decode_reply(br#"{"answer": "Rest"}"#).expect_err("missing field");
        assert!(matches!(error, BackendError::DecodeReply { .. }));
    }

    #[test]
    fn decode_reply_rejects_non_json_body() {
        let error = decode_reply(b"<html>oops</html>").expect_err("html body");
        assert!(matches!(error, BackendError::DecodeReply { .. }));
    }

    #[test]
    fn request_serializes_text_and_language() {
        let value = serde_json::to_value(fever_request()).expect("request should serialize");
        assert_eq!(
            value,
            serde_json::json!({"text": "What to do for fever?", "language": "english"})
        );
    }

    #[tokio::test]
    async fn http_backend_posts_json_and_reads_reply() {
        let (endpoint, server) =
            one_shot_server("HTTP/1.1 200 OK", r#"{"response": "Rest and hydrate."}"#).await;
        let backend = HttpBackend::new(endpoint);

        let reply = backend
            .send_message(&fever_request())
            .await
            .expect("backend should reply");
        assert_eq!(reply, "Rest and hydrate.");

        let raw_request = server.await.expect("server task should finish");
        assert!(raw_request.starts_with("POST /api/message"));
        assert!(raw_request.contains(r#""text":"What to do for fever?""#));
        assert!(raw_request.contains(r#""language":"english""#));
    }

    #[tokio::test]
    async fn http_backend_rejects_error_status() {
        let (endpoint, server) = one_shot_server(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"response": "boom"}"#,
        )
        .await;
        let backend = HttpBackend::new(endpoint);

        let error = backend
            .send_message(&fever_request())
            .await
            .expect_err("500 should fail");
        assert!(matches!(error, BackendError::UnexpectedStatus { .. }));
        let _ = server.await;
    }

    #[tokio::test]
    async fn http_backend_reports_unreachable_endpoint() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("listener should bind");
        let address = listener.local_addr().expect("listener should have address");
        drop(listener);

        let backend = HttpBackend::new(format!("http://{address}/api/message"));
        let error = backend
            .send_message(&fever_request())
            .await
            .expect_err("closed port should fail");
        assert!(matches!(error, BackendError::SendRequest { .. }));
    }

    struct StalledBackend;

    #[async_trait]
    impl ChatBackend for StalledBackend {
        async fn send_message(&self, _request: &MessageRequest) -> Result<String, BackendError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn send_with_timeout_bounds_a_stalled_backend() {
        let error = send_with_timeout(&StalledBackend, &fever_request(), Duration::from_secs(15))
            .await
            .expect_err("stalled backend should time out");
        assert!(matches!(error, BackendError::TimedOut { after } if after == Duration::from_secs(15)));
    }
}
