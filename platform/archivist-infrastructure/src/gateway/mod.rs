use archivist_domain::errors::GatewayError;
use archivist_domain::repositories::{ApiGateway, AuthToken, BookmarksPage, Credentials, UserIdentity};
use archivist_domain::value_objects::{RateLimitInfo, Record};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A reference HTTP adapter for the Remote API Gateway capability (C1).
/// The concrete wire shape below is non-normative (§6): nothing in the
/// domain or application crates depends on it. Grounded on the retry/
/// instrumentation conventions of `platform/kairos-infrastructure/src/agents/mod.rs`'s
/// `AgentClient`.
pub struct HttpApiGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Deserialize)]
struct UserResponse {
    #[serde(rename = "userId")]
    user_id: String,
    username: String,
}

#[derive(Deserialize)]
struct RawRecord {
    id: String,
    url: Option<String>,
    text: Option<String>,
    #[serde(rename = "authorUsername")]
    author_username: Option<String>,
    #[serde(rename = "authorName")]
    author_name: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(rename = "likeCount")]
    like_count: Option<u64>,
    #[serde(rename = "retweetCount")]
    retweet_count: Option<u64>,
    #[serde(rename = "replyCount")]
    reply_count: Option<u64>,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Record {
            id: raw.id,
            url: raw.url,
            text: raw.text,
            author_username: raw.author_username,
            author_name: raw.author_name,
            created_at: raw.created_at,
            like_count: raw.like_count,
            retweet_count: raw.retweet_count,
            reply_count: raw.reply_count,
        }
    }
}

#[derive(Deserialize)]
struct BookmarksResponse {
    records: Vec<RawRecord>,
    #[serde(rename = "nextCursor")]
    next_cursor: Option<String>,
}

fn parse_rate_limit(headers: &reqwest::header::HeaderMap) -> Option<RateLimitInfo> {
    let limit = headers.get("x-ratelimit-limit")?.to_str().ok()?.parse().ok()?;
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse().ok()?;
    let reset_at: DateTime<Utc> = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse().ok()?;
    Some(RateLimitInfo { limit, remaining, reset_at })
}

fn classify_status(status: reqwest::StatusCode, body: &str) -> GatewayError {
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        GatewayError::Credential(format!("remote rejected credentials: {status}"))
    } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        GatewayError::TransientTransport(format!("remote returned {status}"))
    } else {
        GatewayError::Protocol(format!("unexpected status {status}: {body}"))
    }
}

#[async_trait]
impl ApiGateway for HttpApiGateway {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, GatewayError> {
        let response = self
            .client
            .post(format!("{}/auth", self.base_url))
            .json(&serde_json::json!({ "apiKey": credentials.0 }))
            .send()
            .await
            .map_err(|e| GatewayError::TransientTransport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let parsed: AuthResponse =
            response.json().await.map_err(|e| GatewayError::Protocol(e.to_string()))?;
        Ok(AuthToken(parsed.token))
    }

    async fn get_user(&self, token: &AuthToken) -> Result<UserIdentity, GatewayError> {
        let response = self
            .client
            .get(format!("{}/me", self.base_url))
            .bearer_auth(&token.0)
            .send()
            .await
            .map_err(|e| GatewayError::TransientTransport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let parsed: UserResponse =
            response.json().await.map_err(|e| GatewayError::Protocol(e.to_string()))?;
        Ok(UserIdentity { user_id: parsed.user_id, username: parsed.username })
    }

    async fn get_bookmarks(
        &self,
        token: &AuthToken,
        cursor: Option<&str>,
    ) -> Result<BookmarksPage, GatewayError> {
        let mut request = self.client.get(format!("{}/bookmarks", self.base_url)).bearer_auth(&token.0);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        let response = request.send().await.map_err(|e| GatewayError::TransientTransport(e.to_string()))?;
        let status = response.status();
        let rate_limit = parse_rate_limit(response.headers());
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }
        let parsed: BookmarksResponse =
            response.json().await.map_err(|e| GatewayError::Protocol(e.to_string()))?;
        Ok(BookmarksPage {
            records: parsed.records.into_iter().map(Record::from).collect(),
            next_cursor: parsed.next_cursor,
            rate_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn http_response(status: u16, reason: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{headers}Connection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn try_spawn_server(responses: Vec<String>) -> Option<String> {
        let listener = TcpListener::bind("127.0.0.1:0").ok()?;
        let addr = listener.local_addr().ok()?;
        thread::spawn(move || {
            for response in responses {
                let (mut stream, _) = listener.accept().expect("accept");
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                stream.write_all(response.as_bytes()).expect("write response");
            }
        });
        Some(format!("http://{addr}"))
    }

    #[tokio::test]
    async fn authenticate_parses_token_from_success_response() {
        let body = r#"{"token":"abc123"}"#;
        let Some(base_url) = try_spawn_server(vec![http_response(200, "OK", "", body)]) else {
            eprintln!("skipping: cannot bind local test server");
            return;
        };
        let gateway = HttpApiGateway::new(base_url);
        let token = gateway.authenticate(&Credentials("key".to_string())).await.unwrap();
        assert_eq!(token.0, "abc123");
    }

    #[tokio::test]
    async fn authenticate_maps_unauthorized_to_credential_error() {
        let Some(base_url) = try_spawn_server(vec![http_response(401, "Unauthorized", "", "")]) else {
            eprintln!("skipping: cannot bind local test server");
            return;
        };
        let gateway = HttpApiGateway::new(base_url);
        let err = gateway.authenticate(&Credentials("bad".to_string())).await.unwrap_err();
        assert!(matches!(err, GatewayError::Credential(_)));
    }

    #[tokio::test]
    async fn server_error_is_classified_as_transient() {
        let Some(base_url) = try_spawn_server(vec![http_response(503, "Service Unavailable", "", "")]) else {
            eprintln!("skipping: cannot bind local test server");
            return;
        };
        let gateway = HttpApiGateway::new(base_url);
        let err = gateway.authenticate(&Credentials("key".to_string())).await.unwrap_err();
        assert!(matches!(err, GatewayError::TransientTransport(_)));
    }

    #[tokio::test]
    async fn get_bookmarks_parses_records_and_rate_limit_headers() {
        let body = r#"{"records":[{"id":"1","url":null,"text":"hi","authorUsername":null,"authorName":null,"createdAt":"2024-01-15T10:00:00Z","likeCount":3,"retweetCount":null,"replyCount":null}],"nextCursor":"c2"}"#;
        let headers = "x-ratelimit-limit: 100\r\nx-ratelimit-remaining: 99\r\nx-ratelimit-reset: 2024-01-15T11:00:00Z\r\n";
        let Some(base_url) = try_spawn_server(vec![http_response(200, "OK", headers, body)]) else {
            eprintln!("skipping: cannot bind local test server");
            return;
        };
        let gateway = HttpApiGateway::new(base_url);
        let page = gateway.get_bookmarks(&AuthToken("tok".to_string()), None).await.unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, "1");
        assert_eq!(page.next_cursor, Some("c2".to_string()));
        let rate_limit = page.rate_limit.expect("rate limit headers parsed");
        assert_eq!(rate_limit.limit, 100);
        assert_eq!(rate_limit.remaining, 99);
    }
}
