use async_trait::async_trait;

use crate::errors::GatewayError;
use crate::value_objects::{RateLimitInfo, Record};

/// Opaque credentials; acquisition is out of scope (§1 Non-goals /
/// out-of-scope collaborators). The gateway is free to interpret this as
/// whatever the concrete wire protocol needs.
#[derive(Debug, Clone)]
pub struct Credentials(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
    pub username: String,
}

/// One page of bookmarks, already normalized to the domain `Record`
/// shape (the concrete wire shape is an injectable capability and is not
/// part of this contract).
#[derive(Debug, Clone)]
pub struct BookmarksPage {
    pub records: Vec<Record>,
    pub next_cursor: Option<String>,
    pub rate_limit: Option<RateLimitInfo>,
}

/// C1: the Remote API Gateway capability. The concrete wire shape is an
/// injectable capability, not part of the core contract (§6).
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthToken, GatewayError>;
    async fn get_user(&self, token: &AuthToken) -> Result<UserIdentity, GatewayError>;
    async fn get_bookmarks(
        &self,
        token: &AuthToken,
        cursor: Option<&str>,
    ) -> Result<BookmarksPage, GatewayError>;
}
