//! Authentication gateway and route guarding.
//!
//! Protected dashboard pages sit behind an explicit `AuthGateway`:
//! credentials are validated through a pluggable seam, a successful login
//! yields a short-lived signed session token, and routing decisions are
//! returned as values instead of being signaled through control flow.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Auth errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
}

/// Login form input.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (account email)
    pub sub: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Creates a signed session token for `subject`, valid for `ttl_secs`.
pub fn issue_token(subject: &str, secret: &str, ttl_secs: u64) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(ttl_secs as i64);

    let claims = TokenClaims {
        sub: subject.to_string(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a session token and returns its claims.
pub fn verify_token(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: String,
    /// Signed, verifiable session token.
    pub token: String,
    /// Expiration timestamp
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }
}

/// The backend validation seam.
///
/// A production implementation checks the credentials against the identity
/// service; the static list below serves tests and local development.
pub trait CredentialValidator {
    fn validate(&self, credentials: &Credentials) -> Result<(), AuthError>;
}

/// Fixed email/password accounts.
#[derive(Debug, Default)]
pub struct StaticCredentialValidator {
    accounts: Vec<(String, String)>,
}

impl StaticCredentialValidator {
    pub fn with_account(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.accounts.push((email.into(), password.into()));
        self
    }
}

impl CredentialValidator for StaticCredentialValidator {
    fn validate(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let known = self
            .accounts
            .iter()
            .any(|(email, password)| *email == credentials.email && *password == credentials.password);
        if known {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Capability surface the routing layer sees.
pub trait AuthGateway {
    fn is_authenticated(&self) -> bool;
    fn login(&mut self, credentials: &Credentials) -> Result<Session, AuthError>;
    fn logout(&mut self);
    fn session(&self) -> Option<&Session>;
}

/// Gateway that turns validated credentials into token-backed sessions.
pub struct TokenAuthGateway<V> {
    validator: V,
    secret: String,
    ttl_secs: u64,
    session: Option<Session>,
}

impl<V> TokenAuthGateway<V> {
    pub fn new(validator: V, secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            validator,
            secret: secret.into(),
            ttl_secs,
            session: None,
        }
    }
}

impl<V: CredentialValidator> AuthGateway for TokenAuthGateway<V> {
    fn is_authenticated(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_expired())
    }

    fn login(&mut self, credentials: &Credentials) -> Result<Session, AuthError> {
        // A blank password is never a valid credential, whatever the
        // validator says.
        if credentials.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        self.validator.validate(credentials)?;

        let token = issue_token(&credentials.email, &self.secret, self.ttl_secs)?;
        let session = Session {
            email: credentials.email.clone(),
            token,
            expires_at: Utc::now().timestamp() + self.ttl_secs as i64,
        };
        self.session = Some(session.clone());
        Ok(session)
    }

    fn logout(&mut self) {
        self.session = None;
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }
}

/// Outcome of evaluating a navigation before rendering it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectTo(String),
}

/// Paths that require a live session.
const PROTECTED_PATHS: [&str; 3] = ["/dashboard", "/claims", "/admin"];

/// Decide what to do with a navigation.
///
/// The index path forwards to the dashboard or the login form; protected
/// paths redirect to the login form when no live session exists; everything
/// else renders as requested.
pub fn guard_route(gateway: &impl AuthGateway, path: &str) -> RouteDecision {
    if path == "/" {
        let target = if gateway.is_authenticated() {
            "/dashboard"
        } else {
            "/login"
        };
        return RouteDecision::RedirectTo(target.to_string());
    }

    if PROTECTED_PATHS.contains(&path) && !gateway.is_authenticated() {
        return RouteDecision::RedirectTo("/login".to_string());
    }

    RouteDecision::Allow
}
