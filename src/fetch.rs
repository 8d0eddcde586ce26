//! Platform API client: sign-in plus the two-stage profile query.

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::RawProfile;

const SIGNIN_PATH: &str = "/api/auth/signin";
const GRAPHQL_PATH: &str = "/api/graphql-engine/v1/graphql";
const IDENTITY_QUERY: &str = "{ user { id } }";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Unauthorized(_) => "unauthorized",
            FetchError::MalformedResponse(_) => "malformed-response",
            FetchError::Network(_) => "network",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::MalformedResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Internal numeric id the identity query resolves the token to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub i64);

/// The two dependent stages of a profile fetch.
pub trait ProfileSource {
    async fn resolve_identity(&self, token: &str) -> Result<UserId, FetchError>;
    async fn fetch_record(&self, token: &str, id: UserId) -> Result<RawProfile, FetchError>;
}

/// Resolves the identity, then fetches the record. A failed first stage
/// never reaches the second.
pub async fn fetch_profile<S: ProfileSource>(
    source: &S,
    token: &str,
) -> Result<RawProfile, FetchError> {
    let id = source.resolve_identity(token).await?;
    debug!(user_id = id.0, "resolved identity");
    let profile = source.fetch_record(token, id).await?;
    debug!(
        user_id = profile.id,
        xps = profile.xps.len(),
        transactions = profile.transactions.len(),
        "fetched profile record"
    );
    Ok(profile)
}

pub struct ApiClient {
    http: Client,
    signin_url: String,
    graphql_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            signin_url: format!("{}{SIGNIN_PATH}", config.api_base),
            graphql_url: format!("{}{GRAPHQL_PATH}", config.api_base),
        })
    }

    /// Exchanges Basic credentials for a bearer token.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .post(&self.signin_url)
            .basic_auth(username, Some(password))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body)?;
        parse_token(&body)
    }

    async fn query(&self, token: &str, query: &str) -> Result<Value, FetchError> {
        let response = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(token)
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        check_status(status, &body)?;
        serde_json::from_str(&body)
            .map_err(|err| FetchError::MalformedResponse(format!("invalid JSON: {err}")))
    }
}

impl ProfileSource for ApiClient {
    async fn resolve_identity(&self, token: &str) -> Result<UserId, FetchError> {
        let body = self.query(token, IDENTITY_QUERY).await?;
        parse_identity(&body)
    }

    async fn fetch_record(&self, token: &str, id: UserId) -> Result<RawProfile, FetchError> {
        let body = self.query(token, &profile_query(id)).await?;
        parse_profile(&body)
    }
}

pub fn profile_query(id: UserId) -> String {
    format!(
        "{{ user(where: {{ id: {{ _eq: {} }} }}) {{ \
         id login firstName lastName auditRatio \
         xps {{ path amount }} \
         audits {{ id }} \
         groups {{ id }} \
         transactions {{ createdAt amount type }} \
         }} }}",
        id.0
    )
}

fn check_status(status: StatusCode, body: &str) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }
    warn!(%status, "platform API request failed");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(FetchError::Unauthorized(format!("{status}: {}", body.trim())))
        }
        _ => Err(FetchError::MalformedResponse(format!("unexpected status {status}"))),
    }
}

/// Accepts the token as a JSON string or as raw text, and requires JWT shape.
pub fn parse_token(body: &str) -> Result<String, FetchError> {
    let token = serde_json::from_str::<String>(body)
        .unwrap_or_else(|_| body.trim().to_string());
    if token.split('.').count() != 3 {
        return Err(FetchError::Unauthorized("Invalid JWT token format".to_string()));
    }
    Ok(token)
}

fn first_user(body: &Value) -> Result<&Value, FetchError> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        let message = errors
            .iter()
            .filter_map(|error| error.get("message").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; ");
        let jwt_rejected = message.to_lowercase().contains("jwt")
            || errors.iter().any(|error| {
                error.pointer("/extensions/code").and_then(Value::as_str) == Some("invalid-jwt")
            });
        return Err(if jwt_rejected {
            FetchError::Unauthorized(message)
        } else {
            FetchError::MalformedResponse(message)
        });
    }

    body.pointer("/data/user/0")
        .ok_or_else(|| FetchError::MalformedResponse("response has no user record".to_string()))
}

pub fn parse_identity(body: &Value) -> Result<UserId, FetchError> {
    first_user(body)?
        .get("id")
        .and_then(Value::as_i64)
        .map(UserId)
        .ok_or_else(|| FetchError::MalformedResponse("user record has no numeric id".to_string()))
}

pub fn parse_profile(body: &Value) -> Result<RawProfile, FetchError> {
    RawProfile::deserialize(first_user(body)?)
        .map_err(|err| FetchError::MalformedResponse(format!("invalid user record: {err}")))
}

/// Reads a saved profile: either a full query response or a bare user record.
pub fn profile_from_json(value: &Value) -> Result<RawProfile, FetchError> {
    if value.get("data").is_some() || value.get("errors").is_some() {
        return parse_profile(value);
    }
    RawProfile::deserialize(value)
        .map_err(|err| FetchError::MalformedResponse(format!("invalid user record: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_must_have_three_segments() {
        assert_eq!(parse_token("\"aaa.bbb.ccc\"").unwrap(), "aaa.bbb.ccc");
        assert_eq!(parse_token("aaa.bbb.ccc\n").unwrap(), "aaa.bbb.ccc");

        let err = parse_token("\"not-a-jwt\"").unwrap_err();
        assert_eq!(err.reason(), "unauthorized");
    }

    #[test]
    fn identity_reads_first_user_id() {
        let body = json!({ "data": { "user": [{ "id": 1234 }] } });
        assert_eq!(parse_identity(&body).unwrap(), UserId(1234));
    }

    #[test]
    fn missing_user_is_a_malformed_response() {
        let body = json!({ "data": { "user": [] } });
        assert_eq!(parse_identity(&body).unwrap_err().reason(), "malformed-response");
        assert_eq!(parse_profile(&json!({})).unwrap_err().reason(), "malformed-response");
    }

    #[test]
    fn jwt_errors_are_unauthorized() {
        let body = json!({
            "errors": [{
                "message": "Could not verify JWT: JWTExpired",
                "extensions": { "code": "invalid-jwt" }
            }]
        });
        assert_eq!(parse_identity(&body).unwrap_err().reason(), "unauthorized");

        let other = json!({ "errors": [{ "message": "field 'foo' not found" }] });
        assert_eq!(parse_identity(&other).unwrap_err().reason(), "malformed-response");
    }

    #[test]
    fn profile_parses_full_record() {
        let body = json!({ "data": { "user": [{
            "id": 7,
            "login": "jlee",
            "auditRatio": 0.87,
            "xps": [{ "path": "/campus/module/go-reloaded", "amount": 9000 }],
            "audits": [{ "id": 1 }],
            "groups": [{ "id": 2 }, { "id": 3 }],
            "transactions": [{ "createdAt": "2024-01-01T10:00:00Z", "amount": 9000, "type": "xp" }]
        }] } });

        let profile = parse_profile(&body).unwrap();
        assert_eq!(profile.id, 7);
        assert_eq!(profile.login, "jlee");
        assert_eq!(profile.groups.len(), 2);
        assert_eq!(profile.transactions.len(), 1);
    }

    #[test]
    fn saved_profiles_accept_both_shapes() {
        let bare = json!({ "id": 3, "login": "kpatel", "xps": [] });
        assert_eq!(profile_from_json(&bare).unwrap().login, "kpatel");

        let wrapped = json!({ "data": { "user": [{ "id": 3, "login": "kpatel" }] } });
        assert_eq!(profile_from_json(&wrapped).unwrap().id, 3);

        let not_an_object = json!("kpatel");
        assert!(profile_from_json(&not_an_object).is_err());
    }

    #[test]
    fn status_codes_map_to_reasons() {
        assert!(check_status(StatusCode::OK, "").is_ok());
        assert_eq!(
            check_status(StatusCode::UNAUTHORIZED, "bad").unwrap_err().reason(),
            "unauthorized"
        );
        assert_eq!(
            check_status(StatusCode::BAD_GATEWAY, "").unwrap_err().reason(),
            "malformed-response"
        );
    }

    #[test]
    fn profile_query_embeds_the_user_id() {
        let query = profile_query(UserId(99));
        assert!(query.contains("_eq: 99"));
        assert!(query.contains("transactions { createdAt amount type }"));
    }
}
