//! API client for communicating with the gym REST API.
//!
//! This module provides the `ApiClient` struct for exchanging credentials,
//! updating the account, and fetching and logging exercises.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    AuthenticatedSession, Exercise, HistoryByDay, ProfileUpdate, SignUpRequest, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user: Option<User>,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct HistoryRequest {
    exercise_id: i64,
}

/// API client for the gym API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token sent with every subsequent request
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Stop sending a bearer token
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    /// Endpoint URL with each segment percent-encoded, so a group name
    /// like "peito/superior" stays a single path segment
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid API base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API base URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = self.url(segments)?;
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .headers(self.auth_headers()?);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .with_context(|| format!("Failed to send {} request to {}", method, url))?;

        debug!(method = %method, path = url.path(), status = %response.status(), "API response");
        Self::check_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let response = self.send::<()>(Method::GET, segments, None).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from /{}", segments.join("/")))
    }

    // ===== Account =====

    /// Exchange credentials for a user record and bearer token.
    /// Fails with `ApiError::InvalidResponse` unless both are present.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthenticatedSession> {
        let body = SignInRequest { email, password };
        let response = self.send(Method::POST, &["sessions"], Some(&body)).await?;

        let parsed: SessionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .context("Failed to parse session response")?;

        match (parsed.user, parsed.token) {
            (Some(user), Some(token)) if !token.is_empty() => {
                Ok(AuthenticatedSession { user, token })
            }
            _ => Err(ApiError::InvalidResponse(
                "session response is missing the user or the token".to_string(),
            )
            .into()),
        }
    }

    /// Register a new account
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<()> {
        self.send(Method::POST, &["users"], Some(request)).await?;
        Ok(())
    }

    /// Update the authenticated user's name and, optionally, password
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<()> {
        self.send(Method::PUT, &["users"], Some(update)).await?;
        Ok(())
    }

    // ===== Exercises =====

    /// Fetch the muscle group names
    pub async fn fetch_groups(&self) -> Result<Vec<String>> {
        self.get(&["groups"]).await
    }

    /// Fetch all exercises for a muscle group
    pub async fn fetch_exercises_by_group(&self, group: &str) -> Result<Vec<Exercise>> {
        self.get(&["exercises", "bygroup", group]).await
    }

    /// Fetch a single exercise
    pub async fn fetch_exercise(&self, exercise_id: i64) -> Result<Exercise> {
        let id = exercise_id.to_string();
        self.get(&["exercises", &id]).await
    }

    // ===== History =====

    /// Mark an exercise as done, adding it to the user's history
    pub async fn register_exercise(&self, exercise_id: i64) -> Result<()> {
        let body = HistoryRequest { exercise_id };
        self.send(Method::POST, &["history"], Some(&body)).await?;
        Ok(())
    }

    /// Fetch the user's logged exercises, grouped by day
    pub async fn fetch_history(&self) -> Result<Vec<HistoryByDay>> {
        self.get(&["history"]).await
    }

    // ===== Media =====

    pub fn exercise_demo_url(&self, exercise: &Exercise) -> String {
        format!("{}/exercise/demo/{}", self.base_url, exercise.demo)
    }

    pub fn exercise_thumb_url(&self, exercise: &Exercise) -> String {
        format!("{}/exercise/thumb/{}", self.base_url, exercise.thumb)
    }

    pub fn avatar_url(&self, user: &User) -> Option<String> {
        user.avatar
            .as_deref()
            .filter(|a| !a.is_empty())
            .map(|a| format!("{}/avatar/{}", self.base_url, a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorClass;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_exercise() -> serde_json::Value {
        serde_json::json!({
            "id": 5, "name": "Rosca direta", "series": 3, "repetitions": 12,
            "group": "bíceps", "demo": "rosca_direta.gif", "thumb": "rosca_direta.png"
        })
    }

    #[tokio::test]
    async fn test_sign_in_posts_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sessions"))
            .and(body_json(serde_json::json!({ "email": "a@b.com", "password": "secret1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user": { "id": "1", "name": "A" },
                "token": "tok",
                "refresh_token": "ignored"
            })))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(&mock_server.uri()).expect("client");
        let session = client.sign_in("a@b.com", "secret1").await.expect("sign in");
        assert_eq!(session.token, "tok");
        assert_eq!(session.user.id, "1");
        assert_eq!(session.user.name, "A");
    }

    #[tokio::test]
    async fn test_sign_in_rejects_response_without_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user": { "id": 1, "name": "A" }
            })))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(&mock_server.uri()).expect("client");
        let err = client.sign_in("a@b.com", "secret1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidResponse(_))
        ));
        assert_eq!(ErrorClass::of(&err), ErrorClass::Unclassified);
    }

    #[tokio::test]
    async fn test_sign_in_surfaces_server_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "status": "error",
                "message": "E-mail e/ou senha incorreta."
            })))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(&mock_server.uri()).expect("client");
        let err = client.sign_in("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(
            ErrorClass::of(&err),
            ErrorClass::Domain("E-mail e/ou senha incorreta.".to_string())
        );
    }

    #[tokio::test]
    async fn test_network_failure_is_unclassified() {
        // Reserve a free port, then release it so connections are refused
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr").port()
        };
        let uri = format!("http://127.0.0.1:{}", port);

        let client = ApiClient::new(&uri).expect("client");
        let err = client.fetch_groups().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::NetworkError(_))
        ));
        assert_eq!(ErrorClass::of(&err), ErrorClass::Unclassified);
    }

    #[tokio::test]
    async fn test_token_is_sent_as_bearer_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/groups"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!(["costas", "ombro", "bíceps", "tríceps"])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut client = ApiClient::new(&mock_server.uri()).expect("client");
        client.set_token("tok".to_string());
        let groups = client.fetch_groups().await.expect("groups");
        assert_eq!(groups, vec!["costas", "ombro", "bíceps", "tríceps"]);
    }

    #[tokio::test]
    async fn test_cleared_token_sends_no_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/history"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/history"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "status": "error", "message": "JWT token não informado."
            })))
            .mount(&mock_server)
            .await;

        let mut client = ApiClient::new(&mock_server.uri()).expect("client");
        client.set_token("tok".to_string());
        assert!(client.fetch_history().await.expect("history").is_empty());

        client.clear_token();
        let err = client.fetch_history().await.unwrap_err();
        assert_eq!(user_message_of(&err), "JWT token não informado.");
    }

    fn user_message_of(err: &anyhow::Error) -> String {
        crate::api::user_message(err, "fallback")
    }

    #[tokio::test]
    async fn test_with_token_leaves_source_client_untouched() {
        let client = ApiClient::new("http://localhost:3333/").expect("client");
        let authed = client.with_token("abc".to_string());
        assert_eq!(authed.token(), Some("abc"));
        assert_eq!(client.token(), None);
        assert_eq!(authed.base_url(), "http://localhost:3333");
    }

    #[tokio::test]
    async fn test_fetch_exercises_and_detail() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/exercises/bygroup/costas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 1, "name": "Puxada frontal", "series": 3, "repetitions": 12,
                  "group": "costas", "demo": "a.gif", "thumb": "a.png" }
            ])))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/exercises/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_exercise()))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(&mock_server.uri()).expect("client");
        let exercises = client.fetch_exercises_by_group("costas").await.expect("exercises");
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].name, "Puxada frontal");

        let exercise = client.fetch_exercise(5).await.expect("exercise");
        assert_eq!(exercise.repetitions, 12);
        assert_eq!(
            client.exercise_demo_url(&exercise),
            format!("{}/exercise/demo/rosca_direta.gif", mock_server.uri())
        );
        assert_eq!(
            client.exercise_thumb_url(&exercise),
            format!("{}/exercise/thumb/rosca_direta.png", mock_server.uri())
        );
    }

    #[tokio::test]
    async fn test_group_name_is_a_single_path_segment() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/exercises/bygroup/peito%2Fsuperior%3Fx%23y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(&mock_server.uri()).expect("client");
        let exercises = client
            .fetch_exercises_by_group("peito/superior?x#y")
            .await
            .expect("exercises");
        assert!(exercises.is_empty());
    }

    #[test]
    fn test_url_keeps_base_path_prefix() {
        let client = ApiClient::new("http://localhost:3333/api/").expect("client");
        let url = client.url(&["exercises", "bygroup", "costas"]).expect("url");
        assert_eq!(url.as_str(), "http://localhost:3333/api/exercises/bygroup/costas");
    }

    #[tokio::test]
    async fn test_register_exercise_and_update_profile_bodies() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/history"))
            .and(body_json(serde_json::json!({ "exercise_id": 5 })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/users"))
            .and(body_json(serde_json::json!({ "name": "Novo Nome" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = ApiClient::new(&mock_server.uri()).expect("client");
        client.register_exercise(5).await.expect("register");
        client
            .update_profile(&ProfileUpdate::rename("Novo Nome"))
            .await
            .expect("update");
    }

    #[test]
    fn test_avatar_url() {
        let client = ApiClient::new("http://localhost:3333").expect("client");
        let mut user = User {
            id: "1".to_string(),
            name: "A".to_string(),
            email: "a@b.com".to_string(),
            avatar: None,
        };
        assert_eq!(client.avatar_url(&user), None);
        user.avatar = Some("me.png".to_string());
        assert_eq!(
            client.avatar_url(&user).as_deref(),
            Some("http://localhost:3333/avatar/me.png")
        );
    }
}
