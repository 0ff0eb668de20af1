//! API client for communicating with the Shukuma REST API.
//!
//! This module provides the `ApiClient` struct for the login and
//! registration calls and for authenticated exercise/progress reads.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::auth::UserData;

use super::{ApiError, Endpoints, ExerciseFilter};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// The backend runs on a host that sleeps when idle, so the first request
/// after a quiet period can be slow.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Profile payload as sent. Only an object is usable as a user record;
    /// anything else is kept but ignored by `user_record`.
    #[serde(default)]
    pub user: Option<Value>,
}

impl LoginResponse {
    /// The `user` payload if it is a JSON object
    pub fn user_record(&self) -> Option<UserData> {
        match &self.user {
            Some(Value::Object(user)) => Some(user.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// API client for the Shukuma backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoints: Endpoints,
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
            endpoints: Endpoints::new(base_url)?,
            token: None,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            endpoints: self.endpoints.clone(),
            token: Some(token),
        }
    }

    // ===== Authentication =====

    /// Exchange username and password for a bearer token
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let url = self.endpoints.login();
        debug!(url = %url, username = username, "Logging in");

        let response = self
            .client
            .post(url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .context("Unable to connect to server")?;

        let response = Self::check_response(response).await?;
        response.json().await.context("Failed to parse login response")
    }

    /// Create an account. Does not sign in.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse> {
        let url = self.endpoints.register();
        debug!(url = %url, username = username, "Registering account");

        let response = self
            .client
            .post(url)
            .json(&RegisterRequest {
                username,
                email,
                password,
            })
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .context("Unable to connect to server")?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .context("Failed to parse registration response")
    }

    // ===== Workouts =====

    pub async fn daily(&self) -> Result<Value> {
        self.get_json(self.endpoints.daily()).await
    }

    pub async fn exercises(&self, filter: &ExerciseFilter) -> Result<Value> {
        self.get_json(self.endpoints.exercises_for(filter)).await
    }

    pub async fn exercise(&self, id: &str) -> Result<Value> {
        self.get_json(self.endpoints.exercise(id)).await
    }

    pub async fn random_exercise(&self) -> Result<Value> {
        self.get_json(self.endpoints.random_exercise()).await
    }

    pub async fn progress(&self) -> Result<Value> {
        self.get_json(self.endpoints.progress()).await
    }

    /// GET `url` with the bearer token (if any) and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, authenticated = self.has_token(), "GET");

        let response = self
            .client
            .get(url.clone())
            .headers(self.auth_headers()?)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ApiError::NetworkError)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// Authorization header, only when a non-empty token is set
    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Token contains characters not allowed in a header")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
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
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.endpoints.base().as_str())
            .field("authenticated", &self.has_token())
            .finish()
    }
}
