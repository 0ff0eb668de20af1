use anyhow::Result;
use serde_json::Value;
use tracing::{info, warn};

use super::{CredentialStore, LoginForm, RegistrationForm, StorageWriteError, UserData};
use crate::api::{ApiClient, ApiError, LoginResponse};

/// Sign-in lifecycle on top of the API client and the credential store.
///
/// The store only persists; this type decides when the token and user
/// record are created (login) and destroyed (logout).
#[derive(Debug, Clone)]
pub struct Session {
    api: ApiClient,
    store: CredentialStore,
}

impl Session {
    pub fn new(api: ApiClient, store: CredentialStore) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Validate the form, log in, and persist the token and user record.
    ///
    /// Returns the stored user record. Validation, network, and storage
    /// failures are all returned; the typed errors (`ValidationError`,
    /// `ApiError`, `StorageWriteError`) can be recovered with `downcast_ref`.
    pub async fn login(&self, form: &LoginForm) -> Result<UserData> {
        form.validate()?;

        let response = self.api.login(&form.username, &form.password).await?;
        let (token, user) = accept_login(response, &form.username)?;

        self.store.store_token(&token).await?;
        self.store.store_user_data(&user).await?;

        info!(username = %form.username, "Logged in");
        Ok(user)
    }

    /// Validate the form and create the account. Returns the server's
    /// message. The user still has to log in afterwards.
    pub async fn register(&self, form: &RegistrationForm) -> Result<String> {
        form.validate()?;

        let response = self
            .api
            .register(&form.username, &form.email, &form.password)
            .await?;

        info!(username = %form.username, "Registered account");
        Ok(response
            .message
            .unwrap_or_else(|| "Registration successful".to_string()))
    }

    /// The cached user record if signed in, `None` if signed out.
    ///
    /// A signed-in user whose record is missing or unreadable gets an empty
    /// record rather than being signed out.
    pub async fn resume(&self) -> Option<UserData> {
        if !self.store.is_authenticated().await {
            return None;
        }
        Some(self.store.get_user_data().await.unwrap_or_default())
    }

    /// An API client carrying the stored token, or `None` when signed out
    pub async fn authorized_api(&self) -> Option<ApiClient> {
        match self.store.get_token().await {
            Some(token) if !token.is_empty() => Some(self.api.with_token(token)),
            _ => None,
        }
    }

    /// Remove the token and the user record
    pub async fn logout(&self) -> Result<(), StorageWriteError> {
        match self.store.clear_auth_data().await {
            Ok(()) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Logout left auth data behind");
                Err(e)
            }
        }
    }
}

/// Split a login response into the token to store and the user record.
///
/// An empty token would be stored but never count as signed in, so it is
/// rejected here. A missing or non-object `user` falls back to a record
/// holding just the username.
fn accept_login(response: LoginResponse, username: &str) -> Result<(String, UserData), ApiError> {
    if response.token.is_empty() {
        return Err(ApiError::InvalidResponse(
            "login succeeded but the server sent an empty token".to_string(),
        ));
    }

    let user = response.user_record().unwrap_or_else(|| {
        let mut user = UserData::new();
        user.insert("username".to_string(), Value::String(username.to_string()));
        user
    });
    Ok((response.token, user))
}
