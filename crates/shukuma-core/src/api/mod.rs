//! REST API client module for the Shukuma backend.
//!
//! This module provides the `Endpoints` table and the `ApiClient` used by
//! the login/registration flows and the authenticated workout reads.
//!
//! Authenticated requests carry the stored token as a bearer credential.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ApiClient, LoginResponse, RegisterResponse};
pub use endpoints::{Endpoints, ExerciseFilter, DEFAULT_API_BASE_URL};
pub use error::ApiError;
