use serde::Deserialize;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};

#[derive(Debug, Deserialize)]
pub struct UserLevel {
    pub user_id: Uuid,
    pub role_name: String,
    pub role_level: i32,
    pub account_locked: bool,
}

/// Thin client for the access service's internal level endpoint. Level
/// gating fails closed: if access cannot be reached we refuse the action
/// rather than guess the target's rank.
#[derive(Clone)]
pub struct AccessClient {
    http: reqwest::Client,
    base_url: String,
}

impl AccessClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn user_level(&self, user_id: Uuid) -> AppResult<UserLevel> {
        let url = format!("{}/internal/users/{}/level", self.base_url, user_id);

        let response = self.http.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "access service unreachable for level lookup");
            AppError::new(ErrorCode::ServiceUnavailable, "access service unavailable")
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::new(ErrorCode::UserNotFound, "user not found"));
        }
        if !response.status().is_success() {
            return Err(AppError::new(ErrorCode::ServiceUnavailable, "access service error"));
        }

        response.json::<UserLevel>().await.map_err(|e| {
            tracing::error!(error = %e, "invalid level lookup response");
            AppError::new(ErrorCode::ServiceUnavailable, "access service error")
        })
    }
}
