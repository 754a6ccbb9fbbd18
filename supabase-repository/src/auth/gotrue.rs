//! GoTrue admin client.
//!
//! Creates destination accounts through the `/auth/v1/admin/users`
//! endpoint using the service-role key. The "already registered"
//! duplicate is detected from the response and mapped to
//! [`RepositoryError::AlreadyRegistered`] so callers can treat it as an
//! idempotent skip.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::errors::RepositoryError;
use crate::interfaces::AuthAdmin;
use crate::types::{CreatedAuthUser, NewAuthUser};

/// Auth-admin provider backed by the GoTrue REST endpoint.
pub struct GoTrueAdmin {
    admin_users_url: String,
    /// Sent in the `apikey` header; the project anon key when one is
    /// configured, the service-role key otherwise.
    apikey: String,
    service_role_key: String,
    client: ReqwestClient,
}

impl GoTrueAdmin {
    /// Create a provider for the given project URL and service-role key.
    pub fn new(supabase_url: &str, service_role_key: &str) -> Result<Self, RepositoryError> {
        Url::parse(supabase_url)
            .map_err(|e| RepositoryError::connection(format!("invalid Supabase URL: {}", e)))?;

        if service_role_key.trim().is_empty() {
            return Err(RepositoryError::validation(
                "service role key must not be empty",
            ));
        }

        let admin_users_url = format!(
            "{}/auth/v1/admin/users",
            supabase_url.trim_end_matches('/')
        );

        info!(endpoint = %admin_users_url, "Created GoTrue admin client");
        Ok(GoTrueAdmin {
            admin_users_url,
            apikey: service_role_key.to_string(),
            service_role_key: service_role_key.to_string(),
            client: ReqwestClient::new(),
        })
    }

    /// Use the project anon key for the `apikey` header.
    pub fn with_apikey(mut self, apikey: &str) -> Self {
        self.apikey = apikey.to_string();
        self
    }
}

#[async_trait]
impl AuthAdmin for GoTrueAdmin {
    async fn create_user(&self, user: &NewAuthUser) -> Result<CreatedAuthUser, RepositoryError> {
        let body = json!({
            "email": user.email,
            "password": user.password,
            "email_confirm": user.email_confirm,
            "user_metadata": user.user_metadata,
        });

        debug!(email = %user.email, "Creating destination account");
        let response = self
            .client
            .post(&self.admin_users_url)
            .header("apikey", &self.apikey)
            .bearer_auth(&self.service_role_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body_text = response.text().await.unwrap_or_default();

        if (200..300).contains(&status) {
            let id = parse_created_user_id(&body_text)?;
            return Ok(CreatedAuthUser { id });
        }

        if is_already_registered(status, &body_text) {
            return Err(RepositoryError::AlreadyRegistered(user.email.clone()));
        }

        Err(RepositoryError::AuthAdmin {
            status,
            body: body_text,
        })
    }
}

/// Extract the new account's id from a creation response body.
fn parse_created_user_id(body: &str) -> Result<String, RepositoryError> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| RepositoryError::parse(format!("auth response is not JSON: {}", e)))?;

    parsed
        .get("id")
        .and_then(|id| id.as_str())
        .map(|id| id.to_string())
        .ok_or_else(|| RepositoryError::parse("auth response has no user id".to_string()))
}

/// Decide whether a creation failure means the email is already taken.
///
/// GoTrue reports this as 422 (newer releases carry an `email_exists`
/// error code) or 400 with an "already been registered" message.
fn is_already_registered(status: u16, body: &str) -> bool {
    if status != 400 && status != 422 {
        return false;
    }
    body.contains("email_exists")
        || body.contains("already been registered")
        || body.contains("already registered")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_created_user_id() {
        let body = r#"{"id":"9f1c7dd2-0000-4000-8000-000000000001","email":"a@x.com"}"#;
        assert_eq!(
            parse_created_user_id(body).unwrap(),
            "9f1c7dd2-0000-4000-8000-000000000001"
        );
    }

    #[test]
    fn rejects_bodies_without_an_id() {
        assert!(parse_created_user_id("{}").is_err());
        assert!(parse_created_user_id("not json").is_err());
    }

    #[test]
    fn detects_email_exists_code() {
        let body = r#"{"code":422,"error_code":"email_exists","msg":"Email address already exists"}"#;
        assert!(is_already_registered(422, body));
    }

    #[test]
    fn detects_legacy_already_registered_message() {
        let body = r#"{"code":400,"msg":"A user with this email address has already been registered"}"#;
        assert!(is_already_registered(400, body));
    }

    #[test]
    fn other_failures_are_not_duplicates() {
        assert!(!is_already_registered(500, "email_exists"));
        assert!(!is_already_registered(422, r#"{"msg":"password too weak"}"#));
    }

    #[test]
    fn rejects_malformed_urls() {
        assert!(GoTrueAdmin::new("not a url", "key").is_err());
        assert!(GoTrueAdmin::new("https://proj.supabase.co", " ").is_err());
    }
}
