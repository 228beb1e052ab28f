/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Sign-in URL construction, token-endpoint request forms and token response
//! parsing for the authorization-code and refresh-token grants.
//!
//! The HTTP round trip itself lives in [`crate::provider::casdoor`]; this
//! module is pure so every encoding and parsing rule is unit tested.

use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::config::ProviderConfig;
use crate::error::AuthError;

/// Tokens issued by the token endpoint.
///
/// Only ever constructed complete: a response without an access token or a
/// refresh token is rejected by [`parse_token_response`].
#[derive(Clone, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// OIDC ID token, when the provider returned one.
    pub id_token: Option<String>,
    /// Access token lifetime in seconds, as reported by the provider.
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl TokenPair {
    /// The JWT that carries the user's identity: the ID token when present,
    /// otherwise the access token (Casdoor issues access tokens as JWTs
    /// carrying the full user record).
    pub fn identity_token(&self) -> &str {
        match self.id_token.as_deref() {
            Some(id_token) if !id_token.is_empty() => id_token,
            _ => &self.access_token,
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Raw response from the OAuth token endpoint. Error responses come back as
/// `{ "error": ..., "error_description": ... }`, sometimes with HTTP 200.
#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Build the provider sign-in URL handed to the browser.
///
/// `state` carries the application name, which the provider echoes back on
/// the callback.
pub fn build_signin_url(config: &ProviderConfig) -> Result<String, url::ParseError> {
    let mut url = Url::parse(&config.authorize_url())?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &config.redirect_url)
        .append_pair("scope", &config.scope)
        .append_pair("state", &config.application_name);
    Ok(url.to_string())
}

/// Reject empty callback parameters before any network call is made.
pub fn validate_callback(code: &str, state: &str) -> Result<(), AuthError> {
    if code.trim().is_empty() {
        return Err(AuthError::InvalidParameter("code must not be empty".into()));
    }
    if state.trim().is_empty() {
        return Err(AuthError::InvalidParameter("state must not be empty".into()));
    }
    Ok(())
}

/// Form body for the `authorization_code` grant.
pub fn authorization_code_form(config: &ProviderConfig, code: &str) -> Vec<(&'static str, String)> {
    vec![
        ("grant_type", "authorization_code".to_string()),
        ("client_id", config.client_id.clone()),
        ("client_secret", config.client_secret.clone()),
        ("redirect_uri", config.redirect_url.clone()),
        ("code", code.to_string()),
    ]
}

/// Form body for the `refresh_token` grant.
pub fn refresh_token_form(
    config: &ProviderConfig,
    refresh_token: &str,
    scope: &str,
) -> Vec<(&'static str, String)> {
    vec![
        ("grant_type", "refresh_token".to_string()),
        ("client_id", config.client_id.clone()),
        ("client_secret", config.client_secret.clone()),
        ("refresh_token", refresh_token.to_string()),
        ("scope", scope.to_string()),
    ]
}

/// Turn a token-endpoint response into a complete [`TokenPair`].
pub fn parse_token_response(status: StatusCode, body: &str) -> Result<TokenPair, AuthError> {
    if !status.is_success() {
        return Err(AuthError::OAuthExchange(format!(
            "token endpoint returned HTTP {status}: {body}"
        )));
    }

    let raw: RawTokenResponse = serde_json::from_str(body)
        .map_err(|e| AuthError::OAuthExchange(format!("malformed token response: {e}")))?;

    if let Some(error) = raw.error.filter(|e| !e.is_empty()) {
        let description = raw.error_description.unwrap_or_default();
        return Err(AuthError::OAuthExchange(format!(
            "token endpoint returned error {error}: {description}"
        )));
    }

    let access_token = raw
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::OAuthExchange("token response missing access_token".into()))?;
    let refresh_token = raw
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::OAuthExchange("token response missing refresh_token".into()))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        id_token: raw.id_token.filter(|t| !t.is_empty()),
        expires_in: raw.expires_in,
        scope: raw.scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderConfig {
        ProviderConfig {
            endpoint: "http://casdoor:8000".to_string(),
            external_endpoint: "https://door.example.com".to_string(),
            client_id: "client123".to_string(),
            client_secret: "s3cret".to_string(),
            application_name: "rpa-app".to_string(),
            organization: "admin".to_string(),
            certificate_application: "app-built-in".to_string(),
            redirect_url: "https://rpa.example.com/callback?from=door".to_string(),
            scope: "read".to_string(),
        }
    }

    #[test]
    fn signin_url_encodes_redirect_uri() {
        let url = build_signin_url(&provider()).unwrap();

        assert!(url.starts_with("https://door.example.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=client123"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=read"));
        assert!(url.contains("state=rpa-app"));
        assert!(
            url.contains("redirect_uri=https%3A%2F%2Frpa.example.com%2Fcallback%3Ffrom%3Ddoor"),
            "redirect_uri must be percent-encoded: {url}"
        );
    }

    #[test]
    fn empty_code_or_state_is_rejected() {
        assert!(matches!(
            validate_callback("", "state"),
            Err(AuthError::InvalidParameter(_))
        ));
        assert!(matches!(
            validate_callback("code", "  "),
            Err(AuthError::InvalidParameter(_))
        ));
        assert!(validate_callback("code", "state").is_ok());
    }

    #[test]
    fn authorization_code_form_carries_static_client_config() {
        let form = authorization_code_form(&provider(), "the-code");
        assert!(form.contains(&("grant_type", "authorization_code".to_string())));
        assert!(form.contains(&("client_id", "client123".to_string())));
        assert!(form.contains(&("client_secret", "s3cret".to_string())));
        assert!(form.contains(&(
            "redirect_uri",
            "https://rpa.example.com/callback?from=door".to_string()
        )));
        assert!(form.contains(&("code", "the-code".to_string())));
    }

    #[test]
    fn refresh_form_uses_refresh_grant() {
        let form = refresh_token_form(&provider(), "rt1", "read");
        assert!(form.contains(&("grant_type", "refresh_token".to_string())));
        assert!(form.contains(&("refresh_token", "rt1".to_string())));
        assert!(form.contains(&("scope", "read".to_string())));
        assert!(!form.iter().any(|(k, _)| *k == "code"));
    }

    #[test]
    fn complete_response_parses() {
        let body = r#"{"access_token":"at1","refresh_token":"rt1","id_token":"idt",
                       "token_type":"Bearer","expires_in":7200,"scope":"read"}"#;
        let pair = parse_token_response(StatusCode::OK, body).unwrap();
        assert_eq!(pair.access_token, "at1");
        assert_eq!(pair.refresh_token, "rt1");
        assert_eq!(pair.identity_token(), "idt");
        assert_eq!(pair.expires_in, Some(7200));
    }

    #[test]
    fn identity_token_falls_back_to_access_token() {
        let body = r#"{"access_token":"at1","refresh_token":"rt1","id_token":""}"#;
        let pair = parse_token_response(StatusCode::OK, body).unwrap();
        assert_eq!(pair.id_token, None);
        assert_eq!(pair.identity_token(), "at1");
    }

    #[test]
    fn error_payload_with_200_is_rejected() {
        let body = r#"{"error":"invalid_grant","error_description":"authorization code has been used"}"#;
        let err = parse_token_response(StatusCode::OK, body).unwrap_err();
        assert!(matches!(err, AuthError::OAuthExchange(ref m) if m.contains("invalid_grant")));
    }

    #[test]
    fn non_success_status_is_rejected() {
        let err = parse_token_response(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert!(matches!(err, AuthError::OAuthExchange(_)));
    }

    #[test]
    fn malformed_body_is_rejected() {
        let err = parse_token_response(StatusCode::OK, "<html>oops</html>").unwrap_err();
        assert!(matches!(err, AuthError::OAuthExchange(_)));
    }

    #[test]
    fn partial_pair_is_never_returned() {
        let missing_refresh = r#"{"access_token":"at1"}"#;
        assert!(parse_token_response(StatusCode::OK, missing_refresh).is_err());

        let missing_access = r#"{"refresh_token":"rt1"}"#;
        assert!(parse_token_response(StatusCode::OK, missing_access).is_err());

        let empty_access = r#"{"access_token":"","refresh_token":"rt1"}"#;
        assert!(parse_token_response(StatusCode::OK, empty_access).is_err());
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let pair = parse_token_response(
            StatusCode::OK,
            r#"{"access_token":"at-secret","refresh_token":"rt-secret"}"#,
        )
        .unwrap();
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains("at-secret"));
        assert!(!rendered.contains("rt-secret"));
    }
}
