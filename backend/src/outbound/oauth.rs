//! Reqwest-backed Google identity adapter.
//!
//! This adapter owns transport details only: the authorization URL shape, the
//! back-channel code exchange, and ID-token verification against Google's
//! published JWKS. Domain policy (state checks, domain allow-list, account
//! upsert) stays in the handlers.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use url::form_urlencoded;

use crate::domain::district::GoogleSsoConfig;
use crate::domain::ports::{IdentityError, IdentityProvider, VerifiedIdentity};
use crate::domain::users::default_display_name;

const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const JWKS_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/certs";
const ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Google identity adapter performing the OAuth 2.0 authorization-code flow.
pub struct GoogleIdentityProvider {
    client: Client,
}

impl GoogleIdentityProvider {
    /// Build an adapter with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(EXCHANGE_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
}

/// ID-token claims consumed after signature verification.
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    email: String,
    #[serde(default)]
    name: Option<String>,
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorization_url(
        &self,
        config: &GoogleSsoConfig,
        redirect_uri: &str,
        state: &str,
    ) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state)
            .append_pair("prompt", "select_account")
            .finish();
        format!("{AUTHORIZATION_ENDPOINT}?{query}")
    }

    async fn exchange_code(
        &self,
        config: &GoogleSsoConfig,
        redirect_uri: &str,
        code: &str,
    ) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", &config.client_id),
                ("client_secret", &config.client_secret),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::exchange(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::exchange(format!(
                "token endpoint returned {status}"
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::exchange(e.to_string()))?;

        let jwks: JwkSet = self
            .client
            .get(JWKS_ENDPOINT)
            .send()
            .await
            .map_err(|e| IdentityError::exchange(e.to_string()))?
            .json()
            .await
            .map_err(|e| IdentityError::exchange(e.to_string()))?;

        let claims = verify_id_token(&token.id_token, &jwks, &config.client_id)?;
        let name = claims
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_display_name(&claims.email));
        Ok(VerifiedIdentity {
            email: claims.email,
            name,
        })
    }
}

/// Verify an ID token's signature against the JWKS and check issuer and
/// audience.
fn verify_id_token(
    id_token: &str,
    jwks: &JwkSet,
    client_id: &str,
) -> Result<IdTokenClaims, IdentityError> {
    let header =
        decode_header(id_token).map_err(|e| IdentityError::invalid_token(e.to_string()))?;
    let kid = header
        .kid
        .ok_or_else(|| IdentityError::invalid_token("token header has no key id"))?;
    let jwk = jwks
        .find(&kid)
        .ok_or_else(|| IdentityError::invalid_token(format!("no JWKS key matches kid {kid}")))?;
    let key =
        DecodingKey::from_jwk(jwk).map_err(|e| IdentityError::invalid_token(e.to_string()))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[client_id]);
    validation.set_issuer(&ISSUERS);
    decode::<IdTokenClaims>(id_token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| IdentityError::invalid_token(e.to_string()))
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    #[test]
    fn authorization_url_carries_flow_parameters() {
        let provider = GoogleIdentityProvider::new().expect("client");
        let config = GoogleSsoConfig {
            client_id: "cid.apps.googleusercontent.com".into(),
            client_secret: "secret".into(),
            allowed_domain: None,
        };
        let url = provider.authorization_url(
            &config,
            "https://catalog.example.org/authorize",
            "state-token",
        );
        let parsed = Url::parse(&url).expect("valid url");
        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("scope".into(), "openid email profile".into())));
        assert!(pairs.contains(&("state".into(), "state-token".into())));
        assert!(pairs.contains(&("prompt".into(), "select_account".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "https://catalog.example.org/authorize".into()
        )));
    }

    #[test]
    fn malformed_id_token_is_rejected() {
        let jwks: JwkSet = serde_json::from_str(r#"{"keys":[]}"#).expect("jwks");
        let err = verify_id_token("not-a-jwt", &jwks, "cid").expect_err("reject");
        assert!(matches!(err, IdentityError::InvalidToken { .. }));
    }
}
