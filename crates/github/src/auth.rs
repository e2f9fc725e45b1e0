//! Authentication-mode selection and app-installation JWT issuance (§4.1).

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

use crate::config::GithubClientConfig;
use crate::error::{PlatformApiError, Result};

#[derive(Debug, Clone)]
pub enum AuthMode {
    Basic {
        username: String,
        password: String,
    },
    Token(String),
    AppInstallation {
        app_id: String,
        installation_id: String,
        private_key_pem: Vec<u8>,
    },
}

impl AuthMode {
    /// Selects exactly one mode in priority order: basic auth, then static
    /// token, then app-installation key. `Ok(None)` means no auth configured.
    pub fn select(config: &GithubClientConfig) -> Result<Option<Self>> {
        if let (Some(username), Some(password)) =
            (&config.basicauth_username, &config.basicauth_password)
        {
            return Ok(Some(AuthMode::Basic {
                username: username.clone(),
                password: password.clone(),
            }));
        }

        if let Some(token) = &config.token {
            return Ok(Some(AuthMode::Token(token.clone())));
        }

        if let (Some(app_id), Some(installation_id), Some(key)) = (
            &config.app_id,
            &config.app_installation_id,
            &config.app_private_key,
        ) {
            let private_key_pem = load_private_key(key)?;
            return Ok(Some(AuthMode::AppInstallation {
                app_id: app_id.clone(),
                installation_id: installation_id.clone(),
                private_key_pem,
            }));
        }

        Ok(None)
    }
}

fn load_private_key(value: &str) -> Result<Vec<u8>> {
    if std::path::Path::new(value).is_file() {
        std::fs::read(value)
            .map_err(|err| PlatformApiError::Auth(format!("failed to read private key file: {err}")))
    } else {
        Ok(value.as_bytes().to_vec())
    }
}

#[derive(Serialize)]
struct InstallationJwtClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

/// A short-lived JWT used only to exchange for an installation access token;
/// GitHub App JWTs are capped at 10 minutes, backdated by 60s to tolerate clock drift.
pub fn issue_installation_jwt(app_id: &str, private_key_pem: &[u8]) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = InstallationJwtClaims {
        iat: now - 60,
        exp: now + 9 * 60,
        iss: app_id.to_string(),
    };
    let key = EncodingKey::from_rsa_pem(private_key_pem)
        .map_err(|err| PlatformApiError::Auth(sanitized_key_error(private_key_pem, &err.to_string())))?;

    encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|err| PlatformApiError::Auth(format!("failed to sign installation jwt: {err}")))
}

/// Never includes the whole key in an error message - only its size and first line.
fn sanitized_key_error(pem: &[u8], underlying: &str) -> String {
    let first_line = std::str::from_utf8(pem)
        .ok()
        .and_then(|s| s.lines().next())
        .unwrap_or("<non-utf8 key material>");
    format!(
        "invalid private key (size={} bytes, first_line=\"{}\"): {}",
        pem.len(),
        first_line,
        underlying
    )
}
