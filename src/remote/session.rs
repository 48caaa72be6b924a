//! Session token inspection.
//!
//! The payload is decoded without signature verification; the remote
//! verifies the token on every request.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::debug;

use crate::error::{TimelineError, TimelineResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionClaims {
    #[serde(default, alias = "userId")]
    pub user_id: Option<u64>,
    #[serde(default, alias = "accountId")]
    pub account_id: Option<u64>,
    #[serde(default, rename = "isViewOnly")]
    is_view_only_camel: Option<bool>,
    #[serde(default, rename = "is_view_only")]
    is_view_only_snake: Option<bool>,
}

impl SessionClaims {
    #[must_use]
    pub fn is_view_only(&self) -> bool {
        self.is_view_only_camel == Some(true) || self.is_view_only_snake == Some(true)
    }
}

/// Decodes the claims segment of a `header.payload.signature` token.
pub fn decode_claims(token: &str) -> TimelineResult<SessionClaims> {
    let mut parts = token.split('.');
    let (Some(_), Some(payload), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TimelineError::InvalidData(
            "session token is not a three-part JWT".to_owned(),
        ));
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| TimelineError::InvalidData(format!("session token payload: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TimelineError::InvalidData(format!("session token claims: {e}")))
}

/// True when the token marks a viewer without API write access.
///
/// Malformed tokens are treated as not view-only.
#[must_use]
pub fn is_view_only(token: &str) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.is_view_only(),
        Err(err) => {
            debug!(error = %err, "ignoring undecodable session token");
            false
        }
    }
}
