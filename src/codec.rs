//! Recommendation tokens
//!
//! A recommendation handed out to the presentation layer travels as an opaque token instead of
//! an object reference. The token is the standard base64 encoding of the recommendation's JSON,
//! so it only ever contains `A-Z a-z 0-9 + / =` and can be embedded in a quoted attribute or a
//! command line without escaping.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use crate::api::Recommendation;
use crate::error::{ConsoleError, ConsoleResult};

/// Opaque, transport-safe form of a [`Recommendation`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationToken(String);

impl RecommendationToken {
    /// Wrap a token received from the presentation layer
    ///
    /// No validation happens here; a foreign token fails on [`decode`].
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecommendationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn encode(recommendation: &Recommendation) -> Result<RecommendationToken, serde_json::Error> {
    let json = serde_json::to_vec(recommendation)?;
    Ok(RecommendationToken(BASE64.encode(json)))
}

/// Inverse of [`encode`]
///
/// Malformed or foreign tokens fail with [`ConsoleError::Decode`]; callers treat that as a
/// non-fatal, ignored click.
pub fn decode(token: &RecommendationToken) -> ConsoleResult<Recommendation> {
    let bytes = BASE64
        .decode(token.as_str())
        .map_err(|e| ConsoleError::Decode(format!("not base64: {e}")))?;

    serde_json::from_slice(&bytes).map_err(|e| ConsoleError::Decode(format!("not a recommendation: {e}")))
}
