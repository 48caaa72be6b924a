use thiserror::Error;

pub type TimelineResult<T> = Result<T, TimelineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// Remote throttled the request and every allowed attempt was spent.
    #[error("rate limited after {attempts} attempt(s): {message}")]
    RateLimited { attempts: u32, message: String },

    #[error("remote request failed: {0}")]
    Remote(String),

    /// Caller lacks access; the view switches to restricted mode.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// Rejected locally before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A write failed after its optimistic apply.
    #[error("write for item {item_id} failed after optimistic apply: {reason}")]
    StaleWrite { item_id: String, reason: String },

    #[error("cannot delete the last group; a board needs at least one group")]
    LastGroup,

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl TimelineError {
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }

    /// Classifies a raw remote error message the way the board API words it.
    ///
    /// Rate limits surface as "complexity" budget or "rate limit" messages,
    /// authorization failures as explicit auth codes or "not authorized".
    #[must_use]
    pub fn classify_remote(code: Option<&str>, message: &str) -> Self {
        let lowered = message.to_ascii_lowercase();
        let code = code.map(str::to_ascii_lowercase);
        match code.as_deref() {
            Some("authentication_error" | "authorization_error" | "unauthorized") => {
                return Self::Authorization(message.to_owned());
            }
            Some(
                "complexity_exception"
                | "complexity_budget_exhausted"
                | "rate_limit_exceeded"
                | "max_concurrency_exceeded",
            ) => {
                return Self::RateLimited {
                    attempts: 1,
                    message: message.to_owned(),
                };
            }
            _ => {}
        }

        if lowered.contains("complexity") || lowered.contains("rate limit") {
            Self::RateLimited {
                attempts: 1,
                message: message.to_owned(),
            }
        } else if lowered.contains("not authorized") || lowered.contains("authentication failed") {
            Self::Authorization(message.to_owned())
        } else {
            Self::Remote(message.to_owned())
        }
    }
}
