use std::fmt;
use thiserror::Error;

/// Failure of a single provider call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The request was refused on content-policy grounds.
    #[error("{provider}: content policy violation: {message}")]
    PolicyViolation { provider: String, message: String },

    /// The provider answered, but not with anything usable.
    #[error("{provider}: invalid response: {message}")]
    InvalidResponse { provider: String, message: String },

    /// Transport, API or local process failure.
    #[error("{provider}: {message}")]
    Failed { provider: String, message: String },
}

impl ProviderError {
    pub fn failed(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Failed {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn policy_violation(provider: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::PolicyViolation {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn is_policy_violation(&self) -> bool {
        matches!(self, Self::PolicyViolation { .. })
    }
}

/// Every provider in a chain failed.
#[derive(Debug, Clone, Error)]
#[error("all {capability} providers failed: {}", format_attempts(.attempts))]
pub struct ChainExhausted {
    pub capability: &'static str,
    /// `(provider, reason)` in the order tried.
    pub attempts: Vec<(String, String)>,
    /// At least one provider refused on content-policy grounds.
    pub policy_violation: bool,
}

fn format_attempts(attempts: &[(String, String)]) -> String {
    if attempts.is_empty() {
        return "no providers configured".to_string();
    }
    attempts
        .iter()
        .map(|(provider, reason)| format!("{} ({})", provider, reason))
        .collect::<Vec<_>>()
        .join(", ")
}
