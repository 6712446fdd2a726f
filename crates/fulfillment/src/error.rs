//! Orchestration abort types.

use thiserror::Error;

use crate::state::BuyStage;
use crate::wire::BuyOrderResponse;

/// Why an orchestration stopped before persisting an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbortKind {
    /// Missing, invalid or unresolvable bearer token.
    Auth,
    /// A required request field is missing.
    Validation,
    /// Stock validation failed for at least one cart line.
    BusinessRule,
    /// A collaborator was unreachable or answered with a failure.
    UpstreamUnavailable,
    /// The order could not be stored.
    Internal,
}

impl AbortKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortKind::Auth => "auth",
            AbortKind::Validation => "validation",
            AbortKind::BusinessRule => "business_rule",
            AbortKind::UpstreamUnavailable => "upstream_unavailable",
            AbortKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for AbortKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A buy request that ended in the aborted state.
///
/// Carries the response envelope to return to the caller; its `errors`
/// list is never empty and its `order` is always absent.
#[derive(Debug, Clone, Error)]
#[error("Order aborted after {stage} ({kind}): {}", .response.errors.join("; "))]
pub struct OrderAborted {
    /// Last stage reached before the abort.
    pub stage: BuyStage,
    pub kind: AbortKind,
    pub response: BuyOrderResponse,
}
