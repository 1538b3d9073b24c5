// src/verification/state_machine.rs
//! Provider verification lifecycle
//!
//! ```text
//! none ──submit──> pending ──approve──> approved (terminal)
//!                     │
//!                     └──reject──> rejected ──submit──> pending
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    None,
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::None => "none",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Result<Self, TransitionError> {
        match value {
            "none" => Ok(VerificationStatus::None),
            "pending" => Ok(VerificationStatus::Pending),
            "approved" => Ok(VerificationStatus::Approved),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationAction {
    Submit,
    Approve,
    Reject,
}

impl fmt::Display for VerificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerificationAction::Submit => "submit",
            VerificationAction::Approve => "approve",
            VerificationAction::Reject => "reject",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} a verification that is {from}")]
    NotAllowed {
        from: VerificationStatus,
        action: VerificationAction,
    },

    #[error("unknown verification status: {0}")]
    UnknownStatus(String),
}

impl TransitionError {
    /// Message shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            TransitionError::NotAllowed {
                from: VerificationStatus::Pending,
                action: VerificationAction::Submit,
            } => "Sua verificação já está em análise.",
            TransitionError::NotAllowed {
                from: VerificationStatus::Approved,
                action: VerificationAction::Submit,
            } => "Seu perfil já está verificado.",
            TransitionError::NotAllowed { .. } => "Esta verificação não está pendente.",
            TransitionError::UnknownStatus(_) => "Status de verificação inválido.",
        }
    }
}

/// Next state for `action`, or the refusal when the edge does not exist
pub fn transition(
    from: VerificationStatus,
    action: VerificationAction,
) -> Result<VerificationStatus, TransitionError> {
    use VerificationAction as A;
    use VerificationStatus as S;

    match (from, action) {
        (S::None, A::Submit) | (S::Rejected, A::Submit) => Ok(S::Pending),
        (S::Pending, A::Approve) => Ok(S::Approved),
        (S::Pending, A::Reject) => Ok(S::Rejected),
        (from, action) => Err(TransitionError::NotAllowed { from, action }),
    }
}
