//! Boundaries to external collaborators that are not persisted rooms.

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{AuthError, Problem, ProblemId, VerifiedIdentity};

/// Validates an opaque credential token.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError>;
}

/// Read access to problem metadata.
#[cfg_attr(test, automock)]
pub trait ProblemCatalog: Send + Sync {
    fn get_by_id(&self, id: &ProblemId) -> Option<Problem>;

    fn list(&self) -> Vec<Problem>;
}
