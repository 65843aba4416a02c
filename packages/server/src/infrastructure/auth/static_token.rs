//! 静的トークン表による CredentialVerifier 実装
//!
//! トークン文字列から検証済みアイデンティティへの対応表を保持します。
//! 表は起動時に JSON ファイルから読み込みます:
//!
//! ```json
//! {
//!   "token-alice": { "participant_id": "alice", "display_name": "Alice", "email": "alice@example.com" }
//! }
//! ```

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{AuthError, CredentialVerifier, VerifiedIdentity};

#[derive(Debug, Error)]
pub enum CredentialLoadError {
    #[error("failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse credentials file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone)]
pub struct StaticCredentialVerifier {
    tokens: HashMap<String, VerifiedIdentity>,
}

impl StaticCredentialVerifier {
    pub fn new(tokens: HashMap<String, VerifiedIdentity>) -> Self {
        Self { tokens }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CredentialLoadError> {
        let tokens: HashMap<String, VerifiedIdentity> = serde_json::from_str(json)?;
        Ok(Self::new(tokens))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CredentialLoadError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}
