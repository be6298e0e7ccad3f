use crate::error::ClientError;
use lamport_custody::instruction::sol_to_lamports;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::{path::Path, str::FromStr};

/// How the custody account is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountMode {
    /// Owner's derived address, allocated by the program.
    #[default]
    Derived,
    /// Fresh keypair, allocated by the client before the first deposit.
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base58 custody program id.
    pub program_id: String,
    #[serde(default)]
    pub account_mode: AccountMode,
    #[serde(default = "default_deposit_sol")]
    pub deposit_sol: f64,
}

fn default_deposit_sol() -> f64 {
    0.02
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        serde_json::from_str(json).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn program_id(&self) -> Result<Pubkey, ClientError> {
        Pubkey::from_str(&self.program_id)
            .map_err(|e| ClientError::Config(format!("program_id: {}", e)))
    }

    pub fn deposit_lamports(&self) -> Result<u64, ClientError> {
        Ok(sol_to_lamports(self.deposit_sol)?)
    }
}
