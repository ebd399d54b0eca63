//! Signing-identity boundary.
//!
//! The workflow never touches key material itself; it asks a [`KeyStore`]
//! for the keypair of each role and passes the result around as an opaque
//! handle. Where keys actually live (memory, env file, remote signer) is
//! the implementation's business.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use solana_sdk::signature::Keypair;

pub trait KeypairExt {
    fn clone_keypair(&self) -> Self;
}

impl KeypairExt for Keypair {
    fn clone_keypair(&self) -> Self {
        Self::from_bytes(&self.to_bytes()).unwrap()
    }
}

/// Roles a workflow run needs signing identities for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    Payer,
    MintAuthority,
    TransferFeeConfigAuthority,
    WithdrawWithheldAuthority,
    TokenOwner,
}

impl KeyRole {
    pub const ALL: [KeyRole; 5] = [
        KeyRole::Payer,
        KeyRole::MintAuthority,
        KeyRole::TransferFeeConfigAuthority,
        KeyRole::WithdrawWithheldAuthority,
        KeyRole::TokenOwner,
    ];
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyRole::Payer => "payer",
            KeyRole::MintAuthority => "mint authority",
            KeyRole::TransferFeeConfigAuthority => "transfer fee config authority",
            KeyRole::WithdrawWithheldAuthority => "withdraw withheld authority",
            KeyRole::TokenOwner => "token owner",
        };
        f.write_str(name)
    }
}

/// Supplies and persists signing identities.
pub trait KeyStore: Send + Sync {
    /// Keypair for `role`, generating and persisting one if the store does
    /// not hold it yet. Repeated calls return the same identity.
    fn keypair(&self, role: KeyRole) -> anyhow::Result<Keypair>;
}

/// Process-local store; every role is generated on first use and lives for
/// the lifetime of the store.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: Mutex<HashMap<KeyRole, Keypair>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn keypair(&self, role: KeyRole) -> anyhow::Result<Keypair> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| anyhow!("key store lock poisoned"))?;
        let keypair = keys.entry(role).or_insert_with(Keypair::new);
        Ok(keypair.clone_keypair())
    }
}
