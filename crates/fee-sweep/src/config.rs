//! Configuration surface of a workflow run.

use fee_policy::{FeeError, TransferFeePolicy};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::pubkey::Pubkey;

/// Tunables of one workflow run. Defaults mirror the devnet demo values:
/// 9 decimals, 0.5% fee capped at 5_000 base units, 1e9 minted, 1e6
/// transferred.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default = "default_fee_basis_points")]
    pub fee_basis_points: u16,
    #[serde(default = "default_maximum_fee")]
    pub maximum_fee: u64,
    #[serde(default = "default_mint_amount")]
    pub mint_amount: u64,
    #[serde(default = "default_transfer_amount")]
    pub transfer_amount: u64,
}

impl WorkflowConfig {
    /// Fee policy for this configuration; rejects out-of-range basis
    /// points.
    pub fn fee_policy(&self) -> Result<TransferFeePolicy, FeeError> {
        TransferFeePolicy::new(self.fee_basis_points, self.maximum_fee)
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            fee_basis_points: default_fee_basis_points(),
            maximum_fee: default_maximum_fee(),
            mint_amount: default_mint_amount(),
            transfer_amount: default_transfer_amount(),
        }
    }
}

fn default_decimals() -> u8 {
    9
}

// 50 bp = 0.5%
fn default_fee_basis_points() -> u16 {
    50
}

fn default_maximum_fee() -> u64 {
    5_000
}

fn default_mint_amount() -> u64 {
    1_000_000_000
}

fn default_transfer_amount() -> u64 {
    1_000_000
}

/// Parameters a transfer-fee mint is created with. Immutable afterwards;
/// fee reconfiguration is a different authority's business and not part of
/// this workflow.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintConfig {
    pub decimals: u8,
    #[serde_as(as = "DisplayFromStr")]
    pub mint_authority: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub transfer_fee_config_authority: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub withdraw_withheld_authority: Pubkey,
    pub fee_basis_points: u16,
    pub maximum_fee: u64,
}

impl MintConfig {
    pub fn fee_policy(&self) -> Result<TransferFeePolicy, FeeError> {
        TransferFeePolicy::new(self.fee_basis_points, self.maximum_fee)
    }
}
