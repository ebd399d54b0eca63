//! The ledger capability the workflow runs against.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};

use crate::config::MintConfig;
use crate::error::LedgerError;
use fee_policy::AccountRecord;

/// An on-ledger token account and the withheld fee its transfer-fee
/// extension reports.
pub type TokenAccountRecord = AccountRecord<Pubkey>;

/// Everything the workflow needs from the ledger. Implementations own
/// transaction construction, signing and transport; callers never see any
/// of that.
///
/// Mutating operations return the submitted transaction's signature;
/// whether it landed is a separate question answered by [`confirm`].
/// Identities are opaque handles, key material is never inspected here.
///
/// [`confirm`]: LedgerClient::confirm
#[async_trait]
pub trait LedgerClient {
    /// Create and initialize a mint carrying the transfer-fee extension,
    /// in a single transaction.
    async fn create_mint(
        &self,
        payer: &Keypair,
        mint: &Keypair,
        config: &MintConfig,
    ) -> Result<Signature, LedgerError>;

    /// Create a token account for `mint` owned by `owner`.
    async fn create_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
        account: &Keypair,
    ) -> Result<Signature, LedgerError>;

    /// Mint `amount` base units to `account`.
    async fn mint_to(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        account: &Pubkey,
        mint_authority: &Keypair,
        amount: u64,
        decimals: u8,
    ) -> Result<Signature, LedgerError>;

    /// Checked transfer of `amount` base units with `expected_fee`
    /// withheld. The ledger re-derives the fee on its side and rejects the
    /// transaction on a mismatch.
    async fn transfer_with_fee(
        &self,
        payer: &Keypair,
        source: &Pubkey,
        mint: &Pubkey,
        destination: &Pubkey,
        owner: &Keypair,
        amount: u64,
        decimals: u8,
        expected_fee: u64,
    ) -> Result<Signature, LedgerError>;

    /// All token accounts of `mint`, each paired with its withheld fee
    /// amount (if the account has transfer-fee extension data).
    async fn fetch_accounts_for_mint(
        &self,
        mint: &Pubkey,
    ) -> Result<Vec<TokenAccountRecord>, LedgerError>;

    /// Withdraw withheld fees from `sources` into `destination`.
    async fn withdraw_withheld_fees(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Keypair,
        sources: &[Pubkey],
    ) -> Result<Signature, LedgerError>;

    /// Move withheld fees from `sources` onto the mint itself.
    /// Permissionless on the ledger side.
    async fn harvest_withheld_to_mint(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        sources: &[Pubkey],
    ) -> Result<Signature, LedgerError>;

    /// Withdraw the mint's own withheld balance into `destination`.
    async fn withdraw_withheld_from_mint(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Keypair,
    ) -> Result<Signature, LedgerError>;

    /// Block until `signature` reached network confirmation, or fail with
    /// the on-chain error if the transaction did not make it.
    async fn confirm(&self, signature: &Signature) -> Result<(), LedgerError>;
}
