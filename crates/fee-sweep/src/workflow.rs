//! The demonstration flow: create a transfer-fee mint, fund a source
//! account, run a checked transfer-with-fee, sweep the withheld fees.
//!
//! Strictly sequential. Every submitted transaction is confirmed before
//! the next step is attempted; later steps depend on ledger state the
//! earlier ones produced. No retries, no rollback — confirmed steps are
//! durable on the ledger whether or not the rest of the run succeeds.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use tracing::info;

use fee_policy::accounts_with_withheld_fees;

use crate::config::{MintConfig, WorkflowConfig};
use crate::error::{Error, LedgerError, Result};
use crate::keystore::{KeyRole, KeyStore};
use crate::ledger::LedgerClient;

/// Stages of the flow, in execution order. External failures are reported
/// against the stage they aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    MintCreated,
    Funded,
    Transferred,
    Swept,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::MintCreated => "MintCreated",
            WorkflowStage::Funded => "Funded",
            WorkflowStage::Transferred => "Transferred",
            WorkflowStage::Swept => "Swept",
        };
        f.write_str(name)
    }
}

/// Signing identities for one run, resolved from a [`KeyStore`].
pub struct WorkflowKeys {
    pub payer: Keypair,
    pub mint_authority: Keypair,
    pub transfer_fee_config_authority: Keypair,
    pub withdraw_withheld_authority: Keypair,
    pub token_owner: Keypair,
}

impl WorkflowKeys {
    pub fn from_store(store: &dyn KeyStore) -> Result<Self> {
        let load = |role: KeyRole| {
            store
                .keypair(role)
                .map_err(|source| Error::KeyStore { role, source })
        };
        Ok(Self {
            payer: load(KeyRole::Payer)?,
            mint_authority: load(KeyRole::MintAuthority)?,
            transfer_fee_config_authority: load(KeyRole::TransferFeeConfigAuthority)?,
            withdraw_withheld_authority: load(KeyRole::WithdrawWithheldAuthority)?,
            token_owner: load(KeyRole::TokenOwner)?,
        })
    }
}

/// Outcome of the sweep stage.
///
/// "Nothing to withdraw" is a valid terminal state, not an error; callers
/// that care can match on it without digging through error chains.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SweepOutcome {
    /// Withheld fees from `sources` were withdrawn in one transaction.
    Swept {
        #[serde_as(as = "DisplayFromStr")]
        signature: Signature,
        #[serde_as(as = "Vec<DisplayFromStr>")]
        sources: Vec<Pubkey>,
    },
    /// No account held a non-zero withheld balance; nothing was
    /// submitted.
    NothingToWithdraw,
}

/// What a completed run produced.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    #[serde_as(as = "DisplayFromStr")]
    pub mint: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub source_account: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub destination_account: Pubkey,
    #[serde_as(as = "DisplayFromStr")]
    pub transfer_signature: Signature,
    pub expected_fee: u64,
    pub sweep: SweepOutcome,
}

/// Runs the four-stage flow against a [`LedgerClient`].
#[derive(Debug)]
pub struct FeeSweepFlow<C> {
    client: C,
    config: WorkflowConfig,
}

impl<C: LedgerClient> FeeSweepFlow<C> {
    /// Rejects configurations whose fee parameters are out of range before
    /// anything touches the ledger.
    pub fn new(client: C, config: WorkflowConfig) -> Result<Self> {
        config.fee_policy()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    async fn confirmed(&self, stage: WorkflowStage, signature: Signature) -> Result<Signature> {
        self.client
            .confirm(&signature)
            .await
            .map_err(external(stage))?;
        Ok(signature)
    }

    /// Run mint creation → funding → transfer → sweep, one confirmed step
    /// at a time.
    pub async fn run(&self, keys: &WorkflowKeys) -> Result<WorkflowReport> {
        let policy = self.config.fee_policy()?;

        // Account keypairs are fresh per run; only the role identities are
        // shared through the key store.
        let mint = Keypair::new();
        let mint_config = MintConfig {
            decimals: self.config.decimals,
            mint_authority: keys.mint_authority.pubkey(),
            transfer_fee_config_authority: keys.transfer_fee_config_authority.pubkey(),
            withdraw_withheld_authority: keys.withdraw_withheld_authority.pubkey(),
            fee_basis_points: policy.basis_points(),
            maximum_fee: policy.maximum_fee(),
        };
        let signature = self
            .client
            .create_mint(&keys.payer, &mint, &mint_config)
            .await
            .map_err(external(WorkflowStage::MintCreated))?;
        self.confirmed(WorkflowStage::MintCreated, signature).await?;
        info!(mint = %mint.pubkey(), %signature, "mint created");

        let source = Keypair::new();
        let signature = self
            .client
            .create_account(
                &keys.payer,
                &mint.pubkey(),
                &keys.token_owner.pubkey(),
                &source,
            )
            .await
            .map_err(external(WorkflowStage::Funded))?;
        self.confirmed(WorkflowStage::Funded, signature).await?;
        let signature = self
            .client
            .mint_to(
                &keys.payer,
                &mint.pubkey(),
                &source.pubkey(),
                &keys.mint_authority,
                self.config.mint_amount,
                self.config.decimals,
            )
            .await
            .map_err(external(WorkflowStage::Funded))?;
        self.confirmed(WorkflowStage::Funded, signature).await?;
        info!(account = %source.pubkey(), amount = self.config.mint_amount, "source account funded");

        let destination = Keypair::new();
        let signature = self
            .client
            .create_account(
                &keys.payer,
                &mint.pubkey(),
                &keys.token_owner.pubkey(),
                &destination,
            )
            .await
            .map_err(external(WorkflowStage::Transferred))?;
        self.confirmed(WorkflowStage::Transferred, signature).await?;

        // The ledger re-derives the fee and rejects the transfer if this
        // value disagrees with it.
        let expected_fee = policy.fee_for(self.config.transfer_amount);
        let transfer_signature = self
            .client
            .transfer_with_fee(
                &keys.payer,
                &source.pubkey(),
                &mint.pubkey(),
                &destination.pubkey(),
                &keys.token_owner,
                self.config.transfer_amount,
                self.config.decimals,
                expected_fee,
            )
            .await
            .map_err(external(WorkflowStage::Transferred))?;
        self.confirmed(WorkflowStage::Transferred, transfer_signature)
            .await?;
        info!(%transfer_signature, expected_fee, "transfer with fee confirmed");

        let records = self
            .client
            .fetch_accounts_for_mint(&mint.pubkey())
            .await
            .map_err(external(WorkflowStage::Swept))?;
        let sources = accounts_with_withheld_fees(records);
        let sweep = if sources.is_empty() {
            info!("no withheld fees to withdraw");
            SweepOutcome::NothingToWithdraw
        } else {
            let signature = self
                .client
                .withdraw_withheld_fees(
                    &keys.payer,
                    &mint.pubkey(),
                    &destination.pubkey(),
                    &keys.withdraw_withheld_authority,
                    &sources,
                )
                .await
                .map_err(external(WorkflowStage::Swept))?;
            self.confirmed(WorkflowStage::Swept, signature).await?;
            info!(%signature, accounts = sources.len(), "withheld fees withdrawn");
            SweepOutcome::Swept { signature, sources }
        };

        Ok(WorkflowReport {
            mint: mint.pubkey(),
            source_account: source.pubkey(),
            destination_account: destination.pubkey(),
            transfer_signature,
            expected_fee,
            sweep,
        })
    }

    /// Harvest withheld fees from `sources` onto the mint, then withdraw
    /// the mint's withheld balance to `destination`. Covers fees that
    /// accumulate on the mint itself rather than on token accounts.
    pub async fn sweep_mint(
        &self,
        keys: &WorkflowKeys,
        mint: &Pubkey,
        sources: &[Pubkey],
        destination: &Pubkey,
    ) -> Result<Signature> {
        let signature = self
            .client
            .harvest_withheld_to_mint(&keys.payer, mint, sources)
            .await
            .map_err(external(WorkflowStage::Swept))?;
        self.confirmed(WorkflowStage::Swept, signature).await?;

        let signature = self
            .client
            .withdraw_withheld_from_mint(
                &keys.payer,
                mint,
                destination,
                &keys.withdraw_withheld_authority,
            )
            .await
            .map_err(external(WorkflowStage::Swept))?;
        self.confirmed(WorkflowStage::Swept, signature).await?;
        info!(%mint, %destination, "mint withheld balance withdrawn");
        Ok(signature)
    }
}

fn external(stage: WorkflowStage) -> impl FnOnce(LedgerError) -> Error {
    move |source| Error::External { stage, source }
}
