//! RPC-backed [`LedgerClient`].
//!
//! Builds the same instruction sequences the Token-2022 program expects,
//! signs with the keypairs handed in, and submits through a nonblocking
//! [`RpcClient`]. Cluster choice, commitment and timeout policy stay with
//! whoever constructs the `RpcClient`.

use std::time::Duration;

use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::signers::Signers;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use spl_token_2022::extension::transfer_fee::instruction as transfer_fee_instruction;
use spl_token_2022::extension::transfer_fee::TransferFeeAmount;
use spl_token_2022::extension::{BaseStateWithExtensions, ExtensionType, StateWithExtensions};
use spl_token_2022::state::{Account, Mint};
use tracing::debug;

use crate::config::MintConfig;
use crate::error::LedgerError;
use crate::ledger::{LedgerClient, TokenAccountRecord};

const CONFIRM_POLLS: usize = 32;
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct RpcLedgerClient {
    rpc: RpcClient,
}

impl RpcLedgerClient {
    /// Wrap an already-configured RPC client.
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    async fn send<T: Signers>(
        &self,
        fee_payer: &Pubkey,
        instructions: &[Instruction],
        signers: &T,
    ) -> Result<Signature, LedgerError> {
        let recent_blockhash = self.rpc.get_latest_blockhash().await?;
        let message = Message::new_with_blockhash(instructions, Some(fee_payer), &recent_blockhash);
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(signers, recent_blockhash)?;
        Ok(self.rpc.send_and_confirm_transaction(&tx).await?)
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn create_mint(
        &self,
        payer: &Keypair,
        mint: &Keypair,
        config: &MintConfig,
    ) -> Result<Signature, LedgerError> {
        let space =
            ExtensionType::try_calculate_account_len::<Mint>(&[ExtensionType::TransferFeeConfig])?;
        let lamports = self
            .rpc
            .get_minimum_balance_for_rent_exemption(space)
            .await?;

        // All three instructions in one transaction, so the mint is never
        // observable half-initialized.
        let instructions = [
            system_instruction::create_account(
                &payer.pubkey(),
                &mint.pubkey(),
                lamports,
                space as u64,
                &spl_token_2022::id(),
            ),
            transfer_fee_instruction::initialize_transfer_fee_config(
                &spl_token_2022::id(),
                &mint.pubkey(),
                Some(&config.transfer_fee_config_authority),
                Some(&config.withdraw_withheld_authority),
                config.fee_basis_points,
                config.maximum_fee,
            )?,
            spl_token_2022::instruction::initialize_mint2(
                &spl_token_2022::id(),
                &mint.pubkey(),
                &config.mint_authority,
                None,
                config.decimals,
            )?,
        ];

        debug!(mint = %mint.pubkey(), space, lamports, "creating transfer-fee mint");
        self.send(&payer.pubkey(), &instructions, &[payer, mint])
            .await
    }

    async fn create_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
        account: &Keypair,
    ) -> Result<Signature, LedgerError> {
        // Accounts of a transfer-fee mint need room for the withheld
        // amount extension.
        let space = ExtensionType::try_calculate_account_len::<Account>(&[
            ExtensionType::TransferFeeAmount,
        ])?;
        let lamports = self
            .rpc
            .get_minimum_balance_for_rent_exemption(space)
            .await?;

        let instructions = [
            system_instruction::create_account(
                &payer.pubkey(),
                &account.pubkey(),
                lamports,
                space as u64,
                &spl_token_2022::id(),
            ),
            spl_token_2022::instruction::initialize_account3(
                &spl_token_2022::id(),
                &account.pubkey(),
                mint,
                owner,
            )?,
        ];

        debug!(account = %account.pubkey(), %mint, %owner, "creating token account");
        self.send(&payer.pubkey(), &instructions, &[payer, account])
            .await
    }

    async fn mint_to(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        account: &Pubkey,
        mint_authority: &Keypair,
        amount: u64,
        decimals: u8,
    ) -> Result<Signature, LedgerError> {
        let ix = spl_token_2022::instruction::mint_to_checked(
            &spl_token_2022::id(),
            mint,
            account,
            &mint_authority.pubkey(),
            &[],
            amount,
            decimals,
        )?;

        self.send(&payer.pubkey(), &[ix], &[payer, mint_authority])
            .await
    }

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
    ) -> Result<Signature, LedgerError> {
        let ix = transfer_fee_instruction::transfer_checked_with_fee(
            &spl_token_2022::id(),
            source,
            mint,
            destination,
            &owner.pubkey(),
            &[],
            amount,
            decimals,
            expected_fee,
        )?;

        debug!(%source, %destination, amount, expected_fee, "transfer with fee");
        self.send(&payer.pubkey(), &[ix], &[payer, owner]).await
    }

    async fn fetch_accounts_for_mint(
        &self,
        mint: &Pubkey,
    ) -> Result<Vec<TokenAccountRecord>, LedgerError> {
        // Token accounts store their mint at offset 0.
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![RpcFilterType::Memcmp(Memcmp::new(
                0,
                MemcmpEncodedBytes::Base58(mint.to_string()),
            ))]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                data_slice: None,
                commitment: Some(CommitmentConfig::confirmed()),
                min_context_slot: None,
            },
            with_context: None,
        };

        let accounts = self
            .rpc
            .get_program_accounts_with_config(&spl_token_2022::id(), config)
            .await?;

        let mut records = Vec::with_capacity(accounts.len());
        for (pubkey, account) in accounts {
            let state = StateWithExtensions::<Account>::unpack(&account.data)?;
            let withheld = state
                .get_extension::<TransferFeeAmount>()
                .ok()
                .map(|extension| u64::from(extension.withheld_amount));
            records.push(TokenAccountRecord::new(pubkey, withheld));
        }
        debug!(%mint, accounts = records.len(), "fetched token accounts");
        Ok(records)
    }

    async fn withdraw_withheld_fees(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Keypair,
        sources: &[Pubkey],
    ) -> Result<Signature, LedgerError> {
        let source_refs: Vec<&Pubkey> = sources.iter().collect();
        let ix = transfer_fee_instruction::withdraw_withheld_tokens_from_accounts(
            &spl_token_2022::id(),
            mint,
            destination,
            &authority.pubkey(),
            &[],
            &source_refs,
        )?;

        debug!(%mint, %destination, sources = sources.len(), "withdrawing withheld fees");
        self.send(&payer.pubkey(), &[ix], &[payer, authority]).await
    }

    async fn harvest_withheld_to_mint(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        sources: &[Pubkey],
    ) -> Result<Signature, LedgerError> {
        let source_refs: Vec<&Pubkey> = sources.iter().collect();
        let ix = transfer_fee_instruction::harvest_withheld_tokens_to_mint(
            &spl_token_2022::id(),
            mint,
            &source_refs,
        )?;

        self.send(&payer.pubkey(), &[ix], &[payer]).await
    }

    async fn withdraw_withheld_from_mint(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Keypair,
    ) -> Result<Signature, LedgerError> {
        let ix = transfer_fee_instruction::withdraw_withheld_tokens_from_mint(
            &spl_token_2022::id(),
            mint,
            destination,
            &authority.pubkey(),
            &[],
        )?;

        self.send(&payer.pubkey(), &[ix], &[payer, authority]).await
    }

    async fn confirm(&self, signature: &Signature) -> Result<(), LedgerError> {
        for _ in 0..CONFIRM_POLLS {
            let statuses = self.rpc.get_signature_statuses(&[*signature]).await?;
            if let Some(status) = statuses.value.into_iter().next().flatten() {
                if let Some(error) = status.err {
                    return Err(LedgerError::TransactionFailed {
                        signature: *signature,
                        error,
                    });
                }
                if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                    return Ok(());
                }
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
        Err(LedgerError::StatusUnavailable(*signature))
    }
}
