use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use solana_client::rpc_response::RpcSimulateTransactionResult;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionError;
use thiserror::Error as ThisError;

use crate::keystore::KeyRole;
use crate::workflow::WorkflowStage;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by [`LedgerClient`] implementations.
///
/// [`LedgerClient`]: crate::ledger::LedgerClient
#[derive(Debug, ThisError)]
pub enum LedgerError {
    #[error("{}", verbose_client_error(.0))]
    Client(#[from] ClientError),
    #[error(transparent)]
    Program(#[from] solana_sdk::program_error::ProgramError),
    #[error(transparent)]
    Signer(#[from] solana_sdk::signer::SignerError),
    #[error("transaction {signature} failed on chain: {error}")]
    TransactionFailed {
        signature: Signature,
        error: TransactionError,
    },
    #[error("no status for signature {0}; confirmation outcome unknown")]
    StatusUnavailable(Signature),
}

/// Workflow-level errors. External failures name the stage they aborted in
/// and keep the ledger error intact underneath, so an operator can tell a
/// policy violation (fee mismatch) from an infrastructure problem.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Fee(#[from] fee_policy::FeeError),
    #[error("workflow stage {stage} failed: {source}")]
    External {
        stage: WorkflowStage,
        #[source]
        source: LedgerError,
    },
    #[error("key store failed to supply the {role} keypair: {source}")]
    KeyStore {
        role: KeyRole,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn external(stage: WorkflowStage, source: LedgerError) -> Self {
        Error::External { stage, source }
    }

    /// Stage the workflow aborted in, if this is an external failure.
    pub fn stage(&self) -> Option<WorkflowStage> {
        match self {
            Error::External { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Render an RPC client error with the preflight simulation logs when the
/// node returned them; the bare error code alone is useless for diagnosing
/// a rejected instruction.
fn verbose_client_error(err: &ClientError) -> String {
    use std::fmt::Write;
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
        code,
        message,
        data,
    }) = &err.kind
    {
        let mut s = String::new();
        writeln!(s, "{} ({})", message, code).unwrap();
        if let RpcResponseErrorData::SendTransactionPreflightFailure(
            RpcSimulateTransactionResult {
                logs: Some(logs), ..
            },
        ) = data
        {
            for (i, log) in logs.iter().enumerate() {
                writeln!(s, "{}: {}", i + 1, log).unwrap();
            }
        }
        s
    } else {
        err.to_string()
    }
}
