#![allow(clippy::too_many_arguments)]

//! Token-2022 transfer-fee sweep workflow.
//!
//! Creates a mint carrying the transfer-fee extension, funds a source
//! account, runs a checked transfer-with-fee, then withdraws the withheld
//! fees from every account still holding some. Fee math and the
//! withheld-balance scan live in the `fee-policy` crate; everything
//! touching the ledger goes through the [`ledger::LedgerClient`]
//! capability, with an RPC-backed implementation in [`rpc`].

pub mod config;
pub mod error;
pub mod keystore;
pub mod ledger;
pub mod rpc;
pub mod workflow;

pub use error::{Error, LedgerError, Result};

pub mod prelude {
    pub use crate::config::{MintConfig, WorkflowConfig};
    pub use crate::error::{Error, LedgerError, Result};
    pub use crate::keystore::{KeyRole, KeyStore, KeypairExt, MemoryKeyStore};
    pub use crate::ledger::{LedgerClient, TokenAccountRecord};
    pub use crate::rpc::RpcLedgerClient;
    pub use crate::workflow::{
        FeeSweepFlow, SweepOutcome, WorkflowKeys, WorkflowReport, WorkflowStage,
    };
    pub use fee_policy::{accounts_with_withheld_fees, compute_fee, TransferFeePolicy};
}
