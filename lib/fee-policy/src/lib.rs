//! Transfer-fee policy primitives: basis-point fee computation with a fee
//! cap, and the withheld-balance scan that selects accounts for a sweep.
//!
//! Everything here is pure and ledger-agnostic; the Solana layer lives in
//! the `fee-sweep` crate.

pub mod error;
pub mod fee;
pub mod withheld;

pub use error::FeeError;
pub use fee::{compute_fee, TransferFeePolicy, MAX_BASIS_POINTS};
pub use withheld::{accounts_with_withheld_fees, AccountRecord};
