//! Withheld-balance scan: select the accounts worth including in a
//! withdraw-withheld-fees transaction.

/// A token account paired with the withheld fee its transfer-fee extension
/// records. `None` means the account carries no extension data at all.
///
/// `R` is whatever the caller uses to reference an account; the Solana
/// layer instantiates it with `Pubkey`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountRecord<R> {
    pub reference: R,
    pub withheld_amount: Option<u64>,
}

impl<R> AccountRecord<R> {
    pub fn new(reference: R, withheld_amount: Option<u64>) -> Self {
        Self {
            reference,
            withheld_amount,
        }
    }

    pub fn has_withheld_fees(&self) -> bool {
        matches!(self.withheld_amount, Some(amount) if amount > 0)
    }
}

/// Filter `records` down to the references holding a non-zero withheld
/// balance, preserving input order.
///
/// An empty result is a valid terminal state ("nothing to sweep"), not an
/// error.
pub fn accounts_with_withheld_fees<R>(
    records: impl IntoIterator<Item = AccountRecord<R>>,
) -> Vec<R> {
    records
        .into_iter()
        .filter(AccountRecord::has_withheld_fees)
        .map(|record| record.reference)
        .collect()
}
