//! Basis-point transfer-fee computation.
//!
//! Matches the on-ledger rule for the transfer-fee extension: the fee is
//! `floor(amount * basis_points / 10_000)`, capped at `maximum_fee`.
//! Integer arithmetic only; fractional base units do not exist on the
//! ledger, and float rounding would drift from its own enforcement.

use crate::error::{FeeError, Result};

/// 100% expressed in basis points. 1 bp = 0.01%.
pub const MAX_BASIS_POINTS: u16 = 10_000;

// Callers validate `basis_points` first. The widening keeps
// `u64::MAX * 10_000` representable.
fn floored_capped_fee(amount: u64, basis_points: u16, maximum_fee: u64) -> u64 {
    let fee = u128::from(amount) * u128::from(basis_points) / u128::from(MAX_BASIS_POINTS);
    // fee <= amount <= u64::MAX since basis_points <= 10_000
    (fee as u64).min(maximum_fee)
}

/// Compute the fee owed on a transfer of `amount` base units.
///
/// Fails with [`FeeError::BasisPointsOutOfRange`] if `basis_points`
/// exceeds [`MAX_BASIS_POINTS`]; inputs are never clamped. The result is
/// always `<= maximum_fee` and `<= amount`.
pub fn compute_fee(amount: u64, basis_points: u16, maximum_fee: u64) -> Result<u64> {
    if basis_points > MAX_BASIS_POINTS {
        return Err(FeeError::BasisPointsOutOfRange { basis_points });
    }
    Ok(floored_capped_fee(amount, basis_points, maximum_fee))
}

/// A mint's transfer-fee parameters, fixed at mint creation.
///
/// Validated once in [`TransferFeePolicy::new`], so [`fee_for`] is
/// infallible afterwards.
///
/// [`fee_for`]: TransferFeePolicy::fee_for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferFeePolicy {
    basis_points: u16,
    maximum_fee: u64,
}

impl TransferFeePolicy {
    pub fn new(basis_points: u16, maximum_fee: u64) -> Result<Self> {
        if basis_points > MAX_BASIS_POINTS {
            return Err(FeeError::BasisPointsOutOfRange { basis_points });
        }
        Ok(Self {
            basis_points,
            maximum_fee,
        })
    }

    pub fn basis_points(&self) -> u16 {
        self.basis_points
    }

    pub fn maximum_fee(&self) -> u64 {
        self.maximum_fee
    }

    /// Fee owed on a transfer of `amount` base units under this policy.
    pub fn fee_for(&self, amount: u64) -> u64 {
        floored_capped_fee(amount, self.basis_points, self.maximum_fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_percent_hits_cap_exactly() {
        assert_eq!(compute_fee(1_000_000, 50, 5_000).unwrap(), 5_000);
    }

    #[test]
    fn large_amount_is_capped() {
        assert_eq!(compute_fee(10_000_000_000, 50, 5_000).unwrap(), 5_000);
    }

    #[test]
    fn sub_unit_fee_floors_to_zero() {
        // 0.5% of 100 is 0.5, floored away
        assert_eq!(compute_fee(100, 50, 5_000).unwrap(), 0);
    }

    #[test]
    fn zero_amount_and_zero_rate() {
        assert_eq!(compute_fee(0, 50, 5_000).unwrap(), 0);
        assert_eq!(compute_fee(1_000_000, 0, 5_000).unwrap(), 0);
        assert_eq!(compute_fee(0, 0, 0).unwrap(), 0);
    }

    #[test]
    fn bounded_by_cap_and_amount() {
        let amounts = [0, 1, 99, 100, 10_000, u64::MAX / 2, u64::MAX];
        let rates = [0, 1, 50, 9_999, 10_000];
        let caps = [0, 1, 5_000, u64::MAX];
        for &amount in &amounts {
            for &bp in &rates {
                for &cap in &caps {
                    let fee = compute_fee(amount, bp, cap).unwrap();
                    assert!(fee <= cap, "fee {fee} above cap {cap}");
                    assert!(fee <= amount, "fee {fee} above amount {amount}");
                }
            }
        }
    }

    #[test]
    fn full_rate_takes_everything_up_to_cap() {
        assert_eq!(compute_fee(u64::MAX, 10_000, u64::MAX).unwrap(), u64::MAX);
        assert_eq!(compute_fee(u64::MAX, 10_000, 7).unwrap(), 7);
    }

    #[test]
    fn deterministic() {
        let a = compute_fee(123_456_789, 37, 9_999).unwrap();
        let b = compute_fee(123_456_789, 37, 9_999).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_out_of_range_basis_points() {
        assert_eq!(
            compute_fee(1, 10_001, 1),
            Err(FeeError::BasisPointsOutOfRange {
                basis_points: 10_001
            })
        );
        assert!(TransferFeePolicy::new(u16::MAX, 0).is_err());
    }

    #[test]
    fn policy_matches_free_function() {
        let policy = TransferFeePolicy::new(50, 5_000).unwrap();
        assert_eq!(policy.basis_points(), 50);
        assert_eq!(policy.maximum_fee(), 5_000);
        for amount in [0, 100, 1_000_000, 10_000_000_000] {
            assert_eq!(policy.fee_for(amount), compute_fee(amount, 50, 5_000).unwrap());
        }
    }
}
