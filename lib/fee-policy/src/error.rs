use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, FeeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum FeeError {
    #[error("transfer fee basis points out of range: {basis_points} (max 10000)")]
    BasisPointsOutOfRange { basis_points: u16 },
}
