pub mod allocation;
pub mod dataset;
pub mod error;
pub mod lending;
pub mod types;

pub use error::{LoanAllocationError, Rejection};
pub use types::*;

/// Standard result type for all loan-allocation operations
pub type LoanAllocationResult<T> = Result<T, LoanAllocationError>;
