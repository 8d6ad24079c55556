pub mod assignment;
pub mod batch;
pub mod engine;
pub mod session;
pub mod yields;

pub use assignment::Assignment;
pub use batch::{allocate, AllocationInput, AllocationOutput};
pub use engine::{AssignmentOutcome, FacilityRejection, LoanAssigner};
pub use session::{AllocationSession, AllocationSummary, AssignmentRecord, FacilityCapacity, LoanOutcome};
pub use yields::{truncate_to_cents, FacilityYield, YieldLedger};
