//! Covenant-bearing lenders: banks, their facilities, and the loans proposed
//! to them.

pub mod bank;
pub mod book;
pub mod covenant;
pub mod facility;
pub mod loan;

pub use bank::Bank;
pub use book::LenderBook;
pub use covenant::{Covenant, CovenantRuleSet, CovenantTarget, Covenanted};
pub use facility::Facility;
pub use loan::Loan;
