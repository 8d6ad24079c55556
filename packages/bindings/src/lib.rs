use napi::Result as NapiResult;
use napi_derive::napi;

use loan_allocation_core::allocation::{self, AllocationInput, YieldLedger};
use loan_allocation_core::dataset::{self, BankRecord, CovenantRecord, FacilityRecord};
use loan_allocation_core::lending::{Covenanted, Loan};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Run a whole batch: `{banks, facilities, covenants, loans, include_rejections}`.
#[napi]
pub fn allocate_loans(input_json: String) -> NapiResult<String> {
    let input: AllocationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = allocation::allocate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Expected yield of one loan on a facility priced at `facility_rate`,
/// ignoring covenants and capacity.
#[napi]
pub fn expected_yield(loan_json: String, facility_rate: String) -> NapiResult<String> {
    let record: dataset::LoanRecord = serde_json::from_str(&loan_json).map_err(to_napi_error)?;
    let loan = Loan::try_from(record).map_err(to_napi_error)?;
    let rate: rust_decimal::Decimal = facility_rate.parse().map_err(to_napi_error)?;

    let mut book = loan_allocation_core::lending::LenderBook::new();
    book.add_bank(0, "quote").map_err(to_napi_error)?;
    book.open_facility(0, 0, loan.amount, rate).map_err(to_napi_error)?;

    let mut assigner = allocation::LoanAssigner::new(book);
    let assignment = assigner
        .assign(&loan)
        .ok_or_else(|| to_napi_error("loan could not be placed"))?;
    let mut ledger = YieldLedger::new();
    let value = ledger.record(&assignment).map_err(to_napi_error)?;
    serde_json::to_string(&value).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct ReferenceInput {
    banks: Vec<BankRecord>,
    facilities: Vec<FacilityRecord>,
    #[serde(default)]
    covenants: Vec<CovenantRecord>,
}

/// Validate reference data and return each facility's folded covenant rules,
/// in the order loans would be offered to them.
#[napi]
pub fn facility_rules(input_json: String) -> NapiResult<String> {
    let input: ReferenceInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let book = dataset::build_lenders(&input.banks, &input.facilities, &input.covenants)
        .map_err(to_napi_error)?;
    let assigner = allocation::LoanAssigner::new(book);

    let rows: Vec<serde_json::Value> = assigner
        .ranked_facilities()
        .map(|f| {
            let bank_rules = assigner.book().bank(f.bank_id()).map(|b| b.rules().clone());
            serde_json::json!({
                "facility_id": f.id(),
                "bank_id": f.bank_id(),
                "interest_rate": f.interest_rate(),
                "amount": f.remaining_capacity(),
                "facility_rules": f.rules(),
                "bank_rules": bank_rules,
            })
        })
        .collect();
    serde_json::to_string(&rows).map_err(to_napi_error)
}
