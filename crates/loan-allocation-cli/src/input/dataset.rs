use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use loan_allocation_core::dataset::{BankRecord, CovenantRecord, FacilityRecord, LoanRecord};
use loan_allocation_core::lending::Loan;

pub const BANKS_FILE: &str = "banks.csv";
pub const FACILITIES_FILE: &str = "facilities.csv";
pub const COVENANTS_FILE: &str = "covenants.csv";
pub const LOANS_FILE: &str = "loans.csv";

/// Reference tables loaded ahead of the loan stream.
#[derive(Debug, Default)]
pub struct ReferenceData {
    pub banks: Vec<BankRecord>,
    pub facilities: Vec<FacilityRecord>,
    pub covenants: Vec<CovenantRecord>,
}

/// Load banks, facilities and covenants from a dataset directory.
/// A missing covenants file means no covenants.
pub fn load_reference_data(dir: &Path) -> Result<ReferenceData, Box<dyn std::error::Error>> {
    let banks = read_table(&dir.join(BANKS_FILE))?;
    let facilities = read_table(&dir.join(FACILITIES_FILE))?;

    let covenants_path = dir.join(COVENANTS_FILE);
    let covenants = if covenants_path.exists() {
        read_table(&covenants_path)?
    } else {
        tracing::warn!(path = %covenants_path.display(), "no covenants file; running unconstrained");
        Vec::new()
    };

    tracing::info!(
        banks = banks.len(),
        facilities = facilities.len(),
        covenants = covenants.len(),
        "reference data loaded"
    );

    Ok(ReferenceData {
        banks,
        facilities,
        covenants,
    })
}

/// Read a whole headered CSV file into records.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    parse_records(file, &path.display().to_string())
}

pub fn parse_records<T: DeserializeOwned, R: Read>(
    reader: R,
    source: &str,
) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let mut rdr = csv_reader(reader);
    let mut records = Vec::new();
    for (i, row) in rdr.deserialize().enumerate() {
        let record: T = row.map_err(|e| format!("{} row {}: {}", source, i + 1, e))?;
        records.push(record);
    }
    Ok(records)
}

/// Stream loans one record at a time, in file order.
pub fn open_loan_stream(
    path: &Path,
) -> Result<impl Iterator<Item = Result<Loan, Box<dyn std::error::Error>>>, Box<dyn std::error::Error>> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
    Ok(loan_stream(file, path.display().to_string()))
}

pub fn loan_stream<R: Read>(
    reader: R,
    source: String,
) -> impl Iterator<Item = Result<Loan, Box<dyn std::error::Error>>> {
    csv_reader(reader)
        .into_deserialize::<LoanRecord>()
        .enumerate()
        .map(move |(i, row)| {
            let record = row.map_err(|e| format!("{} row {}: {}", source, i + 1, e))?;
            let loan = Loan::try_from(record)
                .map_err(|e| format!("{} row {}: {}", source, i + 1, e))?;
            Ok(loan)
        })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_covenants_with_blank_fields() {
        let data = "facility_id,max_default_likelihood,bank_id,banned_state\n\
                    2,0.09,1,\n\
                    ,,1,MT\n";
        let rows: Vec<CovenantRecord> = parse_records(data.as_bytes(), "covenants.csv").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].facility_id, Some(2));
        assert_eq!(rows[0].max_default_likelihood, Some(dec!(0.09)));
        assert_eq!(rows[0].banned_state, None);
        assert_eq!(rows[1].facility_id, None);
        assert_eq!(rows[1].banned_state.as_deref(), Some("MT"));
    }

    #[test]
    fn test_parse_facilities() {
        let data = "amount,interest_rate,id,bank_id\n61104.0,0.07,2,1\n";
        let rows: Vec<FacilityRecord> = parse_records(data.as_bytes(), "facilities.csv").unwrap();
        assert_eq!(rows[0].amount, dec!(61104));
        assert_eq!(rows[0].interest_rate, dec!(0.07));
    }

    #[test]
    fn test_loan_stream_preserves_order() {
        let data = "interest_rate,amount,id,default_likelihood,state\n\
                    0.15,10552,2,0.02,MO\n\
                    0.15,51157,1,0.01,VT\n";
        let ids: Vec<u64> = loan_stream(data.as_bytes(), "loans.csv".into())
            .map(|l| l.unwrap().id)
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_loan_stream_reports_bad_row() {
        let data = "interest_rate,amount,id,default_likelihood,state\n0.15,abc,2,0.02,MO\n";
        let first = loan_stream(data.as_bytes(), "loans.csv".into()).next().unwrap();
        let message = first.unwrap_err().to_string();
        assert!(message.starts_with("loans.csv row 1"), "{}", message);
    }

    #[test]
    fn test_loan_stream_reports_row_of_invalid_loan() {
        let data = "interest_rate,amount,id,default_likelihood,state\n\
                    0.15,100,1,0.02,MO\n\
                    0.15,100,2,1.5,MO\n";
        let mut stream = loan_stream(data.as_bytes(), "loans.csv".into());
        assert!(stream.next().unwrap().is_ok());

        let message = stream.next().unwrap().unwrap_err().to_string();
        assert!(message.starts_with("loans.csv row 2: "), "{}", message);
        assert!(message.contains("default_likelihood"), "{}", message);
    }
}
