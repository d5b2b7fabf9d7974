use std::error::Error;
use std::io::Write;
use std::path::Path;

use crate::{
    backend::Backend,
    csv_utils::{read_csv, write_csv},
    dto::{AccountRow, SummaryRow, Transaction, TransactionType},
    RecordStore,
};

/// Applies a CSV file of deposits and withdrawals to the store and writes an
/// account balance summary to the provided writer.
///
/// # Arguments
/// * `store` - The ledger to post into; every applied row is persisted
/// * `input_path` - Path to the input CSV file (`type,account,pin,amount`)
/// * `writer` - Where to write the balance summary (e.g. stdout)
///
/// # Errors
/// Returns an error if:
/// * The input file cannot be read
/// * The CSV is malformed
/// * Persisting a posted row fails
/// * Writing to the output fails
pub fn run<B, P, W>(
    store: &mut RecordStore<B>,
    input_path: P,
    writer: W,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    P: AsRef<Path>,
    W: Write,
{
    let transactions_iter = read_csv::<Transaction, _>(input_path)?;
    for (line, transaction) in transactions_iter.enumerate() {
        // CSV parsing errors are critical - propagate them
        let transaction = transaction?;
        let result = match transaction.tx_type {
            TransactionType::Deposit => {
                store.deposit(&transaction.account, transaction.pin, transaction.amount)
            }
            TransactionType::Withdrawal => {
                store.withdraw(&transaction.account, transaction.pin, transaction.amount)
            }
        };
        match result {
            Ok(_) => {}
            // Persistence failures are fatal, business failures only skip the row
            Err(e) if e.kind() == crate::ErrorKind::Io => return Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    row = line + 1,
                    account = %transaction.account,
                    error = %e,
                    "row skipped"
                );
            }
        }
    }

    // Sort by account number for deterministic output
    let mut rows: Vec<_> = store.accounts().map(SummaryRow::from).collect();
    rows.sort_by(|a, b| a.account.cmp(&b.account));

    write_csv(writer, rows.into_iter())?;
    Ok(())
}

/// Writes every account, in creation order, as a CSV row. PINs are not exported.
pub fn export<B, W>(store: &RecordStore<B>, writer: W) -> csv::Result<()>
where
    B: Backend,
    W: Write,
{
    write_csv(writer, store.accounts().map(AccountRow::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::Credentials;

    fn example_store() -> RecordStore<MemoryBackend> {
        let contents = std::fs::read_to_string("data/example_ledger.json").unwrap();
        RecordStore::open(MemoryBackend::with_contents(contents), Credentials::default()).unwrap()
    }

    #[test]
    fn test_example_batch() -> Result<(), Box<dyn Error>> {
        let mut store = example_store();
        let mut output = Vec::new();
        run(&mut store, "data/example_batch.csv", &mut output)?;

        let expected = "account,name,balance
ABC123,Ann,300
XYZ789,Xavier,1150
";
        assert_eq!(String::from_utf8(output)?, expected);
        // Four rows applied, each one rewrote the file.
        assert_eq!(store.backend().writes(), 4);
        Ok(())
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let mut store = example_store();
        assert!(run(&mut store, "data/does_not_exist.csv", Vec::new()).is_err());
    }

    #[test]
    fn test_persist_failure_aborts_run() {
        let mut store = example_store();
        store.backend_mut().set_fail_writes(true);
        let mut output = Vec::new();
        assert!(run(&mut store, "data/example_batch.csv", &mut output).is_err());
        assert!(output.is_empty());
    }

    #[test]
    fn test_export() -> Result<(), Box<dyn Error>> {
        let store = example_store();
        let mut output = Vec::new();
        export(&store, &mut output)?;

        let expected = "account,name,age,email,balance
ABC123,Ann,30,a@x.com,0
XYZ789,Xavier,52,x@y.com,150
";
        assert_eq!(String::from_utf8(output)?, expected);
        Ok(())
    }
}
