//! Serialized shapes: the JSON backing file and the CSV rows used by batch
//! posting and exports.
//!
//! The backing file has one canonical layout, an object with `accounts`,
//! `staff` and `manager` keys. [`parse_document`] also reads the legacy
//! layouts (a bare list of accounts, and the `accountNo.` key) and reports
//! whether the file should be rewritten.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stores::{Account, AccountNumber, Credentials, Pin, StaffMember};
use crate::Error;

/// Account-number key used by older files.
pub const LEGACY_NUMBER_KEY: &str = "accountNo.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountRecord {
    pub name: String,
    pub age: u32,
    pub email: String,
    /// Signed so that malformed legacy PINs such as `-123` surface as
    /// [`Error::InvalidPin`] rather than a parse failure.
    pub pin: i64,
    #[serde(rename = "accountNo", alias = "accountNo.")]
    pub account_no: String,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffRecord {
    pub id: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerRecord {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LedgerDocument {
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
    #[serde(default)]
    pub staff: Vec<StaffRecord>,
    /// Absent in older files; the configured default applies then.
    #[serde(default)]
    pub manager: Option<ManagerRecord>,
}

#[derive(Debug)]
pub struct ParsedDocument {
    pub document: LedgerDocument,
    /// Set when the input was not in the canonical layout.
    pub needs_rewrite: bool,
}

/// Parses the backing file, accepting both the canonical and legacy layouts.
pub fn parse_document(raw: &str) -> serde_json::Result<ParsedDocument> {
    let value: Value = serde_json::from_str(raw)?;
    let needs_rewrite = !is_canonical(&value);
    let document = match value {
        Value::Array(_) => LedgerDocument {
            accounts: serde_json::from_value(value)?,
            ..LedgerDocument::default()
        },
        other => serde_json::from_value(other)?,
    };
    Ok(ParsedDocument {
        document,
        needs_rewrite,
    })
}

fn is_canonical(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    let has_keys = ["accounts", "staff", "manager"]
        .iter()
        .all(|key| map.get(*key).map_or(false, |v| !v.is_null()));
    let legacy_numbers = map
        .get("accounts")
        .and_then(Value::as_array)
        .map_or(false, |accounts| {
            accounts
                .iter()
                .any(|account| account.get(LEGACY_NUMBER_KEY).is_some())
        });
    has_keys && !legacy_numbers
}

impl TryFrom<AccountRecord> for Account {
    type Error = Error;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        Ok(Account {
            number: AccountNumber::from(record.account_no),
            name: record.name,
            age: record.age,
            email: record.email,
            pin: u32::try_from(record.pin)
                .map_err(|_| Error::InvalidPin)
                .and_then(Pin::new)?,
            balance: record.balance,
        })
    }
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            age: account.age,
            email: account.email.clone(),
            pin: u32::from(account.pin).into(),
            account_no: account.number.to_string(),
            balance: account.balance,
        }
    }
}

impl From<StaffRecord> for StaffMember {
    fn from(record: StaffRecord) -> Self {
        Self {
            id: record.id,
            password: record.password,
            name: record.name,
        }
    }
}

impl From<&StaffMember> for StaffRecord {
    fn from(member: &StaffMember) -> Self {
        Self {
            id: member.id.clone(),
            password: member.password.clone(),
            name: member.name.clone(),
        }
    }
}

impl From<ManagerRecord> for Credentials {
    fn from(record: ManagerRecord) -> Self {
        Credentials::new(record.id, record.password)
    }
}

impl From<&Credentials> for ManagerRecord {
    fn from(credentials: &Credentials) -> Self {
        Self {
            id: credentials.id.clone(),
            password: credentials.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

/// One row of a batch posting file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub account: String,
    pub pin: u32,
    pub amount: i64,
}

/// Exported account row. The PIN is deliberately absent.
#[derive(Debug, Serialize, PartialEq)]
pub struct AccountRow {
    pub account: String,
    pub name: String,
    pub age: u32,
    pub email: String,
    pub balance: u64,
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            account: account.number.to_string(),
            name: account.name.clone(),
            age: account.age,
            email: account.email.clone(),
            balance: account.balance,
        }
    }
}

/// Balance summary written after a batch run.
#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryRow {
    pub account: String,
    pub name: String,
    pub balance: u64,
}

impl From<&Account> for SummaryRow {
    fn from(account: &Account) -> Self {
        Self {
            account: account.number.to_string(),
            name: account.name.clone(),
            balance: account.balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_csv_row(row: &str) -> Result<Transaction, csv::Error> {
        let data_with_header = format!("type,account,pin,amount\n{}", row);
        let mut reader = csv::Reader::from_reader(data_with_header.as_bytes());
        reader.deserialize().next().unwrap()
    }

    #[test]
    fn test_parse_deposit_row() {
        assert_eq!(
            parse_csv_row("deposit,ABC123,1234,500").unwrap(),
            Transaction {
                tx_type: TransactionType::Deposit,
                account: "ABC123".to_string(),
                pin: 1234,
                amount: 500,
            }
        );
    }

    #[test]
    fn test_parse_withdrawal_row_with_negative_amount() {
        // Range checks belong to the store, not to parsing.
        assert_eq!(
            parse_csv_row("withdrawal,ABC123,1234,-5").unwrap(),
            Transaction {
                tx_type: TransactionType::Withdrawal,
                account: "ABC123".to_string(),
                pin: 1234,
                amount: -5,
            }
        );
    }

    #[test]
    fn test_parse_invalid_rows() {
        assert!(parse_csv_row("dispute,ABC123,1234,5").is_err());
        assert!(parse_csv_row("deposit,ABC123,1234,5.5").is_err());
        assert!(parse_csv_row("deposit,ABC123,pin,5").is_err());
    }

    #[test]
    fn test_parse_canonical_document() {
        let raw = r#"{
            "accounts": [
                {"name": "Ann", "age": 30, "email": "a@x.com", "pin": 1234,
                 "accountNo": "AB1C23", "balance": 500}
            ],
            "staff": [{"id": "s1", "password": "pw", "name": "Sam"}],
            "manager": {"id": "boss", "password": "pw"}
        }"#;
        let parsed = parse_document(raw).unwrap();
        assert!(!parsed.needs_rewrite);
        assert_eq!(parsed.document.accounts[0].account_no, "AB1C23");
        assert_eq!(parsed.document.accounts[0].balance, 500);
        assert_eq!(parsed.document.staff[0].id, "s1");
        assert_eq!(
            parsed.document.manager,
            Some(ManagerRecord {
                id: "boss".to_string(),
                password: "pw".to_string()
            })
        );
    }

    #[test]
    fn test_parse_legacy_list() {
        let raw = r#"[
            {"name": "Ann", "age": 30, "email": "a@x.com", "pin": 1234,
             "accountNo.": "a1#B2c3", "balance": 20}
        ]"#;
        let parsed = parse_document(raw).unwrap();
        assert!(parsed.needs_rewrite);
        assert_eq!(parsed.document.accounts.len(), 1);
        assert_eq!(parsed.document.accounts[0].account_no, "a1#B2c3");
        assert!(parsed.document.staff.is_empty());
        assert_eq!(parsed.document.manager, None);
    }

    #[test]
    fn test_parse_legacy_key_in_object() {
        let raw = r#"{
            "accounts": [
                {"name": "Ann", "age": 30, "email": "a@x.com", "pin": 1234,
                 "accountNo.": "ABC123", "balance": 0}
            ],
            "staff": [],
            "manager": {"id": "admin", "password": "1234"}
        }"#;
        let parsed = parse_document(raw).unwrap();
        assert!(parsed.needs_rewrite);
        assert_eq!(parsed.document.accounts[0].account_no, "ABC123");
    }

    #[test]
    fn test_parse_partial_object() {
        let parsed = parse_document(r#"{"accounts": []}"#).unwrap();
        assert!(parsed.needs_rewrite);
        assert_eq!(parsed.document, LedgerDocument::default());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_document("not json").is_err());
        assert!(parse_document("42").is_err());
        assert!(parse_document(r#"[{"name": "Ann"}]"#).is_err());
    }

    #[test]
    fn test_serialized_record_uses_canonical_key() {
        let record = AccountRecord {
            name: "Ann".to_string(),
            age: 30,
            email: "a@x.com".to_string(),
            pin: 1234,
            account_no: "ABC123".to_string(),
            balance: 0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["accountNo"], "ABC123");
        assert!(json.get(LEGACY_NUMBER_KEY).is_none());
    }

    #[test]
    fn test_record_with_bad_pin_is_rejected() {
        let record = AccountRecord {
            name: "Ann".to_string(),
            age: 30,
            email: "a@x.com".to_string(),
            pin: 12,
            account_no: "ABC123".to_string(),
            balance: 0,
        };
        assert!(matches!(Account::try_from(record), Err(Error::InvalidPin)));
    }
}
