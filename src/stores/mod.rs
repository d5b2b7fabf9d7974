//! In-memory collections behind the record store. Provides storage for:
//! - Customer accounts and account-number generation ([`AccountsStore`])
//! - Staff members and the manager credentials ([`StaffStore`], [`Credentials`])
//!
//! Nothing here touches the disk; persistence is driven by
//! [`crate::RecordStore`].

mod accounts;
mod staff;

pub use accounts::{Account, AccountNumber, AccountsStore, Pin, MINIMUM_AGE};
pub use staff::{Credentials, StaffMember, StaffStore};
