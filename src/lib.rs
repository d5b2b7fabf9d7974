pub mod backend;
pub mod config;
mod csv_utils;
pub mod dto;
mod error;
mod record_store;
mod runner;
mod stores;

pub use backend::{Backend, JsonFileBackend, MemoryBackend};
pub use error::{Error, ErrorKind};
pub use record_store::{AccountUpdate, RecordStore, DEPOSIT_LIMIT};
pub use runner::{export, run};
pub use stores::{Account, AccountNumber, Credentials, Pin, StaffMember, MINIMUM_AGE};
