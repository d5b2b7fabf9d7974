use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use crate::backend::{Backend, JsonFileBackend};
use crate::dto::{self, LedgerDocument};
use crate::stores::{
    Account, AccountsStore, Credentials, Pin, StaffMember, StaffStore, MINIMUM_AGE,
};
use crate::Error;

/// Largest amount accepted by a single deposit, in minor units.
pub const DEPOSIT_LIMIT: i64 = 10_000;

/// Fields an update may touch. `None` or a blank string keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub pin: Option<u32>,
    pub age: Option<u32>,
}

#[derive(Debug, Clone, Default)]
struct State {
    accounts: AccountsStore,
    staff: StaffStore,
    manager: Credentials,
}

impl State {
    fn from_document(
        document: LedgerDocument,
        default_manager: Credentials,
    ) -> Result<Self, Error> {
        let accounts = document
            .accounts
            .into_iter()
            .map(Account::try_from)
            .collect::<Result<AccountsStore, Error>>()?;
        Ok(Self {
            accounts,
            staff: document.staff.into_iter().map(StaffMember::from).collect(),
            manager: document
                .manager
                .map(Credentials::from)
                .unwrap_or(default_manager),
        })
    }

    fn to_document(&self) -> LedgerDocument {
        LedgerDocument {
            accounts: self.accounts.iter().map(Into::into).collect(),
            staff: self.staff.iter().map(Into::into).collect(),
            manager: Some((&self.manager).into()),
        }
    }
}

/// The account ledger.
///
/// Holds every record in memory and rewrites the whole backing document
/// after each successful mutation. A mutation is applied to a copy of the
/// state and only becomes visible once the write has succeeded, so a failed
/// call leaves both memory and storage untouched.
pub struct RecordStore<B: Backend = JsonFileBackend> {
    backend: B,
    state: State,
    rng: StdRng,
}

impl RecordStore<JsonFileBackend> {
    /// Opens (or initializes) the JSON file at `path`.
    pub fn open_file(
        path: impl Into<PathBuf>,
        default_manager: Credentials,
    ) -> Result<Self, Error> {
        Self::open(JsonFileBackend::new(path), default_manager)
    }
}

impl<B: Backend> RecordStore<B> {
    /// Loads the stored document. An empty backend is initialized with an
    /// empty ledger; a legacy layout is rewritten in the canonical one.
    pub fn open(backend: B, default_manager: Credentials) -> Result<Self, Error> {
        let mut store = Self {
            backend,
            state: State {
                manager: default_manager.clone(),
                ..State::default()
            },
            rng: StdRng::from_entropy(),
        };
        match store.backend.read()? {
            Some(raw) => {
                let parsed = dto::parse_document(&raw)?;
                store.state = State::from_document(parsed.document, default_manager)?;
                tracing::info!(
                    accounts = store.state.accounts.len(),
                    staff = store.state.staff.iter().count(),
                    "ledger loaded"
                );
                if parsed.needs_rewrite {
                    tracing::info!("migrating ledger to the current layout");
                    let document = store.state.to_document();
                    store.persist(&document)?;
                }
            }
            None => {
                tracing::info!("no ledger found, initializing an empty one");
                let document = store.state.to_document();
                store.persist(&document)?;
            }
        }
        Ok(store)
    }

    /// Replaces the account-number generator. Mostly for deterministic tests.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn persist(&mut self, document: &LedgerDocument) -> Result<(), Error> {
        let contents = serde_json::to_string_pretty(document)?;
        self.backend.write(&contents)
    }

    /// Runs `op` against a copy of the state, persists the copy and only then
    /// makes it current.
    fn commit<T>(
        &mut self,
        op: impl FnOnce(&mut State, &mut StdRng) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut next = self.state.clone();
        let output = op(&mut next, &mut self.rng)?;
        self.persist(&next.to_document())?;
        self.state = next;
        Ok(output)
    }

    pub fn create_account(
        &mut self,
        name: &str,
        age: u32,
        email: &str,
        pin: u32,
    ) -> Result<Account, Error> {
        let name = required("name", name)?;
        let email = required("email", email)?;
        validate_age(age)?;
        let pin = Pin::new(pin)?;

        let account = self.commit(|state, rng| {
            let account = Account {
                number: state.accounts.generate_number(rng)?,
                name,
                age,
                email,
                pin,
                balance: 0,
            };
            state.accounts.insert(account.clone());
            Ok(account)
        })?;
        tracing::info!(account = %account.number, "account created");
        Ok(account)
    }

    /// Adds `amount` to the balance and returns the new balance.
    pub fn deposit(&mut self, account_no: &str, pin: u32, amount: i64) -> Result<u64, Error> {
        let balance = self.commit(|state, _| {
            let account = state.accounts.get_mut(account_no, pin)?;
            if amount <= 0 {
                return Err(Error::AmountMustBePositive);
            }
            if amount > DEPOSIT_LIMIT {
                return Err(Error::DepositLimitExceeded {
                    amount,
                    limit: DEPOSIT_LIMIT,
                });
            }
            account.balance = account
                .balance
                .checked_add(amount as u64)
                .ok_or(Error::BalanceOverflow {
                    balance: account.balance,
                    amount,
                })?;
            Ok(account.balance)
        })?;
        tracing::info!(account = account_no, amount, balance, "deposit");
        Ok(balance)
    }

    /// Subtracts `amount` from the balance and returns the new balance.
    pub fn withdraw(&mut self, account_no: &str, pin: u32, amount: i64) -> Result<u64, Error> {
        let balance = self.commit(|state, _| {
            let account = state.accounts.get_mut(account_no, pin)?;
            if amount <= 0 {
                return Err(Error::AmountMustBePositive);
            }
            let requested = amount as u64;
            if requested > account.balance {
                return Err(Error::InsufficientFunds {
                    asked: amount,
                    available: account.balance,
                });
            }
            account.balance -= requested;
            Ok(account.balance)
        })?;
        tracing::info!(account = account_no, amount, balance, "withdrawal");
        Ok(balance)
    }

    pub fn get_details(&self, account_no: &str, pin: u32) -> Result<&Account, Error> {
        self.state
            .accounts
            .find(account_no, pin)
            .ok_or(Error::AccountNotFound)
    }

    /// Applies the non-empty fields of `update`. Every field is validated
    /// before any is written.
    pub fn update_account(
        &mut self,
        account_no: &str,
        update: AccountUpdate,
    ) -> Result<Account, Error> {
        let account = self.commit(|state, _| {
            let account = state.accounts.get_by_number_mut(account_no)?;
            let pin = update.pin.map(Pin::new).transpose()?;
            if let Some(age) = update.age {
                validate_age(age)?;
            }
            if let Some(name) = non_empty(update.name) {
                account.name = name;
            }
            if let Some(email) = non_empty(update.email) {
                account.email = email;
            }
            if let Some(pin) = pin {
                account.pin = pin;
            }
            if let Some(age) = update.age {
                account.age = age;
            }
            Ok(account.clone())
        })?;
        tracing::info!(account = account_no, "account updated");
        Ok(account)
    }

    pub fn delete_account(&mut self, account_no: &str, pin: u32) -> Result<(), Error> {
        self.commit(|state, _| state.accounts.remove(account_no, pin).map(drop))?;
        tracing::info!(account = account_no, "account deleted");
        Ok(())
    }

    /// Manager-side delete by account number alone.
    pub fn remove_account(&mut self, account_no: &str) -> Result<(), Error> {
        self.commit(|state, _| state.accounts.remove_by_number(account_no).map(drop))?;
        tracing::info!(account = account_no, "account removed");
        Ok(())
    }

    pub fn reset_pin(&mut self, account_no: &str, old_pin: u32, new_pin: u32) -> Result<(), Error> {
        self.commit(|state, _| {
            let account = state.accounts.get_mut(account_no, old_pin)?;
            account.pin = Pin::new(new_pin)?;
            Ok(())
        })?;
        tracing::info!(account = account_no, "pin reset");
        Ok(())
    }

    /// Accounts matching every given filter; see [`AccountsStore::search`].
    pub fn search<'a>(
        &'a self,
        name: Option<&'a str>,
        account_no: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Account> + 'a {
        self.state.accounts.search(name, account_no)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.state.accounts.iter()
    }

    pub fn add_staff(&mut self, id: &str, password: &str, name: &str) -> Result<(), Error> {
        let member = StaffMember {
            id: id.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        self.commit(|state, _| state.staff.add(member))?;
        tracing::info!(staff = id, "staff member added");
        Ok(())
    }

    pub fn edit_staff(
        &mut self,
        id: &str,
        new_name: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<(), Error> {
        self.commit(|state, _| {
            let member = state.staff.get_mut(id)?;
            if let Some(name) = new_name.filter(|n| !n.trim().is_empty()) {
                member.name = name.to_string();
            }
            if let Some(password) = new_password.filter(|p| !p.is_empty()) {
                member.password = password.to_string();
            }
            Ok(())
        })?;
        tracing::info!(staff = id, "staff member edited");
        Ok(())
    }

    pub fn remove_staff(&mut self, id: &str) -> Result<(), Error> {
        self.commit(|state, _| state.staff.remove(id).map(drop))?;
        tracing::info!(staff = id, "staff member removed");
        Ok(())
    }

    pub fn staff(&self) -> impl Iterator<Item = &StaffMember> {
        self.state.staff.iter()
    }

    pub fn check_manager_login(&self, id: &str, password: &str) -> bool {
        self.state.manager.matches(id, password)
    }

    pub fn check_staff_login(&self, id: &str, password: &str) -> bool {
        self.state.staff.check_login(id, password)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, Error> {
    if value.trim().is_empty() {
        return Err(Error::MissingField(field));
    }
    Ok(value.to_string())
}

/// Blank input means "keep the stored value".
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn validate_age(age: u32) -> Result<(), Error> {
    if age < MINIMUM_AGE {
        return Err(Error::AgeBelowMinimum {
            age,
            minimum: MINIMUM_AGE,
        });
    }
    Ok(())
}
