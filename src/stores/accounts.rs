use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

use crate::Error;

/// Youngest age allowed to hold an account.
pub const MINIMUM_AGE: u32 = 18;

/// Generation gives up after this many collisions with existing numbers.
const MAX_GENERATION_ATTEMPTS: usize = 1000;

const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// A 4-digit account PIN, kept in clear text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin(u16);

impl Pin {
    pub fn new(value: u32) -> Result<Self, Error> {
        if (1000..=9999).contains(&value) {
            Ok(Self(value as u16))
        } else {
            Err(Error::InvalidPin)
        }
    }

    pub fn matches(&self, candidate: u32) -> bool {
        u32::from(self.0) == candidate
    }
}

impl TryFrom<u32> for Pin {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Pin::new(value)
    }
}

impl From<Pin> for u32 {
    fn from(pin: Pin) -> Self {
        u32::from(pin.0)
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public identifier of an account.
///
/// Freshly generated numbers are 3 uppercase letters and 3 digits in random
/// order. Numbers read back from older files are accepted verbatim, whatever
/// their shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let mut chars: Vec<u8> = Vec::with_capacity(6);
        for _ in 0..3 {
            chars.push(LETTERS[rng.gen_range(0..LETTERS.len())]);
        }
        for _ in 0..3 {
            chars.push(DIGITS[rng.gen_range(0..DIGITS.len())]);
        }
        chars.shuffle(rng);
        Self(chars.into_iter().map(char::from).collect())
    }

    /// True for numbers made of exactly 3 uppercase letters and 3 digits.
    pub fn has_generated_shape(&self) -> bool {
        let bytes = self.0.as_bytes();
        bytes.len() == 6
            && bytes.iter().filter(|b| b.is_ascii_uppercase()).count() == 3
            && bytes.iter().filter(|b| b.is_ascii_digit()).count() == 3
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountNumber {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AccountNumber {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub number: AccountNumber,
    pub name: String,
    pub age: u32,
    pub email: String,
    pub pin: Pin,
    /// Minor currency units.
    pub balance: u64,
}

#[derive(Debug, Clone, Default)]
pub struct AccountsStore {
    /// Kept in creation order.
    accounts: Vec<Account>,
}

impl AccountsStore {
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
        }
    }

    pub fn insert(&mut self, account: Account) {
        self.accounts.push(account);
    }

    pub fn contains_number(&self, number: &str) -> bool {
        self.accounts.iter().any(|a| a.number.as_str() == number)
    }

    /// Finds the account matching both the number and the PIN.
    pub fn find(&self, number: &str, pin: u32) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.number.as_str() == number && a.pin.matches(pin))
    }

    /// Gets a mutable account matching both the number and the PIN,
    /// or returns an error if there is none.
    pub fn get_mut(&mut self, number: &str, pin: u32) -> Result<&mut Account, Error> {
        self.accounts
            .iter_mut()
            .find(|a| a.number.as_str() == number && a.pin.matches(pin))
            .ok_or(Error::AccountNotFound)
    }

    /// Gets a mutable account by number alone. Used for staff-side edits.
    pub fn get_by_number_mut(&mut self, number: &str) -> Result<&mut Account, Error> {
        self.accounts
            .iter_mut()
            .find(|a| a.number.as_str() == number)
            .ok_or(Error::AccountNotFound)
    }

    pub fn remove(&mut self, number: &str, pin: u32) -> Result<Account, Error> {
        let index = self
            .accounts
            .iter()
            .position(|a| a.number.as_str() == number && a.pin.matches(pin))
            .ok_or(Error::AccountNotFound)?;
        Ok(self.accounts.remove(index))
    }

    pub fn remove_by_number(&mut self, number: &str) -> Result<Account, Error> {
        let index = self
            .accounts
            .iter()
            .position(|a| a.number.as_str() == number)
            .ok_or(Error::AccountNotFound)?;
        Ok(self.accounts.remove(index))
    }

    /// Accounts matching every given filter. The name filter is a
    /// case-insensitive substring match, the number filter is exact.
    pub fn search<'a>(
        &'a self,
        name: Option<&'a str>,
        number: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Account> + 'a {
        let needle = name.map(str::to_lowercase);
        self.accounts.iter().filter(move |a| {
            if let Some(number) = number {
                if a.number.as_str() != number {
                    return false;
                }
            }
            match &needle {
                Some(needle) => a.name.to_lowercase().contains(needle.as_str()),
                None => true,
            }
        })
    }

    /// Draws account numbers until one is not already taken.
    pub fn generate_number<R: Rng>(&self, rng: &mut R) -> Result<AccountNumber, Error> {
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let candidate = AccountNumber::generate(rng);
            if !self.contains_number(candidate.as_str()) {
                return Ok(candidate);
            }
            tracing::debug!(number = %candidate, "account number collision, retrying");
        }
        Err(Error::AccountNumberSpaceExhausted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl FromIterator<Account> for AccountsStore {
    fn from_iter<I: IntoIterator<Item = Account>>(iter: I) -> Self {
        Self {
            accounts: iter.into_iter().collect(),
        }
    }
}
