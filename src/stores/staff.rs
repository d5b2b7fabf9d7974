//! Staff accounts and the manager credential pair.
//!
//! Passwords are stored and compared in clear text with exact string
//! equality. There is no lockout or rate limiting.

use crate::Error;

/// An id/password pair checked by exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
        }
    }

    pub fn matches(&self, id: &str, password: &str) -> bool {
        self.id == id && self.password == password
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("admin", "1234")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffMember {
    pub id: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct StaffStore {
    members: Vec<StaffMember>,
}

impl StaffStore {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Adds a new staff member. Ids must be non-empty and unique.
    pub fn add(&mut self, member: StaffMember) -> Result<(), Error> {
        if member.id.trim().is_empty() {
            return Err(Error::MissingField("id"));
        }
        if self.members.iter().any(|m| m.id == member.id) {
            return Err(Error::DuplicateStaff(member.id));
        }
        self.members.push(member);
        Ok(())
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut StaffMember, Error> {
        self.members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::StaffNotFound(id.to_string()))
    }

    pub fn remove(&mut self, id: &str) -> Result<StaffMember, Error> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| Error::StaffNotFound(id.to_string()))?;
        Ok(self.members.remove(index))
    }

    pub fn check_login(&self, id: &str, password: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.id == id && m.password == password)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StaffMember> {
        self.members.iter()
    }
}

impl FromIterator<StaffMember> for StaffStore {
    fn from_iter<I: IntoIterator<Item = StaffMember>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
