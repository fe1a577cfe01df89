use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Named addresses produced by one successful resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddresses {
    addresses: HashMap<String, u64>,
    /// Names that may stay unresolved outside tournament spectating.
    tourney_only: Vec<String>,
}

impl ResolvedAddresses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, address: u64, tourney_only: bool) {
        self.addresses.insert(name.to_string(), address);
        if tourney_only && !self.tourney_only.iter().any(|n| n == name) {
            self.tourney_only.push(name.to_string());
        }
    }

    /// Address for `name`, or 0 when unresolved.
    pub fn get(&self, name: &str) -> u64 {
        self.addresses.get(name).copied().unwrap_or(0)
    }

    /// Address for `name`, failing when unresolved.
    pub fn require(&self, name: &str) -> Result<u64> {
        match self.get(name) {
            0 => Err(Error::ResolutionFailed(format!("'{}' is not resolved", name))),
            address => Ok(address),
        }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Names of entries that are zero but required for the given role.
    pub fn missing(&self, spectating: bool) -> Vec<&str> {
        let mut missing: Vec<&str> = self
            .addresses
            .iter()
            .filter(|(name, address)| {
                **address == 0 && (spectating || !self.tourney_only.iter().any(|t| t == *name))
            })
            .map(|(name, _)| name.as_str())
            .collect();
        missing.sort_unstable();
        missing
    }

    /// Every required entry is non-zero.
    pub fn is_ready(&self, spectating: bool) -> bool {
        !self.addresses.is_empty() && self.missing(spectating).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.addresses.iter().map(|(name, address)| (name.as_str(), *address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_not_ready() {
        let addresses = ResolvedAddresses::new();
        assert!(!addresses.is_ready(false));
    }

    #[test]
    fn test_ready_when_all_non_zero() {
        let mut addresses = ResolvedAddresses::new();
        addresses.insert("baseAddr", 0x1000, false);
        addresses.insert("statusPtr", 0x2000, false);

        assert!(addresses.is_ready(false));
        assert_eq!(addresses.get("statusPtr"), 0x2000);
        assert_eq!(addresses.require("baseAddr").unwrap(), 0x1000);
    }

    #[test]
    fn test_tourney_only_entry_optional_when_not_spectating() {
        let mut addresses = ResolvedAddresses::new();
        addresses.insert("baseAddr", 0x1000, false);
        addresses.insert("spectatingUserPtr", 0, true);

        assert!(addresses.is_ready(false));
        assert!(!addresses.is_ready(true));
        assert_eq!(addresses.missing(true), vec!["spectatingUserPtr"]);
    }

    #[test]
    fn test_zero_required_entry_not_ready() {
        let mut addresses = ResolvedAddresses::new();
        addresses.insert("baseAddr", 0, false);

        assert!(!addresses.is_ready(false));
        assert!(addresses.require("baseAddr").is_err());
        assert_eq!(addresses.get("unknown"), 0);
    }
}
