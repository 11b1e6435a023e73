use crate::error::{LotteryError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};

/// Owner and trusted-party roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    owner: Address,
    trusted_party: Option<Address>,
}

impl Roles {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            trusted_party: None,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn trusted_party(&self) -> Option<Address> {
        self.trusted_party
    }

    /// Address a sealed digest is bound to; the owner until a trusted party is set
    pub fn commitment_party(&self) -> Address {
        self.trusted_party.unwrap_or(self.owner)
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    pub fn is_trusted_party(&self, caller: &Address) -> bool {
        self.trusted_party.as_ref() == Some(caller)
    }

    pub fn require_owner(&self, caller: &Address, operation: &'static str) -> Result<()> {
        if !self.is_owner(caller) {
            return Err(LotteryError::Authorization {
                operation,
                caller: *caller,
            });
        }
        Ok(())
    }

    /// Owner or trusted party
    pub fn require_sealer(&self, caller: &Address, operation: &'static str) -> Result<()> {
        if !self.is_owner(caller) && !self.is_trusted_party(caller) {
            return Err(LotteryError::Authorization {
                operation,
                caller: *caller,
            });
        }
        Ok(())
    }

    /// Returns the previous trusted party
    pub fn set_trusted_party(&mut self, party: Address) -> Option<Address> {
        self.trusted_party.replace(party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_guard() {
        let owner = Address::derive("owner");
        let roles = Roles::new(owner);

        roles.require_owner(&owner, "withdraw fees").unwrap();
        let err = roles
            .require_owner(&Address::derive("mallory"), "withdraw fees")
            .unwrap_err();
        assert!(matches!(err, LotteryError::Authorization { .. }));
    }

    #[test]
    fn test_sealer_guard() {
        let owner = Address::derive("owner");
        let trusted = Address::derive("trusted");
        let mut roles = Roles::new(owner);

        assert!(roles.require_sealer(&trusted, "seal").is_err());
        assert_eq!(roles.commitment_party(), owner);

        assert_eq!(roles.set_trusted_party(trusted), None);
        roles.require_sealer(&trusted, "seal").unwrap();
        roles.require_sealer(&owner, "seal").unwrap();
        assert!(roles.require_sealer(&Address::derive("mallory"), "seal").is_err());
        assert_eq!(roles.commitment_party(), trusted);
    }
}
