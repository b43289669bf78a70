pub mod account;
pub mod claim;
pub mod draw;
pub mod ticket;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which result space a ticket or declaration belongs to.
///
/// Global results cover every globally issued ticket; account results cover
/// one shop's own tickets. The two never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "account_id", rename_all = "snake_case")]
pub enum Scope {
    Global,
    Account(i64),
}

impl Scope {
    /// Storage key: `global` or `account:<id>`.
    pub fn key(&self) -> String {
        match self {
            Self::Global => "global".to_string(),
            Self::Account(id) => format!("account:{id}"),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        if key == "global" {
            return Some(Self::Global);
        }
        key.strip_prefix("account:")
            .and_then(|id| id.parse().ok())
            .map(Self::Account)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_key() {
        assert_eq!(Scope::Global.key(), "global");
        assert_eq!(Scope::Account(42).key(), "account:42");
        assert_eq!(Scope::from_key("global"), Some(Scope::Global));
        assert_eq!(Scope::from_key("account:42"), Some(Scope::Account(42)));
        assert_eq!(Scope::from_key("account:x"), None);
        assert_eq!(Scope::from_key("shop"), None);
    }
}
