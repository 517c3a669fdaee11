//! Defines error handling constructs for registrar.
//!
//! Most registry operations report failure through plain `bool` and `Option` results, since an unknown
//! or duplicated name is an ordinary outcome rather than a fault. The `try_*` variants of those operations
//! return [`RegistryError`] instead, describing why the operation did not take effect.

use std::{error, fmt};

/// Error that can occur when binding, renaming or constructing children by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// An empty string was used as a child name.
    EmptyName,
    /// The name is already bound to a child in this registry.
    NameAlreadyRegistered {
        /// The requested name.
        name: String,
        /// Type name of the child currently bound to the name.
        type_name: &'static str,
    },
    /// No child is bound to the name.
    NotRegistered(String),
}

impl RegistryError {
    /// Returns the name the failed operation was called with, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            RegistryError::EmptyName => None,
            RegistryError::NameAlreadyRegistered { name, .. } => Some(name),
            RegistryError::NotRegistered(name) => Some(name),
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyName => write!(f, "child name cannot be empty"),
            RegistryError::NameAlreadyRegistered { name, type_name } => {
                write!(f, "name '{name}' is already registered to {type_name}")
            }
            RegistryError::NotRegistered(name) => write!(f, "no child registered as '{name}'"),
        }
    }
}

impl error::Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_child() {
        let err = RegistryError::NameAlreadyRegistered {
            name: "Apple".to_string(),
            type_name: "fruit::Apple",
        };
        assert_eq!(
            err.to_string(),
            "name 'Apple' is already registered to fruit::Apple"
        );
        assert_eq!(err.name(), Some("Apple"));

        assert_eq!(RegistryError::EmptyName.name(), None);
        assert_eq!(
            RegistryError::NotRegistered("Cherry".to_string()).to_string(),
            "no child registered as 'Cherry'"
        );
    }
}
