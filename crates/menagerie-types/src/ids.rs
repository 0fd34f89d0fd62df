//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity the behavior layer reasons about has a strongly-typed ID so
//! that a tree can never be passed where a pet is expected. All IDs use UUID
//! v7 (time-ordered), which keeps `BTreeMap` iteration roughly in creation order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a pet.
    PetId
}

define_id! {
    /// Unique identifier for a climbable tree.
    TreeId
}

define_id! {
    /// Unique identifier for a consumable food item.
    FoodItemId
}

define_id! {
    /// Unique identifier for a static feeding or sleeping area.
    AreaId
}

define_id! {
    /// Unique identifier for a two-pet interaction session.
    SessionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct() {
        let first = PetId::new();
        let second = PetId::new();
        assert_ne!(first, second);
        assert_ne!(first.into_inner(), Uuid::nil());
    }

    #[test]
    fn display_matches_uuid() {
        let id = TreeId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
