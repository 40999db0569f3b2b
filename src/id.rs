//! String identifiers for scenarios and materials, and lookups of IDs in collections.
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};

/// Bounds shared by every ID type
pub trait IDLike:
    Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}
impl<T> IDLike for T where
    T: Eq + std::hash::Hash + std::borrow::Borrow<str> + Clone + std::fmt::Display + From<String>
{
}

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            Debug,
            serde::Serialize,
        )]
        /// A cheaply cloned string identifier
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

#[cfg(test)]
define_id_type!(GenericID);

/// Something identified by an ID
pub trait HasID<ID: IDLike> {
    /// The value's ID
    fn get_id(&self) -> &ID;
}

/// Implement [`HasID`] for a type whose `id` field holds the ID
macro_rules! define_id_getter {
    ($t:ty, $id_ty:ty) => {
        impl crate::id::HasID<$id_ty> for $t {
            fn get_id(&self) -> &$id_ty {
                &self.id
            }
        }
    };
}
pub(crate) use define_id_getter;

/// A collection which IDs read from input files are checked against
pub trait IDCollection<ID: IDLike> {
    /// Look up `id`, returning the collection's copy of it so the string is shared.
    ///
    /// Fails if `id` is not in the collection.
    fn get_id(&self, id: &str) -> Result<ID>;
}

impl<ID: IDLike> IDCollection<ID> for IndexSet<ID> {
    fn get_id(&self, id: &str) -> Result<ID> {
        let found = self
            .get(id)
            .with_context(|| format!("Unknown ID {id} found"))?;
        Ok(found.clone())
    }
}

impl<ID: IDLike, V> IDCollection<ID> for IndexMap<ID, V> {
    fn get_id(&self, id: &str) -> Result<ID> {
        let (found, _) = self
            .get_key_value(id)
            .with_context(|| format!("Unknown ID {id} found"))?;
        Ok(found.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use indexmap::indexset;

    #[test]
    fn test_get_id() {
        let ids: IndexSet<GenericID> = indexset! {"a".into(), "b".into()};
        assert_eq!(ids.get_id("b").unwrap(), GenericID::new("b"));
        assert_error!(ids.get_id("c"), "Unknown ID c found");
    }

    #[test]
    fn test_get_id_from_map() {
        let map: IndexMap<GenericID, u32> = [("a".into(), 1)].into_iter().collect();
        assert_eq!(map.get_id("a").unwrap(), GenericID::new("a"));
        assert!(map.get_id("b").is_err());
    }
}
