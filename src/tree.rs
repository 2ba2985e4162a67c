// src/tree.rs
//! The mutable tree (A1): a heap-resident, owned document used for building and editing before
//! `finalize` produces an immutable, zero-copy buffer (§3A). Insertion order is preserved;
//! sorting under the object comparator happens only at finalize time, never here.

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::DartError;

/// An owned, editable document node. Mirrors the seven logical types (§3) with ordinary heap
/// collections; no alignment, vtable, or byte-layout concerns apply until finalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Null,
    Bool(bool),
    Integer(i64),
    Decimal(f64),
    Str(String),
    Array(Vec<Tree>),
    Object(Vec<(String, Tree)>),
}

impl Tree {
    pub fn object() -> Self {
        Tree::Object(Vec::new())
    }

    pub fn array() -> Self {
        Tree::Array(Vec::new())
    }

    /// Appends a key/value pair. Does not check for duplicate keys; duplicates become an error
    /// only at `finalize` time (§4.7, §9), since a tree in progress may legitimately overwrite
    /// or never finalize at all. Errors with `TypeMismatch` if `self` is not an object.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Tree>) -> Result<&mut Self, DartError> {
        match self {
            Tree::Object(pairs) => {
                pairs.push((key.into(), value.into()));
                Ok(self)
            }
            _ => Err(DartError::TypeMismatch),
        }
    }

    /// Appends an element. Errors with `TypeMismatch` if `self` is not an array.
    pub fn push(&mut self, value: impl Into<Tree>) -> Result<&mut Self, DartError> {
        match self {
            Tree::Array(items) => {
                items.push(value.into());
                Ok(self)
            }
            _ => Err(DartError::TypeMismatch),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tree::Null)
    }
}

impl From<bool> for Tree {
    fn from(v: bool) -> Self {
        Tree::Bool(v)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for Tree {
            fn from(v: $t) -> Self {
                Tree::Integer(v as i64)
            }
        })*
    };
}
impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Tree {
    fn from(v: f32) -> Self {
        Tree::Decimal(v as f64)
    }
}

impl From<f64> for Tree {
    fn from(v: f64) -> Self {
        Tree::Decimal(v)
    }
}

impl From<&str> for Tree {
    fn from(v: &str) -> Self {
        Tree::Str(v.to_owned())
    }
}

impl From<String> for Tree {
    fn from(v: String) -> Self {
        Tree::Str(v)
    }
}

impl<T: Into<Tree>> From<Option<T>> for Tree {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Tree::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn builder_api_inserts_and_pushes() {
        let mut obj = Tree::object();
        obj.insert("a", 1i64).unwrap();
        obj.insert("b", "two").unwrap();
        obj.insert("c", Tree::array()).unwrap();
        assert_eq!(
            obj,
            Tree::Object(vec![
                ("a".into(), Tree::Integer(1)),
                ("b".into(), Tree::Str("two".into())),
                ("c".into(), Tree::Array(vec![])),
            ])
        );
    }

    #[test]
    fn insert_on_non_object_is_a_type_mismatch() {
        let mut arr = Tree::array();
        assert_eq!(arr.insert("a", 1i64), Err(DartError::TypeMismatch));
    }

    #[test]
    fn push_on_non_array_is_a_type_mismatch() {
        let mut obj = Tree::object();
        assert_eq!(obj.push(1i64), Err(DartError::TypeMismatch));
    }

    #[test]
    fn option_none_becomes_null() {
        let t: Tree = Option::<i64>::None.into();
        assert_eq!(t, Tree::Null);
        let t: Tree = Some(5i64).into();
        assert_eq!(t, Tree::Integer(5));
    }
}
