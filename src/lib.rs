#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

// Needed for Vec/Arc/Rc/String.
extern crate alloc;

pub mod buffer;
pub mod builder;
pub mod endian;
pub mod error;
pub mod key_order;
pub mod navigator;
pub mod packet;
pub mod raw_type;
pub mod size_estimate;
pub mod transition;
pub mod tree;
pub mod validator;
pub mod vtable;
pub mod write;

#[cfg(feature = "json")]
pub mod json;

pub use buffer::{Atomic, FinalizedBuffer, NonAtomic, RefCount};
pub use builder::{build_object, merge_buffers, project_keys};
pub use error::{DartError, ValidationFailure};
pub use navigator::{ArrayIter, ObjectIter, Value};
pub use packet::Packet;
pub use raw_type::{LogicalType, RawType};
pub use transition::{finalize, lift};
pub use tree::Tree;

#[cfg(feature = "json")]
pub use json::{from_json_str, json_from_tree, to_json_value, tree_from_json};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    /// S2: sorted key order, correct raw-type selection, and navigator access all agree.
    #[test]
    fn scenario_s2_sorted_object_with_mixed_types() {
        let tree = Tree::Object(vec![
            ("a".to_string(), Tree::Integer(1)),
            ("b".to_string(), Tree::Bool(true)),
            ("c".to_string(), Tree::Null),
            ("d".to_string(), Tree::Str("hi".to_string())),
        ]);
        let buffer: FinalizedBuffer<Atomic> = finalize(&tree).unwrap();
        let root = Value::from_buffer(&buffer);
        assert_eq!(root.at("a").unwrap().as_i64().unwrap(), 1);
        assert_eq!(root.at("a").unwrap().raw_type(), RawType::ShortInteger);
        assert_eq!(root.at("d").unwrap().as_str().unwrap(), "hi");
        assert_eq!(root.at("d").unwrap().raw_type(), RawType::SmallString);

        let keys: alloc::vec::Vec<_> = root.iter_object().unwrap().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
    }

    /// S6: a big string gets a u32 length field and round-trips through the navigator.
    #[test]
    fn scenario_s6_big_string_round_trips() {
        let long = "x".repeat(65_536);
        let tree = Tree::Str(long.clone());
        let buffer: FinalizedBuffer<Atomic> = finalize(&tree).unwrap();
        assert_eq!(buffer.root_type(), RawType::BigString);
        let root = Value::from_buffer(&buffer);
        assert_eq!(root.as_str().unwrap().len(), 65_536);
    }
}
