// src/packet.rs
//! The packet (A2): a tagged union able to hold either representation, with explicit
//! transitions between them (§1). Never converts implicitly -- callers call `finalize`/`lift`
//! themselves, matching the core's "only the interfaces the core consumes... are specified"
//! stance toward the tree form.

use crate::buffer::{Atomic, FinalizedBuffer, RefCount};
use crate::error::DartError;
use crate::navigator::Value;
use crate::transition::{self, tree_eq_value};
use crate::tree::Tree;

/// Either a mutable tree or a finalized buffer, never both at once.
#[derive(Debug, Clone)]
pub enum Packet<R: RefCount = Atomic> {
    Tree(Tree),
    Buffer(FinalizedBuffer<R>),
}

impl<R: RefCount> Packet<R> {
    pub fn is_tree(&self) -> bool {
        matches!(self, Packet::Tree(_))
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self, Packet::Buffer(_))
    }

    /// Transitions a tree packet to a buffer packet. A buffer packet passes through unchanged.
    pub fn finalize(self) -> Result<Packet<R>, DartError> {
        match self {
            Packet::Tree(tree) => Ok(Packet::Buffer(transition::finalize(&tree)?)),
            buffer @ Packet::Buffer(_) => Ok(buffer),
        }
    }

    /// Transitions a buffer packet to a tree packet. A tree packet passes through unchanged.
    pub fn lift(self) -> Packet<R> {
        match self {
            Packet::Buffer(buffer) => Packet::Tree(transition::lift(&buffer)),
            tree @ Packet::Tree(_) => tree,
        }
    }

    /// Logical equality regardless of which representation either side is currently in.
    pub fn logical_eq(&self, other: &Packet<R>) -> bool {
        match (self, other) {
            (Packet::Tree(a), Packet::Tree(b)) => a == b,
            (Packet::Buffer(a), Packet::Buffer(b)) => a == b,
            (Packet::Tree(tree), Packet::Buffer(buffer)) | (Packet::Buffer(buffer), Packet::Tree(tree)) => {
                tree_eq_value(tree, &Value::from_buffer(buffer))
            }
        }
    }
}

impl<R: RefCount> From<Tree> for Packet<R> {
    fn from(tree: Tree) -> Self {
        Packet::Tree(tree)
    }
}

impl<R: RefCount> From<FinalizedBuffer<R>> for Packet<R> {
    fn from(buffer: FinalizedBuffer<R>) -> Self {
        Packet::Buffer(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn finalize_then_lift_round_trips_under_logical_eq() {
        let original: Packet<Atomic> = Packet::Tree(Tree::Object(vec![("a".to_string(), Tree::Integer(1))]));
        let finalized = original.clone().finalize().unwrap();
        assert!(finalized.is_buffer());
        assert!(original.logical_eq(&finalized));
        let lifted = finalized.lift();
        assert!(lifted.is_tree());
        assert!(original.logical_eq(&lifted));
    }

    #[test]
    fn buffer_passes_through_finalize_unchanged() {
        let tree: Packet<Atomic> = Packet::Tree(Tree::object());
        let buffer = tree.finalize().unwrap();
        let still_buffer = buffer.clone().finalize().unwrap();
        assert!(still_buffer.is_buffer());
    }
}
