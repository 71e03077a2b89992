//! Mutable builder layer.
//!
//! Every immutable graph has a mutable counterpart that owns it:
//! [`MutableModel`], [`MutableMotion`] and [`MutableDocument`] wrap
//! either a freshly created graph or a parsed one moved in for in-place
//! editing, expose ordered insert/remove operations, and serialize the
//! whole graph back to a [`MutableBuffer`](crate::util::MutableBuffer).
//!
//! Attachment is ownership transfer: inserting an entity moves it into
//! its container, removing it moves it back out. A detached entity is
//! dropped like any other value, so the destroy-after-insert double-free
//! hazard of handle-based designs cannot be expressed.

mod document;
mod model;
mod motion;

pub use document::MutableDocument;
pub use model::MutableModel;
pub use motion::MutableMotion;

use crate::util::{Result, Status};

/// Resolve an insertion index: -1 appends, anything else must land in
/// `[0, len]`.
pub(crate) fn insertion_position(index: i32, len: usize) -> Result<usize> {
    if index < 0 {
        Ok(len)
    } else if index as usize <= len {
        Ok(index as usize)
    } else {
        Err(Status::InsertionIndexOutOfBounds { index, count: len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_position() {
        assert_eq!(insertion_position(-1, 3).unwrap(), 3);
        assert_eq!(insertion_position(0, 3).unwrap(), 0);
        assert_eq!(insertion_position(3, 3).unwrap(), 3);
        assert!(matches!(
            insertion_position(4, 3),
            Err(Status::InsertionIndexOutOfBounds { index: 4, count: 3 })
        ));
    }
}
