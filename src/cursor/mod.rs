//! Cursor codec
//!
//! A cursor is the string form of the identity of the last record on a
//! page. Decoding it yields a strictly-less-than predicate on the same
//! identity column, to be conjoined with the rest of the query. Cursors are
//! only meaningful for the collection and ordering that produced them.

mod codec;

pub use codec::{CursorCodec, CursorKind, CursorPredicate, CursorValue};
