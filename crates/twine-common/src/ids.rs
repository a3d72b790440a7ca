//! Branded integer handles for the compiler's stores.
//!
//! Every cross-store reference in the compiler is a `u32` index wrapped in a
//! store-specific newtype. A `TokenId` is never valid in the node store, a
//! `NodeId` never valid in the symbol store, and so on; the type system
//! enforces what would otherwise be a commenting convention. Handles are
//! stable append-only indices: never reused, never reshuffled.

use serde::Serialize;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Wrap a raw store index.
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// The raw index into the owning store.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id! {
    /// Index into the token store.
    TokenId
}
define_id! {
    /// Index into the postorder parse-node store.
    NodeId
}
define_id! {
    /// Index into the string interner.
    StringId
}
define_id! {
    /// Index into the instruction store.
    InstId
}
define_id! {
    /// Index into the symbol store.
    SymbolId
}
define_id! {
    /// Index into the type store.
    TypeId
}
define_id! {
    /// Index into the function store.
    FuncId
}
define_id! {
    /// Index into the float constant pool.
    FloatId
}
