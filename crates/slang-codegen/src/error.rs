//! Generation errors. All of these are fatal to the current `generate`
//! call: nothing is retried, and partial arena contents are dropped with
//! the context.

use slang_bytecode::{ArenaError, Opcode};

#[derive(Debug, Clone, thiserror::Error)]
pub enum GenError {
    /// A literal instruction whose payload does not match its opcode.
    #[error("{op:?} instruction carries no matching literal payload")]
    MalformedLiteral { op: Opcode },

    /// A `var` instruction whose data type is not a pointer type.
    #[error("var instruction does not have pointer type")]
    VarWithoutPointerType,

    /// An operand that resolves to neither a local id, a constant-pool
    /// entry, nor a global symbol.
    #[error("no id for instruction (op {op:?})")]
    NoIdForInst { op: Opcode },

    /// The arena could not grow.
    #[error("arena allocation failed: {0}")]
    Arena(#[from] ArenaError),
}
