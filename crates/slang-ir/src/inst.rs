//! Instruction storage.
//!
//! Every IR entity is an instruction: ordinary values, literals, blocks,
//! and the global declarations themselves. Blocks share the operand space
//! with values on purpose: branch targets travel through the same operand
//! slots as value references, and no operand position admits both.

use slang_bytecode::Opcode;

use crate::types::TypeId;

/// Handle to an instruction within one [`crate::Module`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct InstId(pub(crate) u32);

impl InstId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to a basic block. A block is itself an instruction; `inst()`
/// yields the id used when the block appears as a branch operand.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BlockId(pub(crate) InstId);

impl BlockId {
    pub fn inst(self) -> InstId {
        self.0
    }
}

/// Literal payload carried by constant instructions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Attached metadata. Symbol naming reads these; nothing else does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoration {
    /// The name of the high-level declaration this value was lowered from.
    DeclName(String),
    /// Reflection name of a parameter group, preferred over the
    /// declaration name when both are present.
    ReflectionName(String),
}

#[derive(Debug)]
pub(crate) struct InstData {
    pub op: Opcode,
    pub ty: Option<TypeId>,
    pub operands: Vec<InstId>,
    pub payload: Payload,
    /// Blocks of a function, or instructions of a block. Empty otherwise.
    pub children: Vec<InstId>,
}

impl InstData {
    pub fn new(op: Opcode, ty: Option<TypeId>) -> Self {
        Self {
            op,
            ty,
            operands: Vec::new(),
            payload: Payload::None,
            children: Vec::new(),
        }
    }
}
