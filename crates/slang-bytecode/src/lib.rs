//! Bytecode container ("BC") format.
//!
//! This crate contains:
//! - the append-only aligned byte arena and typed offset handles used while
//!   assembling a container (`arena`)
//! - the `repr(C)` wire records and the shared opcode numbering (`records`,
//!   `opcode`)
//! - the variable-length integer codec for instruction streams (`varint`)
//! - read-side views that traverse a finished container in place
//!   (`container`) and a human-readable dump (`dump`)
//!
//! The container is position independent: records refer to each other with
//! arena-relative offsets at the host's pointer width, so downstream tooling
//! can map the bytes and chase references without parsing.

pub mod arena;
pub mod container;
pub mod dump;
pub mod opcode;
pub mod records;
pub mod varint;


pub use arena::{ArenaError, ByteArena, Handle};
pub use container::{
    Container, ContainerError, ConstantView, FuncView, ModuleView, SymbolView, TypeView,
};
pub use dump::dump;
pub use opcode::{Opcode, TypeOp};
pub use records::{
    BcBlock, BcConst, BcConstFlavor, BcConstant, BcFunc, BcHeader, BcModule, BcPtr, BcReg,
    BcSymbol, BcType, MAGIC, Record, VERSION,
};
pub use varint::{read_svar, read_uvar, write_svar, write_uvar};
