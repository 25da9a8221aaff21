//! In-memory IR consumed by the bytecode lowering core.
//!
//! This crate is the data model and traversal surface only: hash-consed
//! structural types, id-indexed instruction storage, and builder methods.
//! Semantic analysis and lowering from source live upstream.

pub mod inst;
pub mod module;
pub mod types;


pub use inst::{BlockId, Decoration, InstId, Payload};
pub use module::Module;
pub use types::{BaseType, TypeDesc, TypeId, TypeStore};

// The IR and the instruction stream share one opcode numbering.
pub use slang_bytecode::Opcode;
