//! Generation contexts.
//!
//! All container-wide mutable state lives in one [`SharedContext`]: the
//! arena, the ordered type table, and the pending constant pool. A
//! [`ModuleContext`] layers the per-module symbol bindings on top; function
//! encoding adds a third, per-function layer (see `func`). Identifier
//! assignment only ever walks IR containers in their exposed order, so the
//! same input produces byte-identical output.

use std::collections::HashMap;

use indexmap::IndexMap;

use slang_bytecode::{BcConst, BcType, ByteArena, Handle, Opcode};
use slang_ir::{InstId, Module, Payload, TypeId, TypeStore};

use crate::error::GenError;

/// A literal waiting to be written into the module constant pool.
///
/// The value is copied out of the IR at first encounter so that pool
/// emission does not need to reach back into the source module.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingConstant {
    pub op: Opcode,
    pub ty: Option<TypeId>,
    pub value: i64,
}

/// Container-wide generation state.
pub(crate) struct SharedContext<'a> {
    pub types: &'a TypeStore,
    pub arena: ByteArena,
    /// Emitted type records, keyed by canonical type. Insertion order is
    /// the type table order; an entry's index is its type id.
    pub type_table: IndexMap<Option<TypeId>, Handle<BcType>>,
    /// Pooled literals in first-encounter order.
    pub constants: Vec<PendingConstant>,
}

impl<'a> SharedContext<'a> {
    pub fn new(types: &'a TypeStore) -> Self {
        Self {
            types,
            arena: ByteArena::new(),
            type_table: IndexMap::new(),
            constants: Vec::new(),
        }
    }
}

/// Per-module generation state: the value-to-global bindings established by
/// the symbol pre-pass and grown by the constant pool.
pub(crate) struct ModuleContext<'a, 's> {
    pub shared: &'s mut SharedContext<'a>,
    pub ir: &'a Module,
    pub value_to_global: HashMap<InstId, BcConst>,
}

impl ModuleContext<'_, '_> {
    /// Resolve a module-scope value to its global reference, pooling an
    /// integer literal on first encounter. Anything else without an
    /// existing binding has no id.
    pub fn resolve_global(&mut self, value: InstId) -> Result<BcConst, GenError> {
        if let Some(&bound) = self.value_to_global.get(&value) {
            return Ok(bound);
        }

        match self.ir.op(value) {
            Opcode::IntLit => {
                let &Payload::Int(int_value) = self.ir.payload(value) else {
                    return Err(GenError::MalformedLiteral { op: Opcode::IntLit });
                };
                let id = self.shared.constants.len() as u32;
                self.shared.constants.push(PendingConstant {
                    op: Opcode::IntLit,
                    ty: self.ir.ty(value),
                    value: int_value,
                });
                let constant = BcConst::constant(id);
                self.value_to_global.insert(value, constant);
                Ok(constant)
            }
            op => Err(GenError::NoIdForInst { op }),
        }
    }
}
