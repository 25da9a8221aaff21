//! The function encoder.
//!
//! Three passes per function, in an order that makes forward references
//! resolve without patching: enumerate blocks (block ids may be referenced
//! before the block is reached), then count and populate registers, then
//! emit code. Block ids and register ids deliberately share a numeric
//! space: no operand position admits both.

use std::collections::HashMap;

use slang_bytecode::{BcBlock, BcConst, BcFunc, BcReg, Handle, Opcode, write_svar, write_uvar};
use slang_ir::{InstId, Module, TypeId, TypeStore};

use crate::context::ModuleContext;
use crate::error::GenError;
use crate::inst::encode_inst;

/// Per-function encoding state: the local byte buffer, the local-id map,
/// and the imported-constants list.
pub(crate) struct FuncContext<'a, 's, 'm> {
    pub mcx: &'m mut ModuleContext<'a, 's>,
    pub code: Vec<u8>,
    pub local_ids: HashMap<InstId, i64>,
    /// Global references this body uses, in first-use order. Entry `k` is
    /// addressed by local id `!k`.
    pub remapped: Vec<BcConst>,
}

impl<'a> FuncContext<'a, '_, '_> {
    pub fn ir(&self) -> &'a Module {
        self.mcx.ir
    }

    pub fn types(&self) -> &'a TypeStore {
        self.mcx.shared.types
    }

    pub fn uvar(&mut self, value: u64) {
        write_uvar(&mut self.code, value);
    }

    pub fn svar(&mut self, value: i64) {
        write_svar(&mut self.code, value);
    }

    /// An instruction produces a value iff its data type is present and is
    /// not `Void`.
    pub fn has_result(&self, inst: InstId) -> bool {
        match self.ir().ty(inst) {
            None => false,
            Some(ty) => !self.types().is_void(ty),
        }
    }

    /// The local id of `value`: a register or block id when local, or a
    /// fresh (or reused) imported-constant id `!k` otherwise.
    pub fn local_id(&mut self, value: InstId) -> Result<i64, GenError> {
        if let Some(&id) = self.local_ids.get(&value) {
            return Ok(id);
        }

        let constant = self.mcx.resolve_global(value)?;
        let index = self.remapped.len() as i64;
        self.remapped.push(constant);
        let id = !index;
        self.local_ids.insert(value, id);
        Ok(id)
    }

    /// Encode a value operand as its signed local id.
    pub fn operand(&mut self, value: InstId) -> Result<(), GenError> {
        let id = self.local_id(value)?;
        self.svar(id);
        Ok(())
    }

    /// Encode a type operand as its unsigned type id. Type ids never alias
    /// with value ids, so no sign bit is spent on them.
    pub fn type_operand(&mut self, ty: Option<TypeId>) -> Result<(), GenError> {
        let index = self.mcx.shared.type_index(ty)?;
        self.uvar(u64::from(index));
        Ok(())
    }
}

/// Encode one IR function into a `BcFunc` record.
pub(crate) fn encode_func(
    mcx: &mut ModuleContext<'_, '_>,
    func: InstId,
) -> Result<Handle<BcFunc>, GenError> {
    let ir = mcx.ir;

    let bc_func = mcx.shared.arena.alloc::<BcFunc>()?;
    let type_id = mcx.shared.type_index(ir.ty(func))?;
    {
        let record = mcx.shared.arena.get_mut(bc_func);
        record.symbol.op = Opcode::Func as u32;
        record.symbol.type_id = type_id;
    }

    let mut cx = FuncContext {
        mcx,
        code: Vec::new(),
        local_ids: HashMap::new(),
        remapped: Vec::new(),
    };

    // Pass 1: enumerate blocks, so that branches may reference blocks that
    // have not been visited yet.
    let blocks: Vec<_> = ir.blocks(func).collect();
    for (index, &block) in blocks.iter().enumerate() {
        cx.local_ids.insert(block.inst(), index as i64);
    }

    let bc_blocks = cx.mcx.shared.arena.alloc_array::<BcBlock>(blocks.len())?;
    {
        let record = cx.mcx.shared.arena.get_mut(bc_func);
        record.block_count = blocks.len() as u32;
        record.blocks = bc_blocks.to_ptr();
    }

    // Pass 2, counting half: how many registers each block needs. A `var`
    // takes two slots (the pointer value, then the pointee storage); any
    // other instruction with a result takes one.
    let mut reg_count = 0usize;
    for (index, &block) in blocks.iter().enumerate() {
        let mut param_count = 0u32;
        for &inst in ir.block_insts(block) {
            match ir.op(inst) {
                Opcode::Param => {
                    reg_count += 1;
                    param_count += 1;
                }
                Opcode::Var => reg_count += 2,
                _ => {
                    if cx.has_result(inst) {
                        reg_count += 1;
                    }
                }
            }
        }
        cx.mcx.shared.arena.get_mut(bc_blocks.add(index)).param_count = param_count;
    }

    let bc_regs = cx.mcx.shared.arena.alloc_array::<BcReg>(reg_count)?;
    {
        let record = cx.mcx.shared.arena.get_mut(bc_func);
        record.reg_count = reg_count as u32;
        record.regs = bc_regs.to_ptr();
    }

    // Pass 2, filling half: assign local ids and fill register records.
    // Parameters sit at the head of each block, so a block's parameters are
    // always the first registers after its `params` pointer.
    let mut reg_counter = 0usize;
    for (index, &block) in blocks.iter().enumerate() {
        cx.mcx.shared.arena.get_mut(bc_blocks.add(index)).params =
            bc_regs.add(reg_counter).to_ptr();

        for &inst in ir.block_insts(block) {
            match ir.op(inst) {
                Opcode::Var => {
                    let local = reg_counter;
                    reg_counter += 2;
                    cx.local_ids.insert(inst, local as i64);

                    let ptr_ty = cx.mcx.shared.type_index(ir.ty(inst))?;
                    let pointee = ir
                        .ty(inst)
                        .and_then(|ty| cx.types().pointee(ty))
                        .ok_or(GenError::VarWithoutPointerType)?;
                    let pointee_ty = cx.mcx.shared.type_index(Some(pointee))?;

                    {
                        let reg = cx.mcx.shared.arena.get_mut(bc_regs.add(local));
                        reg.op = Opcode::Var as u32;
                        reg.type_id = ptr_ty;
                        reg.previous_var_index_plus_one = local as u32;
                    }
                    {
                        let reg = cx.mcx.shared.arena.get_mut(bc_regs.add(local + 1));
                        reg.op = Opcode::Var as u32;
                        reg.type_id = pointee_ty;
                        reg.previous_var_index_plus_one = (local + 1) as u32;
                    }
                }
                op => {
                    if cx.has_result(inst) {
                        let local = reg_counter;
                        reg_counter += 1;
                        cx.local_ids.insert(inst, local as i64);

                        let reg_ty = cx.mcx.shared.type_index(ir.ty(inst))?;
                        let reg = cx.mcx.shared.arena.get_mut(bc_regs.add(local));
                        reg.op = op as u32;
                        reg.type_id = reg_ty;
                        reg.previous_var_index_plus_one = local as u32;
                    }
                }
            }
        }
    }
    debug_assert_eq!(reg_counter, reg_count);

    // Pass 3: emit each block's instruction stream into the per-function
    // buffer, recording where each block starts.
    let mut block_offsets = Vec::with_capacity(blocks.len());
    for &block in &blocks {
        block_offsets.push(cx.code.len());
        for &inst in ir.block_insts(block) {
            // Parameters emit nothing; they were realized as registers.
            if ir.op(inst) != Opcode::Param {
                encode_inst(&mut cx, inst)?;
            }
        }
    }

    // Transfer the buffered code into the arena as one array and point the
    // blocks at their slices of it.
    let code = cx.mcx.shared.arena.alloc_array::<u8>(cx.code.len())?;
    cx.mcx.shared.arena.write_bytes(code.offset(), &cx.code);
    for (index, &offset) in block_offsets.iter().enumerate() {
        cx.mcx.shared.arena.get_mut(bc_blocks.add(index)).code = code.add(offset).to_ptr();
    }

    // The imported-constants table, addressed by the `!k` local ids handed
    // out during emission.
    let bc_consts = cx.mcx.shared.arena.alloc_array::<BcConst>(cx.remapped.len())?;
    cx.mcx
        .shared
        .arena
        .slice_mut(bc_consts, cx.remapped.len())
        .copy_from_slice(&cx.remapped);
    {
        let record = cx.mcx.shared.arena.get_mut(bc_func);
        record.const_count = cx.remapped.len() as u32;
        record.consts = bc_consts.to_ptr();
    }

    Ok(bc_func)
}
