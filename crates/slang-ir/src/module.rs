//! The IR module: builder methods and the traversal surface the bytecode
//! core consumes.
//!
//! Invariants:
//! - `globals` lists global instructions in declaration order.
//! - A function's children are its blocks in source order; a block's
//!   children are its instructions, with parameters at the head.
//! - Instruction ids are module-local and never reused.

use std::collections::HashMap;

use slang_bytecode::Opcode;

use crate::inst::{BlockId, Decoration, InstData, InstId, Payload};
use crate::types::TypeId;

#[derive(Debug, Default)]
pub struct Module {
    insts: Vec<InstData>,
    globals: Vec<InstId>,
    decorations: HashMap<InstId, Vec<Decoration>>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, data: InstData) -> InstId {
        let id = InstId(self.insts.len() as u32);
        self.insts.push(data);
        id
    }

    fn push_global(&mut self, data: InstData) -> InstId {
        let id = self.push(data);
        self.globals.push(id);
        id
    }

    /// Declare a function of the given function type.
    pub fn func(&mut self, ty: TypeId) -> InstId {
        self.push_global(InstData::new(Opcode::Func, Some(ty)))
    }

    /// Declare a global variable.
    pub fn global_var(&mut self, ty: TypeId) -> InstId {
        self.push_global(InstData::new(Opcode::GlobalVar, Some(ty)))
    }

    /// Declare a global constant.
    pub fn global_constant(&mut self, ty: TypeId) -> InstId {
        self.push_global(InstData::new(Opcode::GlobalConstant, Some(ty)))
    }

    /// Create a module-scope integer literal.
    pub fn int_lit(&mut self, ty: TypeId, value: i64) -> InstId {
        let mut data = InstData::new(Opcode::IntLit, Some(ty));
        data.payload = Payload::Int(value);
        self.push_global(data)
    }

    /// Create a module-scope floating-point literal.
    pub fn float_lit(&mut self, ty: TypeId, value: f64) -> InstId {
        let mut data = InstData::new(Opcode::FloatLit, Some(ty));
        data.payload = Payload::Float(value);
        self.push_global(data)
    }

    /// Create a module-scope boolean literal.
    pub fn bool_lit(&mut self, ty: TypeId, value: bool) -> InstId {
        let mut data = InstData::new(Opcode::BoolLit, Some(ty));
        data.payload = Payload::Bool(value);
        self.push_global(data)
    }

    /// Append a basic block to a function.
    pub fn block(&mut self, func: InstId) -> BlockId {
        assert_eq!(self.op(func), Opcode::Func, "blocks belong to functions");
        let block = self.push(InstData::new(Opcode::Block, None));
        self.insts[func.index()].children.push(block);
        BlockId(block)
    }

    /// Append a block parameter. Parameters must precede every other
    /// instruction of the block.
    pub fn param(&mut self, block: BlockId, ty: TypeId) -> InstId {
        let head = &self.insts[block.inst().index()].children;
        assert!(
            head.iter().all(|&i| self.insts[i.index()].op == Opcode::Param),
            "parameters must appear at the head of a block"
        );
        self.append(block, InstData::new(Opcode::Param, Some(ty)))
    }

    /// Append an ordinary instruction to a block.
    pub fn inst(
        &mut self,
        block: BlockId,
        op: Opcode,
        ty: Option<TypeId>,
        operands: &[InstId],
    ) -> InstId {
        let mut data = InstData::new(op, ty);
        data.operands = operands.to_vec();
        self.append(block, data)
    }

    /// Append an integer literal inside a block.
    pub fn int_lit_in(&mut self, block: BlockId, ty: TypeId, value: i64) -> InstId {
        let mut data = InstData::new(Opcode::IntLit, Some(ty));
        data.payload = Payload::Int(value);
        self.append(block, data)
    }

    /// Append a floating-point literal inside a block.
    pub fn float_lit_in(&mut self, block: BlockId, ty: TypeId, value: f64) -> InstId {
        let mut data = InstData::new(Opcode::FloatLit, Some(ty));
        data.payload = Payload::Float(value);
        self.append(block, data)
    }

    /// Append a boolean literal inside a block.
    pub fn bool_lit_in(&mut self, block: BlockId, ty: TypeId, value: bool) -> InstId {
        let mut data = InstData::new(Opcode::BoolLit, Some(ty));
        data.payload = Payload::Bool(value);
        self.append(block, data)
    }

    fn append(&mut self, block: BlockId, data: InstData) -> InstId {
        assert_eq!(
            self.insts[block.inst().index()].op,
            Opcode::Block,
            "instructions belong to blocks"
        );
        let id = self.push(data);
        self.insts[block.inst().index()].children.push(id);
        id
    }

    /// Attach a decoration.
    pub fn decorate(&mut self, inst: InstId, decoration: Decoration) {
        self.decorations.entry(inst).or_default().push(decoration);
    }

    // Traversal surface.

    /// Global instructions in declaration order.
    pub fn globals(&self) -> &[InstId] {
        &self.globals
    }

    pub fn op(&self, inst: InstId) -> Opcode {
        self.insts[inst.index()].op
    }

    pub fn ty(&self, inst: InstId) -> Option<TypeId> {
        self.insts[inst.index()].ty
    }

    pub fn operands(&self, inst: InstId) -> &[InstId] {
        &self.insts[inst.index()].operands
    }

    pub fn operand(&self, inst: InstId, index: usize) -> InstId {
        self.insts[inst.index()].operands[index]
    }

    pub fn payload(&self, inst: InstId) -> &Payload {
        &self.insts[inst.index()].payload
    }

    /// Blocks of a function, in source order.
    pub fn blocks(&self, func: InstId) -> impl Iterator<Item = BlockId> + '_ {
        self.insts[func.index()].children.iter().map(|&i| BlockId(i))
    }

    /// Instructions of a block, parameters first.
    pub fn block_insts(&self, block: BlockId) -> &[InstId] {
        &self.insts[block.inst().index()].children
    }

    pub fn decorations(&self, inst: InstId) -> &[Decoration] {
        self.decorations.get(&inst).map_or(&[], Vec::as_slice)
    }

    /// Look up a decoration: the first one, in attachment order, for which
    /// `pick` returns a value.
    pub fn find_decoration<'m, T>(
        &'m self,
        inst: InstId,
        pick: impl FnMut(&'m Decoration) -> Option<T>,
    ) -> Option<T> {
        self.decorations(inst).iter().find_map(pick)
    }
}
