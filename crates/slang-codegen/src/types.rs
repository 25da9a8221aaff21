//! The bytecode type interner.
//!
//! Emits one `BcType` record per canonical input type, lazily on first
//! reference. Argument types are interned recursively before the referring
//! record is allocated (result before params for function types), so type
//! ids follow completion order and always equal the record's index in the
//! ordered table.

use slang_bytecode::{BcPtr, BcType, Handle, TypeOp};
use slang_ir::{BaseType, TypeDesc, TypeId};

use crate::context::SharedContext;
use crate::error::GenError;

fn base_type_op(base: BaseType) -> TypeOp {
    match base {
        BaseType::Void => TypeOp::Void,
        BaseType::Bool => TypeOp::Bool,
        BaseType::Int => TypeOp::Int32,
        BaseType::UInt => TypeOp::UInt32,
        BaseType::UInt64 => TypeOp::UInt64,
        BaseType::Half => TypeOp::Float16,
        BaseType::Float => TypeOp::Float32,
        BaseType::Double => TypeOp::Float64,
    }
}

impl SharedContext<'_> {
    /// An absent data type means `Void`. Fold it onto the interned void
    /// type when the store has one, so the two spellings share a record.
    fn canonical(&self, ty: Option<TypeId>) -> Option<TypeId> {
        ty.or_else(|| self.types.lookup(&TypeDesc::Basic(BaseType::Void)))
    }

    /// Intern a type, returning the handle of its `BcType` record.
    pub fn bc_type(&mut self, ty: Option<TypeId>) -> Result<Handle<BcType>, GenError> {
        let key = self.canonical(ty);
        if let Some(&handle) = self.type_table.get(&key) {
            return Ok(handle);
        }

        let types = self.types;
        let (op, args) = match key {
            None => (TypeOp::Void, Vec::new()),
            Some(id) => match types.desc(id) {
                TypeDesc::Basic(base) => (base_type_op(*base), Vec::new()),
                TypeDesc::Func { result, params } => {
                    let mut args = Vec::with_capacity(params.len() + 1);
                    args.push(self.bc_type(Some(*result))?);
                    for &param in params {
                        args.push(self.bc_type(Some(param))?);
                    }
                    (TypeOp::Func, args)
                }
                TypeDesc::Ptr(pointee) => (TypeOp::Ptr, vec![self.bc_type(Some(*pointee))?]),
                TypeDesc::StructuredBuffer(element) => {
                    (TypeOp::StructuredBuffer, vec![self.bc_type(Some(*element))?])
                }
                TypeDesc::RwStructuredBuffer(element) => {
                    (TypeOp::RwStructuredBuffer, vec![self.bc_type(Some(*element))?])
                }
            },
        };

        // One allocation covers the record and its trailing argument slots.
        let size = size_of::<BcType>() + args.len() * size_of::<BcPtr<BcType>>();
        let offset = self.arena.allocate_raw(size, align_of::<BcType>())?;
        let handle = Handle::<BcType>::from_offset(offset);

        let id = self.type_table.len() as u32;
        {
            let record = self.arena.get_mut(handle);
            record.op = op as u32;
            record.arg_count = args.len() as u32;
            record.id = id;
        }
        let slots = self
            .arena
            .slice_mut(handle.add(1).cast::<BcPtr<BcType>>(), args.len());
        for (slot, arg) in slots.iter_mut().zip(&args) {
            *slot = arg.to_ptr();
        }

        self.type_table.insert(key, handle);
        Ok(handle)
    }

    /// Table index of the interned type (its type id).
    pub fn type_index(&mut self, ty: Option<TypeId>) -> Result<u32, GenError> {
        let handle = self.bc_type(ty)?;
        Ok(self.arena.get(handle).id)
    }
}
