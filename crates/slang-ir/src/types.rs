//! Hash-consed structural types.
//!
//! The store deduplicates structurally identical types on interning, so a
//! [`TypeId`] *is* the canonical type: two ids are equal exactly when the
//! types are structurally equal. Consumers that need canonical-type
//! identity (the bytecode type interner, most importantly) can key on the
//! id directly.

use std::collections::HashMap;

/// Handle to an interned type. Equality is canonical-type equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Scalar base kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Void,
    Bool,
    Int,
    UInt,
    UInt64,
    Half,
    Float,
    Double,
}

/// Structure of a type.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TypeDesc {
    Basic(BaseType),
    Func {
        result: TypeId,
        /// Parameter types in source order.
        params: Vec<TypeId>,
    },
    Ptr(TypeId),
    StructuredBuffer(TypeId),
    RwStructuredBuffer(TypeId),
}

/// Interning store for types.
#[derive(Debug, Default)]
pub struct TypeStore {
    map: HashMap<TypeDesc, TypeId>,
    descs: Vec<TypeDesc>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a type, returning the existing id for a structurally equal
    /// one.
    pub fn intern(&mut self, desc: TypeDesc) -> TypeId {
        if let Some(&id) = self.map.get(&desc) {
            return id;
        }
        let id = TypeId(self.descs.len() as u32);
        self.descs.push(desc.clone());
        self.map.insert(desc, id);
        id
    }

    /// Look up a type without interning it.
    pub fn lookup(&self, desc: &TypeDesc) -> Option<TypeId> {
        self.map.get(desc).copied()
    }

    pub fn desc(&self, id: TypeId) -> &TypeDesc {
        &self.descs[id.index()]
    }

    pub fn len(&self) -> usize {
        self.descs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    pub fn basic(&mut self, base: BaseType) -> TypeId {
        self.intern(TypeDesc::Basic(base))
    }

    pub fn func_type(&mut self, result: TypeId, params: Vec<TypeId>) -> TypeId {
        self.intern(TypeDesc::Func { result, params })
    }

    pub fn ptr_type(&mut self, pointee: TypeId) -> TypeId {
        self.intern(TypeDesc::Ptr(pointee))
    }

    pub fn structured_buffer(&mut self, element: TypeId) -> TypeId {
        self.intern(TypeDesc::StructuredBuffer(element))
    }

    pub fn rw_structured_buffer(&mut self, element: TypeId) -> TypeId {
        self.intern(TypeDesc::RwStructuredBuffer(element))
    }

    /// The pointee of a pointer type.
    pub fn pointee(&self, id: TypeId) -> Option<TypeId> {
        match self.desc(id) {
            TypeDesc::Ptr(pointee) => Some(*pointee),
            _ => None,
        }
    }

    /// The element of a structured-buffer type.
    pub fn element(&self, id: TypeId) -> Option<TypeId> {
        match self.desc(id) {
            TypeDesc::StructuredBuffer(element) | TypeDesc::RwStructuredBuffer(element) => {
                Some(*element)
            }
            _ => None,
        }
    }

    pub fn is_void(&self, id: TypeId) -> bool {
        matches!(self.desc(id), TypeDesc::Basic(BaseType::Void))
    }
}
