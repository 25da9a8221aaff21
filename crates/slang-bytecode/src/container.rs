//! In-place traversal of a finished container.
//!
//! A [`Container`] copies the produced bytes into aligned storage, validates
//! the header, and then hands out views that chase `BcPtr` offsets without
//! any up-front parsing. Views bounds-check what they touch and nothing
//! more; semantic verification of the bytecode is out of scope.

use crate::arena::{Block, STORAGE_ALIGN, ZERO_BLOCK};
use crate::opcode::{Opcode, TypeOp};
use crate::records::{
    BcBlock, BcConst, BcConstant, BcFunc, BcHeader, BcModule, BcPtr, BcReg, BcSymbol, BcType,
    MAGIC, Record, VERSION,
};

/// Container load error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContainerError {
    #[error("container too small: {actual} bytes (minimum {})", size_of::<BcHeader>())]
    TooSmall { actual: usize },
    #[error("invalid magic: expected \"slang\\0bc\"")]
    InvalidMagic,
    #[error("unsupported version: {0} (expected {VERSION})")]
    UnsupportedVersion(u32),
}

/// An owned, aligned copy of a bytecode container.
pub struct Container {
    blocks: Vec<Block>,
    len: usize,
}

impl Container {
    /// Copy `bytes` into aligned storage and validate the header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ContainerError> {
        if bytes.len() < size_of::<BcHeader>() {
            return Err(ContainerError::TooSmall {
                actual: bytes.len(),
            });
        }

        let mut blocks = vec![ZERO_BLOCK; bytes.len().div_ceil(STORAGE_ALIGN)];
        for (block, chunk) in blocks.iter_mut().zip(bytes.chunks(STORAGE_ALIGN)) {
            block.0[..chunk.len()].copy_from_slice(chunk);
        }
        let container = Self {
            blocks,
            len: bytes.len(),
        };

        let header = container.header();
        if header.magic != MAGIC {
            return Err(ContainerError::InvalidMagic);
        }
        if header.version != VERSION {
            return Err(ContainerError::UnsupportedVersion(header.version));
        }
        Ok(container)
    }

    /// The container bytes.
    pub fn as_slice(&self) -> &[u8] {
        if self.blocks.is_empty() {
            return &[];
        }
        // SAFETY: Block is repr(C) over [u8; 64]; only `len` bytes, all
        // initialized in `from_bytes`, are exposed.
        unsafe { std::slice::from_raw_parts(self.blocks.as_ptr() as *const u8, self.len) }
    }

    fn check<T>(&self, offset: usize, count: usize) {
        let size = size_of::<T>() * count;
        assert!(
            offset + size <= self.len,
            "container ref out of bounds: {offset}+{size} > {}",
            self.len
        );
        assert!(
            offset % align_of::<T>() == 0,
            "container ref misaligned: offset {offset} for align {}",
            align_of::<T>()
        );
    }

    pub(crate) fn view<T: Record>(&self, offset: usize) -> &T {
        self.check::<T>(offset, 1);
        // SAFETY: bounds and alignment checked; Records accept any bits.
        unsafe { &*((self.blocks.as_ptr() as *const u8).add(offset) as *const T) }
    }

    pub(crate) fn view_slice<T: Record>(&self, offset: usize, count: usize) -> &[T] {
        self.check::<T>(offset, count);
        // SAFETY: as in `view`, for `count` consecutive records.
        unsafe {
            std::slice::from_raw_parts(
                (self.blocks.as_ptr() as *const u8).add(offset) as *const T,
                count,
            )
        }
    }

    /// Bytes from `offset` to the end of the container.
    pub(crate) fn bytes_at(&self, offset: usize) -> &[u8] {
        &self.as_slice()[offset..]
    }

    /// The header record at offset 0.
    pub fn header(&self) -> &BcHeader {
        self.view(0)
    }

    pub fn module_count(&self) -> usize {
        self.header().module_count as usize
    }

    /// The module at `index`; `None` when the translation unit carried no
    /// IR module and its slot is null.
    pub fn module(&self, index: usize) -> Option<ModuleView<'_>> {
        let header = self.header();
        let slots =
            self.view_slice::<BcPtr<BcModule>>(header.modules.offset(), self.module_count());
        let ptr = slots[index];
        (!ptr.is_null()).then(|| ModuleView {
            container: self,
            offset: ptr.offset(),
        })
    }

    pub fn modules(&self) -> impl Iterator<Item = Option<ModuleView<'_>>> {
        (0..self.module_count()).map(move |index| self.module(index))
    }

    /// Resolve a NUL-terminated string handle; `None` for a null handle.
    pub fn name_at(&self, ptr: BcPtr<u8>) -> Option<&str> {
        if ptr.is_null() {
            return None;
        }
        let bytes = self.bytes_at(ptr.offset());
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .expect("unterminated name string");
        Some(std::str::from_utf8(&bytes[..end]).expect("invalid UTF-8 in name string"))
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("len", &self.len)
            .field("modules", &self.module_count())
            .finish()
    }
}

/// View of one [`BcModule`].
#[derive(Clone, Copy)]
pub struct ModuleView<'a> {
    container: &'a Container,
    offset: usize,
}

impl<'a> ModuleView<'a> {
    pub fn record(&self) -> &'a BcModule {
        self.container.view(self.offset)
    }

    pub fn symbol_count(&self) -> usize {
        self.record().symbol_count as usize
    }

    /// The symbol at `index`; `None` when the global produced no symbol.
    pub fn symbol(&self, index: usize) -> Option<SymbolView<'a>> {
        let record = self.record();
        let slots = self
            .container
            .view_slice::<BcPtr<BcSymbol>>(record.symbols.offset(), self.symbol_count());
        let ptr = slots[index];
        (!ptr.is_null()).then(|| SymbolView {
            container: self.container,
            offset: ptr.offset(),
        })
    }

    pub fn symbols(&self) -> impl Iterator<Item = Option<SymbolView<'a>>> {
        let this = *self;
        (0..self.symbol_count()).map(move |index| this.symbol(index))
    }

    pub fn constant_count(&self) -> usize {
        self.record().constant_count as usize
    }

    pub fn constant(&self, index: usize) -> ConstantView<'a> {
        assert!(index < self.constant_count(), "constant index out of bounds");
        let base = self.record().constants.offset();
        ConstantView {
            container: self.container,
            offset: base + index * size_of::<BcConstant>(),
        }
    }

    pub fn type_count(&self) -> usize {
        self.record().type_count as usize
    }

    pub fn type_at(&self, index: usize) -> TypeView<'a> {
        let record = self.record();
        let slots = self
            .container
            .view_slice::<BcPtr<BcType>>(record.types.offset(), self.type_count());
        TypeView {
            container: self.container,
            offset: slots[index].offset(),
        }
    }

    pub fn types(&self) -> impl Iterator<Item = TypeView<'a>> {
        let this = *self;
        (0..self.type_count()).map(move |index| this.type_at(index))
    }
}

/// View of one [`BcSymbol`] (possibly a function).
#[derive(Clone, Copy)]
pub struct SymbolView<'a> {
    container: &'a Container,
    offset: usize,
}

impl<'a> SymbolView<'a> {
    pub fn record(&self) -> &'a BcSymbol {
        self.container.view(self.offset)
    }

    pub fn op(&self) -> Option<Opcode> {
        Opcode::from_u32(self.record().op)
    }

    pub fn type_id(&self) -> u32 {
        self.record().type_id
    }

    pub fn name(&self) -> Option<&'a str> {
        self.container.name_at(self.record().name)
    }

    /// Reinterpret as a function when the opcode says so.
    pub fn as_func(&self) -> Option<FuncView<'a>> {
        (self.record().op == Opcode::Func as u32).then_some(FuncView {
            container: self.container,
            offset: self.offset,
        })
    }
}

/// View of one [`BcFunc`].
#[derive(Clone, Copy)]
pub struct FuncView<'a> {
    container: &'a Container,
    offset: usize,
}

impl<'a> FuncView<'a> {
    pub fn record(&self) -> &'a BcFunc {
        self.container.view(self.offset)
    }

    pub fn regs(&self) -> &'a [BcReg] {
        let record = self.record();
        self.container
            .view_slice(record.regs.offset(), record.reg_count as usize)
    }

    pub fn blocks(&self) -> &'a [BcBlock] {
        let record = self.record();
        self.container
            .view_slice(record.blocks.offset(), record.block_count as usize)
    }

    pub fn consts(&self) -> &'a [BcConst] {
        let record = self.record();
        self.container
            .view_slice(record.consts.offset(), record.const_count as usize)
    }

    /// The encoded instruction stream of `block`, running to the end of
    /// the container (per-block lengths are not stored; decoders stop at
    /// the block's terminator).
    pub fn code(&self, block: &BcBlock) -> &'a [u8] {
        self.container.bytes_at(block.code.offset())
    }
}

/// View of one constant-pool entry.
#[derive(Clone, Copy)]
pub struct ConstantView<'a> {
    container: &'a Container,
    offset: usize,
}

impl<'a> ConstantView<'a> {
    pub fn record(&self) -> &'a BcConstant {
        self.container.view(self.offset)
    }

    pub fn op(&self) -> Option<Opcode> {
        Opcode::from_u32(self.record().op)
    }

    /// The integer payload, when present.
    pub fn int_value(&self) -> Option<i64> {
        let record = self.record();
        if record.op != Opcode::IntLit as u32 || record.payload.is_null() {
            return None;
        }
        Some(*self.container.view::<i64>(record.payload.offset()))
    }
}

/// View of one [`BcType`] record and its trailing argument slots.
#[derive(Clone, Copy)]
pub struct TypeView<'a> {
    container: &'a Container,
    offset: usize,
}

impl<'a> TypeView<'a> {
    pub fn record(&self) -> &'a BcType {
        self.container.view(self.offset)
    }

    pub fn op(&self) -> Option<TypeOp> {
        TypeOp::from_u32(self.record().op)
    }

    pub fn id(&self) -> u32 {
        self.record().id
    }

    /// The type arguments, in slot order.
    pub fn args(&self) -> impl Iterator<Item = TypeView<'a>> {
        let record = self.record();
        let slots = self.container.view_slice::<BcPtr<BcType>>(
            self.offset + size_of::<BcType>(),
            record.arg_count as usize,
        );
        let container = self.container;
        slots.iter().map(move |ptr| TypeView {
            container,
            offset: ptr.offset(),
        })
    }
}
