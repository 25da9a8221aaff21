//! Opcode numbering shared between the IR and the instruction stream.
//!
//! The encoder writes IR opcodes into the bytecode verbatim, so the
//! discriminants here are wire format: changing one bumps [`crate::VERSION`].

/// Instruction opcodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum Opcode {
    Param = 1,
    Var = 2,
    ReturnVoid = 3,
    ReturnValue = 4,
    Jump = 5,
    CondBranch = 6,
    IntLit = 7,
    FloatLit = 8,
    BoolLit = 9,
    Load = 10,
    Store = 11,
    Add = 12,
    Sub = 13,
    Mul = 14,
    Div = 15,
    Neg = 16,
    Call = 17,
    Block = 18,
    Func = 19,
    GlobalVar = 20,
    GlobalConstant = 21,
}

impl Opcode {
    /// Convert from a raw wire discriminant.
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::Param),
            2 => Some(Self::Var),
            3 => Some(Self::ReturnVoid),
            4 => Some(Self::ReturnValue),
            5 => Some(Self::Jump),
            6 => Some(Self::CondBranch),
            7 => Some(Self::IntLit),
            8 => Some(Self::FloatLit),
            9 => Some(Self::BoolLit),
            10 => Some(Self::Load),
            11 => Some(Self::Store),
            12 => Some(Self::Add),
            13 => Some(Self::Sub),
            14 => Some(Self::Mul),
            15 => Some(Self::Div),
            16 => Some(Self::Neg),
            17 => Some(Self::Call),
            18 => Some(Self::Block),
            19 => Some(Self::Func),
            20 => Some(Self::GlobalVar),
            21 => Some(Self::GlobalConstant),
            _ => None,
        }
    }

    /// Mnemonic used by the dump.
    pub fn name(self) -> &'static str {
        match self {
            Self::Param => "param",
            Self::Var => "var",
            Self::ReturnVoid => "return_void",
            Self::ReturnValue => "return_value",
            Self::Jump => "jump",
            Self::CondBranch => "cond_branch",
            Self::IntLit => "int_lit",
            Self::FloatLit => "float_lit",
            Self::BoolLit => "bool_lit",
            Self::Load => "load",
            Self::Store => "store",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Neg => "neg",
            Self::Call => "call",
            Self::Block => "block",
            Self::Func => "func",
            Self::GlobalVar => "global_var",
            Self::GlobalConstant => "global_constant",
        }
    }

    /// Whether this op declares a global entity that owns a symbol slot.
    pub fn is_global_value(self) -> bool {
        matches!(self, Self::Func | Self::GlobalVar | Self::GlobalConstant)
    }

    /// Whether this op ends a basic block's instruction stream.
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Self::ReturnVoid | Self::ReturnValue | Self::Jump | Self::CondBranch
        )
    }
}

/// Type record kind tags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u32)]
pub enum TypeOp {
    Void = 0,
    Bool = 1,
    Int32 = 2,
    UInt32 = 3,
    UInt64 = 4,
    Float16 = 5,
    Float32 = 6,
    Float64 = 7,
    /// First argument is the result type, the rest are parameters in
    /// source order.
    Func = 8,
    /// Single argument: the pointee.
    Ptr = 9,
    /// Single argument: the element type.
    StructuredBuffer = 10,
    RwStructuredBuffer = 11,
}

impl TypeOp {
    /// Convert from a raw wire discriminant.
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Void),
            1 => Some(Self::Bool),
            2 => Some(Self::Int32),
            3 => Some(Self::UInt32),
            4 => Some(Self::UInt64),
            5 => Some(Self::Float16),
            6 => Some(Self::Float32),
            7 => Some(Self::Float64),
            8 => Some(Self::Func),
            9 => Some(Self::Ptr),
            10 => Some(Self::StructuredBuffer),
            11 => Some(Self::RwStructuredBuffer),
            _ => None,
        }
    }

    /// Mnemonic used by the dump.
    pub fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Func => "func",
            Self::Ptr => "ptr",
            Self::StructuredBuffer => "structured_buffer",
            Self::RwStructuredBuffer => "rw_structured_buffer",
        }
    }

    /// Whether records of this kind carry no type arguments.
    pub fn is_basic(self) -> bool {
        !matches!(
            self,
            Self::Func | Self::Ptr | Self::StructuredBuffer | Self::RwStructuredBuffer
        )
    }
}
