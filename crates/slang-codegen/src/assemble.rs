//! Module and container assembly.
//!
//! Per module: bind every global value to a dense symbol id first, so that
//! function bodies (including mutually recursive ones) resolve references
//! without patching; then emit symbols, then the constant pool, then the
//! type table (last, because symbol emission interns types). At the
//! container level the header is allocated before anything else so it owns
//! offset 0.

use std::collections::HashMap;

use slang_bytecode::{
    BcConst, BcConstant, BcHeader, BcModule, BcPtr, BcSymbol, BcType, Handle, MAGIC, Opcode,
    VERSION,
};
use slang_ir::{Decoration, InstId, Module, TypeStore};

use crate::context::{ModuleContext, SharedContext};
use crate::error::GenError;
use crate::func::encode_func;
use crate::TranslationUnit;

/// Serialize the translation units into one container, returning its bytes.
pub(crate) fn generate_container<'a>(
    types: &'a TypeStore,
    units: &'a [TranslationUnit],
) -> Result<Vec<u8>, GenError> {
    let mut shared = SharedContext::new(types);

    let header = shared.arena.alloc::<BcHeader>()?;
    debug_assert_eq!(header.offset(), 0, "header must sit at offset 0");
    {
        let record = shared.arena.get_mut(header);
        record.magic = MAGIC;
        record.version = VERSION;
    }

    let mut modules: Vec<Option<Handle<BcModule>>> = Vec::with_capacity(units.len());
    for unit in units {
        modules.push(match &unit.ir_module {
            Some(ir) => Some(generate_module(&mut shared, ir)?),
            None => None,
        });
    }

    shared.arena.get_mut(header).module_count = modules.len() as u32;
    let slots = shared.arena.alloc_array::<BcPtr<BcModule>>(modules.len())?;
    for (slot, module) in shared
        .arena
        .slice_mut(slots, modules.len())
        .iter_mut()
        .zip(&modules)
    {
        if let Some(handle) = module {
            *slot = handle.to_ptr();
        }
    }
    shared.arena.get_mut(header).modules = slots.to_ptr();

    Ok(shared.arena.into_bytes())
}

/// Serialize one IR module into a `BcModule` record.
fn generate_module<'a>(
    shared: &mut SharedContext<'a>,
    ir: &'a Module,
) -> Result<Handle<BcModule>, GenError> {
    let bc_module = shared.arena.alloc::<BcModule>()?;

    let mut mcx = ModuleContext {
        shared,
        ir,
        value_to_global: HashMap::new(),
    };

    // Pre-pass: dense symbol ids in declaration order, bound before any
    // body is encoded so forward references resolve.
    let mut symbol_count = 0u32;
    for &gv in ir.globals() {
        if !ir.op(gv).is_global_value() {
            continue;
        }
        mcx.value_to_global
            .insert(gv, BcConst::global_symbol(symbol_count));
        symbol_count += 1;
    }

    let bc_symbols = mcx
        .shared
        .arena
        .alloc_array::<BcPtr<BcSymbol>>(symbol_count as usize)?;
    {
        let record = mcx.shared.arena.get_mut(bc_module);
        record.symbol_count = symbol_count;
        record.symbols = bc_symbols.to_ptr();
    }

    for &gv in ir.globals() {
        if !ir.op(gv).is_global_value() {
            continue;
        }
        let index = mcx.value_to_global[&gv].id() as usize;
        let Some(symbol) = generate_symbol(&mut mcx, gv)? else {
            // No representation; the slot stays null.
            continue;
        };
        if let Some(name) = symbol_name(ir, gv) {
            let handle = mcx.shared.arena.alloc_str(name)?;
            mcx.shared.arena.get_mut(symbol).name = handle.to_ptr();
        }
        mcx.shared.arena.slice_mut(bc_symbols, symbol_count as usize)[index] = symbol.to_ptr();
    }

    // Every literal the bodies reference has been pooled by now.
    let constant_count = mcx.shared.constants.len();
    let bc_constants = mcx.shared.arena.alloc_array::<BcConstant>(constant_count)?;
    {
        let record = mcx.shared.arena.get_mut(bc_module);
        record.constant_count = constant_count as u32;
        record.constants = bc_constants.to_ptr();
    }
    for index in 0..constant_count {
        let pending = mcx.shared.constants[index];
        let type_id = mcx.shared.type_index(pending.ty)?;
        {
            let record = mcx.shared.arena.get_mut(bc_constants.add(index));
            record.op = pending.op as u32;
            record.type_id = type_id;
        }
        if pending.op == Opcode::IntLit {
            let payload = mcx.shared.arena.alloc::<i64>()?;
            *mcx.shared.arena.get_mut(payload) = pending.value;
            mcx.shared.arena.get_mut(bc_constants.add(index)).payload =
                payload.cast::<u8>().to_ptr();
        }
    }

    // The type table goes last: everything above may have interned types.
    let type_count = mcx.shared.type_table.len();
    let bc_types = mcx.shared.arena.alloc_array::<BcPtr<BcType>>(type_count)?;
    {
        let record = mcx.shared.arena.get_mut(bc_module);
        record.type_count = type_count as u32;
        record.types = bc_types.to_ptr();
    }
    let handles: Vec<Handle<BcType>> = mcx.shared.type_table.values().copied().collect();
    for (slot, handle) in mcx
        .shared
        .arena
        .slice_mut(bc_types, type_count)
        .iter_mut()
        .zip(handles)
    {
        *slot = handle.to_ptr();
    }

    Ok(bc_module)
}

/// Produce the `BcSymbol` for one global value, or `None` when the op has
/// no bytecode representation.
fn generate_symbol(
    mcx: &mut ModuleContext<'_, '_>,
    gv: InstId,
) -> Result<Option<Handle<BcSymbol>>, GenError> {
    match mcx.ir.op(gv) {
        Opcode::Func => Ok(Some(encode_func(mcx, gv)?.cast::<BcSymbol>())),

        op @ (Opcode::GlobalVar | Opcode::GlobalConstant) => {
            let symbol = mcx.shared.arena.alloc::<BcSymbol>()?;
            let type_id = mcx.shared.type_index(mcx.ir.ty(gv))?;
            {
                let record = mcx.shared.arena.get_mut(symbol);
                record.op = op as u32;
                record.type_id = type_id;
            }
            // TODO: encode initializer bodies once their format is settled.
            Ok(Some(symbol))
        }

        _ => Ok(None),
    }
}

/// Pick a human-readable name for a symbol from its decorations. The
/// reflection name wins over the declaration name when both are present.
fn symbol_name(ir: &Module, inst: InstId) -> Option<&str> {
    ir.find_decoration(inst, |decoration| match decoration {
        Decoration::ReflectionName(name) => Some(name.as_str()),
        _ => None,
    })
    .or_else(|| {
        ir.find_decoration(inst, |decoration| match decoration {
            Decoration::DeclName(name) => Some(name.as_str()),
            _ => None,
        })
    })
}
