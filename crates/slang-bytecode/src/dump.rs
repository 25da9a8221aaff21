//! Human-readable container dump for debugging and golden tests.

use std::fmt::Write as _;

use crate::container::{Container, FuncView, ModuleView, TypeView};
use crate::opcode::{Opcode, TypeOp};
use crate::records::BcConstFlavor;
use crate::varint::{read_svar, read_uvar};

/// Render a listing of every module, type, constant, and symbol in the
/// container, with block code decoded through the varint reader.
pub fn dump(container: &Container) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "container: {} module(s)", container.module_count());

    for (index, module) in container.modules().enumerate() {
        match module {
            None => {
                let _ = writeln!(out, "module {index}: (absent)");
            }
            Some(module) => dump_module(&mut out, index, &module),
        }
    }

    out
}

fn dump_module(out: &mut String, index: usize, module: &ModuleView<'_>) {
    let _ = writeln!(
        out,
        "module {index}: {} symbol(s), {} constant(s), {} type(s)",
        module.symbol_count(),
        module.constant_count(),
        module.type_count()
    );

    for ty in module.types() {
        let _ = writeln!(out, "  type {}: {}", ty.id(), type_text(&ty));
    }

    for index in 0..module.constant_count() {
        let constant = module.constant(index);
        let record = constant.record();
        let op = op_name(record.op);
        match constant.int_value() {
            Some(value) => {
                let _ = writeln!(
                    out,
                    "  constant {index}: {op} type={} value={value}",
                    record.type_id
                );
            }
            None => {
                let _ = writeln!(out, "  constant {index}: {op} type={}", record.type_id);
            }
        }
    }

    // The decoder needs to know which type id is void: a void-typed
    // instruction carries no dest operand.
    let void_id = module
        .types()
        .find(|ty| ty.op() == Some(TypeOp::Void))
        .map(|ty| u64::from(ty.id()));

    for (index, symbol) in module.symbols().enumerate() {
        let Some(symbol) = symbol else {
            let _ = writeln!(out, "  symbol {index}: (null)");
            continue;
        };
        let name = match symbol.name() {
            Some(name) => format!(" \"{name}\""),
            None => String::new(),
        };
        let _ = writeln!(
            out,
            "  symbol {index}: {}{name} type={}",
            op_name(symbol.record().op),
            symbol.type_id()
        );
        if let Some(func) = symbol.as_func() {
            dump_func(out, &func, void_id);
        }
    }
}

fn dump_func(out: &mut String, func: &FuncView<'_>, void_id: Option<u64>) {
    for (index, reg) in func.regs().iter().enumerate() {
        let _ = writeln!(
            out,
            "    reg {index}: {} type={}",
            op_name(reg.op),
            reg.type_id
        );
    }
    for (index, constant) in func.consts().iter().enumerate() {
        let space = match constant.flavor() {
            Some(BcConstFlavor::GlobalSymbol) => "symbol",
            Some(BcConstFlavor::Constant) => "constant",
            None => "?",
        };
        let _ = writeln!(out, "    import {index}: {space} {}", constant.id());
    }
    for (index, block) in func.blocks().iter().enumerate() {
        let _ = writeln!(out, "    block {index}: params={}", block.param_count);
        dump_code(out, func.code(block), void_id);
    }
}

/// Decode one block's instruction stream. The container stores no per-block
/// length, so decoding stops after the block's terminator.
fn dump_code(out: &mut String, code: &[u8], void_id: Option<u64>) {
    let mut cursor = Cursor { bytes: code, at: 0 };
    loop {
        let Some(op_raw) = cursor.uvar() else {
            let _ = writeln!(out, "      <truncated>");
            return;
        };
        let Some(op) = Opcode::from_u32(op_raw as u32) else {
            let _ = writeln!(out, "      <bad opcode {op_raw}>");
            return;
        };
        if !dump_inst(out, op, &mut cursor, void_id) {
            let _ = writeln!(out, "      <truncated>");
            return;
        }
        if op.is_terminator() {
            return;
        }
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    at: usize,
}

impl Cursor<'_> {
    fn uvar(&mut self) -> Option<u64> {
        let (value, used) = read_uvar(&self.bytes[self.at..])?;
        self.at += used;
        Some(value)
    }

    fn svar(&mut self) -> Option<i64> {
        let (value, used) = read_svar(&self.bytes[self.at..])?;
        self.at += used;
        Some(value)
    }

    fn raw8(&mut self) -> Option<[u8; 8]> {
        let bytes = self.bytes.get(self.at..self.at + 8)?;
        self.at += 8;
        bytes.try_into().ok()
    }
}

/// Returns false when the stream ends mid-instruction.
fn dump_inst(out: &mut String, op: Opcode, cursor: &mut Cursor<'_>, void_id: Option<u64>) -> bool {
    let text = match op {
        Opcode::ReturnVoid => op.name().to_string(),
        Opcode::IntLit => {
            let Some(ty) = cursor.uvar() else { return false };
            let Some(value) = cursor.uvar() else { return false };
            let Some(dst) = cursor.svar() else { return false };
            format!("{} type={ty} value={value} dst={dst}", op.name())
        }
        Opcode::FloatLit => {
            let Some(ty) = cursor.uvar() else { return false };
            let Some(raw) = cursor.raw8() else { return false };
            let Some(dst) = cursor.svar() else { return false };
            format!(
                "{} type={ty} value={} dst={dst}",
                op.name(),
                f64::from_ne_bytes(raw)
            )
        }
        Opcode::BoolLit => {
            let Some(value) = cursor.uvar() else { return false };
            let Some(dst) = cursor.svar() else { return false };
            format!("{} value={} dst={dst}", op.name(), value != 0)
        }
        Opcode::Store => {
            let Some(ty) = cursor.uvar() else { return false };
            let Some(ptr) = cursor.svar() else { return false };
            let Some(value) = cursor.svar() else { return false };
            format!("{} type={ty} ptr={ptr} value={value}", op.name())
        }
        Opcode::Load => {
            let Some(ty) = cursor.uvar() else { return false };
            let Some(ptr) = cursor.svar() else { return false };
            let Some(dst) = cursor.svar() else { return false };
            format!("{} type={ty} ptr={ptr} dst={dst}", op.name())
        }
        _ => {
            let Some(ty) = cursor.uvar() else { return false };
            let Some(count) = cursor.uvar() else { return false };
            let mut args = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let Some(arg) = cursor.svar() else { return false };
                args.push(arg.to_string());
            }
            let mut text = format!("{} type={ty} args=[{}]", op.name(), args.join(", "));
            if Some(ty) != void_id {
                let Some(dst) = cursor.svar() else { return false };
                let _ = write!(text, " dst={dst}");
            }
            text
        }
    };
    let _ = writeln!(out, "      {text}");
    true
}

fn op_name(op: u32) -> &'static str {
    Opcode::from_u32(op).map_or("?", Opcode::name)
}

fn type_text(ty: &TypeView<'_>) -> String {
    let Some(op) = ty.op() else {
        return format!("<bad type op {}>", ty.record().op);
    };
    if op.is_basic() {
        return op.name().to_string();
    }
    let args: Vec<String> = ty.args().map(|arg| arg.id().to_string()).collect();
    format!("{}({})", op.name(), args.join(", "))
}
