//! The instruction emitter.
//!
//! Encodes one IR instruction into the current function's byte buffer using
//! varints and remapped operand ids. Most opcodes share the generic shape
//! (op, result type, operand count, operands, destination); literals, loads
//! and stores carry bespoke encodings.

use slang_bytecode::Opcode;
use slang_ir::{InstId, Payload};

use crate::error::GenError;
use crate::func::FuncContext;

pub(crate) fn encode_inst(cx: &mut FuncContext<'_, '_, '_>, inst: InstId) -> Result<(), GenError> {
    let ir = cx.ir();
    let op = ir.op(inst);
    match op {
        Opcode::ReturnVoid => {
            cx.uvar(op as u64);
        }

        Opcode::IntLit => {
            let &Payload::Int(value) = ir.payload(inst) else {
                return Err(GenError::MalformedLiteral { op });
            };
            cx.uvar(op as u64);
            cx.type_operand(ir.ty(inst))?;
            // TODO: distinct encodings for signed vs. unsigned values.
            cx.uvar(value as u64);
            cx.operand(inst)?;
        }

        Opcode::FloatLit => {
            let &Payload::Float(value) = ir.payload(inst) else {
                return Err(GenError::MalformedLiteral { op });
            };
            cx.uvar(op as u64);
            cx.type_operand(ir.ty(inst))?;
            // Raw IEEE-754 double in host byte order, never pooled.
            cx.code.extend_from_slice(&value.to_ne_bytes());
            cx.operand(inst)?;
        }

        Opcode::BoolLit => {
            let &Payload::Bool(value) = ir.payload(inst) else {
                return Err(GenError::MalformedLiteral { op });
            };
            cx.uvar(op as u64);
            cx.uvar(u64::from(value));
            cx.operand(inst)?;
        }

        Opcode::Store => {
            cx.uvar(op as u64);
            // The stored value's type, to spare the decoder a lookup.
            let value = ir.operand(inst, 1);
            cx.type_operand(ir.ty(value))?;
            cx.operand(ir.operand(inst, 0))?;
            cx.operand(value)?;
        }

        Opcode::Load => {
            cx.uvar(op as u64);
            cx.type_operand(ir.ty(inst))?;
            cx.operand(ir.operand(inst, 0))?;
            cx.operand(inst)?;
        }

        _ => {
            cx.uvar(op as u64);
            cx.type_operand(ir.ty(inst))?;
            let operands = ir.operands(inst);
            cx.uvar(operands.len() as u64);
            for &operand in operands {
                cx.operand(operand)?;
            }
            // An instruction with a result is its own destination operand.
            if cx.has_result(inst) {
                cx.operand(inst)?;
            }
        }
    }
    Ok(())
}
