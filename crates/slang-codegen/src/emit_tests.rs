//! End-to-end lowering tests: build IR, generate a container, and check it
//! through the read-side views.

use indoc::indoc;

use slang_bytecode::{BcConst, Container, Opcode, TypeOp, dump};
use slang_ir::{BaseType, Decoration, Module, TypeId, TypeStore};

use super::{CompileRequest, GenError, generate};

fn build(request: &mut CompileRequest) -> Container {
    generate(request).unwrap();
    Container::from_bytes(request.generated_bytecode.as_ref().unwrap()).unwrap()
}

/// `() -> void` function type.
fn void_fn(types: &mut TypeStore) -> TypeId {
    let void = types.basic(BaseType::Void);
    types.func_type(void, vec![])
}

#[test]
fn empty_module_has_empty_counts() {
    let mut request = CompileRequest::new(TypeStore::new());
    request.add_module(Module::new());

    let container = build(&mut request);
    assert_eq!(container.module_count(), 1);

    let module = container.module(0).unwrap();
    assert_eq!(module.symbol_count(), 0);
    assert_eq!(module.constant_count(), 0);
    assert_eq!(module.type_count(), 0);
}

#[test]
fn header_layout_is_bit_exact() {
    let mut request = CompileRequest::new(TypeStore::new());
    request.add_module(Module::new());
    generate(&mut request).unwrap();

    let bytes = request.generated_bytecode.as_ref().unwrap();
    assert_eq!(&bytes[0..8], b"slang\0bc");
    assert_eq!(&bytes[8..12], &0u32.to_ne_bytes());
    assert_eq!(&bytes[12..16], &1u32.to_ne_bytes());
}

#[test]
fn trivial_function_encodes_one_byte_of_code() {
    let mut types = TypeStore::new();
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    let f = module.func(fn_ty);
    let entry = module.block(f);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    let func = module.symbol(0).unwrap().as_func().unwrap();
    assert_eq!(func.regs().len(), 0);
    assert_eq!(func.consts().len(), 0);

    let blocks = func.blocks();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].param_count, 0);
    assert_eq!(func.code(&blocks[0])[0], Opcode::ReturnVoid as u8);
}

#[test]
fn param_add_return_byte_stream() {
    let mut types = TypeStore::new();
    let int = types.basic(BaseType::Int);
    let fn_ty = types.func_type(int, vec![int]);

    let mut module = Module::new();
    let f = module.func(fn_ty);
    let entry = module.block(f);
    let p = module.param(entry, int);
    let add = module.inst(entry, Opcode::Add, Some(int), &[p, p]);
    module.inst(entry, Opcode::ReturnValue, None, &[add]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    // int32 interned first (function result), then the function type, then
    // void for the value-less return.
    assert_eq!(module.type_at(0).op(), Some(TypeOp::Int32));
    assert_eq!(module.type_at(1).op(), Some(TypeOp::Func));
    assert_eq!(module.type_at(2).op(), Some(TypeOp::Void));

    let func = module.symbol(0).unwrap().as_func().unwrap();
    assert_eq!(func.record().symbol.type_id, 1);

    let regs = func.regs();
    assert_eq!(regs.len(), 2);
    assert_eq!(regs[0].op, Opcode::Param as u32);
    assert_eq!(regs[0].type_id, 0);
    assert_eq!(regs[1].op, Opcode::Add as u32);

    let blocks = func.blocks();
    assert_eq!(blocks[0].param_count, 1);
    // The block's parameters are the first registers of the function.
    assert_eq!(blocks[0].params.offset(), func.record().regs.offset());

    // add: op, type int32, 2 operands (param twice), dest register 1;
    // return: op, type void, 1 operand (the add result).
    let code = func.code(&blocks[0]);
    assert_eq!(
        &code[..10],
        &[0x0C, 0x00, 0x02, 0x00, 0x00, 0x02, 0x04, 0x02, 0x01, 0x02]
    );
    assert_eq!(func.consts().len(), 0);
}

#[test]
fn var_and_store_of_pooled_literal() {
    let mut types = TypeStore::new();
    let void = types.basic(BaseType::Void);
    let int = types.basic(BaseType::Int);
    let ptr_int = types.ptr_type(int);
    let fn_ty = types.func_type(void, vec![]);

    let mut module = Module::new();
    let five = module.int_lit(int, 5);
    let f = module.func(fn_ty);
    let entry = module.block(f);
    let v = module.inst(entry, Opcode::Var, Some(ptr_int), &[]);
    module.inst(entry, Opcode::Store, None, &[v, five]);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    // void, func from the symbol; int32, ptr from the var registers.
    assert_eq!(module.type_at(2).op(), Some(TypeOp::Int32));
    assert_eq!(module.type_at(3).op(), Some(TypeOp::Ptr));

    let func = module.symbol(0).unwrap().as_func().unwrap();
    let regs = func.regs();
    assert_eq!(regs.len(), 2);
    // Pointer register first, pointee storage register right behind it.
    assert_eq!(regs[0].op, Opcode::Var as u32);
    assert_eq!(regs[0].type_id, 3);
    assert_eq!(regs[0].previous_var_index_plus_one, 0);
    assert_eq!(regs[1].op, Opcode::Var as u32);
    assert_eq!(regs[1].type_id, 2);
    assert_eq!(regs[1].previous_var_index_plus_one, 1);

    // var (generic, dest = register 0), store (ptr, then the literal as
    // imported constant !0), return.
    let code = func.code(&func.blocks()[0]);
    assert_eq!(
        &code[..9],
        &[0x02, 0x03, 0x00, 0x00, 0x0B, 0x02, 0x00, 0x01, 0x03]
    );

    assert_eq!(func.consts(), &[BcConst::constant(0)]);
    assert_eq!(module.constant_count(), 1);
    let constant = module.constant(0);
    assert_eq!(constant.op(), Some(Opcode::IntLit));
    assert_eq!(constant.record().type_id, 2);
    assert_eq!(constant.int_value(), Some(5));
}

#[test]
fn block_literal_takes_a_register_not_a_pool_slot() {
    let mut types = TypeStore::new();
    let int = types.basic(BaseType::Int);
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    let f = module.func(fn_ty);
    let entry = module.block(f);
    module.int_lit_in(entry, int, 42);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    let func = module.symbol(0).unwrap().as_func().unwrap();

    let regs = func.regs();
    assert_eq!(regs.len(), 1);
    assert_eq!(regs[0].op, Opcode::IntLit as u32);

    // int_lit: op, type int32 (id 2), value 42, dest register 0; return.
    let code = func.code(&func.blocks()[0]);
    assert_eq!(&code[..5], &[0x07, 0x02, 0x2A, 0x00, 0x03]);

    // The literal lives in a register; nothing reaches the pool.
    assert_eq!(func.consts().len(), 0);
    assert_eq!(module.constant_count(), 0);
}

#[test]
fn float_and_bool_literals_encode_inline() {
    let mut types = TypeStore::new();
    let float = types.basic(BaseType::Float);
    let boolean = types.basic(BaseType::Bool);
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    let f = module.func(fn_ty);
    let entry = module.block(f);
    module.float_lit_in(entry, float, 1.5);
    module.bool_lit_in(entry, boolean, true);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    let func = module.symbol(0).unwrap().as_func().unwrap();
    let code = func.code(&func.blocks()[0]);

    // float_lit: op, type, 8 raw host-order bytes, dest register 0.
    let mut expected = vec![0x08, 0x02];
    expected.extend_from_slice(&1.5f64.to_ne_bytes());
    expected.push(0x00);
    // bool_lit: op, value, dest register 1 (no type operand).
    expected.extend_from_slice(&[0x09, 0x01, 0x02]);
    expected.push(Opcode::ReturnVoid as u8);
    assert_eq!(&code[..expected.len()], &expected[..]);

    // Neither literal flavor is pooled.
    assert_eq!(module.constant_count(), 0);
}

#[test]
fn call_resolves_forward_reference_through_imports() {
    let mut types = TypeStore::new();
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    let f1 = module.func(fn_ty);
    let f2 = module.func(fn_ty);

    let b1 = module.block(f1);
    module.inst(b1, Opcode::Call, None, &[f2]);
    module.inst(b1, Opcode::ReturnVoid, None, &[]);

    let b2 = module.block(f2);
    module.inst(b2, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    assert_eq!(module.symbol_count(), 2);

    // f1's body imports f2's symbol id (assigned by the pre-pass even
    // though f2's body is encoded later).
    let func1 = module.symbol(0).unwrap().as_func().unwrap();
    assert_eq!(func1.consts(), &[BcConst::global_symbol(1)]);

    // call: op, type void (id 0), 1 operand, import !0; then return.
    let code = func1.code(&func1.blocks()[0]);
    assert_eq!(&code[..5], &[0x11, 0x00, 0x01, 0x01, 0x03]);
}

#[test]
fn imports_are_assigned_in_first_use_order() {
    let mut types = TypeStore::new();
    let int = types.basic(BaseType::Int);
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    let gv = module.global_var(types.ptr_type(int));
    let five = module.int_lit(int, 5);
    let f = module.func(fn_ty);

    let entry = module.block(f);
    module.inst(entry, Opcode::Store, None, &[gv, five]);
    module.inst(entry, Opcode::Store, None, &[gv, five]);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    let func = module.symbol(1).unwrap().as_func().unwrap();
    // The first store imports the global var (ptr operand comes first),
    // then the literal; the second store reuses both slots.
    assert_eq!(
        func.consts(),
        &[BcConst::global_symbol(0), BcConst::constant(0)]
    );
}

#[test]
fn register_accounting_and_block_offsets() {
    let mut types = TypeStore::new();
    let void = types.basic(BaseType::Void);
    let int = types.basic(BaseType::Int);
    let ptr_int = types.ptr_type(int);
    let fn_ty = types.func_type(void, vec![int]);

    let mut module = Module::new();
    let f = module.func(fn_ty);
    let b1 = module.block(f);
    let b2 = module.block(f);

    let p = module.param(b1, int);
    module.inst(b1, Opcode::Var, Some(ptr_int), &[]);
    module.inst(b1, Opcode::Jump, None, &[b2.inst()]);

    module.inst(b2, Opcode::Add, Some(int), &[p, p]);
    module.inst(b2, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    let func = module.symbol(0).unwrap().as_func().unwrap();

    // 1 param + 2 for the var + 1 for the add.
    assert_eq!(func.regs().len(), 4);

    let blocks = func.blocks();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].param_count, 1);
    assert_eq!(blocks[1].param_count, 0);

    // Block code offsets grow monotonically within the code array, and the
    // second block's registers start after the first block's three.
    assert!(blocks[1].code.offset() > blocks[0].code.offset());
    assert_eq!(
        blocks[1].params.offset(),
        func.record().regs.offset() + 3 * size_of::<slang_bytecode::BcReg>()
    );
}

#[test]
fn function_type_interns_result_then_params() {
    let mut types = TypeStore::new();
    let float = types.basic(BaseType::Float);
    let boolean = types.basic(BaseType::Bool);
    let fn_ty = types.func_type(boolean, vec![float, float]);

    let mut module = Module::new();
    let f = module.func(fn_ty);
    let entry = module.block(f);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    assert_eq!(module.type_count(), 3);
    assert_eq!(module.type_at(0).op(), Some(TypeOp::Bool));
    assert_eq!(module.type_at(1).op(), Some(TypeOp::Float32));

    let func_ty = module.type_at(2);
    assert_eq!(func_ty.op(), Some(TypeOp::Func));
    let arg_ids: Vec<u32> = func_ty.args().map(|arg| arg.id()).collect();
    assert_eq!(arg_ids, [0, 1, 1]);
}

#[test]
fn interning_is_stable_across_symbols() {
    let mut types = TypeStore::new();
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    for _ in 0..3 {
        let f = module.func(fn_ty);
        let entry = module.block(f);
        module.inst(entry, Opcode::ReturnVoid, None, &[]);
    }

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    // Three identical functions, still just two type records.
    let module = container.module(0).unwrap();
    assert_eq!(module.type_count(), 2);
    for symbol in module.symbols() {
        assert_eq!(symbol.unwrap().type_id(), 1);
    }
}

#[test]
fn second_unit_snapshots_the_shared_tables() {
    let mut types = TypeStore::new();
    let fn_ty = void_fn(&mut types);

    let mut first = Module::new();
    let f = first.func(fn_ty);
    let entry = first.block(f);
    first.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(first);
    request.add_module(Module::new());
    let container = build(&mut request);

    assert_eq!(container.module_count(), 2);
    let second = container.module(1).unwrap();
    assert_eq!(second.symbol_count(), 0);
    // The type table spans the container; the empty module sees the same
    // count the first one produced.
    assert_eq!(
        second.type_count(),
        container.module(0).unwrap().type_count()
    );
}

#[test]
fn unit_without_ir_leaves_a_null_module_slot() {
    let mut request = CompileRequest::new(TypeStore::new());
    request.add_module(Module::new());
    request.add_empty_unit();

    let container = build(&mut request);
    assert_eq!(container.module_count(), 2);
    assert!(container.module(0).is_some());
    assert!(container.module(1).is_none());
}

#[test]
fn symbol_names_prefer_reflection_name() {
    let mut types = TypeStore::new();
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    let plain = module.func(fn_ty);
    module.decorate(plain, Decoration::DeclName("helper".into()));

    let reflected = module.func(fn_ty);
    module.decorate(reflected, Decoration::DeclName("decl".into()));
    module.decorate(reflected, Decoration::ReflectionName("params".into()));

    let anonymous = module.func(fn_ty);

    for f in [plain, reflected, anonymous] {
        let entry = module.block(f);
        module.inst(entry, Opcode::ReturnVoid, None, &[]);
    }

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    assert_eq!(module.symbol(0).unwrap().name(), Some("helper"));
    assert_eq!(module.symbol(1).unwrap().name(), Some("params"));
    assert_eq!(module.symbol(2).unwrap().name(), None);
}

#[test]
fn global_vars_emit_bare_symbols() {
    let mut types = TypeStore::new();
    let int = types.basic(BaseType::Int);

    let mut module = Module::new();
    let gv = module.global_var(int);
    module.decorate(gv, Decoration::DeclName("counter".into()));
    module.global_constant(int);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    let module = container.module(0).unwrap();
    assert_eq!(module.symbol_count(), 2);

    let var = module.symbol(0).unwrap();
    assert_eq!(var.op(), Some(Opcode::GlobalVar));
    assert_eq!(var.name(), Some("counter"));
    assert!(var.as_func().is_none());

    let constant = module.symbol(1).unwrap();
    assert_eq!(constant.op(), Some(Opcode::GlobalConstant));
    assert_eq!(constant.name(), None);
}

fn deterministic_request() -> CompileRequest {
    let mut types = TypeStore::new();
    let int = types.basic(BaseType::Int);
    let ptr_int = types.ptr_type(int);
    let fn_ty = types.func_type(int, vec![int, int]);

    let mut module = Module::new();
    let five = module.int_lit(int, 5);
    let f = module.func(fn_ty);
    module.decorate(f, Decoration::DeclName("main".into()));

    let entry = module.block(f);
    let a = module.param(entry, int);
    let b = module.param(entry, int);
    let v = module.inst(entry, Opcode::Var, Some(ptr_int), &[]);
    module.inst(entry, Opcode::Store, None, &[v, five]);
    let sum = module.inst(entry, Opcode::Add, Some(int), &[a, b]);
    module.inst(entry, Opcode::ReturnValue, None, &[sum]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    request
}

#[test]
fn generation_is_deterministic() {
    let mut first = deterministic_request();
    let mut second = deterministic_request();
    generate(&mut first).unwrap();
    generate(&mut second).unwrap();
    assert_eq!(first.generated_bytecode, second.generated_bytecode);

    // Re-running on the same request also reproduces the bytes.
    let snapshot = first.generated_bytecode.clone();
    generate(&mut first).unwrap();
    assert_eq!(first.generated_bytecode, snapshot);
}

#[test]
fn unresolvable_operand_fails_and_leaves_no_output() {
    let mut types = TypeStore::new();
    let float = types.basic(BaseType::Float);
    let int = types.basic(BaseType::Int);
    let ptr_int = types.ptr_type(int);
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    // Only integer literals can be pooled; a module-scope float literal
    // has no global id when referenced.
    let two = module.float_lit(float, 2.0);
    let gv = module.global_var(ptr_int);
    let f = module.func(fn_ty);
    let entry = module.block(f);
    module.inst(entry, Opcode::Store, None, &[gv, two]);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);

    let err = generate(&mut request).unwrap_err();
    assert!(matches!(err, GenError::NoIdForInst { op: Opcode::FloatLit }));
    assert!(request.generated_bytecode.is_none());
}

#[test]
fn var_requires_a_pointer_type() {
    let mut types = TypeStore::new();
    let int = types.basic(BaseType::Int);
    let fn_ty = void_fn(&mut types);

    let mut module = Module::new();
    let f = module.func(fn_ty);
    let entry = module.block(f);
    module.inst(entry, Opcode::Var, Some(int), &[]);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);

    let err = generate(&mut request).unwrap_err();
    assert!(matches!(err, GenError::VarWithoutPointerType));
}

#[test]
fn dump_renders_the_whole_container() {
    let mut types = TypeStore::new();
    let void = types.basic(BaseType::Void);
    let int = types.basic(BaseType::Int);
    let ptr_int = types.ptr_type(int);
    let fn_ty = types.func_type(void, vec![]);

    let mut module = Module::new();
    let five = module.int_lit(int, 5);
    let f = module.func(fn_ty);
    module.decorate(f, Decoration::DeclName("main".into()));
    let entry = module.block(f);
    let v = module.inst(entry, Opcode::Var, Some(ptr_int), &[]);
    module.inst(entry, Opcode::Store, None, &[v, five]);
    module.inst(entry, Opcode::ReturnVoid, None, &[]);

    let mut request = CompileRequest::new(types);
    request.add_module(module);
    let container = build(&mut request);

    assert_eq!(
        dump(&container),
        indoc! {r#"
            container: 1 module(s)
            module 0: 1 symbol(s), 1 constant(s), 4 type(s)
              type 0: void
              type 1: func(0)
              type 2: int32
              type 3: ptr(2)
              constant 0: int_lit type=2 value=5
              symbol 0: func "main" type=1
                reg 0: var type=3
                reg 1: var type=2
                import 0: constant 0
                block 0: params=0
                  var type=3 args=[] dst=0
                  store type=2 ptr=0 value=-1
                  return_void
        "#}
    );
}
