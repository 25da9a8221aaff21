//! IR-to-bytecode lowering.
//!
//! [`generate`] walks a compile request's translation units and serializes
//! their IR modules into one self-contained, position-independent bytecode
//! container (see `slang-bytecode` for the format). Generation is
//! single-threaded, performs no I/O, and is deterministic: the same IR
//! graph always yields byte-identical output.

mod assemble;
mod context;
mod error;
mod func;
mod inst;
mod types;

#[cfg(test)]
mod emit_tests;

pub use error::GenError;

use slang_ir::{Module, TypeStore};

/// One input source module. Units without IR (e.g. header-only inputs)
/// still occupy a module slot in the container, as a null entry.
#[derive(Debug, Default)]
pub struct TranslationUnit {
    pub ir_module: Option<Module>,
}

/// The compile request the lowering core serves. One request per build;
/// requests are not shared or reused across builds.
#[derive(Debug)]
pub struct CompileRequest {
    /// The type store all translation units intern into.
    pub types: TypeStore,
    pub translation_units: Vec<TranslationUnit>,
    /// Set by [`generate`] on success; `None` after a failed call.
    pub generated_bytecode: Option<Vec<u8>>,
}

impl CompileRequest {
    pub fn new(types: TypeStore) -> Self {
        Self {
            types,
            translation_units: Vec::new(),
            generated_bytecode: None,
        }
    }

    /// Add a translation unit carrying an IR module.
    pub fn add_module(&mut self, module: Module) {
        self.translation_units.push(TranslationUnit {
            ir_module: Some(module),
        });
    }

    /// Add a translation unit without IR.
    pub fn add_empty_unit(&mut self) {
        self.translation_units.push(TranslationUnit::default());
    }
}

/// Serialize the request's translation units into a bytecode container and
/// attach it to the request.
///
/// All errors are fatal to the call: partial output is discarded and
/// `generated_bytecode` stays `None`.
pub fn generate(request: &mut CompileRequest) -> Result<(), GenError> {
    let bytes = assemble::generate_container(&request.types, &request.translation_units)?;
    request.generated_bytecode = Some(bytes);
    Ok(())
}
