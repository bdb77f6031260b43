//! IR generation.
//!
//! Lowers a type-checked [`Program`] into an SSA [`Module`]. Local variables are kept in SSA form
//! while lowering: each assignment binds a new value, and phis are placed where control flow
//! joins with different values for a variable. Storage and memory accesses become explicit
//! `read` and `write` instructions over computed slots and offsets.

use crate::ir::{DebugContext, Function, Module, Terminator};
use bugc_ast::{self as ast, NodeId, Program};
use bugc_data_structures::map::{FxHashMap, FxIndexMap};
use bugc_interface::Span;
use bugc_sema::{Type, Typed};

mod builder;
use builder::FunctionBuilder;

mod error;
pub use error::IrgenError;

mod expr;
mod stmt;

type Result<T, E = IrgenError> = std::result::Result<T, E>;

/// Lowers a type-checked program into an IR module.
#[instrument(name = "irgen", level = "debug", skip_all, fields(program = %program.name))]
pub fn generate(program: &Program, typed: &Typed) -> Result<Module> {
    let cx = Context::new(program, typed);

    let mut functions = FxIndexMap::default();
    for def in &program.functions {
        let ret = typed.type_of(def.id).cloned();
        let mut lowerer = FunctionLowerer::new(&cx, def.name.as_str(), ret, EntryKind::Function);
        for param in &def.params {
            let ty = cx.type_of(param.id, param.span)?;
            lowerer.b.add_param(param.id, param.name.as_str(), ty, param.span);
        }
        let func = lowerer.lower_body(&def.body, def.span)?;
        trace!(name = %func.name, blocks = func.blocks.len(), "lowered function");
        functions.insert(func.name.clone(), func);
    }

    let create = match &program.create {
        Some(body) => {
            let lowerer = FunctionLowerer::new(&cx, "create", None, EntryKind::Create);
            Some(lowerer.lower_body(body, body.span)?)
        }
        None => None,
    };

    let main = FunctionLowerer::new(&cx, "main", None, EntryKind::Main)
        .lower_body(&program.code, program.code.span)?;

    let module = Module {
        name: program.name.name.clone(),
        functions,
        create,
        main,
        debug: Some(DebugContext::named(program.name.name.clone(), program.span)),
    };
    debug!(instructions = module.instruction_count(), "generated IR");
    Ok(module)
}

/// Program-wide lookup tables.
struct Context<'a> {
    typed: &'a Typed,
    storage: FxHashMap<NodeId, &'a ast::StorageDecl>,
    functions: FxHashMap<NodeId, &'a ast::FunctionDef>,
}

impl<'a> Context<'a> {
    fn new(program: &'a Program, typed: &'a Typed) -> Self {
        Self {
            typed,
            storage: program.storage.iter().map(|decl| (decl.id, decl)).collect(),
            functions: program.functions.iter().map(|def| (def.id, def)).collect(),
        }
    }

    /// Returns the checked type of a node.
    fn type_of(&self, id: NodeId, span: Span) -> Result<Type> {
        self.typed
            .type_of(id)
            .cloned()
            .ok_or_else(|| IrgenError::internal(format!("node {id} has no type"), span))
    }
}

/// The kind of function being lowered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryKind {
    /// The runtime `code` block.
    Main,
    /// The `create` block.
    Create,
    /// A user-defined function.
    Function,
}

/// Lowers one function body.
struct FunctionLowerer<'a> {
    cx: &'a Context<'a>,
    b: FunctionBuilder,
    kind: EntryKind,
}

impl<'a> FunctionLowerer<'a> {
    fn new(cx: &'a Context<'a>, name: &str, ret: Option<Type>, kind: EntryKind) -> Self {
        Self { cx, b: FunctionBuilder::new(name, ret), kind }
    }

    fn lower_body(mut self, body: &ast::Block, span: Span) -> Result<Function> {
        self.lower_block(body)?;
        if self.b.is_reachable() {
            if self.kind == EntryKind::Function && self.b.ret().is_some() {
                return Err(IrgenError::MissingReturn {
                    function: self.b.name().to_string(),
                    span,
                });
            }
            self.b.terminate(Terminator::Return { value: None }, body.span)?;
        }
        self.b.finish(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{InstKind, Location};

    pub(super) fn lower(src: &str) -> Result<Module, IrgenError> {
        let program = bugc_parse::parse_program(src).unwrap();
        let typed = bugc_sema::check(&program).unwrap();
        generate(&program, &typed)
    }

    pub(super) fn lower_ok(src: &str) -> Module {
        let module = lower(src).unwrap();
        module.verify().unwrap();
        module
    }

    #[test]
    fn test_empty_program() {
        let module = lower_ok("name Empty; code {}");
        assert_eq!(module.name, "Empty");
        assert!(module.create.is_none());
        assert!(module.functions.is_empty());
        assert_eq!(module.main.blocks.len(), 1);
        let entry = module.main.block(module.main.entry);
        assert_eq!(entry.terminator, Terminator::Return { value: None });
    }

    #[test]
    fn test_storage_read_and_write() {
        let module = lower_ok(
            "name Counter;
             storage { [0] count: uint256; }
             code { count = count + 1; }",
        );
        let entry = module.main.block(module.main.entry);
        let kinds: Vec<_> = entry.instructions.iter().map(|i| &i.kind).collect();
        assert!(matches!(
            kinds.first(),
            Some(InstKind::Read { location: Location::Storage, .. })
        ));
        assert!(matches!(
            kinds.last(),
            Some(InstKind::Write { location: Location::Storage, .. })
        ));
    }

    #[test]
    fn test_create_and_functions() {
        let module = lower_ok(
            "name C;
             define { function add(a: uint256, b: uint256) -> uint256 { return a + b; }; }
             storage { [0] x: uint256; }
             create { x = 1; }
             code { x = add(x, 2); }",
        );
        assert!(module.create.is_some());
        let add = &module.functions["add"];
        assert_eq!(add.params.len(), 2);
        assert_eq!(add.ret, Some(Type::UINT256));
        let calls = module
            .main
            .blocks
            .values()
            .filter(|b| matches!(b.terminator, Terminator::Call { .. }))
            .count();
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_missing_return() {
        let err = lower(
            "name M;
             define { function f(a: uint256) -> uint256 { if (a > 1) { return 1; } }; }
             code {}",
        )
        .unwrap_err();
        assert!(matches!(err, IrgenError::MissingReturn { ref function, .. } if function == "f"));
        assert_eq!(err.to_diagnostic().code.id(), 3005);
    }
}
