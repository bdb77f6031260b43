//! The compiler passes.

use crate::{
    artifacts::{Artifacts, Checked, Generated, Input, Lowered, Parsed},
    pass::{Bind, Pass},
};
use bugc_ast::Program;
use bugc_codegen::{
    evm::{self, Bytecode, EvmgenError},
    ir::Module,
    lower::{self, IrgenError},
    transform,
};
use bugc_config::OptLevel;
use bugc_interface::Diagnostics;
use bugc_parse::ParseError;
use bugc_sema::Typed;
use std::convert::Infallible;

/// Parses the source into an AST.
#[derive(Clone, Copy, Debug, Default)]
pub struct Parse;

impl Pass for Parse {
    type Needs<'a> = &'a str;
    type Adds = Program;
    type Error = ParseError;
    const NAME: &'static str = "parse";

    fn run(&self, source: &str) -> Result<Program, ParseError> {
        bugc_parse::parse_program(source)
    }
}

impl Bind<Input> for Parse {
    type Out = Artifacts<Parsed>;

    fn needs(input: &Input) -> &str {
        &input.source
    }

    fn merge(input: Input, ast: Program) -> Self::Out {
        Artifacts { input, warnings: Vec::new(), stage: Parsed { ast } }
    }
}

/// Type checks the AST and binds identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeCheck;

impl Pass for TypeCheck {
    type Needs<'a> = &'a Program;
    type Adds = Typed;
    type Error = Diagnostics;
    const NAME: &'static str = "typecheck";

    fn run(&self, ast: &Program) -> Result<Typed, Diagnostics> {
        bugc_sema::check(ast)
    }
}

impl Bind<Artifacts<Parsed>> for TypeCheck {
    type Out = Artifacts<Checked>;

    fn needs(input: &Artifacts<Parsed>) -> &Program {
        &input.stage.ast
    }

    fn merge(mut input: Artifacts<Parsed>, mut typed: Typed) -> Self::Out {
        input.warnings.append(&mut typed.warnings);
        input.advance(|Parsed { ast }| Checked { ast, typed })
    }
}

/// Lowers the typed AST into SSA IR.
#[derive(Clone, Copy, Debug, Default)]
pub struct IrGen;

impl Pass for IrGen {
    type Needs<'a> = (&'a Program, &'a Typed);
    type Adds = Module;
    type Error = IrgenError;
    const NAME: &'static str = "irgen";

    fn run(&self, (ast, typed): (&Program, &Typed)) -> Result<Module, IrgenError> {
        let module = lower::generate(ast, typed)?;
        module.verify().map_err(|message| IrgenError::Internal { message, span: ast.span })?;
        Ok(module)
    }
}

impl Bind<Artifacts<Checked>> for IrGen {
    type Out = Artifacts<Lowered>;

    fn needs(input: &Artifacts<Checked>) -> (&Program, &Typed) {
        (&input.stage.ast, &input.stage.typed)
    }

    fn merge(input: Artifacts<Checked>, ir: Module) -> Self::Out {
        input.advance(|Checked { ast, typed }| Lowered { ast, typed, ir })
    }
}

/// Optimizes the IR at the level of the input's optimizer settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Optimize;

impl Pass for Optimize {
    type Needs<'a> = (&'a Module, OptLevel);
    type Adds = Module;
    type Error = Infallible;
    const NAME: &'static str = "optimize";

    fn run(&self, (ir, level): (&Module, OptLevel)) -> Result<Module, Infallible> {
        Ok(transform::optimize(ir, level))
    }
}

impl Bind<Artifacts<Lowered>> for Optimize {
    type Out = Artifacts<Lowered>;

    fn needs(input: &Artifacts<Lowered>) -> (&Module, OptLevel) {
        (&input.stage.ir, input.input.optimizer.level)
    }

    fn merge(mut input: Artifacts<Lowered>, ir: Module) -> Self::Out {
        input.stage.ir = ir;
        input
    }
}

/// Generates EVM bytecode from the IR.
#[derive(Clone, Copy, Debug, Default)]
pub struct Codegen;

impl Pass for Codegen {
    type Needs<'a> = &'a Module;
    type Adds = Bytecode;
    type Error = EvmgenError;
    const NAME: &'static str = "codegen";

    fn run(&self, ir: &Module) -> Result<Bytecode, EvmgenError> {
        let bytecode = evm::generate(ir)?;
        trace!(runtime = %evm::disassemble(&bytecode.runtime), "generated runtime");
        Ok(bytecode)
    }
}

impl Bind<Artifacts<Lowered>> for Codegen {
    type Out = Artifacts<Generated>;

    fn needs(input: &Artifacts<Lowered>) -> &Module {
        &input.stage.ir
    }

    fn merge(input: Artifacts<Lowered>, bytecode: Bytecode) -> Self::Out {
        input.advance(|Lowered { ast, typed, ir }| Generated { ast, typed, ir, bytecode })
    }
}
