//! Incremental SSA construction.

use super::IrgenError;
use crate::ir::{
    Block, BlockId, DebugContext, Function, InstKind, Instruction, Location, Param, Phi,
    SsaVariable, TempId, Terminator, Value,
};
use bugc_ast::NodeId;
use bugc_data_structures::map::{FxHashMap, FxIndexMap};
use bugc_interface::Span;
use bugc_sema::Type;

type Result<T, E = IrgenError> = std::result::Result<T, E>;

/// The current SSA value of every live source variable, keyed by declaration.
pub(crate) type Env = FxIndexMap<NodeId, Value>;

/// A control-flow edge into a join point, with the variable bindings along it.
pub(crate) type Edge = (BlockId, Env);

/// A block under construction.
#[derive(Debug, Default)]
struct PartialBlock {
    phis: Vec<Phi>,
    instructions: Vec<Instruction>,
    terminator: Option<Terminator>,
}

/// A source-level local variable.
#[derive(Clone, Debug)]
pub(crate) struct Local {
    pub(crate) name: String,
    pub(crate) ty: Type,
    scope: u32,
    /// Where the value points to, for locals holding a reference to a composite.
    pub(crate) view: Option<Location>,
}

#[derive(Debug)]
struct Scope {
    id: u32,
    declared: Vec<NodeId>,
}

/// Jump targets of the innermost loops.
#[derive(Debug, Default)]
pub(crate) struct LoopEdges {
    pub(crate) continues: Vec<Edge>,
    pub(crate) breaks: Vec<Edge>,
}

/// Builds one [`Function`].
///
/// Tracks the block new instructions go to (none after `return`, `break` and `continue`), the
/// lexical scopes, and the SSA value currently bound to each source variable.
#[derive(Debug)]
pub(crate) struct FunctionBuilder {
    name: String,
    params: Vec<Param>,
    ret: Option<Type>,
    entry: BlockId,
    blocks: FxIndexMap<BlockId, PartialBlock>,
    current: Option<BlockId>,
    next_temp: usize,
    next_block: usize,

    pub(crate) env: Env,
    locals: FxHashMap<NodeId, Local>,
    scopes: Vec<Scope>,
    next_scope: u32,
    versions: FxHashMap<NodeId, u32>,
    ssa_variables: FxHashMap<TempId, SsaVariable>,

    loops: Vec<LoopEdges>,
}

impl FunctionBuilder {
    pub(crate) fn new(name: impl Into<String>, ret: Option<Type>) -> Self {
        let mut this = Self {
            name: name.into(),
            params: Vec::new(),
            ret,
            entry: BlockId::new(0),
            blocks: FxIndexMap::default(),
            current: None,
            next_temp: 0,
            next_block: 0,
            env: Env::default(),
            locals: FxHashMap::default(),
            scopes: Vec::new(),
            next_scope: 0,
            versions: FxHashMap::default(),
            ssa_variables: FxHashMap::default(),
            loops: Vec::new(),
        };
        this.entry = this.create_block();
        this.current = Some(this.entry);
        this.push_scope();
        this
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared return type.
    pub(crate) fn ret(&self) -> Option<&Type> {
        self.ret.as_ref()
    }

    // --- Blocks ----------------------------------------------------------------------------------

    /// Allocates a fresh temporary.
    pub(crate) fn new_temp(&mut self) -> TempId {
        let id = TempId::new(self.next_temp);
        self.next_temp += 1;
        id
    }

    /// Creates a new, empty block. Blocks are laid out in creation order.
    pub(crate) fn create_block(&mut self) -> BlockId {
        let id = BlockId::new(self.next_block);
        self.next_block += 1;
        self.blocks.insert(id, PartialBlock::default());
        id
    }

    /// Sets the block subsequent instructions are appended to.
    pub(crate) fn switch_to_block(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// Returns `true` unless control cannot reach the insertion point.
    #[inline]
    pub(crate) fn is_reachable(&self) -> bool {
        self.current.is_some()
    }

    /// Returns the block instructions are appended to.
    pub(crate) fn current_block(&self, span: Span) -> Result<BlockId> {
        self.current.ok_or_else(|| IrgenError::internal("no current block", span))
    }

    fn current_mut(&mut self, span: Span) -> Result<&mut PartialBlock> {
        let id = self.current_block(span)?;
        self.blocks
            .get_mut(&id)
            .ok_or_else(|| IrgenError::internal(format!("{id} was removed"), span))
    }

    /// Appends an instruction to the current block.
    pub(crate) fn emit(&mut self, kind: InstKind, span: Span) -> Result<()> {
        trace!(inst = %kind, "emit");
        let debug = Some(DebugContext::new(span));
        self.current_mut(span)?.instructions.push(Instruction::new(kind, debug));
        Ok(())
    }

    /// Appends an instruction producing a value of type `ty` and returns that value.
    pub(crate) fn emit_value(
        &mut self,
        ty: Type,
        span: Span,
        kind: impl FnOnce(TempId) -> InstKind,
    ) -> Result<Value> {
        let dest = self.new_temp();
        self.emit(kind(dest), span)?;
        Ok(Value::temp(dest, ty))
    }

    /// Ends the current block. Subsequent code is unreachable until another block is selected.
    pub(crate) fn terminate(&mut self, terminator: Terminator, span: Span) -> Result<()> {
        let block = self.current_mut(span)?;
        if block.terminator.is_some() {
            return Err(IrgenError::internal("block terminated twice", span));
        }
        block.terminator = Some(terminator);
        self.current = None;
        Ok(())
    }

    /// Leaves the current block open and hands it out as an edge into a join point.
    pub(crate) fn take_edge(&mut self) -> Option<Edge> {
        self.current.take().map(|block| (block, self.env.clone()))
    }

    /// Joins `edges` at `target`, terminating each with a jump and inserting a phi for every
    /// variable bound to different values along them.
    ///
    /// With no edges the target is discarded and the code after it is unreachable.
    pub(crate) fn join(&mut self, target: BlockId, edges: Vec<Edge>, span: Span) -> Result<()> {
        if edges.is_empty() {
            self.blocks.shift_remove(&target);
            self.current = None;
            return Ok(());
        }
        for (pred, _) in &edges {
            self.current = Some(*pred);
            self.terminate(Terminator::Jump { target }, span)?;
        }

        let mut env = Env::default();
        let mut phis = Vec::new();
        let (_, first) = &edges[0];
        for (decl, value) in first {
            let incoming: Option<Vec<_>> =
                edges.iter().map(|(pred, env)| env.get(decl).map(|v| (*pred, v))).collect();
            let Some(incoming) = incoming else {
                // Declared in a nested scope along some path.
                continue;
            };
            if incoming.iter().all(|(_, v)| v.same(value)) {
                env.insert(*decl, value.clone());
                continue;
            }

            let ty = self.locals.get(decl).map_or_else(|| value.ty().clone(), |l| l.ty.clone());
            let dest = self.new_temp();
            let sources = incoming.into_iter().map(|(pred, v)| (pred, v.clone())).collect();
            let debug = self.record_version(*decl, dest, span);
            phis.push(Phi { dest, ty: ty.clone(), sources, debug: debug.clone() });
            let mut merged = Value::temp(dest, ty);
            if let Some(debug) = debug {
                merged = merged.with_debug(debug);
            }
            env.insert(*decl, merged);
        }

        let block = self
            .blocks
            .get_mut(&target)
            .ok_or_else(|| IrgenError::internal(format!("join target {target} is missing"), span))?;
        block.phis.extend(phis);
        self.env = env;
        self.current = Some(target);
        Ok(())
    }

    /// Adds a phi to `block`, which must be the current block, and binds `decl` to it.
    pub(crate) fn add_loop_phi(
        &mut self,
        decl: NodeId,
        pred: BlockId,
        span: Span,
    ) -> Result<Option<TempId>> {
        let Some(initial) = self.env.get(&decl).cloned() else { return Ok(None) };
        let ty = self.locals.get(&decl).map_or_else(|| initial.ty().clone(), |l| l.ty.clone());
        let dest = self.new_temp();
        let debug = self.record_version(decl, dest, span);
        let mut sources = FxIndexMap::default();
        sources.insert(pred, initial);
        let phi = Phi { dest, ty: ty.clone(), sources, debug: debug.clone() };
        self.current_mut(span)?.phis.push(phi);
        let mut value = Value::temp(dest, ty);
        if let Some(debug) = debug {
            value = value.with_debug(debug);
        }
        self.env.insert(decl, value);
        Ok(Some(dest))
    }

    /// Adds an incoming value to the phi defining `dest` in `block`.
    pub(crate) fn add_phi_source(
        &mut self,
        block: BlockId,
        dest: TempId,
        pred: BlockId,
        value: Value,
        span: Span,
    ) -> Result<()> {
        let phi = self
            .blocks
            .get_mut(&block)
            .and_then(|b| b.phis.iter_mut().find(|phi| phi.dest == dest))
            .ok_or_else(|| IrgenError::internal(format!("phi {dest} not found in {block}"), span))?;
        phi.sources.insert(pred, value);
        Ok(())
    }

    // --- Variables -------------------------------------------------------------------------------

    pub(crate) fn push_scope(&mut self) {
        let id = self.next_scope;
        self.next_scope += 1;
        self.scopes.push(Scope { id, declared: Vec::new() });
    }

    /// Leaves a scope, forgetting the variables declared in it.
    pub(crate) fn pop_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            for decl in scope.declared {
                self.env.shift_remove(&decl);
            }
        }
    }

    /// Adds a function parameter bound to a fresh temporary.
    pub(crate) fn add_param(&mut self, decl: NodeId, name: &str, ty: Type, span: Span) {
        let id = self.new_temp();
        self.params.push(Param { id, name: name.to_string(), ty: ty.clone() });
        self.declare(decl, name, ty.clone(), None, Value::temp(id, ty), span);
    }

    /// Declares a local variable in the innermost scope.
    pub(crate) fn declare(
        &mut self,
        decl: NodeId,
        name: &str,
        ty: Type,
        view: Option<Location>,
        value: Value,
        span: Span,
    ) {
        let scope = self.scopes.last().map_or(0, |s| s.id);
        if let Some(current) = self.scopes.last_mut() {
            current.declared.push(decl);
        }
        self.locals.insert(decl, Local { name: name.to_string(), ty, scope, view });
        self.bind(decl, value, span);
    }

    /// Binds a declared variable to a new value.
    pub(crate) fn assign(&mut self, decl: NodeId, value: Value, span: Span) {
        self.bind(decl, value, span);
    }

    fn bind(&mut self, decl: NodeId, value: Value, span: Span) {
        let Some(local) = self.locals.get(&decl) else { return };
        let mut value = value.with_type(local.ty.clone());
        if let Some(temp) = value.as_temp()
            && !self.ssa_variables.contains_key(&temp)
            && let Some(debug) = self.record_version(decl, temp, span)
        {
            value = value.with_debug(debug);
        }
        self.env.insert(decl, value);
    }

    /// Records `temp` as the next version of `decl`.
    fn record_version(&mut self, decl: NodeId, temp: TempId, span: Span) -> Option<DebugContext> {
        let local = self.locals.get(&decl)?;
        let version = self.versions.entry(decl).or_default();
        self.ssa_variables.insert(
            temp,
            SsaVariable { name: local.name.clone(), scope: local.scope, version: *version, span },
        );
        *version += 1;
        Some(DebugContext::named(local.name.clone(), span))
    }

    /// Returns the declared local, if `decl` is one.
    pub(crate) fn local(&self, decl: NodeId) -> Option<&Local> {
        self.locals.get(&decl)
    }

    /// Returns the current value of a variable.
    pub(crate) fn lookup(&self, decl: NodeId) -> Option<&Value> {
        self.env.get(&decl)
    }

    // --- Loops -----------------------------------------------------------------------------------

    pub(crate) fn enter_loop(&mut self) {
        self.loops.push(LoopEdges::default());
    }

    pub(crate) fn exit_loop(&mut self) -> LoopEdges {
        self.loops.pop().unwrap_or_default()
    }

    /// Records a `break` from the current block.
    pub(crate) fn break_loop(&mut self, span: Span) -> Result<()> {
        let edge = self.take_edge();
        let edges = self
            .loops
            .last_mut()
            .ok_or_else(|| IrgenError::internal("`break` outside of a loop", span))?;
        edges.breaks.extend(edge);
        Ok(())
    }

    /// Records a `continue` from the current block.
    pub(crate) fn continue_loop(&mut self, span: Span) -> Result<()> {
        let edge = self.take_edge();
        let edges = self
            .loops
            .last_mut()
            .ok_or_else(|| IrgenError::internal("`continue` outside of a loop", span))?;
        edges.continues.extend(edge);
        Ok(())
    }

    // --- Finish ----------------------------------------------------------------------------------

    /// Finishes the function. Every remaining block must be terminated.
    pub(crate) fn finish(self, span: Span) -> Result<Function> {
        let mut blocks = FxIndexMap::default();
        for (id, partial) in self.blocks {
            let Some(terminator) = partial.terminator else {
                return Err(IrgenError::internal(format!("{id} has no terminator"), span));
            };
            let mut block = Block::new(id, terminator);
            block.phis = partial.phis;
            block.instructions = partial.instructions;
            blocks.insert(id, block);
        }
        Ok(Function {
            name: self.name,
            params: self.params,
            entry: self.entry,
            blocks,
            ret: self.ret,
            ssa_variables: self.ssa_variables,
        })
    }
}
