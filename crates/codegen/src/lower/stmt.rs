//! Statement lowering.

use super::{FunctionLowerer, IrgenError, Result, builder::Edge};
use crate::ir::{TempId, Terminator};
use bugc_ast::{self as ast, ExprKind, NodeId, StmtKind};
use bugc_data_structures::map::FxIndexSet;
use bugc_interface::Span;

impl FunctionLowerer<'_> {
    /// Lowers the statements of a block in a new scope.
    pub(super) fn lower_block(&mut self, block: &ast::Block) -> Result<()> {
        self.b.push_scope();
        for stmt in &block.stmts {
            if !self.b.is_reachable() {
                trace!(span = ?stmt.span, "skipping unreachable statement");
                break;
            }
            self.lower_stmt(stmt)?;
        }
        self.b.pop_scope();
        Ok(())
    }

    pub(super) fn lower_stmt(&mut self, stmt: &ast::Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Let(let_) => self.lower_let(let_, stmt.span),
            StmtKind::Assign(lhs, rhs) => self.lower_assign(lhs, rhs, stmt.span),
            StmtKind::Expr(expr) => self.lower_expr_stmt(expr),
            StmtKind::If(cond, then, else_) => {
                self.lower_if(cond, then, else_.as_deref(), stmt.span)
            }
            StmtKind::While(cond, body) => self.lower_loop(Some(cond), None, body, stmt.span),
            StmtKind::For { init, cond, update, body } => {
                self.b.push_scope();
                if let Some(init) = init {
                    self.lower_stmt(init)?;
                }
                self.lower_loop(cond.as_deref(), update.as_deref(), body, stmt.span)?;
                self.b.pop_scope();
                Ok(())
            }
            StmtKind::Return(value) => self.lower_return(value.as_deref(), stmt.span),
            StmtKind::Break => self.b.break_loop(stmt.span),
            StmtKind::Continue => self.b.continue_loop(stmt.span),
            StmtKind::Block(block) => self.lower_block(block),
        }
    }

    fn lower_let(&mut self, let_: &ast::LetStmt, span: Span) -> Result<()> {
        let ty = self.cx.type_of(let_.id, span)?;
        if ty.is_composite() {
            let (value, location) = self.lower_reference(&let_.init)?;
            self.b.declare(let_.id, let_.name.as_str(), ty, Some(location), value, let_.name.span);
        } else {
            let value = self.lower_expr(&let_.init)?;
            self.b.declare(let_.id, let_.name.as_str(), ty, None, value, let_.name.span);
        }
        Ok(())
    }

    fn lower_expr_stmt(&mut self, expr: &ast::Expr) -> Result<()> {
        if let ExprKind::Call(callee, args) = &expr.kind {
            self.lower_call(expr, callee, args)?;
        } else {
            self.lower_expr(expr)?;
        }
        Ok(())
    }

    fn lower_return(&mut self, value: Option<&ast::Expr>, span: Span) -> Result<()> {
        let value = value.map(|value| self.lower_expr(value)).transpose()?;
        let value = match (value, self.b.ret()) {
            (Some(value), Some(ret)) => Some(value.with_type(ret.clone())),
            (value, _) => value,
        };
        self.b.terminate(Terminator::Return { value }, span)
    }

    fn lower_if(
        &mut self,
        cond: &ast::Expr,
        then: &ast::Block,
        else_: Option<&ast::Stmt>,
        span: Span,
    ) -> Result<()> {
        let condition = self.lower_expr(cond)?;
        let then_block = self.b.create_block();
        let else_block = self.b.create_block();
        let merge = self.b.create_block();
        self.b.terminate(Terminator::Branch { condition, then_block, else_block }, span)?;
        let saved = self.b.env.clone();

        let mut edges = Vec::new();
        self.b.switch_to_block(then_block);
        self.lower_block(then)?;
        edges.extend(self.b.take_edge());

        self.b.env = saved;
        self.b.switch_to_block(else_block);
        if let Some(else_) = else_ {
            self.lower_stmt(else_)?;
        }
        edges.extend(self.b.take_edge());

        self.b.join(merge, edges, span)
    }

    /// Lowers `while` and `for` loops.
    ///
    /// The header holds a phi for every variable the loop assigns; continues and the fall-through
    /// of the body meet in a latch that runs the update and jumps back to the header.
    fn lower_loop(
        &mut self,
        cond: Option<&ast::Expr>,
        update: Option<&ast::Stmt>,
        body: &ast::Block,
        span: Span,
    ) -> Result<()> {
        let mut assigned = FxIndexSet::default();
        self.collect_assigned_block(body, &mut assigned);
        if let Some(update) = update {
            self.collect_assigned(update, &mut assigned);
        }

        let header = self.b.create_block();
        let preheader = self.b.current_block(span)?;
        self.b.terminate(Terminator::Jump { target: header }, span)?;
        self.b.switch_to_block(header);
        let mut phis: Vec<(NodeId, TempId)> = Vec::new();
        for decl in assigned {
            if let Some(dest) = self.b.add_loop_phi(decl, preheader, span)? {
                phis.push((decl, dest));
            }
        }

        let body_block = self.b.create_block();
        let latch = self.b.create_block();
        let exit_edge = self.b.create_block();
        let exit = self.b.create_block();

        let mut exits: Vec<Edge> = Vec::new();
        match cond {
            Some(cond) => {
                let condition = self.lower_expr(cond)?;
                self.b.terminate(
                    Terminator::Branch { condition, then_block: body_block, else_block: exit_edge },
                    cond.span,
                )?;
                self.b.switch_to_block(exit_edge);
                exits.extend(self.b.take_edge());
            }
            None => {
                self.b.terminate(Terminator::Jump { target: body_block }, span)?;
                self.b.join(exit_edge, Vec::new(), span)?;
            }
        }

        self.b.switch_to_block(body_block);
        self.b.enter_loop();
        self.lower_block(body)?;
        let body_end = self.b.take_edge();
        let edges = self.b.exit_loop();
        exits.extend(edges.breaks);

        let mut continues = edges.continues;
        continues.extend(body_end);
        self.b.join(latch, continues, span)?;
        if self.b.is_reachable() {
            if let Some(update) = update {
                self.lower_stmt(update)?;
            }
            let back = self.b.current_block(span)?;
            for (decl, dest) in &phis {
                if let Some(value) = self.b.lookup(*decl).cloned() {
                    self.b.add_phi_source(header, *dest, back, value, span)?;
                }
            }
            self.b.terminate(Terminator::Jump { target: header }, span)?;
        }

        self.b.join(exit, exits, span)
    }

    /// Collects the local variables assigned anywhere in `block`.
    fn collect_assigned_block(&self, block: &ast::Block, out: &mut FxIndexSet<NodeId>) {
        for stmt in &block.stmts {
            self.collect_assigned(stmt, out);
        }
    }

    fn collect_assigned(&self, stmt: &ast::Stmt, out: &mut FxIndexSet<NodeId>) {
        match &stmt.kind {
            StmtKind::Assign(lhs, _) => {
                if let ExprKind::Ident(_) = lhs.kind
                    && let Some(decl) = self.cx.typed.binding(lhs.id)
                    && self.b.lookup(decl).is_some()
                {
                    out.insert(decl);
                }
            }
            StmtKind::If(_, then, else_) => {
                self.collect_assigned_block(then, out);
                if let Some(else_) = else_ {
                    self.collect_assigned(else_, out);
                }
            }
            StmtKind::For { init, update, body, .. } => {
                for stmt in init.iter().chain(update) {
                    self.collect_assigned(stmt, out);
                }
                self.collect_assigned_block(body, out);
            }
            StmtKind::While(_, body) => self.collect_assigned_block(body, out),
            StmtKind::Block(block) => self.collect_assigned_block(block, out),
            StmtKind::Let(_)
            | StmtKind::Expr(_)
            | StmtKind::Return(_)
            | StmtKind::Break
            | StmtKind::Continue => {}
        }
    }

    fn lower_assign(&mut self, lhs: &ast::Expr, rhs: &ast::Expr, span: Span) -> Result<()> {
        if let ExprKind::Ident(ident) = &lhs.kind
            && let Some(decl) = self.cx.typed.binding(lhs.id)
            && let Some(local) = self.b.local(decl).cloned()
        {
            match local.view {
                None => {
                    let value = self.lower_expr(rhs)?;
                    self.b.assign(decl, value, ident.span);
                }
                // Rebinding a view only moves the reference; the location it reads from is fixed.
                Some(view) => {
                    let (value, location) = self.lower_reference(rhs)?;
                    if location != view {
                        return Err(IrgenError::UnsupportedStorageAccess {
                            what: format!(
                                "rebinding `{}` from {} to {}",
                                local.name,
                                view.as_str(),
                                location.as_str()
                            ),
                            span,
                        });
                    }
                    self.b.assign(decl, value, ident.span);
                }
            }
            return Ok(());
        }

        let target_ty = self.cx.type_of(lhs.id, lhs.span)?;
        if !target_ty.is_word() {
            return Err(IrgenError::UnsupportedStorageAccess {
                what: format!("assignment of `{target_ty}` values"),
                span,
            });
        }
        let context = self.lvalue_context(lhs)?;
        let place = self.lower_place(lhs, context)?;
        let value = self.lower_expr(rhs)?;
        self.write_place(place, value, lhs.span)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::lower_ok;
    use crate::ir::{Function, Terminator};

    fn phi_count(func: &Function) -> usize {
        func.blocks.values().map(|b| b.phis.len()).sum()
    }

    #[test]
    fn test_if_else_phi() {
        let module = lower_ok(
            "name I;
             storage { [0] out: uint256; }
             code {
                 let x = 1;
                 if (msg.value > 0) { x = 2; } else { x = 3; }
                 out = x;
             }",
        );
        let main = &module.main;
        assert_eq!(phi_count(main), 1);
        let phi = main.blocks.values().flat_map(|b| &b.phis).next().unwrap();
        assert_eq!(phi.sources.len(), 2);
        assert_eq!(main.ssa_variables[&phi.dest].name, "x");
    }

    #[test]
    fn test_joins_are_reached_by_jumps() {
        let module = lower_ok(
            "name I;
             storage { [0] out: uint256; }
             code { let x = 1; if (msg.value > 0) { x = 2; } out = x; }",
        );
        let main = &module.main;
        let phi = main.blocks.values().flat_map(|b| &b.phis).next().unwrap();
        assert!(!phi.sources.contains_key(&main.entry));
        for pred in phi.sources.keys() {
            assert!(matches!(main.block(*pred).terminator, Terminator::Jump { .. }));
        }
    }

    #[test]
    fn test_unchanged_variable_needs_no_phi() {
        let module = lower_ok(
            "name I;
             storage { [0] out: uint256; }
             code { let x = 1; if (msg.value > 0) { out = 2; } out = x; }",
        );
        assert_eq!(phi_count(&module.main), 0);
    }

    #[test]
    fn test_while_loop_phis() {
        let module = lower_ok(
            "name W;
             storage { [0] out: uint256; }
             code {
                 let i = 0;
                 let sum = 0;
                 while (i < 10) { sum = sum + i; i = i + 1; }
                 out = sum;
             }",
        );
        let main = &module.main;
        let header = main.blocks.values().find(|b| !b.phis.is_empty()).unwrap();
        assert_eq!(header.phis.len(), 2);
        for phi in &header.phis {
            assert_eq!(phi.sources.len(), 2);
        }
        assert!(matches!(header.terminator, Terminator::Branch { .. }));
    }

    #[test]
    fn test_for_with_break_and_continue() {
        let module = lower_ok(
            "name F;
             storage { [0] out: uint256; }
             code {
                 let total = 0;
                 for (let i = 0; i < 10; i = i + 1) {
                     if (i == 3) { continue; }
                     if (i == 7) { break; }
                     total = total + i;
                 }
                 out = total;
             }",
        );
        let main = &module.main;
        // The header merges `i` and `total`, the latch merges `total`.
        assert!(phi_count(main) >= 3);
        let returns = main
            .blocks
            .values()
            .filter(|b| matches!(b.terminator, Terminator::Return { .. }))
            .count();
        assert_eq!(returns, 1);
    }

    #[test]
    fn test_infinite_loop_with_break() {
        let module = lower_ok(
            "name L;
             storage { [0] out: uint256; }
             code { let n = 0; for (;;) { n = n + 1; if (n > 4) { break; } } out = n; }",
        );
        module.verify().unwrap();
    }

    #[test]
    fn test_nested_loops() {
        let module = lower_ok(
            "name N;
             storage { [0] out: uint256; }
             code {
                 let acc = 0;
                 for (let i = 0; i < 3; i = i + 1) {
                     for (let j = 0; j < 3; j = j + 1) { acc = acc + j; }
                 }
                 out = acc;
             }",
        );
        let headers = module
            .main
            .blocks
            .values()
            .filter(|b| matches!(b.terminator, Terminator::Branch { .. }) && !b.phis.is_empty())
            .count();
        assert_eq!(headers, 2);
    }

    #[test]
    fn test_code_after_return_is_dropped() {
        let module = lower_ok(
            "name R;
             storage { [0] out: uint256; }
             code { return; out = 1; }",
        );
        assert_eq!(module.main.instruction_count(), 1);
    }
}
