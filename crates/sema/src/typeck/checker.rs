use super::{Bindings, TypeMap, Typed};
use crate::{StructType, Type, TypeError, error::shadowed_variable};
use bugc_ast::{
    Block, Expr, ExprKind, FunctionDef, Ident, Lit, NodeId, Program, Special, Stmt, StmtKind,
    TypeExpr, TypeKind, UnOpKind,
};
use bugc_data_structures::map::{FxHashMap, FxHashSet};
use bugc_interface::{Diagnostic, Diagnostics, Span};

/// A resolved variable.
#[derive(Clone, Debug)]
struct Binding {
    id: NodeId,
    /// `None` if the declared type failed to resolve; uses are then not reported again.
    ty: Option<Type>,
}

/// A resolved function signature.
struct Signature<'ast> {
    def: &'ast FunctionDef,
    params: Vec<Option<Type>>,
    ret: Option<Type>,
}

/// What a `return` statement is allowed to carry in the current body.
#[derive(Clone, Debug)]
enum ReturnContext {
    Main,
    Create,
    Function(Option<Type>),
}

/// The result of checking an expression.
enum Checked {
    Ty(Type),
    /// A call to a function without a return type.
    Void(String),
    /// An error was already reported.
    Err,
}

pub(super) struct TypeChecker<'ast> {
    program: &'ast Program,

    structs: FxHashMap<&'ast str, StructType>,
    failed_structs: FxHashSet<&'ast str>,
    functions: FxHashMap<&'ast str, Signature<'ast>>,
    globals: FxHashMap<&'ast str, Binding>,
    scopes: Vec<FxHashMap<&'ast str, Binding>>,

    loop_depth: usize,
    ret: ReturnContext,

    types: TypeMap,
    bindings: Bindings,
    errors: Vec<TypeError>,
    warnings: Vec<Diagnostic>,
}

impl<'ast> TypeChecker<'ast> {
    pub(super) fn new(program: &'ast Program) -> Self {
        Self {
            program,
            structs: FxHashMap::default(),
            failed_structs: FxHashSet::default(),
            functions: FxHashMap::default(),
            globals: FxHashMap::default(),
            scopes: Vec::new(),
            loop_depth: 0,
            ret: ReturnContext::Main,
            types: TypeMap::default(),
            bindings: Bindings::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(super) fn check_program(mut self) -> Result<Typed, Diagnostics> {
        let program = self.program;

        let mut seen = FxHashSet::default();
        for def in &program.structs {
            if !seen.insert(def.name.as_str()) {
                self.duplicate(&def.name);
                continue;
            }
            self.resolve_struct(&def.name, &mut Vec::new());
        }

        for decl in &program.storage {
            if self.globals.contains_key(decl.name.as_str()) {
                self.duplicate(&decl.name);
                continue;
            }
            let ty = self.resolve_type(&decl.ty);
            if let Some(ty) = &ty {
                self.types.insert(decl.id, ty.clone());
            }
            self.globals.insert(decl.name.as_str(), Binding { id: decl.id, ty });
        }

        for def in &program.functions {
            if self.functions.contains_key(def.name.as_str()) {
                self.duplicate(&def.name);
                continue;
            }
            let params = def
                .params
                .iter()
                .map(|param| self.resolve_value_type(&param.ty))
                .collect::<Vec<_>>();
            let ret = def.ret.as_ref().and_then(|ret| self.resolve_value_type(ret));
            if let Some(ret) = &ret {
                self.types.insert(def.id, ret.clone());
            }
            self.functions.insert(def.name.as_str(), Signature { def, params, ret });
        }

        for def in &program.functions {
            self.check_function(def);
        }
        if let Some(create) = &program.create {
            self.ret = ReturnContext::Create;
            self.check_block(create);
        }
        self.ret = ReturnContext::Main;
        self.check_block(&program.code);

        debug!(
            types = self.types.len(),
            bindings = self.bindings.len(),
            errors = self.errors.len(),
            warnings = self.warnings.len(),
            "checked program"
        );
        if self.errors.is_empty() {
            Ok(Typed { types: self.types, bindings: self.bindings, warnings: self.warnings })
        } else {
            let mut diagnostics: Diagnostics =
                self.errors.iter().map(TypeError::to_diagnostic).collect();
            diagnostics.extend(self.warnings);
            Err(diagnostics)
        }
    }

    fn check_function(&mut self, def: &'ast FunctionDef) {
        let Some(sig) = self.functions.get(def.name.as_str()) else { return };
        if !std::ptr::eq(sig.def, def) {
            // A duplicate definition, already reported.
            return;
        }
        let params = sig.params.clone();
        self.ret = ReturnContext::Function(sig.ret.clone());

        let mut scope = FxHashMap::default();
        for (param, ty) in def.params.iter().zip(params) {
            if scope.contains_key(param.name.as_str()) {
                self.duplicate(&param.name);
                continue;
            }
            if let Some(ty) = &ty {
                self.types.insert(param.id, ty.clone());
            }
            scope.insert(param.name.as_str(), Binding { id: param.id, ty });
        }
        self.scopes.push(scope);
        self.check_block(&def.body);
        self.scopes.pop();
    }

    // --- Types -----------------------------------------------------------------------------------

    fn resolve_type(&mut self, ty: &'ast TypeExpr) -> Option<Type> {
        self.resolve_type_in(ty, &mut Vec::new())
    }

    /// Resolves a parameter or return type, which must fit in a stack word.
    fn resolve_value_type(&mut self, ty: &'ast TypeExpr) -> Option<Type> {
        let resolved = self.resolve_type(ty)?;
        if !resolved.is_word() {
            self.error(TypeError::UnsupportedParameterType { ty: resolved, span: ty.span });
            return None;
        }
        Some(resolved)
    }

    fn resolve_type_in(
        &mut self,
        ty: &'ast TypeExpr,
        visiting: &mut Vec<&'ast str>,
    ) -> Option<Type> {
        Some(match &ty.kind {
            TypeKind::Elementary(elem) => Type::from_elementary(*elem),
            TypeKind::Array(element, size) => Type::Array {
                element: Box::new(self.resolve_type_in(element, visiting)?),
                size: *size,
            },
            TypeKind::Mapping(key, value) => {
                let key = self.resolve_type_in(key, visiting);
                let value = self.resolve_type_in(value, visiting);
                Type::Mapping { key: Box::new(key?), value: Box::new(value?) }
            }
            TypeKind::Custom(name) => Type::Struct(self.resolve_struct(name, visiting)?),
        })
    }

    fn resolve_struct(
        &mut self,
        name: &'ast Ident,
        visiting: &mut Vec<&'ast str>,
    ) -> Option<StructType> {
        if let Some(s) = self.structs.get(name.as_str()) {
            return Some(s.clone());
        }
        if self.failed_structs.contains(name.as_str()) {
            return None;
        }
        let Some(def) = self.program.find_struct(name.as_str()) else {
            self.error(TypeError::UnknownType { name: name.name.clone(), span: name.span });
            return None;
        };
        if visiting.contains(&def.name.as_str()) {
            self.error(TypeError::RecursiveStruct { name: def.name.name.clone(), span: def.span });
            self.failed_structs.insert(def.name.as_str());
            return None;
        }

        visiting.push(def.name.as_str());
        let mut fields: Vec<(String, Type)> = Vec::with_capacity(def.fields.len());
        let mut ok = true;
        for field in &def.fields {
            if fields.iter().any(|(name, _)| name == field.name.as_str()) {
                self.duplicate(&field.name);
                ok = false;
                continue;
            }
            match self.resolve_type_in(&field.ty, visiting) {
                Some(ty) => fields.push((field.name.name.clone(), ty)),
                None => ok = false,
            }
        }
        visiting.pop();

        if !ok {
            self.failed_structs.insert(def.name.as_str());
            return None;
        }
        let s = StructType { name: def.name.name.clone(), fields };
        self.structs.insert(def.name.as_str(), s.clone());
        Some(s)
    }

    // --- Statements ------------------------------------------------------------------------------

    fn check_block(&mut self, block: &'ast Block) {
        self.scopes.push(FxHashMap::default());
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn check_stmt(&mut self, stmt: &'ast Stmt) {
        match &stmt.kind {
            StmtKind::Let(let_) => {
                let declared = let_.ty.as_ref().and_then(|ty| self.resolve_type(ty));
                let init = self.check_value(&let_.init, declared.as_ref());
                let ty = match (declared, init) {
                    (Some(declared), Some(init)) => {
                        self.expect_assignable(&declared, &init, let_.init.span);
                        Some(declared)
                    }
                    (declared @ Some(_), None) => declared,
                    (None, init) => init.filter(|_| let_.ty.is_none()),
                };
                if self.lookup(let_.name.as_str()).is_some() {
                    self.warnings.push(shadowed_variable(let_.name.as_str(), let_.name.span));
                }
                if let Some(ty) = &ty {
                    self.types.insert(let_.id, ty.clone());
                }
                self.declare(&let_.name, Binding { id: let_.id, ty });
            }
            StmtKind::Assign(lhs, rhs) => {
                let Some(target) = self.check_value(lhs, None) else {
                    self.check_value(rhs, None);
                    return;
                };
                if !self.is_place(lhs) {
                    self.error(TypeError::InvalidAssignmentTarget { span: lhs.span });
                    self.check_value(rhs, None);
                    return;
                }
                if let Some(value) = self.check_value(rhs, Some(&target)) {
                    self.expect_assignable(&target, &value, rhs.span);
                }
            }
            StmtKind::Expr(expr) => {
                self.check_expr(expr, None);
            }
            StmtKind::If(cond, then, else_) => {
                self.check_cond(cond);
                self.check_block(then);
                if let Some(else_) = else_ {
                    self.check_stmt(else_);
                }
            }
            StmtKind::For { init, cond, update, body } => {
                self.scopes.push(FxHashMap::default());
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_cond(cond);
                }
                if let Some(update) = update {
                    self.check_stmt(update);
                }
                self.check_loop_body(body);
                self.scopes.pop();
            }
            StmtKind::While(cond, body) => {
                self.check_cond(cond);
                self.check_loop_body(body);
            }
            StmtKind::Return(value) => self.check_return(value.as_deref(), stmt.span),
            StmtKind::Break => self.check_loop_control("break", stmt.span),
            StmtKind::Continue => self.check_loop_control("continue", stmt.span),
            StmtKind::Block(block) => self.check_block(block),
        }
    }

    fn check_loop_body(&mut self, body: &'ast Block) {
        self.loop_depth += 1;
        self.check_block(body);
        self.loop_depth -= 1;
    }

    fn check_loop_control(&mut self, keyword: &'static str, span: Span) {
        if self.loop_depth == 0 {
            self.error(TypeError::LoopControlOutsideLoop { keyword, span });
        }
    }

    fn check_cond(&mut self, cond: &'ast Expr) {
        if let Some(ty) = self.check_value(cond, Some(&Type::Bool)) {
            self.expect_assignable(&Type::Bool, &ty, cond.span);
        }
    }

    fn check_return(&mut self, value: Option<&'ast Expr>, span: Span) {
        match (self.ret.clone(), value) {
            (ReturnContext::Main, None)
            | (ReturnContext::Create, None)
            | (ReturnContext::Function(None), None) => {}
            (ReturnContext::Main, Some(value)) => {
                if let Some(ty) = self.check_value(value, None)
                    && !ty.is_word()
                {
                    self.error(TypeError::InvalidOperand { op: "return", ty, span: value.span });
                }
            }
            (ReturnContext::Create | ReturnContext::Function(None), Some(value)) => {
                self.check_value(value, None);
                self.error(TypeError::UnexpectedReturnValue { span: value.span });
            }
            (ReturnContext::Function(Some(expected)), None) => {
                self.error(TypeError::MissingReturnValue { expected, span });
            }
            (ReturnContext::Function(Some(expected)), Some(value)) => {
                if let Some(ty) = self.check_value(value, Some(&expected)) {
                    self.expect_assignable(&expected, &ty, value.span);
                }
            }
        }
    }

    /// Returns `true` if the expression denotes an assignable location.
    fn is_place(&self, expr: &Expr) -> bool {
        match &expr.kind {
            ExprKind::Ident(_) => self.bindings.contains_key(&expr.id),
            ExprKind::Index(base, _) => self.is_place(base),
            ExprKind::Member(base, _) => {
                matches!(self.types.get(&base.id), Some(Type::Struct(_))) && self.is_place(base)
            }
            _ => false,
        }
    }

    // --- Expressions -----------------------------------------------------------------------------

    /// Checks an expression that must produce a value.
    fn check_value(&mut self, expr: &'ast Expr, expected: Option<&Type>) -> Option<Type> {
        match self.check_expr(expr, expected) {
            Checked::Ty(ty) => Some(ty),
            Checked::Void(name) => {
                self.error(TypeError::NoValue { name, span: expr.span });
                None
            }
            Checked::Err => None,
        }
    }

    /// Checks an expression, recording its type. `expected` only guides literal typing; callers
    /// check assignability themselves.
    fn check_expr(&mut self, expr: &'ast Expr, expected: Option<&Type>) -> Checked {
        let checked = self.check_expr_kind(expr, expected);
        if let Checked::Ty(ty) = &checked {
            trace!(id = %expr.id, %ty, "typed expression");
            self.types.insert(expr.id, ty.clone());
        }
        checked
    }

    fn check_expr_kind(&mut self, expr: &'ast Expr, expected: Option<&Type>) -> Checked {
        let ty = match &expr.kind {
            ExprKind::Lit(lit) => match lit {
                Lit::Bool(_) => Type::Bool,
                Lit::Address(_) => Type::Address,
                Lit::Str(_) => Type::String,
                Lit::Number(value) => match expected {
                    Some(ty) if ty.fits(*value) => ty.clone(),
                    _ => Type::UINT256,
                },
            },
            ExprKind::Ident(ident) => return self.check_ident(expr.id, ident),
            ExprKind::Special(special) => match special {
                Special::MsgSender => Type::Address,
                Special::MsgValue | Special::BlockTimestamp | Special::BlockNumber => Type::UINT256,
                Special::MsgData => Type::Bytes,
            },
            ExprKind::Unary(op, operand) => match op.kind {
                UnOpKind::Not => {
                    let Some(ty) = self.check_value(operand, Some(&Type::Bool)) else {
                        return Checked::Err;
                    };
                    if ty != Type::Bool {
                        return self.err(TypeError::InvalidOperand { op: "!", ty, span: expr.span });
                    }
                    Type::Bool
                }
                UnOpKind::Neg => return self.check_neg(expr, operand, expected),
            },
            ExprKind::Binary(lhs, op, rhs) => {
                return self.check_binary(expr, lhs, op.kind, rhs, expected);
            }
            ExprKind::Cast(value, to) => {
                let Some(to) = self.resolve_type(to) else { return Checked::Err };
                let Some(from) = self.check_value(value, None) else { return Checked::Err };
                if !from.can_cast_to(&to) {
                    return self.err(TypeError::InvalidCast { from, to, span: expr.span });
                }
                to
            }
            ExprKind::Index(base, index) => {
                let Some(base_ty) = self.check_value(base, None) else { return Checked::Err };
                match base_ty {
                    Type::Array { element, .. } => {
                        let index_ty = self.check_value(index, Some(&Type::UINT256));
                        if let Some(index_ty) = index_ty {
                            self.expect_assignable(&Type::UINT256, &index_ty, index.span);
                        }
                        *element
                    }
                    Type::Mapping { key, value } => {
                        if let Some(key_ty) = self.check_value(index, Some(&key)) {
                            self.expect_assignable(&key, &key_ty, index.span);
                        }
                        *value
                    }
                    ty => {
                        self.check_value(index, None);
                        return self.err(TypeError::NotIndexable { ty, span: base.span });
                    }
                }
            }
            ExprKind::Member(base, member) => {
                let Some(base_ty) = self.check_value(base, None) else { return Checked::Err };
                let field = match &base_ty {
                    Type::Struct(s) => s.field(member.as_str()).map(|(_, ty)| ty.clone()),
                    Type::Array { .. } | Type::Bytes | Type::String
                        if member.as_str() == "length" =>
                    {
                        Some(Type::UINT256)
                    }
                    _ => None,
                };
                match field {
                    Some(ty) => ty,
                    None => {
                        return self.err(TypeError::UnknownMember {
                            ty: base_ty,
                            member: member.name.clone(),
                            span: member.span,
                        });
                    }
                }
            }
            ExprKind::Call(callee, args) => return self.check_call(expr, callee, args),
            ExprKind::Keccak256(value) => {
                let Some(ty) = self.check_value(value, None) else { return Checked::Err };
                if !ty.is_word() {
                    return self.err(TypeError::InvalidOperand {
                        op: "keccak256",
                        ty,
                        span: value.span,
                    });
                }
                Type::BYTES32
            }
            ExprKind::Array(elements) => return self.check_array(expr, elements, expected),
        };
        Checked::Ty(ty)
    }

    fn check_ident(&mut self, id: NodeId, ident: &'ast Ident) -> Checked {
        if let Some(binding) = self.lookup(ident.as_str()) {
            let Binding { id: decl, ty } = binding.clone();
            self.bindings.insert(id, decl);
            return ty.map_or(Checked::Err, Checked::Ty);
        }
        if self.functions.contains_key(ident.as_str()) {
            return self.err(TypeError::FunctionAsValue {
                name: ident.name.clone(),
                span: ident.span,
            });
        }
        self.err(TypeError::UndefinedIdentifier { name: ident.name.clone(), span: ident.span })
    }

    fn check_neg(&mut self, expr: &Expr, operand: &'ast Expr, expected: Option<&Type>) -> Checked {
        if let ExprKind::Lit(Lit::Number(value)) = operand.kind {
            let ty = match expected {
                Some(ty) if ty.fits_negated(value) => ty.clone(),
                _ => Type::INT256,
            };
            if !ty.fits_negated(value) {
                return self.err(TypeError::LiteralOutOfRange { ty, span: expr.span });
            }
            self.types.insert(operand.id, ty.clone());
            return Checked::Ty(ty);
        }

        let hint = expected.filter(|ty| ty.is_signed());
        let Some(ty) = self.check_value(operand, hint) else { return Checked::Err };
        if !ty.is_signed() {
            return self.err(TypeError::InvalidOperand { op: "-", ty, span: expr.span });
        }
        Checked::Ty(ty)
    }

    fn check_binary(
        &mut self,
        expr: &Expr,
        lhs: &'ast Expr,
        op: bugc_ast::BinOpKind,
        rhs: &'ast Expr,
        expected: Option<&Type>,
    ) -> Checked {
        let op_str = op.to_str();

        if op.is_logical() {
            let lt = self.check_value(lhs, Some(&Type::Bool));
            let rt = self.check_value(rhs, Some(&Type::Bool));
            for (ty, span) in [(lt, lhs.span), (rt, rhs.span)] {
                if let Some(ty) = ty
                    && ty != Type::Bool
                {
                    self.error(TypeError::InvalidOperand { op: op_str, ty, span });
                }
            }
            return Checked::Ty(Type::Bool);
        }

        // Literals take their type from the other operand, so check the non-literal side first.
        let hint = if op.is_arithmetic() { expected.filter(|ty| ty.is_numeric()) } else { None };
        let (lt, rt) = if is_number_literal(lhs) && !is_number_literal(rhs) {
            let rt = self.check_value(rhs, hint);
            let lt = self.check_value(lhs, rt.as_ref().filter(|ty| ty.is_numeric()).or(hint));
            (lt, rt)
        } else {
            let lt = self.check_value(lhs, hint);
            let rt = self.check_value(rhs, lt.as_ref().filter(|ty| ty.is_numeric()).or(hint));
            (lt, rt)
        };
        let (Some(lt), Some(rt)) = (lt, rt) else { return Checked::Err };

        let operand_ty = if lt.is_numeric() && rt.is_numeric() {
            match Type::common_type(&lt, &rt) {
                Some(ty) => ty,
                None => {
                    return self.err(TypeError::NoCommonType {
                        op: op_str,
                        left: lt,
                        right: rt,
                        span: expr.span,
                    });
                }
            }
        } else if matches!(op, bugc_ast::BinOpKind::Eq | bugc_ast::BinOpKind::Ne)
            && lt == rt
            && lt.is_word()
        {
            lt
        } else {
            let (ty, span) = if lt.is_numeric() { (rt, rhs.span) } else { (lt, lhs.span) };
            return self.err(TypeError::InvalidOperand { op: op_str, ty, span });
        };

        Checked::Ty(if op.is_comparison() { Type::Bool } else { operand_ty })
    }

    fn check_call(&mut self, expr: &Expr, callee: &'ast Expr, args: &'ast [Expr]) -> Checked {
        let sig = callee.as_ident().and_then(|ident| self.functions.get(ident.as_str()));
        let sig = sig.map(|sig| (sig.def, sig.params.clone(), sig.ret.clone()));
        let Some((def, params, ret)) = sig else {
            for arg in args {
                self.check_value(arg, None);
            }
            return match callee.as_ident() {
                Some(ident) if self.lookup(ident.as_str()).is_none() => {
                    self.err(TypeError::UndefinedIdentifier {
                        name: ident.name.clone(),
                        span: ident.span,
                    })
                }
                _ => self.err(TypeError::NotCallable { span: callee.span }),
            };
        };
        self.bindings.insert(callee.id, def.id);

        if args.len() != params.len() {
            for arg in args {
                self.check_value(arg, None);
            }
            return self.err(TypeError::ArgumentCount {
                name: def.name.name.clone(),
                expected: params.len(),
                found: args.len(),
                span: expr.span,
            });
        }
        for (arg, param) in args.iter().zip(&params) {
            if let Some(ty) = self.check_value(arg, param.as_ref())
                && let Some(param) = param
            {
                self.expect_assignable(param, &ty, arg.span);
            }
        }

        match ret {
            Some(ty) => Checked::Ty(ty),
            None if def.ret.is_some() => Checked::Err,
            None => Checked::Void(def.name.name.clone()),
        }
    }

    fn check_array(
        &mut self,
        expr: &Expr,
        elements: &'ast [Expr],
        expected: Option<&Type>,
    ) -> Checked {
        let hint = match expected {
            Some(Type::Array { element, .. }) => Some(element.as_ref().clone()),
            _ => None,
        };
        let Some(first) = elements.first() else {
            return match hint {
                Some(element) => {
                    Checked::Ty(Type::Array { element: Box::new(element), size: Some(0) })
                }
                None => self.err(TypeError::EmptyArrayLiteral { span: expr.span }),
            };
        };

        let mut element = hint.clone().or_else(|| self.check_value(first, None));
        let mut ok = element.is_some();
        for (i, elem) in elements.iter().enumerate() {
            if i == 0 && hint.is_none() {
                continue;
            }
            let Some(ty) = self.check_value(elem, element.as_ref()) else {
                ok = false;
                continue;
            };
            let Some(current) = &element else { continue };
            if current.is_assignable(&ty) {
                continue;
            }
            if hint.is_none() && ty.is_assignable(current) {
                element = Some(ty);
            } else {
                self.error(TypeError::NotAssignable {
                    expected: current.clone(),
                    found: ty,
                    span: elem.span,
                });
                ok = false;
            }
        }

        let Some(element) = element.filter(|_| ok) else { return Checked::Err };
        if !element.is_word() {
            return self.err(TypeError::InvalidOperand { op: "[]", ty: element, span: expr.span });
        }
        Checked::Ty(Type::Array { element: Box::new(element), size: Some(elements.len() as u64) })
    }

    // --- Helpers ---------------------------------------------------------------------------------

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
    }

    fn declare(&mut self, name: &'ast Ident, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.as_str(), binding);
        }
    }

    fn expect_assignable(&mut self, target: &Type, source: &Type, span: Span) {
        if !target.is_assignable(source) {
            self.error(TypeError::NotAssignable {
                expected: target.clone(),
                found: source.clone(),
                span,
            });
        }
    }

    fn duplicate(&mut self, name: &Ident) {
        self.error(TypeError::DuplicateDefinition { name: name.name.clone(), span: name.span });
    }

    fn error(&mut self, error: TypeError) {
        trace!(%error, "type error");
        self.errors.push(error);
    }

    fn err(&mut self, error: TypeError) -> Checked {
        self.error(error);
        Checked::Err
    }
}

/// Returns `true` for integer literals and negated integer literals.
fn is_number_literal(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Lit(Lit::Number(_)) => true,
        ExprKind::Unary(op, operand) => op.kind == UnOpKind::Neg && is_number_literal(operand),
        _ => false,
    }
}
