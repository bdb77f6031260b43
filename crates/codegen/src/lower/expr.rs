//! Expression lowering.

use super::{FunctionLowerer, IrgenError, Result};
use crate::ir::{
    BinOp, Constant, EnvOp, InstKind, Location, OffsetKind, SlotKind, Terminator, UnaryOp, Value,
};
use alloy_primitives::U256;
use bugc_ast::{self as ast, ExprKind, Lit, Special, UnOpKind};
use bugc_interface::Span;
use bugc_sema::{Type, WORD_SIZE};

/// The role an expression is lowered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ExprContext {
    /// Produces a value.
    Rvalue,
    /// The target of an assignment rooted at a storage variable.
    LvalueStorage,
    /// The target of an assignment rooted at a memory-resident composite.
    LvalueMemory,
}

/// A resolved location.
#[derive(Clone, Debug)]
pub(super) enum Place {
    /// A word-typed local variable.
    Local(ast::NodeId),
    /// A storage slot.
    Storage { slot: Value, ty: Type },
    /// A memory offset.
    Memory { offset: Value, ty: Type },
}

impl Place {
    fn ty(&self) -> Option<&Type> {
        match self {
            Self::Local(_) => None,
            Self::Storage { ty, .. } | Self::Memory { ty, .. } => Some(ty),
        }
    }
}

impl FunctionLowerer<'_> {
    /// Lowers an expression producing a single word.
    pub(super) fn lower_expr(&mut self, expr: &ast::Expr) -> Result<Value> {
        let ty = self.cx.type_of(expr.id, expr.span)?;
        if ty.is_composite() {
            return self.lower_reference(expr).map(|(value, _)| value);
        }
        let span = expr.span;
        match &expr.kind {
            ExprKind::Lit(lit) => {
                let value = match lit {
                    Lit::Bool(b) => Constant::Bool(*b),
                    Lit::Number(n) => Constant::Int(*n),
                    Lit::Address(address) => Constant::Int(U256::from_be_slice(address.as_slice())),
                    Lit::Str(s) => Constant::Str(s.clone()),
                };
                self.constant(value, ty, span)
            }
            ExprKind::Special(special) => {
                let op = match special {
                    Special::MsgSender => EnvOp::Caller,
                    Special::MsgValue => EnvOp::CallValue,
                    Special::BlockTimestamp => EnvOp::Timestamp,
                    Special::BlockNumber => EnvOp::Number,
                    // `msg.data` is the calldata region starting at offset 0.
                    Special::MsgData => return Ok(Value::int(U256::ZERO, ty)),
                };
                self.b.emit_value(ty, span, |dest| InstKind::Env { op, dest })
            }
            ExprKind::Unary(op, operand) => match op.kind {
                UnOpKind::Neg => {
                    if let ExprKind::Lit(Lit::Number(n)) = &operand.kind {
                        return self.constant(Constant::Int(U256::ZERO.wrapping_sub(*n)), ty, span);
                    }
                    let operand = self.lower_expr(operand)?;
                    self.b.emit_value(ty, span, |dest| InstKind::Unary {
                        op: UnaryOp::Neg,
                        operand,
                        dest,
                    })
                }
                UnOpKind::Not => {
                    let operand = self.lower_expr(operand)?;
                    self.b.emit_value(ty, span, |dest| InstKind::Unary {
                        op: UnaryOp::Not,
                        operand,
                        dest,
                    })
                }
            },
            ExprKind::Binary(lhs, op, rhs) => {
                // Both operands are always evaluated.
                let left = self.lower_expr(lhs)?;
                let right = self.lower_expr(rhs)?;
                let op = BinOp::from_ast(op.kind);
                let result = ty.clone();
                self.b.emit_value(ty, span, |dest| InstKind::Binary {
                    op,
                    left,
                    right,
                    ty: result,
                    dest,
                })
            }
            ExprKind::Cast(value, _) => {
                let value = self.lower_expr(value)?;
                let to = ty.clone();
                self.b.emit_value(ty, span, |dest| InstKind::Cast { value, to, dest })
            }
            ExprKind::Keccak256(value) => {
                let value = self.lower_expr(value)?;
                self.b.emit_value(ty, span, |dest| InstKind::Hash { value, dest })
            }
            ExprKind::Call(callee, args) => self
                .lower_call(expr, callee, args)?
                .ok_or_else(|| IrgenError::internal("call without a value used as a value", span)),
            ExprKind::Member(base, member)
                if member.as_str() == "length"
                    && !matches!(self.cx.typed.type_of(base.id), Some(Type::Struct(_))) =>
            {
                self.lower_length(base, span)
            }
            ExprKind::Ident(_) | ExprKind::Index(..) | ExprKind::Member(..) => {
                let place = self.lower_place(expr, ExprContext::Rvalue)?;
                self.read_place(place, span)
            }
            ExprKind::Array(_) => Err(IrgenError::internal("array literal used as a word", span)),
        }
    }

    /// Lowers an expression denoting a composite value to a pointer into its location.
    pub(super) fn lower_reference(&mut self, expr: &ast::Expr) -> Result<(Value, Location)> {
        match &expr.kind {
            ExprKind::Array(elements) => {
                let ty = self.cx.type_of(expr.id, expr.span)?;
                Ok((self.lower_array(elements, &ty, expr.span)?, Location::Memory))
            }
            ExprKind::Special(Special::MsgData) => {
                Ok((Value::int(U256::ZERO, Type::Bytes), Location::Calldata))
            }
            _ => match self.lower_place(expr, ExprContext::Rvalue)? {
                Place::Storage { slot, .. } => Ok((slot, Location::Storage)),
                Place::Memory { offset, .. } => Ok((offset, Location::Memory)),
                Place::Local(decl) => {
                    let view = self.b.local(decl).and_then(|local| local.view);
                    match (self.b.lookup(decl).cloned(), view) {
                        (Some(value), Some(view)) => Ok((value, view)),
                        _ => Err(IrgenError::internal("local is not a reference", expr.span)),
                    }
                }
            },
        }
    }

    /// Selects the context an assignment target is lowered in, from the variable it is rooted at.
    pub(super) fn lvalue_context(&self, target: &ast::Expr) -> Result<ExprContext> {
        let mut root = target;
        while let ExprKind::Index(base, _) | ExprKind::Member(base, _) = &root.kind {
            root = &**base;
        }
        let ExprKind::Ident(ident) = &root.kind else {
            return Err(IrgenError::InvalidLvalue { span: target.span });
        };
        let decl = self.cx.typed.binding(root.id).ok_or_else(|| IrgenError::UnknownIdentifier {
            name: ident.name.clone(),
            span: ident.span,
        })?;
        if self.cx.storage.contains_key(&decl) {
            return Ok(ExprContext::LvalueStorage);
        }
        match self.b.local(decl).map(|local| (local, local.view)) {
            Some((_, Some(Location::Memory))) => Ok(ExprContext::LvalueMemory),
            Some((local, Some(Location::Storage))) => Err(IrgenError::StorageAliasWrite {
                name: local.name.clone(),
                ty: local.ty.clone(),
                span: target.span,
            }),
            _ => Err(IrgenError::InvalidLvalue { span: target.span }),
        }
    }

    /// Resolves an expression to the location it denotes.
    pub(super) fn lower_place(&mut self, expr: &ast::Expr, cx: ExprContext) -> Result<Place> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Ident(ident) => {
                let decl = self.cx.typed.binding(expr.id).ok_or_else(|| {
                    IrgenError::UnknownIdentifier { name: ident.name.clone(), span: ident.span }
                })?;
                if let Some(local) = self.b.local(decl) {
                    let Some(view) = local.view else { return Ok(Place::Local(decl)) };
                    if cx != ExprContext::Rvalue && view == Location::Storage {
                        return Err(IrgenError::StorageAliasWrite {
                            name: local.name.clone(),
                            ty: local.ty.clone(),
                            span,
                        });
                    }
                    let ty = local.ty.clone();
                    let pointer = self.b.lookup(decl).cloned().ok_or_else(|| {
                        IrgenError::UnknownIdentifier { name: ident.name.clone(), span }
                    })?;
                    return match view {
                        Location::Storage => Ok(Place::Storage { slot: pointer, ty }),
                        Location::Memory => Ok(Place::Memory { offset: pointer, ty }),
                        Location::Calldata => Err(IrgenError::UnsupportedStorageAccess {
                            what: "calldata element access".into(),
                            span,
                        }),
                    };
                }
                if let Some(decl) = self.cx.storage.get(&decl) {
                    if cx == ExprContext::LvalueMemory {
                        return Err(IrgenError::internal("storage root in a memory target", span));
                    }
                    let ty = self.cx.type_of(decl.id, decl.span)?;
                    return Ok(Place::Storage { slot: Value::uint(decl.slot.data), ty });
                }
                Err(IrgenError::UnknownIdentifier { name: ident.name.clone(), span })
            }
            ExprKind::Index(base, index) => {
                let base = self.lower_place(base, cx)?;
                let index = self.lower_expr(index)?;
                self.index_place(base, index, span)
            }
            ExprKind::Member(base, member) => {
                let base = self.lower_place(base, cx)?;
                let Some(Type::Struct(s)) = base.ty() else {
                    return Err(IrgenError::InvalidLvalue { span });
                };
                let (offset, ty) = s.field(member.as_str()).ok_or_else(|| {
                    IrgenError::internal(format!("unknown field `{member}`"), member.span)
                })?;
                let ty = ty.clone();
                match base {
                    Place::Storage { slot, .. } if offset == 0 => Ok(Place::Storage { slot, ty }),
                    Place::Storage { slot, .. } => {
                        let kind = SlotKind::Field { offset };
                        let slot = self.b.emit_value(Type::UINT256, span, |dest| {
                            InstKind::ComputeSlot { kind, base: slot, dest }
                        })?;
                        Ok(Place::Storage { slot, ty })
                    }
                    Place::Memory { offset: base, .. } => {
                        let kind = OffsetKind::Field { offset: offset * WORD_SIZE };
                        let offset = self.b.emit_value(Type::UINT256, span, |dest| {
                            InstKind::ComputeOffset { kind, base, dest }
                        })?;
                        Ok(Place::Memory { offset, ty })
                    }
                    Place::Local(_) => Err(IrgenError::InvalidLvalue { span }),
                }
            }
            ExprKind::Array(elements) if cx == ExprContext::Rvalue => {
                let ty = self.cx.type_of(expr.id, span)?;
                let offset = self.lower_array(elements, &ty, span)?;
                Ok(Place::Memory { offset, ty })
            }
            _ => Err(IrgenError::InvalidLvalue { span }),
        }
    }

    fn index_place(&mut self, base: Place, index: Value, span: Span) -> Result<Place> {
        match base {
            Place::Storage { slot, ty: Type::Array { element, size } } => {
                let data = match size {
                    Some(_) => slot,
                    None => self.b.emit_value(Type::UINT256, span, |dest| {
                        InstKind::ComputeSlot { kind: SlotKind::ArrayData, base: slot, dest }
                    })?,
                };
                let stride = element.storage_slots();
                let offset = if stride == 1 {
                    index
                } else {
                    let right = Value::uint(stride);
                    self.b.emit_value(Type::UINT256, span, |dest| InstKind::Binary {
                        op: BinOp::Mul,
                        left: index,
                        right,
                        ty: Type::UINT256,
                        dest,
                    })?
                };
                let slot = self.b.emit_value(Type::UINT256, span, |dest| InstKind::Binary {
                    op: BinOp::Add,
                    left: data,
                    right: offset,
                    ty: Type::UINT256,
                    dest,
                })?;
                Ok(Place::Storage { slot, ty: *element })
            }
            Place::Storage { slot, ty: Type::Mapping { value, .. } } => {
                let slot = self.b.emit_value(Type::UINT256, span, |dest| InstKind::ComputeSlot {
                    kind: SlotKind::Mapping { key: index },
                    base: slot,
                    dest,
                })?;
                Ok(Place::Storage { slot, ty: *value })
            }
            Place::Memory { offset: base, ty: Type::Array { element, .. } } => {
                let stride = element.memory_size();
                let offset = self.b.emit_value(Type::UINT256, span, |dest| InstKind::ComputeOffset {
                    kind: OffsetKind::Element { index, stride },
                    base,
                    dest,
                })?;
                Ok(Place::Memory { offset, ty: *element })
            }
            Place::Storage { ty, .. } | Place::Memory { ty, .. } => {
                Err(IrgenError::UnsupportedStorageAccess { what: format!("indexing `{ty}`"), span })
            }
            Place::Local(_) => Err(IrgenError::InvalidLvalue { span }),
        }
    }

    /// Loads the word stored at a place.
    pub(super) fn read_place(&mut self, place: Place, span: Span) -> Result<Value> {
        let (location, address, ty) = match place {
            Place::Local(decl) => {
                return self
                    .b
                    .lookup(decl)
                    .cloned()
                    .ok_or_else(|| IrgenError::internal("read of an unbound local", span));
            }
            Place::Storage { slot, ty } => (Location::Storage, slot, ty),
            Place::Memory { offset, ty } => (Location::Memory, offset, ty),
        };
        let read_ty = ty.clone();
        self.b.emit_value(ty, span, |dest| InstKind::Read { location, address, ty: read_ty, dest })
    }

    /// Stores a word at a place.
    pub(super) fn write_place(&mut self, place: Place, value: Value, span: Span) -> Result<()> {
        let (location, address, ty) = match place {
            Place::Local(_) => return Err(IrgenError::InvalidLvalue { span }),
            Place::Storage { slot, ty } => (Location::Storage, slot, ty),
            Place::Memory { offset, ty } => (Location::Memory, offset, ty),
        };
        let value = value.with_type(ty);
        self.b.emit(InstKind::Write { location, address, value }, span)
    }

    fn lower_length(&mut self, base: &ast::Expr, span: Span) -> Result<Value> {
        let ty = self.cx.type_of(base.id, base.span)?;
        match ty {
            Type::Array { size: Some(size), .. } => Ok(Value::uint(size)),
            Type::Array { size: None, .. } => {
                let (object, location) = self.lower_reference(base)?;
                if location != Location::Storage {
                    return Err(IrgenError::internal("dynamic array outside of storage", span));
                }
                self.b.emit_value(Type::UINT256, span, |dest| InstKind::Length {
                    object,
                    location,
                    dest,
                })
            }
            Type::Bytes if matches!(base.kind, ExprKind::Special(Special::MsgData)) => {
                let object = Value::int(U256::ZERO, Type::Bytes);
                self.b.emit_value(Type::UINT256, span, |dest| InstKind::Length {
                    object,
                    location: Location::Calldata,
                    dest,
                })
            }
            ty => Err(IrgenError::UnsupportedStorageAccess {
                what: format!("length of `{ty}` values"),
                span,
            }),
        }
    }

    /// Allocates memory for an array literal and stores its elements.
    fn lower_array(&mut self, elements: &[ast::Expr], ty: &Type, span: Span) -> Result<Value> {
        let Type::Array { element, .. } = ty else {
            return Err(IrgenError::internal(format!("array literal of type `{ty}`"), span));
        };
        let values = elements.iter().map(|e| self.lower_expr(e)).collect::<Result<Vec<_>>>()?;
        let stride = element.memory_size();
        let size = Value::uint(stride * values.len() as u64);
        let base =
            self.b.emit_value(Type::UINT256, span, |dest| InstKind::Allocate { size, dest })?;
        for (i, value) in values.into_iter().enumerate() {
            let address = if i == 0 {
                base.clone()
            } else {
                let offset = stride * i as u64;
                let base = base.clone();
                self.b.emit_value(Type::UINT256, span, |dest| InstKind::ComputeOffset {
                    kind: OffsetKind::Field { offset },
                    base,
                    dest,
                })?
            };
            let value = value.with_type(element.as_ref().clone());
            self.b.emit(InstKind::Write { location: Location::Memory, address, value }, span)?;
        }
        Ok(base)
    }

    /// Lowers a call to a user function, which ends the current block.
    ///
    /// Returns the result value, if the function has one.
    pub(super) fn lower_call(
        &mut self,
        expr: &ast::Expr,
        callee: &ast::Expr,
        args: &[ast::Expr],
    ) -> Result<Option<Value>> {
        let def = self
            .cx
            .typed
            .binding(callee.id)
            .and_then(|decl| self.cx.functions.get(&decl).copied())
            .ok_or_else(|| IrgenError::UnknownIdentifier {
                name: callee.as_ident().map_or_else(String::new, |i| i.name.clone()),
                span: callee.span,
            })?;

        let mut arguments = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(&def.params) {
            let value = self.lower_expr(arg)?;
            let ty = self.cx.type_of(param.id, param.span)?;
            arguments.push(value.with_type(ty));
        }

        let ret = self.cx.typed.type_of(def.id).cloned();
        let dest = ret.as_ref().map(|_| self.b.new_temp());
        let continuation = self.b.create_block();
        let function = def.name.name.clone();
        trace!(%function, args = arguments.len(), "lowering call");
        self.b.terminate(
            Terminator::Call { function, arguments, dest, continuation },
            expr.span,
        )?;
        self.b.switch_to_block(continuation);
        Ok(dest.zip(ret).map(|(dest, ty)| Value::temp(dest, ty)))
    }

    /// Emits a constant and returns the temporary holding it.
    fn constant(&mut self, value: Constant, ty: Type, span: Span) -> Result<Value> {
        let const_ty = ty.clone();
        self.b.emit_value(ty, span, |dest| InstKind::Const { value, ty: const_ty, dest })
    }
}
