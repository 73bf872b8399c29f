//! Assignment, compound assignment and `++`/`--`.

use crate::ast::{AssignOp, Expr, ExprKind, InfixOp, PostfixOp};
use crate::decimal::Decimal;
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::environment::AssignError;
use crate::interpreter::value::Object;
use crate::span::Span;

use super::{Interpreter, RuntimeResult};

/// An assignable location with its container already evaluated.
enum Place {
    Name(String),
    Index(Object, Object),
    Member(Object, String),
}

impl Interpreter {
    fn resolve_place(&mut self, target: &Expr) -> RuntimeResult<Place> {
        match &target.kind {
            ExprKind::Identifier(name) => Ok(Place::Name(name.clone())),
            ExprKind::Index { object, index } => {
                let container = self.evaluate_operand(object)?;
                let index = self.evaluate_operand(index)?;
                Ok(Place::Index(container, index))
            }
            ExprKind::Member { object, name } => {
                let receiver = self.evaluate_operand(object)?;
                Ok(Place::Member(receiver, name.clone()))
            }
            _ => Err(RuntimeError::generic("invalid assignment target", target.span)),
        }
    }

    fn read_place(&mut self, place: &Place, span: Span) -> RuntimeResult<Object> {
        match place {
            Place::Name(name) => self.lookup_identifier(name, span),
            Place::Index(container, index) => self.index_value(container, index, span),
            Place::Member(receiver, name) => self.member_value(receiver, name, span),
        }
    }

    fn write_place(&mut self, place: Place, value: Object, span: Span) -> RuntimeResult<()> {
        match place {
            Place::Name(name) => self.scope.reset(&name, value).map_err(|err| match err {
                AssignError::ReadOnly(name) => RuntimeError::new(ErrorKind::ConstNotAssign(name), span),
            }),
            Place::Index(container, index) => self.set_index_value(&container, index, value, span),
            Place::Member(receiver, name) => self.set_member_value(&receiver, &name, value, span),
        }
    }

    pub(crate) fn evaluate_assign(&mut self, target: &Expr, op: AssignOp, value: &Expr, span: Span) -> RuntimeResult<Object> {
        let place = self.resolve_place(target)?;
        let value = match op.infix() {
            None => self.evaluate(value)?,
            Some(infix) => {
                let current = self.read_place(&place, span)?;
                let operand = self.evaluate_operand(value)?;
                self.compound(infix, op, current, operand, span)?
            }
        };
        self.write_place(place, value.clone(), span)?;
        Ok(value)
    }

    fn compound(&self, infix: InfixOp, op: AssignOp, current: Object, operand: Object, span: Span) -> RuntimeResult<Object> {
        let (left, right) = (current.type_name(), operand.type_name());
        self.apply_infix(infix, current, operand, span).map_err(|err| match err.kind {
            ErrorKind::InfixOp { .. } => RuntimeError::new(
                ErrorKind::ModAssignOp {
                    left,
                    op: op.to_string(),
                    right,
                },
                span,
            ),
            _ => err,
        })
    }

    /// `x++` / `x--`: stores the stepped value and yields the previous one.
    pub(crate) fn evaluate_postfix(&mut self, op: PostfixOp, operand: &Expr, span: Span) -> RuntimeResult<Object> {
        let place = self.resolve_place(operand)?;
        let current = self.read_place(&place, span)?;
        let delta: i64 = match op {
            PostfixOp::Increment => 1,
            PostfixOp::Decrement => -1,
        };
        let stepped = match &current {
            Object::Integer(n) => Object::Integer(n.wrapping_add(delta)),
            Object::UInteger(n) => Object::UInteger(n.wrapping_add_signed(delta)),
            Object::Float(f) => Object::Float(f + delta as f64),
            Object::Decimal(d) => Object::Decimal(d.add(&Decimal::from_i64(delta))),
            other => {
                return Err(RuntimeError::new(
                    ErrorKind::PostfixOp {
                        op: op.to_string(),
                        operand: other.type_name(),
                    },
                    span,
                ))
            }
        };
        self.write_place(place, stepped, span)?;
        Ok(current)
    }
}
