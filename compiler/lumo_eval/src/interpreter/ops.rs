//! Operators, indexing and coercions with meta-method dispatch.
//!
//! Every operation probes the operands for an override first. Unary
//! meta-methods receive the object as receiver and no arguments; binary ones
//! receive the object that defines them as receiver and `[lhs, rhs]` as
//! arguments, so a meta found on the right operand still sees the operands
//! in source order.

use std::cmp::Ordering;

use parking_lot::Mutex;

use lumo_ir::{BinaryOp, CompareOp, UnaryOp};
use lumo_value::{
    invalid_meta_result, not_indexable, type_mismatch, Arity, EvalError, EvalResult, MetaKey,
    NativeFunction, Number, Str, Value,
};

use super::Interpreter;

impl Interpreter {
    /// Call meta-method `key` of `target`, or `None` when it has none.
    fn call_meta(&mut self, key: MetaKey, target: &Value, args: &[Value]) -> Option<EvalResult> {
        let meta = target.meta(key)?;
        Some(self.call_function(&meta, target.clone(), args))
    }

    /// Try `key` on the left operand, then on the right.
    fn call_binary_meta(&mut self, key: MetaKey, lhs: &Value, rhs: &Value) -> Option<EvalResult> {
        let operands = [lhs.clone(), rhs.clone()];
        match self.call_meta(key, lhs, &operands) {
            Some(result) => Some(result),
            None => self.call_meta(key, rhs, &operands),
        }
    }

    pub(super) fn binary(&mut self, op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult {
        if let Some(result) = self.call_binary_meta(MetaKey::for_binary(op), lhs, rhs) {
            return result;
        }
        if op == BinaryOp::Add {
            match (lhs, rhs) {
                (Value::Str(_), other) if other.meta(MetaKey::ToStr).is_some() => {
                    let rhs = Value::Str(self.coerce_str(other)?);
                    return self.context.arithmetic().binary(op, lhs, &rhs);
                }
                (other, Value::Str(_)) if other.meta(MetaKey::ToStr).is_some() => {
                    let lhs = Value::Str(self.coerce_str(other)?);
                    return self.context.arithmetic().binary(op, &lhs, rhs);
                }
                _ => {}
            }
        }
        self.context.arithmetic().binary(op, lhs, rhs)
    }

    pub(super) fn unary(&mut self, op: UnaryOp, operand: &Value) -> EvalResult {
        match op {
            UnaryOp::Neg => match self.call_meta(MetaKey::Neg, operand, &[]) {
                Some(result) => result,
                None => self.context.arithmetic().negate(operand),
            },
            UnaryOp::Not => self.truthy(operand).map(|b| Value::Bool(!b)),
        }
    }

    pub(super) fn compare(&mut self, op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
        Ok(match op {
            CompareOp::Eq => self.values_equal(lhs, rhs)?,
            CompareOp::NotEq => !self.values_equal(lhs, rhs)?,
            CompareOp::Lt => self.ordering(lhs, rhs)?.is_lt(),
            CompareOp::LtEq => self.ordering(lhs, rhs)?.is_le(),
            CompareOp::Gt => self.ordering(lhs, rhs)?.is_gt(),
            CompareOp::GtEq => self.ordering(lhs, rhs)?.is_ge(),
        })
    }

    /// Equality: `__eq` when either side defines it, otherwise structural
    /// for value kinds and identity for references.
    pub(crate) fn values_equal(&mut self, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
        match self.call_binary_meta(MetaKey::Eq, lhs, rhs) {
            Some(result) => {
                let verdict = result?;
                self.truthy(&verdict)
            }
            None => Ok(lhs.equals(rhs)),
        }
    }

    fn ordering(&mut self, lhs: &Value, rhs: &Value) -> Result<Ordering, EvalError> {
        let Some(result) = self.call_binary_meta(MetaKey::Compare, lhs, rhs) else {
            return self.context.arithmetic().compare(lhs, rhs);
        };
        let verdict = result?;
        verdict
            .coerce_number()
            .ok()
            .and_then(|n| n.partial_cmp_num(Number::Int(0)))
            .ok_or_else(|| invalid_meta_result(MetaKey::Compare, verdict.type_name()))
    }

    /// Read `target[key]`. A missing key falls through to `__index`.
    pub(crate) fn get_index(&mut self, target: &Value, key: &Value) -> EvalResult {
        let Value::Object(object) = target else {
            return Err(not_indexable(target.type_name()));
        };
        let value = object.get(key);
        if !value.is_nil() {
            return Ok(value);
        }
        self.call_meta(MetaKey::Index, target, std::slice::from_ref(key))
            .unwrap_or(Ok(Value::Nil))
    }

    /// Write `target[key] = value`, routed through `__setindex` when bound.
    pub(crate) fn put_index(&mut self, target: &Value, key: Value, value: Value) -> Result<(), EvalError> {
        let Value::Object(object) = target else {
            return Err(not_indexable(target.type_name()));
        };
        if let Some(meta) = target.meta(MetaKey::SetIndex) {
            return self.call_function(&meta, target.clone(), &[key, value]).map(drop);
        }
        object.set(key, value);
        Ok(())
    }

    /// Run a coercion meta-method. Its result must be a value kind.
    fn coercion_meta(&mut self, key: MetaKey, value: &Value) -> Result<Option<Value>, EvalError> {
        let Some(result) = self.call_meta(key, value, &[]) else {
            return Ok(None);
        };
        let converted = result?;
        if converted.is_reference() {
            return Err(invalid_meta_result(key, converted.type_name()));
        }
        Ok(Some(converted))
    }

    pub(crate) fn coerce_int(&mut self, value: &Value) -> Result<i64, EvalError> {
        match self.coercion_meta(MetaKey::ToInt, value)? {
            Some(v) => v
                .coerce_int()
                .map_err(|_| invalid_meta_result(MetaKey::ToInt, v.type_name())),
            None => value.coerce_int(),
        }
    }

    pub(crate) fn coerce_float(&mut self, value: &Value) -> Result<f64, EvalError> {
        match self.coercion_meta(MetaKey::ToFloat, value)? {
            Some(v) => v
                .coerce_float()
                .map_err(|_| invalid_meta_result(MetaKey::ToFloat, v.type_name())),
            None => value.coerce_float(),
        }
    }

    pub(crate) fn coerce_str(&mut self, value: &Value) -> Result<Str, EvalError> {
        if let Some(v) = self.coercion_meta(MetaKey::ToStr, value)? {
            return Ok(v.coerce_str());
        }
        match value {
            Value::Object(_) => {
                let mut out = String::new();
                self.write_display(&mut out, value, false, &mut Vec::new())?;
                Ok(Str::from(out))
            }
            _ => Ok(value.coerce_str()),
        }
    }

    /// Structural display in which nested values with `__str` render through it.
    fn write_display(
        &mut self,
        out: &mut String,
        value: &Value,
        nested: bool,
        seen: &mut Vec<*const ()>,
    ) -> Result<(), EvalError> {
        if nested {
            if let Some(v) = self.coercion_meta(MetaKey::ToStr, value)? {
                out.push_str(&v.coerce_str());
                return Ok(());
            }
        }
        match value {
            Value::Object(object) => {
                let ptr = object.as_ptr();
                if seen.contains(&ptr) {
                    out.push_str("{...}");
                    return Ok(());
                }
                seen.push(ptr);
                out.push('{');
                for (i, (k, v)) in object.entries().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_display(out, k, true, seen)?;
                    out.push_str(": ");
                    self.write_display(out, v, true, seen)?;
                }
                seen.pop();
                out.push('}');
            }
            Value::Str(s) if nested => out.push_str(&format!("{s:?}")),
            other => out.push_str(&other.to_string()),
        }
        Ok(())
    }

    pub(crate) fn truthy(&mut self, value: &Value) -> Result<bool, EvalError> {
        Ok(match self.coercion_meta(MetaKey::ToBool, value)? {
            Some(v) => v.truthy(),
            None => value.truthy(),
        })
    }

    /// Length: `__len`, entry count of an object, or characters of a string.
    pub(crate) fn length_of(&mut self, value: &Value) -> Result<i64, EvalError> {
        if let Some(result) = self.call_meta(MetaKey::Len, value, &[]) {
            let len = result?;
            return len
                .coerce_number()
                .ok()
                .and_then(Number::to_i64)
                .ok_or_else(|| invalid_meta_result(MetaKey::Len, len.type_name()));
        }
        match value {
            Value::Object(object) => Ok(saturating_i64(object.len())),
            Value::Str(s) => Ok(saturating_i64(s.char_len())),
            other => Err(type_mismatch("object or string", other.type_name())),
        }
    }

    /// Turn a value into an iterator function: a function called with no
    /// arguments that returns the next item, or Nil when exhausted.
    pub(super) fn iterate(&mut self, value: &Value) -> EvalResult {
        if let Some(result) = self.call_meta(MetaKey::Iter, value, &[]) {
            let iter = result?;
            return match iter {
                Value::Function(_) => Ok(iter),
                other => Err(invalid_meta_result(MetaKey::Iter, other.type_name())),
            };
        }
        match value {
            Value::Function(_) => Ok(value.clone()),
            Value::Object(object) => Ok(snapshot_iterator(object.keys())),
            Value::Str(s) => Ok(snapshot_iterator(
                s.chars().map(|c| Value::from(c.to_string())).collect(),
            )),
            other => Err(type_mismatch("iterable", other.type_name())),
        }
    }
}

/// Iterator over items collected up front. Later mutation of the source is
/// not observed.
fn snapshot_iterator(items: Vec<Value>) -> Value {
    let items = Mutex::new(items.into_iter());
    NativeFunction::new("<iterator>", Arity::Any, move |_| {
        Ok(items.lock().next().unwrap_or_default())
    })
    .into_value()
}

#[inline]
fn saturating_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
