//! Expression compilation/evaluation collaborator.
//!
//! Path parsing and compilation live outside the core; the recursive-path
//! builtin drives this seam to repeatedly apply a sub-expression.

use std::any::Any;
use std::fmt::Debug;
use std::rc::Rc;

use crate::context::{DynamicContext, StaticContext};
use crate::error::MetapathError;
use crate::types::{Item, Sequence};

/// An opaque compiled expression. `plan` is whatever artifact the
/// implementing compiler wants to carry between `compile` and `evaluate`.
#[derive(Clone)]
pub struct CompiledExpression {
    pub text: String,
    pub plan: Rc<dyn Any>,
}

impl CompiledExpression {
    pub fn new(text: impl Into<String>, plan: Rc<dyn Any>) -> Self {
        Self {
            text: text.into(),
            plan,
        }
    }
}

impl Debug for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("text", &self.text)
            .finish()
    }
}

pub trait ExpressionEvaluator {
    fn compile(
        &self,
        text: &str,
        static_context: &StaticContext,
    ) -> Result<CompiledExpression, MetapathError>;

    fn evaluate(
        &self,
        expression: &CompiledExpression,
        focus: &Item,
        context: &DynamicContext,
    ) -> Result<Sequence, MetapathError>;
}
