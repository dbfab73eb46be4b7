use crate::types::{FunctionDefinition, FunctionMap};
use std::sync::Arc;

/// Per-call evaluation context.
///
/// A fresh context is built for every `search`; nothing in it outlives the
/// call, so one compiled expression can be evaluated from many threads.
pub struct EvalCtx<'a> {
    /// Functions resolvable by name during this evaluation.
    pub functions: &'a FunctionMap,
}

impl<'a> EvalCtx<'a> {
    pub fn new(functions: &'a FunctionMap) -> Self {
        EvalCtx { functions }
    }

    pub fn function(&self, name: &str) -> Option<&Arc<FunctionDefinition>> {
        self.functions.get(name)
    }
}
