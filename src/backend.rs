//! Instrumentation backend boundary
//!
//! The engine never rewrites bytecode itself. It hands the backend a target
//! type, a method signature, an insertion point, and a fragment describing
//! the call-out to emit; the backend answers per attempt whether the
//! signature was present and rewritten.

use serde::Serialize;

use crate::types::{CaptureSource, CheckType, InsertionPoint, MethodSig};

/// Outcome of one insertion attempt against a target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsertionOutcome {
    /// The method signature was present and the fragment was inserted.
    Applied,
    /// The method signature is absent on this type (library-version skew).
    NotFound,
}

/// Everything the rewriter needs to emit the engine call-out at one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HookFragment {
    /// Check-type tag the emitted call passes to the dispatch gate.
    pub check_type: CheckType,
    /// Server tag baked into the emitted call.
    pub server: &'static str,
    /// Which value the fragment captures at the call site.
    pub capture: CaptureSource,
    /// Throwable type names the emitted call site must tolerate.
    pub exception_types: &'static [&'static str],
}

/// Bytecode-rewriting collaborator, implemented by the embedder.
pub trait InstrumentationBackend {
    /// Attempts one insertion. Must not probe other signatures on its own:
    /// the selector owns the fallback order.
    fn insert(
        &mut self,
        type_name: &str,
        method: &MethodSig,
        point: InsertionPoint,
        fragment: &HookFragment,
    ) -> InsertionOutcome;
}
