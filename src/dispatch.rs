//! Dispatch Gate
//!
//! The single call-out point to the external policy checker. Invoked exactly
//! once per extraction that reaches it, degraded or not. The gate's own glue
//! (diagnostic recording) is fallible; a glue failure is logged and the
//! checker is still invoked with whatever record exists. Decisions the
//! checker raises intentionally are not the gate's to suppress.

use std::sync::Arc;

use tracing::warn;

use crate::diagnostics::{DiagnosticsStore, HookEvent, HookEventKind};
use crate::error::EngineError;
use crate::normalize::Extraction;
use crate::types::{CheckType, NormalizedRecord};

/// External policy checker collaborator, implemented by the embedder.
///
/// No return value is consumed by this engine; a blocking decision is the
/// checker's own mechanism to signal upward.
pub trait PolicyChecker: Send + Sync {
    fn check(&self, check_type: CheckType, record: &NormalizedRecord);
}

/// Wraps the policy checker call-out.
pub struct DispatchGate {
    checker: Arc<dyn PolicyChecker>,
    diagnostics: Arc<DiagnosticsStore>,
}

impl DispatchGate {
    pub fn new(checker: Arc<dyn PolicyChecker>, diagnostics: Arc<DiagnosticsStore>) -> Self {
        Self {
            checker,
            diagnostics,
        }
    }

    /// Dispatches one extraction to the policy checker.
    ///
    /// The checker is invoked exactly once per call, even when the record is
    /// partial or the gate's own bookkeeping failed.
    pub fn dispatch(&self, check_type: CheckType, extraction: &Extraction) {
        if let Err(glue_fault) = self.record_degradation(check_type, extraction) {
            warn!(
                check_type = check_type.as_str(),
                error = %glue_fault,
                "dispatch bookkeeping failed, invoking checker anyway"
            );
        }

        self.checker.check(check_type, &extraction.record);
    }

    /// Bookkeeping ahead of the checker call. Kept behind a `Result` so a
    /// bug here can never swallow the dispatch itself.
    fn record_degradation(
        &self,
        check_type: CheckType,
        extraction: &Extraction,
    ) -> Result<(), EngineError> {
        let Some(fault) = &extraction.fault else {
            return Ok(());
        };

        warn!(
            check_type = check_type.as_str(),
            server = extraction.record.server,
            error = %fault,
            "extraction degraded, dispatching partial record"
        );

        let detail = serde_json::to_string(fault)
            .map_err(|e| EngineError::dispatch_failed(format!("fault rendering failed: {e}")))?;

        self.diagnostics.record(HookEvent::new(
            HookEventKind::ExtractionDegraded,
            extraction.record.server,
            detail,
        ));

        Ok(())
    }
}
