//! Insertion Strategy Selector
//!
//! Walks a matched type's candidate method signatures in priority order
//! against the instrumentation backend, stopping at the first applied
//! insertion. A candidate list that comes up entirely empty degrades
//! detection coverage for that type only; it is never a fatal condition.

use tracing::debug;

use crate::backend::{HookFragment, InsertionOutcome, InstrumentationBackend};
use crate::error::EngineError;
use crate::types::{HookSpec, InsertionPoint, MethodSig};

/// One insertion the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AppliedInsertion {
    pub method: MethodSig,
    pub point: InsertionPoint,
}

/// Result of selecting insertions for one hook spec.
#[derive(Debug, Clone)]
pub struct Selection {
    pub applied: Vec<AppliedInsertion>,
    /// Set when every candidate was absent on the target type.
    pub fault: Option<EngineError>,
}

impl Selection {
    pub fn is_instrumented(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Tries the spec's candidates in fixed priority order.
///
/// The first `Applied` wins and later candidates are not also hooked, so a
/// single logical fetch is never reported twice. Selection is deterministic:
/// the same spec against the same backend surface always yields the same
/// choice.
pub fn select(spec: &HookSpec, backend: &mut dyn InstrumentationBackend) -> Selection {
    let fragment = HookFragment {
        check_type: spec.family.check_type(),
        server: spec.family.server_tag(),
        capture: spec.capture_source(),
        exception_types: spec.exception_types,
    };

    let mut tried = Vec::with_capacity(spec.candidates.len());

    for candidate in spec.candidates {
        match backend.insert(&spec.type_name, candidate, spec.insertion_point, &fragment) {
            InsertionOutcome::Applied => {
                debug!(
                    type_name = %spec.type_name,
                    method = candidate.name,
                    descriptor = candidate.descriptor,
                    point = ?spec.insertion_point,
                    "insertion applied"
                );
                return Selection {
                    applied: vec![AppliedInsertion {
                        method: *candidate,
                        point: spec.insertion_point,
                    }],
                    fault: None,
                };
            }
            InsertionOutcome::NotFound => {
                debug!(
                    type_name = %spec.type_name,
                    method = candidate.name,
                    descriptor = candidate.descriptor,
                    "candidate absent, trying next"
                );
                tried.push(format!("{}{}", candidate.name, candidate.descriptor));
            }
        }
    }

    Selection {
        applied: Vec::new(),
        fault: Some(EngineError::insertion_not_found(
            spec.type_name.clone(),
            tried,
        )),
    }
}
