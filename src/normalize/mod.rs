//! Result Normalizer
//!
//! Converts the value captured at an instrumented call site into the uniform
//! attribute map handed to the policy checker. One extraction strategy per
//! result shape, selected by the closed shape enum rather than re-matched
//! per call. The entry point never panics: every internal failure is caught
//! and degrades to a partial or empty record with an explicit fault value,
//! because a normalization fault must never abort the caller's in-flight
//! database operation.

mod cells;
mod opaque;
mod relational;

use crate::config::ExclusionRules;
use crate::error::EngineError;
use crate::raw::RawResult;
use crate::types::{Family, NormalizedRecord, ResultShape};

/// A normalization outcome: the record to dispatch, plus the fault that
/// degraded it, if any. The dispatch gate decides to log-and-continue.
#[derive(Debug)]
pub struct Extraction {
    pub record: NormalizedRecord,
    pub fault: Option<EngineError>,
}

impl Extraction {
    fn clean(record: NormalizedRecord) -> Self {
        Self {
            record,
            fault: None,
        }
    }

    fn degraded(record: NormalizedRecord, fault: EngineError) -> Self {
        Self {
            record,
            fault: Some(fault),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.fault.is_some()
    }
}

/// Normalizes one captured result.
///
/// Normalizing the same unchanged capture twice yields an identical record
/// both times; nothing here mutates the capture.
pub fn normalize(
    family: Family,
    shape: ResultShape,
    raw: &dyn RawResult,
    rules: &ExclusionRules,
    max_render_len: usize,
) -> Extraction {
    let server = family.server_tag();

    match shape {
        ResultShape::SingleRow | ResultShape::RowCursor => relational::extract(server, raw),
        ResultShape::CellList => cells::extract(server, raw, rules),
        ResultShape::RawOpaque => opaque::extract(server, raw, max_render_len),
    }
}
