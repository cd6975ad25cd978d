//! Cell-list extraction
//!
//! Handles the `CellList` shape: iterate the ordered qualifier/value cell
//! sequence for one logical row and decode both sides with the fixed
//! byte-to-string transformation. Input order is preserved exactly as the
//! source produced it, so a repeated qualifier resolves to the last cell.
//!
//! The dynamic fallback walks the cell-sequence accessors of successive
//! library generations and guards against non-data marker entries certain
//! deployments interleave with real cells.

use tracing::debug;

use super::Extraction;
use crate::config::ExclusionRules;
use crate::error::EngineError;
use crate::raw::{decode_bytes, missing_accessor, DynAccess, DynValue, RawResult};
use crate::types::{NormalizedRecord, Value};

/// Cell-sequence accessors across library generations, newest first.
const CELL_ACCESSORS: &[&str] = &["listCells", "list", "raw"];

pub(super) fn extract(
    server: &'static str,
    raw: &dyn RawResult,
    rules: &ExclusionRules,
) -> Extraction {
    if let Some(cells) = raw.as_cells() {
        let mut record = NormalizedRecord::empty(server);
        for cell in cells.cells() {
            let qualifier = decode_bytes(cell.qualifier);
            let value = decode_bytes(cell.value);
            record.result.insert(qualifier, Value::Text(value));
        }
        return Extraction::clean(record);
    }

    if let Some(dyn_access) = raw.as_dynamic() {
        debug!(server, "cell view unavailable, using dynamic access");
        return extract_dynamic(server, dyn_access, rules);
    }

    Extraction::degraded(
        NormalizedRecord::empty(server),
        EngineError::extraction_failed(format!(
            "capture offers neither cell nor dynamic view (server {server})"
        )),
    )
}

fn extract_dynamic(
    server: &'static str,
    dyn_access: &dyn DynAccess,
    rules: &ExclusionRules,
) -> Extraction {
    let mut record = NormalizedRecord::empty(server);

    let Some((accessor, cells)) = CELL_ACCESSORS
        .iter()
        .find_map(|a| dyn_access.get(a).map(|v| (*a, v)))
    else {
        return Extraction::degraded(record, missing_accessor(dyn_access, CELL_ACCESSORS[0]));
    };

    let DynValue::List(cells) = cells else {
        return Extraction::degraded(
            record,
            EngineError::extraction_failed(format!(
                "{accessor} returned a non-sequence value on {}",
                dyn_access.runtime_type()
            )),
        );
    };

    let mut fault = None;

    for entry in cells {
        match entry {
            DynValue::Cell(qualifier, value) => {
                let qualifier = decode_bytes(&qualifier);
                if rules.is_excluded(&qualifier) {
                    debug!(server, qualifier = %qualifier, "excluded marker qualifier");
                    continue;
                }
                record
                    .result
                    .insert(qualifier, Value::Text(decode_bytes(&value)));
            }
            other => {
                fault.get_or_insert_with(|| {
                    EngineError::extraction_failed(format!(
                        "{accessor} yielded a non-cell entry {other:?}"
                    ))
                });
            }
        }
    }

    match fault {
        Some(e) => Extraction::degraded(record, e),
        None => Extraction::clean(record),
    }
}
