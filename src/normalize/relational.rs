//! Relational row extraction
//!
//! Handles the `SingleRow` and `RowCursor` shapes: read the row count, walk
//! the column metadata, and map each column name to its current value.
//! Column names are unique per result set, so insertion order is
//! immaterial here. When the typed view is unavailable on the running
//! library version, falls back to name-based access over the standard
//! cursor accessors.

use tracing::debug;

use super::Extraction;
use crate::error::EngineError;
use crate::raw::{missing_accessor, DynAccess, DynValue, RawResult, RelationalRow};
use crate::types::{NormalizedRecord, Value};

/// Fallback accessor names on the cursor surface.
const ROW_ACCESSOR: &str = "getRow";
const COLUMN_COUNT_ACCESSOR: &str = "getColumnCount";
const COLUMN_NAME_ACCESSOR: &str = "getColumnName";
const COLUMN_VALUE_ACCESSOR: &str = "getObject";

pub(super) fn extract(server: &'static str, raw: &dyn RawResult) -> Extraction {
    if let Some(row) = raw.as_relational() {
        return extract_typed(server, row);
    }

    if let Some(dyn_access) = raw.as_dynamic() {
        debug!(server, "relational view unavailable, using dynamic access");
        return extract_dynamic(server, dyn_access);
    }

    Extraction::degraded(
        NormalizedRecord::empty(server),
        EngineError::extraction_failed(format!(
            "capture offers neither relational nor dynamic view (server {server})"
        )),
    )
}

fn extract_typed(server: &'static str, row: &dyn RelationalRow) -> Extraction {
    let mut record = NormalizedRecord::empty(server);
    record.query_count = row.row_count();

    let column_count = match row.column_count() {
        Ok(n) => n,
        Err(e) => return Extraction::degraded(record, e),
    };

    let mut fault = None;

    // Column indexes are 1-based and the last index is inclusive.
    for index in 1..=column_count {
        match (row.column_name(index), row.value(index)) {
            (Ok(name), Ok(value)) => {
                record.result.insert(name, value);
            }
            (Err(e), _) | (_, Err(e)) => {
                // Keep what was already extracted and move on; the record
                // stays partial rather than empty.
                fault.get_or_insert(e);
            }
        }
    }

    match fault {
        Some(e) => Extraction::degraded(record, e),
        None => Extraction::clean(record),
    }
}

fn extract_dynamic(server: &'static str, dyn_access: &dyn DynAccess) -> Extraction {
    let mut record = NormalizedRecord::empty(server);

    if let Some(DynValue::Int(count)) = dyn_access.get(ROW_ACCESSOR) {
        record.query_count = Some(count);
    }

    let column_count = match dyn_access.get(COLUMN_COUNT_ACCESSOR) {
        Some(DynValue::Int(n)) if n >= 0 => n as usize,
        Some(other) => {
            return Extraction::degraded(
                record,
                EngineError::extraction_failed(format!(
                    "{COLUMN_COUNT_ACCESSOR} returned unusable value {other:?} on {}",
                    dyn_access.runtime_type()
                )),
            );
        }
        None => {
            return Extraction::degraded(
                record,
                missing_accessor(dyn_access, COLUMN_COUNT_ACCESSOR),
            );
        }
    };

    let mut fault = None;

    for index in 1..=column_count {
        let name = dyn_access.get_indexed(COLUMN_NAME_ACCESSOR, index);
        let value = dyn_access.get_indexed(COLUMN_VALUE_ACCESSOR, index);

        match (name, value) {
            (Some(DynValue::Text(name)), Some(value)) => {
                record.result.insert(name, Value::from(value));
            }
            (None, _) => {
                fault.get_or_insert_with(|| missing_accessor(dyn_access, COLUMN_NAME_ACCESSOR));
            }
            (_, None) => {
                fault.get_or_insert_with(|| missing_accessor(dyn_access, COLUMN_VALUE_ACCESSOR));
            }
            (Some(other), _) => {
                fault.get_or_insert_with(|| {
                    EngineError::extraction_failed(format!(
                        "{COLUMN_NAME_ACCESSOR} returned non-text value {other:?}"
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

#[cfg(test)]
mod tests {
    use super::super::tests::{FakeDynamic, FakeRelational, FakeRow};
    use super::*;
    use crate::error::EngineResult;

    #[test]
    fn typed_path_records_query_count_and_columns() {
        let raw = FakeRelational(FakeRow {
            columns: vec![("id".to_string(), Value::Int(9))],
            row_count: Some(7),
        });

        let extraction = extract("pgsql", &raw);
        assert!(!extraction.is_degraded());
        assert_eq!(extraction.record.query_count, Some(7));
        assert_eq!(extraction.record.result.len(), 1);
    }

    #[test]
    fn typed_path_without_row_count_leaves_it_unset() {
        let raw = FakeRelational(FakeRow {
            columns: vec![("id".to_string(), Value::Int(1))],
            row_count: None,
        });

        let extraction = extract("sqlite", &raw);
        assert_eq!(extraction.record.query_count, None);
    }

    #[test]
    fn faulty_column_keeps_partial_record() {
        /// Row whose second column accessor fails.
        struct HalfBrokenRow;

        impl RelationalRow for HalfBrokenRow {
            fn row_count(&self) -> Option<i64> {
                Some(1)
            }

            fn column_count(&self) -> EngineResult<usize> {
                Ok(2)
            }

            fn column_name(&self, index: usize) -> EngineResult<String> {
                match index {
                    1 => Ok("good".to_string()),
                    _ => Err(EngineError::extraction_failed("bad column metadata")),
                }
            }

            fn value(&self, index: usize) -> EngineResult<Value> {
                match index {
                    1 => Ok(Value::Bool(true)),
                    _ => Err(EngineError::extraction_failed("bad column value")),
                }
            }
        }

        struct HalfBroken;
        impl RawResult for HalfBroken {
            fn as_relational(&self) -> Option<&dyn RelationalRow> {
                Some(&HalfBrokenRow)
            }

            fn render(&self) -> String {
                "HalfBroken".to_string()
            }
        }

        let extraction = extract("mysql", &HalfBroken);
        assert!(extraction.is_degraded());
        assert_eq!(extraction.record.result.len(), 1);
        assert_eq!(extraction.record.result["good"], Value::Bool(true));
    }

    #[test]
    fn dynamic_path_extracts_by_accessor_name() {
        let raw = FakeDynamic {
            type_name: "com/example/ShadedResultSet".to_string(),
            accessors: vec![
                ("getRow".to_string(), DynValue::Int(2)),
                ("getColumnCount".to_string(), DynValue::Int(1)),
                (
                    "getColumnName:1".to_string(),
                    DynValue::Text("email".to_string()),
                ),
                (
                    "getObject:1".to_string(),
                    DynValue::Text("a@b.example".to_string()),
                ),
            ],
        };

        let extraction = extract("mysql", &raw);
        assert!(!extraction.is_degraded());
        assert_eq!(extraction.record.query_count, Some(2));
        assert_eq!(
            extraction.record.result["email"],
            Value::Text("a@b.example".to_string())
        );
    }

    #[test]
    fn absent_fallback_accessor_yields_empty_record_not_panic() {
        let raw = FakeDynamic {
            type_name: "com/example/Mystery".to_string(),
            accessors: vec![],
        };

        let extraction = extract("mysql", &raw);
        assert!(extraction.is_degraded());
        assert!(extraction.record.result.is_empty());
        match extraction.fault {
            Some(EngineError::AccessorMissing { accessor, .. }) => {
                assert_eq!(accessor, "getColumnCount");
            }
            other => panic!("unexpected fault: {other:?}"),
        }
    }
}
