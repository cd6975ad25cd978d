//! Captured-result access traits
//!
//! At call time the instrumented site hands the engine the value the
//! fragment captured: a relational cursor, a cell list, or something the
//! running library version no longer exposes a typed view for. Adapters over
//! the vendor objects implement `RawResult`; the normalizer asks for the
//! typed view first and falls back to name-based access, mirroring the
//! cast-then-reflect ladder of the drivers being monitored.

use crate::error::{EngineError, EngineResult};
use crate::types::Value;

/// A value produced by the name-based access path.
///
/// Loosely typed on purpose: the dynamic path exists precisely because the
/// static shape could not be resolved against the running library version.
#[derive(Debug, Clone, PartialEq)]
pub enum DynValue {
    Null,
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    /// One qualifier/value cell surfaced by a cell-sequence accessor.
    Cell(Vec<u8>, Vec<u8>),
    List(Vec<DynValue>),
}

impl From<DynValue> for Value {
    fn from(v: DynValue) -> Self {
        match v {
            DynValue::Null => Value::Null,
            DynValue::Int(i) => Value::Int(i),
            DynValue::Text(s) => Value::Text(s),
            DynValue::Bytes(b) => Value::Bytes(b),
            DynValue::Cell(q, val) => Value::Array(vec![Value::Bytes(q), Value::Bytes(val)]),
            DynValue::List(items) => Value::Array(items.into_iter().map(Into::into).collect()),
        }
    }
}

/// Name-based accessor fallback over a capture whose typed view is
/// unavailable. Stands in for runtime reflection: resolve an accessor by
/// name, invoke it, decode the result.
pub trait DynAccess {
    /// Runtime type name of the underlying capture, for diagnostics.
    fn runtime_type(&self) -> &str;

    /// Invokes a no-argument accessor by name. `None` means the accessor is
    /// absent on this library version.
    fn get(&self, accessor: &str) -> Option<DynValue>;

    /// Invokes a one-index accessor by name. Indexes are 1-based, matching
    /// the driver surfaces being mirrored.
    fn get_indexed(&self, accessor: &str, index: usize) -> Option<DynValue>;
}

/// One qualifier/value cell from a cell-sequence capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell<'a> {
    pub qualifier: &'a [u8],
    pub value: &'a [u8],
}

/// Typed view over a cell-sequence capture. Iteration order is the order
/// the source produced and is significant: on duplicate qualifiers the last
/// cell wins.
pub trait CellRow {
    fn cells(&self) -> Box<dyn Iterator<Item = Cell<'_>> + '_>;
}

/// Typed view over a relational cursor or single-row capture.
///
/// Column indexes are 1-based and inclusive of the last index, matching the
/// metadata surfaces of the drivers being mirrored.
pub trait RelationalRow {
    /// Row count the cursor reports for this result, when available.
    fn row_count(&self) -> Option<i64>;

    fn column_count(&self) -> EngineResult<usize>;

    fn column_name(&self, index: usize) -> EngineResult<String>;

    fn value(&self, index: usize) -> EngineResult<Value>;
}

/// The value captured at an instrumented call site.
///
/// All views are optional except `render`; the normalizer degrades through
/// them in order and never lets an absent view abort the host call.
pub trait RawResult {
    /// Statically-typed relational view, when this capture is a relational
    /// cursor or row.
    fn as_relational(&self) -> Option<&dyn RelationalRow> {
        None
    }

    /// Statically-typed cell-sequence view.
    fn as_cells(&self) -> Option<&dyn CellRow> {
        None
    }

    /// Name-based fallback view for version-skewed captures.
    fn as_dynamic(&self) -> Option<&dyn DynAccess> {
        None
    }

    /// Free-text rendering; always available.
    fn render(&self) -> String;
}

/// The single fixed byte-to-string transformation used for qualifier and
/// value decoding: UTF-8 with U+FFFD replacement for invalid sequences.
/// The same binary input always decodes identically.
pub fn decode_bytes(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Maps an absent accessor to the engine's error taxonomy.
pub(crate) fn missing_accessor(dyn_access: &dyn DynAccess, accessor: &str) -> EngineError {
    EngineError::accessor_missing(dyn_access.runtime_type(), accessor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_bytes_is_deterministic_and_lossy() {
        assert_eq!(decode_bytes(b"name"), "name");
        let invalid = [0x66, 0xff, 0x6f];
        assert_eq!(decode_bytes(&invalid), decode_bytes(&invalid));
        assert_eq!(decode_bytes(&invalid), "f\u{fffd}o");
    }

    #[test]
    fn dyn_value_converts_to_universal_value() {
        assert_eq!(Value::from(DynValue::Int(7)), Value::Int(7));
        assert_eq!(
            Value::from(DynValue::Text("x".to_string())),
            Value::Text("x".to_string())
        );
        assert_eq!(
            Value::from(DynValue::List(vec![DynValue::Null, DynValue::Int(1)])),
            Value::Array(vec![Value::Null, Value::Int(1)])
        );
    }
}
