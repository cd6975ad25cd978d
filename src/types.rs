//! Universal domain types for the hook engine
//!
//! These types describe what gets hooked (families, shapes, hook specs) and
//! what comes out of a hooked call (normalized records), independent of any
//! one vendor's client library.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Data-access family a matched type belongs to.
///
/// Vendor-level granularity: the family selects the server tag written into
/// records, the check-type tag used at dispatch, and the exception surface
/// the inserted fragment must tolerate. Every matched type resolves to
/// exactly one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    MySql,
    Postgres,
    Sqlite,
    Oracle,
    SqlServer,
    Db2,
    Hbase,
}

impl Family {
    /// Server tag recorded on every normalized record for this family.
    pub fn server_tag(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "pgsql",
            Self::Sqlite => "sqlite",
            Self::Oracle => "oracle",
            Self::SqlServer => "sqlserver",
            Self::Db2 => "db2",
            Self::Hbase => "hbase",
        }
    }

    /// Check-type tag handed to the policy checker for this family.
    pub fn check_type(&self) -> CheckType {
        match self {
            Self::Hbase => CheckType::HbaseSqlResult,
            _ => CheckType::SqlResult,
        }
    }

    /// Returns true for families whose results are relational rows rather
    /// than cell sequences.
    pub fn is_relational(&self) -> bool {
        !matches!(self, Self::Hbase)
    }

    /// Throwable type names the inserted call site must tolerate.
    pub fn exception_types(&self) -> &'static [&'static str] {
        match self {
            Self::SqlServer => &["com/microsoft/sqlserver/jdbc/SQLServerException"],
            Self::Hbase => &["java/io/IOException"],
            _ => &["java/sql/SQLException"],
        }
    }
}

/// Structural form a family's result takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// Direct point lookup producing one row.
    SingleRow,
    /// Stateful cursor advanced via a "next" operation.
    RowCursor,
    /// Ordered qualifier/value pairs for one logical row.
    CellList,
    /// No structured extraction possible; string rendering only.
    RawOpaque,
}

/// Which generation of a library's API surface the matched name belongs to.
///
/// Recorded at match time because candidate ordering and method descriptors
/// differ across library majors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiGeneration {
    Legacy,
    Modern,
}

/// Check-type vocabulary exposed to the policy checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckType {
    SqlResult,
    HbaseSqlResult,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlResult => "SQLResult",
            Self::HbaseSqlResult => "HbaseSQLResult",
        }
    }
}

/// Where interception logic runs relative to the target method's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertionPoint {
    Before,
    After,
}

/// Which value the inserted fragment hands to the normalizer.
///
/// Before-insertions can only see the receiver; After-insertions can also
/// see the return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    Receiver,
    ReturnValue,
}

/// A candidate method to intercept, JVM-descriptor form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodSig {
    pub name: &'static str,
    pub descriptor: &'static str,
}

impl MethodSig {
    pub const fn new(name: &'static str, descriptor: &'static str) -> Self {
        Self { name, descriptor }
    }
}

/// A type observed during class loading, as reported by the host's
/// instrumentation pipeline. Names use slash-form JVM internal notation
/// throughout (`com/mysql/cj/jdbc/result/ResultSetImpl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    /// Interfaces the type declares; consulted only for families that need
    /// structural disambiguation.
    #[serde(default)]
    pub interfaces: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interfaces: Vec::new(),
        }
    }

    pub fn with_interfaces(name: impl Into<String>, interfaces: Vec<String>) -> Self {
        Self {
            name: name.into(),
            interfaces,
        }
    }
}

/// Immutable descriptor of what to intercept on one matched type.
///
/// Produced once at class-load matching, consumed by the insertion strategy
/// selector, then retained read-only for diagnostics. One `HookSpec` governs
/// every call over the instrumented method's lifetime.
#[derive(Debug, Clone, Serialize)]
pub struct HookSpec {
    pub family: Family,
    pub shape: ResultShape,
    pub generation: ApiGeneration,
    /// The concrete type name that matched (families with several known
    /// names record which one was seen).
    pub type_name: String,
    /// Candidate method signatures in fixed priority order, newest API
    /// surface first.
    pub candidates: &'static [MethodSig],
    pub insertion_point: InsertionPoint,
    /// Throwable type names the inserted fragment must tolerate.
    pub exception_types: &'static [&'static str],
}

impl HookSpec {
    /// Which value the fragment captures at the call site, determined by
    /// the insertion point.
    pub fn capture_source(&self) -> CaptureSource {
        match self.insertion_point {
            InsertionPoint::Before => CaptureSource::Receiver,
            InsertionPoint::After => CaptureSource::ReturnValue,
        }
    }
}

/// Universal value representation for extracted column data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

/// The uniform attribute map produced per intercepted call.
///
/// Built fresh per invocation, owned exclusively by the call that built it,
/// discarded after the dispatch gate returns. Never shared across threads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// Server/family tag (`mysql`, `pgsql`, `hbase`, ...).
    pub server: &'static str,
    /// Column or qualifier name to extracted value.
    pub result: HashMap<String, Value>,
    /// Row count the cursor reports, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_count: Option<i64>,
    /// Free-text rendering for captures with no structured form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_value: Option<String>,
}

impl NormalizedRecord {
    /// An empty record carrying only the server tag.
    pub fn empty(server: &'static str) -> Self {
        Self {
            server,
            result: HashMap::new(),
            query_count: None,
            result_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_tags_are_stable() {
        assert_eq!(Family::MySql.server_tag(), "mysql");
        assert_eq!(Family::Postgres.server_tag(), "pgsql");
        assert_eq!(Family::Hbase.server_tag(), "hbase");
        assert_eq!(Family::Hbase.check_type().as_str(), "HbaseSQLResult");
        assert_eq!(Family::Oracle.check_type().as_str(), "SQLResult");
    }

    #[test]
    fn capture_source_follows_insertion_point() {
        const CANDIDATES: &[MethodSig] = &[MethodSig::new("next", "()Z")];
        let spec = HookSpec {
            family: Family::MySql,
            shape: ResultShape::RowCursor,
            generation: ApiGeneration::Modern,
            type_name: "com/mysql/cj/jdbc/result/ResultSetImpl".to_string(),
            candidates: CANDIDATES,
            insertion_point: InsertionPoint::Before,
            exception_types: &["java/sql/SQLException"],
        };
        assert_eq!(spec.capture_source(), CaptureSource::Receiver);
    }

    #[test]
    fn bytes_value_round_trips_as_base64() {
        let v = Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        let json = serde_json::to_string(&v).expect("serialize");
        assert_eq!(json, "\"3q2+7w==\"");
        let back: Value = serde_json::from_str(&json).expect("deserialize");
        // Untagged deserialization reads a bare string back as Text; the
        // base64 form is the wire contract, not a round-trip guarantee.
        assert_eq!(back, Value::Text("3q2+7w==".to_string()));
    }
}
