//! Type Matcher
//!
//! Decides whether a type observed at class-load time belongs to a supported
//! data-access family and, if so, which result shape it produces. Matching
//! is exact-name or whole-prefix per family — never substring matching on
//! unrelated fragments — so unmatched application classes carry zero
//! overhead and zero risk.

use tracing::debug;

use crate::types::{
    ApiGeneration, Family, HookSpec, InsertionPoint, MethodSig, ResultShape, TypeDescriptor,
};

/// Cursor advance on relational result sets. The record must be read while
/// the cursor still points at the current row, so insertion is Before.
pub(crate) const RELATIONAL_CURSOR_CANDIDATES: &[MethodSig] = &[MethodSig::new("next", "()Z")];

/// Single-row point lookup on the MySQL X DevAPI result surface.
pub(crate) const MYSQL_SINGLE_ROW_CANDIDATES: &[MethodSig] =
    &[MethodSig::new("fetchOne", "()Lcom/mysql/cj/xdevapi/Row;")];

/// Scanner advance producing one populated cell list per call.
pub(crate) const HBASE_SCANNER_CANDIDATES: &[MethodSig] =
    &[MethodSig::new("next", "()Lorg/apache/hadoop/hbase/client/Result;")];

/// Table point lookups across library majors, newest surface first.
pub(crate) const HBASE_TABLE_CANDIDATES: &[MethodSig] = &[
    MethodSig::new(
        "get",
        "(Lorg/apache/hadoop/hbase/client/Get;)Lorg/apache/hadoop/hbase/client/Result;",
    ),
    MethodSig::new(
        "getRowOrBefore",
        "([B[B)Lorg/apache/hadoop/hbase/client/Result;",
    ),
];

/// Table point lookups for the pre-1.0 surface, where the removed legacy
/// method is the one known to be present.
pub(crate) const HBASE_TABLE_CANDIDATES_LEGACY: &[MethodSig] = &[
    MethodSig::new(
        "getRowOrBefore",
        "([B[B)Lorg/apache/hadoop/hbase/client/Result;",
    ),
    MethodSig::new(
        "get",
        "(Lorg/apache/hadoop/hbase/client/Get;)Lorg/apache/hadoop/hbase/client/Result;",
    ),
];

const DB2_RESULT_PREFIX: &str = "com/ibm/db2/jcc/am";
const DB2_RESULT_SET_INTERFACE: &str = "com/ibm/db2/jcc/DB2ResultSet";

/// Minimum interface count for a Db2 prefix match. Full driver result sets
/// implement the whole JDBC stack; thin wrappers in the same package do not.
const DB2_MIN_INTERFACES: usize = 4;

/// Matches observed types against the built-in family registry.
///
/// The registry is static data; the matcher itself holds no state and is
/// safe to call concurrently for different types.
#[derive(Debug, Default)]
pub struct TypeMatcher;

impl TypeMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Matches a type descriptor, returning the immutable hook spec for it.
    ///
    /// `None` is a normal negative result: the type is left completely
    /// unmodified.
    pub fn matches(&self, ty: &TypeDescriptor) -> Option<HookSpec> {
        let spec = self.match_relational(ty).or_else(|| self.match_hbase(ty))?;

        debug!(
            type_name = %spec.type_name,
            server = spec.family.server_tag(),
            shape = ?spec.shape,
            generation = ?spec.generation,
            "matched data-access type"
        );

        Some(spec)
    }

    fn match_relational(&self, ty: &TypeDescriptor) -> Option<HookSpec> {
        let (family, generation, shape) = match ty.name.as_str() {
            "com/mysql/jdbc/ResultSetImpl" => {
                (Family::MySql, ApiGeneration::Legacy, ResultShape::RowCursor)
            }
            "com/mysql/cj/jdbc/result/ResultSetImpl" => {
                (Family::MySql, ApiGeneration::Modern, ResultShape::RowCursor)
            }
            "com/mysql/cj/xdevapi/RowResultImpl" => {
                (Family::MySql, ApiGeneration::Modern, ResultShape::SingleRow)
            }

            "org/sqlite/RS" => (Family::Sqlite, ApiGeneration::Legacy, ResultShape::RowCursor),
            "org/sqlite/jdbc3/JDBC3ResultSet" => {
                (Family::Sqlite, ApiGeneration::Modern, ResultShape::RowCursor)
            }

            "oracle/jdbc/driver/OracleResultSetImpl" => {
                (Family::Oracle, ApiGeneration::Modern, ResultShape::RowCursor)
            }

            "com/microsoft/sqlserver/jdbc/SQLServerResultSet" => (
                Family::SqlServer,
                ApiGeneration::Modern,
                ResultShape::RowCursor,
            ),

            "org/postgresql/jdbc/PgResultSet" => {
                (Family::Postgres, ApiGeneration::Modern, ResultShape::RowCursor)
            }
            "org/postgresql/jdbc1/AbstractJdbc1ResultSet"
            | "org/postgresql/jdbc2/AbstractJdbc2ResultSet"
            | "org/postgresql/jdbc3/AbstractJdbc3ResultSet"
            | "org/postgresql/jdbc3g/AbstractJdbc3gResultSet"
            | "org/postgresql/jdbc4/AbstractJdbc4ResultSet" => {
                (Family::Postgres, ApiGeneration::Legacy, ResultShape::RowCursor)
            }

            name if name.starts_with(DB2_RESULT_PREFIX) => {
                if !self.db2_structurally_matches(ty) {
                    return None;
                }
                (Family::Db2, ApiGeneration::Modern, ResultShape::RowCursor)
            }

            _ => return None,
        };

        Some(self.build_spec(family, generation, shape, ty))
    }

    fn match_hbase(&self, ty: &TypeDescriptor) -> Option<HookSpec> {
        let (generation, shape) = match ty.name.as_str() {
            "org/apache/hadoop/hbase/client/ResultScanner" => {
                (ApiGeneration::Modern, ResultShape::CellList)
            }
            "org/apache/hadoop/hbase/client/Table" => {
                (ApiGeneration::Modern, ResultShape::CellList)
            }
            "org/apache/hadoop/hbase/client/HTableInterface" => {
                (ApiGeneration::Legacy, ResultShape::CellList)
            }
            _ => return None,
        };

        Some(self.build_spec(Family::Hbase, generation, shape, ty))
    }

    /// Db2 result types share a package with unrelated bookkeeping classes;
    /// the interface set separates them.
    fn db2_structurally_matches(&self, ty: &TypeDescriptor) -> bool {
        ty.interfaces.iter().any(|i| i == DB2_RESULT_SET_INTERFACE)
            && ty.interfaces.len() >= DB2_MIN_INTERFACES
    }

    fn build_spec(
        &self,
        family: Family,
        generation: ApiGeneration,
        shape: ResultShape,
        ty: &TypeDescriptor,
    ) -> HookSpec {
        let (candidates, insertion_point) = candidate_table(shape, generation, &ty.name);

        HookSpec {
            family,
            shape,
            generation,
            type_name: ty.name.clone(),
            candidates,
            insertion_point,
            exception_types: family.exception_types(),
        }
    }
}

/// Candidate signatures and insertion point for a matched (family, shape).
///
/// RowCursor reads the receiver before the cursor advances; everything else
/// needs the populated return value, so insertion is After.
fn candidate_table(
    shape: ResultShape,
    generation: ApiGeneration,
    type_name: &str,
) -> (&'static [MethodSig], InsertionPoint) {
    match shape {
        ResultShape::RowCursor => (RELATIONAL_CURSOR_CANDIDATES, InsertionPoint::Before),
        ResultShape::SingleRow => (MYSQL_SINGLE_ROW_CANDIDATES, InsertionPoint::After),
        ResultShape::CellList => {
            let candidates = if type_name.ends_with("ResultScanner") {
                HBASE_SCANNER_CANDIDATES
            } else if generation == ApiGeneration::Legacy {
                HBASE_TABLE_CANDIDATES_LEGACY
            } else {
                HBASE_TABLE_CANDIDATES
            };
            (candidates, InsertionPoint::After)
        }
        // RawOpaque never comes out of the matcher; captures degrade to it
        // at normalization time. A spec that carries it has nothing to probe.
        ResultShape::RawOpaque => (&[], InsertionPoint::After),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str) -> TypeDescriptor {
        TypeDescriptor::new(name)
    }

    #[test]
    fn matches_mysql_across_generations() {
        let matcher = TypeMatcher::new();

        let legacy = matcher
            .matches(&descriptor("com/mysql/jdbc/ResultSetImpl"))
            .expect("legacy name should match");
        assert_eq!(legacy.family, Family::MySql);
        assert_eq!(legacy.generation, ApiGeneration::Legacy);
        assert_eq!(legacy.shape, ResultShape::RowCursor);
        assert_eq!(legacy.insertion_point, InsertionPoint::Before);

        let modern = matcher
            .matches(&descriptor("com/mysql/cj/jdbc/result/ResultSetImpl"))
            .expect("modern name should match");
        assert_eq!(modern.generation, ApiGeneration::Modern);
        assert_eq!(modern.candidates, RELATIONAL_CURSOR_CANDIDATES);
    }

    #[test]
    fn matches_mysql_xdevapi_as_single_row() {
        let matcher = TypeMatcher::new();
        let spec = matcher
            .matches(&descriptor("com/mysql/cj/xdevapi/RowResultImpl"))
            .expect("xdevapi result should match");
        assert_eq!(spec.shape, ResultShape::SingleRow);
        assert_eq!(spec.insertion_point, InsertionPoint::After);
        assert_eq!(spec.candidates[0].name, "fetchOne");
    }

    #[test]
    fn matches_postgres_legacy_names() {
        let matcher = TypeMatcher::new();
        for name in [
            "org/postgresql/jdbc1/AbstractJdbc1ResultSet",
            "org/postgresql/jdbc3g/AbstractJdbc3gResultSet",
            "org/postgresql/jdbc4/AbstractJdbc4ResultSet",
        ] {
            let spec = matcher.matches(&descriptor(name)).expect(name);
            assert_eq!(spec.family, Family::Postgres);
            assert_eq!(spec.generation, ApiGeneration::Legacy);
        }
    }

    #[test]
    fn db2_requires_interface_set() {
        let matcher = TypeMatcher::new();

        // Prefix alone is not enough.
        assert!(matcher
            .matches(&descriptor("com/ibm/db2/jcc/am/ResultSet"))
            .is_none());

        // The right interface but too few of them: a thin wrapper.
        let thin = TypeDescriptor::with_interfaces(
            "com/ibm/db2/jcc/am/ResultSet",
            vec![
                "com/ibm/db2/jcc/DB2ResultSet".to_string(),
                "java/sql/ResultSet".to_string(),
            ],
        );
        assert!(matcher.matches(&thin).is_none());

        let full = TypeDescriptor::with_interfaces(
            "com/ibm/db2/jcc/am/ResultSet",
            vec![
                "com/ibm/db2/jcc/DB2ResultSet".to_string(),
                "java/sql/ResultSet".to_string(),
                "java/sql/Wrapper".to_string(),
                "java/lang/AutoCloseable".to_string(),
            ],
        );
        let spec = matcher.matches(&full).expect("full driver should match");
        assert_eq!(spec.family, Family::Db2);
    }

    #[test]
    fn hbase_table_generation_orders_candidates() {
        let matcher = TypeMatcher::new();

        let modern = matcher
            .matches(&descriptor("org/apache/hadoop/hbase/client/Table"))
            .expect("modern table");
        assert_eq!(modern.candidates[0].name, "get");

        let legacy = matcher
            .matches(&descriptor("org/apache/hadoop/hbase/client/HTableInterface"))
            .expect("legacy table");
        assert_eq!(legacy.candidates[0].name, "getRowOrBefore");
        assert_eq!(legacy.generation, ApiGeneration::Legacy);
    }

    #[test]
    fn hbase_scanner_hooks_after_next() {
        let matcher = TypeMatcher::new();
        let spec = matcher
            .matches(&descriptor("org/apache/hadoop/hbase/client/ResultScanner"))
            .expect("scanner");
        assert_eq!(spec.shape, ResultShape::CellList);
        assert_eq!(spec.insertion_point, InsertionPoint::After);
        assert_eq!(spec.candidates, HBASE_SCANNER_CANDIDATES);
    }

    #[test]
    fn unrelated_types_never_match() {
        let matcher = TypeMatcher::new();
        for name in [
            "com/example/app/UserService",
            "java/util/HashMap",
            // Substring of a known name must not match.
            "com/mysql/jdbc/ResultSetImplHelper",
            "org/apache/hadoop/hbase/client/TableDescriptor",
        ] {
            assert!(matcher.matches(&descriptor(name)).is_none(), "{name}");
        }
    }

    #[test]
    fn matching_is_deterministic() {
        let matcher = TypeMatcher::new();
        let ty = descriptor("org/sqlite/jdbc3/JDBC3ResultSet");
        let a = matcher.matches(&ty).expect("first");
        let b = matcher.matches(&ty).expect("second");
        assert_eq!(a.family, b.family);
        assert_eq!(a.shape, b.shape);
        assert_eq!(a.candidates, b.candidates);
        assert_eq!(a.insertion_point, b.insertion_point);
    }
}
