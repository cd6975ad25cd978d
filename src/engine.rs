//! Engine wiring
//!
//! `HookEngine` owns the immutable pieces (matcher tables, compiled
//! exclusion rules, dispatch gate) and the two cold-path stores (retained
//! hook specs, diagnostics ring). Class-load-time matching and call-time
//! normalization meet here.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::backend::InstrumentationBackend;
use crate::config::{EngineConfig, ExclusionRules};
use crate::diagnostics::{DiagnosticsStore, HookEvent, HookEventKind};
use crate::dispatch::{DispatchGate, PolicyChecker};
use crate::error::EngineResult;
use crate::matcher::TypeMatcher;
use crate::normalize::normalize;
use crate::raw::RawResult;
use crate::selector::{select, AppliedInsertion};
use crate::types::{Family, HookSpec, ResultShape, TypeDescriptor};

/// Terminal state of one observed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeOutcome {
    /// No known family; the type is left completely unmodified.
    Unmatched,
    /// Matched and at least one insertion applied.
    Instrumented,
    /// Matched, but no candidate signature was present on this library
    /// version. Detection coverage degrades for this type only.
    SkippedDegraded,
}

/// A hook spec together with the insertions the backend accepted.
/// Retained read-only for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentedType {
    pub spec: HookSpec,
    pub insertions: Vec<AppliedInsertion>,
}

/// The hook-matching, insertion-strategy, and result-normalization engine.
pub struct HookEngine {
    matcher: TypeMatcher,
    config: EngineConfig,
    rules: ExclusionRules,
    diagnostics: Arc<DiagnosticsStore>,
    gate: DispatchGate,
    instrumented: RwLock<Vec<InstrumentedType>>,
}

impl HookEngine {
    /// Builds an engine with default configuration.
    pub fn new(checker: Arc<dyn PolicyChecker>) -> Self {
        // The default configuration carries no regex patterns, so
        // compilation cannot fail.
        Self::with_config(EngineConfig::default(), checker)
            .expect("default configuration compiles")
    }

    /// Builds an engine from explicit configuration. Fails only on invalid
    /// exclusion patterns.
    pub fn with_config(
        config: EngineConfig,
        checker: Arc<dyn PolicyChecker>,
    ) -> EngineResult<Self> {
        let rules = config.compile_exclusions()?;
        let diagnostics = Arc::new(DiagnosticsStore::new(config.max_diagnostic_entries));
        let gate = DispatchGate::new(checker, diagnostics.clone());

        info!(
            excluded_fragments = config.excluded_qualifier_fragments.len(),
            excluded_patterns = config.excluded_qualifier_patterns.len(),
            "hook engine initialized"
        );

        Ok(Self {
            matcher: TypeMatcher::new(),
            config,
            rules,
            diagnostics,
            gate,
            instrumented: RwLock::new(Vec::new()),
        })
    }

    /// Class-load-time entry: matches one observed type and, when it
    /// belongs to a known family, selects and applies insertions through
    /// the backend.
    ///
    /// Safe to call concurrently for different types; each type's matching
    /// is independent and read-only with respect to other types' specs.
    pub fn observe_type(
        &self,
        ty: &TypeDescriptor,
        backend: &mut dyn InstrumentationBackend,
    ) -> TypeOutcome {
        let Some(spec) = self.matcher.matches(ty) else {
            return TypeOutcome::Unmatched;
        };

        self.diagnostics.record(HookEvent::new(
            HookEventKind::Matched,
            spec.type_name.as_str(),
            format!(
                "family {} shape {:?} generation {:?}",
                spec.family.server_tag(),
                spec.shape,
                spec.generation
            ),
        ));

        let selection = select(&spec, backend);

        if selection.is_instrumented() {
            let methods: Vec<&str> = selection.applied.iter().map(|a| a.method.name).collect();
            self.diagnostics.record(HookEvent::new(
                HookEventKind::Instrumented,
                spec.type_name.as_str(),
                format!("hooked {methods:?} at {:?}", spec.insertion_point),
            ));
            self.instrumented.write().push(InstrumentedType {
                spec,
                insertions: selection.applied,
            });
            return TypeOutcome::Instrumented;
        }

        debug!(
            type_name = %spec.type_name,
            "no candidate signature present, skipping type"
        );
        self.diagnostics.record(HookEvent::new(
            HookEventKind::SkippedDegraded,
            spec.type_name.as_str(),
            selection
                .fault
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no candidate signature present".to_string()),
        ));

        TypeOutcome::SkippedDegraded
    }

    /// Call-time entry: normalizes one captured result and dispatches it to
    /// the policy checker. Runs synchronously and inline on the
    /// intercepting thread; lock-free when extraction succeeds.
    pub fn on_result(&self, family: Family, shape: ResultShape, raw: &dyn RawResult) {
        let extraction = normalize(family, shape, raw, &self.rules, self.config.max_render_len);
        self.gate.dispatch(family.check_type(), &extraction);
    }

    /// Snapshot of every type instrumented so far.
    pub fn instrumented_types(&self) -> Vec<InstrumentedType> {
        self.instrumented.read().clone()
    }

    pub fn diagnostics(&self) -> Arc<DiagnosticsStore> {
        self.diagnostics.clone()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    use crate::backend::{HookFragment, InsertionOutcome};
    use crate::types::{CheckType, InsertionPoint, MethodSig, NormalizedRecord};

    #[derive(Default)]
    struct NullChecker {
        calls: Mutex<Vec<(CheckType, NormalizedRecord)>>,
    }

    impl PolicyChecker for NullChecker {
        fn check(&self, check_type: CheckType, record: &NormalizedRecord) {
            self.calls.lock().push((check_type, record.clone()));
        }
    }

    struct AcceptAll;

    impl InstrumentationBackend for AcceptAll {
        fn insert(
            &mut self,
            _type_name: &str,
            _method: &MethodSig,
            _point: InsertionPoint,
            _fragment: &HookFragment,
        ) -> InsertionOutcome {
            InsertionOutcome::Applied
        }
    }

    struct RejectAll;

    impl InstrumentationBackend for RejectAll {
        fn insert(
            &mut self,
            _type_name: &str,
            _method: &MethodSig,
            _point: InsertionPoint,
            _fragment: &HookFragment,
        ) -> InsertionOutcome {
            InsertionOutcome::NotFound
        }
    }

    #[test]
    fn observe_type_walks_the_state_machine() {
        let engine = HookEngine::new(Arc::new(NullChecker::default()));

        let unmatched = engine.observe_type(
            &TypeDescriptor::new("com/example/app/UserService"),
            &mut AcceptAll,
        );
        assert_eq!(unmatched, TypeOutcome::Unmatched);

        let instrumented = engine.observe_type(
            &TypeDescriptor::new("com/mysql/cj/jdbc/result/ResultSetImpl"),
            &mut AcceptAll,
        );
        assert_eq!(instrumented, TypeOutcome::Instrumented);

        let skipped = engine.observe_type(
            &TypeDescriptor::new("org/apache/hadoop/hbase/client/Table"),
            &mut RejectAll,
        );
        assert_eq!(skipped, TypeOutcome::SkippedDegraded);

        let retained = engine.instrumented_types();
        assert_eq!(retained.len(), 1);
        assert_eq!(
            retained[0].spec.type_name,
            "com/mysql/cj/jdbc/result/ResultSetImpl"
        );
    }

    #[test]
    fn unmatched_types_leave_no_trace() {
        let engine = HookEngine::new(Arc::new(NullChecker::default()));

        engine.observe_type(&TypeDescriptor::new("java/util/ArrayList"), &mut AcceptAll);

        assert!(engine.instrumented_types().is_empty());
        assert!(engine.diagnostics().is_empty());
    }
}
