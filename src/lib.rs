// SPDX-License-Identifier: Apache-2.0

//! rowguard — runtime database-result interception and normalization
//!
//! Intercepts calls into database access libraries at runtime, extracts the
//! data a query returned, normalizes it into a uniform structured record,
//! and forwards that record to a centralized security-policy checker —
//! without modifying application source code.
//!
//! The engine covers hook matching, insertion-strategy selection, and
//! result normalization. Bytecode rewriting and policy decisions are
//! external collaborators behind the [`backend::InstrumentationBackend`]
//! and [`dispatch::PolicyChecker`] traits.
//!
//! The one hard invariant: nothing in this crate is allowed to escape into
//! the instrumented application call path as an unhandled fault. Extraction
//! and dispatch failures degrade monitoring coverage, never the monitored
//! operation.

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod observability;
pub mod raw;
pub mod selector;
pub mod types;

pub use backend::{HookFragment, InsertionOutcome, InstrumentationBackend};
pub use config::{EngineConfig, ExclusionRules};
pub use diagnostics::{DiagnosticsStore, HookEvent, HookEventKind};
pub use dispatch::{DispatchGate, PolicyChecker};
pub use engine::{HookEngine, InstrumentedType, TypeOutcome};
pub use error::{EngineError, EngineResult};
pub use matcher::TypeMatcher;
pub use normalize::{normalize, Extraction};
pub use raw::{Cell, CellRow, DynAccess, DynValue, RawResult, RelationalRow};
pub use selector::{select, AppliedInsertion, Selection};
pub use types::{
    ApiGeneration, CaptureSource, CheckType, Family, HookSpec, InsertionPoint, MethodSig,
    NormalizedRecord, ResultShape, TypeDescriptor, Value,
};
