//! # Gatehouse
//!
//! An on-prem engine for feature gates, dynamic configs and experiments
//! over a flat key-value store:
//! - Bidirectional entity ↔ target app ↔ SDK key indices without transactions
//! - Closed condition set and an id-addressed, order-preserving rule list
//! - Config spec compilation with deterministic experiment bucketing
//! - Explicitly invalidated spec and SDK key caches
//! - One-shot migration from the legacy untagged set encoding
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine                              │
//! │        (mutation → index repair → cache invalidation)       │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌─────────────┐       ┌───────────────┐       ┌─────────────┐
//! │    Cache    │       │ SpecAssembler │──────▶│    Rules    │
//! │ specs, keys │       │  (adapters)   │       │ (conditions)│
//! └─────────────┘       └───────┬───────┘       └─────────────┘
//!                               │
//!                               ▼
//!                     ┌───────────────────┐
//!                     │ AssociationStore  │
//!                     │  (KeyCodec, Hash) │
//!                     └─────────┬─────────┘
//!                               │
//!                               ▼
//!                     ┌───────────────────┐
//!                     │      Storage      │
//!                     │  (memory / file)  │
//!                     └───────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod cache;
pub mod codec;
pub mod engine;
pub mod hash;
pub mod model;
pub mod rules;
pub mod specs;
pub mod storage;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use engine::{BatchItem, Engine, EngineBuilder, MutationStatus};
pub use error::{GatehouseError, Result};
pub use hash::{Djb2Hash, HashService, SharedHash};
pub use model::{
    DynamicConfig, DynamicConfigArgs, DynamicConfigUpdate, EntityKind, EntityNames, Experiment, ExperimentArgs,
    ExperimentGroup, ExperimentUpdate, FeatureGate, FeatureGateArgs, FeatureGateUpdate, NameSet, TargetAppUpdate,
};
pub use rules::{Condition, ConfigRuleBuilder, NewRule, Operator, TargetValue};
pub use specs::{ConfigSpecs, ConfigSpecsOptions, Selection, SsrOptions};
pub use storage::{FileStorage, FileStorageConfig, MemoryStorage, Storage};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Gatehouse
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
