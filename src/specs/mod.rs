//! Specs Module
//!
//! Compiles stored entities into the config spec document an evaluation SDK
//! consumes.
//!
//! ## Responsibilities
//! - Entity adapters: one compiled view per entity kind
//! - Experiment bucketing: N groups split `[0, 1000)` into N equal spans
//! - Assembly: sdk key → visible entities → `ConfigSpecs`
//! - SSR mapping: `hash(source) → {gates, configs}`
//!
//! ## Output
//! ```text
//! {
//!   "feature_gates":   [Spec],
//!   "dynamic_configs": [Spec],        configs, then experiments
//!   "layer_configs":   [],
//!   "layers":          {},
//!   "has_updates":     true,
//!   "time":            <epoch ms>,
//!   "hashed_sdk_keys_to_entities": {...}   SSR requests only
//! }
//! ```

mod assembler;
mod entity;
mod options;
mod wire;

pub use assembler::SpecAssembler;
pub use entity::{ConfigEntity, Entity, ExperimentEntity, GateEntity, BUCKET_SPACE};
pub use options::{ConfigSpecsOptions, Selection, SsrOptions};
pub use wire::{
    ApiCondition, ApiConditionType, ApiConfigSpec, ApiConfigType, ApiEntityNames, ApiEntityType, ApiRule, ConfigSpecs,
};
