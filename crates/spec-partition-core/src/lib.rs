//! spec-partition - test selection and execution partitioning for CI
//!
//! Decides which API specs a CI invocation runs and how they are split
//! across parallel workers:
//! - Resolves a run-mode keyword into a tag-matching policy
//! - Applies branch-scoped skip rules
//! - Filters the discovered spec corpus and splits it by db-less support
//! - Packs each partition into duration-balanced groups (First-Fit-Decreasing)
//! - Emits the runner command and the JSON group list on stdout

pub mod branch;
pub mod config;
pub mod corpus;
pub mod durations;
pub mod error;
pub mod packer;
pub mod pattern;
pub mod plan;
pub mod selection;
pub mod skip;
pub mod telemetry;

// Re-export key types
pub use branch::normalize_branch;
pub use config::{EnvMode, RunConfig, DEFAULT_MAX_GROUP_SECS};
pub use corpus::{discover, discover_named, CorpusFilter, Partitions, SpecRecord};
pub use durations::{DurationMap, DurationRecord};
pub use error::{PartitionError, Result};
pub use packer::{pack, Group};
pub use plan::Plan;
pub use selection::{resolve, Selection, SelectionPolicy};
pub use skip::{SkipRule, SkipSet};
pub use telemetry::init_tracing;
