//! Core types and traits for sqlweave.
//!
//! This crate provides the foundational pieces the query compiler builds on:
//!
//! - `Value` for constants and bound parameters
//! - `Entity` trait and `ColumnInfo` declarations for struct-to-table mapping
//! - `EntityMetadata` with a process-wide resolver cache
//! - `Error` taxonomy shared by every sqlweave crate
//! - `LoadBalancer` strategies for replica selection

pub mod balance;
pub mod entity;
pub mod error;
pub mod field;
pub mod metadata;
pub mod value;

pub use balance::{LoadBalancer, RoundRobin, WeightedRandom};
pub use entity::Entity;
pub use error::{
    ConfigError, Error, MetadataError, MetadataErrorKind, Result, TranslationError,
    TranslationErrorKind,
};
pub use field::ColumnInfo;
pub use metadata::{ColumnMetadata, EntityMetadata, resolve};
pub use value::Value;
