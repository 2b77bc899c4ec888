//! Datarip Domain Layer
//!
//! This crate contains the shared vocabulary of Datarip: the field schema a user
//! asks for, the rows a job walks over, the tool descriptor handed to the
//! extraction service, and the trait interface for the language-model provider.
//!
//! ## Key Concepts
//!
//! - **Schema**: The compiled description of fields to extract (names, types,
//!   descriptions, required set)
//! - **Row / Table**: The tabular input boundary; rows are never mutated, merges
//!   produce copies
//! - **Tool descriptor**: The function signature derived from a schema that forces
//!   the provider to answer with structured arguments
//! - **JobId**: UUIDv7 identifier for one extraction job
//!
//! ## Architecture
//!
//! - No I/O and no async runtime in this crate
//! - Infrastructure implementations (providers, CLI) live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod job;
pub mod row;
pub mod schema;
pub mod tool;
pub mod traits;

// Re-exports for convenience
pub use job::JobId;
pub use row::{Row, Table};
pub use schema::{FieldSpec, Schema, SchemaError};
pub use tool::{ChatMessage, Role, ToolDescriptor};
