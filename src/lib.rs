//! Turn per-parameter spec strings such as `integer(0, 10, default=5)` into
//! typed, validated parameter descriptors.
//!
//! - [`grammar`] tokenizes spec strings and coerces textual values.
//! - [`lower`] holds the handler registry and builds one descriptor.
//! - [`schema`] builds a whole config object, failing atomically.
pub mod error;
pub mod grammar;
pub mod ir;
pub mod lower;
pub mod path_de;
pub mod schema;

pub use error::BuildError;
pub use ir::{DefaultValue, ElemTy, ParameterDescriptor, Ty, Value, UNBOUNDED_LEN};
pub use lower::{BoolListCoercion, BuildOptions};
pub use schema::{build_many, build_schema, build_schema_with, emit_schema, ConfigSpec, ParameterSchema};
