// Library exports for visualbind

pub mod data;
pub mod palette;
pub mod runtime;

// Field wells and bindings
pub mod schema;
pub mod binding;
pub mod registry;

// Shaping and compilation
pub mod shape;
pub mod config;
pub mod ir;
pub mod compiler;
pub mod filter;
pub mod small_multiples;

pub use binding::{attach_field, detach_field, Aggregation, Field, FieldBinding, VisualDataBinding};
pub use compiler::compile;
pub use config::VisualConfig;
pub use data::{Dataset, RawRow, Value};
pub use filter::{apply_filters, Filter};
pub use ir::ChartSpec;
pub use runtime::{resolve_report, resolve_visual, Report, Visual, VisualOutput};
pub use schema::{schema_for, Role};
pub use shape::shape;
pub use small_multiples::{compile_small_multiples, partition};
