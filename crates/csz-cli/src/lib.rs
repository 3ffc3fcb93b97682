//! `csz-probe`: run the collection-literal and lock analysis over JSON
//! fixtures and print diagnostics, literal facts and lowering plans.
//!
//! - `fixture` - the fixture file model and its loader
//! - `type_names` - type-name parsing against declared and core types
//! - `driver` - loads, analyses and builds a report
//! - `render` - text and JSON renderings of a report
//! - `tracing_config` - `CSZ_LOG` / `CSZ_LOG_FORMAT` subscriber setup

pub mod args;
pub mod driver;
pub mod fixture;
pub mod render;
pub mod tracing_config;
pub mod type_names;
