//! Static analysis and graph layout for GitLab CI configurations.
//!
//! A configuration goes through three pure steps: [`pipeline::load`] turns
//! the raw YAML into a [`model::PipelineModel`] plus loader issues,
//! [`pipeline::analyze`] reports structural problems, and [`pipeline::build`]
//! lays the jobs out as a graph. [`pipeline::process`] runs all three.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod request;

pub use error::{CigraphError, Result};
pub use pipeline::{process, PipelineReport};
