//! Load → analyze / load → build orchestration.
//!
//! The analyzer and the graph builder both borrow the loader's model; neither
//! sees the other's output.

pub mod analyzer;
pub mod graph;
pub mod loader;

use serde::{Deserialize, Serialize};

use crate::model::{AnalysisSummary, Issue, PipelineGraph, PipelineModel};

pub use analyzer::{analyze, Analysis};
pub use graph::build;
pub use loader::{load, LoadResult};

/// Everything produced for one configuration document.
///
/// `issues` holds the loader's issues followed by the analyzer's, in the
/// order they were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub pipeline: Option<PipelineModel>,
    pub issues: Vec<Issue>,
    pub summary: AnalysisSummary,
    pub graph: PipelineGraph,
}

/// Issues and counts without the model or the graph, as offered for download.
#[derive(Debug, Clone, Serialize)]
pub struct IssueReport<'a> {
    pub summary: &'a AnalysisSummary,
    pub issues: &'a [Issue],
}

impl PipelineReport {
    pub fn issue_report(&self) -> IssueReport<'_> {
        IssueReport {
            summary: &self.summary,
            issues: &self.issues,
        }
    }
}

pub fn process(source: &str) -> PipelineReport {
    let LoadResult { pipeline, issues } = load(source);
    let analysis = analyze(pipeline.as_ref());
    let graph = build(pipeline.as_ref());

    let mut merged = issues;
    merged.extend(analysis.issues);

    PipelineReport {
        pipeline,
        issues: merged,
        summary: analysis.summary,
        graph,
    }
}
