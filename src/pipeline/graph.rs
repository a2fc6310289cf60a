use std::collections::HashMap;

use log::debug;

use crate::model::{EdgeKind, GraphEdge, GraphNode, PipelineGraph, PipelineModel, Position};

/// Horizontal distance between stage columns.
pub const HORIZONTAL_GAP: f64 = 260.0;
/// Vertical distance between jobs of the same stage.
pub const VERTICAL_GAP: f64 = 120.0;

/// Lays out a pipeline as a graph of jobs.
///
/// Nodes sit in the column of their stage and in the row given by their
/// position among that stage's jobs. Every `needs` and `dependencies` entry
/// becomes an edge pointing from the referenced job to the job declaring it.
/// Edges are neither deduplicated nor checked against existing nodes.
pub fn build(pipeline: Option<&PipelineModel>) -> PipelineGraph {
    let Some(pipeline) = pipeline else {
        return PipelineGraph::default();
    };

    let stage_index: HashMap<&str, usize> = pipeline
        .stages
        .iter()
        .map(|s| (s.name.as_str(), s.index))
        .collect();

    let mut rows_taken: HashMap<&str, usize> = HashMap::new();

    let nodes: Vec<GraphNode> = pipeline
        .jobs
        .iter()
        .map(|job| {
            let column = stage_index.get(job.stage.as_str()).copied().unwrap_or(0);
            let row = rows_taken.entry(job.stage.as_str()).or_insert(0);
            let position_in_stage = *row;
            *row += 1;

            #[allow(clippy::cast_precision_loss)]
            let position = Position {
                x: column as f64 * HORIZONTAL_GAP,
                y: position_in_stage as f64 * VERTICAL_GAP,
            };

            GraphNode {
                id: job.name.clone(),
                job_name: job.name.clone(),
                stage: job.stage.clone(),
                stage_index: column,
                position,
            }
        })
        .collect();

    let mut edges = Vec::new();
    for job in &pipeline.jobs {
        for need in &job.needs {
            edges.push(GraphEdge {
                id: format!("needs-{need}-{}", job.name),
                from: need.clone(),
                to: job.name.clone(),
                kind: EdgeKind::Needs,
            });
        }

        for dependency in &job.dependencies {
            edges.push(GraphEdge {
                id: format!("dep-{dependency}-{}", job.name),
                from: dependency.clone(),
                to: job.name.clone(),
                kind: EdgeKind::Dependency,
            });
        }
    }

    debug!("Built graph with {} nodes and {} edges", nodes.len(), edges.len());

    PipelineGraph { nodes, edges }
}
