use std::fmt::Write;

use chrono::Utc;
use comfy_table::{Cell, Color as TableColor};
use indexmap::IndexMap;

use crate::config::SeverityFilter;
use crate::model::PipelineModel;
use crate::pipeline::PipelineReport;

use super::styling::{bright, bright_yellow, cyan, dim, error_count, warning_count};
use super::tables::{
    create_cyan_header, create_table, edge_kind_cell, job_count_cell, names_cell, severity_cell,
};

/// What the terminal summary should include.
#[derive(Debug, Clone, Copy)]
pub struct SummaryOptions {
    pub severity: SeverityFilter,
    pub show_graph: bool,
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn jobs_per_stage(pipeline: &PipelineModel) -> IndexMap<&str, usize> {
    let mut counts: IndexMap<&str, usize> = pipeline
        .stages
        .iter()
        .map(|s| (s.name.as_str(), 0))
        .collect();
    for job in &pipeline.jobs {
        *counts.entry(job.stage.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Renders a human-readable summary of a pipeline report.
///
/// Displays:
/// - Overview: stage, job, error and warning counts
/// - Stages: declaration order and how many jobs each one holds
/// - Jobs: stage, image, `needs`, `dependencies` and script length
/// - Issues: filtered by severity, in the order they were found
/// - Graph: node positions and edges (optional)
pub fn render_summary(
    report: &PipelineReport,
    source: &str,
    options: SummaryOptions,
) -> String {
    let mut output = String::new();
    let summary = &report.summary;

    // Loader issues are listed but not counted by the analyzer.
    let parser_hint = if !report.issues.is_empty() && summary.errors == 0 && summary.warnings == 0
    {
        format!(" {}", dim("(from parser)"))
    } else {
        String::new()
    };

    // Overview section
    add_section_header(&mut output, "📊", "Overview");
    let _ = write!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}{}\n  {} {}\n\n",
        dim("Source:"),
        cyan(source),
        dim("Stages:"),
        bright_yellow(summary.total_stages),
        dim("Jobs:"),
        bright_yellow(summary.total_jobs),
        dim("Errors:"),
        error_count(summary.errors),
        dim("Warnings:"),
        warning_count(summary.warnings),
        parser_hint,
        dim("Analysis date:"),
        dim(Utc::now().format("%Y-%m-%d %H:%M UTC"))
    );

    match &report.pipeline {
        Some(pipeline) => render_model(&mut output, pipeline),
        None => {
            let _ = writeln!(
                output,
                "{}\n",
                bright_yellow("No pipeline could be built from this configuration.")
            );
        }
    }

    render_issues(&mut output, report, options.severity);

    if options.show_graph && !report.graph.nodes.is_empty() {
        render_graph(&mut output, report);
    }

    output
}

fn render_model(output: &mut String, pipeline: &PipelineModel) {
    add_section_header(output, "🧱", "Stages");

    let counts = jobs_per_stage(pipeline);
    let mut stages_table = create_table();
    stages_table.set_header(create_cyan_header(&["#", "Stage", "Jobs"]));
    for stage in &pipeline.stages {
        let count = counts.get(stage.name.as_str()).copied().unwrap_or(0);
        stages_table.add_row(vec![
            Cell::new(stage.index),
            Cell::new(&stage.name),
            job_count_cell(count),
        ]);
    }
    let _ = write!(output, "{stages_table}\n\n");

    if pipeline.jobs.is_empty() {
        return;
    }

    add_section_header(output, "⚙️", "Jobs");

    let mut jobs_table = create_table();
    jobs_table.set_header(create_cyan_header(&[
        "Job",
        "Stage",
        "Image",
        "Needs",
        "Dependencies",
        "Script",
    ]));
    for job in &pipeline.jobs {
        let script = if job.script.is_empty() {
            Cell::new("none").fg(TableColor::Yellow)
        } else {
            Cell::new(format!("{} lines", job.script.len()))
        };

        jobs_table.add_row(vec![
            Cell::new(&job.name),
            Cell::new(&job.stage),
            Cell::new(job.image.as_deref().unwrap_or("-")),
            names_cell(&job.needs),
            names_cell(&job.dependencies),
            script,
        ]);
    }
    let _ = write!(output, "{jobs_table}\n\n");
}

fn render_issues(output: &mut String, report: &PipelineReport, filter: SeverityFilter) {
    add_section_header(output, "🔎", "Issues");

    let issues: Vec<_> = report
        .issues
        .iter()
        .filter(|i| filter.matches(i.severity))
        .collect();

    if issues.is_empty() {
        let _ = writeln!(output, "  {}\n", dim("No issues to report."));
        return;
    }

    let mut issues_table = create_table();
    issues_table.set_header(create_cyan_header(&["#", "Severity", "Scope", "Message"]));
    for (idx, issue) in issues.iter().enumerate() {
        issues_table.add_row(vec![
            Cell::new(idx + 1),
            severity_cell(issue.severity),
            Cell::new(issue.scope().unwrap_or("-")),
            Cell::new(&issue.message),
        ]);
    }
    let _ = write!(output, "{issues_table}\n\n");
}

fn render_graph(output: &mut String, report: &PipelineReport) {
    add_section_header(output, "🕸️", "Graph");

    let mut nodes_table = create_table();
    nodes_table.set_header(create_cyan_header(&["Job", "Stage", "Column", "x", "y"]));
    for node in &report.graph.nodes {
        nodes_table.add_row(vec![
            Cell::new(&node.job_name),
            Cell::new(&node.stage),
            Cell::new(node.stage_index),
            Cell::new(format!("{:.0}", node.position.x)),
            Cell::new(format!("{:.0}", node.position.y)),
        ]);
    }
    let _ = write!(output, "{nodes_table}\n\n");

    if report.graph.edges.is_empty() {
        return;
    }

    let mut edges_table = create_table();
    edges_table.set_header(create_cyan_header(&["From", "To", "Kind"]));
    for edge in &report.graph.edges {
        edges_table.add_row(vec![
            Cell::new(&edge.from),
            Cell::new(&edge.to),
            edge_kind_cell(edge.kind),
        ]);
    }
    let _ = write!(output, "{edges_table}\n\n");
}
