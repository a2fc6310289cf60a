use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::model::{AnalysisSummary, Issue, IssueLog, Job, PipelineModel, Severity};

/// Stage count at which the pipeline is flagged as having many stages.
pub const MANY_STAGES_THRESHOLD: usize = 10;
/// Job count at which the pipeline is flagged as having many jobs.
pub const MANY_JOBS_THRESHOLD: usize = 30;

#[derive(Debug)]
pub struct Analysis {
    pub issues: Vec<Issue>,
    pub summary: AnalysisSummary,
}

/// Detects semantic problems in a loaded pipeline.
///
/// Runs every check independently against the full job and stage set:
/// unused stages, cyclic `needs`, `needs` on jobs that don't exist, `needs`
/// pointing at a later stage, and size heuristics. An absent model yields no
/// issues and a zeroed summary.
pub fn analyze(pipeline: Option<&PipelineModel>) -> Analysis {
    let mut log = IssueLog::new("analysis");

    let Some(pipeline) = pipeline else {
        return Analysis {
            summary: AnalysisSummary {
                warnings: log.count(Severity::Warning),
                ..AnalysisSummary::default()
            },
            issues: log.into_issues(),
        };
    };

    check_unused_stages(pipeline, &mut log);
    check_cyclic_needs(pipeline, &mut log);
    check_need_references(pipeline, &mut log);
    check_scale(pipeline, &mut log);

    let summary = AnalysisSummary {
        total_stages: pipeline.stages.len(),
        total_jobs: pipeline.jobs.len(),
        errors: log.count(Severity::Error),
        warnings: log.count(Severity::Warning),
    };

    info!(
        "Analysis found {} errors and {} warnings",
        summary.errors, summary.warnings
    );

    Analysis {
        issues: log.into_issues(),
        summary,
    }
}

fn check_unused_stages(pipeline: &PipelineModel, log: &mut IssueLog) {
    let used: HashSet<&str> = pipeline.jobs.iter().map(|j| j.stage.as_str()).collect();

    for stage in &pipeline.stages {
        if !used.contains(stage.name.as_str()) {
            log.warning(format!(
                "Stage \"{}\" is declared but not used by any job.",
                stage.name
            ))
            .for_stage(&stage.name);
        }
    }
}

fn check_cyclic_needs(pipeline: &PipelineModel, log: &mut IssueLog) {
    let needs_graph: HashMap<&str, &[String]> = pipeline
        .jobs
        .iter()
        .map(|j| (j.name.as_str(), j.needs.as_slice()))
        .collect();

    let roots: Vec<&str> = pipeline.jobs.iter().map(|j| j.name.as_str()).collect();

    for cycle in find_cycles(&roots, &needs_graph) {
        debug!("Cycle found: {cycle:?}");
        log.error(format!("Cyclic needs detected: {}", cycle.join(" -> ")));
    }
}

/// Finds `needs` cycles reachable from each root, in root order.
///
/// Each job is expanded at most once across all roots, so the search
/// terminates for any finite graph. A returned cycle ends with its starting
/// job repeated, e.g. `[a, b, a]`. A job needing itself is not reported.
fn find_cycles<'a>(
    roots: &[&'a str],
    graph: &HashMap<&'a str, &'a [String]>,
) -> Vec<Vec<&'a str>> {
    let mut search = CycleSearch {
        graph,
        seen: HashSet::new(),
        path: Vec::new(),
        on_path: HashMap::new(),
        pending: Vec::new(),
        cycles: Vec::new(),
    };

    for &root in roots {
        search.enter(root);

        loop {
            let Some(frame) = search.pending.last_mut() else {
                break;
            };
            let neighbours: &'a [String] = frame.0;
            let Some(neighbour) = neighbours.get(frame.1) else {
                search.leave();
                continue;
            };
            frame.1 += 1;
            search.enter(neighbour);
        }
    }

    search.cycles
}

/// Depth-first walk over `needs` kept on the heap, so long chains cannot
/// exhaust the call stack.
struct CycleSearch<'g, 'a> {
    graph: &'g HashMap<&'a str, &'a [String]>,
    seen: HashSet<&'a str>,
    /// Jobs on the current walk, outermost first.
    path: Vec<&'a str>,
    /// Position of each job of `path` within it.
    on_path: HashMap<&'a str, usize>,
    /// For each job of `path`, its needs and the index of the next one to visit.
    pending: Vec<(&'a [String], usize)>,
    cycles: Vec<Vec<&'a str>>,
}

impl<'g, 'a> CycleSearch<'g, 'a> {
    fn enter(&mut self, name: &'a str) {
        if let Some(&start) = self.on_path.get(name) {
            // Fewer than two distinct jobs on the loop means a self-need.
            if self.path.len() - start >= 2 {
                let mut cycle = self.path[start..].to_vec();
                cycle.push(name);
                self.cycles.push(cycle);
            }
            return;
        }

        if !self.seen.insert(name) {
            return;
        }

        let Some(&neighbours) = self.graph.get(name) else {
            return;
        };

        self.on_path.insert(name, self.path.len());
        self.path.push(name);
        self.pending.push((neighbours, 0));
    }

    fn leave(&mut self) {
        self.pending.pop();
        if let Some(name) = self.path.pop() {
            self.on_path.remove(name);
        }
    }
}

/// Reports `needs` on missing jobs and `needs` on jobs in a later stage.
fn check_need_references(pipeline: &PipelineModel, log: &mut IssueLog) {
    let stage_index: HashMap<&str, usize> = pipeline
        .stages
        .iter()
        .map(|s| (s.name.as_str(), s.index))
        .collect();

    let jobs_by_name: HashMap<&str, &Job> = pipeline
        .jobs
        .iter()
        .map(|j| (j.name.as_str(), j))
        .collect();

    for job in &pipeline.jobs {
        let job_stage = stage_index.get(job.stage.as_str()).copied();

        for need in &job.needs {
            let Some(target) = jobs_by_name.get(need.as_str()) else {
                log.error(format!(
                    "Job \"{}\" declares a need on \"{need}\", which does not exist.",
                    job.name
                ))
                .for_job(&job.name);
                continue;
            };

            let need_stage = stage_index.get(target.stage.as_str()).copied();
            if let (Some(job_stage), Some(need_stage)) = (job_stage, need_stage) {
                if need_stage > job_stage {
                    log.warning(format!(
                        "Job \"{}\" needs \"{need}\", which is in a later stage (\"{}\"). This may create surprising execution order.",
                        job.name, target.stage
                    ))
                    .for_job(&job.name);
                }
            }
        }
    }
}

fn check_scale(pipeline: &PipelineModel, log: &mut IssueLog) {
    let total_stages = pipeline.stages.len();
    let total_jobs = pipeline.jobs.len();

    if total_stages >= MANY_STAGES_THRESHOLD {
        log.warning(format!(
            "Pipeline has {total_stages} stages. Consider whether all stages are necessary or can be merged."
        ));
    }

    if total_jobs >= MANY_JOBS_THRESHOLD {
        log.warning(format!(
            "Pipeline has {total_jobs} jobs. You might be able to simplify or split the pipeline."
        ));
    }
}
