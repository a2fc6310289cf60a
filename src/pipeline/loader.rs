use log::{debug, info};
use serde_yaml::{Mapping, Value};

use crate::model::{Issue, IssueLog, Job, PipelineModel, Stage};

/// Top-level keys that configure the pipeline instead of defining a job.
const RESERVED_TOP_LEVEL_KEYS: &[&str] = &[
    "stages",
    "default",
    "include",
    "variables",
    "workflow",
    "image",
    "services",
    "cache",
    "before_script",
    "after_script",
];

const DEFAULT_STAGE: &str = "test";

/// Outcome of loading a configuration document.
///
/// `pipeline` is `None` only when the document is empty, is not valid YAML,
/// or its root is not a mapping. Every other problem is recorded in `issues`
/// and the model is still built from best-effort defaults.
#[derive(Debug)]
pub struct LoadResult {
    pub pipeline: Option<PipelineModel>,
    pub issues: Vec<Issue>,
}

/// Parses raw `.gitlab-ci.yml` text into a [`PipelineModel`].
pub fn load(source: &str) -> LoadResult {
    let mut log = IssueLog::new("load");

    if source.trim().is_empty() {
        log.warning("Configuration is empty. Paste a .gitlab-ci.yml to start.");
        return LoadResult {
            pipeline: None,
            issues: log.into_issues(),
        };
    }

    let raw: Value = match serde_yaml::from_str(source) {
        Ok(value) => value,
        Err(e) => {
            debug!("YAML parsing failed: {e}");
            log.error(format!("Invalid YAML: {e}"));
            return LoadResult {
                pipeline: None,
                issues: log.into_issues(),
            };
        }
    };

    let Value::Mapping(root) = raw else {
        log.error("Top-level structure must be a mapping of jobs and options.");
        return LoadResult {
            pipeline: None,
            issues: log.into_issues(),
        };
    };

    let explicit_stages = extract_stages(&root);
    if explicit_stages.is_empty() {
        log.warning("No explicit stages defined. GitLab will infer a default stage ordering.");
    }

    let mut jobs = Vec::new();
    for (key, value) in &root {
        let Some(name) = key_to_string(key) else {
            log.warning(format!(
                "Top-level key {} does not look like a job definition.",
                describe_key(key)
            ));
            continue;
        };

        if RESERVED_TOP_LEVEL_KEYS.contains(&name.as_str()) || name.starts_with('.') {
            continue;
        }

        let Value::Mapping(node) = value else {
            log.warning(format!(
                "Top-level key \"{name}\" does not look like a job definition."
            ));
            continue;
        };

        jobs.push(build_job(name, node, &mut log));
    }

    let stages = resolve_stages(explicit_stages, &jobs, &mut log);

    if jobs.is_empty() {
        log.warning("No jobs detected in configuration.");
    }

    info!(
        "Loaded pipeline with {} stages and {} jobs",
        stages.len(),
        jobs.len()
    );

    LoadResult {
        pipeline: Some(PipelineModel { stages, jobs }),
        issues: log.into_issues(),
    }
}

/// String entries of the `stages:` list, deduplicated so that the last
/// occurrence of a repeated name determines its position.
fn extract_stages(root: &Mapping) -> Vec<String> {
    let names: Vec<&str> = root
        .get("stages")
        .and_then(Value::as_sequence)
        .map(|seq| seq.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    names
        .iter()
        .enumerate()
        .filter(|&(i, name)| !names[i + 1..].contains(name))
        .map(|(_, name)| (*name).to_string())
        .collect()
}

fn build_job(name: String, node: &Mapping, log: &mut IssueLog) -> Job {
    let stage = match node.get("stage").and_then(Value::as_str) {
        Some(stage) => stage.to_string(),
        None => {
            log.warning(format!(
                "Job \"{name}\" has no stage defined; assuming \"{DEFAULT_STAGE}\"."
            ))
            .for_job(&name);
            DEFAULT_STAGE.to_string()
        }
    };

    let script = normalize_script(node.get("script"));
    if script.is_empty() {
        log.warning(format!("Job \"{name}\" does not define a script."))
            .for_job(&name);
    }

    debug!("Extracted job {name} in stage {stage}");

    Job {
        stage,
        script,
        needs: normalize_needs(node.get("needs")),
        dependencies: string_entries(node.get("dependencies")),
        image: node.get("image").and_then(Value::as_str).map(str::to_string),
        only: node.get("only").cloned(),
        except: node.get("except").cloned(),
        rules: node.get("rules").cloned(),
        artifacts: node.get("artifacts").cloned(),
        name,
    }
}

fn normalize_script(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(line)) => vec![line.clone()],
        other => string_entries(other),
    }
}

/// Accepts `needs: [build]` as well as `needs: [{ job: build, artifacts: false }]`.
fn normalize_needs(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Sequence(items)) = value else {
        return vec![];
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name.clone()),
            Value::Mapping(entry) => entry.get("job").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

fn string_entries(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_sequence)
        .map(|seq| {
            seq.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn resolve_stages(explicit: Vec<String>, jobs: &[Job], log: &mut IssueLog) -> Vec<Stage> {
    let mut stage_names_from_jobs: Vec<&str> = Vec::new();
    for job in jobs {
        if !stage_names_from_jobs.contains(&job.stage.as_str()) {
            stage_names_from_jobs.push(&job.stage);
        }
    }

    let mut all_stage_names: Vec<String> = if explicit.is_empty() {
        stage_names_from_jobs.iter().map(|s| (*s).to_string()).collect()
    } else {
        explicit
    };

    for stage_name in stage_names_from_jobs {
        if !all_stage_names.iter().any(|s| s == stage_name) {
            all_stage_names.push(stage_name.to_string());
            log.warning(format!(
                "Stage \"{stage_name}\" is used by jobs but not listed in stages."
            ))
            .for_stage(stage_name);
        }
    }

    all_stage_names
        .into_iter()
        .enumerate()
        .map(|(index, name)| Stage { name, index })
        .collect()
}

/// Scalar keys are stringified the way YAML renders them; collection keys
/// cannot name a job.
fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

fn describe_key(key: &Value) -> String {
    serde_yaml::to_string(key)
        .map(|s| s.trim().replace('\n', " "))
        .unwrap_or_else(|_| "<complex key>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    fn load_ok(source: &str) -> (PipelineModel, Vec<Issue>) {
        let result = load(source);
        let pipeline = result.pipeline.expect("expected a pipeline model");
        (pipeline, result.issues)
    }

    fn messages(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.message.as_str()).collect()
    }

    mod fatal_paths {
        use super::*;

        #[test]
        fn test_empty_source_yields_single_warning() {
            for source in ["", "   ", "\n\t\n"] {
                let result = load(source);
                assert!(result.pipeline.is_none());
                assert_eq!(result.issues.len(), 1);
                assert_eq!(result.issues[0].severity, Severity::Warning);
                assert!(result.issues[0].message.contains("empty"));
            }
        }

        #[test]
        fn test_invalid_yaml_yields_single_error_with_parser_message() {
            let result = load("build:\n  script: [unterminated\n");
            assert!(result.pipeline.is_none());
            assert_eq!(result.issues.len(), 1);
            assert_eq!(result.issues[0].severity, Severity::Error);
            assert!(result.issues[0].message.starts_with("Invalid YAML: "));
            assert!(result.issues[0].message.len() > "Invalid YAML: ".len());
        }

        #[test]
        fn test_non_mapping_roots_are_rejected() {
            for source in ["just a string", "- a\n- b\n", "~", "42"] {
                let result = load(source);
                assert!(result.pipeline.is_none(), "source: {source:?}");
                assert_eq!(result.issues.len(), 1);
                assert_eq!(result.issues[0].severity, Severity::Error);
                assert!(result.issues[0].message.contains("mapping"));
            }
        }
    }

    mod stages {
        use super::*;

        #[test]
        fn test_explicit_stages_keep_declaration_order() {
            let (pipeline, issues) = load_ok(
                "stages: [build, test, deploy]\n\
                 compile:\n  stage: build\n  script: make\n\
                 unit:\n  stage: test\n  script: make test\n\
                 ship:\n  stage: deploy\n  script: make deploy\n",
            );

            let names: Vec<_> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["build", "test", "deploy"]);
            let indexes: Vec<_> = pipeline.stages.iter().map(|s| s.index).collect();
            assert_eq!(indexes, vec![0, 1, 2]);
            assert!(issues.is_empty());
        }

        #[test]
        fn test_missing_stages_are_inferred_from_jobs_with_warning() {
            let (pipeline, issues) = load_ok(
                "lint:\n  stage: check\n  script: lint\n\
                 compile:\n  stage: build\n  script: make\n\
                 fmt:\n  stage: check\n  script: fmt\n",
            );

            let names: Vec<_> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["check", "build"]);
            assert_eq!(issues.len(), 1);
            assert!(issues[0].message.contains("No explicit stages"));
        }

        #[test]
        fn test_non_string_stage_entries_are_dropped_silently() {
            let (pipeline, issues) = load_ok(
                "stages: [build, 3, {a: b}, test]\n\
                 compile:\n  stage: build\n  script: make\n\
                 unit:\n  stage: test\n  script: make test\n",
            );

            let names: Vec<_> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["build", "test"]);
            assert!(issues.is_empty());
        }

        #[test]
        fn test_unlisted_stage_is_appended_and_reported() {
            let (pipeline, issues) = load_ok(
                "stages: [build]\n\
                 compile:\n  stage: build\n  script: make\n\
                 ship:\n  stage: deploy\n  script: make deploy\n",
            );

            let deploy = pipeline.stages.iter().find(|s| s.name == "deploy").unwrap();
            assert_eq!(deploy.index, 1);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].stage_name.as_deref(), Some("deploy"));
            assert!(issues[0].message.contains("not listed in stages"));
        }

        #[test]
        fn test_duplicate_stage_names_keep_last_occurrence() {
            let (pipeline, _) = load_ok(
                "stages: [build, test, build]\n\
                 compile:\n  stage: build\n  script: make\n\
                 unit:\n  stage: test\n  script: make test\n",
            );

            let names: Vec<_> = pipeline.stages.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["test", "build"]);
            assert_eq!(pipeline.stages[1].index, 1);
        }
    }

    mod jobs {
        use super::*;

        #[test]
        fn test_reserved_and_hidden_keys_are_not_jobs() {
            let (pipeline, issues) = load_ok(
                "stages: [build]\n\
                 variables:\n  FOO: bar\n\
                 default:\n  image: alpine\n\
                 image: alpine\n\
                 before_script: [echo hi]\n\
                 .template:\n  script: echo\n\
                 compile:\n  stage: build\n  script: make\n",
            );

            assert_eq!(pipeline.jobs.len(), 1);
            assert_eq!(pipeline.jobs[0].name, "compile");
            assert!(issues.is_empty());
        }

        #[test]
        fn test_non_mapping_value_is_reported_and_skipped() {
            let (pipeline, issues) = load_ok(
                "stages: [build]\n\
                 oops: 42\n\
                 compile:\n  stage: build\n  script: make\n",
            );

            assert_eq!(pipeline.jobs.len(), 1);
            assert_eq!(
                messages(&issues),
                vec!["Top-level key \"oops\" does not look like a job definition."]
            );
        }

        #[test]
        fn test_collection_key_is_reported_and_skipped() {
            let (pipeline, issues) = load_ok(
                "stages: [build]\n\
                 ? [a, b]\n: {script: x}\n\
                 compile:\n  stage: build\n  script: make\n",
            );

            let names: Vec<_> = pipeline.jobs.iter().map(|j| j.name.as_str()).collect();
            assert_eq!(names, vec!["compile"]);
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].severity, Severity::Warning);
            assert_eq!(
                issues[0].message,
                "Top-level key - a - b does not look like a job definition."
            );
            assert!(issues[0].job_name.is_none());
        }

        #[test]
        fn test_missing_stage_defaults_to_test() {
            let (pipeline, issues) = load_ok("stages: [test]\nunit:\n  script: cargo test\n");

            assert_eq!(pipeline.jobs[0].stage, "test");
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].job_name.as_deref(), Some("unit"));
            assert!(issues[0].message.contains("assuming \"test\""));
        }

        #[test]
        fn test_script_normalization() {
            let (pipeline, issues) = load_ok(
                "stages: [test]\n\
                 single:\n  stage: test\n  script: echo one\n\
                 list:\n  stage: test\n  script: [echo a, 5, echo b]\n\
                 bogus:\n  stage: test\n  script: {a: b}\n",
            );

            assert_eq!(pipeline.jobs[0].script, vec!["echo one"]);
            assert_eq!(pipeline.jobs[1].script, vec!["echo a", "echo b"]);
            assert!(pipeline.jobs[2].script.is_empty());
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].job_name.as_deref(), Some("bogus"));
            assert!(issues[0].message.contains("does not define a script"));
        }

        #[test]
        fn test_needs_accept_names_and_job_mappings() {
            let (pipeline, _) = load_ok(
                "stages: [build, test]\n\
                 a:\n  stage: build\n  script: x\n\
                 b:\n  stage: build\n  script: x\n\
                 c:\n  stage: test\n  script: x\n  needs:\n    - a\n    - job: b\n      artifacts: false\n    - 7\n    - {pipeline: other}\n",
            );

            assert_eq!(pipeline.jobs[2].needs, vec!["a", "b"]);
        }

        #[test]
        fn test_needs_and_dependencies_require_sequences() {
            let (pipeline, _) = load_ok(
                "stages: [test]\n\
                 c:\n  stage: test\n  script: x\n  needs: a\n  dependencies: [a, 1, b]\n",
            );

            assert!(pipeline.jobs[0].needs.is_empty());
            assert_eq!(pipeline.jobs[0].dependencies, vec!["a", "b"]);
        }

        #[test]
        fn test_pass_through_fields_are_preserved() {
            let (pipeline, _) = load_ok(
                "stages: [test]\n\
                 c:\n  stage: test\n  script: x\n  image: rust:1.80\n  only: [main]\n  rules:\n    - if: $CI\n  artifacts:\n    paths: [target]\n",
            );

            let job = &pipeline.jobs[0];
            assert_eq!(job.image.as_deref(), Some("rust:1.80"));
            assert_eq!(job.only, Some(serde_yaml::from_str("[main]").unwrap()));
            assert!(job.rules.is_some());
            assert!(job.artifacts.is_some());
            assert!(job.except.is_none());
        }

        #[test]
        fn test_non_string_image_is_dropped() {
            let (pipeline, _) = load_ok(
                "stages: [test]\nc:\n  stage: test\n  script: x\n  image:\n    name: alpine\n",
            );
            assert!(pipeline.jobs[0].image.is_none());
        }

        #[test]
        fn test_no_jobs_is_reported() {
            let (pipeline, issues) = load_ok("stages: [build]\nvariables:\n  A: b\n");

            assert!(pipeline.jobs.is_empty());
            assert_eq!(pipeline.stages.len(), 1);
            assert_eq!(messages(&issues), vec!["No jobs detected in configuration."]);
        }

        #[test]
        fn test_job_order_follows_document_order() {
            let (pipeline, _) = load_ok(
                "stages: [test]\nzeta:\n  script: x\nalpha:\n  script: x\nmid:\n  script: x\n",
            );
            let names: Vec<_> = pipeline.jobs.iter().map(|j| j.name.as_str()).collect();
            assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        }
    }

    #[test]
    fn test_issue_ids_are_unique() {
        let result = load("a: 1\nb: 2\nc:\n  script: []\n");
        let mut ids: Vec<_> = result.issues.iter().map(|i| i.id.clone()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert!(total >= 4);
    }
}
