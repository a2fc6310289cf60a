use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// An ordered execution phase of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    /// Position in declaration order (explicit `stages:` list, else first use)
    pub index: usize,
}

/// A job definition extracted from the configuration.
///
/// `needs` and `dependencies` are plain name references; whether the named
/// jobs exist is checked by the analyzer, never at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job name as defined in .gitlab-ci.yml (the mapping key)
    pub name: String,
    /// Stage this job belongs to
    pub stage: String,
    pub script: Vec<String>,
    /// Explicit job dependencies via `needs` keyword
    pub needs: Vec<String>,
    /// Artifact-only dependencies via `dependencies` keyword
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineModel {
    pub stages: Vec<Stage>,
    pub jobs: Vec<Job>,
}

impl PipelineModel {
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// A reported problem. Ids are unique within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_name: Option<String>,
}

impl Issue {
    /// Job name if the issue is about a job, else the stage name.
    pub fn scope(&self) -> Option<&str> {
        self.job_name.as_deref().or(self.stage_name.as_deref())
    }

    pub fn for_job(&mut self, job_name: &str) -> &mut Self {
        self.job_name = Some(job_name.to_string());
        self
    }

    pub fn for_stage(&mut self, stage_name: &str) -> &mut Self {
        self.stage_name = Some(stage_name.to_string());
        self
    }
}

/// Accumulates issues for one component, handing out positional ids.
///
/// Ids take the form `<source>-<severity>-<n>`, so two logs with different
/// sources never produce colliding ids within the same run.
#[derive(Debug)]
pub struct IssueLog {
    source: &'static str,
    issues: Vec<Issue>,
}

impl IssueLog {
    pub fn new(source: &'static str) -> Self {
        Self {
            source,
            issues: Vec::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) -> &mut Issue {
        self.push(Severity::Error, message.into())
    }

    pub fn warning(&mut self, message: impl Into<String>) -> &mut Issue {
        self.push(Severity::Warning, message.into())
    }

    fn push(&mut self, severity: Severity, message: String) -> &mut Issue {
        let id = format!("{}-{}-{}", self.source, severity.as_str(), self.issues.len());
        self.issues.push(Issue {
            id,
            severity,
            message,
            job_name: None,
            stage_name: None,
        });
        let last = self.issues.len() - 1;
        &mut self.issues[last]
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub total_stages: usize,
    pub total_jobs: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub job_name: String,
    pub stage: String,
    pub stage_index: usize,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Needs,
    Dependency,
}

/// A dependency edge pointing from the referenced job to its dependent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}
