use std::fmt::Write;

use crate::error::{CigraphError, Result};
use crate::model::{Job, PipelineModel};

use super::styling::{bright, cyan, dim};

/// Looks up `name` in the model and renders its details.
pub fn render_job_details(pipeline: &PipelineModel, name: &str) -> Result<String> {
    let job = pipeline
        .job(name)
        .ok_or_else(|| CigraphError::UnknownJob(name.to_string()))?;
    Ok(render_job(job))
}

fn render_job(job: &Job) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{} {}", bright("Job details:"), cyan(&job.name));
    let _ = writeln!(output, "  {} {}", dim("Stage:"), job.stage);

    if let Some(image) = &job.image {
        let _ = writeln!(output, "  {} {}", dim("Image:"), image);
    }

    let _ = writeln!(output, "  {}", dim("Script:"));
    if job.script.is_empty() {
        let _ = writeln!(output, "    {}", dim("No script defined."));
    } else {
        for line in &job.script {
            let _ = writeln!(output, "    {line}");
        }
    }

    if !job.needs.is_empty() {
        let _ = writeln!(output, "  {} {}", dim("Needs:"), job.needs.join(", "));
    }

    if !job.dependencies.is_empty() {
        let _ = writeln!(
            output,
            "  {} {}",
            dim("Dependencies:"),
            job.dependencies.join(", ")
        );
    }

    output
}
