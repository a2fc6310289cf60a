mod details;
mod exports;
mod styling;
mod summary;
mod tables;

pub use details::render_job_details;
pub use exports::{export_report, render_text_report, ExportOptions};
pub use styling::{dim, magenta_bold};
pub use summary::{render_summary, SummaryOptions};

/// Prints the `cigraph` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🕸️ cigraph"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("GitLab CI Pipeline Analyzer")
    );
}
