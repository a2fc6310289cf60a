use anyhow::Result;
use std::io::Write;

use crate::config::{OutputFormat, SeverityFilter};
use crate::model::{AnalysisSummary, Issue, Severity};
use crate::pipeline::PipelineReport;

use super::summary::{render_summary, SummaryOptions};

/// Settings shared by every export format.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions<'a> {
    pub pretty: bool,
    pub severity: SeverityFilter,
    pub show_graph: bool,
    /// Where the configuration came from, shown in the summary
    pub source: &'a str,
}

/// Exports a pipeline report in the requested format.
///
/// - Summary: colored terminal tables
/// - JSON: the full report (model, merged issues, summary and graph)
/// - Report: the plain-text issue report
/// - CSV: one row per issue, for spreadsheets
pub fn export_report(
    report: &PipelineReport,
    format: OutputFormat,
    options: ExportOptions<'_>,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            let summary = render_summary(
                report,
                options.source,
                SummaryOptions {
                    severity: options.severity,
                    show_graph: options.show_graph,
                },
            );
            writeln!(output, "{summary}")?;
            Ok(())
        }
        OutputFormat::Json => export_json(report, options.pretty, output),
        OutputFormat::Report => {
            let text = render_text_report(&report.summary, &report.issues, options.severity);
            writeln!(output, "{text}")?;
            Ok(())
        }
        OutputFormat::Csv => export_csv(&report.issues, options.severity, output),
    }
}

fn export_json(report: &PipelineReport, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{}", json)?;
    Ok(())
}

/// Renders the issue report as plain text.
///
/// The header counts come from the summary; the listed issues are the ones
/// matching `filter`.
pub fn render_text_report(
    summary: &AnalysisSummary,
    issues: &[Issue],
    filter: SeverityFilter,
) -> String {
    let filtered: Vec<&Issue> = issues
        .iter()
        .filter(|i| filter.matches(i.severity))
        .collect();

    let mut lines = vec![
        format!(
            "CI pipeline analysis: {} issues ({} errors, {} warnings)",
            filtered.len(),
            summary.errors,
            summary.warnings
        ),
        String::new(),
    ];

    lines.extend(filtered.iter().map(|issue| {
        let tag = match issue.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        match issue.scope() {
            Some(scope) => format!("{tag} [{scope}]: {}", issue.message),
            None => format!("{tag}: {}", issue.message),
        }
    }));

    lines.join("\n")
}

fn export_csv(issues: &[Issue], filter: SeverityFilter, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "Severity,Job,Stage,Message")?;

    for issue in issues.iter().filter(|i| filter.matches(i.severity)) {
        writeln!(
            output,
            "{},{},{},{}",
            issue.severity.as_str(),
            csv_field(issue.job_name.as_deref().unwrap_or("")),
            csv_field(issue.stage_name.as_deref().unwrap_or("")),
            csv_field(&issue.message)
        )?;
    }

    Ok(())
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::process;

    fn options(pretty: bool, severity: SeverityFilter) -> ExportOptions<'static> {
        ExportOptions {
            pretty,
            severity,
            show_graph: true,
            source: "test",
        }
    }

    fn export_to_string(
        report: &PipelineReport,
        format: OutputFormat,
        opts: ExportOptions<'_>,
    ) -> String {
        let mut buffer = Vec::new();
        export_report(report, format, opts, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    const BROKEN: &str = "stages: [build, deploy]\n\
                          a:\n  stage: build\n  script: x\n  needs: [ghost]\n\
                          b:\n  script: y\n";

    #[test]
    fn test_text_report_lists_scoped_issues() {
        let report = process(BROKEN);
        let text = render_text_report(&report.summary, &report.issues, SeverityFilter::All);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            format!(
                "CI pipeline analysis: {} issues (1 errors, 1 warnings)",
                report.issues.len()
            )
        );
        assert_eq!(lines[1], "");
        for expected in [
            r#"WARN [b]: Job "b" has no stage defined; assuming "test"."#,
            r#"WARN [test]: Stage "test" is used by jobs but not listed in stages."#,
            r#"ERROR [a]: Job "a" declares a need on "ghost", which does not exist."#,
            r#"WARN [deploy]: Stage "deploy" is declared but not used by any job."#,
        ] {
            assert!(lines.contains(&expected), "missing line: {expected}");
        }
    }

    #[test]
    fn test_text_report_filters_by_severity() {
        let report = process(BROKEN);
        let text = render_text_report(&report.summary, &report.issues, SeverityFilter::Error);

        assert!(text.starts_with("CI pipeline analysis: 1 issues"));
        assert_eq!(text.lines().filter(|l| l.starts_with("WARN")).count(), 0);
        assert_eq!(text.lines().filter(|l| l.starts_with("ERROR")).count(), 1);
    }

    #[test]
    fn test_text_report_without_scope() {
        let report = process("   ");
        let text = render_text_report(&report.summary, &report.issues, SeverityFilter::All);
        assert!(text.ends_with("WARN: Configuration is empty. Paste a .gitlab-ci.yml to start."));
    }

    #[test]
    fn test_export_json_roundtrips_report() {
        let report = process(BROKEN);
        let output = export_to_string(
            &report,
            OutputFormat::Json,
            options(false, SeverityFilter::All),
        );

        let parsed: PipelineReport = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_export_csv_escapes_quotes() {
        let report = process(BROKEN);
        let output = export_to_string(
            &report,
            OutputFormat::Csv,
            options(false, SeverityFilter::Error),
        );
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Severity,Job,Stage,Message");
        assert_eq!(
            lines[1],
            r#"error,"a","","Job ""a"" declares a need on ""ghost"", which does not exist.""#
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_export_summary_and_report_formats() {
        let report = process(BROKEN);

        let all = options(false, SeverityFilter::All);

        let summary = export_to_string(&report, OutputFormat::Summary, all);
        assert!(summary.contains("Overview"));

        let text = export_to_string(&report, OutputFormat::Report, all);
        assert!(text.starts_with("CI pipeline analysis:"));
    }
}
