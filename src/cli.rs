use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::{Config, OutputFormat, SeverityFilter};
use crate::output::{export_report, render_job_details, ExportOptions};
use crate::pipeline::{load, process, PipelineReport};
use crate::request::{handle_reader, process_encoded, to_response};

#[derive(Parser)]
#[command(name = "cigraph")]
#[command(author, version, about = "GitLab CI Pipeline Analyzer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./cigraph.toml and friends)
    #[arg(long, global = true, env = "CIGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(long, global = true, default_value_t = false)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and lay out its job graph
    Analyze {
        /// Path to the CI configuration, or `-` for stdin
        #[arg(default_value = ".gitlab-ci.yml")]
        file: PathBuf,

        #[arg(short, long, value_enum)]
        severity: Option<SeverityFilter>,
    },
    /// Answer a JSON request body of the form {"config": "..."}
    Request {
        /// File holding the request body (stdin when omitted)
        file: Option<PathBuf>,
    },
    /// Analyze a URL-encoded configuration string
    Visualize {
        encoded: String,

        #[arg(short, long, value_enum)]
        severity: Option<SeverityFilter>,
    },
    /// Show the details of a single job
    Job {
        name: String,

        #[arg(default_value = ".gitlab-ci.yml")]
        file: PathBuf,
    },
    /// Write a default configuration file
    InitConfig {
        #[arg(default_value = "cigraph.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let config = Config::load(self.config.as_deref())?;

        if self.no_color || !config.output.color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        Ok(config)
    }

    fn emit(&self, contents: &[u8]) -> Result<()> {
        if let Some(output_path) = &self.output {
            std::fs::write(output_path, contents).with_context(|| {
                format!("Failed to write output file: {}", output_path.display())
            })?;
            info!("Report written to: {}", output_path.display());
        } else {
            use std::io::Write;
            std::io::stdout().write_all(contents)?;
        }
        Ok(())
    }

    fn emit_report(
        &self,
        config: &Config,
        report: &PipelineReport,
        source: &str,
        severity: Option<SeverityFilter>,
    ) -> Result<()> {
        let format = self.format.unwrap_or(config.output.format);
        let options = ExportOptions {
            pretty: self.pretty || config.output.pretty,
            severity: severity.unwrap_or(config.report.severity),
            show_graph: config.report.show_graph,
            source,
        };

        let mut buffer = Vec::new();
        export_report(report, format, options, &mut buffer)?;
        self.emit(&buffer)
    }

    fn execute_analyze(&self, file: &Path, severity: Option<SeverityFilter>) -> Result<()> {
        let config = self.load_config()?;
        let source = read_source(file)?;
        info!("Analyzing {}", file.display());

        let report = process(&source);
        self.emit_report(&config, &report, &file.display().to_string(), severity)
    }

    fn execute_request(&self, file: Option<&Path>) -> Result<()> {
        let report = match file {
            Some(path) => {
                let reader = std::fs::File::open(path)
                    .with_context(|| format!("Failed to open request body: {}", path.display()))?;
                handle_reader(reader)?
            }
            None => handle_reader(std::io::stdin().lock())?,
        };

        let mut response = to_response(&report, self.pretty)?;
        response.push('\n');
        self.emit(response.as_bytes())
    }

    fn execute_visualize(&self, encoded: &str, severity: Option<SeverityFilter>) -> Result<()> {
        let config = self.load_config()?;
        let report = process_encoded(Some(encoded))?;
        self.emit_report(&config, &report, "query", severity)
    }

    fn execute_job(&self, name: &str, file: &Path) -> Result<()> {
        self.load_config()?;
        let source = read_source(file)?;

        let result = load(&source);
        let Some(pipeline) = result.pipeline else {
            let reason = result
                .issues
                .first()
                .map_or("no pipeline could be built", |issue| issue.message.as_str());
            bail!("Cannot inspect {}: {reason}", file.display());
        };

        let details = render_job_details(&pipeline, name)?;
        self.emit(details.as_bytes())
    }

    fn execute_init_config(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "{} already exists; pass --force to overwrite it",
                path.display()
            );
        }

        Config::default().save(path)?;
        info!("Default configuration written to: {}", path.display());
        Ok(())
    }

    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Analyze { file, severity } => self.execute_analyze(file, *severity),
            Commands::Request { file } => self.execute_request(file.as_deref()),
            Commands::Visualize { encoded, severity } => {
                self.execute_visualize(encoded, *severity)
            }
            Commands::Job { name, file } => self.execute_job(name, file),
            Commands::InitConfig { path, force } => Self::execute_init_config(path, *force),
        }
    }
}

/// Reads the configuration text from `path`, or from stdin when it is `-`.
fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("Failed to read configuration from stdin")?;
        return Ok(source);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CI configuration: {}", path.display()))
}
