//! RDL command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rdl::cli::output::{self, OutputFormat};
use rdl::cli::{eval, params, render, validate};

/// RDL report command-line tool
#[derive(Parser)]
#[command(name = "rdl")]
#[command(author, version, about = "Render and check RDL reports", long_about = None)]
struct Cli {
    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (text, json)
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: String,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    /// Directories searched for sub-reports
    #[arg(short = 'R', long = "report-path", global = true)]
    report_paths: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report to HTML
    Render {
        /// RDL file to render
        file: PathBuf,

        /// Data file (JSON object of data set arrays)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Request file (JSON render request)
        #[arg(short, long)]
        request: Option<PathBuf>,

        /// Parameters (name=value)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Toggle keys to expand
        #[arg(short, long = "toggle")]
        toggles: Vec<String>,

        /// Move the named Tablix to its next page
        #[arg(long, value_name = "TABLIX")]
        next: Option<String>,

        /// Move the named Tablix to its previous page
        #[arg(long, value_name = "TABLIX")]
        prev: Option<String>,

        /// Rows per page for paged Tablixes
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Show how a report's parameters resolve
    Params {
        /// RDL file
        file: PathBuf,

        /// Parameters (name=value)
        #[arg(short, long = "param")]
        params: Vec<String>,

        /// Write the HTML parameter form
        #[arg(long)]
        form: bool,
    },

    /// Evaluate one expression
    Eval {
        /// Expression text (`=...`)
        expression: String,

        /// Data file (JSON object of data set arrays)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Data set to scope the expression to
        #[arg(short = 's', long)]
        dataset: Option<String>,

        /// Parameters (name=value)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },

    /// Validate report definitions
    Validate {
        /// RDL files to validate
        files: Vec<PathBuf>,

        /// Strict mode (warnings as errors)
        #[arg(short, long)]
        strict: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    output::setup_colors(&cli.color);
    init_logging(cli.verbose);

    let format = OutputFormat::parse(&cli.format);
    let result = match cli.command {
        Commands::Render {
            file,
            data,
            request,
            params,
            toggles,
            next,
            prev,
            page_size,
        } => {
            let config = render::RenderConfig {
                file,
                data,
                request,
                params,
                toggles,
                next,
                prev,
                page_size,
                report_paths: cli.report_paths,
                format,
                output_file: cli.output,
            };
            render::render(config).await
        }

        Commands::Params {
            file,
            params: args,
            form,
        } => {
            let config = params::ParamsConfig {
                file,
                params: args,
                form,
                report_paths: cli.report_paths,
                format,
                output_file: cli.output,
            };
            params::params(config).await
        }

        Commands::Eval {
            expression,
            data,
            dataset,
            params,
        } => {
            let config = eval::EvalConfig {
                expression,
                data,
                dataset,
                params,
                format,
                output_file: cli.output,
            };
            eval::eval(config).await
        }

        Commands::Validate { files, strict } => {
            let config = validate::ValidateConfig {
                files,
                strict,
                report_paths: cli.report_paths,
            };
            validate::validate(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
