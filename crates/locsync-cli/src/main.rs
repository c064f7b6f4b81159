use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod commands;

#[derive(Parser)]
#[command(name = "locsync", version, about = "Localization entry management toolkit")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Suppress console log chatter (file log keeps everything)
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract translatable entries from a source file
    Extract {
        #[arg(short, long)]
        input: PathBuf,
        /// TOML file with extraction rules; built-in rules when omitted
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Write a fresh project file
        #[arg(long, conflicts_with_all = ["out_csv", "out_pot"])]
        out_json: Option<PathBuf>,
        #[arg(long, conflicts_with_all = ["out_json", "out_pot"])]
        out_csv: Option<PathBuf>,
        /// Write a gettext template (empty msgstr)
        #[arg(long, conflicts_with_all = ["out_json", "out_csv"])]
        out_pot: Option<PathBuf>,
    },

    /// Run the validator over every entry of a project
    Validate {
        #[arg(short, long)]
        project: PathBuf,
        /// Length-baseline JSON resource
        #[arg(long)]
        baselines: Option<PathBuf>,
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Refresh a project from changed source (or a PO template)
    Update {
        #[arg(short, long)]
        project: PathBuf,
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Keep removed entries tagged ignored instead of dropping them
        #[arg(long, default_value_t = false)]
        keep_removed: bool,
    },

    /// Rank translation-memory suggestions
    Suggest {
        #[arg(short, long)]
        project: PathBuf,
        #[arg(long)]
        tm: PathBuf,
        /// Restrict to one entry identity
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Fill untranslated entries from exact translation-memory hits
    ApplyTm {
        #[arg(short, long)]
        project: PathBuf,
        #[arg(long)]
        tm: PathBuf,
    },

    /// Export a project to a .po file
    ExportPo {
        #[arg(short, long)]
        project: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        lang: Option<String>,
    },

    /// Translation-state counts for a project
    Stats {
        #[arg(short, long)]
        project: PathBuf,
        #[arg(long, default_value = "text")]
        format: String,
    },
}

impl Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let cmd_name = match &self {
            Commands::Extract { .. } => "extract",
            Commands::Validate { .. } => "validate",
            Commands::Update { .. } => "update",
            Commands::Suggest { .. } => "suggest",
            Commands::ApplyTm { .. } => "apply-tm",
            Commands::ExportPo { .. } => "export-po",
            Commands::Stats { .. } => "stats",
        };
        info!(event = "command_start", command = cmd_name);

        let result = match self {
            Commands::Extract {
                input,
                rules,
                out_json,
                out_csv,
                out_pot,
            } => commands::extract::run_extract(input, rules, out_json, out_csv, out_pot),
            Commands::Validate {
                project,
                baselines,
                format,
            } => commands::validate::run_validate(project, baselines, &format, use_color),
            Commands::Update {
                project,
                input,
                rules,
                keep_removed,
            } => commands::update::run_update(project, input, rules, keep_removed),
            Commands::Suggest {
                project,
                tm,
                id,
                limit,
            } => commands::suggest::run_suggest(project, tm, id, limit),
            Commands::ApplyTm { project, tm } => commands::apply_tm::run_apply_tm(project, tm),
            Commands::ExportPo { project, out, lang } => {
                commands::export_po::run_export_po(project, out, lang)
            }
            Commands::Stats { project, format } => commands::stats::run_stats(project, &format),
        };

        match &result {
            Ok(_) => info!(event = "command_done", command = cmd_name),
            Err(e) => error!(event = "command_failed", command = cmd_name, error = ?e),
        }
        result
    }
}

fn init_tracing(quiet: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "locsync.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let _guard = init_tracing(cli.quiet);

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(use_color)
}
