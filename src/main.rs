//! CLI entry point for `msgview`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};

use msgview::config::{Config, DecoderBackend};
use msgview::foreign::{self, DecoderContext};
use msgview::model::EmailMessage;

#[derive(Parser)]
#[command(
    name = "msgview",
    version,
    about = "Read Outlook MSG messages from the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Message file to show
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Decoder backend (overrides the config file)
    #[arg(long, global = true, value_enum)]
    backend: Option<DecoderBackend>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a message
    Show {
        path: PathBuf,
        /// Print the normalized record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a message to a file
    Export {
        path: PathBuf,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Text)]
        format: ExportFormat,
        /// Output directory (defaults to the configured export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Save all attachments of a message
    Attachments {
        path: PathBuf,
        /// Output directory (defaults to the configured export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the configuration file location and effective settings
    Config {
        /// Write the default configuration if no file exists
        #[arg(long)]
        init: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = msgview::config::load_config();
    if let Some(backend) = cli.backend {
        config.decoder.backend = backend;
    }

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Some(Commands::Show { path, json }) => cmd_show(&path, json, &config),
        None => match cli.file {
            Some(path) => cmd_show(&path, false, &config),
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        },
        Some(Commands::Export {
            path,
            format,
            output,
        }) => cmd_export(&path, format, output, &config),
        Some(Commands::Attachments { path, output }) => cmd_attachments(&path, output, &config),
        Some(Commands::Config { init }) => cmd_config(init, &config),
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = msgview::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "msgview.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Parse `path` with the configured decoder, failing on an invalid record.
fn load_message(path: &Path, config: &Config) -> anyhow::Result<EmailMessage> {
    let ctx = DecoderContext::new();
    let loader = foreign::loader_for(&config.decoder);
    // An unavailable decoder is reported through the record below.
    let _ = ctx.initialize(loader.as_ref());

    let msg = msgview::parser::parse_msg(&ctx, path);
    if !msg.is_valid {
        anyhow::bail!("{}", msg.error_message);
    }
    Ok(msg)
}

fn output_dir(output: Option<PathBuf>, config: &Config) -> PathBuf {
    output
        .or_else(|| config.export.default_output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn cmd_show(path: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let msg = load_message(path, config)?;
    if json {
        println!("{}", msgview::export::json::to_json(&msg)?);
    } else {
        print!(
            "{}",
            msgview::export::text::render_message(&msg, &config.display)
        );
    }
    Ok(())
}

fn cmd_export(
    path: &Path,
    format: ExportFormat,
    output: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    let msg = load_message(path, config)?;
    let dir = output_dir(output, config);
    let written = match format {
        ExportFormat::Text => msgview::export::text::export_text(&msg, &config.display, &dir)?,
        ExportFormat::Json => msgview::export::json::export_json(&msg, &dir)?,
    };
    println!("  Exported to {}", written.display());
    Ok(())
}

/// Save all attachments of a message.
fn cmd_attachments(path: &Path, output: Option<PathBuf>, config: &Config) -> anyhow::Result<()> {
    let msg = load_message(path, config)?;

    if msg.attachments.is_empty() {
        println!("  No attachments found.");
        return Ok(());
    }

    let dir = output_dir(output, config);
    let paths = msgview::export::attachment::save_all_attachments(&msg, &dir)?;
    for p in &paths {
        println!("  {}", p.display());
    }
    println!(
        "  Saved {} of {} attachment(s) to {}",
        paths.len(),
        msg.attachments.len(),
        dir.display()
    );
    Ok(())
}

fn cmd_config(init: bool, config: &Config) -> anyhow::Result<()> {
    let path = msgview::config::config_file_path();
    match &path {
        Some(p) => println!("# {}", p.display()),
        None => println!("# (no config location on this system)"),
    }
    println!(
        "# log file: {}",
        msgview::config::log_file_path(config).display()
    );

    if init {
        match &path {
            Some(p) if p.exists() => println!("# already exists, left unchanged"),
            _ => {
                msgview::config::save_config(&Config::default())?;
                println!("# written with defaults");
            }
        }
    }

    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "msgview", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
