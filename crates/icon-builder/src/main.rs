use camino::Utf8PathBuf;
use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{purge_cache, run_build, CommandContext, PurgeCacheArgs};
use icon_export::{BuildOptions, LinkMode, OutputMode};
use miette::Result;
use utils::logging::{init_logging, LogOptions};

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// User agent sent with every CDN request
    #[arg(long, global = true, default_value_t = default_user_agent())]
    user_agent: String,

    /// Directory holding downloaded client resources
    #[arg(long, global = true, default_value = "./cache")]
    cache_folder: Utf8PathBuf,

    /// Directory holding derived icons and the build index
    #[arg(long, global = true, default_value = "./icons")]
    icon_folder: Utf8PathBuf,

    /// Catalog JSON with types, groups, icons, graphics and skin materials
    #[arg(long, global = true)]
    catalog: Option<Utf8PathBuf>,

    /// toml file with [cdn] and [rules] overrides
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Also write the log to this file
    #[arg(long, global = true)]
    logfile: Option<Utf8PathBuf>,

    /// Append to the log file instead of truncating it
    #[arg(long, global = true, requires = "logfile")]
    append_log: bool,

    /// No console output
    #[arg(long, global = true)]
    silent: bool,

    /// Recomposite every icon even if the previous build produced it
    #[arg(long, global = true)]
    force_rebuild: bool,

    /// Do not rewrite the output when no icon changed
    #[arg(long, global = true)]
    skip_if_fresh: bool,

    /// Do not report build progress
    #[arg(long, global = true)]
    no_progress: bool,

    /// Leave out SKIN items
    #[arg(long, global = true)]
    skip_skins: bool,

    /// Only build this one type id
    #[arg(long, global = true)]
    test_type_id: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Zip of every derived icon plus service_metadata.json
    ServiceBundle {
        #[arg(short, long)]
        out: Utf8PathBuf,
    },
    /// Zip of icons named {id}_64.png, {id}_bpc_64.png and {id}_512.jpg
    Iec {
        #[arg(short, long)]
        out: Utf8PathBuf,
    },
    /// Directory of per-item links for static hosting
    WebDir {
        #[arg(short, long)]
        out: Utf8PathBuf,

        /// Copy files instead of symlinking them
        #[arg(long, conflicts_with = "hardlink")]
        copy_files: bool,

        /// Hardlink files instead of symlinking them
        #[arg(long)]
        hardlink: bool,
    },
    /// Digest of the build index, printed to stdout unless --out is given
    Checksum {
        #[arg(short, long)]
        out: Option<Utf8PathBuf>,
    },
    /// Zip of every raw catalog icon as {icon_id}.{ext}
    AuxIcons {
        #[arg(short, long)]
        out: Utf8PathBuf,
    },
    /// Zip of every png and jpg resource the client has
    AuxAll {
        #[arg(short, long)]
        out: Utf8PathBuf,
    },
    /// Delete cached files the current manifests no longer list
    PurgeCache {
        /// Cache-relative path to keep (repeatable)
        #[arg(long)]
        keep: Vec<String>,
    },
}

fn default_user_agent() -> String {
    format!("icon-builder/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn output_mode(command: &Commands) -> Option<OutputMode> {
    let mode = match command {
        Commands::ServiceBundle { out } => OutputMode::ServiceBundle { out: out.clone() },
        Commands::Iec { out } => OutputMode::Iec { out: out.clone() },
        Commands::WebDir {
            out,
            copy_files,
            hardlink,
        } => OutputMode::WebDir {
            out: out.clone(),
            link: match (copy_files, hardlink) {
                (true, _) => LinkMode::Copy,
                (false, true) => LinkMode::HardLink,
                (false, false) => LinkMode::Symlink,
            },
        },
        Commands::Checksum { out } => OutputMode::Checksum { out: out.clone() },
        Commands::AuxIcons { out } => OutputMode::AuxIcons { out: out.clone() },
        Commands::AuxAll { out } => OutputMode::AuxAll { out: out.clone() },
        Commands::PurgeCache { .. } => return None,
    };
    Some(mode)
}

fn main() -> Result<()> {
    let args = parse_args();

    // A bare checksum run prints the digest and nothing else.
    let checksum_to_stdout = matches!(args.command, Commands::Checksum { out: None });
    let silent = args.silent || checksum_to_stdout;

    let _log_guard = init_logging(&LogOptions {
        silent,
        logfile: args.logfile.clone(),
        append: args.append_log,
    })?;

    let config = utils::config::load_config(args.config.as_deref())?;
    let ctx = CommandContext {
        user_agent: args.user_agent,
        cache_folder: args.cache_folder,
        icon_folder: args.icon_folder,
        catalog: args.catalog,
        config,
        options: BuildOptions {
            force_rebuild: args.force_rebuild,
            skip_skins: args.skip_skins,
            test_type_id: args.test_type_id,
            show_progress: !args.no_progress,
        },
        skip_if_fresh: args.skip_if_fresh && !checksum_to_stdout,
        silent,
    };

    match output_mode(&args.command) {
        Some(mode) => run_build(&ctx, mode),
        None => match args.command {
            Commands::PurgeCache { keep } => purge_cache(&ctx, PurgeCacheArgs { keep }),
            _ => Ok(()),
        },
    }
}
