//! `slidemerge` CLI - import documents and images, curate, export one deck.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use slidemerge::assembly::{save_artifact, Assembler};
use slidemerge::capabilities::Capabilities;
use slidemerge::config::Config;
use slidemerge::decode::{DecodeOptions, InputFile, Processor};
use slidemerge::model::PresentationGroup;
use slidemerge::progress::{ChannelObserver, ProcessingUpdate};
use slidemerge::store::{Library, RedbStore};

#[derive(Parser)]
#[command(name = "slidemerge")]
#[command(about = "Extract slides from PDFs and images and merge them into one presentation")]
#[command(version)]
struct Cli {
    /// Library database (overrides SLIDEMERGE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode files (or directories of files) and add them to the library
    Import {
        /// PDFs, images or directories
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show the stored presentations
    List,

    /// Include a stored presentation in the export
    Select {
        /// Presentation id (a unique prefix is enough)
        id: String,
    },

    /// Exclude a stored presentation from the export
    Deselect {
        /// Presentation id (a unique prefix is enough)
        id: String,
    },

    /// Merge the selected stored presentations into one file
    Export {
        /// Output .pptx file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode files and merge them straight into one file, bypassing the library
    Merge {
        /// PDFs, images or directories
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output .pptx file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Remove everything from the library
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("slidemerge=info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }
    tracing::debug!("{} {} using {}", config.app_name(), config.app_version(), config.db_path.display());

    match cli.command {
        Commands::Import { files } => cmd_import(&config, &files).await?,
        Commands::List => cmd_list(&config)?,
        Commands::Select { id } => cmd_select(&config, &id, true)?,
        Commands::Deselect { id } => cmd_select(&config, &id, false)?,
        Commands::Export { output } => cmd_export(&config, &output)?,
        Commands::Merge { files, output } => cmd_merge(&config, &files, &output).await?,
        Commands::Clear => cmd_clear(&config)?,
    }

    Ok(())
}

fn open_library(config: &Config) -> Result<Library<RedbStore>> {
    Library::open(&config.db_path).with_context(|| format!("Failed to open library at {}", config.db_path.display()))
}

/// Expand directories into the files they contain, in name order.
fn collect_inputs(paths: &[PathBuf]) -> Vec<InputFile> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = WalkDir::new(path).min_depth(1).sort_by_file_name().into_iter();
            for entry in entries.filter_map(std::result::Result::ok) {
                if entry.file_type().is_file() {
                    inputs.push(InputFile::from_path(entry.into_path()));
                }
            }
        } else {
            inputs.push(InputFile::from_path(path.clone()));
        }
    }
    inputs
}

/// Decode `paths` into groups, printing progress as documents render.
async fn decode_groups(config: &Config, capabilities: Capabilities, paths: &[PathBuf]) -> Vec<PresentationGroup> {
    let inputs = collect_inputs(paths);
    let (observer, mut updates) = ChannelObserver::channel();

    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            match update {
                ProcessingUpdate::Progress(event) if event.page_index > 0 => {
                    eprintln!("  {} [{}/{}]", event.file_name, event.page_index, event.total_pages);
                }
                ProcessingUpdate::Progress(event) => {
                    eprintln!("Opened {} ({} pages)", event.file_name, event.total_pages);
                }
                ProcessingUpdate::Complete { file_name } => eprintln!("Finished {file_name}"),
            }
        }
    });

    let processor = Processor::new(DecodeOptions::from(config), capabilities, Box::new(observer));
    let groups = processor.process_files_as_groups(&inputs).await;

    // Closing the channel lets the printer drain and exit.
    drop(processor);
    if let Err(e) = printer.await {
        tracing::debug!("Progress printer stopped: {e}");
    }
    groups
}

async fn cmd_import(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let library = open_library(config)?;
    let groups = decode_groups(config, Capabilities::detect(config), paths).await;
    if groups.is_empty() {
        bail!("No slides could be extracted from the given files");
    }

    let replaced = library.replace_groups(&groups)?;
    let slides: usize = groups.iter().map(PresentationGroup::len).sum();
    println!("Imported {} presentations ({slides} slides)", groups.len());
    if replaced > 0 {
        println!("Replaced {replaced} previously imported presentations");
    }
    for group in &groups {
        println!("  {}  {}  ({} slides)", group.id, group.source_file_name, group.len());
    }
    Ok(())
}

fn cmd_list(config: &Config) -> Result<()> {
    let library = open_library(config)?;
    let groups = library.get_groups()?;
    if groups.is_empty() {
        println!("Library is empty");
        return Ok(());
    }

    for group in &groups {
        let mark = if group.selected { "[x]" } else { "[ ]" };
        println!(
            "{mark} {}  {:<8} {:>3} slides  {}",
            group.id,
            group.kind.name(),
            group.len(),
            group.source_file_name
        );
    }
    Ok(())
}

fn cmd_select(config: &Config, prefix: &str, selected: bool) -> Result<()> {
    let library = open_library(config)?;
    let groups = library.get_groups()?;
    let matches: Vec<_> = groups.iter().filter(|g| g.id.as_str().starts_with(prefix)).collect();

    let group = match matches.as_slice() {
        [group] => *group,
        [] => bail!("No presentation with id {prefix}"),
        _ => bail!("Id prefix {prefix} matches {} presentations", matches.len()),
    };

    library.set_group_selected(&group.id, selected)?;
    let verb = if selected { "Selected" } else { "Deselected" };
    println!("{verb} {}", group.source_file_name);
    Ok(())
}

fn cmd_export(config: &Config, output: &Path) -> Result<()> {
    let library = open_library(config)?;
    let groups = library.get_groups()?;
    let artifact = Assembler::new(Capabilities::detect(config)).merge_presentations(&groups);
    save_artifact(&artifact, output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

async fn cmd_merge(config: &Config, paths: &[PathBuf], output: &Path) -> Result<()> {
    let capabilities = Capabilities::detect(config);
    let groups = decode_groups(config, capabilities.clone(), paths).await;
    let artifact = Assembler::new(capabilities).merge_presentations(&groups);
    save_artifact(&artifact, output)?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn cmd_clear(config: &Config) -> Result<()> {
    open_library(config)?.clear_all()?;
    println!("Library cleared");
    Ok(())
}
