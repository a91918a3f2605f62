//! Command-line interface for the importer.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use osm_changeset::http::create_client;
use osm_changeset::{
    clean_directory, download_changesets, extract_tags, parse_changeset_file,
    read_changeset_ids, read_changeset_records, OSM_API_URL,
};

use crate::config::DatabaseConfig;
use crate::db;
use crate::error::{ImportError, Result};
use crate::gateway::PgGateway;
use crate::import::{import_directory, ImportMode};

/// OSM Edit History - Import OpenStreetMap changeset history into PostgreSQL.
#[derive(Parser)]
#[command(name = "osm-edit-history")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Database selection shared by the database commands.
#[derive(Args, Debug, Clone, Default)]
pub struct DatabaseArgs {
    /// Connection name in ~/.postgres (default: use DATABASE_URL)
    #[arg(short, long)]
    pub connection: Option<String>,

    /// Database name
    #[arg(short, long)]
    pub database: Option<String>,
}

impl DatabaseArgs {
    /// Resolve the database configuration these flags select.
    pub fn resolve(&self) -> Result<DatabaseConfig> {
        DatabaseConfig::resolve(self.connection.as_deref(), self.database.as_deref())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the changes and tags tables.
    Setup {
        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Import changesets and tags from XML history files.
    Import {
        /// Directory containing XML changeset files
        #[arg(short, long)]
        path: PathBuf,

        #[command(flatten)]
        db: DatabaseArgs,

        /// Import every node, way and relation instead of the last one per file
        #[arg(long)]
        all_records: bool,
    },

    /// Detect and remove empty changeset files.
    Clean {
        /// Directory containing XML changeset files
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Download changeset files from a text list of ids.
    Download {
        /// Directory to store downloaded XML changeset files
        #[arg(short, long)]
        path: PathBuf,

        /// Text file of changeset ids, one per line
        #[arg(short, long)]
        file: PathBuf,

        /// Base URL of the OSM API
        #[arg(long, default_value = OSM_API_URL)]
        api_url: String,
    },

    /// Print the records parsed from one changeset file as JSON.
    Inspect {
        /// XML changeset file
        #[arg(short, long)]
        path: PathBuf,

        /// Print every node, way and relation instead of the last one
        #[arg(long)]
        all_records: bool,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Setup { db } => setup_command(&db),
        Commands::Import {
            path,
            db,
            all_records,
        } => import_command(&path, &db, import_mode(all_records)),
        Commands::Clean { path } => clean_command(&path),
        Commands::Download {
            path,
            file,
            api_url,
        } => download_command(&path, &file, &api_url),
        Commands::Inspect { path, all_records } => inspect_command(&path, all_records),
    }
}

fn import_mode(all_records: bool) -> ImportMode {
    if all_records {
        ImportMode::AllRecords
    } else {
        ImportMode::LastRecord
    }
}

/// Drive a database future to completion on a single-threaded runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

fn require_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ImportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory does not exist: {}", path.display()),
        )));
    }
    if !path.is_dir() {
        return Err(ImportError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Path is not a directory: {}", path.display()),
        )));
    }
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Execute the setup command.
fn setup_command(db_args: &DatabaseArgs) -> Result<()> {
    let config = db_args.resolve()?;

    block_on(async {
        let pool = db::create_pool(&config).await?;
        let migrated = db::run_migrations(&pool).await;
        pool.close().await;
        migrated
    })??;

    println!("{}", style("Database ready.").green().bold());
    Ok(())
}

/// Execute the import command.
fn import_command(path: &Path, db_args: &DatabaseArgs, mode: ImportMode) -> Result<()> {
    require_dir(path)?;
    let config = db_args.resolve()?;

    println!(
        "{} changesets from {}",
        style("Importing").bold(),
        style(path.display()).cyan()
    );

    let pb = spinner();
    let summary = block_on(async {
        let gateway = PgGateway::new(db::create_pool(&config).await?);
        let summary = import_directory(&gateway, path, mode, |file| {
            let name = file.file_name().map(|n| n.to_string_lossy().into_owned());
            pb.set_message(format!("Reading {}...", name.unwrap_or_default()));
        })
        .await;
        gateway.close().await;
        summary
    });
    pb.finish_and_clear();
    let summary = summary??;

    println!("  Files: {}", summary.files);
    println!(
        "  Imported: {} ({} changes, {} tags)",
        style(summary.imported).green(),
        summary.changes,
        summary.tags
    );
    println!("  Already imported: {}", summary.already_imported);
    println!("  Empty: {}", summary.empty);
    if !summary.failed.is_empty() {
        println!("  Failed: {}", style(summary.failed.len()).yellow().bold());
        for (file, reason) in &summary.failed {
            println!("    {file}: {reason}");
        }
    }

    Ok(())
}

/// Execute the clean command.
fn clean_command(path: &Path) -> Result<()> {
    require_dir(path)?;

    let summary = clean_directory(path)?;

    for removed in &summary.removed {
        let name = removed.file_name().map(|n| n.to_string_lossy().into_owned());
        println!("File {} deleted.", name.unwrap_or_default());
    }
    println!(
        "{} {} of {} files removed",
        style("Done:").green().bold(),
        summary.removed.len(),
        summary.checked
    );

    Ok(())
}

/// Execute the download command.
fn download_command(path: &Path, id_file: &Path, api_url: &str) -> Result<()> {
    require_dir(path)?;
    let ids = read_changeset_ids(id_file)?;
    let client = create_client()?;

    let pb = ProgressBar::new(ids.len() as u64);
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.green} {pos}/{len} {msg}")
            .expect("valid template"),
    );

    let summary = download_changesets(&client, api_url, &ids, path, |id| {
        pb.inc(1);
        pb.set_message(format!("{id}.xml"));
    });
    pb.finish_and_clear();
    let summary = summary?;

    println!(
        "{} {} downloaded, {} already present",
        style("Done:").green().bold(),
        summary.downloaded,
        summary.skipped
    );
    if !summary.failed.is_empty() {
        println!("  Failed: {}", style(summary.failed.len()).yellow().bold());
        for (id, reason) in &summary.failed {
            println!("    {id}: {reason}");
        }
    }

    Ok(())
}

/// Execute the inspect command.
fn inspect_command(path: &Path, all_records: bool) -> Result<()> {
    let records: Vec<_> = if all_records {
        read_changeset_records(path)?
    } else {
        parse_changeset_file(path)?.into_iter().collect()
    };

    let output: Vec<_> = records
        .iter()
        .map(|record| {
            serde_json::json!({
                "change": record.change(),
                "tags": extract_tags(record),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_import() {
        let cli = Cli::parse_from([
            "osm-edit-history",
            "import",
            "-p",
            "data/xml",
            "-c",
            "local",
            "-d",
            "osm",
        ]);

        let Commands::Import {
            path,
            db,
            all_records,
        } = cli.command
        else {
            panic!("expected import command");
        };
        assert_eq!(path, PathBuf::from("data/xml"));
        assert_eq!(db.connection.as_deref(), Some("local"));
        assert_eq!(db.database.as_deref(), Some("osm"));
        assert!(!all_records);
    }

    #[test]
    fn test_cli_parse_import_all_records() {
        let cli = Cli::parse_from(["osm-edit-history", "import", "--path", "x", "--all-records"]);

        let Commands::Import {
            db, all_records, ..
        } = cli.command
        else {
            panic!("expected import command");
        };
        assert!(all_records);
        assert!(db.connection.is_none());
        assert_eq!(import_mode(all_records), ImportMode::AllRecords);
    }

    #[test]
    fn test_cli_parse_setup() {
        let cli = Cli::parse_from([
            "osm-edit-history",
            "setup",
            "--connection",
            "local",
            "--database",
            "osm",
        ]);

        let Commands::Setup { db } = cli.command else {
            panic!("expected setup command");
        };
        assert_eq!(db.connection.as_deref(), Some("local"));
        assert_eq!(db.database.as_deref(), Some("osm"));
    }

    #[test]
    fn test_cli_parse_download_defaults_to_public_api() {
        let cli = Cli::parse_from([
            "osm-edit-history",
            "download",
            "-p",
            "data/xml",
            "-f",
            "changesets.txt",
        ]);

        let Commands::Download {
            path,
            file,
            api_url,
        } = cli.command
        else {
            panic!("expected download command");
        };
        assert_eq!(path, PathBuf::from("data/xml"));
        assert_eq!(file, PathBuf::from("changesets.txt"));
        assert_eq!(api_url, "http://api.openstreetmap.org");
    }

    #[test]
    fn test_cli_requires_path_for_clean() {
        assert!(Cli::try_parse_from(["osm-edit-history", "clean"]).is_err());
    }
}
