//! DriveDesk CLI - Google Drive file manager.
//!
//! Runs the web UI, or performs the same actions from the command line:
//! upload, list, export, download, archive and delete by file name.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use drivedesk_storage::{
    create_default_registry, DeleteOutcome, FileManager, GDriveConfig, GDriveStore, RemoteStore,
    UploadAction,
};
use drivedesk_web::{listing_workbook, ServerConfig, WebServer};

#[derive(Parser)]
#[command(name = "drivedesk")]
#[command(about = "DriveDesk - Google Drive file manager")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Base64-encoded service-account key JSON.
    #[arg(long, env = "BASE64_ENCODED_SERVICE_ACCOUNT", hide_env_values = true)]
    credential: Option<String>,

    /// Storage backend: "gdrive" or "memory".
    #[arg(long, env = "DRIVEDESK_BACKEND", default_value = "gdrive")]
    backend: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web UI.
    Serve {
        /// Address to listen on.
        #[arg(short, long, env = "DRIVEDESK_BIND", default_value = "127.0.0.1:8501")]
        bind: SocketAddr,

        /// Upload size limit in megabytes.
        #[arg(long, default_value_t = drivedesk_web::config::DEFAULT_MAX_UPLOAD_MB)]
        max_upload_mb: usize,
    },

    /// Check that the credential can obtain an access token.
    Verify,

    /// List files in a folder.
    List {
        /// Folder name (default: root).
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Upload or update files.
    Upload {
        /// Local files to upload; each is stored under its file name.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination folder name (default: root).
        #[arg(short, long)]
        folder: Option<String>,
    },

    /// Download one file by name.
    Download {
        /// Remote file name.
        #[arg(short, long)]
        name: String,

        /// Destination path (default: the file name in the current directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download every file of a folder as a zip archive.
    Archive {
        /// Folder name (default: root).
        #[arg(short, long)]
        folder: Option<String>,

        /// Archive path.
        #[arg(short, long, default_value = drivedesk_web::handler::ARCHIVE_FILE_NAME)]
        output: PathBuf,
    },

    /// Export a folder listing as an Excel workbook.
    Export {
        /// Folder name (default: root).
        #[arg(short, long)]
        folder: Option<String>,

        /// Workbook path.
        #[arg(short, long, default_value = drivedesk_web::export::EXPORT_FILE_NAME)]
        output: PathBuf,
    },

    /// Move a file to the trash by name.
    Delete {
        /// Remote file name.
        #[arg(short, long)]
        name: String,

        /// Folder name, for reporting only.
        #[arg(short, long)]
        folder: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve {
            bind,
            max_upload_mb,
        } => cmd_serve(&cli.store, bind, max_upload_mb).await,

        Commands::Verify => cmd_verify(&cli.store).await,

        Commands::List { folder } => cmd_list(&cli.store, folder.as_deref()).await,

        Commands::Upload { files, folder } => {
            cmd_upload(&cli.store, &files, folder.as_deref()).await
        }

        Commands::Download { name, output } => {
            cmd_download(&cli.store, &name, output.as_deref()).await
        }

        Commands::Archive { folder, output } => {
            cmd_archive(&cli.store, folder.as_deref(), &output).await
        }

        Commands::Export { folder, output } => {
            cmd_export(&cli.store, folder.as_deref(), &output).await
        }

        Commands::Delete { name, folder } => {
            cmd_delete(&cli.store, &name, folder.as_deref()).await
        }
    }
}

fn credential(args: &StoreArgs) -> Result<&str> {
    args.credential
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .context("No credential given; set BASE64_ENCODED_SERVICE_ACCOUNT or pass --credential")
}

/// Resolve the configured backend into a store.
fn open_store(args: &StoreArgs) -> Result<Arc<dyn RemoteStore>> {
    let config = match args.backend.as_str() {
        "gdrive" => serde_json::to_value(GDriveConfig::new(credential(args)?))?,
        _ => serde_json::Value::Null,
    };

    create_default_registry()
        .resolve(&args.backend, config)
        .context("Failed to open store")
}

fn open_manager(args: &StoreArgs) -> Result<FileManager> {
    Ok(FileManager::new(open_store(args)?))
}

fn folder_label(folder: Option<&str>) -> &str {
    folder.unwrap_or("root")
}

/// Run the web UI.
async fn cmd_serve(args: &StoreArgs, bind: SocketAddr, max_upload_mb: usize) -> Result<()> {
    let files = open_manager(args)?;
    let config = ServerConfig::new(bind).with_max_upload_mb(max_upload_mb);

    info!("Starting web UI on http://{}", bind);
    WebServer::new(config, files)
        .serve()
        .await
        .context("Web server failed")
}

/// Obtain one access token.
async fn cmd_verify(args: &StoreArgs) -> Result<()> {
    let store = GDriveStore::new(GDriveConfig::new(credential(args)?))
        .context("Failed to load credential")?;

    store
        .verify()
        .await
        .context("Failed to obtain an access token")?;

    println!("Credential is valid.");
    println!("  Service account: {}", store.session().client_email());

    Ok(())
}

/// List folder contents.
async fn cmd_list(args: &StoreArgs, folder: Option<&str>) -> Result<()> {
    let files = open_manager(args)?;

    let Some(listing) = files.list(folder).await.context("Failed to list files")? else {
        println!("Folder not found: {}", folder_label(folder));
        return Ok(());
    };

    if listing.is_empty() {
        println!("No files found.");
    } else {
        println!("Contents of {}:", folder_label(folder));
        for row in listing.rows() {
            println!("  {}  {}  ({})", row.id, row.title, row.mime_type);
        }
    }

    Ok(())
}

/// Upload local files.
async fn cmd_upload(args: &StoreArgs, paths: &[PathBuf], folder: Option<&str>) -> Result<()> {
    let files = open_manager(args)?;

    for path in paths {
        let title = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Not a file path: {}", path.display()))?;

        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let size = content.len();

        let outcome = files
            .upload(content, title, folder, None)
            .await
            .with_context(|| format!("Failed to upload {}", title))?;

        let verb = match outcome.action {
            UploadAction::Created => "uploaded",
            UploadAction::Updated => "updated",
        };
        println!(
            "'{}' {} successfully to '{}' ({} bytes, id {}).",
            title,
            verb,
            if outcome.folder_id.is_some() {
                folder_label(folder)
            } else {
                "root"
            },
            size,
            outcome.entry.id
        );
    }

    Ok(())
}

/// Download a single file by name.
async fn cmd_download(args: &StoreArgs, name: &str, output: Option<&Path>) -> Result<()> {
    let files = open_manager(args)?;

    let entry = files
        .directory()
        .lookup(name)
        .await
        .context("Failed to look up file")?
        .with_context(|| format!("File not found: {}", name))?;

    let target = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(name));
    let written = files
        .download_single(&entry.id, &target, &entry.mime_type)
        .await
        .context("Failed to download file")?;

    println!("Downloaded {} to {} ({} bytes)", name, target.display(), written);

    Ok(())
}

/// Write a zip of a folder.
async fn cmd_archive(args: &StoreArgs, folder: Option<&str>, output: &Path) -> Result<()> {
    let files = open_manager(args)?;

    let Some((listing, archive)) = files
        .download_folder(folder)
        .await
        .context("Failed to build archive")?
    else {
        println!("Folder not found: {}", folder_label(folder));
        return Ok(());
    };

    tokio::fs::write(output, archive.as_bytes())
        .await
        .context("Failed to write archive")?;

    println!(
        "Archived {} of {} files to {}",
        archive.file_names.len(),
        listing.len(),
        output.display()
    );
    for skipped in &archive.skipped {
        println!("  skipped (no downloadable content): {}", skipped);
    }

    Ok(())
}

/// Write a workbook of a folder listing.
async fn cmd_export(args: &StoreArgs, folder: Option<&str>, output: &Path) -> Result<()> {
    let files = open_manager(args)?;

    let Some(listing) = files.list(folder).await.context("Failed to list files")? else {
        println!("Folder not found: {}", folder_label(folder));
        return Ok(());
    };

    let workbook = listing_workbook(&listing).context("Failed to build workbook")?;
    tokio::fs::write(output, workbook)
        .await
        .context("Failed to write workbook")?;

    println!("Exported {} rows to {}", listing.len(), output.display());

    Ok(())
}

/// Move a file to the trash.
async fn cmd_delete(args: &StoreArgs, name: &str, folder: Option<&str>) -> Result<()> {
    let files = open_manager(args)?;

    match files
        .delete(name, folder)
        .await
        .context("Failed to delete file")?
    {
        DeleteOutcome::Trashed(id) => println!(
            "'{}' moved to trash from '{}' (id {}).",
            name,
            folder_label(folder),
            id
        ),
        DeleteOutcome::NotFound => println!("File not found: {}", name),
    }

    Ok(())
}
