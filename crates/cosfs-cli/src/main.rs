mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cosfs")]
#[command(about = "File storage on Tencent Cloud Object Storage")]
#[command(version)]
struct Cli {
    /// Path to the cosfs config directory (default: ~/.cosfs)
    #[arg(long, global = true, env = "COSFS_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a default configuration
    Init,

    /// Show current configuration
    Config,

    /// Save a local file and print its reference
    Put {
        /// File to upload
        path: PathBuf,
        /// Storage to save into (default: the configured default storage)
        #[arg(long)]
        storage: Option<String>,
        /// Name to record instead of the file's own name
        #[arg(long)]
        name: Option<String>,
    },

    /// Download a stored file
    Get {
        /// File reference printed by `put`
        reference: String,
        /// Destination path, `-` for stdout
        dest: PathBuf,
    },

    /// Delete a stored file
    Rm {
        /// File reference printed by `put`
        reference: String,
    },

    /// Check whether a stored file exists
    Exists {
        /// File reference printed by `put`
        reference: String,
    },

    /// Test connectivity of every COS storage
    Check,

    /// Ask the running management server to rebuild a storage client,
    /// optionally with new credentials
    Refresh {
        /// Storage to refresh (default: the configured default storage)
        storage: Option<String>,
        #[arg(long, requires = "secret_key")]
        secret_id: Option<String>,
        #[arg(long, requires = "secret_id")]
        secret_key: Option<String>,
    },

    /// Run the management HTTP endpoint
    Serve,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cosfs=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let base_dir = match cli.config_dir {
        Some(ref dir) => dir.clone(),
        None => cosfs_core::config::CosfsConfig::default_base_dir()?,
    };

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Init => commands::init::run(&base_dir),
        Commands::Config => commands::config::run(&base_dir),
        Commands::Put {
            ref path,
            ref storage,
            ref name,
        } => rt.block_on(commands::files::put(
            &base_dir,
            path,
            storage.as_deref(),
            name.as_deref(),
        )),
        Commands::Get {
            ref reference,
            ref dest,
        } => rt.block_on(commands::files::get(&base_dir, reference, dest)),
        Commands::Rm { ref reference } => rt.block_on(commands::files::rm(&base_dir, reference)),
        Commands::Exists { ref reference } => {
            rt.block_on(commands::files::exists(&base_dir, reference))
        }
        Commands::Check => rt.block_on(commands::check::run(&base_dir)),
        Commands::Refresh {
            ref storage,
            ref secret_id,
            ref secret_key,
        } => rt.block_on(commands::refresh::run(
            &base_dir,
            storage.as_deref(),
            secret_id.as_deref().zip(secret_key.as_deref()),
        )),
        Commands::Serve => rt.block_on(commands::serve::run(&base_dir)),
    }
}
