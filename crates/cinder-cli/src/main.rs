//! Cinder CLI - Burn-after-read notes
//!
//! Usage:
//!   cinder serve    - Host a note store over HTTP
//!   cinder send     - Seal stdin and print a share link
//!   cinder open     - Fetch and decrypt a note (spends a view)
//!   cinder inspect  - Show envelope metadata read from stdin
//!   cinder revoke   - Destroy a note before it is read

mod server;

use std::io::Read;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use cinder_core::config::DEFAULT_SERVER_URL;
use cinder_core::{Backend, ClientConfig, NoteService, SendOptions, ShareLink};
use cinder_crypto::codec;
use cinder_store::StoreConfig;
use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cinder")]
#[command(author = "HeyBattle1")]
#[command(version)]
#[command(about = "Encrypted notes that burn after reading", long_about = None)]
struct Cli {
    /// Note server to talk to
    #[arg(long, global = true, env = "CINDER_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host a note store over HTTP
    Serve {
        #[arg(long, env = "CINDER_BIND", default_value = "127.0.0.1:8787")]
        bind: SocketAddr,

        /// Seconds between expiry sweeps
        #[arg(long, env = "CINDER_SWEEP_SECS", default_value_t = 60)]
        sweep_secs: u64,

        /// Longest lifetime a note may ask for
        #[arg(long, env = "CINDER_MAX_TTL_MINUTES", default_value_t = 7.0 * 24.0 * 60.0)]
        max_ttl_minutes: f64,

        #[arg(long, env = "CINDER_MAX_BLOB_BYTES", default_value_t = 64 * 1024)]
        max_blob_bytes: usize,
    },

    /// Seal the message on stdin and print its share link
    Send {
        /// Protect the note with a password instead of a link key
        #[arg(long, env = "CINDER_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Minutes until the note expires
        #[arg(long, env = "CINDER_TTL_MINUTES", default_value_t = 24.0 * 60.0)]
        ttl: f64,

        /// Allow this many reads instead of burning after the first
        #[arg(long)]
        views: Option<u32>,

        /// Base for the printed link, if not the server address
        #[arg(long, env = "CINDER_PUBLIC_URL")]
        public_url: Option<String>,
    },

    /// Fetch and decrypt a note (spends a view)
    Open {
        /// Share link
        link: String,

        #[arg(long, env = "CINDER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Print envelope metadata for the payload on stdin
    Inspect,

    /// Destroy a note
    Revoke {
        /// Note id
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            sweep_secs,
            max_ttl_minutes,
            max_blob_bytes,
        } => {
            let config = StoreConfig {
                max_blob_bytes,
                max_ttl_minutes,
                sweep_interval: Duration::from_secs(sweep_secs.max(1)),
                ..StoreConfig::default()
            };
            server::serve(bind, config).await?;
        }

        Commands::Send {
            password,
            ttl,
            views,
            public_url,
        } => {
            let config = ClientConfig {
                public_url,
                default_ttl_minutes: ttl,
                ..remote_config(cli.server.as_deref())
            };
            let service = connect(&config)?;

            let message = read_stdin()?;
            let mut options = SendOptions::from_config(&config);
            if let Some(views) = views {
                options = options.with_views(views);
            }
            if let Some(password) = password {
                options = options.with_password(SecretString::new(password));
            }

            let sent = service.send(&message, options).await?;
            println!("{}", sent.link.to_url());
            match sent.receipt.remaining_views {
                Some(views) => eprintln!("Opens {views} times, expires at {}", sent.receipt.expires_at),
                None => eprintln!("Burns after reading, expires at {}", sent.receipt.expires_at),
            }
            if sent.requires_password {
                eprintln!("Share the password separately from the link");
            }
        }

        Commands::Open { link, password } => {
            let link = ShareLink::parse(&link)?;
            let server = cli.server.unwrap_or_else(|| link.base_url().to_string());
            let service = connect(&remote_config(Some(&server)))?;

            let opened = service
                .open(&link, |_| password.map(SecretString::new))
                .await
                .context("could not open note")?;

            println!("{}", opened.plaintext.as_str());
            eprintln!("{} views left", opened.remaining_views);
        }

        Commands::Inspect => {
            let payload = read_stdin()?;
            let info = codec::inspect(&payload);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Revoke { id } => {
            let service = connect(&remote_config(cli.server.as_deref()))?;
            service.revoke(&id).await?;
            println!("Revoked {id}");
        }
    }

    Ok(())
}

fn remote_config(server: Option<&str>) -> ClientConfig {
    ClientConfig::remote(server.unwrap_or(DEFAULT_SERVER_URL))
}

fn connect(config: &ClientConfig) -> anyhow::Result<NoteService<Backend>> {
    let backend = Backend::from_config(config)?;
    Ok(NoteService::new(backend, config.link_base()))
}

fn read_stdin() -> anyhow::Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    if input.ends_with('\n') {
        input.pop();
        if input.ends_with('\r') {
            input.pop();
        }
    }
    Ok(input)
}
