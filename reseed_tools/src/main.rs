//! reseed-tools - operator commands for an I2P reseed server
//!
//! `keygen` creates a signing identity, `verify` checks an su3 file against a
//! certificate directory, `build` writes one generation of bundles to disk and
//! `run` keeps the bundle cache fresh until interrupted.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use reseed::prelude::*;

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Operator tools for an I2P reseed server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an RSA signing key and self-signed certificate
    Keygen {
        /// Signer id, e.g. you@mail.i2p
        #[arg(short, long)]
        signer: String,

        /// Directory receiving the key and certificate files
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// RSA modulus size
        #[arg(long, default_value_t = DEFAULT_RSA_BITS)]
        bits: usize,
    },

    /// Verify the signature of an su3 file
    Verify {
        /// su3 file to check
        file: PathBuf,

        /// Signer whose certificate is used, defaults to the signer named in the file
        #[arg(short, long)]
        signer: Option<String>,

        /// Root of the certificate directory
        #[arg(short, long, default_value = "certificates")]
        keystore: PathBuf,

        /// Certificate namespace below the keystore root
        #[arg(long, default_value = RESEED_PURPOSE)]
        purpose: String,

        /// Write the content of a valid file to extracted.zip in this directory
        #[arg(long)]
        extract: Option<PathBuf>,
    },

    /// Build one generation of su3 bundles and write them to a directory
    Build {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        #[arg(short, long, default_value = "su3")]
        out: PathBuf,
    },

    /// Rebuild the bundle cache periodically until ctrl+c
    Run {
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level: tracing::Level = args.log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);
    tracing_subscriber::registry().with(stderr_layer).init();

    match args.command {
        Command::Keygen { signer, out, bits } => keygen(&signer, out, bits),
        Command::Verify {
            file,
            signer,
            keystore,
            purpose,
            extract,
        } => verify(file, signer.as_deref(), keystore, &purpose, extract),
        Command::Build { config, out } => build(config, out).await,
        Command::Run { config } => run(config).await,
    }
}

fn keygen(signer: &str, out: PathBuf, bits: usize) -> Result<()> {
    let identity = SigningIdentity::generate_rsa(signer, bits)?;
    let key_path = identity.save(&out)?;
    println!("signing key: {}", key_path.display());
    println!("certificate: {}", out.join(signer_filename(signer)).display());
    Ok(())
}

fn verify(file: PathBuf, signer: Option<&str>, keystore: PathBuf, purpose: &str, extract: Option<PathBuf>) -> Result<()> {
    let bytes = fs::read(&file)?;
    let report = verify_su3(&bytes, signer, &KeyStore::new(keystore), purpose)?;
    println!("{}", report.summary);

    if let Err(err) = &report.outcome {
        bail!("signature check with {} failed: {err}", report.signer);
    }
    println!("Signature: valid ({})", report.signer);

    if let Some(dir) = extract {
        let path = extract_content(&report.su3, dir)?;
        println!("content written to {}", path.display());
    }
    Ok(())
}

async fn build(config: PathBuf, out: PathBuf) -> Result<()> {
    let config = ReseedConfig::load(&config)?;
    let reseeder = Reseeder::from_config(config);

    let generation = tokio::task::spawn_blocking(move || reseeder.rebuild()).await??;
    fs::create_dir_all(&out)?;
    for (index, bundle) in generation.bundles.iter().enumerate() {
        fs::write(out.join(format!("i2pseeds-{index:03}.su3")), bundle)?;
    }
    tracing::info!(bundles = generation.len(), out = %out.display(), "wrote su3 bundles");
    Ok(())
}

async fn run(config: PathBuf) -> Result<()> {
    let config = ReseedConfig::load(&config)?;
    tracing::info!(netdb = %config.netdb.display(), signer = %config.signer, "starting reseed cache");
    let reseeder = Arc::new(Reseeder::from_config(config));

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let graceful_shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl+c: {}", e);
        }
        tracing::info!("Received shutdown signal");
        let _ = shutdown_tx.send(());
    };
    tokio::spawn(graceful_shutdown);

    let mut handle = tokio::spawn(Arc::clone(&reseeder).run(shutdown_rx.clone()));
    let mut wait_rx = shutdown_rx;
    tokio::select! {
        result = &mut handle => return result?,
        _ = wait_rx.changed() => {}
    }

    match tokio::time::timeout(FINAL_SHUTDOWN_TIMEOUT, handle).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!("rebuild did not stop within {:?}", FINAL_SHUTDOWN_TIMEOUT),
    }
    tracing::info!(state = ?reseeder.state(), "reseed cache stopped");
    Ok(())
}
