//! tessera-agent - compose the trust primitives at the edge
//!
//! usage:
//!   tessera-agent split --parts 5 --threshold 3 < master.key
//!   tessera-agent combine <share> <share> <share> > master.key
//!   tessera-agent write-token --path /run/agent/token --mode 0640 < token
//!   tessera-agent nonce --count 3

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tessera::clock::unix_millis;
use tessera::shamir::{decode_share, encode_share};
use tessera::{os_random, FileSink, NonceStore, SinkConfig, SystemClock};
use tracing::{info, warn};
use zeroize::Zeroizing;

mod config;

use crate::config::AgentConfig;

#[derive(Parser, Debug)]
#[command(name = "tessera-agent")]
#[command(about = "threshold secret sharing, atomic token sink and nonce store", long_about = None)]
#[command(version)]
struct Args {
    /// toml config file
    #[arg(short, long, env = "TESSERA_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// split the secret read from stdin, one base64 share per line
    Split {
        /// number of shares to produce
        #[arg(short, long)]
        parts: Option<u8>,

        /// shares needed to recover
        #[arg(short, long)]
        threshold: Option<u8>,

        /// stdin holds the secret as hex
        #[arg(long)]
        hex: bool,
    },

    /// recover a secret from base64 shares
    Combine {
        #[arg(required = true)]
        shares: Vec<String>,

        /// print the secret as hex instead of raw bytes
        #[arg(long)]
        hex: bool,
    },

    /// atomically publish the token read from stdin
    WriteToken {
        /// target path
        #[arg(long)]
        path: Option<PathBuf>,

        /// octal permission bits, e.g. 0640
        #[arg(long, value_parser = parse_mode)]
        mode: Option<u32>,

        /// only check that the target can be written
        #[arg(long)]
        probe: bool,
    },

    /// issue nonces and run them through redemption and tidy
    Nonce {
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

fn parse_mode(s: &str) -> std::result::Result<u32, String> {
    let digits = s.trim_start_matches("0o");
    u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode {s:?}: {e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = AgentConfig::load(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cfg.log.filter.clone().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Split {
            parts,
            threshold,
            hex,
        } => split(&cfg, parts, threshold, hex),
        Command::Combine { shares, hex } => combine(&shares, hex),
        Command::WriteToken { path, mode, probe } => write_token(&cfg, path, mode, probe),
        Command::Nonce { count } => nonce(&cfg, count),
    }
}

fn split(cfg: &AgentConfig, parts: Option<u8>, threshold: Option<u8>, hex_input: bool) -> Result<()> {
    let parts = parts.unwrap_or(cfg.shamir.parts) as usize;
    let threshold = threshold.unwrap_or(cfg.shamir.threshold) as usize;

    let mut input = Zeroizing::new(Vec::new());
    std::io::stdin()
        .read_to_end(&mut input)
        .context("reading secret from stdin")?;
    let secret = decode_secret(input, hex_input)?;

    let shares = tessera::split(&secret, parts, threshold)?;
    info!("split {} byte secret into {} shares, threshold {}", secret.len(), parts, threshold);

    let mut out = std::io::stdout().lock();
    for share in &shares {
        writeln!(out, "{}", encode_share(share))?;
    }
    Ok(())
}

/// raw stdin bytes, or their hex decoding
fn decode_secret(input: Zeroizing<Vec<u8>>, hex_input: bool) -> Result<Zeroizing<Vec<u8>>> {
    if !hex_input {
        return Ok(input);
    }
    let text = std::str::from_utf8(&input).context("hex secret is not utf-8")?;
    let decoded = hex::decode(text.trim()).context("decoding hex secret")?;
    Ok(Zeroizing::new(decoded))
}

fn combine(encoded: &[String], hex_output: bool) -> Result<()> {
    let shares = encoded
        .iter()
        .map(|s| decode_share(s))
        .collect::<tessera::Result<Vec<_>>>()?;
    let secret = Zeroizing::new(tessera::combine(&shares)?);
    info!("combined {} shares", shares.len());

    let mut out = std::io::stdout().lock();
    if hex_output {
        let text = Zeroizing::new(hex::encode(&*secret));
        writeln!(out, "{}", text.as_str())?;
    } else {
        out.write_all(&secret)?;
    }
    Ok(())
}

fn write_token(
    cfg: &AgentConfig,
    path: Option<PathBuf>,
    mode: Option<u32>,
    probe: bool,
) -> Result<()> {
    let sink_cfg = SinkConfig::new(
        path.unwrap_or_else(|| cfg.sink.path.clone()),
        mode.unwrap_or(cfg.sink.mode),
    );
    let sink = FileSink::new(sink_cfg)?;
    if probe {
        info!("sink {} is writable", sink.path().display());
        return Ok(());
    }

    let mut token = Vec::new();
    std::io::stdin()
        .read_to_end(&mut token)
        .context("reading token from stdin")?;
    if token.is_empty() {
        bail!("no token on stdin");
    }

    sink.write_token(&token)?;
    info!("wrote token to {} (mode {:o})", sink.path().display(), sink.mode());
    Ok(())
}

fn nonce(cfg: &AgentConfig, count: usize) -> Result<()> {
    let store = NonceStore::with_parts(cfg.nonce.clone(), Arc::new(SystemClock), os_random());

    let mut issued = Vec::with_capacity(count);
    let mut out = std::io::stdout().lock();
    for _ in 0..count {
        let (nonce, expiry) = store.issue()?;
        writeln!(out, "{} {}", nonce, unix_millis(expiry) / 1000)?;
        issued.push(nonce);
    }

    for nonce in &issued {
        if !store.redeem(nonce) {
            warn!("nonce {} did not redeem", nonce);
        }
        if store.redeem(nonce) {
            bail!("nonce {} redeemed twice", nonce);
        }
    }
    store.tidy_if_due();
    info!("issued and redeemed {} nonces, {} outstanding", issued.len(), store.len());
    Ok(())
}
