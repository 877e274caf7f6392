//! wa-control — the CLI frontend standing in for "the agent tool
//! frontend" collaborator. Exercises
//! the resolver/enforcer/leak-detector data flow end-to-end the same way
//! `pie_control_cli` exercises the redaction/episode pipeline.

mod config;
mod policy_table;

use clap::{Parser, Subcommand};
use config::Config;
use std::path::PathBuf;
use thiserror::Error;
use wa_capability::CapabilityRegistry;
use wa_leak::LeakDetector;
use wa_policy::Context as PolicyContext;
use wa_reply::Reply;
use wa_session::{RootKey, StaticModeSource};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("unknown root key: {0}")]
    UnknownRootKey(#[from] wa_session::UnknownRootKey),
    #[error("io error reading {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

#[derive(Parser)]
#[command(name = "wa-control", version, about = "capability-brokering policy layer control-plane utilities")]
struct Args {
    /// Path to the repo root, used to locate a `.env` file.
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Active agent mode (closed set, e.g. "ck3lens", "ck3raven-dev").
    #[arg(long)]
    mode: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a canonical address to a capability reference.
    Resolve {
        address: String,
        #[arg(long, default_value_t = true)]
        require_exists: bool,
        #[arg(long, default_value_t = false)]
        has_contract: bool,
    },

    /// Evaluate the operations matrix for a (tool, command) against an
    /// already-known root_key/subdir.
    Enforce {
        #[arg(long)]
        tool: String,
        #[arg(long)]
        command: String,
        #[arg(long)]
        root_key: String,
        #[arg(long)]
        subdir: Option<String>,
        #[arg(long, default_value_t = false)]
        has_contract: bool,
        #[arg(long, default_value_t = false)]
        exec_signed: bool,
    },

    /// Print the active mode and which roots are currently visible.
    Whoami,

    /// Verify an HMAC script-approval signature against a file on disk.
    VerifySignature {
        /// The script's canonical session address (as returned by `resolve`).
        script_session_abs: String,
        content_file: PathBuf,
        signature_hex: String,
    },
}

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    if let Err(e) = run() {
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}

fn print_reply(reply: &Reply) {
    let leak_detector = LeakDetector::new();
    if let Some(hit) = leak_detector.scan_reply(reply) {
        tracing::error!(pattern = hit.pattern_name, location = %hit.location, "leak detector tripped on outgoing reply");
        let blocked = Reply::new(wa_reply::codes::WA_DIR_E_001, "reply blocked: leak detector match");
        println!("{}", serde_json::to_string_pretty(&blocked).expect("Reply serializes"));
        return;
    }
    println!("{}", serde_json::to_string_pretty(reply).expect("Reply serializes"));
}

fn run() -> Result<(), CliError> {
    let args = Args::parse();
    let config = Config::from_env(args.repo_root.as_deref())?;
    let mode_source = StaticModeSource::new(Some(args.mode.clone()));
    tracing::info!(mode = %args.mode, "agent mode set for this invocation");

    match args.cmd {
        Command::Resolve { address, require_exists, has_contract } => {
            let visibility = policy_table::default_visibility_matrix();
            let registry = CapabilityRegistry::new(config.max_tokens);
            let whitelist = config.load_whitelist();
            let ctx = wa_resolver::ResolveContext {
                roots: &config.roots,
                mods: &config.mods,
                visibility: &visibility,
                registry: &registry,
                mode_source: &mode_source,
                has_contract,
                exec_signed: false,
                raw_command: None,
                whitelist: Some(&whitelist),
            };
            let (reply, cap) = wa_resolver::resolve(&address, require_exists, &ctx);
            print_reply(&reply);
            if let Some(cap) = cap {
                tracing::debug!(token = %cap.token(), "minted capability");
            }
            Ok(())
        }

        Command::Enforce { tool, command, root_key, subdir, has_contract, exec_signed } => {
            let root_key: RootKey = root_key.parse()?;
            let operations = policy_table::default_operations_matrix();
            let whitelist = config.load_whitelist();
            let ctx = wa_enforcer::EnforceContext {
                operations: &operations,
                has_contract,
                exec_signed,
                host_abs: None,
                session_mods: Some(&config.mods),
                raw_command: Some(command.as_str()),
                whitelist: Some(&whitelist),
            };
            let reply = wa_enforcer::enforce(&args.mode, &tool, &command, root_key, subdir.as_deref(), &ctx);
            print_reply(&reply);
            Ok(())
        }

        Command::Whoami => {
            let visibility = policy_table::default_visibility_matrix();
            let ctx = PolicyContext { session_mods: Some(&config.mods), ..PolicyContext::default() };
            println!("mode: {}", args.mode);
            for key in RootKey::ALL {
                let visible = visibility.is_visible(&args.mode, key, None, &ctx);
                println!("  {key}: {}", if visible { "visible" } else { "not visible" });
            }
            Ok(())
        }

        Command::VerifySignature { script_session_abs, content_file, signature_hex } => {
            let bytes = std::fs::read(&content_file)
                .map_err(|source| CliError::Io { path: content_file.clone(), source })?;
            let hash = wa_approval::content_hash(&bytes);
            let ok = wa_approval::verify(&config.session_secret, &script_session_abs, &hash, &config.session_id, &signature_hex);
            println!("{}", if ok { "VALID" } else { "INVALID" });
            Ok(())
        }
    }
}
