//! Sealpost command line.
//!
//! Every subcommand opens the redb store named by `--db`, does its work
//! through [`Service`] and exits. Sessions live only for the duration of one
//! invocation.
//!
//! # Usage
//!
//! ```bash
//! # Create two accounts
//! sealpost --db chat.redb register --username alice --email alice@example.com
//! sealpost --db chat.redb register --username bob --email bob@example.com
//!
//! # Send and read (password from SEALPOST_PASSWORD or --password)
//! SEALPOST_PASSWORD=... sealpost --db chat.redb send --from alice --to bob "hi bob"
//! SEALPOST_PASSWORD=... sealpost --db chat.redb read --user bob --peer alice
//! ```

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use sealpost_client::{ClientSession, prepare_registration};
use sealpost_core::model::Role;
use sealpost_crypto::{VaultParams, generate_key_pair, wrap_private_key};
use sealpost_server::{AuthorityConfig, RedbStorage, Service, SessionToken, SystemEnv};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type CliService = Service<SystemEnv, RedbStorage>;

/// Sealpost end-to-end encrypted messaging
#[derive(Parser, Debug)]
#[command(name = "sealpost")]
#[command(about = "End-to-end encrypted one-to-one messaging")]
#[command(version)]
struct Args {
    /// Path to the redb database file
    #[arg(long, default_value = "sealpost.redb")]
    db: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a key pair and print the public key with the wrapped private key
    Keygen {
        /// Password to wrap the private key under
        #[arg(long, env = "SEALPOST_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Register {
        /// Username (case-sensitive)
        #[arg(long)]
        username: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long, env = "SEALPOST_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Send a message
    Send {
        /// Sending account
        #[arg(long)]
        from: String,
        /// Receiving account
        #[arg(long)]
        to: String,
        /// Password of the sending account
        #[arg(long, env = "SEALPOST_PASSWORD", hide_env_values = true)]
        password: String,
        /// Message text (at most 190 bytes)
        text: String,
    },

    /// Print the conversation with another account
    Read {
        /// Reading account
        #[arg(long)]
        user: String,
        /// Other party
        #[arg(long)]
        peer: String,
        /// Password of the reading account
        #[arg(long, env = "SEALPOST_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List the other accounts
    Users {
        /// Account to list as
        #[arg(long)]
        user: String,
        /// Password of that account
        #[arg(long, env = "SEALPOST_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut out = io::stdout().lock();

    match args.command {
        Command::Keygen { password } => {
            let pair = generate_key_pair()?;
            let wrapped = wrap_private_key(pair.private_pem(), &password)?;
            writeln!(out, "{}", pair.public_pem())?;
            writeln!(out, "{wrapped}")?;
        },
        Command::Register { username, email, password } => {
            let service = open(&args.db)?;
            let request =
                prepare_registration(&username, &email, &password, VaultParams::default())?;
            let summary = service.register(&request)?;
            writeln!(out, "registered {} ({})", summary.username, summary.id)?;
        },
        Command::Send { from, to, password, text } => {
            let service = open(&args.db)?;
            let (session, token) = login(&service, &from, &password)?;
            let recipient = service.public_key(&to)?;
            let request = session.compose(recipient.id, &recipient.public_key, &text)?;
            let message = service.send_message(&token, &request)?;
            service.logout(&token)?;
            writeln!(out, "sent {}", message.id)?;
        },
        Command::Read { user, peer, password } => {
            let service = open(&args.db)?;
            let (session, token) = login(&service, &user, &password)?;
            let peer_record = service.public_key(&peer)?;
            let messages = service.conversation(&token, peer_record.id)?;
            service.logout(&token)?;

            for message in &messages {
                let author = match message.role_of(session.account_id()) {
                    Some(Role::Sender) => session.username(),
                    _ => peer_record.username.as_str(),
                };
                let text = session.open(message)?;
                writeln!(out, "[{}] {author}: {text}", message.timestamp_ms)?;
            }
        },
        Command::Users { user, password } => {
            let service = open(&args.db)?;
            let (_session, token) = login(&service, &user, &password)?;
            let accounts = service.directory(&token)?;
            service.logout(&token)?;

            for account in accounts {
                writeln!(out, "{}\t{}", account.username, account.email)?;
            }
        },
    }

    Ok(())
}

fn open(db: &Path) -> Result<CliService, Box<dyn std::error::Error>> {
    tracing::debug!(db = %db.display(), "opening store");
    let storage = RedbStorage::open(db)?;
    Ok(Service::new(SystemEnv::new(), storage, AuthorityConfig::default())?)
}

/// Log in and unlock the account's keys for client-side work.
fn login(
    service: &CliService,
    username: &str,
    password: &str,
) -> Result<(ClientSession, SessionToken), Box<dyn std::error::Error>> {
    let grant = service.authenticate(username, password)?;
    let session = ClientSession::from_principal(&grant.principal)?;
    Ok((session, grant.token))
}
