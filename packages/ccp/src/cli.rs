//! Command-line interface for the CCP client.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console::style;

use crate::client::CcpClient;
use crate::config::{
    ClientConfig, TlsVerification, DEFAULT_TIMEOUT_SECS, ENV_APP_ID, ENV_CERT_PATH, ENV_TIMEOUT,
    ENV_URL, ENV_VERIFY,
};
use crate::error::{Result, ValidationError};
use crate::types::{
    parse_connection_timeout, parse_flag, AccountResult, QueryFormat, SearchParameters,
};

/// CyberArk CCP client - Retrieve passwords from the Central Credential Provider.
#[derive(Parser)]
#[command(name = "cyberark-ccp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where and how to reach the CCP.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Base URL of the CCP web service (e.g., https://ccp.example.com)
    #[arg(long, env = ENV_URL)]
    pub url: String,

    /// Application ID registered in CyberArk
    #[arg(long, env = ENV_APP_ID)]
    pub app_id: String,

    /// PEM file with client certificate and private key
    #[arg(long, env = ENV_CERT_PATH)]
    pub cert: Option<PathBuf>,

    /// Server certificate verification: true, false, or a CA bundle path
    #[arg(long, env = ENV_VERIFY, default_value = "true")]
    pub verify: String,

    /// Request timeout in seconds
    #[arg(long, env = ENV_TIMEOUT, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print only the password of the matching account.
    Password(SearchArgs),

    /// Print all properties of the matching account, including the password.
    Account(SearchArgs),
}

/// Account search criteria and options.
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Safe name
    #[arg(long)]
    pub safe: Option<String>,

    /// Folder name (PAM self-hosted only)
    #[arg(long)]
    pub folder: Option<String>,

    /// Password object name
    #[arg(long)]
    pub object: Option<String>,

    /// UserName account property
    #[arg(long)]
    pub username: Option<String>,

    /// Address account property
    #[arg(long)]
    pub address: Option<String>,

    /// Database account property
    #[arg(long)]
    pub database: Option<String>,

    /// Platform policy ID
    #[arg(long)]
    pub policy_id: Option<String>,

    /// Reason for retrieval, written to the audit log
    #[arg(long)]
    pub reason: Option<String>,

    /// Free query on account properties (overrides the other search criteria)
    #[arg(long)]
    pub query: Option<String>,

    /// Query format: Exact or Regexp
    #[arg(long)]
    pub query_format: Option<String>,

    /// Seconds the CCP keeps trying to reach the Vault
    #[arg(long)]
    pub connection_timeout: Option<String>,

    /// Fail instead of waiting when a password change is in progress (true|false)
    #[arg(long)]
    pub fail_on_password_change: Option<String>,
}

impl SearchArgs {
    /// Convert command-line strings into typed search parameters.
    ///
    /// Typed options are parsed strictly; malformed values are rejected.
    pub fn into_params(self) -> std::result::Result<SearchParameters, ValidationError> {
        Ok(SearchParameters {
            safe: self.safe,
            folder: self.folder,
            object: self.object,
            username: self.username,
            address: self.address,
            database: self.database,
            policy_id: self.policy_id,
            reason: self.reason,
            query: self.query,
            query_format: self
                .query_format
                .as_deref()
                .map(str::parse::<QueryFormat>)
                .transpose()?,
            connection_timeout: self
                .connection_timeout
                .as_deref()
                .map(parse_connection_timeout)
                .transpose()?,
            fail_request_on_password_change: self
                .fail_on_password_change
                .as_deref()
                .map(|v| parse_flag("FailRequestOnPasswordChange", v))
                .transpose()?,
        })
    }
}

impl ConnectionArgs {
    pub fn to_config(&self) -> Result<ClientConfig> {
        let mut builder = ClientConfig::builder(self.url.as_str(), self.app_id.as_str())
            .verify(TlsVerification::parse(&self.verify))
            .timeout_secs(self.timeout);
        if let Some(cert) = &self.cert {
            builder = builder.cert_path(cert.clone());
        }
        builder.build()
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    execute(Cli::parse())
}

/// Execute an already parsed command line.
pub fn execute(cli: Cli) -> Result<()> {
    let (search, show_account) = match cli.command {
        Commands::Password(search) => (search, false),
        Commands::Account(search) => (search, true),
    };

    // Reject malformed input before loading certificates
    let params = search.into_params()?;
    let config = cli.connection.to_config()?;
    let client = CcpClient::new(config)?;

    if show_account {
        let account = client.get_account(params)?;
        print_account(&account);
    } else {
        println!("{}", client.get_password(params)?);
    }

    client.close();
    Ok(())
}

fn print_account(account: &AccountResult) {
    let fields = [
        ("Content", account.content.as_deref()),
        ("UserName", account.username.as_deref()),
        ("Address", account.address.as_deref()),
        ("Database", account.database.as_deref()),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            println!("{}: {value}", style(name).bold());
        }
    }
    if let Some(in_process) = account.password_change_in_process {
        println!("{}: {in_process}", style("PasswordChangeInProcess").bold());
    }
    for (name, value) in &account.properties {
        match value {
            serde_json::Value::String(s) => println!("{}: {s}", style(name).bold()),
            other => println!("{}: {other}", style(name).bold()),
        }
    }
}
