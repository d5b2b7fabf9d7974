use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::stores::Credentials;

#[derive(Parser, Debug)]
#[command(name = "rusty-ledger", about = "Single-user account ledger backed by a JSON file")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "ledger.toml")]
    pub config: String,

    /// Path to the ledger data file (overrides config file)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a new account
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long)]
        email: String,
        #[arg(long)]
        pin: u32,
    },
    /// Deposit money into an account
    Deposit {
        #[command(flatten)]
        account: AccountArgs,
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
    },
    /// Withdraw money from an account
    Withdraw {
        #[command(flatten)]
        account: AccountArgs,
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
    },
    /// Show the stored details of an account
    Details {
        #[command(flatten)]
        account: AccountArgs,
    },
    /// Change the name, email, PIN or age of an account
    Update {
        #[arg(long)]
        account: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        pin: Option<u32>,
        #[arg(long)]
        age: Option<u32>,
    },
    /// Delete an account
    Delete {
        #[command(flatten)]
        account: AccountArgs,
    },
    /// Delete an account by number alone (manager only)
    Remove {
        #[arg(long)]
        account: String,
        #[command(flatten)]
        manager: ManagerArgs,
    },
    /// Replace the PIN of an account
    ResetPin {
        #[arg(long)]
        account: String,
        #[arg(long)]
        old_pin: u32,
        #[arg(long)]
        new_pin: u32,
    },
    /// Find accounts by name and/or number
    Search {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Write every account as CSV to stdout
    Export,
    /// Post deposits and withdrawals from a CSV file
    Batch {
        /// CSV file with `type,account,pin,amount` rows
        input: PathBuf,
    },
    /// Check manager or staff credentials
    Login {
        #[arg(value_enum)]
        role: Role,
        #[arg(long)]
        id: String,
        #[arg(long)]
        password: String,
    },
    /// Manage staff members (manager only)
    Staff {
        #[command(flatten)]
        manager: ManagerArgs,
        #[command(subcommand)]
        command: StaffCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum StaffCommand {
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
    },
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    Remove {
        #[arg(long)]
        id: String,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Manager,
    Staff,
}

/// Identifies an account by number and PIN.
#[derive(Args, Debug)]
pub struct AccountArgs {
    #[arg(long)]
    pub account: String,
    #[arg(long)]
    pub pin: u32,
}

#[derive(Args, Debug)]
pub struct ManagerArgs {
    #[arg(long)]
    pub manager_id: String,
    #[arg(long)]
    pub manager_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_store")]
    pub store: StoreConfig,

    #[serde(default)]
    pub manager: ManagerConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

/// Manager credentials written into a fresh ledger file.
#[derive(Debug, Deserialize, Clone)]
pub struct ManagerConfig {
    #[serde(default = "default_manager_id")]
    pub id: String,

    #[serde(default = "default_manager_password")]
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_store() -> StoreConfig {
    StoreConfig {
        path: default_path(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("data.json")
}

fn default_manager_id() -> String {
    "admin".to_string()
}

fn default_manager_password() -> String {
    "1234".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            id: default_manager_id(),
            password: default_manager_password(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store: default_store(),
            manager: ManagerConfig::default(),
            logging: default_logging(),
        }
    }
}

impl Config {
    pub fn load(cli: &CliArgs) -> Self {
        let mut config = Self::from_file(&cli.config);

        // CLI overrides
        if let Some(ref path) = cli.data {
            config.store.path = path.clone();
        }
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }

        config
    }

    /// Reads a config file, falling back to defaults when it is missing or
    /// cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    pub fn manager_credentials(&self) -> Credentials {
        Credentials::new(self.manager.id.clone(), self.manager.password.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.path, PathBuf::from("data.json"));
        assert_eq!(config.logging.level, "info");
        assert!(config.manager_credentials().matches("admin", "1234"));
    }

    #[test]
    fn test_partial_file() {
        let config: Config = toml::from_str(
            r#"
            [store]
            path = "/var/lib/ledger/data.json"

            [manager]
            password = "hunter2"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.path, PathBuf::from("/var/lib/ledger/data.json"));
        assert!(config.manager_credentials().matches("admin", "hunter2"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::from_file("definitely/not/here.toml");
        assert_eq!(config.store.path, PathBuf::from("data.json"));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = CliArgs::parse_from([
            "rusty-ledger",
            "--config",
            "definitely/not/here.toml",
            "--data",
            "other.json",
            "--log-level",
            "debug",
            "export",
        ]);
        let config = Config::load(&cli);
        assert_eq!(config.store.path, PathBuf::from("other.json"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_parse_commands() {
        let cli = CliArgs::parse_from([
            "rusty-ledger",
            "deposit",
            "--account",
            "ABC123",
            "--pin",
            "1234",
            "--amount",
            "-5",
        ]);
        match cli.command {
            Command::Deposit { account, amount } => {
                assert_eq!(account.account, "ABC123");
                assert_eq!(account.pin, 1234);
                assert_eq!(amount, -5);
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = CliArgs::parse_from([
            "rusty-ledger",
            "staff",
            "--manager-id",
            "admin",
            "--manager-password",
            "1234",
            "remove",
            "--id",
            "s1",
        ]);
        assert!(matches!(
            cli.command,
            Command::Staff {
                command: StaffCommand::Remove { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }
}
