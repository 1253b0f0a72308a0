//! Latchkey CLI - Command-line interface for the door lock daemon

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;
use zeroize::Zeroizing;

use latchkey_cli::{DoorStatus, LatchkeyClient};
use latchkey_core::UnlockOutcome;

#[derive(Parser)]
#[command(name = "latchkey")]
#[command(about = "Password door lock control", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon socket (defaults to the daemon's configured path)
    #[arg(short, long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the daemon is running
    Ping,

    /// Enter a password to open the door
    Unlock {
        /// Password; read from stdin when omitted
        password: Option<String>,
    },

    /// Lock the door now
    Lock,

    /// Show lock status
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Change the password (both read from stdin, one per line)
    Passwd,

    /// Show the audit log
    Logs {
        /// Show only last N entries
        #[arg(short = 'n', long)]
        last: Option<usize>,
    },

    /// Delete all audit log entries
    ClearLogs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = match cli.socket {
        Some(path) => LatchkeyClient::with_socket_path(path),
        None => LatchkeyClient::new(),
    };

    match cli.command {
        Commands::Ping => {
            let version = client.ping().await?;
            println!("latchkey-daemon v{} is running", version);
        }

        Commands::Unlock { password } => {
            let password = match password {
                Some(p) => Zeroizing::new(p),
                None => read_secret_line()?,
            };
            match client.unlock(&password).await? {
                UnlockOutcome::Unlocked => println!("Door unlocked"),
                UnlockOutcome::WrongPassword => bail!("Wrong password"),
                UnlockOutcome::AlarmTriggered => bail!("Wrong password - alarm triggered"),
                UnlockOutcome::AlarmActive => bail!("Alarm active - try again later"),
            }
        }

        Commands::Lock => {
            let state = client.lock().await?;
            println!("Door {}", state);
        }

        Commands::Status { json } => {
            let status = client.status().await?;
            if json {
                println!("{}", status_json(&status));
            } else {
                print_status(&status);
            }
        }

        Commands::Passwd => {
            let old = read_secret_line()?;
            let new = read_secret_line()?;
            client.change_password(&old, &new).await?;
            println!("Password changed");
        }

        Commands::Logs { last } => {
            let entries = client.read_logs(last).await?;
            if entries.is_empty() {
                println!("Log is empty");
            }
            for entry in entries {
                println!("{}", entry);
            }
        }

        Commands::ClearLogs => {
            client.clear_logs().await?;
            println!("Logs cleared");
        }
    }

    Ok(())
}

fn read_secret_line() -> Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        bail!("Expected a password on stdin");
    }
    let trimmed = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(trimmed);
    Ok(line)
}

fn print_status(status: &DoorStatus) {
    println!("Door:          {}", status.state);
    println!(
        "Wrong tries:   {}/{}",
        status.attempts, status.max_attempts
    );
    println!(
        "Auto-lock:     {}",
        if status.auto_lock_pending {
            "pending"
        } else {
            "idle"
        }
    );
    if status.alarm_active {
        println!("ALARM ACTIVE");
    }
}

fn status_json(status: &DoorStatus) -> serde_json::Value {
    serde_json::json!({
        "state": status.state,
        "attempts": status.attempts,
        "max_attempts": status.max_attempts,
        "auto_lock_pending": status.auto_lock_pending,
        "alarm_active": status.alarm_active,
    })
}
