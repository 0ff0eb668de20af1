//! Shukuma CLI - sign in to the Shukuma fitness backend and look up workouts.
//!
//! The session token and cached profile live in the secure storage backend
//! selected in the config file (OS keyring by default).

mod cli;

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use shukuma_core::config::ENV_VAULT_PASSPHRASE;
use shukuma_core::{
    ApiClient, ApiError, Config, LoginForm, RegistrationForm, Session, StorageBackend, UserData,
};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Command, USAGE};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and, when a local data directory exists, to a daily
/// log file. The returned guard flushes the file writer on drop.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = dirs::data_local_dir().and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("shukuma")
            .filename_suffix("log")
            .build(dir.join("shukuma").join("logs"))
            .ok()
    });
    let (file_layer, guard) = match file_appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let command = Command::parse(args)?;
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load()?;
    config.apply_env(|name| std::env::var(name).ok())?;
    let passphrase = vault_passphrase(&config)?;
    let session = config.session(passphrase.as_deref())?;
    info!(command = ?command, backend = session.store().backend_name(), "Running command");

    match command {
        Command::Login { username } => login(&session, &mut config, username).await,
        Command::Register => register(&session).await,
        Command::Logout => {
            session.logout().await?;
            println!("Signed out.");
            Ok(())
        }
        Command::Status => {
            match session.resume().await {
                Some(user) => println!("Signed in as {}", display_name(&user)),
                None => println!("Not signed in."),
            }
            Ok(())
        }
        Command::Whoami => match session.resume().await {
            Some(user) => print_json(&Value::Object(user)),
            None => bail!("Not signed in. Run `shukuma login` first."),
        },
        Command::Daily => {
            let api = authorized(&session).await?;
            print_json(&explain_unauthorized(api.daily().await)?)
        }
        Command::Exercises(filter) => {
            let api = authorized(&session).await?;
            print_json(&explain_unauthorized(api.exercises(&filter).await)?)
        }
        Command::Exercise { id } => {
            let api = authorized(&session).await?;
            print_json(&explain_unauthorized(api.exercise(&id).await)?)
        }
        Command::Random => {
            let api = authorized(&session).await?;
            print_json(&explain_unauthorized(api.random_exercise().await)?)
        }
        Command::Progress => {
            let api = authorized(&session).await?;
            print_json(&explain_unauthorized(api.progress().await)?)
        }
        Command::Help => Ok(()),
    }
}

async fn login(session: &Session, config: &mut Config, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => match config.last_username.clone() {
            Some(last) => {
                let input = prompt(&format!("Username [{}]: ", last))?;
                if input.is_empty() {
                    last
                } else {
                    input
                }
            }
            None => prompt("Username: ")?,
        },
    };
    let password = rpassword::prompt_password("Password: ")?;

    println!("\nAuthenticating...");
    let user = session
        .login(&LoginForm::new(username.clone(), password))
        .await
        .context("Login failed")?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Login successful! Welcome back, {}.", display_name(&user));
    Ok(())
}

async fn register(session: &Session) -> Result<()> {
    let form = RegistrationForm {
        username: prompt("Username: ")?,
        email: prompt("Email: ")?,
        password: rpassword::prompt_password("Password: ")?,
        confirm_password: rpassword::prompt_password("Confirm password: ")?,
    };

    let message = session
        .register(&form)
        .await
        .context("Registration failed")?;
    println!("{}", message);
    println!("You can now sign in with `shukuma login {}`.", form.username);
    Ok(())
}

/// Passphrase for the encrypted-file backend, from the environment or a prompt
fn vault_passphrase(config: &Config) -> Result<Option<String>> {
    if config.backend != StorageBackend::EncryptedFile {
        return Ok(None);
    }
    match std::env::var(ENV_VAULT_PASSPHRASE) {
        Ok(passphrase) if !passphrase.is_empty() => Ok(Some(passphrase)),
        _ => Ok(Some(rpassword::prompt_password("Vault passphrase: ")?)),
    }
}

async fn authorized(session: &Session) -> Result<ApiClient> {
    match session.authorized_api().await {
        Some(api) => Ok(api),
        None => bail!("Not signed in. Run `shukuma login` first."),
    }
}

/// Add a hint when the backend rejects the stored token
fn explain_unauthorized(result: Result<Value>) -> Result<Value> {
    result.map_err(|e| {
        if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized(_))) {
            e.context("Your session has expired. Run `shukuma login` again.")
        } else {
            e
        }
    })
}

fn display_name(user: &UserData) -> String {
    user.get("username")
        .and_then(Value::as_str)
        .unwrap_or("unknown user")
        .to_string()
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
