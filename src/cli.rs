use clap::{Args, Parser, Subcommand};
use shiftbook::config::{AppConfig, AuthConfig, DEFAULT_AUTH_COOKIE_NAME, LoginConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve { config: AppConfig, log: String },
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    match &cli.command {
        Some(Command::AuthKey) => return RunOutcome::Exit(run_auth_key()),
        Some(Command::HashPassword(args)) => return RunOutcome::Exit(run_hash_password(args)),
        None => {}
    }

    match resolve_config(&cli) {
        Ok(config) => RunOutcome::Serve {
            config,
            log: cli.log,
        },
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "shiftbook", version, about = "Shift booking web app")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "SHIFTBOOK_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,
    #[arg(long, env = "SHIFTBOOK_APP_NAME", default_value = "Shiftbook")]
    app_name: String,
    #[arg(long, env = "SHIFTBOOK_AUTH_KEY")]
    auth_key: Option<String>,
    #[arg(long, env = "SHIFTBOOK_AUTH_TOKEN_TTL")]
    auth_token_ttl: Option<String>,
    #[arg(long, env = "SHIFTBOOK_AUTH_COOKIE_NAME")]
    auth_cookie_name: Option<String>,
    #[arg(long, env = "SHIFTBOOK_AUTH_COOKIE_SECURE")]
    auth_cookie_secure: bool,
    /// TOML file with `[[users]]` entries (email, name, argon2 password_hash).
    #[arg(long, env = "SHIFTBOOK_USERS_FILE")]
    users_file: Option<PathBuf>,
    /// TOML file with `[[bookings]]` entries shown on the history screen.
    #[arg(long, env = "SHIFTBOOK_HISTORY_FILE")]
    history_file: Option<PathBuf>,
    #[arg(long, env = "SHIFTBOOK_LOGIN_LATENCY")]
    login_latency: Option<String>,
    #[arg(long, env = "SHIFTBOOK_LOGIN_TIMEOUT")]
    login_timeout: Option<String>,
    #[arg(long, env = "SHIFTBOOK_LOG", default_value = "info")]
    log: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a fresh key for --auth-key.
    AuthKey,
    /// Print an argon2 hash for a users file entry.
    HashPassword(HashPasswordArgs),
}

#[derive(Args, Debug)]
struct HashPasswordArgs {
    password: String,
}

fn run_auth_key() -> i32 {
    println!("{}", shiftbook::auth::generate_auth_key());
    0
}

fn run_hash_password(args: &HashPasswordArgs) -> i32 {
    if args.password.is_empty() {
        eprintln!("error: password cannot be empty");
        return 2;
    }
    match shiftbook::credentials::hash_password(&args.password) {
        Ok(hash) => {
            println!("{hash}");
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig, String> {
    Ok(AppConfig {
        addr: cli.addr,
        app_name: cli.app_name.clone(),
        auth: resolve_auth_config(cli)?,
        login: resolve_login_config(cli)?,
        users_file: cli.users_file.clone(),
        history_file: cli.history_file.clone(),
    })
}

fn resolve_auth_config(cli: &Cli) -> Result<AuthConfig, String> {
    let defaults = AuthConfig::default();

    let key = match cli.auth_key.as_deref().map(str::trim) {
        Some("") => return Err("auth key cannot be empty".to_string()),
        Some(key) => Some(key.to_string()),
        None => None,
    };

    if let Some(name) = cli.auth_cookie_name.as_deref()
        && name.trim().is_empty()
    {
        return Err("auth cookie name cannot be empty".to_string());
    }

    let token_ttl = match cli.auth_token_ttl.as_deref() {
        Some(raw) => {
            let ttl = parse_positive_duration(raw, "auth token ttl")?;
            time::Duration::try_from(ttl).map_err(|_| format!("auth token ttl '{raw}' is too large"))?
        }
        None => defaults.token_ttl,
    };
    let cookie_name = cli
        .auth_cookie_name
        .as_deref()
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| DEFAULT_AUTH_COOKIE_NAME.to_string());

    Ok(AuthConfig {
        key,
        token_ttl,
        cookie_name,
        cookie_secure: cli.auth_cookie_secure,
    })
}

fn resolve_login_config(cli: &Cli) -> Result<LoginConfig, String> {
    let defaults = LoginConfig::default();
    let latency = match cli.login_latency.as_deref() {
        Some(raw) => parse_duration(raw, "login latency")?,
        None => defaults.latency,
    };
    let timeout = match cli.login_timeout.as_deref() {
        Some(raw) => parse_positive_duration(raw, "login timeout")?,
        None => defaults.timeout,
    };
    Ok(LoginConfig { latency, timeout })
}

fn parse_positive_duration(raw: &str, label: &str) -> Result<Duration, String> {
    let duration = parse_duration(raw, label)?;
    if duration.is_zero() {
        return Err(format!("{label} must be greater than 0"));
    }
    Ok(duration)
}

/// Parses `<number>[ms|s|m|h|d]`; a bare number is seconds.
fn parse_duration(raw: &str, label: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(format!("{label} cannot be empty"));
    }

    let split = value
        .find(|ch: char| ch.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (amount, unit) = value.split_at(split);
    let invalid = || format!("invalid {label} '{value}'; expected <number>[ms|s|m|h|d]");

    let amount: u64 = amount.parse().map_err(|_| invalid())?;
    let seconds = |factor: u64| {
        amount
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(invalid)
    };

    match unit.to_ascii_lowercase().as_str() {
        "ms" => Ok(Duration::from_millis(amount)),
        "" | "s" => seconds(1),
        "m" => seconds(60),
        "h" => seconds(60 * 60),
        "d" => seconds(24 * 60 * 60),
        _ => Err(invalid()),
    }
}
