use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mfa_device::{
    config::DEFAULT_UPDATE_FREQUENCY_SECS,
    secret::{SecretSource, SECRET_FILE_ENV},
    totp::{DEFAULT_DIGITS, DEFAULT_PERIOD},
    Device, DeviceConfig, OtpHashAlgorithm, Terminal, TerminalColor, DEFAULT_WARN_SECONDS,
};

const ABOUT: &str = "Prints a One-Time-Passcode (OTP), refreshing it every --update-frequency seconds.";

const LONG_ABOUT: &str = "\
Prints a One-Time-Passcode (OTP), refreshing it every --update-frequency seconds.

If --secret is provided, it takes precedence (NOTE this is the least secure option).
Else, if --secret-file is provided, the secret is read from that file.
Else, if the environment variable MFA_SECRET_FILE is set, the secret is read from that file.
Else, the secret is read from $HOME/.mfa/secret.

The secret may be a base32 string or an otpauth://totp/ key URI.";

#[derive(Parser, Debug)]
#[command(name = "mfa", version, about = ABOUT, long_about = LONG_ABOUT)]
struct Cli {
    /// The OTP secret
    #[arg(long)]
    secret: Option<String>,

    /// File containing the OTP secret
    #[arg(long, env = SECRET_FILE_ENV)]
    secret_file: Option<PathBuf>,

    /// Seconds between OTP recalculations
    #[arg(long, default_value_t = DEFAULT_UPDATE_FREQUENCY_SECS)]
    update_frequency: u64,

    /// Seconds an OTP is valid for [default: 30]
    #[arg(long)]
    refresh_period: Option<u64>,

    /// Prefix printed before the OTP, to tell several devices apart
    #[arg(long, default_value = "mfa")]
    prefix: String,

    /// Number of digits in the OTP [default: 6]
    #[arg(long)]
    digits: Option<u32>,

    /// Algorithm used to calculate the OTP: SHA1, SHA256, SHA512 or MD5 [default: SHA1]
    #[arg(long)]
    algorithm: Option<String>,

    /// Seconds before expiry at which the OTP is shown in the warning color
    #[arg(long, default_value_t = DEFAULT_WARN_SECONDS)]
    warn_seconds: u64,

    /// Text color for normal output: red, green, yellow, blue, purple, cyan, gray or white
    #[arg(long)]
    color: Option<String>,

    /// Text color for output when the OTP is close to expiry
    #[arg(long)]
    warn_color: Option<String>,

    /// Text color for errors
    #[arg(long)]
    error_color: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_color(name: Option<&str>) -> anyhow::Result<Option<TerminalColor>> {
    name.filter(|n| !n.is_empty())
        .map(str::parse::<TerminalColor>)
        .transpose()
        .map_err(Into::into)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut terminal = Terminal::new();
    terminal.with_prefix(&cli.prefix);
    if let Some(color) = parse_color(cli.color.as_deref())? {
        terminal.with_default_color(color);
    }
    if let Some(color) = parse_color(cli.warn_color.as_deref())? {
        terminal.with_warning_color(color);
    }
    if let Some(color) = parse_color(cli.error_color.as_deref())? {
        terminal.with_error_color(color);
    }

    let source = SecretSource::from_environment(cli.secret, cli.secret_file)?;
    let material = source
        .load(&mut terminal)
        .with_context(|| format!("could not load the secret from {source}"))?;

    let algorithm = match cli.algorithm.as_deref().filter(|a| !a.is_empty()) {
        Some(name) => name.parse()?,
        None => material.algorithm.unwrap_or(OtpHashAlgorithm::SHA1),
    };

    let config = DeviceConfig::builder()
        .secret(material.secret)
        .algorithm(algorithm)
        .digits(cli.digits.or(material.digits).unwrap_or(DEFAULT_DIGITS))
        .period(cli.refresh_period.or(material.period).unwrap_or(DEFAULT_PERIOD))
        .update_frequency(cli.update_frequency)
        .warn_seconds(cli.warn_seconds)
        .build()
        .context("invalid device configuration")?;

    let device = Device::new(config);
    device.run(&mut terminal, shutdown_signal()).await?;

    // Leave the cursor below the last code
    println!();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
}
