//! nlvrf command - move interfaces into VRF devices.

mod commands;

use clap::{Parser, Subcommand};
use nlvrf::Connection;
use nlvrf::netlink::namespace;

#[derive(Parser)]
#[command(name = "nlvrf", version, about = "VRF membership tool")]
struct Cli {
    /// Network namespace to operate in (name under /var/run/netns, or a path).
    #[arg(long, global = true)]
    netns: Option<String>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enslave an interface to a VRF, creating the VRF if needed.
    Add(commands::AddCmd),

    /// Detach an interface from its VRF.
    #[command(visible_alias = "delete")]
    Del(commands::DelCmd),

    /// Verify that an interface is enslaved to a VRF.
    Check(commands::CheckCmd),

    /// Show VRF devices and their members.
    #[command(visible_alias = "ls")]
    Show(commands::ShowCmd),
}

fn log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_level(cli.verbose).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;
    let netns = cli.netns;
    let connect = move || -> anyhow::Result<Connection> {
        let conn = match netns.as_deref() {
            Some(spec) => namespace::connection_for_spec(spec)?,
            None => Connection::new()?,
        };
        Ok(conn)
    };

    match cli.command {
        Command::Add(cmd) => cmd.run(connect, json).await,
        Command::Del(cmd) => cmd.run(connect).await,
        Command::Check(cmd) => cmd.run(connect, json).await,
        Command::Show(cmd) => cmd.run(connect, json).await,
    }
}
