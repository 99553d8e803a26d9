//! Subcommand implementations.

use std::path::PathBuf;

use clap::Args;
use nlvrf::Connection;
use nlvrf::config::VrfConf;
use nlvrf::vrf::{self, EnslaveReport, VrfDevice, VrfInfo};

/// VRF selection shared by `add` and `check`.
#[derive(Args)]
pub struct Target {
    /// Interface to operate on.
    #[arg(long)]
    ifname: String,

    /// VRF name (overrides the configuration).
    #[arg(long)]
    vrf: Option<String>,

    /// Routing table of the VRF, 0 to allocate one (overrides the configuration).
    #[arg(long)]
    table: Option<u32>,

    /// JSON configuration file, `-` for stdin.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Target {
    fn resolve(&self) -> anyhow::Result<VrfConf> {
        let conf = match &self.config {
            Some(path) => VrfConf::load(path)?,
            None => VrfConf::default(),
        };
        let conf = conf.with_overrides(self.vrf.clone(), self.table);
        conf.validate()?;
        Ok(conf)
    }
}

#[derive(Args)]
pub struct AddCmd {
    #[command(flatten)]
    target: Target,
}

impl AddCmd {
    pub async fn run(
        &self,
        connect: impl FnOnce() -> anyhow::Result<Connection>,
        json: bool,
    ) -> anyhow::Result<()> {
        let conf = self.target.resolve()?;
        let conn = connect()?;
        let (device, report) =
            vrf::attach(&conn, &self.target.ifname, &conf.vrf_name, conf.table).await?;

        if json {
            let value = serde_json::json!({
                "interface": self.target.ifname,
                "vrf": device,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            print_attached(&self.target.ifname, &device, &report);
        }
        Ok(())
    }
}

fn print_attached(ifname: &str, device: &VrfDevice, report: &EnslaveReport) {
    println!("{} enslaved to {} table {}", ifname, device.name, device.table);
    for prefix in &report.restored {
        println!("    restored {}", prefix);
    }
    if report.replayed_routes > 0 {
        println!("    replayed {} route(s)", report.replayed_routes);
    }
}

#[derive(Args)]
pub struct DelCmd {
    /// Interface to detach.
    #[arg(long)]
    ifname: String,
}

impl DelCmd {
    /// Teardown is best effort: failures are logged and the command succeeds.
    pub async fn run(
        &self,
        connect: impl FnOnce() -> anyhow::Result<Connection>,
    ) -> anyhow::Result<()> {
        let conn = match connect() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(interface = %self.ifname, "cannot open netlink connection: {:#}", e);
                return Ok(());
            }
        };
        if let Err(e) = vrf::reset_master(&conn, &self.ifname).await {
            tracing::warn!(interface = %self.ifname, "failed to reset master: {}", e);
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct CheckCmd {
    #[command(flatten)]
    target: Target,
}

impl CheckCmd {
    pub async fn run(
        &self,
        connect: impl FnOnce() -> anyhow::Result<Connection>,
        json: bool,
    ) -> anyhow::Result<()> {
        let conf = self.target.resolve()?;
        let conn = connect()?;
        let device =
            vrf::check_membership(&conn, &self.target.ifname, &conf.vrf_name, conf.table).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&device)?);
        } else {
            println!(
                "{} is enslaved to {} table {}",
                self.target.ifname, device.name, device.table
            );
        }
        Ok(())
    }
}

#[derive(Args)]
pub struct ShowCmd {
    /// VRF name.
    name: Option<String>,
}

impl ShowCmd {
    pub async fn run(
        &self,
        connect: impl FnOnce() -> anyhow::Result<Connection>,
        json: bool,
    ) -> anyhow::Result<()> {
        let conn = connect()?;
        let vrfs: Vec<VrfInfo> = vrf::list_vrfs(&conn)
            .await?
            .into_iter()
            .filter(|v| self.name.as_deref().is_none_or(|n| v.device.name == n))
            .collect();

        if let Some(name) = &self.name {
            if vrfs.is_empty() {
                anyhow::bail!("VRF {} not found", name);
            }
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&vrfs)?);
        } else {
            for info in &vrfs {
                print!("{} table {}", info.device.name, info.device.table);
                if !info.members.is_empty() {
                    print!(" members {}", info.members.join(","));
                }
                println!();
            }
        }
        Ok(())
    }
}
