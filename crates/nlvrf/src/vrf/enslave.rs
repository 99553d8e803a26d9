//! Moving interfaces in and out of VRFs.
//!
//! Setting the master of an interface to a VRF makes the kernel drop its
//! universe-scoped IPv6 addresses on some kernels, together with routes that
//! used them as preferred source. [`add_interface`] snapshots both before the
//! move, puts back whatever went missing, and replays the routes into the VRF
//! table.

use serde::Serialize;

use super::converge::ConvergenceWaiter;
use super::device::{VrfDevice, ensure_vrf, find_vrf};
use super::rtnl::Rtnl;
use super::snapshot::{Prefix, carried_routes, global_addresses, missing};
use crate::netlink::messages::{LinkMessage, RouteMessage};
use crate::netlink::{Error, Result};

/// What [`add_interface`] had to repair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnslaveReport {
    /// Addresses the kernel dropped and that were re-added.
    pub restored: Vec<Prefix>,
    /// Routes replayed into the VRF table.
    pub replayed_routes: usize,
}

async fn link_named<K: Rtnl>(kernel: &K, name: &str) -> Result<LinkMessage> {
    kernel
        .link_by_name(name)
        .await?
        .ok_or_else(|| Error::InterfaceNotFound {
            name: name.to_string(),
        })
}

/// Enslave `ifname` to `vrf`, repairing addresses and routes the move drops.
pub async fn add_interface<K: Rtnl>(
    kernel: &K,
    ifname: &str,
    vrf: &VrfDevice,
) -> Result<EnslaveReport> {
    add_interface_with(kernel, ifname, vrf, &ConvergenceWaiter::default()).await
}

/// [`add_interface`] with a custom convergence waiter.
pub async fn add_interface_with<K: Rtnl>(
    kernel: &K,
    ifname: &str,
    vrf: &VrfDevice,
    waiter: &ConvergenceWaiter,
) -> Result<EnslaveReport> {
    let link = link_named(kernel, ifname).await?;
    let ifindex = link.ifindex();

    if let Some(master) = link.master() {
        let master = match kernel.link_by_index(master).await? {
            Some(m) => m.name_or("?").to_string(),
            None => master.to_string(),
        };
        return Err(Error::AlreadyEnslaved {
            interface: ifname.to_string(),
            master,
        });
    }

    let before = global_addresses(kernel, ifindex, libc::AF_INET6 as u8).await?;
    let routes = carried_routes(kernel, ifindex).await?;
    tracing::debug!(
        interface = ifname,
        addresses = before.len(),
        routes = routes.len(),
        "captured state before enslaving"
    );

    kernel
        .set_master(ifindex, vrf.index)
        .await
        .map_err(|e| {
            e.with_context(format!(
                "could not set master {} for interface {}",
                vrf.name, ifname
            ))
        })?;

    let after = global_addresses(kernel, ifindex, libc::AF_INET6 as u8).await?;

    let mut report = EnslaveReport::default();
    for addr in missing(&before, &after) {
        let prefix = addr.prefix();
        tracing::debug!(interface = ifname, %prefix, "re-adding dropped address");
        kernel
            .add_address(addr.message())
            .await
            .map_err(|e| {
                e.with_context(format!(
                    "could not restore address {} on interface {}",
                    prefix, ifname
                ))
            })?;
        waiter
            .wait(kernel, ifname, ifindex, vrf.table, prefix.addr)
            .await?;
        report.restored.push(prefix);
    }

    report.replayed_routes = replay(kernel, routes, vrf.table).await?;

    tracing::info!(
        interface = ifname,
        vrf = %vrf.name,
        table = vrf.table,
        restored = report.restored.len(),
        replayed = report.replayed_routes,
        "interface enslaved"
    );
    Ok(report)
}

/// Install `routes` into `table`, in the given order.
///
/// Returns the number of routes installed.
pub async fn replay<K: Rtnl>(
    kernel: &K,
    routes: Vec<RouteMessage>,
    table: u32,
) -> Result<usize> {
    let mut count = 0;
    for mut route in routes {
        route.set_table(table);
        tracing::debug!(%route, "replaying route");
        kernel
            .replace_route(&route)
            .await
            .map_err(|e| e.with_context(format!("could not replay route {}", route)))?;
        count += 1;
    }
    Ok(count)
}

/// Detach `ifname` from whatever master it has.
pub async fn reset_master<K: Rtnl>(kernel: &K, ifname: &str) -> Result<()> {
    let link = link_named(kernel, ifname).await?;
    kernel
        .set_nomaster(link.ifindex())
        .await
        .map_err(|e| e.with_context(format!("could not reset master for interface {}", ifname)))?;
    tracing::debug!(interface = ifname, "master cleared");
    Ok(())
}

/// Verify that `ifname` is enslaved to the VRF `vrfname`.
///
/// A non-zero `table` must also match the VRF's table.
pub async fn check_membership<K: Rtnl>(
    kernel: &K,
    ifname: &str,
    vrfname: &str,
    table: u32,
) -> Result<VrfDevice> {
    let vrf = find_vrf(kernel, vrfname).await?;
    if table != 0 && vrf.table != table {
        return Err(Error::TableMismatch {
            name: vrf.name,
            actual: vrf.table,
            requested: table,
        });
    }

    let link = link_named(kernel, ifname).await?;
    if link.master() != Some(vrf.index) {
        return Err(Error::NotEnslaved {
            interface: ifname.to_string(),
            vrf: vrf.name,
        });
    }

    Ok(vrf)
}

/// Make sure the VRF exists, then enslave `ifname` to it.
pub async fn attach<K: Rtnl>(
    kernel: &K,
    ifname: &str,
    vrfname: &str,
    table: u32,
) -> Result<(VrfDevice, EnslaveReport)> {
    attach_with(kernel, ifname, vrfname, table, &ConvergenceWaiter::default()).await
}

/// [`attach`] with a custom convergence waiter.
pub async fn attach_with<K: Rtnl>(
    kernel: &K,
    ifname: &str,
    vrfname: &str,
    table: u32,
    waiter: &ConvergenceWaiter,
) -> Result<(VrfDevice, EnslaveReport)> {
    let vrf = ensure_vrf(kernel, vrfname, table).await?;
    let report = add_interface_with(kernel, ifname, &vrf, waiter).await?;
    Ok((vrf, report))
}
