//! Point-in-time views of an interface's addresses and routes.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

use super::rtnl::Rtnl;
use crate::netlink::Result;
use crate::netlink::messages::{AddressMessage, RouteMessage};
use crate::netlink::types::addr::Scope;
use crate::netlink::types::route::{RouteScope, rt_table};

/// An address together with its prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Prefix {
    pub addr: IpAddr,
    pub len: u8,
}

impl Prefix {
    pub fn new(addr: IpAddr, len: u8) -> Self {
        Self { addr, len }
    }

    /// The single-host prefix of `addr` (/32 or /128).
    pub fn host(addr: IpAddr) -> Self {
        let len = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        Self { addr, len }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

/// A universe-scoped address as the kernel reported it.
///
/// The full message is kept so the address can be re-added with the same
/// flags, lifetimes and label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalAddress {
    prefix: Prefix,
    message: AddressMessage,
}

impl GlobalAddress {
    fn from_message(message: AddressMessage) -> Option<Self> {
        if message.scope() != Scope::Universe {
            return None;
        }
        let addr = *message.primary_address()?;
        Some(Self {
            prefix: Prefix::new(addr, message.prefix_len()),
            message,
        })
    }

    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    /// The message to send to re-add this address.
    pub fn message(&self) -> &AddressMessage {
        &self.message
    }
}

/// Snapshot the universe-scoped addresses of `family` on an interface.
pub async fn global_addresses<K: Rtnl>(
    kernel: &K,
    ifindex: u32,
    family: u8,
) -> Result<Vec<GlobalAddress>> {
    let addresses = kernel.addresses(ifindex).await?;
    Ok(addresses
        .into_iter()
        .filter(|a| a.ifindex() == ifindex && a.family() == family)
        .filter_map(GlobalAddress::from_message)
        .collect())
}

/// Addresses in `before` whose prefix is absent from `after`, in `before` order.
pub fn missing<'a>(before: &'a [GlobalAddress], after: &[GlobalAddress]) -> Vec<&'a GlobalAddress> {
    let present: HashSet<Prefix> = after.iter().map(GlobalAddress::prefix).collect();
    before
        .iter()
        .filter(|a| !present.contains(&a.prefix))
        .collect()
}

/// Whether a main-table route belongs to `ifindex` and must follow it into a VRF.
///
/// Only universe-scoped routes with a preferred source qualify; connected and
/// local routes are recreated by the kernel on its own.
pub fn is_carried_route(route: &RouteMessage, ifindex: u32) -> bool {
    route.oif() == Some(ifindex)
        && route.has_scope(RouteScope::Universe)
        && route.table_id() == rt_table::MAIN
        && route.prefsrc().is_some()
}

/// Snapshot the routes of every family that must be replayed into the VRF.
///
/// The kernel listing order is preserved.
pub async fn carried_routes<K: Rtnl>(kernel: &K, ifindex: u32) -> Result<Vec<RouteMessage>> {
    let routes = kernel.routes().await?;
    Ok(routes
        .into_iter()
        .filter(|r| is_carried_route(r, ifindex))
        .collect())
}
