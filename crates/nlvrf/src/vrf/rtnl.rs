//! The kernel operations VRF management is built from.

use crate::netlink::link::VrfLink;
use crate::netlink::messages::{AddressMessage, LinkMessage, RouteMessage};
use crate::netlink::{Connection, Result};

/// rtnetlink operations used by the `vrf` module.
///
/// [`Connection`] implements this against the kernel of the namespace it is
/// bound to. Everything in [`crate::vrf`] is generic over it so the
/// enslave/repair sequence can be driven against other backends.
#[allow(async_fn_in_trait)]
pub trait Rtnl {
    /// Dump every link.
    async fn links(&self) -> Result<Vec<LinkMessage>>;

    /// Look a link up by name.
    async fn link_by_name(&self, name: &str) -> Result<Option<LinkMessage>> {
        let links = self.links().await?;
        Ok(links.into_iter().find(|l| l.name() == Some(name)))
    }

    /// Look a link up by index.
    async fn link_by_index(&self, index: u32) -> Result<Option<LinkMessage>> {
        let links = self.links().await?;
        Ok(links.into_iter().find(|l| l.ifindex() == index))
    }

    /// Create a VRF device.
    async fn add_vrf(&self, vrf: &VrfLink) -> Result<()>;

    /// Set a link administratively up.
    async fn set_link_up(&self, index: u32) -> Result<()>;

    /// Set the master of a link.
    async fn set_master(&self, index: u32, master: u32) -> Result<()>;

    /// Clear the master of a link.
    async fn set_nomaster(&self, index: u32) -> Result<()>;

    /// Dump the addresses of one link.
    async fn addresses(&self, index: u32) -> Result<Vec<AddressMessage>>;

    /// Add an address, failing if it already exists.
    async fn add_address(&self, addr: &AddressMessage) -> Result<()>;

    /// Dump the routes of every table.
    async fn routes(&self) -> Result<Vec<RouteMessage>>;

    /// Install or replace a route.
    async fn replace_route(&self, route: &RouteMessage) -> Result<()>;
}

impl Rtnl for Connection {
    async fn links(&self) -> Result<Vec<LinkMessage>> {
        self.get_links().await
    }

    async fn link_by_name(&self, name: &str) -> Result<Option<LinkMessage>> {
        self.get_link_by_name(name).await
    }

    async fn link_by_index(&self, index: u32) -> Result<Option<LinkMessage>> {
        self.get_link_by_index(index).await
    }

    async fn add_vrf(&self, vrf: &VrfLink) -> Result<()> {
        self.add_link(vrf.clone()).await
    }

    async fn set_link_up(&self, index: u32) -> Result<()> {
        self.set_link_up_by_index(index).await
    }

    async fn set_master(&self, index: u32, master: u32) -> Result<()> {
        self.set_link_master_by_index(index, master).await
    }

    async fn set_nomaster(&self, index: u32) -> Result<()> {
        self.set_link_nomaster_by_index(index).await
    }

    async fn addresses(&self, index: u32) -> Result<Vec<AddressMessage>> {
        self.get_addresses_by_index(index).await
    }

    async fn add_address(&self, addr: &AddressMessage) -> Result<()> {
        Connection::add_address(self, addr).await
    }

    async fn routes(&self) -> Result<Vec<RouteMessage>> {
        self.get_routes().await
    }

    async fn replace_route(&self, route: &RouteMessage) -> Result<()> {
        Connection::replace_route(self, route).await
    }
}
