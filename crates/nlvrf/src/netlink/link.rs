//! Link creation and master management.
//!
//! # Supported Link Types
//!
//! - [`VrfLink`] - VRF master device bound to a routing table
//! - [`DummyLink`] - Dummy interface, handy as an enslaveable port
//!
//! # Example
//!
//! ```ignore
//! use nlvrf::netlink::Connection;
//! use nlvrf::netlink::link::{DummyLink, VrfLink};
//!
//! let conn = Connection::new()?;
//!
//! conn.add_link(VrfLink::new("vrf-blue", 100)).await?;
//! conn.add_link(DummyLink::new("dummy0")).await?;
//! ```

use super::builder::MessageBuilder;
use super::connection::{Connection, ack_request, create_request};
use super::error::Result;
use super::message::NlMsgType;
use super::types::link::{IfInfoMsg, IflaAttr, IflaInfo, vrf};

/// Trait for link configurations that can be added to the system.
pub trait LinkConfig {
    /// Get the name of this interface.
    fn name(&self) -> &str;

    /// Get the kind string for this link type (e.g., "vrf", "dummy").
    fn kind(&self) -> &str;

    /// Build the netlink message for creating this link.
    fn build(&self) -> Result<MessageBuilder>;
}

// ============================================================================
// VRF Link
// ============================================================================

/// Configuration for a VRF (Virtual Routing and Forwarding) device.
///
/// Every VRF is bound to exactly one routing table; interfaces enslaved to it
/// have their routes looked up in that table.
///
/// # Example
///
/// ```ignore
/// use nlvrf::netlink::link::VrfLink;
///
/// conn.add_link(VrfLink::new("vrf-blue", 100)).await?;
/// ```
#[derive(Debug, Clone)]
pub struct VrfLink {
    name: String,
    table: u32,
}

impl VrfLink {
    /// Create a new VRF configuration.
    pub fn new(name: impl Into<String>, table: u32) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }

    /// Get the routing table this VRF is bound to.
    pub fn table(&self) -> u32 {
        self.table
    }
}

impl LinkConfig for VrfLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "vrf"
    }

    fn build(&self) -> Result<MessageBuilder> {
        let mut builder = create_link_message(&self.name);

        // IFLA_LINKINFO -> IFLA_INFO_KIND + IFLA_INFO_DATA -> IFLA_VRF_TABLE
        let linkinfo = builder.nest_start(IflaAttr::Linkinfo as u16);
        builder.append_attr_str(IflaInfo::Kind as u16, "vrf");
        let data = builder.nest_start(IflaInfo::Data as u16);
        builder.append_attr_u32(vrf::IFLA_VRF_TABLE, self.table);
        builder.nest_end(data);
        builder.nest_end(linkinfo);

        Ok(builder)
    }
}

// ============================================================================
// Dummy Link
// ============================================================================

/// Configuration for a dummy interface.
///
/// Dummy interfaces are virtual interfaces that simply drop all traffic.
/// They're useful for testing or as anchors for IP addresses.
#[derive(Debug, Clone)]
pub struct DummyLink {
    name: String,
    mtu: Option<u32>,
}

impl DummyLink {
    /// Create a new dummy interface configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mtu: None,
        }
    }

    /// Set the MTU for this interface.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }
}

impl LinkConfig for DummyLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "dummy"
    }

    fn build(&self) -> Result<MessageBuilder> {
        let mut builder = create_link_message(&self.name);
        if let Some(mtu) = self.mtu {
            builder.append_attr_u32(IflaAttr::Mtu as u16, mtu);
        }

        let linkinfo = builder.nest_start(IflaAttr::Linkinfo as u16);
        builder.append_attr_str(IflaInfo::Kind as u16, "dummy");
        builder.nest_end(linkinfo);

        Ok(builder)
    }
}

/// Start an RTM_NEWLINK create request carrying the interface name.
fn create_link_message(name: &str) -> MessageBuilder {
    let mut builder = create_request(NlMsgType::RTM_NEWLINK);
    builder.append(&IfInfoMsg::new());
    builder.append_attr_str(IflaAttr::Ifname as u16, name);
    builder
}

// ============================================================================
// Connection Methods
// ============================================================================

impl Connection {
    /// Add a new network interface.
    pub async fn add_link<L: LinkConfig>(&self, config: L) -> Result<()> {
        let builder = config.build()?;
        self.request_ack(builder).await
    }

    /// Set the master (controller) device by interface indices.
    pub async fn set_link_master_by_index(&self, ifindex: u32, master_index: u32) -> Result<()> {
        let ifinfo = IfInfoMsg::new().with_index(ifindex);

        let mut builder = ack_request(NlMsgType::RTM_SETLINK);
        builder.append(&ifinfo);
        builder.append_attr_u32(IflaAttr::Master as u16, master_index);

        self.request_ack(builder).await
    }

    /// Remove an interface from its master by index.
    pub async fn set_link_nomaster_by_index(&self, ifindex: u32) -> Result<()> {
        self.set_link_master_by_index(ifindex, 0).await
    }
}
