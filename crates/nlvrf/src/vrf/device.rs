//! Locating, creating and listing VRF devices.

use serde::Serialize;

use super::rtnl::Rtnl;
use super::table::find_free_table_id;
use crate::netlink::link::VrfLink;
use crate::netlink::messages::{LinkMessage, LinkType};
use crate::netlink::{Error, Result};

/// A VRF master device and the routing table it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VrfDevice {
    pub name: String,
    pub index: u32,
    pub table: u32,
}

impl TryFrom<&LinkMessage> for VrfDevice {
    type Error = Error;

    fn try_from(link: &LinkMessage) -> Result<Self> {
        let name = link.name_or("").to_string();
        match link.link_type() {
            LinkType::Vrf { table } => Ok(Self {
                name,
                index: link.ifindex(),
                table: table.unwrap_or(0),
            }),
            _ => Err(Error::NotAVrf { name }),
        }
    }
}

/// A VRF device together with the names of its enslaved interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VrfInfo {
    #[serde(flatten)]
    pub device: VrfDevice,
    pub members: Vec<String>,
}

/// Find the VRF device called `name`.
pub async fn find_vrf<K: Rtnl>(kernel: &K, name: &str) -> Result<VrfDevice> {
    let link = kernel
        .link_by_name(name)
        .await?
        .ok_or_else(|| Error::InterfaceNotFound {
            name: name.to_string(),
        })?;
    VrfDevice::try_from(&link)
}

/// Create a VRF device and bring it up.
///
/// A `table` of 0 picks the smallest table id no other VRF uses.
pub async fn create_vrf<K: Rtnl>(kernel: &K, name: &str, table: u32) -> Result<VrfDevice> {
    let table = if table == 0 {
        let links = kernel.links().await?;
        find_free_table_id(&links)?
    } else {
        table
    };

    tracing::debug!(vrf = name, table, "adding VRF");
    kernel
        .add_vrf(&VrfLink::new(name, table))
        .await
        .map_err(|e| e.with_context(format!("could not add VRF {}", name)))?;

    let vrf = find_vrf(kernel, name).await?;
    kernel
        .set_link_up(vrf.index)
        .await
        .map_err(|e| e.with_context(format!("could not set link up for VRF {}", name)))?;

    tracing::info!(vrf = name, table = vrf.table, index = vrf.index, "created VRF");
    Ok(vrf)
}

/// Find the VRF called `name`, creating it if it does not exist.
///
/// A non-zero `table` must match the table of an existing VRF.
pub async fn ensure_vrf<K: Rtnl>(kernel: &K, name: &str, table: u32) -> Result<VrfDevice> {
    match find_vrf(kernel, name).await {
        Ok(vrf) if table != 0 && vrf.table != table => Err(Error::TableMismatch {
            name: name.to_string(),
            actual: vrf.table,
            requested: table,
        }),
        Ok(vrf) => Ok(vrf),
        Err(Error::InterfaceNotFound { .. }) => create_vrf(kernel, name, table).await,
        Err(e) => Err(e),
    }
}

/// Every link whose master is `vrf`.
pub async fn assigned_interfaces<K: Rtnl>(kernel: &K, vrf: &VrfDevice) -> Result<Vec<LinkMessage>> {
    let links = kernel.links().await?;
    Ok(links
        .into_iter()
        .filter(|l| l.master() == Some(vrf.index))
        .collect())
}

/// Every VRF device in the namespace with its members, in link order.
pub async fn list_vrfs<K: Rtnl>(kernel: &K) -> Result<Vec<VrfInfo>> {
    let links = kernel.links().await?;
    let vrfs = links
        .iter()
        .filter_map(|l| VrfDevice::try_from(l).ok())
        .map(|device| {
            let members = links
                .iter()
                .filter(|l| l.master() == Some(device.index))
                .map(|l| l.name_or("?").to_string())
                .collect();
            VrfInfo { device, members }
        })
        .collect();
    Ok(vrfs)
}
