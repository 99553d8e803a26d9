//! VRF management.
//!
//! Finds or creates VRF devices with a free routing table, enslaves interfaces
//! to them and repairs the IPv6 addresses and routes the kernel drops along
//! the way.
//!
//! # Example
//!
//! ```ignore
//! use nlvrf::netlink::namespace;
//! use nlvrf::vrf;
//!
//! let conn = namespace::connection_for("blue")?;
//! let (device, report) = vrf::attach(&conn, "eth1", "vrf-blue", 0).await?;
//! println!("{} uses table {}, restored {:?}", device.name, device.table, report.restored);
//! ```

mod converge;
mod device;
mod enslave;
#[cfg(test)]
mod fake;
mod rtnl;
mod snapshot;
mod table;

pub use converge::{ConvergenceWaiter, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};
pub use device::{
    VrfDevice, VrfInfo, assigned_interfaces, create_vrf, ensure_vrf, find_vrf, list_vrfs,
};
pub use enslave::{
    EnslaveReport, add_interface, add_interface_with, attach, attach_with, check_membership,
    replay, reset_master,
};
pub use rtnl::Rtnl;
pub use snapshot::{
    GlobalAddress, Prefix, carried_routes, global_addresses, is_carried_route, missing,
};
pub use table::{find_free_table_id, smallest_unused};
