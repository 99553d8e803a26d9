//! Async rtnetlink library for managing Linux VRF devices.
//!
//! The [`netlink`] module is a small NETLINK_ROUTE client: links, addresses
//! and routes over a tokio-driven socket that can be bound to any network
//! namespace. The [`vrf`] module builds VRF lifecycle operations on top of it,
//! and [`config`] decodes the JSON configuration the command line tool reads.
//!
//! # Example
//!
//! ```ignore
//! use nlvrf::netlink::Connection;
//! use nlvrf::vrf;
//!
//! #[tokio::main]
//! async fn main() -> nlvrf::Result<()> {
//!     let conn = Connection::new()?;
//!
//!     for info in vrf::list_vrfs(&conn).await? {
//!         println!("{} table {}: {:?}", info.device.name, info.device.table, info.members);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod netlink;
pub mod vrf;

// Re-export common types at crate root for convenience
pub use netlink::{Connection, Error, Result};
