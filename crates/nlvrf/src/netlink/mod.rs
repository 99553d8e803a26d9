//! Async rtnetlink implementation for Linux.
//!
//! Only the parts of NETLINK_ROUTE that VRF management needs are covered:
//! links, addresses and routes.
//!
//! # Quick Start
//!
//! ```ignore
//! use nlvrf::netlink::Connection;
//!
//! let conn = Connection::new()?;
//!
//! let links = conn.get_links().await?;
//! for link in &links {
//!     println!("{}: {}", link.ifindex(), link.name_or("?"));
//! }
//! ```

pub mod addr;
pub mod attr;
mod builder;
pub mod connection;
mod error;
pub mod link;
pub mod message;
pub mod messages;
pub mod namespace;
pub mod parse;
pub mod route;
mod socket;
pub mod types;

pub use attr::{AttrIter, NlAttr};
pub use builder::{MessageBuilder, NestToken};
pub use connection::Connection;
pub use error::{Error, Result};
pub use message::{MessageIter, NLMSG_HDRLEN, NlMsgHdr, NlMsgType};
pub use parse::{FromNetlink, ToNetlink};
pub use socket::NetlinkSocket;
