//! IP address management.
//!
//! Addresses are written back exactly as they were read, so callers pass an
//! [`AddressMessage`] (usually obtained from a dump) rather than a builder.
//!
//! # Example
//!
//! ```ignore
//! use nlvrf::netlink::Connection;
//! use nlvrf::netlink::messages::AddressMessage;
//!
//! let conn = Connection::new()?;
//! let addr = AddressMessage::new(4, "2001:db8::10".parse()?, 64);
//! conn.add_address(&addr).await?;
//! ```

use super::connection::{Connection, create_request};
use super::error::Result;
use super::message::NlMsgType;
use super::messages::AddressMessage;
use super::parse::ToNetlink;

impl Connection {
    /// Add an IP address. Fails with `EEXIST` if it is already present.
    pub async fn add_address(&self, addr: &AddressMessage) -> Result<()> {
        let mut builder = create_request(NlMsgType::RTM_NEWADDR);
        builder.append_bytes(&addr.to_bytes()?);

        self.request_ack(builder).await
    }
}
