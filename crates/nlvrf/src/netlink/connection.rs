//! High-level rtnetlink connection with request/response handling.

use std::os::unix::io::RawFd;
use std::path::Path;

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{
    MessageIter, NLM_F_ACK, NLM_F_CREATE, NLM_F_DUMP, NLM_F_EXCL, NLM_F_REPLACE, NLM_F_REQUEST,
    NlMsgError, NlMsgType,
};
use super::messages::{AddressMessage, LinkMessage, RouteMessage};
use super::parse::FromNetlink;
use super::socket::NetlinkSocket;
use super::types::link::{IfInfoMsg, iff};

/// How many times a dump is restarted after the kernel flags it as
/// interrupted by a concurrent change.
pub const DUMP_RETRIES: usize = 5;

/// High-level rtnetlink connection.
pub struct Connection {
    socket: NetlinkSocket,
}

impl Connection {
    /// Create a new connection in the current network namespace.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
        })
    }

    /// Create a connection that operates in a specific network namespace.
    ///
    /// The namespace is specified by an open file descriptor to a namespace file
    /// (e.g., `/proc/<pid>/ns/net` or `/var/run/netns/<name>`).
    pub fn new_in_namespace(ns_fd: RawFd) -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new_in_namespace(ns_fd)?,
        })
    }

    /// Create a connection that operates in a network namespace specified by path.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use nlvrf::netlink::Connection;
    ///
    /// let conn = Connection::new_in_namespace_path("/var/run/netns/blue")?;
    /// let links = conn.get_links().await?;
    /// ```
    pub fn new_in_namespace_path<P: AsRef<Path>>(ns_path: P) -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new_in_namespace_path(ns_path)?,
        })
    }

    /// Get the underlying socket.
    pub fn socket(&self) -> &NetlinkSocket {
        &self.socket
    }

    /// Send a request that expects an ACK only (no data response).
    pub async fn request_ack(&self, mut builder: MessageBuilder) -> Result<()> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.send(&msg).await?;

        loop {
            let response = self.socket.recv_msg().await?;
            if process_ack(&response, seq)? {
                return Ok(());
            }
        }
    }

    /// Send a dump request and collect all response payloads.
    ///
    /// If the kernel marks any part of the dump with `NLM_F_DUMP_INTR`, the
    /// remaining parts are still drained so the socket stays in sync, and
    /// [`Error::DumpInterrupted`] is returned.
    pub async fn dump(&self, mut builder: MessageBuilder) -> Result<Vec<Vec<u8>>> {
        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.send(&msg).await?;

        let mut responses = Vec::new();
        let mut interrupted = false;

        loop {
            let data = self.socket.recv_msg().await?;
            let mut done = false;

            for result in MessageIter::new(&data) {
                let (header, payload) = result?;

                if header.nlmsg_seq != seq {
                    continue;
                }

                if header.is_dump_interrupted() {
                    interrupted = true;
                }

                if header.is_error() {
                    let err = NlMsgError::from_bytes(payload)?;
                    if !err.is_ack() {
                        return Err(Error::from_errno(err.error));
                    }
                }

                if header.is_done() {
                    done = true;
                    break;
                }

                responses.push(payload.to_vec());
            }

            if done {
                break;
            }
        }

        if interrupted {
            return Err(Error::DumpInterrupted);
        }

        Ok(responses)
    }

    /// Send a dump request and parse all responses into typed messages.
    ///
    /// Interrupted dumps are re-issued up to [`DUMP_RETRIES`] times; the last
    /// [`Error::DumpInterrupted`] is returned if none of them completes.
    pub async fn dump_typed<T: FromNetlink>(&self, msg_type: u16) -> Result<Vec<T>> {
        let responses = retry_interrupted(|| {
            let mut builder = dump_request(msg_type);
            let mut header_buf = Vec::new();
            T::write_dump_header(&mut header_buf);
            builder.append_bytes(&header_buf);
            self.dump(builder)
        })
        .await?;
        Ok(parse_all(&responses))
    }
}

/// Run `dump` once, then again for each interruption, at most
/// [`DUMP_RETRIES`] more times.
async fn retry_interrupted<T, F, Fut>(mut dump: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0;
    loop {
        match dump().await {
            Err(Error::DumpInterrupted) if retries < DUMP_RETRIES => {
                retries += 1;
                tracing::debug!(retries, "dump interrupted, restarting");
            }
            other => return other,
        }
    }
}

/// Parse dump payloads, skipping any the typed parser rejects.
fn parse_all<T: FromNetlink>(responses: &[Vec<u8>]) -> Vec<T> {
    responses
        .iter()
        .filter_map(|payload| match T::from_bytes(payload) {
            Ok(msg) => Some(msg),
            Err(e) => {
                tracing::trace!(error = %e, "skipping unparsable dump entry");
                None
            }
        })
        .collect()
}

/// Check a datagram for the ACK of `expected_seq`.
///
/// Returns `Ok(true)` once the ACK was seen and `Ok(false)` if the datagram
/// held nothing for this request.
fn process_ack(data: &[u8], expected_seq: u32) -> Result<bool> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;

        if header.nlmsg_seq != expected_seq {
            continue;
        }

        if header.is_error() {
            let err = NlMsgError::from_bytes(payload)?;
            if !err.is_ack() {
                return Err(Error::from_errno(err.error));
            }
            return Ok(true);
        }
    }

    Ok(false)
}

/// Helper to build a dump request.
pub fn dump_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP)
}

/// Helper to build a request expecting ACK.
pub fn ack_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_ACK)
}

/// Helper to build a create request that fails if the object exists.
pub fn create_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(
        msg_type,
        NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_EXCL,
    )
}

/// Helper to build a create-or-replace request.
pub fn replace_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(
        msg_type,
        NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_REPLACE,
    )
}

// ============================================================================
// Convenience Query Methods
// ============================================================================

impl Connection {
    /// Get all network interfaces.
    pub async fn get_links(&self) -> Result<Vec<LinkMessage>> {
        self.dump_typed(NlMsgType::RTM_GETLINK).await
    }

    /// Get a network interface by name.
    ///
    /// Returns `None` if the interface doesn't exist.
    pub async fn get_link_by_name(&self, name: &str) -> Result<Option<LinkMessage>> {
        let links = self.get_links().await?;
        Ok(links.into_iter().find(|l| l.name() == Some(name)))
    }

    /// Get a network interface by index.
    ///
    /// Returns `None` if the interface doesn't exist.
    pub async fn get_link_by_index(&self, index: u32) -> Result<Option<LinkMessage>> {
        let links = self.get_links().await?;
        Ok(links.into_iter().find(|l| l.ifindex() == index))
    }

    /// Get all IP addresses.
    pub async fn get_addresses(&self) -> Result<Vec<AddressMessage>> {
        self.dump_typed(NlMsgType::RTM_GETADDR).await
    }

    /// Get IP addresses for a specific interface by index.
    pub async fn get_addresses_by_index(&self, ifindex: u32) -> Result<Vec<AddressMessage>> {
        let addresses = self.get_addresses().await?;
        Ok(addresses
            .into_iter()
            .filter(|a| a.ifindex() == ifindex)
            .collect())
    }

    /// Get all routes of every table.
    pub async fn get_routes(&self) -> Result<Vec<RouteMessage>> {
        self.dump_typed(NlMsgType::RTM_GETROUTE).await
    }

    /// Get routes for a specific table.
    pub async fn get_routes_for_table(&self, table_id: u32) -> Result<Vec<RouteMessage>> {
        let routes = self.get_routes().await?;
        Ok(routes
            .into_iter()
            .filter(|r| r.table_id() == table_id)
            .collect())
    }
}

// ============================================================================
// Link State Management
// ============================================================================

impl Connection {
    /// Bring a network interface up by index.
    pub async fn set_link_up_by_index(&self, ifindex: u32) -> Result<()> {
        self.set_link_state_by_index(ifindex, true).await
    }

    /// Set the administrative state of a network interface by index.
    pub async fn set_link_state_by_index(&self, ifindex: u32, up: bool) -> Result<()> {
        let mut ifinfo = IfInfoMsg::new().with_index(ifindex);
        ifinfo.ifi_flags = if up { iff::UP } else { 0 };
        ifinfo.ifi_change = iff::UP;

        let mut builder = ack_request(NlMsgType::RTM_SETLINK);
        builder.append(&ifinfo);

        self.request_ack(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::{NLM_F_DUMP_INTR, NLM_F_MULTI, NLMSG_HDRLEN, NlMsgHdr};
    use crate::netlink::messages::LinkMessageBuilder;
    use zerocopy::IntoBytes;

    fn raw(msg_type: u16, flags: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
        let mut hdr = NlMsgHdr::new(msg_type, flags);
        hdr.nlmsg_len = (NLMSG_HDRLEN + payload.len()) as u32;
        hdr.nlmsg_seq = seq;
        let mut buf = hdr.as_bytes().to_vec();
        buf.extend_from_slice(payload);
        buf.resize(crate::netlink::message::nlmsg_align(buf.len()), 0);
        buf
    }

    fn error_payload(errno: i32) -> Vec<u8> {
        let mut payload = errno.to_ne_bytes().to_vec();
        payload.extend_from_slice(NlMsgHdr::new(0, 0).as_bytes());
        payload
    }

    #[tokio::test]
    async fn test_interrupted_dump_is_reissued_five_times() {
        let calls = std::cell::Cell::new(0);
        let result: Result<()> = retry_interrupted(|| {
            calls.set(calls.get() + 1);
            async { Err(Error::DumpInterrupted) }
        })
        .await;
        assert!(matches!(result, Err(Error::DumpInterrupted)));
        assert_eq!(calls.get(), 1 + DUMP_RETRIES);
    }

    #[tokio::test]
    async fn test_dump_completing_on_last_retry() {
        let calls = std::cell::Cell::new(0);
        let result = retry_interrupted(|| {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n <= DUMP_RETRIES {
                    Err(Error::DumpInterrupted)
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1 + DUMP_RETRIES);
    }

    #[tokio::test]
    async fn test_other_dump_errors_are_not_retried() {
        let calls = std::cell::Cell::new(0);
        let result: Result<()> = retry_interrupted(|| {
            calls.set(calls.get() + 1);
            async { Err(Error::from_errno(-libc::EPERM)) }
        })
        .await;
        assert!(result.unwrap_err().is_permission_denied());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_process_ack_ok() {
        let data = raw(NlMsgType::ERROR, 0, 7, &error_payload(0));
        assert!(process_ack(&data, 7).unwrap());
    }

    #[test]
    fn test_process_ack_ignores_other_sequences() {
        let data = raw(NlMsgType::ERROR, 0, 3, &error_payload(-libc::EEXIST));
        assert!(!process_ack(&data, 7).unwrap());
    }

    #[test]
    fn test_process_ack_maps_errno() {
        let data = raw(NlMsgType::ERROR, 0, 7, &error_payload(-libc::EEXIST));
        let err = process_ack(&data, 7).unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_parse_all_skips_garbage() {
        let good = LinkMessageBuilder::new().ifindex(1).name("lo").build();
        let mut payload = good.header.as_bytes().to_vec();
        crate::netlink::parse::write_attr_str(&mut payload, 3, "lo");

        let parsed: Vec<LinkMessage> = parse_all(&[payload, vec![1, 2]]);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name(), Some("lo"));
    }

    #[test]
    fn test_request_flags() {
        let create = create_request(NlMsgType::RTM_NEWADDR).finish();
        let hdr = NlMsgHdr::from_bytes(&create).unwrap();
        assert_eq!(
            hdr.nlmsg_flags,
            NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_EXCL
        );

        let replace = replace_request(NlMsgType::RTM_NEWROUTE).finish();
        let hdr = NlMsgHdr::from_bytes(&replace).unwrap();
        assert_eq!(
            hdr.nlmsg_flags,
            NLM_F_REQUEST | NLM_F_ACK | NLM_F_CREATE | NLM_F_REPLACE
        );
        assert_eq!(hdr.nlmsg_flags & (NLM_F_MULTI | NLM_F_DUMP_INTR), 0);
    }
}
