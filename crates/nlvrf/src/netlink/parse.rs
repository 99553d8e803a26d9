//! Parsing and serialization traits for typed rtnetlink messages.
//!
//! Message payloads (everything after the `nlmsghdr`) are parsed with
//! [`winnow`] combinators into the structs in [`messages`](super::messages),
//! and written back with [`ToNetlink`].

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use super::attr::{NLA_HDRLEN, NLA_TYPE_MASK, NlAttr, nla_align};
use super::error::{Error, Result};

/// Result type for winnow parsers.
pub type PResult<T> = core::result::Result<T, ErrMode<ContextError>>;

/// Trait for types that can be parsed from netlink wire format.
pub trait FromNetlink: Sized {
    /// Parse from a mutable byte slice reference.
    /// The slice is advanced past the consumed bytes.
    fn parse(input: &mut &[u8]) -> PResult<Self>;

    /// Parse from a complete message payload.
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut input = data;
        Self::parse(&mut input).map_err(|e| Error::Parse(format!("{:?}", e)))
    }

    /// Write the family header required for dump requests.
    fn write_dump_header(_buf: &mut Vec<u8>) {}
}

/// Trait for types that can be serialized to netlink wire format.
pub trait ToNetlink {
    /// Calculate the serialized size in bytes.
    fn netlink_len(&self) -> usize;

    /// Write to a byte buffer.
    /// Returns the number of bytes written.
    fn write_to(&self, buf: &mut Vec<u8>) -> Result<usize>;

    /// Serialize to a new byte vector.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.netlink_len());
        self.write_to(&mut buf)?;
        Ok(buf)
    }
}

/// Unrecoverable parse failure.
pub(crate) fn cut() -> ErrMode<ContextError> {
    ErrMode::Cut(ContextError::new())
}

/// Consume a fixed-size header of `size` bytes.
pub(crate) fn parse_header<'a>(input: &mut &'a [u8], size: usize) -> PResult<&'a [u8]> {
    if input.len() < size {
        return Err(cut());
    }
    take(size).parse_next(input)
}

/// Parse one attribute and return `(type, payload)`.
///
/// The type has the nested and byte-order flags masked off, and trailing
/// alignment padding is consumed.
pub(crate) fn parse_attr<'a>(input: &mut &'a [u8]) -> PResult<(u16, &'a [u8])> {
    let (attr_type, payload) = parse_attr_raw(input)?;
    Ok((attr_type & NLA_TYPE_MASK, payload))
}

/// Like [`parse_attr`], but the type keeps its flag bits.
pub(crate) fn parse_attr_raw<'a>(input: &mut &'a [u8]) -> PResult<(u16, &'a [u8])> {
    let header: &[u8] = take(NLA_HDRLEN).parse_next(input)?;
    let len = u16::from_ne_bytes([header[0], header[1]]) as usize;
    let attr_type = u16::from_ne_bytes([header[2], header[3]]);

    if len < NLA_HDRLEN || input.len() < len - NLA_HDRLEN {
        return Err(cut());
    }

    let payload: &[u8] = take(len - NLA_HDRLEN).parse_next(input)?;

    let padding = (nla_align(len) - len).min(input.len());
    let _: &[u8] = take(padding).parse_next(input)?;

    Ok((attr_type, payload))
}

/// Parse a string from a fixed-size buffer (null-terminated).
pub fn parse_string_from_bytes(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

/// Parse a native-endian u32 attribute payload.
pub(crate) fn parse_u32(data: &[u8]) -> Option<u32> {
    data.get(..4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_ne_bytes)
}

/// Parse an IP address based on address family.
pub fn parse_ip_addr(data: &[u8], family: u8) -> Result<IpAddr> {
    match family as i32 {
        libc::AF_INET => {
            let octets: [u8; 4] = data
                .get(..4)
                .and_then(|b| b.try_into().ok())
                .ok_or(Error::Truncated {
                    expected: 4,
                    actual: data.len(),
                })?;
            Ok(IpAddr::V4(Ipv4Addr::from(octets)))
        }
        libc::AF_INET6 => {
            let octets: [u8; 16] = data
                .get(..16)
                .and_then(|b| b.try_into().ok())
                .ok_or(Error::Truncated {
                    expected: 16,
                    actual: data.len(),
                })?;
            Ok(IpAddr::V6(Ipv6Addr::from(octets)))
        }
        other => Err(Error::InvalidAttribute(format!(
            "unsupported address family: {}",
            other
        ))),
    }
}

/// Address family constant for an IP address.
pub fn family_of(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => libc::AF_INET as u8,
        IpAddr::V6(_) => libc::AF_INET6 as u8,
    }
}

/// Size of an attribute with the given payload, including padding.
pub(crate) fn nla_size(payload_len: usize) -> usize {
    nla_align(NLA_HDRLEN + payload_len)
}

/// Write a raw attribute.
pub(crate) fn write_attr_bytes(buf: &mut Vec<u8>, attr_type: u16, data: &[u8]) {
    let attr = NlAttr::new(attr_type, data.len());
    buf.extend_from_slice(attr.as_bytes());
    buf.extend_from_slice(data);
    buf.resize(nla_align(buf.len()), 0);
}

/// Write an IP address attribute.
pub(crate) fn write_attr_ip(buf: &mut Vec<u8>, attr_type: u16, addr: &IpAddr) {
    match addr {
        IpAddr::V4(v4) => write_attr_bytes(buf, attr_type, &v4.octets()),
        IpAddr::V6(v6) => write_attr_bytes(buf, attr_type, &v6.octets()),
    }
}

/// Write a native-endian u32 attribute.
pub(crate) fn write_attr_u32(buf: &mut Vec<u8>, attr_type: u16, value: u32) {
    write_attr_bytes(buf, attr_type, &value.to_ne_bytes());
}

/// Write a null-terminated string attribute.
pub(crate) fn write_attr_str(buf: &mut Vec<u8>, attr_type: u16, value: &str) {
    let mut data = Vec::with_capacity(value.len() + 1);
    data.extend_from_slice(value.as_bytes());
    data.push(0);
    write_attr_bytes(buf, attr_type, &data);
}
