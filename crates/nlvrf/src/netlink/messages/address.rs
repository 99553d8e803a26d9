//! Strongly-typed address message.

use std::net::IpAddr;

use zerocopy::IntoBytes;

use crate::netlink::error::Result;
use crate::netlink::parse::{
    FromNetlink, PResult, ToNetlink, cut, nla_size, parse_attr, parse_header, parse_ip_addr,
    parse_string_from_bytes, parse_u32, write_attr_bytes, write_attr_ip, write_attr_str,
    write_attr_u32,
};
use crate::netlink::types::addr::{IfAddrMsg, IfaAttr, IfaCacheinfo, Scope};

/// Strongly-typed address message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressMessage {
    /// Fixed-size header.
    pub(crate) header: IfAddrMsg,
    /// Address (IFA_ADDRESS). For point-to-point links this is the peer.
    pub(crate) address: Option<IpAddr>,
    /// Local address (IFA_LOCAL).
    pub(crate) local: Option<IpAddr>,
    /// Interface label (IFA_LABEL, IPv4 only).
    pub(crate) label: Option<String>,
    /// Extended flags (IFA_FLAGS).
    pub(crate) flags: Option<u32>,
    /// Lifetimes (IFA_CACHEINFO).
    pub(crate) cache_info: Option<IfaCacheinfo>,
}

impl AddressMessage {
    /// Create an address message for `addr/prefix_len` on `ifindex`.
    pub fn new(ifindex: u32, addr: IpAddr, prefix_len: u8) -> Self {
        let header = IfAddrMsg::new()
            .with_family(crate::netlink::parse::family_of(&addr))
            .with_index(ifindex);
        Self {
            header: IfAddrMsg {
                ifa_prefixlen: prefix_len,
                ..header
            },
            address: Some(addr),
            local: Some(addr),
            ..Default::default()
        }
    }

    /// Set the scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.header.ifa_scope = scope.into();
        self
    }

    /// Set the extended flags.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.header.ifa_flags = (flags & 0xff) as u8;
        self.flags = Some(flags);
        self
    }

    /// Get the address family.
    pub fn family(&self) -> u8 {
        self.header.ifa_family
    }

    /// Check if this is an IPv6 address.
    pub fn is_ipv6(&self) -> bool {
        self.header.ifa_family == libc::AF_INET6 as u8
    }

    /// Get the prefix length.
    pub fn prefix_len(&self) -> u8 {
        self.header.ifa_prefixlen
    }

    /// Get the interface index.
    pub fn ifindex(&self) -> u32 {
        self.header.ifa_index
    }

    /// Get the scope.
    pub fn scope(&self) -> Scope {
        Scope::from(self.header.ifa_scope)
    }

    /// Get the address (IFA_ADDRESS).
    pub fn address(&self) -> Option<&IpAddr> {
        self.address.as_ref()
    }

    /// Get the primary address (local, falling back to address).
    pub fn primary_address(&self) -> Option<&IpAddr> {
        self.local.as_ref().or(self.address.as_ref())
    }

    /// Get the label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get all address flags, preferring the 32-bit IFA_FLAGS.
    pub fn flags(&self) -> u32 {
        self.flags.unwrap_or(self.header.ifa_flags as u32)
    }

    /// Get the lifetimes.
    pub fn cache_info(&self) -> Option<&IfaCacheinfo> {
        self.cache_info.as_ref()
    }
}

impl FromNetlink for AddressMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(IfAddrMsg::new().as_bytes());
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes = parse_header(input, IfAddrMsg::SIZE)?;
        let header = IfAddrMsg::from_bytes(header_bytes).map_err(|_| cut())?;

        let mut msg = AddressMessage {
            header,
            ..Default::default()
        };

        while input.len() >= 4 {
            let Ok((attr_type, payload)) = parse_attr(input) else {
                break;
            };

            match attr_type {
                t if t == IfaAttr::Address as u16 => {
                    msg.address = parse_ip_addr(payload, header.ifa_family).ok();
                }
                t if t == IfaAttr::Local as u16 => {
                    msg.local = parse_ip_addr(payload, header.ifa_family).ok();
                }
                t if t == IfaAttr::Label as u16 => {
                    msg.label = Some(parse_string_from_bytes(payload));
                }
                t if t == IfaAttr::Flags as u16 => {
                    msg.flags = parse_u32(payload);
                }
                t if t == IfaAttr::Cacheinfo as u16 => {
                    msg.cache_info = IfaCacheinfo::from_bytes(payload);
                }
                _ => {}
            }
        }

        Ok(msg)
    }
}

impl ToNetlink for AddressMessage {
    fn netlink_len(&self) -> usize {
        let addr_len = if self.is_ipv6() { 16 } else { 4 };
        let mut len = IfAddrMsg::SIZE;
        if self.local.is_some() {
            len += nla_size(addr_len);
        }
        if self.address.is_some() {
            len += nla_size(addr_len);
        }
        if let Some(ref label) = self.label
            && !self.is_ipv6()
        {
            len += nla_size(label.len() + 1);
        }
        if self.flags.is_some() {
            len += nla_size(4);
        }
        if self.cache_info.is_some() {
            len += nla_size(std::mem::size_of::<IfaCacheinfo>());
        }
        len
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<usize> {
        let start = buf.len();

        buf.extend_from_slice(self.header.as_bytes());

        if let Some(ref local) = self.local {
            write_attr_ip(buf, IfaAttr::Local as u16, local);
        }
        if let Some(ref addr) = self.address {
            write_attr_ip(buf, IfaAttr::Address as u16, addr);
        }
        // The kernel rejects labels on IPv6 addresses.
        if let Some(ref label) = self.label
            && !self.is_ipv6()
        {
            write_attr_str(buf, IfaAttr::Label as u16, label);
        }
        if let Some(flags) = self.flags {
            write_attr_u32(buf, IfaAttr::Flags as u16, flags);
        }
        if let Some(ref info) = self.cache_info {
            // Creation and update stamps are kernel-owned and ignored on input.
            let lifetimes = IfaCacheinfo {
                ifa_prefered: info.ifa_prefered,
                ifa_valid: info.ifa_valid,
                cstamp: 0,
                tstamp: 0,
            };
            write_attr_bytes(buf, IfaAttr::Cacheinfo as u16, lifetimes.as_bytes());
        }

        Ok(buf.len() - start)
    }
}
