//! Strongly-typed link message.

use crate::netlink::attr::AttrIter;
use crate::netlink::parse::{
    FromNetlink, PResult, parse_attr, parse_header, parse_string_from_bytes, parse_u32,
};
use crate::netlink::types::link::{IfInfoMsg, IflaAttr, IflaInfo, iff, vrf};

/// Strongly-typed link message with the attributes this crate needs.
#[derive(Debug, Clone, Default)]
pub struct LinkMessage {
    /// Fixed-size header.
    pub(crate) header: IfInfoMsg,
    /// Interface name (IFLA_IFNAME).
    pub(crate) name: Option<String>,
    /// MTU (IFLA_MTU).
    pub(crate) mtu: Option<u32>,
    /// Master device index (IFLA_MASTER).
    pub(crate) master: Option<u32>,
    /// Link info (IFLA_LINKINFO).
    pub(crate) link_info: Option<LinkInfo>,
}

/// Link type information from IFLA_LINKINFO.
#[derive(Debug, Clone, Default)]
pub struct LinkInfo {
    /// Link type kind (e.g., "vrf", "bridge", "bond").
    pub(crate) kind: Option<String>,
    /// Slave kind when enslaved (e.g., "vrf").
    pub(crate) slave_kind: Option<String>,
    /// Raw type-specific data (IFLA_INFO_DATA).
    pub(crate) data: Option<Vec<u8>>,
}

impl LinkInfo {
    /// Get the link type kind.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Get the slave kind.
    pub fn slave_kind(&self) -> Option<&str> {
        self.slave_kind.as_deref()
    }

    /// Get the raw type-specific data.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }
}

/// Kernel link type, discriminated by IFLA_INFO_KIND.
///
/// This is a closed set: kinds the crate has no special handling for end up
/// in [`LinkType::Other`], and links without a kind (physical NICs, loopback)
/// are [`LinkType::Device`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkType {
    /// VRF master device and its routing table.
    Vrf {
        /// IFLA_VRF_TABLE; `None` if the kernel omitted it.
        table: Option<u32>,
    },
    Bridge,
    Bond,
    Veth,
    Dummy,
    /// Any other virtual link kind.
    Other(String),
    /// A link without IFLA_INFO_KIND.
    Device,
}

impl LinkMessage {
    /// Create a new empty link message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the interface index.
    pub fn ifindex(&self) -> u32 {
        self.header.ifi_index as u32
    }

    /// Get the interface name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the interface name or a default value.
    pub fn name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(default)
    }

    /// Get the MTU.
    pub fn mtu(&self) -> Option<u32> {
        self.mtu
    }

    /// Get the master device index.
    ///
    /// The kernel reports "no master" either by omitting IFLA_MASTER or by
    /// sending 0; both map to `None`.
    pub fn master(&self) -> Option<u32> {
        self.master.filter(|&m| m != 0)
    }

    /// Get the link info.
    pub fn link_info(&self) -> Option<&LinkInfo> {
        self.link_info.as_ref()
    }

    /// Get the link kind (e.g., "vrf").
    pub fn kind(&self) -> Option<&str> {
        self.link_info.as_ref().and_then(|i| i.kind())
    }

    /// Get the interface flags (IFF_*).
    pub fn flags(&self) -> u32 {
        self.header.ifi_flags
    }

    /// Check if the interface is administratively up.
    pub fn is_up(&self) -> bool {
        self.header.ifi_flags & iff::UP != 0
    }

    /// Classify the link by kind.
    pub fn link_type(&self) -> LinkType {
        match self.kind() {
            Some("vrf") => LinkType::Vrf {
                table: self
                    .link_info
                    .as_ref()
                    .and_then(|i| i.data())
                    .and_then(vrf_table),
            },
            Some("bridge") => LinkType::Bridge,
            Some("bond") => LinkType::Bond,
            Some("veth") => LinkType::Veth,
            Some("dummy") => LinkType::Dummy,
            Some(other) => LinkType::Other(other.to_string()),
            None => LinkType::Device,
        }
    }

    /// Check if this link is a VRF device.
    pub fn is_vrf(&self) -> bool {
        matches!(self.link_type(), LinkType::Vrf { .. })
    }
}

/// Extract IFLA_VRF_TABLE from VRF IFLA_INFO_DATA.
fn vrf_table(data: &[u8]) -> Option<u32> {
    AttrIter::new(data)
        .find(|(kind, _)| *kind == vrf::IFLA_VRF_TABLE)
        .and_then(|(_, payload)| parse_u32(payload))
}

impl FromNetlink for LinkMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        use zerocopy::IntoBytes;
        buf.extend_from_slice(IfInfoMsg::new().as_bytes());
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes = parse_header(input, IfInfoMsg::SIZE)?;
        let header =
            IfInfoMsg::from_bytes(header_bytes).map_err(|_| crate::netlink::parse::cut())?;

        let mut msg = LinkMessage {
            header,
            ..Default::default()
        };

        while input.len() >= 4 {
            let Ok((attr_type, payload)) = parse_attr(input) else {
                break;
            };

            match attr_type {
                t if t == IflaAttr::Ifname as u16 => {
                    msg.name = Some(parse_string_from_bytes(payload));
                }
                t if t == IflaAttr::Mtu as u16 => {
                    msg.mtu = parse_u32(payload);
                }
                t if t == IflaAttr::Master as u16 => {
                    msg.master = parse_u32(payload);
                }
                t if t == IflaAttr::Linkinfo as u16 => {
                    msg.link_info = Some(parse_link_info(payload));
                }
                _ => {}
            }
        }

        Ok(msg)
    }
}

fn parse_link_info(data: &[u8]) -> LinkInfo {
    let mut info = LinkInfo::default();

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == IflaInfo::Kind as u16 => {
                info.kind = Some(parse_string_from_bytes(payload));
            }
            t if t == IflaInfo::Data as u16 => {
                info.data = Some(payload.to_vec());
            }
            t if t == IflaInfo::SlaveKind as u16 => {
                info.slave_kind = Some(parse_string_from_bytes(payload));
            }
            _ => {}
        }
    }

    info
}

/// Builder for constructing LinkMessage values, mostly for tests and fakes.
#[derive(Debug, Clone, Default)]
pub struct LinkMessageBuilder {
    msg: LinkMessage,
}

impl LinkMessageBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interface index.
    pub fn ifindex(mut self, index: u32) -> Self {
        self.msg.header.ifi_index = index as i32;
        self
    }

    /// Set the interface flags.
    pub fn flags(mut self, flags: u32) -> Self {
        self.msg.header.ifi_flags = flags;
        self
    }

    /// Set the interface name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.msg.name = Some(name.into());
        self
    }

    /// Set the master device index.
    pub fn master(mut self, master: u32) -> Self {
        self.msg.master = Some(master);
        self
    }

    /// Set the link kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.msg.link_info.get_or_insert_with(LinkInfo::default).kind = Some(kind.into());
        self
    }

    /// Make this a VRF device bound to `table`.
    pub fn vrf(mut self, table: u32) -> Self {
        let mut data = Vec::new();
        crate::netlink::parse::write_attr_u32(&mut data, vrf::IFLA_VRF_TABLE, table);
        self.msg.link_info = Some(LinkInfo {
            kind: Some("vrf".to_string()),
            slave_kind: None,
            data: Some(data),
        });
        self
    }

    /// Build the message.
    pub fn build(self) -> LinkMessage {
        self.msg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::NLA_F_NESTED;
    use crate::netlink::parse::{write_attr_bytes, write_attr_str, write_attr_u32};
    use zerocopy::IntoBytes;

    fn vrf_payload(index: u32, name: &str, table: u32) -> Vec<u8> {
        let mut buf = IfInfoMsg::new().with_index(index).as_bytes().to_vec();
        write_attr_str(&mut buf, IflaAttr::Ifname as u16, name);

        let mut data = Vec::new();
        write_attr_u32(&mut data, vrf::IFLA_VRF_TABLE, table);
        let mut info = Vec::new();
        write_attr_str(&mut info, IflaInfo::Kind as u16, "vrf");
        write_attr_bytes(&mut info, IflaInfo::Data as u16 | NLA_F_NESTED, &data);
        write_attr_bytes(&mut buf, IflaAttr::Linkinfo as u16 | NLA_F_NESTED, &info);
        buf
    }

    #[test]
    fn test_parse_vrf_link() {
        let payload = vrf_payload(5, "vrf-blue", 1001);
        let msg = LinkMessage::from_bytes(&payload).unwrap();

        assert_eq!(msg.ifindex(), 5);
        assert_eq!(msg.name(), Some("vrf-blue"));
        assert_eq!(msg.kind(), Some("vrf"));
        assert_eq!(msg.link_type(), LinkType::Vrf { table: Some(1001) });
        assert!(msg.is_vrf());
    }

    #[test]
    fn test_parse_plain_device_with_master() {
        let mut buf = IfInfoMsg::new().with_index(3).as_bytes().to_vec();
        write_attr_str(&mut buf, IflaAttr::Ifname as u16, "eth1");
        write_attr_u32(&mut buf, IflaAttr::Master as u16, 5);

        let msg = LinkMessage::from_bytes(&buf).unwrap();
        assert_eq!(msg.master(), Some(5));
        assert_eq!(msg.link_type(), LinkType::Device);
    }

    #[test]
    fn test_zero_master_means_none() {
        let msg = LinkMessageBuilder::new().ifindex(2).master(0).build();
        assert_eq!(msg.master(), None);
    }

    #[test]
    fn test_truncated_header() {
        assert!(LinkMessage::from_bytes(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_builder_kinds() {
        let bridge = LinkMessageBuilder::new().name("br0").kind("bridge").build();
        assert_eq!(bridge.link_type(), LinkType::Bridge);

        let vxlan = LinkMessageBuilder::new().kind("vxlan").build();
        assert_eq!(vxlan.link_type(), LinkType::Other("vxlan".into()));

        let vrf = LinkMessageBuilder::new().vrf(7).flags(iff::UP).build();
        assert_eq!(vrf.link_type(), LinkType::Vrf { table: Some(7) });
        assert!(vrf.is_up());
    }
}
