//! Strongly-typed route message.

use std::net::IpAddr;

use zerocopy::IntoBytes;

use crate::netlink::attr::{NLA_F_NESTED, NLA_TYPE_MASK};
use crate::netlink::error::Result;
use crate::netlink::parse::{
    FromNetlink, PResult, ToNetlink, cut, nla_size, parse_attr_raw, parse_header, parse_ip_addr,
    parse_u32, write_attr_bytes, write_attr_ip, write_attr_u32,
};
use crate::netlink::types::route::{RouteScope, RouteType, RtMsg, RtaAttr, rt_table, rtax};

/// Route metrics (RTA_METRICS).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMetrics {
    /// Path MTU
    pub mtu: Option<u32>,
    /// Advertised MSS
    pub advmss: Option<u32>,
    /// Window size
    pub window: Option<u32>,
    /// RTT in milliseconds
    pub rtt: Option<u32>,
    /// RTT variance
    pub rttvar: Option<u32>,
    /// Slow-start threshold
    pub ssthresh: Option<u32>,
    /// Congestion window
    pub cwnd: Option<u32>,
    /// Initial congestion window
    pub initcwnd: Option<u32>,
    /// Initial receive window
    pub initrwnd: Option<u32>,
    /// Hop limit
    pub hoplimit: Option<u32>,
    /// RTO minimum
    pub rto_min: Option<u32>,
    /// Quick ACK
    pub quickack: Option<u32>,
    /// Reordering
    pub reordering: Option<u32>,
    /// Features
    pub features: Option<u32>,
    /// Metrics without a field above (e.g. RTAX_CC_ALGO), kept verbatim.
    pub(crate) other: Vec<(u16, Vec<u8>)>,
}

impl RouteMetrics {
    /// Create empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set path MTU.
    pub fn mtu(mut self, mtu: u32) -> Self {
        self.mtu = Some(mtu);
        self
    }

    /// Set advertised MSS.
    pub fn advmss(mut self, advmss: u32) -> Self {
        self.advmss = Some(advmss);
        self
    }

    /// Set hop limit.
    pub fn hoplimit(mut self, hoplimit: u32) -> Self {
        self.hoplimit = Some(hoplimit);
        self
    }

    fn values(&self) -> [(u16, Option<u32>); 14] {
        [
            (rtax::MTU, self.mtu),
            (rtax::WINDOW, self.window),
            (rtax::RTT, self.rtt),
            (rtax::RTTVAR, self.rttvar),
            (rtax::SSTHRESH, self.ssthresh),
            (rtax::CWND, self.cwnd),
            (rtax::ADVMSS, self.advmss),
            (rtax::REORDERING, self.reordering),
            (rtax::HOPLIMIT, self.hoplimit),
            (rtax::INITCWND, self.initcwnd),
            (rtax::FEATURES, self.features),
            (rtax::RTO_MIN, self.rto_min),
            (rtax::INITRWND, self.initrwnd),
            (rtax::QUICKACK, self.quickack),
        ]
    }

    fn slot_mut(&mut self, kind: u16) -> Option<&mut Option<u32>> {
        Some(match kind {
            rtax::MTU => &mut self.mtu,
            rtax::WINDOW => &mut self.window,
            rtax::RTT => &mut self.rtt,
            rtax::RTTVAR => &mut self.rttvar,
            rtax::SSTHRESH => &mut self.ssthresh,
            rtax::CWND => &mut self.cwnd,
            rtax::ADVMSS => &mut self.advmss,
            rtax::REORDERING => &mut self.reordering,
            rtax::HOPLIMIT => &mut self.hoplimit,
            rtax::INITCWND => &mut self.initcwnd,
            rtax::FEATURES => &mut self.features,
            rtax::RTO_MIN => &mut self.rto_min,
            rtax::INITRWND => &mut self.initrwnd,
            rtax::QUICKACK => &mut self.quickack,
            _ => return None,
        })
    }

    /// Check if any metrics are set.
    pub fn has_any(&self) -> bool {
        self.values().iter().any(|(_, v)| v.is_some()) || !self.other.is_empty()
    }

    fn parse(mut input: &[u8]) -> Self {
        let mut metrics = Self::default();
        while input.len() >= 4 {
            let Ok((kind, payload)) = parse_attr_raw(&mut input) else {
                break;
            };
            if let (Some(value), Some(slot)) =
                (parse_u32(payload), metrics.slot_mut(kind & NLA_TYPE_MASK))
            {
                *slot = Some(value);
                continue;
            }
            metrics.other.push((kind, payload.to_vec()));
        }
        metrics
    }

    fn payload_len(&self) -> usize {
        let known = self.values().iter().filter(|(_, v)| v.is_some()).count() * nla_size(4);
        known + self.other.iter().map(|(_, d)| nla_size(d.len())).sum::<usize>()
    }

    /// Write metrics as nested attribute.
    fn write_to(&self, buf: &mut Vec<u8>) {
        let mut nested = Vec::with_capacity(self.payload_len());
        for (kind, value) in self.values() {
            if let Some(v) = value {
                write_attr_u32(&mut nested, kind, v);
            }
        }
        for (kind, data) in &self.other {
            write_attr_bytes(&mut nested, *kind, data);
        }
        write_attr_bytes(buf, RtaAttr::Metrics as u16 | NLA_F_NESTED, &nested);
    }
}

/// Attributes the kernel reports but does not accept back.
fn is_report_only(kind: u16) -> bool {
    [RtaAttr::CacheInfo, RtaAttr::MfcStats, RtaAttr::Pad]
        .iter()
        .any(|a| *a as u16 == kind)
}

/// Strongly-typed route message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMessage {
    /// Fixed-size header.
    pub(crate) header: RtMsg,
    /// Destination address (RTA_DST).
    pub(crate) destination: Option<IpAddr>,
    /// Source selector (RTA_SRC).
    pub(crate) source: Option<IpAddr>,
    /// Output interface index (RTA_OIF).
    pub(crate) oif: Option<u32>,
    /// Gateway address (RTA_GATEWAY).
    pub(crate) gateway: Option<IpAddr>,
    /// Priority/metric (RTA_PRIORITY).
    pub(crate) priority: Option<u32>,
    /// Preferred source address (RTA_PREFSRC).
    pub(crate) prefsrc: Option<IpAddr>,
    /// Routing table ID (RTA_TABLE).
    pub(crate) table: Option<u32>,
    /// Router preference (RTA_PREF, IPv6).
    pub(crate) pref: Option<u8>,
    /// Route metrics (RTA_METRICS).
    pub(crate) metrics: Option<RouteMetrics>,
    /// Other attributes (multipath, encap, expires, ...), kept verbatim with
    /// their flag bits so the route can be written back unchanged.
    pub(crate) extra: Vec<(u16, Vec<u8>)>,
}

impl RouteMessage {
    /// Create a new empty route message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the address family.
    pub fn family(&self) -> u8 {
        self.header.rtm_family
    }

    /// Get the destination prefix length.
    pub fn dst_len(&self) -> u8 {
        self.header.rtm_dst_len
    }

    /// Get the route type.
    pub fn route_type(&self) -> RouteType {
        RouteType::from(self.header.rtm_type)
    }

    /// Get the raw protocol (RTPROT_*).
    pub fn protocol(&self) -> u8 {
        self.header.rtm_protocol
    }

    /// Get the raw scope (RT_SCOPE_*).
    pub fn scope(&self) -> u8 {
        self.header.rtm_scope
    }

    /// Check the route scope.
    pub fn has_scope(&self, scope: RouteScope) -> bool {
        self.header.rtm_scope == scope as u8
    }

    /// Get the routing table ID.
    pub fn table_id(&self) -> u32 {
        self.table.unwrap_or(self.header.rtm_table as u32)
    }

    /// Move the route to another routing table.
    ///
    /// Tables that do not fit `rtm_table` are carried in RTA_TABLE only.
    pub fn set_table(&mut self, table: u32) {
        self.header.rtm_table = if table < 256 {
            table as u8
        } else {
            rt_table::COMPAT as u8
        };
        self.table = Some(table);
    }

    /// Get the destination address.
    pub fn destination(&self) -> Option<&IpAddr> {
        self.destination.as_ref()
    }

    /// Get the output interface index.
    pub fn oif(&self) -> Option<u32> {
        self.oif
    }

    /// Get the gateway address.
    pub fn gateway(&self) -> Option<&IpAddr> {
        self.gateway.as_ref()
    }

    /// Get the priority/metric.
    pub fn priority(&self) -> Option<u32> {
        self.priority
    }

    /// Get the preferred source address.
    pub fn prefsrc(&self) -> Option<&IpAddr> {
        self.prefsrc.as_ref()
    }

    /// Get the route metrics.
    pub fn metrics(&self) -> Option<&RouteMetrics> {
        self.metrics.as_ref()
    }
}

impl std::fmt::Display for RouteMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.destination {
            Some(dst) => write!(f, "{}/{}", dst, self.dst_len())?,
            None => write!(f, "default")?,
        }
        if let Some(gw) = self.gateway {
            write!(f, " via {}", gw)?;
        }
        if let Some(oif) = self.oif {
            write!(f, " oif {}", oif)?;
        }
        if let Some(src) = self.prefsrc {
            write!(f, " src {}", src)?;
        }
        write!(f, " table {}", self.table_id())
    }
}

impl FromNetlink for RouteMessage {
    fn write_dump_header(buf: &mut Vec<u8>) {
        buf.extend_from_slice(RtMsg::new().as_bytes());
    }

    fn parse(input: &mut &[u8]) -> PResult<Self> {
        let header_bytes = parse_header(input, RtMsg::SIZE)?;
        let header = RtMsg::from_bytes(header_bytes).map_err(|_| cut())?;

        let mut msg = RouteMessage {
            header,
            ..Default::default()
        };

        while input.len() >= 4 {
            let Ok((raw_type, payload)) = parse_attr_raw(input) else {
                break;
            };
            let attr_type = raw_type & NLA_TYPE_MASK;

            match attr_type {
                t if t == RtaAttr::Dst as u16 => {
                    msg.destination = parse_ip_addr(payload, header.rtm_family).ok();
                }
                t if t == RtaAttr::Src as u16 => {
                    msg.source = parse_ip_addr(payload, header.rtm_family).ok();
                }
                t if t == RtaAttr::Oif as u16 => {
                    msg.oif = parse_u32(payload);
                }
                t if t == RtaAttr::Gateway as u16 => {
                    msg.gateway = parse_ip_addr(payload, header.rtm_family).ok();
                }
                t if t == RtaAttr::Priority as u16 => {
                    msg.priority = parse_u32(payload);
                }
                t if t == RtaAttr::Prefsrc as u16 => {
                    msg.prefsrc = parse_ip_addr(payload, header.rtm_family).ok();
                }
                t if t == RtaAttr::Table as u16 => {
                    msg.table = parse_u32(payload);
                }
                t if t == RtaAttr::Pref as u16 => {
                    msg.pref = payload.first().copied();
                }
                t if t == RtaAttr::Metrics as u16 => {
                    msg.metrics = Some(RouteMetrics::parse(payload));
                }
                t if is_report_only(t) => {}
                _ => msg.extra.push((raw_type, payload.to_vec())),
            }
        }

        Ok(msg)
    }
}

impl ToNetlink for RouteMessage {
    fn netlink_len(&self) -> usize {
        let addr_len = if self.family() == libc::AF_INET6 as u8 {
            16
        } else {
            4
        };
        let mut len = RtMsg::SIZE;
        for addr in [
            &self.destination,
            &self.source,
            &self.gateway,
            &self.prefsrc,
        ] {
            if addr.is_some() {
                len += nla_size(addr_len);
            }
        }
        for value in [&self.oif, &self.priority, &self.table] {
            if value.is_some() {
                len += nla_size(4);
            }
        }
        if self.pref.is_some() {
            len += nla_size(1);
        }
        if let Some(ref metrics) = self.metrics
            && metrics.has_any()
        {
            len += nla_size(metrics.payload_len());
        }
        len + self.extra.iter().map(|(_, d)| nla_size(d.len())).sum::<usize>()
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<usize> {
        let start = buf.len();

        buf.extend_from_slice(self.header.as_bytes());

        if let Some(ref dst) = self.destination {
            write_attr_ip(buf, RtaAttr::Dst as u16, dst);
        }
        if let Some(ref src) = self.source {
            write_attr_ip(buf, RtaAttr::Src as u16, src);
        }
        if let Some(oif) = self.oif {
            write_attr_u32(buf, RtaAttr::Oif as u16, oif);
        }
        if let Some(ref gw) = self.gateway {
            write_attr_ip(buf, RtaAttr::Gateway as u16, gw);
        }
        if let Some(priority) = self.priority {
            write_attr_u32(buf, RtaAttr::Priority as u16, priority);
        }
        if let Some(ref prefsrc) = self.prefsrc {
            write_attr_ip(buf, RtaAttr::Prefsrc as u16, prefsrc);
        }
        if let Some(table) = self.table {
            write_attr_u32(buf, RtaAttr::Table as u16, table);
        }
        if let Some(pref) = self.pref {
            write_attr_bytes(buf, RtaAttr::Pref as u16, &[pref]);
        }
        if let Some(ref metrics) = self.metrics
            && metrics.has_any()
        {
            metrics.write_to(buf);
        }
        for (kind, data) in &self.extra {
            write_attr_bytes(buf, *kind, data);
        }

        Ok(buf.len() - start)
    }
}

/// Builder for constructing RouteMessage values.
#[derive(Debug, Clone, Default)]
pub struct RouteMessageBuilder {
    msg: RouteMessage,
}

impl RouteMessageBuilder {
    /// Start a unicast route to `dst/dst_len`.
    pub fn new(dst: IpAddr, dst_len: u8) -> Self {
        let mut msg = RouteMessage::new();
        msg.header.rtm_family = crate::netlink::parse::family_of(&dst);
        msg.header.rtm_dst_len = dst_len;
        msg.header.rtm_type = RouteType::Unicast as u8;
        msg.header.rtm_table = rt_table::MAIN as u8;
        msg.destination = Some(dst);
        Self { msg }
    }

    /// Set the output interface.
    pub fn oif(mut self, oif: u32) -> Self {
        self.msg.oif = Some(oif);
        self
    }

    /// Set the gateway.
    pub fn gateway(mut self, gw: IpAddr) -> Self {
        self.msg.gateway = Some(gw);
        self
    }

    /// Set the preferred source address.
    pub fn prefsrc(mut self, src: IpAddr) -> Self {
        self.msg.prefsrc = Some(src);
        self
    }

    /// Set the scope.
    pub fn scope(mut self, scope: RouteScope) -> Self {
        self.msg.header.rtm_scope = scope as u8;
        self
    }

    /// Set the route type.
    pub fn route_type(mut self, route_type: RouteType) -> Self {
        self.msg.header.rtm_type = route_type as u8;
        self
    }

    /// Set the protocol.
    pub fn protocol(mut self, protocol: u8) -> Self {
        self.msg.header.rtm_protocol = protocol;
        self
    }

    /// Set the metric.
    pub fn priority(mut self, priority: u32) -> Self {
        self.msg.priority = Some(priority);
        self
    }

    /// Set the route metrics.
    pub fn metrics(mut self, metrics: RouteMetrics) -> Self {
        self.msg.metrics = Some(metrics);
        self
    }

    /// Set the routing table.
    pub fn table(mut self, table: u32) -> Self {
        self.msg.set_table(table);
        self
    }

    /// Build the message.
    pub fn build(self) -> RouteMessage {
        self.msg
    }
}
