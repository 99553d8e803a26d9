//! In-memory kernel used by the unit tests of this module.

use std::cell::{Ref, RefCell, RefMut};

use super::rtnl::Rtnl;
use crate::netlink::link::{LinkConfig, VrfLink};
use crate::netlink::messages::{
    AddressMessage, LinkMessage, LinkMessageBuilder, LinkType, RouteMessage, RouteMessageBuilder,
};
use crate::netlink::types::addr::Scope;
use crate::netlink::types::link::iff;
use crate::netlink::types::route::{RouteScope, RouteType};
use crate::netlink::{Error, Result};

/// A kernel request that changed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mutation {
    AddVrf { name: String, table: u32 },
    SetUp(u32),
    SetMaster(u32, u32),
    SetNoMaster(u32),
    AddAddress(AddressMessage),
    ReplaceRoute(RouteMessage),
}

/// Which request an injected failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    AddVrf,
    SetUp,
    SetMaster,
    AddAddress,
    ReplaceRoute,
}

#[derive(Debug, Default)]
pub(crate) struct State {
    pub links: Vec<LinkMessage>,
    pub addresses: Vec<AddressMessage>,
    pub routes: Vec<RouteMessage>,
    pub mutations: Vec<Mutation>,
    /// Drop universe-scoped IPv6 addresses when a link gets a master.
    pub drop_global_v6_on_enslave: bool,
    /// Number of route dumps after which the host route of an added address
    /// becomes visible. `None` never installs it.
    pub host_route_delay: Option<usize>,
    /// Fail the given request with the given errno.
    pub fail: Option<(Op, i32)>,
    pub route_dumps: usize,
    pending: Vec<(usize, RouteMessage)>,
}

impl State {
    fn check(&self, op: Op) -> Result<()> {
        match self.fail {
            Some((failing, errno)) if failing == op => Err(Error::from_errno(-errno)),
            _ => Ok(()),
        }
    }

    fn link_mut(&mut self, index: u32) -> Result<&mut LinkMessage> {
        self.links
            .iter_mut()
            .find(|l| l.ifindex() == index)
            .ok_or(Error::from_errno(-libc::ENODEV))
    }

    fn vrf_table_of(&self, index: u32) -> Option<u32> {
        let master = self.links.iter().find(|l| l.ifindex() == index)?.master()?;
        match self.links.iter().find(|l| l.ifindex() == master)?.link_type() {
            LinkType::Vrf { table } => table,
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeKernel {
    state: RefCell<State>,
}

impl FakeKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Ref<'_, State> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, State> {
        self.state.borrow_mut()
    }

    pub fn insert_link(&self, link: LinkMessage) {
        self.state.borrow_mut().links.push(link);
    }

    pub fn insert_address(&self, addr: AddressMessage) {
        self.state.borrow_mut().addresses.push(addr);
    }

    pub fn insert_route(&self, route: RouteMessage) {
        self.state.borrow_mut().routes.push(route);
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.borrow().mutations.clone()
    }

    pub fn link(&self, name: &str) -> Option<LinkMessage> {
        self.state
            .borrow()
            .links
            .iter()
            .find(|l| l.name() == Some(name))
            .cloned()
    }

    pub fn device(index: u32, name: &str) -> LinkMessageBuilder {
        LinkMessageBuilder::new().ifindex(index).name(name)
    }

    pub fn vrf(index: u32, name: &str, table: u32) -> LinkMessage {
        Self::device(index, name).vrf(table).flags(iff::UP).build()
    }

    pub fn global_v6(index: u32, addr: &str, len: u8) -> AddressMessage {
        AddressMessage::new(index, addr.parse().expect("valid address"), len)
            .with_scope(Scope::Universe)
    }

    pub fn host_route(index: u32, addr: &str, table: u32) -> RouteMessage {
        let addr: std::net::IpAddr = addr.parse().expect("valid address");
        let len = if addr.is_ipv6() { 128 } else { 32 };
        RouteMessageBuilder::new(addr, len)
            .oif(index)
            .route_type(RouteType::Local)
            .scope(RouteScope::Host)
            .table(table)
            .build()
    }
}

impl Rtnl for FakeKernel {
    async fn links(&self) -> Result<Vec<LinkMessage>> {
        Ok(self.state.borrow().links.clone())
    }

    async fn add_vrf(&self, vrf: &VrfLink) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.check(Op::AddVrf)?;
        if state.links.iter().any(|l| l.name() == Some(vrf.name())) {
            return Err(Error::from_errno(-libc::EEXIST));
        }
        let index = state.links.iter().map(|l| l.ifindex()).max().unwrap_or(0) + 1;
        state
            .links
            .push(Self::device(index, vrf.name()).vrf(vrf.table()).build());
        state.mutations.push(Mutation::AddVrf {
            name: vrf.name().to_string(),
            table: vrf.table(),
        });
        Ok(())
    }

    async fn set_link_up(&self, index: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.check(Op::SetUp)?;
        let link = state.link_mut(index)?;
        link.header.ifi_flags |= iff::UP;
        state.mutations.push(Mutation::SetUp(index));
        Ok(())
    }

    async fn set_master(&self, index: u32, master: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.check(Op::SetMaster)?;
        state.link_mut(master)?;
        state.link_mut(index)?.master = Some(master);
        if state.drop_global_v6_on_enslave {
            state.addresses.retain(|a| {
                !(a.ifindex() == index && a.is_ipv6() && a.scope() == Scope::Universe)
            });
        }
        state.routes.retain(|r| r.oif() != Some(index));
        state.mutations.push(Mutation::SetMaster(index, master));
        Ok(())
    }

    async fn set_nomaster(&self, index: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.link_mut(index)?.master = None;
        state.mutations.push(Mutation::SetNoMaster(index));
        Ok(())
    }

    async fn addresses(&self, index: u32) -> Result<Vec<AddressMessage>> {
        Ok(self
            .state
            .borrow()
            .addresses
            .iter()
            .filter(|a| a.ifindex() == index)
            .cloned()
            .collect())
    }

    async fn add_address(&self, addr: &AddressMessage) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.check(Op::AddAddress)?;
        let exists = state.addresses.iter().any(|a| {
            a.ifindex() == addr.ifindex()
                && a.primary_address() == addr.primary_address()
                && a.prefix_len() == addr.prefix_len()
        });
        if exists {
            return Err(Error::from_errno(-libc::EEXIST));
        }
        state.addresses.push(addr.clone());

        if let (Some(delay), Some(ip)) = (state.host_route_delay, addr.primary_address()) {
            let table = state.vrf_table_of(addr.ifindex()).unwrap_or(255);
            let route = Self::host_route(addr.ifindex(), &ip.to_string(), table);
            let ready_at = state.route_dumps + delay;
            state.pending.push((ready_at, route));
        }

        state.mutations.push(Mutation::AddAddress(addr.clone()));
        Ok(())
    }

    async fn routes(&self) -> Result<Vec<RouteMessage>> {
        let mut state = self.state.borrow_mut();
        state.route_dumps += 1;
        let now = state.route_dumps;
        let (ready, waiting): (Vec<_>, Vec<_>) =
            state.pending.drain(..).partition(|(at, _)| *at <= now);
        state.pending = waiting;
        state.routes.extend(ready.into_iter().map(|(_, r)| r));
        Ok(state.routes.clone())
    }

    async fn replace_route(&self, route: &RouteMessage) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.check(Op::ReplaceRoute)?;
        state.routes.retain(|r| {
            !(r.destination() == route.destination()
                && r.dst_len() == route.dst_len()
                && r.table_id() == route.table_id())
        });
        state.routes.push(route.clone());
        state.mutations.push(Mutation::ReplaceRoute(route.clone()));
        Ok(())
    }
}
