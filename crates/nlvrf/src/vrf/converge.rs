//! Waiting for the kernel to re-install the host route of a restored address.

use std::net::IpAddr;
use std::time::Duration;

use super::rtnl::Rtnl;
use super::snapshot::Prefix;
use crate::netlink::messages::RouteMessage;
use crate::netlink::{Error, Result};

/// Delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(10);

/// Retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Polls the route table with exponential backoff until the host route of an
/// address shows up in a VRF table.
///
/// With the defaults this makes 9 attempts, sleeping 10, 20, ... 1280 ms
/// between them. Sleeps are `tokio` timers, so dropping the future cancels
/// the wait. An optional [`deadline`](Self::deadline) bounds the whole wait.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use nlvrf::vrf::ConvergenceWaiter;
///
/// let waiter = ConvergenceWaiter::new().deadline(Duration::from_secs(1));
/// waiter.wait(&conn, "eth1", 4, 100, "2001:db8::10".parse()?).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ConvergenceWaiter {
    base: Duration,
    max_retries: u32,
    deadline: Option<Duration>,
}

impl Default for ConvergenceWaiter {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            deadline: None,
        }
    }
}

impl ConvergenceWaiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay before the first retry; later retries double it.
    pub fn base_delay(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    /// Set the number of retries after the initial attempt.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Bound the whole wait; exceeding it fails with [`Error::Timeout`].
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sleep before retry `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(retry))
    }

    /// Sum of all sleeps when every attempt misses.
    pub fn total_backoff(&self) -> Duration {
        (0..self.max_retries).map(|n| self.delay_for(n)).sum()
    }

    /// Wait until `addr` has a host route via `ifindex` in `table`.
    pub async fn wait<K: Rtnl>(
        &self,
        kernel: &K,
        interface: &str,
        ifindex: u32,
        table: u32,
        addr: IpAddr,
    ) -> Result<()> {
        let poll = self.poll(kernel, interface, ifindex, table, addr);
        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, poll)
                .await
                .map_err(|_| Error::Timeout(deadline))?,
            None => poll.await,
        }
    }

    async fn poll<K: Rtnl>(
        &self,
        kernel: &K,
        interface: &str,
        ifindex: u32,
        table: u32,
        addr: IpAddr,
    ) -> Result<()> {
        let host = Prefix::host(addr);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.delay_for(attempt - 1)).await;
            }

            let routes = kernel.routes().await?;
            if routes.iter().any(|r| is_host_route(r, host, table, ifindex)) {
                tracing::debug!(%host, table, attempt, "host route installed");
                return Ok(());
            }
            tracing::debug!(%host, table, attempt, "host route not installed yet");
        }

        Err(Error::ConvergenceTimeout {
            interface: interface.to_string(),
            table,
            destination: host.addr,
            prefix_len: host.len,
        })
    }
}

fn is_host_route(route: &RouteMessage, host: Prefix, table: u32, ifindex: u32) -> bool {
    route.destination() == Some(&host.addr)
        && route.dst_len() == host.len
        && route.table_id() == table
        && route.oif() == Some(ifindex)
}
