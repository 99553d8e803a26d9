//! Route management.

use super::connection::{Connection, replace_request};
use super::error::Result;
use super::message::NlMsgType;
use super::messages::RouteMessage;
use super::parse::ToNetlink;

impl Connection {
    /// Install a route, replacing any route with the same key.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use nlvrf::netlink::messages::RouteMessageBuilder;
    ///
    /// let route = RouteMessageBuilder::new("2001:db8::".parse()?, 64)
    ///     .oif(4)
    ///     .table(100)
    ///     .build();
    /// conn.replace_route(&route).await?;
    /// ```
    pub async fn replace_route(&self, route: &RouteMessage) -> Result<()> {
        let mut builder = replace_request(NlMsgType::RTM_NEWROUTE);
        builder.append_bytes(&route.to_bytes()?);

        self.request_ack(builder).await
    }
}
