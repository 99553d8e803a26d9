//! Network namespace utilities.
//!
//! Sockets are created inside the target namespace and stay bound to it, so
//! no thread ever has to stay switched into a foreign namespace.
//!
//! # Example
//!
//! ```ignore
//! use nlvrf::netlink::namespace;
//!
//! // Get a connection for a named namespace
//! let conn = namespace::connection_for("blue")?;
//! let links = conn.get_links().await?;
//!
//! // Or use a path directly
//! let conn = namespace::connection_for_path("/proc/1234/ns/net")?;
//! ```

use std::path::{Path, PathBuf};

use super::connection::Connection;
use super::error::Result;

/// The runtime directory where named network namespaces are stored.
pub const NETNS_RUN_DIR: &str = "/var/run/netns";

/// Get a connection for a named network namespace.
///
/// Named namespaces are those created via `ip netns add <name>` and stored
/// in `/var/run/netns/`.
pub fn connection_for(name: &str) -> Result<Connection> {
    let path = PathBuf::from(NETNS_RUN_DIR).join(name);
    connection_for_path(&path)
}

/// Get a connection for a network namespace specified by path.
///
/// This works with any namespace file path, including:
/// - Named namespaces: `/var/run/netns/<name>`
/// - Process namespaces: `/proc/<pid>/ns/net`
/// - CNI-style bind mounts such as `/var/run/netns/cni-1234`
pub fn connection_for_path<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::new_in_namespace_path(path)
}

/// Get a connection for a process's network namespace.
pub fn connection_for_pid(pid: u32) -> Result<Connection> {
    let path = format!("/proc/{}/ns/net", pid);
    connection_for_path(&path)
}

/// Get a connection for a namespace given either as a name or as a path.
///
/// Anything containing a `/` is treated as a path.
pub fn connection_for_spec(spec: &str) -> Result<Connection> {
    if spec.contains('/') {
        connection_for_path(spec)
    } else {
        connection_for(spec)
    }
}

/// Check if a named namespace exists.
pub fn exists(name: &str) -> bool {
    let path = PathBuf::from(NETNS_RUN_DIR).join(name);
    path.exists()
}
