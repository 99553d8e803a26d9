//! Error types for netlink and VRF operations.

use std::io;
use std::net::IpAddr;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during netlink and VRF operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        /// The operation that failed.
        operation: String,
        /// The errno value from the kernel.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Expected message length.
        expected: usize,
        /// Actual bytes received.
        actual: usize,
    },

    /// Invalid message format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Invalid attribute format.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// A dump was interrupted by a concurrent change (NLM_F_DUMP_INTR).
    #[error("dump interrupted: kernel state changed while listing")]
    DumpInterrupted,

    /// Invalid configuration document.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Interface not found.
    #[error("interface not found: {name}")]
    InterfaceNotFound {
        /// The interface name that was not found.
        name: String,
    },

    /// Namespace not found.
    #[error("namespace not found: {name}")]
    NamespaceNotFound {
        /// The namespace name that was not found.
        name: String,
    },

    /// A link exists under this name but it is not a VRF device.
    #[error("Netlink {name} is not a VRF")]
    NotAVrf {
        /// The link name.
        name: String,
    },

    /// The interface already has a master device.
    #[error("interface {interface} has already a master set: {master}")]
    AlreadyEnslaved {
        /// The interface that was to be enslaved.
        interface: String,
        /// Name (or index) of the current master.
        master: String,
    },

    /// The interface is not enslaved to the expected VRF.
    #[error("interface {interface} is not enslaved to VRF {vrf}")]
    NotEnslaved {
        /// The interface name.
        interface: String,
        /// The expected VRF name.
        vrf: String,
    },

    /// An existing VRF uses a different routing table than requested.
    #[error("VRF {name} already exists with different routing table {actual} (requested {requested})")]
    TableMismatch {
        /// The VRF name.
        name: String,
        /// Table the VRF was created with.
        actual: u32,
        /// Table the caller asked for.
        requested: u32,
    },

    /// Every routing table identifier is already in use by a VRF.
    #[error("failed to find an available routing table id")]
    TableIdsExhausted,

    /// A restored address never got its host route installed.
    #[error(
        "failed getting local/host addresses for {interface} in table {table} with dst {destination}/{prefix_len}"
    )]
    ConvergenceTimeout {
        /// The interface being repaired.
        interface: String,
        /// The VRF routing table.
        table: u32,
        /// The restored address.
        destination: IpAddr,
        /// Host prefix length used in the lookup.
        prefix_len: u8,
    },

    /// Operation exceeded its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl Error {
    /// Create a kernel error from an errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Create a kernel error with operation context.
    pub fn from_errno_with_context(errno: i32, operation: impl Into<String>) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::KernelWithContext {
            operation: operation.into(),
            errno: -errno,
            message,
        }
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, etc.).
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, 2 | 19) // ENOENT=2, ENODEV=19
            }
            Self::InterfaceNotFound { .. } | Self::NamespaceNotFound { .. } => true,
            _ => false,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                matches!(*errno, 1 | 13) // EPERM=1, EACCES=13
            }
            _ => false,
        }
    }

    /// Check if this is a "already exists" error (EEXIST).
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                *errno == 17 // EEXIST=17
            }
            _ => false,
        }
    }

    /// Check if this is a "device busy" error (EBUSY).
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => {
                *errno == 16 // EBUSY=16
            }
            _ => false,
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}
