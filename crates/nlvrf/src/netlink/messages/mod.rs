//! Strongly-typed rtnetlink message structures.
//!
//! Each type parses a dump reply payload with [`FromNetlink`](super::parse::FromNetlink)
//! and, where the crate sends it back to the kernel, serializes with
//! [`ToNetlink`](super::parse::ToNetlink).

mod address;
mod link;
mod route;

pub use address::*;
pub use link::*;
pub use route::*;
