//! Fixed-size rtnetlink family headers and attribute constants.

pub mod addr;
pub mod link;
pub mod route;
