//! Enslavement integration tests.

use std::net::IpAddr;

use nlvrf::netlink::types::route::rt_table;
use nlvrf::vrf;
use nlvrf::{Error, Result};

use crate::common::TestNamespace;

fn setup(prefix: &str) -> Result<TestNamespace> {
    let ns = TestNamespace::new(prefix)?;
    ns.add_dummy("d0")?;
    ns.link_up("d0")?;
    ns.add_addr("d0", "2001:db8::10/64")?;
    ns.add_addr("d0", "10.1.0.5/24")?;
    ns.add_route(&["2001:db8:5::/48", "dev", "d0", "src", "2001:db8::10"])?;
    Ok(ns)
}

#[tokio::test]
async fn test_attach_keeps_global_addresses() -> Result<()> {
    require_root!();

    let ns = setup("enslave-addr")?;
    let conn = ns.connection()?;

    let (device, _report) = vrf::attach(&conn, "d0", "vrf-blue", 0).await?;
    assert_eq!(device.table, 1);

    let d0 = conn.get_link_by_name("d0").await?.expect("d0 exists");
    assert_eq!(d0.master(), Some(device.index));

    let expected: IpAddr = "2001:db8::10".parse().unwrap();
    let addrs = conn.get_addresses_by_index(d0.ifindex()).await?;
    assert!(
        addrs
            .iter()
            .any(|a| a.primary_address() == Some(&expected) && a.prefix_len() == 64),
        "global IPv6 address should survive enslavement"
    );

    Ok(())
}

#[tokio::test]
async fn test_attach_replays_routes_into_vrf_table() -> Result<()> {
    require_root!();

    let ns = setup("enslave-route")?;
    let conn = ns.connection()?;

    let (device, report) = vrf::attach(&conn, "d0", "vrf-blue", 42).await?;
    assert_eq!(device.table, 42);
    assert_eq!(report.replayed_routes, 1);

    let dst: IpAddr = "2001:db8:5::".parse().unwrap();
    let routes = conn.get_routes_for_table(42).await?;
    assert!(
        routes
            .iter()
            .any(|r| r.destination() == Some(&dst) && r.dst_len() == 48),
        "route should be replayed into the VRF table"
    );

    let main = conn.get_routes_for_table(rt_table::MAIN).await?;
    assert!(!main.iter().any(|r| r.destination() == Some(&dst)));

    Ok(())
}

#[tokio::test]
async fn test_attach_twice_fails() -> Result<()> {
    require_root!();

    let ns = setup("enslave-twice")?;
    let conn = ns.connection()?;

    vrf::attach(&conn, "d0", "vrf-blue", 0).await?;
    let err = vrf::attach(&conn, "d0", "vrf-red", 0).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "interface d0 has already a master set: vrf-blue"
    );

    Ok(())
}

#[tokio::test]
async fn test_check_membership_and_reset() -> Result<()> {
    require_root!();

    let ns = setup("enslave-check")?;
    let conn = ns.connection()?;

    vrf::attach(&conn, "d0", "vrf-blue", 7).await?;
    let device = vrf::check_membership(&conn, "d0", "vrf-blue", 7).await?;
    assert_eq!(device.table, 7);

    let err = vrf::check_membership(&conn, "d0", "vrf-blue", 8)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TableMismatch { .. }));

    vrf::reset_master(&conn, "d0").await?;
    let err = vrf::check_membership(&conn, "d0", "vrf-blue", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotEnslaved { .. }));

    let d0 = conn.get_link_by_name("d0").await?.expect("d0 exists");
    assert_eq!(d0.master(), None);

    Ok(())
}

#[tokio::test]
async fn test_missing_interface() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("enslave-missing")?;
    let conn = ns.connection()?;

    let err = vrf::attach(&conn, "nothere", "vrf-blue", 0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InterfaceNotFound { ref name } if name == "nothere"));

    Ok(())
}
