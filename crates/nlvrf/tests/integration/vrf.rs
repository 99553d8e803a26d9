//! VRF device integration tests.

use nlvrf::netlink::link::DummyLink;
use nlvrf::netlink::namespace;
use nlvrf::vrf;
use nlvrf::{Error, Result};

use crate::common::TestNamespace;

#[tokio::test]
async fn test_create_vrf_allocates_tables() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("vrf-alloc")?;
    assert!(namespace::exists(ns.name()));
    let conn = ns.connection()?;

    let red = vrf::create_vrf(&conn, "vrf-red", 0).await?;
    assert_eq!(red.table, 1);

    let green = vrf::create_vrf(&conn, "vrf-green", 0).await?;
    assert_eq!(green.table, 2);

    let link = conn.get_link_by_name("vrf-red").await?.expect("vrf-red exists");
    assert!(link.is_vrf());
    assert!(link.is_up());

    Ok(())
}

#[tokio::test]
async fn test_create_vrf_fills_gaps() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("vrf-gap")?;
    let conn = ns.connection()?;

    vrf::create_vrf(&conn, "vrf-a", 1).await?;
    vrf::create_vrf(&conn, "vrf-b", 3).await?;
    let c = vrf::create_vrf(&conn, "vrf-c", 0).await?;
    assert_eq!(c.table, 2);

    Ok(())
}

#[tokio::test]
async fn test_ensure_vrf() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("vrf-ensure")?;
    let conn = ns.connection()?;

    let created = vrf::ensure_vrf(&conn, "vrf-blue", 100).await?;
    let found = vrf::ensure_vrf(&conn, "vrf-blue", 0).await?;
    assert_eq!(created, found);

    let err = vrf::ensure_vrf(&conn, "vrf-blue", 101).await.unwrap_err();
    assert!(matches!(
        err,
        Error::TableMismatch {
            actual: 100,
            requested: 101,
            ..
        }
    ));

    Ok(())
}

#[tokio::test]
async fn test_find_vrf_rejects_other_kinds() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("vrf-kind")?;
    let conn = ns.connection()?;

    conn.add_link(DummyLink::new("dummy0")).await?;
    let err = vrf::find_vrf(&conn, "dummy0").await.unwrap_err();
    assert_eq!(err.to_string(), "Netlink dummy0 is not a VRF");

    let err = vrf::find_vrf(&conn, "nothere").await.unwrap_err();
    assert!(err.is_not_found());

    Ok(())
}

#[tokio::test]
async fn test_list_vrfs() -> Result<()> {
    require_root!();

    let ns = TestNamespace::new("vrf-list")?;
    let conn = ns.connection()?;

    let red = vrf::create_vrf(&conn, "vrf-red", 10).await?;
    vrf::create_vrf(&conn, "vrf-green", 20).await?;
    ns.add_dummy("d0")?;
    ns.exec("ip", &["link", "set", "d0", "master", "vrf-red"])?;

    let members = vrf::assigned_interfaces(&conn, &red).await?;
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name(), Some("d0"));

    let vrfs = vrf::list_vrfs(&conn).await?;
    assert_eq!(vrfs.len(), 2);
    let red = vrfs.iter().find(|v| v.device.name == "vrf-red").unwrap();
    assert_eq!(red.device.table, 10);
    assert_eq!(red.members, vec!["d0".to_string()]);

    Ok(())
}
