//! Routing table identifier allocation.

use std::collections::HashSet;

use crate::netlink::messages::{LinkMessage, LinkType};
use crate::netlink::{Error, Result};

/// Smallest table id, starting at 1, that is not in `taken`.
pub fn smallest_unused(taken: &HashSet<u32>) -> Option<u32> {
    (1..u32::MAX).find(|id| !taken.contains(id))
}

/// Pick a table id not used by any VRF in `links`.
pub fn find_free_table_id(links: &[LinkMessage]) -> Result<u32> {
    let taken: HashSet<u32> = links
        .iter()
        .filter_map(|link| match link.link_type() {
            LinkType::Vrf { table } => table,
            _ => None,
        })
        .collect();

    smallest_unused(&taken).ok_or(Error::TableIdsExhausted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::messages::LinkMessageBuilder;

    fn vrf(index: u32, table: u32) -> LinkMessage {
        LinkMessageBuilder::new()
            .ifindex(index)
            .name(format!("vrf{}", index))
            .vrf(table)
            .build()
    }

    #[test]
    fn test_empty_namespace_starts_at_one() {
        assert_eq!(find_free_table_id(&[]).unwrap(), 1);
    }

    #[test]
    fn test_fills_first_gap() {
        let links = vec![vrf(10, 1), vrf(11, 3)];
        assert_eq!(find_free_table_id(&links).unwrap(), 2);
    }

    #[test]
    fn test_contiguous_tables() {
        let links = vec![vrf(10, 2), vrf(11, 1), vrf(12, 3)];
        assert_eq!(find_free_table_id(&links).unwrap(), 4);
    }

    #[test]
    fn test_ignores_non_vrf_links() {
        let bridge = LinkMessageBuilder::new().ifindex(3).kind("bridge").build();
        let eth = LinkMessageBuilder::new().ifindex(2).name("eth0").build();
        assert_eq!(find_free_table_id(&[bridge, eth, vrf(9, 1)]).unwrap(), 2);
    }

    #[test]
    fn test_smallest_unused_matches_definition() {
        for taken in [vec![], vec![1], vec![2, 3], vec![1, 2, 4, 5], vec![7, 1, 3, 2]] {
            let set: HashSet<u32> = taken.iter().copied().collect();
            let expected = (1..).find(|id| !set.contains(id)).unwrap();
            assert_eq!(smallest_unused(&set), Some(expected));
        }
    }
}
