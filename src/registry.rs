use std::collections::{BTreeMap, BTreeSet};

use libwifi::frame::components::MacAddress;
use strum_macros::Display;

use crate::negotiation::{PeerCapabilities, StationClass};

/// Association ids an access point hands out.
pub const MAX_AID: u16 = 2007;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum AssociationStatus {
    /// Admitted, the success response hasn't been acknowledged yet.
    WaitAssocTxOk,
    Associated,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StationRecord {
    pub address: MacAddress,
    pub aid: u16,
    pub capabilities: PeerCapabilities,
    pub class: StationClass,
    pub status: AssociationStatus,
}

/// The stations of a BSS, keyed by address.
///
/// The non-ERP and non-HT views are rebuilt from the map after every change, so they can
/// never contain an address the map doesn't.
#[derive(Debug, Default)]
pub struct StationRegistry {
    stations: BTreeMap<MacAddress, StationRecord>,
    non_erp: BTreeSet<MacAddress>,
    non_ht: BTreeSet<MacAddress>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record of `record.address`. Returns the replaced record.
    pub fn add(&mut self, record: StationRecord) -> Option<StationRecord> {
        let previous = self.stations.insert(record.address, record);
        self.refresh_views();
        previous
    }

    pub fn remove(&mut self, address: &MacAddress) -> Option<StationRecord> {
        let removed = self.stations.remove(address);
        if removed.is_some() {
            self.refresh_views();
        }
        removed
    }

    /// Promotes a pending record. Returns false if there was nothing pending.
    pub fn mark_associated(&mut self, address: &MacAddress) -> bool {
        match self.stations.get_mut(address) {
            Some(record) if record.status == AssociationStatus::WaitAssocTxOk => {
                record.status = AssociationStatus::Associated;
                true
            }
            _ => false,
        }
    }

    fn refresh_views(&mut self) {
        self.non_erp = self
            .stations
            .values()
            .filter(|record| record.class.non_erp)
            .map(|record| record.address)
            .collect();
        self.non_ht = self
            .stations
            .values()
            .filter(|record| record.class.non_ht)
            .map(|record| record.address)
            .collect();
    }

    pub fn get(&self, address: &MacAddress) -> Option<&StationRecord> {
        self.stations.get(address)
    }

    pub fn contains(&self, address: &MacAddress) -> bool {
        self.stations.contains_key(address)
    }

    pub fn is_associated(&self, address: &MacAddress) -> bool {
        self.status(address) == Some(AssociationStatus::Associated)
    }

    pub fn is_wait_assoc_tx_ok(&self, address: &MacAddress) -> bool {
        self.status(address) == Some(AssociationStatus::WaitAssocTxOk)
    }

    pub fn status(&self, address: &MacAddress) -> Option<AssociationStatus> {
        self.stations.get(address).map(|record| record.status)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationRecord> {
        self.stations.values()
    }

    pub fn non_erp_stations(&self) -> impl Iterator<Item = &StationRecord> {
        self.non_erp
            .iter()
            .filter_map(|address| self.stations.get(address))
    }

    pub fn non_ht_stations(&self) -> impl Iterator<Item = &StationRecord> {
        self.non_ht
            .iter()
            .filter_map(|address| self.stations.get(address))
    }

    pub fn has_non_erp(&self) -> bool {
        !self.non_erp.is_empty()
    }

    pub fn has_non_ht(&self) -> bool {
        !self.non_ht.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Lowest association id not in use, the id already held by `address` if any.
    pub fn next_aid(&self, address: &MacAddress) -> Option<u16> {
        if let Some(record) = self.stations.get(address) {
            return Some(record.aid);
        }
        let used: BTreeSet<u16> = self.stations.values().map(|record| record.aid).collect();
        (1..=MAX_AID).find(|aid| !used.contains(aid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: u32, aid: u16, non_erp: bool, non_ht: bool) -> StationRecord {
        StationRecord {
            address: MacAddress::local(index),
            aid,
            capabilities: PeerCapabilities::default(),
            class: StationClass {
                non_erp,
                non_ht,
                ..Default::default()
            },
            status: AssociationStatus::WaitAssocTxOk,
        }
    }

    #[test]
    fn test_views_follow_membership() {
        let mut registry = StationRegistry::new();
        registry.add(record(1, 1, true, false));
        registry.add(record(2, 2, false, true));
        registry.add(record(3, 3, true, true));

        assert_eq!(registry.non_erp_stations().count(), 2);
        assert_eq!(registry.non_ht_stations().count(), 2);

        registry.remove(&MacAddress::local(3));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.non_erp_stations().count(), 1);
        assert_eq!(registry.non_ht_stations().count(), 1);
        assert!(registry
            .non_erp_stations()
            .chain(registry.non_ht_stations())
            .all(|station| registry.contains(&station.address)));

        // Re-adding with a new class replaces the old view membership.
        registry.add(record(1, 1, false, false));
        assert!(!registry.has_non_erp());
    }

    #[test]
    fn test_pending_then_associated() {
        let mut registry = StationRegistry::new();
        let address = MacAddress::local(1);
        registry.add(record(1, 1, false, false));

        assert!(registry.is_wait_assoc_tx_ok(&address));
        assert!(!registry.is_associated(&address));
        assert!(registry.mark_associated(&address));
        assert!(registry.is_associated(&address));
        assert!(!registry.mark_associated(&address));
        assert!(!registry.mark_associated(&MacAddress::local(9)));
    }

    #[test]
    fn test_next_aid() {
        let mut registry = StationRegistry::new();
        assert_eq!(registry.next_aid(&MacAddress::local(1)), Some(1));
        registry.add(record(1, 1, false, false));
        registry.add(record(2, 3, false, false));
        assert_eq!(registry.next_aid(&MacAddress::local(5)), Some(2));
        assert_eq!(registry.next_aid(&MacAddress::local(2)), Some(3));
    }
}
