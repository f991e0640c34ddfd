//! Capability negotiation shared by both roles.
//!
//! Pure functions over rate sets, capability elements and the station registry. The access
//! point admits stations with [admit] and derives its announced fields from the registry,
//! the station adopts what the access point offers with [common_capabilities].

use libwifi::frame::components::{
    CapabilityInfo, ErpInformation, HtCapabilities, HtOperation, HtProtection, StationInfo,
    VhtCapabilities,
};

use crate::config::BssConfig;
use crate::error::{MacError, MismatchKind};
use crate::rates::{ModulationClass, PhyCapabilities, RateSet};
use crate::registry::StationRegistry;

/// What we know about the other end of a link.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PeerCapabilities {
    /// Our modes the peer supports, flagged basic as the peer advertised them.
    pub rates: RateSet,
    pub ht_mcs: Vec<u8>,
    pub vht_mcs: Vec<u8>,
    pub short_preamble: bool,
    pub short_slot: bool,
    pub qos: bool,
    pub erp: bool,
}

/// Modulation families a station can use, as seen by the access point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StationClass {
    pub erp: bool,
    pub dsss: bool,
    pub ht: bool,
    /// Only DSSS/HR-DSSS in an ERP BSS.
    pub non_erp: bool,
    /// No HT in an HT BSS.
    pub non_ht: bool,
}

/// The parameters an access point admits stations with.
#[derive(Clone, Copy, Debug)]
pub struct AdmissionPolicy<'a> {
    pub bss: &'a BssConfig,
    pub phy: &'a PhyCapabilities,
    pub basic_rates: &'a [u8],
    pub basic_mcs: &'a [u8],
}

#[derive(Clone, Debug, PartialEq)]
pub struct Admission {
    pub capabilities: PeerCapabilities,
    pub class: StationClass,
}

/// Every basic rate must be among the peer's supported rates. There is no partial acceptance.
pub fn validate_against_basic_set(peer_rates: &RateSet, basic_rates: &[u8]) -> Result<(), MacError> {
    match basic_rates
        .iter()
        .find(|rate| !peer_rates.is_supported(**rate))
    {
        Some(missing) => {
            log::debug!("Peer lacks basic rate {} Mbps", *missing as f32 / 2.0);
            Err(MacError::CapabilityMismatch(MismatchKind::BasicRate))
        }
        None => Ok(()),
    }
}

fn supports_class(peer_rates: &RateSet, phy: &PhyCapabilities, dsss: bool) -> bool {
    phy.modes
        .iter()
        .filter(|mode| {
            if dsss {
                mode.modulation.is_dsss_family()
            } else {
                mode.modulation == ModulationClass::ErpOfdm
            }
        })
        .any(|mode| peer_rates.is_supported(mode.rate))
}

pub fn classify(peer_rates: &RateSet, is_ht: bool, bss: &BssConfig, phy: &PhyCapabilities) -> StationClass {
    let erp = supports_class(peer_rates, phy, false);
    let dsss = supports_class(peer_rates, phy, true);
    StationClass {
        erp,
        dsss,
        ht: is_ht,
        non_erp: bss.erp_supported && dsss && !erp,
        non_ht: bss.ht_supported && !is_ht,
    }
}

/// Capabilities with a zero info field don't count as present.
fn announced_ht(station_info: &StationInfo) -> Option<&HtCapabilities> {
    station_info
        .ht_capabilities
        .as_ref()
        .filter(|ht| ht.capabilities_info != 0)
}

fn announced_vht(station_info: &StationInfo) -> Option<&VhtCapabilities> {
    station_info
        .vht_capabilities
        .as_ref()
        .filter(|vht| vht.capabilities_info != 0)
}

/// What both ends support, from our PHY and the peer's elements.
pub fn common_capabilities(
    phy: &PhyCapabilities,
    capability_info: CapabilityInfo,
    station_info: &StationInfo,
    ht_enabled: bool,
    vht_enabled: bool,
) -> PeerCapabilities {
    let advertised = RateSet::from_station_info(station_info);

    let mut rates = RateSet::new();
    for mode in &phy.modes {
        if advertised.is_basic(mode.rate) {
            rates.set_basic(mode.rate);
        } else if advertised.is_supported(mode.rate) {
            rates.add_supported(mode.rate);
        }
    }

    let ht_mcs = match station_info.ht_capabilities.as_ref() {
        Some(ht) if ht_enabled => phy
            .ht_mcs
            .iter()
            .copied()
            .filter(|mcs| ht.is_supported_mcs(*mcs))
            .collect(),
        _ => Vec::new(),
    };
    let vht_mcs = match station_info.vht_capabilities.as_ref() {
        Some(vht) if vht_enabled => phy
            .vht_mcs
            .iter()
            .copied()
            .filter(|mcs| vht.is_supported_tx_mcs(*mcs))
            .collect(),
        _ => Vec::new(),
    };

    PeerCapabilities {
        erp: supports_class(&advertised, phy, false),
        rates,
        ht_mcs,
        vht_mcs,
        short_preamble: capability_info.short_preamble(),
        short_slot: capability_info.short_slot_time(),
        qos: capability_info.qos() || station_info.edca_parameter_set.is_some(),
    }
}

/// Decides an association request.
///
/// Checks the basic rate set first, then the basic MCS set against announced HT and VHT
/// capabilities. The modulation class of the station only feeds the derived views, it never
/// decides admission on its own.
pub fn admit(
    policy: &AdmissionPolicy,
    capability_info: CapabilityInfo,
    station_info: &StationInfo,
) -> Result<Admission, MacError> {
    let peer_rates = RateSet::from_station_info(station_info);
    validate_against_basic_set(&peer_rates, policy.basic_rates)?;

    let mut is_ht = false;
    if policy.bss.ht_supported {
        if let Some(ht) = announced_ht(station_info) {
            is_ht = true;
            if !policy.basic_mcs.iter().all(|mcs| ht.is_supported_mcs(*mcs)) {
                return Err(MacError::CapabilityMismatch(MismatchKind::HtBasicMcs));
            }
        }
    }

    if policy.bss.vht_supported {
        if let Some(vht) = announced_vht(station_info) {
            if !policy
                .basic_mcs
                .iter()
                .all(|mcs| vht.is_supported_tx_mcs(*mcs))
            {
                return Err(MacError::CapabilityMismatch(MismatchKind::VhtBasicMcs));
            }
        }
    }

    let class = classify(&peer_rates, is_ht, policy.bss, policy.phy);
    let mut capabilities = common_capabilities(
        policy.phy,
        capability_info,
        station_info,
        policy.bss.ht_supported,
        policy.bss.vht_supported,
    );
    capabilities.short_slot &= class.erp;

    Ok(Admission {
        capabilities,
        class,
    })
}

/// Short slot only while no non-ERP station is around and every station can do it.
pub fn derive_short_slot(bss: &BssConfig, phy: &PhyCapabilities, registry: &StationRegistry) -> bool {
    if registry.has_non_erp() {
        return false;
    }
    bss.erp_supported
        && phy.short_slot
        && registry
            .iter()
            .all(|station| station.capabilities.short_slot)
}

/// Short preamble only if every non-ERP station supports it.
pub fn derive_short_preamble(
    bss: &BssConfig,
    phy: &PhyCapabilities,
    registry: &StationRegistry,
) -> bool {
    (bss.erp_supported || phy.short_preamble)
        && registry
            .non_erp_stations()
            .all(|station| station.capabilities.short_preamble)
}

pub fn derive_use_protection(bss: &BssConfig, registry: &StationRegistry) -> bool {
    registry.has_non_erp() && bss.non_erp_protection
}

pub fn derive_erp_information(
    bss: &BssConfig,
    phy: &PhyCapabilities,
    registry: &StationRegistry,
) -> ErpInformation {
    ErpInformation {
        non_erp_present: registry.has_non_erp(),
        use_protection: derive_use_protection(bss, registry),
        barker_preamble_mode: !derive_short_preamble(bss, phy, registry),
    }
}

pub fn derive_ht_protection(registry: &StationRegistry) -> HtProtection {
    if registry.has_non_ht() {
        HtProtection::MixedMode
    } else {
        HtProtection::NoProtection
    }
}

/// The HT operation element of an access point, protection included.
pub fn derive_ht_operation(phy: &PhyCapabilities, registry: &StationRegistry) -> HtOperation {
    let mut operation = HtOperation {
        primary_channel: phy.channel,
        ..Default::default()
    };
    operation.set_protection(derive_ht_protection(registry));
    operation
}

/// HT capabilities element announcing the PHY's MCS set.
pub fn ht_capabilities(phy: &PhyCapabilities) -> HtCapabilities {
    let mut capabilities = HtCapabilities {
        // Short guard interval for 20 MHz
        capabilities_info: 0x0020,
        ..Default::default()
    };
    for mcs in &phy.ht_mcs {
        capabilities.set_supported_mcs(*mcs);
    }
    capabilities
}

/// VHT capabilities element announcing the PHY's MCS range on one stream.
pub fn vht_capabilities(phy: &PhyCapabilities) -> VhtCapabilities {
    let max_mcs = phy.vht_mcs.iter().copied().max().unwrap_or(7);
    // Maximum MPDU length 3895 octets, short guard interval for 80 MHz
    VhtCapabilities::with_max_mcs(0x0000_0020, max_mcs, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::WifiStandard;
    use crate::registry::{AssociationStatus, StationRecord};
    use libwifi::frame::components::{MacAddress, SupportedRate};

    fn station_info(rates: &[u8]) -> StationInfo {
        let mut info = StationInfo::default();
        info.set_rates(
            rates
                .iter()
                .map(|rate| SupportedRate {
                    basic: false,
                    rate: *rate,
                })
                .collect(),
        );
        info
    }

    fn record(index: u32, capabilities: PeerCapabilities, class: StationClass) -> StationRecord {
        StationRecord {
            address: MacAddress::local(index),
            aid: index as u16,
            capabilities,
            class,
            status: AssociationStatus::Associated,
        }
    }

    #[test]
    fn test_basic_set_coverage() {
        let mut rates = RateSet::new();
        rates.add_supported(2);
        assert!(validate_against_basic_set(&rates, &[2, 4]).is_err());
        rates.add_supported(4);
        rates.add_supported(11);
        assert!(validate_against_basic_set(&rates, &[2, 4]).is_ok());
        assert!(validate_against_basic_set(&rates, &[]).is_ok());
    }

    #[test]
    fn test_classification() {
        let phy = PhyCapabilities::for_standard(WifiStandard::G);
        let bss = BssConfig::for_phy("lobby", &phy);

        let b_only = RateSet::from_station_info(&station_info(&[2, 4, 11, 22]));
        let class = classify(&b_only, false, &bss, &phy);
        assert!(class.dsss && !class.erp && class.non_erp);
        assert!(!class.non_ht);

        let g = RateSet::from_station_info(&station_info(&[2, 4, 11, 22, 12, 108]));
        let class = classify(&g, false, &bss, &phy);
        assert!(class.erp && !class.non_erp);
    }

    #[test]
    fn test_admit_ht_basic_mcs() {
        let phy = PhyCapabilities::for_standard(WifiStandard::N5);
        let bss = BssConfig::for_phy("lobby", &phy);
        let basic_rates = phy.default_basic_rates();
        let policy = AdmissionPolicy {
            bss: &bss,
            phy: &phy,
            basic_rates: &basic_rates,
            basic_mcs: &[0, 7],
        };

        let mut info = station_info(&[12, 18, 24, 36, 48, 72, 96, 108]);
        let mut ht = HtCapabilities {
            capabilities_info: 0x0020,
            ..Default::default()
        };
        for mcs in 0..4 {
            ht.set_supported_mcs(mcs);
        }
        info.ht_capabilities = Some(ht);
        assert!(matches!(
            admit(&policy, CapabilityInfo::default(), &info),
            Err(MacError::CapabilityMismatch(MismatchKind::HtBasicMcs))
        ));

        // A zero info field means the station isn't HT, the MCS set is ignored.
        ht.capabilities_info = 0;
        info.ht_capabilities = Some(ht);
        let admission = admit(&policy, CapabilityInfo::default(), &info).unwrap();
        assert!(admission.class.non_ht);
    }

    #[test]
    fn test_admit_records_common_modes() {
        let phy = PhyCapabilities::for_standard(WifiStandard::G);
        let bss = BssConfig::for_phy("lobby", &phy);
        let policy = AdmissionPolicy {
            bss: &bss,
            phy: &phy,
            basic_rates: &[2, 4],
            basic_mcs: &[],
        };

        let info = station_info(&[2, 4, 11, 22, 12, 200]);
        let capability_info = CapabilityInfo::default()
            .with_short_slot_time(true)
            .with_short_preamble(true);
        let admission = admit(&policy, capability_info, &info).unwrap();
        assert_eq!(admission.capabilities.rates.len(), 5);
        assert!(admission.capabilities.erp);
        assert!(admission.capabilities.short_slot);

        // Short slot needs ERP.
        let info = station_info(&[2, 4]);
        let admission = admit(&policy, capability_info, &info).unwrap();
        assert!(!admission.capabilities.short_slot);
        assert!(admission.class.non_erp);
    }

    #[test]
    fn test_derived_fields() {
        let phy = PhyCapabilities::for_standard(WifiStandard::G);
        let bss = BssConfig::for_phy("lobby", &phy);
        let mut registry = StationRegistry::new();

        assert!(derive_short_slot(&bss, &phy, &registry));
        assert!(derive_short_preamble(&bss, &phy, &registry));

        let erp_station = PeerCapabilities {
            short_slot: true,
            short_preamble: true,
            erp: true,
            ..Default::default()
        };
        registry.add(record(
            1,
            erp_station.clone(),
            StationClass {
                erp: true,
                dsss: true,
                ..Default::default()
            },
        ));
        assert!(derive_short_slot(&bss, &phy, &registry));

        let legacy = PeerCapabilities {
            short_preamble: false,
            ..Default::default()
        };
        registry.add(record(
            2,
            legacy,
            StationClass {
                dsss: true,
                non_erp: true,
                ..Default::default()
            },
        ));
        assert!(!derive_short_slot(&bss, &phy, &registry));
        assert!(!derive_short_preamble(&bss, &phy, &registry));

        let erp = derive_erp_information(&bss, &phy, &registry);
        assert!(erp.non_erp_present && erp.use_protection && erp.barker_preamble_mode);

        let quiet = bss.clone().with_non_erp_protection(false);
        assert!(!derive_use_protection(&quiet, &registry));

        registry.remove(&MacAddress::local(2));
        assert!(derive_short_slot(&bss, &phy, &registry));
    }

    #[test]
    fn test_ht_protection() {
        let mut registry = StationRegistry::new();
        assert_eq!(derive_ht_protection(&registry), HtProtection::NoProtection);
        registry.add(record(
            1,
            PeerCapabilities::default(),
            StationClass {
                non_ht: true,
                ..Default::default()
            },
        ));
        assert_eq!(derive_ht_protection(&registry), HtProtection::MixedMode);
        let phy = PhyCapabilities::for_standard(WifiStandard::N24);
        assert_eq!(
            derive_ht_operation(&phy, &registry).protection(),
            HtProtection::MixedMode
        );
    }

    #[test]
    fn test_common_capabilities_keep_basic_flags() {
        let phy = PhyCapabilities::for_standard(WifiStandard::Ac);
        let mut info = station_info(&[12, 18, 24]);
        info.supported_rates[0].basic = true;
        info.ht_capabilities = Some(ht_capabilities(&phy));
        info.vht_capabilities = Some(VhtCapabilities::with_max_mcs(0x20, 8, 1));

        let capabilities =
            common_capabilities(&phy, CapabilityInfo::default(), &info, true, true);
        assert!(capabilities.rates.is_basic(12));
        assert!(!capabilities.rates.is_basic(24));
        assert_eq!(capabilities.ht_mcs, (0..=7).collect::<Vec<u8>>());
        assert_eq!(capabilities.vht_mcs, (0..=8).collect::<Vec<u8>>());
        assert!(!capabilities.erp);
    }
}
