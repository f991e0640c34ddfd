use std::time::Duration;

use clap::ValueEnum;
use derive_setters::Setters;
use strum_macros::Display;

use crate::edca::EdcaParameterSet;
use crate::rates::PhyCapabilities;

/// One 802.11 time unit.
pub const TIME_UNIT: Duration = Duration::from_micros(1024);

/// Which lower layer carries outbound frames.
///
/// Under `Offload` the lower layer owns the association state of remote stations, so the
/// access point admits data from senders it never associated itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, ValueEnum)]
pub enum TxPath {
    #[default]
    Contention,
    Offload,
}

/// Static description of a BSS, owned by its access point.
#[derive(Clone, Debug, PartialEq, Setters)]
#[setters(prefix = "with_")]
pub struct BssConfig {
    #[setters(into)]
    pub ssid: String,
    pub beacon_interval: Duration,
    pub erp_supported: bool,
    pub dsss_supported: bool,
    pub ht_supported: bool,
    pub vht_supported: bool,
    pub qos_supported: bool,
    pub non_erp_protection: bool,
}

impl BssConfig {
    /// Feature flags follow the PHY; HT and VHT imply QoS.
    pub fn for_phy(ssid: &str, phy: &PhyCapabilities) -> Self {
        BssConfig {
            ssid: ssid.to_owned(),
            beacon_interval: Duration::from_micros(102_400),
            erp_supported: phy.erp_supported(),
            dsss_supported: phy.dsss_supported(),
            ht_supported: phy.ht_supported(),
            vht_supported: phy.vht_supported(),
            qos_supported: phy.ht_supported() || phy.vht_supported(),
            non_erp_protection: true,
        }
    }

    /// The beacon interval in time units, as carried on the wire.
    pub fn beacon_interval_tu(&self) -> u16 {
        (self.beacon_interval.as_micros() / TIME_UNIT.as_micros()).min(u16::MAX as u128) as u16
    }
}

#[derive(Clone, Debug, PartialEq, Setters)]
#[setters(prefix = "with_")]
pub struct ApConfig {
    pub bss: BssConfig,
    pub beacon_generation: bool,
    pub beacon_jitter: bool,
    /// Basic rates in 500 kbit/s units. `None` picks the PHY's mandatory rates.
    #[setters(strip_option)]
    pub basic_rates: Option<Vec<u8>>,
    /// HT/VHT MCS indices every station has to support.
    pub basic_mcs: Vec<u8>,
    #[setters(strip_option)]
    pub edca: Option<EdcaParameterSet>,
}

impl ApConfig {
    pub fn new(bss: BssConfig) -> Self {
        ApConfig {
            bss,
            beacon_generation: true,
            beacon_jitter: false,
            basic_rates: None,
            basic_mcs: Vec::new(),
            edca: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Setters)]
#[setters(prefix = "with_")]
pub struct StaConfig {
    /// An empty SSID accepts beacons of any BSS.
    #[setters(into)]
    pub ssid: String,
    pub probe_request_timeout: Duration,
    pub assoc_request_timeout: Duration,
    pub max_missed_beacons: u32,
    pub active_probing: bool,
    pub qos_supported: bool,
}

impl StaConfig {
    pub fn new(ssid: &str) -> Self {
        StaConfig {
            ssid: ssid.to_owned(),
            ..Default::default()
        }
    }
}

impl Default for StaConfig {
    fn default() -> Self {
        StaConfig {
            ssid: String::new(),
            probe_request_timeout: Duration::from_millis(50),
            assoc_request_timeout: Duration::from_millis(500),
            max_missed_beacons: 10,
            active_probing: false,
            qos_supported: false,
        }
    }
}
