use clap::ValueEnum;
use derive_setters::Setters;
use libwifi::frame::components::{StationInfo, SupportedRate};
use strum_macros::Display;

/// BSS membership selector of HT PHYs, carried as a basic rate.
pub const HT_SELECTOR: u8 = 127;
/// BSS membership selector of VHT PHYs, carried as a basic rate.
pub const VHT_SELECTOR: u8 = 126;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ModulationClass {
    Dsss,
    HrDsss,
    ErpOfdm,
    Ofdm,
}

impl ModulationClass {
    /// DSSS and HR-DSSS, the rates every 2.4 GHz station can decode.
    pub fn is_dsss_family(&self) -> bool {
        matches!(self, ModulationClass::Dsss | ModulationClass::HrDsss)
    }
}

/// One legacy transmission mode of a PHY.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WifiMode {
    pub modulation: ModulationClass,
    /// Data rate in units of 500 kbit/s, the unit of the supported rates element.
    pub rate: u8,
    pub mandatory: bool,
}

impl WifiMode {
    const fn new(modulation: ModulationClass, rate: u8, mandatory: bool) -> Self {
        WifiMode {
            modulation,
            rate,
            mandatory,
        }
    }

    pub fn mbps(&self) -> f32 {
        self.rate as f32 / 2.0
    }

    pub fn name(&self) -> String {
        format!("{}Rate{}Mbps", self.modulation, self.mbps())
    }
}

const DSSS_MODES: [WifiMode; 2] = [
    WifiMode::new(ModulationClass::Dsss, 2, true),
    WifiMode::new(ModulationClass::Dsss, 4, true),
];

const HR_DSSS_MODES: [WifiMode; 2] = [
    WifiMode::new(ModulationClass::HrDsss, 11, true),
    WifiMode::new(ModulationClass::HrDsss, 22, true),
];

/// Rates of the OFDM family with their mandatory flag.
const OFDM_RATES: [(u8, bool); 8] = [
    (12, true),
    (18, false),
    (24, true),
    (36, false),
    (48, true),
    (72, false),
    (96, false),
    (108, false),
];

fn ofdm_modes(modulation: ModulationClass) -> impl Iterator<Item = WifiMode> {
    OFDM_RATES
        .iter()
        .map(move |(rate, mandatory)| WifiMode::new(modulation, *rate, *mandatory))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, ValueEnum)]
pub enum WifiStandard {
    #[strum(serialize = "802.11b")]
    B,
    #[strum(serialize = "802.11g")]
    G,
    #[strum(serialize = "802.11a")]
    A,
    #[strum(serialize = "802.11n (2.4 GHz)")]
    N24,
    #[strum(serialize = "802.11n (5 GHz)")]
    N5,
    #[strum(serialize = "802.11ac")]
    Ac,
}

impl WifiStandard {
    pub fn is_2ghz(&self) -> bool {
        matches!(self, WifiStandard::B | WifiStandard::G | WifiStandard::N24)
    }
}

/// What the PHY below a MAC can do.
#[derive(Clone, Debug, PartialEq, Setters)]
#[setters(prefix = "with_")]
pub struct PhyCapabilities {
    pub standard: WifiStandard,
    pub modes: Vec<WifiMode>,
    /// HT MCS indices, single stream.
    pub ht_mcs: Vec<u8>,
    /// VHT MCS indices, single stream.
    pub vht_mcs: Vec<u8>,
    pub short_preamble: bool,
    pub short_slot: bool,
    pub channel: u8,
}

impl PhyCapabilities {
    pub fn for_standard(standard: WifiStandard) -> Self {
        let mut modes: Vec<WifiMode> = Vec::new();
        if standard.is_2ghz() {
            modes.extend(DSSS_MODES);
            modes.extend(HR_DSSS_MODES);
        }
        match standard {
            WifiStandard::B => {}
            WifiStandard::G | WifiStandard::N24 => modes.extend(ofdm_modes(ModulationClass::ErpOfdm)),
            WifiStandard::A | WifiStandard::N5 | WifiStandard::Ac => {
                modes.extend(ofdm_modes(ModulationClass::Ofdm))
            }
        }

        let ht_mcs = match standard {
            WifiStandard::N24 | WifiStandard::N5 | WifiStandard::Ac => (0..=7).collect(),
            _ => Vec::new(),
        };
        let vht_mcs = match standard {
            WifiStandard::Ac => (0..=9).collect(),
            _ => Vec::new(),
        };

        PhyCapabilities {
            standard,
            modes,
            ht_mcs,
            vht_mcs,
            short_preamble: standard != WifiStandard::B,
            short_slot: true,
            channel: if standard.is_2ghz() { 1 } else { 36 },
        }
    }

    pub fn erp_supported(&self) -> bool {
        self.has_class(ModulationClass::ErpOfdm)
    }

    pub fn dsss_supported(&self) -> bool {
        self.modes.iter().any(|mode| mode.modulation.is_dsss_family())
    }

    pub fn ht_supported(&self) -> bool {
        !self.ht_mcs.is_empty()
    }

    pub fn vht_supported(&self) -> bool {
        !self.vht_mcs.is_empty()
    }

    pub fn has_class(&self, modulation: ModulationClass) -> bool {
        self.modes.iter().any(|mode| mode.modulation == modulation)
    }

    pub fn mode_for_rate(&self, rate: u8) -> Option<&WifiMode> {
        self.modes.iter().find(|mode| mode.rate == rate)
    }

    pub fn bss_membership_selectors(&self) -> Vec<u8> {
        let mut selectors = Vec::new();
        if self.ht_supported() {
            selectors.push(HT_SELECTOR);
        }
        if self.vht_supported() {
            selectors.push(VHT_SELECTOR);
        }
        selectors
    }

    /// Basic rate set an access point picks when none is configured: the mandatory modes,
    /// except HR-DSSS so that plain DSSS stations can still join.
    pub fn default_basic_rates(&self) -> Vec<u8> {
        self.modes
            .iter()
            .filter(|mode| mode.mandatory && mode.modulation != ModulationClass::HrDsss)
            .map(|mode| mode.rate)
            .collect()
    }
}

/// Supported rates as advertised in a frame, basic flags and membership selectors included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateSet {
    rates: Vec<SupportedRate>,
}

impl RateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_station_info(station_info: &StationInfo) -> Self {
        let mut set = RateSet::new();
        for rate in station_info.rates() {
            set.add(rate.rate, rate.basic);
        }
        set
    }

    fn add(&mut self, rate: u8, basic: bool) {
        match self.rates.iter_mut().find(|entry| entry.rate == rate) {
            Some(entry) => entry.basic |= basic,
            None => self.rates.push(SupportedRate { basic, rate }),
        }
    }

    pub fn add_supported(&mut self, rate: u8) {
        self.add(rate, false);
    }

    /// Flags a rate as basic, adding it first if needed.
    pub fn set_basic(&mut self, rate: u8) {
        self.add(rate, true);
    }

    pub fn add_membership_selector(&mut self, selector: u8) {
        self.add(selector, true);
    }

    pub fn is_supported(&self, rate: u8) -> bool {
        self.rates.iter().any(|entry| entry.rate == rate)
    }

    pub fn is_basic(&self, rate: u8) -> bool {
        self.rates.iter().any(|entry| entry.rate == rate && entry.basic)
    }

    pub fn is_membership_selector(&self, selector: u8) -> bool {
        (selector == HT_SELECTOR || selector == VHT_SELECTOR) && self.is_basic(selector)
    }

    pub fn rates(&self) -> &[SupportedRate] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Writes the set into the (extended) supported rates elements.
    pub fn write_to(&self, station_info: &mut StationInfo) {
        station_info.set_rates(self.rates.clone());
    }
}
