//! Typed bodies of the information elements the association control plane relies on.
//!
//! Every struct encodes its element body only. Id and length are written by
//! [StationInfo](super::StationInfo).

/// Element ids.
pub mod element_id {
    pub const SSID: u8 = 0;
    pub const SUPPORTED_RATES: u8 = 1;
    pub const DSSS_PARAMETER_SET: u8 = 3;
    pub const EDCA_PARAMETER_SET: u8 = 12;
    pub const ERP_INFORMATION: u8 = 42;
    pub const HT_CAPABILITIES: u8 = 45;
    pub const EXTENDED_SUPPORTED_RATES: u8 = 50;
    pub const HT_OPERATION: u8 = 61;
    pub const VHT_CAPABILITIES: u8 = 191;
}

/// ERP information element (id 42), a single byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErpInformation {
    pub non_erp_present: bool,
    pub use_protection: bool,
    pub barker_preamble_mode: bool,
}

impl ErpInformation {
    pub fn from_byte(byte: u8) -> Self {
        ErpInformation {
            non_erp_present: byte & 0b001 != 0,
            use_protection: byte & 0b010 != 0,
            barker_preamble_mode: byte & 0b100 != 0,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut byte = 0u8;
        if self.non_erp_present {
            byte |= 0b001;
        }
        if self.use_protection {
            byte |= 0b010;
        }
        if self.barker_preamble_mode {
            byte |= 0b100;
        }
        vec![byte]
    }
}

/// One access category record of the EDCA parameter set.
///
/// Contention windows are carried as exponents: `cw = 2^ecw - 1`.
/// The TXOP limit is carried in units of 32 µs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcParameterRecord {
    /// 0 = BE, 1 = BK, 2 = VI, 3 = VO
    pub aci: u8,
    pub acm: bool,
    pub aifsn: u8,
    pub ecw_min: u8,
    pub ecw_max: u8,
    pub txop_limit: u16,
}

impl AcParameterRecord {
    pub fn encode(&self) -> [u8; 4] {
        let mut aci_aifsn = self.aifsn & 0x0F;
        if self.acm {
            aci_aifsn |= 0b0001_0000;
        }
        aci_aifsn |= (self.aci & 0b11) << 5;
        let ecw = (self.ecw_min & 0x0F) | (self.ecw_max & 0x0F) << 4;
        let [txop_low, txop_high] = self.txop_limit.to_le_bytes();
        [aci_aifsn, ecw, txop_low, txop_high]
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        AcParameterRecord {
            aci: (bytes[0] >> 5) & 0b11,
            acm: bytes[0] & 0b0001_0000 != 0,
            aifsn: bytes[0] & 0x0F,
            ecw_min: bytes[1] & 0x0F,
            ecw_max: bytes[1] >> 4,
            txop_limit: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }
}

/// EDCA parameter set element (id 12), 18 bytes.
///
/// QoS info, one reserved byte, then the records for BE, BK, VI and VO in that order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EdcaParameterElement {
    pub qos_info: u8,
    pub records: [AcParameterRecord; 4],
}

impl EdcaParameterElement {
    pub const LENGTH: usize = 18;

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LENGTH);
        bytes.push(self.qos_info);
        bytes.push(0);
        for record in &self.records {
            bytes.extend_from_slice(&record.encode());
        }
        bytes
    }
}

/// HT capabilities element (id 45), 26 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HtCapabilities {
    pub capabilities_info: u16,
    pub ampdu_parameters: u8,
    /// The first 77 bits are the rx MCS bitmask.
    pub supported_mcs_set: [u8; 16],
    pub extended_capabilities: u16,
    pub tx_beamforming: u32,
    pub asel: u8,
}

impl HtCapabilities {
    pub const LENGTH: usize = 26;

    pub fn is_supported_mcs(&self, mcs: u8) -> bool {
        mcs < 77 && self.supported_mcs_set[(mcs / 8) as usize] & (1 << (mcs % 8)) != 0
    }

    pub fn set_supported_mcs(&mut self, mcs: u8) {
        if mcs < 77 {
            self.supported_mcs_set[(mcs / 8) as usize] |= 1 << (mcs % 8);
        }
    }

    /// All MCS indices flagged in the rx bitmask.
    pub fn supported_mcs(&self) -> Vec<u8> {
        (0..77).filter(|mcs| self.is_supported_mcs(*mcs)).collect()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LENGTH);
        bytes.extend_from_slice(&self.capabilities_info.to_le_bytes());
        bytes.push(self.ampdu_parameters);
        bytes.extend_from_slice(&self.supported_mcs_set);
        bytes.extend_from_slice(&self.extended_capabilities.to_le_bytes());
        bytes.extend_from_slice(&self.tx_beamforming.to_le_bytes());
        bytes.push(self.asel);
        bytes
    }
}

/// Protection mode announced in the HT operation element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HtProtection {
    NoProtection = 0,
    NonMember = 1,
    TwentyMhz = 2,
    MixedMode = 3,
}

impl HtProtection {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => HtProtection::NoProtection,
            1 => HtProtection::NonMember,
            2 => HtProtection::TwentyMhz,
            _ => HtProtection::MixedMode,
        }
    }
}

/// HT operation element (id 61), 22 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HtOperation {
    pub primary_channel: u8,
    pub information: [u8; 5],
    pub basic_mcs_set: [u8; 16],
}

impl HtOperation {
    pub const LENGTH: usize = 22;

    pub fn protection(&self) -> HtProtection {
        HtProtection::from_bits(self.information[1])
    }

    pub fn set_protection(&mut self, protection: HtProtection) {
        self.information[1] = (self.information[1] & !0b11) | protection as u8;
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LENGTH);
        bytes.push(self.primary_channel);
        bytes.extend_from_slice(&self.information);
        bytes.extend_from_slice(&self.basic_mcs_set);
        bytes
    }
}

/// VHT capabilities element (id 191), 12 bytes.
///
/// The MCS maps hold two bits per spatial stream, stream 1 in bits 0-1:
/// 0 = MCS 0-7, 1 = MCS 0-8, 2 = MCS 0-9, 3 = not supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VhtCapabilities {
    pub capabilities_info: u32,
    pub rx_mcs_map: u16,
    pub rx_highest_rate: u16,
    pub tx_mcs_map: u16,
    pub tx_highest_rate: u16,
}

impl Default for VhtCapabilities {
    fn default() -> Self {
        VhtCapabilities {
            capabilities_info: 0,
            rx_mcs_map: 0xFFFF,
            rx_highest_rate: 0,
            tx_mcs_map: 0xFFFF,
            tx_highest_rate: 0,
        }
    }
}

impl VhtCapabilities {
    pub const LENGTH: usize = 12;

    fn max_mcs(map: u16, nss: u8) -> Option<u8> {
        if !(1..=8).contains(&nss) {
            return None;
        }
        match (map >> ((nss - 1) * 2)) & 0b11 {
            0 => Some(7),
            1 => Some(8),
            2 => Some(9),
            _ => None,
        }
    }

    fn map_for(max_mcs: u8, nss: u8) -> u16 {
        let value = match max_mcs {
            0..=7 => 0,
            8 => 1,
            _ => 2,
        };
        (0..8u16).fold(0, |map, stream| {
            let bits = if stream < nss as u16 { value } else { 0b11 };
            map | bits << (stream * 2)
        })
    }

    /// Capabilities announcing MCS 0..=`max_mcs` on `nss` spatial streams in both directions.
    pub fn with_max_mcs(capabilities_info: u32, max_mcs: u8, nss: u8) -> Self {
        let map = Self::map_for(max_mcs, nss);
        VhtCapabilities {
            capabilities_info,
            rx_mcs_map: map,
            tx_mcs_map: map,
            ..Default::default()
        }
    }

    /// Single stream check, which is what admission control asks for.
    pub fn is_supported_tx_mcs(&self, mcs: u8) -> bool {
        Self::max_mcs(self.tx_mcs_map, 1).is_some_and(|max| mcs <= max)
    }

    pub fn is_supported_rx_mcs(&self, mcs: u8) -> bool {
        Self::max_mcs(self.rx_mcs_map, 1).is_some_and(|max| mcs <= max)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LENGTH);
        bytes.extend_from_slice(&self.capabilities_info.to_le_bytes());
        bytes.extend_from_slice(&self.rx_mcs_map.to_le_bytes());
        bytes.extend_from_slice(&self.rx_highest_rate.to_le_bytes());
        bytes.extend_from_slice(&self.tx_mcs_map.to_le_bytes());
        bytes.extend_from_slice(&self.tx_highest_rate.to_le_bytes());
        bytes
    }
}
