/// The 16 bit capability information field of beacons, probe responses and association frames.
///
/// - **bit_0**: ESS, set by access points.
/// - **bit_1**: IBSS
/// - **bit_4**: Privacy
/// - **bit_5**: Short preamble
/// - **bit_9**: QoS
/// - **bit_10**: Short slot time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapabilityInfo(pub u16);

impl CapabilityInfo {
    const ESS: u16 = 1 << 0;
    const IBSS: u16 = 1 << 1;
    const PRIVACY: u16 = 1 << 4;
    const SHORT_PREAMBLE: u16 = 1 << 5;
    const QOS: u16 = 1 << 9;
    const SHORT_SLOT_TIME: u16 = 1 << 10;

    fn with(self, mask: u16, value: bool) -> Self {
        if value {
            CapabilityInfo(self.0 | mask)
        } else {
            CapabilityInfo(self.0 & !mask)
        }
    }

    pub fn ess(&self) -> bool {
        self.0 & Self::ESS != 0
    }

    pub fn ibss(&self) -> bool {
        self.0 & Self::IBSS != 0
    }

    pub fn privacy(&self) -> bool {
        self.0 & Self::PRIVACY != 0
    }

    pub fn short_preamble(&self) -> bool {
        self.0 & Self::SHORT_PREAMBLE != 0
    }

    pub fn qos(&self) -> bool {
        self.0 & Self::QOS != 0
    }

    pub fn short_slot_time(&self) -> bool {
        self.0 & Self::SHORT_SLOT_TIME != 0
    }

    pub fn with_ess(self, value: bool) -> Self {
        self.with(Self::ESS, value)
    }

    pub fn with_short_preamble(self, value: bool) -> Self {
        self.with(Self::SHORT_PREAMBLE, value)
    }

    pub fn with_qos(self, value: bool) -> Self {
        self.with(Self::QOS, value)
    }

    pub fn with_short_slot_time(self, value: bool) -> Self {
        self.with(Self::SHORT_SLOT_TIME, value)
    }

    pub fn encode(&self) -> [u8; 2] {
        self.0.to_le_bytes()
    }
}
