use super::{FrameControl, MacAddress, SequenceControl};
use crate::traits::{Addresses, Header};

/// Representation of a management frame header. This format is used by all management frames!
///
/// Structure of a management header:
///
/// **Bytes 0-1** \
/// Protocol meta information and flags, see [FrameControl].
///
/// **Bytes 2-3** \
/// The duration field.
///
/// **Bytes 4-23** \
/// byte 4-9: Address 1, the receiver. \
/// byte 10-15: Address 2, the transmitter. \
/// byte 16-21: Address 3, the BSSID. \
/// byte 22-23: Sequence Control.
#[derive(Clone, Debug)]
pub struct ManagementHeader {
    pub frame_control: FrameControl,
    pub duration: [u8; 2],
    pub address_1: MacAddress,
    pub address_2: MacAddress,
    pub address_3: MacAddress,
    pub sequence_control: SequenceControl,
}

impl ManagementHeader {
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(24);
        bytes.extend_from_slice(&self.frame_control.encode());
        bytes.extend_from_slice(&self.duration);
        bytes.extend_from_slice(&self.address_1.encode());
        bytes.extend_from_slice(&self.address_2.encode());
        bytes.extend_from_slice(&self.address_3.encode());
        bytes.extend_from_slice(&self.sequence_control.encode());
        bytes
    }
}

/// Management frames never set the DS flags, so the mapping is fixed.
impl Addresses for ManagementHeader {
    fn src(&self) -> Option<&MacAddress> {
        Some(&self.address_2)
    }

    fn dest(&self) -> &MacAddress {
        &self.address_1
    }

    fn bssid(&self) -> Option<&MacAddress> {
        Some(&self.address_3)
    }
}

impl Header for ManagementHeader {
    fn frame_control(&self) -> &FrameControl {
        &self.frame_control
    }

    fn address_1(&self) -> &MacAddress {
        &self.address_1
    }

    fn address_2(&self) -> &MacAddress {
        &self.address_2
    }

    fn address_3(&self) -> &MacAddress {
        &self.address_3
    }
}

/// Representation of a data frame header. This format is used by all data frames!
///
/// It's very similar to the format of the management header, but there is an optional forth
/// address and Quality of Service (QoS) control.
///
/// byte 0-23: Same layout as the [ManagementHeader]. \
/// byte 24-29: Address 4 (Exists if to_ds and from_ds is set) \
/// next 2 bytes: QoS control, only exists in QoS subtypes.
///
/// QoS control layout (little endian):
/// - **bit_0-3**: Traffic identifier (TID)
/// - **bit_4**: End of service period
/// - **bit_5-6**: Ack policy
/// - **bit_7**: A-MSDU present
/// - **bit_8-15**: TXOP limit / queue size
#[derive(Clone, Debug)]
pub struct DataHeader {
    pub frame_control: FrameControl,
    pub duration: [u8; 2],
    pub address_1: MacAddress,
    pub address_2: MacAddress,
    pub address_3: MacAddress,
    pub sequence_control: SequenceControl,
    pub address_4: Option<MacAddress>,
    pub qos: Option<[u8; 2]>,
}

impl DataHeader {
    const AMSDU_PRESENT: u8 = 0b1000_0000;

    /// Build the QoS control field for a normal-ack frame.
    pub fn qos_control(tid: u8, amsdu: bool) -> [u8; 2] {
        let mut first = tid & 0x0F;
        if amsdu {
            first |= Self::AMSDU_PRESENT;
        }
        [first, 0]
    }

    /// The traffic identifier, only present on QoS subtypes.
    pub fn tid(&self) -> Option<u8> {
        self.qos.map(|qos| qos[0] & 0x0F)
    }

    /// Whether the body is an A-MSDU aggregate.
    pub fn is_amsdu(&self) -> bool {
        self.qos
            .is_some_and(|qos| qos[0] & Self::AMSDU_PRESENT != 0)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(32);
        bytes.extend_from_slice(&self.frame_control.encode());
        bytes.extend_from_slice(&self.duration);
        bytes.extend_from_slice(&self.address_1.encode());
        bytes.extend_from_slice(&self.address_2.encode());
        bytes.extend_from_slice(&self.address_3.encode());
        bytes.extend_from_slice(&self.sequence_control.encode());
        if let Some(address_4) = &self.address_4 {
            bytes.extend_from_slice(&address_4.encode());
        }
        if let Some(qos) = &self.qos {
            bytes.extend_from_slice(qos);
        }
        bytes
    }
}

/// Address mapping depending on the DS flags:
///
/// | to_ds | from_ds | Address 1 | Address 2 | Address 3 | Address 4 |
/// |-------|---------|-----------|-----------|-----------|-----------|
/// | 0     | 0       | DA        | SA        | BSSID     | -         |
/// | 1     | 0       | BSSID     | SA        | DA        | -         |
/// | 0     | 1       | DA        | BSSID     | SA        | -         |
/// | 1     | 1       | RA        | TA        | DA        | SA        |
impl Addresses for DataHeader {
    fn src(&self) -> Option<&MacAddress> {
        match (self.frame_control.to_ds(), self.frame_control.from_ds()) {
            (true, true) => self.address_4.as_ref(),
            (false, true) => Some(&self.address_3),
            _ => Some(&self.address_2),
        }
    }

    fn dest(&self) -> &MacAddress {
        if self.frame_control.to_ds() {
            &self.address_3
        } else {
            &self.address_1
        }
    }

    fn bssid(&self) -> Option<&MacAddress> {
        match (self.frame_control.to_ds(), self.frame_control.from_ds()) {
            (true, true) => None,
            (true, false) => Some(&self.address_1),
            (false, true) => Some(&self.address_2),
            (false, false) => Some(&self.address_3),
        }
    }
}

impl Header for DataHeader {
    fn frame_control(&self) -> &FrameControl {
        &self.frame_control
    }

    fn address_1(&self) -> &MacAddress {
        &self.address_1
    }

    fn address_2(&self) -> &MacAddress {
        &self.address_2
    }

    fn address_3(&self) -> &MacAddress {
        &self.address_3
    }
}
