use crate::frame_types::*;

#[inline]
/// Mini helper to check, whether a bit is set or not.
fn flag_is_set(data: u8, bit: u8) -> bool {
    let mask = 1 << bit;
    (data & mask) > 0
}

/// The very first two bytes of every frame contain the FrameControl header.
///
/// First byte:
///
/// - **bit_0-1**: Protocol version. This is always expected to be 0.
/// - **bit_2-3**: [FrameType]
/// - **bit_4-7**: [FrameSubType]
///
/// Second byte (Flags):
/// - **bit_0** `to_ds`: Set if the frame travels from a station to the distribution system.
/// - **bit_1** `from_ds`: Set if the frame comes from the distribution system.
/// - **bit_2** `more_frag`: Set if more fragments of this frame follow.
/// - **bit_3** `retry`: Set if this frame is a retransmission.
/// - **bit_4** `power_mgmt`: Power mode the station will be in after this frame.
/// - **bit_5** `more_data`: More frames are buffered at the AP for the receiver.
/// - **bit_6** `protected`: The body is encrypted.
/// - **bit_7** `order`: Strictly ordered service class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameControl {
    pub protocol_version: u8,
    pub frame_type: FrameType,
    pub frame_subtype: FrameSubType,
    pub flags: u8,
}

impl FrameControl {
    pub const TO_DS: u8 = 0b0000_0001;
    pub const FROM_DS: u8 = 0b0000_0010;

    /// Build a version 0 frame control for the given subtype.
    /// The frame type is derived from the subtype.
    pub fn new(frame_subtype: FrameSubType, flags: u8) -> Self {
        FrameControl {
            protocol_version: 0,
            frame_type: frame_subtype.frame_type(),
            frame_subtype,
            flags,
        }
    }

    pub fn to_ds(&self) -> bool {
        flag_is_set(self.flags, 0)
    }

    pub fn from_ds(&self) -> bool {
        flag_is_set(self.flags, 1)
    }

    pub fn more_frag(&self) -> bool {
        flag_is_set(self.flags, 2)
    }

    pub fn retry(&self) -> bool {
        flag_is_set(self.flags, 3)
    }

    pub fn pwr_mgmt(&self) -> bool {
        flag_is_set(self.flags, 4)
    }

    pub fn more_data(&self) -> bool {
        flag_is_set(self.flags, 5)
    }

    pub fn protected(&self) -> bool {
        flag_is_set(self.flags, 6)
    }

    pub fn order(&self) -> bool {
        flag_is_set(self.flags, 7)
    }

    pub fn encode(&self) -> [u8; 2] {
        let protocol_version_bits = self.protocol_version & 0b11; // 2 bits
        let frame_type_bits = (self.frame_type as u8 & 0b11) << 2; // 2 bits
        let frame_subtype_bits = (self.frame_subtype.to_bytes() & 0b1111) << 4; // 4 bits

        let first_byte = frame_subtype_bits | frame_type_bits | protocol_version_bits;

        [first_byte, self.flags]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::parse_frame_control;

    fn flag_for_bit(bit: u8, frame_control: &FrameControl) -> bool {
        match bit {
            0 => frame_control.to_ds(),
            1 => frame_control.from_ds(),
            2 => frame_control.more_frag(),
            3 => frame_control.retry(),
            4 => frame_control.pwr_mgmt(),
            5 => frame_control.more_data(),
            6 => frame_control.protected(),
            7 => frame_control.order(),
            _ => panic!("Unhandled bit {bit}"),
        }
    }

    #[test]
    /// Set each flag once and ensure that only that bit is set.
    fn test_flags() {
        for bit in 0..8 {
            let second_byte = 0b0000_0001 << bit;
            let bytes = [0b0000_0000, second_byte];
            let frame_control = parse_frame_control(&bytes).unwrap().1;

            for check_bit in 0..8 {
                assert_eq!(flag_for_bit(check_bit, &frame_control), bit == check_bit);
            }
        }
    }

    #[test]
    /// FrameType should be `00` and SubType `1000`
    fn test_beacon() {
        let bytes = [0b1000_0000, 0b0000_0000];
        let frame_control = parse_frame_control(&bytes).unwrap().1;

        assert!(matches!(frame_control.frame_type, FrameType::Management));
        assert!(matches!(frame_control.frame_subtype, FrameSubType::Beacon));
    }

    #[test]
    fn test_encode_matches_parse() {
        let subtypes = [
            FrameSubType::Beacon,
            FrameSubType::ProbeRequest,
            FrameSubType::AssociationResponse,
            FrameSubType::Disassociation,
            FrameSubType::QosData,
            FrameSubType::NullData,
        ];
        for subtype in subtypes {
            let frame_control = FrameControl::new(subtype, FrameControl::FROM_DS);
            let parsed = parse_frame_control(&frame_control.encode()).unwrap().1;
            assert_eq!(parsed, frame_control);
        }
    }
}
