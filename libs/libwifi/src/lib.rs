/// Libwifi's own [Error](error::Error) implementation
pub mod error;
/// The [Frame](frame::Frame) enum and all frame structs.
pub mod frame;
/// Enums representing frame types and frame subtypes.
mod frame_types;
/// [nom] parsers for internal usage.
pub mod parsers;
/// All traits used or provided by this library.
mod traits;

use crate::error::Error;
use crate::parsers::*;

// Re-exports for user convenience
pub use crate::frame::Frame;
pub use crate::frame_types::*;
pub use crate::traits::*;

use crc::{Crc, CRC_32_ISO_HDLC};

// CRC algorithm for FCS calculation
const CRC_32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Parse IEE 802.11 frames from raw bytes.
///
/// If `fcs_included` is set, the trailing four bytes are checked against a CRC-32 of the
/// frame and stripped before parsing.
pub fn parse_frame(input: &[u8], fcs_included: bool) -> Result<Frame, Error> {
    let input = if fcs_included {
        if input.len() < 4 {
            return Err(Error::Incomplete("Frame is shorter than its FCS".to_string()));
        }

        // Split the input into frame data and FCS
        let (frame_data, fcs_bytes) = input.split_at(input.len() - 4);

        let crc = CRC_32.checksum(frame_data);
        let fcs = u32::from_le_bytes([fcs_bytes[0], fcs_bytes[1], fcs_bytes[2], fcs_bytes[3]]);

        if crc != fcs {
            return Err(Error::Incomplete(format!(
                "(FCS) mismatch {:02x} {:02x}",
                crc, fcs
            )));
        }
        frame_data
    } else {
        input
    };

    let (input, frame_control) = parse_frame_control(input)?;

    // Check which kind of frame sub-type we got
    match frame_control.frame_subtype {
        // Management
        FrameSubType::Beacon => parse_beacon(frame_control, input),
        FrameSubType::ProbeRequest => parse_probe_request(frame_control, input),
        FrameSubType::ProbeResponse => parse_probe_response(frame_control, input),
        FrameSubType::AssociationRequest => parse_association_request(frame_control, input),
        FrameSubType::AssociationResponse => parse_association_response(frame_control, input),
        FrameSubType::Disassociation => parse_disassociation(frame_control, input),

        // Data
        FrameSubType::Data => parse_data(frame_control, input),
        FrameSubType::NullData => parse_null_data(frame_control, input),
        FrameSubType::QosData => parse_qos_data(frame_control, input),
        FrameSubType::QosNull => parse_qos_null(frame_control, input),
        _ => Err(Error::UnhandledFrameSubtype(frame_control, input.to_vec())),
    }
}

/// Append the CRC-32 frame check sequence to an encoded frame.
pub fn append_fcs(bytes: &mut Vec<u8>) {
    let crc = CRC_32.checksum(bytes);
    bytes.extend_from_slice(&crc.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcs_round_trip() {
        // Null data frame, no body
        let mut bytes = vec![
            72, 1, // FrameControl
            0, 0, // Duration
            1, 2, 3, 4, 5, 6, // Address 1
            6, 5, 4, 3, 2, 1, // Address 2
            1, 2, 3, 4, 5, 6, // Address 3
            0, 0, // Sequence control
        ];
        append_fcs(&mut bytes);
        assert!(matches!(parse_frame(&bytes, true), Ok(Frame::NullData(_))));

        // Flip one bit in the body, the checksum has to catch it.
        bytes[5] ^= 0x01;
        assert!(matches!(parse_frame(&bytes, true), Err(Error::Incomplete(_))));
    }

    #[test]
    fn test_fcs_too_short() {
        assert!(parse_frame(&[0, 1, 2], true).is_err());
    }
}
