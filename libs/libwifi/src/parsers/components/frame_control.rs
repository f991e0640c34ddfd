use nom::number::complete::u8 as get_u8;
use nom::sequence::tuple;
use nom::IResult;

use crate::frame::components::FrameControl;
use crate::frame_types::{FrameSubType, FrameType};

use crate::frame_types::FrameSubType::*;

/// Management subtypes indexed by their four-bit wire value.
const MANAGEMENT_SUBTYPES: [FrameSubType; 16] = [
    AssociationRequest,
    AssociationResponse,
    ReassociationRequest,
    ReassociationResponse,
    ProbeRequest,
    ProbeResponse,
    TimingAdvertisement,
    Reserved,
    Beacon,
    Atim,
    Disassociation,
    Authentication,
    Deauthentication,
    Action,
    ActionNoAck,
    Reserved,
];

/// Control subtypes indexed by their four-bit wire value.
const CONTROL_SUBTYPES: [FrameSubType; 16] = [
    Reserved,
    Reserved,
    Trigger,
    Tack,
    BeamformingReportPoll,
    NdpAnnouncement,
    ControlFrameExtension,
    ControlWrapper,
    BlockAckRequest,
    BlockAck,
    PsPoll,
    Rts,
    Cts,
    Ack,
    CfEnd,
    CfEndCfAck,
];

/// Data subtypes indexed by their four-bit wire value.
const DATA_SUBTYPES: [FrameSubType; 16] = [
    Data,
    DataCfAck,
    DataCfPoll,
    DataCfAckCfPoll,
    NullData,
    CfAck,
    CfPoll,
    CfAckCfPoll,
    QosData,
    QosDataCfAck,
    QosDataCfPoll,
    QosDataCfAckCfPoll,
    QosNull,
    Reserved,
    QosCfPoll,
    QosCfAckCfPoll,
];

/// Parse the frame control of a frame.
/// The format is the same for ALL frames, which makes this part quite unique.
///
/// The first byte holds the protocol version in bits 0-1, the type in bits 2-3 and the
/// subtype in bits 4-7. The second byte holds the flags.
pub fn parse_frame_control(input: &[u8]) -> IResult<&[u8], FrameControl> {
    let (remaining, (first, flags)) = tuple((get_u8, get_u8))(input)?;

    let protocol_version = first & 0b11;
    let subtype_index = (first >> 4) as usize;

    let (frame_type, frame_subtype) = match (first >> 2) & 0b11 {
        0 => (FrameType::Management, MANAGEMENT_SUBTYPES[subtype_index]),
        1 => (FrameType::Control, CONTROL_SUBTYPES[subtype_index]),
        2 => (FrameType::Data, DATA_SUBTYPES[subtype_index]),
        _ => (FrameType::Unknown, Unhandled),
    };

    Ok((
        remaining,
        FrameControl {
            protocol_version,
            frame_type,
            frame_subtype,
            flags,
        },
    ))
}
