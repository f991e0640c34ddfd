use nom::number::complete::{le_u16, le_u64};
use nom::sequence::tuple;
use nom::IResult;

use crate::error::Error;
use crate::frame::components::{CapabilityInfo, FrameControl};
use crate::frame::*;
use crate::parsers::{parse_management_header, parse_station_info};

/// Timestamp, beacon interval and capability info.
/// Shared by beacons and probe responses.
fn parse_beacon_fields(input: &[u8]) -> IResult<&[u8], (u64, u16, CapabilityInfo)> {
    let (remaining, (timestamp, beacon_interval, capability_info)) =
        tuple((le_u64, le_u16, le_u16))(input)?;
    Ok((
        remaining,
        (timestamp, beacon_interval, CapabilityInfo(capability_info)),
    ))
}

fn parse_u16_pair(input: &[u8]) -> IResult<&[u8], (u16, u16)> {
    tuple((le_u16, le_u16))(input)
}

fn parse_u16(input: &[u8]) -> IResult<&[u8], u16> {
    le_u16(input)
}

/// Parse a [Beacon] frame.
///
/// The general structure is:
/// - ManagementHeader
/// - Timestamp
/// - Beacon interval
/// - Capability info
/// - Dynamic fields
pub fn parse_beacon(frame_control: FrameControl, input: &[u8]) -> Result<Frame, Error> {
    let (input, header) = parse_management_header(frame_control, input)?;
    let (input, (timestamp, beacon_interval, capability_info)) = parse_beacon_fields(input)?;
    let station_info = parse_station_info(input)?;

    Ok(Frame::Beacon(Beacon {
        header,
        timestamp,
        beacon_interval,
        capability_info,
        station_info,
    }))
}

/// Parse a [ProbeRequest] frame.
///
/// The general structure is:
/// - ManagementHeader
/// - Dynamic fields
pub fn parse_probe_request(frame_control: FrameControl, input: &[u8]) -> Result<Frame, Error> {
    let (input, header) = parse_management_header(frame_control, input)?;
    let station_info = parse_station_info(input)?;

    Ok(Frame::ProbeRequest(ProbeRequest {
        header,
        station_info,
    }))
}

/// Parse a [ProbeResponse] frame.
///
/// Same layout as a [Beacon].
pub fn parse_probe_response(frame_control: FrameControl, input: &[u8]) -> Result<Frame, Error> {
    let (input, header) = parse_management_header(frame_control, input)?;
    let (input, (timestamp, beacon_interval, capability_info)) = parse_beacon_fields(input)?;
    let station_info = parse_station_info(input)?;

    Ok(Frame::ProbeResponse(ProbeResponse {
        header,
        timestamp,
        beacon_interval,
        capability_info,
        station_info,
    }))
}

/// Parse an [AssociationRequest] frame.
///
/// The general structure is:
/// - ManagementHeader
/// - Capability info
/// - Listen interval
/// - Dynamic fields
pub fn parse_association_request(
    frame_control: FrameControl,
    input: &[u8],
) -> Result<Frame, Error> {
    let (input, header) = parse_management_header(frame_control, input)?;
    let (input, (capability_info, listen_interval)) = parse_u16_pair(input)?;
    let station_info = parse_station_info(input)?;

    Ok(Frame::AssociationRequest(AssociationRequest {
        header,
        capability_info: CapabilityInfo(capability_info),
        listen_interval,
        station_info,
    }))
}

/// Parse an [AssociationResponse] frame.
///
/// The general structure is:
/// - ManagementHeader
/// - Capability info
/// - Status code
/// - Association id
/// - Dynamic fields
pub fn parse_association_response(
    frame_control: FrameControl,
    input: &[u8],
) -> Result<Frame, Error> {
    let (input, header) = parse_management_header(frame_control, input)?;
    let (input, capability_info) = parse_u16(input)?;
    let (input, (status_code, association_id)) = parse_u16_pair(input)?;
    let station_info = parse_station_info(input)?;

    Ok(Frame::AssociationResponse(AssociationResponse {
        header,
        capability_info: CapabilityInfo(capability_info),
        status_code,
        association_id,
        station_info,
    }))
}

/// Parse a [Disassociation] frame.
///
/// The general structure is:
/// - ManagementHeader
/// - Reason code
pub fn parse_disassociation(frame_control: FrameControl, input: &[u8]) -> Result<Frame, Error> {
    let (input, header) = parse_management_header(frame_control, input)?;
    let (_, reason_code) = parse_u16(input)?;

    Ok(Frame::Disassociation(Disassociation {
        header,
        reason_code,
    }))
}
