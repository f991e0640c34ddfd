use nom::bytes::complete::take;
use nom::sequence::tuple;
use nom::IResult;

use super::{clone_slice, parse_mac, parse_sequence_control};
use crate::error::Error;
use crate::frame::components::{
    DataHeader, FrameControl, MacAddress, ManagementHeader, SequenceControl,
};

type CommonHeader = ([u8; 2], MacAddress, MacAddress, MacAddress, SequenceControl);

/// Duration, three addresses and sequence control are shared by all headers.
fn parse_common_header(input: &[u8]) -> IResult<&[u8], CommonHeader> {
    let (remaining, (duration, address_1, address_2, address_3, sequence_control)) = tuple((
        take(2usize),
        parse_mac,
        parse_mac,
        parse_mac,
        parse_sequence_control,
    ))(input)?;

    Ok((
        remaining,
        (
            clone_slice::<2>(duration),
            address_1,
            address_2,
            address_3,
            sequence_control,
        ),
    ))
}

fn parse_qos_control(input: &[u8]) -> IResult<&[u8], [u8; 2]> {
    let (remaining, bytes) = take(2usize)(input)?;
    Ok((remaining, clone_slice::<2>(bytes)))
}

/// Parse and return the [ManagementHeader] from a given payload.
pub fn parse_management_header(
    frame_control: FrameControl,
    input: &[u8],
) -> Result<(&[u8], ManagementHeader), Error> {
    let (remaining, (duration, address_1, address_2, address_3, sequence_control)) =
        parse_common_header(input)?;

    Ok((
        remaining,
        ManagementHeader {
            frame_control,
            duration,
            address_1,
            address_2,
            address_3,
            sequence_control,
        },
    ))
}

/// Parse and return the [DataHeader] from a given payload.
pub fn parse_data_header(
    frame_control: FrameControl,
    input: &[u8],
) -> Result<(&[u8], DataHeader), Error> {
    let (mut remaining, (duration, address_1, address_2, address_3, sequence_control)) =
        parse_common_header(input)?;

    // The forth address only exists if both `from_ds` and `to_ds` is set.
    let mut address_4 = None;
    if frame_control.to_ds() && frame_control.from_ds() {
        let (rest, address) = parse_mac(remaining)?;
        address_4 = Some(address);
        remaining = rest;
    };

    // If this is a Qos frame subtype, we go ahead and parse the QoS control field.
    let mut qos = None;
    if frame_control.frame_subtype.is_qos() {
        let (rest, qos_bytes) = parse_qos_control(remaining)?;
        qos = Some(qos_bytes);
        remaining = rest;
    }

    Ok((
        remaining,
        DataHeader {
            frame_control,
            duration,
            address_1,
            address_2,
            address_3,
            sequence_control,
            address_4,
            qos,
        },
    ))
}
