use nom::bytes::complete::take;
use nom::number::complete::be_u16;
use nom::sequence::tuple;
use nom::IResult;

use crate::error::Error;
use crate::frame::components::{FrameControl, MacAddress};
use crate::frame::*;
use crate::parsers::{parse_data_header, parse_mac};

pub fn parse_data(frame_control: FrameControl, input: &[u8]) -> Result<Frame, Error> {
    let (remaining, header) = parse_data_header(frame_control, input)?;

    Ok(Frame::Data(Data {
        header,
        data: remaining.to_vec(),
    }))
}

pub fn parse_null_data(frame_control: FrameControl, input: &[u8]) -> Result<Frame, Error> {
    let (_, header) = parse_data_header(frame_control, input)?;

    Ok(Frame::NullData(NullData { header }))
}

pub fn parse_qos_data(frame_control: FrameControl, input: &[u8]) -> Result<Frame, Error> {
    let (remaining, header) = parse_data_header(frame_control, input)?;

    Ok(Frame::QosData(QosData {
        header,
        data: remaining.to_vec(),
    }))
}

pub fn parse_qos_null(frame_control: FrameControl, input: &[u8]) -> Result<Frame, Error> {
    let (_, header) = parse_data_header(frame_control, input)?;

    Ok(Frame::QosNull(QosNull { header }))
}

fn parse_amsdu_subframe(input: &[u8]) -> IResult<&[u8], (MacAddress, MacAddress, &[u8])> {
    let (input, (destination, source, length)) = tuple((parse_mac, parse_mac, be_u16))(input)?;
    let (input, payload) = take(length)(input)?;
    Ok((input, (destination, source, payload)))
}

/// Decompose an A-MSDU body into its sub-frames.
///
/// Each sub-frame except the last is followed by padding up to a four byte boundary.
/// The padding of the final sub-frame may be missing.
pub fn parse_amsdu(mut input: &[u8]) -> Result<Vec<AmsduSubframe>, Error> {
    let mut subframes = Vec::new();

    while !input.is_empty() {
        let (rest, (destination, source, payload)) = parse_amsdu_subframe(input)?;
        subframes.push(AmsduSubframe {
            destination,
            source,
            payload: payload.to_vec(),
        });

        let consumed = AmsduSubframe::HEADER_LENGTH + payload.len();
        let padding = ((4 - (consumed % 4)) % 4).min(rest.len());
        input = &rest[padding..];
    }

    Ok(subframes)
}
