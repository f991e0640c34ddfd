use nom::bytes::complete::take;
use nom::number::complete::u8 as get_u8;
use nom::sequence::tuple;
use nom::IResult;

use crate::error::Error;
use crate::frame::components::{
    element_id, AcParameterRecord, EdcaParameterElement, ErpInformation, HtCapabilities,
    HtOperation, StationInfo, SupportedRate, VhtCapabilities,
};
use crate::parsers::clone_slice;

/// Parse variable length and variable field information.
/// The general structure of the data looks like this:
///
/// 1 byte: Element id
/// 1 byte: Element length (up to 255 bytes)
/// $element_length bytes: Element data
///
/// This format is only used in management frames. All remaining input is consumed.
///
/// Known elements with an impossible length are rejected, unknown elements are kept
/// verbatim in [StationInfo::data].
pub fn parse_station_info(mut input: &[u8]) -> Result<StationInfo, Error> {
    let mut station_info = StationInfo::default();

    let mut id;
    let mut data;
    while !input.is_empty() {
        (input, (id, data)) = parse_element(input)?;
        match id {
            element_id::SSID => {
                station_info.ssid = Some(String::from_utf8_lossy(data).to_string());
            }
            element_id::SUPPORTED_RATES => {
                station_info.supported_rates = parse_supported_rates(data);
            }
            element_id::DSSS_PARAMETER_SET => {
                let channel = expect_length::<1>(id, data)?;
                station_info.ds_parameter_set = Some(channel[0]);
            }
            element_id::EDCA_PARAMETER_SET => {
                station_info.edca_parameter_set = Some(parse_edca_parameter_set(data)?);
            }
            element_id::ERP_INFORMATION => {
                let erp = expect_length::<1>(id, data)?;
                station_info.erp_information = Some(ErpInformation::from_byte(erp[0]));
            }
            element_id::HT_CAPABILITIES => {
                station_info.ht_capabilities = Some(parse_ht_capabilities(data)?);
            }
            element_id::EXTENDED_SUPPORTED_RATES => {
                station_info.extended_supported_rates = Some(parse_supported_rates(data));
            }
            element_id::HT_OPERATION => {
                station_info.ht_operation = Some(parse_ht_operation(data)?);
            }
            element_id::VHT_CAPABILITIES => {
                station_info.vht_capabilities = Some(parse_vht_capabilities(data)?);
            }
            _ => {
                log::trace!("Keeping unhandled element {id} ({} bytes)", data.len());
                station_info.data.push((id, data.to_vec()));
            }
        };
    }

    Ok(station_info)
}

/// Split off one element: id, length byte and the body it announces.
fn parse_element(input: &[u8]) -> IResult<&[u8], (u8, &[u8])> {
    let (input, (id, length)) = tuple((get_u8, get_u8))(input)?;
    let (input, data) = take(length)(input)?;
    Ok((input, (id, data)))
}

fn expect_length<const X: usize>(id: u8, data: &[u8]) -> Result<[u8; X], Error> {
    if data.len() != X {
        return Err(Error::InvalidElement {
            id,
            reason: format!("expected {X} bytes, got {}", data.len()),
        });
    }
    Ok(clone_slice::<X>(data))
}

fn parse_supported_rates(data: &[u8]) -> Vec<SupportedRate> {
    data.iter().map(|byte| SupportedRate::from_byte(*byte)).collect()
}

fn parse_edca_parameter_set(data: &[u8]) -> Result<EdcaParameterElement, Error> {
    let bytes = expect_length::<{ EdcaParameterElement::LENGTH }>(
        element_id::EDCA_PARAMETER_SET,
        data,
    )?;

    let mut records = [AcParameterRecord::default(); 4];
    for (index, record) in records.iter_mut().enumerate() {
        let offset = 2 + index * 4;
        *record = AcParameterRecord::from_bytes(clone_slice::<4>(&bytes[offset..]));
    }

    Ok(EdcaParameterElement {
        qos_info: bytes[0],
        records,
    })
}

fn parse_ht_capabilities(data: &[u8]) -> Result<HtCapabilities, Error> {
    let bytes =
        expect_length::<{ HtCapabilities::LENGTH }>(element_id::HT_CAPABILITIES, data)?;

    Ok(HtCapabilities {
        capabilities_info: u16::from_le_bytes([bytes[0], bytes[1]]),
        ampdu_parameters: bytes[2],
        supported_mcs_set: clone_slice::<16>(&bytes[3..19]),
        extended_capabilities: u16::from_le_bytes([bytes[19], bytes[20]]),
        tx_beamforming: u32::from_le_bytes(clone_slice::<4>(&bytes[21..25])),
        asel: bytes[25],
    })
}

fn parse_ht_operation(data: &[u8]) -> Result<HtOperation, Error> {
    let bytes = expect_length::<{ HtOperation::LENGTH }>(element_id::HT_OPERATION, data)?;

    Ok(HtOperation {
        primary_channel: bytes[0],
        information: clone_slice::<5>(&bytes[1..6]),
        basic_mcs_set: clone_slice::<16>(&bytes[6..22]),
    })
}

fn parse_vht_capabilities(data: &[u8]) -> Result<VhtCapabilities, Error> {
    let bytes =
        expect_length::<{ VhtCapabilities::LENGTH }>(element_id::VHT_CAPABILITIES, data)?;

    Ok(VhtCapabilities {
        capabilities_info: u32::from_le_bytes(clone_slice::<4>(&bytes[0..4])),
        rx_mcs_map: u16::from_le_bytes([bytes[4], bytes[5]]),
        rx_highest_rate: u16::from_le_bytes([bytes[6], bytes[7]]),
        tx_mcs_map: u16::from_le_bytes([bytes[8], bytes[9]]),
        tx_highest_rate: u16::from_le_bytes([bytes[10], bytes[11]]),
    })
}
