use libwifi::frame::{
    components::{
        CapabilityInfo, DataHeader, FrameControl, MacAddress, ManagementHeader, SequenceControl,
        StationInfo,
    },
    AssociationRequest, AssociationResponse, Beacon, Data, Disassociation, ProbeRequest,
    ProbeResponse, QosData,
};
use libwifi::error::Error;
use libwifi::FrameSubType;

// Management frames carry no NAV reservation here, the contention layer fills it in.
const NO_DURATION: [u8; 2] = [0, 0];

fn management_header(
    subtype: FrameSubType,
    destination: &MacAddress,
    source: &MacAddress,
    bssid: &MacAddress,
    sequence: u16,
) -> ManagementHeader {
    ManagementHeader {
        frame_control: FrameControl::new(subtype, 0),
        duration: NO_DURATION,
        address_1: *destination,
        address_2: *source,
        address_3: *bssid,
        sequence_control: SequenceControl::new(sequence),
    }
}

/// Fixed fields of beacons and probe responses.
#[derive(Clone, Copy, Debug)]
pub struct BssFields {
    pub timestamp: u64,
    pub beacon_interval: u16,
    pub capability_info: CapabilityInfo,
}

pub fn build_beacon(
    bssid: &MacAddress,
    sequence: u16,
    fields: BssFields,
    station_info: StationInfo,
) -> Result<Vec<u8>, Error> {
    let beacon = Beacon {
        header: management_header(
            FrameSubType::Beacon,
            &MacAddress::broadcast(),
            bssid,
            bssid,
            sequence,
        ),
        timestamp: fields.timestamp,
        beacon_interval: fields.beacon_interval,
        capability_info: fields.capability_info,
        station_info,
    };
    beacon.encode()
}

pub fn build_probe_request_undirected(
    source: &MacAddress,
    sequence: u16,
    station_info: StationInfo,
) -> Result<Vec<u8>, Error> {
    let probe = ProbeRequest {
        header: management_header(
            FrameSubType::ProbeRequest,
            &MacAddress::broadcast(),
            source,
            &MacAddress::broadcast(),
            sequence,
        ),
        station_info,
    };
    probe.encode()
}

pub fn build_probe_response(
    client: &MacAddress,
    bssid: &MacAddress,
    sequence: u16,
    fields: BssFields,
    station_info: StationInfo,
) -> Result<Vec<u8>, Error> {
    let response = ProbeResponse {
        header: management_header(FrameSubType::ProbeResponse, client, bssid, bssid, sequence),
        timestamp: fields.timestamp,
        beacon_interval: fields.beacon_interval,
        capability_info: fields.capability_info,
        station_info,
    };
    response.encode()
}

pub fn build_association_request(
    bssid: &MacAddress,
    client: &MacAddress,
    sequence: u16,
    capability_info: CapabilityInfo,
    station_info: StationInfo,
) -> Result<Vec<u8>, Error> {
    let request = AssociationRequest {
        header: management_header(
            FrameSubType::AssociationRequest,
            bssid,
            client,
            bssid,
            sequence,
        ),
        capability_info,
        listen_interval: 10,
        station_info,
    };
    request.encode()
}

pub fn build_association_response(
    client: &MacAddress,
    bssid: &MacAddress,
    sequence: u16,
    capability_info: CapabilityInfo,
    status_code: u16,
    association_id: u16,
    station_info: StationInfo,
) -> Result<Vec<u8>, Error> {
    let response = AssociationResponse {
        header: management_header(
            FrameSubType::AssociationResponse,
            client,
            bssid,
            bssid,
            sequence,
        ),
        capability_info,
        status_code,
        // The two most significant bits are always set on the wire
        association_id: if association_id == 0 {
            0
        } else {
            association_id | 0xC000
        },
        station_info,
    };
    response.encode()
}

pub fn build_disassociation(
    destination: &MacAddress,
    source: &MacAddress,
    bssid: &MacAddress,
    sequence: u16,
    reason_code: u16,
) -> Vec<u8> {
    let frame = Disassociation {
        header: management_header(
            FrameSubType::Disassociation,
            destination,
            source,
            bssid,
            sequence,
        ),
        reason_code,
    };
    frame.encode()
}

/// Addressing of a three-address data frame.
#[derive(Clone, Copy, Debug)]
pub struct DataAddressing {
    pub receiver: MacAddress,
    pub transmitter: MacAddress,
    pub address_3: MacAddress,
    /// Frame control flags, [FrameControl::TO_DS] or [FrameControl::FROM_DS].
    pub ds_flags: u8,
}

/// Build a data frame. With a TID the frame becomes QoS data with normal ack policy.
pub fn build_data(
    addressing: DataAddressing,
    sequence: u16,
    tid: Option<u8>,
    amsdu: bool,
    payload: Vec<u8>,
) -> Vec<u8> {
    let subtype = if tid.is_some() {
        FrameSubType::QosData
    } else {
        FrameSubType::Data
    };

    let header = DataHeader {
        frame_control: FrameControl::new(subtype, addressing.ds_flags),
        duration: NO_DURATION,
        address_1: addressing.receiver,
        address_2: addressing.transmitter,
        address_3: addressing.address_3,
        sequence_control: SequenceControl::new(sequence),
        address_4: None,
        qos: tid.map(|tid| DataHeader::qos_control(tid, amsdu)),
    };

    match tid {
        Some(_) => QosData {
            header,
            data: payload,
        }
        .encode(),
        None => Data {
            header,
            data: payload,
        }
        .encode(),
    }
}
