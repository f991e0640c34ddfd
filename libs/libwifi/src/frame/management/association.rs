use libwifi_macros::AddressHeader;

use crate::error::Error;
use crate::frame::components::*;

/// Status codes used in association responses.
pub mod status_code {
    pub const SUCCESS: u16 = 0;
    pub const UNSPECIFIED_FAILURE: u16 = 1;
}

/// Reason codes used in disassociation frames.
pub mod reason_code {
    pub const UNSPECIFIED: u16 = 1;
    pub const LEAVING: u16 = 8;
}

#[derive(Clone, Debug, AddressHeader)]
pub struct AssociationRequest {
    pub header: ManagementHeader,
    pub capability_info: CapabilityInfo,
    pub listen_interval: u16,
    pub station_info: StationInfo,
}

impl AssociationRequest {
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::new();

        // Encode the ManagementHeader
        bytes.extend(self.header.encode());

        // Encode Capability Info
        bytes.extend_from_slice(&self.capability_info.encode());

        // Encode Listen Interval
        bytes.extend_from_slice(&self.listen_interval.to_le_bytes());

        // Encode Station Info
        bytes.extend(self.station_info.encode()?);

        Ok(bytes)
    }
}

#[derive(Clone, Debug, AddressHeader)]
pub struct AssociationResponse {
    pub header: ManagementHeader,
    pub capability_info: CapabilityInfo,
    pub status_code: u16,
    pub association_id: u16,
    pub station_info: StationInfo,
}

impl AssociationResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == status_code::SUCCESS
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::new();

        // Encode the ManagementHeader
        bytes.extend(self.header.encode());

        // Encode Capability Info
        bytes.extend_from_slice(&self.capability_info.encode());

        // Encode Status Code
        bytes.extend_from_slice(&self.status_code.to_le_bytes());

        // Encode Association ID
        bytes.extend_from_slice(&self.association_id.to_le_bytes());

        // Encode Station Info
        bytes.extend(self.station_info.encode()?);

        Ok(bytes)
    }
}

#[derive(Clone, Debug, AddressHeader)]
pub struct Disassociation {
    pub header: ManagementHeader,
    pub reason_code: u16,
}

impl Disassociation {
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.header.encode();
        bytes.extend_from_slice(&self.reason_code.to_le_bytes());
        bytes
    }
}
