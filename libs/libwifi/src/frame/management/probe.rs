use libwifi_macros::AddressHeader;

use crate::error::Error;
use crate::frame::components::*;

#[derive(Clone, Debug, AddressHeader)]
pub struct ProbeRequest {
    pub header: ManagementHeader,
    pub station_info: StationInfo,
}

impl ProbeRequest {
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = self.header.encode();
        bytes.extend(self.station_info.encode()?);
        Ok(bytes)
    }
}

/// Same body as a [Beacon](super::Beacon), sent as a unicast answer to a probe request.
#[derive(Clone, Debug, AddressHeader)]
pub struct ProbeResponse {
    pub header: ManagementHeader,
    pub timestamp: u64,
    /// In time units of 1024 µs.
    pub beacon_interval: u16,
    pub capability_info: CapabilityInfo,
    pub station_info: StationInfo,
}

impl ProbeResponse {
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = self.header.encode();
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&self.beacon_interval.to_le_bytes());
        bytes.extend_from_slice(&self.capability_info.encode());
        bytes.extend(self.station_info.encode()?);
        Ok(bytes)
    }
}
