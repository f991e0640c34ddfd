use libwifi_macros::AddressHeader;

use crate::frame::components::*;
use crate::parsers::parse_amsdu;
use crate::error::Error;

use super::{AmsduSubframe, DataFrame, NullDataFrame};

#[derive(Clone, Debug, AddressHeader)]
pub struct QosData {
    pub header: DataHeader,
    pub data: Vec<u8>,
}

impl QosData {
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.header.encode();
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Traffic identifier from the QoS control field.
    pub fn tid(&self) -> u8 {
        self.header.tid().unwrap_or(0)
    }

    pub fn is_amsdu(&self) -> bool {
        self.header.is_amsdu()
    }

    /// Split the body into its A-MSDU sub-frames.
    /// Fails if the frame doesn't carry an aggregate or the aggregate is malformed.
    pub fn subframes(&self) -> Result<Vec<AmsduSubframe>, Error> {
        if !self.is_amsdu() {
            return Err(Error::UnhandledProtocol(
                "QoS data body is not an A-MSDU".to_string(),
            ));
        }
        parse_amsdu(&self.data)
    }
}

impl DataFrame for QosData {
    fn header(&self) -> &DataHeader {
        &self.header
    }
    fn data(&self) -> &Vec<u8> {
        &self.data
    }
}

#[derive(Clone, Debug, AddressHeader)]
pub struct QosNull {
    pub header: DataHeader,
}

impl NullDataFrame for QosNull {
    fn header(&self) -> &DataHeader {
        &self.header
    }
}
