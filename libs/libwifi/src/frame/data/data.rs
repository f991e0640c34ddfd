use libwifi_macros::AddressHeader;

use crate::frame::components::*;

use super::{DataFrame, NullDataFrame};

#[derive(Clone, Debug, AddressHeader)]
pub struct Data {
    pub header: DataHeader,
    pub data: Vec<u8>,
}

impl Data {
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.header.encode();
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

impl DataFrame for Data {
    fn header(&self) -> &DataHeader {
        &self.header
    }
    fn data(&self) -> &Vec<u8> {
        &self.data
    }
}

#[derive(Clone, Debug, AddressHeader)]
pub struct NullData {
    pub header: DataHeader,
}

impl NullDataFrame for NullData {
    fn header(&self) -> &DataHeader {
        &self.header
    }
}
