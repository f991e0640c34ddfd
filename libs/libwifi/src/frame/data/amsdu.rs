use byteorder::{BigEndian, ByteOrder};

use crate::error::Error;
use crate::frame::components::MacAddress;

/// One MSDU inside an A-MSDU aggregate.
///
/// Layout: destination (6), source (6), length (2, big endian), payload.
/// Every sub-frame but the last is padded to a multiple of four bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmsduSubframe {
    pub destination: MacAddress,
    pub source: MacAddress,
    pub payload: Vec<u8>,
}

impl AmsduSubframe {
    pub const HEADER_LENGTH: usize = 14;

    fn encode_into(&self, bytes: &mut Vec<u8>) -> Result<(), Error> {
        let length = u16::try_from(self.payload.len())
            .map_err(|_| Error::OversizeSubframe(self.payload.len()))?;
        let mut length_field = [0; 2];
        BigEndian::write_u16(&mut length_field, length);

        bytes.extend_from_slice(&self.destination.encode());
        bytes.extend_from_slice(&self.source.encode());
        bytes.extend_from_slice(&length_field);
        bytes.extend_from_slice(&self.payload);
        Ok(())
    }
}

/// Aggregate sub-frames into an A-MSDU body.
///
/// Fails if a payload doesn't fit the 16 bit length field.
pub fn encode_amsdu(subframes: &[AmsduSubframe]) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::new();
    for (index, subframe) in subframes.iter().enumerate() {
        subframe.encode_into(&mut bytes)?;

        if index + 1 < subframes.len() {
            let padding = (4 - (bytes.len() % 4)) % 4;
            bytes.resize(bytes.len() + padding, 0);
        }
    }
    Ok(bytes)
}
