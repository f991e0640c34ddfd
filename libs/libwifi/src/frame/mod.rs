use enum_dispatch::enum_dispatch;

/// Contains structs representing recurring sets of structured data.
/// For instance, MAC-Addresses, default headers, information elements, etc.
pub mod components;

/// Data frames structs
mod data;
/// Management frame structs
mod management;

pub use data::*;
pub use management::*;

use crate::error::Error;
use crate::frame_types::FrameSubType;
use crate::traits::Header;

#[enum_dispatch(Addresses, Header)]
#[derive(Clone, Debug)]
/// This represents all payloads the association control plane exchanges.
/// Each variant is represented by its own struct.
///
/// The structs are organized by their frame type in submodules.
pub enum Frame {
    // Management frames
    Beacon(Beacon),
    ProbeRequest(ProbeRequest),
    ProbeResponse(ProbeResponse),
    AssociationRequest(AssociationRequest),
    AssociationResponse(AssociationResponse),
    Disassociation(Disassociation),

    // Data Frames
    Data(Data),
    QosData(QosData),
    NullData(NullData),
    QosNull(QosNull),
}

impl Frame {
    pub fn subtype(&self) -> FrameSubType {
        self.frame_control().frame_subtype
    }

    /// Encode the frame without FCS.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let bytes = match self {
            Frame::Beacon(frame) => frame.encode()?,
            Frame::ProbeRequest(frame) => frame.encode()?,
            Frame::ProbeResponse(frame) => frame.encode()?,
            Frame::AssociationRequest(frame) => frame.encode()?,
            Frame::AssociationResponse(frame) => frame.encode()?,
            Frame::Disassociation(frame) => frame.encode(),
            Frame::Data(frame) => frame.encode(),
            Frame::QosData(frame) => frame.encode(),
            Frame::NullData(frame) => frame.header.encode(),
            Frame::QosNull(frame) => frame.header.encode(),
        };
        Ok(bytes)
    }
}
