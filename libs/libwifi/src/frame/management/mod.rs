mod association;
mod beacon;
mod probe;

pub use association::{
    reason_code, status_code, AssociationRequest, AssociationResponse, Disassociation,
};
pub use beacon::Beacon;
pub use probe::{ProbeRequest, ProbeResponse};
