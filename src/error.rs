use libwifi::frame::components::MacAddress;
use strum_macros::Display;
use thiserror::Error;

/// Why a frame broke the rules of the BSS it arrived in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum ViolationKind {
    /// Address 1 is neither ours nor a group address.
    NotForUs,
    /// Data from a BSS we are not associated with.
    ForeignBss,
    /// DS flags that don't fit the receiving role.
    WrongDirection,
    /// Both DS flags set, infrastructure-to-infrastructure relay.
    Wds,
    /// Management frame aimed at the other role.
    WrongRole,
    /// The controller is stopped.
    Inactive,
    /// Frame subtype this MAC doesn't act on.
    Unexpected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum MismatchKind {
    BasicRate,
    HtBasicMcs,
    VhtBasicMcs,
}

/// Everything that can go wrong while handling a frame.
///
/// None of these escape the MAC. The entity boundary turns them into drop notifications.
#[derive(Error, Debug)]
pub enum MacError {
    #[error("Protocol violation: {0}")]
    ProtocolViolation(ViolationKind),
    #[error("Malformed frame: {0}")]
    Malformed(#[from] libwifi::error::Error),
    #[error("Capability mismatch: {0}")]
    CapabilityMismatch(MismatchKind),
    #[error("Unknown peer {0}")]
    UnknownPeer(MacAddress),
    #[error("Not associated")]
    NotAssociated,
}

impl MacError {
    /// Short label used in drop notifications.
    pub fn reason(&self) -> String {
        match self {
            MacError::ProtocolViolation(kind) => kind.to_string(),
            MacError::Malformed(_) => "Malformed".to_owned(),
            MacError::CapabilityMismatch(kind) => format!("Mismatch{kind}"),
            MacError::UnknownPeer(_) => "UnknownPeer".to_owned(),
            MacError::NotAssociated => "NotAssociated".to_owned(),
        }
    }
}
