//! bss_oxide library components
//!
//! The association control plane of an infrastructure BSS: the station join state machine,
//! the access point beacon/association/relay controller and the capability negotiation they
//! share. Everything is driven by an external scheduler and talks to the medium through
//! narrow collaborator traits, see [mac].

pub mod ap;
pub mod config;
pub mod edca;
pub mod error;
pub mod mac;
pub mod negotiation;
pub mod rates;
pub mod registry;
pub mod relay;
pub mod scheduler;
pub mod sim;
pub mod sta;
pub mod status;
pub mod tx;
