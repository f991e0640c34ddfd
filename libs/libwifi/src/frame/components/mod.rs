mod capability_info;
mod elements;
mod frame_control;
mod header;
mod mac_address;
mod sequence_control;
mod station_info;

pub use capability_info::CapabilityInfo;
pub use elements::*;
pub use frame_control::FrameControl;
pub use header::*;
pub use mac_address::*;
pub use sequence_control::SequenceControl;
pub use station_info::{StationInfo, SupportedRate, MAX_SSID_LENGTH};
