use crate::frame::components::{FrameControl, MacAddress};
use crate::frame::*;
use enum_dispatch::enum_dispatch;

/// Helper trait to easily access source, destination and bssid on frames.
///
/// The returned addresses are already resolved against the `to_ds`/`from_ds` flags.
#[enum_dispatch]
pub trait Addresses {
    /// Returns the original sender of the frame's payload.
    fn src(&self) -> Option<&MacAddress>;

    /// Returns the final destination of the frame's payload.
    fn dest(&self) -> &MacAddress;

    /// Missing in a wireless distribution system (both DS flags set).
    fn bssid(&self) -> Option<&MacAddress>;
}

/// Raw access to the frame control field and the three fixed address slots.
///
/// Receive filters work on the raw slots (receiver, transmitter, address 3) rather than the
/// resolved view of [Addresses].
#[enum_dispatch]
pub trait Header {
    fn frame_control(&self) -> &FrameControl;

    /// The immediate receiver.
    fn address_1(&self) -> &MacAddress;

    /// The immediate transmitter.
    fn address_2(&self) -> &MacAddress;

    fn address_3(&self) -> &MacAddress;
}
