//! The MAC entity and the collaborators it talks to.
//!
//! A [WifiMac] is one address plus a [Role]. Both roles implement [MacRole]; the entity routes
//! received bytes, timer firings and transmit outcomes to its role and turns every error the
//! role returns into a drop notification, so nothing escapes to the caller.

use enum_dispatch::enum_dispatch;
use libwifi::frame::components::MacAddress;
use libwifi::{parse_frame, Frame, FrameSubType, FrameType, Header};

use crate::ap::ApMac;
use crate::config::{ApConfig, StaConfig, TxPath};
use crate::edca::AccessCategory;
use crate::error::MacError;
use crate::rates::PhyCapabilities;
use crate::scheduler::{EventId, Scheduler};
use crate::sta::StaMac;
use crate::status::{MacEvent, MacListener};

/// The queue a frame is handed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxQueueId {
    Beacon,
    Dcf,
    Edca(AccessCategory),
}

/// An encoded frame on its way to the transmission collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Encoded frame without FCS.
    pub bytes: Vec<u8>,
    pub receiver: MacAddress,
    pub queue: TxQueueId,
    pub subtype: FrameSubType,
    pub path: TxPath,
}

/// Reported by the transmission collaborator for every individually addressed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxOutcome {
    pub receiver: MacAddress,
    pub subtype: FrameSubType,
    pub success: bool,
}

pub trait TxQueue {
    fn enqueue(&mut self, frame: OutboundFrame);
}

impl TxQueue for Vec<OutboundFrame> {
    fn enqueue(&mut self, frame: OutboundFrame) {
        self.push(frame);
    }
}

pub trait UpperLayer {
    fn forward_up(&mut self, payload: Vec<u8>, source: MacAddress, destination: MacAddress);
}

/// Everything a handler may touch outside of its own state.
pub struct MacContext<'a> {
    pub scheduler: &'a mut dyn Scheduler,
    pub tx: &'a mut dyn TxQueue,
    pub upper: &'a mut dyn UpperLayer,
    pub listener: &'a mut dyn MacListener,
}

impl<'a> MacContext<'a> {
    pub fn notify(&mut self, event: MacEvent) {
        self.listener.notify(event);
    }
}

/// The capability set every role provides.
#[enum_dispatch]
pub trait MacRole {
    fn address(&self) -> MacAddress;

    fn start(&mut self, ctx: &mut MacContext);

    fn on_management_frame(&mut self, ctx: &mut MacContext, frame: Frame) -> Result<(), MacError>;

    fn on_data_frame(&mut self, ctx: &mut MacContext, frame: Frame) -> Result<(), MacError>;

    /// Returns false if the event doesn't belong to this role.
    fn on_timer(&mut self, ctx: &mut MacContext, event_id: EventId) -> bool;

    fn on_tx_outcome(&mut self, ctx: &mut MacContext, outcome: &TxOutcome);

    fn enqueue_from_above(
        &mut self,
        ctx: &mut MacContext,
        payload: Vec<u8>,
        to: MacAddress,
        tid: Option<u8>,
    ) -> Result<(), MacError>;

    fn set_tx_path(&mut self, path: TxPath);
}

#[enum_dispatch(MacRole)]
#[derive(Debug)]
pub enum Role {
    Station(StaMac),
    AccessPoint(ApMac),
}

#[derive(Debug)]
pub struct WifiMac {
    role: Role,
}

impl WifiMac {
    pub fn station(address: MacAddress, phy: PhyCapabilities, config: StaConfig) -> Self {
        WifiMac {
            role: Role::Station(StaMac::new(address, phy, config)),
        }
    }

    pub fn access_point(address: MacAddress, phy: PhyCapabilities, config: ApConfig) -> Self {
        WifiMac {
            role: Role::AccessPoint(ApMac::new(address, phy, config)),
        }
    }

    pub fn address(&self) -> MacAddress {
        self.role.address()
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn as_station(&self) -> Option<&StaMac> {
        match &self.role {
            Role::Station(sta) => Some(sta),
            Role::AccessPoint(_) => None,
        }
    }

    pub fn as_station_mut(&mut self) -> Option<&mut StaMac> {
        match &mut self.role {
            Role::Station(sta) => Some(sta),
            Role::AccessPoint(_) => None,
        }
    }

    pub fn as_access_point(&self) -> Option<&ApMac> {
        match &self.role {
            Role::AccessPoint(ap) => Some(ap),
            Role::Station(_) => None,
        }
    }

    pub fn as_access_point_mut(&mut self) -> Option<&mut ApMac> {
        match &mut self.role {
            Role::AccessPoint(ap) => Some(ap),
            Role::Station(_) => None,
        }
    }

    pub fn start(&mut self, ctx: &mut MacContext) {
        self.role.start(ctx);
    }

    pub fn set_tx_path(&mut self, path: TxPath) {
        log::debug!("{} tx path set to {}", self.address(), path);
        self.role.set_tx_path(path);
    }

    /// Decode and handle a received frame.
    pub fn receive(&mut self, ctx: &mut MacContext, bytes: &[u8], fcs_included: bool) {
        match parse_frame(bytes, fcs_included) {
            Ok(frame) => self.receive_frame(ctx, frame),
            Err(err) => self.drop_rx(ctx, MacError::Malformed(err)),
        }
    }

    pub fn receive_frame(&mut self, ctx: &mut MacContext, frame: Frame) {
        let result = match frame.frame_control().frame_type {
            FrameType::Management => self.role.on_management_frame(ctx, frame),
            FrameType::Data => self.role.on_data_frame(ctx, frame),
            _ => Err(MacError::ProtocolViolation(
                crate::error::ViolationKind::Unexpected,
            )),
        };
        if let Err(err) = result {
            self.drop_rx(ctx, err);
        }
    }

    /// Returns false if the event belongs to nobody here.
    pub fn timer_fired(&mut self, ctx: &mut MacContext, event_id: EventId) -> bool {
        self.role.on_timer(ctx, event_id)
    }

    pub fn tx_outcome(&mut self, ctx: &mut MacContext, outcome: &TxOutcome) {
        self.role.on_tx_outcome(ctx, outcome);
    }

    /// Send a payload coming from the upper layer. `tid` defaults to 0.
    pub fn enqueue(
        &mut self,
        ctx: &mut MacContext,
        payload: Vec<u8>,
        to: MacAddress,
        tid: Option<u8>,
    ) {
        if let Err(err) = self.role.enqueue_from_above(ctx, payload, to, tid) {
            log::debug!("{} dropped outbound payload for {}: {}", self.address(), to, err);
            ctx.notify(MacEvent::TxDrop(err.reason()));
        }
    }

    fn drop_rx(&self, ctx: &mut MacContext, err: MacError) {
        log::debug!("{} dropped frame: {}", self.address(), err);
        ctx.notify(MacEvent::RxDrop(err.reason()));
    }
}

/// Wrapping 12 bit sequence counter.
#[derive(Debug, Default)]
pub struct SequenceCounter(u16);

impl SequenceCounter {
    pub fn advance(&mut self) -> u16 {
        let sequence = self.0;
        self.0 = (self.0 + 1) & 0x0FFF;
        sequence
    }
}
