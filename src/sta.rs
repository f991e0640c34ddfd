//! Station side of the association control plane.
//!
//! [StaMac] finds an access point through beacons (or active probing), associates with it,
//! keeps a watchdog on the beacon stream and starts over once too many beacons were missed.
//! Requests are retried on fixed timeouts until an answer arrives, there is no retry cap.

use std::time::Duration;

use libwifi::frame::components::{CapabilityInfo, FrameControl, MacAddress, StationInfo};
use libwifi::error::Error;
use libwifi::frame::{AssociationResponse, Beacon, Disassociation, ProbeResponse};
use libwifi::{Frame, FrameSubType, Header};
use strum_macros::Display;

use crate::config::{StaConfig, TxPath, TIME_UNIT};
use crate::edca::{AccessCategory, EdcaParameterSet, LinkParameters, LONG_SLOT, SHORT_SLOT};
use crate::error::{MacError, ViolationKind};
use crate::mac::{MacContext, MacRole, OutboundFrame, SequenceCounter, TxOutcome, TxQueueId};
use crate::negotiation::{self, PeerCapabilities};
use crate::rates::{ModulationClass, PhyCapabilities, RateSet};
use crate::scheduler::{EventId, Timer};
use crate::status::MacEvent;
use crate::tx::{
    build_association_request, build_data, build_probe_request_undirected, DataAddressing,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum AssociationState {
    Associated,
    WaitProbeResponse,
    BeaconMissed,
    WaitAssociationResponse,
    Refused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
enum StaTimeout {
    ProbeRequest,
    AssocRequest,
    BeaconWatchdog,
}

/// The parts of a beacon or probe response a station acts on.
///
/// The beacon interval is already converted from time units.
#[derive(Clone, Debug, PartialEq)]
pub struct BeaconInfo {
    pub bssid: MacAddress,
    pub beacon_interval: Duration,
    pub capability_info: CapabilityInfo,
    pub station_info: StationInfo,
}

impl BeaconInfo {
    pub fn from_beacon(beacon: &Beacon) -> Self {
        BeaconInfo {
            bssid: beacon.header.address_3,
            beacon_interval: TIME_UNIT * beacon.beacon_interval as u32,
            capability_info: beacon.capability_info,
            station_info: beacon.station_info.clone(),
        }
    }

    pub fn from_probe_response(response: &ProbeResponse) -> Self {
        BeaconInfo {
            bssid: response.header.address_3,
            beacon_interval: TIME_UNIT * response.beacon_interval as u32,
            capability_info: response.capability_info,
            station_info: response.station_info.clone(),
        }
    }

    pub fn ssid(&self) -> &str {
        self.station_info.ssid()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaCounters {
    pub probe_requests: u32,
    pub association_requests: u32,
    pub beacons: u32,
}

#[derive(Debug)]
pub struct StaMac {
    address: MacAddress,
    phy: PhyCapabilities,
    config: StaConfig,
    tx_path: TxPath,
    state: AssociationState,
    bssid: MacAddress,
    timer: Timer<StaTimeout>,
    probe_request_event: Option<EventId>,
    assoc_request_event: Option<EventId>,
    beacon_watchdog: Option<EventId>,
    beacon_watchdog_end: Duration,
    link: LinkParameters,
    ap_capabilities: Option<PeerCapabilities>,
    sequence: SequenceCounter,
    counters: StaCounters,
}

impl StaMac {
    pub fn new(address: MacAddress, phy: PhyCapabilities, config: StaConfig) -> Self {
        let dsss_only = phy.dsss_supported() && !phy.erp_supported();
        StaMac {
            address,
            link: LinkParameters::initial(dsss_only),
            phy,
            config,
            tx_path: TxPath::default(),
            state: AssociationState::BeaconMissed,
            bssid: MacAddress::zeroed(),
            timer: Timer::new(),
            probe_request_event: None,
            assoc_request_event: None,
            beacon_watchdog: None,
            beacon_watchdog_end: Duration::ZERO,
            ap_capabilities: None,
            sequence: SequenceCounter::default(),
            counters: StaCounters::default(),
        }
    }

    pub fn state(&self) -> AssociationState {
        self.state
    }

    pub fn is_associated(&self) -> bool {
        self.state == AssociationState::Associated
    }

    pub fn bssid(&self) -> MacAddress {
        self.bssid
    }

    pub fn config(&self) -> &StaConfig {
        &self.config
    }

    pub fn phy(&self) -> &PhyCapabilities {
        &self.phy
    }

    pub fn link_parameters(&self) -> &LinkParameters {
        &self.link
    }

    /// What we share with the access point, known once associated.
    pub fn ap_capabilities(&self) -> Option<&PeerCapabilities> {
        self.ap_capabilities.as_ref()
    }

    pub fn counters(&self) -> StaCounters {
        self.counters
    }

    /// Number of armed timers, at most one per kind.
    pub fn pending_timers(&self) -> usize {
        self.timer.pending()
    }

    pub fn beacon_watchdog_end(&self) -> Duration {
        self.beacon_watchdog_end
    }

    pub fn set_active_probing(&mut self, ctx: &mut MacContext, enable: bool) {
        self.config.active_probing = enable;
        if enable {
            self.ensure_associated(ctx);
        } else {
            self.cancel(ctx, StaTimeout::ProbeRequest);
            if self.state == AssociationState::WaitProbeResponse {
                self.set_state(ctx, AssociationState::BeaconMissed);
            }
        }
    }

    /// Start over from scratch. This is the only way out of [AssociationState::Refused].
    pub fn reset(&mut self, ctx: &mut MacContext) {
        log::debug!("{} reset", self.address);
        self.timer.cancel_all(ctx.scheduler);
        self.probe_request_event = None;
        self.assoc_request_event = None;
        self.beacon_watchdog = None;
        self.beacon_watchdog_end = ctx.scheduler.now();
        self.set_state(ctx, AssociationState::BeaconMissed);
        self.ensure_associated(ctx);
    }

    /// Idempotent. Only acts when beacons were missed.
    pub fn ensure_associated(&mut self, ctx: &mut MacContext) {
        match self.state {
            AssociationState::Associated
            | AssociationState::WaitProbeResponse
            | AssociationState::WaitAssociationResponse
            | AssociationState::Refused => {}
            AssociationState::BeaconMissed => {
                log::info!("{} link down", self.address);
                ctx.notify(MacEvent::LinkDown);
                if self.config.active_probing {
                    self.set_state(ctx, AssociationState::WaitProbeResponse);
                    self.send_probe_request(ctx);
                }
            }
        }
    }

    /// Push the beacon loss deadline out to at least `now + delay`.
    ///
    /// Only one watchdog is ever pending. When it fires before the deadline it re-arms
    /// itself for the remainder.
    pub fn restart_watchdog(&mut self, ctx: &mut MacContext, delay: Duration) {
        let now = ctx.scheduler.now();
        self.beacon_watchdog_end = self.beacon_watchdog_end.max(now + delay);
        if self.beacon_watchdog.is_none() {
            let remaining = self.beacon_watchdog_end - now;
            self.arm(ctx, StaTimeout::BeaconWatchdog, remaining);
        }
    }

    fn slot_mut(&mut self, timeout: StaTimeout) -> &mut Option<EventId> {
        match timeout {
            StaTimeout::ProbeRequest => &mut self.probe_request_event,
            StaTimeout::AssocRequest => &mut self.assoc_request_event,
            StaTimeout::BeaconWatchdog => &mut self.beacon_watchdog,
        }
    }

    fn arm(&mut self, ctx: &mut MacContext, timeout: StaTimeout, delay: Duration) {
        self.cancel(ctx, timeout);
        let event_id = self.timer.schedule_event(ctx.scheduler, delay, timeout);
        *self.slot_mut(timeout) = Some(event_id);
        log::debug!("{} armed {} in {:?}", self.address, timeout, delay);
    }

    fn cancel(&mut self, ctx: &mut MacContext, timeout: StaTimeout) {
        if let Some(event_id) = self.slot_mut(timeout).take() {
            self.timer.cancel_event(ctx.scheduler, event_id);
            log::debug!("{} cancelled {}", self.address, timeout);
        }
    }

    fn set_state(&mut self, ctx: &mut MacContext, state: AssociationState) {
        if state == AssociationState::Associated && self.state != AssociationState::Associated {
            log::info!("{} associated with {}", self.address, self.bssid);
            ctx.notify(MacEvent::Associated(self.bssid));
        } else if state != AssociationState::Associated
            && self.state == AssociationState::Associated
        {
            log::info!("{} deassociated from {}", self.address, self.bssid);
            ctx.notify(MacEvent::Deassociated(self.bssid));
        }
        if self.state != state {
            log::debug!("{} {} -> {}", self.address, self.state, state);
        }
        self.state = state;
    }

    fn missed_beacons(&mut self, ctx: &mut MacContext) {
        let now = ctx.scheduler.now();
        if self.beacon_watchdog_end > now {
            let remaining = self.beacon_watchdog_end - now;
            self.arm(ctx, StaTimeout::BeaconWatchdog, remaining);
            return;
        }
        log::debug!("{} beacon missed", self.address);
        self.cancel(ctx, StaTimeout::ProbeRequest);
        self.cancel(ctx, StaTimeout::AssocRequest);
        self.set_state(ctx, AssociationState::BeaconMissed);
        self.ensure_associated(ctx);
    }

    /// Our rates as advertised in requests: membership selectors first, then every PHY mode.
    pub fn supported_rates(&self) -> RateSet {
        let mut rates = RateSet::new();
        if self.phy.ht_supported() || self.phy.vht_supported() {
            for selector in self.phy.bss_membership_selectors() {
                rates.add_membership_selector(selector);
            }
        }
        for mode in &self.phy.modes {
            rates.add_supported(mode.rate);
        }
        rates
    }

    pub fn capability_info(&self) -> CapabilityInfo {
        let erp = self.phy.erp_supported();
        CapabilityInfo::default()
            .with_short_preamble(self.phy.short_preamble || erp)
            .with_short_slot_time(self.phy.short_slot && erp)
            .with_qos(self.config.qos_supported)
    }

    fn request_elements(&self) -> StationInfo {
        let mut station_info = StationInfo {
            ssid: Some(self.config.ssid.clone()),
            ..Default::default()
        };
        self.supported_rates().write_to(&mut station_info);
        if self.phy.ht_supported() || self.phy.vht_supported() {
            station_info.ht_capabilities = Some(negotiation::ht_capabilities(&self.phy));
        }
        if self.phy.vht_supported() {
            station_info.vht_capabilities = Some(negotiation::vht_capabilities(&self.phy));
        }
        station_info
    }

    fn transmit(
        &self,
        ctx: &mut MacContext,
        bytes: Vec<u8>,
        receiver: MacAddress,
        queue: TxQueueId,
        subtype: FrameSubType,
    ) {
        ctx.tx.enqueue(OutboundFrame {
            bytes,
            receiver,
            queue,
            subtype,
            path: self.tx_path,
        });
    }

    fn encode_failed(&self, ctx: &mut MacContext, subtype: FrameSubType, error: Error) {
        log::error!("{} cannot encode {:?}: {}", self.address, subtype, error);
        ctx.notify(MacEvent::TxDrop(MacError::from(error).reason()));
    }

    fn send_probe_request(&mut self, ctx: &mut MacContext) {
        match build_probe_request_undirected(
            &self.address,
            self.sequence.advance(),
            self.request_elements(),
        ) {
            Ok(bytes) => {
                self.transmit(
                    ctx,
                    bytes,
                    MacAddress::broadcast(),
                    TxQueueId::Dcf,
                    FrameSubType::ProbeRequest,
                );
                self.counters.probe_requests += 1;
                log::debug!("{} sent probe request", self.address);
            }
            Err(error) => self.encode_failed(ctx, FrameSubType::ProbeRequest, error),
        }
        self.arm(ctx, StaTimeout::ProbeRequest, self.config.probe_request_timeout);
    }

    fn send_association_request(&mut self, ctx: &mut MacContext) {
        match build_association_request(
            &self.bssid,
            &self.address,
            self.sequence.advance(),
            self.capability_info(),
            self.request_elements(),
        ) {
            Ok(bytes) => {
                self.transmit(
                    ctx,
                    bytes,
                    self.bssid,
                    TxQueueId::Dcf,
                    FrameSubType::AssociationRequest,
                );
                self.counters.association_requests += 1;
                log::debug!("{} sent association request to {}", self.address, self.bssid);
            }
            Err(error) => self.encode_failed(ctx, FrameSubType::AssociationRequest, error),
        }
        self.arm(ctx, StaTimeout::AssocRequest, self.config.assoc_request_timeout);
    }

    /// Take over the ERP and EDCA parameters the access point announces.
    fn adopt_link_parameters(&mut self, capability_info: CapabilityInfo, station_info: &StationInfo) {
        let mut short_preamble = capability_info.short_preamble();
        if self.phy.erp_supported() {
            let offered = RateSet::from_station_info(station_info);
            let erp_allowed = self
                .phy
                .modes
                .iter()
                .any(|mode| mode.modulation == ModulationClass::ErpOfdm && offered.is_supported(mode.rate));
            if erp_allowed {
                if let Some(erp) = station_info.erp_information {
                    short_preamble &= !erp.barker_preamble_mode;
                    self.link.use_protection = erp.use_protection;
                }
                self.link.slot = if capability_info.short_slot_time() {
                    SHORT_SLOT
                } else {
                    LONG_SLOT
                };
                self.link.configure_contention_window(15, 1023, false);
            } else {
                self.link.slot = LONG_SLOT;
                self.link.configure_contention_window(31, 1023, true);
            }
        }
        self.link.short_preamble = short_preamble;
        self.link.short_slot = capability_info.short_slot_time();

        if self.config.qos_supported {
            if let Some(edca) = &station_info.edca_parameter_set {
                self.link.edca = EdcaParameterSet::from_element(edca);
            }
        }
    }

    pub fn receive_beacon(&mut self, ctx: &mut MacContext, beacon: &BeaconInfo) {
        self.counters.beacons += 1;

        if !self.config.ssid.is_empty() && beacon.ssid() != self.config.ssid {
            log::debug!("{} beacon for another SSID", self.address);
            return;
        }

        // A beacon qualifies with any one of our selectors flagged basic. Probe responses are
        // stricter, see receive_probe_response.
        let selectors = self.phy.bss_membership_selectors();
        let offered = RateSet::from_station_info(&beacon.station_info);
        if !selectors.is_empty()
            && !selectors
                .iter()
                .any(|selector| offered.is_membership_selector(*selector))
        {
            log::debug!("{} no match for BSS membership selector", self.address);
            return;
        }

        if matches!(
            self.state,
            AssociationState::WaitAssociationResponse | AssociationState::Associated
        ) && beacon.bssid != self.bssid
        {
            log::debug!("{} beacon from foreign BSS {}", self.address, beacon.bssid);
            return;
        }

        self.restart_watchdog(ctx, beacon.beacon_interval * self.config.max_missed_beacons);
        self.bssid = beacon.bssid;
        self.adopt_link_parameters(beacon.capability_info, &beacon.station_info);

        if self.state == AssociationState::BeaconMissed {
            self.set_state(ctx, AssociationState::WaitAssociationResponse);
            self.send_association_request(ctx);
        }
    }

    pub fn receive_probe_response(&mut self, ctx: &mut MacContext, response: &BeaconInfo) {
        if self.state != AssociationState::WaitProbeResponse {
            return;
        }
        if response.ssid() != self.config.ssid {
            log::debug!("{} probe response for another SSID", self.address);
            return;
        }
        // Every selector of our PHY must be listed, basic or not.
        let offered = RateSet::from_station_info(&response.station_info);
        if !self
            .phy
            .bss_membership_selectors()
            .iter()
            .all(|selector| offered.is_supported(*selector))
        {
            log::debug!("{} probe response lacks a membership selector", self.address);
            return;
        }

        self.adopt_link_parameters(response.capability_info, &response.station_info);
        self.bssid = response.bssid;
        self.restart_watchdog(ctx, response.beacon_interval * self.config.max_missed_beacons);
        self.cancel(ctx, StaTimeout::ProbeRequest);
        self.set_state(ctx, AssociationState::WaitAssociationResponse);
        self.send_association_request(ctx);
    }

    pub fn receive_association_response(
        &mut self,
        ctx: &mut MacContext,
        response: &AssociationResponse,
    ) {
        if self.state != AssociationState::WaitAssociationResponse {
            return;
        }
        self.cancel(ctx, StaTimeout::AssocRequest);

        if !response.is_success() {
            log::info!(
                "{} association refused by {} (status {})",
                self.address,
                response.header.address_2,
                response.status_code
            );
            self.set_state(ctx, AssociationState::Refused);
            return;
        }

        self.set_state(ctx, AssociationState::Associated);
        self.adopt_link_parameters(response.capability_info, &response.station_info);
        self.ap_capabilities = Some(negotiation::common_capabilities(
            &self.phy,
            response.capability_info,
            &response.station_info,
            self.phy.ht_supported(),
            self.phy.vht_supported(),
        ));
        log::info!("{} link up", self.address);
        ctx.notify(MacEvent::LinkUp);
    }

    /// The access point dropped us. Falls back to BeaconMissed so that the next beacon
    /// (or probe response) starts a new association.
    pub fn receive_disassociation(
        &mut self,
        ctx: &mut MacContext,
        frame: &Disassociation,
    ) -> Result<(), MacError> {
        if frame.header.address_2 != self.bssid {
            return Err(MacError::ProtocolViolation(ViolationKind::ForeignBss));
        }
        if !matches!(
            self.state,
            AssociationState::Associated | AssociationState::WaitAssociationResponse
        ) {
            return Ok(());
        }
        log::info!(
            "{} disassociated by {} (reason {})",
            self.address,
            self.bssid,
            frame.reason_code
        );
        self.cancel(ctx, StaTimeout::AssocRequest);
        self.set_state(ctx, AssociationState::BeaconMissed);
        self.ensure_associated(ctx);
        Ok(())
    }

    /// Receiver checks shared by all frames. `Ok(false)` means we sent it ourselves.
    fn accept(&self, frame: &Frame) -> Result<bool, MacError> {
        if *frame.address_3() == self.address {
            log::debug!("{} ignoring own frame", self.address);
            return Ok(false);
        }
        if *frame.address_1() != self.address && !frame.address_1().is_group() {
            return Err(MacError::ProtocolViolation(ViolationKind::NotForUs));
        }
        Ok(true)
    }
}

impl MacRole for StaMac {
    fn address(&self) -> MacAddress {
        self.address
    }

    fn start(&mut self, ctx: &mut MacContext) {
        log::debug!("{} starting as station for {:?}", self.address, self.config.ssid);
        self.ensure_associated(ctx);
    }

    fn on_management_frame(&mut self, ctx: &mut MacContext, frame: Frame) -> Result<(), MacError> {
        if !self.accept(&frame)? {
            return Ok(());
        }
        match frame {
            Frame::Beacon(beacon) => self.receive_beacon(ctx, &BeaconInfo::from_beacon(&beacon)),
            Frame::ProbeResponse(response) => {
                self.receive_probe_response(ctx, &BeaconInfo::from_probe_response(&response))
            }
            Frame::AssociationResponse(response) => {
                self.receive_association_response(ctx, &response)
            }
            Frame::Disassociation(disassociation) => {
                self.receive_disassociation(ctx, &disassociation)?
            }
            Frame::ProbeRequest(_) | Frame::AssociationRequest(_) => {
                return Err(MacError::ProtocolViolation(ViolationKind::WrongRole))
            }
            _ => return Err(MacError::ProtocolViolation(ViolationKind::Unexpected)),
        }
        Ok(())
    }

    fn on_data_frame(&mut self, ctx: &mut MacContext, frame: Frame) -> Result<(), MacError> {
        if !self.accept(&frame)? {
            return Ok(());
        }
        if !self.is_associated() {
            return Err(MacError::NotAssociated);
        }
        let frame_control = frame.frame_control();
        if !(frame_control.from_ds() && !frame_control.to_ds()) {
            return Err(MacError::ProtocolViolation(ViolationKind::WrongDirection));
        }
        if *frame.address_2() != self.bssid {
            return Err(MacError::ProtocolViolation(ViolationKind::ForeignBss));
        }

        let source = *frame.address_3();
        let destination = *frame.address_1();
        match frame {
            Frame::QosData(data) if data.is_amsdu() => {
                for subframe in data.subframes()? {
                    ctx.upper
                        .forward_up(subframe.payload, subframe.source, subframe.destination);
                }
            }
            Frame::QosData(data) => ctx.upper.forward_up(data.data, source, destination),
            Frame::Data(data) => ctx.upper.forward_up(data.data, source, destination),
            _ => {}
        }
        Ok(())
    }

    fn on_timer(&mut self, ctx: &mut MacContext, event_id: EventId) -> bool {
        let Some(timeout) = self.timer.triggered(&event_id) else {
            return false;
        };
        if *self.slot_mut(timeout) == Some(event_id) {
            *self.slot_mut(timeout) = None;
        }
        log::debug!("{} {} fired", self.address, timeout);

        match timeout {
            StaTimeout::ProbeRequest => {
                self.set_state(ctx, AssociationState::WaitProbeResponse);
                self.send_probe_request(ctx);
            }
            StaTimeout::AssocRequest => {
                self.set_state(ctx, AssociationState::WaitAssociationResponse);
                self.send_association_request(ctx);
            }
            StaTimeout::BeaconWatchdog => self.missed_beacons(ctx),
        }
        true
    }

    fn on_tx_outcome(&mut self, _ctx: &mut MacContext, outcome: &TxOutcome) {
        if !outcome.success {
            log::debug!(
                "{} {} to {} not acknowledged",
                self.address,
                outcome.subtype,
                outcome.receiver
            );
        }
    }

    fn enqueue_from_above(
        &mut self,
        ctx: &mut MacContext,
        payload: Vec<u8>,
        to: MacAddress,
        tid: Option<u8>,
    ) -> Result<(), MacError> {
        if !self.is_associated() {
            self.ensure_associated(ctx);
            return Err(MacError::NotAssociated);
        }

        // Anything above 7 has no QoS meaning, fall back to best effort
        let tid = self
            .config
            .qos_supported
            .then(|| tid.filter(|tid| *tid <= 7).unwrap_or(0));

        let addressing = DataAddressing {
            receiver: self.bssid,
            transmitter: self.address,
            address_3: to,
            ds_flags: FrameControl::TO_DS,
        };
        let bytes = build_data(addressing, self.sequence.advance(), tid, false, payload);
        let (queue, subtype) = match tid {
            Some(tid) => (
                TxQueueId::Edca(AccessCategory::from_tid(tid)),
                FrameSubType::QosData,
            ),
            None => (TxQueueId::Dcf, FrameSubType::Data),
        };
        self.transmit(ctx, bytes, self.bssid, queue, subtype);
        Ok(())
    }

    fn set_tx_path(&mut self, path: TxPath) {
        self.tx_path = path;
    }
}
