//! Access point side of the association control plane.
//!
//! [ApMac] sends beacons on a fixed period, answers probe and association requests, keeps
//! the [StationRegistry] of its BSS and relays data between its stations.

use std::time::Duration;

use libwifi::frame::components::{CapabilityInfo, FrameControl, MacAddress, StationInfo};
use libwifi::error::Error;
use libwifi::frame::{reason_code, status_code, AssociationRequest};
use libwifi::{Frame, FrameSubType, Header};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum_macros::Display;

use crate::config::{ApConfig, TxPath, TIME_UNIT};
use crate::edca::{AccessCategory, LinkParameters, LONG_SLOT, SHORT_SLOT};
use crate::error::{MacError, ViolationKind};
use crate::mac::{MacContext, MacRole, OutboundFrame, SequenceCounter, TxOutcome, TxQueueId};
use crate::negotiation::{self, AdmissionPolicy};
use crate::rates::{PhyCapabilities, RateSet};
use crate::registry::{AssociationStatus, StationRecord, StationRegistry};
use crate::relay::{self, RelayAction};
use crate::scheduler::{EventId, Timer};
use crate::status::MacEvent;
use crate::tx::{
    build_association_response, build_beacon, build_data, build_disassociation,
    build_probe_response, BssFields, DataAddressing,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
enum ApTimeout {
    Beacon,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApCounters {
    pub beacons: u32,
    pub probe_responses: u32,
    pub association_responses: u32,
    pub refused: u32,
}

#[derive(Debug)]
pub struct ApMac {
    address: MacAddress,
    phy: PhyCapabilities,
    config: ApConfig,
    basic_rates: Vec<u8>,
    tx_path: TxPath,
    active: bool,
    registry: StationRegistry,
    timer: Timer<ApTimeout>,
    beacon_event: Option<EventId>,
    link: LinkParameters,
    rng: StdRng,
    sequence: SequenceCounter,
    counters: ApCounters,
}

impl ApMac {
    /// The address doubles as the BSSID.
    pub fn new(address: MacAddress, phy: PhyCapabilities, config: ApConfig) -> Self {
        let basic_rates = config
            .basic_rates
            .clone()
            .unwrap_or_else(|| phy.default_basic_rates());
        let dsss_only = phy.dsss_supported() && !phy.erp_supported();
        let mut link = LinkParameters::initial(dsss_only);
        if let Some(edca) = config.edca {
            link.edca = edca;
        }
        if config.bss.beacon_interval.as_micros() % TIME_UNIT.as_micros() != 0 {
            log::warn!(
                "beacon interval {:?} is not a multiple of {:?}",
                config.bss.beacon_interval,
                TIME_UNIT
            );
        }

        ApMac {
            address,
            phy,
            config,
            basic_rates,
            tx_path: TxPath::default(),
            active: false,
            registry: StationRegistry::new(),
            timer: Timer::new(),
            beacon_event: None,
            link,
            rng: StdRng::from_entropy(),
            sequence: SequenceCounter::default(),
            counters: ApCounters::default(),
        }
    }

    /// Makes the beacon jitter reproducible.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &ApConfig {
        &self.config
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    pub fn counters(&self) -> ApCounters {
        self.counters
    }

    pub fn basic_rates(&self) -> &[u8] {
        &self.basic_rates
    }

    pub fn link_parameters(&self) -> &LinkParameters {
        &self.link
    }

    /// Slot time as of the last beacon.
    pub fn slot(&self) -> Duration {
        self.link.slot
    }

    /// Preamble mode as of the last beacon.
    pub fn short_preamble_enabled(&self) -> bool {
        self.link.short_preamble
    }

    pub fn stop(&mut self, ctx: &mut MacContext) {
        self.cancel_beacon(ctx);
        self.active = false;
        log::info!("{} stopped", self.address);
    }

    pub fn set_beacon_generation(&mut self, ctx: &mut MacContext, enable: bool) {
        log::debug!("{} beacon generation {}", self.address, enable);
        if !enable {
            self.cancel_beacon(ctx);
        } else if !self.config.beacon_generation && self.active {
            self.arm_beacon(ctx, Duration::ZERO);
        }
        self.config.beacon_generation = enable;
    }

    /// Takes effect from the next scheduled beacon on.
    pub fn set_beacon_interval(&mut self, interval: Duration) {
        if interval.as_micros() % TIME_UNIT.as_micros() != 0 {
            log::warn!(
                "beacon interval {:?} is not a multiple of {:?}",
                interval,
                TIME_UNIT
            );
        }
        self.config.bss.beacon_interval = interval;
    }

    /// Tears down the association of `peer` and tells it so.
    pub fn disassociate(&mut self, ctx: &mut MacContext, peer: MacAddress) -> Result<(), MacError> {
        if self.registry.remove(&peer).is_none() {
            return Err(MacError::UnknownPeer(peer));
        }
        let bytes = build_disassociation(
            &peer,
            &self.address,
            &self.address,
            self.sequence.advance(),
            reason_code::UNSPECIFIED,
        );
        self.transmit(ctx, bytes, peer, TxQueueId::Dcf, FrameSubType::Disassociation);
        log::info!("{} disassociated {}", self.address, peer);
        ctx.notify(MacEvent::PeerDisassociated(peer));
        Ok(())
    }

    /// Membership selectors, every PHY mode, and the basic set flagged basic.
    pub fn supported_rates(&self) -> RateSet {
        let mut rates = RateSet::new();
        if self.config.bss.ht_supported || self.config.bss.vht_supported {
            for selector in self.phy.bss_membership_selectors() {
                rates.add_membership_selector(selector);
            }
        }
        for mode in &self.phy.modes {
            rates.add_supported(mode.rate);
        }
        for rate in &self.basic_rates {
            rates.set_basic(*rate);
        }
        rates
    }

    pub fn capability_info(&self) -> CapabilityInfo {
        let bss = &self.config.bss;
        CapabilityInfo::default()
            .with_ess(true)
            .with_short_preamble(negotiation::derive_short_preamble(
                bss,
                &self.phy,
                &self.registry,
            ))
            .with_short_slot_time(negotiation::derive_short_slot(
                bss,
                &self.phy,
                &self.registry,
            ))
            .with_qos(bss.qos_supported)
    }

    /// The elements of beacons, probe responses and association responses.
    pub fn elements(&self, include_ssid: bool) -> StationInfo {
        let bss = &self.config.bss;
        let mut station_info = StationInfo {
            ssid: include_ssid.then(|| bss.ssid.clone()),
            ..Default::default()
        };
        self.supported_rates().write_to(&mut station_info);

        if bss.dsss_supported {
            station_info.ds_parameter_set = Some(self.phy.channel);
        }
        if bss.erp_supported {
            station_info.erp_information = Some(negotiation::derive_erp_information(
                bss,
                &self.phy,
                &self.registry,
            ));
        }
        if bss.qos_supported {
            station_info.edca_parameter_set = Some(self.link.edca.to_element());
        }
        if bss.ht_supported {
            station_info.ht_capabilities = Some(negotiation::ht_capabilities(&self.phy));
            station_info.ht_operation =
                Some(negotiation::derive_ht_operation(&self.phy, &self.registry));
        }
        if bss.vht_supported {
            station_info.vht_capabilities = Some(negotiation::vht_capabilities(&self.phy));
        }
        station_info
    }

    fn bss_fields(&self, ctx: &MacContext) -> BssFields {
        BssFields {
            timestamp: ctx.scheduler.now().as_micros() as u64,
            beacon_interval: self.config.bss.beacon_interval_tu(),
            capability_info: self.capability_info(),
        }
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

    fn arm_beacon(&mut self, ctx: &mut MacContext, delay: Duration) {
        self.cancel_beacon(ctx);
        let event_id = self.timer.schedule_event(ctx.scheduler, delay, ApTimeout::Beacon);
        self.beacon_event = Some(event_id);
        log::debug!("{} next beacon in {:?}", self.address, delay);
    }

    fn cancel_beacon(&mut self, ctx: &mut MacContext) {
        if let Some(event_id) = self.beacon_event.take() {
            self.timer.cancel_event(ctx.scheduler, event_id);
        }
    }

    fn send_beacon(&mut self, ctx: &mut MacContext) {
        let bytes = match build_beacon(
            &self.address,
            self.sequence.advance(),
            self.bss_fields(ctx),
            self.elements(true),
        ) {
            Ok(bytes) => bytes,
            Err(error) => return self.encode_failed(ctx, FrameSubType::Beacon, error),
        };
        self.transmit(
            ctx,
            bytes,
            MacAddress::broadcast(),
            TxQueueId::Beacon,
            FrameSubType::Beacon,
        );
        self.counters.beacons += 1;
        self.update_link_parameters();
    }

    fn update_link_parameters(&mut self) {
        let bss = &self.config.bss;
        let short_slot = negotiation::derive_short_slot(bss, &self.phy, &self.registry);
        if short_slot {
            self.link.slot = SHORT_SLOT;
        } else if bss.erp_supported {
            self.link.slot = LONG_SLOT;
        }
        self.link.short_slot = short_slot;
        self.link.short_preamble =
            negotiation::derive_short_preamble(bss, &self.phy, &self.registry);
        self.link.use_protection = negotiation::derive_use_protection(bss, &self.registry);
    }

    fn send_probe_response(&mut self, ctx: &mut MacContext, client: MacAddress) {
        let bytes = match build_probe_response(
            &client,
            &self.address,
            self.sequence.advance(),
            self.bss_fields(ctx),
            self.elements(true),
        ) {
            Ok(bytes) => bytes,
            Err(error) => return self.encode_failed(ctx, FrameSubType::ProbeResponse, error),
        };
        self.transmit(ctx, bytes, client, TxQueueId::Dcf, FrameSubType::ProbeResponse);
        self.counters.probe_responses += 1;
        log::debug!("{} probe response to {}", self.address, client);
    }

    fn send_association_response(
        &mut self,
        ctx: &mut MacContext,
        client: MacAddress,
        status: u16,
        aid: u16,
    ) {
        let bytes = match build_association_response(
            &client,
            &self.address,
            self.sequence.advance(),
            self.capability_info(),
            status,
            aid,
            self.elements(false),
        ) {
            Ok(bytes) => bytes,
            Err(error) => {
                return self.encode_failed(ctx, FrameSubType::AssociationResponse, error)
            }
        };
        self.transmit(
            ctx,
            bytes,
            client,
            TxQueueId::Dcf,
            FrameSubType::AssociationResponse,
        );
        self.counters.association_responses += 1;
    }

    fn receive_association_request(&mut self, ctx: &mut MacContext, request: &AssociationRequest) {
        let client = request.header.address_2;
        let policy = AdmissionPolicy {
            bss: &self.config.bss,
            phy: &self.phy,
            basic_rates: &self.basic_rates,
            basic_mcs: &self.config.basic_mcs,
        };

        let admission = match negotiation::admit(&policy, request.capability_info, &request.station_info)
        {
            Ok(admission) => admission,
            Err(err) => {
                log::debug!("{} refusing {}: {}", self.address, client, err);
                self.counters.refused += 1;
                self.send_association_response(ctx, client, status_code::UNSPECIFIED_FAILURE, 0);
                return;
            }
        };

        let Some(aid) = self.registry.next_aid(&client) else {
            log::warn!("{} out of association ids, refusing {}", self.address, client);
            self.counters.refused += 1;
            self.send_association_response(ctx, client, status_code::UNSPECIFIED_FAILURE, 0);
            return;
        };

        self.registry.add(StationRecord {
            address: client,
            aid,
            capabilities: admission.capabilities,
            class: admission.class,
            status: AssociationStatus::WaitAssocTxOk,
        });
        log::debug!("{} admitted {} with aid {}", self.address, client, aid);
        self.send_association_response(ctx, client, status_code::SUCCESS, aid);
    }

    fn receive_disassociation(&mut self, ctx: &mut MacContext, peer: MacAddress) {
        if self.registry.remove(&peer).is_some() {
            log::info!("{} {} left", self.address, peer);
            ctx.notify(MacEvent::PeerDisassociated(peer));
        } else {
            log::debug!("{} disassociation from unknown {}", self.address, peer);
        }
    }

    fn forward_down(
        &mut self,
        ctx: &mut MacContext,
        payload: Vec<u8>,
        from: MacAddress,
        to: MacAddress,
        tid: Option<u8>,
    ) {
        let tid = self
            .config
            .bss
            .qos_supported
            .then(|| tid.filter(|tid| *tid <= 7).unwrap_or(0));
        let addressing = DataAddressing {
            receiver: to,
            transmitter: self.address,
            address_3: from,
            ds_flags: FrameControl::FROM_DS,
        };
        let bytes = build_data(addressing, self.sequence.advance(), tid, false, payload);
        let (queue, subtype) = match tid {
            Some(tid) => (
                TxQueueId::Edca(AccessCategory::from_tid(tid)),
                FrameSubType::QosData,
            ),
            None => (TxQueueId::Dcf, FrameSubType::Data),
        };
        self.transmit(ctx, bytes, to, queue, subtype);
    }

    fn ensure_active(&self) -> Result<(), MacError> {
        if self.active {
            Ok(())
        } else {
            Err(MacError::ProtocolViolation(ViolationKind::Inactive))
        }
    }
}

impl MacRole for ApMac {
    fn address(&self) -> MacAddress {
        self.address
    }

    fn start(&mut self, ctx: &mut MacContext) {
        self.active = true;
        log::info!("{} serving {:?}", self.address, self.config.bss.ssid);
        ctx.notify(MacEvent::LinkUp);
        self.cancel_beacon(ctx);
        if self.config.beacon_generation {
            let delay = if self.config.beacon_jitter {
                let interval = self.config.bss.beacon_interval.as_micros() as u64;
                Duration::from_micros(self.rng.gen_range(0..interval.max(1)))
            } else {
                Duration::ZERO
            };
            self.arm_beacon(ctx, delay);
        }
    }

    fn on_management_frame(&mut self, ctx: &mut MacContext, frame: Frame) -> Result<(), MacError> {
        self.ensure_active()?;
        let from = *frame.address_2();
        if from == self.address {
            return Ok(());
        }
        let addressed = *frame.address_1() == self.address;

        match frame {
            Frame::ProbeRequest(_) => self.send_probe_response(ctx, from),
            Frame::AssociationRequest(request) if addressed => {
                self.receive_association_request(ctx, &request)
            }
            Frame::Disassociation(_) if addressed => self.receive_disassociation(ctx, from),
            Frame::AssociationRequest(_) | Frame::Disassociation(_) => {
                return Err(MacError::ProtocolViolation(ViolationKind::NotForUs))
            }
            Frame::Beacon(_) | Frame::ProbeResponse(_) | Frame::AssociationResponse(_) => {
                return Err(MacError::ProtocolViolation(ViolationKind::WrongRole))
            }
            _ => return Err(MacError::ProtocolViolation(ViolationKind::Unexpected)),
        }
        Ok(())
    }

    fn on_data_frame(&mut self, ctx: &mut MacContext, frame: Frame) -> Result<(), MacError> {
        self.ensure_active()?;
        let from = *frame.address_2();
        if from == self.address {
            return Ok(());
        }

        let frame_control = frame.frame_control();
        if frame_control.from_ds() && frame_control.to_ds() {
            return Err(MacError::ProtocolViolation(ViolationKind::Wds));
        }
        if frame_control.from_ds() || !frame_control.to_ds() {
            return Err(MacError::ProtocolViolation(ViolationKind::WrongDirection));
        }
        if *frame.address_1() != self.address {
            return Err(MacError::ProtocolViolation(ViolationKind::NotForUs));
        }
        if !self.registry.is_associated(&from) && self.tx_path != TxPath::Offload {
            return Err(MacError::UnknownPeer(from));
        }

        for action in relay::relay_frame(&self.address, &self.registry, frame)? {
            match action {
                RelayAction::ForwardUp {
                    payload,
                    source,
                    destination,
                } => ctx.upper.forward_up(payload, source, destination),
                RelayAction::ForwardDown {
                    payload,
                    source,
                    destination,
                    tid,
                } => self.forward_down(ctx, payload, source, destination, tid),
            }
        }
        Ok(())
    }

    fn on_timer(&mut self, ctx: &mut MacContext, event_id: EventId) -> bool {
        let Some(ApTimeout::Beacon) = self.timer.triggered(&event_id) else {
            return false;
        };
        self.beacon_event = None;
        // The period is fixed, the next beacon is due one interval later no matter what
        if self.config.beacon_generation && self.active {
            self.arm_beacon(ctx, self.config.bss.beacon_interval);
        }
        self.send_beacon(ctx);
        true
    }

    fn on_tx_outcome(&mut self, ctx: &mut MacContext, outcome: &TxOutcome) {
        if outcome.subtype != FrameSubType::AssociationResponse
            || !self.registry.is_wait_assoc_tx_ok(&outcome.receiver)
        {
            return;
        }
        if outcome.success {
            self.registry.mark_associated(&outcome.receiver);
            log::info!("{} {} associated", self.address, outcome.receiver);
            ctx.notify(MacEvent::PeerAssociated(outcome.receiver));
        } else {
            self.registry.remove(&outcome.receiver);
            log::debug!(
                "{} association response to {} lost, rolled back",
                self.address,
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
        self.ensure_active()?;
        if !to.is_group() && !self.registry.is_associated(&to) {
            return Err(MacError::UnknownPeer(to));
        }
        self.forward_down(ctx, payload, self.address, to, tid);
        Ok(())
    }

    fn set_tx_path(&mut self, path: TxPath) {
        self.tx_path = path;
    }
}
