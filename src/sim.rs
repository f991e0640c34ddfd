//! A small discrete-event world: MAC entities on one virtual clock, sharing an ideal medium.
//!
//! Frames travel as encoded bytes with FCS. A frame reaches every node whose address matches
//! address 1 (every other node for group frames) after the propagation delay, unless the link
//! is blocked or the seeded loss draw drops it. Individually addressed frames report a
//! [TxOutcome] back to their sender after the same delay.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use derive_setters::Setters;
use libwifi::append_fcs;
use libwifi::frame::components::MacAddress;
use libwifi::FrameSubType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ApConfig, StaConfig, TxPath};
use crate::mac::{MacContext, OutboundFrame, TxOutcome, UpperLayer, WifiMac};
use crate::rates::PhyCapabilities;
use crate::scheduler::{EventId, Scheduler, VirtualClock};
use crate::status::{MacEvent, MessageLog};

#[derive(Clone, Debug, PartialEq, Setters)]
#[setters(prefix = "with_")]
pub struct SimConfig {
    pub propagation_delay: Duration,
    /// Chance of losing a frame on its way to one receiver.
    pub loss_probability: f64,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            propagation_delay: Duration::from_micros(10),
            loss_probability: 0.0,
            seed: 0,
        }
    }
}

/// A payload handed to the upper layer of a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedPayload {
    pub payload: Vec<u8>,
    pub source: MacAddress,
    pub destination: MacAddress,
}

/// Recording upper layer.
#[derive(Debug, Default)]
pub struct Inbox {
    pub received: Vec<ReceivedPayload>,
}

impl UpperLayer for Inbox {
    fn forward_up(&mut self, payload: Vec<u8>, source: MacAddress, destination: MacAddress) {
        self.received.push(ReceivedPayload {
            payload,
            source,
            destination,
        });
    }
}

#[derive(Debug)]
struct Node {
    mac: WifiMac,
    inbox: Inbox,
}

#[derive(Clone, Copy, Debug)]
enum Owner {
    Node(usize),
    Medium,
}

#[derive(Debug)]
enum Delivery {
    Frame { to: usize, bytes: Vec<u8> },
    Outcome { to: usize, outcome: TxOutcome },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub at: Duration,
    pub node: usize,
    pub address: MacAddress,
    pub event: MacEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransmitRecord {
    pub at: Duration,
    pub from: usize,
    pub subtype: FrameSubType,
    pub receiver: MacAddress,
    /// The frame as it went on the air, FCS included.
    pub bytes: Vec<u8>,
}

/// The scheduler one node sees. Remembers which node owns each callback.
struct NodeScheduler<'a> {
    clock: &'a mut VirtualClock,
    owners: &'a mut HashMap<EventId, Owner>,
    node: usize,
}

impl Scheduler for NodeScheduler<'_> {
    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn schedule(&mut self, delay: Duration) -> EventId {
        let event_id = self.clock.schedule(delay);
        self.owners.insert(event_id, Owner::Node(self.node));
        event_id
    }

    fn cancel(&mut self, event_id: EventId) {
        self.clock.cancel(event_id);
        self.owners.remove(&event_id);
    }
}

pub struct Simulation {
    config: SimConfig,
    clock: VirtualClock,
    nodes: Vec<Node>,
    owners: HashMap<EventId, Owner>,
    deliveries: HashMap<EventId, Delivery>,
    blocked: HashSet<(usize, usize)>,
    rng: StdRng,
    events: Vec<EventRecord>,
    transmissions: Vec<TransmitRecord>,
    log: Option<MessageLog>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        Simulation {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            clock: VirtualClock::new(),
            nodes: Vec::new(),
            owners: HashMap::new(),
            deliveries: HashMap::new(),
            blocked: HashSet::new(),
            events: Vec::new(),
            transmissions: Vec::new(),
            log: None,
        }
    }

    /// Events are also written to `log` from now on.
    pub fn set_message_log(&mut self, log: MessageLog) {
        self.log = Some(log);
    }

    pub fn message_log(&self) -> Option<&MessageLog> {
        self.log.as_ref()
    }

    fn next_address(&self) -> MacAddress {
        MacAddress::local(self.nodes.len() as u32 + 1)
    }

    pub fn add_access_point(&mut self, phy: PhyCapabilities, config: ApConfig) -> usize {
        let mut mac = WifiMac::access_point(self.next_address(), phy, config);
        if let Some(ap) = mac.as_access_point_mut() {
            ap.seed_rng(self.rng.gen());
        }
        self.add_node(mac)
    }

    pub fn add_station(&mut self, phy: PhyCapabilities, config: StaConfig) -> usize {
        let mac = WifiMac::station(self.next_address(), phy, config);
        self.add_node(mac)
    }

    fn add_node(&mut self, mac: WifiMac) -> usize {
        log::debug!("node {} is {}", self.nodes.len(), mac.address());
        self.nodes.push(Node {
            mac,
            inbox: Inbox::default(),
        });
        self.nodes.len() - 1
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Panics if `index` is not a node of this simulation.
    pub fn node(&self, index: usize) -> &WifiMac {
        &self.nodes[index].mac
    }

    pub fn inbox(&self, index: usize) -> &Inbox {
        &self.nodes[index].inbox
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn events_of(&self, index: usize) -> impl Iterator<Item = &MacEvent> {
        self.events
            .iter()
            .filter(move |record| record.node == index)
            .map(|record| &record.event)
    }

    pub fn transmissions(&self) -> &[TransmitRecord] {
        &self.transmissions
    }

    pub fn block_link(&mut self, a: usize, b: usize) {
        self.blocked.insert((a, b));
        self.blocked.insert((b, a));
    }

    pub fn unblock_link(&mut self, a: usize, b: usize) {
        self.blocked.remove(&(a, b));
        self.blocked.remove(&(b, a));
    }

    pub fn start(&mut self, index: usize) {
        self.with_mac(index, |mac, ctx| mac.start(ctx));
    }

    pub fn start_all(&mut self) {
        for index in 0..self.nodes.len() {
            self.start(index);
        }
    }

    pub fn set_tx_path(&mut self, index: usize, path: TxPath) {
        self.nodes[index].mac.set_tx_path(path);
    }

    pub fn send_from_above(
        &mut self,
        index: usize,
        payload: Vec<u8>,
        to: MacAddress,
        tid: Option<u8>,
    ) {
        self.with_mac(index, |mac, ctx| mac.enqueue(ctx, payload, to, tid));
    }

    /// Hands raw bytes (no FCS) to a node as if they came off the air right now.
    pub fn inject(&mut self, index: usize, bytes: &[u8]) {
        self.with_mac(index, |mac, ctx| mac.receive(ctx, bytes, false));
    }

    /// Runs `f` against a node with a context wired to this simulation. Events the node
    /// raises are recorded and frames it queues are put on the medium afterwards.
    pub fn with_mac<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut WifiMac, &mut MacContext) -> R,
    ) -> R {
        let mut tx: Vec<OutboundFrame> = Vec::new();
        let mut raised: Vec<MacEvent> = Vec::new();
        let node = &mut self.nodes[index];
        let mut scheduler = NodeScheduler {
            clock: &mut self.clock,
            owners: &mut self.owners,
            node: index,
        };
        let mut ctx = MacContext {
            scheduler: &mut scheduler,
            tx: &mut tx,
            upper: &mut node.inbox,
            listener: &mut raised,
        };
        let result = f(&mut node.mac, &mut ctx);

        let address = node.mac.address();
        let now = self.clock.now();
        for event in raised {
            if let Some(log) = self.log.as_mut() {
                log.record(now, &address, &event);
            }
            self.events.push(EventRecord {
                at: now,
                node: index,
                address,
                event,
            });
        }
        for frame in tx {
            self.transmit(index, frame);
        }
        result
    }

    fn schedule_delivery(&mut self, delivery: Delivery) {
        let event_id = self.clock.schedule(self.config.propagation_delay);
        self.owners.insert(event_id, Owner::Medium);
        self.deliveries.insert(event_id, delivery);
    }

    fn transmit(&mut self, from: usize, frame: OutboundFrame) {
        let mut bytes = frame.bytes;
        append_fcs(&mut bytes);
        self.transmissions.push(TransmitRecord {
            at: self.clock.now(),
            from,
            subtype: frame.subtype,
            receiver: frame.receiver,
            bytes: bytes.clone(),
        });

        let group = frame.receiver.is_group();
        let loss = self.config.loss_probability.clamp(0.0, 1.0);
        let mut delivered = false;
        for to in 0..self.nodes.len() {
            if to == from || self.blocked.contains(&(from, to)) {
                continue;
            }
            if !group && self.nodes[to].mac.address() != frame.receiver {
                continue;
            }
            if loss > 0.0 && self.rng.gen_bool(loss) {
                log::debug!("{} lost on its way to node {}", frame.subtype, to);
                continue;
            }
            self.schedule_delivery(Delivery::Frame {
                to,
                bytes: bytes.clone(),
            });
            delivered = true;
        }

        if !group {
            self.schedule_delivery(Delivery::Outcome {
                to: from,
                outcome: TxOutcome {
                    receiver: frame.receiver,
                    subtype: frame.subtype,
                    success: delivered,
                },
            });
        }
    }

    /// Fires everything due up to `until`, then moves the clock there.
    pub fn run_until(&mut self, until: Duration) {
        while let Some(event_id) = self.clock.pop_due(until) {
            match self.owners.remove(&event_id) {
                Some(Owner::Node(index)) => {
                    if !self.with_mac(index, |mac, ctx| mac.timer_fired(ctx, event_id)) {
                        log::debug!("node {} ignored timer {}", index, event_id.raw());
                    }
                }
                Some(Owner::Medium) => match self.deliveries.remove(&event_id) {
                    Some(Delivery::Frame { to, bytes }) => {
                        self.with_mac(to, |mac, ctx| mac.receive(ctx, &bytes, true))
                    }
                    Some(Delivery::Outcome { to, outcome }) => {
                        self.with_mac(to, |mac, ctx| mac.tx_outcome(ctx, &outcome))
                    }
                    None => {}
                },
                None => {}
            }
        }
        self.clock.advance_to(until);
    }

    pub fn run_for(&mut self, duration: Duration) {
        let until = self.clock.now() + duration;
        self.run_until(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BssConfig;
    use crate::rates::WifiStandard;
    use crate::sta::AssociationState;

    fn bss(standard: WifiStandard, stations: usize, config: SimConfig) -> Simulation {
        let mut sim = Simulation::new(config);
        let phy = PhyCapabilities::for_standard(standard);
        let bss = BssConfig::for_phy("lobby", &phy);
        sim.add_access_point(phy.clone(), ApConfig::new(bss));
        for _ in 0..stations {
            sim.add_station(phy.clone(), StaConfig::new("lobby"));
        }
        sim.start_all();
        sim
    }

    fn state(sim: &Simulation, index: usize) -> Option<AssociationState> {
        sim.node(index).as_station().map(|sta| sta.state())
    }

    #[test]
    fn test_stations_join_over_the_medium() {
        let mut sim = bss(WifiStandard::G, 2, SimConfig::default());
        sim.run_for(Duration::from_millis(300));

        assert_eq!(state(&sim, 1), Some(AssociationState::Associated));
        assert_eq!(state(&sim, 2), Some(AssociationState::Associated));
        let ap = sim.node(0).as_access_point().unwrap();
        assert_eq!(ap.registry().len(), 2);
        assert!(ap.registry().is_associated(&MacAddress::local(2)));

        let ap_events: Vec<&MacEvent> = sim.events_of(0).collect();
        assert_eq!(ap_events[0], &MacEvent::LinkUp);
        assert!(ap_events.contains(&&MacEvent::PeerAssociated(MacAddress::local(3))));
        let sta_events: Vec<&MacEvent> = sim.events_of(1).collect();
        assert_eq!(
            sta_events,
            vec![
                &MacEvent::LinkDown,
                &MacEvent::Associated(MacAddress::local(1)),
                &MacEvent::LinkUp
            ]
        );
        assert!(sim
            .transmissions()
            .iter()
            .all(|record| record.subtype != FrameSubType::ProbeRequest));
    }

    #[test]
    fn test_payload_relayed_between_stations() {
        let mut sim = bss(WifiStandard::G, 2, SimConfig::default());
        sim.run_for(Duration::from_millis(300));

        sim.send_from_above(1, vec![0xDE, 0xAD], MacAddress::local(3), None);
        sim.run_for(Duration::from_millis(1));

        assert_eq!(
            sim.inbox(2).received,
            vec![ReceivedPayload {
                payload: vec![0xDE, 0xAD],
                source: MacAddress::local(2),
                destination: MacAddress::local(3),
            }]
        );
        assert!(sim.inbox(0).received.is_empty());
    }

    #[test]
    fn test_blocked_link_and_recovery() {
        let mut sim = bss(WifiStandard::G, 1, SimConfig::default());
        sim.block_link(0, 1);
        sim.run_for(Duration::from_secs(2));
        assert_eq!(state(&sim, 1), Some(AssociationState::BeaconMissed));

        sim.unblock_link(0, 1);
        sim.run_for(Duration::from_millis(300));
        assert_eq!(state(&sim, 1), Some(AssociationState::Associated));

        // Losing the AP for longer than ten beacon intervals drops the link.
        sim.block_link(0, 1);
        sim.run_for(Duration::from_millis(1100));
        assert_eq!(state(&sim, 1), Some(AssociationState::BeaconMissed));
        assert!(sim
            .events_of(1)
            .any(|event| *event == MacEvent::Deassociated(MacAddress::local(1))));
    }

    #[test]
    fn test_lossy_medium_is_reproducible() {
        let config = SimConfig::default()
            .with_loss_probability(0.3)
            .with_seed(11);
        let mut first = bss(WifiStandard::G, 3, config.clone());
        let mut second = bss(WifiStandard::G, 3, config);
        first.run_for(Duration::from_secs(3));
        second.run_for(Duration::from_secs(3));
        assert_eq!(first.events(), second.events());
        assert_eq!(first.transmissions().len(), second.transmissions().len());
    }

    #[test]
    fn test_garbage_is_dropped() {
        let mut sim = bss(WifiStandard::G, 1, SimConfig::default());
        sim.inject(1, &[0x08, 0x02, 0x00]);
        assert_eq!(
            sim.events().last().map(|record| &record.event),
            Some(&MacEvent::RxDrop("Malformed".to_string()))
        );
    }
}
