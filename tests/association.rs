use std::time::Duration;

use bss_oxide::config::{ApConfig, BssConfig, StaConfig};
use bss_oxide::negotiation::{admit, AdmissionPolicy};
use bss_oxide::rates::{PhyCapabilities, WifiStandard};
use bss_oxide::sim::{ReceivedPayload, SimConfig, Simulation};
use bss_oxide::sta::{AssociationState, BeaconInfo};
use bss_oxide::status::MacEvent;
use bss_oxide::tx::{build_beacon, build_data, BssFields, DataAddressing};
use libwifi::frame::components::{
    CapabilityInfo, FrameControl, MacAddress, StationInfo, SupportedRate,
};
use libwifi::frame::{encode_amsdu, status_code, AmsduSubframe};
use libwifi::{parse_frame, Frame, FrameSubType};

fn elements(ssid: &str, rates: &[u8]) -> StationInfo {
    let mut info = StationInfo {
        ssid: Some(ssid.to_string()),
        ..Default::default()
    };
    info.set_rates(
        rates
            .iter()
            .map(|rate| SupportedRate {
                basic: false,
                rate: *rate,
            })
            .collect(),
    );
    info
}

fn station_state(sim: &Simulation, index: usize) -> AssociationState {
    sim.node(index).as_station().unwrap().state()
}

/// One access point and `stations` stations of the same standard, all started.
fn bss(standard: WifiStandard, stations: usize) -> Simulation {
    let mut sim = Simulation::new(SimConfig::default());
    let phy = PhyCapabilities::for_standard(standard);
    sim.add_access_point(phy.clone(), ApConfig::new(BssConfig::for_phy("lobby", &phy)));
    for _ in 0..stations {
        sim.add_station(phy.clone(), StaConfig::new("lobby"));
    }
    sim.start_all();
    sim
}

#[test]
fn beacon_loss_after_ten_intervals() {
    let mut sim = Simulation::new(SimConfig::default());
    let sta = sim.add_station(
        PhyCapabilities::for_standard(WifiStandard::G),
        StaConfig::new("lobby").with_max_missed_beacons(10),
    );
    sim.start(sta);

    let beacon = BeaconInfo {
        bssid: MacAddress::local(9),
        beacon_interval: Duration::from_micros(100_000),
        capability_info: CapabilityInfo::default().with_ess(true),
        station_info: elements("lobby", &[2, 4, 11, 22, 12, 24, 48]),
    };
    sim.with_mac(sta, |mac, ctx| {
        mac.as_station_mut().unwrap().receive_beacon(ctx, &beacon)
    });
    assert_eq!(station_state(&sim, sta), AssociationState::WaitAssociationResponse);

    sim.run_until(Duration::from_micros(999_999));
    assert_eq!(station_state(&sim, sta), AssociationState::WaitAssociationResponse);

    sim.run_until(Duration::from_micros(1_000_000));
    assert_eq!(station_state(&sim, sta), AssociationState::BeaconMissed);
    let link_down = sim
        .events()
        .iter()
        .filter(|record| record.event == MacEvent::LinkDown)
        .collect::<Vec<_>>();
    assert_eq!(link_down.len(), 2);
    assert_eq!(link_down[1].at, Duration::from_micros(1_000_000));

    assert!(sim
        .transmissions()
        .iter()
        .all(|record| record.subtype != FrameSubType::ProbeRequest));
    // Nothing pending any more while passive.
    assert_eq!(sim.node(sta).as_station().unwrap().pending_timers(), 0);
}

#[test]
fn station_missing_a_basic_rate_is_refused() {
    let mut sim = Simulation::new(SimConfig::default());
    let ap_phy = PhyCapabilities::for_standard(WifiStandard::B);
    let bss = BssConfig::for_phy("lobby", &ap_phy);
    let ap = sim.add_access_point(ap_phy.clone(), ApConfig::new(bss).with_basic_rates(vec![2, 4]));

    let one_mbps = ap_phy.modes[0];
    assert_eq!(one_mbps.rate, 2);
    let sta_phy = ap_phy.clone().with_modes(vec![one_mbps]);
    let sta = sim.add_station(sta_phy, StaConfig::new("lobby"));
    sim.start_all();
    sim.run_for(Duration::from_secs(2));

    let responses: Vec<Frame> = sim
        .transmissions()
        .iter()
        .filter(|record| record.subtype == FrameSubType::AssociationResponse)
        .map(|record| parse_frame(&record.bytes, true).unwrap())
        .collect();
    assert_eq!(responses.len(), 1);
    match &responses[0] {
        Frame::AssociationResponse(response) => {
            assert_eq!(response.status_code, status_code::UNSPECIFIED_FAILURE);
            assert!(!response.is_success());
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(sim.node(ap).as_access_point().unwrap().registry().is_empty());
    assert_eq!(station_state(&sim, sta), AssociationState::Refused);
    // Refused sticks until reset.
    assert_eq!(
        sim.node(sta).as_station().unwrap().counters().association_requests,
        1
    );
}

#[test]
fn amsdu_subframes_are_routed_one_by_one() {
    let mut sim = bss(WifiStandard::N24, 2);
    sim.run_for(Duration::from_millis(300));
    assert_eq!(station_state(&sim, 1), AssociationState::Associated);
    assert_eq!(station_state(&sim, 2), AssociationState::Associated);

    let ap = MacAddress::local(1);
    let sta_a = MacAddress::local(2);
    let sta_b = MacAddress::local(3);
    let body = encode_amsdu(&[
        AmsduSubframe {
            destination: ap,
            source: sta_a,
            payload: b"to the ap".to_vec(),
        },
        AmsduSubframe {
            destination: sta_b,
            source: sta_a,
            payload: b"to b".to_vec(),
        },
        AmsduSubframe {
            destination: MacAddress::broadcast(),
            source: sta_a,
            payload: b"to all".to_vec(),
        },
    ])
    .unwrap();
    let addressing = DataAddressing {
        receiver: ap,
        transmitter: sta_a,
        address_3: ap,
        ds_flags: FrameControl::TO_DS,
    };
    let aggregate = build_data(addressing, 42, Some(5), true, body);

    let before = sim.transmissions().len();
    sim.inject(0, &aggregate);

    assert_eq!(
        sim.inbox(0).received,
        vec![
            ReceivedPayload {
                payload: b"to the ap".to_vec(),
                source: sta_a,
                destination: ap,
            },
            ReceivedPayload {
                payload: b"to all".to_vec(),
                source: sta_a,
                destination: MacAddress::broadcast(),
            },
        ]
    );

    let forwarded: Vec<_> = sim.transmissions()[before..].to_vec();
    assert_eq!(forwarded.len(), 2);
    assert_eq!(forwarded[0].receiver, sta_b);
    assert!(forwarded[1].receiver.is_broadcast());
    for record in &forwarded {
        match parse_frame(&record.bytes, true).unwrap() {
            Frame::QosData(data) => assert_eq!(data.tid(), 5),
            other => panic!("unexpected {other:?}"),
        }
    }

    sim.run_for(Duration::from_millis(1));
    assert_eq!(
        sim.inbox(2).received,
        vec![
            ReceivedPayload {
                payload: b"to b".to_vec(),
                source: sta_a,
                destination: sta_b,
            },
            ReceivedPayload {
                payload: b"to all".to_vec(),
                source: sta_a,
                destination: MacAddress::broadcast(),
            },
        ]
    );
    // The sender doesn't get its own broadcast back.
    assert!(sim.inbox(1).received.is_empty());
}

#[test]
fn state_is_always_one_of_five() {
    let config = SimConfig::default().with_loss_probability(0.4).with_seed(3);
    let mut sim = Simulation::new(config);
    let phy = PhyCapabilities::for_standard(WifiStandard::G);
    sim.add_access_point(phy.clone(), ApConfig::new(BssConfig::for_phy("lobby", &phy)));
    for index in 0..4 {
        let config = StaConfig::new("lobby").with_active_probing(index % 2 == 0);
        sim.add_station(phy.clone(), config);
    }
    sim.start_all();

    for step in 0..40u64 {
        if step % 10 == 3 {
            sim.block_link(0, 1);
        }
        if step % 10 == 8 {
            sim.unblock_link(0, 1);
        }
        sim.run_for(Duration::from_millis(150));
        for index in 1..sim.len() {
            let state = station_state(&sim, index);
            assert!(matches!(
                state,
                AssociationState::Associated
                    | AssociationState::WaitProbeResponse
                    | AssociationState::BeaconMissed
                    | AssociationState::WaitAssociationResponse
                    | AssociationState::Refused
            ));
            // At most one request timer and the watchdog.
            assert!(sim.node(index).as_station().unwrap().pending_timers() <= 2);
        }
    }
}

#[test]
fn watchdog_restarts_coalesce() {
    let mut sim = Simulation::new(SimConfig::default());
    let sta = sim.add_station(
        PhyCapabilities::for_standard(WifiStandard::G),
        StaConfig::new("lobby"),
    );

    for millis in [500, 400, 300, 200] {
        sim.with_mac(sta, |mac, ctx| {
            mac.as_station_mut()
                .unwrap()
                .restart_watchdog(ctx, Duration::from_millis(millis))
        });
    }
    let station = sim.node(sta).as_station().unwrap();
    assert_eq!(station.pending_timers(), 1);
    assert_eq!(station.beacon_watchdog_end(), Duration::from_millis(500));

    sim.run_until(Duration::from_micros(499_999));
    assert!(sim.events().is_empty());
    sim.run_until(Duration::from_millis(500));
    assert_eq!(sim.events().len(), 1);
    assert_eq!(sim.events()[0].event, MacEvent::LinkDown);
    assert_eq!(sim.events()[0].at, Duration::from_millis(500));
}

#[test]
fn basic_rate_coverage_decides_admission() {
    let phy = PhyCapabilities::for_standard(WifiStandard::G);
    let bss = BssConfig::for_phy("lobby", &phy);
    let basic = [2, 4, 12];
    let policy = AdmissionPolicy {
        bss: &bss,
        phy: &phy,
        basic_rates: &basic,
        basic_mcs: &[],
    };
    let pool = [2u8, 4, 11, 22, 12, 24, 48];

    for mask in 0u32..(1 << pool.len()) {
        let offered: Vec<u8> = pool
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, rate)| *rate)
            .collect();
        let covered = basic.iter().all(|rate| offered.contains(rate));
        let result = admit(&policy, CapabilityInfo::default(), &elements("lobby", &offered));
        assert_eq!(result.is_ok(), covered, "offered {offered:?}");
    }
}

#[test]
fn non_erp_station_disables_short_slot() {
    let mut sim = Simulation::new(SimConfig::default());
    let phy = PhyCapabilities::for_standard(WifiStandard::G);
    let ap = sim.add_access_point(
        phy.clone(),
        ApConfig::new(BssConfig::for_phy("lobby", &phy)).with_basic_rates(vec![2, 4]),
    );
    let erp_sta = sim.add_station(phy.clone(), StaConfig::new("lobby"));
    sim.start_all();
    sim.run_for(Duration::from_millis(300));

    let access_point = sim.node(ap).as_access_point().unwrap();
    assert_eq!(access_point.registry().len(), 1);
    assert!(access_point.capability_info().short_slot_time());
    assert_eq!(access_point.slot(), Duration::from_micros(9));
    assert_eq!(
        sim.node(erp_sta).as_station().unwrap().link_parameters().slot,
        Duration::from_micros(9)
    );

    let b_sta = sim.add_station(
        PhyCapabilities::for_standard(WifiStandard::B),
        StaConfig::new("lobby"),
    );
    sim.start(b_sta);
    sim.run_for(Duration::from_millis(300));

    let access_point = sim.node(ap).as_access_point().unwrap();
    assert_eq!(access_point.registry().len(), 2);
    assert!(access_point.registry().has_non_erp());
    assert!(!access_point.capability_info().short_slot_time());
    assert_eq!(access_point.slot(), Duration::from_micros(20));
    assert_eq!(
        sim.node(erp_sta).as_station().unwrap().link_parameters().slot,
        Duration::from_micros(20)
    );
    assert!(sim.node(erp_sta).as_station().unwrap().link_parameters().use_protection);
}

#[test]
fn capability_bits_survive_a_beacon() {
    let capability_info = CapabilityInfo::default()
        .with_ess(true)
        .with_short_preamble(true)
        .with_short_slot_time(false);
    let fields = BssFields {
        timestamp: 0,
        beacon_interval: 100,
        capability_info,
    };
    let bytes = build_beacon(&MacAddress::local(1), 0, fields, elements("lobby", &[2])).unwrap();

    match parse_frame(&bytes, false).unwrap() {
        Frame::Beacon(beacon) => {
            assert!(beacon.capability_info.short_preamble());
            assert!(!beacon.capability_info.short_slot_time());
            assert_eq!(beacon.capability_info, capability_info);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn active_probing_joins_without_waiting_for_a_beacon() {
    let mut sim = Simulation::new(SimConfig::default());
    let phy = PhyCapabilities::for_standard(WifiStandard::Ac);
    let bss = BssConfig::for_phy("lobby", &phy).with_beacon_interval(Duration::from_secs(1));
    let ap = sim.add_access_point(phy.clone(), ApConfig::new(bss));
    let sta = sim.add_station(phy, StaConfig::new("lobby").with_active_probing(true));
    sim.start(sta);
    sim.run_for(Duration::from_millis(120));
    // Unanswered while the access point is down.
    assert_eq!(station_state(&sim, sta), AssociationState::WaitProbeResponse);
    assert_eq!(sim.node(sta).as_station().unwrap().counters().probe_requests, 3);

    // The first beacon goes out right away, the next one a second later.
    sim.with_mac(ap, |mac, ctx| mac.start(ctx));
    sim.run_for(Duration::from_millis(60));
    assert_eq!(station_state(&sim, sta), AssociationState::Associated);
    assert_eq!(sim.node(sta).as_station().unwrap().counters().probe_requests, 4);

    let station = sim.node(sta).as_station().unwrap();
    let capabilities = station.ap_capabilities().unwrap();
    assert!(capabilities.rates.is_supported(12));
    assert!(capabilities.qos);
    assert_eq!(
        sim.node(ap).as_access_point().unwrap().counters().beacons,
        1
    );
}

#[test]
fn station_rejoins_after_access_point_teardown() {
    let mut sim = bss(WifiStandard::G, 1);
    sim.run_for(Duration::from_millis(300));
    assert_eq!(station_state(&sim, 1), AssociationState::Associated);

    let station = MacAddress::local(2);
    sim.with_mac(0, |mac, ctx| {
        mac.as_access_point_mut()
            .unwrap()
            .disassociate(ctx, station)
    })
    .unwrap();
    assert!(sim.node(0).as_access_point().unwrap().registry().is_empty());

    sim.run_for(Duration::from_millis(1));
    assert_ne!(station_state(&sim, 1), AssociationState::Associated);
    assert!(sim
        .events_of(1)
        .any(|event| *event == MacEvent::Deassociated(MacAddress::local(1))));

    // The next beacon starts a fresh association.
    sim.run_for(Duration::from_secs(5));
    assert_eq!(station_state(&sim, 1), AssociationState::Associated);
    assert_eq!(sim.node(0).as_access_point().unwrap().registry().len(), 1);
    assert_eq!(
        sim.events_of(1)
            .filter(|event| **event == MacEvent::Associated(MacAddress::local(1)))
            .count(),
        2
    );

    let before = sim.events().len();
    sim.send_from_above(1, b"uplink".to_vec(), MacAddress::local(1), None);
    sim.run_for(Duration::from_millis(1));
    assert!(sim.events()[before..]
        .iter()
        .all(|record| !matches!(record.event, MacEvent::RxDrop(_) | MacEvent::TxDrop(_))));
    assert_eq!(
        sim.inbox(0).received,
        vec![ReceivedPayload {
            payload: b"uplink".to_vec(),
            source: station,
            destination: MacAddress::local(1),
        }]
    );
}

#[test]
fn oversized_ssid_never_reaches_the_air() {
    let fields = BssFields {
        timestamp: 0,
        beacon_interval: 100,
        capability_info: CapabilityInfo::default().with_ess(true),
    };
    let ssid = "x".repeat(300);
    assert!(build_beacon(&MacAddress::local(1), 0, fields, elements(&ssid, &[2])).is_err());

    let mut sim = Simulation::new(SimConfig::default());
    let phy = PhyCapabilities::for_standard(WifiStandard::G);
    sim.add_access_point(phy.clone(), ApConfig::new(BssConfig::for_phy(&ssid, &phy)));
    sim.add_station(phy, StaConfig::new(&ssid));
    sim.start_all();
    sim.run_for(Duration::from_millis(500));

    assert!(sim.transmissions().is_empty());
    assert!(sim
        .events_of(0)
        .any(|event| *event == MacEvent::TxDrop("Malformed".to_string())));
    assert!(sim
        .events_of(0)
        .all(|event| !matches!(event, MacEvent::RxDrop(_))));
}
