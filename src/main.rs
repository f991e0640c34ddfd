use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use libwifi::frame::components::{MacAddress, MAX_SSID_LENGTH};

use bss_oxide::config::{ApConfig, BssConfig, StaConfig, TxPath};
use bss_oxide::rates::{PhyCapabilities, WifiStandard};
use bss_oxide::sim::{SimConfig, Simulation};
use bss_oxide::status::{MessageLog, MessageType, StatusMessage};

/// Runs one access point and a number of stations on a simulated medium and reports how
/// they got along.
#[derive(Debug, Parser)]
#[command(name = "bss_oxide", version, about)]
struct Arguments {
    /// Number of stations joining the BSS.
    #[arg(short, long, default_value_t = 4)]
    stations: usize,

    /// PHY standard of every node.
    #[arg(long, value_enum, default_value_t = WifiStandard::G)]
    standard: WifiStandard,

    /// SSID of the BSS.
    #[arg(long, default_value = "oxide")]
    ssid: String,

    /// Beacon interval in microseconds.
    #[arg(long, default_value_t = 102_400)]
    beacon_interval: u64,

    /// Delay the first beacon by a random part of the interval.
    #[arg(long)]
    jitter: bool,

    /// Probe for the access point instead of waiting for a beacon.
    #[arg(long)]
    active_probing: bool,

    /// Missed beacons before a station gives up on its access point.
    #[arg(long, default_value_t = 10)]
    max_missed_beacons: u32,

    /// Probability of losing a frame on its way to one receiver.
    #[arg(long, default_value_t = 0.0)]
    loss: f64,

    /// Seed of the medium and the beacon jitter.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Simulated time in milliseconds.
    #[arg(short, long, default_value_t = 5_000)]
    duration: u64,

    /// Let stations send QoS data.
    #[arg(long)]
    qos: bool,

    /// Milliseconds between two rounds of station traffic, 0 for none.
    #[arg(long, default_value_t = 100)]
    traffic_period: u64,

    /// Lower layer carrying the access point's frames.
    #[arg(long, value_enum, default_value_t = TxPath::Contention)]
    tx_path: TxPath,

    /// Only print the summary.
    #[arg(short, long)]
    quiet: bool,
}

fn build(args: &Arguments) -> Result<Simulation> {
    ensure!(args.stations > 0, "at least one station is needed");
    ensure!(
        args.ssid.len() <= MAX_SSID_LENGTH,
        "SSID is {} bytes long, at most {} are allowed",
        args.ssid.len(),
        MAX_SSID_LENGTH
    );
    ensure!(
        (0.0..=1.0).contains(&args.loss),
        "loss must be within 0 and 1, got {}",
        args.loss
    );
    ensure!(args.beacon_interval > 0, "beacon interval must not be zero");
    let beacon_interval_tu = u16::try_from(args.beacon_interval / 1024)
        .context("beacon interval does not fit the beacon interval field")?;
    ensure!(beacon_interval_tu > 0, "beacon interval is shorter than one time unit");

    let sim_config = SimConfig::default()
        .with_loss_probability(args.loss)
        .with_seed(args.seed);
    let mut sim = Simulation::new(sim_config);
    sim.set_message_log(MessageLog::new(!args.quiet, None));

    let phy = PhyCapabilities::for_standard(args.standard);
    let bss = BssConfig::for_phy(&args.ssid, &phy)
        .with_beacon_interval(Duration::from_micros(args.beacon_interval));
    let ap = sim.add_access_point(phy.clone(), ApConfig::new(bss).with_beacon_jitter(args.jitter));
    sim.set_tx_path(ap, args.tx_path);

    let sta_config = StaConfig::new(&args.ssid)
        .with_active_probing(args.active_probing)
        .with_max_missed_beacons(args.max_missed_beacons)
        .with_qos_supported(args.qos);
    for _ in 0..args.stations {
        sim.add_station(phy.clone(), sta_config.clone());
    }
    Ok(sim)
}

/// Every associated station sends one payload to its neighbour, the access point one
/// broadcast.
fn traffic_round(sim: &mut Simulation, round: u64) {
    let stations: Vec<MacAddress> = (1..sim.len()).map(|index| sim.node(index).address()).collect();
    for (position, index) in (1..sim.len()).enumerate() {
        let to = stations[(position + 1) % stations.len()];
        let payload = format!("round {} from {}", round, index).into_bytes();
        sim.send_from_above(index, payload, to, Some((round % 8) as u8));
    }
    sim.send_from_above(0, round.to_be_bytes().to_vec(), MacAddress::broadcast(), None);
}

fn summary(sim: &Simulation) {
    println!();
    println!(
        "{:<18} {:<24} {:>8} {:>8} {:>8} {:>10}",
        "Address", "State", "Probes", "Assocs", "Rx", "Slot"
    );
    for index in 0..sim.len() {
        let mac = sim.node(index);
        let received = sim.inbox(index).received.len();
        if let Some(ap) = mac.as_access_point() {
            let counters = ap.counters();
            println!(
                "{:<18} {:<24} {:>8} {:>8} {:>8} {:>10}",
                mac.address().to_string(),
                format!("AP, {} stations", ap.registry().len()),
                counters.probe_responses,
                counters.association_responses,
                received,
                format!("{} us", ap.slot().as_micros()),
            );
        } else if let Some(sta) = mac.as_station() {
            let counters = sta.counters();
            println!(
                "{:<18} {:<24} {:>8} {:>8} {:>8} {:>10}",
                mac.address().to_string(),
                sta.state().to_string(),
                counters.probe_requests,
                counters.association_requests,
                received,
                format!("{} us", sta.link_parameters().slot.as_micros()),
            );
        }
    }
    println!(
        "\n{} frames on the air, {} events",
        sim.transmissions().len(),
        sim.events().len()
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Arguments::parse();

    let mut sim = build(&args).context("invalid scenario")?;
    if !args.quiet {
        let mut banner = MessageLog::new(true, Some(1));
        banner.add_message(StatusMessage::new(
            MessageType::Status,
            format!(
                "{} with {} stations for {} ms",
                args.standard, args.stations, args.duration
            ),
        ));
    }

    sim.start_all();
    let end = Duration::from_millis(args.duration);
    if args.traffic_period == 0 {
        sim.run_until(end);
    } else {
        let period = Duration::from_millis(args.traffic_period);
        let mut round = 0;
        while sim.now() + period <= end {
            sim.run_for(period);
            traffic_round(&mut sim, round);
            round += 1;
        }
        sim.run_until(end);
    }

    summary(&sim);
    Ok(())
}
