//! Synthetic capture and injection endpoints for running the pipeline
//! without a packet driver.

use crate::error::Result;
use crate::network::core::packet_data::{Direction, PacketData};
use crate::network::processing::PacketSink;
use log::{debug, info};
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Shape of the generated traffic.
#[derive(Debug, Clone, Copy)]
pub struct TrafficProfile {
    /// Packets per second, split evenly between both directions
    pub packets_per_second: u32,
    /// Payload size of every packet
    pub packet_size: usize,
}

impl TrafficProfile {
    /// Packets that should have been emitted `elapsed` into the run.
    fn due(&self, elapsed: Duration) -> u64 {
        elapsed.as_millis() as u64 * u64::from(self.packets_per_second) / 1000
    }
}

/// Starts a thread feeding random packets into `sender` at a steady pace.
///
/// Directions alternate, starting with outbound. The thread stops when
/// `running` is cleared or the receiving side hangs up, and returns how
/// many packets it emitted.
pub fn spawn_generator(
    sender: Sender<PacketData>,
    profile: TrafficProfile,
    running: Arc<AtomicBool>,
) -> JoinHandle<u64> {
    thread::spawn(move || {
        let mut rng = rand::rng();
        let started = Instant::now();
        let mut emitted = 0u64;

        info!(
            "Generating {} packets/s of {} bytes",
            profile.packets_per_second, profile.packet_size
        );

        'outer: while running.load(Ordering::SeqCst) {
            let due = profile.due(started.elapsed());
            while emitted < due {
                let direction = if emitted % 2 == 0 {
                    Direction::Outbound
                } else {
                    Direction::Inbound
                };
                let mut payload = vec![0u8; profile.packet_size];
                rng.fill(&mut payload[..]);

                if sender.send(PacketData::new(payload, direction)).is_err() {
                    debug!("Receiver gone, generator stopping");
                    break 'outer;
                }
                emitted += 1;
            }
            thread::sleep(Duration::from_millis(1));
        }

        emitted
    })
}

/// Per-direction delivery counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectionTally {
    pub packets: u64,
    pub bytes: u64,
}

/// Injection endpoint that only counts what it receives.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CountingSink {
    pub inbound: DirectionTally,
    pub outbound: DirectionTally,
    /// Sum of capture-to-delivery latencies in microseconds
    #[serde(skip)]
    total_latency_us: u128,
    /// Longest capture-to-delivery latency seen, in milliseconds
    pub max_latency_ms: u64,
}

impl CountingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> u64 {
        self.inbound.packets + self.outbound.packets
    }

    /// Mean capture-to-delivery latency, if anything was delivered.
    pub fn mean_latency_ms(&self) -> Option<f64> {
        let packets = self.packets();
        if packets == 0 {
            return None;
        }
        Some(self.total_latency_us as f64 / packets as f64 / 1000.0)
    }
}

impl PacketSink for CountingSink {
    fn send(&mut self, packet: PacketData) -> Result<()> {
        let tally = match packet.direction {
            Direction::Inbound => &mut self.inbound,
            Direction::Outbound => &mut self.outbound,
        };
        tally.packets += 1;
        tally.bytes += packet.size() as u64;

        let age = packet.age();
        self.total_latency_us += age.as_micros();
        self.max_latency_ms = self.max_latency_ms.max(age.as_millis() as u64);
        Ok(())
    }
}
