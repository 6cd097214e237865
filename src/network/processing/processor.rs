use crate::error::{LaggardError, Result};
use crate::network::core::clock::Clock;
use crate::network::core::packet_data::PacketData;
use crate::network::processing::pipeline::Pipeline;
use crate::utils::log_statistics;
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// How often throughput is logged
const LOG_INTERVAL: Duration = Duration::from_secs(2);
/// Pause between ticks while some module is still working on packets
const ACTIVE_SLEEP: Duration = Duration::from_millis(1);
/// Longest wait for new packets while nothing is held
const IDLE_WAIT: Duration = Duration::from_millis(10);

/// Injection side of the pipeline: where finished packets go.
pub trait PacketSink {
    fn send(&mut self, packet: PacketData) -> Result<()>;
}

impl PacketSink for Vec<PacketData> {
    fn send(&mut self, packet: PacketData) -> Result<()> {
        self.push(packet);
        Ok(())
    }
}

impl PacketSink for Sender<PacketData> {
    fn send(&mut self, packet: PacketData) -> Result<()> {
        Sender::send(self, packet).map_err(|e| LaggardError::Sink(e.to_string()))
    }
}

/// Runs the processing loop until `running` is cleared.
///
/// Each round drains the capture channel into the pipeline, ticks every
/// running module and hands the outgoing packets to `sink`. When no module
/// reported activity the loop blocks on the channel for a short while
/// instead of spinning. A disconnected channel ends the loop once the
/// pipeline holds nothing any more.
///
/// On exit all modules are stopped and every packet still owned by the
/// pipeline is delivered, so nothing captured is silently lost.
pub fn run_processing_loop<C: Clock, S: PacketSink>(
    pipeline: &mut Pipeline<C>,
    packet_receiver: &Receiver<PacketData>,
    sink: &mut S,
    running: &AtomicBool,
) -> Result<()> {
    let mut last_log_time = Instant::now();
    let mut received_packet_count = 0;
    let mut sent_packet_count = 0;
    let mut disconnected = false;

    info!("Starting packet processing.");

    while running.load(Ordering::SeqCst) {
        while let Ok(packet) = packet_receiver.try_recv() {
            pipeline.enqueue(packet);
            received_packet_count += 1;
        }

        let active = pipeline.tick()?;
        sent_packet_count += deliver(pipeline.take_outgoing(), sink);

        if last_log_time.elapsed() >= LOG_INTERVAL {
            log_statistics(received_packet_count, sent_packet_count);
            received_packet_count = 0;
            sent_packet_count = 0;
            last_log_time = Instant::now();
        }

        if active || disconnected {
            if disconnected && pipeline.in_flight() == 0 {
                debug!("Capture channel closed and pipeline empty");
                break;
            }
            thread::sleep(ACTIVE_SLEEP);
            continue;
        }

        match packet_receiver.recv_timeout(IDLE_WAIT) {
            Ok(packet) => {
                pipeline.enqueue(packet);
                received_packet_count += 1;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => disconnected = true,
        }
    }

    let remaining = pipeline.shutdown()?;
    sent_packet_count += deliver(remaining, sink);
    log_statistics(received_packet_count, sent_packet_count);

    info!("Packet processing stopped.");
    Ok(())
}

/// Sends every packet, returning how many the sink accepted.
fn deliver<S: PacketSink>(packets: Vec<PacketData>, sink: &mut S) -> usize {
    let mut sent = 0;
    for packet in packets {
        if let Err(e) = sink.send(packet) {
            error!("Failed to send packet: {}", e);
            continue;
        }
        sent += 1;
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::core::packet_data::Direction;
    use crate::settings::SettingsBuilder;
    use std::sync::mpsc;

    #[test]
    fn test_loop_delivers_everything_after_disconnect() {
        let mut pipeline = Pipeline::new();
        pipeline
            .apply_settings(&SettingsBuilder::new().lag(5).build())
            .unwrap();

        let (tx, rx) = mpsc::channel();
        for tag in 0..20u8 {
            tx.send(PacketData::new(vec![tag; 10], Direction::Outbound))
                .unwrap();
        }
        drop(tx);

        let running = AtomicBool::new(true);
        let mut sink: Vec<PacketData> = Vec::new();
        run_processing_loop(&mut pipeline, &rx, &mut sink, &running).unwrap();

        assert_eq!(sink.len(), 20);
        assert_eq!(pipeline.in_flight(), 0);
        assert!(pipeline.running_modules().is_empty());
    }

    #[test]
    fn test_cleared_flag_still_flushes() {
        let mut pipeline = Pipeline::new();
        pipeline
            .apply_settings(&SettingsBuilder::new().lag(3_000).build())
            .unwrap();
        pipeline.enqueue(PacketData::new(vec![1; 10], Direction::Inbound));
        pipeline.tick().unwrap();
        assert_eq!(pipeline.in_flight(), 1);

        let (_tx, rx) = mpsc::channel();
        let running = AtomicBool::new(false);
        let mut sink: Vec<PacketData> = Vec::new();
        run_processing_loop(&mut pipeline, &rx, &mut sink, &running).unwrap();

        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_channel_sink_forwards() {
        let (tx, rx) = mpsc::channel();
        let mut sink = tx;
        PacketSink::send(&mut sink, PacketData::new(vec![9], Direction::Inbound)).unwrap();
        assert_eq!(rx.recv().unwrap().payload, vec![9]);

        drop(rx);
        assert!(PacketSink::send(&mut sink, PacketData::new(vec![1], Direction::Inbound)).is_err());
    }
}
