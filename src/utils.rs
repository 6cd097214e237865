//! Utility functions for packet processing.

use log::info;

/// Logs packet throughput for the last interval.
///
/// `received` counts packets taken from the capture side, `sent` counts
/// packets handed to the injection side. Because lag holds packets across
/// intervals the difference is not a drop rate: it is reported as the
/// change in packets held.
pub fn log_statistics(received: usize, sent: usize) {
    let held = received as i64 - sent as i64;
    let held_percentage = if received == 0 {
        0.0
    } else {
        (held as f64 / received as f64) * 100.0
    };

    info!(
        "Received Packets: {}, Sent Packets: {}, Held Delta: {} - {:.2}%",
        received, sent, held, held_percentage
    );
}
