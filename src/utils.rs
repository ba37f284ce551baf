use std::fmt;
use std::time::Duration;

/// General purpose helpers shared by the commands
/// - TransferReport, the outcome of a receive
/// - Throughput formatting for the end-of-transfer summary

/// Outcome of a decrypt session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Name the sender asked the file to be stored under
    pub filename: String,
    /// Plaintext bytes written to the output
    pub bytes_written: u64,
    /// True when the trailer matched the hash of the received cluster hashes
    pub verified: bool,
}

/// Average processing speed, scaled to the largest unit below 1024
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub value: f64,
    pub unit: &'static str,
}

impl Throughput {
    pub fn measure(bytes: u64, elapsed: Duration) -> Throughput {
        const UNITS: [&str; 4] = ["B/s", "KB/s", "MB/s", "GB/s"];

        let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
        let mut value = bytes as f64 / seconds;
        let mut unit = 0;
        while value > 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }

        Throughput {
            value,
            unit: UNITS[unit],
        }
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Processed at an average rate of: {:.2} {}", self.value, self.unit)
    }
}
