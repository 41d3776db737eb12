//! Pipeline statistics.

use std::time::Duration;

use observability::RadarMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Radars that started listening
    pub active_radars: usize,

    /// Radars whose `listen` was refused
    pub rejected_radars: usize,

    /// Events written to the output
    pub events_written: u64,

    /// Events lost because the queue was full
    pub events_dropped: u64,

    /// First frame of the run
    pub first_frame: u64,

    /// Highest frame seen
    pub last_frame: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Per-event aggregates
    pub radar_metrics: RadarMetricsAggregator,
}

impl PipelineStats {
    /// Frames covered by written events
    pub fn frames(&self) -> u64 {
        if self.events_written == 0 {
            0
        } else {
            self.last_frame + 1 - self.first_frame.min(self.last_frame)
        }
    }

    /// Events per second of wall-clock time
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_written as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    ///
    /// Goes to stderr so it never mixes with events written to stdout.
    pub fn print_summary(&self) {
        eprintln!("\n=== Pipeline Statistics ===\n");
        eprintln!("Duration: {:.2}s", self.duration.as_secs_f64());
        eprintln!("Frames: {}", self.frames());
        eprintln!(
            "Radars: {} listening, {} rejected",
            self.active_radars, self.rejected_radars
        );
        eprintln!("Events written: {}", self.events_written);
        eprintln!("Events dropped: {}", self.events_dropped);
        eprintln!("Events/s: {:.2}", self.events_per_sec());
        eprintln!();
        eprintln!("{}", self.radar_metrics.summary());
    }
}
