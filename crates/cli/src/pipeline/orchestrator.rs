//! Pipeline orchestrator - wires the episode, radars and the event writer.
//!
//! The episode ticks on its own thread; radar callbacks push events into a
//! bounded queue drained here on the async side.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{RadarEvent, ScenarioBlueprint, SensorSource};
use radar::{LongRangeRadarSensor, RadarCallbackFn, RadarError};
use serde::Serialize;
use simulation::{EpisodeProxy, Scenario};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::PipelineStats;
use crate::error::CliError;

type RadarSource = Box<dyn SensorSource<Event = RadarEvent, Error = RadarError>>;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The scenario to run
    pub blueprint: ScenarioBlueprint,

    /// Number of episode frames to record (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Event queue capacity
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Output file (None = stdout)
    pub output: Option<PathBuf>,
}

/// One JSON line of output
#[derive(Serialize)]
struct EventRecord<'a> {
    radar: &'a str,
    #[serde(flatten)]
    event: &'a RadarEvent,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the scenario until `max_frames`, the timeout, or the queue closes
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let mut scenario =
            Scenario::spawn(&self.config.blueprint).context("Failed to spawn scenario")?;
        let episode = scenario.episode().clone();

        let (tx, mut rx) = mpsc::channel::<(Arc<str>, Arc<RadarEvent>)>(self.config.buffer_size);
        let dropped = Arc::new(AtomicU64::new(0));

        let mut stats = PipelineStats::default();
        let mut sensors: Vec<RadarSource> = Vec::with_capacity(scenario.radars().len());

        for placement in scenario.radars() {
            let sensor = LongRangeRadarSensor::new(
                placement.actor_id,
                placement.parent,
                EpisodeProxy::new(&episode),
            );
            let source: RadarSource = Box::new(sensor);
            let callback = forward_to(Arc::from(placement.id.as_str()), tx.clone(), &dropped);

            match source.listen(callback) {
                Ok(subscription) => {
                    debug!(radar = %placement.id, %subscription, "radar attached");
                    stats.active_radars += 1;
                    sensors.push(source);
                }
                Err(e) => {
                    warn!(radar = %placement.id, error = %e, "radar skipped");
                    stats.rejected_radars += 1;
                }
            }
        }
        drop(tx);

        if sensors.is_empty() {
            scenario.teardown();
            return Err(CliError::NoActiveRadar {
                rejected: stats.rejected_radars,
            }
            .into());
        }

        let mut writer = self.open_output()?;
        let first_frame = episode.frame() + 1;
        let stop_frame = self.config.max_frames.map(|n| first_frame + n.saturating_sub(1));
        let deadline = self.config.timeout.map(|t| tokio::time::Instant::now() + t);

        let ticker = episode.start()?;
        info!(
            radars = stats.active_radars,
            max_frames = ?self.config.max_frames,
            "Pipeline running"
        );

        loop {
            let next = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, rx.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        info!("Pipeline timeout reached");
                        break;
                    }
                },
                None => rx.recv().await,
            };
            let Some((radar, event)) = next else {
                break;
            };

            write_event(&mut writer, &radar, &event)?;
            stats.events_written += 1;
            stats.last_frame = stats.last_frame.max(event.frame());
            stats.radar_metrics.update(&event);

            if stop_frame.is_some_and(|stop| event.frame() >= stop) {
                info!(frame = event.frame(), "Frame limit reached");
                break;
            }
        }
        writer.flush().map_err(CliError::from)?;

        // Unsubscribe before stopping the clock so no tick races the teardown.
        drop(sensors);
        tokio::task::spawn_blocking(move || ticker.stop())
            .await
            .context("Failed to join tick thread")?;
        scenario.teardown();

        stats.first_frame = first_frame;
        stats.events_dropped = dropped.load(Ordering::Relaxed);
        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    fn open_output(&self) -> Result<Box<dyn Write + Send>> {
        match &self.config.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                info!(path = %path.display(), "Writing events to file");
                Ok(Box::new(BufWriter::new(file)))
            }
            None => Ok(Box::new(io::stdout())),
        }
    }
}

/// Build a radar callback pushing into the event queue
///
/// Runs on the tick thread, so it never blocks: a full queue drops the event.
fn forward_to(
    radar: Arc<str>,
    tx: mpsc::Sender<(Arc<str>, Arc<RadarEvent>)>,
    dropped: &Arc<AtomicU64>,
) -> RadarCallbackFn {
    let dropped = dropped.clone();
    Arc::new(move |event: Arc<RadarEvent>| {
        if tx.try_send((radar.clone(), event)).is_err() {
            dropped.fetch_add(1, Ordering::Relaxed);
        }
    })
}

fn write_event(
    writer: &mut dyn Write,
    radar: &str,
    event: &RadarEvent,
) -> std::result::Result<(), CliError> {
    serde_json::to_writer(&mut *writer, &EventRecord { radar, event })?;
    writer.write_all(b"\n")?;
    Ok(())
}
