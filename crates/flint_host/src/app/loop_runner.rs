use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::events::{FrameEvent, HostEvent};
use super::input::{InputCommand, InputScript, InteractionCollector};
use super::math::ViewPose;
use super::metrics::{MetricsAccumulator, MetricsHandle};
use super::queue::EventQueue;
use super::scene::{SceneCollaborator, SceneError, SceneGraph};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePacing {
    /// Frames are stamped `start + index / fps` and run back to back.
    #[default]
    Simulated,
    /// Frames are stamped from the wall clock and paced to the target rate.
    Realtime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub target_fps: u32,
    pub pacing: FramePacing,
    /// Host timestamp of the first frame, in seconds.
    pub start_timestamp: f64,
    pub run_seconds: Option<f64>,
    pub max_frames: Option<u64>,
    pub max_frame_delta_seconds: f64,
    pub metrics_log_interval_seconds: f64,
    pub view: ViewPose,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            pacing: FramePacing::Simulated,
            start_timestamp: 0.0,
            run_seconds: Some(40.0),
            max_frames: None,
            max_frame_delta_seconds: 0.25,
            metrics_log_interval_seconds: 5.0,
            view: ViewPose::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("application failed to load its scene: {0}")]
    Load(#[source] SceneError),
    #[error("simulated loop would never stop: set run_seconds or max_frames")]
    Unbounded,
}

/// Application driven by the host loop. Events arrive one at a time, in
/// delivery order, on the thread that called [`run_host`].
pub trait App {
    fn load(&mut self, scene: &mut dyn SceneCollaborator) -> Result<(), SceneError>;
    fn handle_event(&mut self, event: &HostEvent, scene: &mut dyn SceneCollaborator);
    fn unload(&mut self, _scene: &mut dyn SceneCollaborator) {}
    fn exit_requested(&self) -> bool {
        false
    }
    fn debug_status(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostReport {
    pub frames: u64,
    pub events_delivered: u64,
    pub last_timestamp: f64,
}

/// Where the loop's raw inputs come from besides the scene itself.
pub struct HostInputs<'a> {
    pub script: InputScript,
    pub queue: Option<&'a EventQueue<InputCommand>>,
}

impl Default for HostInputs<'_> {
    fn default() -> Self {
        Self {
            script: InputScript::default(),
            queue: None,
        }
    }
}

pub fn run_host(
    config: &LoopConfig,
    app: &mut dyn App,
    scene: &mut SceneGraph,
    inputs: HostInputs<'_>,
) -> Result<HostReport, HostError> {
    run_host_with_metrics(config, app, scene, inputs, MetricsHandle::default())
}

pub fn run_host_with_metrics(
    config: &LoopConfig,
    app: &mut dyn App,
    scene: &mut SceneGraph,
    inputs: HostInputs<'_>,
    metrics_handle: MetricsHandle,
) -> Result<HostReport, HostError> {
    let target_fps = config.target_fps.max(1);
    let run_seconds = config
        .run_seconds
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0);
    if run_seconds.is_none()
        && config.max_frames.is_none()
        && config.pacing == FramePacing::Simulated
    {
        return Err(HostError::Unbounded);
    }
    let max_frame_delta = normalize_positive(config.max_frame_delta_seconds, 0.25);
    let metrics_interval = normalize_positive(config.metrics_log_interval_seconds, 5.0);
    let frame_target = frame_duration(target_fps);

    info!(
        target_fps,
        pacing = ?config.pacing,
        run_seconds = ?run_seconds,
        max_frames = ?config.max_frames,
        "loop_config"
    );

    app.load(scene).map_err(HostError::Load)?;
    info!(
        node_count = scene.node_count(),
        root_count = scene.roots().len(),
        "app_loaded"
    );

    let HostInputs { mut script, queue } = inputs;
    let mut clock = HostClock::new(config.pacing, config.start_timestamp, target_fps, max_frame_delta);
    let mut collector = InteractionCollector::default();
    let mut metrics = MetricsAccumulator::new(config.start_timestamp, metrics_interval);
    let mut commands: Vec<InputCommand> = Vec::new();
    let mut events: Vec<HostEvent> = Vec::new();
    let mut report = HostReport {
        last_timestamp: config.start_timestamp,
        ..HostReport::default()
    };

    loop {
        if config
            .max_frames
            .is_some_and(|max_frames| report.frames >= max_frames)
        {
            break;
        }
        let tick = clock.next_tick();
        let session_seconds = tick.now - config.start_timestamp;
        if run_seconds.is_some_and(|limit| session_seconds >= limit) {
            break;
        }
        if tick.clamped {
            warn!(max_frame_delta_seconds = max_frame_delta, "frame_delta_clamped");
        }

        commands.clear();
        script.drain_due(session_seconds, &mut commands);
        if let Some(queue) = queue {
            queue.drain_into(&mut commands);
        }

        events.clear();
        collector.refresh(scene, &mut events);
        for command in &commands {
            collector.apply(command, scene, &mut events);
        }
        let mut delivered = deliver(app, scene, &events);

        for node in scene.frame_listeners() {
            // An earlier listener this frame may have detached this one.
            if !scene.is_attached(node) {
                continue;
            }
            let event = HostEvent::Frame(FrameEvent {
                node,
                now: tick.now,
                dt: tick.dt,
                frame_index: report.frames,
                view: config.view,
            });
            app.handle_event(&event, scene);
            delivered += 1;
        }

        report.frames += 1;
        report.events_delivered += delivered as u64;
        report.last_timestamp = tick.now;
        metrics.record_frame(tick.dt);
        metrics.record_events(delivered);

        if let Some(snapshot) = metrics.maybe_snapshot(tick.now) {
            metrics_handle.publish(snapshot);
            let status = app.debug_status();
            info!(
                fps = snapshot.fps,
                events_per_second = snapshot.events_per_second,
                frame_time_ms = snapshot.frame_time_ms,
                status = status.as_deref().unwrap_or("-"),
                "loop_metrics"
            );
        }

        if app.exit_requested() {
            info!(reason = "app_request", "shutdown_requested");
            break;
        }

        if config.pacing == FramePacing::Realtime {
            let sleep = compute_cap_sleep(clock.since_last_tick(), frame_target);
            if sleep > Duration::ZERO {
                thread::sleep(sleep);
            }
        }
    }

    app.unload(scene);
    info!(
        frames = report.frames,
        events_delivered = report.events_delivered,
        last_timestamp = report.last_timestamp,
        "shutdown"
    );
    Ok(report)
}

fn deliver(app: &mut dyn App, scene: &mut SceneGraph, events: &[HostEvent]) -> usize {
    for event in events {
        debug!(event = event.label(), target = ?event.target(), "host_event");
        app.handle_event(event, scene);
    }
    events.len()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Tick {
    now: f64,
    dt: f64,
    clamped: bool,
}

#[derive(Debug)]
struct HostClock {
    pacing: FramePacing,
    start: f64,
    fps: u32,
    max_frame_delta: f64,
    frame_index: u64,
    last_now: f64,
    last_wall: Instant,
    wall_elapsed: f64,
}

impl HostClock {
    fn new(pacing: FramePacing, start: f64, fps: u32, max_frame_delta: f64) -> Self {
        Self {
            pacing,
            start,
            fps: fps.max(1),
            max_frame_delta,
            frame_index: 0,
            last_now: start,
            last_wall: Instant::now(),
            wall_elapsed: 0.0,
        }
    }

    fn next_tick(&mut self) -> Tick {
        let first = self.frame_index == 0;
        let tick = match self.pacing {
            FramePacing::Simulated => {
                let now = self.start + self.frame_index as f64 / self.fps as f64;
                let dt = if first { 0.0 } else { now - self.last_now };
                Tick {
                    now,
                    dt,
                    clamped: false,
                }
            }
            FramePacing::Realtime => {
                let wall = Instant::now();
                let raw_dt = if first {
                    0.0
                } else {
                    wall.saturating_duration_since(self.last_wall).as_secs_f64()
                };
                self.last_wall = wall;
                let (dt, clamped) = clamp_frame_delta(raw_dt, self.max_frame_delta);
                self.wall_elapsed += dt;
                Tick {
                    now: self.start + self.wall_elapsed,
                    dt,
                    clamped,
                }
            }
        };
        self.frame_index = self.frame_index.saturating_add(1);
        self.last_now = tick.now;
        tick
    }

    fn since_last_tick(&self) -> Duration {
        Instant::now().saturating_duration_since(self.last_wall)
    }
}

fn clamp_frame_delta(raw_dt: f64, max_frame_delta: f64) -> (f64, bool) {
    if raw_dt > max_frame_delta {
        (max_frame_delta, true)
    } else {
        (raw_dt.max(0.0), false)
    }
}

fn normalize_positive(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn frame_duration(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(1) as f64)
}

fn compute_cap_sleep(elapsed_since_last_tick: Duration, frame_target: Duration) -> Duration {
    frame_target.saturating_sub(elapsed_since_last_tick)
}
