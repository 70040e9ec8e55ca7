use std::process::ExitCode;

use flint_host::{run_host_with_metrics, HostInputs, MetricsHandle, SceneGraph};
use tracing::{error, info};

use super::bootstrap::AppWiring;

pub(crate) fn run(wiring: AppWiring) -> ExitCode {
    let AppWiring {
        host,
        mut app,
        script,
    } = wiring;
    let mut scene = SceneGraph::default();
    let metrics = MetricsHandle::default();
    let inputs = HostInputs {
        script,
        queue: None,
    };

    let report = match run_host_with_metrics(&host, &mut app, &mut scene, inputs, metrics.clone())
    {
        Ok(report) => report,
        Err(err) => {
            error!(error = %err, "session_failed");
            return ExitCode::FAILURE;
        }
    };

    if let Some(controller) = app.controller() {
        let state = controller.state();
        info!(
            frames = report.frames,
            events_delivered = report.events_delivered,
            fps = metrics.snapshot().fps,
            screen = ?state.screen,
            sessions = state.session,
            spawned = state.spawned_count,
            enemies = state.entities.len(),
            "session_finished"
        );
    }

    ExitCode::SUCCESS
}
