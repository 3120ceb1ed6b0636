use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use fetchstate::{FetchController, Phase, RequestDescriptor, RequestOptions, ReqwestTransport, RetrievalState, Transport};
use serde_json::Value;
use tracing::{info, warn};

mod cli;
mod logging;
mod tracker;

use cli::App;
use tracker::Tracker;

#[tokio::main]
async fn main() -> ExitCode {
    let app = App::parse();

    if let Err(e) = logging::init(app.log.as_deref(), app.log_format) {
        eprintln!("error: {e:#}");
        return ExitCode::from(2);
    }

    match run(app).await {
        Ok(Outcome::AllFetched) => ExitCode::SUCCESS,
        Ok(Outcome::SomeFailed) => ExitCode::FAILURE,
        Ok(Outcome::Interrupted) => ExitCode::from(130),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    AllFetched,
    SomeFailed,
    Interrupted,
}

async fn run(app: App) -> Result<Outcome> {
    let transport =
        ReqwestTransport::from_settings(app.transport_settings()).context("failed to build HTTP transport")?;
    let tracker = Tracker::new(app.quiet);
    let options = app.controller_options().on_transition(tracker.observer());
    let mut controller = FetchController::<Value, _>::with_options(transport, options);

    let outcome = drive(&mut controller, &app.targets, &app.request_options(), &tracker, |state| {
        let line = serde_json::to_string(state).context("failed to encode state")?;
        tracker.println(&line);
        Ok(())
    })
    .await;

    tracker.finish();
    outcome
}

/// Retrieve `targets` in order, handing each settled state to `report`.
///
/// Every target gets its own attempt, so a repeated target is answered by
/// the cache or, with the cache off, retrieved again.
async fn drive<C, F>(
    controller: &mut FetchController<Value, C>,
    targets: &[String],
    request_options: &RequestOptions,
    tracker: &Tracker,
    mut report: F,
) -> Result<Outcome>
where
    C: Transport,
    F: FnMut(&RetrievalState<Value>) -> Result<()>,
{
    let mut failed = 0usize;
    for target in targets {
        tracker.start(target);
        controller.clear_target();
        let descriptor = RequestDescriptor::new(target.as_str()).with_options(request_options.clone());
        let attempt = controller.set_target(descriptor);

        tokio::select! {
            _ = attempt.settled() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!(url = %target, "interrupted, tearing down controller");
                controller.teardown();
                tracker.interrupted();
            }
        }

        let state = controller.state();
        if state.phase != Phase::Fetched {
            failed += 1;
        }
        report(&state)?;

        if controller.is_torn_down() {
            return Ok(Outcome::Interrupted);
        }
    }

    info!(targets = targets.len(), failed, "done");
    Ok(if failed == 0 { Outcome::AllFetched } else { Outcome::SomeFailed })
}
