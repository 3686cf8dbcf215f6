//! Lifecycle phases and the concurrent fan-out shared by Start and Stop.

use super::{AggregateError, Application, LifecycleError, ModuleFailure, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use strum_macros::Display;
use tokio::task::{JoinError, JoinHandle};

/// The four phases an application goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Init,
    ProvidedServices,
    Start,
    Stop,
}

/// Why a fan-out stopped waiting before every task finished.
pub(crate) enum Interruption {
    /// The root token fired; modules get `grace` to unwind on their own.
    Cancelled { grace: Duration },
    TimedOut(Duration),
}

type Task = (String, JoinHandle<anyhow::Result<()>>);

/// Run `op` for every participant on its own task and wait for all of them.
///
/// Failures (errors and panics) are collected in participant order. Tasks
/// are never aborted: if `interrupt` resolves first, the ones still running
/// after the grace period are detached and reported as pending.
pub(crate) async fn fan_out<C, F, Fut, I>(
    app: &Application,
    phase: Phase,
    participants: Vec<(String, Arc<C>)>,
    op: F,
    interrupt: I,
    aggregate: fn(AggregateError) -> LifecycleError,
) -> Result<()>
where
    C: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<C>, Application) -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    I: Future<Output = Interruption>,
{
    tracing::info!(%phase, modules = participants.len(), "Phase: {phase}");

    let mut tasks: Vec<Task> = participants
        .into_iter()
        .map(|(module, participant)| {
            tracing::debug!(%phase, module = %module, "Launching");
            let handle = tokio::spawn(op(participant, app.clone()));
            (module, handle)
        })
        .collect();

    let mut failures = Vec::new();
    let mut joined = 0;
    let interruption = tokio::select! {
        biased;
        () = join_in_order(phase, &mut tasks, &mut joined, &mut failures) => None,
        reason = interrupt => Some(reason),
    };

    let Some(reason) = interruption else {
        return finish(phase, failures, aggregate);
    };

    if let Interruption::Cancelled { grace } = reason {
        tracing::info!(%phase, ?grace, "Cancelled, waiting for modules to unwind");
        let drained = tokio::time::timeout(
            grace,
            join_in_order(phase, &mut tasks, &mut joined, &mut failures),
        )
        .await;
        if drained.is_ok() {
            return finish(phase, failures, aggregate);
        }
    }

    let mut pending = Vec::new();
    for (module, handle) in tasks.into_iter().skip(joined) {
        if handle.is_finished() {
            record(phase, &module, handle.await, &mut failures);
        } else {
            // Dropping the handle detaches the task; it keeps running.
            pending.push(module);
        }
    }
    tracing::warn!(%phase, ?pending, "Stopped waiting for modules");

    Err(match reason {
        Interruption::Cancelled { .. } => LifecycleError::Cancelled {
            phase,
            pending,
            failures,
        },
        Interruption::TimedOut(after) => LifecycleError::timeout(
            phase,
            format!("Timeout after {after:?}, still running: {}", pending.join(", ")),
        ),
    })
}

/// Await the tasks from `joined` onwards, in participant order.
async fn join_in_order(
    phase: Phase,
    tasks: &mut [Task],
    joined: &mut usize,
    failures: &mut Vec<ModuleFailure>,
) {
    let start = *joined;
    for (module, handle) in tasks[start..].iter_mut() {
        let outcome = handle.await;
        *joined += 1;
        record(phase, module, outcome, failures);
    }
}

fn finish(
    phase: Phase,
    failures: Vec<ModuleFailure>,
    aggregate: fn(AggregateError) -> LifecycleError,
) -> Result<()> {
    tracing::info!(%phase, failed = failures.len(), "Phase {phase} complete");
    if failures.is_empty() {
        Ok(())
    } else {
        Err(aggregate(AggregateError::new(phase, failures)))
    }
}

fn record(
    phase: Phase,
    module: &str,
    outcome: std::result::Result<anyhow::Result<()>, JoinError>,
    failures: &mut Vec<ModuleFailure>,
) {
    match outcome {
        Ok(Ok(())) => tracing::debug!(%phase, module, "Completed"),
        Ok(Err(error)) => {
            tracing::error!(%phase, module, error = %error, "Module failed");
            failures.push(ModuleFailure::new(module, error));
        }
        Err(join_error) => {
            tracing::error!(%phase, module, error = %join_error, "Module task died");
            failures.push(ModuleFailure::new(
                module,
                anyhow::anyhow!("task failed: {join_error}"),
            ));
        }
    }
}
