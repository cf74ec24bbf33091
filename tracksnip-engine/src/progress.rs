//! Progress-feedback task supervisor
//!
//! Runs a slow operation as a background task while keeping one status
//! message alive in the user-facing channel: spinner frames are substituted
//! into the caller's template on a fixed cadence until the task completes,
//! then the status message is deleted and the task's result is surfaced.
//!
//! The loop wakes on task completion (`tokio::select!` over the join
//! handle) with the interval only capping the edit cadence, so completion
//! latency is not bound to the animation granularity. This is the only
//! place animation/polling logic lives.

use crate::engine::EngineError;
use crate::transport::StatusChannel;
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Animation frames cycled through the status message.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Placeholder replaced by the current spinner frame in status templates.
pub const FRAME_PLACEHOLDER: &str = "{spinner}";

fn render(template: &str, frame: usize) -> String {
    template.replace(FRAME_PLACEHOLDER, SPINNER_FRAMES[frame])
}

/// Supervise `task` while animating one status message.
///
/// Exactly one status message is sent and exactly one delete is attempted
/// per invocation, on both the success and the failure path. Edit failures
/// are logged and tolerated (a dropped frame must not kill the work);
/// a failed initial send aborts before the task is started.
pub async fn run_with_progress<T, F>(
    channel: &dyn StatusChannel,
    scope_id: i64,
    template: &str,
    interval: Duration,
    task: F,
) -> Result<T, EngineError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, EngineError>> + Send + 'static,
{
    let message = channel.send_status(scope_id, &render(template, 0)).await?;

    let mut handle = tokio::spawn(task);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a fresh interval completes immediately
    ticker.tick().await;

    let mut frame = 0usize;
    let result = loop {
        tokio::select! {
            joined = &mut handle => {
                break match joined {
                    Ok(result) => result,
                    Err(e) => Err(EngineError::Internal(format!("supervised task panicked: {}", e))),
                };
            }
            _ = ticker.tick() => {
                frame = (frame + 1) % SPINNER_FRAMES.len();
                if let Err(e) = channel
                    .edit_status(scope_id, message, &render(template, frame))
                    .await
                {
                    tracing::warn!(scope_id, error = %e, "status edit failed");
                }
            }
        }
    };

    if let Err(e) = channel.delete_status(scope_id, message).await {
        tracing::warn!(scope_id, error = %e, "status delete failed");
    }
    result
}
