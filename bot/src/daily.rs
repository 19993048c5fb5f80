//! The daily run: pick a day, send it, then send generated extras.

use agent::io::search::SearchProvider;
use agent::orchestrator::SearchOrchestrator;
use agent::tasks::TaskExecutor;
use anyhow::{Context, Result, bail};
use rand::Rng;
use tracing::{info, instrument};

use crate::config::BotConfig;
use crate::prompts::{PromptItem, run_all_prompts};
use crate::sender::MessageSender;
use crate::trip::{
    TripData, background_text, nearby_steps, select_step, select_trip, step_message,
};

/// The selected day and everything derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPlan {
    pub trip_index: usize,
    pub step_index: usize,
    /// Journal message for the selected step; also the orchestration context.
    pub message: String,
    /// Nearby steps rendered for the domain answer task.
    pub background: String,
}

/// Select a trip and step and render the message and background text.
pub fn plan_day<R: Rng + ?Sized>(
    config: &BotConfig,
    trips: &[TripData],
    selector: Option<usize>,
    rng: &mut R,
) -> Result<DailyPlan> {
    let trip_index = select_trip(trips, selector, rng)?;
    let trip = &trips[trip_index];
    let trip_config = config
        .trips
        .get(trip_index)
        .with_context(|| format!("no config for trip {trip_index}"))?;
    let step_index = select_step(trip, rng)?;
    let steps = &trip.steps;
    let username = if config.username.trim().is_empty() {
        trip.username.as_str()
    } else {
        config.username.as_str()
    };
    if username.is_empty() {
        bail!(
            "no username for trip {}; set `username` in the config or export user/user.json",
            trip_config.trip_id
        );
    }

    Ok(DailyPlan {
        trip_index,
        step_index,
        message: step_message(
            trip_config,
            username,
            trip,
            &steps[step_index],
            &steps[0],
        ),
        background: background_text(nearby_steps(steps, step_index)),
    })
}

/// Send the day's message followed by every non-empty prompt result.
///
/// Returns the number of messages sent.
#[instrument(skip_all, fields(trip = plan.trip_index, step = plan.step_index))]
pub async fn run_day<E, S, M>(
    orchestrator: &SearchOrchestrator<E, S>,
    prompts: &[PromptItem],
    plan: &DailyPlan,
    sender: &mut M,
) -> Result<usize>
where
    E: TaskExecutor,
    S: SearchProvider + ?Sized,
    M: MessageSender,
{
    sender.send_message(&plan.message)?;
    let extras = run_all_prompts(orchestrator, prompts, &plan.message, &plan.background).await;
    for extra in &extras {
        sender.send_message(extra)?;
    }
    info!(extras = extras.len(), "day sent");
    Ok(1 + extras.len())
}
