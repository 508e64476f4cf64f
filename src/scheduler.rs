//! Periodic jobs

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{
    config::SchedulerConfig,
    error::{AppError, AppResult},
    services::borrowings::BorrowingsService,
};

fn scheduler_error(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("Scheduler error: {}", e))
}

/// Cron job running the overdue sweep
pub fn overdue_job(cron: &str, borrowings: BorrowingsService) -> AppResult<Job> {
    Job::new_async(cron, move |_uuid, _lock| {
        let borrowings = borrowings.clone();

        Box::pin(async move {
            if let Err(e) = borrowings.run_overdue_sweep().await {
                tracing::error!("Error running overdue sweep: {}", e);
            }
        })
    })
    .map_err(scheduler_error)
}

/// Start the scheduler; the returned handle keeps it running
pub async fn start_scheduler(
    config: &SchedulerConfig,
    borrowings: BorrowingsService,
) -> AppResult<Option<JobScheduler>> {
    if !config.enabled {
        tracing::info!("Overdue sweep scheduler disabled");
        return Ok(None);
    }

    let scheduler = JobScheduler::new().await.map_err(scheduler_error)?;
    scheduler
        .add(overdue_job(&config.overdue_cron, borrowings)?)
        .await
        .map_err(scheduler_error)?;
    scheduler.start().await.map_err(scheduler_error)?;

    tracing::info!(cron = %config.overdue_cron, "Overdue sweep scheduler started");
    Ok(Some(scheduler))
}
