mod cli;
mod config;
mod confirmation;
mod error;
mod intake;
mod remote;
mod scheduler;
#[cfg(test)]
mod test_support;
mod ui;
mod workflow;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use config::ConvoyConfig;
use confirmation::{ConfirmationWriter, FileConfirmationWriter};
use intake::{Intake, JobSubmission};
use remote::{CreateJobStatus, HttpRemoteClient, RemoteService};
use scheduler::{JobPhase, Scheduler};
use ui::BatchProgress;
use workflow::{WorkflowRunner, WorkflowState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "convoy=debug" } else { "convoy=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => ConvoyConfig::load_from(path, true)?,
        None => ConvoyConfig::load()?,
    };
    cli.apply_overrides(&mut config)?;

    match &cli.command {
        Command::Request {
            client_id,
            product_id,
            quantity,
            origin,
            destination,
            collection_time,
        } => {
            let submission = JobSubmission {
                client_id: client_id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                product_id: product_id.clone(),
                quantity: *quantity,
                origin: origin.clone(),
                destination: destination.clone(),
                collection_time: collection_time.clone(),
            };
            run_submissions(&config, vec![submission]).await
        }
        Command::Submit { file } => {
            let submissions = JobSubmission::load_all(file)
                .with_context(|| format!("failed to load jobs from {}", file.display()))?;
            if submissions.is_empty() {
                bail!("{} contains no jobs", file.display());
            }
            run_submissions(&config, submissions).await
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// How waiting for the scheduler ended.
#[derive(Debug, PartialEq, Eq)]
enum WaitOutcome {
    Idle,
    Interrupted,
}

/// Submit every job, then drive the accepted ones until the scheduler is idle.
async fn run_submissions(config: &ConvoyConfig, submissions: Vec<JobSubmission>) -> Result<()> {
    let remote = Arc::new(
        HttpRemoteClient::new(&config.remote_url, config.request_timeout())
            .context("failed to build remote client")?,
    );
    let writer = Arc::new(FileConfirmationWriter::new(&config.confirmation_dir));
    let runner = WorkflowRunner::new(Arc::clone(&remote), writer, config.poll_interval());
    let intake = Intake::new(remote, Scheduler::new(runner, config.max_concurrency));
    let scheduler = intake.scheduler();

    info!(
        jobs = submissions.len(),
        max_concurrency = scheduler.max_concurrency(),
        remote_url = %config.remote_url,
        "submitting jobs"
    );

    let progress = BatchProgress::start();
    let mut failed_submissions = 0usize;
    let mut accepted = Vec::new();
    for submission in submissions {
        let product_id = submission.product_id.clone();
        let result = intake.request_job(submission).await;
        match &result {
            Ok(resp) if resp.status == CreateJobStatus::Accept => {
                accepted.extend(resp.job_id.clone());
            }
            Ok(_) => {}
            Err(_) => failed_submissions += 1,
        }
        progress.submission(&product_id, &result);
    }

    let outcome = wait_for_jobs(scheduler, &progress, forward_interrupts()).await;
    progress.finish();

    let reports = scheduler.take_reports().await;
    for report in &reports {
        progress.print_report(report);
    }

    let mut aborted = 0usize;
    let mut unfinished = 0usize;
    for job_id in &accepted {
        match scheduler.job_phase(job_id).await {
            Some(JobPhase::Finished(WorkflowState::Done)) | None => {}
            Some(JobPhase::Finished(_)) => aborted += 1,
            Some(phase) => {
                unfinished += 1;
                progress.print_unfinished(job_id, phase);
            }
        }
    }

    if outcome == WaitOutcome::Interrupted {
        bail!("interrupted with {unfinished} job(s) unfinished");
    }
    if failed_submissions > 0 || aborted > 0 || unfinished > 0 {
        bail!(
            "{failed_submissions} submission(s) failed, {aborted} job(s) aborted, {unfinished} job(s) never finished"
        );
    }
    info!(
        jobs = reports.len(),
        dir = %config.confirmation_dir.display(),
        "all jobs completed"
    );
    Ok(())
}

/// Deliver one message per Ctrl-C for as long as the receiver is alive.
fn forward_interrupts() -> mpsc::UnboundedReceiver<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

/// Wait for the scheduler to go idle while refreshing the spinner.
///
/// The first interrupt stops admission and lets admitted jobs finish. A
/// second one gives up on them.
async fn wait_for_jobs<S, W>(
    scheduler: &Scheduler<S, W>,
    progress: &BatchProgress,
    mut interrupts: mpsc::UnboundedReceiver<()>,
) -> WaitOutcome
where
    S: RemoteService + 'static,
    W: ConfirmationWriter + 'static,
{
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let idle = scheduler.wait_idle();
    tokio::pin!(idle);
    let mut listening = true;
    let mut interrupted = false;
    loop {
        tokio::select! {
            _ = &mut idle => return WaitOutcome::Idle,
            _ = ticker.tick() => {
                progress.update(scheduler.in_flight().await, scheduler.queued().await);
            }
            signal = interrupts.recv(), if listening => match signal {
                None => listening = false,
                Some(()) if interrupted => {
                    let in_flight = scheduler.in_flight().await;
                    warn!(in_flight, "second interrupt received, abandoning admitted jobs");
                    return WaitOutcome::Interrupted;
                }
                Some(()) => {
                    interrupted = true;
                    if scheduler.is_running().await {
                        warn!("interrupt received, waiting for admitted jobs to finish");
                        progress.interrupted();
                        scheduler.stop().await;
                    }
                }
            },
        }
    }
}
