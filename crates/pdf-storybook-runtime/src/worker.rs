use crate::{JobCommand, JobId, JobStats, JobUpdate};
use pdf_storybook::{CancelFlag, PipelineError};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::{self, JoinError, JoinSet};

/// Jobs in flight: cancel flags by job, and the job each task runs
#[derive(Default)]
struct Running {
    cancel: HashMap<JobId, CancelFlag>,
    tasks: HashMap<task::Id, JobId>,
}

/// Run jobs until the command channel closes, then wait for the ones in flight.
///
/// Jobs run concurrently; each gets its own cancel flag.
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<JobCommand>,
    update_tx: mpsc::UnboundedSender<JobUpdate>,
) {
    let mut running = Running::default();
    let mut jobs: JoinSet<JobId> = JoinSet::new();

    loop {
        tokio::select! {
            cmd = command_rx.recv() => match cmd {
                Some(cmd) => process_command(cmd, &mut running, &mut jobs, &update_tx),
                None => break,
            },
            Some(done) = jobs.join_next_with_id(), if !jobs.is_empty() => {
                reap(done, &mut running, &update_tx);
            }
        }
    }

    while let Some(done) = jobs.join_next_with_id().await {
        reap(done, &mut running, &update_tx);
    }
}

/// Forget a finished task. A task that panicked never sent its final
/// update, so it is reported as failed here.
fn reap(
    done: Result<(task::Id, JobId), JoinError>,
    running: &mut Running,
    update_tx: &mpsc::UnboundedSender<JobUpdate>,
) {
    match done {
        Ok((task_id, job_id)) => {
            running.tasks.remove(&task_id);
            running.cancel.remove(&job_id);
        }
        Err(e) => {
            let Some(job_id) = running.tasks.remove(&e.id()) else {
                log::error!("Untracked job task ended abnormally: {}", e);
                return;
            };
            running.cancel.remove(&job_id);
            log::error!("Job {:?} panicked: {}", job_id, e);
            let _ = update_tx.send(JobUpdate::Failed {
                job_id,
                message: format!("job task ended abnormally: {}", e),
            });
        }
    }
}

fn process_command(
    cmd: JobCommand,
    running: &mut Running,
    jobs: &mut JoinSet<JobId>,
    update_tx: &mpsc::UnboundedSender<JobUpdate>,
) {
    let (job_id, job) = match cmd {
        JobCommand::Cancel { job_id } => {
            match running.cancel.get(&job_id) {
                Some(flag) => flag.cancel(),
                None => log::debug!("Cancel for unknown job {:?}", job_id),
            }
            return;
        }
        JobCommand::Compress {
            job_id,
            input,
            options,
        } => (job_id, Job::Compress(input, options)),
        JobCommand::Split {
            job_id,
            input,
            options,
        } => (job_id, Job::Split(input, options)),
        JobCommand::Booklet {
            job_id,
            input,
            options,
        } => (job_id, Job::Booklet(input, options)),
    };

    if running.cancel.contains_key(&job_id) {
        log::warn!("Job {:?} is already running, duplicate submission ignored", job_id);
        return;
    }

    let cancel = CancelFlag::new();
    running.cancel.insert(job_id, cancel.clone());
    let _ = update_tx.send(JobUpdate::Started { job_id });

    let update_tx = update_tx.clone();
    let handle = jobs.spawn(async move {
        let update = match job.run(cancel).await {
            Ok((output, stats)) => JobUpdate::Completed {
                job_id,
                output,
                stats,
            },
            Err(PipelineError::Cancelled) => JobUpdate::Cancelled { job_id },
            Err(e) => {
                log::error!("Job {:?} failed: {}", job_id, e);
                JobUpdate::Failed {
                    job_id,
                    message: e.to_string(),
                }
            }
        };
        let _ = update_tx.send(update);
        job_id
    });
    running.tasks.insert(handle.id(), job_id);
}

enum Job {
    Compress(Vec<u8>, pdf_storybook::CompressOptions),
    Split(Vec<u8>, pdf_storybook::SplitOptions),
    Booklet(Vec<u8>, pdf_storybook::BookletOptions),
}

impl Job {
    async fn run(self, cancel: CancelFlag) -> pdf_storybook::Result<(Vec<u8>, JobStats)> {
        match self {
            Job::Compress(input, options) => {
                let done = pdf_storybook::compress(input, options, cancel).await?;
                Ok((done.pdf, JobStats::Compress(done.stats)))
            }
            Job::Split(input, options) => {
                let done = pdf_storybook::split(input, options, cancel).await?;
                Ok((done.pdf, JobStats::Split(done.stats)))
            }
            Job::Booklet(input, options) => {
                let done = pdf_storybook::booklet(input, options, cancel).await?;
                Ok((done.pdf, JobStats::Booklet(done.stats)))
            }
        }
    }
}
