mod worker;

pub use worker::worker_task;

// Re-export types from the library crate
pub use pdf_storybook::{
    BookletOptions, BookletStats, CompressOptions, CompressStats, SplitOptions, SplitStats,
};

/// Handle to a submitted conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

/// Commands sent from a front end to the worker
#[derive(Debug)]
pub enum JobCommand {
    Compress {
        job_id: JobId,
        input: Vec<u8>,
        options: CompressOptions,
    },
    Split {
        job_id: JobId,
        input: Vec<u8>,
        options: SplitOptions,
    },
    Booklet {
        job_id: JobId,
        input: Vec<u8>,
        options: BookletOptions,
    },
    /// Stop a running job; it reports `Cancelled`
    Cancel { job_id: JobId },
}

/// Statistics of a finished job, by mode
#[derive(Debug, Clone, PartialEq)]
pub enum JobStats {
    Compress(CompressStats),
    Split(SplitStats),
    Booklet(BookletStats),
}

/// Updates sent from the worker back to the front end
#[derive(Debug, Clone)]
pub enum JobUpdate {
    Started {
        job_id: JobId,
    },
    Completed {
        job_id: JobId,
        output: Vec<u8>,
        stats: JobStats,
    },
    Failed {
        job_id: JobId,
        message: String,
    },
    Cancelled {
        job_id: JobId,
    },
}

impl JobUpdate {
    pub fn job_id(&self) -> JobId {
        match self {
            JobUpdate::Started { job_id }
            | JobUpdate::Completed { job_id, .. }
            | JobUpdate::Failed { job_id, .. }
            | JobUpdate::Cancelled { job_id } => *job_id,
        }
    }

    /// True for the last update a job sends
    pub fn is_final(&self) -> bool {
        !matches!(self, JobUpdate::Started { .. })
    }
}
