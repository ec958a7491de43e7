//! Job engine: paced synthesis scheduling and the end-to-end pipeline.
//!
//! The engine runs one job as a single cooperative task:
//! - The scheduler keeps exactly one synthesis call in flight
//! - Timing is injected through [`Clock`] so pacing is testable
//! - Assembly only starts once every segment has audio

mod clock;
mod pipeline;
mod scheduler;

pub use clock::{Clock, ManualClock, TokioClock};
pub use pipeline::{
    assemble, job_span, AudiobookOutput, AudiobookPipeline, AudiobookRequest, ProgressEvent,
};
pub use scheduler::{Progress, RateLimitedScheduler, SchedulerConfig};
