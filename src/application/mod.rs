//! Application layer: the processing worker, the retry controller built
//! on a job queue with delayed redelivery, and the engine surface the
//! outside world calls.

pub mod engine;
pub mod retry;
pub mod worker;
