pub mod duration;
pub mod handle;
pub mod poller;

pub use duration::{parse_duration, parse_duration_or_zero};
pub use handle::extract_job_handle;
pub use poller::{wait_for_status, PollOrder, PollResult, PollSpec};
