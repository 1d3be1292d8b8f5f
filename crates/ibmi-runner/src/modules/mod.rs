pub(crate) mod cl_command;
pub(crate) mod device_vary;
pub(crate) mod download_fix;
pub(crate) mod network_install;
pub(crate) mod object_authority;
pub(crate) mod object_restore;
pub(crate) mod object_save;
pub(crate) mod sql_query;
pub(crate) mod submit_job;

use std::time::{Duration, Instant, SystemTime};

/// start/end/delta reporting shared by the long-running modules.
pub(crate) struct TaskClock {
    started_at: SystemTime,
    started: Instant,
}

impl TaskClock {
    pub(crate) fn start() -> Self {
        Self {
            started_at: SystemTime::now(),
            started: Instant::now(),
        }
    }

    pub(crate) fn start_stamp(&self) -> String {
        humantime::format_rfc3339_seconds(self.started_at).to_string()
    }

    pub(crate) fn end_stamp(&self) -> String {
        humantime::format_rfc3339_seconds(SystemTime::now()).to_string()
    }

    pub(crate) fn delta(&self) -> String {
        format_delta(self.started.elapsed())
    }
}

// H:MM:SS, whole seconds; sub-second noise is useless in a task report
fn format_delta(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}
