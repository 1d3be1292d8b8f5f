use ibmi_protocol::{JobHandle, JobLogEntry};
use regex::Regex;
use std::sync::OnceLock;

/// CPC1221 is the completion message SBMJOB leaves in the submitting
/// job's log; its text carries the qualified name of the new job.
pub const SUBMIT_MESSAGE_ID: &str = "CPC1221";

fn handle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d{6}/[A-Za-z0-9#_]{1,10}/[A-Za-z0-9#_]{1,10}").unwrap()
    })
}

/// Pull the first qualified job name out of free-form message text.
pub fn extract_job_handle(message: &str) -> Option<JobHandle> {
    let raw = handle_pattern().find(message)?.as_str();
    raw.parse().ok()
}

/// Scan a job log for the SBMJOB completion message and extract the
/// handle of the job it announced.
pub fn find_submitted_job(job_log: &[JobLogEntry]) -> Option<JobHandle> {
    job_log
        .iter()
        .find(|entry| entry.message_id == SUBMIT_MESSAGE_ID)
        .and_then(|entry| extract_job_handle(&entry.message_text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_handle_from_cpc1221_text() {
        let text = "Job 123456/QPGMR/PAYROLL submitted to job queue QBATCH in library QGPL.";
        let handle = extract_job_handle(text).unwrap();
        assert_eq!(handle.to_string(), "123456/QPGMR/PAYROLL");
    }

    #[test]
    fn ignores_text_without_a_handle() {
        assert!(extract_job_handle("Job submitted.").is_none());
    }

    #[test]
    fn finds_submit_message_among_noise() {
        let log = vec![
            JobLogEntry {
                message_id: "CPF1124".to_string(),
                message_text: "Job started.".to_string(),
                ..JobLogEntry::default()
            },
            JobLogEntry {
                message_id: "CPC1221".to_string(),
                message_text: "Job 654321/OPS#USER/NIGHTLY submitted.".to_string(),
                ..JobLogEntry::default()
            },
        ];
        let handle = find_submitted_job(&log).unwrap();
        assert_eq!(handle.to_string(), "654321/OPS#USER/NIGHTLY");
    }
}
