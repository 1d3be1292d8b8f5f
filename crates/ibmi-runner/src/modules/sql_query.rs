use crate::modules::TaskClock;
use ibmi_bridge::{BridgeError, Transport};
use ibmi_protocol::{TaskOutcome, RC_ERROR, RC_PARAM_NOT_VALID};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Params {
    pub(crate) sql: String,
    #[serde(default)]
    pub(crate) expected_row_count: Option<i64>,
}

pub(crate) async fn run(transport: &dyn Transport, params: Params) -> anyhow::Result<TaskOutcome> {
    let sql = params.sql.trim().to_string();
    if sql.is_empty() {
        return Ok(TaskOutcome::failure(RC_PARAM_NOT_VALID, "sql cannot be empty"));
    }

    let clock = TaskClock::start();
    let rows = match transport.run_sql(&sql).await {
        Ok(rows) => rows,
        // bad SQL is a reportable task failure, not a crash
        Err(BridgeError::Rpc { message, job_log }) => {
            return Ok(TaskOutcome::failure(RC_ERROR, message)
                .with_job_log(job_log)
                .with_field("sql", sql));
        }
        Err(err) => return Err(err.into()),
    };

    if let Some(expected) = params.expected_row_count {
        let actual = rows.len() as i64;
        if actual != expected {
            return Ok(TaskOutcome::failure(
                RC_ERROR,
                format!("Returned row count {actual} does not match the expected row count {expected}."),
            )
            .with_field("row", rows)
            .with_field("sql", sql));
        }
    }

    Ok(TaskOutcome::success(0)
        .with_field("row", rows)
        .with_field("sql", sql)
        .with_field("start", clock.start_stamp())
        .with_field("end", clock.end_stamp())
        .with_field("delta", clock.delta()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibmi_bridge::testing::ScriptedTransport;
    use serde_json::json;

    fn params(raw: &str) -> Params {
        serde_json::from_str(raw).unwrap()
    }

    #[tokio::test]
    async fn rows_come_back_under_the_row_field() {
        let transport = ScriptedTransport::new();
        transport.push_sql_rows(vec![json!({"OBJNAME": "PAYROLL"}), json!({"OBJNAME": "LEDGER"})]);
        let outcome = run(
            &transport,
            params(r#"{"sql": "SELECT OBJNAME FROM TABLE (QSYS2.OBJECT_STATISTICS('TESTLIB','*ALL')) X"}"#),
        )
        .await
        .unwrap();
        assert!(!outcome.failed);
        assert_eq!(outcome.extra["row"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sql_error_is_a_task_failure() {
        let transport = ScriptedTransport::new();
        transport.fail_next_sql("SQL0204: TESTLIB in QSYS type *LIB not found.");
        let outcome = run(&transport, params(r#"{"sql": "SELECT 1 FROM NOPE"}"#))
            .await
            .unwrap();
        assert!(outcome.failed);
        assert_eq!(outcome.rc, RC_ERROR);
        assert!(outcome.msg.as_deref().unwrap().contains("SQL0204"));
    }

    #[tokio::test]
    async fn row_count_mismatch_fails_with_both_counts() {
        let transport = ScriptedTransport::new();
        transport.push_sql_rows(vec![json!({"CNT": 1})]);
        let outcome = run(
            &transport,
            params(r#"{"sql": "SELECT * FROM T", "expected_row_count": 3}"#),
        )
        .await
        .unwrap();
        assert!(outcome.failed);
        assert!(outcome.msg.as_deref().unwrap().contains("1"));
        assert!(outcome.msg.as_deref().unwrap().contains("3"));
    }
}
