use std::{
    fs,
    path::Path,
};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};
use tracing::info;

use crate::error::{ProbeError, Result};

use super::models::{ResultFiles, RunReport};

pub fn responses_file_name(microservice: &str, env: &str) -> String {
    format!("api_responses_{microservice}_{env}.json")
}

pub fn status_file_name(microservice: &str, env: &str) -> String {
    format!("api_status_{microservice}_{env}.json")
}

/// Writes both result documents for a pair into `dir`, replacing earlier runs.
pub fn write_results(
    dir: &Path,
    report: &RunReport,
    microservice: &str,
    env: &str,
) -> Result<ResultFiles> {
    fs::create_dir_all(dir).map_err(|source| ProbeError::io(dir, source))?;

    let responses = dir.join(responses_file_name(microservice, env));
    write_json(&responses, &report.responses_document(microservice, env))?;

    let status = dir.join(status_file_name(microservice, env));
    write_json(&status, &report.status_document(microservice, env))?;

    info!(
        responses = %responses.display(),
        status = %status.display(),
        "results saved"
    );
    Ok(ResultFiles { responses, status })
}

fn write_json(path: &Path, document: &Value) -> Result<()> {
    fs::write(path, to_pretty_json(document)).map_err(|source| ProbeError::io(path, source))
}

/// Pretty JSON with four-space indentation.
pub fn to_pretty_json(document: &Value) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    // Serializing a Value into a Vec cannot fail.
    let _ = document.serialize(&mut serializer);
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::models::{CallOutcome, CallRecord};
    use anyhow::Result;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_report() -> RunReport {
        let mut report = RunReport::default();
        report.results.insert(
            "/health",
            CallOutcome::Completed(CallRecord {
                query_param: serde_json::Map::new(),
                request_body: Value::Null,
                status_code: 200,
                response_time_sec: 0.012,
                response: json!({"status": "up"}),
            }),
        );
        report.status_log.record("/health", 200);
        report
    }

    #[test]
    fn file_names_follow_pair() {
        assert_eq!(responses_file_name("ms", "dev"), "api_responses_ms_dev.json");
        assert_eq!(status_file_name("ms", "dev"), "api_status_ms_dev.json");
    }

    #[test]
    fn to_pretty_json_uses_four_spaces() {
        let rendered = String::from_utf8(to_pretty_json(&json!({"a": [1]}))).unwrap();
        assert_eq!(rendered, "{\n    \"a\": [\n        1\n    ]\n}");
    }

    #[test]
    fn write_results_creates_directory_and_overwrites() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path().join("results");

        let first = write_results(&dir, &sample_report(), "ms", "dev")?;
        let second = write_results(&dir, &RunReport::default(), "ms", "dev")?;
        assert_eq!(first, second);

        let responses: Value = serde_json::from_slice(&std::fs::read(&second.responses)?)?;
        assert_eq!(responses, json!({"microservice": "ms", "env": "dev"}));

        let status: Value = serde_json::from_slice(&std::fs::read(&second.status)?)?;
        assert_eq!(status["200"], json!([]));
        assert_eq!(status["Other"], json!({}));
        Ok(())
    }

    #[test]
    fn write_results_persists_records() -> Result<()> {
        let temp = tempdir()?;
        let files = write_results(temp.path(), &sample_report(), "ms", "qa")?;

        let responses: Value = serde_json::from_slice(&std::fs::read(&files.responses)?)?;
        assert_eq!(
            responses["/health"],
            json!({
                "query_param": {},
                "request_body": null,
                "status_code": 200,
                "response_time_sec": 0.012,
                "response": {"status": "up"}
            })
        );
        assert!(files
            .status
            .ends_with("api_status_ms_qa.json"));
        Ok(())
    }
}
