use agentic_agent::OpenAiCompatibleClient;
use agentic_core::config::AppConfig;
use agentic_core::directory::UserDirectory;
use agentic_core::domain::user::UserFilter;
use agentic_db::SqlUserDirectory;
use serde::Serialize;

use crate::commands::{current_thread_runtime, load_config, open_migrated_pool};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match load_config() {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_database(&config));
            checks.push(check_llm_endpoint(&config));
        }
        Err(failure) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: failure.message,
            });
            for name in ["database_schema", "llm_endpoint"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database(config: &AppConfig) -> DoctorCheck {
    let name = "database_schema";
    let runtime = match current_thread_runtime() {
        Ok(runtime) => runtime,
        Err(failure) => {
            return DoctorCheck { name, status: CheckStatus::Fail, details: failure.message };
        }
    };

    let result = runtime.block_on(async {
        let pool = open_migrated_pool(&config.database)
            .await
            .map_err(|failure| format!("{}: {}", failure.error_class, failure.message))?;
        let listed = SqlUserDirectory::new(pool.clone()).list(UserFilter::default()).await;
        pool.close().await;
        listed
            .map(|users| users.len())
            .map_err(|error| format!("users table unreadable: {error}"))
    });

    match result {
        Ok(count) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("connected using `{}`, {count} users stored", config.database.url),
        },
        Err(details) => DoctorCheck { name, status: CheckStatus::Fail, details },
    }
}

fn check_llm_endpoint(config: &AppConfig) -> DoctorCheck {
    let name = "llm_endpoint";
    if !config.llm.enabled {
        return DoctorCheck {
            name,
            status: CheckStatus::Skipped,
            details: "language model disabled, prompts use the rule-based agent".to_string(),
        };
    }

    match OpenAiCompatibleClient::from_config(&config.llm) {
        Ok(client) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("model `{}` at `{}`", config.llm.model, client.endpoint()),
        },
        Err(error) => DoctorCheck { name, status: CheckStatus::Fail, details: error.to_string() },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
