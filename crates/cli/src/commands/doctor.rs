use camquote_agent::ExtractorRegistry;
use camquote_core::config::{AppConfig, LoadOptions};
use camquote_core::extraction::{PromptSource, PromptTemplate};
use camquote_db::{InventoryRepository, JsonInventoryRepository};
use serde::Serialize;

use crate::commands::CommandResult;

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

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str, reason: &str) -> Self {
        Self { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck::pass(
                "config_validation",
                "configuration loaded and validated",
            ));
            let prompt = check_prompt_template(&config, &mut checks);
            checks.push(check_inventory_store(&config));
            checks.push(check_extractor_chain(&config, prompt));
        }
        Err(error) => {
            checks.push(DoctorCheck::fail("config_validation", error.to_string()));
            for name in ["prompt_template", "inventory_store", "extractor_chain"] {
                checks.push(DoctorCheck::skipped(name, "configuration did not load"));
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_prompt_template(
    config: &AppConfig,
    checks: &mut Vec<DoctorCheck>,
) -> Option<PromptTemplate> {
    let path = &config.storage.prompt_path;
    match PromptTemplate::load(path) {
        Ok(prompt) => {
            let details = match prompt.source() {
                PromptSource::File => format!(
                    "loaded `{}` ({} characters)",
                    path.display(),
                    prompt.instructions().chars().count()
                ),
                PromptSource::Embedded => {
                    format!("`{}` not found; using embedded instructions", path.display())
                }
            };
            checks.push(DoctorCheck::pass("prompt_template", details));
            Some(prompt)
        }
        Err(error) => {
            checks.push(DoctorCheck::fail(
                "prompt_template",
                format!("could not read `{}`: {error}", path.display()),
            ));
            None
        }
    }
}

fn check_inventory_store(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                "inventory_store",
                format!("failed to initialize async runtime: {error}"),
            );
        }
    };

    let path = &config.storage.inventory_path;
    let result = runtime.block_on(async {
        let repository = JsonInventoryRepository::open(path).await?;
        repository.list().await
    });

    match result {
        Ok(items) if path.exists() => DoctorCheck::pass(
            "inventory_store",
            format!("{} items loaded from `{}`", items.len(), path.display()),
        ),
        Ok(_) => DoctorCheck::pass(
            "inventory_store",
            format!("`{}` not found; inventory starts empty", path.display()),
        ),
        Err(error) => DoctorCheck::fail(
            "inventory_store",
            format!("could not load `{}`: {error}", path.display()),
        ),
    }
}

fn check_extractor_chain(config: &AppConfig, prompt: Option<PromptTemplate>) -> DoctorCheck {
    let Some(prompt) = prompt else {
        return DoctorCheck::skipped("extractor_chain", "the prompt template did not load");
    };

    match ExtractorRegistry::new(config.llm.clone(), prompt) {
        Ok(registry) => {
            let labels = registry.configured_labels();
            if labels.is_empty() {
                DoctorCheck::pass(
                    "extractor_chain",
                    "no AI provider configured; rule-based parsing only",
                )
            } else {
                DoctorCheck::pass(
                    "extractor_chain",
                    format!("{} -> rule-based parsing", labels.join(" -> ")),
                )
            }
        }
        Err(error) => DoctorCheck::fail("extractor_chain", error.to_string()),
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
