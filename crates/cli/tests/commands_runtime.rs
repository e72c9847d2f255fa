use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use camquote_cli::commands::extract::{ExtractRequest, TextSource};
use camquote_cli::commands::render::RenderRequest;
use camquote_cli::commands::{config, doctor, extract, inventory, render};
use serde_json::Value;
use tempfile::TempDir;

const NESTED_INVENTORY: &str = r#"{
    "cameras": {"dome": [{"id": "cam_2mp", "name": "2MP Dome", "rate": 2500}]},
    "recorders": {"nvr": [{"id": "nvr_4ch", "name": "4 Channel NVR", "rate": 8000}]},
    "rules": {"install": 5000}
}"#;

#[test]
fn inventory_prints_flattened_items() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("inventory.json"), NESTED_INVENTORY).expect("seed inventory");

    with_storage(dir.path(), &[], || {
        let result = inventory::run();
        assert_eq!(result.exit_code, 0, "expected inventory listing to succeed");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "inventory");
        assert_eq!(payload["status"], "ok");
        let items = payload["data"].as_array().expect("items array");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["category"], "cameras/dome");
        assert_eq!(items[1]["category"], "recorders/nvr");
    });
}

#[test]
fn inventory_returns_config_failure_for_invalid_port() {
    let dir = TempDir::new().expect("tempdir");
    with_storage(dir.path(), &[("CAMQUOTE_SERVER_PORT", "0")], || {
        let result = inventory::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn extract_offline_uses_rules_and_saves_latest_result() {
    let dir = TempDir::new().expect("tempdir");
    with_storage(dir.path(), &[], || {
        let result = extract::run(ExtractRequest {
            source: TextSource::Inline("3 cctv low quality\n700mtr cable coax".to_string()),
            offline: true,
            save: true,
        });
        assert_eq!(result.exit_code, 0, "expected offline extraction to succeed");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["message"], "Generated 2 items using basic parsing (no AI API key found)");
        assert_eq!(payload["data"]["items"][0]["description"], "CCTV Camera - Low Quality");
        assert_eq!(payload["data"]["items"][1]["amount"], 14000.0);
        assert_eq!(payload["data"]["saved"], true);

        let saved = fs::read_to_string(dir.path().join("latest_response.json")).expect("saved");
        let saved: Value = serde_json::from_str(&saved).expect("saved json");
        assert_eq!(saved["item_count"], 2);
        assert_eq!(saved["ai_provider"], "basic parsing (no AI API key found)");
    });
}

#[test]
fn extract_without_provider_keys_falls_back_without_saving() {
    let dir = TempDir::new().expect("tempdir");
    let input = dir.path().join("request.txt");
    fs::write(&input, "install").expect("seed input");

    with_storage(dir.path(), &[], || {
        let result = extract::run(ExtractRequest {
            source: TextSource::File(input.clone()),
            offline: false,
            save: false,
        });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["ai_provider"], "basic parsing (no AI API key found)");
        assert_eq!(payload["data"]["items"][0]["description"], "Installation Basic");
        assert!(payload["data"]["failures"].as_array().expect("failures").is_empty());
        assert!(!dir.path().join("latest_response.json").exists());
    });
}

#[test]
fn extract_reports_unreadable_input_file() {
    let dir = TempDir::new().expect("tempdir");
    with_storage(dir.path(), &[], || {
        let result = extract::run(ExtractRequest {
            source: TextSource::File(dir.path().join("missing.txt")),
            offline: true,
            save: false,
        });
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input");
    });
}

#[test]
fn doctor_passes_with_empty_storage() {
    let dir = TempDir::new().expect("tempdir");
    with_storage(dir.path(), &[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
        let names: Vec<&str> = report["checks"]
            .as_array()
            .expect("checks")
            .iter()
            .filter_map(|check| check["name"].as_str())
            .collect();
        assert_eq!(
            names,
            vec!["config_validation", "prompt_template", "inventory_store", "extractor_chain"]
        );
        assert_eq!(
            report["checks"][3]["details"],
            "no AI provider configured; rule-based parsing only"
        );
    });
}

#[test]
fn doctor_flags_corrupt_inventory() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("inventory.json"), "{not json").expect("seed");

    with_storage(dir.path(), &[("CAMQUOTE_GROQ_API_KEY", "gsk_abcdefghijklmnop")], || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [fail] inventory_store"));
        assert!(result.output.contains("- [ok] extractor_chain: Groq AI (FREE) -> rule-based parsing"));
    });
}

#[test]
fn doctor_skips_remaining_checks_when_config_is_invalid() {
    let dir = TempDir::new().expect("tempdir");
    with_storage(dir.path(), &[("CAMQUOTE_LLM_PROVIDER_ORDER", "groq,cohere")], || {
        let report = parse_payload(&doctor::run(true).output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["status"], "skipped");
    });
}

#[test]
fn config_redacts_keys_and_attributes_sources() {
    let dir = TempDir::new().expect("tempdir");
    with_storage(
        dir.path(),
        &[("GEMINI_API_KEY", "AIzaSyExampleSecretValue"), ("CAMQUOTE_LOG_LEVEL", "debug")],
        || {
            let output = config::run();

            assert!(output.starts_with("effective config (source precedence: env > file > default):"));
            assert!(!output.contains("AIzaSyExampleSecretValue"));
            assert!(output.contains(
                "- llm.gemini.api_key = <redacted> (source: env (GEMINI_API_KEY))"
            ));
            assert!(output.contains("- llm.groq.api_key = <unset> (source: default)"));
            assert!(output.contains("- logging.level = debug (source: env (CAMQUOTE_LOG_LEVEL))"));
            assert!(output.contains("- server.port = 8000 (source: default)"));
        },
    );
}

#[test]
fn render_writes_pdf_from_request_shaped_file() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let items = dir.path().join("quote.json");
        let output = dir.path().join("quote.pdf");
        fs::write(
            &items,
            r#"{"items": [{"description": "2MP Dome Camera", "quantity": 4, "rate": 2500}]}"#,
        )
        .expect("seed items");

        let result = render::run(RenderRequest {
            items_path: items,
            output_path: output.clone(),
            customer_name: Some("Anand".to_string()),
            customer_location: None,
            include_info_page: false,
        });
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert!(payload["message"].as_str().unwrap_or("").contains("(total 10000)"));
        let bytes = fs::read(&output).expect("pdf written");
        assert!(bytes.starts_with(b"%PDF-"));
    });
}

#[test]
fn render_rejects_zero_quantity_before_writing() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let items = dir.path().join("quote.json");
        let output = dir.path().join("quote.pdf");
        fs::write(&items, r#"[{"description": "Adaptor", "quantity": 0, "rate": 300}]"#)
            .expect("seed items");

        let result = render::run(RenderRequest {
            items_path: items,
            output_path: output.clone(),
            customer_name: None,
            customer_location: None,
            include_info_page: true,
        });
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "validation");
        assert!(payload["message"].as_str().unwrap_or("").contains("items[0].quantity"));
        assert!(!output.exists());
    });
}

#[test]
fn render_rejects_amount_overflow_as_validation() {
    with_env(&[], || {
        let dir = TempDir::new().expect("tempdir");
        let items = dir.path().join("quote.json");
        let output = dir.path().join("quote.pdf");
        fs::write(
            &items,
            r#"[{"description": "Bulk cable", "quantity": 4000000000, "rate": 70000000000000000000}]"#,
        )
        .expect("seed items");

        let result = render::run(RenderRequest {
            items_path: items,
            output_path: output.clone(),
            customer_name: None,
            customer_location: None,
            include_info_page: false,
        });
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "validation");
        assert!(payload["message"].as_str().unwrap_or("").contains("items[0].amount"));
        assert!(!output.exists());
    });
}

#[test]
fn render_falls_back_when_the_configured_font_is_unusable() {
    let dir = TempDir::new().expect("tempdir");
    let items = dir.path().join("quote.json");
    let output = dir.path().join("quote.pdf");
    let font = dir.path().join("broken.ttf");
    fs::write(&items, r#"[{"description": "Adaptor", "quantity": 2, "rate": 300}]"#)
        .expect("seed items");
    fs::write(&font, b"not a font").expect("seed font");
    let font = font.display().to_string();

    with_env(&[("CAMQUOTE_RENDER_FONT_PATH", font.as_str())], || {
        let result = render::run(RenderRequest {
            items_path: items.clone(),
            output_path: output.clone(),
            customer_name: None,
            customer_location: None,
            include_info_page: true,
        });
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);
        assert!(fs::read(&output).expect("pdf written").starts_with(b"%PDF-"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

/// Points every storage path into `dir` before applying `vars`.
fn with_storage(dir: &Path, vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    let inventory = dir.join("inventory.json").display().to_string();
    let latest = dir.join("latest_response.json").display().to_string();
    let prompt = dir.join("system_prompt.txt").display().to_string();

    let mut all = vec![
        ("CAMQUOTE_STORAGE_INVENTORY_PATH", inventory.as_str()),
        ("CAMQUOTE_STORAGE_LATEST_RESULT_PATH", latest.as_str()),
        ("CAMQUOTE_STORAGE_PROMPT_PATH", prompt.as_str()),
    ];
    all.extend_from_slice(vars);
    with_env(&all, test_fn);
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let mut keys = vec![
        "CAMQUOTE_STORAGE_INVENTORY_PATH",
        "CAMQUOTE_STORAGE_LATEST_RESULT_PATH",
        "CAMQUOTE_STORAGE_PROMPT_PATH",
        "CAMQUOTE_LLM_PROVIDER_ORDER",
        "CAMQUOTE_LLM_TIMEOUT_SECS",
        "CAMQUOTE_LLM_TEMPERATURE",
        "CAMQUOTE_SERVER_BIND_ADDRESS",
        "CAMQUOTE_SERVER_PORT",
        "CAMQUOTE_SERVER_CORS_ORIGINS",
        "CAMQUOTE_RENDER_FONT_PATH",
        "CAMQUOTE_LOGGING_LEVEL",
        "CAMQUOTE_LOGGING_FORMAT",
        "CAMQUOTE_LOG_LEVEL",
        "CAMQUOTE_LOG_FORMAT",
        "GROQ_API_KEY",
        "GEMINI_API_KEY",
        "ANTHROPIC_API_KEY",
        "OPENAI_API_KEY",
    ]
    .into_iter()
    .map(str::to_string)
    .collect::<Vec<_>>();
    for provider in ["GROQ", "GEMINI", "ANTHROPIC", "OPENAI"] {
        for field in ["API_KEY", "MODEL", "BASE_URL", "MAX_TOKENS"] {
            keys.push(format!("CAMQUOTE_{provider}_{field}"));
        }
    }

    let previous_values: Vec<(String, Option<String>)> =
        keys.iter().map(|key| (key.clone(), env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
