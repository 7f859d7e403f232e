//! `crucible run` -- execute one sequence against a server and print the
//! results.

use std::sync::Arc;

use crucible_core::{Context, SequenceResult, SequenceStatus};
use crucible_runner::{LogObserver, SequenceRunner, UreqClient};
use crucible_storage::{MemoryRepository, Repository};

use crate::OutputFormat;

pub(crate) async fn cmd_run(sequence: &str, server: &str, params: &[String], output: OutputFormat) {
    let registry = match crucible_suites::build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("error building sequence registry: {}", e);
            std::process::exit(1);
        }
    };

    let mut context = Context::new();
    context.seed("server_url", serde_json::json!(server));
    for param in params {
        match param.split_once('=') {
            Some((key, value)) => context.seed(key, serde_json::json!(value)),
            None => {
                eprintln!("error: parameter '{}' is not in key=value form", param);
                std::process::exit(2);
            }
        }
    }

    let repository = Arc::new(MemoryRepository::new());
    if let Err(e) = repository.save_context("cli", &context).await {
        eprintln!("error seeding context: {}", e);
        std::process::exit(1);
    }

    let runner = SequenceRunner::new(
        Arc::new(registry),
        repository as Arc<dyn Repository>,
        Arc::new(UreqClient::new()),
    )
    .with_observer(Arc::new(LogObserver));

    let result = match runner.start("cli", sequence).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => match serde_json::to_string_pretty(&result) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error serializing result: {}", e);
                std::process::exit(1);
            }
        },
        OutputFormat::Text => print_text(&result),
    }

    match result.status {
        SequenceStatus::Pass => {}
        SequenceStatus::Wait => {
            eprintln!(
                "sequence is waiting at '{}'; use `crucible serve` so the \
                 callback endpoint can resume it",
                result.wait_at.as_deref().unwrap_or("?")
            );
            std::process::exit(3);
        }
        _ => std::process::exit(1),
    }
}

fn print_text(result: &SequenceResult) {
    println!("{} -- {}", result.sequence_name, result.status);
    for test_result in &result.results {
        let message = test_result.message.as_deref().unwrap_or("");
        println!(
            "  [{:>6}] {}  {}  {}",
            test_result.status.as_str(),
            test_result.test_id,
            test_result.name,
            message
        );
        for warning in &test_result.warnings {
            println!("           warning: {}", warning);
        }
    }
    let summary = crucible_core::summarize(&result.results);
    println!(
        "required {}/{} passed, optional {}/{} passed, {} skipped, {} errors",
        summary.required_passed,
        summary.required_total,
        summary.optional_passed,
        summary.optional_total,
        summary.skips,
        summary.errors
    );
    if let Some(url) = &result.redirect_to {
        println!("navigate the user to: {}", url);
    }
}
