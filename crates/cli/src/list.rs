//! `crucible list` -- registered sequences and tests in registration order.

use crate::OutputFormat;

pub(crate) fn cmd_list(output: OutputFormat) {
    let registry = match crucible_suites::build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("error building sequence registry: {}", e);
            std::process::exit(1);
        }
    };

    match output {
        OutputFormat::Json => {
            let sequences: Vec<serde_json::Value> = registry
                .sequences()
                .map(|sequence| {
                    serde_json::json!({
                        "name": sequence.name,
                        "title": sequence.title,
                        "required": sequence.required,
                        "requires": sequence.requires,
                        "defines": sequence.defines,
                        "tests": sequence
                            .tests
                            .iter()
                            .map(|t| serde_json::json!({
                                "id": t.id,
                                "title": t.title,
                                "required": t.required,
                            }))
                            .collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::json!({"sequences": sequences, "total_tests": registry.total_tests()})
            );
        }
        OutputFormat::Text => {
            for sequence in registry.sequences() {
                println!("{} -- {}", sequence.name, sequence.title);
                for test in &sequence.tests {
                    let marker = if test.required { " " } else { "o" };
                    println!("  {} {}  {}", marker, test.id, test.title);
                }
            }
            println!(
                "{} sequences, {} tests",
                registry.sequence_count(),
                registry.total_tests()
            );
        }
    }
}
