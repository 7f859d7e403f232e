//! Capability discovery: fetch the server's capability document and record
//! what it claims to support.

use crucible_core::{assert_that, SequenceDefinition, Signal, TestDefinition};
use serde_json::{json, Value};

pub fn sequence() -> SequenceDefinition {
    SequenceDefinition::new("capability", "CAP")
        .title("Capability discovery")
        .description(
            "Retrieves the server's capability document and records the \
             resource types it declares support for.",
        )
        .test_case("capability")
        .requires(["server_url"])
        .defines(["capability_statement", "supported_resources"])
        .test(
            TestDefinition::new("Capability document is retrievable", |session| {
                let server_url = session.require_str("server_url")?;
                let url = format!("{}/metadata", server_url.trim_end_matches('/'));
                let (response, body) = session.get_json(&url, None)?;
                assert_that(
                    response.status == 200,
                    format!("expected 200 from {} -- got {}", url, response.status),
                )?;
                session.put("capability_statement", body)
            })
            .description("A capability document must be available unauthenticated.")
            .reference("https://hl7.org/fhir/http.html#capabilities"),
        )
        .test(
            TestDefinition::new("Document declares itself a CapabilityStatement", |session| {
                let document = session.require("capability_statement")?;
                let resource_type = document
                    .get("resourceType")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                assert_that(
                    resource_type == "CapabilityStatement",
                    format!(
                        "expected resourceType CapabilityStatement -- got '{}'",
                        resource_type
                    ),
                )?;
                session.warn_unless(
                    document.get("fhirVersion").is_some(),
                    "capability document does not state a fhirVersion",
                );
                Ok(())
            }),
        )
        .test(
            TestDefinition::new("Server lists supported resource types", |session| {
                let document = session.require("capability_statement")?;
                let resources: Vec<Value> = document
                    .get("rest")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(|rest| rest.get("resource").and_then(Value::as_array))
                    .flatten()
                    .filter_map(|resource| resource.get("type").and_then(Value::as_str))
                    .map(|t| json!(t))
                    .collect();
                if resources.is_empty() {
                    return Err(Signal::fail("capability document lists no resources"));
                }
                session.put("supported_resources", Value::Array(resources))
            }),
        )
        .test(
            TestDefinition::new("Server advertises JSON support", |session| {
                let document = session.require("capability_statement")?;
                let formats: Vec<&str> = document
                    .get("format")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_str)
                    .collect();
                assert_that(
                    formats.iter().any(|f| f.contains("json")),
                    format!("no JSON format advertised -- got {:?}", formats),
                )
            })
            .optional(),
        )
}
