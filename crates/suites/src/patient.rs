//! Patient access: read a known patient and validate it structurally.

use crucible_core::{assert_that, SequenceDefinition, Signal, TestDefinition};
use serde_json::{json, Value};

use crate::fixtures;

pub fn sequence() -> SequenceDefinition {
    SequenceDefinition::new("patient_access", "PAT")
        .title("Patient access")
        .description(
            "Reads the patient the instance was configured with and checks \
             the returned resource against the Patient profile.",
        )
        .test_case("patient")
        .requires(["server_url", "patient_id", "access_token"])
        .defines(["patient_resource"])
        .test(
            TestDefinition::new("Patient read returns the requested resource", |session| {
                let server_url = session.require_str("server_url")?;
                let patient_id = session.require_str("patient_id")?;
                let token = session.require_str("access_token")?;
                let url = format!(
                    "{}/Patient/{}",
                    server_url.trim_end_matches('/'),
                    patient_id
                );
                let (response, body) = session.get_json(&url, Some(&token))?;
                assert_that(
                    response.status == 200,
                    format!("expected 200 from {} -- got {}", url, response.status),
                )?;
                let returned_id = body.get("id").and_then(Value::as_str).unwrap_or_default();
                assert_that(
                    returned_id == patient_id,
                    format!("requested patient {} -- got '{}'", patient_id, returned_id),
                )?;
                session.put("patient_resource", body)
            })
            .reference("https://hl7.org/fhir/http.html#read"),
        )
        .test(
            TestDefinition::new("Resource conforms to the Patient profile", |session| {
                let resource = session.require("patient_resource")?;
                let findings = crucible_validator::validate(
                    &resource,
                    &fixtures::patient_profile(),
                    &fixtures::type_registry(),
                    &fixtures::terminology(),
                );
                for warning in &findings.warnings {
                    session.warn(warning.clone());
                }
                if !findings.errors.is_empty() {
                    return Err(Signal::fail_with(
                        format!(
                            "resource failed structural validation: {}",
                            findings.errors.join("; ")
                        ),
                        json!(findings.errors),
                    ));
                }
                Ok(())
            }),
        )
        .test(
            TestDefinition::new("Patient carries a business identifier", |session| {
                let resource = session.require("patient_resource")?;
                let has_identifier = resource
                    .get("identifier")
                    .and_then(Value::as_array)
                    .is_some_and(|ids| !ids.is_empty());
                assert_that(has_identifier, "patient has no identifier")
            })
            .optional(),
        )
}
