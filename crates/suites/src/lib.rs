//! crucible-suites: demo sequences for the Crucible harness.
//!
//! Three hand-written sequences exercising the full engine surface:
//! capability discovery (plain request/assert/define), patient access
//! (validator integration, soft assertions, self-skip), and standalone
//! authorization launch (the Redirect -> Wait -> resume round trip).
//!
//! Real deployments register their own generated suites; these exist so
//! the CLI and serve layer have something to run out of the box.

pub mod capability;
pub mod fixtures;
pub mod launch;
pub mod patient;

use crucible_core::{RegistryBuilder, RegistryError, SequenceRegistry};

/// Build the demo registry in its canonical order.
pub fn build_registry() -> Result<SequenceRegistry, RegistryError> {
    let mut builder = RegistryBuilder::new();
    builder.register(capability::sequence())?;
    builder.register(patient::sequence())?;
    builder.register(launch::sequence())?;
    Ok(builder.build())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds_with_stable_ids() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.sequence_count(), 3);

        let capability = registry.sequence("capability").unwrap();
        assert_eq!(capability.tests[0].id, "CAP-01");

        // Ids keep climbing across sequences.
        let launch = registry.sequence("standalone_launch").unwrap();
        let first_launch_id = &launch.tests[0].id;
        assert!(first_launch_id.starts_with("SAL-"));
    }

    #[test]
    fn sequences_declare_their_context_schema() {
        let registry = build_registry().unwrap();
        let patient = registry.sequence("patient_access").unwrap();
        assert!(patient.requires.contains(&"server_url".to_string()));
        assert!(patient.requires.contains(&"patient_id".to_string()));

        let launch = registry.sequence("standalone_launch").unwrap();
        assert!(launch.defines.contains(&"access_token".to_string()));
    }
}
