//! Profile and terminology fixtures the demo sequences validate against.

use crucible_validator::{
    BindingStrength, FlatElement, Max, Profile, TypeRegistry, ValueSetIndex,
};

pub const GENDER_VS: &str = "http://hl7.org/fhir/ValueSet/administrative-gender";

/// A pared-down Patient profile: name with family, gender with a required
/// binding, birth date.
pub fn patient_profile() -> Profile {
    let elements = vec![
        FlatElement::new("Patient.name", 1, Max::Unbounded).types(["HumanName"]),
        FlatElement::new("Patient.name.family", 1, Max::Count(1)).types(["string"]),
        FlatElement::new("Patient.name.given", 0, Max::Unbounded).types(["string"]),
        FlatElement::new("Patient.gender", 1, Max::Count(1))
            .types(["code"])
            .short("male | female | other | unknown")
            .binding(BindingStrength::Required, GENDER_VS),
        FlatElement::new("Patient.birthDate", 0, Max::Count(1)).types(["date"]),
        FlatElement::new("Patient.identifier", 0, Max::Unbounded).types(["Identifier"]),
        FlatElement::new("Patient.identifier.system", 0, Max::Count(1)).types(["uri"]),
        FlatElement::new("Patient.identifier.value", 0, Max::Count(1)).types(["string"]),
    ];
    Profile::build("Patient", &elements, &[])
}

/// Smoking-status Observation profile with the fixed LOINC coding.
pub fn smoking_status_profile() -> Profile {
    let elements = vec![
        FlatElement::new("Observation.status", 1, Max::Count(1)).types(["code"]),
        FlatElement::new("Observation.code", 1, Max::Count(1))
            .types(["CodeableConcept"])
            .pattern(serde_json::json!({
                "coding": [{"system": "http://loinc.org", "code": "72166-2"}]
            })),
        FlatElement::new("Observation.value[x]", 1, Max::Count(1))
            .types(["CodeableConcept", "string"]),
    ];
    Profile::build("Observation", &elements, &[])
}

/// Complex-type trees the profiles above lean on.
pub fn type_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry.register_complex(
        "HumanName",
        Profile::build(
            "HumanName",
            &[
                FlatElement::new("HumanName.family", 0, Max::Count(1)).types(["string"]),
                FlatElement::new("HumanName.given", 0, Max::Unbounded).types(["string"]),
                FlatElement::new("HumanName.use", 0, Max::Count(1)).types(["code"]),
            ],
            &[],
        )
        .elements,
    );
    registry.register_complex(
        "Identifier",
        Profile::build(
            "Identifier",
            &[
                FlatElement::new("Identifier.system", 0, Max::Count(1)).types(["uri"]),
                FlatElement::new("Identifier.value", 0, Max::Count(1)).types(["string"]),
            ],
            &[],
        )
        .elements,
    );
    registry.register_complex(
        "CodeableConcept",
        Profile::build(
            "CodeableConcept",
            &[
                FlatElement::new("CodeableConcept.coding", 0, Max::Unbounded).types(["Coding"]),
                FlatElement::new("CodeableConcept.text", 0, Max::Count(1)).types(["string"]),
            ],
            &[],
        )
        .elements,
    );
    registry.register_complex(
        "Coding",
        Profile::build(
            "Coding",
            &[
                FlatElement::new("Coding.system", 0, Max::Count(1)).types(["uri"]),
                FlatElement::new("Coding.code", 0, Max::Count(1)).types(["code"]),
                FlatElement::new("Coding.display", 0, Max::Count(1)).types(["string"]),
            ],
            &[],
        )
        .elements,
    );
    registry
}

/// The enumerable value sets the demo profiles bind to.
pub fn terminology() -> ValueSetIndex {
    let mut index = ValueSetIndex::new();
    index.register(GENDER_VS, ["male", "female", "other", "unknown"]);
    index
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
