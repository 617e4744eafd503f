//! FHIR R4 type names known without loading any package.
//!
//! The canonical URL of every type below follows the core convention
//! `http://hl7.org/fhir/StructureDefinition/{name}`.

use phf::phf_set;

/// Base of core StructureDefinition canonical URLs
pub const CORE_CANONICAL_BASE: &str = "http://hl7.org/fhir/StructureDefinition/";

static PRIMITIVE_TYPES: phf::Set<&'static str> = phf_set! {
    "base64Binary", "boolean", "canonical", "code", "date", "dateTime",
    "decimal", "id", "instant", "integer", "markdown", "oid",
    "positiveInt", "string", "time", "unsignedInt", "uri", "url",
    "uuid", "xhtml",
};

static DATATYPES: phf::Set<&'static str> = phf_set! {
    "Address", "Age", "Annotation", "Attachment", "BackboneElement",
    "CodeableConcept", "Coding", "ContactDetail", "ContactPoint", "Contributor",
    "Count", "DataRequirement", "Distance", "Dosage", "Duration",
    "Element", "ElementDefinition", "Expression", "Extension", "HumanName",
    "Identifier", "MarketingStatus", "Meta", "Money", "MoneyQuantity",
    "Narrative", "ParameterDefinition", "Period", "Population", "ProdCharacteristic",
    "ProductShelfLife", "Quantity", "Range", "Ratio", "Reference",
    "RelatedArtifact", "SampledData", "Signature", "SimpleQuantity", "SubstanceAmount",
    "Timing", "TriggerDefinition", "UsageContext",
};

static RESOURCE_TYPES: phf::Set<&'static str> = phf_set! {
    "Account", "ActivityDefinition", "AdverseEvent", "AllergyIntolerance",
    "Appointment", "AppointmentResponse", "AuditEvent", "Basic",
    "Binary", "BiologicallyDerivedProduct", "BodyStructure", "Bundle",
    "CapabilityStatement", "CarePlan", "CareTeam", "CatalogEntry",
    "ChargeItem", "ChargeItemDefinition", "Claim", "ClaimResponse",
    "ClinicalImpression", "CodeSystem", "Communication", "CommunicationRequest",
    "CompartmentDefinition", "Composition", "ConceptMap", "Condition",
    "Consent", "Contract", "Coverage", "CoverageEligibilityRequest",
    "CoverageEligibilityResponse", "DetectedIssue", "Device", "DeviceDefinition",
    "DeviceMetric", "DeviceRequest", "DeviceUseStatement", "DiagnosticReport",
    "DocumentManifest", "DocumentReference", "DomainResource", "EffectEvidenceSynthesis",
    "Encounter", "Endpoint", "EnrollmentRequest", "EnrollmentResponse",
    "EpisodeOfCare", "EventDefinition", "Evidence", "EvidenceVariable",
    "ExampleScenario", "ExplanationOfBenefit", "FamilyMemberHistory", "Flag",
    "Goal", "GraphDefinition", "Group", "GuidanceResponse",
    "HealthcareService", "ImagingStudy", "Immunization", "ImmunizationEvaluation",
    "ImmunizationRecommendation", "ImplementationGuide", "InsurancePlan", "Invoice",
    "Library", "Linkage", "List", "Location",
    "Measure", "MeasureReport", "Media", "Medication",
    "MedicationAdministration", "MedicationDispense", "MedicationKnowledge", "MedicationRequest",
    "MedicationStatement", "MedicinalProduct", "MedicinalProductAuthorization", "MedicinalProductContraindication",
    "MedicinalProductIndication", "MedicinalProductIngredient", "MedicinalProductInteraction", "MedicinalProductManufactured",
    "MedicinalProductPackaged", "MedicinalProductPharmaceutical", "MedicinalProductUndesirableEffect", "MessageDefinition",
    "MessageHeader", "MolecularSequence", "NamingSystem", "NutritionOrder",
    "Observation", "ObservationDefinition", "OperationDefinition", "OperationOutcome",
    "Organization", "OrganizationAffiliation", "Parameters", "Patient",
    "PaymentNotice", "PaymentReconciliation", "Person", "PlanDefinition",
    "Practitioner", "PractitionerRole", "Procedure", "Provenance",
    "Questionnaire", "QuestionnaireResponse", "RelatedPerson", "RequestGroup",
    "ResearchDefinition", "ResearchElementDefinition", "ResearchStudy", "ResearchSubject",
    "Resource", "RiskAssessment", "RiskEvidenceSynthesis", "Schedule",
    "SearchParameter", "ServiceRequest", "Slot", "Specimen",
    "SpecimenDefinition", "StructureDefinition", "StructureMap", "Subscription",
    "Substance", "SubstanceNucleicAcid", "SubstancePolymer", "SubstanceProtein",
    "SubstanceReferenceInformation", "SubstanceSourceMaterial", "SubstanceSpecification", "SupplyDelivery",
    "SupplyRequest", "Task", "TerminologyCapabilities", "TestReport",
    "TestScript", "ValueSet", "VerificationResult", "VisionPrescription",
};

pub fn is_primitive_type(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(name)
}

/// Whether `name` is an R4 primitive, datatype or resource
pub fn is_standard_type(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(name) || DATATYPES.contains(name) || RESOURCE_TYPES.contains(name)
}

/// Core canonical URL for a standard type, `None` for anything else
pub fn standard_canonical(name: &str) -> Option<String> {
    is_standard_type(name).then(|| format!("{CORE_CANONICAL_BASE}{name}"))
}
