//! Unit tests for the core data model
//!
//! Schema construction, layer ordering and the shared environment record.

use pipeconf_core::*;
use std::sync::Arc;
use std::thread;

// =============================================================================
// Step Schema Tests
// =============================================================================

fn sonar() -> StepSchema {
    StepSchema::builder("sonarExecuteScan")
        .step_alias("executeSonarScan")
        .parameter(
            ParameterSpec::string("token")
                .secret()
                .with_scopes([Scope::Parameters])
                .with_alias("sonarToken"),
        )
        .parameter(
            ParameterSpec::string("owner")
                .with_all_scopes()
                .with_alias("githubOrg")
                .with_resource_ref("commonPipelineEnvironment", "github/owner"),
        )
        .output(StepOutput::new("commonPipelineEnvironment", "custom/sonarTaskId"))
        .build()
        .unwrap()
}

#[test]
fn test_schema_lookup() {
    let schema = sonar();
    assert_eq!(schema.canonical_name("sonarToken"), Some("token"));
    assert_eq!(schema.canonical_name("githubOrg"), Some("owner"));
    assert!(schema.lookup("githubRepo").is_none());
    assert!(schema.answers_to("executeSonarScan"));
    assert!(!schema.answers_to("sonarScan"));
}

#[test]
fn test_parameter_description() {
    let spec = ParameterSpec::string("host").with_description("Address of the SonarQube server");
    assert_eq!(spec.description.as_deref(), Some("Address of the SonarQube server"));
    assert!(sonar().parameter("owner").unwrap().description.is_none());
}

#[test]
fn test_schema_outputs() {
    let schema = sonar();
    assert!(schema.declares_output("commonPipelineEnvironment", "custom/sonarTaskId"));
    // Entries under the step's own name need no declaration
    assert!(schema.declares_output("sonarExecuteScan", "anything"));
    assert!(!schema.declares_output("commonPipelineEnvironment", "github/owner"));
}

#[test]
fn test_alias_cannot_shadow_other_parameter() {
    let err = StepSchema::builder("step")
        .parameter(ParameterSpec::string("host"))
        .parameter(ParameterSpec::string("url").with_alias("host"))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::AliasCollision { ref first, .. } if first == "host"));
}

#[test]
fn test_empty_names_rejected() {
    assert!(matches!(
        StepSchema::builder(" ").build(),
        Err(SchemaError::EmptyStepName)
    ));
    assert!(matches!(
        StepSchema::builder("step").parameter(ParameterSpec::string("")).build(),
        Err(SchemaError::EmptyParameterName { .. })
    ));
}

// =============================================================================
// Layer Tests
// =============================================================================

#[test]
fn test_layer_set_iterates_in_precedence_order() {
    let layers: LayerSet = [
        ConfigLayer::new(LayerKind::General, "general"),
        ConfigLayer::new(LayerKind::Flags, "command line"),
        ConfigLayer::new(LayerKind::Stages, "stage"),
        ConfigLayer::new(LayerKind::Environment, "environment"),
    ]
    .into_iter()
    .collect();

    let kinds: Vec<LayerKind> = layers.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![LayerKind::Flags, LayerKind::Environment, LayerKind::Stages, LayerKind::General]
    );
}

#[test]
fn test_layer_set_keeps_one_layer_per_kind() {
    let mut layers = LayerSet::new().with_layer(ConfigLayer::new(LayerKind::Steps, "first"));
    let replaced = layers.insert(ConfigLayer::new(LayerKind::Steps, "second").with_entry("a", "b"));

    assert_eq!(replaced.map(|l| l.name), Some("first".to_string()));
    assert_eq!(layers.len(), 1);
    assert_eq!(layers.get(LayerKind::Steps).unwrap().get("a"), Some(&RawValue::text("b")));
}

// =============================================================================
// Shared Environment Tests
// =============================================================================

#[test]
fn test_first_write_wins() {
    let env = SharedEnvironment::new();
    env.record("commonPipelineEnvironment", "github/owner", "SAP").unwrap();

    let err = env
        .record("commonPipelineEnvironment", "github/owner", "other")
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyRecorded { .. }));
    assert_eq!(
        env.snapshot().get("commonPipelineEnvironment", "github/owner"),
        Some("SAP")
    );
}

#[test]
fn test_snapshot_does_not_see_later_writes() {
    let env = SharedEnvironment::new();
    env.record("mavenBuild", "artifactVersion", "1.0.0").unwrap();
    let before = env.snapshot();

    env.record("commonPipelineEnvironment", "github/owner", "SAP").unwrap();

    assert_eq!(before.len(), 1);
    assert!(before.get("commonPipelineEnvironment", "github/owner").is_none());
    assert_eq!(env.snapshot().len(), 2);
}

#[test]
fn test_concurrent_writers_record_each_key_once() {
    let env = Arc::new(SharedEnvironment::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let env = Arc::clone(&env);
            thread::spawn(move || env.record("step", "out", format!("writer-{}", i)).is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(env.len(), 1);
}
