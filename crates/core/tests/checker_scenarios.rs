use stablemap_core::check::{check_images, CheckOptions, ConsistencyChecker};
use stablemap_core::exports::collect_exports;
use stablemap_core::imports::{ConsumerContract, ImportOracle};
use stablemap_core::mapping::MappingTable;
use stablemap_core::model::{Member, ProgramImage, Unit};
use stablemap_core::overrides::{OverrideEntry, OverrideTable};
use stablemap_core::report::{AmbiguityCause, FindingKind, Severity, StaleOverrideReason};
use stablemap_core::resolve::Resolver;

fn image(units: Vec<Unit>) -> ProgramImage {
    ProgramImage::new(None, units).expect("valid image")
}

/// Version A: "Player" (bound to interface "RSPlayer") with a field exported as "health".
fn player_a() -> ProgramImage {
    image(vec![Unit::new("Player")
        .with_interface("RSPlayer")
        .with_member(Member::field("field12").with_export("health"))])
}

/// Version B: "EntityA" with a plain field "hp" and nothing exported as "health".
fn entity_b() -> ProgramImage {
    image(vec![Unit::new("EntityA")
        .with_interface("RSPlayer")
        .with_member(Member::field("hp"))
        .with_member(Member::field("field3").with_export("name"))])
}

fn health_imported() -> ConsumerContract {
    ConsumerContract::new().with_instance_import("RSPlayer", "health")
}

#[test]
fn matching_stable_name_produces_no_finding() {
    let a = image(vec![Unit::new("Player").with_member(Member::field("f1").with_export("name"))]);
    let b = entity_b();
    let mapping = MappingTable::new().with("Player", "EntityA");
    let report = check_images(&a, &b, &mapping, &OverrideTable::empty(), None);
    assert!(report.is_clean(), "unexpected findings: {:?}", report.findings);
}

#[test]
fn imported_member_missing_on_counterpart_is_an_error() {
    let (a, b) = (player_a(), entity_b());
    let mapping = MappingTable::new().with("Player", "EntityA");
    let contract = health_imported();
    let report = check_images(&a, &b, &mapping, &OverrideTable::empty(), Some(&contract));

    assert_eq!(report.errors(), 1);
    assert_eq!(report.warnings(), 0);
    let finding = &report.findings[0];
    assert_eq!(finding.kind, FindingKind::MissingImportedMember);
    assert_eq!(finding.unit, "Player");
    assert_eq!(finding.stable_name, "health");
    assert_eq!(finding.counterpart.as_deref(), Some("EntityA"));
}

#[test]
fn unimported_member_missing_on_counterpart_is_a_warning() {
    let (a, b) = (player_a(), entity_b());
    let mapping = MappingTable::new().with("Player", "EntityA");
    let report = check_images(&a, &b, &mapping, &OverrideTable::empty(), None);

    assert_eq!(report.errors(), 0);
    assert_eq!(report.warnings(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.kind, FindingKind::MissingExportedMember);
    assert_eq!(finding.severity, Severity::Warning);
    assert_eq!((finding.unit.as_str(), finding.stable_name.as_str()), ("Player", "health"));
}

#[test]
fn override_resolves_renamed_member() {
    let (a, b) = (player_a(), entity_b());
    let mapping = MappingTable::new().with("Player", "EntityA");
    let overrides =
        OverrideTable::from_entries(vec![OverrideEntry::new("Player", "health", "hp")]).unwrap();
    let contract = health_imported();
    let report = check_images(&a, &b, &mapping, &overrides, Some(&contract));
    assert!(report.is_clean(), "unexpected findings: {:?}", report.findings);
}

#[test]
fn stale_override_is_not_bypassed_by_name_match() {
    // "name" would match field3 by stable name, but the override points elsewhere.
    let a = image(vec![Unit::new("Player").with_member(Member::field("f1").with_export("name"))]);
    let b = entity_b();
    let mapping = MappingTable::new().with("Player", "EntityA");

    let stale = OverrideTable::from_entries(vec![OverrideEntry::new("Player", "name", "gone")])
        .unwrap();
    let report = check_images(&a, &b, &mapping, &stale, None);
    // Name matching would have succeeded; the override is still used and found stale.
    assert_eq!(report.configuration_error_count(), 1);
    assert!(report.findings.is_empty());
    assert_eq!(report.configuration_errors[0].reason, StaleOverrideReason::MemberNotFound);
    assert_eq!(report.configuration_errors[0].target_unit.as_deref(), Some("EntityA"));
}

#[test]
fn override_is_used_even_when_name_match_disagrees() {
    let a = image(vec![Unit::new("Player").with_member(Member::field("f1").with_export("name"))]);
    let b = entity_b();
    let mapping = MappingTable::new().with("Player", "EntityA");
    let overrides =
        OverrideTable::from_entries(vec![OverrideEntry::new("Player", "name", "hp")]).unwrap();

    let resolver = Resolver::new(&b, &mapping, &overrides);
    let exports = collect_exports(&a.units()[0]);
    let resolution = resolver.resolve(&exports[0]);
    let resolved = resolution.resolved().expect("resolved through override");
    assert_eq!(resolved.member.name, "hp");
    assert!(resolved.via_override);

    assert!(check_images(&a, &b, &mapping, &overrides, None).is_clean());
}

#[test]
fn missing_counterpart_unit_only_matters_for_imports() {
    let a = player_a();
    let b = entity_b();
    let mapping = MappingTable::new();

    let quiet = check_images(&a, &b, &mapping, &OverrideTable::empty(), None);
    assert!(quiet.is_clean());

    let contract = health_imported();
    let loud = check_images(&a, &b, &mapping, &OverrideTable::empty(), Some(&contract));
    assert_eq!(loud.errors(), 1);
    assert_eq!(loud.findings[0].kind, FindingKind::MissingImportedMember);
    assert_eq!(loud.findings[0].counterpart, None);
}

#[test]
fn two_members_sharing_a_name_yield_one_ambiguity() {
    let a = image(vec![]);
    let b = image(vec![
        Unit::new("Other1").with_member(Member::field("o").with_export("X")),
        Unit::new("Dup")
            .with_member(Member::field("d1").with_export("X"))
            .with_member(Member::field("d2").with_export("X")),
        Unit::new("Other2").with_member(Member::field("p").with_export("X")),
    ]);
    let report = check_images(&a, &b, &MappingTable::new(), &OverrideTable::empty(), None);

    let ambiguous: Vec<_> = report.of_kind(FindingKind::AmbiguousExport).collect();
    assert_eq!(ambiguous.len(), 1);
    assert_eq!(ambiguous[0].unit, "Dup");
    assert_eq!(ambiguous[0].stable_name, "X");
    assert_eq!(ambiguous[0].cause, Some(AmbiguityCause::DuplicateName));
    assert_eq!(ambiguous[0].claimants, vec!["d1".to_string(), "d2".to_string()]);
    assert_eq!(report.errors(), 1);
}

#[test]
fn member_with_two_tags_is_an_ambiguity_error() {
    let a = image(vec![]);
    let b = image(vec![Unit::new("U")
        .with_member(Member::method("m").with_descriptor("()V").with_export("a").with_export("b"))]);
    let report = check_images(&a, &b, &MappingTable::new(), &OverrideTable::empty(), None);
    assert_eq!(report.errors(), 1);
    assert_eq!(report.findings[0].cause, Some(AmbiguityCause::MultipleTags));
    assert_eq!(report.findings[0].member, "m()V");
}

#[test]
fn static_members_resolve_across_units_without_mapping() {
    let a = image(vec![Unit::new("client")
        .with_member(Member::field("f1").with_static().with_export("gameCycle"))]);
    let b_in_u1 = image(vec![
        Unit::new("U1").with_member(Member::field("x9").with_static().with_export("gameCycle")),
        Unit::new("U2"),
    ]);
    let b_in_u2 = image(vec![
        Unit::new("U1"),
        Unit::new("U2").with_member(Member::field("x9").with_static().with_export("gameCycle")),
    ]);
    let contract = ConsumerContract::new().with_static_import("gameCycle");

    // No mapping at all: statics never depend on it.
    let mapping = MappingTable::new();
    let first = check_images(&a, &b_in_u1, &mapping, &OverrideTable::empty(), Some(&contract));
    let second = check_images(&a, &b_in_u2, &mapping, &OverrideTable::empty(), Some(&contract));
    assert!(first.is_clean());
    assert_eq!(first, second);
}

#[test]
fn static_import_missing_everywhere_is_an_error() {
    let a = image(vec![Unit::new("client")
        .with_member(Member::field("f1").with_static().with_export("gameCycle"))]);
    let b = image(vec![Unit::new("client")
        .with_member(Member::field("f1").with_export("gameCycle"))]);
    let contract = ConsumerContract::new().with_static_import("gameCycle");
    let mapping = MappingTable::new().with("client", "client");
    let report = check_images(&a, &b, &mapping, &OverrideTable::empty(), Some(&contract));
    assert_eq!(report.errors(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.kind, FindingKind::MissingImportedMember);
    assert_eq!(finding.counterpart, None);
    assert!(finding.to_string().contains("static field named gameCycle"), "{finding}");
}

#[test]
fn static_override_pins_member_in_target_unit() {
    let a = image(vec![Unit::new("class29")
        .with_member(Member::field("DETAILS").with_static().with_export("DETAILS"))]);
    let b = image(vec![
        Unit::new("class35").with_member(Member::field("field309").with_static()),
        Unit::new("class36").with_member(Member::field("field309").with_static()),
    ]);
    let overrides = OverrideTable::from_entries(vec![OverrideEntry::new(
        "class29", "DETAILS", "field309",
    )
    .with_target_unit("class35")
    .with_note("r179")])
    .unwrap();
    let contract = ConsumerContract::new().with_static_import("DETAILS");
    let report = check_images(&a, &b, &MappingTable::new(), &overrides, Some(&contract));
    assert!(report.is_clean(), "unexpected: {:?}", report);
}

#[test]
fn stale_override_does_not_stop_the_pass() {
    let a = image(vec![
        Unit::new("A1").with_member(Member::field("f").with_export("one")),
        Unit::new("A2").with_member(Member::field("g").with_export("two")),
    ]);
    let b = image(vec![Unit::new("B1"), Unit::new("B2")]);
    let mapping = MappingTable::new().with("A1", "B1").with("A2", "B2");
    let overrides =
        OverrideTable::from_entries(vec![OverrideEntry::new("A1", "one", "nope").with_target_unit("B9")])
            .unwrap();
    let report = check_images(&a, &b, &mapping, &overrides, None);

    assert_eq!(report.configuration_error_count(), 1);
    assert_eq!(report.configuration_errors[0].reason, StaleOverrideReason::TargetUnitNotFound);
    // A2.two is still checked.
    assert_eq!(report.warnings(), 1);
    assert_eq!(report.findings[0].unit, "A2");
    assert!(!report.passed(false));
}

/// Oracle that marks every name as imported.
struct Everything;

impl ImportOracle for Everything {
    fn is_import_required(&self, _unit: &Unit, _member: &Member, _stable_name: &str) -> bool {
        true
    }
}

#[test]
fn custom_oracle_drives_severity() {
    let (a, b) = (player_a(), entity_b());
    let mapping = MappingTable::new().with("Player", "EntityA");
    let overrides = OverrideTable::empty();
    let report = ConsistencyChecker::new(&a, &b, &mapping, &overrides)
        .with_oracle(&Everything)
        .with_options(CheckOptions { parallel: false })
        .run();
    assert_eq!(report.errors(), 1);
}
