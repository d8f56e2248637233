use stablemap_core::format::{parse_document, DocumentFormat};
use stablemap_core::imports::{ConsumerContract, ImportOracle, NoImports};
use stablemap_core::mapping::{MappingTable, UnitMapping};
use stablemap_core::model::{Member, Unit};

#[test]
fn counterpart_lookup() {
    let mapping = MappingTable::new().with("Player", "EntityA");
    assert_eq!(mapping.counterpart("Player"), Some("EntityA"));
    assert_eq!(mapping.counterpart("Npc"), None);
}

#[test]
fn mapping_document_parses() {
    let mapping: MappingTable =
        parse_document(r#"{"units":{"class1":"class9","class2":"class2"}}"#, DocumentFormat::Json)
            .unwrap();
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping.counterpart("class1"), Some("class9"));
}

#[test]
fn instance_imports_follow_interface_binding() {
    let contract = ConsumerContract::new().with_instance_import("RSPlayer", "health");
    let bound = Unit::new("Player").with_interface("RSPlayer");
    let unbound = Unit::new("Player");
    let field = Member::field("f").with_export("health");

    assert!(contract.is_import_required(&bound, &field, "health"));
    assert!(!contract.is_import_required(&bound, &field, "name"));
    assert!(!contract.is_import_required(&unbound, &field, "health"));
}

#[test]
fn static_imports_ignore_interface_binding() {
    let contract = ConsumerContract::new()
        .with_instance_import("RSClient", "tick")
        .with_static_import("gameCycle");
    let unit = Unit::new("client").with_interface("RSClient");
    let cycle = Member::field("f1").with_static().with_export("gameCycle");
    let tick = Member::field("f2").with_static().with_export("tick");

    assert!(contract.is_import_required(&unit, &cycle, "gameCycle"));
    assert!(!contract.is_import_required(&unit, &tick, "tick"));
    assert_eq!(contract.len(), 2);
}

#[test]
fn no_imports_never_requires() {
    let unit = Unit::new("U").with_interface("I");
    assert!(!NoImports.is_import_required(&unit, &Member::field("f"), "x"));
}
