use stablemap_core::exports::{collect_exports, duplicate_claims, multi_tag_members, StaticExports};
use stablemap_core::model::{Member, MemberKind, ProgramImage, Unit};

fn unit() -> Unit {
    Unit::new("Player")
        .with_member(Member::field("f1").with_export("health"))
        .with_member(Member::field("f2"))
        .with_member(Member::method("m1").with_export("getName").with_export("name"))
}

#[test]
fn untagged_members_are_excluded() {
    let unit = unit();
    let exports = collect_exports(&unit);
    let names: Vec<_> = exports.iter().map(|e| e.stable_name).collect();
    assert_eq!(names, vec!["health", "getName"]);
    assert!(!exports[0].is_ambiguous());
    assert!(exports[1].is_ambiguous());
}

#[test]
fn multi_tag_members_are_reported() {
    let unit = unit();
    let names: Vec<_> = multi_tag_members(&unit).map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["m1"]);
}

#[test]
fn duplicate_claims_need_two_distinct_members() {
    let unit = Unit::new("U")
        .with_member(Member::field("a").with_export("x").with_export("x"))
        .with_member(Member::field("b").with_export("y"))
        .with_member(Member::method("c").with_export("x"));
    let claims = duplicate_claims(&unit);
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].0, "x");
    let claimants: Vec<_> = claims[0].1.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(claimants, vec!["a", "c"]);
}

#[test]
fn static_index_prefers_first_unit() {
    let image = ProgramImage::new(
        None,
        vec![
            Unit::new("A").with_member(Member::field("a1").with_static().with_export("tick")),
            Unit::new("B").with_member(Member::field("b1").with_static().with_export("tick")),
            Unit::new("C").with_member(Member::field("c1").with_export("tick")),
        ],
    )
    .unwrap();
    let index = StaticExports::build(&image);
    assert_eq!(index.len(), 1);
    let hit = index.get(MemberKind::Field, "tick").unwrap();
    assert_eq!(hit.unit.name, "A");
    assert!(index.get(MemberKind::Method, "tick").is_none());
}

#[test]
fn static_index_accepts_short_lived_lookup_keys() {
    let image = ProgramImage::new(
        None,
        vec![Unit::new("client")
            .with_member(Member::field("f1").with_static().with_export("gameCycle"))
            .with_member(Member::method("m1").with_static().with_export("gameCycle"))],
    )
    .unwrap();
    let index = StaticExports::build(&image);
    assert_eq!(index.len(), 2);
    assert!(!index.is_empty());

    // Keys built on the fly, unrelated to the image's lifetime.
    let found = {
        let key = format!("game{}", "Cycle");
        index.get(MemberKind::Method, &key).map(|hit| hit.member.name.clone())
    };
    assert_eq!(found.as_deref(), Some("m1"));
    assert!(index.get(MemberKind::Field, &String::from("missing")).is_none());
}
