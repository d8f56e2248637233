use stablemap_core::check::{CheckOptions, ConsistencyChecker};
use stablemap_core::imports::ConsumerContract;
use stablemap_core::mapping::MappingTable;
use stablemap_core::model::{Member, ProgramImage, Unit};
use stablemap_core::overrides::{OverrideEntry, OverrideTable};
use stablemap_core::report::Report;

type Inputs = (ProgramImage, ProgramImage, MappingTable, OverrideTable, ConsumerContract);

/// A wide pair of images where every third unit loses a member, every fifth
/// unit of B has a duplicate claim, and a handful of overrides are stale.
fn fixture() -> Inputs {
    let mut units_a = Vec::new();
    let mut units_b = Vec::new();
    let mut mapping = MappingTable::new();
    let mut overrides = Vec::new();
    let mut contract = ConsumerContract::new();

    for i in 0..200 {
        let iface = format!("I{i}");
        let mut a = Unit::new(format!("A{i}")).with_interface(iface.clone());
        let mut b = Unit::new(format!("B{i}"));
        for j in 0..6 {
            let tag = format!("name{i}_{j}");
            a = a.with_member(Member::field(format!("fa{j}")).with_export(tag.clone()));
            if i % 3 != 0 || j != 2 {
                b = b.with_member(Member::field(format!("fb{j}")).with_export(tag.clone()));
            }
            if j % 2 == 0 {
                contract = contract.with_instance_import(iface.clone(), tag);
            }
        }
        if i % 5 == 0 {
            b = b
                .with_member(Member::method("d1").with_export("clash"))
                .with_member(Member::method("d2").with_export("clash"));
        }
        if i % 7 == 0 {
            overrides.push(OverrideEntry::new(format!("A{i}"), format!("name{i}_0"), "gone"));
        }
        if i % 11 != 0 {
            mapping.insert(format!("A{i}"), format!("B{i}"));
        }
        units_a.push(a);
        units_b.push(b);
    }

    units_a.push(
        Unit::new("statics").with_member(Member::field("s").with_static().with_export("tick")),
    );
    units_b.push(
        Unit::new("elsewhere").with_member(Member::field("t").with_static().with_export("tick")),
    );

    (
        ProgramImage::new(Some("a".into()), units_a).unwrap(),
        ProgramImage::new(Some("b".into()), units_b).unwrap(),
        mapping,
        OverrideTable::from_entries(overrides).unwrap(),
        contract.with_static_import("tick"),
    )
}

fn run(inputs: &Inputs, parallel: bool) -> Report {
    let (a, b, mapping, overrides, contract) = inputs;
    ConsistencyChecker::new(a, b, mapping, overrides)
        .with_oracle(contract)
        .with_options(CheckOptions { parallel })
        .run()
}

#[test]
fn parallel_and_sequential_runs_produce_identical_reports() {
    let inputs = fixture();
    let sequential = run(&inputs, false);
    let parallel = run(&inputs, true);

    assert!(!sequential.findings.is_empty());
    assert!(!sequential.configuration_errors.is_empty());
    assert_eq!(sequential, parallel);

    // Repeated parallel runs are stable too.
    for _ in 0..3 {
        assert_eq!(run(&inputs, true), parallel);
    }
}
