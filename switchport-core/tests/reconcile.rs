use pretty_assertions::assert_eq;
use switchport_core::{
    plan_reconciliation, reconcile, PortConfig, PortSettings, TopologyClass, TopologyError,
    TopologyPolicy,
};

fn port(n: u32) -> PortConfig {
    PortConfig::new(
        n.to_string(),
        PortSettings {
            name: Some(format!("P{n}")),
            enabled: Some(true),
            poe_enabled: Some(n % 2 == 0),
            port_type: Some("access".to_string()),
            vlan: Some(10 + n as u16),
            ..PortSettings::default()
        },
    )
}

fn switch(ports: u32) -> Vec<PortConfig> {
    (1..=ports).map(port).collect()
}

fn ids(ports: &[PortConfig]) -> Vec<String> {
    ports.iter().map(|p| p.port_id.clone()).collect()
}

#[test]
fn equal_classes_are_identity() {
    for (source, target) in [(10, 10), (28, 26), (52, 52), (24, 28), (48, 52)] {
        let ports = switch(source);
        let out = reconcile(&ports, target).expect("same class");
        assert_eq!(out, ports, "{source} -> {target}");
    }
}

#[test]
fn twenty_four_to_forty_eight_clones_first_port() {
    let source = switch(28);
    let plan = plan_reconciliation(&source, 52, &TopologyPolicy::default()).expect("24 -> 48");

    assert_eq!(plan.source_class, TopologyClass::TwentyFour);
    assert_eq!(plan.target_class, TopologyClass::FortyEight);
    assert_eq!(plan.synthesized, 24);
    assert_eq!(plan.ports.len(), 52);
    assert_eq!(&plan.ports[..24], &source[..24]);

    for (offset, synthesized) in plan.ports[24..48].iter().enumerate() {
        assert_eq!(synthesized.port_id, (25 + offset).to_string());
        assert_eq!(synthesized.settings, source[0].settings);
    }

    let uplinks = &plan.ports[48..];
    assert_eq!(ids(uplinks), vec!["49", "50", "51", "52"]);
    for (moved, original) in uplinks.iter().zip(&source[24..]) {
        assert_eq!(moved.settings, original.settings);
    }
}

#[test]
fn forty_eight_to_twenty_four_truncates() {
    let source = switch(52);
    let plan = plan_reconciliation(&source, 28, &TopologyPolicy::default()).expect("48 -> 24");

    assert_eq!(plan.dropped, 24);
    assert_eq!(plan.ports.len(), 28);
    assert_eq!(&plan.ports[..24], &source[..24]);
    assert_eq!(ids(&plan.ports[24..]), vec!["25", "26", "27", "28"]);
    assert_eq!(plan.ports[24].settings, source[48].settings);
    assert!(!plan
        .ports
        .iter()
        .any(|p| p.settings.name.as_deref() == Some("P30")));
}

#[test]
fn output_is_ascending_by_port_number() {
    let out = reconcile(&switch(28), 52).expect("24 -> 48");
    let numbers: Vec<u32> = out.iter().filter_map(PortConfig::number).collect();
    let mut sorted = numbers.clone();
    sorted.sort_unstable();
    assert_eq!(numbers, sorted);
    assert_eq!(numbers.len(), out.len());
}

#[test]
fn other_class_pairs_are_incompatible() {
    let cases = [(10, 28), (28, 10), (10, 52), (52, 10)];
    for (source, target) in cases {
        let err = reconcile(&switch(source), target).expect_err("incompatible");
        assert!(
            matches!(err, TopologyError::Incompatible { .. }),
            "{source} -> {target}: {err}"
        );
    }

    assert_eq!(
        reconcile(&switch(8), 24),
        Err(TopologyError::Incompatible {
            from: TopologyClass::Eight,
            to: TopologyClass::TwentyFour,
        })
    );
}

#[test]
fn empty_source_is_rejected_for_any_target() {
    for target in [0, 8, 24, 52, 1000] {
        assert_eq!(reconcile(&[], target), Err(TopologyError::EmptySource));
        assert_eq!(
            plan_reconciliation(&[], target, &TopologyPolicy::lenient()),
            Err(TopologyError::EmptySource)
        );
    }
}

#[test]
fn lenient_policy_accepts_odd_target_size() {
    let source = switch(24);
    assert!(matches!(
        reconcile(&source, 30),
        Err(TopologyError::UnrecognizedPortCount { .. })
    ));
    let plan = plan_reconciliation(&source, 30, &TopologyPolicy::lenient()).expect("lenient");
    assert_eq!(plan.ports, source);
}

#[test]
fn synthesized_ports_do_not_alias_the_template() {
    let source = switch(24);
    let mut out = reconcile(&source, 48).expect("24 -> 48");
    out[30].settings.vlan = Some(999);
    assert_eq!(out[0].settings.vlan, Some(11));
    assert_eq!(out[31].settings.vlan, Some(11));
}

#[test]
fn same_class_copies_module_ports_unchanged() {
    let mut source = switch(24);
    for n in 1..=4 {
        let mut uplink = port(24 + n);
        uplink.port_id = format!("1_C3850-NM-4-10G_{n}");
        source.push(uplink);
    }

    assert_eq!(reconcile(&source, 28), Ok(source.clone()));
    let plan = plan_reconciliation(&source, 28, &TopologyPolicy::lenient()).expect("lenient");
    assert_eq!(plan.ports, source);
    assert_eq!((plan.synthesized, plan.dropped), (0, 0));
}

#[test]
fn module_ports_cannot_be_renumbered() {
    let mut source = switch(24);
    let mut uplink = port(25);
    uplink.port_id = "1_C3850-NM-4-10G_1".to_string();
    source.push(uplink);

    assert_eq!(
        reconcile(&source, 52),
        Err(TopologyError::InvalidPortId {
            port_id: "1_C3850-NM-4-10G_1".to_string(),
            reason: "not a port number",
        })
    );
}

#[test]
fn same_class_preserves_input_order() {
    let mut source = switch(52);
    source.swap(0, 51);
    source.swap(10, 20);
    assert_eq!(reconcile(&source, 52), Ok(source));
}
