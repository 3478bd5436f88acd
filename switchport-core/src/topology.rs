//! Port topology reconciliation.
//!
//! The dashboard does not say which ports of a switch are RJ45 and which
//! are SFP uplinks. The chassis size is inferred from the port count: the
//! first 8, 24 or 48 ports are base ports and anything after them is an
//! uplink. Reconciliation reshapes a source port list so it can be applied
//! to a target switch of the same or a compatible size.

use std::fmt::{self, Display, Formatter};

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::model::PortConfig;

/// Largest number of uplink ports accepted beyond a chassis base count
/// under the default policy.
pub const DEFAULT_MAX_UPLINK_PORTS: usize = 4;

/// Known chassis sizes, counted in base (RJ45) ports. Serialized as the
/// base port count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TopologyClass {
    Eight,
    TwentyFour,
    FortyEight,
}

impl TopologyClass {
    /// All classes in ascending size.
    pub const ALL: [TopologyClass; 3] = [
        TopologyClass::Eight,
        TopologyClass::TwentyFour,
        TopologyClass::FortyEight,
    ];

    pub fn base_ports(self) -> usize {
        match self {
            TopologyClass::Eight => 8,
            TopologyClass::TwentyFour => 24,
            TopologyClass::FortyEight => 48,
        }
    }
}

impl Serialize for TopologyClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.base_ports() as u64)
    }
}

impl Display for TopologyClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-port", self.base_ports())
    }
}

/// Largest class whose base count fits in `port_count`, or the smallest
/// class when none fits.
pub fn nearest_class_at_or_below(port_count: usize) -> TopologyClass {
    TopologyClass::ALL
        .iter()
        .rev()
        .copied()
        .find(|class| class.base_ports() <= port_count)
        .unwrap_or(TopologyClass::ALL[0])
}

/// Which switch a port count belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// Reasons a source port list cannot be mapped onto a target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("no ports found on source switch")]
    EmptySource,
    #[error("incompatible port counts ({from} switch -> {to} switch)")]
    Incompatible {
        from: TopologyClass,
        to: TopologyClass,
    },
    #[error(
        "{side} switch reports {count} ports, which is not a {class} chassis with at most {max_uplinks} uplinks"
    )]
    UnrecognizedPortCount {
        side: Side,
        count: usize,
        class: TopologyClass,
        max_uplinks: usize,
    },
    #[error("port id {port_id:?} on source switch is {reason}")]
    InvalidPortId {
        port_id: String,
        reason: &'static str,
    },
    #[error("port id {0:?} appears more than once on source switch")]
    DuplicatePortId(String),
}

/// How strictly port counts are matched against the known chassis sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyPolicy {
    /// Uplink ports allowed beyond the base count. `None` accepts any count
    /// and snaps it to the nearest class at or below.
    pub max_uplink_ports: Option<usize>,
}

impl Default for TopologyPolicy {
    fn default() -> Self {
        Self {
            max_uplink_ports: Some(DEFAULT_MAX_UPLINK_PORTS),
        }
    }
}

impl TopologyPolicy {
    pub fn lenient() -> Self {
        Self {
            max_uplink_ports: None,
        }
    }

    /// Infer the chassis class of a switch reporting `count` ports.
    pub fn classify(&self, side: Side, count: usize) -> Result<TopologyClass, TopologyError> {
        let class = nearest_class_at_or_below(count);
        let Some(max_uplinks) = self.max_uplink_ports else {
            return Ok(class);
        };
        let base = class.base_ports();
        if count < base || count - base > max_uplinks {
            return Err(TopologyError::UnrecognizedPortCount {
                side,
                count,
                class,
                max_uplinks,
            });
        }
        Ok(class)
    }
}

/// Outcome of reconciling a source port list against a target size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub source_class: TopologyClass,
    pub target_class: TopologyClass,
    /// Ports to apply to the target. Renumbered plans are ascending by port
    /// number; an equal-class plan keeps the source order.
    pub ports: Vec<PortConfig>,
    /// Base ports created from the first source port.
    pub synthesized: usize,
    /// Source base ports with no counterpart on the target.
    pub dropped: usize,
}

/// Map `source` onto a target switch with `target_port_count` ports using
/// the default policy.
pub fn reconcile(
    source: &[PortConfig],
    target_port_count: usize,
) -> Result<Vec<PortConfig>, TopologyError> {
    plan_reconciliation(source, target_port_count, &TopologyPolicy::default())
        .map(|plan| plan.ports)
}

/// Full reconciliation with an explicit policy.
///
/// Supported shapes are equal classes (ports copied unchanged, in source
/// order), 24 -> 48 (ports 25-48 take the settings of the first port and
/// uplinks shift up by 24) and 48 -> 24 (ports 25-48 are dropped and
/// uplinks shift down by 24). Everything else is rejected.
///
/// Port ids are only interpreted when ports are renumbered. An equal-class
/// copy accepts any id, including module ports such as `1_C3850-NM-4-10G_1`.
pub fn plan_reconciliation(
    source: &[PortConfig],
    target_port_count: usize,
    policy: &TopologyPolicy,
) -> Result<Reconciliation, TopologyError> {
    if source.is_empty() {
        return Err(TopologyError::EmptySource);
    }

    let source_class = policy.classify(Side::Source, source.len())?;
    let target_class = policy.classify(Side::Target, target_port_count)?;
    let plan = |ports, synthesized, dropped| Reconciliation {
        source_class,
        target_class,
        ports,
        synthesized,
        dropped,
    };

    match (source_class, target_class) {
        (from, to) if from == to => Ok(plan(source.to_vec(), 0, 0)),
        (TopologyClass::TwentyFour, TopologyClass::FortyEight) => {
            let ordered = order_by_number(source)?;
            let (base, uplinks) = ordered.split_at(ordered.len().min(24));
            let template = base[0].1;
            let mut ports: Vec<PortConfig> =
                base.iter().map(|(_, port)| (*port).clone()).collect();
            ports.extend((25..=48).map(|number| template.renumbered(number)));
            ports.extend(shift_uplinks(uplinks, 24, true)?);
            Ok(plan(ports, 24, 0))
        }
        (TopologyClass::FortyEight, TopologyClass::TwentyFour) => {
            let ordered = order_by_number(source)?;
            let (base, uplinks) = ordered.split_at(ordered.len().min(48));
            let mut ports: Vec<PortConfig> =
                base[..24].iter().map(|(_, port)| (*port).clone()).collect();
            ports.extend(shift_uplinks(uplinks, 24, false)?);
            Ok(plan(ports, 0, base.len() - 24))
        }
        (from, to) => Err(TopologyError::Incompatible { from, to }),
    }
}

fn order_by_number(source: &[PortConfig]) -> Result<Vec<(u32, &PortConfig)>, TopologyError> {
    let mut ordered = source
        .iter()
        .map(|port| {
            port.number()
                .map(|number| (number, port))
                .ok_or_else(|| TopologyError::InvalidPortId {
                    port_id: port.port_id.clone(),
                    reason: "not a port number",
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    ordered.sort_by_key(|(number, _)| *number);
    if let Some(pair) = ordered.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(TopologyError::DuplicatePortId(pair[1].1.port_id.clone()));
    }
    Ok(ordered)
}

fn shift_uplinks(
    uplinks: &[(u32, &PortConfig)],
    offset: u32,
    up: bool,
) -> Result<Vec<PortConfig>, TopologyError> {
    uplinks
        .iter()
        .map(|(number, port)| {
            let shifted = if up {
                number.checked_add(offset)
            } else {
                number.checked_sub(offset).filter(|n| *n > 0)
            };
            shifted
                .map(|n| port.renumbered(n))
                .ok_or_else(|| TopologyError::InvalidPortId {
                    port_id: port.port_id.clone(),
                    reason: "out of range after renumbering",
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PortSettings;

    fn ports(count: u32) -> Vec<PortConfig> {
        (1..=count)
            .map(|n| {
                PortConfig::new(
                    n.to_string(),
                    PortSettings {
                        name: Some(format!("P{n}")),
                        vlan: Some(100 + n as u16),
                        ..PortSettings::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn class_counts_map_to_themselves() {
        for class in TopologyClass::ALL {
            assert_eq!(nearest_class_at_or_below(class.base_ports()), class);
        }
    }

    #[test]
    fn nearest_class_prefers_below_then_smallest() {
        assert_eq!(nearest_class_at_or_below(10), TopologyClass::Eight);
        assert_eq!(nearest_class_at_or_below(28), TopologyClass::TwentyFour);
        assert_eq!(nearest_class_at_or_below(30), TopologyClass::TwentyFour);
        assert_eq!(nearest_class_at_or_below(52), TopologyClass::FortyEight);
        assert_eq!(nearest_class_at_or_below(3), TopologyClass::Eight);
        assert_eq!(nearest_class_at_or_below(0), TopologyClass::Eight);
    }

    #[test]
    fn strict_policy_rejects_odd_counts() {
        let policy = TopologyPolicy::default();
        assert_eq!(
            policy.classify(Side::Source, 28),
            Ok(TopologyClass::TwentyFour)
        );
        assert_eq!(
            policy.classify(Side::Target, 30),
            Err(TopologyError::UnrecognizedPortCount {
                side: Side::Target,
                count: 30,
                class: TopologyClass::TwentyFour,
                max_uplinks: DEFAULT_MAX_UPLINK_PORTS,
            })
        );
        assert!(policy.classify(Side::Source, 5).is_err());
    }

    #[test]
    fn lenient_policy_snaps_odd_counts() {
        let policy = TopologyPolicy::lenient();
        assert_eq!(
            policy.classify(Side::Target, 30),
            Ok(TopologyClass::TwentyFour)
        );
        assert_eq!(policy.classify(Side::Source, 5), Ok(TopologyClass::Eight));
    }

    #[test]
    fn lenient_short_source_keeps_every_port() {
        let source = ports(5);
        let plan = plan_reconciliation(&source, 10, &TopologyPolicy::lenient()).expect("plan");
        assert_eq!(plan.ports, source);
    }

    #[test]
    fn unsorted_source_is_ordered_before_renumbering() {
        let mut source = ports(24);
        source.reverse();
        let out = reconcile(&source, 48).expect("reconcile");
        let ids: Vec<&str> = out.iter().map(|p| p.port_id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"1"));
        assert_eq!(ids.last(), Some(&"48"));
        assert_eq!(out[24].settings, out[0].settings);
    }

    #[test]
    fn equal_class_keeps_source_order() {
        let mut source = ports(24);
        source.reverse();
        assert_eq!(reconcile(&source, 24), Ok(source));
    }

    #[test]
    fn non_numeric_port_id_blocks_renumbering() {
        let mut source = ports(24);
        source[3].port_id = "1_MA-MOD-4X10G_1".to_string();
        let err = reconcile(&source, 48).expect_err("non numeric");
        assert_eq!(
            err,
            TopologyError::InvalidPortId {
                port_id: "1_MA-MOD-4X10G_1".to_string(),
                reason: "not a port number",
            }
        );
    }

    #[test]
    fn duplicate_port_id_blocks_renumbering() {
        let mut source = ports(24);
        source[5].port_id = "5".to_string();
        assert_eq!(
            reconcile(&source, 48),
            Err(TopologyError::DuplicatePortId("5".to_string()))
        );
    }

    #[test]
    fn class_serializes_as_base_port_count() {
        let json = serde_json::to_string(&TopologyClass::ALL).expect("json");
        assert_eq!(json, "[8,24,48]");
    }
}
