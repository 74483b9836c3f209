//! Indexed utility families.
//!
//! A family is a convenience over the flat name space: registering a family
//! `sensor` of three members simply registers `sensor:0`, `sensor:1` and
//! `sensor:2`. The system itself never learns about families, every member
//! is an ordinary utility.

use crate::combinator::Combinator;
use crate::curve::Curve;
use crate::engine::{NodeKind, NodeRef};
use crate::error::UtilityError;
use crate::system::System;

/// Name of the `index`-th member of a family.
pub fn member(name: &str, index: usize) -> String {
    format!("{name}:{index}")
}

impl System {
    /// Registers `count` source utilities sharing one curve.
    ///
    /// Either all members are registered or, if any member name is taken,
    /// none is.
    pub fn register_source_family(
        &mut self,
        name: &str,
        count: usize,
        curve: impl Into<Curve>,
        nonzero: bool,
    ) -> Result<Vec<NodeRef>, UtilityError> {
        let members: Vec<_> = (0..count).map(|i| member(name, i)).collect();
        for name in &members {
            self.ensure_vacant(name)?;
        }

        let curve = curve.into();
        members
            .iter()
            .map(|name| self.register_source(name, curve.clone(), nonzero))
            .collect()
    }

    /// Registers `count` derived utilities sharing one combinator.
    ///
    /// Each operand resolves to the bare name when such a utility exists,
    /// otherwise to the member with the same index, so a family can combine
    /// a per-member input with a shared one.
    pub fn register_derived_family(
        &mut self,
        name: &str,
        count: usize,
        combinator: impl Into<Combinator>,
        operand_a: &str,
        operand_b: &str,
    ) -> Result<Vec<NodeRef>, UtilityError> {
        let mut plan = Vec::with_capacity(count);
        for i in 0..count {
            let name = member(name, i);
            self.ensure_vacant(&name)?;

            let a = self.resolve_operand(operand_a, i);
            let b = self.resolve_operand(operand_b, i);
            for operand in [&a, &b] {
                if !self.contains(operand) {
                    return Err(UtilityError::UnknownOperand {
                        name: name.into(),
                        operand: operand.as_str().into(),
                    });
                }
            }
            plan.push((name, a, b));
        }

        let combinator = combinator.into();
        plan.iter()
            .map(|(name, a, b)| self.register_derived(name, combinator.clone(), a, b))
            .collect()
    }

    fn resolve_operand(&self, operand: &str, index: usize) -> String {
        if self.contains(operand) {
            operand.to_string()
        } else {
            member(operand, index)
        }
    }

    /// Number of consecutive members `name:0`, `name:1`, ... registered.
    pub fn family_len(&self, name: &str) -> usize {
        (0..).take_while(|&i| self.contains(&member(name, i))).count()
    }

    pub fn set_range_one(
        &mut self,
        name: &str,
        index: usize,
        lo: f64,
        hi: f64,
    ) -> Result<(), UtilityError> {
        self.set_range(&member(name, index), lo, hi)
    }

    /// Applies one normalization window to every member of a family.
    pub fn set_range_family(&mut self, name: &str, lo: f64, hi: f64) -> Result<(), UtilityError> {
        let members = self.source_members(name)?;
        for name in &members {
            self.set_range(name, lo, hi)?;
        }
        Ok(())
    }

    pub fn update_one(&mut self, name: &str, index: usize, raw: f64) -> Result<usize, UtilityError> {
        self.update(&member(name, index), raw)
    }

    /// Feeds `raws[i]` into member `i`. Members past the end of `raws` keep
    /// their value. Returns the total number of derived utilities
    /// invalidated.
    pub fn update_family(&mut self, name: &str, raws: &[f64]) -> Result<usize, UtilityError> {
        if self.family_len(name) == 0 {
            return Err(UtilityError::UnknownName(name.into()));
        }
        for i in 0..raws.len() {
            let name = member(name, i);
            match self.kind(&name)? {
                NodeKind::Source => {}
                found => {
                    return Err(UtilityError::WrongNodeKind {
                        name: name.into(),
                        expected: NodeKind::Source,
                        found,
                    });
                }
            }
        }

        let mut invalidated = 0;
        for (i, &raw) in raws.iter().enumerate() {
            invalidated += self.update_one(name, i, raw)?;
        }
        Ok(invalidated)
    }

    pub fn evaluate_one(&mut self, name: &str, index: usize) -> Result<f64, UtilityError> {
        self.evaluate(&member(name, index))
    }

    /// Evaluates every member of a family, in index order.
    pub fn evaluate_family(&mut self, name: &str) -> Result<Vec<f64>, UtilityError> {
        let len = self.family_len(name);
        if len == 0 {
            return Err(UtilityError::UnknownName(name.into()));
        }
        (0..len).map(|i| self.evaluate_one(name, i)).collect()
    }

    fn source_members(&self, name: &str) -> Result<Vec<String>, UtilityError> {
        let len = self.family_len(name);
        if len == 0 {
            return Err(UtilityError::UnknownName(name.into()));
        }

        let members: Vec<_> = (0..len).map(|i| member(name, i)).collect();
        for name in &members {
            let found = self.kind(name)?;
            if found != NodeKind::Source {
                return Err(UtilityError::WrongNodeKind {
                    name: name.as_str().into(),
                    expected: NodeKind::Source,
                    found,
                });
            }
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensors(count: usize) -> System {
        let mut system = System::new();
        system
            .register_source_family("sensor", count, Curve::linear(1.0, 0.0), false)
            .unwrap();
        system
    }

    #[test]
    fn test_member_names() {
        let system = sensors(3);
        assert_eq!(
            system.names().collect::<Vec<_>>(),
            vec!["sensor:0", "sensor:1", "sensor:2"]
        );
        assert_eq!(system.family_len("SENSOR"), 3);
        assert!(!system.contains("sensor"));
    }

    #[test]
    fn test_source_family_is_atomic() {
        let mut system = System::new();
        system.register_source("sensor:1", Curve::linear(1.0, 0.0), false).unwrap();

        assert_eq!(
            system.register_source_family("sensor", 3, Curve::linear(1.0, 0.0), false),
            Err(UtilityError::DuplicateName("sensor:1".into()))
        );
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn test_family_ranges_and_updates() {
        let mut system = sensors(3);
        system.set_range_family("sensor", 0.0, 10.0).unwrap();
        system.set_range_one("sensor", 2, 0.0, 100.0).unwrap();

        system.update_family("sensor", &[5.0, 10.0, 25.0]).unwrap();
        assert_eq!(system.evaluate_family("sensor").unwrap(), vec![0.5, 1.0, 0.25]);

        system.update_one("sensor", 0, 0.0).unwrap();
        assert_eq!(system.evaluate_one("sensor", 0).unwrap(), 0.0);
    }

    #[test]
    fn test_update_family_checks_members_first() {
        let mut system = sensors(2);
        system.update_family("sensor", &[0.5, 0.5]).unwrap();

        assert!(matches!(
            system.update_family("sensor", &[0.1, 0.1, 0.1]),
            Err(UtilityError::UnknownName(_))
        ));
        assert_eq!(system.evaluate_one("sensor", 0).unwrap(), 0.5);
    }

    #[test]
    fn test_unknown_family() {
        let mut system = System::new();
        assert!(matches!(
            system.set_range_family("ghost", 0.0, 1.0),
            Err(UtilityError::UnknownName(_))
        ));
        assert!(matches!(
            system.evaluate_family("ghost"),
            Err(UtilityError::UnknownName(_))
        ));
        assert_eq!(
            system.update_family("ghost", &[]),
            Err(UtilityError::UnknownName("ghost".into()))
        );
        assert_eq!(sensors(2).update_family("sensor", &[]), Ok(0));
    }

    #[test]
    fn test_derived_family_operand_resolution() {
        let mut system = sensors(2);
        system.register_source("bias", Curve::linear(0.0, 0.5), false).unwrap();
        system
            .register_derived_family(
                "threat",
                2,
                Combinator::multiplicative(1.0, 0.0),
                "sensor",
                "bias",
            )
            .unwrap();

        system.update_family("sensor", &[1.0, 0.5]).unwrap();
        assert_eq!(system.evaluate_family("threat").unwrap(), vec![0.5, 0.25]);

        // Updating one member only invalidates its own derived member.
        assert_eq!(system.update_one("sensor", 1, 0.0).unwrap(), 1);
        assert!(!system.is_dirty("threat:0").unwrap());
        assert!(system.is_dirty("threat:1").unwrap());
    }

    #[test]
    fn test_derived_family_is_atomic() {
        let mut system = sensors(2);
        assert_eq!(
            system.register_derived_family(
                "threat",
                3,
                Combinator::additive(1.0, 0.0, 0.0),
                "sensor",
                "sensor",
            ),
            Err(UtilityError::UnknownOperand {
                name: "threat:2".into(),
                operand: "sensor:2".into()
            })
        );
        assert_eq!(system.family_len("threat"), 0);
        assert_eq!(system.len(), 2);
    }

    #[test]
    fn test_set_range_family_rejects_derived() {
        let mut system = sensors(1);
        system
            .register_derived_family("d", 1, Combinator::additive(1.0, 0.0, 0.0), "sensor", "sensor")
            .unwrap();

        assert!(matches!(
            system.set_range_family("d", 0.0, 1.0),
            Err(UtilityError::WrongNodeKind { .. })
        ));
    }
}
