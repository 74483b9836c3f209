use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combinator::CombinatorSpec;
use crate::curve::CurveSpec;
use crate::error::{ConfigError, UtilityError};
use crate::system::System;

/// Declarative description of a whole utility system.
///
/// ```json
/// {
///   "input": {
///     "hp":   { "min": 0, "max": 100, "curve": { "type": "linear", "a": 1, "b": 0 } },
///     "ammo": { "min": 0, "max": 50,  "curve": { "type": "linear", "a": 1, "b": 0 } }
///   },
///   "combo": {
///     "aggression": { "src_a": "hp", "src_b": "ammo", "comb": { "type": "multiplicative", "a": 1 } }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: BTreeMap<String, InputConf>,
    #[serde(default)]
    pub combo: BTreeMap<String, ComboConf>,
}

/// Configuration of input based utility curve(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConf {
    /// Number of members in the family, 0 for a single utility.
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_max")]
    pub max: f64,
    #[serde(default)]
    pub nonzero: bool,
    pub curve: CurveSpec,
}

/// Configuration of combination based utility curve(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboConf {
    /// Number of members in the family, 0 for a single utility.
    #[serde(default)]
    pub count: usize,
    pub src_a: String,
    pub src_b: String,
    pub comb: CombinatorSpec,
}

fn default_max() -> f64 {
    1.0
}

impl Config {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

impl System {
    /// Assembles a system from its declarative description.
    ///
    /// Inputs are registered first. Combinations may reference each other in
    /// any order, they are registered as soon as both of their operands exist.
    pub fn from_config(config: &Config) -> Result<Self, UtilityError> {
        let mut system = System::new();

        for (name, input) in &config.input {
            system.add_input(name, input)?;
        }

        let mut pending: Vec<_> = config.combo.iter().collect();
        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut last = None;

            for (name, combo) in pending.iter().copied() {
                match system.add_combo(name, combo) {
                    Ok(()) => {}
                    Err(err @ UtilityError::UnknownOperand { .. }) => {
                        deferred.push((name, combo));
                        last = Some(err);
                    }
                    Err(err) => return Err(err),
                }
            }

            if deferred.len() == pending.len() {
                if let Some(err) = last {
                    return Err(err);
                }
            }
            pending = deferred;
        }

        tracing::debug!(utilities = system.len(), "assembled utility system");
        Ok(system)
    }

    /// Parses and assembles a system in one go.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config = Config::from_json(text)?;
        Ok(Self::from_config(&config)?)
    }

    fn add_input(&mut self, name: &str, input: &InputConf) -> Result<(), UtilityError> {
        let curve = input.curve.build();
        if input.count == 0 {
            self.register_source(name, curve, input.nonzero)?;
            self.set_range(name, input.min, input.max)?;
        } else {
            self.register_source_family(name, input.count, curve, input.nonzero)?;
            self.set_range_family(name, input.min, input.max)?;
        }
        Ok(())
    }

    fn add_combo(&mut self, name: &str, combo: &ComboConf) -> Result<(), UtilityError> {
        let comb = combo.comb.build();
        if combo.count == 0 {
            self.register_derived(name, comb, &combo.src_a, &combo.src_b)?;
        } else {
            self.register_derived_family(name, combo.count, comb, &combo.src_a, &combo.src_b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARENA: &str = r#"{
        "input": {
            "hp":   { "min": 0, "max": 100, "curve": { "type": "linear", "a": 1, "b": 0 } },
            "ammo": { "min": 0, "max": 50,  "curve": { "type": "linear", "a": 1, "b": 0 } },
            "zone": { "count": 2, "max": 10, "nonzero": true,
                      "curve": { "type": "linear", "a": 1, "b": 0 } }
        },
        "combo": {
            "aggression": { "src_a": "hp", "src_b": "ammo",
                            "comb": { "type": "multiplicative", "a": 1 } },
            "attack":     { "count": 2, "src_a": "aggression", "src_b": "zone",
                            "comb": { "type": "multiplicative", "a": 1 } }
        }
    }"#;

    #[test]
    fn test_parse() {
        let config = Config::from_json(ARENA).unwrap();
        assert_eq!(config.input.len(), 3);
        assert_eq!(config.input["hp"].max, 100.0);
        assert_eq!(config.input["zone"].min, 0.0);
        assert_eq!(config.combo["attack"].count, 2);
    }

    #[test]
    fn test_assemble_and_run() {
        let mut system = System::from_json(ARENA).unwrap();
        assert_eq!(system.len(), 7);
        assert_eq!(system.range("zone:1").unwrap(), (0.0, 10.0));

        system.update("hp", 50.0).unwrap();
        system.update("ammo", 25.0).unwrap();
        system.update_family("zone", &[10.0, 0.0]).unwrap();

        assert_eq!(system.evaluate("aggression").unwrap(), 0.25);
        assert_eq!(system.evaluate_family("attack").unwrap(), vec![0.25, 0.25 * 1e-9]);
    }

    #[test]
    fn test_combo_order_independent() {
        // "a_top" sorts before its operand "b_mid".
        let config = Config::from_json(
            r#"{
                "input": { "x": { "curve": { "type": "linear", "a": 1, "b": 0 } } },
                "combo": {
                    "a_top": { "src_a": "b_mid", "src_b": "x",
                               "comb": { "type": "additive", "a": 0.5, "b": 0.5 } },
                    "b_mid": { "src_a": "x", "src_b": "x",
                               "comb": { "type": "additive", "a": 1, "b": 0 } }
                }
            }"#,
        )
        .unwrap();

        let mut system = System::from_config(&config).unwrap();
        system.update("x", 0.5).unwrap();
        assert_eq!(system.evaluate("a_top").unwrap(), 0.5);
        assert_eq!(system.names().last(), Some("a_top"));
    }

    #[test]
    fn test_missing_operand() {
        let config = Config::from_json(
            r#"{
                "combo": {
                    "lonely": { "src_a": "nobody", "src_b": "nobody",
                                "comb": { "type": "additive", "a": 1, "b": 0 } }
                }
            }"#,
        )
        .unwrap();

        assert!(matches!(
            System::from_config(&config),
            Err(UtilityError::UnknownOperand { .. })
        ));
    }

    #[test]
    fn test_duplicate_between_sections() {
        let result = System::from_json(
            r#"{
                "input": { "x": { "curve": { "type": "linear", "a": 1, "b": 0 } } },
                "combo": {
                    "X": { "src_a": "x", "src_b": "x",
                           "comb": { "type": "additive", "a": 1, "b": 0 } }
                }
            }"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::Build(UtilityError::DuplicateName(_)))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            System::from_json(r#"{ "input": { "x": {} } }"#),
            Err(ConfigError::Json(_))
        ));
    }
}
