use anyhow::Context;
use utility_graph::System;

/// A bot deciding, every tick, which of its zones to attack.
///
/// Topology:
///   [hp]   [ammo]
///      \   /
///   [aggression]   [zone:0] [zone:1] [zone:2]
///           \         |        |        |
///            +---- [attack:0] [attack:1] [attack:2]
const CONFIG: &str = r#"{
    "input": {
        "hp":   { "min": 0, "max": 100, "curve": { "type": "linear", "a": 1, "b": 0 } },
        "ammo": { "min": 0, "max": 50,
                  "curve": { "type": "logistic", "inflection": 0.3, "slope": 1 } },
        "zone": { "count": 3, "min": 0, "max": 20, "nonzero": true,
                  "curve": { "type": "exponential", "center": 0, "exponent": 2, "convex": true } }
    },
    "combo": {
        "aggression": { "src_a": "hp", "src_b": "ammo",
                        "comb": { "type": "multiplicative", "a": 1 } },
        "attack":     { "count": 3, "src_a": "aggression", "src_b": "zone",
                        "comb": { "type": "multiplicative", "a": 1 } }
    }
}"#;

fn main() -> anyhow::Result<()> {
    utility_graph::init_logging();

    let mut system = System::from_json(CONFIG).context("invalid arena configuration")?;
    println!("{system}");

    let ticks = [
        (100.0, 50.0, [4.0, 12.0, 18.0]),
        (60.0, 20.0, [4.0, 12.0, 18.0]),
        (60.0, 5.0, [15.0, 2.0, 9.0]),
    ];

    for (tick, (hp, ammo, distances)) in ticks.into_iter().enumerate() {
        system.update("hp", hp)?;
        system.update("ammo", ammo)?;
        system.update_family("zone", &distances)?;

        let scores = system.evaluate_family("attack")?;
        let (best, score) = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .context("no zones configured")?;

        println!("tick {tick}: attack zone {best} (utility {score:.3}), scores {scores:.3?}");
    }

    Ok(())
}
