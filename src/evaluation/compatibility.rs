use crate::data::Category;
use crate::evolution::build::Build;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Headroom the PSU must have over the combined CPU + GPU draw under the default rule.
pub const DEFAULT_PSU_HEADROOM_FACTOR: f64 = 1.4;

/// Inclusive CPU/GPU raw-performance ratio bounds used by default.
pub const DEFAULT_BALANCE_RATIO: RatioBounds = RatioBounds { min: 0.3, max: 5.0 };

/// How much power the PSU must supply relative to the CPU + GPU draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PowerRule {
    /// `psu > cpu + gpu`
    StrictExcess,
    /// `psu >= factor * (cpu + gpu)`
    HeadroomFactor { factor: f64 },
}

impl Default for PowerRule {
    fn default() -> Self {
        PowerRule::HeadroomFactor {
            factor: DEFAULT_PSU_HEADROOM_FACTOR,
        }
    }
}

impl PowerRule {
    pub fn is_satisfied(&self, psu_rating: f64, draw: f64) -> bool {
        match *self {
            PowerRule::StrictExcess => psu_rating > draw,
            PowerRule::HeadroomFactor { factor } => psu_rating >= draw * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBounds {
    pub min: f64,
    pub max: f64,
}

impl RatioBounds {
    pub fn contains(&self, ratio: f64) -> bool {
        self.min <= ratio && ratio <= self.max
    }
}

/// Why a build failed the compatibility rules. Only used for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Incompatibility {
    #[error("no {0} selected")]
    MissingSlot(Category),
    #[error("CPU socket '{cpu}' does not match motherboard socket '{motherboard}'")]
    SocketMismatch { cpu: String, motherboard: String },
    #[error("PSU rating {psu:.0}W is not enough for a {draw:.0}W CPU+GPU draw")]
    InsufficientPower { psu: f64, draw: f64 },
    #[error("CPU/GPU performance ratio {0:.3} is outside the balance bounds")]
    Unbalanced(f64),
}

/// The rule set deciding whether the selected parts can work together.
///
/// Only CPU, motherboard, GPU and PSU are inspected; the other slots matter for
/// price and performance only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityPolicy {
    #[serde(default)]
    pub power_rule: PowerRule,
    /// `None` disables the CPU/GPU balance rule.
    #[serde(default)]
    pub balance_ratio: Option<RatioBounds>,
}

impl Default for CompatibilityPolicy {
    fn default() -> Self {
        Self {
            power_rule: PowerRule::default(),
            balance_ratio: Some(DEFAULT_BALANCE_RATIO),
        }
    }
}

impl CompatibilityPolicy {
    pub fn check_compatibility(&self, build: &Build<'_>) -> bool {
        match self.diagnose(build) {
            Ok(()) => true,
            Err(reason) => {
                debug!("Incompatible build: {}", reason);
                false
            }
        }
    }

    /// Runs the enabled rules in order and reports the first one that fails.
    pub fn diagnose(&self, build: &Build<'_>) -> Result<(), Incompatibility> {
        let slot = |category: Category| {
            build
                .get(category)
                .ok_or(Incompatibility::MissingSlot(category))
        };
        let cpu = slot(Category::Cpu)?;
        let motherboard = slot(Category::Motherboard)?;
        let psu = slot(Category::PowerSupply)?;
        let gpu = slot(Category::Gpu)?;

        // Catalog validation guarantees CPU and motherboard carry a socket
        if cpu.socket.is_none() || cpu.socket != motherboard.socket {
            return Err(Incompatibility::SocketMismatch {
                cpu: cpu.socket.clone().unwrap_or_default(),
                motherboard: motherboard.socket.clone().unwrap_or_default(),
            });
        }

        let draw = cpu.power.unwrap_or(0.0) + gpu.power.unwrap_or(0.0);
        let rating = psu.power.unwrap_or(0.0);
        if !self.power_rule.is_satisfied(rating, draw) {
            return Err(Incompatibility::InsufficientPower { psu: rating, draw });
        }

        if let Some(bounds) = self.balance_ratio {
            // A zero GPU score gives inf (or NaN for 0/0); both fall outside the bounds
            let ratio = cpu.performance / gpu.performance;
            if !bounds.contains(ratio) {
                return Err(Incompatibility::Unbalanced(ratio));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Component;

    struct Parts {
        cpu: Component,
        motherboard: Component,
        gpu: Component,
        psu: Component,
    }

    fn get_test_parts() -> Parts {
        Parts {
            cpu: Component::new(Category::Cpu, 300.0, 1000.0)
                .with_socket("AM5")
                .with_power(100.0),
            motherboard: Component::new(Category::Motherboard, 150.0, 10.0).with_socket("AM5"),
            gpu: Component::new(Category::Gpu, 500.0, 2000.0).with_power(250.0),
            psu: Component::new(Category::PowerSupply, 90.0, 5.0).with_power(490.0),
        }
    }

    fn build_from(parts: &Parts) -> Build<'_> {
        Build::default()
            .with(&parts.cpu)
            .with(&parts.motherboard)
            .with(&parts.gpu)
            .with(&parts.psu)
    }

    #[test]
    fn test_compatible_build_passes() {
        let parts = get_test_parts();
        let policy = CompatibilityPolicy::default();
        // 490 >= 1.4 * 350, ratio 0.5
        assert!(policy.check_compatibility(&build_from(&parts)));
    }

    #[test]
    fn test_missing_required_slot_fails() {
        let parts = get_test_parts();
        let policy = CompatibilityPolicy::default();

        for category in [
            Category::Cpu,
            Category::Motherboard,
            Category::Gpu,
            Category::PowerSupply,
        ] {
            let mut build = build_from(&parts);
            build.set(category, None);
            assert_eq!(
                policy.diagnose(&build),
                Err(Incompatibility::MissingSlot(category))
            );
        }
    }

    #[test]
    fn test_socket_mismatch_fails() {
        let mut parts = get_test_parts();
        parts.motherboard.socket = Some("LGA1700".to_string());
        let policy = CompatibilityPolicy::default();
        assert!(matches!(
            policy.diagnose(&build_from(&parts)),
            Err(Incompatibility::SocketMismatch { .. })
        ));
    }

    #[test]
    fn test_headroom_factor_versus_strict_excess() {
        let mut parts = get_test_parts();
        parts.psu.power = Some(400.0); // above 350 but below 1.4 * 350 = 490
        let build = build_from(&parts);

        let factor = CompatibilityPolicy::default();
        assert!(matches!(
            factor.diagnose(&build),
            Err(Incompatibility::InsufficientPower { .. })
        ));

        let strict = CompatibilityPolicy {
            power_rule: PowerRule::StrictExcess,
            ..CompatibilityPolicy::default()
        };
        assert!(strict.check_compatibility(&build));

        parts.psu.power = Some(350.0);
        assert!(!strict.check_compatibility(&build_from(&parts)));
    }

    #[test]
    fn test_balance_rule_is_optional() {
        let mut parts = get_test_parts();
        parts.cpu.performance = 20_000.0; // ratio 10
        let build = build_from(&parts);

        let balanced = CompatibilityPolicy::default();
        assert!(matches!(
            balanced.diagnose(&build),
            Err(Incompatibility::Unbalanced(_))
        ));

        let unchecked = CompatibilityPolicy {
            balance_ratio: None,
            ..CompatibilityPolicy::default()
        };
        assert!(unchecked.check_compatibility(&build));
    }

    #[test]
    fn test_zero_gpu_score_is_unbalanced() {
        let mut parts = get_test_parts();
        parts.gpu.performance = 0.0;
        assert!(!CompatibilityPolicy::default().check_compatibility(&build_from(&parts)));

        parts.cpu.performance = 0.0;
        assert!(!CompatibilityPolicy::default().check_compatibility(&build_from(&parts)));
    }

    #[test]
    fn test_policy_from_toml() {
        let policy: CompatibilityPolicy =
            toml::from_str("power_rule = { kind = \"strict_excess\" }").unwrap();
        assert_eq!(policy.power_rule, PowerRule::StrictExcess);
        assert_eq!(policy.balance_ratio, None);

        let policy: CompatibilityPolicy = toml::from_str(
            "power_rule = { kind = \"headroom_factor\", factor = 1.2 }\nbalance_ratio = { min = 0.5, max = 2.0 }",
        )
        .unwrap();
        assert_eq!(policy.power_rule, PowerRule::HeadroomFactor { factor: 1.2 });
        assert_eq!(
            policy.balance_ratio,
            Some(RatioBounds { min: 0.5, max: 2.0 })
        );
    }
}
