//! Probability distributions as the engine spells them: a `<prefix>_Distribution`
//! tag plus one or more `<prefix>_<field>` parameters.
use crate::dict::SchemaDict;
use crate::error::{ConfigError, Result};
use crate::schema::numeric_value;
use crate::util::number;
use serde_json::{Map, Value};

const DISTRIBUTION_SUFFIX: &str = "Distribution";

/// Engine tag and parameter suffixes per distribution, in `parameters()` order.
const SHAPES: [(&str, &[&str]); 9] = [
    ("CONSTANT_DISTRIBUTION", &["Constant"]),
    ("UNIFORM_DISTRIBUTION", &["Min", "Max"]),
    ("GAUSSIAN_DISTRIBUTION", &["Gaussian_Mean", "Gaussian_Std_Dev"]),
    ("EXPONENTIAL_DISTRIBUTION", &["Exponential"]),
    ("POISSON_DISTRIBUTION", &["Poisson_Mean"]),
    ("LOG_NORMAL_DISTRIBUTION", &["Log_Normal_Mu", "Log_Normal_Sigma"]),
    ("DUAL_CONSTANT_DISTRIBUTION", &["Proportion_0", "Peak_2_Value"]),
    ("WEIBULL_DISTRIBUTION", &["Kappa", "Lambda"]),
    ("DUAL_EXPONENTIAL_DISTRIBUTION", &["Mean_1", "Mean_2", "Proportion_1"]),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    Constant(f64),
    Uniform { min: f64, max: f64 },
    Gaussian { mean: f64, std_dev: f64 },
    Exponential(f64),
    Poisson(f64),
    LogNormal { mu: f64, sigma: f64 },
    DualConstant { proportion_0: f64, peak_2_value: f64 },
    Weibull { kappa: f64, lambda: f64 },
    DualExponential { mean_1: f64, mean_2: f64, proportion_1: f64 },
}

impl Distribution {
    fn shape_index(&self) -> usize {
        match self {
            Self::Constant(_) => 0,
            Self::Uniform { .. } => 1,
            Self::Gaussian { .. } => 2,
            Self::Exponential(_) => 3,
            Self::Poisson(_) => 4,
            Self::LogNormal { .. } => 5,
            Self::DualConstant { .. } => 6,
            Self::Weibull { .. } => 7,
            Self::DualExponential { .. } => 8,
        }
    }

    /// Engine tag, e.g. `EXPONENTIAL_DISTRIBUTION`.
    pub fn tag(&self) -> &'static str {
        SHAPES[self.shape_index()].0
    }

    fn parameters(&self) -> Vec<f64> {
        match *self {
            Self::Constant(value) | Self::Exponential(value) | Self::Poisson(value) => vec![value],
            Self::Uniform { min, max } => vec![min, max],
            Self::Gaussian { mean, std_dev } => vec![mean, std_dev],
            Self::LogNormal { mu, sigma } => vec![mu, sigma],
            Self::DualConstant {
                proportion_0,
                peak_2_value,
            } => vec![proportion_0, peak_2_value],
            Self::Weibull { kappa, lambda } => vec![kappa, lambda],
            Self::DualExponential {
                mean_1,
                mean_2,
                proportion_1,
            } => vec![mean_1, mean_2, proportion_1],
        }
    }

    fn from_parts(index: usize, values: &[f64]) -> Option<Self> {
        Some(match (index, values) {
            (0, [value]) => Self::Constant(*value),
            (1, [min, max]) => Self::Uniform {
                min: *min,
                max: *max,
            },
            (2, [mean, std_dev]) => Self::Gaussian {
                mean: *mean,
                std_dev: *std_dev,
            },
            (3, [value]) => Self::Exponential(*value),
            (4, [value]) => Self::Poisson(*value),
            (5, [mu, sigma]) => Self::LogNormal {
                mu: *mu,
                sigma: *sigma,
            },
            (6, [proportion_0, peak_2_value]) => Self::DualConstant {
                proportion_0: *proportion_0,
                peak_2_value: *peak_2_value,
            },
            (7, [kappa, lambda]) => Self::Weibull {
                kappa: *kappa,
                lambda: *lambda,
            },
            (8, [mean_1, mean_2, proportion_1]) => Self::DualExponential {
                mean_1: *mean_1,
                mean_2: *mean_2,
                proportion_1: *proportion_1,
            },
            _ => return None,
        })
    }

    /// Write the tag and parameters onto `target` under `prefix`
    /// (e.g. `Delay_Period`). Values go through the target's schema checks.
    pub fn apply(&self, target: &mut SchemaDict, prefix: &str) -> Result<()> {
        target.set(&format!("{prefix}_{DISTRIBUTION_SUFFIX}"), self.tag())?;
        let (_, suffixes) = SHAPES[self.shape_index()];
        for (suffix, value) in suffixes.iter().zip(self.parameters()) {
            target.set(&format!("{prefix}_{suffix}"), number(value))?;
        }
        Ok(())
    }

    /// Infer a distribution from engine-named fields such as
    /// `{"Delay_Period_Exponential": 5}`. A `<prefix>_Distribution` entry, if
    /// present, must agree with the fields.
    pub fn from_descriptor(prefix: &str, descriptor: &Map<String, Value>) -> Result<Self> {
        let invalid = |reason: String| ConfigError::InvalidArgument(reason);
        let mut declared_tag = None;
        let mut fields = Map::new();
        for (key, value) in descriptor {
            let suffix = key
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('_'))
                .ok_or_else(|| invalid(format!("'{key}' does not belong to '{prefix}'")))?;
            if suffix == DISTRIBUTION_SUFFIX {
                declared_tag = Some(
                    value
                        .as_str()
                        .ok_or_else(|| invalid(format!("'{key}' must be a string")))?,
                );
            } else {
                fields.insert(suffix.to_string(), value.clone());
            }
        }

        let index = SHAPES
            .iter()
            .position(|(tag, suffixes)| {
                !declared_tag.is_some_and(|declared| declared != *tag)
                    && suffixes.len() == fields.len()
                    && suffixes.iter().all(|suffix| fields.contains_key(*suffix))
            })
            .ok_or_else(|| {
                invalid(format!(
                    "cannot infer a {prefix} distribution from {}",
                    Value::Object(descriptor.clone())
                ))
            })?;
        let values = SHAPES[index]
            .1
            .iter()
            .map(|suffix| {
                numeric_value(&fields[*suffix])
                    .ok_or_else(|| invalid(format!("{prefix}_{suffix} must be a number")))
            })
            .collect::<Result<Vec<f64>>>()?;
        Self::from_parts(index, &values)
            .ok_or_else(|| invalid(format!("malformed {prefix} distribution")))
    }

    /// A bare number is a constant; an object is a descriptor.
    pub fn from_value(prefix: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Object(descriptor) => Self::from_descriptor(prefix, descriptor),
            other => numeric_value(other).map(Self::Constant).ok_or_else(|| {
                ConfigError::InvalidArgument(format!("{prefix} must be a number or descriptor"))
            }),
        }
    }
}

impl From<f64> for Distribution {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Distribution;
    use crate::dict::SchemaDict;
    use crate::error::ConfigError;
    use serde_json::json;

    #[test]
    fn descriptor_infers_exponential() {
        let descriptor = json!({"Delay_Period_Exponential": 5});
        let distribution = Distribution::from_descriptor(
            "Delay_Period",
            descriptor.as_object().expect("object"),
        )
        .expect("distribution");
        assert_eq!(distribution, Distribution::Exponential(5.0));
        assert_eq!(distribution.tag(), "EXPONENTIAL_DISTRIBUTION");
    }

    #[test]
    fn descriptor_with_declared_tag_must_agree() {
        let descriptor = json!({
            "Delay_Period_Distribution": "GAUSSIAN_DISTRIBUTION",
            "Delay_Period_Gaussian_Mean": 4,
            "Delay_Period_Gaussian_Std_Dev": 1
        });
        let distribution =
            Distribution::from_value("Delay_Period", &descriptor).expect("distribution");
        assert_eq!(
            distribution,
            Distribution::Gaussian {
                mean: 4.0,
                std_dev: 1.0
            }
        );

        let mismatched = json!({
            "Delay_Period_Distribution": "UNIFORM_DISTRIBUTION",
            "Delay_Period_Exponential": 5
        });
        assert!(Distribution::from_value("Delay_Period", &mismatched).is_err());
    }

    #[test]
    fn unknown_or_mixed_descriptors_are_rejected() {
        for descriptor in [
            json!({"Delay_Period_Banana": 1}),
            json!({"Delay_Period_Exponential": 5, "Delay_Period_Constant": 1}),
            json!({"Other_Exponential": 5}),
            json!({"Delay_Period_Exponential": "soon"}),
        ] {
            let err = Distribution::from_value("Delay_Period", &descriptor).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidArgument(_)), "{descriptor}");
        }
        assert!(Distribution::from_value("Delay_Period", &json!("ten")).is_err());
    }

    #[test]
    fn numbers_are_constants() {
        assert_eq!(
            Distribution::from_value("Delay_Period", &json!(10)).expect("constant"),
            Distribution::Constant(10.0)
        );
        assert_eq!(Distribution::from(2.5), Distribution::Constant(2.5));
    }

    #[test]
    fn apply_writes_tag_and_fields() {
        let mut target = SchemaDict::open();
        Distribution::DualExponential {
            mean_1: 1.0,
            mean_2: 2.0,
            proportion_1: 0.5,
        }
        .apply(&mut target, "Duration")
        .expect("apply");
        assert_eq!(
            target,
            json!({
                "Duration_Distribution": "DUAL_EXPONENTIAL_DISTRIBUTION",
                "Duration_Mean_1": 1,
                "Duration_Mean_2": 2,
                "Duration_Proportion_1": 0.5
            })
        );
    }
}
