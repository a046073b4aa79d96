//! Edge weight to share-point mapping.
//!
//! When a node has several outgoing edges, each edge receives
//! `points(weight) / sum(points of siblings)` of the node's inflow. The
//! mapping is a tuning knob of the editor, so it is injected rather than
//! fixed in the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationError;

/// Maps an edge weight to its share points.
///
/// Implementations must be monotonically non-decreasing in `weight`.
pub trait WeightPolicy {
    fn points(&self, weight: u8) -> f64;
}

impl<F> WeightPolicy for F
where
    F: Fn(u8) -> f64,
{
    fn points(&self, weight: u8) -> f64 {
        self(weight)
    }
}

/// Table-driven policy, loadable from configuration.
///
/// Weights missing from the table take the points of the nearest lower
/// weight, or of the lowest entry when below every key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    #[serde(with = "string_keys")]
    pub points: BTreeMap<u8, f64>,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            points: BTreeMap::from([(1, 0.5), (2, 1.0), (3, 1.5)]),
        }
    }
}

impl WeightTable {
    pub fn new(points: impl IntoIterator<Item = (u8, f64)>) -> Result<Self, ValidationError> {
        let table = Self {
            points: points.into_iter().collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Every edge gets the same points, so siblings split evenly.
    pub fn uniform() -> Self {
        Self {
            points: BTreeMap::from([(1, 1.0)]),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.points.is_empty() {
            return Err(ValidationError::EmptyWeightTable);
        }
        let mut previous: Option<f64> = None;
        for (&weight, &points) in &self.points {
            if !points.is_finite() || points <= 0.0 {
                return Err(ValidationError::InvalidWeightPoints { weight, points });
            }
            if let Some(previous) = previous {
                if points < previous {
                    return Err(ValidationError::NonMonotonicWeights {
                        weight,
                        points,
                        previous,
                    });
                }
            }
            previous = Some(points);
        }
        Ok(())
    }
}

impl WeightPolicy for WeightTable {
    fn points(&self, weight: u8) -> f64 {
        self.points
            .range(..=weight)
            .next_back()
            .or_else(|| self.points.iter().next())
            .map(|(_, &points)| points)
            .unwrap_or(1.0)
    }
}

/// Split `total` across edges in proportion to their points.
///
/// Falls back to equal shares when the points sum to zero, so the result
/// always sums to `total`.
pub fn split<P: WeightPolicy + ?Sized>(policy: &P, weights: &[u8], total: f64) -> Vec<f64> {
    if weights.is_empty() {
        return Vec::new();
    }
    let points: Vec<f64> = weights
        .iter()
        .map(|&w| policy.points(w).max(0.0))
        .collect();
    let sum: f64 = points.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        let even = total / weights.len() as f64;
        return vec![even; weights.len()];
    }
    points.iter().map(|p| total * p / sum).collect()
}

// TOML tables need string keys; weights are stored as "1", "2", ...
mod string_keys {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(map: &BTreeMap<u8, f64>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(map.iter().map(|(k, v)| (k.to_string(), v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<u8, f64>, D::Error> {
        let raw = BTreeMap::<String, f64>::deserialize(d)?;
        raw.into_iter()
            .map(|(k, v)| {
                k.trim()
                    .parse::<u8>()
                    .map(|k| (k, v))
                    .map_err(|_| D::Error::custom(format!("weight key '{k}' is not 0-255")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid_and_increasing() {
        let table = WeightTable::default();
        table.validate().unwrap();
        assert!(table.points(1) < table.points(2));
        assert!(table.points(2) < table.points(3));
    }

    #[test]
    fn missing_weights_use_nearest_lower_entry() {
        let table = WeightTable::new([(2, 1.0), (5, 3.0)]).unwrap();
        assert_eq!(table.points(0), 1.0);
        assert_eq!(table.points(1), 1.0);
        assert_eq!(table.points(4), 1.0);
        assert_eq!(table.points(5), 3.0);
        assert_eq!(table.points(200), 3.0);
    }

    #[test]
    fn validate_rejects_bad_tables() {
        assert_eq!(
            WeightTable::new([]).unwrap_err(),
            ValidationError::EmptyWeightTable
        );
        assert!(matches!(
            WeightTable::new([(1, 0.0)]).unwrap_err(),
            ValidationError::InvalidWeightPoints { weight: 1, .. }
        ));
        assert!(matches!(
            WeightTable::new([(1, 1.0), (2, 0.3)]).unwrap_err(),
            ValidationError::NonMonotonicWeights { weight: 2, .. }
        ));
    }

    #[test]
    fn equal_weights_split_evenly() {
        let shares = split(&WeightTable::default(), &[1, 1], 120.0);
        assert_eq!(shares, vec![60.0, 60.0]);
    }

    #[test]
    fn heavier_edge_gets_larger_share() {
        let shares = split(&WeightTable::default(), &[1, 3], 100.0);
        assert!((shares[0] - 25.0).abs() < 1e-9);
        assert!((shares[1] - 75.0).abs() < 1e-9);
    }

    #[test]
    fn zero_points_fall_back_to_even_split() {
        let shares = split(&|_w: u8| 0.0, &[1, 2, 3], 90.0);
        assert_eq!(shares, vec![30.0, 30.0, 30.0]);
    }

    #[test]
    fn table_roundtrips_through_toml() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            weights: WeightTable,
        }
        let text = toml::to_string(&Wrapper {
            weights: WeightTable::default(),
        })
        .unwrap();
        let parsed: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(parsed.weights, WeightTable::default());
    }
}
