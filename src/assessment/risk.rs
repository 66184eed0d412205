use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered risk band, worst first, so `Ord` follows creditworthiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    VeryPoor,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl RiskCategory {
    /// Lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 750.0 {
            RiskCategory::Excellent
        } else if score >= 700.0 {
            RiskCategory::Good
        } else if score >= 650.0 {
            RiskCategory::Fair
        } else if score >= 600.0 {
            RiskCategory::Poor
        } else {
            RiskCategory::VeryPoor
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RiskCategory::VeryPoor => "very_poor",
            RiskCategory::Poor => "poor",
            RiskCategory::Fair => "fair",
            RiskCategory::Good => "good",
            RiskCategory::Excellent => "excellent",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
