//! PM2.5 safety levels used to color-code charts.

use serde::{Deserialize, Serialize};

/// PM2.5 concentration category (µg/m³).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    /// At most 25.
    Good,
    /// Above 25, at most 37.5.
    Moderate,
    /// Above 37.5, at most 75.
    Unhealthy,
    /// Above 75.
    VeryUnhealthy,
}

impl SafetyLevel {
    pub const GOOD_MAX: f64 = 25.0;
    pub const MODERATE_MAX: f64 = 37.5;
    pub const UNHEALTHY_MAX: f64 = 75.0;

    pub fn from_pm25(pm25: f64) -> Self {
        if pm25 <= Self::GOOD_MAX {
            Self::Good
        } else if pm25 <= Self::MODERATE_MAX {
            Self::Moderate
        } else if pm25 <= Self::UNHEALTHY_MAX {
            Self::Unhealthy
        } else {
            Self::VeryUnhealthy
        }
    }

    /// Bar color for this level.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Good => "rgba(76, 175, 80, 0.7)",
            Self::Moderate => "rgba(255, 193, 7, 0.7)",
            Self::Unhealthy => "rgba(255, 87, 34, 0.7)",
            Self::VeryUnhealthy => "rgba(244, 67, 54, 0.7)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_upper_bounds() {
        assert_eq!(SafetyLevel::from_pm25(0.0), SafetyLevel::Good);
        assert_eq!(SafetyLevel::from_pm25(25.0), SafetyLevel::Good);
        assert_eq!(SafetyLevel::from_pm25(25.01), SafetyLevel::Moderate);
        assert_eq!(SafetyLevel::from_pm25(37.5), SafetyLevel::Moderate);
        assert_eq!(SafetyLevel::from_pm25(75.0), SafetyLevel::Unhealthy);
        assert_eq!(SafetyLevel::from_pm25(75.1), SafetyLevel::VeryUnhealthy);
    }

    #[test]
    fn each_level_has_its_own_color() {
        // ---
        let levels = [
            SafetyLevel::Good,
            SafetyLevel::Moderate,
            SafetyLevel::Unhealthy,
            SafetyLevel::VeryUnhealthy,
        ];
        let colors: Vec<&str> = levels.iter().map(|l| l.color()).collect();

        assert_eq!(colors[0], "rgba(76, 175, 80, 0.7)");
        assert_eq!(colors[3], "rgba(244, 67, 54, 0.7)");
        for (i, color) in colors.iter().enumerate() {
            assert!(color.starts_with("rgba("));
            assert!(!colors[i + 1..].contains(color));
        }
    }

    #[test]
    fn nan_is_never_reported_good() {
        assert_eq!(SafetyLevel::from_pm25(f64::NAN), SafetyLevel::VeryUnhealthy);
    }
}
