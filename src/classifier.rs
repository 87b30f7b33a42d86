//! Rule-based severity classification for air quality readings
//!
//! The breakpoints follow the familiar 0-300+ banding. Classification is a
//! pure, total function: any input outside the defined bands (e.g. a
//! negative index) maps to Unknown/Grey rather than failing.

use serde::Serialize;

/// Severity level and display color derived from an AQI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// One of seven fixed severity bands (plus Unknown)
    pub level: &'static str,
    /// Display color associated with the band
    pub color: &'static str,
}

/// Classify an air quality index into a severity band.
#[must_use]
pub const fn classify(aqi: i64) -> Classification {
    match aqi {
        0..=50 => Classification {
            level: "Good",
            color: "Green",
        },
        51..=100 => Classification {
            level: "Moderate",
            color: "Yellow",
        },
        101..=150 => Classification {
            level: "Unhealthy (Sensitive)",
            color: "Orange",
        },
        151..=200 => Classification {
            level: "Unhealthy",
            color: "Red",
        },
        201..=300 => Classification {
            level: "Very Unhealthy",
            color: "Purple",
        },
        aqi if aqi > 300 => Classification {
            level: "Hazardous",
            color: "Maroon",
        },
        _ => Classification {
            level: "Unknown",
            color: "Grey",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "Good", "Green")]
    #[case(50, "Good", "Green")]
    #[case(51, "Moderate", "Yellow")]
    #[case(100, "Moderate", "Yellow")]
    #[case(101, "Unhealthy (Sensitive)", "Orange")]
    #[case(150, "Unhealthy (Sensitive)", "Orange")]
    #[case(151, "Unhealthy", "Red")]
    #[case(200, "Unhealthy", "Red")]
    #[case(201, "Very Unhealthy", "Purple")]
    #[case(300, "Very Unhealthy", "Purple")]
    #[case(301, "Hazardous", "Maroon")]
    #[case(1200, "Hazardous", "Maroon")]
    #[case(-1, "Unknown", "Grey")]
    #[case(-500, "Unknown", "Grey")]
    fn test_classification_bands(
        #[case] aqi: i64,
        #[case] level: &'static str,
        #[case] color: &'static str,
    ) {
        let classification = classify(aqi);
        assert_eq!(classification.level, level);
        assert_eq!(classification.color, color);
    }

    #[test]
    fn test_serialization_shape() {
        let json = serde_json::to_value(classify(42)).unwrap();
        assert_eq!(json["level"], "Good");
        assert_eq!(json["color"], "Green");
    }
}
