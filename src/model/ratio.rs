//! Text-to-image area ratio and its classification.

use serde::{Deserialize, Serialize};

/// Ratios below this are image-dominant.
pub const RED_BELOW: f64 = 0.7;
/// Ratios above this are text-dominant.
pub const GREEN_ABOVE: f64 = 1.3;

/// Ratio reported when there is neither text nor images.
pub const RATIO_EMPTY: f64 = -2.0;
/// Ratio reported when there are images but no text.
pub const RATIO_NO_TEXT: f64 = -1.0;
/// Ratio reported when there is text but no images.
pub const RATIO_NO_IMAGES: f64 = 0.0;

/// Text-to-image area ratio with the degenerate cases made explicit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AreaRatio {
    /// No text and no images
    Empty,
    /// Images but no text
    ImagesOnly,
    /// Text but no images
    TextOnly,
    /// Text area divided by image area, both positive
    Ratio(f64),
}

impl AreaRatio {
    /// Compute the ratio of `text_area` to `image_area`.
    ///
    /// Non-positive areas count as absent, so the quotient is only formed
    /// when the image area is strictly positive.
    pub fn compute(text_area: f64, image_area: f64) -> Self {
        let has_text = text_area > 0.0;
        let has_images = image_area > 0.0;
        match (has_text, has_images) {
            (false, false) => AreaRatio::Empty,
            (false, true) => AreaRatio::ImagesOnly,
            (true, false) => AreaRatio::TextOnly,
            (true, true) => AreaRatio::Ratio(text_area / image_area),
        }
    }

    /// Numeric form: −2, −1, 0, or the quotient.
    pub fn value(&self) -> f64 {
        match self {
            AreaRatio::Empty => RATIO_EMPTY,
            AreaRatio::ImagesOnly => RATIO_NO_TEXT,
            AreaRatio::TextOnly => RATIO_NO_IMAGES,
            AreaRatio::Ratio(r) => *r,
        }
    }

    pub fn classify(&self) -> Classification {
        match self {
            AreaRatio::Empty => Classification::new("no text or images", ReportColor::Green),
            AreaRatio::ImagesOnly => {
                Classification::new("images only, no text", ReportColor::Red)
            }
            AreaRatio::TextOnly => Classification::new("text only, no images", ReportColor::Green),
            AreaRatio::Ratio(r) => {
                let color = if *r < RED_BELOW {
                    ReportColor::Red
                } else if *r > GREEN_ABOVE {
                    ReportColor::Green
                } else {
                    ReportColor::Orange
                };
                Classification::new(format!("{:.2}", r), color)
            }
        }
    }
}

impl From<AreaRatio> for f64 {
    fn from(ratio: AreaRatio) -> f64 {
        ratio.value()
    }
}

/// Report color for a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportColor {
    Green,
    Orange,
    Red,
}

impl ReportColor {
    /// CSS color name.
    pub fn css(&self) -> &'static str {
        match self {
            ReportColor::Green => "green",
            ReportColor::Orange => "orange",
            ReportColor::Red => "red",
        }
    }
}

impl std::fmt::Display for ReportColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css())
    }
}

/// Label and color shown for a ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub color: ReportColor,
}

impl Classification {
    pub fn new(label: impl Into<String>, color: ReportColor) -> Self {
        Self {
            label: label.into(),
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_policy() {
        assert_eq!(AreaRatio::compute(0.0, 0.0), AreaRatio::Empty);
        assert_eq!(AreaRatio::compute(0.0, 50.0), AreaRatio::ImagesOnly);
        assert_eq!(AreaRatio::compute(100.0, 0.0), AreaRatio::TextOnly);
        assert_eq!(AreaRatio::compute(100.0, 50.0), AreaRatio::Ratio(2.0));

        assert_eq!(AreaRatio::compute(0.0, 0.0).value(), -2.0);
        assert_eq!(AreaRatio::compute(0.0, 1.0).value(), -1.0);
        assert_eq!(AreaRatio::compute(1.0, 0.0).value(), 0.0);
    }

    #[test]
    fn test_ratio_is_exact_quotient() {
        let pairs = [(1.0, 3.0), (123.456, 7.89), (1e-6, 1e6), (612.0 * 792.0, 1.0)];
        for (t, i) in pairs {
            assert_eq!(AreaRatio::compute(t, i).value(), t / i);
        }
    }

    #[test]
    fn test_no_images_never_divides() {
        let ratio = AreaRatio::compute(100.0, 0.0);
        assert!(ratio.value().is_finite());
        assert_eq!(ratio.value(), 0.0);
    }

    #[test]
    fn test_negative_areas_count_as_absent() {
        assert_eq!(AreaRatio::compute(-5.0, 0.0), AreaRatio::Empty);
        assert_eq!(AreaRatio::compute(10.0, -5.0), AreaRatio::TextOnly);
    }

    #[test]
    fn test_degenerate_classifications() {
        assert_eq!(
            AreaRatio::Empty.classify(),
            Classification::new("no text or images", ReportColor::Green)
        );
        assert_eq!(
            AreaRatio::ImagesOnly.classify(),
            Classification::new("images only, no text", ReportColor::Red)
        );
        assert_eq!(
            AreaRatio::TextOnly.classify(),
            Classification::new("text only, no images", ReportColor::Green)
        );
    }

    #[test]
    fn test_threshold_colors() {
        assert_eq!(AreaRatio::Ratio(0.1).classify().color, ReportColor::Red);
        assert_eq!(AreaRatio::Ratio(0.69).classify().color, ReportColor::Red);
        assert_eq!(AreaRatio::Ratio(0.7).classify().color, ReportColor::Orange);
        assert_eq!(AreaRatio::Ratio(1.0).classify().color, ReportColor::Orange);
        assert_eq!(AreaRatio::Ratio(1.3).classify().color, ReportColor::Orange);
        assert_eq!(AreaRatio::Ratio(1.31).classify().color, ReportColor::Green);
        assert_eq!(AreaRatio::Ratio(2.0).classify().color, ReportColor::Green);
    }

    #[test]
    fn test_numeric_label() {
        assert_eq!(AreaRatio::Ratio(2.0).classify().label, "2.00");
        assert_eq!(AreaRatio::Ratio(1.0 / 3.0).classify().label, "0.33");
    }

    #[test]
    fn test_color_names() {
        assert_eq!(ReportColor::Green.css(), "green");
        assert_eq!(ReportColor::Orange.to_string(), "orange");
        assert_eq!(
            serde_json::to_string(&ReportColor::Red).unwrap(),
            "\"red\""
        );
    }
}
