use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{EngineError, Result};

/// Largest accepted frame width.
pub const MAX_WIDTH: u32 = 7680;
/// Largest accepted frame height.
pub const MAX_HEIGHT: u32 = 4320;

/// Frame size in pixels, validated to `1..=MAX_WIDTH` by `1..=MAX_HEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    width: u32,
    height: u32,
}

impl Dimensions {
    /// Full HD landscape, the default input frame.
    pub const FULL_HD: Self = Self {
        width: 1920,
        height: 1080,
    };
    /// Portrait 1080x1920, the default output frame.
    pub const PORTRAIT_HD: Self = Self {
        width: 1080,
        height: 1920,
    };

    /// Creates validated dimensions.
    ///
    /// # Example
    /// ```
    /// use engine::Dimensions;
    ///
    /// assert!(Dimensions::new(1920, 1080).is_ok());
    /// assert!(Dimensions::new(0, 1080).is_err());
    /// assert!(Dimensions::new(7681, 1080).is_err());
    /// ```
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_WIDTH || height > MAX_HEIGHT {
            return Err(EngineError::DimensionsOutOfRange {
                width: u64::from(width),
                height: u64::from(height),
            });
        }
        Ok(Self { width, height })
    }

    /// Parses a `WIDTHxHEIGHT` text.
    ///
    /// # Example
    /// ```
    /// use engine::Dimensions;
    ///
    /// let dims = Dimensions::parse("720x1280").expect("valid");
    /// assert_eq!((dims.width(), dims.height()), (720, 1280));
    /// assert!(Dimensions::parse("720-1280").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || EngineError::InvalidDimensions {
            value: input.to_string(),
        };
        let (width, height) = input
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width = parse_side(width).ok_or_else(invalid)?;
        let height = parse_side(height).ok_or_else(invalid)?;
        if width == 0 || height == 0 || width > u64::from(MAX_WIDTH) || height > u64::from(MAX_HEIGHT)
        {
            return Err(EngineError::DimensionsOutOfRange { width, height });
        }
        Self::new(width as u32, height as u32)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Display for Dimensions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_side(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    value.parse::<u64>().ok()
}

/// Largest output-aspect rectangle that fits inside the input frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropWindow {
    pub width: f64,
    pub height: f64,
}

impl CropWindow {
    /// Computes the crop window for scaling `input` into `output` without distortion.
    ///
    /// # Example
    /// ```
    /// use engine::{CropWindow, Dimensions};
    ///
    /// let crop = CropWindow::fit(
    ///     Dimensions::parse("1920x1080").expect("valid"),
    ///     Dimensions::parse("720x1280").expect("valid"),
    /// );
    /// assert_eq!(crop.width, 607.5);
    /// assert_eq!(crop.height, 1080.0);
    /// ```
    pub fn fit(input: Dimensions, output: Dimensions) -> Self {
        let in_w = f64::from(input.width);
        let in_h = f64::from(input.height);
        let out_w = f64::from(output.width);
        let out_h = f64::from(output.height);
        let ratio = (in_h / out_h).min(in_w / out_w);
        Self {
            width: ratio * out_w,
            height: ratio * out_h,
        }
    }

    /// Horizontal offset of the window at `percent` of the free width.
    pub fn x_at(&self, input: Dimensions, percent: f64) -> f64 {
        (f64::from(input.width) - self.width) * (percent / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{CropWindow, Dimensions};
    use crate::error::EngineError;

    fn dims(text: &str) -> Dimensions {
        Dimensions::parse(text).expect("valid dimensions")
    }

    #[test]
    fn landscape_to_portrait_keeps_full_height() {
        let crop = CropWindow::fit(dims("1920x1080"), dims("720x1280"));
        assert_eq!(crop.width, 607.5);
        assert_eq!(crop.height, 1080.0);
        assert!((crop.width / crop.height - 720.0 / 1280.0).abs() < 1e-12);
    }

    #[test]
    fn portrait_to_landscape_keeps_full_width() {
        let crop = CropWindow::fit(dims("1080x1920"), dims("1920x1080"));
        assert_eq!(crop.width, 1080.0);
        assert_eq!(crop.height, 607.5);
    }

    #[test]
    fn same_aspect_uses_whole_frame() {
        let crop = CropWindow::fit(dims("3840x2160"), dims("1280x720"));
        assert_eq!(crop.width, 3840.0);
        assert_eq!(crop.height, 2160.0);
        assert_eq!(crop.x_at(dims("3840x2160"), 50.0), 0.0);
    }

    #[test]
    fn x_at_spans_free_width() {
        let input = dims("1920x1080");
        let crop = CropWindow::fit(input, dims("720x1280"));
        assert_eq!(crop.x_at(input, 0.0), 0.0);
        assert_eq!(crop.x_at(input, 100.0), 1312.5);
        assert_eq!(crop.x_at(input, 50.0), 656.25);
    }

    #[test]
    fn parse_rejects_malformed_and_out_of_range() {
        assert!(matches!(
            Dimensions::parse("1920by1080"),
            Err(EngineError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Dimensions::parse("-1x100"),
            Err(EngineError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            Dimensions::parse("7680x4321"),
            Err(EngineError::DimensionsOutOfRange {
                width: 7680,
                height: 4321
            })
        ));
        assert!(matches!(
            Dimensions::parse("99999999999x10"),
            Err(EngineError::DimensionsOutOfRange { .. })
        ));
        assert_eq!(dims(" 7680X4320 ").to_string(), "7680x4320");
    }
}
