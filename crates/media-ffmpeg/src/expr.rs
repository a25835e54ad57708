use std::f64::consts::PI;

use crate::format::{format_decimal, format_seconds};

/// Interpolation curve used while panning the crop window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanEasing {
    /// Constant velocity.
    #[default]
    Linear,
    /// Slow-in/slow-out via `(1 - cos(PI * t / d)) / 2`.
    Cosine,
}

/// Horizontal crop offset, either fixed or animated over the local segment time `t`.
///
/// `t` is the filter graph's per-segment timestamp, which restarts at zero after
/// `setpts=PTS-STARTPTS`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropX {
    Fixed(f64),
    Pan {
        from: f64,
        to: f64,
        duration: f64,
        easing: PanEasing,
    },
}

impl CropX {
    /// Renders the value as a `crop` filter `x` argument.
    ///
    /// Animated offsets are single-quoted so the filter parser keeps the
    /// expression intact.
    ///
    /// # Example
    /// ```
    /// use media_ffmpeg::{CropX, PanEasing};
    ///
    /// assert_eq!(CropX::Fixed(656.25).expression(), "656.25");
    /// let pan = CropX::Pan {
    ///     from: 262.5,
    ///     to: 1050.0,
    ///     duration: 4.0,
    ///     easing: PanEasing::Linear,
    /// };
    /// assert_eq!(pan.expression(), "'262.5+(1050-262.5)*(t/4.00)'");
    /// ```
    pub fn expression(&self) -> String {
        match *self {
            Self::Fixed(x) => format_decimal(x),
            Self::Pan {
                from,
                to,
                duration,
                easing,
            } => {
                let from = format_decimal(from);
                let to = format_decimal(to);
                let duration = format_seconds(duration);
                match easing {
                    PanEasing::Linear => format!("'{from}+({to}-{from})*(t/{duration})'"),
                    PanEasing::Cosine => {
                        format!("'{from}+({to}-{from})*(1-cos(PI*t/{duration}))/2'")
                    }
                }
            }
        }
    }

    /// Evaluates the offset at local time `t`, mirroring [`CropX::expression`].
    pub fn evaluate(&self, t: f64) -> f64 {
        match *self {
            Self::Fixed(x) => x,
            Self::Pan {
                from,
                to,
                duration,
                easing,
            } => {
                if duration <= 0.0 {
                    return from;
                }
                let progress = t / duration;
                let weight = match easing {
                    PanEasing::Linear => progress,
                    PanEasing::Cosine => (1.0 - (PI * progress).cos()) / 2.0,
                };
                from + (to - from) * weight
            }
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Pan { .. })
    }
}
