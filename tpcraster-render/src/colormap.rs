//! Colormap definitions and application logic.

/// Control points of the sequential `Greys` map, white at 0 to black at 1.
const GREYS_STOPS: [u8; 9] = [255, 240, 217, 189, 150, 115, 82, 37, 0];

/// Number of entries in the lookup table a normalized value is quantized to.
const LUT_SIZE: usize = 256;

/// Available colormaps for charge intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Greys - white to black, so higher charge draws darker.
    #[default]
    Greys,
}

impl std::fmt::Display for Colormap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Colormap::Greys => write!(f, "Greys"),
        }
    }
}

impl Colormap {
    /// Apply the colormap to a normalized value [0, 1] and return RGB bytes.
    ///
    /// Values are quantized to a 256-entry table first; anything outside [0, 1]
    /// (or NaN) lands on the nearest end of the map.
    #[must_use]
    pub fn apply(self, val: f64) -> [u8; 3] {
        let v = match self {
            Colormap::Greys => greys(lut_index(val)),
        };
        [v, v, v]
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn lut_index(val: f64) -> usize {
    if val.is_nan() || val <= 0.0 {
        return 0;
    }
    ((val * LUT_SIZE as f64) as usize).min(LUT_SIZE - 1)
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn greys(index: usize) -> u8 {
    let segments = (GREYS_STOPS.len() - 1) as f64;
    let pos = index as f64 / (LUT_SIZE - 1) as f64 * segments;
    let lo = (pos.floor() as usize).min(GREYS_STOPS.len() - 2);
    let frac = pos - lo as f64;
    let a = f64::from(GREYS_STOPS[lo]);
    let b = f64::from(GREYS_STOPS[lo + 1]);
    (a + (b - a) * frac).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greys_endpoints() {
        assert_eq!(Colormap::Greys.apply(0.0), [255, 255, 255]);
        assert_eq!(Colormap::Greys.apply(1.0), [0, 0, 0]);
        assert_eq!(Colormap::Greys.apply(-3.0), [255, 255, 255]);
        assert_eq!(Colormap::Greys.apply(7.5), [0, 0, 0]);
        assert_eq!(Colormap::Greys.apply(f64::NAN), [255, 255, 255]);
    }

    #[test]
    fn test_greys_is_darker_for_higher_values() {
        let mut last = u8::MAX;
        for i in 0..=20 {
            let [v, _, _] = Colormap::Greys.apply(f64::from(i) / 20.0);
            assert!(v <= last);
            last = v;
        }
    }
}
