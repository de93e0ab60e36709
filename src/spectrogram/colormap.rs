/// Reference colormap anchors (a "magma"-style ramp), evenly spaced over `[0, 1]`.
pub const MAGMA_ANCHORS: [[u8; 3]; 9] = [
    [0, 0, 4],
    [28, 16, 68],
    [79, 18, 123],
    [129, 37, 129],
    [181, 54, 122],
    [229, 80, 100],
    [251, 135, 97],
    [254, 194, 135],
    [252, 253, 191],
];

/// Color intensity control applied on top of the reference colormap.
///
/// `0.0` is pure grayscale, `1.0` the reference mapping, `2.0` the most saturated.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Saturation(f32);

impl Saturation {
    /// Lowest accepted value.
    pub const MIN: f32 = 0.0;
    /// Highest accepted value.
    pub const MAX: f32 = 2.0;
    /// Reference mapping.
    pub const DEFAULT: Saturation = Saturation(1.0);

    /// Clamp `value` into `[MIN, MAX]`; non-finite values fall back to the default.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Self::DEFAULT;
        }
        Self((value as f32).clamp(Self::MIN, Self::MAX))
    }

    /// Parse user text. Empty input gives the default; unparsable input gives the default plus
    /// a warning message; out-of-range numbers are clamped.
    pub fn parse_lenient(text: &str) -> (Self, Option<String>) {
        let text = text.trim();
        if text.is_empty() {
            return (Self::DEFAULT, None);
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                let s = Self::new(v);
                let out_of_range = v < f64::from(Self::MIN) || v > f64::from(Self::MAX);
                let warning = out_of_range
                    .then(|| format!("saturation {v} is outside [0, 2]; clamped to {}", s.0));
                (s, warning)
            }
            _ => (
                Self::DEFAULT,
                Some(format!("invalid saturation '{text}'; using default 1.0")),
            ),
        }
    }

    /// Underlying factor.
    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Saturation {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<f64> for Saturation {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

impl From<Saturation> for f64 {
    fn from(s: Saturation) -> Self {
        f64::from(s.0)
    }
}

impl std::fmt::Display for Saturation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map a normalized magnitude in `[0, 1]` to the reference color.
pub fn reference_color(v: f32) -> [u8; 3] {
    let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
    let segments = (MAGMA_ANCHORS.len() - 1) as f32;
    let pos = v * segments;
    let i = (pos.floor() as usize).min(MAGMA_ANCHORS.len() - 2);
    let t = pos - i as f32;
    let (a, b) = (MAGMA_ANCHORS[i], MAGMA_ANCHORS[i + 1]);
    let mut out = [0u8; 3];
    for c in 0..3 {
        let x = f32::from(a[c]) + (f32::from(b[c]) - f32::from(a[c])) * t;
        out[c] = x.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Scale the color intensity of `rgb` around its Rec.601 luma.
pub fn apply_saturation(rgb: [u8; 3], saturation: Saturation) -> [u8; 3] {
    let s = saturation.value();
    if s == 1.0 {
        return rgb;
    }
    let [r, g, b] = rgb.map(f32::from);
    let gray = 0.299 * r + 0.587 * g + 0.114 * b;
    [r, g, b].map(|c| (gray + s * (c - gray)).round().clamp(0.0, 255.0) as u8)
}

/// Full mapping: magnitude → reference color → saturation.
pub fn colorize(v: f32, saturation: Saturation) -> [u8; 3] {
    apply_saturation(reference_color(v), saturation)
}

#[cfg(test)]
#[path = "../../tests/unit/spectrogram/colormap.rs"]
mod tests;
