use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Straight-alpha RGBA color with channels in `0.0..=1.0`.
///
/// Matches the host's color picker representation. Values outside the unit range are clamped
/// when converted to an ImageMagick color literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Render as an ImageMagick `rgba(r,g,b,a)` literal (8-bit channels, unit alpha).
    pub fn to_imagemagick(self) -> String {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        let a = (self.a.clamp(0.0, 1.0) * 1000.0).round() / 1000.0;
        format!(
            "rgba({},{},{},{})",
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b),
            a
        )
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_imagemagick())
    }
}

impl FromStr for Rgba {
    type Err = String;

    /// Accepts `#RRGGBB`, `#RRGGBBAA`, `transparent`, or a comma list of 3-4 unit floats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::TRANSPARENT);
        }
        if s.contains(',') {
            let parts = s
                .split(',')
                .map(|p| {
                    p.trim()
                        .parse::<f64>()
                        .map_err(|_| format!("invalid color channel \"{}\"", p.trim()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            return from_channels(&parts);
        }
        parse_hex(s)
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Obj {
                r: f64,
                g: f64,
                b: f64,
                #[serde(default = "one")]
                a: f64,
            },
            Arr(Vec<f64>),
        }

        fn one() -> f64 {
            1.0
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Obj { r, g, b, a } => {
                from_channels(&[r, g, b, a]).map_err(serde::de::Error::custom)
            }
            Repr::Arr(v) => from_channels(&v).map_err(serde::de::Error::custom),
        }
    }
}

fn from_channels(v: &[f64]) -> Result<Rgba, String> {
    if v.iter().any(|c| !c.is_finite()) {
        return Err("color channels must be finite numbers".to_owned());
    }
    match *v {
        [r, g, b] => Ok(Rgba::rgba(r, g, b, 1.0)),
        [r, g, b, a] => Ok(Rgba::rgba(r, g, b, a)),
        _ => Err("rgba list must have 3 ([r,g,b]) or 4 ([r,g,b,a]) channels".to_owned()),
    }
}

fn parse_hex(s: &str) -> Result<Rgba, String> {
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return Err("hex color must be #RRGGBB or #RRGGBBAA".to_owned());
    }

    fn hex_byte(pair: &str) -> Result<f64, String> {
        u8::from_str_radix(pair, 16)
            .map(|b| f64::from(b) / 255.0)
            .map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    match s.len() {
        6 => Ok(Rgba::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            1.0,
        )),
        8 => Ok(Rgba::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA".to_owned()),
    }
}
