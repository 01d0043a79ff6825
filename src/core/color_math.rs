/*
 * Pure colour conversions and harmony generation used by the colour tools and
 * for validating plugin theme colours. Hue is expressed in degrees [0, 360);
 * saturation, value, lightness and CMYK channels in [0, 1].
 */
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    InvalidHex(String),
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::InvalidHex(raw) => write!(f, "'{raw}' is not a #RGB or #RRGGBB colour"),
        }
    }
}

impl std::error::Error for ColorError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cmyk {
    pub c: f64,
    pub m: f64,
    pub y: f64,
    pub k: f64,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    fn unit(&self) -> (f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        )
    }

    fn from_unit(r: f64, g: f64, b: f64) -> Self {
        Rgb {
            r: unit_to_byte(r),
            g: unit_to_byte(g),
            b: unit_to_byte(b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Cmyk {
    /*
     * Whole percentages, truncated the way the colour picker displays them.
     * Values such as 0.29 whose product with 100 falls just short of a whole
     * number truncate down (to 28).
     */
    pub fn percentages(&self) -> (u8, u8, u8, u8) {
        let pct = |x: f64| (x * 100.0).clamp(0.0, 100.0).trunc() as u8;
        (pct(self.c), pct(self.m), pct(self.y), pct(self.k))
    }
}

fn unit_to_byte(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn normalize_hue(h: f64) -> f64 {
    let wrapped = h.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/*
 * Accepts `#RRGGBB`, `#RGB`, and both forms without the leading `#`.
 */
pub fn parse_hex(raw: &str) -> Result<Rgb, ColorError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(raw.to_string()));
    }
    let expanded = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => digits.to_string(),
        _ => return Err(ColorError::InvalidHex(raw.to_string())),
    };
    let channel = |i: usize| {
        u8::from_str_radix(&expanded[i..i + 2], 16)
            .map_err(|_| ColorError::InvalidHex(raw.to_string()))
    };
    Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

fn hue_from(r: f64, g: f64, b: f64, max: f64, delta: f64) -> f64 {
    if delta == 0.0 {
        return 0.0;
    }
    let h = if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    normalize_hue(h)
}

pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let (r, g, b) = rgb.unit();
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max == 0.0 { 0.0 } else { delta / max };
    Hsv {
        h: hue_from(r, g, b, max, delta),
        s,
        v: max,
    }
}

fn rgb_from_chroma(h: f64, c: f64, m: f64) -> Rgb {
    let h = normalize_hue(h) / 60.0;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Rgb::from_unit(r + m, g + m, b + m)
}

pub fn hsv_to_rgb(hsv: Hsv) -> Rgb {
    let s = hsv.s.clamp(0.0, 1.0);
    let v = hsv.v.clamp(0.0, 1.0);
    let c = v * s;
    rgb_from_chroma(hsv.h, c, v - c)
}

pub fn rgb_to_hsl(rgb: Rgb) -> Hsl {
    let (r, g, b) = rgb.unit();
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;
    let s = if delta == 0.0 {
        0.0
    } else {
        delta / (1.0 - (2.0 * l - 1.0).abs())
    };
    Hsl {
        h: hue_from(r, g, b, max, delta),
        s,
        l,
    }
}

pub fn hsl_to_rgb(hsl: Hsl) -> Rgb {
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    rgb_from_chroma(hsl.h, c, l - c / 2.0)
}

/*
 * Black is special-cased: with k == 1 the chromatic channels would divide by
 * zero, so they are reported as 0.
 */
pub fn rgb_to_cmyk(rgb: Rgb) -> Cmyk {
    let (r, g, b) = rgb.unit();
    let k = (1.0 - r).min(1.0 - g).min(1.0 - b);
    if (1.0 - k).abs() < f64::EPSILON {
        return Cmyk {
            c: 0.0,
            m: 0.0,
            y: 0.0,
            k: 1.0,
        };
    }
    Cmyk {
        c: (1.0 - r - k) / (1.0 - k),
        m: (1.0 - g - k) / (1.0 - k),
        y: (1.0 - b - k) / (1.0 - k),
        k,
    }
}

pub fn cmyk_to_rgb(cmyk: Cmyk) -> Rgb {
    let k = cmyk.k.clamp(0.0, 1.0);
    Rgb::from_unit(
        (1.0 - cmyk.c.clamp(0.0, 1.0)) * (1.0 - k),
        (1.0 - cmyk.m.clamp(0.0, 1.0)) * (1.0 - k),
        (1.0 - cmyk.y.clamp(0.0, 1.0)) * (1.0 - k),
    )
}

/*
 * Rotates the hue of `rgb` by `degrees`, keeping saturation and value.
 */
pub fn rotate_hue(rgb: Rgb, degrees: f64) -> Rgb {
    let hsv = rgb_to_hsv(rgb);
    hsv_to_rgb(Hsv {
        h: normalize_hue(hsv.h + degrees),
        ..hsv
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Harmony {
    pub complementary: Rgb,
    pub contrast: [Rgb; 2],
    pub analogous: [Rgb; 2],
    pub split: [Rgb; 2],
}

pub fn harmony(rgb: Rgb) -> Harmony {
    Harmony {
        complementary: rotate_hue(rgb, 180.0),
        contrast: [rotate_hue(rgb, 150.0), rotate_hue(rgb, 210.0)],
        analogous: [rotate_hue(rgb, -30.0), rotate_hue(rgb, 30.0)],
        split: [rotate_hue(rgb, 90.0), rotate_hue(rgb, 270.0)],
    }
}

/*
 * White text on dark backgrounds, black on light ones (HSL lightness below
 * 180/255 counts as dark).
 */
pub fn readable_text_color(rgb: Rgb) -> Rgb {
    if rgb_to_hsl(rgb).l * 255.0 < 180.0 {
        Rgb::new(255, 255, 255)
    } else {
        Rgb::new(0, 0, 0)
    }
}

/*
 * `steps` colours evenly spaced from `from` to `to`, both ends included.
 */
pub fn gradient(from: Rgb, to: Rgb, steps: usize) -> Vec<Rgb> {
    match steps {
        0 => Vec::new(),
        1 => vec![from],
        _ => {
            let last = (steps - 1) as f64;
            (0..steps)
                .map(|i| {
                    let t = i as f64 / last;
                    let mix = |a: u8, b: u8| {
                        (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8
                    };
                    Rgb::new(mix(from.r, to.r), mix(from.g, to.g), mix(from.b, to.b))
                })
                .collect()
        }
    }
}
