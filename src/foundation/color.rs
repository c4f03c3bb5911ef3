/// Straight-alpha RGBA8 colour parsed from a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Rgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Rgba8 {
    /// Canonical lowercase hex form; alpha is omitted when opaque.
    pub(crate) fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

pub(crate) fn parse_hex(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    let (r, g, b, a) = match s.len() {
        6 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        ),
        8 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ),
        _ => {
            return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
        }
    };

    Ok(Rgba8 { r, g, b, a })
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
