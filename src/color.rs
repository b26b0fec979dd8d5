//! Colors used by the scene and lights.
//!
//! Colors are RGBA with `f32` components in the range [0.0, 1.0]. Engines
//! usually describe colors as `0xRRGGBB` integers, so [`from_hex`] converts
//! from that form.

pub use rgb::Rgba;

/// The color type used throughout fz3d. RGBA with f32 components in [0.0, 1.0].
pub type Color = Rgba<f32>;

/// <div style="margin:2px 0"><span style="background-color:rgb(0, 0, 0);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Black (0, 0, 0)</div>
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(255, 255, 255);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>White (255, 255, 255)</div>
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

/// <div style="margin:2px 0"><span style="background-color:rgb(68, 68, 68);padding:0 0.7em;margin-right:0.5em;border:1px solid"></span>Charcoal (68, 68, 68), the default scene background</div>
pub const CHARCOAL: Color = Color::new(0.26666668, 0.26666668, 0.26666668, 1.0);

/// Converts a `0xRRGGBB` integer into an opaque [`Color`].
///
/// Bits above the low 24 are ignored.
pub fn from_hex(hex: u32) -> Color {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Color::new(r, g, b, 1.0)
}

/// Converts a color back to its `0xRRGGBB` form, dropping alpha.
pub fn to_hex(color: Color) -> u32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
    (channel(color.r) << 16) | (channel(color.g) << 8) | channel(color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_conversion_matches_named_colors() {
        assert_eq!(from_hex(0xffffff), WHITE);
        assert_eq!(from_hex(0x000000), BLACK);
        assert_eq!(to_hex(CHARCOAL), 0x444444);
    }

    #[test]
    fn high_bits_are_ignored() {
        assert_eq!(from_hex(0xff00_0000), BLACK);
    }
}
