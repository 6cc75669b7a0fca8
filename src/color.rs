//! Color helpers used by the notebook customization commands.

/// Preset cover colors offered when creating or recoloring a notebook.
pub const CRAYON_COLORS: [&str; 24] = [
    "#E63946", "#F4A261", "#E9C46A", "#2A9D8F", "#264653", "#8338EC", "#3A86FF", "#FF006E",
    "#FB5607", "#FFBE0B", "#06D6A0", "#118AB2", "#073B4C", "#EF476F", "#7209B7", "#4CC9F0",
    "#F72585", "#B5179E", "#560BAD", "#4361EE", "#90BE6D", "#F9844A", "#43AA8B", "#577590",
];

/// Converts an HSL color to a `#rrggbb` string.
///
/// `hue` is in degrees `[0, 360)`, `saturation` and `lightness` are percentages
/// `[0, 100]`. Inputs outside those ranges are not rejected; they come from bounded
/// sliders in practice.
pub fn hsl_to_hex(hue: f64, saturation: f64, lightness: f64) -> String {
    let l = lightness / 100.0;
    let a = saturation * l.min(1.0 - l) / 100.0;

    let channel = |n: f64| -> u8 {
        let k = (n + hue / 30.0) % 12.0;
        let value = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
        (255.0 * value).round().clamp(0.0, 255.0) as u8
    };

    format!("#{:02x}{:02x}{:02x}", channel(0.0), channel(8.0), channel(4.0))
}

/// Like [`hsl_to_hex`], appending a two-digit alpha suffix unless `alpha` is 100.
///
/// `alpha` is an opacity percentage in `[0, 100]`.
pub fn hsl_to_hex_with_alpha(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> String {
    let hex = hsl_to_hex(hue, saturation, lightness);
    if alpha == 100.0 {
        return hex;
    }
    format!("{}{}", hex, alpha_suffix(alpha))
}

/// Hex byte for an opacity percentage, e.g. 50 -> "80".
pub fn alpha_suffix(alpha: f64) -> String {
    let byte = (alpha / 100.0 * 255.0).round().clamp(0.0, 255.0) as u8;
    format!("{:02x}", byte)
}

/// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
