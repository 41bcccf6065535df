//! Color palettes
//!
//! Colors are assigned by index with wrap-around: for a palette of `P` colors the
//! item at index `i` gets `palette[i mod P]`, independent of traversal order.

/// Report theme colors used when neither the visual nor the report configures a palette
pub const DEFAULT_COLORS: [&str; 5] = ["#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::default_theme()
    }
}

impl ColorPalette {
    pub fn default_theme() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Build a palette from user-supplied color strings. Hex and named colors are
    /// normalized to `#rrggbb`; anything else (`rgba(...)`, `hsl(...)`, other CSS
    /// names) keeps its slot unchanged. An empty list falls back to the default theme.
    pub fn from_colors<S: AsRef<str>>(colors: &[S]) -> Self {
        if colors.is_empty() {
            return Self::default_theme();
        }
        let colors = colors
            .iter()
            .map(|c| {
                let raw = c.as_ref().trim();
                match parse_color(raw) {
                    Some(rgb) => rgb.to_hex(),
                    None => {
                        log::debug!("Passing through palette color '{}'", raw);
                        raw.to_string()
                    }
                }
            })
            .collect();
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Color for item `index`, wrapping around the palette
    pub fn color_at(&self, index: usize) -> String {
        if self.colors.is_empty() {
            return DEFAULT_COLORS[index % DEFAULT_COLORS.len()].to_string();
        }
        self.colors[index % self.colors.len()].clone()
    }

    /// Colors for `count` consecutive items
    pub fn assign(&self, count: usize) -> Vec<String> {
        (0..count).map(|i| self.color_at(i)).collect()
    }
}

/// Parse a color string: hex (`#RRGGBB`, `#RGB`) or a basic color name
pub fn parse_color(color_str: &str) -> Option<Rgb> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(Rgb(255, 255, 255)),
        "black" => Some(Rgb(0, 0, 0)),
        "red" => Some(Rgb(255, 0, 0)),
        "green" => Some(Rgb(0, 128, 0)),
        "blue" => Some(Rgb(0, 0, 255)),
        "yellow" => Some(Rgb(255, 255, 0)),
        "cyan" => Some(Rgb(0, 255, 255)),
        "magenta" => Some(Rgb(255, 0, 255)),
        "orange" => Some(Rgb(255, 165, 0)),
        "purple" => Some(Rgb(128, 0, 128)),
        "pink" => Some(Rgb(255, 192, 203)),
        "brown" => Some(Rgb(139, 69, 19)),
        "teal" => Some(Rgb(0, 128, 128)),
        "navy" => Some(Rgb(0, 0, 128)),
        "gray" | "grey" => Some(Rgb(128, 128, 128)),
        "darkgray" | "darkgrey" => Some(Rgb(64, 64, 64)),
        "lightgray" | "lightgrey" => Some(Rgb(192, 192, 192)),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(Rgb(r, g, b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraparound() {
        let palette = ColorPalette::from_colors(&["#ff0000", "#00ff00", "#0000ff"]);
        let colors = palette.assign(7);
        assert_eq!(colors[5], "#0000ff");
        assert_eq!(colors[5], palette.color_at(5 % 3));
        assert_eq!(colors[6], "#ff0000");
    }

    #[test]
    fn test_normalizes_and_keeps_unparsed_slots() {
        let palette = ColorPalette::from_colors(&["#F00", "steelblue", "navy"]);
        assert_eq!(
            palette.colors(),
            &["#ff0000".to_string(), "steelblue".to_string(), "#000080".to_string()]
        );
    }

    #[test]
    fn test_wraparound_with_non_hex_entry() {
        let palette = ColorPalette::from_colors(&["#ff0000", "rgba(0,255,0,1)", "#0000ff"]);
        assert_eq!(palette.len(), 3);
        let colors = palette.assign(7);
        assert_eq!(colors[1], "rgba(0,255,0,1)");
        assert_eq!(colors[5], "#0000ff");
        assert_eq!(colors[6], "#ff0000");
    }

    #[test]
    fn test_empty_falls_back_to_theme() {
        let empty: [&str; 0] = [];
        assert_eq!(ColorPalette::from_colors(&empty), ColorPalette::default_theme());
        assert_eq!(ColorPalette::from_colors(&["bogus"]).colors(), &["bogus".to_string()]);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#3b82f6"), Some(Rgb(0x3b, 0x82, 0xf6)));
        assert_eq!(parse_color(" White "), Some(Rgb(255, 255, 255)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }
}
