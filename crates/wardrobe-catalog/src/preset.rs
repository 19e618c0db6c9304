//! Built-in preset garments.
//!
//! Presets let a user populate the catalogue without a photo. Their image
//! is a small SVG card synthesized locally: a rounded rectangle in the
//! garment's color with its initial and category label.

use bytes::Bytes;
use serde::Serialize;
use wardrobe_types::{Category, TempRange};

/// A garment template with a generated image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub name: String,
    pub category: Category,
    pub temp_range: TempRange,
    /// Card color as `#rrggbb`.
    pub color: String,
}

impl Preset {
    pub fn new(name: &str, category: Category, min: i32, max: i32, color: &str) -> Self {
        Self {
            name: name.to_string(),
            category,
            temp_range: TempRange::new(min, max),
            color: color.to_string(),
        }
    }

    /// The built-in preset list, grouped by slot.
    pub fn builtin() -> Vec<Preset> {
        vec![
            Preset::new("White tank top", Category::Inner, 22, 32, "#f4f1ea"),
            Preset::new("Thermal undershirt", Category::Inner, -10, 10, "#d9cbb3"),
            Preset::new("Basic T-shirt", Category::Top, 18, 30, "#ffffff"),
            Preset::new("Oxford shirt", Category::Top, 12, 24, "#9cc3e6"),
            Preset::new("Knit sweater", Category::Top, 0, 14, "#8c5a3c"),
            Preset::new("Denim jeans", Category::Bottom, 0, 24, "#2f4f7f"),
            Preset::new("Chino shorts", Category::Bottom, 22, 35, "#c8b68e"),
            Preset::new("Trench coat", Category::Outer, 5, 16, "#b89b6c"),
            Preset::new("Down jacket", Category::Outer, -15, 5, "#1f2a36"),
            Preset::new("Canvas sneakers", Category::Shoes, 10, 30, "#e8e8e8"),
            Preset::new("Leather boots", Category::Shoes, -10, 15, "#5a3a22"),
            Preset::new("Wool scarf", Category::Accessory, -10, 8, "#a33b3b"),
            Preset::new("Sun hat", Category::Accessory, 22, 35, "#e2c27a"),
        ]
    }

    /// Case-insensitive lookup in [`Preset::builtin`].
    pub fn find(name: &str) -> Option<Preset> {
        let name = name.trim();
        Self::builtin()
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Render the placeholder card as SVG bytes.
    pub fn render_placeholder(&self) -> Bytes {
        let initial: String = self
            .name
            .trim()
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string());
        let fill = if is_hex_color(&self.color) {
            self.color.as_str()
        } else {
            "#888888"
        };
        let ink = ink_for(fill);

        let svg = format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="240" height="240" viewBox="0 0 240 240">"#,
                r#"<rect x="12" y="12" width="216" height="216" rx="28" fill="{fill}"/>"#,
                r#"<text x="120" y="120" font-family="sans-serif" font-size="96" text-anchor="middle" dominant-baseline="middle" fill="{ink}">{initial}</text>"#,
                r#"<text x="120" y="204" font-family="sans-serif" font-size="20" text-anchor="middle" fill="{ink}">{label}</text>"#,
                "</svg>"
            ),
            fill = fill,
            ink = ink,
            initial = escape_xml(&initial),
            label = self.category,
        );
        Bytes::from(svg)
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Dark text on light cards, white text on dark ones.
fn ink_for(color: &str) -> &'static str {
    let channel = |i: usize| u32::from_str_radix(&color[i..i + 2], 16).unwrap_or(0);
    let luma = (299 * channel(1) + 587 * channel(3) + 114 * channel(5)) / 1000;
    if luma > 160 {
        "#222222"
    } else {
        "#ffffff"
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
