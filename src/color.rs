//! Link colors.

use std::collections::HashMap;

use thiserror::Error;

const DEFAULT_PALETTE: [&str; 24] = [
    "#ef4444", "#3b82f6", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#14b8a6",
    "#84cc16", "#e11d48", "#0ea5e9", "#22c55e", "#a855f7", "#f43f5e", "#f97316", "#eab308",
    "#38bdf8", "#34d399", "#60a5fa", "#a3e635", "#fb923c", "#c084fc", "#fbbf24", "#4ade80",
];

const PASTEL_PALETTE: [&str; 10] = [
    "#fbb6ce", "#fbd38d", "#bee3f8", "#c6f6d5", "#e9d8fd", "#fecaca", "#fed7aa", "#a5f3fc",
    "#bbf7d0", "#ddd6fe",
];

const MONOCHROME_PALETTE: [&str; 10] = [
    "#1f2937", "#374151", "#4b5563", "#6b7280", "#9ca3af", "#d1d5db", "#e5e7eb", "#f3f4f6",
    "#3b82f6", "#60a5fa",
];

const BOLD_PALETTE: [&str; 10] = [
    "#dc2626", "#ea580c", "#ca8a04", "#16a34a", "#0284c7", "#7c3aed", "#c026d3", "#be123c",
    "#0891b2", "#4f46e5",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette must contain at least one color")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Default,
    Pastel,
    Monochrome,
    Bold,
}

impl ColorScheme {
    pub fn colors(self) -> &'static [&'static str] {
        match self {
            ColorScheme::Default => &DEFAULT_PALETTE,
            ColorScheme::Pastel => &PASTEL_PALETTE,
            ColorScheme::Monochrome => &MONOCHROME_PALETTE,
            ColorScheme::Bold => &BOLD_PALETTE,
        }
    }

    /// Unknown names fall back to the default scheme.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pastel" => ColorScheme::Pastel,
            "monochrome" => ColorScheme::Monochrome,
            "bold" => ColorScheme::Bold,
            _ => ColorScheme::Default,
        }
    }
}

/// Assigns palette colors to links, either by position or by the
/// `from->to` relationship so repeated pairs share a color.
#[derive(Debug, Clone)]
pub struct LinkPalette {
    colors: Vec<String>,
    assigned: HashMap<String, usize>,
    next: usize,
}

impl Default for LinkPalette {
    fn default() -> Self {
        Self::from_scheme(ColorScheme::Default)
    }
}

impl LinkPalette {
    pub fn new(colors: Vec<String>) -> Result<Self, PaletteError> {
        let mut p = Self::default();
        p.set_palette(colors)?;
        Ok(p)
    }

    pub fn from_scheme(scheme: ColorScheme) -> Self {
        Self {
            colors: scheme.colors().iter().map(|c| c.to_string()).collect(),
            assigned: HashMap::new(),
            next: 0,
        }
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn color_at(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }

    /// Color of the `from -> to` relationship, assigning the next palette
    /// entry on first use.
    pub fn color_for(&mut self, from: &str, to: &str) -> &str {
        let key = format!("{from}->{to}");
        let slot = match self.assigned.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.next % self.colors.len();
                self.assigned.insert(key, slot);
                self.next += 1;
                slot
            }
        };
        &self.colors[slot]
    }

    pub fn reset(&mut self) {
        self.assigned.clear();
        self.next = 0;
    }

    /// Replace the palette and forget every assignment.
    pub fn set_palette(&mut self, colors: Vec<String>) -> Result<(), PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        self.colors = colors;
        self.reset();
        Ok(())
    }

    pub fn apply_scheme(&mut self, scheme: ColorScheme) {
        *self = Self::from_scheme(scheme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_at_cycles() {
        let p = LinkPalette::default();
        assert_eq!(p.color_at(0), "#ef4444");
        assert_eq!(p.color_at(23), "#4ade80");
        assert_eq!(p.color_at(24), "#ef4444");
    }

    #[test]
    fn test_color_for_is_stable() {
        let mut p = LinkPalette::default();
        let a = p.color_for("posts", "users").to_string();
        let b = p.color_for("comments", "posts").to_string();
        assert_ne!(a, b);
        assert_eq!(p.color_for("posts", "users"), a);
        // direction matters
        let reversed = p.color_for("users", "posts").to_string();
        assert_eq!(reversed, p.color_at(2));
        p.reset();
        assert_eq!(p.color_for("comments", "posts"), a);
    }

    #[test]
    fn test_empty_palette_rejected() {
        let mut p = LinkPalette::default();
        assert_eq!(p.set_palette(Vec::new()), Err(PaletteError::Empty));
        assert_eq!(p.colors().len(), 24);
        assert!(LinkPalette::new(vec!["#000".into()]).is_ok());
    }

    #[test]
    fn test_schemes() {
        let mut p = LinkPalette::default();
        p.color_for("a", "b");
        p.apply_scheme(ColorScheme::from_name("Bold"));
        assert_eq!(p.color_for("x", "y"), "#dc2626");
        assert_eq!(ColorScheme::from_name("neon"), ColorScheme::Default);
        assert_eq!(ColorScheme::Pastel.colors().len(), 10);
    }
}
