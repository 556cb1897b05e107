//! Color table parsing.
//!
//! Each logical line has the form `<name>: <r> <g> <b>[ ...]` with channels
//! normalized to `[0, 1]`. Lines that do not fit the shape are skipped, never
//! reported as errors, so one bad record cannot spoil its neighbours.

use std::collections::HashMap;

use atlas_types::PackedColor;

/// Name to packed color mapping built from a color table entry.
///
/// Names are trimmed and case-sensitive. When a name appears more than once
/// the last definition wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
    colors: HashMap<String, PackedColor>,
}

impl ColorTable {
    /// Parse a whole table. Pure: no logging, no side effects.
    pub fn parse(text: &str) -> Self {
        let mut colors = HashMap::new();
        for (name, color) in text.lines().filter_map(parse_color_line) {
            colors.insert(name, color);
        }
        Self { colors }
    }

    pub fn get(&self, name: &str) -> Option<PackedColor> {
        self.colors.get(name).copied()
    }

    /// Look up `name`, falling back to `default` when it is not listed.
    pub fn color_or(&self, name: &str, default: PackedColor) -> PackedColor {
        self.get(name).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Entries sorted by name.
    pub fn sorted(&self) -> Vec<(&str, PackedColor)> {
        let mut rows: Vec<(&str, PackedColor)> =
            self.colors.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        rows.sort_by(|(a, _), (b, _)| a.cmp(b));
        rows
    }
}

/// Parse one record. Returns `None` for lines that should be skipped.
///
/// The first three whitespace-separated tokens after the first `:` must all
/// be numeric; anything after them is ignored.
pub fn parse_color_line(line: &str) -> Option<(String, PackedColor)> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let mut tokens = rest.split_whitespace();
    let mut channel = || tokens.next()?.parse::<f64>().ok();
    let r = channel()?;
    let g = channel()?;
    let b = channel()?;
    Some((name.to_string(), PackedColor::from_unit_channels(r, g, b)))
}
