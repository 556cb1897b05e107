//! Identifier derivation from asset file names.
//!
//! Bundle assets are named like `Atlas_GPe1_L.glb`: a fixed prefix, the
//! region name, and an optional hemisphere suffix. The region name is the
//! color table key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hemisphere suffix carried by an asset file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Left => "_L",
            Self::Right => "_R",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Names derived from one asset path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetName {
    /// Identifier the asset is registered under.
    pub id: String,
    /// Key used for the color table lookup (never carries the side suffix).
    pub color_key: String,
    pub side: Option<Side>,
}

/// How identifiers are derived from asset paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRules {
    /// Literal prefix stripped from the file stem when present.
    pub prefix: String,
    /// Keep `_L`/`_R` in the registered id so both hemispheres coexist.
    /// The color key is stripped either way.
    #[serde(default)]
    pub keep_side_suffix: bool,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            prefix: "Atlas_".into(),
            keep_side_suffix: false,
        }
    }
}

impl NamingRules {
    pub fn derive(&self, path: &str) -> AssetName {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let stem = match file_name.rfind('.') {
            Some(dot) if dot > 0 => &file_name[..dot],
            _ => file_name,
        };
        let base = stem.strip_prefix(self.prefix.as_str()).unwrap_or(stem);

        let (color_key, side) = [Side::Left, Side::Right]
            .into_iter()
            .find_map(|side| {
                base.strip_suffix(side.suffix())
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest, Some(side)))
            })
            .unwrap_or((base, None));

        let id = if self.keep_side_suffix { base } else { color_key };
        AssetName {
            id: id.to_string(),
            color_key: color_key.to_string(),
            side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_side() {
        let name = NamingRules::default().derive("atlas/left/Atlas_GPe1_L.glb");
        assert_eq!(name.id, "GPe1");
        assert_eq!(name.color_key, "GPe1");
        assert_eq!(name.side, Some(Side::Left));
    }

    #[test]
    fn right_side() {
        let name = NamingRules::default().derive("Atlas_STN_R.glb");
        assert_eq!(name.id, "STN");
        assert_eq!(name.side, Some(Side::Right));
    }

    #[test]
    fn no_prefix_no_side() {
        let name = NamingRules::default().derive("models/Thalamus.glb");
        assert_eq!(name.id, "Thalamus");
        assert_eq!(name.side, None);
    }

    #[test]
    fn bare_suffix_is_not_stripped() {
        let name = NamingRules::default().derive("Atlas__L.glb");
        assert_eq!(name.id, "_L");
        assert_eq!(name.side, None);
    }

    #[test]
    fn keep_side_suffix_in_id() {
        let rules = NamingRules {
            keep_side_suffix: true,
            ..NamingRules::default()
        };
        let name = rules.derive("Atlas_GPe1_R.glb");
        assert_eq!(name.id, "GPe1_R");
        assert_eq!(name.color_key, "GPe1");
    }

    #[test]
    fn custom_prefix() {
        let rules = NamingRules {
            prefix: "BN_".into(),
            keep_side_suffix: false,
        };
        assert_eq!(rules.derive("BN_Caudate.glb").id, "Caudate");
        assert_eq!(rules.derive("Atlas_Caudate.glb").id, "Atlas_Caudate");
    }
}
