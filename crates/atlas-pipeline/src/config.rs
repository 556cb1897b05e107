use serde::{Deserialize, Serialize};

use atlas_archive::NamingRules;
use atlas_types::PackedColor;

/// Tunables for the acquisition pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extension of asset entries inside a bundle.
    pub asset_extension: String,
    /// Suffix locating the manifest entry.
    pub manifest_suffix: String,
    /// Suffix locating the color table entry.
    pub color_table_suffix: String,
    /// Prefix stripped from asset file stems.
    pub asset_prefix: String,
    /// Color for bundle assets with no color table record.
    pub default_color: PackedColor,
    /// Keep `_L`/`_R` in ids derived from bundle entries.
    pub keep_side_suffix: bool,
    /// Buffered progress events before slow subscribers start lagging.
    pub progress_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            asset_extension: ".glb".into(),
            manifest_suffix: "config.json".into(),
            color_table_suffix: "colors.txt".into(),
            asset_prefix: "Atlas_".into(),
            default_color: PackedColor::WHITE,
            keep_side_suffix: false,
            progress_capacity: 256,
        }
    }
}

impl PipelineConfig {
    pub fn naming_rules(&self) -> NamingRules {
        NamingRules {
            prefix: self.asset_prefix.clone(),
            keep_side_suffix: self.keep_side_suffix,
        }
    }
}
