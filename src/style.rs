// The style configuration seeding the policy table:
// category (tag key) -> tag value -> style attributes. The order in the file is the priority.

use std::path::Path;

use indexmap::IndexMap;
use log::{info, warn};
use serde::Deserialize;

use crate::error::SceneResult;
use crate::kernel_out::RenderColor;
use crate::tagticks::{GeometryPolicy, PolicyTable, StructuralKind, parse_color};

static UNSTYLED_COLOR: RenderColor = [0.5, 0.5, 0.5, 1.0]; // "grey"

#[derive(Deserialize, Debug, Clone)]
pub struct StyleAttributes {
    pub kind: StructuralKind,
    pub height: f32,
    #[serde(default)]
    pub width: f32,
    pub color: String,
    #[serde(default)]
    pub color_dark: Option<String>,
    #[serde(default)]
    pub y_offset: f32,
}

pub type StyleConfig = IndexMap<String, IndexMap<String, StyleAttributes>>;

impl PolicyTable {
    /// Entries with a negative or non-finite height are logged and left out.
    /// Height 0 stays: such entries are kept but never produce geometry.
    pub fn from_style(style: &StyleConfig) -> Self {
        let mut policies = Vec::new();
        for (category, values) in style {
            for (value, attributes) in values {
                if !attributes.height.is_finite() || attributes.height < 0.0 {
                    warn!(
                        "style {}={}: height {} dropped",
                        category, value, attributes.height
                    );
                    continue;
                }
                let color_normal = parse_color(Some(attributes.color.as_str()), UNSTYLED_COLOR);
                let color_dark = parse_color(attributes.color_dark.as_deref(), color_normal);
                policies.push(GeometryPolicy {
                    tag_key: category.clone(),
                    tag_value: value.clone(),
                    kind: attributes.kind,
                    height: attributes.height,
                    width: attributes.width,
                    color_normal,
                    color_dark,
                    y_offset: attributes.y_offset,
                });
            }
        }
        PolicyTable::new(policies)
    }

    pub fn from_style_json(json: &str) -> SceneResult<Self> {
        let style: StyleConfig = serde_json::from_str(json)?;
        Ok(Self::from_style(&style))
    }

    pub fn from_style_file(path: impl AsRef<Path>) -> SceneResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_style_json(&json)?;
        info!(
            "style {}: {} policies",
            path.as_ref().display(),
            table.len()
        );
        Ok(table)
    }
}
