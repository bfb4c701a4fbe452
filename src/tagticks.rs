///////////////////////////////////////
// The tactics to hanlde OSM tagging //
///////////////////////////////////////

use std::sync::LazyLock;

use csscolorparser::parse;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::kernel_in::{ElementGeometry, MemberRole, TaggedElement, Tags};
use crate::kernel_out::RenderColor;

/// Tag value of the fallback entry of a tag key
pub static DEFAULT_VALUE: &str = "default";

// Tag derived heights of extruded areas are clamped into this range
pub static MIN_EXTRUDE_HEIGHT: f32 = 5.0;
pub static MAX_EXTRUDE_HEIGHT: f32 = 35.0;
pub static LEVEL_HEIGHT: f32 = 3.0;

static FALLBACK_COLOR: RenderColor = [98. / 255., 203. / 255., 232. / 255., 1.]; // Electric Blue

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralKind {
    /// Path following ribbon (roads, rivers)
    LinearWay,
    /// Path following ribbon, no road surface
    RailWay,
    /// Closed polygon extruded vertically
    ExtrudedArea,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeometryPolicy {
    pub tag_key: String,
    /// A tag value or [`DEFAULT_VALUE`]
    pub tag_value: String,
    pub kind: StructuralKind,
    pub height: f32,
    pub width: f32,
    pub color_normal: RenderColor,
    pub color_dark: RenderColor,
    pub y_offset: f32,
}

impl GeometryPolicy {
    pub fn is_default(&self) -> bool {
        self.tag_value == DEFAULT_VALUE
    }

    /// Zero height entries are meta entries (boundaries etc.) and never produce geometry.
    pub fn is_extruded(&self) -> bool {
        self.height != 0.0
    }

    pub fn color(&self, dark: bool) -> RenderColor {
        if dark {
            self.color_dark
        } else {
            self.color_normal
        }
    }
}

// One line of the built-in table
struct StaticPolicy {
    key: &'static str,
    value: &'static str,
    kind: StructuralKind,
    height: f32,
    width: f32,
    color: &'static str,
    color_dark: &'static str,
    y_offset: f32,
}

use StructuralKind::{ExtrudedArea, LinearWay, RailWay};

macro_rules! policy {
    ($key:literal, $value:literal, $kind:expr, $height:literal, $width:literal, $color:literal, $dark:literal, $y:literal) => {
        StaticPolicy {
            key: $key,
            value: $value,
            kind: $kind,
            height: $height,
            width: $width,
            color: $color,
            color_dark: $dark,
            y_offset: $y,
        }
    };
}

// The order is the priority: first match wins. highway before building!
#[rustfmt::skip]
static DEFAULT_POLICIES: &[StaticPolicy] = &[
    //      key         value           kind          height width  color       dark       y_offset
    policy!("highway",  "motorway",     LinearWay,    0.4,   12.0, "#e892a2", "#8a4a55", 0.06),
    policy!("highway",  "trunk",        LinearWay,    0.4,   10.0, "#f9b29c", "#8f5f50", 0.06),
    policy!("highway",  "primary",      LinearWay,    0.35,  8.0,  "#fcd6a4", "#8c7657", 0.05),
    policy!("highway",  "secondary",    LinearWay,    0.3,   7.0,  "#f7fabf", "#8a8c66", 0.05),
    policy!("highway",  "tertiary",     LinearWay,    0.3,   6.0,  "#ffffff", "#777777", 0.05),
    policy!("highway",  "residential",  LinearWay,    0.25,  5.0,  "#eeeeee", "#666666", 0.04),
    policy!("highway",  "service",      LinearWay,    0.2,   3.5,  "#dddddd", "#5a5a5a", 0.04),
    policy!("highway",  "track",        LinearWay,    0.1,   3.0,  "#996600", "#553800", 0.03),
    policy!("highway",  "footway",      LinearWay,    0.15,  2.0,  "#fa8072", "#7a3f38", 0.03),
    policy!("highway",  "cycleway",     LinearWay,    0.15,  2.0,  "#6c6cff", "#35357f", 0.03),
    policy!("highway",  "path",         LinearWay,    0.1,   1.5,  "#c28e6e", "#604637", 0.03),
    policy!("highway",  "steps",        LinearWay,    0.3,   2.0,  "#fa8072", "#7a3f38", 0.03),
    policy!("highway",  "default",      LinearWay,    0.2,   4.0,  "#cccccc", "#555555", 0.04),
    policy!("railway",  "rail",         RailWay,      0.5,   2.5,  "#707070", "#3a3a3a", 0.05),
    policy!("railway",  "light_rail",   RailWay,      0.4,   2.0,  "#808080", "#404040", 0.05),
    policy!("railway",  "tram",         RailWay,      0.3,   1.5,  "#909090", "#484848", 0.05),
    policy!("railway",  "default",      RailWay,      0.3,   1.5,  "#999999", "#4d4d4d", 0.05),
    policy!("waterway", "river",        LinearWay,    0.05,  20.0, "#aad3df", "#3b5f6b", 0.02),
    policy!("waterway", "canal",        LinearWay,    0.05,  12.0, "#aad3df", "#3b5f6b", 0.02),
    policy!("waterway", "stream",       LinearWay,    0.05,  3.0,  "#aad3df", "#3b5f6b", 0.02),
    policy!("waterway", "default",      LinearWay,    0.05,  2.0,  "#aad3df", "#3b5f6b", 0.02),
    policy!("building", "yes",          ExtrudedArea, 10.0,  0.0,  "#d9d0c9", "#5c5550", 0.0),
    policy!("building", "house",        ExtrudedArea, 8.0,   0.0,  "#e0c8b0", "#5e5246", 0.0),
    policy!("building", "residential",  ExtrudedArea, 12.0,  0.0,  "#d9c0a8", "#5b4f44", 0.0),
    policy!("building", "apartments",   ExtrudedArea, 18.0,  0.0,  "#cfb9a3", "#574c42", 0.0),
    policy!("building", "commercial",   ExtrudedArea, 15.0,  0.0,  "#c7c7d9", "#4f4f5c", 0.0),
    policy!("building", "industrial",   ExtrudedArea, 10.0,  0.0,  "#c9bfb8", "#544e4a", 0.0),
    policy!("building", "church",       ExtrudedArea, 25.0,  0.0,  "#e6dccf", "#615a52", 0.0),
    policy!("building", "garage",       ExtrudedArea, 3.0,   0.0,  "#bbbbbb", "#4a4a4a", 0.0),
    policy!("building", "default",      ExtrudedArea, 10.0,  0.0,  "#d9d0c9", "#5c5550", 0.0),
    policy!("natural",  "water",        ExtrudedArea, 0.1,   0.0,  "#aad3df", "#3b5f6b", 0.02),
    policy!("natural",  "wood",         ExtrudedArea, 1.0,   0.0,  "#add19e", "#46583f", 0.01),
    policy!("natural",  "scrub",        ExtrudedArea, 0.5,   0.0,  "#c8d7ab", "#535b46", 0.01),
    policy!("landuse",  "forest",       ExtrudedArea, 1.0,   0.0,  "#add19e", "#46583f", 0.01),
    policy!("landuse",  "grass",        ExtrudedArea, 0.05,  0.0,  "#cdebb0", "#566349", 0.0),
    policy!("landuse",  "meadow",       ExtrudedArea, 0.05,  0.0,  "#cdebb0", "#566349", 0.0),
    policy!("landuse",  "farmland",     ExtrudedArea, 0.03,  0.0,  "#eef0d5", "#62635a", 0.0),
    policy!("landuse",  "residential",  ExtrudedArea, 0.02,  0.0,  "#e0dfdf", "#5d5d5d", 0.0),
    policy!("landuse",  "default",      ExtrudedArea, 0.01,  0.0,  "#e6e6e6", "#606060", 0.0),
    policy!("leisure",  "park",         ExtrudedArea, 0.05,  0.0,  "#c8facc", "#526854", 0.01),
    policy!("leisure",  "pitch",        ExtrudedArea, 0.08,  0.0,  "#aae0cb", "#476055", 0.01),
    policy!("leisure",  "garden",       ExtrudedArea, 0.05,  0.0,  "#cdebb0", "#566349", 0.01),
    policy!("amenity",  "parking",      ExtrudedArea, 0.06,  0.0,  "#eeeeee", "#666666", 0.01),
    policy!("boundary", "administrative", LinearWay,  0.0,   0.0,  "#8d618b", "#4a3349", 0.0),
];

/// The ordered list of policies. A list, not a map: the order decides ties.
#[derive(Clone, Debug, PartialEq)]
pub struct PolicyTable {
    policies: Vec<GeometryPolicy>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        let policies = DEFAULT_POLICIES
            .iter()
            .map(|entry| GeometryPolicy {
                tag_key: entry.key.to_string(),
                tag_value: entry.value.to_string(),
                kind: entry.kind,
                height: entry.height,
                width: entry.width,
                color_normal: parse_color(Some(entry.color), FALLBACK_COLOR),
                color_dark: parse_color(Some(entry.color_dark), FALLBACK_COLOR),
                y_offset: entry.y_offset,
            })
            .collect();
        Self { policies }
    }
}

impl PolicyTable {
    pub fn new(policies: Vec<GeometryPolicy>) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &[GeometryPolicy] {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Distinct tag keys in table order (used to build the query).
    /// Keys with only zero height entries are left out, they never produce geometry.
    pub fn tag_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for policy in self.policies.iter().filter(|policy| policy.is_extruded()) {
            if !keys.contains(&policy.tag_key.as_str()) {
                keys.push(&policy.tag_key);
            }
        }
        keys
    }

    /// The matching table entry, without tag overrides.
    ///
    /// First the exact `key=value` entries are scanned in table order, then the
    /// `default` entries of the present keys, again in table order.
    /// Zero height entries are never returned. `None` means: no policy applies.
    pub fn lookup(&self, tags: &Tags) -> Option<&GeometryPolicy> {
        let exact = self.policies.iter().find(|policy| {
            !policy.is_default()
                && policy.is_extruded()
                && tags.get(&policy.tag_key) == Some(&policy.tag_value)
        });
        if exact.is_some() {
            return exact;
        }

        self.policies.iter().find(|policy| {
            policy.is_default() && policy.is_extruded() && tags.contains_key(&policy.tag_key)
        })
    }

    /// The matching policy with its effective height (see [`effective_height`]).
    pub fn classify(&self, tags: &Tags) -> Option<GeometryPolicy> {
        let policy = self.lookup(tags)?;
        let mut classified = policy.clone();
        classified.height = effective_height(policy, tags);
        debug!(
            "classify: {}={} -> {:?} height {}",
            policy.tag_key,
            tags.get(&policy.tag_key).map(String::as_str).unwrap_or(""),
            policy.kind,
            classified.height
        );
        Some(classified)
    }
}

// Built once, the colors are parsed on first use
static BUILT_IN_TABLE: LazyLock<PolicyTable> = LazyLock::new(PolicyTable::default);

/// Classify an element by the built-in table. Rejects degenerate geometry first.
pub fn classify(element: &TaggedElement) -> SceneResult<Option<GeometryPolicy>> {
    check_geometry(element)?;
    Ok(BUILT_IN_TABLE.classify(&element.tags))
}

/// A path needs at least 2 points, a relation at least one such outer way.
pub fn check_geometry(element: &TaggedElement) -> SceneResult<()> {
    let points = match &element.geometry {
        ElementGeometry::Way(points) => points.len(),
        ElementGeometry::Relation(members) => members
            .iter()
            .filter(|member| member.role == MemberRole::Outer)
            .map(|member| member.points.len())
            .max()
            .unwrap_or(0),
    };
    if points < 2 {
        return Err(SceneError::DegenerateGeometry {
            id: element.id,
            points,
        });
    }
    Ok(())
}

/// Extruded areas may get their height from `height`/`building:height` or
/// `building:levels`. Such a height is clamped to `MIN..=MAX_EXTRUDE_HEIGHT`.
/// Anything else keeps the table height.
pub fn effective_height(policy: &GeometryPolicy, tags: &Tags) -> f32 {
    if policy.kind != StructuralKind::ExtrudedArea {
        return policy.height;
    }

    let tagged = parse_height(tags_get2(tags, "height", "building:height")).or_else(|| {
        parse_height(tags.get("building:levels").map(String::as_str))
            .map(|levels| levels * LEVEL_HEIGHT)
    });

    match tagged {
        Some(height) => height.clamp(MIN_EXTRUDE_HEIGHT, MAX_EXTRUDE_HEIGHT),
        None => policy.height,
    }
}

pub fn tags_get2<'a>(tags: &'a Tags, option1: &str, option2: &str) -> Option<&'a str> {
    tags.get(option1)
        .or_else(|| tags.get(option2))
        .map(String::as_str)
}

/// "12", "12.5", "12 m", "12m". Unparseable values are logged and ignored.
pub fn parse_height(height_option: Option<&str>) -> Option<f32> {
    let height = height_option?.trim();
    let height = height.strip_suffix('m').unwrap_or(height).trim();

    match height.parse::<f32>() {
        Ok(height) if height.is_finite() => Some(height),
        Ok(_) => None,
        Err(error) => {
            warn!("parse_height: {} for:{}:", error, height);
            None
        }
    }
}

pub fn parse_color(color: Option<&str>, default: RenderColor) -> RenderColor {
    // https://docs.rs/csscolorparser/latest/csscolorparser/
    let Some(color_string) = color else {
        return default;
    };

    match parse(color_string) {
        Ok(color_scc) => [
            color_scc.r as f32,
            color_scc.g as f32,
            color_scc.b as f32,
            color_scc.a as f32,
        ],

        Err(error) => match color_string {
            "stone" => color_to_f32(200, 200, 200),
            "brick" => color_to_f32(255, 128, 128),
            "cream" => color_to_f32(255, 253, 208),
            "glass" => color_to_f32(150, 150, 220),
            "wood" => color_to_f32(145, 106, 47),
            _ => {
                warn!("parse_colour: {} => {}", color_string, error);
                default
            }
        },
    }
}

fn color_to_f32(r: u8, g: u8, b: u8) -> RenderColor {
    [r as f32 / 255., g as f32 / 255., b as f32 / 255., 1.]
}
