use crate::animation::track::TrackDef;
use crate::foundation::error::{NodeflowError, NodeflowResult};
use crate::foundation::ids::NodeId;
use crate::graph::model::NodeDef;
use kurbo::Vec2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Typed node parsed from a [`NodeDef`].
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Geometry(GeometryData),
    Insert(InsertData),
    Filter(FilterData),
    Merge(MergeData),
    Constant(ConstantData),
    Result(ResultData),
    Animation(AnimationData),
    TextStyle(TextStyleData),
    Scene(SceneData),
    Frame(SceneData),
    Comparison(ComparisonData),
    Boolean(BooleanData),
    Math(MathData),
    Duplicate(DuplicateData),
    Unknown(String),
}

impl Node {
    pub(crate) fn parse(def: &NodeDef) -> NodeflowResult<Self> {
        let kind = match def.kind.as_str() {
            "geometry" => NodeKind::Geometry(payload(def)?),
            "insert" => NodeKind::Insert(payload(def)?),
            "filter" => NodeKind::Filter(payload(def)?),
            "merge" => NodeKind::Merge(payload(def)?),
            "constant" => NodeKind::Constant(payload(def)?),
            "result" => NodeKind::Result(payload(def)?),
            "animation" => NodeKind::Animation(payload(def)?),
            "text_style" => NodeKind::TextStyle(payload(def)?),
            "scene" => NodeKind::Scene(payload(def)?),
            "frame" => NodeKind::Frame(payload(def)?),
            "comparison" => NodeKind::Comparison(payload(def)?),
            "boolean" => NodeKind::Boolean(payload(def)?),
            "math" => NodeKind::Math(payload(def)?),
            "duplicate" => NodeKind::Duplicate(payload(def)?),
            other => NodeKind::Unknown(other.to_owned()),
        };
        Ok(Self {
            id: def.id.clone(),
            name: def.name.clone(),
            kind,
        })
    }

    pub(crate) fn is_drawable(&self) -> bool {
        matches!(self.kind, NodeKind::Geometry(_))
    }

    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Scene(_) | NodeKind::Frame(_))
    }

    pub(crate) fn is_merge(&self) -> bool {
        matches!(self.kind, NodeKind::Merge(_))
    }

    pub(crate) fn is_result(&self) -> bool {
        matches!(self.kind, NodeKind::Result(_))
    }

    /// Value nodes carry data, never drawable objects.
    pub(crate) fn is_value_node(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Constant(_)
                | NodeKind::Result(_)
                | NodeKind::Comparison(_)
                | NodeKind::Boolean(_)
                | NodeKind::Math(_)
        )
    }

    /// Users can rename these; their display names must be unique.
    pub(crate) fn is_renamable(&self) -> bool {
        self.is_result()
    }

    pub(crate) fn type_name(&self) -> &str {
        match &self.kind {
            NodeKind::Geometry(_) => "geometry",
            NodeKind::Insert(_) => "insert",
            NodeKind::Filter(_) => "filter",
            NodeKind::Merge(_) => "merge",
            NodeKind::Constant(_) => "constant",
            NodeKind::Result(_) => "result",
            NodeKind::Animation(_) => "animation",
            NodeKind::TextStyle(_) => "text_style",
            NodeKind::Scene(_) => "scene",
            NodeKind::Frame(_) => "frame",
            NodeKind::Comparison(_) => "comparison",
            NodeKind::Boolean(_) => "boolean",
            NodeKind::Math(_) => "math",
            NodeKind::Duplicate(_) => "duplicate",
            NodeKind::Unknown(t) => t,
        }
    }

    /// Payload problems that make the node unusable for compilation.
    pub(crate) fn problems(&self) -> Vec<String> {
        let mut out = Vec::new();
        match &self.kind {
            NodeKind::Geometry(g) => {
                let nums = [
                    ("position.x", g.position.x),
                    ("position.y", g.position.y),
                    ("rotation", g.rotation),
                    ("scale.x", g.scale.x),
                    ("scale.y", g.scale.y),
                    ("opacity", g.opacity),
                ];
                for (field, v) in nums {
                    if !v.is_finite() {
                        out.push(format!("{field} must be finite"));
                    }
                }
            }
            NodeKind::Insert(i) => {
                if !i.delay.is_finite() || i.delay < 0.0 {
                    out.push("delay must be finite and >= 0".to_owned());
                }
            }
            NodeKind::Merge(m) => {
                if m.input_count == 0 {
                    out.push("input_count must be > 0".to_owned());
                }
            }
            NodeKind::Animation(a) => {
                if let Some(d) = a.duration
                    && (!d.is_finite() || d < 0.0)
                {
                    out.push("duration must be finite and >= 0".to_owned());
                }
                let mut keys = std::collections::BTreeSet::new();
                for (i, t) in a.tracks.iter().enumerate() {
                    if !t.start_offset.is_finite() {
                        out.push(format!("tracks[{i}].start_offset must be finite"));
                    }
                    if !t.duration.is_finite() || t.duration < 0.0 {
                        out.push(format!("tracks[{i}].duration must be finite and >= 0"));
                    }
                    if !keys.insert(t.key()) {
                        out.push(format!("tracks[{i}]: duplicate track id '{}'", t.key()));
                    }
                }
            }
            NodeKind::Scene(s) | NodeKind::Frame(s) => {
                if s.width == 0 || s.height == 0 {
                    out.push("canvas width/height must be > 0".to_owned());
                }
                if !s.fps.is_finite() || s.fps <= 0.0 {
                    out.push("fps must be finite and > 0".to_owned());
                }
                if !s.duration.is_finite() || s.duration < 0.0 {
                    out.push("duration must be finite and >= 0".to_owned());
                }
            }
            NodeKind::Duplicate(d) => {
                if !d.offset.x.is_finite() || !d.offset.y.is_finite() {
                    out.push("offset must be finite".to_owned());
                }
            }
            NodeKind::Filter(_)
            | NodeKind::Constant(_)
            | NodeKind::Result(_)
            | NodeKind::TextStyle(_)
            | NodeKind::Comparison(_)
            | NodeKind::Boolean(_)
            | NodeKind::Math(_)
            | NodeKind::Unknown(_) => {}
        }
        out
    }
}

fn payload<T: DeserializeOwned>(def: &NodeDef) -> NodeflowResult<T> {
    let data = if def.data.is_null() {
        Value::Object(Map::new())
    } else {
        def.data.clone()
    };
    serde_json::from_value(data)
        .map_err(|e| NodeflowError::payload(def.id.as_str(), format!("{} node: {e}", def.kind)))
}

/// Drawable shape family. Unrecognised names pass through for future shape types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShapeKind {
    /// Triangle.
    Triangle,
    /// Circle.
    Circle,
    /// Rectangle.
    Rectangle,
    /// Any other shape name.
    Other(String),
}

impl From<String> for ShapeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "triangle" => Self::Triangle,
            "circle" => Self::Circle,
            "rectangle" => Self::Rectangle,
            _ => Self::Other(s),
        }
    }
}

impl From<ShapeKind> for String {
    fn from(k: ShapeKind) -> Self {
        k.to_string()
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triangle => f.write_str("triangle"),
            Self::Circle => f.write_str("circle"),
            Self::Rectangle => f.write_str("rectangle"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GeometryData {
    pub(crate) shape: ShapeKind,
    #[serde(default)]
    pub(crate) position: Vec2,
    #[serde(default)]
    pub(crate) rotation: f64,
    #[serde(default = "unit_scale")]
    pub(crate) scale: Vec2,
    #[serde(default = "one")]
    pub(crate) opacity: f64,
    #[serde(default)]
    pub(crate) properties: Map<String, Value>,
}

fn unit_scale() -> Vec2 {
    Vec2::new(1.0, 1.0)
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum InsertMode {
    #[default]
    Always,
    Never,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InsertData {
    #[serde(default)]
    pub(crate) mode: InsertMode,
    #[serde(default)]
    pub(crate) delay: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FilterData {
    /// `None` selects every object.
    #[serde(default)]
    pub(crate) objects: Option<Vec<NodeId>>,
    #[serde(default)]
    pub(crate) invert: bool,
}

impl FilterData {
    pub(crate) fn admits(&self, object: &NodeId) -> bool {
        let selected = match &self.objects {
            Some(ids) => ids.contains(object),
            None => true,
        };
        selected != self.invert
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MergeData {
    #[serde(default = "default_merge_inputs")]
    pub(crate) input_count: u32,
}

fn default_merge_inputs() -> u32 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConstantData {
    pub(crate) value: Value,
}

/// Declared type of a result-sink variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Finite number.
    Number,
    /// Boolean.
    Bool,
    /// Hex colour string.
    Color,
    /// Free text.
    Text,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResultData {
    #[serde(default)]
    pub(crate) value_type: Option<ValueType>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AnimationData {
    #[serde(default)]
    pub(crate) tracks: Vec<TrackDef>,
    /// Explicit node duration; defaults to the latest track end.
    #[serde(default)]
    pub(crate) duration: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TextStyleData {
    #[serde(default)]
    pub(crate) style: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SceneData {
    pub(crate) width: u32,
    pub(crate) height: u32,
    #[serde(default = "default_fps")]
    pub(crate) fps: f64,
    #[serde(default = "default_background")]
    pub(crate) background: String,
    #[serde(default)]
    pub(crate) duration: f64,
    /// Promote missing-insert reports from warnings to errors.
    #[serde(default)]
    pub(crate) require_insert: bool,
    /// Codec parameters, passed through untouched.
    #[serde(default)]
    pub(crate) video: Option<Value>,
}

fn default_fps() -> f64 {
    30.0
}

fn default_background() -> String {
    "#000000".to_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ComparisonData {
    pub(crate) op: CompareOp,
    #[serde(default)]
    pub(crate) a: Option<Value>,
    #[serde(default)]
    pub(crate) b: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum BoolOp {
    And,
    Or,
    Not,
    Xor,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BooleanData {
    pub(crate) op: BoolOp,
    #[serde(default)]
    pub(crate) a: Option<bool>,
    #[serde(default)]
    pub(crate) b: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MathData {
    pub(crate) op: MathOp,
    #[serde(default)]
    pub(crate) a: Option<f64>,
    #[serde(default)]
    pub(crate) b: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DuplicateData {
    pub(crate) count: u32,
    #[serde(default)]
    pub(crate) offset: Vec2,
}

#[cfg(test)]
#[path = "../../tests/unit/graph/node.rs"]
mod tests;
