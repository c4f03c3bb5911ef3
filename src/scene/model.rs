use crate::animation::ease::Ease;
use crate::animation::track::TrackKind;
use crate::foundation::ids::NodeId;
use crate::graph::node::ShapeKind;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output medium selected by the terminal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// `scene` terminal: a timed video.
    Video,
    /// `frame` terminal: a single still image.
    Image,
}

/// Compiled scene document consumed by the renderer and the editor UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// Output medium.
    pub output: OutputKind,
    /// Total duration in seconds.
    pub duration: f64,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: f64,
    /// Background colour.
    pub background: String,
    /// Codec parameters copied from the terminal node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Value>,
    /// Drawable objects, ordered by id.
    pub objects: Vec<DrawableObject>,
    /// Concrete tracks in absolute time, ordered by object then start time.
    pub animations: Vec<ConcreteTrack>,
}

impl Scene {
    /// Look up an object by id.
    pub fn object(&self, id: &str) -> Option<&DrawableObject> {
        self.objects.iter().find(|o| o.id.as_str() == id)
    }

    /// All tracks attached to `object_id`.
    pub fn tracks_for<'a>(&'a self, object_id: &'a str) -> impl Iterator<Item = &'a ConcreteTrack> {
        self.animations
            .iter()
            .filter(move |t| t.object_id.as_str() == object_id)
    }
}

/// Initial transform of a drawable object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    /// Position in canvas pixels.
    pub position: Vec2,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Per-axis scale factor.
    pub scale: Vec2,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
}

/// One shape instance in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawableObject {
    /// Unique object id; the geometry node id, or `<instance>#<duplicate node>.<n>` for duplicates.
    pub id: NodeId,
    /// Geometry node the object originates from.
    pub origin: NodeId,
    /// Shape family.
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    /// Initial transform.
    pub transform: ObjectTransform,
    /// Type-specific geometry properties (colours, sizes).
    pub properties: Map<String, Value>,
    /// Absolute time at which an insert node placed the object, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_time: Option<f64>,
}

/// Track rendered to absolute scene time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcreteTrack {
    /// Object this track animates.
    pub object_id: NodeId,
    /// Track family.
    #[serde(rename = "type")]
    pub kind: TrackKind,
    /// Absolute start time in seconds.
    pub start_time: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Easing applied to progress.
    pub easing: Ease,
    /// Kind-specific endpoint values.
    pub properties: TrackProperties,
}

impl ConcreteTrack {
    /// Absolute end time.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Eased progress in `[0, 1]` at absolute `time`.
    ///
    /// Zero-length tracks jump to `1.0` at their start time.
    pub fn progress_at(&self, time: f64) -> f64 {
        if self.duration <= 0.0 {
            return if time >= self.start_time { 1.0 } else { 0.0 };
        }
        self.easing
            .apply((time - self.start_time) / self.duration)
    }
}

/// Endpoint payload of a concrete track. The shape is selected by [`TrackKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackProperties {
    /// `color` tracks.
    Color {
        /// Colour property being animated, e.g. `fillColor`.
        property: String,
        /// Start colour.
        from: String,
        /// End colour.
        to: String,
    },
    /// `rotate` tracks.
    Angle {
        /// Start angle in degrees.
        from: f64,
        /// End angle in degrees.
        to: f64,
        /// Full turns covered, `(to - from) / 360`.
        rotations: f64,
    },
    /// `move` and `scale` tracks.
    Vector {
        /// Start value.
        from: Vec2,
        /// End value.
        to: Vec2,
    },
    /// `fade` tracks.
    Scalar {
        /// Start value.
        from: f64,
        /// End value.
        to: f64,
    },
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
