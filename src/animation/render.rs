//! Track renderer table: one pure function per [`TrackKind`].

use crate::animation::track::{TrackDef, TrackKind};
use crate::foundation::color::parse_hex;
use crate::foundation::ids::NodeId;
use crate::scene::model::{ConcreteTrack, TrackProperties};
use kurbo::Vec2;
use serde_json::{Map, Value};

/// Builds the kind-specific endpoint payload of a track.
pub(crate) type TrackRenderFn = fn(&Map<String, Value>) -> Result<TrackProperties, String>;

/// Total mapping from track kind to renderer. Adding a kind means adding one row.
pub(crate) const RENDERERS: [(TrackKind, TrackRenderFn); 5] = [
    (TrackKind::Move, render_move),
    (TrackKind::Rotate, render_rotate),
    (TrackKind::Scale, render_scale),
    (TrackKind::Fade, render_fade),
    (TrackKind::Color, render_color),
];

pub(crate) fn renderer_for(kind: TrackKind) -> TrackRenderFn {
    RENDERERS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, f)| *f)
        .unwrap_or(render_unsupported)
}

/// Render `track` for `object_id`, baselined at the path's accumulated cursor.
///
/// No clamping happens here; scene bounds are checked after assembly.
pub(crate) fn render_track(
    track: &TrackDef,
    object_id: &NodeId,
    baseline: f64,
) -> Result<ConcreteTrack, String> {
    let properties = renderer_for(track.kind)(&track.properties)
        .map_err(|e| format!("{} track '{}': {e}", track.kind, track.key()))?;
    Ok(ConcreteTrack {
        object_id: object_id.clone(),
        kind: track.kind,
        start_time: baseline + track.start_offset,
        duration: track.duration,
        easing: track.easing,
        properties,
    })
}

fn render_unsupported(_: &Map<String, Value>) -> Result<TrackProperties, String> {
    Err("no renderer registered".to_owned())
}

fn render_move(p: &Map<String, Value>) -> Result<TrackProperties, String> {
    Ok(TrackProperties::Vector {
        from: vec2_field(p, "from", Vec2::ZERO)?,
        to: vec2_field(p, "to", Vec2::ZERO)?,
    })
}

fn render_scale(p: &Map<String, Value>) -> Result<TrackProperties, String> {
    let unit = Vec2::new(1.0, 1.0);
    Ok(TrackProperties::Vector {
        from: vec2_field(p, "from", unit)?,
        to: vec2_field(p, "to", unit)?,
    })
}

fn render_rotate(p: &Map<String, Value>) -> Result<TrackProperties, String> {
    let from = f64_field(p, "from", 0.0)?;
    let to = f64_field(p, "to", 0.0)?;
    Ok(TrackProperties::Angle {
        from,
        to,
        rotations: (to - from) / 360.0,
    })
}

fn render_fade(p: &Map<String, Value>) -> Result<TrackProperties, String> {
    Ok(TrackProperties::Scalar {
        from: f64_field(p, "from", 0.0)?,
        to: f64_field(p, "to", 1.0)?,
    })
}

fn render_color(p: &Map<String, Value>) -> Result<TrackProperties, String> {
    let property = match p.get("property") {
        None => "fillColor".to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(format!("property must be a string, got {other}")),
    };
    Ok(TrackProperties::Color {
        property,
        from: color_field(p, "from")?,
        to: color_field(p, "to")?,
    })
}

fn f64_field(p: &Map<String, Value>, key: &str, default: f64) -> Result<f64, String> {
    match p.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_f64()
            .filter(|x| x.is_finite())
            .ok_or_else(|| format!("{key} must be a finite number, got {v}")),
    }
}

/// Axes are read independently so a partially overridden endpoint keeps its other axis.
fn vec2_field(p: &Map<String, Value>, key: &str, default: Vec2) -> Result<Vec2, String> {
    match p.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Object(m)) => Ok(Vec2::new(
            f64_field(m, "x", default.x).map_err(|e| format!("{key}.{e}"))?,
            f64_field(m, "y", default.y).map_err(|e| format!("{key}.{e}"))?,
        )),
        Some(v) => Err(format!("{key} must be an {{x, y}} object, got {v}")),
    }
}

fn color_field(p: &Map<String, Value>, key: &str) -> Result<String, String> {
    match p.get(key) {
        Some(Value::String(s)) => parse_hex(s)
            .map(|c| c.to_hex())
            .map_err(|e| format!("{key}: {e}")),
        Some(v) => Err(format!("{key} must be a hex colour string, got {v}")),
        None => Err(format!("{key} is required")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/render.rs"]
mod tests;
