//! Turns delivered tokens into drawable objects and bounds-checks the final scene.

use crate::compile::diagnostics::{Diagnostic, DiagnosticCode};
use crate::compile::engine::Token;
use crate::foundation::color::parse_hex;
use crate::foundation::ids::NodeId;
use crate::graph::index::GraphIndex;
use crate::graph::node::{GeometryData, Node, NodeKind};
use crate::resolve::overrides::{CANVAS, ObjectScope};
use crate::resolve::resolver::ViewResolver;
use crate::scene::model::{ConcreteTrack, DrawableObject, ObjectTransform, OutputKind, Scene};
use kurbo::Vec2;
use serde_json::{Map, Value, json};

/// Track ends within this distance of the scene end count as in bounds.
const END_EPSILON: f64 = 1e-9;

/// Resolve the canvas view of a delivered instance into a drawable object.
pub(crate) fn materialize(
    index: &GraphIndex,
    token: &Token,
    resolver: &ViewResolver<'_>,
    notes: &mut Vec<Diagnostic>,
) -> Option<DrawableObject> {
    let node = index.node(token.origin);
    let NodeKind::Geometry(g) = &node.kind else {
        return None;
    };
    let view = canvas_view(g, &token.style, token.offset);
    let scope = ObjectScope::Object(token.instance.clone());
    let mut resolved = resolver.view(CANVAS, &view, &scope, notes);
    match take_transform(&mut resolved) {
        Ok(transform) => Some(DrawableObject {
            id: token.instance.clone(),
            origin: node.id.clone(),
            kind: g.shape.clone(),
            transform,
            properties: resolved,
            insert_time: token.insert_time,
        }),
        Err(msg) => {
            notes.push(
                Diagnostic::error(
                    DiagnosticCode::NodeValidationFailed,
                    format!("object '{}': {msg}", token.instance),
                )
                .with_nodes([node.id.clone()]),
            );
            None
        }
    }
}

/// Node-level canvas view: geometry properties, then text-style keys, then the transform.
pub(crate) fn canvas_view(
    g: &GeometryData,
    style: &Map<String, Value>,
    offset: Vec2,
) -> Map<String, Value> {
    let mut m = g.properties.clone();
    m.extend(style.iter().map(|(k, v)| (k.clone(), v.clone())));
    let position = g.position + offset;
    m.insert("position".to_owned(), json!({ "x": position.x, "y": position.y }));
    m.insert("rotation".to_owned(), json!(g.rotation));
    m.insert("scale".to_owned(), json!({ "x": g.scale.x, "y": g.scale.y }));
    m.insert("opacity".to_owned(), json!(g.opacity));
    m
}

/// Split the transform fields off a resolved canvas view; the rest stays as properties.
pub(crate) fn take_transform(view: &mut Map<String, Value>) -> Result<ObjectTransform, String> {
    let position = take_vec2(view, "position", Vec2::ZERO)?;
    let scale = take_vec2(view, "scale", Vec2::new(1.0, 1.0))?;
    let rotation = take_number(view.remove("rotation"), "rotation", 0.0)?;
    let opacity = take_number(view.remove("opacity"), "opacity", 1.0)?;
    Ok(ObjectTransform {
        position,
        rotation,
        scale,
        opacity,
    })
}

fn take_vec2(view: &mut Map<String, Value>, key: &str, default: Vec2) -> Result<Vec2, String> {
    match view.remove(key) {
        None => Ok(default),
        Some(Value::Object(mut m)) => Ok(Vec2::new(
            take_number(m.remove("x"), &format!("{key}.x"), default.x)?,
            take_number(m.remove("y"), &format!("{key}.y"), default.y)?,
        )),
        Some(v) => Err(format!("{key} must be an {{x, y}} object, got {v}")),
    }
}

fn take_number(v: Option<Value>, field: &str, default: f64) -> Result<f64, String> {
    match v {
        None => Ok(default),
        Some(v) => v
            .as_f64()
            .filter(|x| x.is_finite())
            .ok_or_else(|| format!("{field} must be a finite number, got {v}")),
    }
}

/// Build the scene from materialized objects and tracks.
///
/// Video duration stretches to the latest track end; image duration is locked, so later tracks
/// are reported as trailing. Out-of-bounds tracks are kept and reported, never truncated.
pub(crate) fn assemble_scene(
    terminal: &Node,
    mut objects: Vec<DrawableObject>,
    mut tracks: Vec<ConcreteTrack>,
    notes: &mut Vec<Diagnostic>,
) -> Option<Scene> {
    let (data, output) = match &terminal.kind {
        NodeKind::Scene(s) => (s, OutputKind::Video),
        NodeKind::Frame(s) => (s, OutputKind::Image),
        _ => return None,
    };

    objects.sort_by(|a, b| a.id.cmp(&b.id));
    let rank = |id: &NodeId| {
        objects
            .binary_search_by(|o| o.id.cmp(id))
            .unwrap_or(usize::MAX)
    };
    tracks.sort_by(|a, b| {
        rank(&a.object_id)
            .cmp(&rank(&b.object_id))
            .then(a.start_time.total_cmp(&b.start_time))
    });

    let latest_end = tracks
        .iter()
        .map(ConcreteTrack::end_time)
        .fold(0.0f64, f64::max);
    let duration = match output {
        OutputKind::Video => data.duration.max(latest_end),
        OutputKind::Image => data.duration,
    };

    for t in &tracks {
        if t.start_time < 0.0 {
            notes.push(
                Diagnostic::warning(
                    DiagnosticCode::SceneValidationFailed,
                    format!(
                        "{} track of '{}' starts at {}s, before the scene starts",
                        t.kind, t.object_id, t.start_time
                    ),
                )
                .with_nodes([t.object_id.clone()]),
            );
        }
        if t.end_time() > duration + END_EPSILON {
            notes.push(
                Diagnostic::warning(
                    DiagnosticCode::SceneValidationFailed,
                    format!(
                        "{} track of '{}' ends at {}s, after the {duration}s scene ends",
                        t.kind,
                        t.object_id,
                        t.end_time()
                    ),
                )
                .with_nodes([t.object_id.clone()])
                .suggest("shorten the track or raise the frame duration"),
            );
        }
    }

    let background = parse_hex(&data.background)
        .map(|c| c.to_hex())
        .unwrap_or_else(|_| data.background.clone());

    Some(Scene {
        output,
        duration,
        width: data.width,
        height: data.height,
        fps: data.fps,
        background,
        video: data.video.clone(),
        objects,
        animations: tracks,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compile/assemble.rs"]
mod tests;
