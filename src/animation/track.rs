use crate::animation::ease::Ease;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Animation track family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// Translate between two positions.
    Move,
    /// Rotate between two angles (degrees).
    Rotate,
    /// Scale between two per-axis factors.
    Scale,
    /// Opacity ramp.
    Fade,
    /// Colour ramp on a named colour property.
    Color,
}

impl TrackKind {
    /// Every track kind, in declaration order.
    pub const ALL: [TrackKind; 5] = [
        TrackKind::Move,
        TrackKind::Rotate,
        TrackKind::Scale,
        TrackKind::Fade,
        TrackKind::Color,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Rotate => "rotate",
            Self::Scale => "scale",
            Self::Fade => "fade",
            Self::Color => "color",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract track as configured on an animation node.
///
/// Offsets are relative to the execution path's local time cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TrackDef {
    /// Key used in `Timeline.<key>.*` field paths; defaults to the kind name.
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(rename = "type")]
    pub(crate) kind: TrackKind,
    #[serde(default)]
    pub(crate) start_offset: f64,
    pub(crate) duration: f64,
    #[serde(default)]
    pub(crate) easing: Ease,
    #[serde(default)]
    pub(crate) properties: Map<String, Value>,
}

const START_OFFSET: &str = "start_offset";
const DURATION: &str = "duration";
const EASING: &str = "easing";

impl TrackDef {
    pub(crate) fn key(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.kind.as_str().to_owned())
    }

    pub(crate) fn end(&self) -> f64 {
        self.start_offset + self.duration
    }

    /// Flat JSON view addressed by `Timeline.<key>.<field>` paths.
    pub(crate) fn view(&self) -> Map<String, Value> {
        let mut m = self.properties.clone();
        m.insert(START_OFFSET.to_owned(), Value::from(self.start_offset));
        m.insert(DURATION.to_owned(), Value::from(self.duration));
        m.insert(
            EASING.to_owned(),
            serde_json::to_value(self.easing).unwrap_or(Value::Null),
        );
        m
    }

    /// Rebuild a track from a (possibly overridden) view.
    pub(crate) fn from_view(&self, mut view: Map<String, Value>) -> Result<Self, String> {
        let start_offset = take_f64(&mut view, START_OFFSET)?.unwrap_or(self.start_offset);
        let duration = take_f64(&mut view, DURATION)?.unwrap_or(self.duration);
        let easing = match view.remove(EASING) {
            Some(v) => serde_json::from_value(v).map_err(|e| format!("easing: {e}"))?,
            None => self.easing,
        };
        if !start_offset.is_finite() {
            return Err("start_offset must be finite".to_owned());
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err("duration must be finite and >= 0".to_owned());
        }
        Ok(Self {
            id: self.id.clone(),
            kind: self.kind,
            start_offset,
            duration,
            easing,
            properties: view,
        })
    }
}

fn take_f64(view: &mut Map<String, Value>, key: &str) -> Result<Option<f64>, String> {
    match view.remove(key) {
        None => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("{key} must be a number, got {v}")),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/track.rs"]
mod tests;
