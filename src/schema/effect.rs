use serde::{Deserialize, Serialize};

use super::actor::ActorId;
use super::location::{BucketKey, MapId, WorldPos};

/// Linear RGBA text colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(0.9, 0.2, 0.2);
    pub const ORANGE: Color = Color::rgb(1.0, 0.6, 0.2);
    pub const YELLOW: Color = Color::rgb(1.0, 0.9, 0.4);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Initial motion given to thrown text so stacked motes fan out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drift {
    /// Heading in degrees.
    pub angle: f32,
    /// World units per tick.
    pub speed: f32,
}

/// A free-floating text mote ready to be spawned by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingText {
    pub map: MapId,
    pub pos: WorldPos,
    pub text: String,
    pub color: Color,
    /// Seconds before the mote starts to fade; `None` keeps the host default.
    pub fade_delay: Option<f32>,
    pub drift: Option<Drift>,
    pub label_background: bool,
}

impl FloatingText {
    pub fn new(map: MapId, pos: WorldPos, text: impl Into<String>) -> Self {
        Self {
            map,
            pos,
            text: text.into(),
            color: Color::WHITE,
            fade_delay: None,
            drift: None,
            label_background: true,
        }
    }

    pub fn bucket(&self) -> BucketKey {
        BucketKey::new(self.map, self.pos.cell())
    }
}

/// How a text effect is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TextEffect {
    /// Follows its owner around. Never queued.
    Attached {
        owner: ActorId,
        text: String,
        color: Color,
        fade_delay: Option<f32>,
    },
    /// Thrown at a fixed spot, staggered with other text in the same cell.
    Floating(FloatingText),
}

impl TextEffect {
    pub fn text(&self) -> &str {
        match self {
            Self::Attached { text, .. } => text,
            Self::Floating(mote) => &mote.text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::location::Cell;

    #[test]
    fn floating_text_bucket_uses_cell() {
        let mote = FloatingText::new(MapId(1), WorldPos::new(4.7, 0.0, 9.2), "Ow!");
        assert_eq!(mote.bucket(), BucketKey::new(MapId(1), Cell::new(4, 9)));
    }

    #[test]
    fn floating_text_defaults() {
        let mote = FloatingText::new(MapId(0), WorldPos::new(0.0, 0.0, 0.0), "Ow!");
        assert_eq!(mote.color, Color::WHITE);
        assert!(mote.fade_delay.is_none());
        assert!(mote.drift.is_none());
        assert!(mote.label_background);
    }

    #[test]
    fn text_effect_text() {
        let attached = TextEffect::Attached {
            owner: ActorId(3),
            text: "Cover me!".to_string(),
            color: Color::WHITE,
            fade_delay: None,
        };
        assert_eq!(attached.text(), "Cover me!");

        let floating =
            TextEffect::Floating(FloatingText::new(MapId(0), WorldPos::new(1.0, 0.0, 1.0), "-12"));
        assert_eq!(floating.text(), "-12");
    }
}
