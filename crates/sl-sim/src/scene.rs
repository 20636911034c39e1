//! Render sink seam and per-run scene generations.
//!
//! The core never draws anything. It pushes position/scale/color/text updates
//! to a [`RenderSink`] once per tick. All renderables created for one run are
//! owned by a [`SceneGeneration`], which is released as a unit before the next
//! run builds its own.

use serde::Serialize;
use sl_core::Real;

use crate::session::Session;

/// Linear RGB color with components in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rgb {
    pub r: Real,
    pub g: Real,
    pub b: Real,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const GRAY: Rgb = Rgb::new(0.5, 0.5, 0.5);
    pub const CYAN: Rgb = Rgb::new(0.0, 1.0, 1.0);
    pub const BLUE: Rgb = Rgb::new(0.0, 0.0, 1.0);
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
    pub const ORANGE: Rgb = Rgb::new(1.0, 0.6, 0.0);
    pub const YELLOW: Rgb = Rgb::new(1.0, 1.0, 0.0);

    pub const fn new(r: Real, g: Real, b: Real) -> Self {
        Self { r, g, b }
    }

    /// Blue (zero) to red (`c_max` and above) ramp used for concentrations.
    pub fn concentration(c: Real, c_max: Real) -> Self {
        let ratio = sl_core::guarded_div(c, c_max).clamp(0.0, 1.0);
        Self::new(ratio, 0.4 + 0.4 * (1.0 - ratio), 1.0 - ratio)
    }
}

/// Partial update of one renderable. `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Update {
    pub position: Option<[Real; 3]>,
    pub scale: Option<Real>,
    pub color: Option<Rgb>,
    pub text: Option<String>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, position: [Real; 3]) -> Self {
        self.position = Some(position);
        self
    }

    pub fn scaled(mut self, scale: Real) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn colored(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Derived display quantity (volume, source voltage, energy, ...).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Readout {
    pub name: String,
    pub value: Real,
    pub unit: &'static str,
}

impl Readout {
    pub fn new(name: impl Into<String>, value: Real, unit: &'static str) -> Self {
        Self {
            name: name.into(),
            value,
            unit,
        }
    }
}

/// Handle issued by a sink for one live renderable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableId(pub u32);

/// External visualization collaborator.
pub trait RenderSink {
    /// Create a renderable and return its handle.
    fn spawn(&mut self, name: &str) -> RenderableId;

    /// Apply a position/scale/color/text update.
    fn update(&mut self, id: RenderableId, update: &Update);

    /// Hide/delete a renderable. The handle is dead afterwards.
    fn despawn(&mut self, id: RenderableId);
}

/// All renderables created for one run.
#[derive(Debug, Default)]
pub struct SceneGeneration {
    entries: Vec<(String, RenderableId)>,
}

impl SceneGeneration {
    /// Spawn the session model's layout and draw the current state.
    pub fn build<S: RenderSink + ?Sized>(sink: &mut S, session: &Session) -> Self {
        let entries = session
            .model()
            .scene_layout()
            .into_iter()
            .map(|(name, update)| {
                let id = sink.spawn(&name);
                sink.update(id, &update);
                (name, id)
            })
            .collect();
        let generation = Self { entries };
        generation.present(sink, session);
        generation
    }

    /// Push the per-tick updates for the session's current state.
    pub fn present<S: RenderSink + ?Sized>(&self, sink: &mut S, session: &Session) {
        let frame = session.model().scene_frame(session.t(), session.state());
        for (name, update) in frame {
            if let Some(id) = self.lookup(&name) {
                sink.update(id, &update);
            }
        }
    }

    /// Despawn every renderable of this generation.
    pub fn release<S: RenderSink + ?Sized>(self, sink: &mut S) {
        for (_, id) in self.entries {
            sink.despawn(id);
        }
    }

    pub fn lookup(&self, name: &str) -> Option<RenderableId> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
