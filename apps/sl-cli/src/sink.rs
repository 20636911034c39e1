//! Text render sink: keeps the latest state of every live renderable.

use std::collections::BTreeMap;

use sl_sim::{RenderSink, RenderableId, Update};

#[derive(Debug, Default)]
pub struct TextSink {
    next_id: u32,
    live: BTreeMap<RenderableId, (String, Update)>,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Text labels currently on screen, in spawn order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.live
            .values()
            .filter_map(|(name, update)| update.text.as_deref().map(|text| (name.as_str(), text)))
    }
}

impl RenderSink for TextSink {
    fn spawn(&mut self, name: &str) -> RenderableId {
        self.next_id += 1;
        let id = RenderableId(self.next_id);
        self.live.insert(id, (name.to_string(), Update::default()));
        id
    }

    fn update(&mut self, id: RenderableId, update: &Update) {
        let Some((_, last)) = self.live.get_mut(&id) else {
            tracing::warn!(?id, "update for unknown renderable");
            return;
        };
        if let Some(position) = update.position {
            last.position = Some(position);
        }
        if let Some(scale) = update.scale {
            last.scale = Some(scale);
        }
        if let Some(color) = update.color {
            last.color = Some(color);
        }
        if let Some(text) = &update.text {
            last.text = Some(text.clone());
        }
    }

    fn despawn(&mut self, id: RenderableId) {
        self.live.remove(&id);
    }
}
