//! DisplayTopologyController: the screen → display projection.
//!
//! Each eligible screen is projected as exactly one [`DisplayEntity`].  The
//! controller never reads the rendering surface; it re-derives displays from
//! the screen registry whenever the screen layer reports a change.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use dms_core::{ChangeEvent, DisplayEntity, DisplayId, DisplayInfo, ScreenId};

use crate::application::screen_topology::ScreenTopologyController;

#[derive(Debug, Default)]
pub struct DisplayTopologyController {
    displays: BTreeMap<DisplayId, DisplayEntity>,
    by_screen: HashMap<ScreenId, DisplayId>,
    next_display_id: u64,
}

impl DisplayTopologyController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates, updates or destroys the display of `id` so that it matches
    /// the screen topology, returning the resulting change events.
    pub fn sync_screen(&mut self, screens: &ScreenTopologyController, id: ScreenId) -> Vec<ChangeEvent> {
        let screen = screens
            .screen(id)
            .filter(|_| screens.is_display_eligible(id));

        match (self.by_screen.get(&id).copied(), screen) {
            (Some(display_id), Some(screen)) => {
                let Some(entity) = self.displays.get_mut(&display_id) else {
                    return Vec::new();
                };
                match entity.update_from(screen) {
                    Some(event) => {
                        let info = entity.to_info();
                        debug!(%display_id, ?event, "display changed");
                        vec![ChangeEvent::DisplayChanged {
                            info,
                            event,
                        }]
                    }
                    None => Vec::new(),
                }
            }
            (Some(display_id), None) => self.destroy(display_id),
            (None, Some(screen)) => {
                let display_id = DisplayId(self.next_display_id);
                self.next_display_id += 1;
                let entity = DisplayEntity::from_screen(display_id, screen);
                let (width, height) = (entity.width, entity.height);
                info!(%display_id, screen_id = %id, width, height, "display created");
                let info = entity.to_info();
                self.displays.insert(display_id, entity);
                self.by_screen.insert(id, display_id);
                vec![ChangeEvent::DisplayCreated(info)]
            }
            (None, None) => Vec::new(),
        }
    }

    pub fn on_screen_disconnected(&mut self, id: ScreenId) -> Vec<ChangeEvent> {
        match self.by_screen.get(&id).copied() {
            Some(display_id) => self.destroy(display_id),
            None => Vec::new(),
        }
    }

    fn destroy(&mut self, display_id: DisplayId) -> Vec<ChangeEvent> {
        let Some(mut entity) = self.displays.remove(&display_id) else {
            return Vec::new();
        };
        entity.alive = false;
        let screen_id = entity.screen_id;
        self.by_screen.remove(&screen_id);
        info!(%display_id, %screen_id, "display destroyed");
        vec![ChangeEvent::DisplayDestroyed(display_id)]
    }

    pub fn display(&self, id: DisplayId) -> Option<DisplayInfo> {
        self.displays.get(&id).map(DisplayEntity::to_info)
    }

    pub fn all_display_ids(&self) -> Vec<DisplayId> {
        self.displays.keys().copied().collect()
    }

    /// Display bound to the topology's default screen.
    pub fn default_display_id(&self, screens: &ScreenTopologyController) -> Option<DisplayId> {
        screens
            .default_screen_id()
            .and_then(|id| self.display_id_for_screen(id))
    }

    pub fn display_id_for_screen(&self, id: ScreenId) -> Option<DisplayId> {
        self.by_screen.get(&id).copied()
    }

    pub fn screen_id_for_display(&self, id: DisplayId) -> Option<ScreenId> {
        self.displays.get(&id).map(|d| d.screen_id)
    }
}
