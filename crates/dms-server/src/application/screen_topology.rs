//! ScreenTopologyController: the single source of truth for which screens
//! exist and how they are grouped.
//!
//! The controller owns every [`ScreenEntity`] and [`ScreenGroup`] in two
//! id-keyed registries.  Groups store child ids; children store their group
//! id.  Nothing else in the service holds a screen.
//!
//! # Groups and display nodes (for beginners)
//!
//! Every screen draws through one *display node* in the rendering surface's
//! node tree.  How that node is attached depends on the screen's group:
//!
//! ```text
//!   root
//!    ├── node(screen 0)                 ALONE group: attached at the root
//!    └── container(group 7)             EXPAND / MIRROR group
//!         ├── node(screen 3) @ (0,0)
//!         └── node(screen 4) @ (1920,0) mirrored nodes copy the source node
//! ```
//!
//! Moving a screen between groups always detaches it from the old group
//! (dropping its node) before it joins the new one, so a screen is never a
//! child of two groups.
//!
//! # Return values
//!
//! Mutating methods return the [`TopologyEvent`]s they caused instead of
//! calling back into the display layer.  The caller applies them to the
//! display projection under the same lock, then publishes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use dms_core::{
    ColorGamut, DmError, DmResult, GamutMap, Orientation, Point, ScreenChangeEvent,
    ScreenCombination, ScreenEntity, ScreenGroup, ScreenGroupChangeEvent, ScreenGroupInfo,
    ScreenId, ScreenIdManager, ScreenInfo, ScreenMode, ScreenProperty, ScreenType,
    SurfaceHandle, SurfaceScreenId, VirtualScreenOption,
};

use crate::infrastructure::render_surface::{BackendStatus, DisplayNodeConfig, RenderSurface};

/// Refresh rate given to the single mode of a virtual screen.
pub const VIRTUAL_SCREEN_REFRESH_RATE: u32 = 60;

/// Status reported when the backend refuses to create a virtual screen.
const VIRTUAL_SCREEN_CREATE_FAILED: BackendStatus = -1;

/// A topology change the display layer and listeners must hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyEvent {
    Connected(ScreenId),
    Disconnected(ScreenId),
    Changed {
        id: ScreenId,
        event: ScreenChangeEvent,
    },
    GroupChanged {
        ids: Vec<ScreenId>,
        event: ScreenGroupChangeEvent,
    },
}

#[derive(Debug, Clone)]
pub struct TopologyOptions {
    /// Virtual pixel ratio given to newly connected real screens.
    pub default_virtual_pixel_ratio: f32,
    /// Panels that only contribute a physical property and never become a
    /// screen of their own (the inactive panel of a foldable device).
    pub shadow_surfaces: Vec<SurfaceScreenId>,
    /// Panel whose screen follows the fold display mode.
    pub fold_bound_surface: Option<SurfaceScreenId>,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            default_virtual_pixel_ratio: 1.0,
            shadow_surfaces: Vec::new(),
            fold_bound_surface: None,
        }
    }
}

pub struct ScreenTopologyController {
    render: Arc<dyn RenderSurface>,
    ids: ScreenIdManager,
    screens: BTreeMap<ScreenId, ScreenEntity>,
    groups: BTreeMap<ScreenId, ScreenGroup>,
    default_screen: Option<ScreenId>,
    options: TopologyOptions,
    physical_properties: HashMap<SurfaceScreenId, ScreenProperty>,
}

impl ScreenTopologyController {
    pub fn new(render: Arc<dyn RenderSurface>, options: TopologyOptions) -> Self {
        Self {
            render,
            ids: ScreenIdManager::new(),
            screens: BTreeMap::new(),
            groups: BTreeMap::new(),
            default_screen: None,
            options,
            physical_properties: HashMap::new(),
        }
    }

    // ── Surface events ────────────────────────────────────────────────────────

    /// Registers the screen behind `surface_id`.
    ///
    /// A surface reporting no modes, or an active index outside its mode
    /// list, is not ready: the event is logged and dropped.
    pub fn on_surface_screen_connected(&mut self, surface_id: SurfaceScreenId) -> Vec<TopologyEvent> {
        if self.ids.has_surface_id(surface_id) {
            debug!(%surface_id, "surface already mapped; ignoring reconnect");
            return Vec::new();
        }

        let modes = self.render.supported_modes(surface_id);
        let Some(active) = self
            .render
            .active_mode(surface_id)
            .filter(|index| *index < modes.len())
        else {
            error!(
                %surface_id,
                mode_count = modes.len(),
                "surface reports no usable active mode; screen not ready"
            );
            return Vec::new();
        };

        if self.options.shadow_surfaces.contains(&surface_id) {
            let property = ScreenProperty::from(modes[active]);
            self.physical_properties.entry(surface_id).or_insert(property);
            info!(%surface_id, "fold panel connected; recorded physical property only");
            return Vec::new();
        }
        if self.options.fold_bound_surface == Some(surface_id) {
            let property = ScreenProperty::from(modes[active]);
            self.physical_properties.entry(surface_id).or_insert(property);
        }

        match self.register_screen(surface_id, ScreenType::Real, modes, active) {
            Ok(id) => vec![TopologyEvent::Connected(id)],
            Err(e) => {
                error!(%surface_id, error = %e, "failed to register screen");
                Vec::new()
            }
        }
    }

    pub fn on_surface_screen_disconnected(&mut self, surface_id: SurfaceScreenId) -> Vec<TopologyEvent> {
        match self.ids.to_service_id(surface_id) {
            Some(id) => self.remove_screen(id),
            None => {
                debug!(%surface_id, "disconnect for unknown surface");
                Vec::new()
            }
        }
    }

    /// Re-reads the modes of a panel after the backend reported a change.
    pub fn on_surface_screen_mode_changed(&mut self, surface_id: SurfaceScreenId) -> Vec<TopologyEvent> {
        let modes = self.render.supported_modes(surface_id);
        let active = self.render.active_mode(surface_id);

        let Some(id) = self.ids.to_service_id(surface_id) else {
            if let Some(mode) = active.and_then(|i| modes.get(i)) {
                if self.options.shadow_surfaces.contains(&surface_id) {
                    self.physical_properties
                        .insert(surface_id, ScreenProperty::from(*mode));
                }
            }
            return Vec::new();
        };
        let Some(screen) = self.screens.get_mut(&id) else {
            return Vec::new();
        };

        let Some(active) = active else {
            warn!(service_id = %id, "mode change without an active mode; keeping old modes");
            return Vec::new();
        };
        match screen.replace_modes(modes, active) {
            Ok(()) => vec![TopologyEvent::Changed {
                id,
                event: ScreenChangeEvent::ChangeMode,
            }],
            Err(e) => {
                warn!(service_id = %id, error = %e, "ignoring invalid mode change");
                Vec::new()
            }
        }
    }

    // ── Group composition ─────────────────────────────────────────────────────

    /// Mirrors `main` onto every screen in `targets`.
    ///
    /// Reuses the MIRROR group already sourced from `main`, if any.
    ///
    /// # Errors
    ///
    /// - [`DmError::NotFound`] for an unknown id or a `main` without a node.
    /// - [`DmError::InvalidParam`] for a group id, or when no target remains
    ///   once `main` is filtered out.
    pub fn make_mirror(&mut self, main: ScreenId, targets: &[ScreenId]) -> DmResult<Vec<TopologyEvent>> {
        self.require_screen(main)?;
        for id in targets {
            self.require_screen(*id)?;
        }

        let mut mirrors: Vec<ScreenId> = Vec::with_capacity(targets.len());
        for id in targets {
            if *id != main && !mirrors.contains(id) {
                mirrors.push(*id);
            }
        }
        if mirrors.is_empty() {
            return Err(DmError::invalid("no mirror target besides the main screen"));
        }
        if self.screens.get(&main).and_then(|s| s.node).is_none() {
            return Err(DmError::not_found("display node", main.0));
        }

        let existing = self
            .groups
            .values()
            .find(|g| g.combination == ScreenCombination::Mirror && g.mirror_source == Some(main))
            .map(|g| g.id);
        let group_id = match existing {
            Some(id) => id,
            None => {
                let id = self.create_group(ScreenCombination::Mirror)?;
                if let Some(group) = self.groups.get_mut(&id) {
                    group.mirror_source = Some(main);
                }
                id
            }
        };

        let mut moved = Vec::new();
        let mut regrouped = Vec::new();
        let main_is_member = self.groups.get(&group_id).is_some_and(|g| g.has_child(main));
        if Some(main) != self.default_screen && !main_is_member {
            regrouped.extend(self.move_to_group(main, group_id, Point::ORIGIN));
            moved.push(main);
        }
        for id in mirrors {
            if self.groups.get(&group_id).is_some_and(|g| g.has_child(id)) {
                continue;
            }
            regrouped.extend(self.move_to_group(id, group_id, Point::ORIGIN));
            moved.push(id);
        }

        info!(group_id = %group_id, %main, screens = ?moved, "mirror group updated");
        Ok(vec![TopologyEvent::GroupChanged {
            ids: merge_ids(moved, regrouped),
            event: ScreenGroupChangeEvent::ChangeGroup,
        }])
    }

    /// Places each screen of `ids` at the matching point of a new EXPAND
    /// group.  The default screen stays the anchor and is left out.
    ///
    /// # Errors
    ///
    /// - [`DmError::InvalidParam`] on empty input, an arity mismatch, a group
    ///   id, or when only the default screen was named.
    /// - [`DmError::NotFound`] for an unknown id.
    pub fn make_expand(&mut self, ids: &[ScreenId], points: &[Point]) -> DmResult<Vec<TopologyEvent>> {
        if ids.is_empty() || ids.len() != points.len() {
            return Err(DmError::invalid(format!(
                "{} screen ids but {} points",
                ids.len(),
                points.len()
            )));
        }
        for id in ids {
            self.require_screen(*id)?;
        }

        let mut placements: Vec<(ScreenId, Point)> = Vec::with_capacity(ids.len());
        for (id, point) in ids.iter().zip(points) {
            if Some(*id) == self.default_screen || placements.iter().any(|(seen, _)| seen == id) {
                continue;
            }
            placements.push((*id, *point));
        }
        if placements.is_empty() {
            return Err(DmError::invalid("expand needs a screen besides the default screen"));
        }

        let group_id = self.create_group(ScreenCombination::Expand)?;
        let mut moved = Vec::with_capacity(placements.len());
        let mut regrouped = Vec::new();
        for (id, point) in placements {
            regrouped.extend(self.move_to_group(id, group_id, point));
            moved.push(id);
        }

        info!(group_id = %group_id, screens = ?moved, "expand group created");
        Ok(vec![TopologyEvent::GroupChanged {
            ids: merge_ids(moved, regrouped),
            event: ScreenGroupChangeEvent::ChangeGroup,
        }])
    }

    pub fn stop_mirror(&mut self, ids: &[ScreenId]) -> DmResult<Vec<TopologyEvent>> {
        self.stop_combination(ids, ScreenCombination::Mirror)
    }

    pub fn stop_expand(&mut self, ids: &[ScreenId]) -> DmResult<Vec<TopologyEvent>> {
        self.stop_combination(ids, ScreenCombination::Expand)
    }

    /// Returns each listed screen whose group has `combination` to an ALONE
    /// group of its own.  Ids not in such a group are skipped.
    ///
    /// A member left behind on its own is restored as well and reported with
    /// the listed screens.
    fn stop_combination(
        &mut self,
        ids: &[ScreenId],
        combination: ScreenCombination,
    ) -> DmResult<Vec<TopologyEvent>> {
        let mut valid: Vec<ScreenId> = Vec::new();
        for id in ids {
            let in_group = self
                .screens
                .get(id)
                .and_then(|s| s.group_id())
                .and_then(|g| self.groups.get(&g))
                .is_some_and(|g| g.combination == combination);
            if in_group && !valid.contains(id) {
                valid.push(*id);
            }
        }
        if valid.is_empty() {
            debug!(?ids, ?combination, "nothing to stop");
            return Ok(Vec::new());
        }

        let mut regrouped = Vec::new();
        for id in &valid {
            let group_id = self.create_group(ScreenCombination::Alone)?;
            regrouped.extend(self.move_to_group(*id, group_id, Point::ORIGIN));
        }
        info!(screens = ?valid, ?combination, "screens returned to standalone");
        Ok(vec![TopologyEvent::GroupChanged {
            ids: merge_ids(valid, regrouped),
            event: ScreenGroupChangeEvent::RemoveFromGroup,
        }])
    }

    // ── Screen commands ───────────────────────────────────────────────────────

    pub fn set_screen_active_mode(&mut self, id: ScreenId, mode_index: u32) -> DmResult<Vec<TopologyEvent>> {
        let screen = self.require_screen(id)?;
        let index = mode_index as usize;
        if index >= screen.modes().len() {
            return Err(DmError::invalid(format!(
                "mode index {index} out of range ({} modes)",
                screen.modes().len()
            )));
        }
        self.render
            .set_screen_active_mode(screen.surface_id, index)
            .map_err(|status| backend_failure("set_screen_active_mode", status))?;
        self.require_screen_mut(id)?.set_active_mode(index)?;
        Ok(vec![TopologyEvent::Changed {
            id,
            event: ScreenChangeEvent::ChangeMode,
        }])
    }

    pub fn set_orientation(&mut self, id: ScreenId, orientation: Orientation) -> DmResult<Vec<TopologyEvent>> {
        let rotated = self.require_screen_mut(id)?.set_orientation(orientation);
        let mut events = vec![TopologyEvent::Changed {
            id,
            event: ScreenChangeEvent::UpdateOrientation,
        }];
        if rotated {
            events.push(TopologyEvent::Changed {
                id,
                event: ScreenChangeEvent::UpdateRotation,
            });
        }
        Ok(events)
    }

    pub fn set_virtual_pixel_ratio(&mut self, id: ScreenId, ratio: f32) -> DmResult<Vec<TopologyEvent>> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(DmError::invalid(format!("virtual pixel ratio {ratio} must be positive")));
        }
        let screen = self.require_screen_mut(id)?;
        if screen.virtual_pixel_ratio == ratio {
            return Ok(Vec::new());
        }
        screen.virtual_pixel_ratio = ratio;
        Ok(vec![TopologyEvent::Changed {
            id,
            event: ScreenChangeEvent::VirtualPixelRatioChanged,
        }])
    }

    // ── Virtual screens ───────────────────────────────────────────────────────

    pub fn create_virtual_screen(
        &mut self,
        option: &VirtualScreenOption,
    ) -> DmResult<(ScreenId, Vec<TopologyEvent>)> {
        if option.width == 0 || option.height == 0 {
            return Err(DmError::invalid(format!(
                "virtual screen size {}x{} must be non-zero",
                option.width, option.height
            )));
        }
        let surface_id = self
            .render
            .create_virtual_screen(option)
            .ok_or_else(|| backend_failure("create_virtual_screen", VIRTUAL_SCREEN_CREATE_FAILED))?;

        let modes = vec![ScreenMode::new(
            option.width,
            option.height,
            VIRTUAL_SCREEN_REFRESH_RATE,
        )];
        let id = match self.register_screen(surface_id, ScreenType::Virtual, modes, 0) {
            Ok(id) => id,
            Err(e) => {
                self.render.remove_virtual_screen(surface_id);
                return Err(e);
            }
        };
        if let Some(screen) = self.screens.get_mut(&id) {
            screen.name = option.name.clone();
            if option.density.is_finite() && option.density > 0.0 {
                screen.virtual_pixel_ratio = option.density;
            }
        }
        info!(service_id = %id, %surface_id, name = %option.name, "virtual screen created");
        Ok((id, vec![TopologyEvent::Connected(id)]))
    }

    pub fn destroy_virtual_screen(&mut self, id: ScreenId) -> DmResult<Vec<TopologyEvent>> {
        let screen = self.require_screen(id)?;
        if screen.screen_type != ScreenType::Virtual {
            return Err(DmError::invalid(format!("screen {id} is not a virtual screen")));
        }
        let surface_id = screen.surface_id;
        let events = self.remove_screen(id);
        self.render.remove_virtual_screen(surface_id);
        info!(service_id = %id, %surface_id, "virtual screen destroyed");
        Ok(events)
    }

    pub fn set_virtual_screen_surface(&mut self, id: ScreenId, surface: SurfaceHandle) -> DmResult<()> {
        let screen = self.require_screen(id)?;
        if screen.screen_type != ScreenType::Virtual {
            return Err(DmError::invalid(format!("screen {id} is not a virtual screen")));
        }
        self.render
            .set_virtual_screen_surface(screen.surface_id, surface)
            .map_err(|status| backend_failure("set_virtual_screen_surface", status))
    }

    // ── Color ─────────────────────────────────────────────────────────────────

    pub fn supported_color_gamuts(&self, id: ScreenId) -> DmResult<Vec<ColorGamut>> {
        let surface_id = self.require_screen(id)?.surface_id;
        self.render
            .supported_color_gamuts(surface_id)
            .map_err(|status| backend_failure("get_supported_color_gamuts", status))
    }

    pub fn color_gamut(&self, id: ScreenId) -> DmResult<ColorGamut> {
        let surface_id = self.require_screen(id)?.surface_id;
        self.render
            .color_gamut(surface_id)
            .map_err(|status| backend_failure("get_color_gamut", status))
    }

    pub fn set_color_gamut(&self, id: ScreenId, index: u32) -> DmResult<()> {
        let surface_id = self.require_screen(id)?.surface_id;
        self.render
            .set_color_gamut(surface_id, index)
            .map_err(|status| backend_failure("set_color_gamut", status))
    }

    pub fn gamut_map(&self, id: ScreenId) -> DmResult<GamutMap> {
        let surface_id = self.require_screen(id)?.surface_id;
        self.render
            .gamut_map(surface_id)
            .map_err(|status| backend_failure("get_gamut_map", status))
    }

    pub fn set_gamut_map(&self, id: ScreenId, map: GamutMap) -> DmResult<()> {
        let surface_id = self.require_screen(id)?.surface_id;
        self.render
            .set_gamut_map(surface_id, map)
            .map_err(|status| backend_failure("set_gamut_map", status))
    }

    // ── Fold support ──────────────────────────────────────────────────────────

    pub fn record_physical_property(&mut self, surface_id: SurfaceScreenId, property: ScreenProperty) {
        self.physical_properties.insert(surface_id, property);
    }

    pub fn physical_property(&self, surface_id: SurfaceScreenId) -> Option<ScreenProperty> {
        self.physical_properties.get(&surface_id).copied()
    }

    /// Screen that follows the fold display mode, once its panel connected.
    pub fn fold_bound_screen(&self) -> Option<ScreenId> {
        self.options
            .fold_bound_surface
            .and_then(|surface| self.ids.to_service_id(surface))
    }

    /// Points the fold-bound screen at `physical`: copies that panel's
    /// property onto the screen and re-targets its display node.
    ///
    /// Returns the bound screen's id, or `None` when either the screen or
    /// the panel's property is unknown.
    pub fn apply_fold_property(&mut self, physical: SurfaceScreenId) -> Option<ScreenId> {
        let Some(id) = self.fold_bound_screen() else {
            warn!(%physical, "no fold-bound screen connected yet");
            return None;
        };
        let Some(property) = self.physical_property(physical) else {
            warn!(%physical, "no physical property recorded for panel");
            return None;
        };
        let screen = self.screens.get_mut(&id)?;
        screen.apply_property(property);
        if let Some(node) = screen.node {
            self.render.set_display_node_screen(node, physical);
        }
        debug!(service_id = %id, %physical, width = property.width, height = property.height, "fold property applied");
        Some(id)
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn screen(&self, id: ScreenId) -> Option<&ScreenEntity> {
        self.screens.get(&id)
    }

    pub fn screens(&self) -> impl Iterator<Item = &ScreenEntity> {
        self.screens.values()
    }

    pub fn group(&self, id: ScreenId) -> Option<&ScreenGroup> {
        self.groups.get(&id)
    }

    pub fn default_screen_id(&self) -> Option<ScreenId> {
        self.default_screen
    }

    pub fn default_group_id(&self) -> Option<ScreenId> {
        self.default_screen
            .and_then(|id| self.screens.get(&id))
            .and_then(|s| s.group_id())
    }

    pub fn service_id_of(&self, surface_id: SurfaceScreenId) -> Option<ScreenId> {
        self.ids.to_service_id(surface_id)
    }

    /// Info for a screen, or for a group projected as a screen.
    pub fn screen_info(&self, id: ScreenId) -> Option<ScreenInfo> {
        if let Some(screen) = self.screens.get(&id) {
            return Some(screen.to_info());
        }
        self.group_info(id).map(|g| g.info)
    }

    pub fn group_info(&self, id: ScreenId) -> Option<ScreenGroupInfo> {
        let group = self.groups.get(&id)?;
        let first_child = group
            .children()
            .first()
            .and_then(|c| self.screens.get(c))
            .map(ScreenEntity::to_info);
        Some(group.to_info(first_child.as_ref()))
    }

    pub fn all_screen_ids(&self) -> Vec<ScreenId> {
        self.screens.keys().copied().collect()
    }

    pub fn all_screen_infos(&self) -> Vec<ScreenInfo> {
        self.screens.values().map(ScreenEntity::to_info).collect()
    }

    /// Whether `id` should be projected as a display.  Virtual screens that
    /// merely receive a mirror get none.
    pub fn is_display_eligible(&self, id: ScreenId) -> bool {
        let Some(screen) = self.screens.get(&id) else {
            return false;
        };
        if screen.screen_type != ScreenType::Virtual {
            return true;
        }
        match screen.group_id().and_then(|g| self.groups.get(&g)) {
            Some(group) => {
                group.combination != ScreenCombination::Mirror || group.mirror_source == Some(id)
            }
            None => true,
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn register_screen(
        &mut self,
        surface_id: SurfaceScreenId,
        screen_type: ScreenType,
        modes: Vec<ScreenMode>,
        active: usize,
    ) -> DmResult<ScreenId> {
        let id = self
            .ids
            .create_mapping(surface_id)
            .ok_or_else(id_space_exhausted)?;
        let mut screen = match ScreenEntity::new(id, surface_id, screen_type, modes, active) {
            Ok(screen) => screen,
            Err(e) => {
                self.ids.remove(id);
                return Err(e);
            }
        };
        screen.virtual_pixel_ratio = self.options.default_virtual_pixel_ratio;
        self.physical_properties
            .entry(surface_id)
            .or_insert_with(|| screen.property());
        self.screens.insert(id, screen);

        if let Err(e) = self.add_to_group(id, screen_type) {
            self.screens.remove(&id);
            self.ids.remove(id);
            return Err(e);
        }
        Ok(id)
    }

    /// Puts a newly registered screen into an ALONE group of its own.  The
    /// first real screen also becomes the default (anchor) screen.
    fn add_to_group(&mut self, id: ScreenId, screen_type: ScreenType) -> DmResult<()> {
        let group_id = self.create_group(ScreenCombination::Alone)?;
        self.attach(id, group_id, Point::ORIGIN);
        if self.default_screen.is_none() && screen_type == ScreenType::Real {
            self.default_screen = Some(id);
            info!(service_id = %id, %group_id, "first screen is the default screen");
        } else {
            info!(service_id = %id, %group_id, "screen joined as successor");
        }
        Ok(())
    }

    fn remove_screen(&mut self, id: ScreenId) -> Vec<TopologyEvent> {
        let detached = self.detach(id);
        self.screens.remove(&id);
        self.ids.remove(id);

        let mut affected = Vec::new();
        if let Some(detached) = detached {
            if let Some(group) = self.groups.get(&detached.group_id) {
                affected = group.children();
            }
            affected = merge_ids(affected, detached.regrouped);
        }
        // MIRROR groups sourced from a screen outside them (the default
        // screen) lose their source here.
        let sourced: Vec<ScreenId> = self
            .groups
            .values()
            .filter(|g| g.mirror_source == Some(id))
            .map(|g| g.id)
            .collect();
        for group_id in sourced {
            let released = self.release_members(group_id);
            affected = merge_ids(affected, released);
        }

        let mut events = vec![TopologyEvent::Disconnected(id)];
        if !affected.is_empty() {
            events.push(TopologyEvent::GroupChanged {
                ids: affected,
                event: ScreenGroupChangeEvent::RemoveFromGroup,
            });
        }

        if self.default_screen == Some(id) {
            self.default_screen = self
                .screens
                .values()
                .find(|s| s.screen_type == ScreenType::Real)
                .map(|s| s.id);
            match self.default_screen {
                Some(next) => info!(old = %id, new = %next, "default screen promoted"),
                None => info!(old = %id, "default screen removed; no successor"),
            }
        }
        info!(service_id = %id, "screen removed");
        events
    }

    fn create_group(&mut self, combination: ScreenCombination) -> DmResult<ScreenId> {
        let id = self.ids.allocate_id().ok_or_else(id_space_exhausted)?;
        let mut group = ScreenGroup::new(id, combination);
        if combination != ScreenCombination::Alone {
            group.node = self.render.create_display_node(DisplayNodeConfig::container(None));
            match group.node {
                Some(node) => self.render.add_child(None, node, 0),
                None => warn!(group_id = %id, "no container node for group"),
            }
        }
        self.groups.insert(id, group);
        Ok(id)
    }

    /// Returns the screens the move regrouped besides `id` (see
    /// [`Detached::regrouped`]).
    fn move_to_group(&mut self, id: ScreenId, group_id: ScreenId, point: Point) -> Vec<ScreenId> {
        let regrouped = self.detach(id).map(|d| d.regrouped).unwrap_or_default();
        self.attach(id, group_id, point);
        regrouped
    }

    fn attach(&mut self, id: ScreenId, group_id: ScreenId, point: Point) {
        let Some(group) = self.groups.get_mut(&group_id) else {
            return;
        };
        group.add_child(id, point);
        if let Some(screen) = self.screens.get_mut(&id) {
            screen.join_group(group_id);
        }
        self.rebuild_node(id);
    }

    /// Removes `id` from its group and the node tree.
    ///
    /// - A group left empty is dissolved together with its container.
    /// - A group collapsed to ALONE drops its container; the survivor is
    ///   rebuilt at the root, unmirrored, at the origin.
    /// - A MIRROR group that lost its source releases every member into an
    ///   ALONE group of its own.
    fn detach(&mut self, id: ScreenId) -> Option<Detached> {
        let screen = self.screens.get_mut(&id)?;
        let group_id = screen.leave_group()?;
        if let Some(node) = screen.node.take() {
            self.render.remove_from_tree(node);
        }

        let group = self.groups.get_mut(&group_id)?;
        let was_source = group.mirror_source == Some(id);
        let was_combined = group.combination != ScreenCombination::Alone;
        group.remove_child(id);

        let mut regrouped = Vec::new();
        if group.is_dissolved() {
            if let Some(node) = group.node {
                self.render.remove_from_tree(node);
            }
            self.groups.remove(&group_id);
            debug!(%group_id, "group dissolved");
        } else if was_combined && group.combination == ScreenCombination::Alone {
            if let Some(node) = group.node.take() {
                self.render.remove_from_tree(node);
            }
            regrouped = group.children();
            for child in &regrouped {
                self.rebuild_node(*child);
            }
            debug!(%group_id, survivor = ?regrouped, "group collapsed to alone");
        } else if was_source {
            regrouped = self.release_members(group_id);
        }
        Some(Detached { group_id, regrouped })
    }

    /// Clears the mirror source of `group_id` and moves each member into an
    /// ALONE group of its own.  Returns the released members.
    fn release_members(&mut self, group_id: ScreenId) -> Vec<ScreenId> {
        let Some(group) = self.groups.get_mut(&group_id) else {
            return Vec::new();
        };
        group.mirror_source = None;
        let members = group.children();
        for member in &members {
            match self.create_group(ScreenCombination::Alone) {
                Ok(alone) => {
                    self.move_to_group(*member, alone, Point::ORIGIN);
                }
                Err(e) => error!(service_id = %member, error = %e, "member left in sourceless group"),
            }
        }
        info!(%group_id, released = ?members, "mirror source gone; members released");
        members
    }

    /// Recreates the display node of `id` for its current group and
    /// position.
    fn rebuild_node(&mut self, id: ScreenId) {
        let Some(screen) = self.screens.get(&id) else {
            return;
        };
        let Some(group) = screen.group_id().and_then(|g| self.groups.get(&g)) else {
            return;
        };
        let point = group.position_of(id).unwrap_or(Point::ORIGIN);
        let z_order = group.children().iter().position(|c| *c == id).unwrap_or(0) as i32;
        let source_node = match group.combination {
            ScreenCombination::Mirror => group
                .mirror_source
                .filter(|source| *source != id)
                .and_then(|source| self.screens.get(&source))
                .and_then(|source| source.node),
            _ => None,
        };
        let config = match source_node {
            Some(source) => DisplayNodeConfig::mirrored(screen.surface_id, source),
            None => DisplayNodeConfig::screen(screen.surface_id),
        };
        let parent = group.node;

        if let Some(old) = screen.node {
            self.render.remove_from_tree(old);
        }
        let node = self.render.create_display_node(config);
        match node {
            Some(node) => {
                self.render.set_display_offset(node, point.x, point.y);
                self.render.add_child(parent, node, z_order);
            }
            None => warn!(service_id = %id, "rendering surface refused a display node"),
        }
        if let Some(screen) = self.screens.get_mut(&id) {
            screen.node = node;
        }
    }

    fn require_screen(&self, id: ScreenId) -> DmResult<&ScreenEntity> {
        if let Some(screen) = self.screens.get(&id) {
            return Ok(screen);
        }
        if self.groups.contains_key(&id) {
            return Err(DmError::invalid(format!("{id} is a screen group")));
        }
        Err(DmError::not_found("screen", id.0))
    }

    fn require_screen_mut(&mut self, id: ScreenId) -> DmResult<&mut ScreenEntity> {
        if self.groups.contains_key(&id) {
            return Err(DmError::invalid(format!("{id} is a screen group")));
        }
        self.screens
            .get_mut(&id)
            .ok_or_else(|| DmError::not_found("screen", id.0))
    }
}

/// Outcome of [`ScreenTopologyController::detach`].
struct Detached {
    group_id: ScreenId,
    /// Former siblings whose group or node changed as a side effect.
    regrouped: Vec<ScreenId>,
}

/// Appends the ids of `extra` missing from `ids`, keeping first-seen order.
fn merge_ids(mut ids: Vec<ScreenId>, extra: Vec<ScreenId>) -> Vec<ScreenId> {
    for id in extra {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn backend_failure(op: &str, status: BackendStatus) -> DmError {
    error!(op, status, "rendering backend call failed");
    DmError::BackendFailure {
        op: op.to_string(),
        status,
    }
}

fn id_space_exhausted() -> DmError {
    DmError::StateConflict("screen id space exhausted".to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::render_surface::mock::{MockRenderSurface, INVALID_ARGUMENTS_STATUS};

    fn hd_modes() -> Vec<ScreenMode> {
        vec![ScreenMode::new(1920, 1080, 60), ScreenMode::new(1280, 720, 60)]
    }

    fn controller() -> (Arc<MockRenderSurface>, ScreenTopologyController) {
        let mock = Arc::new(MockRenderSurface::new());
        let ctrl = ScreenTopologyController::new(mock.clone(), TopologyOptions::default());
        (mock, ctrl)
    }

    fn connect(mock: &MockRenderSurface, ctrl: &mut ScreenTopologyController, surface: u64) -> ScreenId {
        mock.add_panel(SurfaceScreenId(surface), hd_modes(), Some(0));
        ctrl.on_surface_screen_connected(SurfaceScreenId(surface));
        ctrl.service_id_of(SurfaceScreenId(surface)).expect("connected")
    }

    #[test]
    fn test_first_screen_becomes_default_in_alone_group() {
        // Arrange
        let (mock, mut ctrl) = controller();
        mock.add_panel(SurfaceScreenId(7), hd_modes(), Some(0));

        // Act
        let events = ctrl.on_surface_screen_connected(SurfaceScreenId(7));

        // Assert
        let id = ctrl.service_id_of(SurfaceScreenId(7)).unwrap();
        assert_eq!(events, vec![TopologyEvent::Connected(id)]);
        assert_eq!(ctrl.default_screen_id(), Some(id));
        let group = ctrl.group_info(ctrl.default_group_id().unwrap()).unwrap();
        assert_eq!(group.combination, ScreenCombination::Alone);
        assert_eq!(group.children, vec![id]);
    }

    #[test]
    fn test_connect_without_modes_is_dropped() {
        let (mock, mut ctrl) = controller();
        mock.add_panel(SurfaceScreenId(1), vec![], Some(0));

        assert!(ctrl.on_surface_screen_connected(SurfaceScreenId(1)).is_empty());
        assert!(ctrl.all_screen_ids().is_empty());
        assert_eq!(ctrl.service_id_of(SurfaceScreenId(1)), None);
    }

    #[test]
    fn test_connect_with_out_of_range_active_mode_is_dropped() {
        let (mock, mut ctrl) = controller();
        mock.add_panel(SurfaceScreenId(1), hd_modes(), Some(2));

        assert!(ctrl.on_surface_screen_connected(SurfaceScreenId(1)).is_empty());
        assert_eq!(ctrl.default_screen_id(), None);
    }

    #[test]
    fn test_reconnect_of_mapped_surface_is_noop() {
        let (mock, mut ctrl) = controller();
        let id = connect(&mock, &mut ctrl, 3);

        assert!(ctrl.on_surface_screen_connected(SurfaceScreenId(3)).is_empty());
        assert_eq!(ctrl.all_screen_ids(), vec![id]);
    }

    #[test]
    fn test_alone_screen_node_is_attached_at_root() {
        let (mock, mut ctrl) = controller();
        let id = connect(&mock, &mut ctrl, 0);

        let node = ctrl.screen(id).unwrap().node.unwrap();
        let mock_node = mock.node(node).unwrap();
        assert!(mock_node.attached);
        assert_eq!(mock_node.parent, None);
    }

    #[test]
    fn test_make_mirror_drops_main_from_targets() {
        // Arrange
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);

        // Act
        let events = ctrl.make_mirror(a, &[a, b, b]).unwrap();

        // Assert
        assert_eq!(
            events,
            vec![TopologyEvent::GroupChanged {
                ids: vec![b],
                event: ScreenGroupChangeEvent::ChangeGroup
            }]
        );
        let group_id = ctrl.screen(b).unwrap().group_id().unwrap();
        let group = ctrl.group_info(group_id).unwrap();
        assert_eq!(group.combination, ScreenCombination::Mirror);
        assert_eq!(group.mirror_source, Some(a));
        assert_eq!(group.children, vec![b]);
    }

    #[test]
    fn test_make_mirror_with_only_main_is_invalid() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);

        assert!(matches!(ctrl.make_mirror(a, &[a]), Err(DmError::InvalidParam(_))));
    }

    #[test]
    fn test_make_mirror_unknown_target_is_not_found() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);

        assert!(matches!(
            ctrl.make_mirror(a, &[ScreenId(99)]),
            Err(DmError::NotFound { .. })
        ));
    }

    #[test]
    fn test_mirror_target_node_mirrors_main_node() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);

        ctrl.make_mirror(a, &[b]).unwrap();

        let main_node = ctrl.screen(a).unwrap().node.unwrap();
        let target = mock.node(ctrl.screen(b).unwrap().node.unwrap()).unwrap();
        assert_eq!(target.config.mirror_of, Some(main_node));
        assert!(target.parent.is_some());
    }

    #[test]
    fn test_make_mirror_moves_non_default_main_into_group() {
        let (mock, mut ctrl) = controller();
        let _a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);
        let c = connect(&mock, &mut ctrl, 2);

        ctrl.make_mirror(b, &[c]).unwrap();

        let group = ctrl.screen(c).unwrap().group_id().unwrap();
        assert_eq!(ctrl.screen(b).unwrap().group_id(), Some(group));
        assert_eq!(ctrl.group_info(group).unwrap().children, vec![b, c]);
    }

    #[test]
    fn test_make_expand_rejects_group_id() {
        let (mock, mut ctrl) = controller();
        let _a = connect(&mock, &mut ctrl, 0);
        let group = ctrl.default_group_id().unwrap();

        assert!(matches!(
            ctrl.make_expand(&[group], &[Point::ORIGIN]),
            Err(DmError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_make_expand_dedups_keeping_first_point() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);

        ctrl.make_expand(
            &[a, b, b],
            &[Point::ORIGIN, Point::new(1920, 0), Point::new(5, 5)],
        )
        .unwrap();

        let group = ctrl.screen(b).unwrap().group_id().unwrap();
        assert_eq!(ctrl.group(group).unwrap().position_of(b), Some(Point::new(1920, 0)));
        let node = mock.node(ctrl.screen(b).unwrap().node.unwrap()).unwrap();
        assert_eq!(node.offset, (1920, 0));
    }

    #[test]
    fn test_make_expand_with_only_default_screen_is_invalid() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);

        assert!(matches!(
            ctrl.make_expand(&[a], &[Point::ORIGIN]),
            Err(DmError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_stop_expand_restores_alone_at_origin() {
        // Arrange
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);
        let c = connect(&mock, &mut ctrl, 2);
        ctrl.make_expand(&[a, b, c], &[Point::ORIGIN, Point::new(1920, 0), Point::new(3840, 0)])
            .unwrap();
        let expand_group = ctrl.screen(b).unwrap().group_id().unwrap();

        // Act
        let events = ctrl.stop_expand(&[b, c]).unwrap();

        // Assert
        assert_eq!(
            events,
            vec![TopologyEvent::GroupChanged {
                ids: vec![b, c],
                event: ScreenGroupChangeEvent::RemoveFromGroup
            }]
        );
        assert!(ctrl.group(expand_group).is_none());
        for id in [b, c] {
            let group = ctrl.screen(id).unwrap().group_id().unwrap();
            assert_eq!(ctrl.group(group).unwrap().combination, ScreenCombination::Alone);
            let node = mock.node(ctrl.screen(id).unwrap().node.unwrap()).unwrap();
            assert_eq!(node.offset, (0, 0));
            assert_eq!(node.parent, None);
        }
    }

    #[test]
    fn test_group_with_one_child_left_collapses_to_alone() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);
        let c = connect(&mock, &mut ctrl, 2);
        ctrl.make_expand(&[a, b, c], &[Point::ORIGIN, Point::new(1920, 0), Point::new(3840, 0)])
            .unwrap();
        let group = ctrl.screen(b).unwrap().group_id().unwrap();

        let events = ctrl.stop_expand(&[c]).unwrap();

        assert_eq!(ctrl.group(group).unwrap().combination, ScreenCombination::Alone);
        assert_eq!(ctrl.group_info(group).unwrap().children, vec![b]);
        assert_eq!(
            events,
            vec![TopologyEvent::GroupChanged {
                ids: vec![c, b],
                event: ScreenGroupChangeEvent::RemoveFromGroup
            }]
        );
        let node = mock.node(ctrl.screen(b).unwrap().node.unwrap()).unwrap();
        assert_eq!(node.offset, (0, 0));
        assert_eq!(node.parent, None);
    }

    #[test]
    fn test_stop_mirror_one_target_then_the_other_restores_both() {
        // Arrange: default screen `a` mirrors onto b and c
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);
        let c = connect(&mock, &mut ctrl, 2);
        ctrl.make_mirror(a, &[b, c]).unwrap();
        let mirror_group = ctrl.screen(b).unwrap().group_id().unwrap();

        // Act
        let first = ctrl.stop_mirror(&[c]).unwrap();

        // Assert: b is left alone and stops mirroring
        assert_eq!(
            first,
            vec![TopologyEvent::GroupChanged {
                ids: vec![c, b],
                event: ScreenGroupChangeEvent::RemoveFromGroup
            }]
        );
        let group = ctrl.group(mirror_group).unwrap();
        assert_eq!(group.combination, ScreenCombination::Alone);
        assert_eq!(group.mirror_source, None);
        assert_eq!(group.node, None);
        for id in [b, c] {
            let node = mock.node(ctrl.screen(id).unwrap().node.unwrap()).unwrap();
            assert_eq!(node.config.mirror_of, None);
            assert_eq!(node.parent, None);
        }

        // Act: b is no longer in a MIRROR group
        let second = ctrl.stop_mirror(&[b]).unwrap();

        // Assert
        assert!(second.is_empty());
        assert!(ctrl
            .groups
            .values()
            .all(|g| g.combination == ScreenCombination::Alone && g.mirror_source.is_none()));
    }

    #[test]
    fn test_disconnecting_default_mirror_source_releases_targets() {
        // Arrange
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);
        let c = connect(&mock, &mut ctrl, 2);
        ctrl.make_mirror(a, &[b, c]).unwrap();
        let mirror_group = ctrl.screen(b).unwrap().group_id().unwrap();

        // Act
        let events = ctrl.on_surface_screen_disconnected(SurfaceScreenId(0));

        // Assert
        assert_eq!(
            events,
            vec![
                TopologyEvent::Disconnected(a),
                TopologyEvent::GroupChanged {
                    ids: vec![b, c],
                    event: ScreenGroupChangeEvent::RemoveFromGroup
                },
            ]
        );
        assert!(ctrl.group(mirror_group).is_none());
        assert!(ctrl.groups.values().all(|g| g.mirror_source.is_none()));
        for id in [b, c] {
            let group = ctrl.screen(id).unwrap().group_id().unwrap();
            assert_eq!(ctrl.group(group).unwrap().combination, ScreenCombination::Alone);
            let node = mock.node(ctrl.screen(id).unwrap().node.unwrap()).unwrap();
            assert_eq!(node.config.mirror_of, None);
            assert_eq!(node.parent, None);
        }
        assert_eq!(ctrl.default_screen_id(), Some(b));
    }

    #[test]
    fn test_moving_member_mirror_source_away_releases_targets() {
        // Arrange: non-default `b` mirrors onto c and d inside the group
        let (mock, mut ctrl) = controller();
        let _a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);
        let c = connect(&mock, &mut ctrl, 2);
        let d = connect(&mock, &mut ctrl, 3);
        ctrl.make_mirror(b, &[c, d]).unwrap();

        // Act
        let events = ctrl.make_expand(&[b], &[Point::new(1920, 0)]).unwrap();

        // Assert
        assert_eq!(
            events,
            vec![TopologyEvent::GroupChanged {
                ids: vec![b, c, d],
                event: ScreenGroupChangeEvent::ChangeGroup
            }]
        );
        for id in [c, d] {
            let group = ctrl.screen(id).unwrap().group_id().unwrap();
            assert_eq!(ctrl.group(group).unwrap().combination, ScreenCombination::Alone);
            let node = mock.node(ctrl.screen(id).unwrap().node.unwrap()).unwrap();
            assert_eq!(node.config.mirror_of, None);
        }
    }

    #[test]
    fn test_virtual_target_regains_eligibility_when_mirror_collapses() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);
        let (v, _) = ctrl
            .create_virtual_screen(&VirtualScreenOption::new("cast", 1280, 720))
            .unwrap();
        ctrl.make_mirror(a, &[b, v]).unwrap();
        assert!(!ctrl.is_display_eligible(v));

        let events = ctrl.stop_mirror(&[b]).unwrap();

        assert!(ctrl.is_display_eligible(v));
        assert_eq!(
            events,
            vec![TopologyEvent::GroupChanged {
                ids: vec![b, v],
                event: ScreenGroupChangeEvent::RemoveFromGroup
            }]
        );
    }

    #[test]
    fn test_set_screen_active_mode_backend_failure_keeps_mode() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        mock.fail_backend_with(Some(INVALID_ARGUMENTS_STATUS));

        let result = ctrl.set_screen_active_mode(a, 1);

        assert_eq!(
            result,
            Err(DmError::BackendFailure {
                op: "set_screen_active_mode".into(),
                status: INVALID_ARGUMENTS_STATUS
            })
        );
        assert_eq!(ctrl.screen(a).unwrap().active_mode_index(), 0);
    }

    #[test]
    fn test_set_orientation_emits_rotation_change_only_when_rotated() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);

        assert_eq!(ctrl.set_orientation(a, Orientation::Horizontal).unwrap().len(), 2);
        assert_eq!(ctrl.set_orientation(a, Orientation::Sensor).unwrap().len(), 1);
    }

    #[test]
    fn test_set_virtual_pixel_ratio_rejects_non_positive() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);

        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                ctrl.set_virtual_pixel_ratio(a, bad),
                Err(DmError::InvalidParam(_))
            ));
        }
    }

    #[test]
    fn test_disconnect_default_promotes_lowest_real_screen() {
        let (mock, mut ctrl) = controller();
        let _a = connect(&mock, &mut ctrl, 0);
        let b = connect(&mock, &mut ctrl, 1);
        let _c = connect(&mock, &mut ctrl, 2);

        let events = ctrl.on_surface_screen_disconnected(SurfaceScreenId(0));

        assert_eq!(events[0], TopologyEvent::Disconnected(ScreenId(0)));
        assert_eq!(ctrl.default_screen_id(), Some(b));
        assert_eq!(ctrl.service_id_of(SurfaceScreenId(0)), None);
    }

    #[test]
    fn test_virtual_screen_lifecycle() {
        // Arrange
        let (mock, mut ctrl) = controller();
        let _a = connect(&mock, &mut ctrl, 0);
        let option = VirtualScreenOption::new("cast", 1280, 720);

        // Act
        let (id, events) = ctrl.create_virtual_screen(&option).unwrap();

        // Assert
        assert_eq!(events, vec![TopologyEvent::Connected(id)]);
        let info = ctrl.screen_info(id).unwrap();
        assert_eq!(info.name, "cast");
        assert_eq!(info.screen_type, ScreenType::Virtual);
        assert_eq!(info.modes, vec![ScreenMode::new(1280, 720, 60)]);

        let surface = ctrl.screen(id).unwrap().surface_id;
        ctrl.destroy_virtual_screen(id).unwrap();
        assert!(ctrl.screen(id).is_none());
        assert!(!mock.has_panel(surface));
    }

    #[test]
    fn test_create_virtual_screen_rejects_zero_size() {
        let (_mock, mut ctrl) = controller();
        let option = VirtualScreenOption::new("empty", 0, 720);
        assert!(matches!(
            ctrl.create_virtual_screen(&option),
            Err(DmError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_destroy_real_screen_as_virtual_is_invalid() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        assert!(matches!(
            ctrl.destroy_virtual_screen(a),
            Err(DmError::InvalidParam(_))
        ));
    }

    #[test]
    fn test_virtual_mirror_target_is_not_display_eligible() {
        let (mock, mut ctrl) = controller();
        let a = connect(&mock, &mut ctrl, 0);
        let (v, _) = ctrl
            .create_virtual_screen(&VirtualScreenOption::new("cast", 1280, 720))
            .unwrap();
        assert!(ctrl.is_display_eligible(v));

        ctrl.make_mirror(a, &[v]).unwrap();

        assert!(!ctrl.is_display_eligible(v));
        assert!(ctrl.is_display_eligible(a));
    }

    #[test]
    fn test_color_gamut_on_unknown_screen_is_not_found() {
        let (_mock, ctrl) = controller();
        assert!(matches!(
            ctrl.supported_color_gamuts(ScreenId(4)),
            Err(DmError::NotFound { .. })
        ));
    }

    #[test]
    fn test_shadow_surface_records_property_without_screen() {
        let mock = Arc::new(MockRenderSurface::new());
        let mut ctrl = ScreenTopologyController::new(
            mock.clone(),
            TopologyOptions {
                shadow_surfaces: vec![SurfaceScreenId(5)],
                fold_bound_surface: Some(SurfaceScreenId(0)),
                ..TopologyOptions::default()
            },
        );
        mock.add_panel(SurfaceScreenId(5), vec![ScreenMode::new(1008, 2232, 60)], Some(0));
        mock.add_panel(SurfaceScreenId(0), vec![ScreenMode::new(2224, 2496, 60)], Some(0));

        assert!(ctrl.on_surface_screen_connected(SurfaceScreenId(5)).is_empty());
        ctrl.on_surface_screen_connected(SurfaceScreenId(0));
        let bound = ctrl.apply_fold_property(SurfaceScreenId(5)).unwrap();

        assert_eq!(ctrl.all_screen_ids(), vec![bound]);
        assert_eq!(ctrl.screen(bound).unwrap().property().width, 1008);
    }
}
