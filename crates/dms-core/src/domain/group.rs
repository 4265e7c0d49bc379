//! Screen groups: composites of screens sharing a combination policy.
//!
//! Groups store child *ids* and placement points, never the child entities
//! themselves.  The topology registry owns every entity; a child points back
//! at its group with a plain id as well (see
//! [`ScreenEntity::group_id`](crate::domain::screen::ScreenEntity::group_id)).

use std::collections::BTreeMap;

use crate::domain::ids::{NodeHandle, ScreenId};
use crate::domain::info::{ScreenGroupInfo, ScreenInfo};
use crate::domain::types::{
    Orientation, Point, Rotation, ScreenCombination, ScreenType,
};

#[derive(Debug, Clone)]
pub struct ScreenGroup {
    pub id: ScreenId,
    pub combination: ScreenCombination,
    /// Screen whose content a MIRROR group reproduces.
    pub mirror_source: Option<ScreenId>,
    pub node: Option<NodeHandle>,
    children: BTreeMap<ScreenId, Point>,
}

impl ScreenGroup {
    pub fn new(id: ScreenId, combination: ScreenCombination) -> Self {
        Self {
            id,
            combination,
            mirror_source: None,
            node: None,
            children: BTreeMap::new(),
        }
    }

    /// Adds `child` at `point`.  Returns `false` if it is already a member.
    pub fn add_child(&mut self, child: ScreenId, point: Point) -> bool {
        if self.children.contains_key(&child) {
            return false;
        }
        self.children.insert(child, point);
        true
    }

    /// Removes `child`.  A group left with none is dissolved (see
    /// [`is_dissolved`]).
    ///
    /// A group left with a single child falls back to ALONE: it loses its
    /// mirror source and the survivor moves back to the origin.
    ///
    /// [`is_dissolved`]: ScreenGroup::is_dissolved
    pub fn remove_child(&mut self, child: ScreenId) -> bool {
        if self.children.remove(&child).is_none() {
            return false;
        }
        if self.mirror_source == Some(child) {
            self.mirror_source = None;
        }
        if self.children.len() == 1 {
            self.combination = ScreenCombination::Alone;
            self.mirror_source = None;
            for point in self.children.values_mut() {
                *point = Point::ORIGIN;
            }
        }
        true
    }

    pub fn has_child(&self, child: ScreenId) -> bool {
        self.children.contains_key(&child)
    }

    pub fn children(&self) -> Vec<ScreenId> {
        self.children.keys().copied().collect()
    }

    pub fn children_positions(&self) -> Vec<Point> {
        self.children.values().copied().collect()
    }

    pub fn position_of(&self, child: ScreenId) -> Option<Point> {
        self.children.get(&child).copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_dissolved(&self) -> bool {
        self.children.is_empty()
    }

    /// Projects the group into the client DTO.
    ///
    /// `first_child` supplies the size shown for the group itself.
    pub fn to_info(&self, first_child: Option<&ScreenInfo>) -> ScreenGroupInfo {
        let (width, height, ratio) = first_child
            .map(|c| (c.virtual_width, c.virtual_height, c.virtual_pixel_ratio))
            .unwrap_or((0, 0, 1.0));
        ScreenGroupInfo {
            info: ScreenInfo {
                id: self.id,
                name: format!("group_{}", self.id.0),
                parent: None,
                screen_type: ScreenType::Undefined,
                virtual_width: width,
                virtual_height: height,
                virtual_pixel_ratio: ratio,
                rotation: Rotation::Rotation0,
                orientation: Orientation::Unspecified,
                mode_id: 0,
                modes: Vec::new(),
            },
            combination: self.combination,
            children: self.children(),
            positions: self.children_positions(),
            mirror_source: self.mirror_source,
        }
    }
}
