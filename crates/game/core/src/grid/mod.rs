//! Occupancy grid: which blocking object stands on which tile, the static
//! walkability snapshot used by pathfinding, and registered trigger zones.
//!
//! A tile holds at most one blocking occupant. Non-blocking objects (bodies,
//! floating markers) are never inserted. Zone membership is tracked per object
//! so that entering or leaving is reported once per transition.
mod path;
mod zone;

pub use path::find_path;
pub use zone::{Zone, ZoneId, ZoneKind, ZoneOwner, ZoneTransition};

use std::collections::{BTreeMap, BTreeSet};

use crate::env::{MapDimensions, MapOracle};
use crate::state::{EntityId, Position};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccupancyGrid {
    dimensions: MapDimensions,
    walkable: Vec<bool>,
    occupants: BTreeMap<Position, EntityId>,
    positions: BTreeMap<EntityId, Position>,
    zones: BTreeMap<ZoneId, Zone>,
    memberships: BTreeMap<EntityId, BTreeSet<ZoneId>>,
    next_zone_id: u32,
}

impl OccupancyGrid {
    /// Creates a grid where `walkable` is row-major and sized to `dimensions`.
    /// Missing entries are treated as unwalkable.
    pub fn new(dimensions: MapDimensions, mut walkable: Vec<bool>) -> Self {
        walkable.resize(dimensions.area(), false);
        Self {
            dimensions,
            walkable,
            occupants: BTreeMap::new(),
            positions: BTreeMap::new(),
            zones: BTreeMap::new(),
            memberships: BTreeMap::new(),
            next_zone_id: 0,
        }
    }

    /// Snapshots terrain walkability from the map. Zones are not copied.
    pub fn from_map(map: &dyn MapOracle) -> Self {
        let dimensions = map.dimensions();
        let mut walkable = Vec::with_capacity(dimensions.area());
        for y in 0..dimensions.height as i32 {
            for x in 0..dimensions.width as i32 {
                walkable.push(
                    map.tile(Position::new(x, y))
                        .is_some_and(|tile| tile.is_walkable()),
                );
            }
        }
        Self::new(dimensions, walkable)
    }

    pub fn dimensions(&self) -> MapDimensions {
        self.dimensions
    }

    pub fn contains(&self, position: Position) -> bool {
        self.dimensions.contains(position)
    }

    pub fn is_walkable(&self, position: Position) -> bool {
        self.dimensions
            .index_of(position)
            .is_some_and(|index| self.walkable[index])
    }

    // ========================================================================
    // Occupancy
    // ========================================================================

    /// Places `object` on `position`, releasing its previous tile.
    ///
    /// Returns `false` without touching any state when the tile is outside the
    /// map or already held by a different object.
    pub fn move_object(&mut self, object: EntityId, position: Position) -> bool {
        if !self.contains(position) {
            return false;
        }
        match self.occupants.get(&position) {
            Some(occupant) if *occupant != object => return false,
            _ => {}
        }

        if let Some(previous) = self.positions.insert(object, position)
            && previous != position
        {
            self.occupants.remove(&previous);
        }
        self.occupants.insert(position, object);
        true
    }

    /// Releases the tile held by `object`. No-op when it holds none.
    pub fn remove_object(&mut self, object: EntityId) {
        if let Some(position) = self.positions.remove(&object) {
            self.occupants.remove(&position);
        }
    }

    pub fn occupant(&self, position: Position) -> Option<EntityId> {
        self.occupants.get(&position).copied()
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        self.occupants.contains_key(&position)
    }

    /// Tile currently held by `object`, if it is a registered blocker.
    pub fn position_of(&self, object: EntityId) -> Option<Position> {
        self.positions.get(&object).copied()
    }

    pub fn occupants(&self) -> impl Iterator<Item = (Position, EntityId)> + '_ {
        self.occupants.iter().map(|(position, id)| (*position, *id))
    }

    pub fn find_path(&self, from: Position, to: Position) -> Option<Vec<Position>> {
        find_path(self, from, to)
    }

    // ========================================================================
    // Zones
    // ========================================================================

    pub fn register_zone(&mut self, zone: Zone) -> ZoneId {
        let id = ZoneId(self.next_zone_id);
        self.next_zone_id += 1;
        self.zones.insert(id, zone);
        id
    }

    /// Re-registers a zone under a previously issued id (save restore).
    pub fn restore_zone(&mut self, id: ZoneId, zone: Zone) {
        self.next_zone_id = self.next_zone_id.max(id.0 + 1);
        self.zones.insert(id, zone);
    }

    /// Removes a zone and forgets every membership in it. No exit is reported.
    pub fn unregister_zone(&mut self, id: ZoneId) -> Option<Zone> {
        let zone = self.zones.remove(&id)?;
        for members in self.memberships.values_mut() {
            members.remove(&id);
        }
        Some(zone)
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&id)
    }

    pub fn zones(&self) -> impl Iterator<Item = (ZoneId, &Zone)> + '_ {
        self.zones.iter().map(|(id, zone)| (*id, zone))
    }

    pub fn zones_at(&self, position: Position) -> BTreeSet<ZoneId> {
        self.zones
            .iter()
            .filter(|(_, zone)| zone.contains(position))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Zones `object` is currently inside.
    pub fn memberships(&self, object: EntityId) -> BTreeSet<ZoneId> {
        self.memberships.get(&object).cloned().unwrap_or_default()
    }

    /// Updates the zone membership of `object` standing on `position`.
    ///
    /// Exits are listed before entries, each in zone id order. Standing still
    /// inside a zone yields nothing.
    pub fn trigger_zone(&mut self, object: EntityId, position: Position) -> Vec<ZoneTransition> {
        let current = self.zones_at(position);
        let previous = self.memberships.remove(&object).unwrap_or_default();

        let transitions = previous
            .difference(&current)
            .map(|id| ZoneTransition::Exited(*id))
            .chain(current.difference(&previous).map(|id| ZoneTransition::Entered(*id)))
            .collect();

        if !current.is_empty() {
            self.memberships.insert(object, current);
        }
        transitions
    }

    /// Drops zone memberships of an object leaving the level.
    pub fn forget_object(&mut self, object: EntityId) {
        self.memberships.remove(&object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::StaticMap;

    fn open_grid(width: u32, height: u32) -> OccupancyGrid {
        OccupancyGrid::new(
            MapDimensions::new(width, height),
            vec![true; (width * height) as usize],
        )
    }

    fn grid_from(rows: &[&str]) -> OccupancyGrid {
        OccupancyGrid::from_map(&StaticMap::from_layout("test", rows).unwrap())
    }

    #[test]
    fn move_object_rejects_other_blocker() {
        let mut grid = open_grid(3, 3);
        let a = EntityId(1);
        let b = EntityId(2);

        assert!(grid.move_object(a, Position::new(0, 0)));
        assert!(grid.move_object(b, Position::new(1, 0)));
        assert!(!grid.move_object(b, Position::new(0, 0)));

        assert_eq!(grid.occupant(Position::new(0, 0)), Some(a));
        assert_eq!(grid.position_of(b), Some(Position::new(1, 0)));
    }

    #[test]
    fn move_object_releases_previous_tile() {
        let mut grid = open_grid(3, 1);
        let a = EntityId(1);

        grid.move_object(a, Position::new(0, 0));
        grid.move_object(a, Position::new(2, 0));
        assert!(grid.move_object(a, Position::new(2, 0)));

        assert!(!grid.is_occupied(Position::new(0, 0)));
        assert_eq!(grid.occupants().count(), 1);
    }

    #[test]
    fn move_object_outside_map_fails() {
        let mut grid = open_grid(2, 2);
        assert!(!grid.move_object(EntityId(1), Position::new(2, 0)));
        assert!(!grid.move_object(EntityId(1), Position::new(-1, 0)));
        assert_eq!(grid.occupants().count(), 0);
    }

    #[test]
    fn remove_object_is_idempotent() {
        let mut grid = open_grid(2, 2);
        grid.move_object(EntityId(1), Position::new(1, 1));
        grid.remove_object(EntityId(1));
        grid.remove_object(EntityId(1));
        assert_eq!(grid.occupant(Position::new(1, 1)), None);
    }

    #[test]
    fn straight_path_excludes_start() {
        let grid = open_grid(4, 1);
        let path = grid.find_path(Position::new(0, 0), Position::new(3, 0));
        assert_eq!(
            path,
            Some(vec![
                Position::new(1, 0),
                Position::new(2, 0),
                Position::new(3, 0)
            ])
        );
    }

    #[test]
    fn path_to_self_is_empty() {
        let grid = open_grid(2, 2);
        assert_eq!(
            grid.find_path(Position::new(1, 1), Position::new(1, 1)),
            Some(Vec::new())
        );
    }

    #[test]
    fn path_routes_around_walls() {
        let grid = grid_from(&["...", "##.", "..."]);
        let path = grid
            .find_path(Position::new(0, 0), Position::new(0, 2))
            .unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(path.last(), Some(&Position::new(0, 2)));
    }

    #[test]
    fn occupied_tiles_block_except_destination() {
        let mut grid = open_grid(3, 1);
        grid.move_object(EntityId(9), Position::new(1, 0));

        assert_eq!(grid.find_path(Position::new(0, 0), Position::new(2, 0)), None);
        assert_eq!(
            grid.find_path(Position::new(0, 0), Position::new(1, 0)),
            Some(vec![Position::new(1, 0)])
        );
    }

    #[test]
    fn unreachable_or_unwalkable_target_has_no_path() {
        let grid = grid_from(&[".#.", ".#.", ".#."]);
        assert_eq!(grid.find_path(Position::new(0, 0), Position::new(2, 2)), None);
        assert_eq!(grid.find_path(Position::new(0, 0), Position::new(1, 1)), None);
        assert_eq!(grid.find_path(Position::new(0, 0), Position::new(7, 7)), None);
    }

    #[test]
    fn path_lengths_are_symmetric() {
        let grid = grid_from(&[".....", ".###.", "...#.", "##...", "....."]);
        let a = Position::new(0, 0);
        let b = Position::new(2, 2);
        let there = grid.find_path(a, b).map(|p| p.len());
        let back = grid.find_path(b, a).map(|p| p.len());
        assert!(there.is_some());
        assert_eq!(there, back);
    }

    #[test]
    fn zone_membership_reports_each_transition_once() {
        let mut grid = open_grid(4, 1);
        let zone = grid.register_zone(Zone::new(
            "gate",
            ZoneKind::Trigger,
            [Position::new(1, 0), Position::new(2, 0)],
        ));
        let walker = EntityId(3);

        assert!(grid.trigger_zone(walker, Position::new(0, 0)).is_empty());
        assert_eq!(
            grid.trigger_zone(walker, Position::new(1, 0)),
            vec![ZoneTransition::Entered(zone)]
        );
        assert!(grid.trigger_zone(walker, Position::new(2, 0)).is_empty());
        assert_eq!(
            grid.trigger_zone(walker, Position::new(3, 0)),
            vec![ZoneTransition::Exited(zone)]
        );
    }

    #[test]
    fn exits_precede_entries_between_adjacent_zones() {
        let mut grid = open_grid(2, 1);
        let west = grid.register_zone(Zone::new("west", ZoneKind::Trigger, [Position::new(0, 0)]));
        let east = grid.register_zone(Zone::new("east", ZoneKind::Trigger, [Position::new(1, 0)]));
        let walker = EntityId(1);

        grid.trigger_zone(walker, Position::new(0, 0));
        assert_eq!(
            grid.trigger_zone(walker, Position::new(1, 0)),
            vec![ZoneTransition::Exited(west), ZoneTransition::Entered(east)]
        );
    }

    #[test]
    fn unregistering_zone_drops_memberships_silently() {
        let mut grid = open_grid(2, 1);
        let zone = grid.register_zone(Zone::new("pit", ZoneKind::Trigger, [Position::new(0, 0)]));
        grid.trigger_zone(EntityId(1), Position::new(0, 0));

        assert!(grid.unregister_zone(zone).is_some());
        assert!(grid.memberships(EntityId(1)).is_empty());
        assert!(grid.unregister_zone(zone).is_none());
    }

    #[test]
    fn restored_zone_ids_are_not_reissued() {
        let mut grid = open_grid(1, 1);
        grid.restore_zone(ZoneId(4), Zone::new("old", ZoneKind::Exit, [Position::ORIGIN]));
        let fresh = grid.register_zone(Zone::new("new", ZoneKind::Exit, [Position::ORIGIN]));
        assert_eq!(fresh, ZoneId(5));
    }
}
