//! Access to the state of the world that some targets depend on, such as
//! where enemies are standing and which factions are at war.
//!
//! Field builders only ever talk to the world through [QueryContext] so the
//! same code runs against live game state or against a [WorldSnapshot]
//! captured once per movement tick and shared with worker tasks.
//!

use std::collections::BTreeMap;

use crate::prelude::*;
use bevy::prelude::*;

/// Identifier of an entity as known to the world query
pub type EntityId = u32;

/// Behavioural flags of an entity
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Reflect)]
pub struct EntityFlags(u32);

impl EntityFlags {
	/// No flags set
	pub const NONE: EntityFlags = EntityFlags(0);
	/// The entity can take part in combat
	pub const COMBATABLE: EntityFlags = EntityFlags(1 << 0);
	/// The entity is a building, its footprint is its bounding box
	pub const BUILDING: EntityFlags = EntityFlags(1 << 1);
	/// Whether every flag of `other` is set
	pub fn contains(self, other: EntityFlags) -> bool {
		self.0 & other.0 == other.0
	}
}

impl std::ops::BitOr for EntityFlags {
	type Output = EntityFlags;
	fn bitor(self, rhs: Self) -> Self::Output {
		EntityFlags(self.0 | rhs.0)
	}
}

/// Relationship between two factions
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, Reflect)]
pub enum DiplomacyState {
	#[default]
	Peace,
	War,
}

/// Oriented bounding box in the world `x-z` plane
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Debug, Reflect)]
pub struct Obb {
	/// Centre of the box
	center: Vec2,
	/// Half of the width and depth of the box along its own axes
	half_extents: Vec2,
	/// Unit vectors of the box's local `x` and `z` axes
	axes: [Vec2; 2],
}

impl Obb {
	/// Create a new instance of [Obb] rotated by `angle` radians
	pub fn new(center: Vec2, half_extents: Vec2, angle: f32) -> Self {
		let (sin, cos) = angle.sin_cos();
		Obb {
			center,
			half_extents,
			axes: [Vec2::new(cos, sin), Vec2::new(-sin, cos)],
		}
	}
	/// Centre of the box
	pub fn get_center(&self) -> Vec2 {
		self.center
	}
	/// The four corners of the box
	pub fn corners(&self) -> [Vec2; 4] {
		let x = self.axes[0] * self.half_extents.x;
		let z = self.axes[1] * self.half_extents.y;
		[
			self.center - x - z,
			self.center + x - z,
			self.center + x + z,
			self.center - x + z,
		]
	}
	/// Separating axis test against an axis aligned rectangle, touching edges don't count
	pub fn overlaps_rect(&self, rect: &Rect) -> bool {
		let rect_corners = [
			rect.min,
			Vec2::new(rect.max.x, rect.min.y),
			rect.max,
			Vec2::new(rect.min.x, rect.max.y),
		];
		let corners = self.corners();
		let axes = [Vec2::X, Vec2::Y, self.axes[0], self.axes[1]];
		axes.iter().all(|axis| {
			let (a_min, a_max) = project(&corners, *axis);
			let (b_min, b_max) = project(&rect_corners, *axis);
			a_max > b_min && b_max > a_min
		})
	}
}

/// Extent of a set of points along an axis
fn project(points: &[Vec2; 4], axis: Vec2) -> (f32, f32) {
	points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
		let d = p.dot(axis);
		(lo.min(d), hi.max(d))
	})
}

/// Everything the field builders need to know about entities and factions
pub trait QueryContext {
	/// Append every entity whose position lies within the world rectangle to `out`
	fn ents_in_rect(&self, min: Vec2, max: Vec2, out: &mut Vec<EntityId>);
	/// Faction the entity belongs to
	fn faction_id(&self, ent: EntityId) -> Option<usize>;
	/// Flags of the entity
	fn flags(&self, ent: EntityId) -> EntityFlags;
	/// Whether the entity is in the process of dying
	fn is_dying(&self, ent: EntityId) -> bool;
	/// Current bounding box of the entity
	fn obb(&self, ent: EntityId) -> Option<Obb>;
	/// World `x-z` position of the entity
	fn position(&self, ent: EntityId) -> Vec2;
	/// Radius of the entity's selection circle
	fn selection_radius(&self, ent: EntityId) -> f32;
	/// Diplomatic relation of faction `a` towards faction `b`
	fn diplomacy(&self, a: usize, b: usize) -> Option<DiplomacyState>;
	/// Whether the entity is visible through the fog of war to the player
	fn visible_to_player(&self, ent: EntityId) -> bool;
	/// Bitmask of every faction at war with `faction`
	fn enemy_factions(&self, faction: usize) -> u16 {
		let mut enemies = 0;
		for other in 0..MAX_FACTIONS {
			if self.diplomacy(other, faction) == Some(DiplomacyState::War) {
				enemies |= 1 << other;
			}
		}
		enemies
	}
	/// Bitmask of the enemies of an optional faction, no faction has no enemies
	fn enemies_of(&self, faction: Option<usize>) -> u16 {
		faction.map_or(0, |f| self.enemy_factions(f))
	}
	/// Whether `ent` is a visible, combat capable entity of a faction at war with `faction`
	fn is_enemy_entity(&self, faction: usize, ent: EntityId) -> bool {
		let Some(ent_faction) = self.faction_id(ent) else {
			return false;
		};
		if ent_faction == faction {
			return false;
		}
		if !self.flags(ent).contains(EntityFlags::COMBATABLE) {
			return false;
		}
		if self.diplomacy(faction, ent_faction) != Some(DiplomacyState::War) {
			return false;
		}
		self.visible_to_player(ent)
	}
}

/// State of a single entity captured in a [WorldSnapshot]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct EntityRecord {
	/// Owning faction
	pub faction: usize,
	/// Behavioural flags
	pub flags: EntityFlags,
	/// Whether the entity is dying
	pub dying: bool,
	/// World `x-z` position
	pub position: Vec2,
	/// Selection circle radius
	pub selection_radius: f32,
	/// Bounding box, used when the entity is a building
	pub obb: Option<Obb>,
	/// Visible through the fog of war
	pub visible: bool,
}

impl EntityRecord {
	/// A visible, living, combat capable unit
	pub fn unit(faction: usize, position: Vec2, selection_radius: f32) -> Self {
		EntityRecord {
			faction,
			flags: EntityFlags::COMBATABLE,
			dying: false,
			position,
			selection_radius,
			obb: None,
			visible: true,
		}
	}
	/// A visible, combat capable building occupying `obb`
	pub fn building(faction: usize, obb: Obb) -> Self {
		EntityRecord {
			faction,
			flags: EntityFlags::COMBATABLE | EntityFlags::BUILDING,
			dying: false,
			position: obb.get_center(),
			selection_radius: 0.0,
			obb: Some(obb),
			visible: true,
		}
	}
}

/// Immutable copy of the entity and diplomacy state used by field builders
/// running away from the main world
#[derive(Component, Clone, Debug)]
pub struct WorldSnapshot {
	/// Entities keyed by id
	entities: BTreeMap<EntityId, EntityRecord>,
	/// Row-major `MAX_FACTIONS x MAX_FACTIONS` diplomacy table
	diplomacy: Vec<DiplomacyState>,
}

impl Default for WorldSnapshot {
	fn default() -> Self {
		WorldSnapshot {
			entities: BTreeMap::new(),
			diplomacy: vec![DiplomacyState::Peace; MAX_FACTIONS * MAX_FACTIONS],
		}
	}
}

impl WorldSnapshot {
	/// Record the state of an entity, replacing any previous record
	pub fn insert_entity(&mut self, ent: EntityId, record: EntityRecord) {
		self.entities.insert(ent, record);
	}
	/// Forget an entity
	pub fn remove_entity(&mut self, ent: EntityId) -> Option<EntityRecord> {
		self.entities.remove(&ent)
	}
	/// The recorded state of an entity
	pub fn get_entity(&self, ent: EntityId) -> Option<&EntityRecord> {
		self.entities.get(&ent)
	}
	/// Set the relation between two factions in both directions
	pub fn set_diplomacy(&mut self, a: usize, b: usize, state: DiplomacyState) {
		if a >= MAX_FACTIONS || b >= MAX_FACTIONS {
			panic!(
				"Factions {} and {} must both be below {}",
				a, b, MAX_FACTIONS
			);
		}
		self.diplomacy[a * MAX_FACTIONS + b] = state;
		self.diplomacy[b * MAX_FACTIONS + a] = state;
	}
}

impl QueryContext for WorldSnapshot {
	fn ents_in_rect(&self, min: Vec2, max: Vec2, out: &mut Vec<EntityId>) {
		let rect = Rect::from_corners(min, max);
		out.extend(
			self.entities
				.iter()
				.filter(|(_, e)| rect.contains(e.position))
				.map(|(id, _)| *id),
		);
	}
	fn faction_id(&self, ent: EntityId) -> Option<usize> {
		self.entities.get(&ent).map(|e| e.faction)
	}
	fn flags(&self, ent: EntityId) -> EntityFlags {
		self.entities
			.get(&ent)
			.map_or(EntityFlags::NONE, |e| e.flags)
	}
	fn is_dying(&self, ent: EntityId) -> bool {
		self.entities.get(&ent).is_some_and(|e| e.dying)
	}
	fn obb(&self, ent: EntityId) -> Option<Obb> {
		self.entities.get(&ent).and_then(|e| e.obb)
	}
	fn position(&self, ent: EntityId) -> Vec2 {
		self.entities
			.get(&ent)
			.map_or(Vec2::ZERO, |e| e.position)
	}
	fn selection_radius(&self, ent: EntityId) -> f32 {
		self.entities
			.get(&ent)
			.map_or(0.0, |e| e.selection_radius)
	}
	fn diplomacy(&self, a: usize, b: usize) -> Option<DiplomacyState> {
		if a >= MAX_FACTIONS || b >= MAX_FACTIONS {
			return None;
		}
		Some(self.diplomacy[a * MAX_FACTIONS + b])
	}
	fn visible_to_player(&self, ent: EntityId) -> bool {
		self.entities.get(&ent).is_some_and(|e| e.visible)
	}
}
