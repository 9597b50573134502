//! Logic relating to [FlowField] generation and caching. Requests are queued
//! by their [FieldKey] and built together across the [ComputeTaskPool], each
//! task owning a single [Workspace] it reuses for every field of its batch
//!

use std::collections::BTreeMap;
use std::time::Duration;

use crate::prelude::*;
use bevy::prelude::*;
use bevy::tasks::{ComputeTaskPool, TaskPool};

/// Cache key of a built [FlowField]. Factions at war with different
/// factions see different tiles as blocked, so the requesting faction is part
/// of the key alongside the [FieldId]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct FieldKey {
	/// Identity of the chunk, layer and target
	id: FieldId,
	/// Faction the field was built for
	faction: Option<usize>,
}

impl FieldKey {
	/// Create a new instance of [FieldKey]
	pub fn new(id: FieldId, faction: Option<usize>) -> Self {
		FieldKey { id, faction }
	}
	pub fn get_id(&self) -> FieldId {
		self.id
	}
	pub fn get_faction(&self) -> Option<usize> {
		self.faction
	}
}

/// Everything needed to build one [FlowField]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldRequest {
	/// Chunk the field covers
	chunk: ChunkCoord,
	/// Layer of the grid to navigate
	layer: NavLayer,
	/// Faction of the agents using the field, [None] for a faction-less query
	faction: Option<usize>,
	/// What the field leads towards
	target: FieldTarget,
}

impl FieldRequest {
	/// Create a new instance of [FieldRequest]
	pub fn new(chunk: ChunkCoord, layer: NavLayer, faction: Option<usize>, target: FieldTarget) -> Self {
		FieldRequest {
			chunk,
			layer,
			faction,
			target,
		}
	}
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
	pub fn get_layer(&self) -> NavLayer {
		self.layer
	}
	pub fn get_faction(&self) -> Option<usize> {
		self.faction
	}
	pub fn get_target(&self) -> &FieldTarget {
		&self.target
	}
	/// Identity of the field, ignoring the faction
	pub fn id(&self) -> FieldId {
		FieldId::new(self.chunk, &self.target, self.layer)
	}
	/// Cache key of the field
	pub fn key(&self) -> FieldKey {
		FieldKey::new(self.id(), self.faction)
	}
	/// Build the field described by the request
	pub fn build(&self, grid: &NavGrid, ctx: &impl QueryContext, ws: &mut Workspace) -> FlowField {
		let mut field = FlowField::new(self.chunk, self.target, grid.get_resolution());
		field.update(grid, self.layer, self.faction, ctx, ws);
		field
	}
}

/// A generated [FlowField] and when it was made
#[derive(Clone, Debug)]
pub struct CachedField {
	/// The field
	field: FlowField,
	/// Elapsed app time when the field was generated
	time_generated: Duration,
}

impl CachedField {
	pub fn get_field(&self) -> &FlowField {
		&self.field
	}
	pub fn get_time_generated(&self) -> Duration {
		self.time_generated
	}
}

/// Queue of requested fields and the fields already built, keyed by [FieldKey]
#[derive(Component, Default)]
pub struct FieldCache {
	/// Fields waiting to be built
	queue: BTreeMap<FieldKey, FieldRequest>,
	/// Fields agents can steer by
	fields: BTreeMap<FieldKey, CachedField>,
}

impl FieldCache {
	/// Get the map of built fields
	pub fn get(&self) -> &BTreeMap<FieldKey, CachedField> {
		&self.fields
	}
	/// Get a [FlowField] by its key. Returns [None] if the cache doesn't contain a record
	pub fn get_field(&self, key: FieldKey) -> Option<&FlowField> {
		self.fields.get(&key).map(|c| &c.field)
	}
	/// Whether a field is built or waiting to be
	pub fn contains(&self, key: FieldKey) -> bool {
		self.fields.contains_key(&key) || self.queue.contains_key(&key)
	}
	pub fn get_queue(&self) -> &BTreeMap<FieldKey, FieldRequest> {
		&self.queue
	}
	pub fn get_queue_mut(&mut self) -> &mut BTreeMap<FieldKey, FieldRequest> {
		&mut self.queue
	}
	pub fn add_to_queue(&mut self, request: FieldRequest) {
		self.queue.insert(request.key(), request);
	}
	/// Insert a [FlowField] generated at `elapsed_duration`
	pub fn insert_field(&mut self, key: FieldKey, elapsed_duration: Duration, field: FlowField) {
		self.fields.insert(
			key,
			CachedField {
				field,
				time_generated: elapsed_duration,
			},
		);
	}
	/// Remove a field from the cache
	pub fn remove_field(&mut self, key: FieldKey) {
		self.fields.remove(&key);
	}
	/// Drop every built or queued field whose id fails `keep`
	fn retain_ids(&mut self, keep: impl Fn(&FieldId) -> bool) {
		self.fields.retain(|key, _| keep(&key.id));
		self.queue.retain(|key, _| keep(&key.id));
	}
	/// Drop every built or queued field of `chunk` on `layer`.
	///
	/// The portal, enemies and entity fields of the surrounding chunks are
	/// dropped too, portal fields depend on the islands across their edge and
	/// the padded window of enemies and entity fields overlaps `chunk`
	pub fn invalidate(&mut self, layer: NavLayer, chunk: ChunkCoord) {
		self.retain_ids(|id| {
			if id.layer() != layer {
				return true;
			}
			if id.chunk() == chunk {
				return false;
			}
			!is_adjacent(id.chunk(), chunk) || id.target_kind() == FieldTargetKind::Tile
		});
	}
	/// Drop the fields made stale by a change to a single tile on `layer`.
	///
	/// Every field of the tile's chunk goes along with the portal fields of
	/// the surrounding chunks. Their enemies and entity fields are only
	/// dropped when their padded window covers the tile
	pub fn invalidate_tile(&mut self, res: &MapResolution, layer: NavLayer, tile: &TileDesc) {
		let own = tile.get_chunk();
		let abs = res.abs_of(tile);
		self.retain_ids(|id| {
			if id.layer() != layer {
				return true;
			}
			let chunk = id.chunk();
			if chunk == own {
				return false;
			}
			if !is_adjacent(chunk, own) {
				return true;
			}
			match id.target_kind() {
				FieldTargetKind::Tile => true,
				FieldTargetKind::Portal | FieldTargetKind::PortalMask => false,
				FieldTargetKind::Enemies | FieldTargetKind::Entity => {
					!padded_chunk_region(res, chunk).contains(abs)
				}
			}
		});
	}
	/// Drop every field generated more than `max_age` before `now`
	pub fn purge_older_than(&mut self, now: Duration, max_age: Duration) {
		let mut to_purge = Vec::new();
		for (key, cached) in self.fields.iter() {
			if now.saturating_sub(cached.time_generated) > max_age {
				to_purge.push(*key);
			}
		}
		for key in to_purge.iter() {
			self.remove_field(*key);
		}
	}
}

/// Whether two different chunks share an edge or a corner
fn is_adjacent(a: ChunkCoord, b: ChunkCoord) -> bool {
	a != b
		&& a.get_row().abs_diff(b.get_row()) <= 1
		&& a.get_column().abs_diff(b.get_column()) <= 1
}

/// How long generated fields are kept around
#[derive(Resource, Clone, Copy, Debug, Reflect)]
#[reflect(Resource)]
pub struct FieldCacheSettings {
	/// Fields older than this are purged
	pub max_field_age: Duration,
}

impl Default for FieldCacheSettings {
	fn default() -> Self {
		FieldCacheSettings {
			max_field_age: Duration::from_secs(900),
		}
	}
}

/// A request to generate the [FlowField] of a chunk towards a target
#[derive(Event)]
pub struct EventFieldRequest {
	/// Chunk the field should cover
	chunk: ChunkCoord,
	/// Layer to navigate
	layer: NavLayer,
	/// Faction of the requesting agents
	faction_id: Option<usize>,
	/// What the field should lead towards
	target: FieldTarget,
}

impl EventFieldRequest {
	/// Create a new instance of [EventFieldRequest]
	#[cfg(not(tarpaulin_include))]
	pub fn new(chunk: ChunkCoord, layer: NavLayer, faction_id: Option<usize>, target: FieldTarget) -> Self {
		EventFieldRequest {
			chunk,
			layer,
			faction_id,
			target,
		}
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_chunk(&self) -> ChunkCoord {
		self.chunk
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_layer(&self) -> NavLayer {
		self.layer
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_faction_id(&self) -> Option<usize> {
		self.faction_id
	}
	#[cfg(not(tarpaulin_include))]
	pub fn get_target(&self) -> FieldTarget {
		self.target
	}
}

/// Process [EventFieldRequest] into the [FieldCache] queue, skipping fields
/// which are already built or queued
#[cfg(not(tarpaulin_include))]
pub fn event_insert_field_queue(
	mut events: EventReader<EventFieldRequest>,
	mut cache_q: Query<(&mut FieldCache, &NavGridSnapshot)>,
) {
	for event in events.read() {
		for (mut cache, snapshot) in cache_q.iter_mut() {
			if !snapshot.get().get_resolution().contains_chunk(event.get_chunk()) {
				warn!("Ignoring field request for {:?}, it lies outside of the map", event.get_chunk());
				continue;
			}
			let request = FieldRequest::new(
				event.get_chunk(),
				event.get_layer(),
				event.get_faction_id(),
				event.get_target(),
			);
			if !cache.contains(request.key()) {
				cache.add_to_queue(request);
			}
		}
	}
}

/// Build every queued field. The queue is split into one batch per thread of
/// the [ComputeTaskPool] and the results stored with the current elapsed time
#[cfg(not(tarpaulin_include))]
pub fn process_field_queue(
	mut cache_q: Query<(&mut FieldCache, &NavGridSnapshot, &WorldSnapshot)>,
	time: Res<Time>,
) {
	let pool = ComputeTaskPool::get_or_init(TaskPool::default);
	for (mut cache, snapshot, world) in &mut cache_q {
		if cache.get_queue().is_empty() {
			continue;
		}
		let requests: Vec<(FieldKey, FieldRequest)> =
			std::mem::take(cache.get_queue_mut()).into_iter().collect();
		let grid = snapshot.get();
		let batch_size = requests.len().div_ceil(pool.thread_num().max(1));
		let built = pool.scope(|s| {
			for batch in requests.chunks(batch_size) {
				s.spawn(async move {
					let mut ws = Workspace::for_resolution(grid.get_resolution());
					batch
						.iter()
						.map(|(key, request)| (*key, request.build(grid, world, &mut ws)))
						.collect::<Vec<_>>()
				});
			}
		});
		let elapsed = time.elapsed();
		for (key, field) in built.into_iter().flatten() {
			cache.insert_field(key, elapsed, field);
		}
		debug!("Built {} fields", requests.len());
	}
}

/// Purge any [FlowField]s older than [FieldCacheSettings::max_field_age]
#[cfg(not(tarpaulin_include))]
pub fn cleanup_old_fields(
	mut q_cache: Query<&mut FieldCache>,
	settings: Res<FieldCacheSettings>,
	time: Res<Time>,
) {
	for mut cache in q_cache.iter_mut() {
		cache.purge_older_than(time.elapsed(), settings.max_field_age);
	}
}

#[rustfmt::skip]
#[cfg(test)]
mod tests {
	use super::*;
	fn request(chunk: ChunkCoord, layer: NavLayer) -> FieldRequest {
		FieldRequest::new(chunk, layer, None, FieldTarget::Tile(FieldCell::new(0, 0)))
	}
	#[test]
	fn queued_fields_are_contained() {
		let mut cache = FieldCache::default();
		let r = request(ChunkCoord::new(0, 0), NavLayer::Ground1x1);
		assert!(!cache.contains(r.key()));
		cache.add_to_queue(r);
		assert!(cache.contains(r.key()));
		assert!(cache.get_field(r.key()).is_none());
	}
	#[test]
	fn invalidate_only_matching_layer_and_chunk() {
		let res = MapResolution::new(2, 1, 2, 2);
		let mut cache = FieldCache::default();
		let a = request(ChunkCoord::new(0, 0), NavLayer::Ground1x1);
		let b = request(ChunkCoord::new(0, 1), NavLayer::Ground1x1);
		let c = request(ChunkCoord::new(0, 0), NavLayer::Ground3x3);
		for r in [a, b, c] {
			cache.insert_field(r.key(), Duration::ZERO, FlowField::new(r.get_chunk(), *r.get_target(), &res));
		}
		cache.add_to_queue(a);
		cache.invalidate(NavLayer::Ground1x1, ChunkCoord::new(0, 0));
		assert!(!cache.contains(a.key()));
		assert!(cache.contains(b.key()));
		assert!(cache.contains(c.key()));
	}
	#[test]
	fn factions_are_cached_apart() {
		let res = MapResolution::new(1, 1, 2, 2);
		let mut cache = FieldCache::default();
		let target = FieldTarget::Tile(FieldCell::new(0, 0));
		let a = FieldRequest::new(ChunkCoord::new(0, 0), NavLayer::Ground1x1, Some(0), target);
		let b = FieldRequest::new(ChunkCoord::new(0, 0), NavLayer::Ground1x1, Some(2), target);
		assert_eq!(a.id(), b.id());
		cache.insert_field(a.key(), Duration::ZERO, FlowField::new(a.get_chunk(), target, &res));
		assert!(cache.contains(a.key()));
		assert!(!cache.contains(b.key()));
		cache.add_to_queue(b);
		assert_eq!(1, cache.get_queue().len());
		cache.invalidate(NavLayer::Ground1x1, ChunkCoord::new(0, 0));
		assert!(!cache.contains(a.key()));
		assert!(!cache.contains(b.key()));
	}
	#[test]
	fn invalidate_reaches_neighbouring_chunks() {
		let res = MapResolution::new(3, 3, 4, 4);
		let mut cache = FieldCache::default();
		let centre = ChunkCoord::new(1, 1);
		let near = ChunkCoord::new(0, 0);
		let east = ChunkCoord::new(1, 2);
		let tile = FieldRequest::new(near, NavLayer::Ground1x1, None, FieldTarget::Tile(FieldCell::new(0, 0)));
		let mask = FieldRequest::new(near, NavLayer::Ground1x1, None, FieldTarget::PortalMask(1));
		let enemies = FieldRequest::new(east, NavLayer::Ground1x1, Some(0), FieldTarget::Enemies(EnemiesDesc::new(0, east)));
		let other_layer = FieldRequest::new(near, NavLayer::Air, None, FieldTarget::PortalMask(1));
		for r in [tile, mask, enemies, other_layer] {
			cache.insert_field(r.key(), Duration::ZERO, FlowField::new(r.get_chunk(), *r.get_target(), &res));
		}
		cache.invalidate(NavLayer::Ground1x1, centre);
		assert!(cache.contains(tile.key()));
		assert!(!cache.contains(mask.key()));
		assert!(!cache.contains(enemies.key()));
		assert!(cache.contains(other_layer.key()));
	}
	#[test]
	fn invalidate_tile_within_padded_window() {
		let res = MapResolution::new(3, 1, 6, 6);
		let mut cache = FieldCache::default();
		let left = ChunkCoord::new(0, 0);
		let right = ChunkCoord::new(0, 2);
		let enemies = |chunk| FieldRequest::new(chunk, NavLayer::Ground1x1, Some(0), FieldTarget::Enemies(EnemiesDesc::new(0, chunk)));
		for r in [enemies(left), enemies(right)] {
			cache.insert_field(r.key(), Duration::ZERO, FlowField::new(r.get_chunk(), *r.get_target(), &res));
		}
		// column 0 of the middle chunk lies in the padded window of the left
		// chunk but not of the right one
		cache.invalidate_tile(&res, NavLayer::Ground1x1, &TileDesc::from_parts(0, 1, 2, 0));
		assert!(!cache.contains(enemies(left).key()));
		assert!(cache.contains(enemies(right).key()));
	}
	#[test]
	fn purge_old() {
		let res = MapResolution::new(1, 1, 2, 2);
		let mut cache = FieldCache::default();
		let r = request(ChunkCoord::new(0, 0), NavLayer::Ground1x1);
		cache.insert_field(r.key(), Duration::from_secs(10), FlowField::new(r.get_chunk(), *r.get_target(), &res));
		cache.purge_older_than(Duration::from_secs(100), Duration::from_secs(90));
		assert!(cache.contains(r.key()));
		cache.purge_older_than(Duration::from_secs(101), Duration::from_secs(90));
		assert!(!cache.contains(r.key()));
	}
	#[test]
	fn request_builds_field() {
		let grid = NavGrid::new(MapResolution::new(1, 1, 3, 3));
		let world = WorldSnapshot::default();
		let mut ws = Workspace::for_resolution(grid.get_resolution());
		let target = FieldTarget::Tile(FieldCell::new(0, 0));
		let field = FieldRequest::new(ChunkCoord::new(0, 0), NavLayer::Ground1x1, None, target).build(&grid, &world, &mut ws);
		assert_eq!(Ordinal::Zero, field.get_field_cell_value(FieldCell::new(0, 0)));
		assert_eq!(Ordinal::North, field.get_field_cell_value(FieldCell::new(2, 0)));
		assert_eq!(Ordinal::West, field.get_field_cell_value(FieldCell::new(0, 2)));
	}
}
