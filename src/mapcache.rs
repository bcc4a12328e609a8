//! Last-known map blocks and the per-client bookkeeping that lets a relay send
//! each client only the blocks that changed since it last saw them.

use prost::Message;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::proto::{BlockRequest, MapBlock};

/// Edge length of a block in tiles.
pub const BLOCK_SIZE: i32 = 16;

/// Block position: x and y in blocks, z in tiles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        BlockCoord { x, y, z }
    }

    pub fn of(block: &MapBlock) -> Self {
        BlockCoord {
            x: block.map_x.div_euclid(BLOCK_SIZE),
            y: block.map_y.div_euclid(BLOCK_SIZE),
            z: block.map_z,
        }
    }
}

/// Checksum of a block's serialized form.
pub fn content_hash(block: &MapBlock) -> u64 {
    xxh3_64(&block.encode_to_vec())
}

struct CachedBlock {
    block: MapBlock,
    hash: u64,
}

/// Every block seen from upstream, merged field by field. Entries are never
/// evicted.
#[derive(Default)]
pub struct MapCache {
    blocks: HashMap<BlockCoord, CachedBlock>,
}

macro_rules! take_present {
    ($dst:expr, $src:expr; $($field:ident),+ $(,)?) => {
        $(
            if !$src.$field.is_empty() {
                $dst.$field = $src.$field;
            }
        )+
    };
}

impl MapCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one upstream block. Fields the update leaves empty keep their
    /// cached contents. Returns whether the block's hash changed.
    pub fn merge(&mut self, incoming: MapBlock) -> bool {
        let coord = BlockCoord::of(&incoming);
        match self.blocks.get_mut(&coord) {
            Some(entry) => {
                let cached = &mut entry.block;
                take_present!(cached, incoming;
                    tiles,
                    materials,
                    layer_materials,
                    vein_materials,
                    base_materials,
                    magma,
                    water,
                    hidden,
                    light,
                    subterranean,
                    outside,
                    aquifer,
                    water_stagnant,
                    water_salt,
                );
                let hash = content_hash(cached);
                let changed = hash != entry.hash;
                entry.hash = hash;
                changed
            }
            None => {
                let hash = content_hash(&incoming);
                self.blocks.insert(
                    coord,
                    CachedBlock {
                        block: incoming,
                        hash,
                    },
                );
                true
            }
        }
    }

    /// Merge a batch, returning how many blocks changed.
    pub fn merge_all(&mut self, blocks: impl IntoIterator<Item = MapBlock>) -> usize {
        blocks.into_iter().map(|b| self.merge(b)).filter(|&changed| changed).count()
    }

    pub fn get(&self, coord: &BlockCoord) -> Option<&MapBlock> {
        self.blocks.get(coord).map(|e| &e.block)
    }

    pub fn hash(&self, coord: &BlockCoord) -> Option<u64> {
        self.blocks.get(coord).map(|e| e.hash)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The cached blocks inside `req` that `client` does not have yet.
    ///
    /// Z-levels are walked from the top of the box down, each level in spiral
    /// order from the box centre, until `blocks_needed` blocks are picked
    /// (the whole box when unset). Picked blocks are recorded as known.
    ///
    /// A box larger than the cache is not walked cell by cell. The cached
    /// blocks inside it are sorted into the same order instead.
    pub fn select(&self, req: &BlockRequest, client: &mut ClientHashes) -> Vec<MapBlock> {
        let bounds = Bounds::of(req);
        let volume = bounds.volume();
        let budget = match req.blocks_needed {
            Some(n) => usize::try_from(n).unwrap_or(0),
            None => volume,
        };
        if budget == 0 || volume == 0 {
            return Vec::new();
        }

        let known = client.tracking();
        let found = if volume <= self.blocks.len() {
            self.walk(&bounds, known, budget)
        } else {
            self.scan(&bounds, known, budget)
        };

        let picked: Vec<MapBlock> = found
            .into_iter()
            .map(|(coord, entry)| {
                known.insert(coord, entry.hash);
                entry.block.clone()
            })
            .collect();

        debug!(picked = picked.len(), budget, cached = self.blocks.len(), "selected blocks");
        picked
    }

    fn walk<'a>(
        &'a self,
        bounds: &Bounds,
        known: &HashMap<BlockCoord, u64>,
        budget: usize,
    ) -> Vec<(BlockCoord, &'a CachedBlock)> {
        let mut found = Vec::new();
        for z in (bounds.min_z..bounds.max_z).rev() {
            for (x, y) in Spiral::new(bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y) {
                let coord = BlockCoord { x, y, z };
                let Some(entry) = self.blocks.get(&coord) else {
                    continue;
                };
                if known.get(&coord) == Some(&entry.hash) {
                    continue;
                }
                found.push((coord, entry));
                if found.len() >= budget {
                    return found;
                }
            }
        }
        found
    }

    fn scan<'a>(
        &'a self,
        bounds: &Bounds,
        known: &HashMap<BlockCoord, u64>,
        budget: usize,
    ) -> Vec<(BlockCoord, &'a CachedBlock)> {
        let cx = i64::from(midpoint(bounds.min_x, bounds.max_x));
        let cy = i64::from(midpoint(bounds.min_y, bounds.max_y));
        let mut found: Vec<(BlockCoord, &CachedBlock)> = self
            .blocks
            .iter()
            .filter(|&(coord, entry)| {
                bounds.contains(coord) && known.get(coord) != Some(&entry.hash)
            })
            .map(|(coord, entry)| (*coord, entry))
            .collect();
        found.sort_by_key(|(c, _)| {
            (
                Reverse(c.z),
                spiral_index(i64::from(c.x) - cx, i64::from(c.y) - cy),
            )
        });
        found.truncate(budget);
        found
    }
}

#[derive(Copy, Clone, Debug)]
struct Bounds {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
    min_z: i32,
    max_z: i32,
}

impl Bounds {
    fn of(req: &BlockRequest) -> Self {
        Bounds {
            min_x: req.min_x.unwrap_or(0),
            max_x: req.max_x.unwrap_or(0),
            min_y: req.min_y.unwrap_or(0),
            max_y: req.max_y.unwrap_or(0),
            min_z: req.min_z.unwrap_or(0),
            max_z: req.max_z.unwrap_or(0),
        }
    }

    /// Cell count, saturating for boxes too large to count.
    fn volume(&self) -> usize {
        span(self.min_x, self.max_x)
            .saturating_mul(span(self.min_y, self.max_y))
            .saturating_mul(span(self.min_z, self.max_z))
    }

    fn contains(&self, c: &BlockCoord) -> bool {
        (self.min_x..self.max_x).contains(&c.x)
            && (self.min_y..self.max_y).contains(&c.y)
            && (self.min_z..self.max_z).contains(&c.z)
    }
}

fn span(min: i32, max: i32) -> usize {
    usize::try_from(i64::from(max) - i64::from(min)).unwrap_or(0)
}

/// What one downstream client already holds: block coordinate to the hash it
/// was last sent.
///
/// A client that never asked for a reset is treated as holding nothing, the
/// same as right after a reset.
#[derive(Debug, Default)]
pub struct ClientHashes {
    known: Option<HashMap<BlockCoord, u64>>,
}

impl ClientHashes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything this client was sent.
    pub fn reset(&mut self) {
        self.known = Some(HashMap::new());
    }

    /// Whether the client has reset or been sent blocks yet.
    pub fn is_tracking(&self) -> bool {
        self.known.is_some()
    }

    pub fn get(&self, coord: &BlockCoord) -> Option<u64> {
        self.known.as_ref().and_then(|m| m.get(coord).copied())
    }

    pub fn len(&self) -> usize {
        self.known.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn tracking(&mut self) -> &mut HashMap<BlockCoord, u64> {
        self.known.get_or_insert_with(HashMap::new)
    }
}

/// Coordinates of `[min_x, max_x) x [min_y, max_y)` in an outward square
/// spiral from the centre.
///
/// The walk turns 90 degrees whenever a straight run is used up and the run
/// grows by one every second turn. Steps outside the box are skipped; the
/// iterator ends once every cell in the box has been produced.
pub struct Spiral {
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
    x: i64,
    y: i64,
    dx: i64,
    dy: i64,
    run: u64,
    step: u64,
    turns: u64,
    remaining: usize,
}

impl Spiral {
    pub fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        let remaining = span(min_x, max_x).saturating_mul(span(min_y, max_y));
        Spiral {
            min_x: min_x.into(),
            max_x: max_x.into(),
            min_y: min_y.into(),
            max_y: max_y.into(),
            x: midpoint(min_x, max_x).into(),
            y: midpoint(min_y, max_y).into(),
            dx: 1,
            dy: 0,
            run: 1,
            step: 0,
            turns: 0,
            remaining,
        }
    }

    fn contains(&self, x: i64, y: i64) -> bool {
        (self.min_x..self.max_x).contains(&x) && (self.min_y..self.max_y).contains(&y)
    }

    fn advance(&mut self) {
        self.x += self.dx;
        self.y += self.dy;
        self.step += 1;
        if self.step == self.run {
            self.step = 0;
            (self.dx, self.dy) = (-self.dy, self.dx);
            self.turns += 1;
            if self.turns % 2 == 0 {
                self.run += 1;
            }
        }
    }
}

impl Iterator for Spiral {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            let (x, y) = (self.x, self.y);
            self.advance();
            if self.contains(x, y) {
                self.remaining -= 1;
                // Inside the box, so both fit in i32.
                return Some((x as i32, y as i32));
            }
        }
        None
    }
}

/// Position of the offset `(u, v)` from the centre in [`Spiral`] order.
///
/// Ring `k` (cells with `max(|u|, |v|) == k`) starts at `(k, 1 - k)` with
/// index `(2k - 1)^2`, runs up the right edge, left along the top, down the
/// left edge and right along the bottom.
fn spiral_index(u: i64, v: i64) -> u128 {
    let k = i128::from(u.unsigned_abs().max(v.unsigned_abs()));
    if k == 0 {
        return 0;
    }
    let (u, v) = (i128::from(u), i128::from(v));
    let offset = if u == k && v > -k {
        v + k - 1
    } else if v == k {
        (2 * k - 1) + (k - u)
    } else if u == -k {
        (4 * k - 1) + (k - v)
    } else {
        (6 * k - 1) + (u + k)
    };
    ((2 * k - 1) * (2 * k - 1) + offset) as u128
}

fn midpoint(min: i32, max: i32) -> i32 {
    ((i64::from(min) + i64::from(max)).div_euclid(2)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::MatPair;

    fn full_block(x: i32, y: i32, z: i32, seed: i32) -> MapBlock {
        MapBlock {
            map_x: x * BLOCK_SIZE,
            map_y: y * BLOCK_SIZE,
            map_z: z,
            tiles: vec![seed; 256],
            materials: vec![MatPair { mat_type: 0, mat_index: seed }; 256],
            layer_materials: vec![MatPair { mat_type: 1, mat_index: seed }; 256],
            vein_materials: vec![MatPair { mat_type: 2, mat_index: seed }; 256],
            base_materials: vec![MatPair { mat_type: 3, mat_index: seed }; 256],
            magma: vec![0; 256],
            water: vec![0; 256],
            ..Default::default()
        }
    }

    fn request(min: (i32, i32, i32), max: (i32, i32, i32), needed: Option<i32>) -> BlockRequest {
        BlockRequest {
            blocks_needed: needed,
            min_x: Some(min.0),
            max_x: Some(max.0),
            min_y: Some(min.1),
            max_y: Some(max.1),
            min_z: Some(min.2),
            max_z: Some(max.2),
        }
    }

    fn coords(blocks: &[MapBlock]) -> Vec<BlockCoord> {
        blocks.iter().map(BlockCoord::of).collect()
    }

    #[test]
    fn test_coord_from_tiles() {
        let block = MapBlock {
            map_x: 32,
            map_y: 48,
            map_z: -5,
            ..Default::default()
        };
        assert_eq!(BlockCoord::of(&block), BlockCoord::new(2, 3, -5));
        let negative = MapBlock {
            map_x: -16,
            map_y: -1,
            map_z: 0,
            ..Default::default()
        };
        assert_eq!(BlockCoord::of(&negative), BlockCoord::new(-1, -1, 0));
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut cache = MapCache::new();
        let original = full_block(2, 3, -5, 7);
        cache.merge(original.clone());

        let update = MapBlock {
            map_x: 32,
            map_y: 48,
            map_z: -5,
            water: vec![4; 256],
            ..Default::default()
        };
        assert!(cache.merge(update));

        let merged = cache.get(&BlockCoord::new(2, 3, -5)).unwrap();
        assert_eq!(merged.tiles, original.tiles);
        assert_eq!(merged.materials, original.materials);
        assert_eq!(merged.base_materials, original.base_materials);
        assert_eq!(merged.magma, original.magma);
        assert_eq!(merged.water, vec![4; 256]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_identical_update_keeps_hash() {
        let mut cache = MapCache::new();
        assert!(cache.merge(full_block(0, 0, 0, 1)));
        let before = cache.hash(&BlockCoord::new(0, 0, 0)).unwrap();
        assert!(!cache.merge(full_block(0, 0, 0, 1)));
        assert_eq!(cache.hash(&BlockCoord::new(0, 0, 0)), Some(before));
    }

    #[test]
    fn test_spiral_order() {
        let order: Vec<(i32, i32)> = Spiral::new(0, 3, 0, 3).collect();
        assert_eq!(
            order,
            vec![
                (1, 1),
                (2, 1),
                (2, 2),
                (1, 2),
                (0, 2),
                (0, 1),
                (0, 0),
                (1, 0),
                (2, 0),
            ]
        );
    }

    #[test]
    fn test_spiral_covers_uneven_box() {
        let mut order: Vec<(i32, i32)> = Spiral::new(-3, 5, 10, 12).collect();
        assert_eq!(order.len(), 16);
        assert_eq!(order[0], (1, 11));
        order.sort();
        order.dedup();
        assert_eq!(order.len(), 16);
        assert!(order.iter().all(|&(x, y)| (-3..5).contains(&x) && (10..12).contains(&y)));
    }

    #[test]
    fn test_spiral_empty_box() {
        assert_eq!(Spiral::new(4, 4, 0, 10).count(), 0);
        assert_eq!(Spiral::new(5, 1, 0, 10).count(), 0);
    }

    #[test]
    fn test_differential_sync() {
        let mut cache = MapCache::new();
        for x in 0..3 {
            for y in 0..3 {
                cache.merge(full_block(x, y, 0, 1));
            }
        }
        let req = request((0, 0, 0), (3, 3, 1), None);
        let mut client = ClientHashes::new();
        client.reset();

        let first = cache.select(&req, &mut client);
        assert_eq!(first.len(), 9);
        assert_eq!(client.len(), 9);

        assert!(cache.select(&req, &mut client).is_empty());

        cache.merge(MapBlock {
            map_x: 2 * BLOCK_SIZE,
            map_y: 0,
            map_z: 0,
            water: vec![7; 256],
            ..Default::default()
        });
        let third = cache.select(&req, &mut client);
        assert_eq!(coords(&third), vec![BlockCoord::new(2, 0, 0)]);

        client.reset();
        assert_eq!(cache.select(&req, &mut client).len(), 9);
    }

    #[test]
    fn test_unreset_client_gets_everything() {
        let mut cache = MapCache::new();
        cache.merge(full_block(0, 0, 0, 1));
        let mut client = ClientHashes::new();
        assert!(!client.is_tracking());
        let picked = cache.select(&request((0, 0, 0), (1, 1, 1), None), &mut client);
        assert_eq!(picked.len(), 1);
        assert!(client.is_tracking());
    }

    #[test]
    fn test_budget_spans_levels() {
        let mut cache = MapCache::new();
        for z in 0..3 {
            for x in 0..3 {
                for y in 0..3 {
                    cache.merge(full_block(x, y, z, z));
                }
            }
        }
        let mut client = ClientHashes::new();
        client.reset();

        let picked = cache.select(&request((0, 0, 0), (3, 3, 3), Some(11)), &mut client);
        assert_eq!(picked.len(), 11);
        // Top level first, then the next level down in spiral order.
        assert!(picked[..9].iter().all(|b| b.map_z == 2));
        assert_eq!(
            coords(&picked[9..]),
            vec![BlockCoord::new(1, 1, 1), BlockCoord::new(2, 1, 1)]
        );

        let rest = cache.select(&request((0, 0, 0), (3, 3, 3), Some(100)), &mut client);
        assert_eq!(rest.len(), 16);

        let none = cache.select(&request((0, 0, 0), (3, 3, 3), Some(0)), &mut client);
        assert!(none.is_empty());
    }

    #[test]
    fn test_budget_picks_nearest_to_centre() {
        let mut cache = MapCache::new();
        // Insert in an order unrelated to the spiral.
        for x in (0..5).rev() {
            for y in 0..5 {
                cache.merge(full_block(x, y, 0, 0));
            }
        }
        let mut client = ClientHashes::new();
        client.reset();

        let picked = cache.select(&request((0, 0, 0), (5, 5, 1), Some(3)), &mut client);
        assert_eq!(
            coords(&picked),
            vec![
                BlockCoord::new(2, 2, 0),
                BlockCoord::new(3, 2, 0),
                BlockCoord::new(3, 3, 0),
            ]
        );
    }

    #[test]
    fn test_uncached_coordinates_skipped() {
        let mut cache = MapCache::new();
        cache.merge(full_block(9, 9, 0, 0));
        cache.merge(full_block(0, 0, 0, 0));
        let mut client = ClientHashes::new();
        let picked = cache.select(&request((0, 0, 0), (2, 2, 1), None), &mut client);
        assert_eq!(coords(&picked), vec![BlockCoord::new(0, 0, 0)]);
    }

    #[test]
    fn test_spiral_index_matches_walk() {
        let walked: Vec<(i32, i32)> = Spiral::new(-4, 5, -4, 5).collect();
        for (i, &(x, y)) in walked.iter().enumerate() {
            assert_eq!(spiral_index(x.into(), y.into()), i as u128);
        }
    }

    #[test]
    fn test_oversized_box_is_sorted_not_walked() {
        let mut cache = MapCache::new();
        for x in -2..3 {
            for y in -2..3 {
                cache.merge(full_block(x, y, 0, 0));
                cache.merge(full_block(x, y, 1, 0));
            }
        }
        let bounds = Bounds::of(&request((-2, -2, 0), (3, 3, 2), None));
        let known = HashMap::new();
        let walked: Vec<BlockCoord> =
            cache.walk(&bounds, &known, 13).into_iter().map(|(c, _)| c).collect();
        let scanned: Vec<BlockCoord> =
            cache.scan(&bounds, &known, 13).into_iter().map(|(c, _)| c).collect();
        assert_eq!(walked, scanned);
        assert_eq!(walked.len(), 13);

        let everything = request(
            (i32::MIN, i32::MIN, i32::MIN),
            (i32::MAX, i32::MAX, i32::MAX),
            None,
        );
        let mut client = ClientHashes::new();
        let picked = cache.select(&everything, &mut client);
        assert_eq!(picked.len(), 50);
        assert_eq!(client.len(), 50);
        assert!(cache.select(&everything, &mut client).is_empty());

        let mut fresh = ClientHashes::new();
        let few = cache.select(
            &request((i32::MIN, i32::MIN, 0), (i32::MAX, i32::MAX, 2), Some(2)),
            &mut fresh,
        );
        assert_eq!(
            coords(&few),
            vec![BlockCoord::new(-1, -1, 1), BlockCoord::new(0, -1, 1)]
        );
    }
}
