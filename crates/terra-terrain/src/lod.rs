//! Per-chunk level of detail.
//!
//! Chunks are drawn from a small set of pre-tessellated copies of the patch
//! template. Level 0 is the finest; each following level halves the
//! subdivision. The level of a chunk is picked from its Chebyshev distance,
//! in chunks, to the camera chunk.

use terra_config::TerrainConfig;
use terra_mesh::Mesh;

use crate::chunk::ChunkCoord;

/// Chebyshev distance between two chunks.
pub fn ring_distance(a: ChunkCoord, b: ChunkCoord) -> u32 {
    let dx = (a.x as i64 - b.x as i64).unsigned_abs();
    let dz = (a.z as i64 - b.z as i64).unsigned_abs();
    dx.max(dz).min(u32::MAX as u64) as u32
}

/// Ring thresholds between detail levels.
///
/// `rings[i]` is the largest ring distance still drawn at level `i`; chunks
/// beyond the last threshold use the coarsest level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LodRings {
    rings: Vec<u32>,
}

impl LodRings {
    /// Thresholds are sorted and deduplicated. An empty list yields a single
    /// level.
    pub fn new(mut rings: Vec<u32>) -> Self {
        rings.sort_unstable();
        rings.dedup();
        Self { rings }
    }

    pub fn level_count(&self) -> usize {
        self.rings.len() + 1
    }

    pub fn select(&self, ring_distance: u32) -> usize {
        self.rings
            .iter()
            .position(|&ring| ring_distance <= ring)
            .unwrap_or(self.rings.len())
    }

    pub fn rings(&self) -> &[u32] {
        &self.rings
    }
}

/// Subdivision count of every detail level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TessellationLevels {
    subdivisions: Vec<u32>,
}

impl TessellationLevels {
    /// `levels` levels starting at `max_subdivision` and halving down to a
    /// minimum of one.
    pub fn new(max_subdivision: u32, levels: usize) -> Self {
        let max = max_subdivision.max(1);
        let subdivisions = (0..levels.max(1))
            .map(|level| max.checked_shr(level as u32).unwrap_or(0).max(1))
            .collect();
        Self { subdivisions }
    }

    pub fn len(&self) -> usize {
        self.subdivisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subdivisions.is_empty()
    }

    /// Subdivisions per patch edge at `level`; out-of-range levels clamp to
    /// the coarsest.
    pub fn subdivision(&self, level: usize) -> u32 {
        let last = self.subdivisions.len() - 1;
        self.subdivisions[level.min(last)]
    }

    /// Tessellate `patch` once per level.
    pub fn build_meshes(&self, patch: &Mesh) -> Vec<Mesh> {
        self.subdivisions
            .iter()
            .map(|&subdivision| patch.tessellate(subdivision))
            .collect()
    }
}

/// Maps a chunk to its detail level.
#[derive(Debug, Clone)]
pub struct LodSelector {
    rings: LodRings,
    levels: TessellationLevels,
}

impl LodSelector {
    pub fn new(rings: LodRings, max_subdivision: u32) -> Self {
        let levels = TessellationLevels::new(max_subdivision, rings.level_count());
        Self { rings, levels }
    }

    pub fn from_config(config: &TerrainConfig) -> Self {
        Self::new(LodRings::new(config.lod_rings.clone()), config.max_subdivision)
    }

    pub fn select(&self, chunk: ChunkCoord, camera_chunk: ChunkCoord) -> usize {
        self.rings.select(ring_distance(chunk, camera_chunk))
    }

    pub fn levels(&self) -> &TessellationLevels {
        &self.levels
    }

    pub fn rings(&self) -> &LodRings {
        &self.rings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terra_mesh::chunk_patch;

    #[test]
    fn test_ring_distance_is_chebyshev() {
        let origin = ChunkCoord::default();
        assert_eq!(ring_distance(origin, origin), 0);
        assert_eq!(ring_distance(origin, ChunkCoord::new(3, -7)), 7);
        assert_eq!(ring_distance(ChunkCoord::new(-2, 5), ChunkCoord::new(2, 5)), 4);
        assert_eq!(
            ring_distance(ChunkCoord::new(i32::MIN, 0), ChunkCoord::new(i32::MAX, 0)),
            u32::MAX
        );
    }

    #[test]
    fn test_rings_select_levels_inclusively() {
        let rings = LodRings::new(vec![2, 6, 16]);
        assert_eq!(rings.level_count(), 4);
        assert_eq!(rings.select(0), 0);
        assert_eq!(rings.select(2), 0);
        assert_eq!(rings.select(3), 1);
        assert_eq!(rings.select(16), 2);
        assert_eq!(rings.select(17), 3);
        assert_eq!(rings.select(u32::MAX), 3);
    }

    #[test]
    fn test_rings_are_normalized() {
        let rings = LodRings::new(vec![16, 2, 6, 6]);
        assert_eq!(rings.rings(), &[2, 6, 16]);
        assert_eq!(LodRings::new(Vec::new()).select(100), 0);
    }

    #[test]
    fn test_subdivision_halves_per_level() {
        let levels = TessellationLevels::new(32, 5);
        let subdivisions: Vec<_> = (0..5).map(|l| levels.subdivision(l)).collect();
        assert_eq!(subdivisions, vec![32, 16, 8, 4, 2]);
        assert_eq!(levels.subdivision(99), 2);
    }

    #[test]
    fn test_subdivision_floors_at_one() {
        let levels = TessellationLevels::new(4, 6);
        assert_eq!(levels.subdivision(2), 1);
        assert_eq!(levels.subdivision(5), 1);
        assert_eq!(TessellationLevels::new(0, 1).subdivision(0), 1);
        assert_eq!(TessellationLevels::new(1 << 31, 40).subdivision(39), 1);
    }

    #[test]
    fn test_build_meshes_one_per_level() {
        let levels = TessellationLevels::new(8, 3);
        let meshes = levels.build_meshes(&chunk_patch());
        let triangles: Vec<_> = meshes.iter().map(Mesh::primitive_count).collect();
        assert_eq!(triangles, vec![128, 32, 8]);
    }

    #[test]
    fn test_selector_from_default_config() {
        let selector = LodSelector::from_config(&TerrainConfig::default());
        let camera = ChunkCoord::new(10, 10);
        assert_eq!(selector.select(camera, camera), 0);
        assert_eq!(selector.select(ChunkCoord::new(74, 10), camera), 4);
        assert_eq!(selector.levels().len(), 5);
        assert_eq!(selector.levels().subdivision(0), 32);
    }
}
