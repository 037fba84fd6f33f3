//! Chunk window dispatch.
//!
//! Every frame a `(C + 1) x (C + 1)` window of chunks is laid around the
//! camera chunk and handed, one chunk at a time, to a [`ChunkSink`]. The
//! window is recomputed from scratch each frame; nothing is cached or culled.

use glam::{IVec2, Vec2, Vec3};

/// Integer chunk coordinate on the XZ plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing `position`: `floor(0.5 + p / chunk_size)` on X and Z.
    ///
    /// Chunks are centred on multiples of `chunk_size`. A non-positive size
    /// maps everything to the origin chunk.
    pub fn from_position(position: Vec3, chunk_size: f32) -> Self {
        if chunk_size <= 0.0 || !chunk_size.is_finite() {
            return Self::default();
        }
        let x = (0.5 + position.x / chunk_size).floor();
        let z = (0.5 + position.z / chunk_size).floor();
        Self::new(x as i32, z as i32)
    }

    pub fn as_ivec2(self) -> IVec2 {
        IVec2::new(self.x, self.z)
    }

    pub fn as_vec2(self) -> Vec2 {
        self.as_ivec2().as_vec2()
    }
}

impl From<ChunkCoord> for IVec2 {
    fn from(coord: ChunkCoord) -> Self {
        coord.as_ivec2()
    }
}

/// Receiver of dispatched chunks.
///
/// `set_chunk` is always followed by exactly one `draw_patch`. Any other
/// per-draw state must already be in place before dispatch starts.
pub trait ChunkSink {
    fn set_chunk(&mut self, chunk: ChunkCoord);
    fn draw_patch(&mut self);
}

/// The chunk window around a centre chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    center: ChunkCoord,
    count: i32,
}

impl ChunkWindow {
    pub fn new(center: ChunkCoord, count: i32) -> Self {
        Self { center, count }
    }

    pub fn center(&self) -> ChunkCoord {
        self.center
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    /// `C >> 1`. An arithmetic shift, so odd counts extend one chunk further
    /// on the positive side.
    pub fn half(&self) -> i32 {
        self.count >> 1
    }

    /// Number of chunks in the window, `(C + 1)^2`, or zero when `C < 0`.
    pub fn len(&self) -> usize {
        if self.count < 0 {
            0
        } else {
            let side = self.count as usize + 1;
            side * side
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lowest and highest chunk coordinates of the window, inclusive.
    pub fn bounds(&self) -> Option<(ChunkCoord, ChunkCoord)> {
        if self.is_empty() {
            return None;
        }
        let min = ChunkCoord::new(self.center.x - self.half(), self.center.z - self.half());
        let max = ChunkCoord::new(min.x + self.count, min.z + self.count);
        Some((min, max))
    }

    /// Chunks in dispatch order: X outer, Z inner.
    pub fn iter(&self) -> impl Iterator<Item = ChunkCoord> + use<> {
        let (count, half, center) = (self.count, self.half(), self.center);
        (0..=count).flat_map(move |x| {
            (0..=count).map(move |z| ChunkCoord::new(x - half + center.x, z - half + center.z))
        })
    }
}

/// Emit the chunk window around `camera_chunk` into `sink` and return the
/// number of draws issued.
pub fn dispatch_chunks(camera_chunk: ChunkCoord, count: i32, sink: &mut impl ChunkSink) -> usize {
    let mut draws = 0;
    for chunk in ChunkWindow::new(camera_chunk, count).iter() {
        sink.set_chunk(chunk);
        sink.draw_patch();
        draws += 1;
    }
    draws
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        pending: Option<ChunkCoord>,
        drawn: Vec<ChunkCoord>,
    }

    impl ChunkSink for RecordingSink {
        fn set_chunk(&mut self, chunk: ChunkCoord) {
            self.pending = Some(chunk);
        }

        fn draw_patch(&mut self) {
            let chunk = self.pending.take().expect("draw without chunk");
            self.drawn.push(chunk);
        }
    }

    fn dispatch(center: ChunkCoord, count: i32) -> (usize, Vec<ChunkCoord>) {
        let mut sink = RecordingSink::default();
        let draws = dispatch_chunks(center, count, &mut sink);
        (draws, sink.drawn)
    }

    #[test]
    fn test_reference_scene_window() {
        let camera = ChunkCoord::from_position(Vec3::ZERO, 32.0);
        assert_eq!(camera, ChunkCoord::new(0, 0));

        let (draws, drawn) = dispatch(camera, 128);
        assert_eq!(draws, 16641);
        assert_eq!(drawn.len(), 16641);
        assert_eq!(drawn.first(), Some(&ChunkCoord::new(-64, -64)));
        assert_eq!(drawn.last(), Some(&ChunkCoord::new(64, 64)));
    }

    #[test]
    fn test_window_matches_offset_formula() {
        let center = ChunkCoord::new(7, -3);
        let count = 6;
        let (draws, drawn) = dispatch(center, count);
        assert_eq!(draws, 49);

        let expected: HashSet<_> = (0..=count)
            .flat_map(|x| (0..=count).map(move |z| ChunkCoord::new(x - 3 + 7, z - 3 - 3)))
            .collect();
        let actual: HashSet<_> = drawn.iter().copied().collect();
        assert_eq!(actual, expected);
        assert_eq!(actual.len(), drawn.len());
    }

    #[test]
    fn test_dispatch_order_is_x_outer_z_inner() {
        let (_, drawn) = dispatch(ChunkCoord::default(), 2);
        assert_eq!(drawn[0], ChunkCoord::new(-1, -1));
        assert_eq!(drawn[1], ChunkCoord::new(-1, 0));
        assert_eq!(drawn[3], ChunkCoord::new(0, -1));
    }

    #[test]
    fn test_odd_count_is_asymmetric() {
        let window = ChunkWindow::new(ChunkCoord::default(), 3);
        assert_eq!(window.half(), 1);
        let (min, max) = window.bounds().unwrap();
        assert_eq!(min, ChunkCoord::new(-1, -1));
        assert_eq!(max, ChunkCoord::new(2, 2));
    }

    #[test]
    fn test_zero_count_draws_camera_chunk() {
        let center = ChunkCoord::new(4, 5);
        let (draws, drawn) = dispatch(center, 0);
        assert_eq!(draws, 1);
        assert_eq!(drawn, vec![center]);
    }

    #[test]
    fn test_negative_count_draws_nothing() {
        let (draws, drawn) = dispatch(ChunkCoord::default(), -1);
        assert_eq!(draws, 0);
        assert!(drawn.is_empty());
        let window = ChunkWindow::new(ChunkCoord::default(), -8);
        assert!(window.is_empty());
        assert!(window.bounds().is_none());
    }

    #[test]
    fn test_negative_odd_count_uses_floor_shift() {
        assert_eq!(ChunkWindow::new(ChunkCoord::default(), -3).half(), -2);
    }

    #[test]
    fn test_camera_chunk_rounds_to_nearest_centre() {
        let at = |x: f32, z: f32| ChunkCoord::from_position(Vec3::new(x, 50.0, z), 32.0);
        assert_eq!(at(15.9, 0.0), ChunkCoord::new(0, 0));
        assert_eq!(at(16.0, 0.0), ChunkCoord::new(1, 0));
        assert_eq!(at(-16.0, 0.0), ChunkCoord::new(0, 0));
        assert_eq!(at(-16.1, 0.0), ChunkCoord::new(-1, 0));
        assert_eq!(at(100.0, -100.0), ChunkCoord::new(3, -3));
    }

    #[test]
    fn test_height_does_not_affect_chunk() {
        let low = ChunkCoord::from_position(Vec3::new(40.0, -100.0, 70.0), 32.0);
        let high = ChunkCoord::from_position(Vec3::new(40.0, 900.0, 70.0), 32.0);
        assert_eq!(low, high);
    }

    #[test]
    fn test_non_positive_chunk_size_maps_to_origin() {
        let coord = ChunkCoord::from_position(Vec3::new(1000.0, 0.0, 1000.0), 0.0);
        assert_eq!(coord, ChunkCoord::default());
    }
}
