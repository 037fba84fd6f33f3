//! Chunked terrain: the per-frame chunk window around the camera, the
//! distance-based level of detail for each chunk, and the tunable scene
//! parameters that feed the terrain and water shaders.

pub mod chunk;
pub mod lod;
pub mod params;

pub use chunk::{ChunkCoord, ChunkSink, ChunkWindow, dispatch_chunks};
pub use lod::{LodRings, LodSelector, TessellationLevels, ring_distance};
pub use params::{Gradient, NoiseParams, ParamPatch, SceneParams, WaterParams};
