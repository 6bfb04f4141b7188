//! # Terrain Chunks
//!
//! The world is tiled into square chunks keyed by integer coordinates.
//!
//! ## Grid Format
//!
//! A chunk of `chunk_size` cells owns `(chunk_size + 1)^2` vertices. The
//! extra row and column duplicate the first row and column of the
//! neighbouring chunks. Every vertex height is sampled at its *global*
//! grid index, so two neighbours compute bit-identical edge vertices
//! without ever talking to each other.
//!
//! ## Triangulation
//!
//! Each cell `(x, z)` becomes two triangles, always in this order:
//!
//! ```text
//! topLeft ──── topRight        (topLeft, bottomLeft, topRight)
//!    │  ╲         │            (topRight, bottomLeft, bottomRight)
//!    │    ╲       │
//! bottomLeft ─ bottomRight
//! ```

use bytemuck::{Pod, Zeroable};
use wildmere_shared::constants::{EXTREME_COORDINATE, MAX_CHUNK_HEIGHT_RANGE};
use wildmere_shared::{Vec2, Vec3, CHUNK_SIZE, SCALE};

use crate::biome::Biome;
use crate::heightfield::HeightFieldGenerator;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not world units).
    pub x: i32,
    /// Z coordinate (in chunks, not world units).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Largest per-axis distance to another chunk.
    #[inline]
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }

    /// Packs into a map key.
    #[inline]
    #[must_use]
    pub const fn key(self) -> ChunkKey {
        ChunkKey::pack(self)
    }

    /// All coordinates within `radius` (Chebyshev) of this one, row by row.
    pub fn neighborhood(self, radius: i32) -> impl Iterator<Item = Self> {
        (-radius..=radius)
            .flat_map(move |dz| (-radius..=radius).map(move |dx| Self::new(self.x + dx, self.z + dz)))
    }
}

/// Two signed 32-bit chunk coordinates packed into one `u64`.
///
/// X occupies the high half, Z the low half.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkKey(pub u64);

impl ChunkKey {
    /// Packs a coordinate.
    #[inline]
    #[must_use]
    pub const fn pack(coord: ChunkCoord) -> Self {
        Self(((coord.x as u32 as u64) << 32) | coord.z as u32 as u64)
    }

    /// Recovers the coordinate, sign included.
    #[inline]
    #[must_use]
    pub const fn unpack(self) -> ChunkCoord {
        ChunkCoord::new((self.0 >> 32) as u32 as i32, self.0 as u32 as i32)
    }
}

/// Grid dimensions shared by every chunk in a world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkLayout {
    /// Cells per chunk edge.
    pub chunk_size: u32,
    /// World units per cell.
    pub scale: f32,
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            scale: SCALE,
        }
    }
}

impl ChunkLayout {
    /// Creates a layout.
    #[must_use]
    pub const fn new(chunk_size: u32, scale: f32) -> Self {
        Self { chunk_size, scale }
    }

    /// Chunk edge length in world units.
    #[inline]
    #[must_use]
    pub fn world_size(&self) -> f32 {
        self.chunk_size as f32 * self.scale
    }

    /// Vertices per grid row.
    #[inline]
    #[must_use]
    pub const fn row_width(&self) -> usize {
        self.chunk_size as usize + 1
    }

    /// Vertices per chunk.
    #[inline]
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.row_width() * self.row_width()
    }

    /// Indices per chunk (two triangles per cell).
    #[inline]
    #[must_use]
    pub const fn index_count(&self) -> usize {
        6 * self.chunk_size as usize * self.chunk_size as usize
    }

    /// `floor(world / (chunk_size * scale))` on both axes.
    #[must_use]
    pub fn chunk_coord_of(&self, world_x: f32, world_z: f32) -> ChunkCoord {
        let size = self.world_size();
        ChunkCoord::new((world_x / size).floor() as i32, (world_z / size).floor() as i32)
    }

    /// World-space corner of a chunk (minimum x and z).
    #[must_use]
    pub fn origin(&self, coord: ChunkCoord) -> (f32, f32) {
        (
            self.grid_to_world(coord.x, 0),
            self.grid_to_world(coord.z, 0),
        )
    }

    /// World-space center of a chunk.
    #[must_use]
    pub fn center(&self, coord: ChunkCoord) -> (f32, f32) {
        let (x, z) = self.origin(coord);
        let half = self.world_size() * 0.5;
        (x + half, z + half)
    }

    /// World coordinate of a local grid line, computed from the global
    /// grid index so neighbouring chunks agree exactly.
    #[inline]
    #[must_use]
    pub fn grid_to_world(&self, chunk: i32, local: u32) -> f32 {
        let global = i64::from(chunk) * i64::from(self.chunk_size) + i64::from(local);
        global as f32 * self.scale
    }
}

/// One terrain vertex as the renderer receives it.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// World-space position.
    pub position: Vec3,
    /// Texture coordinate across the chunk, each component in `[0, 1]`.
    pub uv: Vec2,
}

/// Problems found by [`TerrainChunk::validate`].
///
/// Validation never rejects a chunk; issues are logged and the chunk is
/// still used.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChunkValidation {
    /// Vertices with a NaN or infinite component.
    pub non_finite_vertices: usize,
    /// Vertices with `|x|` or `|z|` beyond the extreme-coordinate limit.
    pub extreme_vertices: usize,
    /// Indices that reference a vertex past the end of the grid.
    pub invalid_indices: usize,
    /// Lowest finite height.
    pub min_height: f32,
    /// Highest finite height.
    pub max_height: f32,
}

impl ChunkValidation {
    /// Height spread across the chunk.
    #[must_use]
    pub fn height_range(&self) -> f32 {
        (self.max_height - self.min_height).max(0.0)
    }

    /// True when the height spread exceeds the configured maximum.
    #[must_use]
    pub fn excessive_height_range(&self) -> bool {
        self.height_range() > MAX_CHUNK_HEIGHT_RANGE
    }

    /// True when no check flagged anything.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.non_finite_vertices == 0
            && self.extreme_vertices == 0
            && self.invalid_indices == 0
            && !self.excessive_height_range()
    }

    fn log(&self, coord: ChunkCoord) {
        if self.non_finite_vertices > 0 {
            tracing::error!(
                "Chunk ({}, {}) has {} non-finite vertices",
                coord.x,
                coord.z,
                self.non_finite_vertices
            );
        }
        if self.invalid_indices > 0 {
            tracing::error!(
                "Chunk ({}, {}) has {} out-of-range indices",
                coord.x,
                coord.z,
                self.invalid_indices
            );
        }
        if self.extreme_vertices > 0 {
            tracing::warn!(
                "Chunk ({}, {}) has {} vertices beyond +/-{}",
                coord.x,
                coord.z,
                self.extreme_vertices,
                EXTREME_COORDINATE
            );
        }
        if self.excessive_height_range() {
            tracing::warn!(
                "Chunk ({}, {}) height range {:.1} exceeds {}",
                coord.x,
                coord.z,
                self.height_range(),
                MAX_CHUNK_HEIGHT_RANGE
            );
        }
    }
}

/// A generated terrain tile: height grid, triangle list and spawn biome.
#[derive(Clone, Debug)]
pub struct TerrainChunk {
    coord: ChunkCoord,
    layout: ChunkLayout,
    biome: Biome,
    vertices: Vec<TerrainVertex>,
    indices: Vec<u32>,
    validation: ChunkValidation,
}

impl TerrainChunk {
    /// Creates an empty, ungenerated chunk.
    #[must_use]
    pub fn new(coord: ChunkCoord, layout: ChunkLayout) -> Self {
        Self {
            coord,
            layout,
            biome: Biome::Grassland,
            vertices: Vec::new(),
            indices: Vec::new(),
            validation: ChunkValidation::default(),
        }
    }

    /// Creates and generates a chunk in one step.
    #[must_use]
    pub fn generated(coord: ChunkCoord, layout: ChunkLayout, generator: &HeightFieldGenerator) -> Self {
        let mut chunk = Self::new(coord, layout);
        chunk.generate(generator);
        chunk
    }

    /// Fills the vertex grid and index list, then validates.
    pub fn generate(&mut self, generator: &HeightFieldGenerator) {
        let size = self.layout.chunk_size;
        let row = self.layout.row_width();
        let inv_size = 1.0 / size as f32;

        self.vertices.clear();
        self.vertices.reserve_exact(self.layout.vertex_count());
        for z in 0..=size {
            let world_z = self.layout.grid_to_world(self.coord.z, z);
            for x in 0..=size {
                let world_x = self.layout.grid_to_world(self.coord.x, x);
                let height = generator.height(world_x, world_z);
                self.vertices.push(TerrainVertex {
                    position: Vec3::new(world_x, height, world_z),
                    uv: Vec2::new(x as f32 * inv_size, z as f32 * inv_size),
                });
            }
        }

        self.indices.clear();
        self.indices.reserve_exact(self.layout.index_count());
        for z in 0..size as usize {
            for x in 0..size as usize {
                let top_left = (z * row + x) as u32;
                let top_right = top_left + 1;
                let bottom_left = ((z + 1) * row + x) as u32;
                let bottom_right = bottom_left + 1;

                self.indices.extend_from_slice(&[top_left, bottom_left, top_right]);
                self.indices.extend_from_slice(&[top_right, bottom_left, bottom_right]);
            }
        }

        let (center_x, center_z) = self.layout.center(self.coord);
        self.biome = generator.classifier().classify(center_x, center_z);

        self.validation = self.validate();
        self.validation.log(self.coord);

        tracing::debug!(
            "Generated chunk ({}, {}) [{}]: {} vertices, {} indices",
            self.coord.x,
            self.coord.z,
            self.biome.name(),
            self.vertices.len(),
            self.indices.len()
        );
    }

    /// Runs every validation check over the current arrays.
    #[must_use]
    pub fn validate(&self) -> ChunkValidation {
        let mut report = ChunkValidation {
            min_height: f32::INFINITY,
            max_height: f32::NEG_INFINITY,
            ..ChunkValidation::default()
        };

        for vertex in &self.vertices {
            let p = vertex.position;
            if !p.is_finite() {
                report.non_finite_vertices += 1;
                continue;
            }
            if p.x.abs() > EXTREME_COORDINATE || p.z.abs() > EXTREME_COORDINATE {
                report.extreme_vertices += 1;
            }
            report.min_height = report.min_height.min(p.y);
            report.max_height = report.max_height.max(p.y);
        }

        let count = self.vertices.len();
        report.invalid_indices = self.indices.iter().filter(|&&i| i as usize >= count).count();

        if report.min_height > report.max_height {
            report.min_height = 0.0;
            report.max_height = 0.0;
        }
        report
    }

    /// Chunk coordinate.
    #[must_use]
    pub const fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Packed map key.
    #[must_use]
    pub const fn key(&self) -> ChunkKey {
        self.coord.key()
    }

    /// Grid layout this chunk was built with.
    #[must_use]
    pub const fn layout(&self) -> ChunkLayout {
        self.layout
    }

    /// Discrete biome at the chunk center, for spawn density tables.
    #[must_use]
    pub const fn biome(&self) -> Biome {
        self.biome
    }

    /// Vertex grid, row-major from the chunk origin.
    #[must_use]
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// Triangle list.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Validation result from the last generation.
    #[must_use]
    pub const fn validation(&self) -> ChunkValidation {
        self.validation
    }

    /// True once `generate` has filled the arrays.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        !self.vertices.is_empty()
    }

    /// Index list narrowed to 16 bits for backends that require it.
    ///
    /// Indices beyond `u16::MAX` are clamped and a warning is logged.
    #[must_use]
    pub fn indices_u16(&self) -> Vec<u16> {
        let mut clamped = 0usize;
        let out = self
            .indices
            .iter()
            .map(|&i| {
                u16::try_from(i).unwrap_or_else(|_| {
                    clamped += 1;
                    u16::MAX
                })
            })
            .collect();
        if clamped > 0 {
            tracing::warn!(
                "Chunk ({}, {}): {} indices exceed u16 range and were clamped",
                self.coord.x,
                self.coord.z,
                clamped
            );
        }
        out
    }

    /// Bilinear height at world coordinates, or `None` outside this chunk.
    #[must_use]
    pub fn try_height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        if !self.is_generated() {
            return None;
        }
        let size = self.layout.chunk_size as f32;
        let local_x = world_x / self.layout.scale - (i64::from(self.coord.x) * i64::from(self.layout.chunk_size)) as f32;
        let local_z = world_z / self.layout.scale - (i64::from(self.coord.z) * i64::from(self.layout.chunk_size)) as f32;
        if !(0.0..=size).contains(&local_x) || !(0.0..=size).contains(&local_z) {
            return None;
        }

        // A zero-size layout has one vertex and no cells to sample.
        let last_cell = (self.layout.chunk_size as usize).checked_sub(1)?;
        let x0 = (local_x.floor() as usize).min(last_cell);
        let z0 = (local_z.floor() as usize).min(last_cell);
        let fx = local_x - x0 as f32;
        let fz = local_z - z0 as f32;

        let row = self.layout.row_width();
        let h = |x: usize, z: usize| self.vertices[z * row + x].position.y;
        let top = h(x0, z0) * (1.0 - fx) + h(x0 + 1, z0) * fx;
        let bottom = h(x0, z0 + 1) * (1.0 - fx) + h(x0 + 1, z0 + 1) * fx;
        Some(top * (1.0 - fz) + bottom * fz)
    }

    /// Bilinear height at world coordinates; 0.0 outside this chunk.
    #[must_use]
    pub fn height_at(&self, world_x: f32, world_z: f32) -> f32 {
        self.try_height_at(world_x, world_z).unwrap_or(0.0)
    }
}
