use super::core::{BBox, Point3};

/// Contiguous run of the index buffer rendered with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialGroup {
    /// Offset into the index buffer.
    pub start: u32,
    /// Number of indices in the run.
    pub count: u32,
    pub material_slot: u32,
}

/// Indexed triangle mesh of a road ribbon.
///
/// Vertex attributes are parallel arrays of equal length. `normals` hold the
/// per-vertex vertical axis of the road frame (a shading vector, not
/// necessarily perpendicular to the surface). Every triangle index belongs to
/// exactly one [`MaterialGroup`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoadMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub uvs: Vec<[f64; 2]>,
    pub indices: Vec<u32>,
    pub groups: Vec<MaterialGroup>,
}

impl RoadMesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of distinct material slots a renderer has to provide.
    #[must_use]
    pub fn material_slot_count(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.material_slot as usize + 1)
            .max()
            .unwrap_or(0)
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions.iter().flatten().any(|c| !c.is_finite())
    }

    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    #[must_use]
    pub fn has_valid_attribute_lengths(&self) -> bool {
        let n = self.positions.len();
        self.normals.len() == n && self.uvs.len() == n
    }

    /// Returns true if the groups tile the index buffer in order with no gaps.
    #[must_use]
    pub fn has_contiguous_groups(&self) -> bool {
        let mut cursor = 0usize;
        for group in &self.groups {
            if group.start as usize != cursor || group.count % 3 != 0 {
                return false;
            }
            cursor += group.count as usize;
        }
        cursor == self.indices.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if !self.has_valid_attribute_lengths() {
            return Err("mesh attribute buffers do not match vertex count".to_string());
        }
        if !self.has_contiguous_groups() {
            return Err("material groups do not tile the index buffer".to_string());
        }
        Ok(())
    }

    /// Positions as `[x0, y0, z0, x1, ...]` without copying.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        self.positions.as_flattened()
    }

    #[must_use]
    pub fn normals_flat(&self) -> &[f64] {
        self.normals.as_flattened()
    }

    #[must_use]
    pub fn uvs_flat(&self) -> &[f64] {
        self.uvs.as_flattened()
    }

    /// Single-precision copies for GPU upload.
    #[must_use]
    pub fn positions_f32(&self) -> Vec<f32> {
        to_f32(self.positions_flat())
    }

    #[must_use]
    pub fn normals_f32(&self) -> Vec<f32> {
        to_f32(self.normals_flat())
    }

    #[must_use]
    pub fn uvs_f32(&self) -> Vec<f32> {
        to_f32(self.uvs_flat())
    }

    #[must_use]
    pub fn bounds(&self) -> Option<BBox> {
        BBox::from_points(self.positions.iter().copied().map(Point3::from_array))
    }

    /// Approximate heap size of the buffers in bytes.
    #[must_use]
    pub fn estimated_memory_bytes(&self) -> usize {
        use std::mem::size_of;
        self.positions.len() * size_of::<[f64; 3]>()
            + self.normals.len() * size_of::<[f64; 3]>()
            + self.uvs.len() * size_of::<[f64; 2]>()
            + self.indices.len() * size_of::<u32>()
            + self.groups.len() * size_of::<MaterialGroup>()
    }
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}
