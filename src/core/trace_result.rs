// Copyright @yucwang 2026

use crate::math::constants::{ Float, FLOAT_MAX };

/// Identifies an element of geometry: an object plus a sub-element inside it
/// (a mesh and one of its triangles, for instance).
///
/// Object index 0 is reserved for "nothing was hit"; real objects start at 1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GeoId {
    pub object_index: usize,
    pub element_index: usize,
}

impl GeoId {
    pub const NONE: GeoId = GeoId { object_index: 0, element_index: 0 };

    pub fn new(object_index: usize, element_index: usize) -> Self {
        Self { object_index, element_index }
    }

    pub fn is_none(&self) -> bool {
        self.object_index == 0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TraceResult {
    pub distance: Float,
    pub geo_id: GeoId,
}

impl TraceResult {
    pub fn new(distance: Float, geo_id: GeoId) -> Self {
        Self { distance, geo_id }
    }

    pub fn miss() -> Self {
        Self { distance: FLOAT_MAX, geo_id: GeoId::NONE }
    }

    pub fn is_hit(&self) -> bool {
        !self.geo_id.is_none()
    }
}

impl Default for TraceResult {
    fn default() -> Self {
        Self::miss()
    }
}
