//! Terrain picking.
//!
//! The windowing layer turns a mouse position and the camera matrices into
//! a world-space [`Ray`]; this module finds where that ray meets the ground
//! by marching along it and sampling [`TerrainQuery::height_at`].

use wildmere_procedural::TerrainQuery;
use wildmere_shared::{Ray, Vec3};

/// Distance between samples along the ray.
pub const PICK_STEP: f32 = 0.1;

/// Furthest distance sampled.
pub const PICK_MAX_DISTANCE: f32 = 200.0;

/// A sample counts as a hit this close above the ground.
pub const PICK_EPSILON: f32 = 0.05;

/// First point along `ray` at or below the terrain surface.
///
/// Returns `None` if the ray stays above ground for [`PICK_MAX_DISTANCE`]
/// units or has no direction. Unloaded ground reads as height 0.
#[must_use]
pub fn ray_terrain_intersection(ray: &Ray, terrain: &dyn TerrainQuery) -> Option<Vec3> {
    if ray.direction == Vec3::ZERO {
        return None;
    }
    let steps = (PICK_MAX_DISTANCE / PICK_STEP).round() as u32;
    (0..=steps)
        .map(|i| ray.at(i as f32 * PICK_STEP))
        .find(|p| p.y <= terrain.height_at(p.x, p.z) + PICK_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Slope;

    impl TerrainQuery for Slope {
        fn try_height_at(&self, x: f32, _z: f32) -> Option<f32> {
            Some(x * 0.5)
        }
    }

    struct Flat(f32);

    impl TerrainQuery for Flat {
        fn try_height_at(&self, _x: f32, _z: f32) -> Option<f32> {
            Some(self.0)
        }
    }

    #[test]
    fn test_straight_down_hits_ground() {
        let ray = Ray::new(Vec3::new(3.0, 10.0, -4.0), Vec3::new(0.0, -1.0, 0.0));
        let hit = ray_terrain_intersection(&ray, &Flat(2.0)).unwrap();
        assert!((hit.y - 2.0).abs() <= PICK_EPSILON + PICK_STEP);
        assert_eq!((hit.x, hit.z), (3.0, -4.0));
    }

    #[test]
    fn test_angled_ray_on_slope() {
        let ray = Ray::new(Vec3::new(0.0, 20.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let hit = ray_terrain_intersection(&ray, &Slope).unwrap();
        // y = 20 - x meets y = x / 2 at x = 13.33
        assert!((hit.x - 13.333).abs() < 0.15);
        assert!(hit.y <= hit.x * 0.5 + PICK_EPSILON);
    }

    #[test]
    fn test_ray_into_sky_misses() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        assert!(ray_terrain_intersection(&ray, &Flat(0.0)).is_none());
    }

    #[test]
    fn test_ground_beyond_range_misses() {
        let ray = Ray::new(Vec3::new(0.0, 500.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(ray_terrain_intersection(&ray, &Flat(0.0)).is_none());
    }

    #[test]
    fn test_zero_direction_misses() {
        let ray = Ray::new(Vec3::new(0.0, -5.0, 0.0), Vec3::ZERO);
        assert!(ray_terrain_intersection(&ray, &Flat(0.0)).is_none());
    }
}
