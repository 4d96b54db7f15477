use crate::config::TrailSettings;
use crate::types::Vec3;
use crate::utils::polar_to_cartesian;
use std::collections::VecDeque;

/// Line of fixed length following the player, oldest vertex first.
#[derive(Debug, Clone)]
pub struct LightTrail {
    settings: TrailSettings,
    vertices: VecDeque<Vec3>,
}

impl LightTrail {
    pub fn new(settings: TrailSettings) -> Self {
        let size = settings.size.max(1);
        Self {
            settings,
            vertices: std::iter::repeat_n(Vec3::new(0.0, 0.0, settings.start_z), size).collect(),
        }
    }

    /// Drop the oldest vertex and append one at the player.
    pub fn update(&mut self, position: Vec3, heading: f32) {
        let offset = polar_to_cartesian(self.settings.offset, heading);
        self.vertices.pop_front();
        self.vertices.push_back(Vec3::new(
            position.x + offset.x,
            position.y - offset.y,
            position.z,
        ));
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vec3> {
        self.vertices.iter()
    }

    pub fn newest(&self) -> Option<&Vec3> {
        self.vertices.back()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn color(&self) -> u32 {
        self.settings.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(size: usize) -> TrailSettings {
        TrailSettings {
            size,
            ..TrailSettings::default()
        }
    }

    #[test]
    fn trail_starts_collapsed_at_spawn_height() {
        let trail = LightTrail::new(settings(4));
        assert_eq!(trail.len(), 4);
        assert!(trail.vertices().all(|v| *v == Vec3::new(0.0, 0.0, 50.0)));
    }

    #[test]
    fn update_shifts_and_keeps_length() {
        let mut trail = LightTrail::new(settings(3));
        for i in 1..=4 {
            trail.update(Vec3::new(i as f32, 0.0, 8.0), 0.0);
        }
        let xs: Vec<f32> = trail.vertices().map(|v| v.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
        assert_eq!(trail.newest(), Some(&Vec3::new(4.0, 0.0, 8.0)));
    }

    #[test]
    fn offset_mirrors_y() {
        let mut trail = LightTrail::new(TrailSettings {
            size: 2,
            offset: 10.0,
            ..TrailSettings::default()
        });
        trail.update(Vec3::zeros(), std::f32::consts::FRAC_PI_2);
        let newest = trail.newest().unwrap();
        assert!(newest.x.abs() < 1.0e-4);
        assert!((newest.y + 10.0).abs() < 1.0e-4);
    }
}
