//! Level loading and management.

use glam::{Quat, Vec3};
use momentum_physics::{CollisionWorld, ContentFlags, GeometryError};
use serde::{Deserialize, Serialize};

/// A game level containing collision geometry and spawn points.
#[derive(Debug)]
pub struct Level {
    /// Level identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Collision world for physics.
    pub collision: CollisionWorld,

    /// Player spawn points.
    pub spawn_points: Vec<SpawnPoint>,

    /// Trigger volumes.
    pub triggers: Vec<TriggerVolume>,
}

/// A spawn point for players.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Feet position in world space.
    pub position: Vec3,

    /// Initial facing direction (yaw in radians).
    pub facing: f32,
}

/// What a trigger volume does to a player inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerAction {
    /// Deal damage.
    Hurt { amount: f32 },
    /// Carry the player at a fixed velocity while inside.
    Tow { velocity: Vec3 },
}

/// A trigger volume that fires when entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerVolume {
    /// Center position.
    pub position: Vec3,

    /// Half-extents of the trigger box.
    pub half_extents: Vec3,

    /// Trigger identifier for events.
    pub trigger_id: String,

    pub action: TriggerAction,

    /// Whether this trigger can fire multiple times.
    pub repeatable: bool,

    /// Whether this trigger has been activated.
    #[serde(default)]
    pub activated: bool,
}

impl TriggerVolume {
    /// Check if `point` is inside the volume, borders included.
    pub fn contains(&self, point: Vec3) -> bool {
        let min = self.position - self.half_extents;
        let max = self.position + self.half_extents;
        point.cmpge(min).all() && point.cmple(max).all()
    }
}

/// A piece of static collision geometry in a level description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Brush {
    Box {
        center: Vec3,
        half_extents: Vec3,
        #[serde(default)]
        rotation: Quat,
        contents: ContentFlags,
    },
    ConvexHull {
        points: Vec<Vec3>,
        contents: ContentFlags,
    },
    Mesh {
        vertices: Vec<Vec3>,
        indices: Vec<[u32; 3]>,
        contents: ContentFlags,
    },
}

/// Serializable description of a level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDescription {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brushes: Vec<Brush>,
    #[serde(default)]
    pub spawn_points: Vec<SpawnPoint>,
    #[serde(default)]
    pub triggers: Vec<TriggerVolume>,
}

impl Level {
    /// Create an empty level.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            collision: CollisionWorld::new(),
            spawn_points: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Build a level from its description.
    pub fn from_description(description: &LevelDescription) -> Result<Self, GeometryError> {
        let mut level = Self::new(&description.id, &description.name);

        for brush in &description.brushes {
            match brush {
                Brush::Box {
                    center,
                    half_extents,
                    rotation,
                    contents,
                } => {
                    level
                        .collision
                        .add_oriented_box(*center, *half_extents, *rotation, *contents);
                }
                Brush::ConvexHull { points, contents } => {
                    level.collision.add_convex_hull(points, *contents)?;
                }
                Brush::Mesh {
                    vertices,
                    indices,
                    contents,
                } => {
                    level.collision.add_triangle_mesh(vertices, indices, *contents)?;
                }
            }
        }

        level.spawn_points = description.spawn_points.clone();
        level.triggers = description.triggers.clone();

        log::debug!(
            "built level '{}' with {} colliders and {} spawn points",
            level.id,
            level.collision.collider_count(),
            level.spawn_points.len()
        );
        Ok(level)
    }

    /// Create the movement test course.
    ///
    /// Everything the locomotion core reacts to, laid out around the origin
    /// on an 80m floor with open edges:
    ///
    /// - a long wall at +Z for wall-running, and a glass wall at -Z that
    ///   cannot be wall-run
    /// - a 25 degree ramp at -X, steep enough to slope-slide on
    /// - a crawl space at +Z that only fits a crouched player
    /// - a 10m tower for fall damage
    /// - a hurt volume and a conveyor that tows toward +X
    pub fn test_course() -> Self {
        let mut level = Self::new("test_course", "Test Course");

        // Floor
        level.collision.add_box(
            Vec3::new(0.0, -0.5, 0.0),
            Vec3::new(40.0, 0.5, 40.0),
            ContentFlags::SOLID,
        );

        // Run wall
        level.collision.add_box(
            Vec3::new(20.0, 3.0, 4.0),
            Vec3::new(12.0, 3.0, 0.25),
            ContentFlags::SOLID,
        );

        // Glass wall
        level.collision.add_box(
            Vec3::new(20.0, 3.0, -4.0),
            Vec3::new(12.0, 3.0, 0.25),
            ContentFlags::SOLID | ContentFlags::NO_WALL_RUN,
        );

        // Ramp, rising toward +X
        level.collision.add_oriented_box(
            Vec3::new(-20.0, 0.0, 0.0),
            Vec3::new(6.0, 0.5, 3.0),
            Quat::from_rotation_z(25f32.to_radians()),
            ContentFlags::SOLID,
        );

        // Crawl space ceiling, 1.25m clearance
        level.collision.add_box(
            Vec3::new(0.0, 1.75, 20.0),
            Vec3::new(3.0, 0.5, 3.0),
            ContentFlags::SOLID,
        );

        // Tower
        level.collision.add_box(
            Vec3::new(-20.0, 5.0, -20.0),
            Vec3::new(2.0, 5.0, 2.0),
            ContentFlags::SOLID,
        );

        // Spawn points
        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(0.0, 0.05, 0.0),
            facing: 0.0,
        });
        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(-20.0, 10.05, -20.0),
            facing: 0.0,
        });
        // Lined up alongside the run wall
        level.spawn_points.push(SpawnPoint {
            position: Vec3::new(0.0, 0.05, 3.0),
            facing: 0.0,
        });

        level.triggers.push(TriggerVolume {
            position: Vec3::new(20.0, 1.0, 20.0),
            half_extents: Vec3::new(2.0, 1.0, 2.0),
            trigger_id: "hazard".to_string(),
            action: TriggerAction::Hurt { amount: 25.0 },
            repeatable: false,
            activated: false,
        });
        level.triggers.push(TriggerVolume {
            position: Vec3::new(-10.0, 1.0, 10.0),
            half_extents: Vec3::new(2.0, 1.0, 2.0),
            trigger_id: "conveyor".to_string(),
            action: TriggerAction::Tow {
                velocity: Vec3::new(8.0, 0.0, 0.0),
            },
            repeatable: true,
            activated: false,
        });

        level
    }

    /// Get a player spawn point.
    pub fn get_player_spawn(&self, index: usize) -> Option<&SpawnPoint> {
        self.spawn_points.get(index)
    }

    /// Get the number of player spawn points.
    pub fn player_spawn_count(&self) -> usize {
        self.spawn_points.len()
    }

    /// Check which triggers fire for a player at `position`.
    pub fn check_triggers(&mut self, position: Vec3) -> Vec<(String, TriggerAction)> {
        let mut triggered = Vec::new();

        for trigger in &mut self.triggers {
            if trigger.activated && !trigger.repeatable {
                continue;
            }

            if trigger.contains(position) {
                trigger.activated = true;
                triggered.push((trigger.trigger_id.clone(), trigger.action));
            }
        }

        triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use momentum_physics::{Capsule, PhysicsQuery};

    const UP: Vec3 = Vec3::Y;

    #[test]
    fn test_level_creation() {
        let level = Level::new("test", "Test Level");
        assert_eq!(level.id, "test");
        assert_eq!(level.collision.collider_count(), 0);
    }

    #[test]
    fn test_test_course() {
        let level = Level::test_course();
        assert!(level.collision.collider_count() >= 6);
        assert!(level.player_spawn_count() >= 2);
        assert!(level.get_player_spawn(level.player_spawn_count()).is_none());
    }

    #[test]
    fn test_glass_wall_refuses_wall_runs() {
        let level = Level::test_course();

        let glass = level
            .collision
            .raycast(Vec3::new(20.0, 1.0, -3.0), -Vec3::Z, 2.0, ContentFlags::MASK_PLAYER_SOLID)
            .unwrap();
        assert!(glass.contents.contains(ContentFlags::NO_WALL_RUN));

        let wall = level
            .collision
            .raycast(Vec3::new(20.0, 1.0, 3.0), Vec3::Z, 2.0, ContentFlags::MASK_PLAYER_SOLID)
            .unwrap();
        assert!(!wall.contents.contains(ContentFlags::NO_WALL_RUN));
        assert!((wall.distance - 0.75).abs() < 1e-3);
    }

    #[test]
    fn test_ramp_is_a_walkable_slope() {
        let level = Level::test_course();
        let capsule = Capsule::upright(Vec3::new(-20.0, 2.0, 0.0), UP, 1.8, 0.35);

        let hit = level
            .collision
            .capsule_cast(&capsule, -UP, 3.0, ContentFlags::MASK_PLAYER_SOLID)
            .unwrap();
        let angle = hit.normal.angle_between(UP).to_degrees();
        assert!((angle - 25.0).abs() < 0.5, "angle={angle}");
    }

    #[test]
    fn test_crawl_space_fits_only_crouched() {
        let level = Level::test_course();
        let feet = Vec3::new(0.0, 0.05, 20.0);

        let standing = Capsule::upright(feet, UP, 1.8, 0.35);
        let crouched = Capsule::upright(feet, UP, 0.9, 0.35);

        assert!(!level.collision.overlap_capsule(&standing, ContentFlags::MASK_PLAYER_SOLID).is_empty());
        assert!(level.collision.overlap_capsule(&crouched, ContentFlags::MASK_PLAYER_SOLID).is_empty());
    }

    #[test]
    fn test_trigger_check() {
        let mut level = Level::new("test", "Test");
        level.triggers.push(TriggerVolume {
            position: Vec3::new(0.0, 1.0, 0.0),
            half_extents: Vec3::new(2.0, 2.0, 2.0),
            trigger_id: "test_trigger".to_string(),
            action: TriggerAction::Hurt { amount: 10.0 },
            repeatable: false,
            activated: false,
        });

        // Inside trigger
        let triggered = level.check_triggers(Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].0, "test_trigger");
        assert_eq!(triggered[0].1, TriggerAction::Hurt { amount: 10.0 });

        // Outside trigger
        let triggered = level.check_triggers(Vec3::new(10.0, 0.0, 0.0));
        assert!(triggered.is_empty());

        // Non-repeatable shouldn't fire again
        let triggered = level.check_triggers(Vec3::new(0.0, 1.0, 0.0));
        assert!(triggered.is_empty());
    }

    #[test]
    fn test_repeatable_trigger_fires_every_check() {
        let mut level = Level::test_course();
        let inside = Vec3::new(-10.0, 0.0, 10.0);

        assert_eq!(level.check_triggers(inside).len(), 1);
        assert_eq!(level.check_triggers(inside).len(), 1);
    }

    #[test]
    fn test_level_from_json() {
        let json = r#"{
            "id": "pit",
            "name": "Pit",
            "brushes": [
                {
                    "kind": "box",
                    "center": [0.0, -0.5, 0.0],
                    "half_extents": [5.0, 0.5, 5.0],
                    "contents": 1
                },
                {
                    "kind": "convex_hull",
                    "points": [
                        [3.0, 0.0, 3.0], [4.0, 0.0, 3.0], [3.0, 0.0, 4.0], [3.0, 1.0, 3.0]
                    ],
                    "contents": 1
                }
            ],
            "spawn_points": [{ "position": [0.0, 0.05, 0.0], "facing": 0.0 }],
            "triggers": [{
                "position": [0.0, 1.0, 0.0],
                "half_extents": [1.0, 1.0, 1.0],
                "trigger_id": "lift",
                "action": { "kind": "tow", "velocity": [0.0, 4.0, 0.0] },
                "repeatable": true
            }]
        }"#;

        let description: LevelDescription = serde_json::from_str(json).unwrap();
        let level = Level::from_description(&description).unwrap();

        assert_eq!(level.name, "Pit");
        assert_eq!(level.collision.collider_count(), 2);
        assert_eq!(level.player_spawn_count(), 1);
        assert!(!level.triggers[0].activated);
    }

    #[test]
    fn test_degenerate_hull_is_rejected() {
        let description = LevelDescription {
            id: "flat".to_string(),
            name: "Flat".to_string(),
            brushes: vec![Brush::ConvexHull {
                points: vec![Vec3::ZERO, Vec3::ZERO],
                contents: ContentFlags::SOLID,
            }],
            spawn_points: Vec::new(),
            triggers: Vec::new(),
        };

        assert!(matches!(
            Level::from_description(&description),
            Err(GeometryError::DegenerateHull(2))
        ));
    }
}
