//! Pure simulation state and per-tick transitions.
//!
//! Nothing in this module touches the DOM, the canvas, or audio. The game
//! layer owns a [`World`], feeds it shoot commands and ticks, and turns the
//! returned [`WorldEvent`]s into side effects. All randomness comes through
//! an injected [`Rng`] so tests can run the whole simulation deterministically
//! with a seeded generator.

pub mod entities;

use crate::engine::{Point, Size};
use entities::{Cat, Character, Particle, Projectile, Zombie, SPRITE_SIZE};
use rand::Rng;

/// Duration of one simulation tick, matching the render loop's fixed step.
pub const FRAME_DT_MS: f64 = 1.0 / 60.0 * 1000.0;

pub const ZOMBIE_SPEED: f64 = 2.0;
pub const PROJECTILE_SPEED: f64 = 8.0;
pub const PROJECTILE_SIZE: f64 = 10.0;

pub const PARTICLES_PER_BURST: usize = 20;
pub const PARTICLE_LIFESPAN: u32 = 100;
pub const PARTICLE_FADE: f64 = 0.02;
const PARTICLE_SPREAD: f64 = 6.0;

pub const INITIAL_SPAWN_INTERVAL_MS: f64 = 2000.0;
pub const MIN_SPAWN_INTERVAL_MS: f64 = 500.0;
const SPAWN_INTERVAL_DECREMENT_MS: f64 = 50.0;

/// Things that happened during a tick which the caller has to react to
/// (sounds, score display). The state itself is already updated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEvent {
    ZombieKilled { at: Point },
    GameOver,
}

pub struct World {
    pub character: Character,
    pub cat: Cat,
    pub zombies: Vec<Zombie>,
    pub projectiles: Vec<Projectile>,
    pub particles: Vec<Particle>,
    pub score: u32,
    pub bounds: Size,
    game_over: bool,
    spawn_timer_ms: f64,
    spawn_interval_ms: f64,
}

impl World {
    pub fn new(bounds: Size) -> Self {
        let character = Character::new(bounds);
        let cat = Cat::new(&character);
        World {
            character,
            cat,
            zombies: Vec::new(),
            projectiles: Vec::new(),
            particles: Vec::new(),
            score: 0,
            bounds,
            game_over: false,
            spawn_timer_ms: 0.0,
            spawn_interval_ms: INITIAL_SPAWN_INTERVAL_MS,
        }
    }

    /// One-way flag; once true, [`shoot`](Self::shoot) and
    /// [`step`](Self::step) become no-ops.
    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn spawn_interval_ms(&self) -> f64 {
        self.spawn_interval_ms
    }

    /// Fire a projectile from the character's center toward `target`, and
    /// turn the character (and cat) along the shot.
    pub fn shoot(&mut self, target: Point) {
        if self.game_over {
            return;
        }
        let origin = self.character.center();
        let angle = (target.y - origin.y).atan2(target.x - origin.x);
        self.projectiles.push(Projectile::new(
            origin,
            Point {
                x: angle.cos() * PROJECTILE_SPEED,
                y: angle.sin() * PROJECTILE_SPEED,
            },
            PROJECTILE_SIZE,
        ));
        self.character.face_along(angle);
        self.cat.follow(&self.character);
    }

    /// Advance the simulation by one fixed tick : zombies, projectiles,
    /// particles, then the spawn timer. Every collection pass builds a
    /// surviving list (or uses `retain_mut`) so each live entity is
    /// evaluated exactly once per tick, removals included.
    pub fn step(&mut self, rng: &mut impl Rng) -> Vec<WorldEvent> {
        if self.game_over {
            return Vec::new();
        }
        let mut events = Vec::new();

        // zombies close in on the character
        let target = self.character.position;
        let character_bounds = self.character.bounds();
        for zombie in &mut self.zombies {
            zombie.advance_toward(target);
            zombie.advance_animation();
            if !self.game_over && zombie.bounds().intersects(&character_bounds) {
                self.game_over = true;
                events.push(WorldEvent::GameOver);
            }
        }

        // projectiles : integrate, cull at the canvas edge, then resolve
        // hits; a hit consumes both the projectile and the zombie
        let mut surviving = Vec::with_capacity(self.projectiles.len());
        for mut projectile in self.projectiles.drain(..) {
            projectile.advance();
            if projectile.out_of_bounds(self.bounds) {
                continue;
            }
            let hit = self
                .zombies
                .iter()
                .position(|zombie| projectile.bounds().intersects(&zombie.bounds()));
            match hit {
                Some(index) => {
                    let zombie = self.zombies.remove(index);
                    self.score += 1;
                    let at = zombie.center();
                    burst_particles(&mut self.particles, at, rng);
                    events.push(WorldEvent::ZombieKilled { at });
                }
                None => surviving.push(projectile),
            }
        }
        self.projectiles = surviving;

        self.particles.retain_mut(|particle| particle.advance(PARTICLE_FADE));

        // spawn cadence tightens 50ms per spawn down to the floor
        self.spawn_timer_ms += FRAME_DT_MS;
        if self.spawn_timer_ms >= self.spawn_interval_ms {
            self.spawn_timer_ms = 0.0;
            self.zombies.push(spawn_zombie(self.bounds, rng));
            if self.spawn_interval_ms > MIN_SPAWN_INTERVAL_MS {
                self.spawn_interval_ms -= SPAWN_INTERVAL_DECREMENT_MS;
            }
        }

        self.cat.follow(&self.character);

        events
    }
}

/// Pick a uniform random edge, then a uniform coordinate along it. Top and
/// left spawns sit one full cell off-canvas so zombies walk in rather than
/// pop in.
fn spawn_zombie(bounds: Size, rng: &mut impl Rng) -> Zombie {
    let position = match rng.gen_range(0..4) {
        0 => Point {
            x: rng.gen_range(0.0..bounds.width),
            y: -SPRITE_SIZE,
        },
        1 => Point {
            x: bounds.width,
            y: rng.gen_range(0.0..bounds.height),
        },
        2 => Point {
            x: rng.gen_range(0.0..bounds.width),
            y: bounds.height,
        },
        _ => Point {
            x: -SPRITE_SIZE,
            y: rng.gen_range(0.0..bounds.height),
        },
    };
    Zombie::new(position, ZOMBIE_SPEED)
}

fn burst_particles(particles: &mut Vec<Particle>, at: Point, rng: &mut impl Rng) {
    for _ in 0..PARTICLES_PER_BURST {
        particles.push(Particle {
            position: at,
            velocity: Point {
                x: (rng.gen::<f64>() - 0.5) * PARTICLE_SPREAD,
                y: (rng.gen::<f64>() - 0.5) * PARTICLE_SPREAD,
            },
            size: rng.gen_range(2.0..7.0),
            alpha: 1.0,
            lifespan: PARTICLE_LIFESPAN,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::entities::*;
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const BOUNDS: Size = Size {
        width: 800.0,
        height: 600.0,
    };

    fn world() -> World {
        World::new(BOUNDS)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn character_starts_centered_facing_down() {
        let w = world();
        assert_eq!(w.character.position.x, 400.0 - 32.0);
        assert_eq!(w.character.position.y, 300.0 - 32.0);
        assert_eq!(w.character.facing, Facing::Down);
        assert_eq!(w.score, 0);
        assert!(w.zombies.is_empty());
        assert!(!w.game_over());
    }

    #[test]
    fn facing_rows_match_atlas_layout() {
        assert_eq!(Facing::Up.character_row(), 0);
        assert_eq!(Facing::Left.character_row(), 1);
        assert_eq!(Facing::Down.character_row(), 2);
        assert_eq!(Facing::Right.character_row(), 3);

        assert_eq!(Facing::Up.cat_row(), 0);
        assert_eq!(Facing::Left.cat_row(), 0);
        assert_eq!(Facing::Down.cat_row(), 1);
        assert_eq!(Facing::Right.cat_row(), 1);
    }

    #[test]
    fn shoot_travels_along_atan2_of_click() {
        let mut w = world();
        let origin = w.character.center();
        let target = Point {
            x: origin.x + 30.0,
            y: origin.y - 40.0,
        };
        w.shoot(target);

        assert_eq!(w.projectiles.len(), 1);
        let p = &w.projectiles[0];
        let expected = (target.y - origin.y).atan2(target.x - origin.x);
        assert_relative_eq!(p.velocity.y.atan2(p.velocity.x), expected, epsilon = 1e-12);
        let speed = (p.velocity.x * p.velocity.x + p.velocity.y * p.velocity.y).sqrt();
        assert_relative_eq!(speed, PROJECTILE_SPEED, epsilon = 1e-9);
        assert_eq!(p.position, origin);
    }

    #[test]
    fn shoot_turns_character_and_cat() {
        let mut w = world();
        let origin = w.character.center();

        w.shoot(Point {
            x: origin.x + 100.0,
            y: origin.y + 1.0,
        });
        assert_eq!(w.character.facing, Facing::Right);

        w.shoot(Point {
            x: origin.x - 1.0,
            y: origin.y - 100.0,
        });
        assert_eq!(w.character.facing, Facing::Up);
        assert_eq!(w.character.facing.cat_row(), 0);

        // cat stays glued to the character
        assert_eq!(w.cat.position.x, w.character.position.x + 32.0);
        assert_eq!(w.cat.position.y, w.character.position.y);
    }

    #[test]
    fn zombie_on_top_of_target_does_not_produce_nan() {
        let target = Point { x: 100.0, y: 100.0 };
        let mut zombie = Zombie::new(target, ZOMBIE_SPEED);
        zombie.advance_toward(target);
        assert!(zombie.position.x.is_finite());
        assert!(zombie.position.y.is_finite());
        assert_eq!(zombie.position, target);
    }

    #[test]
    fn zombie_walk_cycle_wraps_after_four_frames() {
        let mut zombie = Zombie::new(Point::default(), ZOMBIE_SPEED);
        for expected in [1, 2, 3, 0] {
            for _ in 0..ANIMATION_SPEED {
                zombie.advance_animation();
            }
            assert_eq!(zombie.frame_x, expected);
        }
    }

    #[test]
    fn projectile_leaving_any_edge_is_culled() {
        let mut w = world();
        // one flying off the right edge, one off the top; both must go in
        // the same tick (splice-during-iteration used to skip the second)
        w.projectiles.push(Projectile::new(
            Point {
                x: BOUNDS.width - 1.0,
                y: 300.0,
            },
            Point {
                x: PROJECTILE_SPEED,
                y: 0.0,
            },
            PROJECTILE_SIZE,
        ));
        w.projectiles.push(Projectile::new(
            Point { x: 300.0, y: 1.0 },
            Point {
                x: 0.0,
                y: -PROJECTILE_SPEED,
            },
            PROJECTILE_SIZE,
        ));
        let events = w.step(&mut rng());
        assert!(w.projectiles.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn hit_removes_both_scores_once_and_bursts() {
        let mut w = world();
        let zombie_at = Point { x: 100.0, y: 100.0 };
        w.zombies.push(Zombie::new(zombie_at, 0.0));
        // projectile that lands inside the zombie after one integration
        w.projectiles.push(Projectile::new(
            Point {
                x: zombie_at.x + 20.0,
                y: zombie_at.y + 20.0 - PROJECTILE_SPEED,
            },
            Point {
                x: 0.0,
                y: PROJECTILE_SPEED,
            },
            PROJECTILE_SIZE,
        ));

        let events = w.step(&mut rng());

        assert_eq!(w.score, 1);
        assert!(w.zombies.is_empty());
        assert!(w.projectiles.is_empty());
        // burst spawned at the zombie's former center, then advanced once
        assert_eq!(w.particles.len(), PARTICLES_PER_BURST);
        let center = Point {
            x: zombie_at.x + 32.0,
            y: zombie_at.y + 32.0,
        };
        assert!(events.contains(&WorldEvent::ZombieKilled { at: center }));
        for particle in &w.particles {
            assert!((particle.position.x - center.x).abs() <= PARTICLE_SPREAD / 2.0);
            assert!((particle.position.y - center.y).abs() <= PARTICLE_SPREAD / 2.0);
            assert!(particle.size >= 2.0 && particle.size < 7.0);
        }
    }

    #[test]
    fn two_kills_in_one_tick_both_count() {
        let mut w = world();
        for x in [100.0, 300.0] {
            w.zombies.push(Zombie::new(Point { x, y: 100.0 }, 0.0));
            w.projectiles.push(Projectile::new(
                Point {
                    x: x + 20.0,
                    y: 120.0 - PROJECTILE_SPEED,
                },
                Point {
                    x: 0.0,
                    y: PROJECTILE_SPEED,
                },
                PROJECTILE_SIZE,
            ));
        }
        let events = w.step(&mut rng());
        assert_eq!(w.score, 2);
        assert!(w.zombies.is_empty());
        assert!(w.projectiles.is_empty());
        assert_eq!(w.particles.len(), 2 * PARTICLES_PER_BURST);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn particles_fade_out_and_disappear() {
        let mut w = world();
        burst_particles(
            &mut w.particles,
            Point { x: 50.0, y: 50.0 },
            &mut rng(),
        );
        let mut r = rng();
        // alpha hits zero after 1/FADE ticks, well inside the lifespan
        for _ in 0..PARTICLE_LIFESPAN {
            w.step(&mut r);
        }
        assert!(w.particles.is_empty());
    }

    #[test]
    fn spawn_interval_decays_to_floor() {
        let mut w = world();
        let mut r = rng();
        // run long enough for the cadence to bottom out; kill nothing and
        // keep zombies from ever reaching the character
        for _ in 0..4000 {
            w.step(&mut r);
            w.zombies.clear();
        }
        assert_eq!(w.spawn_interval_ms(), MIN_SPAWN_INTERVAL_MS);
        // another spawn cycle must not push it below the floor
        for _ in 0..40 {
            w.step(&mut r);
            w.zombies.clear();
        }
        assert_eq!(w.spawn_interval_ms(), MIN_SPAWN_INTERVAL_MS);
    }

    #[test]
    fn game_over_is_one_way_and_freezes_the_world() {
        let mut w = world();
        let mut r = rng();
        w.zombies
            .push(Zombie::new(w.character.position, ZOMBIE_SPEED));
        let events = w.step(&mut r);
        assert!(events.contains(&WorldEvent::GameOver));
        assert!(w.game_over());

        w.projectiles.push(Projectile::new(
            Point { x: 10.0, y: 10.0 },
            Point {
                x: PROJECTILE_SPEED,
                y: 0.0,
            },
            PROJECTILE_SIZE,
        ));
        let zombies_before = w.zombies.len();
        let projectile_before = w.projectiles[0].position;

        assert!(w.step(&mut r).is_empty());
        assert_eq!(w.zombies.len(), zombies_before);
        assert_eq!(w.projectiles[0].position, projectile_before);

        w.shoot(Point { x: 0.0, y: 0.0 });
        assert_eq!(w.projectiles.len(), 1);
    }
}
