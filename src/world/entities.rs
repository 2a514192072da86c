use crate::engine::{Point, Rect, Size};

/// Edge length of one atlas cell, in pixels. All three sprite sheets use
/// the same 64x64 grid.
pub const SPRITE_SIZE: f64 = 64.0;

/// Ticks between zombie walk-cycle frame advances.
pub const ANIMATION_SPEED: u32 = 10;

const CHARACTER_SCALE: f64 = 1.5;
const CAT_SCALE: f64 = 1.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    /// Atlas row for the character sheet.
    pub fn character_row(self) -> u32 {
        match self {
            Facing::Up => 0,
            Facing::Left => 1,
            Facing::Down => 2,
            Facing::Right => 3,
        }
    }

    /// Atlas row for the cat sheet, which only has back and front poses.
    pub fn cat_row(self) -> u32 {
        match self {
            Facing::Up | Facing::Left => 0,
            Facing::Down | Facing::Right => 1,
        }
    }
}

/// The player. Never moves, never dies before the run ends; only its
/// facing (and with it the atlas row) changes when a shot goes out.
#[derive(Debug, Clone)]
pub struct Character {
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub frame_x: u32,
    pub facing: Facing,
}

impl Character {
    pub fn new(canvas: Size) -> Self {
        Character {
            position: Point {
                x: canvas.width / 2.0 - SPRITE_SIZE / 2.0,
                y: canvas.height / 2.0 - SPRITE_SIZE / 2.0,
            },
            width: SPRITE_SIZE * CHARACTER_SCALE,
            height: SPRITE_SIZE * CHARACTER_SCALE,
            frame_x: 0,
            facing: Facing::Down,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Turn toward a shot fired at `angle` radians; the dominant axis of
    /// the aim vector decides the facing.
    pub fn face_along(&mut self, angle: f64) {
        let (dx, dy) = (angle.cos(), angle.sin());
        self.facing = if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if dy > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        };
    }
}

/// Companion. Purely cosmetic : tucks in beside the character and mirrors
/// its facing.
#[derive(Debug, Clone)]
pub struct Cat {
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub frame_x: u32,
}

impl Cat {
    pub fn new(character: &Character) -> Self {
        let mut cat = Cat {
            position: Point::default(),
            width: SPRITE_SIZE * CAT_SCALE,
            height: SPRITE_SIZE * CAT_SCALE,
            frame_x: 0,
        };
        cat.follow(character);
        cat
    }

    pub fn follow(&mut self, character: &Character) {
        self.position = Point {
            x: character.position.x + SPRITE_SIZE / 2.0,
            y: character.position.y,
        };
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct Zombie {
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub frame_x: u32,
    pub frame_count: u32,
    pub speed: f64,
}

impl Zombie {
    pub fn new(position: Point, speed: f64) -> Self {
        Zombie {
            position,
            width: SPRITE_SIZE,
            height: SPRITE_SIZE,
            frame_x: 0,
            frame_count: 0,
            speed,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Step toward `target` at `speed` pixels. A zombie already on top of
    /// the target stays put rather than dividing by zero.
    pub fn advance_toward(&mut self, target: Point) {
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > f64::EPSILON {
            self.position.x += dx / distance * self.speed;
            self.position.y += dy / distance * self.speed;
        }
    }

    /// Cycle the 4-column walk animation every [`ANIMATION_SPEED`] ticks.
    pub fn advance_animation(&mut self) {
        self.frame_count += 1;
        if self.frame_count >= ANIMATION_SPEED {
            self.frame_count = 0;
            self.frame_x = (self.frame_x + 1) % 4;
        }
    }
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub position: Point,
    pub velocity: Point,
    pub width: f64,
    pub height: f64,
}

impl Projectile {
    pub fn new(position: Point, velocity: Point, size: f64) -> Self {
        Projectile {
            position,
            velocity,
            width: size,
            height: size,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    pub fn advance(&mut self) {
        self.position.x += self.velocity.x;
        self.position.y += self.velocity.y;
    }

    /// True once the origin leaves the canvas on any side.
    pub fn out_of_bounds(&self, canvas: Size) -> bool {
        self.position.x < 0.0
            || self.position.x > canvas.width
            || self.position.y < 0.0
            || self.position.y > canvas.height
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Point,
    pub velocity: Point,
    pub size: f64,
    pub alpha: f64,
    pub lifespan: u32,
}

impl Particle {
    /// Integrate one tick; returns false once the particle has faded out
    /// or outlived its span and should be dropped.
    pub fn advance(&mut self, fade: f64) -> bool {
        self.position.x += self.velocity.x;
        self.position.y += self.velocity.y;
        self.alpha -= fade;
        self.lifespan = self.lifespan.saturating_sub(1);
        self.alpha > 0.0 && self.lifespan > 0
    }
}
