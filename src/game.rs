use crate::browser;
use crate::engine;
use crate::engine::{Game, Point, Rect, Renderer, SharedClicks, Size, Sound};
use crate::world::entities::SPRITE_SIZE;
use crate::world::{World, WorldEvent};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::join;
use rand::rngs::StdRng;
use rand::SeedableRng;
use web_sys::{Element, HtmlImageElement};

/// Top-level game type for the loop. `Loading` holds only what the session
/// needs to boot; `initialize` resolves the assets and hands back `Loaded`.
pub enum GraveyardShift {
    Loading { clicks: SharedClicks, bounds: Size },
    Loaded(Play),
}

impl GraveyardShift {
    const CHARACTER_SPRITE: &'static str = "images/characterSprite.png";
    const CAT_SPRITE: &'static str = "images/catSprite.png";
    const ZOMBIE_SPRITE: &'static str = "images/zombieSprite.png";

    const SHOOT_SOUND: &'static str = "audio/fire.mp3";
    const HIT_SOUND: &'static str = "audio/killed_zombie.mp3";
    const GAME_OVER_SOUND: &'static str = "audio/zombieEat.mp3";

    pub fn new(clicks: SharedClicks, bounds: Size) -> Self {
        GraveyardShift::Loading { clicks, bounds }
    }
}

/// Everything a running session owns : the pure world plus the browser-side
/// resources its events get translated into.
pub struct Play {
    world: World,
    rng: StdRng,
    clicks: SharedClicks,
    sprites: Sprites,
    sounds: Sounds,
    score_display: Element,
    ended: bool,
}

struct Sprites {
    character: HtmlImageElement,
    cat: HtmlImageElement,
    zombie: HtmlImageElement,
}

struct Sounds {
    shoot: Sound,
    hit: Sound,
    game_over: Sound,
}

#[async_trait(?Send)]
impl Game for GraveyardShift {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            GraveyardShift::Loading { clicks, bounds } => {
                // the three atlases are independent; load them concurrently
                let (character, cat, zombie) = join!(
                    engine::load_image(Self::CHARACTER_SPRITE),
                    engine::load_image(Self::CAT_SPRITE),
                    engine::load_image(Self::ZOMBIE_SPRITE),
                );
                let sprites = Sprites {
                    character: character
                        .with_context(|| format!("Failed to load {}", Self::CHARACTER_SPRITE))?,
                    cat: cat.with_context(|| format!("Failed to load {}", Self::CAT_SPRITE))?,
                    zombie: zombie
                        .with_context(|| format!("Failed to load {}", Self::ZOMBIE_SPRITE))?,
                };
                let sounds = Sounds {
                    shoot: Sound::new(Self::SHOOT_SOUND),
                    hit: Sound::new(Self::HIT_SOUND),
                    game_over: Sound::new(Self::GAME_OVER_SOUND),
                };
                log!("sprites loaded, starting at {}x{}", bounds.width, bounds.height);
                Ok(Box::new(GraveyardShift::Loaded(Play {
                    world: World::new(*bounds),
                    rng: StdRng::from_entropy(),
                    clicks: clicks.clone(),
                    sprites,
                    sounds,
                    score_display: browser::score_element()?,
                    ended: false,
                })))
            }
            GraveyardShift::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self) {
        let GraveyardShift::Loaded(play) = self else {
            return;
        };
        if play.ended {
            return;
        }

        // clicks queued since the last tick become shots
        let shots: Vec<Point> = play.clicks.borrow_mut().drain(..).collect();
        for target in shots {
            play.world.shoot(target);
            play.sounds.shoot.play();
        }

        for event in play.world.step(&mut play.rng) {
            match event {
                WorldEvent::ZombieKilled { .. } => {
                    play.sounds.hit.play();
                    play.score_display
                        .set_inner_html(&play.world.score.to_string());
                }
                WorldEvent::GameOver => {
                    play.sounds.game_over.play();
                    play.ended = true;
                    log!("game over, final score {}", play.world.score);
                }
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let GraveyardShift::Loaded(play) = self else {
            return;
        };
        let bounds = Rect::new(0.0, 0.0, play.world.bounds.width, play.world.bounds.height);
        renderer.fade(&bounds);

        if play.ended {
            renderer.text(
                "Game Over",
                Point {
                    x: bounds.width / 2.0 - 100.0,
                    y: bounds.height / 2.0,
                },
                "48px sans-serif",
                "red",
            );
            return;
        }

        let character = &play.world.character;
        renderer.draw_sprite(
            &play.sprites.character,
            &atlas_cell(character.frame_x, character.facing.character_row()),
            &character.bounds(),
        );
        renderer.draw_sprite(
            &play.sprites.cat,
            &atlas_cell(play.world.cat.frame_x, character.facing.cat_row()),
            &play.world.cat.bounds(),
        );
        for zombie in &play.world.zombies {
            renderer.draw_sprite(
                &play.sprites.zombie,
                &atlas_cell(zombie.frame_x, 0),
                &zombie.bounds(),
            );
        }
        for projectile in &play.world.projectiles {
            renderer.fill_rect(&projectile.bounds(), "silver");
        }
        for particle in &play.world.particles {
            renderer.fill_circle(particle.position, particle.size, "red", particle.alpha);
        }
    }

    // once the run has ended the loop stops rescheduling; the "Game Over"
    // frame above is the last one drawn
    fn running(&self) -> bool {
        match self {
            GraveyardShift::Loading { .. } => true,
            GraveyardShift::Loaded(play) => !play.ended,
        }
    }
}

fn atlas_cell(column: u32, row: u32) -> Rect {
    Rect::new(
        column as f64 * SPRITE_SIZE,
        row as f64 * SPRITE_SIZE,
        SPRITE_SIZE,
        SPRITE_SIZE,
    )
}
