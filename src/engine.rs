use crate::browser;
use anyhow::{anyhow, Error, Result};
// wasm is a single-threaded environment, so Rc<RefCell<_>> over Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Element, HtmlImageElement};

/// A game hosted by [`GameLoop`] : load assets asynchronously once, then
/// update and draw every frame until `running` reports false.
#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    fn update(&mut self);
    fn draw(&self, renderer: &Renderer);
    fn running(&self) -> bool;
}

// length of a simulation step in milliseconds
pub const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;

pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop {
            last_frame: browser::now()?,
            accumulated_delta: 0.0,
        };
        let renderer = Renderer {
            context: browser::context()?,
        };
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            game_loop.accumulated_delta += (perf - game_loop.last_frame) as f32;
            while game_loop.accumulated_delta > FRAME_SIZE {
                game.update();
                game_loop.accumulated_delta -= FRAME_SIZE;
            }
            game_loop.last_frame = perf;
            game.draw(&renderer);
            // game over is the only exit : simply stop rescheduling
            if game.running() {
                if let Some(closure) = f.borrow().as_ref() {
                    let _ = browser::request_animation_frame(closure);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

// ==================== Geometry ====================

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Axis-aligned overlap test, exclusive at shared edges.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

// ==================== Rendering ====================

pub struct Renderer {
    context: CanvasRenderingContext2d,
}

impl Renderer {
    /// Translucent black wash over the whole canvas; successive frames leave
    /// a motion trail instead of clearing outright.
    pub fn fade(&self, bounds: &Rect) {
        self.context.set_fill_style_str("rgba(0, 0, 0, 0.3)");
        self.context
            .fill_rect(bounds.x, bounds.y, bounds.width, bounds.height);
    }

    /// Blit one cell of a sprite atlas into a destination rect.
    pub fn draw_sprite(&self, image: &HtmlImageElement, frame: &Rect, destination: &Rect) {
        self.context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.x,
                frame.y,
                frame.width,
                frame.height,
                destination.x,
                destination.y,
                destination.width,
                destination.height,
            )
            .expect("Drawing is throwing exceptions! Unrecoverable error");
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context
            .fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    pub fn fill_circle(&self, center: Point, radius: f64, color: &str, alpha: f64) {
        self.context.set_global_alpha(alpha);
        self.context.set_fill_style_str(color);
        self.context.begin_path();
        let _ = self
            .context
            .arc(center.x, center.y, radius, 0.0, std::f64::consts::PI * 2.0);
        self.context.fill();
        self.context.set_global_alpha(1.0);
    }

    pub fn text(&self, message: &str, position: Point, font: &str, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.set_font(font);
        let _ = self.context.fill_text(message, position.x, position.y);
    }
}

// ==================== Input ====================

/// Click positions queued by the canvas event closure and drained by the
/// game's `update`. Single threaded, so a shared RefCell is all we need.
pub type SharedClicks = Rc<RefCell<Vec<Point>>>;

pub fn new_click_queue() -> SharedClicks {
    Rc::new(RefCell::new(Vec::new()))
}

/// Route canvas clicks (in element-offset coordinates) into `clicks`.
pub fn attach_click_queue(canvas: &Element, clicks: SharedClicks) -> Result<()> {
    browser::on_click(canvas, move |event: web_sys::MouseEvent| {
        clicks.borrow_mut().push(Point {
            x: event.offset_x() as f64,
            y: event.offset_y() as f64,
        });
    })
}

/// Resolve once `target` is clicked. Used to gate the loop on the start
/// button; the once-closure unregisters itself after the first click.
pub async fn wait_for_click(target: &Element) -> Result<()> {
    let (tx, rx) = channel::<()>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let callback = browser::closure_once(move || {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(());
        }
    });
    target
        .add_event_listener_with_callback("click", callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot attach click listener : {:#?}", err))?;
    callback.forget();

    rx.await
        .map_err(|err| anyhow!("Start click channel dropped : {:#?}", err))
}

// ==================== Assets ====================

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image: {:#?}",
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callbacks alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // double ? because Result<Result<(), Error>, oneshot::Canceled>
    rx.await??;

    Ok(image)
}

/// Fire-and-forget sound effect. Every `play` spins up a fresh audio
/// element so overlapping triggers each get their own playback.
pub struct Sound {
    source: String,
}

impl Sound {
    pub fn new(source: &str) -> Self {
        Sound {
            source: source.to_string(),
        }
    }

    pub fn play(&self) {
        match browser::new_audio(&self.source) {
            Ok(audio) => {
                audio.set_volume(1.0);
                // browsers may reject playback before user interaction;
                // nothing sensible to do about it mid-frame
                let _ = audio.play();
            }
            Err(err) => log!("Could not play '{}' : {:#?}", self.source, err),
        }
    }
}
