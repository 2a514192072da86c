#[macro_use]
mod browser;
pub mod engine;
pub mod game;
pub mod world;

use engine::{GameLoop, Size};
use game::GraveyardShift;
use wasm_bindgen::prelude::*;

// ==================== Main Functions ====================
/// Main entry for the WebAssembly module
/// - sizes the canvas to the viewport
/// - wires click-to-shoot and the start button
/// - starts the game loop once the start button is pressed
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task on the local thread, for the wasm
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        if let Err(err) = run().await {
            log!("Could not start Graveyard Shift : {:#?}", err);
        }
    });

    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let (width, height) = browser::size_canvas_to_window()?;

    let clicks = engine::new_click_queue();
    let canvas = browser::canvas()?;
    engine::attach_click_queue(&canvas, clicks.clone())?;
    let game = GraveyardShift::new(clicks, Size { width, height });

    // gate on the start button, then drop the modal out of the way
    engine::wait_for_click(&browser::start_button()?).await?;
    browser::hide_modal()?;

    GameLoop::start(game).await
}
