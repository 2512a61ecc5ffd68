//! Invader Strike entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::HtmlCanvasElement;

    use invader_strike::Tuning;
    use invader_strike::audio::WebAudio;
    use invader_strike::input::KeyState;
    use invader_strike::renderer::{
        CameraController, ProceduralShip, RenderError, RenderState, pack,
    };
    use invader_strike::sim::{GamePhase, GameState, RoundOutcome};

    /// Keys whose default browser action (scrolling) is suppressed
    const CAPTURED_KEYS: [&str; 5] = [
        "Space",
        "ArrowLeft",
        "ArrowRight",
        "ArrowUp",
        "ArrowDown",
    ];

    const VOLUME_STEP: f32 = 0.1;

    /// Game instance holding all state
    struct Game {
        state: GameState,
        keys: KeyState,
        audio: WebAudio,
        muted: bool,
        camera: CameraController,
        render_state: Option<RenderState>,
        last_time: f64,
    }

    impl Game {
        fn new(seed: u64, tuning: Tuning, width: u32, height: u32) -> Self {
            Self {
                state: GameState::new(seed, tuning),
                keys: KeyState::new(),
                audio: WebAudio::new(),
                muted: false,
                camera: CameraController::new(width, height),
                render_state: None,
                last_time: 0.0,
            }
        }

        fn update(&mut self, dt: f32, time: f64) {
            self.state.update(&self.keys, &mut self.audio, dt, time);
            self.camera.set_offset(self.state.camera_offset);
        }

        /// Render the current frame
        fn render(&mut self) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            let batch = pack(&self.state.snapshot(), render_state.capacity());
            match render_state.render(&batch, &self.camera) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.camera.resize(width, height);
            if let Some(render_state) = self.render_state.as_mut() {
                render_state.resize(width, height);
            }
        }

        fn key_down(&mut self, code: &str) {
            match code {
                "Enter" => match self.state.phase {
                    GamePhase::StartMenu => {
                        // Browsers only allow audio after a user gesture
                        self.audio.resume();
                        self.state.start();
                    }
                    GamePhase::GameOver => self.state.restart(),
                    GamePhase::Playing => {}
                },
                "Minus" | "Equal" => {
                    let step = if code == "Equal" { VOLUME_STEP } else { -VOLUME_STEP };
                    let volume = self.audio.master_volume() + step;
                    self.audio.set_master_volume(volume);
                    log::info!("Master volume: {:.1}", self.audio.master_volume());
                }
                "KeyM" => {
                    self.muted = !self.muted;
                    self.audio.set_muted(self.muted);
                    log::info!("Audio muted: {}", self.muted);
                }
                _ => {}
            }
            self.keys.press(code);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let hud = self.state.hud();

            if let Some(el) = document.get_element_by_id("hud-score") {
                el.set_text_content(Some(&hud.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("hud-lives") {
                el.set_text_content(Some(&hud.lives.to_string()));
            }
            if let Some(el) = document.get_element_by_id("overlay") {
                let message = match (hud.phase, hud.outcome) {
                    (GamePhase::StartMenu, _) => "Press Enter to start",
                    (GamePhase::Playing, _) => "",
                    (GamePhase::GameOver, Some(RoundOutcome::Cleared)) => {
                        "Swarm cleared! Press Enter"
                    }
                    (GamePhase::GameOver, _) => "Game over - press Enter",
                };
                el.set_text_content(Some(message));
            }
        }
    }

    /// Tuning overrides from `<script id="tuning" type="application/json">`
    fn load_tuning(document: &web_sys::Document) -> Tuning {
        let Some(json) = document
            .get_element_by_id("tuning")
            .and_then(|el| el.text_content())
        else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring invalid tuning document: {e}");
                Tuning::default()
            }
        }
    }

    fn canvas_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    async fn init_renderer(
        canvas: HtmlCanvasElement,
        width: u32,
        height: u32,
    ) -> Result<RenderState, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        RenderState::new(surface, &adapter, width, height, &ProceduralShip::default()).await
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {e}").into());
        }

        log::info!("Invader Strike starting...");

        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("No document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No #canvas element");
            return;
        };

        let (width, height) = canvas_size(&window, &canvas);
        let seed = js_sys::Date::now() as u64;
        let tuning = load_tuning(&document);
        let game = Rc::new(RefCell::new(Game::new(seed, tuning, width, height)));

        log::info!("Game initialized with seed: {}", seed);

        match init_renderer(canvas.clone(), width, height).await {
            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
            Err(e) => {
                log::error!("Renderer startup failed: {e}");
                return;
            }
        }

        setup_input_handlers(game.clone());
        setup_resize(&canvas, game.clone());

        request_animation_frame(game);

        log::info!("Invader Strike running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Key down
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let code = event.code();
                if CAPTURED_KEYS.contains(&code.as_str()) {
                    event.prevent_default();
                }
                game.borrow_mut().key_down(&code);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                game.borrow_mut().keys.release(&event.code());
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur: keyup events will never arrive
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().keys.clear();
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::UiEvent| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (width, height) = canvas_size(&window, &canvas);
            game.borrow_mut().resize(width, height);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            // First frame has no previous timestamp
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Invader Strike (native) starting...");
    log::info!("Native mode runs a headless attract round - serve the wasm build to play");

    let tuning = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| invader_strike::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => invader_strike::Tuning::default(),
    };

    attract::run(tuning);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted headless round: fire held, strafing back and forth
#[cfg(not(target_arch = "wasm32"))]
mod attract {
    use invader_strike::Tuning;
    use invader_strike::audio::NullAudio;
    use invader_strike::consts::MAX_INSTANCES;
    use invader_strike::input::KeyState;
    use invader_strike::renderer::{CameraController, pack, plan_draws};
    use invader_strike::sim::{GamePhase, GameState};

    const SEED: u64 = 0x1e_55;
    const MAX_TICKS: u32 = 60 * 120;
    const STRAFE_TICKS: u32 = 90;
    const DT: f32 = 1.0 / 60.0;

    pub fn run(tuning: Tuning) {
        let mut state = GameState::new(SEED, tuning);
        let mut camera = CameraController::new(1280, 720);
        let mut keys = KeyState::new();
        let mut audio = NullAudio;
        keys.press(state.keys.fire);
        state.start();

        let mut peak_instances = 0;
        let mut peak_draws = 0;
        let mut dropped: u64 = 0;
        let mut ticks = 0;

        while ticks < MAX_TICKS && state.phase == GamePhase::Playing {
            if ticks % STRAFE_TICKS == 0 {
                let leftward = (ticks / STRAFE_TICKS) % 2 == 0;
                let (hold, lift) = if leftward {
                    (state.keys.left[0], state.keys.right[0])
                } else {
                    (state.keys.right[0], state.keys.left[0])
                };
                keys.release(lift);
                keys.press(hold);
            }

            let now_ms = f64::from(ticks) * 1000.0 / 60.0;
            state.update(&keys, &mut audio, DT, now_ms);
            camera.set_offset(state.camera_offset);

            let batch = pack(&state.snapshot(), MAX_INSTANCES);
            peak_instances = peak_instances.max(batch.len());
            peak_draws = peak_draws.max(plan_draws(&batch).len());
            dropped += batch.dropped as u64;
            ticks += 1;
        }

        let hud = state.hud();
        log::info!(
            "Attract run ended after {} ticks: {:?} ({:?}), score {}, lives {}",
            ticks,
            hud.phase,
            hud.outcome,
            hud.score,
            hud.lives
        );
        log::info!(
            "Peak {} instances in {} draw calls, {} dropped, camera fov_y {:.3}",
            peak_instances,
            peak_draws,
            dropped,
            camera.fov_y()
        );
    }
}
