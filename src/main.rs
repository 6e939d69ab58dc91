//! Neon Survivor entry point
//!
//! The browser build wires DOM events, WebGPU and Web Audio to a
//! `FrameHost`. The native build runs a headless autopilot game and logs it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use neon_survivor::Viewport;
    use neon_survivor::audio::WebAudio;
    use neon_survivor::host::{FrameHost, FrameStatus, ShellCallbacks};
    use neon_survivor::input::{InputState, Key};
    use neon_survivor::persistence::{KeyValueStore, LocalStore, MemoryStore, StoreError};
    use neon_survivor::renderer::{RenderState, VertexSurface, render};
    use neon_survivor::sim::RunConfig;
    use neon_survivor::tuning::Tuning;

    /// LocalStorage when the page allows it, otherwise an in-memory fallback
    enum BrowserStore {
        Local(LocalStore),
        Memory(MemoryStore),
    }

    impl BrowserStore {
        fn open() -> Self {
            match LocalStore::open() {
                Ok(store) => BrowserStore::Local(store),
                Err(e) => {
                    log::warn!("{e}; progress will not persist");
                    BrowserStore::Memory(MemoryStore::new())
                }
            }
        }
    }

    impl KeyValueStore for BrowserStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            match self {
                BrowserStore::Local(s) => s.get(key),
                BrowserStore::Memory(s) => s.get(key),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            match self {
                BrowserStore::Local(s) => s.set(key, value),
                BrowserStore::Memory(s) => s.set(key, value),
            }
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            match self {
                BrowserStore::Local(s) => s.remove(key),
                BrowserStore::Memory(s) => s.remove(key),
            }
        }
    }

    /// Page chrome updated from game callbacks
    struct DomShell {
        document: Document,
        run_coins: u32,
    }

    impl DomShell {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_visible(&self, id: &str, visible: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
            }
        }
    }

    impl ShellCallbacks for DomShell {
        fn on_game_over(&mut self, score: u64, victory: bool, level: u32) {
            self.set_text("game-over-title", if victory { "VICTORY" } else { "GAME OVER" });
            self.set_text("final-score", &score.to_string());
            self.set_text("final-level", &level.to_string());
            self.set_visible("game-over", true);
        }

        fn on_currency_gained(&mut self, amount: u32) {
            self.run_coins += amount;
            self.set_text("hud-coins", &self.run_coins.to_string());
        }
    }

    type Host = FrameHost<WebAudio, BrowserStore, DomShell>;

    /// Game instance holding all state
    struct Game {
        host: Host,
        input: InputState,
        render_state: Option<RenderState>,
        frame: VertexSurface,
        /// Whether a frame callback is currently scheduled
        running: bool,
        /// Offers last written to the choice menu
        shown_offers: usize,
    }

    impl Game {
        fn render(&mut self) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            render(self.host.state(), self.host.settings(), &mut self.frame);
            match render_state.render(&self.frame) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let (w, h) = render_state.size;
                    render_state.resize(w, h);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => log::error!("Out of memory!"),
                Err(e) => log::warn!("Render error: {e:?}"),
            }
        }

        /// Score, level and the upgrade menu live in the page
        fn update_hud(&mut self, document: &Document) {
            let state = self.host.state();
            let set = |id: &str, text: String| {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(&text));
                }
            };
            set("hud-score", state.score.to_string());
            set("hud-level", state.player.level.to_string());

            let offers = if state.phase.awaiting_choice() { state.offers.len() } else { 0 };
            if offers == self.shown_offers {
                return;
            }
            self.shown_offers = offers;
            if let Some(menu) = document.get_element_by_id("choices") {
                let html: String = state
                    .offers
                    .iter()
                    .take(offers)
                    .enumerate()
                    .map(|(i, o)| format!("<button data-index=\"{i}\">{}. {}</button>", i + 1, o.name()))
                    .collect();
                menu.set_inner_html(&html);
                let _ = menu.set_attribute("class", if offers > 0 { "" } else { "hidden" });
            }
        }

        fn choose(&mut self, index: usize) {
            if let Err(e) = self.host.choose_upgrade(index) {
                log::warn!("Ignored choice: {e}");
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Neon Survivor starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (css_w, css_h, width, height) = canvas_size(&canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let config = RunConfig {
            viewport: Viewport::new(css_w, css_h),
            ..RunConfig::with_seed(seed)
        };
        let shell = DomShell {
            document: document.clone(),
            run_coins: 0,
        };
        let mut host = FrameHost::new(config, Tuning::default(), WebAudio::new(), BrowserStore::open(), shell);
        if host.resume() {
            log::info!("Continuing saved run");
        }

        let idle = window
            .location()
            .search()
            .map(|q| q.contains("idle"))
            .unwrap_or(false);
        let mut input = InputState::new();
        input.idle_mode = idle;

        let game = Rc::new(RefCell::new(Game {
            host,
            input,
            render_state: None,
            frame: VertexSurface::new(),
            running: false,
            shown_offers: 0,
        }));

        log::info!("Game initialized with seed: {seed}");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match RenderState::new(surface, &adapter, width, height).await {
            Ok(mut render_state) => {
                render_state.set_logical_size(css_w, css_h);
                game.borrow_mut().render_state = Some(render_state);
            }
            Err(e) => log::error!("Rendering disabled: {e}"),
        }

        setup_input_handlers(&canvas, game.clone());
        setup_page_handlers(&canvas, game.clone());

        start_loop(game);
        log::info!("Neon Survivor running!");
    }

    /// CSS size and physical backing size of the canvas
    fn canvas_size(canvas: &HtmlCanvasElement) -> (f32, f32, u32, u32) {
        let dpr = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
        let css_w = canvas.client_width().max(1) as f32;
        let css_h = canvas.client_height().max(1) as f32;
        (css_w, css_h, (css_w as f64 * dpr) as u32, (css_h as f64 * dpr) as u32)
    }

    fn listen<E: wasm_bindgen::convert::FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        name: &str,
        handler: impl FnMut(E) + 'static,
    ) {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let _ = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };

        {
            let game = game.clone();
            listen(&window, "keydown", move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                g.host.audio_mut().resume();
                let code = event.code();
                if let Some(key) = Key::from_code(&code) {
                    g.input.key_down(key, event.repeat());
                    return;
                }
                match code.as_str() {
                    "KeyI" if !event.repeat() => {
                        g.input.idle_mode = !g.input.idle_mode;
                        log::info!("Idle mode: {}", g.input.idle_mode);
                    }
                    digit if digit.starts_with("Digit") => {
                        if let Some(n) = digit[5..].parse::<usize>().ok().filter(|n| *n > 0) {
                            g.choose(n - 1);
                        }
                    }
                    _ => {}
                }
            });
        }
        {
            let game = game.clone();
            listen(&window, "keyup", move |event: KeyboardEvent| {
                if let Some(key) = Key::from_code(&event.code()) {
                    game.borrow_mut().input.key_up(key);
                }
            });
        }
        {
            let game = game.clone();
            listen(canvas, "pointerdown", move |event: PointerEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                g.host.audio_mut().resume();
                g.input
                    .pointer_down(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
            });
        }
        {
            let game = game.clone();
            listen(canvas, "pointermove", move |event: PointerEvent| {
                game.borrow_mut()
                    .input
                    .pointer_move(Vec2::new(event.offset_x() as f32, event.offset_y() as f32));
            });
        }
        for name in ["pointerup", "pointercancel", "pointerleave"] {
            let game = game.clone();
            listen(canvas, name, move |_event: PointerEvent| {
                game.borrow_mut().input.pointer_up();
            });
        }
    }

    fn setup_page_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        // Upgrade menu buttons carry their offer index
        if let Some(menu) = document.get_element_by_id("choices") {
            let game = game.clone();
            listen(&menu, "click", move |event: web_sys::Event| {
                let index = event
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                    .and_then(|el| el.get_attribute("data-index"))
                    .and_then(|i| i.parse::<usize>().ok());
                if let Some(index) = index {
                    game.borrow_mut().choose(index);
                }
            });
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let game = game.clone();
            listen(&btn, "click", move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                {
                    let mut g = game.borrow_mut();
                    g.host.restart(seed);
                    g.shown_offers = 0;
                }
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    if let Some(el) = document.get_element_by_id("game-over") {
                        let _ = el.set_attribute("class", "hidden");
                    }
                }
                start_loop(game.clone());
            });
        }

        // Snapshot and release input when the tab is hidden or loses focus
        {
            let game = game.clone();
            let doc = document.clone();
            listen(&document, "visibilitychange", move |_event: web_sys::Event| {
                if doc.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    g.input.release_all();
                    g.host.suspend();
                    log::info!("Run suspended (tab hidden)");
                }
            });
        }
        {
            let game = game.clone();
            listen(&window, "blur", move |_event: web_sys::FocusEvent| {
                game.borrow_mut().input.release_all();
            });
        }

        {
            let canvas = canvas.clone();
            listen(&window, "resize", move |_event: web_sys::Event| {
                let (css_w, css_h, width, height) = canvas_size(&canvas);
                canvas.set_width(width);
                canvas.set_height(height);
                let mut g = game.borrow_mut();
                if let Some(rs) = g.render_state.as_mut() {
                    rs.resize(width, height);
                    rs.set_logical_size(css_w, css_h);
                }
                g.host.resize(Viewport::new(css_w, css_h));
            });
        }
    }

    fn start_loop(game: Rc<RefCell<Game>>) {
        {
            let mut g = game.borrow_mut();
            if g.running {
                return;
            }
            g.running = true;
        }
        request_animation_frame(game);
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let status = {
            let mut g = game.borrow_mut();
            let input = g.input.snapshot();
            let status = g.host.frame(time, &input);
            g.render();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
            if status == FrameStatus::Stop {
                g.running = false;
            }
            status
        };

        // Paused runs keep animating; ended runs stop rescheduling
        if status == FrameStatus::Continue {
            request_animation_frame(game);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use neon_survivor::audio::NullAudio;
    use neon_survivor::consts::SIM_DT;
    use neon_survivor::host::{FrameHost, FrameStatus, ShellCallbacks};
    use neon_survivor::persistence::FileStore;
    use neon_survivor::sim::{RunConfig, TickInput, autopilot_choice};
    use neon_survivor::tuning::Tuning;

    /// Longest headless run, in simulated minutes
    const MAX_MINUTES: u64 = 20;

    struct LogShell;

    impl ShellCallbacks for LogShell {
        fn on_game_over(&mut self, score: u64, victory: bool, level: u32) {
            let verdict = if victory { "Victory" } else { "Game over" };
            log::info!("{verdict}: score {score}, level {level}");
        }

        fn on_currency_gained(&mut self, amount: u32) {
            log::debug!("+{amount} coins");
        }
    }

    fn load_tuning() -> Tuning {
        let Ok(path) = std::env::var("NEON_SURVIVOR_TUNING") else {
            return Tuning::default();
        };
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
        match parsed {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides from {path}");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning file {path}: {e}");
                Tuning::default()
            }
        }
    }

    pub fn run() {
        let seed = std::env::args()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(42);
        let data_dir = std::env::var_os("NEON_SURVIVOR_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".neon-survivor"));

        let mut host = FrameHost::new(
            RunConfig::with_seed(seed),
            load_tuning(),
            NullAudio,
            FileStore::new(data_dir),
            LogShell,
        );
        let input = TickInput {
            idle_mode: true,
            ..TickInput::default()
        };

        let frame_ms = f64::from(SIM_DT) * 1000.0;
        let max_frames = MAX_MINUTES * 60 * 60;
        let mut now = 0.0;
        for _ in 0..max_frames {
            if let Some(index) = autopilot_choice(host.state()) {
                if let Err(e) = host.choose_upgrade(index) {
                    log::warn!("Autopilot choice rejected: {e}");
                }
            }
            if host.frame(now, &input) == FrameStatus::Stop {
                break;
            }
            now += frame_ms;
        }

        let state = host.state();
        log::info!(
            "Finished after {} ticks: phase {:?}, score {}, level {}, kills {}, best {}",
            state.time_ticks,
            state.phase,
            state.score,
            state.player.level,
            state.kills,
            host.record().best_score
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Neon Survivor (native) starting headless autopilot run...");
    headless::run();
}
