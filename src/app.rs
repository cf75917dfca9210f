// app.rs
use std::time::{Duration, Instant};

use log::{error, info};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::error::RenderError;
use crate::renderer::{DebugInput, FrameContext, RecordingBackend, Renderer, RenderId};
use crate::scene::{Camera, Scene};
use crate::settings::SettingsStore;

pub type DemoRenderer = Renderer<RecordingBackend>;

/// Populates the scene and creates its render objects once the renderer is up.
pub type SceneSetup = fn(&mut DemoRenderer, &mut Scene, &mut Camera) -> Result<(), RenderError>;

const STATS_INTERVAL: Duration = Duration::from_secs(1);

pub struct App {
    renderer: Option<DemoRenderer>,
    window: Option<Window>,
    window_id: Option<WindowId>,
    scene: Scene,
    camera: Camera,
    setup: SceneSetup,
    settings_store: SettingsStore,
    debug: DebugInput,
    frames: u32,
    last_stats: Instant,
}

impl App {
    pub fn new(setup: SceneSetup) -> Self {
        Self {
            renderer: None,
            window: None,
            window_id: None,
            scene: Scene::new(),
            camera: Camera::default(),
            setup,
            settings_store: SettingsStore::default(),
            debug: DebugInput::default(),
            frames: 0,
            last_stats: Instant::now(),
        }
    }

    fn start_renderer(&mut self, window: &Window) -> Result<DemoRenderer, RenderError> {
        let settings = self.settings_store.load_or_default();
        let mut renderer = Renderer::new(RecordingBackend::new(), settings);
        renderer.initialize(window.inner_size(), &self.camera)?;

        (self.setup)(&mut renderer, &mut self.scene, &mut self.camera)?;
        renderer.post_initialize();

        // Roots were spawned in dependency order: the skybox ahead of probes
        let ctx = FrameContext::new(&self.scene, &self.camera);
        for id in render_ids(&self.scene) {
            renderer.post_initialize_render_object(&ctx, id);
        }
        renderer.backend_mut().clear_commands();
        Ok(renderer)
    }

    fn render(&mut self) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let ctx = FrameContext::new(&self.scene, &self.camera).with_editor_objects(true);
        renderer.update(&ctx, &self.debug);
        renderer.draw(&ctx);
        self.debug.recapture_reflection_probes = false;

        self.frames += 1;
        if self.last_stats.elapsed() >= STATS_INTERVAL {
            let stats = renderer.last_frame_stats();
            info!(
                "{} fps, {} batches, {} draw calls ({} deferred, {} forward, {} sprites), {} recorded commands",
                self.frames,
                stats.batches_drawn,
                stats.total_draw_calls(),
                stats.deferred_draw_calls,
                stats.forward_draw_calls,
                stats.sprite_draw_calls,
                renderer.backend().commands().len()
            );
            self.frames = 0;
            self.last_stats = Instant::now();
        }
        renderer.backend_mut().clear_commands();
    }

    fn handle_key(&mut self, key: &Key) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match key.as_ref() {
            Key::Character("r") => self.debug.recapture_reflection_probes = true,
            Key::Character("e") => self.debug.show_fxaa_edges = !self.debug.show_fxaa_edges,
            Key::Character("f") => {
                let settings = renderer.settings_mut();
                settings.enable_fxaa = !settings.enable_fxaa;
                info!("FXAA {}", if settings.enable_fxaa { "enabled" } else { "disabled" });
            }
            Key::Character("p") => {
                let settings = renderer.settings_mut();
                settings.enable_post_processing = !settings.enable_post_processing;
            }
            Key::Named(NamedKey::F5) => {
                if let Err(err) = self.settings_store.save(renderer.settings()) {
                    error!("Failed to save renderer settings: {}", err);
                }
            }
            Key::Named(NamedKey::F9) => match self.settings_store.restore_defaults() {
                Ok(settings) => *renderer.settings_mut() = settings,
                Err(err) => error!("Failed to restore default renderer settings: {}", err),
            },
            _ => {}
        }
    }

    fn shutdown(&mut self) {
        let Some(mut renderer) = self.renderer.take() else {
            return;
        };
        for id in render_ids(&self.scene) {
            renderer.destroy_render_object(id);
        }
        renderer.destroy();
    }
}

fn render_ids(scene: &Scene) -> Vec<RenderId> {
    scene
        .roots()
        .iter()
        .filter_map(|entity| scene.render_handle(*entity))
        .map(|handle| handle.render_id)
        .collect()
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(Window::default_attributes().with_title("deferred renderer")) {
            Ok(window) => window,
            Err(err) => {
                error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        match self.start_renderer(&window) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(err) => {
                error!("Failed to start renderer: {}", err);
                event_loop.exit();
                return;
            }
        }

        self.window_id = Some(window.id());
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.on_window_size_changed(size);
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let (Some(renderer), Some(w)) = (self.renderer.as_mut(), &self.window) {
                    renderer.on_window_size_changed(w.inner_size());
                }
            }
            WindowEvent::RedrawRequested => {
                self.render();
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.shutdown();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(&logical_key),
            _ => {}
        }
    }
}
