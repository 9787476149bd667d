use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec3;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

use moonwake_assets::{AssetLoader, AssetStore, LoadRequest};
use moonwake_audio::{AudioEngine, PositionalTrack};
use moonwake_controls::{Locomotion, MoveIntent, OrbitRig, PointerLockRig};
use moonwake_input::{InputEvent, InputQueue, MoveKey};
use moonwake_render::RenderView;
use moonwake_render_wgpu::SceneRenderer;
use moonwake_scene::{ControlScheme, Scene, SceneConfig, build_scene};

#[derive(Parser)]
#[command(name = "moonwake-viewer", about = "Night-ocean scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (YAML); CLI flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset directory
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Camera control scheme
    #[arg(long, value_enum)]
    controls: Option<ControlsArg>,

    /// Disable the water surface
    #[arg(long)]
    no_water: bool,

    /// Disable the street lamp
    #[arg(long)]
    no_lamp: bool,

    /// Disable audio
    #[arg(long)]
    no_audio: bool,

    /// Enable distance fog
    #[arg(long)]
    fog: bool,

    /// Show the debug grid and axes
    #[arg(long)]
    grid: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ControlsArg {
    Orbit,
    Fps,
}

impl Cli {
    /// Resolve the effective scene configuration: file (or defaults), then
    /// flag overrides.
    fn scene_config(&self) -> Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::from_yaml(path)?,
            None => SceneConfig::default(),
        };
        if let Some(assets) = &self.assets {
            config.assets_dir = assets.clone();
        }
        if let Some(controls) = self.controls {
            config.controls = match controls {
                ControlsArg::Orbit => ControlScheme::Orbit,
                ControlsArg::Fps => ControlScheme::Fps,
            };
        }
        if self.no_water {
            config.water = false;
        }
        if self.no_lamp {
            config.lamp = false;
        }
        if self.no_audio {
            config.audio = false;
        }
        if self.fog {
            config.fog = true;
        }
        if self.grid {
            config.debug_grid = true;
        }
        Ok(config)
    }
}

/// Map a physical key to a movement intent. WASD and the arrow keys are
/// redundant bindings for the same four directions.
fn map_key(key: KeyCode) -> Option<MoveKey> {
    match key {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(MoveKey::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(MoveKey::Backward),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(MoveKey::Left),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(MoveKey::Right),
        _ => None,
    }
}

/// The active camera rig.
enum CameraRig {
    Orbit(OrbitRig),
    Fps(PointerLockRig),
}

impl CameraRig {
    fn eye(&self) -> Vec3 {
        match self {
            CameraRig::Orbit(rig) => rig.eye(),
            CameraRig::Fps(rig) => rig.position,
        }
    }

    fn forward(&self) -> Vec3 {
        match self {
            CameraRig::Orbit(rig) => (rig.target - rig.eye()).normalize_or_zero(),
            CameraRig::Fps(rig) => rig.forward(),
        }
    }

    /// Listener right vector for audio panning.
    fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    fn render_view(&self, scene: &Scene) -> RenderView {
        let view = match self {
            CameraRig::Orbit(rig) => rig.view_matrix(),
            CameraRig::Fps(rig) => rig.view_matrix(),
        };
        RenderView {
            eye: self.eye(),
            view,
            fov_degrees: scene.camera.fov_degrees,
            near: scene.camera.near,
            far: scene.camera.far,
        }
    }
}

/// Windowing side effects requested by the frame update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct UpdateEffects {
    grab_pointer: bool,
    release_pointer: bool,
}

/// Application state: scene, assets, rig, and per-frame bookkeeping.
struct AppState {
    config: SceneConfig,
    scene: Scene,
    store: AssetStore,
    loader: AssetLoader,
    queue: InputQueue,
    intent: MoveIntent,
    locomotion: Locomotion,
    rig: CameraRig,
    _audio: AudioEngine,
    track: Option<PositionalTrack>,
    show_overlay: bool,
    last_frame: Instant,
    fps: f32,
}

impl AppState {
    fn new(config: SceneConfig) -> Self {
        let scene = build_scene(&config);

        let rig = match config.controls {
            ControlScheme::Orbit => {
                CameraRig::Orbit(OrbitRig::from_pose(scene.camera.eye, scene.camera.target))
            }
            ControlScheme::Fps => {
                CameraRig::Fps(PointerLockRig::looking_at(scene.camera.eye, scene.camera.target))
            }
        };

        let mut loader = AssetLoader::new();
        request_scene_assets(&mut loader, &scene, &config);

        let mut audio = if config.audio {
            AudioEngine::new()
        } else {
            AudioEngine::disabled()
        };
        let track = scene.music.as_ref().map(|music| {
            PositionalTrack::start(
                &mut audio,
                &config.resolve(&music.path),
                music.position,
                music.volume,
                music.reference_distance,
            )
        });

        Self {
            config,
            scene,
            store: AssetStore::new(),
            loader,
            queue: InputQueue::new(),
            intent: MoveIntent::default(),
            locomotion: Locomotion::new(),
            rig,
            _audio: audio,
            track,
            show_overlay: true,
            last_frame: Instant::now(),
            fps: 0.0,
        }
    }

    /// One frame tick: drain input, advance rigs and water, merge finished
    /// loads, re-sync the audio listener.
    fn update(&mut self, dt: f32) -> UpdateEffects {
        let mut effects = UpdateEffects::default();

        for event in self.queue.drain() {
            match event {
                InputEvent::Move { key, pressed } => self.intent.set(key, pressed),
                InputEvent::PointerDelta { dx, dy } => match &mut self.rig {
                    CameraRig::Orbit(rig) => rig.pointer_delta(dx, dy),
                    CameraRig::Fps(rig) => rig.look(dx, dy),
                },
                InputEvent::PointerButton { pressed } => match &mut self.rig {
                    CameraRig::Orbit(rig) => {
                        if pressed {
                            rig.begin_drag();
                        } else {
                            rig.end_drag();
                        }
                    }
                    CameraRig::Fps(rig) => {
                        if pressed && !rig.locked() {
                            rig.lock();
                            effects.grab_pointer = true;
                        }
                    }
                },
                InputEvent::Zoom { ticks } => {
                    if let CameraRig::Orbit(rig) = &mut self.rig {
                        rig.zoom(ticks);
                    }
                }
                InputEvent::Escape => match &mut self.rig {
                    CameraRig::Orbit(rig) => rig.end_drag(),
                    CameraRig::Fps(rig) => {
                        if rig.locked() {
                            rig.unlock();
                            self.intent.clear();
                            self.locomotion.reset();
                            effects.release_pointer = true;
                        }
                    }
                },
            }
        }

        match &mut self.rig {
            CameraRig::Orbit(rig) => rig.update(dt),
            CameraRig::Fps(rig) => {
                if rig.locked() {
                    let displacement = self.locomotion.step(&self.intent, dt);
                    rig.translate(displacement);
                }
            }
        }

        self.scene.advance(dt);
        self.loader.poll(&mut self.store);

        if let Some(track) = &mut self.track {
            track.update_listener(self.rig.eye(), self.rig.right());
        }

        if dt > 0.0 {
            self.fps = self.fps * 0.95 + (1.0 / dt) * 0.05;
        }

        effects
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_overlay {
            return;
        }

        let eye = self.rig.eye();
        egui::Window::new("moonwake")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.label(format!("{:.0} fps", self.fps));
                ui.label(format!("eye: ({:.1}, {:.1}, {:.1})", eye.x, eye.y, eye.z));
                ui.label(format!(
                    "controls: {:?}  water: {}  lamp: {}",
                    self.config.controls,
                    self.scene.water.is_some(),
                    self.config.lamp
                ));
                ui.label(format!(
                    "assets: {} loaded, {} pending",
                    self.store.len(),
                    self.loader.pending()
                ));
                if let Some(water) = &self.scene.water {
                    ui.label(format!("water t: {:.1}s", water.time));
                }
                if let Some(track) = &self.track {
                    ui.label(if track.playing() {
                        "music: playing"
                    } else {
                        "music: unavailable"
                    });
                }
                ui.separator();
                match self.config.controls {
                    ControlScheme::Orbit => {
                        ui.small("Drag: orbit | Wheel: zoom | F1: overlay");
                    }
                    ControlScheme::Fps => {
                        ui.small("Click: capture | WASD/arrows: move | Esc: release | F1: overlay");
                    }
                }
            });
    }
}

/// Queue background loads for everything the scene references.
fn request_scene_assets(loader: &mut AssetLoader, scene: &Scene, config: &SceneConfig) {
    for renderable in scene.renderables.values() {
        if let moonwake_scene::MeshSource::Model { path } = &renderable.mesh {
            loader.request(LoadRequest::Model {
                key: path.clone(),
                path: config.resolve(path),
            });
        }
        if let Some(texture) = &renderable.material.texture {
            loader.request(LoadRequest::Texture {
                key: texture.clone(),
                path: config.resolve(texture),
            });
        }
    }
    if let Some(water) = &scene.water {
        loader.request(LoadRequest::Texture {
            key: water.normal_map.clone(),
            path: config.resolve(&water.normal_map),
        });
    }
    if let Some(sky) = &scene.sky {
        loader.request(LoadRequest::Cubemap {
            key: sky.faces[0].clone(),
            paths: sky.faces.clone().map(|face| config.resolve(&face)),
        });
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    renderer: Option<SceneRenderer>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(scene_config: SceneConfig) -> Self {
        Self {
            state: AppState::new(scene_config),
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            renderer: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn apply_pointer_effects(&self, effects: UpdateEffects) {
        let Some(window) = &self.window else {
            return;
        };
        if effects.grab_pointer {
            // Locked is unsupported on some platforms; confinement is the
            // closest fallback.
            if window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
                let _ = window.set_cursor_grab(CursorGrabMode::Confined);
            }
            window.set_cursor_visible(false);
        }
        if effects.release_pointer {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("moonwake")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("moonwake_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer =
            SceneRenderer::new(&device, &queue, surface_format, size.width, size.height);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.renderer = Some(renderer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(egui_winit) = &mut self.egui_winit {
            let response = egui_winit.on_window_event(self.window.as_ref().unwrap(), &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    if let Some(renderer) = &mut self.renderer {
                        renderer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if let Some(move_key) = map_key(key) {
                    self.state.queue.push(InputEvent::Move {
                        key: move_key,
                        pressed,
                    });
                } else if key == KeyCode::Escape && pressed {
                    self.state.queue.push(InputEvent::Escape);
                } else if key == KeyCode::F1 && pressed && !repeat {
                    self.state.show_overlay = !self.state.show_overlay;
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                self.state.queue.push(InputEvent::PointerButton {
                    pressed: btn_state == ElementState::Pressed,
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let ticks = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.state.queue.push(InputEvent::Zoom { ticks });
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = (now - self.state.last_frame).as_secs_f32().min(0.1);
                self.state.last_frame = now;
                let effects = self.state.update(dt);
                self.apply_pointer_effects(effects);

                let (Some(surface), Some(device), Some(queue)) =
                    (&self.surface, &self.device, &self.queue)
                else {
                    return;
                };

                if let Some(renderer) = &mut self.renderer {
                    renderer.sync_assets(device, queue, &self.state.scene, &self.state.store);
                }

                let output = match surface.get_current_texture() {
                    Ok(t) => t,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        if let Some(config) = &self.config {
                            surface.configure(device, config);
                        }
                        return;
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("out of GPU memory");
                        event_loop.exit();
                        return;
                    }
                    Err(e) => {
                        tracing::error!("surface error: {e}");
                        return;
                    }
                };

                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());

                if let Some(renderer) = &self.renderer {
                    let render_view = self.state.rig.render_view(&self.state.scene);
                    renderer.render(device, queue, &view, &self.state.scene, &render_view);
                }

                let raw_input = self
                    .egui_winit
                    .as_mut()
                    .unwrap()
                    .take_egui_input(self.window.as_ref().unwrap());
                let full_output = self.egui_ctx.run(raw_input, |ctx| {
                    self.state.draw_ui(ctx);
                });

                self.egui_winit.as_mut().unwrap().handle_platform_output(
                    self.window.as_ref().unwrap(),
                    full_output.platform_output,
                );

                let paint_jobs = self
                    .egui_ctx
                    .tessellate(full_output.shapes, full_output.pixels_per_point);

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [
                        self.config.as_ref().unwrap().width,
                        self.config.as_ref().unwrap().height,
                    ],
                    pixels_per_point: full_output.pixels_per_point,
                };

                {
                    let egui_renderer = self.egui_renderer.as_mut().unwrap();
                    for (id, image_delta) in &full_output.textures_delta.set {
                        egui_renderer.update_texture(device, queue, *id, image_delta);
                    }
                    let mut encoder =
                        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("egui_encoder"),
                        });
                    egui_renderer.update_buffers(
                        device,
                        queue,
                        &mut encoder,
                        &paint_jobs,
                        &screen_descriptor,
                    );
                    {
                        let mut pass = encoder
                            .begin_render_pass(&wgpu::RenderPassDescriptor {
                                label: Some("egui_pass"),
                                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                    view: &view,
                                    resolve_target: None,
                                    ops: wgpu::Operations {
                                        load: wgpu::LoadOp::Load,
                                        store: wgpu::StoreOp::Store,
                                    },
                                })],
                                depth_stencil_attachment: None,
                                ..Default::default()
                            })
                            .forget_lifetime();
                        egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
                    }
                    queue.submit(std::iter::once(encoder.finish()));
                    for id in &full_output.textures_delta.free {
                        egui_renderer.free_texture(id);
                    }
                }

                output.present();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.queue.push(InputEvent::PointerDelta {
                dx: delta.0 as f32,
                dy: delta.1 as f32,
            });
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let scene_config = cli.scene_config()?;
    tracing::info!(
        controls = ?scene_config.controls,
        water = scene_config.water,
        lamp = scene_config.lamp,
        audio = scene_config.audio,
        "moonwake-viewer starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(scene_config);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_are_redundant_bindings() {
        assert_eq!(map_key(KeyCode::KeyW), map_key(KeyCode::ArrowUp));
        assert_eq!(map_key(KeyCode::KeyS), map_key(KeyCode::ArrowDown));
        assert_eq!(map_key(KeyCode::KeyA), map_key(KeyCode::ArrowLeft));
        assert_eq!(map_key(KeyCode::KeyD), map_key(KeyCode::ArrowRight));
        assert_eq!(map_key(KeyCode::KeyW), Some(MoveKey::Forward));
        assert_eq!(map_key(KeyCode::Space), None);
    }

    #[test]
    fn cli_flags_override_config_defaults() {
        let cli = Cli::parse_from([
            "moonwake-viewer",
            "--no-water",
            "--fog",
            "--controls",
            "fps",
        ]);
        let config = cli.scene_config().unwrap();
        assert!(!config.water);
        assert!(config.fog);
        assert_eq!(config.controls, ControlScheme::Fps);
        // Untouched settings keep their defaults.
        assert!(config.lamp);
        assert!(config.audio);
    }

    #[test]
    fn fps_scheme_locks_on_click_and_releases_on_escape() {
        let config = SceneConfig {
            controls: ControlScheme::Fps,
            audio: false,
            ..SceneConfig::default()
        };
        let mut state = AppState::new(config);

        state.queue.push(InputEvent::PointerButton { pressed: true });
        let effects = state.update(1.0 / 60.0);
        assert!(effects.grab_pointer);
        assert!(matches!(&state.rig, CameraRig::Fps(rig) if rig.locked()));

        state.queue.push(InputEvent::Move {
            key: MoveKey::Forward,
            pressed: true,
        });
        state.queue.push(InputEvent::Escape);
        let effects = state.update(1.0 / 60.0);
        assert!(effects.release_pointer);
        assert!(matches!(&state.rig, CameraRig::Fps(rig) if !rig.locked()));
        // Held keys cannot stick across a lock release.
        assert!(!state.intent.any());
    }

    #[test]
    fn locked_fps_rig_moves_on_held_forward() {
        let config = SceneConfig {
            controls: ControlScheme::Fps,
            audio: false,
            ..SceneConfig::default()
        };
        let mut state = AppState::new(config);
        state.queue.push(InputEvent::PointerButton { pressed: true });
        state.queue.push(InputEvent::Move {
            key: MoveKey::Forward,
            pressed: true,
        });
        let start = state.rig.eye();
        for _ in 0..30 {
            state.update(1.0 / 60.0);
        }
        assert!(state.rig.eye().distance(start) > 0.1);
    }
}
