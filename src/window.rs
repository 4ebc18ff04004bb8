use std::{sync::Arc, time::Instant};

use anyhow::Context;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, Event, MouseButton, Touch, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{config::DemoConfig, demo::DemoState, engine, rendering::renderer::Renderer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TouchAction {
    Move,
    /// The primary touch was lifted, which counts as a click.
    Tap,
    Ignore,
}

/// Tracks the first active touch. Other touches are ignored until it ends.
#[derive(Debug, Default)]
struct PrimaryTouch(Option<u64>);

impl PrimaryTouch {
    fn update(&mut self, id: u64, phase: TouchPhase) -> TouchAction {
        match phase {
            TouchPhase::Started if self.0.is_none() => {
                self.0 = Some(id);
                TouchAction::Move
            }
            TouchPhase::Ended if self.0 == Some(id) => {
                self.0 = None;
                TouchAction::Tap
            }
            TouchPhase::Cancelled if self.0 == Some(id) => {
                self.0 = None;
                TouchAction::Ignore
            }
            TouchPhase::Moved if self.0 == Some(id) => TouchAction::Move,
            _ => TouchAction::Ignore,
        }
    }
}

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    config: DemoConfig,
    renderer: Option<Renderer>,
    demo_state: DemoState,
    imgui: Option<ImguiState>,
    primary_touch: PrimaryTouch,
    last_frame: Instant,
}

impl App {
    fn new(config: DemoConfig, demo_state: DemoState) -> Self {
        Self {
            config,
            renderer: None,
            demo_state,
            imgui: None,
            primary_touch: PrimaryTouch::default(),
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(window: &Window) -> ImguiState {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Panel state is not persisted between runs
        context.set_ini_filename(None);

        ImguiState { context, platform }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        let mut imgui = Self::setup_imgui(&window);

        let size = window.inner_size();
        self.demo_state.on_resized(size.width, size.height);
        self.demo_state.set_scale_factor(window.scale_factor());

        let renderer = pollster::block_on(Renderer::new(
            Arc::new(window),
            &self.config.rendering,
            &self.demo_state,
            &mut imgui.context,
        ))
        .context("Failed to create renderer")?;

        renderer.window.request_redraw();
        self.renderer = Some(renderer);
        self.imgui = Some(imgui);
        self.last_frame = Instant::now();

        Ok(())
    }

    fn handle_touch(&mut self, touch: Touch, panel_wants_mouse: bool) {
        match self.primary_touch.update(touch.id, touch.phase) {
            TouchAction::Move => {
                self.demo_state.on_pointer_moved(touch.location.y as f32);
            }
            TouchAction::Tap if !panel_wants_mouse => {
                self.demo_state.regenerate();
            }
            TouchAction::Tap | TouchAction::Ignore => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return Ok(());
        };

        let now = Instant::now();
        let delta_time = now - self.last_frame;
        self.last_frame = now;
        imgui.context.io_mut().update_delta_time(delta_time);

        renderer.window.request_redraw();

        imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
            .context("Failed to prepare imgui frame")?;

        let ui = imgui.context.new_frame();
        engine::update(&mut self.demo_state, ui, delta_time)?;
        imgui.platform.prepare_render(ui, &renderer.window);

        match renderer.render(&self.demo_state, &mut imgui.context) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.resize(renderer.size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timeout");
            }
            Err(other) => {
                log::error!("Unexpected error: {:?}", other);
            }
        }

        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("{:?}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let panel_wants_mouse = match (self.renderer.as_ref(), self.imgui.as_mut()) {
            (Some(renderer), Some(imgui)) => {
                imgui.platform.handle_event::<()>(
                    imgui.context.io_mut(),
                    &renderer.window,
                    &Event::WindowEvent {
                        window_id,
                        event: event.clone(),
                    },
                );
                imgui.context.io().want_capture_mouse
            }
            _ => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(new_size);
                }
                self.demo_state.on_resized(new_size.width, new_size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.demo_state.on_pointer_moved(position.y as f32);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.demo_state.set_scale_factor(scale_factor);
            }
            WindowEvent::Touch(touch) => {
                self.handle_touch(touch, panel_wants_mouse);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !panel_wants_mouse => {
                self.demo_state.regenerate();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(event_loop) {
                    log::error!("Error during frame: {:?}", e);
                    event_loop.exit();
                }
            }
            _ => (),
        }
    }
}

pub fn run(config: DemoConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let demo_state = DemoState::new(&config);
    let mut app = App::new(config, demo_state);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_touch_is_primary() {
        let mut touch = PrimaryTouch::default();

        assert_eq!(touch.update(1, TouchPhase::Started), TouchAction::Move);
        assert_eq!(touch.update(2, TouchPhase::Started), TouchAction::Ignore);
        assert_eq!(touch.update(2, TouchPhase::Moved), TouchAction::Ignore);
        assert_eq!(touch.update(1, TouchPhase::Moved), TouchAction::Move);
        assert_eq!(touch.update(2, TouchPhase::Ended), TouchAction::Ignore);
    }

    #[test]
    fn lifting_primary_touch_is_a_tap() {
        let mut touch = PrimaryTouch::default();

        touch.update(7, TouchPhase::Started);
        assert_eq!(touch.update(7, TouchPhase::Ended), TouchAction::Tap);

        // A new touch can become primary afterwards
        assert_eq!(touch.update(8, TouchPhase::Started), TouchAction::Move);
    }

    #[test]
    fn cancelled_touch_is_not_a_tap() {
        let mut touch = PrimaryTouch::default();

        touch.update(3, TouchPhase::Started);
        assert_eq!(touch.update(3, TouchPhase::Cancelled), TouchAction::Ignore);
        assert_eq!(touch.update(4, TouchPhase::Started), TouchAction::Move);
    }
}
