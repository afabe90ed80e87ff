//! ImGui integration
//!
//! Owns the ImGui context and glues it to winit (input, cursor) and wgpu
//! (drawing into the overlay pass of a frame).

use imgui::{FontConfig, FontSource, MouseCursor};
use imgui_wgpu::{Renderer, RendererConfig};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use std::time::Instant;
use winit::{
    event::{Event, WindowEvent},
    window::{Window, WindowId},
};

use crate::error::{EffectError, Result};

const FONT_SIZE: f32 = 18.0;

/// Locked at DPI 1.0 so the panel keeps its size across monitors.
pub struct UiManager {
    imgui: imgui::Context,
    platform: WinitPlatform,
    renderer: Renderer,
    last_frame: Instant,
    cursor: Option<MouseCursor>,
}

impl UiManager {
    /// `surface_format` is the format the overlay pass draws into.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let mut imgui = imgui::Context::create();
        imgui.set_ini_filename(None);

        let mut platform = WinitPlatform::new(&mut imgui);
        platform.attach_window(imgui.io_mut(), window, HiDpiMode::Locked(1.0));

        imgui.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                size_pixels: FONT_SIZE,
                oversample_h: 1,
                pixel_snap_h: true,
                ..Default::default()
            }),
        }]);

        let renderer = Renderer::new(
            &mut imgui,
            device,
            queue,
            RendererConfig {
                texture_format: surface_format,
                ..Default::default()
            },
        );

        Self {
            imgui,
            platform,
            renderer,
            last_frame: Instant::now(),
            cursor: None,
        }
    }

    pub fn update_display_size(&mut self, width: u32, height: u32) {
        self.imgui.io_mut().display_size = [width as f32, height as f32];
    }

    /// Forwards pointer and keyboard events. Returns true when the panel
    /// captured the event.
    pub fn handle_input(&mut self, window: &Window, window_id: WindowId, event: &WindowEvent) -> bool {
        let is_input = matches!(
            event,
            WindowEvent::CursorMoved { .. }
                | WindowEvent::MouseInput { .. }
                | WindowEvent::MouseWheel { .. }
                | WindowEvent::KeyboardInput { .. }
                | WindowEvent::ModifiersChanged(_)
                | WindowEvent::Focused(_)
        );
        if !is_input {
            return false;
        }
        let wrapped: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        self.platform
            .handle_event(self.imgui.io_mut(), window, &wrapped);
        self.wants_input()
    }

    pub fn wants_input(&self) -> bool {
        let io = self.imgui.io();
        io.want_capture_mouse || io.want_capture_keyboard
    }

    /// Builds this frame's widgets with `build`. Must run before
    /// [`render`](Self::render). Returns [`wants_input`](Self::wants_input).
    pub fn update_logic<F>(&mut self, window: &Window, build: F) -> Result<bool>
    where
        F: FnOnce(&imgui::Ui),
    {
        let now = Instant::now();
        self.imgui.io_mut().update_delta_time(now - self.last_frame);
        self.last_frame = now;

        self.platform
            .prepare_frame(self.imgui.io_mut(), window)
            .map_err(|e| EffectError::Overlay(e.to_string()))?;

        let ui = self.imgui.frame();
        build(ui);

        let cursor = ui.mouse_cursor();
        if cursor != self.cursor {
            self.cursor = cursor;
            self.platform.prepare_render(ui, window);
        }

        Ok(self.wants_input())
    }

    /// Records the UI built in the last [`update_logic`](Self::update_logic)
    /// as its own pass over `target`, keeping what is already there.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> Result<()> {
        let draw_data = self.imgui.render();
        let [width, height] = draw_data.display_size;
        if width <= 0.0 || height <= 0.0 {
            return Ok(());
        }

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.renderer
            .render(draw_data, queue, device, &mut render_pass)
            .map_err(|e| EffectError::Overlay(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shape `RenderEngine::draw_overlay` hands to its callback; the overlay
    /// pass borrows only what the callback receives.
    type OverlayDraw = fn(
        &mut UiManager,
        &wgpu::Device,
        &wgpu::Queue,
        &mut wgpu::CommandEncoder,
        &wgpu::TextureView,
    ) -> Result<()>;

    #[test]
    fn test_render_fits_overlay_callback() {
        let render: OverlayDraw = UiManager::render;
        let _ = render;
    }
}
