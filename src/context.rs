use gfx_maths::Vec2;
use crate::camera::Camera;

/// Per-window render state handed to every frame.
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    pub camera: Camera,
    pub delta_time: f32,
    pub last_frame: f32,
}

impl RenderContext {
    pub fn new(width: u32, height: u32, camera: Camera) -> RenderContext {
        let mut context = RenderContext {
            width,
            height,
            camera,
            delta_time: 0.0,
            last_frame: 0.0,
        };
        context.camera.set_window_size(Vec2::new(width as f32, height as f32));
        context
    }

    /// Returns false for zero sizes (minimised window), leaving the state untouched.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.width = width;
        self.height = height;
        self.camera.set_window_size(Vec2::new(width as f32, height as f32));
        true
    }

    /// `now` is seconds since start; returns the time since the previous frame.
    pub fn begin_frame(&mut self, now: f32) -> f32 {
        self.delta_time = now - self.last_frame;
        self.last_frame = now;
        self.delta_time
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}
