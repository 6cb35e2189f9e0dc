use gfx_maths::*;
use crate::helpers::degrees_to_radians;

#[derive(Clone)]
pub struct Camera {
    position: Vec3,
    rotation: Quaternion,
    projection: Mat4,
    view: Mat4,
    window_size: Vec2,
    fov: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn new(window_size: Vec2, fov: f32, near: f32, far: f32) -> Camera {
        let mut camera = Camera {
            position: Vec3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::new(0.0, 0.0, 0.0, 1.0),
            projection: Mat4::identity(),
            view: Mat4::identity(),
            window_size,
            fov,
            near,
            far,
        };

        camera.recalculate_projection();
        camera.recalculate_view();
        camera
    }

    // calculates the projection matrix from the camera's perspective
    fn recalculate_projection(&mut self) {
        let aspect_ratio = self.window_size.x / self.window_size.y;
        self.projection = Mat4::perspective_opengl(degrees_to_radians(self.fov), self.near, self.far, aspect_ratio);
    }

    // the view matrix moves the world the opposite way the camera moved
    fn recalculate_view(&mut self) {
        let inverse_position = Vec3::new(-self.position.x, -self.position.y, -self.position.z);
        self.view = Mat4::rotate(self.rotation) * Mat4::translate(inverse_position);
    }

    // getters and setters
    pub fn get_position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.recalculate_view();
    }

    pub fn get_rotation(&self) -> Quaternion {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quaternion) {
        self.rotation = rotation;
        self.recalculate_view();
    }

    pub fn get_projection(&self) -> Mat4 {
        self.projection
    }

    pub fn get_view(&self) -> Mat4 {
        self.view
    }

    pub fn get_fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.recalculate_projection();
    }

    pub fn get_window_size(&self) -> Vec2 {
        self.window_size
    }

    pub fn set_window_size(&mut self, window_size: Vec2) {
        self.window_size = window_size;
        self.recalculate_projection();
    }
}
