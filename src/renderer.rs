use gfx_maths::Mat4;
use crate::backend::ShaderBackend;
use crate::context::RenderContext;
use crate::shaders::ShaderProgram;

/// Something that can be drawn with an already bound program.
///
/// By the time `draw` is called the program is current and `model`, `view` and
/// `projection` have been set; implementations may set further uniforms of their own.
pub trait Drawable<B: ShaderBackend> {
    fn draw(&self, shader: &ShaderProgram<B>);
}

pub fn render_frame<B, D>(ctx: &RenderContext, shader: &ShaderProgram<B>, drawable: &D, model: Mat4)
where
    B: ShaderBackend,
    D: Drawable<B> + ?Sized,
{
    // construction already logged why; drawing with it would only raise GL errors every frame
    if !shader.is_valid() {
        return;
    }
    shader.use_program();

    shader.set_mat4("model", model);
    shader.set_mat4("view", ctx.camera.get_view());
    shader.set_mat4("projection", ctx.camera.get_projection());

    drawable.draw(shader);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use gfx_maths::{Vec2, Vec3};
    use crate::backend::HeadlessBackend;
    use crate::camera::Camera;

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
void main() {
    gl_Position = projection * view * model * vec4(aPos, 1.0);
}
";

    const FRAGMENT: &str = "#version 330 core
out vec4 FragColor;
void main() {
    FragColor = vec4(1.0);
}
";

    #[derive(Default)]
    struct Recorder {
        draws: RefCell<Vec<(bool, [f32; 16])>>,
    }

    impl Drawable<HeadlessBackend> for Recorder {
        fn draw(&self, shader: &ShaderProgram<HeadlessBackend>) {
            let bound = shader.backend().current_program() == shader.handle();
            let mut view = [0.0; 16];
            if let (Some(program), Some(location)) = (shader.handle(), shader.uniform_location("view")) {
                shader.backend().get_uniform_f32(program, &location, &mut view);
            }
            self.draws.borrow_mut().push((bound, view));
        }
    }

    #[test]
    fn drawable_sees_bound_program_with_camera_uniforms() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = ShaderProgram::from_sources(backend.clone(), "frame", VERTEX, FRAGMENT);
        let mut camera = Camera::new(Vec2::new(800.0, 600.0), 45.0, 0.1, 100.0);
        camera.set_position(Vec3::new(0.0, 0.0, 3.0));
        let ctx = RenderContext::new(800, 600, camera);
        let recorder = Recorder::default();

        render_frame(&ctx, &shader, &recorder, Mat4::identity());

        let draws = recorder.draws.borrow();
        assert_eq!(draws.len(), 1);
        assert!(draws[0].0);
        assert_eq!(draws[0].1, ctx.camera.get_view().values);
        assert!(!backend.take_error());
    }

    #[test]
    fn unusable_program_is_skipped_without_backend_errors() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = ShaderProgram::from_sources(backend.clone(), "broken", VERTEX, "#version 330 core\nvoid main() { FragColor = vec4(1.0); }\n");
        assert!(!shader.is_valid());
        let ctx = RenderContext::new(800, 600, Camera::new(Vec2::new(800.0, 600.0), 45.0, 0.1, 100.0));
        let recorder = Recorder::default();

        for _ in 0..3 {
            render_frame(&ctx, &shader, &recorder, Mat4::identity());
        }

        assert!(recorder.draws.borrow().is_empty());
        assert!(!backend.take_error());
        assert_eq!(backend.current_program(), None);
    }
}
