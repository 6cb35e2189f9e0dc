#[macro_use]
extern crate log;

use std::process;
use std::rc::Rc;
use walking_city::backend::HeadlessBackend;
use walking_city::config::DemoConfig;
use walking_city::shaders::ShaderProgram;

fn main() {
    env_logger::init();

    let config = match DemoConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(2);
        }
    };

    if config.headless {
        process::exit(check_shaders(&config));
    }

    #[cfg(feature = "graphical")]
    {
        if let Err(e) = windowed::run(&config) {
            error!("failed to initialise renderer");
            error!("{}", e);
            process::exit(1);
        }
    }
    #[cfg(not(feature = "graphical"))]
    {
        error!("built without the graphical feature, only --headless is available");
        process::exit(1);
    }
}

// compiles and links the configured pair without a window, for CI and editors
fn check_shaders(config: &DemoConfig) -> i32 {
    info!("checking {} + {}", config.vertex_shader.display(), config.fragment_shader.display());
    let backend = Rc::new(HeadlessBackend::new());
    match ShaderProgram::try_from_files(backend, &config.vertex_shader, &config.fragment_shader) {
        Ok(shader) => {
            info!("shader program {} compiled and linked", shader.name);
            0
        }
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}

#[cfg(feature = "graphical")]
mod windowed {
    use std::rc::Rc;
    use gfx_maths::{Vec2, Vec3};
    use glfw::{Action, Context, Key, WindowEvent};
    use glow::HasContext;
    use walking_city::backend::GlBackend;
    use walking_city::camera::Camera;
    use walking_city::config::DemoConfig;
    use walking_city::context::RenderContext;
    use walking_city::meshes::Mesh;
    use walking_city::renderer::render_frame;
    use walking_city::shaders::ShaderProgram;

    pub fn run(config: &DemoConfig) -> Result<(), String> {
        let mut glfw = glfw::init(glfw::FAIL_ON_ERRORS).map_err(|e| format!("failed to initialise glfw: {:?}", e))?;
        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or_else(|| "failed to create window".to_string())?;
        window.make_current();
        window.set_framebuffer_size_polling(true);
        window.set_key_polling(true);

        let backend = Rc::new(unsafe { GlBackend::from_loader_function(|s| window.get_proc_address(s) as *const _) });
        info!("initialised renderer");

        let (fb_width, fb_height) = window.get_framebuffer_size();
        let mut camera = Camera::new(Vec2::new(config.width as f32, config.height as f32), config.fov, config.near, config.far);
        camera.set_position(config.camera_position);
        let mut ctx = RenderContext::new(config.width, config.height, camera);
        ctx.resize(fb_width.max(0) as u32, fb_height.max(0) as u32);
        unsafe {
            backend.gl().viewport(0, 0, ctx.width as i32, ctx.height as i32);
            backend.gl().enable(glow::DEPTH_TEST);
        }

        // failures are logged; the loop keeps running and simply draws nothing useful
        let shader = ShaderProgram::from_files(backend.clone(), &config.vertex_shader, &config.fragment_shader);
        if !shader.is_valid() {
            warn!("shader program {} is not usable, see errors above", shader.name);
        }

        let mut cube = Mesh::cube(backend.clone())?;
        cube.scale = Vec3::new(config.model_scale, config.model_scale, config.model_scale);

        while !window.should_close() {
            let delta = ctx.begin_frame(glfw.get_time() as f32);
            trace!("frame delta {}", delta);

            unsafe {
                backend.gl().clear_color(0.0, 0.0, 0.0, 1.0);
                backend.gl().clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            }

            render_frame(&ctx, &shader, &cube, cube.model_matrix());

            window.swap_buffers();
            glfw.poll_events();
            for (_, event) in glfw::flush_messages(&events) {
                match event {
                    WindowEvent::FramebufferSize(width, height) => {
                        if ctx.resize(width.max(0) as u32, height.max(0) as u32) {
                            unsafe { backend.gl().viewport(0, 0, width, height) };
                        }
                    }
                    WindowEvent::Key(Key::Escape, _, Action::Press, _) => window.set_should_close(true),
                    _ => {}
                }
            }
        }

        info!("goodbye!");
        Ok(())
    }
}
