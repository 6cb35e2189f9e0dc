use std::os::raw::c_void;
use glow::HasContext;
use crate::backend::{ShaderBackend, ShaderStage};

/// OpenGL backend. Every call is only valid while the context it was loaded from is current.
pub struct GlBackend {
    gl: glow::Context,
}

impl GlBackend {
    /// # Safety
    /// the loader must return function pointers for the context that is current on this thread
    pub unsafe fn from_loader_function<F>(loader: F) -> GlBackend
    where
        F: FnMut(&str) -> *const c_void,
    {
        GlBackend {
            gl: glow::Context::from_loader_function(loader),
        }
    }

    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

fn stage_to_gl(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

impl ShaderBackend for GlBackend {
    type Shader = <glow::Context as HasContext>::Shader;
    type Program = <glow::Context as HasContext>::Program;
    type UniformLocation = <glow::Context as HasContext>::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { self.gl.create_shader(stage_to_gl(stage)) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { self.gl.shader_source(shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.compile_shader(shader) }
    }

    fn get_shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader) }
    }

    fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.gl.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { self.gl.delete_shader(shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { self.gl.create_program() }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { self.gl.attach_shader(program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { self.gl.link_program(program) }
    }

    fn get_program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.gl.get_program_link_status(program) }
    }

    fn get_program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.gl.get_program_info_log(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { self.gl.use_program(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { self.gl.delete_program(program) }
    }

    fn get_uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation> {
        unsafe { self.gl.get_uniform_location(program, name) }
    }

    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32) {
        unsafe { self.gl.uniform_1_i32(location, x) }
    }

    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, x: f32) {
        unsafe { self.gl.uniform_1_f32(location, x) }
    }

    fn uniform_2_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32) {
        unsafe { self.gl.uniform_2_f32(location, x, y) }
    }

    fn uniform_3_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32, z: f32) {
        unsafe { self.gl.uniform_3_f32(location, x, y, z) }
    }

    fn uniform_4_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32, z: f32, w: f32) {
        unsafe { self.gl.uniform_4_f32(location, x, y, z, w) }
    }

    fn uniform_matrix_2_f32_slice(&self, location: Option<&Self::UniformLocation>, transpose: bool, v: &[f32]) {
        unsafe { self.gl.uniform_matrix_2_f32_slice(location, transpose, v) }
    }

    fn uniform_matrix_3_f32_slice(&self, location: Option<&Self::UniformLocation>, transpose: bool, v: &[f32]) {
        unsafe { self.gl.uniform_matrix_3_f32_slice(location, transpose, v) }
    }

    fn uniform_matrix_4_f32_slice(&self, location: Option<&Self::UniformLocation>, transpose: bool, v: &[f32]) {
        unsafe { self.gl.uniform_matrix_4_f32_slice(location, transpose, v) }
    }

    fn get_uniform_f32(&self, program: Self::Program, location: &Self::UniformLocation, v: &mut [f32]) {
        unsafe { self.gl.get_uniform_f32(program, location, v) }
    }

    fn get_uniform_i32(&self, program: Self::Program, location: &Self::UniformLocation, v: &mut [i32]) {
        unsafe { self.gl.get_uniform_i32(program, location, v) }
    }
}
