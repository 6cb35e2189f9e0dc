//! Shader-object backends
//!
//! `ShaderBackend` is the seam between `ShaderProgram` and a concrete graphics API.
//! The shape follows the GL shader-object model: stages are compiled separately,
//! attached to a program, linked, and uniforms are addressed by location.

pub mod gl;
pub mod headless;

pub use self::gl::GlBackend;
pub use self::headless::HeadlessBackend;

use std::fmt::Debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn label(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// Shader compilation, program linking and uniform upload primitives.
///
/// Methods take `&self` because the underlying API keeps its own global state
/// (the "current program" slot) behind the context; callers are expected to stay
/// on the thread that owns the context.
pub trait ShaderBackend {
    type Shader: Copy + Debug + PartialEq;
    type Program: Copy + Debug + PartialEq;
    type UniformLocation: Clone + Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn get_shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn get_program_link_status(&self, program: Self::Program) -> bool;
    fn get_program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);

    /// Returns `None` for names that are not active in the program.
    fn get_uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;

    // uploads target the currently bound program
    fn uniform_1_i32(&self, location: Option<&Self::UniformLocation>, x: i32);
    fn uniform_1_f32(&self, location: Option<&Self::UniformLocation>, x: f32);
    fn uniform_2_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32);
    fn uniform_3_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32, z: f32);
    fn uniform_4_f32(&self, location: Option<&Self::UniformLocation>, x: f32, y: f32, z: f32, w: f32);
    fn uniform_matrix_2_f32_slice(&self, location: Option<&Self::UniformLocation>, transpose: bool, v: &[f32]);
    fn uniform_matrix_3_f32_slice(&self, location: Option<&Self::UniformLocation>, transpose: bool, v: &[f32]);
    fn uniform_matrix_4_f32_slice(&self, location: Option<&Self::UniformLocation>, transpose: bool, v: &[f32]);

    fn get_uniform_f32(&self, program: Self::Program, location: &Self::UniformLocation, v: &mut [f32]);
    fn get_uniform_i32(&self, program: Self::Program, location: &Self::UniformLocation, v: &mut [i32]);
}
