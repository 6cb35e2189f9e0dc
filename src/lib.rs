#[macro_use]
extern crate log;

pub mod backend;
pub mod camera;
pub mod config;
pub mod context;
pub mod helpers;
pub mod meshes;
pub mod renderer;
pub mod shaders;
pub mod uniforms;

pub use backend::{GlBackend, HeadlessBackend, ShaderBackend, ShaderStage};
pub use shaders::{ShaderError, ShaderProgram};
pub use uniforms::UniformValue;
