use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use crate::backend::{ShaderBackend, ShaderStage};
use crate::helpers::{load_string_from_file, truncate_info_log};
use crate::uniforms::{Mat2, Mat3, UniformValue};
use gfx_maths::{Mat4, Vec2, Vec3, Vec4};

const LOG_SEPARATOR: &str = "---------------------------------";

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("failed to read shader source {path:?}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage:?} shader failed to compile: {log}")]
    CompileFailure { stage: ShaderStage, log: String },
    #[error("shader program failed to link: {log}")]
    LinkFailure { log: String },
    #[error("backend could not create object: {0}")]
    ObjectCreation(String),
}

/// A linked vertex + fragment program.
///
/// Construction never aborts: every failure is logged and kept in `diagnostics()`,
/// and the resulting program reports `is_valid() == false`. Use the `try_` constructors
/// to get the first failure back as an error instead.
pub struct ShaderProgram<B: ShaderBackend> {
    pub name: String,
    program: Option<B::Program>,
    linked: bool,
    diagnostics: Vec<ShaderError>,
    backend: Rc<B>,
}

impl<B: ShaderBackend> ShaderProgram<B> {
    pub fn from_sources(backend: Rc<B>, name: &str, vertex_source: &str, fragment_source: &str) -> ShaderProgram<B> {
        Self::build(backend, name, vertex_source, fragment_source, Vec::new())
    }

    /// Reads both stages from disk. An unreadable file is logged and compiled as empty source.
    pub fn from_files<P: AsRef<Path>>(backend: Rc<B>, vertex_path: P, fragment_path: P) -> ShaderProgram<B> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        let mut diagnostics = Vec::new();
        let vertex_source = read_source(vertex_path, &mut diagnostics);
        let fragment_source = read_source(fragment_path, &mut diagnostics);
        let name = vertex_path.file_stem().and_then(|s| s.to_str()).unwrap_or("shader").to_string();
        Self::build(backend, &name, &vertex_source, &fragment_source, diagnostics)
    }

    pub fn try_from_sources(backend: Rc<B>, name: &str, vertex_source: &str, fragment_source: &str) -> Result<ShaderProgram<B>, ShaderError> {
        Self::from_sources(backend, name, vertex_source, fragment_source).into_result()
    }

    pub fn try_from_files<P: AsRef<Path>>(backend: Rc<B>, vertex_path: P, fragment_path: P) -> Result<ShaderProgram<B>, ShaderError> {
        Self::from_files(backend, vertex_path, fragment_path).into_result()
    }

    fn build(backend: Rc<B>, name: &str, vertex_source: &str, fragment_source: &str, mut diagnostics: Vec<ShaderError>) -> ShaderProgram<B> {
        let vertex = compile_stage(&*backend, ShaderStage::Vertex, vertex_source, &mut diagnostics);
        let fragment = compile_stage(&*backend, ShaderStage::Fragment, fragment_source, &mut diagnostics);

        let program = match backend.create_program() {
            Ok(program) => Some(program),
            Err(e) => {
                error!("[Shader Program Error] could not create program object: {}", e);
                diagnostics.push(ShaderError::ObjectCreation(e));
                None
            }
        };

        let mut linked = false;
        if let Some(program) = program {
            let stages = [vertex, fragment];
            for (shader, _) in stages.iter().flatten() {
                backend.attach_shader(program, *shader);
            }
            // linking only makes sense once both stages compiled
            if stages.iter().all(|s| matches!(s, Some((_, true)))) {
                backend.link_program(program);
                linked = backend.get_program_link_status(program);
                if !linked {
                    let log = truncate_info_log(&backend.get_program_info_log(program));
                    error!("[Shader Program Error] Linking failed:\n{}\n{}", log, LOG_SEPARATOR);
                    diagnostics.push(ShaderError::LinkFailure { log });
                }
            } else {
                debug!("skipping link of shader program {}: a stage failed to compile", name);
            }
        }

        // the linked program keeps what it needs, the stage objects can go
        for (shader, _) in [vertex, fragment].into_iter().flatten() {
            backend.delete_shader(shader);
        }

        if linked {
            debug!("built shader program {} ({:?})", name, program);
        }

        ShaderProgram {
            name: name.to_string(),
            program,
            linked,
            diagnostics,
            backend,
        }
    }

    /// Turns a failed build into its first diagnostic; the program object is released.
    pub fn into_result(mut self) -> Result<ShaderProgram<B>, ShaderError> {
        if self.is_valid() {
            return Ok(self);
        }
        if self.diagnostics.is_empty() {
            return Err(ShaderError::ObjectCreation(format!("shader program {} is not usable", self.name)));
        }
        Err(self.diagnostics.remove(0))
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_some() && self.linked && self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[ShaderError] {
        &self.diagnostics
    }

    pub fn handle(&self) -> Option<B::Program> {
        self.program
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Makes this the current program of the context, replacing whichever was bound.
    /// A program that failed to link is never bound; the previous binding stays.
    pub fn use_program(&self) {
        if let (Some(program), true) = (self.program, self.linked) {
            self.backend.use_program(Some(program));
        }
    }

    pub fn uniform_location(&self, name: &str) -> Option<B::UniformLocation> {
        let program = self.program?;
        self.backend.get_uniform_location(program, name)
    }

    /// Sets a uniform on the currently bound program; call `use_program` first.
    /// Names that don't resolve (unused, optimised out, misspelt) are ignored.
    pub fn set_uniform<V: Into<UniformValue>>(&self, name: &str, value: V) {
        let value = value.into();
        let location = self.uniform_location(name);
        if location.is_none() {
            trace!("uniform {} ({}) not active in {}", name, value.type_name(), self.name);
        }
        value.upload(&*self.backend, location.as_ref());
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set_uniform(name, value);
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, value);
    }

    pub fn set_vec2(&self, name: &str, value: Vec2) {
        self.set_uniform(name, value);
    }

    pub fn set_vec3(&self, name: &str, value: Vec3) {
        self.set_uniform(name, value);
    }

    pub fn set_vec4(&self, name: &str, value: Vec4) {
        self.set_uniform(name, value);
    }

    pub fn set_mat2(&self, name: &str, value: Mat2) {
        self.set_uniform(name, value);
    }

    pub fn set_mat3(&self, name: &str, value: Mat3) {
        self.set_uniform(name, value);
    }

    pub fn set_mat4(&self, name: &str, value: Mat4) {
        self.set_uniform(name, value);
    }
}

impl<B: ShaderBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            self.backend.delete_program(program);
        }
    }
}

fn read_source(path: &Path, diagnostics: &mut Vec<ShaderError>) -> String {
    match load_string_from_file(path) {
        Ok(source) => source,
        Err(e) => {
            warn!("ERROR::SHADER::FILE_NOT_SUCCESSFULLY_READ: {}: {}", path.display(), e);
            diagnostics.push(ShaderError::SourceUnreadable { path: path.to_path_buf(), source: e });
            String::new()
        }
    }
}

// returns the stage object (if one could be created) and whether it compiled
fn compile_stage<B: ShaderBackend>(backend: &B, stage: ShaderStage, source: &str, diagnostics: &mut Vec<ShaderError>) -> Option<(B::Shader, bool)> {
    let shader = match backend.create_shader(stage) {
        Ok(shader) => shader,
        Err(e) => {
            error!("[Shader Error] could not create {} shader object: {}", stage.label(), e);
            diagnostics.push(ShaderError::ObjectCreation(e));
            return None;
        }
    };
    backend.shader_source(shader, source);
    backend.compile_shader(shader);
    let compiled = backend.get_shader_compile_status(shader);
    if !compiled {
        let log = truncate_info_log(&backend.get_shader_info_log(shader));
        error!("[Shader Error] Compilation of {} stage failed:\n{}\n{}", stage.label(), log, LOG_SEPARATOR);
        diagnostics.push(ShaderError::CompileFailure { stage, log });
    }
    Some((shader, compiled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    const VERTEX: &str = "#version 330 core
layout (location = 0) in vec3 aPos;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
uniform mat2 skew;
uniform mat3 normalMatrix;
uniform vec2 offset;
void main() {
    vec3 n = normalMatrix * aPos;
    vec2 s = skew * offset;
    gl_Position = projection * view * model * vec4(n.xy + s, n.z, 1.0);
}
";

    const FRAGMENT: &str = "#version 330 core
out vec4 FragColor;
uniform bool lit;
uniform int mode;
uniform float strength;
uniform vec3 tint;
uniform vec4 fog;
uniform float unusedKnob;
void main() {
    float k = lit ? strength : 1.0;
    FragColor = vec4(tint * k, 1.0) + fog * float(mode);
}
";

    fn program(backend: &Rc<HeadlessBackend>) -> ShaderProgram<HeadlessBackend> {
        ShaderProgram::from_sources(backend.clone(), "test", VERTEX, FRAGMENT)
    }

    fn read_f32<const N: usize>(shader: &ShaderProgram<HeadlessBackend>, name: &str) -> [f32; N] {
        let mut out = [0.0; N];
        let location = shader.uniform_location(name).unwrap();
        shader.backend().get_uniform_f32(shader.handle().unwrap(), &location, &mut out);
        out
    }

    fn read_i32(shader: &ShaderProgram<HeadlessBackend>, name: &str) -> i32 {
        let mut out = [0];
        let location = shader.uniform_location(name).unwrap();
        shader.backend().get_uniform_i32(shader.handle().unwrap(), &location, &mut out);
        out[0]
    }

    #[test]
    fn valid_pair_links_and_frees_stage_objects() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = program(&backend);
        assert!(shader.is_valid());
        assert!(shader.diagnostics().is_empty());
        assert!(shader.handle().is_some());
        assert_eq!(backend.live_shaders(), 0);
        assert_eq!(backend.live_programs(), 1);
    }

    #[test]
    fn vertex_compile_failure_is_reported_not_fatal() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = ShaderProgram::from_sources(backend.clone(), "broken", "#version 330 core\nvoid main(){ gl_Position = vec4(0.0) }", FRAGMENT);
        assert!(!shader.is_valid());
        match &shader.diagnostics()[0] {
            ShaderError::CompileFailure { stage, log } => {
                assert_eq!(*stage, ShaderStage::Vertex);
                assert!(log.starts_with("0:2("), "{}", log);
            }
            other => panic!("unexpected diagnostic {:?}", other),
        }
        assert_eq!(shader.diagnostics().len(), 1);
        assert_eq!(backend.live_shaders(), 0);
    }

    #[test]
    fn link_failure_is_reported() {
        let backend = Rc::new(HeadlessBackend::new());
        // compiles on its own, but `skew` is a mat2 in the vertex stage
        let fragment = "#version 330 core\nout vec4 FragColor;\nuniform vec4 skew;\nvoid main() { FragColor = skew; }\n";
        let shader = ShaderProgram::from_sources(backend.clone(), "clash", VERTEX, fragment);
        assert!(!shader.is_valid());
        match &shader.diagnostics()[0] {
            ShaderError::LinkFailure { log } => assert!(log.contains("skew"), "{}", log),
            other => panic!("unexpected diagnostic {:?}", other),
        }
        assert_eq!(backend.live_shaders(), 0);
    }

    #[test]
    fn try_constructor_returns_first_failure() {
        let backend = Rc::new(HeadlessBackend::new());
        let result = ShaderProgram::try_from_sources(backend.clone(), "broken", VERTEX, "#version 330 core\nvoid main() { undefined_fn(); }\n");
        assert!(matches!(result, Err(ShaderError::CompileFailure { stage: ShaderStage::Fragment, .. })));
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn missing_files_degrade_to_empty_source() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = ShaderProgram::from_files(backend.clone(), "no/such/vertex.glsl", "no/such/frag.glsl");
        assert!(!shader.is_valid());
        assert!(matches!(shader.diagnostics()[0], ShaderError::SourceUnreadable { .. }));
        assert!(matches!(shader.diagnostics()[1], ShaderError::SourceUnreadable { .. }));
        assert!(shader.diagnostics().iter().any(|d| matches!(d, ShaderError::CompileFailure { .. })));
        assert_eq!(shader.name, "vertex");
    }

    #[test]
    fn drop_releases_program_once() {
        let backend = Rc::new(HeadlessBackend::new());
        {
            let shader = program(&backend);
            shader.use_program();
            assert_eq!(backend.current_program(), shader.handle());
        }
        assert_eq!(backend.live_programs(), 0);
        assert_eq!(backend.current_program(), None);
    }

    #[test]
    fn two_live_programs_have_distinct_handles() {
        let backend = Rc::new(HeadlessBackend::new());
        let a = program(&backend);
        let b = program(&backend);
        assert_ne!(a.handle(), b.handle());
    }

    #[test]
    fn use_replaces_current_program() {
        let backend = Rc::new(HeadlessBackend::new());
        let a = program(&backend);
        let b = program(&backend);
        a.use_program();
        b.use_program();
        assert_eq!(backend.current_program(), b.handle());
    }

    #[test]
    fn scalar_and_vector_uniforms_round_trip() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = program(&backend);
        shader.use_program();
        shader.set_bool("lit", true);
        shader.set_int("mode", 3);
        shader.set_float("strength", 0.5);
        shader.set_uniform("offset", (1.0f32, -1.0f32));
        shader.set_vec3("tint", Vec3::new(0.1, 0.2, 0.3));
        shader.set_uniform("fog", (0.4f32, 0.5f32, 0.6f32, 0.7f32));
        assert!(!backend.take_error());
        assert_eq!(read_i32(&shader, "lit"), 1);
        assert_eq!(read_i32(&shader, "mode"), 3);
        assert_eq!(read_f32::<1>(&shader, "strength"), [0.5]);
        assert_eq!(read_f32::<2>(&shader, "offset"), [1.0, -1.0]);
        assert_eq!(read_f32::<3>(&shader, "tint"), [0.1, 0.2, 0.3]);
        assert_eq!(read_f32::<4>(&shader, "fog"), [0.4, 0.5, 0.6, 0.7]);
    }

    #[test]
    fn matrices_round_trip_without_transposition() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = program(&backend);
        shader.use_program();

        let mut m4 = Mat4::identity();
        for (i, v) in m4.values.iter_mut().enumerate() {
            *v = i as f32;
        }
        let m3 = Mat3 { values: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0] };
        let m2 = Mat2 { values: [1.0, 2.0, 3.0, 4.0] };
        shader.set_mat4("model", m4);
        shader.set_mat3("normalMatrix", m3);
        shader.set_mat2("skew", m2);

        assert_eq!(read_f32::<16>(&shader, "model"), m4.values);
        assert_eq!(read_f32::<9>(&shader, "normalMatrix"), m3.values);
        assert_eq!(read_f32::<4>(&shader, "skew"), m2.values);
    }

    #[test]
    fn unknown_uniform_is_silent_and_leaves_others_alone() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = program(&backend);
        shader.use_program();
        shader.set_float("strength", 2.0);
        shader.set_float("strenght", 9.0);
        shader.set_float("unusedKnob", 9.0);
        assert!(!backend.take_error());
        assert!(shader.uniform_location("unusedKnob").is_none());
        assert_eq!(read_f32::<1>(&shader, "strength"), [2.0]);
    }

    #[test]
    fn identity_model_is_accepted() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = program(&backend);
        shader.use_program();
        shader.set_uniform("model", Mat4::identity());
        assert!(!backend.take_error());
        assert_eq!(read_f32::<16>(&shader, "model"), Mat4::identity().values);
    }

    #[test]
    fn uniforms_target_the_bound_program() {
        let backend = Rc::new(HeadlessBackend::new());
        let a = program(&backend);
        let b = program(&backend);
        b.use_program();
        // same declaration order, so a's location lands on b's storage
        a.set_float("strength", 7.0);
        assert_eq!(read_f32::<1>(&b, "strength"), [7.0]);
        assert_eq!(read_f32::<1>(&a, "strength"), [0.0]);
    }

    #[test]
    fn vector_upload_into_matrix_uniform_raises_error() {
        let backend = Rc::new(HeadlessBackend::new());
        let shader = program(&backend);
        shader.use_program();
        shader.set_vec4("skew", Vec4::new(1.0, 2.0, 3.0, 4.0));
        assert!(backend.take_error());
        assert_eq!(read_f32::<4>(&shader, "skew"), [0.0; 4]);
        shader.set_mat3("skew", Mat3::identity());
        assert!(backend.take_error());
    }

    #[test]
    fn using_a_failed_program_keeps_the_previous_binding() {
        let backend = Rc::new(HeadlessBackend::new());
        let good = program(&backend);
        let broken = ShaderProgram::from_sources(backend.clone(), "broken", VERTEX, "#version 330 core\nvoid main() { undefined_fn(); }\n");
        good.use_program();
        broken.use_program();
        assert!(!backend.take_error());
        assert_eq!(backend.current_program(), good.handle());
    }
}
