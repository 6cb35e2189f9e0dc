//! In-memory shader backend
//!
//! Mimics the GL shader-object model closely enough to exercise `ShaderProgram`
//! without a window or a GPU. Each stage is parsed and validated with naga's
//! GLSL frontend, linking checks both stages against each other, active uniforms
//! get locations and uploaded values can be read back.

use std::cell::RefCell;
use std::collections::HashMap;
use naga::front::glsl::{Frontend, Options};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use crate::backend::{ShaderBackend, ShaderStage};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeadlessShader(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeadlessProgram(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeadlessUniformLocation(pub i32);

/// GLSL type of a default-block uniform, as far as the upload entry points care.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum UniformType {
    Bool,
    Int,
    Float,
    Vec(usize),
    Mat(usize),
}

impl UniformType {
    fn components(self) -> usize {
        match self {
            UniformType::Bool | UniformType::Int | UniformType::Float => 1,
            UniformType::Vec(n) => n,
            UniformType::Mat(n) => n * n,
        }
    }

    fn is_integer(self) -> bool {
        matches!(self, UniformType::Bool | UniformType::Int)
    }

    fn label(self) -> String {
        match self {
            UniformType::Bool => "bool".to_string(),
            UniformType::Int => "int".to_string(),
            UniformType::Float => "float".to_string(),
            UniformType::Vec(n) => format!("vec{}", n),
            UniformType::Mat(n) => format!("mat{}", n),
        }
    }
}

#[derive(Clone, Debug)]
struct UniformSlot {
    name: String,
    ty: UniformType,
    floats: Vec<f32>,
    ints: Vec<i32>,
}

#[derive(Clone, Debug)]
struct DeclaredUniform {
    name: String,
    ty: Option<UniformType>,
    used: bool,
}

/// What linking needs to know about a stage that compiled.
#[derive(Clone, Debug)]
struct CompiledStage {
    has_main: bool,
    uniforms: Vec<DeclaredUniform>,
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: Option<CompiledStage>,
    info_log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    info_log: String,
    locations: HashMap<String, i32>,
    slots: HashMap<i32, UniformSlot>,
}

#[derive(Default)]
struct HeadlessState {
    next_handle: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    current: Option<u32>,
    error: bool,
}

impl HeadlessState {
    fn allocate(&mut self) -> u32 {
        // zero is never a valid object name
        self.next_handle += 1;
        self.next_handle
    }
}

#[derive(Default)]
pub struct HeadlessBackend {
    state: RefCell<HeadlessState>,
}

impl HeadlessBackend {
    pub fn new() -> HeadlessBackend {
        HeadlessBackend::default()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn is_program_live(&self, program: HeadlessProgram) -> bool {
        self.state.borrow().programs.contains_key(&program.0)
    }

    pub fn current_program(&self) -> Option<HeadlessProgram> {
        self.state.borrow().current.map(HeadlessProgram)
    }

    /// Returns and clears the error flag, like `glGetError`.
    pub fn take_error(&self) -> bool {
        std::mem::take(&mut self.state.borrow_mut().error)
    }

    fn upload_int(&self, location: Option<&HeadlessUniformLocation>, x: i32) {
        self.upload(location, |ty| ty.is_integer(), |slot| {
            slot.ints[0] = if slot.ty == UniformType::Bool { (x != 0) as i32 } else { x };
        });
    }

    // each float entry point only matches one declared type, so a vec4 never lands in a mat2
    fn upload_floats(&self, location: Option<&HeadlessUniformLocation>, expected: UniformType, values: &[f32]) {
        self.upload(location, |ty| ty == expected && values.len() == expected.components(), |slot| {
            slot.floats = values.to_vec();
        });
    }

    fn upload<A, F>(&self, location: Option<&HeadlessUniformLocation>, accepts: A, write: F)
    where
        A: FnOnce(UniformType) -> bool,
        F: FnOnce(&mut UniformSlot),
    {
        // a missing location is silently ignored, same as location -1 in GL
        let location = match location {
            Some(location) => location.0,
            None => return,
        };
        let mut state = self.state.borrow_mut();
        let current = match state.current {
            Some(current) => current,
            None => {
                state.error = true;
                return;
            }
        };
        let slot = state.programs.get_mut(&current).and_then(|p| p.slots.get_mut(&location));
        let accepted = match slot {
            Some(slot) if accepts(slot.ty) => {
                write(slot);
                true
            }
            _ => false,
        };
        if !accepted {
            state.error = true;
        }
    }
}

impl ShaderBackend for HeadlessBackend {
    type Shader = HeadlessShader;
    type Program = HeadlessProgram;
    type UniformLocation = HeadlessUniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<HeadlessShader, String> {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.shaders.insert(handle, ShaderObject {
            stage,
            source: String::new(),
            compiled: None,
            info_log: String::new(),
        });
        Ok(HeadlessShader(handle))
    }

    fn shader_source(&self, shader: HeadlessShader, source: &str) {
        let mut state = self.state.borrow_mut();
        match state.shaders.get_mut(&shader.0) {
            Some(object) => object.source = source.to_string(),
            None => state.error = true,
        }
    }

    fn compile_shader(&self, shader: HeadlessShader) {
        let mut state = self.state.borrow_mut();
        let object = match state.shaders.get_mut(&shader.0) {
            Some(object) => object,
            None => {
                state.error = true;
                return;
            }
        };
        match compile_glsl(object.stage, &object.source) {
            Ok(compiled) => {
                object.compiled = Some(compiled);
                object.info_log.clear();
            }
            Err(log) => {
                object.compiled = None;
                object.info_log = log;
            }
        }
    }

    fn get_shader_compile_status(&self, shader: HeadlessShader) -> bool {
        self.state.borrow().shaders.get(&shader.0).map(|s| s.compiled.is_some()).unwrap_or(false)
    }

    fn get_shader_info_log(&self, shader: HeadlessShader) -> String {
        self.state.borrow().shaders.get(&shader.0).map(|s| s.info_log.clone()).unwrap_or_default()
    }

    fn delete_shader(&self, shader: HeadlessShader) {
        self.state.borrow_mut().shaders.remove(&shader.0);
    }

    fn create_program(&self) -> Result<HeadlessProgram, String> {
        let mut state = self.state.borrow_mut();
        let handle = state.allocate();
        state.programs.insert(handle, ProgramObject::default());
        Ok(HeadlessProgram(handle))
    }

    fn attach_shader(&self, program: HeadlessProgram, shader: HeadlessShader) {
        let mut state = self.state.borrow_mut();
        if !state.shaders.contains_key(&shader.0) {
            state.error = true;
            return;
        }
        match state.programs.get_mut(&program.0) {
            Some(object) => object.attached.push(shader.0),
            None => state.error = true,
        }
    }

    fn link_program(&self, program: HeadlessProgram) {
        let mut state = self.state.borrow_mut();
        let attached = match state.programs.get(&program.0) {
            Some(object) => object.attached.clone(),
            None => {
                state.error = true;
                return;
            }
        };

        let mut stages: Vec<(ShaderStage, CompiledStage)> = Vec::new();
        let mut errors = Vec::new();
        for handle in attached {
            match state.shaders.get(&handle) {
                Some(ShaderObject { stage, compiled: Some(compiled), .. }) => stages.push((*stage, compiled.clone())),
                Some(shader) => errors.push(format!("error: {} shader was not successfully compiled", shader.stage.label())),
                None => errors.push("error: attached shader object no longer exists".to_string()),
            }
        }
        for stage in [ShaderStage::Vertex, ShaderStage::Fragment] {
            match stages.iter().find(|(s, _)| *s == stage) {
                None => errors.push(format!("error: no {} shader attached", stage.label())),
                Some((_, compiled)) if !compiled.has_main => {
                    errors.push(format!("error: missing main function in {} shader", stage.label()))
                }
                _ => {}
            }
        }

        // vertex declarations first, then fragment, each in declaration order
        let mut uniforms: Vec<DeclaredUniform> = Vec::new();
        for uniform in stages.iter().flat_map(|(_, compiled)| compiled.uniforms.iter()) {
            match uniforms.iter_mut().find(|u| u.name == uniform.name) {
                Some(existing) if existing.ty != uniform.ty => errors.push(format!(
                    "error: uniform '{}' declared as {} and as {}",
                    uniform.name,
                    type_label(existing.ty),
                    type_label(uniform.ty),
                )),
                Some(existing) => existing.used |= uniform.used,
                None => uniforms.push(uniform.clone()),
            }
        }

        let object = match state.programs.get_mut(&program.0) {
            Some(object) => object,
            None => return,
        };
        object.locations.clear();
        object.slots.clear();
        if !errors.is_empty() {
            object.linked = false;
            object.info_log = errors.iter().map(|e| format!("{}\n", e)).collect();
            return;
        }

        let mut next_location = 0;
        for uniform in uniforms.into_iter().filter(|u| u.used) {
            let ty = match uniform.ty {
                Some(ty) => ty,
                None => continue,
            };
            object.locations.insert(uniform.name.clone(), next_location);
            object.slots.insert(next_location, UniformSlot {
                name: uniform.name,
                ty,
                floats: vec![0.0; ty.components()],
                ints: vec![0; ty.components()],
            });
            next_location += 1;
        }
        object.linked = true;
        object.info_log.clear();
    }

    fn get_program_link_status(&self, program: HeadlessProgram) -> bool {
        self.state.borrow().programs.get(&program.0).map(|p| p.linked).unwrap_or(false)
    }

    fn get_program_info_log(&self, program: HeadlessProgram) -> String {
        self.state.borrow().programs.get(&program.0).map(|p| p.info_log.clone()).unwrap_or_default()
    }

    fn use_program(&self, program: Option<HeadlessProgram>) {
        let mut state = self.state.borrow_mut();
        match program {
            None => state.current = None,
            Some(program) => match state.programs.get(&program.0) {
                Some(object) if object.linked => state.current = Some(program.0),
                _ => state.error = true,
            },
        }
    }

    fn delete_program(&self, program: HeadlessProgram) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.0).is_some() && state.current == Some(program.0) {
            state.current = None;
        }
    }

    fn get_uniform_location(&self, program: HeadlessProgram, name: &str) -> Option<HeadlessUniformLocation> {
        let state = self.state.borrow();
        let object = state.programs.get(&program.0)?;
        object.locations.get(name).copied().map(HeadlessUniformLocation)
    }

    fn uniform_1_i32(&self, location: Option<&HeadlessUniformLocation>, x: i32) {
        self.upload_int(location, x);
    }

    fn uniform_1_f32(&self, location: Option<&HeadlessUniformLocation>, x: f32) {
        self.upload_floats(location, UniformType::Float, &[x]);
    }

    fn uniform_2_f32(&self, location: Option<&HeadlessUniformLocation>, x: f32, y: f32) {
        self.upload_floats(location, UniformType::Vec(2), &[x, y]);
    }

    fn uniform_3_f32(&self, location: Option<&HeadlessUniformLocation>, x: f32, y: f32, z: f32) {
        self.upload_floats(location, UniformType::Vec(3), &[x, y, z]);
    }

    fn uniform_4_f32(&self, location: Option<&HeadlessUniformLocation>, x: f32, y: f32, z: f32, w: f32) {
        self.upload_floats(location, UniformType::Vec(4), &[x, y, z, w]);
    }

    fn uniform_matrix_2_f32_slice(&self, location: Option<&HeadlessUniformLocation>, transpose: bool, v: &[f32]) {
        self.upload_floats(location, UniformType::Mat(2), &maybe_transpose(v, 2, transpose));
    }

    fn uniform_matrix_3_f32_slice(&self, location: Option<&HeadlessUniformLocation>, transpose: bool, v: &[f32]) {
        self.upload_floats(location, UniformType::Mat(3), &maybe_transpose(v, 3, transpose));
    }

    fn uniform_matrix_4_f32_slice(&self, location: Option<&HeadlessUniformLocation>, transpose: bool, v: &[f32]) {
        self.upload_floats(location, UniformType::Mat(4), &maybe_transpose(v, 4, transpose));
    }

    fn get_uniform_f32(&self, program: HeadlessProgram, location: &HeadlessUniformLocation, v: &mut [f32]) {
        let state = self.state.borrow();
        if let Some(slot) = state.programs.get(&program.0).and_then(|p| p.slots.get(&location.0)) {
            for (i, out) in v.iter_mut().take(slot.ty.components()).enumerate() {
                *out = if slot.ty.is_integer() { slot.ints[i] as f32 } else { slot.floats[i] };
            }
        }
    }

    fn get_uniform_i32(&self, program: HeadlessProgram, location: &HeadlessUniformLocation, v: &mut [i32]) {
        let state = self.state.borrow();
        if let Some(slot) = state.programs.get(&program.0).and_then(|p| p.slots.get(&location.0)) {
            for (i, out) in v.iter_mut().take(slot.ty.components()).enumerate() {
                *out = if slot.ty.is_integer() { slot.ints[i] } else { slot.floats[i] as i32 };
            }
        }
    }
}

impl std::fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        let mut uniforms: Vec<&str> = state.programs.values()
            .flat_map(|p| p.slots.values().map(|s| s.name.as_str()))
            .collect();
        uniforms.sort_unstable();
        f.debug_struct("HeadlessBackend")
            .field("shaders", &state.shaders.len())
            .field("programs", &state.programs.len())
            .field("current", &state.current)
            .field("uniforms", &uniforms)
            .finish()
    }
}

fn maybe_transpose(v: &[f32], n: usize, transpose: bool) -> Vec<f32> {
    if !transpose || v.len() != n * n {
        return v.to_vec();
    }
    let mut out = vec![0.0; n * n];
    for col in 0..n {
        for row in 0..n {
            out[col * n + row] = v[row * n + col];
        }
    }
    out
}

fn type_label(ty: Option<UniformType>) -> String {
    ty.map(UniformType::label).unwrap_or_else(|| "an unsupported type".to_string())
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    }
}

/// Parses and validates one stage, returning a GL-style info log on failure.
fn compile_glsl(stage: ShaderStage, source: &str) -> Result<CompiledStage, String> {
    if source.trim().is_empty() {
        return Err("0:0(0): error: empty shader source\n".to_string());
    }
    let source = with_supported_version(source);

    // default-block uniforms are read as plain globals; their values live in the slot table
    let mut defines = naga::FastHashMap::default();
    defines.insert("uniform".to_string(), String::new());
    let options = Options { stage: naga_stage(stage), defines };

    let module = Frontend::default().parse(&options, &source).map_err(|e| {
        e.errors.iter()
            .map(|error| info_log_line(&source, error.meta, &error.kind.to_string()))
            .collect::<String>()
    })?;
    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| {
            let span = e.spans().next().map(|(span, _)| *span).unwrap_or_default();
            info_log_line(&source, span, &e.as_inner().to_string())
        })?;

    let entry = module.entry_points.iter().position(|ep| ep.name == "main");
    let io_names = match entry {
        Some(index) => entry_point_io_names(&module, &module.entry_points[index]),
        None => Vec::new(),
    };

    // stage inputs and outputs are private globals too, tell them apart by the entry point's interface
    let uniforms = module.global_variables.iter()
        .filter(|(_, var)| var.space == naga::AddressSpace::Private && var.init.is_none())
        .filter_map(|(handle, var)| {
            let name = var.name.as_deref()?;
            if name.starts_with("gl_") || io_names.iter().any(|io| io == name) {
                return None;
            }
            Some(DeclaredUniform {
                name: name.to_string(),
                ty: uniform_type(&module.types[var.ty].inner),
                used: entry.map(|index| !info.get_entry_point(index)[handle].is_empty()).unwrap_or(false),
            })
        })
        .collect();

    Ok(CompiledStage { has_main: entry.is_some(), uniforms })
}

// naga reads the Vulkan flavour of GLSL, which starts at 440
fn with_supported_version(source: &str) -> String {
    let mut replaced = false;
    source.lines()
        .map(|line| {
            if !replaced && line.trim_start().starts_with("#version") {
                replaced = true;
                "#version 450 core"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn info_log_line(source: &str, span: naga::Span, message: &str) -> String {
    if !span.is_defined() {
        return format!("0:0(0): error: {}\n", message);
    }
    let location = span.location(source);
    format!("0:{}({}): error: {}\n", location.line_number, location.line_position, message)
}

fn entry_point_io_names(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<String> {
    let function = &entry.function;
    let mut names: Vec<String> = function.arguments.iter().filter_map(|a| a.name.clone()).collect();
    if let Some(result) = &function.result {
        if let naga::TypeInner::Struct { members, .. } = &module.types[result.ty].inner {
            names.extend(members.iter().filter_map(|m| m.name.clone()));
        }
    }
    names
}

fn uniform_type(inner: &naga::TypeInner) -> Option<UniformType> {
    use naga::{ScalarKind, TypeInner};
    match *inner {
        TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Bool => Some(UniformType::Bool),
            ScalarKind::Sint => Some(UniformType::Int),
            ScalarKind::Float => Some(UniformType::Float),
            _ => None,
        },
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => Some(UniformType::Vec(size as usize)),
        TypeInner::Matrix { columns, rows, .. } if columns == rows => Some(UniformType::Mat(columns as usize)),
        _ => None,
    }
}
