use std::mem;
use std::rc::Rc;
use gfx_maths::*;
use glow::HasContext;
use crate::backend::GlBackend;
use crate::helpers::calculate_model_matrix;
use crate::renderer::Drawable;
use crate::shaders::ShaderProgram;

// position (3) + normal (3)
const FLOATS_PER_VERTEX: usize = 6;

pub struct Mesh {
    pub position: Vec3,
    pub rotation: Quaternion,
    pub scale: Vec3,
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ebo: glow::Buffer,
    num_indices: usize,
    backend: Rc<GlBackend>,
}

impl Mesh {
    /// `vertices` is interleaved position + normal, `indices` are triangles.
    pub fn new(backend: Rc<GlBackend>, vertices: &[f32], indices: &[u32]) -> Result<Mesh, String> {
        let gl = backend.gl();
        let (vao, vbo, ebo) = unsafe {
            let vao = gl.create_vertex_array()?;
            let (vbo, ebo) = match create_buffer_pair(|| gl.create_buffer(), |buffer| gl.delete_buffer(buffer)) {
                Ok(buffers) => buffers,
                Err(e) => {
                    gl.delete_vertex_array(vao);
                    return Err(e);
                }
            };
            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(vertices), glow::STATIC_DRAW);

            let stride = (FLOATS_PER_VERTEX * mem::size_of::<f32>()) as i32;
            // vertex positions
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(0);
            // vertex normals
            gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, (3 * mem::size_of::<f32>()) as i32);
            gl.enable_vertex_attrib_array(1);

            // now the indices
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(indices), glow::STATIC_DRAW);

            gl.bind_vertex_array(None);
            (vao, vbo, ebo)
        };

        Ok(Mesh {
            position: Vec3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::new(0.0, 0.0, 0.0, 1.0),
            scale: Vec3::new(1.0, 1.0, 1.0),
            vao,
            vbo,
            ebo,
            num_indices: indices.len(),
            backend,
        })
    }

    /// Unit cube centred on the origin with per-face normals.
    pub fn cube(backend: Rc<GlBackend>) -> Result<Mesh, String> {
        let (vertices, indices) = cube_geometry();
        Mesh::new(backend, &vertices, &indices)
    }

    pub fn model_matrix(&self) -> Mat4 {
        calculate_model_matrix(self.position, self.rotation, self.scale)
    }
}

impl Drawable<GlBackend> for Mesh {
    fn draw(&self, _shader: &ShaderProgram<GlBackend>) {
        let gl = self.backend.gl();
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            gl.draw_elements(glow::TRIANGLES, self.num_indices as i32, glow::UNSIGNED_INT, 0);
            gl.bind_vertex_array(None);

            // print opengl errors
            let mut error = gl.get_error();
            while error != glow::NO_ERROR {
                error!("OpenGL error while rendering: {}", error);
                error = gl.get_error();
            }
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        let gl = self.backend.gl();
        unsafe {
            gl.delete_buffer(self.ebo);
            gl.delete_buffer(self.vbo);
            gl.delete_vertex_array(self.vao);
        }
    }
}

// vertex + index buffer; if the second can't be created the first is released again
fn create_buffer_pair<T, E>(mut create: impl FnMut() -> Result<T, E>, mut delete: impl FnMut(T)) -> Result<(T, T), E> {
    let vbo = create()?;
    match create() {
        Ok(ebo) => Ok((vbo, ebo)),
        Err(e) => {
            delete(vbo);
            Err(e)
        }
    }
}

fn cube_geometry() -> (Vec<f32>, Vec<u32>) {
    // (normal, two tangent axes) per face
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(faces.len() * 4 * FLOATS_PER_VERTEX);
    let mut indices = Vec::with_capacity(faces.len() * 6);
    for (n, u, v) in faces.iter() {
        let base = (vertices.len() / FLOATS_PER_VERTEX) as u32;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            for axis in 0..3 {
                vertices.push(n[axis] * 0.5 + u[axis] * su + v[axis] * sv);
            }
            vertices.extend_from_slice(n);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}
