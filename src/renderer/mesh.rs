use gl::types::*;
use glam::Vec3;
use std::f32::consts::PI;
use std::mem;
use std::ptr;

/// Floats per vertex: position (3), uv (2), normal (3).
pub const VERTEX_LEN: usize = 8;
const UV_OFFSET: usize = 3;
pub const NORMAL_OFFSET: usize = 5;

pub struct Mesh {
    vao: GLuint,
    vbo: GLuint,
    ebo: GLuint,
    pub index_count: i32,
}

impl Mesh {
    pub fn draw(&self) {
        unsafe {
            gl::BindVertexArray(self.vao);
            gl::DrawElements(gl::TRIANGLES, self.index_count, gl::UNSIGNED_INT, ptr::null());
            gl::BindVertexArray(0);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteBuffers(1, &self.ebo);
        }
    }
}

pub fn upload_mesh(vertices: &[f32], indices: &[u32]) -> Mesh {
    let mut vao = 0;
    let mut vbo = 0;
    let mut ebo = 0;

    unsafe {
        gl::GenVertexArrays(1, &mut vao);
        gl::GenBuffers(1, &mut vbo);
        gl::GenBuffers(1, &mut ebo);

        gl::BindVertexArray(vao);

        gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
        gl::BufferData(
            gl::ARRAY_BUFFER,
            (vertices.len() * mem::size_of::<f32>()) as GLsizeiptr,
            vertices.as_ptr() as *const _,
            gl::STATIC_DRAW,
        );

        gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ebo);
        gl::BufferData(
            gl::ELEMENT_ARRAY_BUFFER,
            (indices.len() * mem::size_of::<u32>()) as GLsizeiptr,
            indices.as_ptr() as *const _,
            gl::STATIC_DRAW,
        );

        let stride = (VERTEX_LEN * mem::size_of::<f32>()) as GLsizei;

        // position attribute (location 0)
        gl::VertexAttribPointer(0, 3, gl::FLOAT, gl::FALSE, stride, ptr::null());
        gl::EnableVertexAttribArray(0);

        // uv attribute (location 1)
        gl::VertexAttribPointer(
            1,
            2,
            gl::FLOAT,
            gl::FALSE,
            stride,
            (UV_OFFSET * mem::size_of::<f32>()) as *const _,
        );
        gl::EnableVertexAttribArray(1);

        // normal attribute (location 2)
        gl::VertexAttribPointer(
            2,
            3,
            gl::FLOAT,
            gl::FALSE,
            stride,
            (NORMAL_OFFSET * mem::size_of::<f32>()) as *const _,
        );
        gl::EnableVertexAttribArray(2);

        gl::BindVertexArray(0);
    }

    Mesh {
        vao,
        vbo,
        ebo,
        index_count: indices.len() as i32,
    }
}

/// Overwrite each vertex normal with the normalized sum of the face normals
/// of every triangle that uses it. Existing normal values are accumulated
/// into, so callers start from zeroed normals.
pub fn calculate_average_normals(indices: &[u32], vertices: &mut [f32]) {
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let p0 = position(vertices, a);
        let normal = (position(vertices, b) - p0)
            .cross(position(vertices, c) - p0)
            .normalize_or_zero();
        for i in [a, b, c] {
            let o = i * VERTEX_LEN + NORMAL_OFFSET;
            vertices[o] += normal.x;
            vertices[o + 1] += normal.y;
            vertices[o + 2] += normal.z;
        }
    }

    for chunk in vertices.chunks_exact_mut(VERTEX_LEN) {
        let n = Vec3::new(chunk[NORMAL_OFFSET], chunk[NORMAL_OFFSET + 1], chunk[NORMAL_OFFSET + 2])
            .normalize_or_zero();
        chunk[NORMAL_OFFSET..NORMAL_OFFSET + 3].copy_from_slice(&n.to_array());
    }
}

fn position(vertices: &[f32], i: usize) -> Vec3 {
    let o = i * VERTEX_LEN;
    Vec3::new(vertices[o], vertices[o + 1], vertices[o + 2])
}

pub fn pyramid_geometry() -> (Vec<f32>, Vec<u32>) {
    let indices = vec![0, 1, 3, 1, 2, 3, 2, 0, 3, 0, 2, 1];

    #[rustfmt::skip]
    let mut vertices = vec![
        // x     y     z      u    v      nx   ny   nz
        -1.0, -1.0, -0.6,   0.0, 0.0,   0.0, 0.0, 0.0,
         0.0, -1.0,  1.0,   0.5, 0.0,   0.0, 0.0, 0.0,
         1.0, -1.0, -0.6,   1.0, 0.0,   0.0, 0.0, 0.0,
         0.0,  1.0,  0.0,   0.5, 1.0,   0.0, 0.0, 0.0,
    ];
    calculate_average_normals(&indices, &mut vertices);
    (vertices, indices)
}

pub fn create_pyramid() -> Mesh {
    let (vertices, indices) = pyramid_geometry();
    upload_mesh(&vertices, &indices)
}

/// Flat square on the XZ plane facing +Y, uv repeated `tiles` times.
pub fn floor_geometry(half_size: f32, tiles: f32) -> (Vec<f32>, Vec<u32>) {
    let s = half_size;
    #[rustfmt::skip]
    let vertices = vec![
        -s, 0.0, -s,   0.0,   0.0,     0.0, 1.0, 0.0,
         s, 0.0, -s,   tiles, 0.0,     0.0, 1.0, 0.0,
        -s, 0.0,  s,   0.0,   tiles,   0.0, 1.0, 0.0,
         s, 0.0,  s,   tiles, tiles,   0.0, 1.0, 0.0,
    ];
    (vertices, vec![0, 2, 1, 1, 2, 3])
}

pub fn create_floor(half_size: f32, tiles: f32) -> Mesh {
    let (vertices, indices) = floor_geometry(half_size, tiles);
    upload_mesh(&vertices, &indices)
}

pub fn create_sphere(radius: f32, stacks: u32, sectors: u32) -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=stacks {
        let stack_angle = PI / 2.0 - (i as f32) * PI / (stacks as f32);
        let xz = radius * stack_angle.cos();
        let y = radius * stack_angle.sin();

        for j in 0..=sectors {
            let sector_angle = 2.0 * PI * (j as f32) / (sectors as f32);
            let x = xz * sector_angle.cos();
            let z = xz * sector_angle.sin();

            vertices.extend_from_slice(&[x, y, z]);
            vertices.extend_from_slice(&[j as f32 / sectors as f32, i as f32 / stacks as f32]);
            // normal (unit sphere)
            vertices.extend_from_slice(&[x / radius, y / radius, z / radius]);
        }
    }

    for i in 0..stacks {
        for j in 0..sectors {
            let first = i * (sectors + 1) + j;
            let second = first + sectors + 1;

            indices.extend_from_slice(&[first, first + 1, second]);
            indices.extend_from_slice(&[first + 1, second + 1, second]);
        }
    }

    upload_mesh(&vertices, &indices)
}

/// Unit cube with positions only (uv and normal zeroed), wound to be seen
/// from inside.
pub fn create_skybox_cube() -> Mesh {
    let corners: [[f32; 3]; 8] = [
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
    ];
    let mut vertices = Vec::with_capacity(corners.len() * VERTEX_LEN);
    for c in &corners {
        vertices.extend_from_slice(c);
        vertices.extend_from_slice(&[0.0; VERTEX_LEN - 3]);
    }

    #[rustfmt::skip]
    let indices = [
        0, 1, 2,  2, 1, 3, // front
        2, 3, 5,  5, 3, 7, // right
        5, 7, 4,  4, 7, 6, // back
        4, 6, 0,  0, 6, 1, // left
        4, 0, 5,  5, 0, 2, // top
        1, 6, 3,  3, 6, 7, // bottom
    ];

    upload_mesh(&vertices, &indices)
}
