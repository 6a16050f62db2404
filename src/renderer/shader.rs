use gl::types::*;
use glam::Mat4;
use std::collections::HashMap;
use std::ffi::CString;
use std::fs;
use std::path::Path;
use std::ptr;

use crate::error::{RenderError, Result};

pub struct ShaderProgram {
    pub id: GLuint,
    uniform_cache: HashMap<String, GLint>,
}

impl ShaderProgram {
    /// Read, compile and link the given stages. Any failure is returned; no
    /// half-built program is ever handed out.
    pub fn from_files(vert_path: &Path, frag_path: &Path, geom_path: Option<&Path>) -> Result<Self> {
        let vert = read_source(vert_path)?;
        let frag = read_source(frag_path)?;
        let geom = geom_path.map(read_source).transpose()?;
        let program = Self::from_sources(&vert, &frag, geom.as_deref())?;
        log::info!(
            "linked program {} from {} + {}{}",
            program.id,
            vert_path.display(),
            frag_path.display(),
            geom_path.map(|p| format!(" + {}", p.display())).unwrap_or_default()
        );
        Ok(program)
    }

    pub fn from_sources(vert_src: &str, frag_src: &str, geom_src: Option<&str>) -> Result<Self> {
        unsafe {
            let stages = compile_stages(vert_src, frag_src, geom_src).inspect_err(|e| log::error!("{e}"))?;

            let program = gl::CreateProgram();
            for &stage in &stages {
                gl::AttachShader(program, stage);
            }
            gl::LinkProgram(program);

            let mut success = 0;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
            let link_log = (success == 0).then(|| program_info_log(program));

            for &stage in &stages {
                gl::DeleteShader(stage);
            }

            if let Some(msg) = link_log {
                gl::DeleteProgram(program);
                log::error!("shader link error: {msg}");
                return Err(RenderError::ShaderLink(msg));
            }

            Ok(Self {
                id: program,
                uniform_cache: HashMap::new(),
            })
        }
    }

    pub fn bind(&self) {
        unsafe {
            gl::UseProgram(self.id);
        }
    }

    /// Ask the driver whether the program can run in the current GL state.
    /// Only meaningful once samplers and textures are set up; logs only.
    pub fn validate(&self) -> bool {
        unsafe {
            gl::ValidateProgram(self.id);
            let mut status = 0;
            gl::GetProgramiv(self.id, gl::VALIDATE_STATUS, &mut status);
            if status == 0 {
                log::warn!("program {} failed validation: {}", self.id, program_info_log(self.id));
                return false;
            }
        }
        log::debug!("program {} validated", self.id);
        true
    }

    fn get_uniform_location(&mut self, name: &str) -> GLint {
        if let Some(&loc) = self.uniform_cache.get(name) {
            return loc;
        }
        let loc = match CString::new(name) {
            Ok(cname) => unsafe { gl::GetUniformLocation(self.id, cname.as_ptr()) },
            Err(_) => -1,
        };
        self.uniform_cache.insert(name.to_string(), loc);
        loc
    }

    pub fn set_mat4(&mut self, name: &str, mat: &Mat4) {
        let loc = self.get_uniform_location(name);
        unsafe {
            gl::UniformMatrix4fv(loc, 1, gl::FALSE, mat.to_cols_array().as_ptr());
        }
    }

    pub fn set_int(&mut self, name: &str, val: i32) {
        let loc = self.get_uniform_location(name);
        unsafe {
            gl::Uniform1i(loc, val);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if self.id != 0 {
            unsafe {
                gl::DeleteProgram(self.id);
            }
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| {
        log::error!("failed to read shader {}: {source}", path.display());
        RenderError::ShaderSource {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn stage_name(shader_type: GLenum) -> &'static str {
    match shader_type {
        gl::VERTEX_SHADER => "vertex",
        gl::GEOMETRY_SHADER => "geometry",
        _ => "fragment",
    }
}

unsafe fn program_info_log(program: GLuint) -> String {
    let mut len = 0;
    gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u8; len as usize];
    gl::GetProgramInfoLog(program, len, ptr::null_mut(), buf.as_mut_ptr() as *mut _);
    buf.pop(); // remove null terminator
    String::from_utf8_lossy(&buf).to_string()
}

/// Compile every stage, deleting the ones already built if a later one fails.
unsafe fn compile_stages(vert_src: &str, frag_src: &str, geom_src: Option<&str>) -> Result<Vec<GLuint>> {
    let mut sources = vec![(vert_src, gl::VERTEX_SHADER)];
    if let Some(geom_src) = geom_src {
        sources.push((geom_src, gl::GEOMETRY_SHADER));
    }
    sources.push((frag_src, gl::FRAGMENT_SHADER));

    let mut stages = Vec::with_capacity(sources.len());
    for (src, shader_type) in sources {
        match compile_shader(src, shader_type) {
            Ok(stage) => stages.push(stage),
            Err(e) => {
                for &stage in &stages {
                    gl::DeleteShader(stage);
                }
                return Err(e);
            }
        }
    }
    Ok(stages)
}

unsafe fn compile_shader(src: &str, shader_type: GLenum) -> Result<GLuint> {
    let stage = stage_name(shader_type);
    let c_src = CString::new(src).map_err(|_| RenderError::ShaderNul { stage })?;
    let shader = gl::CreateShader(shader_type);
    gl::ShaderSource(shader, 1, &c_src.as_ptr(), ptr::null());
    gl::CompileShader(shader);

    let mut success = 0;
    gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
    if success == 0 {
        let mut len = 0;
        gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
        let mut buf = vec![0u8; len.max(1) as usize];
        gl::GetShaderInfoLog(shader, len, ptr::null_mut(), buf.as_mut_ptr() as *mut _);
        buf.pop();
        let log = String::from_utf8_lossy(&buf).to_string();
        gl::DeleteShader(shader);
        return Err(RenderError::ShaderCompile { stage, log });
    }
    log::debug!("{stage} shader compiled");
    Ok(shader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_source_file_is_an_error() {
        let err = ShaderProgram::from_files(
            Path::new("does/not/exist.vert"),
            Path::new("does/not/exist.frag"),
            None,
        )
        .err()
        .expect("missing shader must fail");
        assert!(matches!(err, RenderError::ShaderSource { ref path, .. } if path.ends_with("exist.vert")));
    }
}
