use gl::types::*;
use glam::{Mat4, Vec3};
use std::ffi::CString;
use std::ptr;

/// Location of a uniform inside one linked program. `-1` means the program
/// has no active uniform of that name; GL silently ignores writes to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub GLint);

impl UniformLocation {
    pub const NONE: UniformLocation = UniformLocation(-1);
}

/// 2-D or cube map binding target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureTarget {
    Flat,
    Cube,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearTarget {
    Depth,
    ColorDepth,
}

/// The GL state the lighting and shadow passes touch.
///
/// Everything the pass sequence and the uniform protocol do goes through this
/// trait so the ordering can be checked without a context. Mesh drawing and
/// shader compilation stay direct GL calls.
pub trait Gpu {
    fn gen_framebuffer(&mut self) -> GLuint;
    fn gen_texture(&mut self) -> GLuint;
    fn delete_framebuffer(&mut self, framebuffer: GLuint);
    fn delete_texture(&mut self, texture: GLuint);

    /// Allocate depth storage for `texture` (one 2-D image, or six cube faces).
    fn define_depth_storage(&mut self, texture: GLuint, target: TextureTarget, width: u32, height: u32);

    /// Bind `framebuffer`, attach `texture` as its depth attachment, disable
    /// the color draw/read buffers and return the completeness status.
    /// Leaves `framebuffer` bound.
    fn attach_depth_texture(&mut self, framebuffer: GLuint, texture: GLuint, target: TextureTarget) -> GLenum;

    /// `0` restores the window framebuffer.
    fn bind_framebuffer(&mut self, framebuffer: GLuint);
    fn viewport(&mut self, width: u32, height: u32);
    fn clear(&mut self, target: ClearTarget);
    fn depth_mask(&mut self, write: bool);
    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: GLuint);

    fn use_program(&mut self, program: GLuint);
    fn uniform_location(&mut self, program: GLuint, name: &str) -> UniformLocation;
    fn set_int(&mut self, location: UniformLocation, value: i32);
    fn set_float(&mut self, location: UniformLocation, value: f32);
    fn set_vec3(&mut self, location: UniformLocation, value: Vec3);
    fn set_mat4(&mut self, location: UniformLocation, value: &Mat4);
}

/// The live OpenGL context. Requires `gl::load_with` to have run.
pub struct GlGpu;

fn gl_target(target: TextureTarget) -> GLenum {
    match target {
        TextureTarget::Flat => gl::TEXTURE_2D,
        TextureTarget::Cube => gl::TEXTURE_CUBE_MAP,
    }
}

impl Gpu for GlGpu {
    fn gen_framebuffer(&mut self) -> GLuint {
        let mut fbo = 0;
        unsafe {
            gl::GenFramebuffers(1, &mut fbo);
        }
        fbo
    }

    fn gen_texture(&mut self) -> GLuint {
        let mut tex = 0;
        unsafe {
            gl::GenTextures(1, &mut tex);
        }
        tex
    }

    fn delete_framebuffer(&mut self, framebuffer: GLuint) {
        unsafe {
            gl::DeleteFramebuffers(1, &framebuffer);
        }
    }

    fn delete_texture(&mut self, texture: GLuint) {
        unsafe {
            gl::DeleteTextures(1, &texture);
        }
    }

    fn define_depth_storage(&mut self, texture: GLuint, target: TextureTarget, width: u32, height: u32) {
        let (w, h) = (width as GLsizei, height as GLsizei);
        unsafe {
            match target {
                TextureTarget::Flat => {
                    gl::BindTexture(gl::TEXTURE_2D, texture);
                    gl::TexImage2D(
                        gl::TEXTURE_2D,
                        0,
                        gl::DEPTH_COMPONENT as GLint,
                        w,
                        h,
                        0,
                        gl::DEPTH_COMPONENT,
                        gl::FLOAT,
                        ptr::null(),
                    );
                    // Samples outside the map read as fully lit
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_BORDER as GLint);
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_BORDER as GLint);
                    let border = [1.0f32, 1.0, 1.0, 1.0];
                    gl::TexParameterfv(gl::TEXTURE_2D, gl::TEXTURE_BORDER_COLOR, border.as_ptr());
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
                }
                TextureTarget::Cube => {
                    gl::BindTexture(gl::TEXTURE_CUBE_MAP, texture);
                    for face in 0..6 {
                        gl::TexImage2D(
                            gl::TEXTURE_CUBE_MAP_POSITIVE_X + face,
                            0,
                            gl::DEPTH_COMPONENT as GLint,
                            w,
                            h,
                            0,
                            gl::DEPTH_COMPONENT,
                            gl::FLOAT,
                            ptr::null(),
                        );
                    }
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
                    gl::TexParameteri(gl::TEXTURE_CUBE_MAP, gl::TEXTURE_WRAP_R, gl::CLAMP_TO_EDGE as GLint);
                }
            }
            gl::BindTexture(gl_target(target), 0);
        }
    }

    fn attach_depth_texture(&mut self, framebuffer: GLuint, texture: GLuint, target: TextureTarget) -> GLenum {
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, framebuffer);
            match target {
                TextureTarget::Flat => gl::FramebufferTexture2D(
                    gl::FRAMEBUFFER,
                    gl::DEPTH_ATTACHMENT,
                    gl::TEXTURE_2D,
                    texture,
                    0,
                ),
                // Layered attachment: the geometry shader picks the face via gl_Layer
                TextureTarget::Cube => {
                    gl::FramebufferTexture(gl::FRAMEBUFFER, gl::DEPTH_ATTACHMENT, texture, 0)
                }
            }
            gl::DrawBuffer(gl::NONE);
            gl::ReadBuffer(gl::NONE);
            gl::CheckFramebufferStatus(gl::FRAMEBUFFER)
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: GLuint) {
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, framebuffer);
        }
    }

    fn viewport(&mut self, width: u32, height: u32) {
        unsafe {
            gl::Viewport(0, 0, width as GLsizei, height as GLsizei);
        }
    }

    fn clear(&mut self, target: ClearTarget) {
        let mask = match target {
            ClearTarget::Depth => gl::DEPTH_BUFFER_BIT,
            ClearTarget::ColorDepth => gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT,
        };
        unsafe {
            gl::Clear(mask);
        }
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe {
            gl::DepthMask(if write { gl::TRUE } else { gl::FALSE });
        }
    }

    fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: GLuint) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit);
            gl::BindTexture(gl_target(target), texture);
        }
    }

    fn use_program(&mut self, program: GLuint) {
        unsafe {
            gl::UseProgram(program);
        }
    }

    fn uniform_location(&mut self, program: GLuint, name: &str) -> UniformLocation {
        let Ok(cname) = CString::new(name) else {
            return UniformLocation::NONE;
        };
        let loc = unsafe { gl::GetUniformLocation(program, cname.as_ptr()) };
        if loc < 0 {
            log::debug!("uniform '{name}' not active in program {program}");
        }
        UniformLocation(loc)
    }

    fn set_int(&mut self, location: UniformLocation, value: i32) {
        unsafe {
            gl::Uniform1i(location.0, value);
        }
    }

    fn set_float(&mut self, location: UniformLocation, value: f32) {
        unsafe {
            gl::Uniform1f(location.0, value);
        }
    }

    fn set_vec3(&mut self, location: UniformLocation, value: Vec3) {
        unsafe {
            gl::Uniform3f(location.0, value.x, value.y, value.z);
        }
    }

    fn set_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        unsafe {
            gl::UniformMatrix4fv(location.0, 1, gl::FALSE, value.to_cols_array().as_ptr());
        }
    }
}
