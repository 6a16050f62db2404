use crate::renderer::gpu::{Gpu, UniformLocation};

/// Specular response of a surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub specular_intensity: f32,
    pub shininess: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct MaterialSlots {
    pub specular_intensity: UniformLocation,
    pub shininess: UniformLocation,
}

impl Material {
    pub fn new(specular_intensity: f32, shininess: f32) -> Self {
        Self {
            specular_intensity,
            shininess,
        }
    }

    pub fn use_material(&self, gpu: &mut impl Gpu, slots: &MaterialSlots) {
        gpu.set_float(slots.specular_intensity, self.specular_intensity);
        gpu.set_float(slots.shininess, self.shininess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::gpu::recording::{RecordingGpu, UniformValue};

    #[test]
    fn test_use_material_writes_both_scalars() {
        let mut gpu = RecordingGpu::new();
        let slots = MaterialSlots {
            specular_intensity: gpu.uniform_location(1, "material.specularIntensity"),
            shininess: gpu.uniform_location(1, "material.shininess"),
        };
        Material::new(0.3, 4.0).use_material(&mut gpu, &slots);
        assert_eq!(gpu.last_write("material.specularIntensity"), Some(UniformValue::Float(0.3)));
        assert_eq!(gpu.last_write("material.shininess"), Some(UniformValue::Float(4.0)));
    }
}
