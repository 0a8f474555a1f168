//! Shader sources and the names renderables resolve in them

use crate::draw::{Location, ShaderKind};

/// Model-view-projection matrix uniform
pub const UNIFORM_MVP: &str = "mvp";
/// Model-view matrix uniform (shaded program only)
pub const UNIFORM_MV: &str = "mv";
/// View-space light direction uniform (shaded program only)
pub const UNIFORM_LIGHT_VEC: &str = "lightVec";
/// Flat RGBA color uniform
pub const UNIFORM_COLOR: &str = "color";
/// Position attribute
pub const ATTRIB_VERTEX: &str = "vertex";
/// Normal attribute (shaded program only)
pub const ATTRIB_NORMAL: &str = "normal";

/// Unlit program: position only, flat color
pub const BASIC_WGSL: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
    mv: mat4x4<f32>,
    color: vec4<f32>,
    light_vec: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) vertex: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.mvp * vec4<f32>(vertex, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.color;
}
"#;

/// Lit program: lambert term from a view-space directional light
pub const SHADED_WGSL: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
    mv: mat4x4<f32>,
    color: vec4<f32>,
    light_vec: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(@location(0) vertex: vec3<f32>, @location(1) normal: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = u.mvp * vec4<f32>(vertex, 1.0);
    out.normal = (u.mv * vec4<f32>(normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = max(dot(normalize(in.normal), -normalize(u.light_vec.xyz)), 0.0);
    let shade = 0.3 + 0.7 * diffuse;
    return vec4<f32>(u.color.rgb * shade, u.color.a);
}
"#;

/// Uniform slot of `name` in the built-in program `kind`.
///
/// Both backends lay their uniform block out in this order.
pub fn uniform_slot(kind: ShaderKind, name: &str) -> Option<Location> {
    match (kind, name) {
        (_, UNIFORM_MVP) => Some(Location(0)),
        (ShaderKind::Shaded, UNIFORM_MV) => Some(Location(1)),
        (_, UNIFORM_COLOR) => Some(Location(2)),
        (ShaderKind::Shaded, UNIFORM_LIGHT_VEC) => Some(Location(3)),
        _ => None,
    }
}

/// Attribute slot of `name` in the built-in program `kind`
pub fn attrib_slot(kind: ShaderKind, name: &str) -> Option<Location> {
    match (kind, name) {
        (_, ATTRIB_VERTEX) => Some(Location(0)),
        (ShaderKind::Shaded, ATTRIB_NORMAL) => Some(Location(1)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_program_has_no_lighting_inputs() {
        assert!(uniform_slot(ShaderKind::Basic, UNIFORM_MV).is_none());
        assert!(uniform_slot(ShaderKind::Basic, UNIFORM_LIGHT_VEC).is_none());
        assert!(attrib_slot(ShaderKind::Basic, ATTRIB_NORMAL).is_none());
        assert_eq!(attrib_slot(ShaderKind::Basic, ATTRIB_VERTEX), Some(Location(0)));
    }

    #[test]
    fn test_shaded_program_resolves_everything() {
        for name in [UNIFORM_MVP, UNIFORM_MV, UNIFORM_LIGHT_VEC, UNIFORM_COLOR] {
            assert!(uniform_slot(ShaderKind::Shaded, name).is_some(), "{}", name);
        }
        assert_eq!(attrib_slot(ShaderKind::Shaded, ATTRIB_NORMAL), Some(Location(1)));
        assert!(uniform_slot(ShaderKind::Shaded, "unknown").is_none());
    }
}
