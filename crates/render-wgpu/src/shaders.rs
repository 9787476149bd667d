//! WGSL sources for the scene pipelines.

/// Shared camera/lighting uniforms (bind group 0 of the scene passes).
const GLOBALS: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    inv_view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    // rgb = summed ambient, w = fog enabled (0 or 1)
    ambient: vec4<f32>,
    // rgb = fog color, w = fog density
    fog: vec4<f32>,
};

struct PointLight {
    // xyz = position, w = range
    position: vec4<f32>,
    // rgb = color, w = intensity
    color: vec4<f32>,
};

struct Lights {
    points: array<PointLight, 4>,
    count: vec4<u32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;
@group(0) @binding(1)
var<uniform> lights: Lights;

fn apply_fog(color: vec3<f32>, world_pos: vec3<f32>) -> vec3<f32> {
    if (globals.ambient.w < 0.5) {
        return color;
    }
    let dist = length(world_pos - globals.eye.xyz);
    let factor = exp(-globals.fog.w * dist);
    return mix(globals.fog.rgb, color, factor);
}

fn point_lighting(world_pos: vec3<f32>, normal: vec3<f32>) -> vec3<f32> {
    var total = vec3<f32>(0.0);
    for (var i = 0u; i < lights.count.x; i = i + 1u) {
        let light = lights.points[i];
        let to_light = light.position.xyz - world_pos;
        let dist = length(to_light);
        let dir = to_light / max(dist, 1e-4);
        let window = clamp(1.0 - pow(dist / max(light.position.w, 1e-4), 4.0), 0.0, 1.0);
        let atten = light.color.w / (1.0 + dist * dist) * window * window;
        total = total + light.color.rgb * atten * max(dot(normal, dir), 0.0);
    }
    return total;
}
"#;

const MESH_BODY: &str = r#"
struct ObjectData {
    model: mat4x4<f32>,
    // rgb tint, a unused
    color: vec4<f32>,
    emissive: vec4<f32>,
    // x = unlit, y = textured
    flags: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> object: ObjectData;

@group(2) @binding(0)
var base_texture: texture_2d<f32>;
@group(2) @binding(1)
var base_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world_pos = object.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((object.model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var base = object.color.rgb;
    if (object.flags.y > 0.5) {
        base = base * textureSample(base_texture, base_sampler, in.uv).rgb;
    }

    var color: vec3<f32>;
    if (object.flags.x > 0.5) {
        color = base + object.emissive.rgb;
    } else {
        let lighting = globals.ambient.rgb + point_lighting(in.world_pos, normalize(in.world_normal));
        color = base * lighting + object.emissive.rgb;
    }

    return vec4<f32>(apply_fog(color, in.world_pos), 1.0);
}
"#;

const SKY_BODY: &str = r#"
@group(1) @binding(0)
var sky_texture: texture_cube<f32>;
@group(1) @binding(1)
var sky_sampler: sampler;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

// Fullscreen triangle, no vertex buffer.
@vertex
fn vs_sky(@builtin(vertex_index) index: u32) -> SkyOutput {
    let x = f32(i32(index) / 2) * 4.0 - 1.0;
    let y = f32(i32(index) % 2) * 4.0 - 1.0;
    var out: SkyOutput;
    out.clip_position = vec4<f32>(x, y, 1.0, 1.0);
    out.ndc = vec2<f32>(x, y);
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    let far_point = globals.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let dir = normalize(far_point.xyz / far_point.w - globals.eye.xyz);
    return vec4<f32>(textureSample(sky_texture, sky_sampler, dir).rgb, 1.0);
}
"#;

const WATER_BODY: &str = r#"
struct WaterParams {
    // rgb = deep color
    deep_color: vec4<f32>,
    // x = time, y = distortion scale, z = plane size
    params: vec4<f32>,
    // xyz = direction toward the moon
    moon_dir: vec4<f32>,
};

@group(1) @binding(0)
var<uniform> water: WaterParams;

@group(2) @binding(0)
var sky_texture: texture_cube<f32>;
@group(2) @binding(1)
var sky_sampler: sampler;

@group(3) @binding(0)
var normal_map: texture_2d<f32>;
@group(3) @binding(1)
var normal_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
};

@vertex
fn vs_water(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = globals.view_proj * vec4<f32>(vertex.position, 1.0);
    out.world_pos = vertex.position;
    return out;
}

fn sample_normal(uv: vec2<f32>) -> vec3<f32> {
    // Unpack a tangent-space sample into the water plane's frame (+Y up).
    let raw = textureSample(normal_map, normal_sampler, uv).rgb * 2.0 - 1.0;
    return vec3<f32>(raw.x, raw.z, raw.y);
}

@fragment
fn fs_water(in: VertexOutput) -> @location(0) vec4<f32> {
    let time = water.params.x;
    let distortion = water.params.y;

    // Two counter-scrolling layers at different tilings.
    let base_uv = in.world_pos.xz / 100.0;
    let n1 = sample_normal(base_uv + vec2<f32>(time * 0.03, time * 0.021));
    let n2 = sample_normal(base_uv * 1.7 - vec2<f32>(time * 0.017, time * 0.026));
    var normal = normalize(vec3<f32>(
        (n1.x + n2.x) * distortion,
        n1.y + n2.y,
        (n1.z + n2.z) * distortion,
    ));

    let view = normalize(globals.eye.xyz - in.world_pos);
    let fresnel = 0.02 + 0.98 * pow(1.0 - max(dot(view, normal), 0.0), 5.0);

    let reflected = reflect(-view, normal);
    let sky = textureSample(sky_texture, sky_sampler, reflected).rgb;

    // Moonlight glint.
    let halfway = normalize(view + water.moon_dir.xyz);
    let glint = pow(max(dot(normal, halfway), 0.0), 180.0) * vec3<f32>(1.0, 0.97, 0.8);

    var color = mix(water.deep_color.rgb, sky, fresnel) + glint;
    return vec4<f32>(apply_fog(color, in.world_pos), 1.0);
}
"#;

const GRID_BODY: &str = r#"
struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_grid(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = globals.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_grid(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

/// Fullscreen bloom chain: bright-pass extract, separable blur, composite.
pub const BLOOM_SHADER: &str = r#"
struct BloomParams {
    // x = threshold, y = strength, zw = texel size of the source
    params: vec4<f32>,
    // xy = blur direction in texels
    direction: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> bloom: BloomParams;
@group(0) @binding(1)
var source: texture_2d<f32>;
@group(0) @binding(2)
var source_sampler: sampler;
// Composite only: the blurred bloom texture.
@group(0) @binding(3)
var blurred: texture_2d<f32>;

struct FullscreenOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_fullscreen(@builtin(vertex_index) index: u32) -> FullscreenOutput {
    let x = f32(i32(index) / 2) * 4.0 - 1.0;
    let y = f32(i32(index) % 2) * 4.0 - 1.0;
    var out: FullscreenOutput;
    out.clip_position = vec4<f32>(x, y, 0.0, 1.0);
    out.uv = vec2<f32>(x * 0.5 + 0.5, 0.5 - y * 0.5);
    return out;
}

@fragment
fn fs_bright(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let color = textureSample(source, source_sampler, in.uv).rgb;
    let luma = dot(color, vec3<f32>(0.2126, 0.7152, 0.0722));
    // Soft threshold; at zero the whole scene passes through.
    let factor = max(luma - bloom.params.x, 0.0) / max(luma, 1e-4);
    return vec4<f32>(color * factor, 1.0);
}

@fragment
fn fs_blur(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let texel = bloom.params.zw * bloom.direction.xy;
    var weights = array<f32, 5>(0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216);
    var color = textureSample(source, source_sampler, in.uv).rgb * weights[0];
    for (var i = 1; i < 5; i = i + 1) {
        let offset = texel * f32(i);
        color = color + textureSample(source, source_sampler, in.uv + offset).rgb * weights[i];
        color = color + textureSample(source, source_sampler, in.uv - offset).rgb * weights[i];
    }
    return vec4<f32>(color, 1.0);
}

@fragment
fn fs_composite(in: FullscreenOutput) -> @location(0) vec4<f32> {
    let scene = textureSample(source, source_sampler, in.uv).rgb;
    let glow = textureSample(blurred, source_sampler, in.uv).rgb;
    return vec4<f32>(scene + glow * bloom.params.y, 1.0);
}
"#;

/// Assembled scene shaders (globals prelude + body).
pub fn mesh_shader() -> String {
    format!("{GLOBALS}{MESH_BODY}")
}

pub fn sky_shader() -> String {
    format!("{GLOBALS}{SKY_BODY}")
}

pub fn water_shader() -> String {
    format!("{GLOBALS}{WATER_BODY}")
}

pub fn grid_shader() -> String {
    format!("{GLOBALS}{GRID_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembled_shaders_contain_their_entry_points() {
        assert!(mesh_shader().contains("fn vs_main"));
        assert!(mesh_shader().contains("fn fs_main"));
        assert!(sky_shader().contains("fn fs_sky"));
        assert!(water_shader().contains("fn fs_water"));
        assert!(grid_shader().contains("fn vs_grid"));
        assert!(BLOOM_SHADER.contains("fn fs_bright"));
        assert!(BLOOM_SHADER.contains("fn fs_composite"));
    }
}
