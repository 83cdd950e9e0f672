//! Built-in WGSL programs and their declared resource slots.
//!
//! Each [`ShaderProgram`] pairs a vertex stage with a fragment stage and lists
//! every resource it reads as a [`UniformSlot`]. Bind group layouts are
//! derived from the slot list, so the Rust side and the WGSL declarations
//! cannot drift silently: the tests parse every program with naga and check
//! each slot against the module's globals.
//!
//! Every program uses `vs` and `fs` as entry points.

use std::borrow::Cow;

/// The kind of resource a slot expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    Uniform,
    /// Uniform buffer bound with a per-draw dynamic offset.
    DynamicUniform,
    /// Filterable `texture_2d<f32>`.
    Texture,
    /// `texture_depth_2d`, read with `textureLoad`.
    DepthTexture,
    Sampler,
}

impl SlotKind {
    fn binding_type(self) -> wgpu::BindingType {
        match self {
            SlotKind::Uniform | SlotKind::DynamicUniform => wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: self == SlotKind::DynamicUniform,
                min_binding_size: None,
            },
            SlotKind::Texture => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            SlotKind::DepthTexture => wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Depth,
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            SlotKind::Sampler => {
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
            }
        }
    }
}

/// A named resource declared by a program at `@group(group) @binding(binding)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: &'static str,
    pub group: u32,
    pub binding: u32,
    pub kind: SlotKind,
}

const fn slot(name: &'static str, group: u32, binding: u32, kind: SlotKind) -> UniformSlot {
    UniformSlot {
        name,
        group,
        binding,
        kind,
    }
}

/// Static description of a vertex/fragment program pair.
#[derive(Debug)]
pub struct ShaderProgram {
    pub label: &'static str,
    /// Helper functions shared by both stages.
    pub prelude: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
    pub slots: &'static [UniformSlot],
}

impl ShaderProgram {
    pub const VERTEX_ENTRY: &'static str = "vs";
    pub const FRAGMENT_ENTRY: &'static str = "fs";

    /// Full module source: prelude, vertex stage, fragment stage.
    pub fn source(&self) -> String {
        [self.prelude, self.vertex, self.fragment].join("\n")
    }

    pub fn slot(&self, name: &str) -> Option<&'static UniformSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Number of bind groups, i.e. highest declared group plus one.
    pub fn group_count(&self) -> u32 {
        self.slots.iter().map(|s| s.group + 1).max().unwrap_or(0)
    }

    /// Slots of one group, ordered by binding.
    pub fn group_slots(&self, group: u32) -> Vec<&'static UniformSlot> {
        let mut slots: Vec<_> = self.slots.iter().filter(|s| s.group == group).collect();
        slots.sort_by_key(|s| s.binding);
        slots
    }

    pub fn layout_entries(&self, group: u32) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.group_slots(group)
            .into_iter()
            .map(|s| wgpu::BindGroupLayoutEntry {
                binding: s.binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: s.kind.binding_type(),
                count: None,
            })
            .collect()
    }

    pub fn create_module(&self, device: &wgpu::Device) -> wgpu::ShaderModule {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.label),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(self.source())),
        })
    }

    /// One bind group layout per group, in group order.
    pub fn create_bind_group_layouts(&self, device: &wgpu::Device) -> Vec<wgpu::BindGroupLayout> {
        (0..self.group_count())
            .map(|group| {
                device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(&format!("{} Group {group}", self.label)),
                    entries: &self.layout_entries(group),
                })
            })
            .collect()
    }
}

/// Fullscreen triangle; `uv` has its origin at the top-left.
pub const FULLSCREEN_VS: &str = r#"
struct FullscreenOut {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> FullscreenOut {
    let uv = vec2f(f32((vi << 1u) & 2u), f32(vi & 2u));
    var out: FullscreenOut;
    out.position = vec4f(uv * vec2f(2.0, -2.0) + vec2f(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}
"#;

/// Shared depth helpers. `near`/`far` come from the caller's uniforms.
const DEPTH_MATH: &str = r#"
fn linearize_depth(raw: f32, near: f32, far: f32) -> f32 {
    let ndc = raw * 2.0 - 1.0;
    return (2.0 * near * far) / (far + near - ndc * (far - near));
}

fn encode_depth(dist: f32, near: f32, far: f32) -> f32 {
    let ndc = (far + near - (2.0 * near * far) / dist) / (far - near);
    return ndc * 0.5 + 0.5;
}

fn normalized_depth(dist: f32, near: f32, far: f32) -> f32 {
    if (far <= near) {
        return 0.0;
    }
    return clamp((dist - near) / (far - near), 0.0, 1.0);
}

fn band(x: f32, lo: f32, hi: f32) -> f32 {
    let width = hi - lo;
    if (abs(width) <= 1.1920929e-7) {
        return select(0.0, 1.0, x >= lo);
    }
    return clamp((x - lo) / width, 0.0, 1.0);
}
"#;

const DEPTH_FS: &str = r#"
struct DepthParams {
    color_near: vec4f,
    color_far: vec4f,
    tint: vec4f,
    blur_near: f32,
    blur_far: f32,
    depth_min: f32,
    depth_max: f32,
    depth_threshold: f32,
    depth_value: f32,
    near: f32,
    far: f32,
    mode: u32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

@group(0) @binding(0) var<uniform> params: DepthParams;
@group(0) @binding(1) var scene_depth: texture_depth_2d;
@group(0) @binding(2) var gradient_tex: texture_2d<f32>;
@group(0) @binding(3) var gradient_sampler: sampler;

@fragment
fn fs(in: FullscreenOut) -> @location(0) vec4f {
    let dims = textureDimensions(scene_depth);
    let coord = min(vec2u(in.position.xy), dims - vec2u(1u));
    let raw = textureLoad(scene_depth, coord, 0);
    let dist = linearize_depth(raw, params.near, params.far);

    var color: vec3f;
    if (params.mode == 0u) {
        let f = band(dist, params.blur_near, params.blur_far);
        let t = band(f, params.depth_min, params.depth_max);
        color = mix(params.color_near.rgb, params.color_far.rgb, t);
    } else {
        let n = normalized_depth(dist, params.near, params.far);
        let t = band(n, params.depth_min, params.depth_max);
        let mask = select(params.depth_value, 1.0, t <= params.depth_threshold);
        let lookup = textureSampleLevel(gradient_tex, gradient_sampler, vec2f(t, 0.5), 0.0);
        color = lookup.rgb * mask;
    }
    return vec4f(color * params.tint.rgb, 1.0);
}
"#;

const COMPOSITE_FS: &str = r#"
struct CompositeParams {
    blend: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

@group(0) @binding(0) var<uniform> composite: CompositeParams;
@group(0) @binding(1) var scene_color: texture_2d<f32>;
@group(0) @binding(2) var effect_color: texture_2d<f32>;
@group(0) @binding(3) var color_sampler: sampler;

@fragment
fn fs(in: FullscreenOut) -> @location(0) vec4f {
    let scene = textureSample(scene_color, color_sampler, in.uv).rgb;
    let effect = textureSample(effect_color, color_sampler, in.uv).rgb;
    return vec4f(mix(scene, effect, composite.blend), 1.0);
}
"#;

/// Screen-space quad placed by `thumbnail.center` and half-extent `thumbnail.scale`.
const THUMBNAIL_VS: &str = r#"
struct Thumbnail {
    center: vec2f,
    scale: vec2f,
    near: f32,
    far: f32,
    _pad0: f32,
    _pad1: f32,
}

@group(0) @binding(0) var<uniform> thumbnail: Thumbnail;

struct QuadOut {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> QuadOut {
    var corners = array<vec2f, 6>(
        vec2f(-1.0, -1.0),
        vec2f(1.0, -1.0),
        vec2f(1.0, 1.0),
        vec2f(-1.0, -1.0),
        vec2f(1.0, 1.0),
        vec2f(-1.0, 1.0),
    );
    let corner = corners[vi];
    var out: QuadOut;
    out.position = vec4f(thumbnail.center + corner * thumbnail.scale, 0.0, 1.0);
    out.uv = vec2f(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    return out;
}
"#;

const THUMBNAIL_COLOR_FS: &str = r#"
@group(0) @binding(1) var source_color: texture_2d<f32>;
@group(0) @binding(2) var source_sampler: sampler;

@fragment
fn fs(in: QuadOut) -> @location(0) vec4f {
    return vec4f(textureSample(source_color, source_sampler, in.uv).rgb, 1.0);
}
"#;

const THUMBNAIL_DEPTH_FS: &str = r#"
@group(0) @binding(1) var source_depth: texture_depth_2d;

@fragment
fn fs(in: QuadOut) -> @location(0) vec4f {
    let dims = vec2f(textureDimensions(source_depth));
    let coord = vec2u(clamp(in.uv * dims, vec2f(0.0), dims - vec2f(1.0)));
    let raw = textureLoad(source_depth, coord, 0);
    let dist = linearize_depth(raw, thumbnail.near, thumbnail.far);
    let n = normalized_depth(dist, thumbnail.near, thumbnail.far);
    return vec4f(vec3f(n), 1.0);
}
"#;

const SCENE_VS: &str = r#"
struct CameraUniforms {
    view_proj: mat4x4f,
    camera_pos: vec3f,
    time: f32,
    light_dir: vec3f,
    ambient: f32,
}

struct ModelUniforms {
    model: mat4x4f,
    normal_matrix: mat4x4f,
    color: vec4f,
}

@group(0) @binding(0) var<uniform> camera: CameraUniforms;
@group(1) @binding(0) var<uniform> model: ModelUniforms;

struct VertexIn {
    @location(0) position: vec3f,
    @location(1) normal: vec3f,
    @location(2) uv: vec2f,
}

struct VertexOut {
    @builtin(position) clip: vec4f,
    @location(0) normal: vec3f,
    @location(1) uv: vec2f,
}

@vertex
fn vs(v: VertexIn) -> VertexOut {
    let world = model.model * vec4f(v.position, 1.0);
    var out: VertexOut;
    out.clip = camera.view_proj * world;
    out.normal = (model.normal_matrix * vec4f(v.normal, 0.0)).xyz;
    out.uv = v.uv;
    return out;
}
"#;

const SCENE_FS: &str = r#"
@fragment
fn fs(in: VertexOut, @builtin(front_facing) front: bool) -> @location(0) vec4f {
    // back faces only reach here on double-sided draws
    let n = select(-1.0, 1.0, front) * normalize(in.normal);
    let diffuse = max(dot(n, -normalize(camera.light_dir)), 0.0);
    let light = camera.ambient + (1.0 - camera.ambient) * diffuse;
    return vec4f(model.color.rgb * light, model.color.a);
}
"#;

const RAYMARCH_FS: &str = r#"
struct RaymarchParams {
    inv_view_proj: mat4x4f,
    camera_pos: vec3f,
    near: f32,
    camera_forward: vec3f,
    far: f32,
    light_dir: vec3f,
    ambient: f32,
    sphere: vec4f,
    color: vec4f,
    max_distance: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}

@group(0) @binding(0) var<uniform> raymarch: RaymarchParams;

const MAX_STEPS: i32 = 100;
const HIT_EPSILON: f32 = 0.001;

fn scene_sdf(p: vec3f) -> f32 {
    return length(p - raymarch.sphere.xyz) - raymarch.sphere.w;
}

struct RaymarchOut {
    @location(0) color: vec4f,
    @builtin(frag_depth) depth: f32,
}

@fragment
fn fs(in: FullscreenOut) -> RaymarchOut {
    let ndc = vec2f(in.uv.x * 2.0 - 1.0, 1.0 - in.uv.y * 2.0);
    let on_near = raymarch.inv_view_proj * vec4f(ndc, 0.0, 1.0);
    let dir = normalize(on_near.xyz / on_near.w - raymarch.camera_pos);

    var t = 0.0;
    var hit = false;
    for (var i = 0; i < MAX_STEPS; i++) {
        let d = scene_sdf(raymarch.camera_pos + dir * t);
        if (d < HIT_EPSILON) {
            hit = true;
            break;
        }
        if (t > raymarch.max_distance) {
            break;
        }
        t += d;
    }
    if (!hit) {
        discard;
    }

    let p = raymarch.camera_pos + dir * t;
    let n = normalize(p - raymarch.sphere.xyz);
    let diffuse = max(dot(n, -normalize(raymarch.light_dir)), 0.0);
    let light = raymarch.ambient + (1.0 - raymarch.ambient) * diffuse;

    // depth buffer stores distance along the view axis, not along the ray
    let view_depth = max(t * dot(dir, raymarch.camera_forward), raymarch.near);
    var out: RaymarchOut;
    out.color = vec4f(raymarch.color.rgb * light, raymarch.color.a);
    out.depth = clamp(encode_depth(view_depth, raymarch.near, raymarch.far), 0.0, 1.0);
    return out;
}
"#;

/// Lit color material used by the scene pass.
pub const SCENE: ShaderProgram = ShaderProgram {
    label: "Scene Material",
    prelude: "",
    vertex: SCENE_VS,
    fragment: SCENE_FS,
    slots: &[
        slot("camera", 0, 0, SlotKind::Uniform),
        slot("model", 1, 0, SlotKind::DynamicUniform),
    ],
};

/// Linearizes captured depth and maps it to color.
pub const DEPTH: ShaderProgram = ShaderProgram {
    label: "Depth Effect",
    prelude: DEPTH_MATH,
    vertex: FULLSCREEN_VS,
    fragment: DEPTH_FS,
    slots: &[
        slot("params", 0, 0, SlotKind::Uniform),
        slot("scene_depth", 0, 1, SlotKind::DepthTexture),
        slot("gradient_tex", 0, 2, SlotKind::Texture),
        slot("gradient_sampler", 0, 3, SlotKind::Sampler),
    ],
};

/// Blends scene color with effect color.
pub const COMPOSITE: ShaderProgram = ShaderProgram {
    label: "Composite",
    prelude: "",
    vertex: FULLSCREEN_VS,
    fragment: COMPOSITE_FS,
    slots: &[
        slot("composite", 0, 0, SlotKind::Uniform),
        slot("scene_color", 0, 1, SlotKind::Texture),
        slot("effect_color", 0, 2, SlotKind::Texture),
        slot("color_sampler", 0, 3, SlotKind::Sampler),
    ],
};

/// Debug thumbnail of a color target.
pub const THUMBNAIL_COLOR: ShaderProgram = ShaderProgram {
    label: "Thumbnail Color",
    prelude: "",
    vertex: THUMBNAIL_VS,
    fragment: THUMBNAIL_COLOR_FS,
    slots: &[
        slot("thumbnail", 0, 0, SlotKind::Uniform),
        slot("source_color", 0, 1, SlotKind::Texture),
        slot("source_sampler", 0, 2, SlotKind::Sampler),
    ],
};

/// Debug thumbnail of a depth target, shown as normalized linear depth.
pub const THUMBNAIL_DEPTH: ShaderProgram = ShaderProgram {
    label: "Thumbnail Depth",
    prelude: DEPTH_MATH,
    vertex: THUMBNAIL_VS,
    fragment: THUMBNAIL_DEPTH_FS,
    slots: &[
        slot("thumbnail", 0, 0, SlotKind::Uniform),
        slot("source_depth", 0, 1, SlotKind::DepthTexture),
    ],
};

/// Sphere-traced SDF surface; writes its own fragment depth.
pub const RAYMARCH: ShaderProgram = ShaderProgram {
    label: "Raymarch SDF",
    prelude: DEPTH_MATH,
    vertex: FULLSCREEN_VS,
    fragment: RAYMARCH_FS,
    slots: &[slot("raymarch", 0, 0, SlotKind::Uniform)],
};

/// Every built-in program.
pub const ALL: [&ShaderProgram; 6] = [
    &SCENE,
    &RAYMARCH,
    &DEPTH,
    &COMPOSITE,
    &THUMBNAIL_COLOR,
    &THUMBNAIL_DEPTH,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(program: &ShaderProgram) -> naga::Module {
        let source = program.source();
        naga::front::wgsl::parse_str(&source).unwrap_or_else(|e| {
            panic!(
                "{} failed to parse:\n{}",
                program.label,
                e.emit_to_string(&source)
            )
        })
    }

    #[test]
    fn every_program_validates() {
        for program in ALL {
            let module = parse(program);
            naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::all(),
            )
            .validate(&module)
            .unwrap_or_else(|e| panic!("{} failed validation: {e:?}", program.label));
        }
    }

    #[test]
    fn every_program_has_vs_and_fs_entry_points() {
        for program in ALL {
            let module = parse(program);
            let has = |name: &str, stage: naga::ShaderStage| {
                module
                    .entry_points
                    .iter()
                    .any(|ep| ep.name == name && ep.stage == stage)
            };
            assert!(has(ShaderProgram::VERTEX_ENTRY, naga::ShaderStage::Vertex), "{}", program.label);
            assert!(has(ShaderProgram::FRAGMENT_ENTRY, naga::ShaderStage::Fragment), "{}", program.label);
        }
    }

    #[test]
    fn declared_slots_match_module_globals() {
        for program in ALL {
            let module = parse(program);
            let bound: Vec<(String, u32, u32)> = module
                .global_variables
                .iter()
                .filter_map(|(_, var)| {
                    let binding = var.binding.as_ref()?;
                    Some((var.name.clone()?, binding.group, binding.binding))
                })
                .collect();

            for slot in program.slots {
                assert!(
                    bound.contains(&(slot.name.to_string(), slot.group, slot.binding)),
                    "{}: slot '{}' not declared at @group({}) @binding({})",
                    program.label,
                    slot.name,
                    slot.group,
                    slot.binding
                );
            }
            assert_eq!(
                bound.len(),
                program.slots.len(),
                "{}: module declares resources missing from the slot list",
                program.label
            );
        }
    }

    #[test]
    fn slot_bindings_are_unique_per_group() {
        for program in ALL {
            for group in 0..program.group_count() {
                let slots = program.group_slots(group);
                let mut bindings: Vec<u32> = slots.iter().map(|s| s.binding).collect();
                bindings.dedup();
                assert_eq!(bindings.len(), slots.len(), "{}", program.label);
            }
        }
    }

    #[test]
    fn raymarch_writes_fragment_depth() {
        let module = parse(&RAYMARCH);
        let fs = module
            .entry_points
            .iter()
            .find(|ep| ep.stage == naga::ShaderStage::Fragment)
            .unwrap();
        let result = fs.function.result.as_ref().unwrap();
        let naga::TypeInner::Struct { members, .. } = &module.types[result.ty].inner else {
            panic!("raymarch fragment output is not a struct");
        };
        assert!(members.iter().any(|m| {
            m.binding == Some(naga::Binding::BuiltIn(naga::BuiltIn::FragDepth))
        }));
    }

    #[test]
    fn layout_entries_follow_slot_kinds() {
        let entries = DEPTH.layout_entries(0);
        assert_eq!(entries.len(), 4);
        assert!(matches!(
            entries[1].ty,
            wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Depth,
                ..
            }
        ));
        let model = SCENE.layout_entries(1);
        assert!(matches!(
            model[0].ty,
            wgpu::BindingType::Buffer {
                has_dynamic_offset: true,
                ..
            }
        ));
        assert_eq!(SCENE.group_count(), 2);
    }
}
