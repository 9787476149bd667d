use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use moonwake_assets::{AssetStore, CubemapData, TextureData};
use moonwake_common::{NodeId, rgb};
use moonwake_render::RenderView;
use moonwake_scene::{MeshSource, Scene};
use wgpu::util::DeviceExt;

use crate::bloom::{BloomChain, BloomSettings, HDR_FORMAT};
use crate::mesh::{self, GpuMesh, LINE_LAYOUT, VERTEX_LAYOUT};
use crate::shaders;

const MAX_POINT_LIGHTS: usize = 4;
const MAX_OBJECTS: u64 = 64;
/// Dynamic-offset stride for per-object uniforms (min alignment 256).
const OBJECT_STRIDE: u64 = 256;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    eye: [f32; 4],
    ambient: [f32; 4],
    fog: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Default, Pod, Zeroable)]
struct PointLightUniform {
    position: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LightsUniform {
    points: [PointLightUniform; MAX_POINT_LIGHTS],
    count: [u32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct ObjectUniform {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    emissive: [f32; 4],
    flags: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct WaterUniform {
    deep_color: [f32; 4],
    params: [f32; 4],
    moon_dir: [f32; 4],
}

/// Night fog, when the scene's fog flag is set.
const FOG_COLOR: u32 = 0x0b0d1a;
const FOG_DENSITY: f32 = 0.0035;

/// wgpu scene renderer.
///
/// Owns the pipelines, the HDR offscreen target, the bloom chain, and GPU
/// copies of whatever assets have finished loading. Call
/// [`sync_assets`](Self::sync_assets) after the loader poll each frame, then
/// [`render`](Self::render).
pub struct SceneRenderer {
    width: u32,
    height: u32,

    globals_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    globals_group: wgpu::BindGroup,

    object_buffer: wgpu::Buffer,
    object_group: wgpu::BindGroup,

    material_layout: wgpu::BindGroupLayout,
    white_group: wgpu::BindGroup,
    flat_normal_group: wgpu::BindGroup,
    texture_groups: BTreeMap<String, wgpu::BindGroup>,
    texture_sampler: wgpu::Sampler,

    sky_layout: wgpu::BindGroupLayout,
    sky_group: Option<wgpu::BindGroup>,

    water_buffer: wgpu::Buffer,
    water_group: wgpu::BindGroup,
    water_normal_group: Option<wgpu::BindGroup>,
    water_mesh: Option<GpuMesh>,

    mesh_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,

    model_meshes: BTreeMap<String, Vec<GpuMesh>>,
    primitive_meshes: BTreeMap<NodeId, GpuMesh>,
    grid_buffer: wgpu::Buffer,
    grid_vertex_count: u32,

    depth_view: wgpu::TextureView,
    hdr_view: wgpu::TextureView,
    bloom: BloomChain,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        // Bind group 0: globals + lights.
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, false),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT, false),
            ],
        });
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals_buffer"),
            contents: bytemuck::bytes_of(&Globals {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                inv_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                eye: [0.0; 4],
                ambient: [0.0; 4],
                fog: [0.0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lights_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lights_buffer"),
            contents: bytemuck::bytes_of(&LightsUniform {
                points: [PointLightUniform::default(); MAX_POINT_LIGHTS],
                count: [0; 4],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_group"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });

        // Bind group 1 (mesh pass): per-object uniform with dynamic offset.
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT, true)],
        });
        let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_buffer"),
            size: MAX_OBJECTS * OBJECT_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let object_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_group"),
            layout: &object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &object_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniform>() as u64),
                }),
            }],
        });

        // Bind group 2 (mesh pass): material texture.
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::D2),
                sampler_entry(1),
            ],
        });
        let texture_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        // Fallbacks for not-yet-loaded textures: white for base color,
        // straight-up for normal maps.
        let white_group = solid_pixel_group(
            device,
            queue,
            &material_layout,
            &texture_sampler,
            "white_texture",
            [255, 255, 255, 255],
            wgpu::TextureFormat::Rgba8UnormSrgb,
        );
        let flat_normal_group = solid_pixel_group(
            device,
            queue,
            &material_layout,
            &texture_sampler,
            "flat_normal_texture",
            [128, 128, 255, 255],
            wgpu::TextureFormat::Rgba8Unorm,
        );

        // Sky cubemap bind group layout.
        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky_layout"),
            entries: &[
                texture_entry(0, wgpu::TextureViewDimension::Cube),
                sampler_entry(1),
            ],
        });

        // Water uniform.
        let water_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("water_layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT, false)],
        });
        let water_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("water_buffer"),
            contents: bytemuck::bytes_of(&WaterUniform {
                deep_color: [0.0; 4],
                params: [0.0; 4],
                moon_dir: [0.0, 1.0, 0.0, 0.0],
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let water_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("water_group"),
            layout: &water_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: water_buffer.as_entire_binding(),
            }],
        });

        // Pipelines.
        let depth_state = wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::mesh_shader().into()),
        });
        let mesh_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("mesh_pipeline_layout"),
                bind_group_layouts: &[&globals_layout, &object_layout, &material_layout],
                push_constant_ranges: &[],
            });
        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&mesh_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[VERTEX_LAYOUT],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(HDR_FORMAT.into())],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_state.clone()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::sky_shader().into()),
        });
        let sky_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky_pipeline_layout"),
            bind_group_layouts: &[&globals_layout, &sky_layout],
            push_constant_ranges: &[],
        });
        let sky_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sky_pipeline"),
            layout: Some(&sky_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sky_shader,
                entry_point: Some("vs_sky"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sky_shader,
                entry_point: Some("fs_sky"),
                compilation_options: Default::default(),
                targets: &[Some(HDR_FORMAT.into())],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                ..depth_state.clone()
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let water_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("water_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::water_shader().into()),
        });
        let water_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("water_pipeline_layout"),
                bind_group_layouts: &[&globals_layout, &water_layout, &sky_layout, &material_layout],
                push_constant_ranges: &[],
            });
        let water_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("water_pipeline"),
            layout: Some(&water_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &water_shader,
                entry_point: Some("vs_water"),
                compilation_options: Default::default(),
                buffers: &[VERTEX_LAYOUT],
            },
            fragment: Some(wgpu::FragmentState {
                module: &water_shader,
                entry_point: Some("fs_water"),
                compilation_options: Default::default(),
                targets: &[Some(HDR_FORMAT.into())],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state.clone()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::grid_shader().into()),
        });
        let grid_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("grid_pipeline_layout"),
                bind_group_layouts: &[&globals_layout],
                push_constant_ranges: &[],
            });
        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&grid_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[LINE_LAYOUT],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &[Some(HDR_FORMAT.into())],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_state),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Debug grid floor + axes.
        let grid_verts = mesh::grid_and_axes(12, 2.0);
        let grid_vertex_count = grid_verts.len() as u32;
        let grid_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_buffer"),
            contents: bytemuck::cast_slice(&grid_verts),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let depth_view = create_depth(device, width, height);
        let hdr_view = create_hdr(device, width, height);
        let bloom = BloomChain::new(
            device,
            surface_format,
            &hdr_view,
            width,
            height,
            BloomSettings::default(),
        );

        Self {
            width,
            height,
            globals_buffer,
            lights_buffer,
            globals_group,
            object_buffer,
            object_group,
            material_layout,
            white_group,
            flat_normal_group,
            texture_groups: BTreeMap::new(),
            texture_sampler,
            sky_layout,
            sky_group: None,
            water_buffer,
            water_group,
            water_normal_group: None,
            water_mesh: None,
            mesh_pipeline,
            sky_pipeline,
            water_pipeline,
            grid_pipeline,
            model_meshes: BTreeMap::new(),
            primitive_meshes: BTreeMap::new(),
            grid_buffer,
            grid_vertex_count,
            depth_view,
            hdr_view,
            bloom,
        }
    }

    /// Rebuild size-dependent targets.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.depth_view = create_depth(device, self.width, self.height);
        self.hdr_view = create_hdr(device, self.width, self.height);
        self.bloom
            .resize(device, &self.hdr_view, self.width, self.height);
    }

    /// Upload GPU copies of any assets that have finished loading since the
    /// last call, and materialize primitive meshes on first sight.
    pub fn sync_assets(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        store: &AssetStore,
    ) {
        if self.sky_group.is_none() {
            if let Some(sky) = &scene.sky {
                if let Some(cubemap) = store.cubemap(&sky.faces[0]) {
                    self.sky_group = Some(self.upload_cubemap(device, queue, cubemap));
                    tracing::debug!("sky cubemap uploaded");
                }
            }
        }

        for (id, renderable) in &scene.renderables {
            match &renderable.mesh {
                MeshSource::Model { path } => {
                    if !self.model_meshes.contains_key(path) {
                        if let Some(meshes) = store.model(path) {
                            let uploaded: Vec<GpuMesh> =
                                meshes.iter().map(|m| mesh::upload_mesh(device, m)).collect();
                            tracing::debug!(%path, meshes = uploaded.len(), "model uploaded");
                            self.model_meshes.insert(path.clone(), uploaded);
                        }
                    }
                }
                MeshSource::Primitive(primitive) => {
                    if !self.primitive_meshes.contains_key(id) {
                        let (vertices, indices) = mesh::primitive_mesh(*primitive);
                        self.primitive_meshes.insert(
                            *id,
                            mesh::upload_vertices(
                                device,
                                "primitive",
                                &vertices,
                                &indices,
                                [1.0; 4],
                            ),
                        );
                    }
                }
            }

            if let Some(path) = &renderable.material.texture {
                if !self.texture_groups.contains_key(path) {
                    if let Some(texture) = store.texture(path) {
                        let group = self.upload_texture(device, queue, texture, true);
                        self.texture_groups.insert(path.clone(), group);
                        tracing::debug!(%path, "texture uploaded");
                    }
                }
            }
        }

        if let Some(water) = &scene.water {
            if self.water_mesh.is_none() {
                let (vertices, indices) = mesh::water_plane(water.size, water.height);
                self.water_mesh = Some(mesh::upload_vertices(
                    device,
                    "water_plane",
                    &vertices,
                    &indices,
                    [1.0; 4],
                ));
            }
            if self.water_normal_group.is_none() {
                if let Some(texture) = store.texture(&water.normal_map) {
                    self.water_normal_group =
                        Some(self.upload_texture(device, queue, texture, false));
                    tracing::debug!("water normal map uploaded");
                }
            }
        }
    }

    /// Render one frame into the surface view (scene into HDR, then bloom).
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        scene: &Scene,
        view: &RenderView,
    ) {
        let aspect = self.width as f32 / self.height.max(1) as f32;
        let view_proj = view.projection(aspect) * view.view;
        let ambient = scene.ambient();
        let fog_color = rgb(FOG_COLOR);
        queue.write_buffer(
            &self.globals_buffer,
            0,
            bytemuck::bytes_of(&Globals {
                view_proj: view_proj.to_cols_array_2d(),
                inv_view_proj: view_proj.inverse().to_cols_array_2d(),
                eye: [view.eye.x, view.eye.y, view.eye.z, 0.0],
                ambient: [
                    ambient.x,
                    ambient.y,
                    ambient.z,
                    if scene.fog_enabled { 1.0 } else { 0.0 },
                ],
                fog: [fog_color.x, fog_color.y, fog_color.z, FOG_DENSITY],
            }),
        );

        let mut lights = LightsUniform {
            points: [PointLightUniform::default(); MAX_POINT_LIGHTS],
            count: [0; 4],
        };
        for (position, color, intensity, range) in
            scene.point_lights().into_iter().take(MAX_POINT_LIGHTS)
        {
            let slot = lights.count[0] as usize;
            lights.points[slot] = PointLightUniform {
                position: [position.x, position.y, position.z, range],
                color: [color.x, color.y, color.z, intensity],
            };
            lights.count[0] += 1;
        }
        queue.write_buffer(&self.lights_buffer, 0, bytemuck::bytes_of(&lights));

        if let Some(water) = &scene.water {
            let moon_dir = scene
                .graph
                .find("moon")
                .and_then(|id| scene.graph.node(id))
                .map(|n| n.transform.position.normalize_or_zero())
                .unwrap_or(Vec3::new(0.37, 0.37, 0.74).normalize());
            queue.write_buffer(
                &self.water_buffer,
                0,
                bytemuck::bytes_of(&WaterUniform {
                    deep_color: [
                        water.deep_color.x,
                        water.deep_color.y,
                        water.deep_color.z,
                        1.0,
                    ],
                    params: [water.time, water.distortion_scale, water.size, 0.0],
                    moon_dir: [moon_dir.x, moon_dir.y, moon_dir.z, 0.0],
                }),
            );
        }

        // Collect draws and stage per-object uniforms at aligned offsets.
        let mut staging = vec![0u8; (MAX_OBJECTS * OBJECT_STRIDE) as usize];
        let mut draws: Vec<(u32, &GpuMesh, Option<&str>)> = Vec::new();
        for (id, renderable) in &scene.renderables {
            let Some(node) = scene.graph.node(*id) else {
                continue;
            };
            let model = node.transform.matrix().to_cols_array_2d();
            let material = &renderable.material;
            let texture = material.texture.as_deref();

            let meshes: Vec<&GpuMesh> = match &renderable.mesh {
                MeshSource::Model { path } => match self.model_meshes.get(path) {
                    // Not resident yet: the load is still in flight (or it
                    // failed and was logged); render without it.
                    None => continue,
                    Some(meshes) => meshes.iter().collect(),
                },
                MeshSource::Primitive(_) => match self.primitive_meshes.get(id) {
                    None => continue,
                    Some(mesh) => vec![mesh],
                },
            };

            for gpu_mesh in meshes {
                if draws.len() as u64 >= MAX_OBJECTS {
                    tracing::warn!("object budget exhausted, remaining draws skipped");
                    break;
                }
                let tint = material.base_color;
                let uniform = ObjectUniform {
                    model,
                    color: [
                        tint.x * gpu_mesh.base_color[0],
                        tint.y * gpu_mesh.base_color[1],
                        tint.z * gpu_mesh.base_color[2],
                        1.0,
                    ],
                    emissive: [
                        material.emissive.x,
                        material.emissive.y,
                        material.emissive.z,
                        0.0,
                    ],
                    flags: [
                        if material.unlit { 1.0 } else { 0.0 },
                        if texture.is_some() { 1.0 } else { 0.0 },
                        0.0,
                        0.0,
                    ],
                };
                let offset = draws.len() * OBJECT_STRIDE as usize;
                staging[offset..offset + std::mem::size_of::<ObjectUniform>()]
                    .copy_from_slice(bytemuck::bytes_of(&uniform));
                draws.push((offset as u32, gpu_mesh, texture));
            }
        }
        queue.write_buffer(&self.object_buffer, 0, &staging);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.hdr_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.01,
                            g: 0.01,
                            b: 0.02,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            // Sky first: no depth write, everything else draws over it.
            if let Some(sky_group) = &self.sky_group {
                pass.set_pipeline(&self.sky_pipeline);
                pass.set_bind_group(0, &self.globals_group, &[]);
                pass.set_bind_group(1, sky_group, &[]);
                pass.draw(0..3, 0..1);
            }

            pass.set_pipeline(&self.mesh_pipeline);
            pass.set_bind_group(0, &self.globals_group, &[]);
            for (offset, gpu_mesh, texture) in &draws {
                pass.set_bind_group(1, &self.object_group, &[*offset]);
                let material_group = texture
                    .and_then(|path| self.texture_groups.get(path))
                    .unwrap_or(&self.white_group);
                pass.set_bind_group(2, material_group, &[]);
                pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(gpu_mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..gpu_mesh.index_count, 0, 0..1);
            }

            // Water needs the sky for reflections; skip it until both the
            // plane and the cubemap are resident.
            if scene.water.is_some() {
                if let (Some(water_mesh), Some(sky_group)) = (&self.water_mesh, &self.sky_group) {
                    pass.set_pipeline(&self.water_pipeline);
                    pass.set_bind_group(0, &self.globals_group, &[]);
                    pass.set_bind_group(1, &self.water_group, &[]);
                    pass.set_bind_group(2, sky_group, &[]);
                    pass.set_bind_group(
                        3,
                        self.water_normal_group
                            .as_ref()
                            .unwrap_or(&self.flat_normal_group),
                        &[],
                    );
                    pass.set_vertex_buffer(0, water_mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(
                        water_mesh.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );
                    pass.draw_indexed(0..water_mesh.index_count, 0, 0..1);
                }
            }

            if scene.debug_grid {
                pass.set_pipeline(&self.grid_pipeline);
                pass.set_bind_group(0, &self.globals_group, &[]);
                pass.set_vertex_buffer(0, self.grid_buffer.slice(..));
                pass.draw(0..self.grid_vertex_count, 0..1);
            }
        }

        self.bloom
            .run(&mut encoder, queue, surface_view, self.width, self.height);

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn upload_texture(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &TextureData,
        srgb: bool,
    ) -> wgpu::BindGroup {
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            // Data textures (normal maps) carry vectors, not colors.
            wgpu::TextureFormat::Rgba8Unorm
        };
        let gpu_texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("scene_texture"),
                size: wgpu::Extent3d {
                    width: texture.width,
                    height: texture.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &texture.pixels,
        );
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_texture_group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(
                        &gpu_texture.create_view(&Default::default()),
                    ),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.texture_sampler),
                },
            ],
        })
    }

    fn upload_cubemap(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        cubemap: &CubemapData,
    ) -> wgpu::BindGroup {
        let mut data = Vec::with_capacity(cubemap.faces.iter().map(Vec::len).sum());
        for face in &cubemap.faces {
            data.extend_from_slice(face);
        }
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("sky_cubemap"),
                size: wgpu::Extent3d {
                    width: cubemap.size,
                    height: cubemap.size,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky_group"),
            layout: &self.sky_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.texture_sampler),
                },
            ],
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn solid_pixel_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    pixel: [u8; 4],
    format: wgpu::TextureFormat,
) -> wgpu::BindGroup {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &pixel,
    );
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(
                    &texture.create_view(&Default::default()),
                ),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    dynamic: bool,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_depth(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&Default::default())
}

fn create_hdr(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("hdr_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: HDR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
        .create_view(&Default::default())
}
