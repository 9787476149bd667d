use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::shaders;

/// Bloom tuning. With the default zero threshold the whole scene glows
/// slightly; the moon and lamp head dominate through their emissive terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomSettings {
    pub threshold: f32,
    pub strength: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            strength: 1.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct BloomUniform {
    params: [f32; 4],
    direction: [f32; 4],
}

pub(crate) const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Post-processing chain: bright-pass extract, separable blur at half
/// resolution, additive composite onto the surface.
pub(crate) struct BloomChain {
    settings: BloomSettings,
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    bright_buffer: wgpu::Buffer,
    blur_h_buffer: wgpu::Buffer,
    blur_v_buffer: wgpu::Buffer,
    composite_buffer: wgpu::Buffer,
    // Size-dependent state, rebuilt on resize.
    ping: wgpu::TextureView,
    pong: wgpu::TextureView,
    bright_group: wgpu::BindGroup,
    blur_h_group: wgpu::BindGroup,
    blur_v_group: wgpu::BindGroup,
    composite_group: wgpu::BindGroup,
}

impl BloomChain {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        hdr_view: &wgpu::TextureView,
        width: u32,
        height: u32,
        settings: BloomSettings,
    ) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("bloom_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("bloom_pipeline_layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("bloom_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BLOOM_SHADER.into()),
        });

        let fullscreen = |entry: &'static str, format: wgpu::TextureFormat| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(entry),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_fullscreen"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            })
        };

        let bright_pipeline = fullscreen("fs_bright", HDR_FORMAT);
        let blur_pipeline = fullscreen("fs_blur", HDR_FORMAT);
        let composite_pipeline = fullscreen("fs_composite", surface_format);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("bloom_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniform = |label: &str| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&BloomUniform {
                    params: [0.0; 4],
                    direction: [0.0; 4],
                }),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let bright_buffer = uniform("bloom_bright_uniform");
        let blur_h_buffer = uniform("bloom_blur_h_uniform");
        let blur_v_buffer = uniform("bloom_blur_v_uniform");
        let composite_buffer = uniform("bloom_composite_uniform");

        let (ping, pong, bright_group, blur_h_group, blur_v_group, composite_group) =
            Self::build_targets(
                device,
                &layout,
                &sampler,
                hdr_view,
                &bright_buffer,
                &blur_h_buffer,
                &blur_v_buffer,
                &composite_buffer,
                width,
                height,
            );

        Self {
            settings,
            layout,
            sampler,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            bright_buffer,
            blur_h_buffer,
            blur_v_buffer,
            composite_buffer,
            ping,
            pong,
            bright_group,
            blur_h_group,
            blur_v_group,
            composite_group,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_targets(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        hdr_view: &wgpu::TextureView,
        bright_buffer: &wgpu::Buffer,
        blur_h_buffer: &wgpu::Buffer,
        blur_v_buffer: &wgpu::Buffer,
        composite_buffer: &wgpu::Buffer,
        width: u32,
        height: u32,
    ) -> (
        wgpu::TextureView,
        wgpu::TextureView,
        wgpu::BindGroup,
        wgpu::BindGroup,
        wgpu::BindGroup,
        wgpu::BindGroup,
    ) {
        let half = |n: u32| (n / 2).max(1);
        let target = |label: &str| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: half(width),
                        height: half(height),
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: HDR_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&Default::default())
        };
        let ping = target("bloom_ping");
        let pong = target("bloom_pong");

        let group = |label: &str,
                     buffer: &wgpu::Buffer,
                     source: &wgpu::TextureView,
                     extra: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(extra),
                    },
                ],
            })
        };

        let bright_group = group("bloom_bright_group", bright_buffer, hdr_view, hdr_view);
        let blur_h_group = group("bloom_blur_h_group", blur_h_buffer, &ping, &ping);
        let blur_v_group = group("bloom_blur_v_group", blur_v_buffer, &pong, &pong);
        // Composite reads the full-res scene and the final blurred half-res.
        let composite_group = group("bloom_composite_group", composite_buffer, hdr_view, &ping);

        (
            ping,
            pong,
            bright_group,
            blur_h_group,
            blur_v_group,
            composite_group,
        )
    }

    /// Rebuild the half-resolution targets and bind groups for a new size.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        hdr_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let (ping, pong, bright, blur_h, blur_v, composite) = Self::build_targets(
            device,
            &self.layout,
            &self.sampler,
            hdr_view,
            &self.bright_buffer,
            &self.blur_h_buffer,
            &self.blur_v_buffer,
            &self.composite_buffer,
            width,
            height,
        );
        self.ping = ping;
        self.pong = pong;
        self.bright_group = bright;
        self.blur_h_group = blur_h;
        self.blur_v_group = blur_v;
        self.composite_group = composite;
    }

    /// Record the full chain: bright-pass, two blur passes, composite to the
    /// surface view.
    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) {
        let half_w = (width / 2).max(1) as f32;
        let half_h = (height / 2).max(1) as f32;

        queue.write_buffer(
            &self.bright_buffer,
            0,
            bytemuck::bytes_of(&BloomUniform {
                params: [
                    self.settings.threshold,
                    self.settings.strength,
                    1.0 / width.max(1) as f32,
                    1.0 / height.max(1) as f32,
                ],
                direction: [0.0; 4],
            }),
        );
        queue.write_buffer(
            &self.blur_h_buffer,
            0,
            bytemuck::bytes_of(&BloomUniform {
                params: [0.0, 0.0, 1.0 / half_w, 1.0 / half_h],
                direction: [1.0, 0.0, 0.0, 0.0],
            }),
        );
        queue.write_buffer(
            &self.blur_v_buffer,
            0,
            bytemuck::bytes_of(&BloomUniform {
                params: [0.0, 0.0, 1.0 / half_w, 1.0 / half_h],
                direction: [0.0, 1.0, 0.0, 0.0],
            }),
        );
        queue.write_buffer(
            &self.composite_buffer,
            0,
            bytemuck::bytes_of(&BloomUniform {
                params: [
                    self.settings.threshold,
                    self.settings.strength,
                    1.0 / width.max(1) as f32,
                    1.0 / height.max(1) as f32,
                ],
                direction: [0.0; 4],
            }),
        );

        let mut fullscreen_pass =
            |label: &str,
             pipeline: &wgpu::RenderPipeline,
             group: &wgpu::BindGroup,
             target: &wgpu::TextureView| {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some(label),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, group, &[]);
                pass.draw(0..3, 0..1);
            };

        fullscreen_pass("bloom_bright", &self.bright_pipeline, &self.bright_group, &self.ping);
        fullscreen_pass("bloom_blur_h", &self.blur_pipeline, &self.blur_h_group, &self.pong);
        fullscreen_pass("bloom_blur_v", &self.blur_pipeline, &self.blur_v_group, &self.ping);
        fullscreen_pass(
            "bloom_composite",
            &self.composite_pipeline,
            &self.composite_group,
            surface_view,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_the_demo() {
        let s = BloomSettings::default();
        assert_eq!(s.threshold, 0.0);
        assert_eq!(s.strength, 1.0);
    }
}
