use std::sync::Arc;

use wgpu::{
    BindGroup, RenderPipeline, Surface, SurfaceConfiguration, Texture, TextureView,
};
use winit::window::Window;

use super::context::GpuContext;
use crate::view::{RenderSurface, SurfaceSize};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Sample count for the resolve pass; MSAA is a surface configuration choice,
/// it never affects scheduling
fn sample_count(msaa_enabled: bool) -> u32 {
    if msaa_enabled {
        4
    } else {
        1
    }
}

fn pixel_len_matches(len: usize, width: u32, height: u32) -> bool {
    len == (width * height * 4) as usize
}

/// Presents delegate output on a window surface
///
/// The delegate renders into an internal RGBA texture (via `upload_pixels`);
/// `present` blits that texture to the swapchain with a fullscreen triangle
/// and presents the frame. With MSAA enabled the blit renders into a
/// 4-sample target resolved to the swapchain view.
pub struct SkySurface {
    window: Arc<Window>,
    gpu: GpuContext,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    blit_pipeline: RenderPipeline,
    texture: Texture,
    texture_view: TextureView,
    bind_group: BindGroup,
    msaa_target: Option<TextureView>,
    sample_count: u32,
    width: u32,
    height: u32,
}

impl SkySurface {
    /// Create a presenter for a window; blocks on adapter/device setup
    pub fn new(window: Arc<Window>, msaa_enabled: bool) -> Result<Self> {
        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let gpu = pollster::block_on(GpuContext::for_surface(&instance, &surface))?;

        let surface_caps = surface.get_capabilities(&Self::adapter_for(&instance, &surface)?);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(gpu.device(), &surface_config);

        let sample_count = sample_count(msaa_enabled);
        let texture = Self::create_source_texture(&gpu, width, height);
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let msaa_target =
            Self::create_msaa_target(&gpu, surface_format, sample_count, width, height);

        let (blit_pipeline, bind_group) =
            Self::create_blit_pipeline(&gpu, &texture_view, surface_format, sample_count);

        log::info!(
            "surface ready: {}x{}, {} sample(s), {:?}",
            width,
            height,
            sample_count,
            surface_format
        );

        Ok(Self {
            window,
            gpu,
            surface,
            surface_config,
            blit_pipeline,
            texture,
            texture_view,
            bind_group,
            msaa_target,
            sample_count,
            width,
            height,
        })
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    pub fn msaa_enabled(&self) -> bool {
        self.sample_count > 1
    }

    /// Upload an RGBA frame into the source texture
    pub fn upload_pixels(&self, pixels: &[u8]) -> Result<()> {
        if !pixel_len_matches(pixels.len(), self.width, self.height) {
            return Err(format!(
                "Invalid pixel buffer size: expected {} bytes, got {}",
                (self.width * self.height * 4),
                pixels.len()
            )
            .into());
        }

        self.gpu.queue().write_texture(
            self.texture.as_image_copy(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * self.width),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    /// Reconfigure the swapchain and internal targets after a window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.width = width;
        self.height = height;
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface
            .configure(self.gpu.device(), &self.surface_config);

        self.texture = Self::create_source_texture(&self.gpu, width, height);
        self.texture_view = self
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.msaa_target = Self::create_msaa_target(
            &self.gpu,
            self.surface_config.format,
            self.sample_count,
            width,
            height,
        );

        let layout = self.blit_pipeline.get_bind_group_layout(0);
        self.bind_group = Self::create_bind_group(&self.gpu, &layout, &self.texture_view);

        log::debug!("surface resized to {}x{}", width, height);
    }

    fn create_source_texture(gpu: &GpuContext, width: u32, height: u32) -> Texture {
        gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("Sky Source Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_msaa_target(
        gpu: &GpuContext,
        format: wgpu::TextureFormat,
        sample_count: u32,
        width: u32,
        height: u32,
    ) -> Option<TextureView> {
        if sample_count == 1 {
            return None;
        }
        let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("Sky MSAA Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        Some(texture.create_view(&wgpu::TextureViewDescriptor::default()))
    }

    fn create_blit_pipeline(
        gpu: &GpuContext,
        texture_view: &TextureView,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> (RenderPipeline, BindGroup) {
        let device = gpu.device();
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sky Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../blit.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sky Blit Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let bind_group = Self::create_bind_group(gpu, &bind_group_layout, texture_view);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sky Blit Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sky Blit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        (pipeline, bind_group)
    }

    fn create_bind_group(
        gpu: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        texture_view: &TextureView,
    ) -> BindGroup {
        let device = gpu.device();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sky Blit Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky Blit Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        })
    }

    fn adapter_for(
        instance: &wgpu::Instance,
        surface: &Surface<'_>,
    ) -> Result<wgpu::Adapter> {
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| format!("Failed to find appropriate adapter: {:?}", e).into())
    }
}

impl RenderSurface for SkySurface {
    fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    fn present(&mut self) -> bool {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("skipping frame: {:?}", e);
                return false;
            }
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.gpu
                .device()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Sky Present Encoder"),
                });

        {
            let (view, resolve_target) = match &self.msaa_target {
                Some(msaa_view) => (msaa_view, Some(&surface_view)),
                None => (&surface_view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Sky Blit Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.blit_pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.gpu.queue().submit(Some(encoder.finish()));
        surface_texture.present();
        true
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_count_follows_msaa_flag() {
        assert_eq!(sample_count(true), 4);
        assert_eq!(sample_count(false), 1);
    }

    #[test]
    fn pixel_len_validation() {
        assert!(pixel_len_matches(100 * 100 * 4, 100, 100));
        assert!(!pixel_len_matches(100 * 100 * 4 - 1, 100, 100));
        assert!(!pixel_len_matches(0, 1, 1));
    }
}
