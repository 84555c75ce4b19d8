//! Accelerator-offload backend via wgpu.
//!
//! Offloads the per-pair rate evaluation — the only part of a substep
//! that scales with the population — to a WGSL compute shader, one
//! invocation per candidate pair. Pair sampling and the Monte-Carlo
//! multiplicity bookkeeping stay on the host: they are cheap, inherently
//! sequential on the ensemble RNG, and branch-heavy in a way GPUs handle
//! poorly.
//!
//! # Precision
//!
//! WGSL has no native f64 support, so rate evaluation on the device runs
//! in f32 (the enhancement table itself is only quoted to four digits).
//! The f64 ↔ f32 conversion happens at the Rust boundary; droplet state
//! keeps the ensemble's precision parameter. Device rates therefore
//! differ from the serial backend in the last f32 bits — this backend
//! trades bit-parity for throughput.
//!
//! Gated behind the `gpu` cargo feature.

use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};

use nimbus_core::enhancement::ENHANCEMENT;
use nimbus_core::kernel::CollisionKernel;
use nimbus_core::types::{Real, ZeroDimConfig};

use crate::ensemble::{BackendTag, EnsembleError, ParticleEnsemble};
use crate::state::ZeroDimState;

/// Uniform buffer parameters passed to the WGSL shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ShaderParams {
    n_pairs: u32,
    kernel_kind: u32,
    eps: f32,
    golovin_b: f32,
    scale: f32,
    _pad0: u32,
    _pad1: u32,
    _pad2: u32,
}

/// One candidate pair as uploaded to the device.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct PairInput {
    r1: f32,
    r2: f32,
    xi_max: f32,
    _pad: f32,
}

/// GPU super-droplet ensemble.
///
/// Holds the wgpu device, queue and compiled compute pipeline alongside
/// the droplet state. The enhancement table is uploaded once at
/// construction and stays resident for the lifetime of the ensemble.
pub struct GpuEnsemble<R: Real> {
    state: ZeroDimState<R>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    table_buffer: wgpu::Buffer,
    device_name: String,
}

impl<R: Real> GpuEnsemble<R> {
    /// Create a GPU ensemble asynchronously.
    ///
    /// Requests a high-performance adapter if available, otherwise falls
    /// back to any available adapter.
    ///
    /// # Panics
    /// Panics if the configuration violates its physical-range invariants.
    pub async fn new_async(config: ZeroDimConfig) -> Result<Self, EnsembleError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or_else(|| EnsembleError::Device("no GPU adapter found".into()))?;

        let device_name = adapter.get_info().name.clone();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("nimbus-ensemble"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| EnsembleError::Device(format!("failed to create device: {e}")))?;

        // Compile the WGSL compute shader.
        let shader_source = include_str!("shaders/pair_rates.wgsl");
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pair_rates_shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(shader_source)),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("pair_rates_bind_group_layout"),
                entries: &[
                    // binding 0: enhancement table (storage, read-only)
                    storage_entry(0, true),
                    // binding 1: candidate pairs (storage, read-only)
                    storage_entry(1, true),
                    // binding 2: expectations (storage, read-write)
                    storage_entry(2, false),
                    // binding 3: params uniform
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pair_rates_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("pair_rates_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        // Upload the enhancement table once, flattened to f32 in the
        // [row][class][column] order the shader indexes.
        let table: Vec<f32> = ENHANCEMENT
            .iter()
            .flatten()
            .flatten()
            .map(|&x| x as f32)
            .collect();
        let table_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("enhancement_table"),
            size: (table.len() * std::mem::size_of::<f32>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&table_buffer, 0, bytemuck::cast_slice(&table));

        log::info!("GPU ensemble on {device_name}");

        Ok(Self {
            state: ZeroDimState::new(config),
            device,
            queue,
            pipeline,
            bind_group_layout,
            table_buffer,
            device_name,
        })
    }

    /// Create a GPU ensemble, blocking the current thread.
    ///
    /// Convenience wrapper around [`new_async`](Self::new_async) using
    /// `pollster` to block on the async initialisation.
    pub fn new_blocking(config: ZeroDimConfig) -> Result<Self, EnsembleError> {
        pollster::block_on(Self::new_async(config))
    }

    /// Name of the adapter this ensemble runs on.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Dispatch the rate evaluation for one substep and read back the
    /// per-pair expectations.
    fn evaluate_rates(
        &self,
        pairs: &[(usize, usize)],
        eps: f64,
        scale: f64,
    ) -> Result<Vec<f64>, EnsembleError> {
        let inputs: Vec<PairInput> = pairs
            .iter()
            .map(|&(i, j)| {
                let a = &self.state.droplets[i];
                let b = &self.state.droplets[j];
                PairInput {
                    r1: a.radius.as_f64() as f32,
                    r2: b.radius.as_f64() as f32,
                    xi_max: a.multiplicity.max(b.multiplicity) as f32,
                    _pad: 0.0,
                }
            })
            .collect();

        let (kernel_kind, golovin_b) = match self.state.config.kernel {
            CollisionKernel::Golovin { b } => (0, b as f32),
            CollisionKernel::Hydrodynamic => (1, 0.0),
        };
        let params = ShaderParams {
            n_pairs: inputs.len() as u32,
            kernel_kind,
            eps: eps as f32,
            golovin_b,
            scale: scale as f32,
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        };

        let output_byte_size = (inputs.len() * std::mem::size_of::<f32>()) as u64;

        let pair_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pair_inputs"),
            size: (inputs.len() * std::mem::size_of::<PairInput>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue
            .write_buffer(&pair_buffer, 0, bytemuck::cast_slice(&inputs));

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("expectations"),
            size: output_byte_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging"),
            size: output_byte_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("params"),
            size: std::mem::size_of::<ShaderParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue
            .write_buffer(&params_buffer, 0, bytemuck::bytes_of(&params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pair_rates_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.table_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: pair_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pair_rates_encoder"),
            });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("pair_rates_pass"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(&self.pipeline);
            cpass.set_bind_group(0, &bind_group, &[]);

            // One thread per pair, workgroup size = 256.
            let num_workgroups = (inputs.len() as u32).div_ceil(256);
            cpass.dispatch_workgroups(num_workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_byte_size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let staging_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        staging_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);

        receiver
            .recv()
            .map_err(|e| EnsembleError::Device(format!("map recv failed: {e}")))?
            .map_err(|e| EnsembleError::Device(format!("buffer map failed: {e}")))?;

        let data = staging_slice.get_mapped_range();
        let rates_f32: &[f32] = bytemuck::cast_slice(&data);
        let rates = rates_f32.iter().map(|&x| f64::from(x)).collect();
        drop(data);
        staging_buffer.unmap();

        Ok(rates)
    }
}

impl<R: Real> ParticleEnsemble<R> for GpuEnsemble<R> {
    fn backend(&self) -> BackendTag {
        BackendTag::Gpu
    }

    fn step_coalescence(&mut self, dt: R, eps: R) -> Result<(), EnsembleError> {
        let dt = dt.as_f64();
        let eps = eps.as_f64();
        let Some((pairs, upscale)) = self.state.begin_substep(dt, eps) else {
            return Ok(());
        };

        let scale = upscale * dt / self.state.config.volume.value();
        let expectations = self.evaluate_rates(&pairs, eps, scale)?;
        self.state.finish_substep(&pairs, &expectations);
        Ok(())
    }

    fn superdroplet_count(&self) -> usize {
        self.state.droplets.len()
    }

    fn total_multiplicity(&self) -> u64 {
        self.state.total_multiplicity()
    }

    fn radius_moment(&self, k: u32) -> f64 {
        self.state.radius_moment(k)
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    /// Try to create a GPU ensemble. Skip the test if no adapter exists.
    fn try_gpu(config: ZeroDimConfig) -> Option<GpuEnsemble<f64>> {
        GpuEnsemble::new_blocking(config).ok()
    }

    #[test]
    fn test_gpu_ensemble_creation() {
        match try_gpu(ZeroDimConfig::with_sd_conc_mean(64.0)) {
            Some(ensemble) => {
                assert_eq!(ensemble.backend(), BackendTag::Gpu);
                println!("GPU ensemble created on {}", ensemble.device_name());
            }
            None => println!("GPU not available (expected in CI)"),
        }
    }

    #[test]
    fn test_gpu_step_conserves_water_volume() {
        let mut config = ZeroDimConfig::with_sd_conc_mean(256.0);
        config.kernel = CollisionKernel::Golovin { b: 1500.0 };
        let Some(mut ensemble) = try_gpu(config) else {
            println!("Skipping: no GPU available");
            return;
        };

        let before = ensemble.radius_moment(3);
        for _ in 0..50 {
            ensemble.step_coalescence(1.0, 0.0).unwrap();
        }
        assert_relative_eq!(ensemble.radius_moment(3), before, max_relative = 1e-9);
    }

    #[test]
    fn test_gpu_rates_match_host_within_f32() {
        let Some(ensemble) = try_gpu(ZeroDimConfig::with_sd_conc_mean(128.0)) else {
            println!("Skipping: no GPU available");
            return;
        };

        // Fixed pairing; compare device rates against the host evaluation.
        let pairs: Vec<(usize, usize)> = (0..64).map(|i| (2 * i, 2 * i + 1)).collect();
        let eps = 0.04;
        let scale = 1.0;
        let device = ensemble.evaluate_rates(&pairs, eps, scale).unwrap();

        let host: Vec<f64> = pairs
            .iter()
            .map(|&(i, j)| {
                nimbus_core::coalescence::pair_probability(
                    &ensemble.state.droplets[i],
                    &ensemble.state.droplets[j],
                    &ensemble.state.config.kernel,
                    eps,
                    1.0,
                    1.0,
                    1.0,
                )
            })
            .collect();

        // Absolute floor keeps near-cancelling velocity differences (which
        // the f32 path resolves differently) from dominating the check.
        let rate_scale = host.iter().cloned().fold(0.0_f64, f64::max);
        for (k, (&gpu_rate, &host_rate)) in device.iter().zip(&host).enumerate() {
            let tolerance = host_rate.abs() * 1e-3 + rate_scale * 1e-4;
            assert!(
                (gpu_rate - host_rate).abs() <= tolerance,
                "pair {k}: GPU rate {gpu_rate:e} vs host {host_rate:e}"
            );
        }
    }
}
