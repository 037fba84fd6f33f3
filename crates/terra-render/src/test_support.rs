//! Headless GPU for tests. `None` when the machine has no adapter, in
//! which case GPU tests return early.

pub(crate) fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::LowPower,
        force_fallback_adapter: false,
        compatible_surface: None,
    }))
    .ok()?;

    let descriptor = wgpu::DeviceDescriptor {
        label: Some("terra-test"),
        required_features: crate::gpu::required_features(adapter.features()),
        ..Default::default()
    };
    pollster::block_on(adapter.request_device(&descriptor)).ok()
}
