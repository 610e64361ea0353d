use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use wgpu::{Adapter, Device, DeviceDescriptor, Features, Instance, Limits, Queue, Surface};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Exclusive thread-affinity claim for a render context
///
/// GPU submission for one controller must stay on the thread that last claimed
/// the context. Claiming is exclusive but stealable: a later claim from a
/// different thread takes affinity away, and draws on the losing thread
/// silently no-op until it claims again.
#[derive(Debug, Default)]
pub struct ContextClaim {
    owner: Mutex<Option<ThreadId>>,
}

impl ContextClaim {
    pub fn new() -> Self {
        Self {
            owner: Mutex::new(None),
        }
    }

    /// Bind the context to the calling thread
    pub fn make_current(&self) {
        if let Ok(mut owner) = self.owner.lock() {
            *owner = Some(thread::current().id());
        }
    }

    /// True when the calling thread holds the claim
    pub fn is_current(&self) -> bool {
        match self.owner.lock() {
            Ok(owner) => *owner == Some(thread::current().id()),
            Err(_) => false,
        }
    }

    /// True when any thread holds the claim
    pub fn is_bound(&self) -> bool {
        match self.owner.lock() {
            Ok(owner) => owner.is_some(),
            Err(_) => false,
        }
    }

    /// Drop the binding entirely
    pub fn release(&self) {
        if let Ok(mut owner) = self.owner.lock() {
            *owner = None;
        }
    }
}

/// Shared GPU device and queue, paired with the context claim that gates
/// submission for the owning view
///
/// Cheap to clone (Arc); the surface presenter and the host's delegate share
/// one of these.
#[derive(Clone)]
pub struct GpuContext {
    device: Arc<Device>,
    queue: Arc<Queue>,
    claim: Arc<ContextClaim>,
}

impl GpuContext {
    /// Create a GPU context whose adapter is compatible with the given surface
    pub async fn for_surface(instance: &Instance, surface: &Surface<'_>) -> Result<Self> {
        let adapter = Self::request_adapter(instance, surface).await?;
        let (device, queue) = Self::request_device(&adapter).await?;

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            claim: Arc::new(ContextClaim::new()),
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// The affinity claim shared with the view controller
    pub fn claim(&self) -> Arc<ContextClaim> {
        Arc::clone(&self.claim)
    }

    async fn request_adapter(instance: &Instance, surface: &Surface<'_>) -> Result<Adapter> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| format!("Failed to find appropriate adapter: {:?}", e).into())
    }

    async fn request_device(adapter: &Adapter) -> Result<(Device, Queue)> {
        adapter
            .request_device(&DeviceDescriptor {
                label: Some("View Context Device"),
                required_features: Features::empty(),
                required_limits: Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| format!("Failed to create device: {:?}", e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_starts_unbound() {
        let claim = ContextClaim::new();
        assert!(!claim.is_bound());
        assert!(!claim.is_current());
    }

    #[test]
    fn claim_binds_to_calling_thread() {
        let claim = ContextClaim::new();
        claim.make_current();
        assert!(claim.is_bound());
        assert!(claim.is_current());
    }

    #[test]
    fn claim_release_clears_binding() {
        let claim = ContextClaim::new();
        claim.make_current();
        claim.release();
        assert!(!claim.is_bound());

        // Idempotent
        claim.release();
        assert!(!claim.is_bound());
    }

    #[test]
    fn claim_is_stolen_by_other_thread() {
        let claim = Arc::new(ContextClaim::new());
        claim.make_current();
        assert!(claim.is_current());

        let other = Arc::clone(&claim);
        std::thread::spawn(move || {
            other.make_current();
            assert!(other.is_current());
        })
        .join()
        .unwrap();

        // Affinity moved to the other thread
        assert!(claim.is_bound());
        assert!(!claim.is_current());

        // Reclaim
        claim.make_current();
        assert!(claim.is_current());
    }

    #[test]
    fn gpu_context_clone_semantics() {
        // Compile-time check that Arc cloning works as expected
        fn assert_clone<T: Clone>() {}
        assert_clone::<GpuContext>();
    }
}
