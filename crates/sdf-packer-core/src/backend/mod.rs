use crate::config::BackendKind;
use crate::error::{Result, SdfPackerError};
use crate::model::Rect;
use crate::region::{self, WorkingRegion};
use crate::sdf::DistanceField;
use image::{DynamicImage, RgbaImage};
use tracing::{info, warn};

pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;

pub use cpu::CpuBackend;
#[cfg(feature = "gpu")]
pub use gpu::GpuBackend;

/// Outcome of a generation request.
///
/// `Deferred` means a prerequisite of the backend is not in place yet (for example its kernels
/// have not been built); the same request can be issued again once it is.
#[derive(Debug)]
pub enum Generation<T> {
    Ready(T),
    Deferred(String),
    Failed(SdfPackerError),
}

impl<T> Generation<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Generation<U> {
        match self {
            Self::Ready(v) => Generation::Ready(f(v)),
            Self::Deferred(reason) => Generation::Deferred(reason),
            Self::Failed(e) => Generation::Failed(e),
        }
    }

    /// Collapses into a `Result`; a deferred generation becomes `SdfPackerError::NotReady`.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Ready(v) => Ok(v),
            Self::Deferred(reason) => Err(SdfPackerError::NotReady(reason)),
            Self::Failed(e) => Err(e),
        }
    }
}

impl<T> From<Result<T>> for Generation<T> {
    fn from(r: Result<T>) -> Self {
        match r {
            Ok(v) => Self::Ready(v),
            Err(e) => Self::Failed(e),
        }
    }
}

/// A distance field generator.
///
/// Implementations must run edge detection, jump flood propagation and finalization exactly as
/// the functions in [`crate::sdf`] define them; only the execution substrate differs. The image
/// helpers have shared default implementations.
pub trait SdfBackend {
    fn kind(&self) -> BackendKind;

    /// Builds whatever the backend needs before `generate` can succeed.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Releases what `initialize` built. `generate` defers again afterwards.
    fn teardown(&mut self) {}

    /// Produces the distance field of `region` with a gradient `gradient_px` pixels wide.
    fn generate(&self, region: &WorkingRegion, gradient_px: f32) -> Generation<DistanceField>;

    fn copy_source_image(&self, source: &DynamicImage) -> RgbaImage {
        region::copy_source_image(source)
    }

    fn create_working_region(
        &self,
        source: &RgbaImage,
        rect: Rect,
        border_offset: u32,
    ) -> WorkingRegion {
        region::create_working_region(source, rect, border_offset)
    }

    fn resize_image(&self, image: &RgbaImage, scale: f32) -> RgbaImage {
        region::resize_image(image, scale)
    }

    fn extract_result(&self, region: &WorkingRegion, field: &DistanceField) -> RgbaImage {
        region::extract_result(region, field)
    }
}

/// True when a GPU device can be created in this process.
pub fn gpu_available() -> bool {
    #[cfg(feature = "gpu")]
    {
        gpu::GpuBackend::probe()
    }
    #[cfg(not(feature = "gpu"))]
    {
        false
    }
}

/// Creates the backend for `kind`; `Auto` resolves to GPU when a device exists, CPU otherwise.
pub fn create_backend(kind: BackendKind) -> Result<Box<dyn SdfBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(CpuBackend::new())),
        BackendKind::Gpu => create_gpu_backend().inspect_err(|e| {
            warn!(error = %e, "GPU backend unavailable; the CPU backend is recommended");
        }),
        BackendKind::Auto => match create_gpu_backend() {
            Ok(backend) => {
                info!("auto backend resolved to GPU");
                Ok(backend)
            }
            Err(SdfPackerError::BackendUnavailable { reason, .. }) => {
                info!(%reason, "auto backend resolved to CPU");
                Ok(Box::new(CpuBackend::new()))
            }
            Err(e) => Err(e),
        },
    }
}

#[cfg(feature = "gpu")]
fn create_gpu_backend() -> Result<Box<dyn SdfBackend>> {
    Ok(Box::new(gpu::GpuBackend::new()?))
}

#[cfg(not(feature = "gpu"))]
fn create_gpu_backend() -> Result<Box<dyn SdfBackend>> {
    Err(SdfPackerError::BackendUnavailable {
        backend: BackendKind::Gpu,
        reason: "built without the `gpu` feature".into(),
    })
}
