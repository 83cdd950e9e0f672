//! Error types for the depthfx pipeline.
//!
//! Everything fallible in the crate returns [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Degraded configurations (effect stage
//! disabled, empty viewport) are not errors; they are reported through
//! [`FrameStatus`](crate::FrameStatus).

use thiserror::Error;

/// The main error type for depthfx.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // GPU & Windowing
    // ========================================================================
    /// No compatible GPU adapter was found.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(#[from] wgpu::RequestAdapterError),

    /// The logical device could not be created.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// The window surface could not be created.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// The surface reported no supported texture formats.
    #[error("Surface has no supported formats for this adapter")]
    SurfaceUnsupported,

    /// Acquiring the next swapchain texture failed in a way that cannot be
    /// recovered by reconfiguring.
    #[error("Failed to acquire surface texture: {0}")]
    SurfaceAcquireFailed(#[from] wgpu::SurfaceError),

    /// Event loop error (winit).
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// Window creation error (winit).
    #[error("Window creation failed: {0}")]
    WindowCreate(#[from] winit::error::OsError),

    // ========================================================================
    // Shader wiring
    // ========================================================================
    /// A slot declared by a shader program was left without a resource.
    #[error("Shader program '{program}' has no binding for slot '{slot}'")]
    UnboundSlot {
        program: &'static str,
        slot: &'static str,
    },

    /// A resource was bound to a slot name the program does not declare.
    #[error("Shader program '{program}' does not declare slot '{slot}'")]
    UnknownSlot { program: &'static str, slot: String },

    /// A bind group was requested for a group the program does not declare.
    #[error("Shader program '{program}' has no bind group {group}")]
    UnknownGroup { program: &'static str, group: u32 },

    // ========================================================================
    // Configuration
    // ========================================================================
    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file is not valid JSON for the expected schema.
    #[error("Invalid configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A gradient image could not be decoded.
    #[error("Failed to load gradient image: {0}")]
    Image(#[from] image::ImageError),

    /// A gradient definition is unusable.
    #[error("Invalid gradient: {0}")]
    InvalidGradient(String),

    /// A color string is not `#RRGGBB`.
    #[error("Invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),
}

/// Alias for `std::result::Result<T, depthfx::Error>`.
pub type Result<T> = std::result::Result<T, Error>;
