//! View models for rendering errors.
//!
//! These adapters only read what the taxonomy already decided (severity,
//! user message, recoverability). They never log or classify.

pub mod banner;
pub mod fallback;
pub mod retry_panel;

pub use banner::{AlertBanner, BannerIcon, BannerTone};
pub use fallback::{
    BoundaryState, CapturedFault, FallbackAction, FallbackBoundary, FallbackView, TechnicalDetails,
};
pub use retry_panel::{RetryPanel, RetryPanelOutcome, RetryPanelState};
