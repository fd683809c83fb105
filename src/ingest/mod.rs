//! Frame sources.
//!
//! Camera acquisition is owned by the host platform; these sources exist so
//! the daemon, the demo and the tests have something to feed the controller:
//! - Synthetic source (`stub://`) with a moving blue target
//! - Still image source (feature: ingest-image), replaying one picture
//!
//! Sources MUST NOT keep a reference to a frame after handing it over: the
//! controller owns it until analysis finishes and then releases it.

#[cfg(feature = "ingest-image")]
pub mod still;
pub mod synthetic;

use anyhow::Result;

use crate::config::SourceSettings;
use crate::frame::RawFrame;

#[cfg(feature = "ingest-image")]
pub use still::StillImageSource;
pub use synthetic::{SyntheticConfig, SyntheticPattern, SyntheticSource};

/// Statistics for a frame source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub source: String,
}

/// Producer of RGBA frames.
pub trait FrameSource: Send {
    /// Prepare the source. Called once before the first frame.
    fn connect(&mut self) -> Result<()>;

    /// Produce the next frame.
    fn next_frame(&mut self) -> Result<RawFrame>;

    fn is_healthy(&self) -> bool;

    fn stats(&self) -> SourceStats;
}

/// Open the source named by `settings.url`.
///
/// `stub://` selects the synthetic source; any other value is treated as a
/// local image path when the `ingest-image` feature is enabled.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    if settings.url.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(SyntheticConfig {
            url: settings.url.clone(),
            width: settings.width,
            height: settings.height,
            ..SyntheticConfig::default()
        })));
    }
    #[cfg(feature = "ingest-image")]
    {
        Ok(Box::new(StillImageSource::new(&settings.url)))
    }
    #[cfg(not(feature = "ingest-image"))]
    {
        Err(anyhow::anyhow!(
            "source '{}' requires the ingest-image feature",
            settings.url
        ))
    }
}
