//! Testing utilities and mock implementations.
//!
//! Every external collaborator of the pipeline has a mock here, so a whole
//! run can be driven in-process without network access or ffmpeg.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelsmith_core::testing::{fixtures, MockContentDrafter, MockMediaEngine};
//!
//! let media = MockMediaEngine::new();
//! let drafter = MockContentDrafter::with_draft(fixtures::draft(&[4.0, 4.0]));
//!
//! // Make the drafter fail once, then succeed
//! drafter.set_next_error(ProviderError::failed("mock_drafter", "boom")).await;
//!
//! // Wire both into a ProviderSet / PipelineEngine...
//! ```

mod mock_media;
mod mock_providers;
mod mock_publisher;

pub use mock_media::MockMediaEngine;
pub use mock_providers::{
    fixtures, MockContentDrafter, MockImageSynthesizer, MockMusicSynthesizer,
    MockScriptAnalyzer, MockSpeechSynthesizer, MockTrendSource,
};
pub use mock_publisher::MockPublisher;
