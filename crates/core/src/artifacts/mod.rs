//! Deterministically named run artifacts and the lookup index used for resumption.
//!
//! Every generated file is addressed by `(run id, ArtifactKind)`. The file name is a pure
//! function of that key, so a later attempt on the same run can find what an earlier
//! attempt already produced.

mod index;
mod store;

pub use index::ArtifactIndex;
pub use store::{ArtifactError, ArtifactHandle, ArtifactKey, ArtifactKind, ArtifactStore};
