pub mod artifact;
pub mod fingerprint;
pub mod store;

pub use artifact::{AudioArtifact, ScriptArtifact};
pub use fingerprint::{Fingerprint, FingerprintVersions};
pub use store::{ArtifactStore, CacheError, CacheLookup, FlightWaiter, GenerationGuard, LockAcquisition};
