//! Reconciliation core: the wire codec, prefix registry, IBLT-backed digest
//! tracker and the `SyncEngine` actor that ties them together behind a
//! `Face`/`SegmentPublisher` transport boundary.

pub mod codec;
pub mod digest;
pub mod engine;
pub mod error;
pub mod face;
pub mod registry;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use codec::State;
pub use digest::DigestEngine;
pub use engine::{EngineCommand, MissingDataInfo, SyncEngine, SyncEngineHandle, N_HASHCHECK};
pub use error::{CodecError, EngineError, FaceError, RegistryError};
pub use face::{Face, IncomingRequest, ReplyResponder, SegmentPublisher};
pub use registry::{PrefixEntry, PrefixRegistry};
