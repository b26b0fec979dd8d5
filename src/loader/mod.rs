//! Sequential loading of heterogeneous 3D assets.
//!
//! A [`LoadQueue`] is drained by a [`SequentialLoader`] one request at a time.
//! Each request is routed to a format-specific sub-loader obtained from the
//! [`LoaderRegistry`], which creates sub-loaders lazily through the engine's
//! [`LoaderBackend`].

pub use self::backend::{
    DracoLoader, GltfLoader, JsonLoader, LoadFuture, LoaderBackend, MaterialLibrary,
    MaterialLoader, ModelLoader, ObjLoader, Progress, ProgressEvent,
};
pub use self::registry::{CachePolicy, LoaderRegistry};
pub use self::request::{
    Asset, AssetFormat, AssetSource, LoadQueue, LoadRequest, LoadSpec, DEFAULT_DRACO_PATH,
};
pub use self::sequential::{
    CancelHandle, DrainOutcome, DrainReport, DrainState, ErrorPolicy, QueueCallbacks,
    SequentialLoader,
};

mod backend;
mod registry;
mod request;
mod sequential;
