//! Traits implemented by the engine's format-specific sub-loaders.

use crate::error::LoadError;
use std::future::Future;
use std::pin::Pin;

/// The future returned by every sub-loader.
///
/// Loads run on a single thread, so the future does not need to be `Send`.
pub type LoadFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LoadError>> + 'a>>;

/// Sink for the progress events of a single load.
pub type Progress<'a> = &'a dyn Fn(ProgressEvent);

/// A sub-loader progress notification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes received so far.
    pub loaded: u64,
    /// Total bytes expected, if the server announced it.
    pub total: Option<u64>,
}

impl ProgressEvent {
    /// Creates a progress event.
    pub fn new(loaded: u64, total: Option<u64>) -> Self {
        ProgressEvent { loaded, total }
    }

    /// Completion percentage, if the total is known and non-zero.
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.loaded as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

/// A loader producing engine models (OBJ geometry, GLTF/GLB scenes, FBX).
pub trait ModelLoader {
    /// The engine's handle to a loaded model.
    type Model;

    /// Fetches and decodes the asset at `url`, reporting progress to `progress`.
    fn load<'a>(&'a mut self, url: &'a str, progress: Progress<'a>) -> LoadFuture<'a, Self::Model>;
}

/// A material library that must be prepared before geometry referencing it is loaded.
pub trait MaterialLibrary {
    /// Creates the materials (and starts loading their textures).
    fn preload(&mut self);
}

/// A loader for `.mtl` material libraries.
pub trait MaterialLoader {
    /// The material library produced.
    type Materials: MaterialLibrary;

    /// Fetches and parses the material library at `url`.
    fn load<'a>(
        &'a mut self,
        url: &'a str,
        progress: Progress<'a>,
    ) -> LoadFuture<'a, Self::Materials>;
}

/// An OBJ geometry loader, which can use a material library.
pub trait ObjLoader: ModelLoader {
    /// The material library type consumed.
    type Materials: MaterialLibrary;

    /// Sets the materials used by the next loads. `None` loads geometry with default materials.
    fn set_materials(&mut self, materials: Option<Self::Materials>);
}

/// A DRACO geometry decoder.
pub trait DracoLoader {
    /// Sets the location of the decoder assets.
    fn set_decoder_path(&mut self, path: &str);

    /// The location of the decoder assets.
    fn decoder_path(&self) -> &str;
}

/// A GLTF/GLB loader, which decodes compressed geometry with a [`DracoLoader`].
pub trait GltfLoader: ModelLoader {
    /// The decoder type used.
    type Draco: DracoLoader;

    /// Attaches a decoder.
    fn set_draco_loader(&mut self, draco: Self::Draco);

    /// The attached decoder, if any.
    fn draco_loader_mut(&mut self) -> Option<&mut Self::Draco>;
}

/// A loader for generic JSON documents.
pub trait JsonLoader {
    /// Fetches and parses the JSON document at `url`.
    fn load<'a>(
        &'a mut self,
        url: &'a str,
        progress: Progress<'a>,
    ) -> LoadFuture<'a, serde_json::Value>;
}

/// Factory for the engine's sub-loaders.
///
/// The [`LoaderRegistry`](crate::loader::LoaderRegistry) calls each constructor
/// at most once and reuses the instance for every request of the same format.
pub trait LoaderBackend {
    /// The engine's handle to a loaded model.
    type Model: Clone + 'static;
    /// The material library type.
    type Materials: MaterialLibrary;
    /// `.mtl` loader.
    type MtlLoader: MaterialLoader<Materials = Self::Materials>;
    /// `.obj` loader.
    type ObjLoader: ObjLoader<Model = Self::Model, Materials = Self::Materials>;
    /// DRACO decoder.
    type Draco: DracoLoader;
    /// `.gltf`/`.glb` loader.
    type GltfLoader: GltfLoader<Model = Self::Model, Draco = Self::Draco>;
    /// `.fbx` loader.
    type FbxLoader: ModelLoader<Model = Self::Model>;
    /// `.json` loader.
    type JsonLoader: JsonLoader;

    /// Creates a material library loader.
    fn mtl_loader(&mut self) -> Self::MtlLoader;
    /// Creates an OBJ loader.
    fn obj_loader(&mut self) -> Self::ObjLoader;
    /// Creates a DRACO decoder.
    fn draco_loader(&mut self) -> Self::Draco;
    /// Creates a GLTF/GLB loader.
    fn gltf_loader(&mut self) -> Self::GltfLoader;
    /// Creates an FBX loader.
    fn fbx_loader(&mut self) -> Self::FbxLoader;
    /// Creates a JSON loader.
    fn json_loader(&mut self) -> Self::JsonLoader;
}
