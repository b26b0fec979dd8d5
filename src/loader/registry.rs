use crate::environment::join_path;
use crate::error::LoadError;
use crate::loader::{
    Asset, AssetFormat, AssetSource, DracoLoader, GltfLoader, JsonLoader, LoaderBackend,
    MaterialLibrary, MaterialLoader, ModelLoader, ObjLoader, Progress, ProgressEvent,
    DEFAULT_DRACO_PATH,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether successful loads are memoized by URL.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Repeated identical requests reuse the first result. Requests are
    /// identical when their format, URL and companion file (material library
    /// or DRACO decoder path) all match.
    Enabled,
    /// Every request is dispatched.
    Disabled,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Enabled
    }
}

/// Memo key of a loaded asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    format: AssetFormat,
    url: String,
    companion: Option<String>,
}

/// Format tag to sub-loader mapping.
///
/// Sub-loaders are created lazily through the [`LoaderBackend`], at most once
/// per format, and reused for every later request of that format.
pub struct LoaderRegistry<B: LoaderBackend> {
    backend: B,
    mtl: Option<B::MtlLoader>,
    obj: Option<B::ObjLoader>,
    gltf: Option<B::GltfLoader>,
    fbx: Option<B::FbxLoader>,
    json: Option<B::JsonLoader>,
    cache_policy: CachePolicy,
    cache: HashMap<CacheKey, Asset<B::Model>>,
    base_path: String,
}

fn ignore_progress(_: ProgressEvent) {}

fn is_absolute(url: &str) -> bool {
    url.starts_with('/') || url.contains("://") || url.starts_with("data:")
}

impl<B: LoaderBackend> LoaderRegistry<B> {
    /// An empty registry creating its sub-loaders through `backend`.
    pub fn new(backend: B) -> Self {
        LoaderRegistry {
            backend,
            mtl: None,
            obj: None,
            gltf: None,
            fbx: None,
            json: None,
            cache_policy: CachePolicy::default(),
            cache: HashMap::new(),
            base_path: String::new(),
        }
    }

    /// Sets the cache policy, builder style.
    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.set_cache_policy(policy);
        self
    }

    /// Sets the prefix of relative URLs, builder style.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// The cache policy.
    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    /// Sets the cache policy. Disabling the cache empties it.
    pub fn set_cache_policy(&mut self, policy: CachePolicy) {
        if policy == CachePolicy::Disabled {
            self.cache.clear();
        }
        self.cache_policy = policy;
    }

    /// The prefix of relative URLs.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The backend creating the sub-loaders.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resolves `url` against the base path. Absolute URLs are returned unchanged.
    pub fn resolve(&self, url: &str) -> String {
        if is_absolute(url) {
            url.to_string()
        } else {
            join_path(&self.base_path, url)
        }
    }

    /// Whether a loader for `format` has been created.
    pub fn has_loader(&self, format: AssetFormat) -> bool {
        match format {
            AssetFormat::Obj => self.obj.is_some(),
            AssetFormat::Gltf | AssetFormat::Glb => self.gltf.is_some(),
            AssetFormat::Fbx => self.fbx.is_some(),
            AssetFormat::Json => self.json.is_some(),
        }
    }

    /// Whether an asset of `format` at `url` is cached, whatever its companion file.
    pub fn is_cached(&self, format: AssetFormat, url: &str) -> bool {
        let url = self.resolve(url);
        self.cache
            .keys()
            .any(|key| key.format == format && key.url == url)
    }

    /// Whether `source` itself is cached.
    pub fn is_source_cached(&self, source: &AssetSource) -> bool {
        self.cache.contains_key(&self.cache_key(source))
    }

    /// Number of cached assets.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn cache_key(&self, source: &AssetSource) -> CacheKey {
        let companion = match source {
            AssetSource::Obj { mtl_url, .. } => mtl_url.as_deref().map(|url| self.resolve(url)),
            AssetSource::Gltf { draco_path, .. } | AssetSource::Glb { draco_path, .. } => Some(
                draco_path
                    .as_deref()
                    .unwrap_or(DEFAULT_DRACO_PATH)
                    .to_string(),
            ),
            AssetSource::Fbx { .. } | AssetSource::Json { .. } => None,
        };

        CacheKey {
            format: source.format(),
            url: self.resolve(source.url()),
            companion,
        }
    }

    /// Drops every sub-loader and cached asset.
    pub fn clear(&mut self) {
        self.mtl = None;
        self.obj = None;
        self.gltf = None;
        self.fbx = None;
        self.json = None;
        self.cache.clear();
    }

    /// Loads `source` with the matching sub-loader.
    pub async fn load(
        &mut self,
        source: &AssetSource,
        progress: Progress<'_>,
    ) -> Result<Asset<B::Model>, LoadError> {
        let key = self.cache_key(source);

        if self.cache_policy == CachePolicy::Enabled {
            if let Some(asset) = self.cache.get(&key) {
                log::debug!("[loader] cache hit for {}", key.url);
                return Ok(asset.clone());
            }
        }

        let asset = self
            .dispatch(source, &key.url, key.companion.as_deref(), progress)
            .await?;

        if self.cache_policy == CachePolicy::Enabled {
            let _ = self.cache.insert(key, asset.clone());
        }

        Ok(asset)
    }

    async fn dispatch(
        &mut self,
        source: &AssetSource,
        url: &str,
        companion: Option<&str>,
        progress: Progress<'_>,
    ) -> Result<Asset<B::Model>, LoadError> {
        let backend = &mut self.backend;

        match source {
            AssetSource::Obj { .. } => {
                let materials = match companion {
                    Some(mtl_url) => {
                        let mtl = self.mtl.get_or_insert_with(|| {
                            log::debug!("[loader] creating mtl loader");
                            backend.mtl_loader()
                        });
                        let mut materials = mtl.load(mtl_url, &ignore_progress).await?;
                        materials.preload();
                        Some(materials)
                    }
                    None => None,
                };

                let obj = self.obj.get_or_insert_with(|| {
                    log::debug!("[loader] creating obj loader");
                    backend.obj_loader()
                });
                obj.set_materials(materials);
                Ok(Asset::Model(obj.load(url, progress).await?))
            }
            AssetSource::Gltf { .. } | AssetSource::Glb { .. } => {
                let decoder_path = companion.unwrap_or(DEFAULT_DRACO_PATH);
                let gltf = self.gltf.get_or_insert_with(|| {
                    log::debug!("[loader] creating gltf loader, decoders at {}", decoder_path);
                    let mut gltf = backend.gltf_loader();
                    let mut draco = backend.draco_loader();
                    draco.set_decoder_path(decoder_path);
                    gltf.set_draco_loader(draco);
                    gltf
                });

                if let Some(draco) = gltf.draco_loader_mut() {
                    if draco.decoder_path() != decoder_path {
                        log::debug!("[loader] moving draco decoders to {}", decoder_path);
                        draco.set_decoder_path(decoder_path);
                    }
                }

                Ok(Asset::Model(gltf.load(url, progress).await?))
            }
            AssetSource::Fbx { .. } => {
                let fbx = self.fbx.get_or_insert_with(|| {
                    log::debug!("[loader] creating fbx loader");
                    backend.fbx_loader()
                });
                Ok(Asset::Model(fbx.load(url, progress).await?))
            }
            AssetSource::Json { .. } => {
                let json = self.json.get_or_insert_with(|| {
                    log::debug!("[loader] creating json loader");
                    backend.json_loader()
                });
                Ok(Asset::Json(json.load(url, progress).await?))
            }
        }
    }
}
