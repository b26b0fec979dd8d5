//! An in-process engine that draws nothing.
//!
//! Every engine object records what it is asked to do, so the behavior of a
//! [`Viewer`](crate::viewer::Viewer) can be checked without a browser. Loads
//! complete after yielding once to the executor, failures can be scripted per
//! URL, and frames only fire when [`ManualScheduler::fire`] is called.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use glamx::Mat4;

use crate::camera::PerspectiveCamera;
use crate::engine::Engine;
use crate::error::{LoadError, ViewerError};
use crate::loader::{
    DracoLoader, GltfLoader, JsonLoader, LoadFuture, LoaderBackend, MaterialLibrary,
    MaterialLoader, ModelLoader, ObjLoader, Progress, ProgressEvent,
};
use crate::scene::Scene;
use crate::window::{
    CanvasElement, DisplaySurface, Document, FrameCallback, FrameHandle, FrameScheduler, Renderer,
    RendererOptions,
};

/*
 *
 * Canvas and document.
 *
 */
#[derive(Debug)]
struct ElementState {
    tag: String,
    id: String,
    client_size: (f64, f64),
    pixel_ratio: f64,
    buffer_size: (u32, u32),
}

/// An element handle. Clones refer to the same element.
///
/// New canvases are 300x150 CSS pixels with a pixel ratio of 1, like an
/// unstyled `<canvas>`.
#[derive(Clone, Debug)]
pub struct HeadlessCanvas(Rc<RefCell<ElementState>>);

impl Default for HeadlessCanvas {
    fn default() -> Self {
        Self::element("CANVAS")
    }
}

impl HeadlessCanvas {
    /// A canvas without id.
    pub fn new() -> Self {
        Self::default()
    }

    /// An element with the given tag name, without id.
    pub fn element(tag: &str) -> Self {
        HeadlessCanvas(Rc::new(RefCell::new(ElementState {
            tag: tag.to_ascii_uppercase(),
            id: String::new(),
            client_size: (300.0, 150.0),
            pixel_ratio: 1.0,
            buffer_size: (300, 150),
        })))
    }

    /// Sets the id, builder style.
    pub fn with_id(self, id: &str) -> Self {
        self.set_id(id);
        self
    }

    /// Sets the displayed size, as a stylesheet or a window resize would.
    pub fn set_client_size(&self, width: f64, height: f64) {
        self.0.borrow_mut().client_size = (width, height);
    }

    /// Sets the device pixel ratio.
    pub fn set_pixel_ratio(&self, ratio: f64) {
        self.0.borrow_mut().pixel_ratio = ratio;
    }

    /// Whether both handles refer to the same element.
    pub fn same_element(&self, other: &HeadlessCanvas) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl CanvasElement for HeadlessCanvas {
    fn tag_name(&self) -> String {
        self.0.borrow().tag.clone()
    }

    fn id(&self) -> String {
        self.0.borrow().id.clone()
    }

    fn set_id(&self, id: &str) {
        self.0.borrow_mut().id = id.to_string();
    }
}

impl DisplaySurface for HeadlessCanvas {
    fn client_size(&self) -> (f64, f64) {
        self.0.borrow().client_size
    }

    fn pixel_ratio(&self) -> f64 {
        self.0.borrow().pixel_ratio
    }

    fn buffer_size(&self) -> (u32, u32) {
        self.0.borrow().buffer_size
    }
}

/// A flat list of elements, looked up by id.
#[derive(Clone, Debug, Default)]
pub struct HeadlessDocument {
    elements: Vec<HeadlessCanvas>,
}

impl HeadlessDocument {
    /// An empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element and returns a handle to it.
    pub fn append(&mut self, element: HeadlessCanvas) -> HeadlessCanvas {
        self.elements.push(element.clone());
        element
    }
}

impl Document for HeadlessDocument {
    type Element = HeadlessCanvas;

    fn element_by_id(&self, id: &str) -> Option<HeadlessCanvas> {
        self.elements.iter().find(|e| e.id() == id).cloned()
    }
}

/*
 *
 * Renderer.
 *
 */
/// What a [`HeadlessRenderer`] was asked to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderStats {
    /// Number of rendered frames.
    pub frames: usize,
    /// Every drawing buffer size set, in order.
    pub resizes: Vec<(u32, u32)>,
    /// Scene size at the last rendered frame.
    pub last_node_count: usize,
    /// Aspect of the camera at the last rendered frame.
    pub last_aspect: f32,
    /// Projection times view of the camera at the last rendered frame.
    pub last_transformation: Mat4,
    /// Every released model, in order.
    pub released: Vec<HeadlessModel>,
    /// Whether the renderer was disposed.
    pub disposed: bool,
}

/// A renderer counting frames instead of drawing them.
#[derive(Debug)]
pub struct HeadlessRenderer {
    canvas: HeadlessCanvas,
    options: RendererOptions,
    stats: Rc<RefCell<RenderStats>>,
}

impl HeadlessRenderer {
    /// The options this renderer was created with.
    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// A snapshot of the render statistics.
    pub fn stats(&self) -> RenderStats {
        self.stats.borrow().clone()
    }
}

impl Renderer for HeadlessRenderer {
    type Model = HeadlessModel;

    fn surface(&self) -> &dyn DisplaySurface {
        &self.canvas
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas.0.borrow_mut().buffer_size = (width, height);
        self.stats.borrow_mut().resizes.push((width, height));
    }

    fn render(&mut self, scene: &Scene<HeadlessModel>, camera: &PerspectiveCamera) {
        let mut stats = self.stats.borrow_mut();
        stats.frames += 1;
        stats.last_node_count = scene.len();
        stats.last_aspect = camera.aspect();
        stats.last_transformation = camera.transformation();
    }

    fn release(&mut self, model: &HeadlessModel) {
        self.stats.borrow_mut().released.push(model.clone());
    }

    fn dispose(&mut self) {
        self.stats.borrow_mut().disposed = true;
    }
}

/*
 *
 * Frame scheduling.
 *
 */
#[derive(Default)]
struct SchedulerState {
    next_handle: u64,
    queue: VecDeque<(FrameHandle, FrameCallback)>,
    cancelled: usize,
}

/// A frame scheduler driven by hand. Clones share the same queue.
#[derive(Clone, Default)]
pub struct ManualScheduler(Rc<RefCell<SchedulerState>>);

impl ManualScheduler {
    /// A scheduler with no pending frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the oldest pending frame with `timestamp`. Returns `false` if none was pending.
    pub fn fire(&self, timestamp: f64) -> bool {
        let next = self.0.borrow_mut().queue.pop_front();
        match next {
            Some((_, callback)) => {
                callback(timestamp);
                true
            }
            None => false,
        }
    }

    /// Number of pending frames.
    pub fn pending(&self) -> usize {
        self.0.borrow().queue.len()
    }

    /// Number of frames cancelled while pending.
    pub fn cancelled(&self) -> usize {
        self.0.borrow().cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self, callback: FrameCallback) -> FrameHandle {
        let mut state = self.0.borrow_mut();
        state.next_handle += 1;
        let handle = FrameHandle(state.next_handle);
        state.queue.push_back((handle, callback));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut state = self.0.borrow_mut();
        let before = state.queue.len();
        state.queue.retain(|(h, _)| *h != handle);
        if state.queue.len() != before {
            state.cancelled += 1;
        }
    }
}

/*
 *
 * Loaders.
 *
 */
/// A model "loaded" by one of the headless loaders.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessModel {
    /// Unique, increasing id.
    pub id: u64,
    /// The loader that produced it: `obj`, `gltf` or `fbx`.
    pub loader: &'static str,
    /// The URL it was loaded from.
    pub url: String,
    /// The material library attached to the OBJ loader at load time.
    pub materials: Option<HeadlessMaterials>,
    /// The DRACO decoder path of the GLTF loader at load time.
    pub decoder_path: Option<String>,
}

/// A material library loaded by [`HeadlessMtlLoader`].
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessMaterials {
    /// The URL it was loaded from.
    pub url: String,
    /// Whether [`MaterialLibrary::preload`] was called.
    pub preloaded: bool,
}

impl MaterialLibrary for HeadlessMaterials {
    fn preload(&mut self) {
        self.preloaded = true;
    }
}

#[derive(Default)]
struct LoaderState {
    dispatched: Vec<(&'static str, String)>,
    in_flight: usize,
    max_in_flight: usize,
    constructed: HashMap<&'static str, usize>,
    // url -> (message, remaining failures; None fails forever)
    failures: HashMap<String, (String, Option<u32>)>,
    documents: HashMap<String, serde_json::Value>,
    decoder_paths: Vec<String>,
    next_id: u64,
}

type SharedState = Rc<RefCell<LoaderState>>;

/// Resolves after returning `Pending` once.
struct YieldNow(bool);

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

async fn fetch(
    state: &SharedState,
    kind: &'static str,
    url: &str,
    progress: Progress<'_>,
) -> Result<u64, LoadError> {
    {
        let mut state = state.borrow_mut();
        let state = &mut *state;
        state.dispatched.push((kind, url.to_string()));
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
    }

    progress(ProgressEvent::new(0, Some(100)));
    YieldNow(false).await;
    progress(ProgressEvent::new(100, Some(100)));

    let mut state = state.borrow_mut();
    state.in_flight -= 1;

    if let Some((message, remaining)) = state.failures.get_mut(url) {
        match remaining {
            None => return Err(LoadError::failure(url, message.clone())),
            Some(n) if *n > 0 => {
                *n -= 1;
                return Err(LoadError::failure(url, message.clone()));
            }
            Some(_) => {}
        }
    }

    state.next_id += 1;
    Ok(state.next_id)
}

/// Headless `.mtl` loader.
pub struct HeadlessMtlLoader(SharedState);

impl MaterialLoader for HeadlessMtlLoader {
    type Materials = HeadlessMaterials;

    fn load<'a>(
        &'a mut self,
        url: &'a str,
        progress: Progress<'a>,
    ) -> LoadFuture<'a, HeadlessMaterials> {
        Box::pin(async move {
            let _ = fetch(&self.0, "mtl", url, progress).await?;
            Ok(HeadlessMaterials {
                url: url.to_string(),
                preloaded: false,
            })
        })
    }
}

/// Headless `.obj` loader.
pub struct HeadlessObjLoader {
    state: SharedState,
    materials: Option<HeadlessMaterials>,
}

impl ModelLoader for HeadlessObjLoader {
    type Model = HeadlessModel;

    fn load<'a>(&'a mut self, url: &'a str, progress: Progress<'a>) -> LoadFuture<'a, HeadlessModel> {
        Box::pin(async move {
            let id = fetch(&self.state, "obj", url, progress).await?;
            Ok(HeadlessModel {
                id,
                loader: "obj",
                url: url.to_string(),
                materials: self.materials.clone(),
                decoder_path: None,
            })
        })
    }
}

impl ObjLoader for HeadlessObjLoader {
    type Materials = HeadlessMaterials;

    fn set_materials(&mut self, materials: Option<HeadlessMaterials>) {
        self.materials = materials;
    }
}

/// Headless DRACO decoder.
pub struct HeadlessDraco {
    state: SharedState,
    decoder_path: String,
}

impl DracoLoader for HeadlessDraco {
    fn set_decoder_path(&mut self, path: &str) {
        self.state.borrow_mut().decoder_paths.push(path.to_string());
        self.decoder_path = path.to_string();
    }

    fn decoder_path(&self) -> &str {
        &self.decoder_path
    }
}

/// Headless `.gltf`/`.glb` loader.
pub struct HeadlessGltfLoader {
    state: SharedState,
    draco: Option<HeadlessDraco>,
}

impl ModelLoader for HeadlessGltfLoader {
    type Model = HeadlessModel;

    fn load<'a>(&'a mut self, url: &'a str, progress: Progress<'a>) -> LoadFuture<'a, HeadlessModel> {
        Box::pin(async move {
            let id = fetch(&self.state, "gltf", url, progress).await?;
            Ok(HeadlessModel {
                id,
                loader: "gltf",
                url: url.to_string(),
                materials: None,
                decoder_path: self.draco.as_ref().map(|d| d.decoder_path.clone()),
            })
        })
    }
}

impl GltfLoader for HeadlessGltfLoader {
    type Draco = HeadlessDraco;

    fn set_draco_loader(&mut self, draco: HeadlessDraco) {
        self.draco = Some(draco);
    }

    fn draco_loader_mut(&mut self) -> Option<&mut HeadlessDraco> {
        self.draco.as_mut()
    }
}

/// Headless `.fbx` loader.
pub struct HeadlessFbxLoader(SharedState);

impl ModelLoader for HeadlessFbxLoader {
    type Model = HeadlessModel;

    fn load<'a>(&'a mut self, url: &'a str, progress: Progress<'a>) -> LoadFuture<'a, HeadlessModel> {
        Box::pin(async move {
            let id = fetch(&self.0, "fbx", url, progress).await?;
            Ok(HeadlessModel {
                id,
                loader: "fbx",
                url: url.to_string(),
                materials: None,
                decoder_path: None,
            })
        })
    }
}

/// Headless JSON loader.
///
/// Answers with the document registered through
/// [`HeadlessLoaders::respond_json`], or `{"url": <url>}`.
pub struct HeadlessJsonLoader(SharedState);

impl JsonLoader for HeadlessJsonLoader {
    fn load<'a>(
        &'a mut self,
        url: &'a str,
        progress: Progress<'a>,
    ) -> LoadFuture<'a, serde_json::Value> {
        Box::pin(async move {
            let _ = fetch(&self.0, "json", url, progress).await?;
            let document = self.0.borrow().documents.get(url).cloned();
            Ok(document.unwrap_or_else(|| serde_json::json!({ "url": url })))
        })
    }
}

/// Factory of the headless sub-loaders. Clones share the same script and records.
#[derive(Clone, Default)]
pub struct HeadlessLoaders(SharedState);

impl HeadlessLoaders {
    /// Loaders succeeding on every URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every load of `url` fail with `message`.
    pub fn fail(&self, url: &str, message: &str) {
        let _ = self
            .0
            .borrow_mut()
            .failures
            .insert(url.to_string(), (message.to_string(), None));
    }

    /// Makes the next `times` loads of `url` fail with `message`.
    pub fn fail_times(&self, url: &str, message: &str, times: u32) {
        let _ = self
            .0
            .borrow_mut()
            .failures
            .insert(url.to_string(), (message.to_string(), Some(times)));
    }

    /// Sets the document returned for `url` by the JSON loader.
    pub fn respond_json(&self, url: &str, document: serde_json::Value) {
        let _ = self
            .0
            .borrow_mut()
            .documents
            .insert(url.to_string(), document);
    }

    /// Every `(loader, url)` load call, in dispatch order.
    pub fn dispatched(&self) -> Vec<(&'static str, String)> {
        self.0.borrow().dispatched.clone()
    }

    /// The largest number of loads ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.0.borrow().max_in_flight
    }

    /// How many loaders of the given kind (`mtl`, `obj`, `draco`, `gltf`, `fbx`, `json`) were created.
    pub fn constructed(&self, kind: &str) -> usize {
        self.0.borrow().constructed.get(kind).copied().unwrap_or(0)
    }

    /// Every DRACO decoder path set, in order.
    pub fn decoder_paths(&self) -> Vec<String> {
        self.0.borrow().decoder_paths.clone()
    }

    fn count(&self, kind: &'static str) {
        *self.0.borrow_mut().constructed.entry(kind).or_insert(0) += 1;
    }
}

impl LoaderBackend for HeadlessLoaders {
    type Model = HeadlessModel;
    type Materials = HeadlessMaterials;
    type MtlLoader = HeadlessMtlLoader;
    type ObjLoader = HeadlessObjLoader;
    type Draco = HeadlessDraco;
    type GltfLoader = HeadlessGltfLoader;
    type FbxLoader = HeadlessFbxLoader;
    type JsonLoader = HeadlessJsonLoader;

    fn mtl_loader(&mut self) -> HeadlessMtlLoader {
        self.count("mtl");
        HeadlessMtlLoader(self.0.clone())
    }

    fn obj_loader(&mut self) -> HeadlessObjLoader {
        self.count("obj");
        HeadlessObjLoader {
            state: self.0.clone(),
            materials: None,
        }
    }

    fn draco_loader(&mut self) -> HeadlessDraco {
        self.count("draco");
        HeadlessDraco {
            state: self.0.clone(),
            decoder_path: String::new(),
        }
    }

    fn gltf_loader(&mut self) -> HeadlessGltfLoader {
        self.count("gltf");
        HeadlessGltfLoader {
            state: self.0.clone(),
            draco: None,
        }
    }

    fn fbx_loader(&mut self) -> HeadlessFbxLoader {
        self.count("fbx");
        HeadlessFbxLoader(self.0.clone())
    }

    fn json_loader(&mut self) -> HeadlessJsonLoader {
        self.count("json");
        HeadlessJsonLoader(self.0.clone())
    }
}

/*
 *
 * Engine.
 *
 */
/// The headless engine.
///
/// The loaders and scheduler it hands out are clones of the ones it keeps, so
/// tests can script loads and fire frames after building a viewer.
#[derive(Clone, Default)]
pub struct HeadlessEngine {
    loaders: HeadlessLoaders,
    scheduler: ManualScheduler,
    stats: Rc<RefCell<RenderStats>>,
    objects_created: usize,
}

impl HeadlessEngine {
    /// An engine with fresh loaders and scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// The loaders handed to viewers.
    pub fn loaders(&self) -> &HeadlessLoaders {
        &self.loaders
    }

    /// The scheduler handed to viewers.
    pub fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }

    /// Statistics of the last renderer created.
    pub fn render_stats(&self) -> RenderStats {
        self.stats.borrow().clone()
    }

    /// Number of renderers, loader backends and schedulers created.
    pub fn objects_created(&self) -> usize {
        self.objects_created
    }
}

impl Engine for HeadlessEngine {
    type Model = HeadlessModel;
    type Canvas = HeadlessCanvas;
    type Renderer = HeadlessRenderer;
    type Loaders = HeadlessLoaders;
    type Scheduler = ManualScheduler;

    fn create_renderer(
        &mut self,
        canvas: &HeadlessCanvas,
        options: &RendererOptions,
    ) -> Result<HeadlessRenderer, ViewerError> {
        self.objects_created += 1;
        self.stats = Rc::new(RefCell::new(RenderStats::default()));
        Ok(HeadlessRenderer {
            canvas: canvas.clone(),
            options: *options,
            stats: self.stats.clone(),
        })
    }

    fn loader_backend(&mut self) -> HeadlessLoaders {
        self.objects_created += 1;
        self.loaders.clone()
    }

    fn frame_scheduler(&mut self) -> ManualScheduler {
        self.objects_created += 1;
        self.scheduler.clone()
    }
}
