#![allow(clippy::await_holding_refcell_ref)]

//! The viewer: a canvas-bound scene, camera and renderer with a render loop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glamx::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::{Frustum, OrbitControls, OrbitSettings, PerspectiveCamera, DEFAULT_POSITION};
use crate::color::{self, Color};
use crate::engine::Engine;
use crate::environment::BuildEnv;
use crate::error::{Result, ViewerError};
use crate::light::Light;
use crate::loader::{
    Asset, CachePolicy, CancelHandle, DrainReport, ErrorPolicy, LoadQueue, LoaderRegistry, QueueCallbacks,
    SequentialLoader,
};
use crate::scene::{AxesHelper, Fog, Scene, SceneNode};
use crate::window::{
    resize_to_display_size, resolve_canvas, Container, Document, FrameHandle, FrameScheduler,
    Renderer, RendererOptions,
};

type FrameFn<E> = Box<dyn FnMut(&mut Viewer<E>, Option<f64>)>;

/// Construction options of a [`Viewer`].
///
/// The default options create the scene, camera, renderer and loader only.
/// [`ViewerOptions::full`] also adds the axes helper, orbit controls and an
/// ambient light.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerOptions {
    /// Renderer creation options.
    pub renderer: RendererOptions,
    /// Camera frustum.
    pub frustum: Frustum,
    /// Initial camera position.
    pub camera_position: Vec3,
    /// Scene background.
    pub background: Color,
    /// Scene fog.
    pub fog: Option<Fog>,
    /// Axes helper added at construction.
    pub axes_helper: Option<AxesHelper>,
    /// Orbit controls installed at construction.
    pub orbit_controls: Option<OrbitSettings>,
    /// Ambient light added at construction.
    pub ambient_light: Option<Light>,
    /// Cache policy of the loader.
    pub cache_policy: CachePolicy,
    /// Error policy of the loader.
    pub error_policy: ErrorPolicy,
    /// Prefix of relative asset URLs. Defaults to the build's public path.
    pub base_path: Option<String>,
    /// Append every model loaded by [`Viewer::load_all`] to the scene.
    pub attach_models: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        ViewerOptions {
            renderer: RendererOptions::default(),
            frustum: Frustum::default(),
            camera_position: DEFAULT_POSITION,
            background: color::CHARCOAL,
            fog: Some(Fog::default()),
            axes_helper: None,
            orbit_controls: None,
            ambient_light: None,
            cache_policy: CachePolicy::default(),
            error_policy: ErrorPolicy::default(),
            base_path: None,
            attach_models: false,
        }
    }
}

impl ViewerOptions {
    /// Default options, plus the axes helper, auto-rotating orbit controls,
    /// a white ambient light and model attachment.
    pub fn full() -> Self {
        ViewerOptions {
            axes_helper: Some(AxesHelper::default()),
            orbit_controls: Some(OrbitSettings::default()),
            ambient_light: Some(Light::ambient()),
            attach_models: true,
            ..Default::default()
        }
    }
}

/// A scene, camera and renderer bound to a canvas.
///
/// The viewer is usually shared as an `Rc<RefCell<Viewer<E>>>`: the render
/// loop keeps a weak reference to it, and [`Viewer::load_all`] attaches
/// models to it as they complete.
pub struct Viewer<E: Engine> {
    id: String,
    canvas: E::Canvas,
    scene: Scene<E::Model>,
    camera: PerspectiveCamera,
    controls: Option<OrbitControls>,
    renderer: E::Renderer,
    loader: Rc<RefCell<SequentialLoader<E::Loaders>>>,
    cancel: CancelHandle,
    scheduler: E::Scheduler,
    frame: Option<FrameHandle>,
    attach_models: bool,
    destroyed: bool,
}

impl<E: Engine> Viewer<E> {
    /// Creates a viewer drawing to the canvas designated by `container`.
    ///
    /// Fails with [`ViewerError::InvalidContainer`] if no element has the given
    /// id or if the element is not a canvas. No engine object is created then.
    pub fn new<D>(
        engine: &mut E,
        document: &D,
        container: impl Into<Container<E::Canvas>>,
        options: ViewerOptions,
    ) -> Result<Self>
    where
        D: Document<Element = E::Canvas>,
    {
        let (id, canvas) = resolve_canvas(document, container.into())?;

        let ViewerOptions {
            renderer: renderer_options,
            frustum,
            camera_position,
            background,
            fog,
            axes_helper,
            orbit_controls,
            ambient_light,
            cache_policy,
            error_policy,
            base_path,
            attach_models,
        } = options;

        let mut scene = Scene::new();
        scene.background = background;
        scene.fog = fog;

        let camera = PerspectiveCamera::new(frustum, camera_position);
        let renderer = engine.create_renderer(&canvas, &renderer_options)?;

        let base_path = base_path.unwrap_or_else(|| BuildEnv::from_build().public_path);
        let registry = LoaderRegistry::new(engine.loader_backend())
            .with_cache_policy(cache_policy)
            .with_base_path(base_path);
        let loader = SequentialLoader::new(registry).with_policy(error_policy);
        let cancel = loader.cancel_handle();

        let mut viewer = Viewer {
            id,
            canvas,
            scene,
            camera,
            controls: None,
            renderer,
            loader: Rc::new(RefCell::new(loader)),
            cancel,
            scheduler: engine.frame_scheduler(),
            frame: None,
            attach_models,
            destroyed: false,
        };

        if let Some(helper) = axes_helper {
            viewer.scene.add(SceneNode::Axes(helper));
        }
        if let Some(settings) = orbit_controls {
            viewer.controls = Some(OrbitControls::new(settings));
        }
        if let Some(light) = ambient_light {
            viewer.scene.add_light(light);
        }

        log::info!("[viewer] initialized on canvas #{}", viewer.id);

        Ok(viewer)
    }

    /// Wraps the viewer for [`render`](Self::render) and [`load_all`](Self::load_all).
    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Adds an axes helper of size 1000 to the scene.
    pub fn init_helper(&mut self) {
        self.scene.add(SceneNode::Axes(AxesHelper::default()));
    }

    /// Installs orbit controls auto-rotating at speed 0.5.
    pub fn init_orbit_controls(&mut self) {
        self.controls = Some(OrbitControls::new(OrbitSettings::default()));
    }

    /// Adds a white ambient light to the scene.
    pub fn init_light(&mut self) {
        self.scene.add_light(Light::ambient());
    }

    /// The id of the canvas.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The canvas.
    pub fn canvas(&self) -> &E::Canvas {
        &self.canvas
    }

    /// The scene.
    pub fn scene(&self) -> &Scene<E::Model> {
        &self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene<E::Model> {
        &mut self.scene
    }

    /// The camera.
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// The camera, mutably.
    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    /// The orbit controls, if installed.
    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    /// The orbit controls, mutably.
    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.controls.as_mut()
    }

    /// The renderer.
    pub fn renderer(&self) -> &E::Renderer {
        &self.renderer
    }

    /// The sequential loader.
    pub fn loader(&self) -> &Rc<RefCell<SequentialLoader<E::Loaders>>> {
        &self.loader
    }

    /// Whether a frame is scheduled.
    pub fn is_running(&self) -> bool {
        self.frame.is_some()
    }

    /// Whether [`destroy`](Self::destroy) ran.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn tick(&mut self, time: Option<f64>, on_frame: &mut dyn FnMut(&mut Self, Option<f64>)) {
        let _ = resize_to_display_size(&mut self.renderer, &mut self.camera);
        if let Some(controls) = self.controls.as_mut() {
            let _ = controls.update(&mut self.camera);
        }

        on_frame(self, time);

        if !self.destroyed {
            self.renderer.render(&self.scene, &self.camera);
        }
    }

    /// Releases every engine resource held by the viewer.
    ///
    /// Cancels the scheduled frame and any running drain, releases the models
    /// of the scene, disposes the renderer, empties the scene and drops the
    /// loader's sub-loaders and cache. A drain in flight stops once its current
    /// load resolves, drops that asset and clears the loader on its way out.
    /// Calling it again does nothing. Also runs on drop.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.cancel.cancel();

        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }

        for node in self.scene.clear() {
            if let SceneNode::Model(model) = node {
                self.renderer.release(&model);
            }
        }
        self.renderer.dispose();
        self.controls = None;

        match self.loader.try_borrow_mut() {
            Ok(mut loader) => loader.registry_mut().clear(),
            Err(_) => log::warn!(
                "[viewer] #{} destroyed during a drain, it stops after the load in flight",
                self.id
            ),
        }

        log::info!("[viewer] #{} destroyed", self.id);
    }
}

impl<E: Engine + 'static> Viewer<E> {
    /// Starts the render loop.
    ///
    /// The first tick runs synchronously, with no timestamp. Every tick resizes
    /// the drawing buffer if the canvas changed size, updates the orbit
    /// controls, calls `on_frame`, renders the scene and schedules the next
    /// tick. The loop runs until the viewer is destroyed or dropped. Calling
    /// `render` again replaces the running loop.
    pub fn render<F>(this: &Rc<RefCell<Self>>, on_frame: F) -> Result<()>
    where
        F: FnMut(&mut Self, Option<f64>) + 'static,
    {
        {
            let mut viewer = this.try_borrow_mut().map_err(|_| ViewerError::Busy)?;
            if viewer.destroyed {
                return Err(ViewerError::Destroyed);
            }
            if let Some(handle) = viewer.frame.take() {
                viewer.scheduler.cancel_frame(handle);
            }
        }

        Self::run_frame(Rc::downgrade(this), Box::new(on_frame), None);
        Ok(())
    }

    fn run_frame(this: Weak<RefCell<Self>>, mut on_frame: FrameFn<E>, time: Option<f64>) {
        let shared = match this.upgrade() {
            Some(shared) => shared,
            None => return,
        };
        let mut viewer = match shared.try_borrow_mut() {
            Ok(viewer) => viewer,
            Err(_) => {
                log::error!("[render] viewer borrowed when its frame fired, render loop stopped");
                return;
            }
        };
        if viewer.destroyed {
            return;
        }

        viewer.frame = None;
        viewer.tick(time, &mut *on_frame);
        if viewer.destroyed {
            return;
        }

        let handle = viewer.scheduler.request_frame(Box::new(move |timestamp| {
            Self::run_frame(this, on_frame, Some(timestamp))
        }));
        viewer.frame = Some(handle);
    }

    /// Drains `queue` through the viewer's loader.
    ///
    /// With [`ViewerOptions::attach_models`] set, each loaded model is appended
    /// to the scene as soon as it completes. Fails with [`ViewerError::Busy`]
    /// if another drain is running. If the viewer is destroyed meanwhile, the
    /// drain ends with [`DrainOutcome::Cancelled`](crate::loader::DrainOutcome::Cancelled).
    pub async fn load_all(
        this: &Rc<RefCell<Self>>,
        queue: LoadQueue<E::Model>,
        callbacks: QueueCallbacks<'_, E::Model>,
    ) -> Result<DrainReport<E::Model>> {
        let (loader, attach_models) = {
            let viewer = this.try_borrow().map_err(|_| ViewerError::Busy)?;
            if viewer.destroyed {
                return Err(ViewerError::Destroyed);
            }
            (viewer.loader.clone(), viewer.attach_models)
        };
        let mut loader = loader.try_borrow_mut().map_err(|_| ViewerError::Busy)?;

        let mut callbacks = callbacks;
        if attach_models {
            let viewer = Rc::downgrade(this);
            let mut on_loaded = callbacks.on_loaded.take();
            callbacks.on_loaded = Some(Box::new(move |index: usize, asset: &Asset<E::Model>| {
                if let (Some(model), Some(viewer)) = (asset.as_model(), viewer.upgrade()) {
                    match viewer.try_borrow_mut() {
                        Ok(mut viewer) if !viewer.destroyed => {
                            viewer.scene.add_model(model.clone())
                        }
                        Ok(_) => {}
                        Err(_) => log::warn!("[viewer] could not attach model #{}, viewer busy", index),
                    }
                }
                if let Some(f) = on_loaded.as_mut() {
                    f(index, asset);
                }
            }));
        }

        let report = loader.drain(queue, callbacks).await;

        if this.try_borrow().map_or(false, |viewer| viewer.destroyed) {
            loader.registry_mut().clear();
        }

        Ok(report)
    }
}

impl<E: Engine> Drop for Viewer<E> {
    fn drop(&mut self) {
        self.destroy();
    }
}
