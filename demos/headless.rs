use fz3d::backend::headless::{HeadlessCanvas, HeadlessDocument, HeadlessEngine};
use fz3d::prelude::*;

fn main() {
    env_logger::init();

    let mut engine = HeadlessEngine::new();
    let mut document = HeadlessDocument::new();
    let canvas = document.append(HeadlessCanvas::new().with_id("stage"));

    let viewer = match Viewer::new(&mut engine, &document, "stage", ViewerOptions::full()) {
        Ok(viewer) => viewer.into_shared(),
        Err(err) => {
            eprintln!("{}", err);
            return;
        }
    };

    // A flaky server: the car fails once before loading.
    engine.loaders().fail_times("models/car.glb", "503 Service Unavailable", 1);
    viewer
        .borrow()
        .loader()
        .borrow_mut()
        .set_policy(ErrorPolicy::Retry(1));

    let queue = LoadQueue::new()
        .with(AssetSource::obj("models/house.obj", "models/house.mtl"))
        .with(AssetSource::glb("models/car.glb").with_draco_path("libs/draco/"))
        .with(
            LoadRequest::new(AssetSource::json("models/scene.json"))
                .on_load(|asset| println!("scene description: {:?}", asset.as_json())),
        );
    let callbacks = QueueCallbacks::new()
        .on_progress(|event, index| {
            if let Some(percent) = event.percent() {
                println!("#{}: {:.0}%", index, percent);
            }
        })
        .on_all_load(|results| println!("{} assets loaded", results.len()));

    match pollster::block_on(Viewer::load_all(&viewer, queue, callbacks)) {
        Ok(report) => println!("{:?}", report.outcome),
        Err(err) => eprintln!("{}", err),
    }

    if let Err(err) = Viewer::render(&viewer, |viewer, time| {
        if let Some(time) = time {
            let position = viewer.camera().position;
            println!("t = {:>5.1}ms, camera at {:?}", time, position);
        }
    }) {
        eprintln!("{}", err);
        return;
    }

    // Ten frames at 60 fps, with the canvas stretched halfway through.
    for frame in 1..=10 {
        if frame == 5 {
            canvas.set_client_size(800.0, 600.0);
        }
        let _ = engine.scheduler().fire(frame as f64 * 1000.0 / 60.0);
    }

    viewer.borrow_mut().destroy();
    println!("{:#?}", engine.render_stats());
}
