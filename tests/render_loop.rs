use std::cell::RefCell;
use std::rc::Rc;

use fz3d::backend::headless::{HeadlessCanvas, HeadlessDocument, HeadlessEngine};
use fz3d::prelude::*;

struct Stage {
    engine: HeadlessEngine,
    canvas: HeadlessCanvas,
    viewer: Rc<RefCell<Viewer<HeadlessEngine>>>,
}

fn stage(options: ViewerOptions) -> Stage {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut engine = HeadlessEngine::new();
    let mut document = HeadlessDocument::new();
    let canvas = document.append(HeadlessCanvas::new().with_id("stage"));
    let viewer = Viewer::new(&mut engine, &document, "stage", options)
        .unwrap()
        .into_shared();

    Stage {
        engine,
        canvas,
        viewer,
    }
}

#[test]
fn first_tick_is_synchronous_and_untimed() {
    let stage = stage(ViewerOptions::default());
    let times = Rc::new(RefCell::new(Vec::new()));

    let seen = times.clone();
    Viewer::render(&stage.viewer, move |_, time| seen.borrow_mut().push(time)).unwrap();

    assert_eq!(*times.borrow(), vec![None]);
    assert_eq!(stage.engine.render_stats().frames, 1);
    assert_eq!(stage.engine.scheduler().pending(), 1);
    assert!(stage.viewer.borrow().is_running());

    assert!(stage.engine.scheduler().fire(16.5));
    assert!(stage.engine.scheduler().fire(33.0));
    assert_eq!(*times.borrow(), vec![None, Some(16.5), Some(33.0)]);
    assert_eq!(stage.engine.render_stats().frames, 3);
    assert_eq!(stage.engine.scheduler().pending(), 1);
}

#[test]
fn resize_happens_once_per_size_change() {
    let stage = stage(ViewerOptions::default());
    Viewer::render(&stage.viewer, |_, _| {}).unwrap();

    // An unstyled 300x150 canvas already matches its drawing buffer.
    assert!(stage.engine.render_stats().resizes.is_empty());

    stage.canvas.set_client_size(640.0, 480.0);
    stage.canvas.set_pixel_ratio(2.0);
    assert!(stage.engine.scheduler().fire(16.0));
    assert!(stage.engine.scheduler().fire(32.0));
    assert!(stage.engine.scheduler().fire(48.0));

    let stats = stage.engine.render_stats();
    assert_eq!(stats.resizes, vec![(1280, 960)]);
    assert_eq!(stats.frames, 4);
    assert!((stats.last_aspect - 640.0 / 480.0).abs() < 1.0e-6);
    assert!((stage.viewer.borrow().camera().aspect() - 4.0 / 3.0).abs() < 1.0e-6);
}

#[test]
fn frames_are_drawn_with_the_resized_projection() {
    let stage = stage(ViewerOptions::default());
    Viewer::render(&stage.viewer, |_, _| {}).unwrap();
    let before = stage.engine.render_stats().last_transformation;

    stage.canvas.set_client_size(400.0, 400.0);
    assert!(stage.engine.scheduler().fire(16.0));

    let drawn = stage.engine.render_stats().last_transformation;
    assert_ne!(drawn, before);
    assert_eq!(drawn, stage.viewer.borrow().camera().transformation());
}

#[test]
fn fractional_sizes_are_truncated() {
    let stage = stage(ViewerOptions::default());
    stage.canvas.set_client_size(333.3, 200.0);
    stage.canvas.set_pixel_ratio(1.5);

    Viewer::render(&stage.viewer, |_, _| {}).unwrap();
    assert!(stage.engine.scheduler().fire(16.0));

    assert_eq!(stage.engine.render_stats().resizes, vec![(499, 300)]);
}

#[test]
fn hidden_canvas_keeps_the_aspect() {
    let stage = stage(ViewerOptions::default());
    stage.canvas.set_client_size(300.0, 0.0);

    Viewer::render(&stage.viewer, |_, _| {}).unwrap();

    assert_eq!(stage.engine.render_stats().resizes, vec![(300, 0)]);
    assert_eq!(stage.viewer.borrow().camera().aspect(), 2.0);
}

#[test]
fn orbit_controls_move_the_camera_every_tick() {
    let stage = stage(ViewerOptions::full());
    let start = stage.viewer.borrow().camera().position;

    Viewer::render(&stage.viewer, |_, _| {}).unwrap();
    let first = stage.viewer.borrow().camera().position;
    assert!(stage.engine.scheduler().fire(16.0));
    let second = stage.viewer.borrow().camera().position;

    assert_ne!(start, first);
    assert_ne!(first, second);
    assert!((start.length() - second.length()).abs() < 1.0e-2);
}

#[test]
fn destroy_cancels_the_pending_frame() {
    let stage = stage(ViewerOptions::default());
    Viewer::render(&stage.viewer, |_, _| {}).unwrap();

    stage.viewer.borrow_mut().destroy();
    stage.viewer.borrow_mut().destroy();

    let scheduler = stage.engine.scheduler();
    assert_eq!(scheduler.pending(), 0);
    assert_eq!(scheduler.cancelled(), 1);
    assert!(!scheduler.fire(16.0));
    assert!(stage.engine.render_stats().disposed);
    assert!(!stage.viewer.borrow().is_running());
    assert_eq!(
        Viewer::render(&stage.viewer, |_, _| {}),
        Err(ViewerError::Destroyed)
    );
}

#[test]
fn destroying_from_the_frame_callback_stops_the_loop() {
    let stage = stage(ViewerOptions::default());

    Viewer::render(&stage.viewer, |viewer, time| {
        if time.is_some() {
            viewer.destroy();
        }
    })
    .unwrap();
    assert!(stage.engine.scheduler().fire(16.0));

    let stats = stage.engine.render_stats();
    assert_eq!(stats.frames, 1);
    assert!(stats.disposed);
    assert_eq!(stage.engine.scheduler().pending(), 0);
}

#[test]
fn dropping_the_viewer_tears_it_down() {
    let Stage {
        engine,
        canvas: _canvas,
        viewer,
    } = stage(ViewerOptions::default());
    Viewer::render(&viewer, |_, _| {}).unwrap();

    drop(viewer);

    assert_eq!(engine.scheduler().pending(), 0);
    assert!(engine.render_stats().disposed);
}

#[test]
fn rendering_again_replaces_the_loop() {
    let stage = stage(ViewerOptions::default());
    let calls = Rc::new(RefCell::new((0, 0)));

    let seen = calls.clone();
    Viewer::render(&stage.viewer, move |_, _| seen.borrow_mut().0 += 1).unwrap();
    let seen = calls.clone();
    Viewer::render(&stage.viewer, move |_, _| seen.borrow_mut().1 += 1).unwrap();

    assert_eq!(stage.engine.scheduler().pending(), 1);
    assert!(stage.engine.scheduler().fire(16.0));
    assert_eq!(*calls.borrow(), (1, 2));
}
