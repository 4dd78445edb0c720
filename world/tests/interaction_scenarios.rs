//! End-to-end interaction scenarios.
//!
//! Each test builds a world with the stock layout, drives it through a
//! `ScriptedDevice` and inspects what reached the `EventRecorder`.
//!
//! Stock layout seen from the origin: the browser (18 x 11.25 world
//! units, 720 x 450 px) is centered at (0, -3, -18), the URL bar
//! (18 x 2.575, 720 x 103 px) at (0, 7.15, -18), and the 0.5 x 0.1 tray
//! hangs at (0, 0.45, -1.2) tilted toward the viewer.

use std::io::Write;

use vr_world::device::{DeviceCommand, GestureType, ScriptedDevice};
use vr_world::vr::scene::{Vec2, Vec3};
use vr_world::vr::surface::{Placement, SurfaceHandle, SurfaceKind};
use vr_world::{EventRecorder, World, WorldConfig, WorldEvent};

const EPSILON: f32 = 0.05;

fn connect(controller: usize) -> Vec<DeviceCommand> {
    vec![
        DeviceCommand::Connect { controller, model: Some(0) },
        DeviceCommand::Enable { controller, enabled: true },
        DeviceCommand::Visible { controller, visible: true },
    ]
}

fn aim(controller: usize, to: [f32; 3]) -> DeviceCommand {
    DeviceCommand::Aim {
        controller,
        from: [0.0, 0.0, 0.0],
        to,
    }
}

/// Level ray at height `y`; keeps clear of the tray.
fn level(controller: usize, y: f32) -> DeviceCommand {
    DeviceCommand::Aim {
        controller,
        from: [0.0, y, 0.0],
        to: [0.0, y, -18.0],
    }
}

fn button(controller: usize, pressed: bool) -> DeviceCommand {
    DeviceCommand::Button {
        controller,
        button: 0,
        pressed,
    }
}

/// Initialized, running world with no head pose noise.
fn world_with(frames: Vec<Vec<DeviceCommand>>) -> World<EventRecorder> {
    let config = WorldConfig {
        audio_pose: false,
        ..WorldConfig::default()
    };
    let mut world = World::new(config, EventRecorder::new());
    world.register_device(Some(Box::new(
        ScriptedDevice::new(frames).with_models(vec!["controller.obj".to_string()]),
    )));
    world.initialize();
    world.sink_mut().clear();
    world.resume();
    world
}

fn run(world: &mut World<EventRecorder>, frames: usize) {
    for _ in 0..frames {
        world.frame();
    }
}

fn handle_of(world: &World<EventRecorder>, kind: SurfaceKind) -> SurfaceHandle {
    world
        .registry()
        .find(|s| s.kind() == kind)
        .map(|s| s.handle())
        .expect("surface of kind")
}

fn assert_pointer(event: &WorldEvent, surface: SurfaceHandle, pressed: bool, x: f32, y: f32) {
    match event {
        WorldEvent::Pointer {
            surface: s,
            pressed: p,
            x: ex,
            y: ey,
            ..
        } => {
            assert_eq!(*s, surface);
            assert_eq!(*p, pressed);
            assert!((ex - x).abs() < EPSILON, "x {} != {}", ex, x);
            assert!((ey - y).abs() < EPSILON, "y {} != {}", ey, y);
        }
        other => panic!("expected pointer event, got {:?}", other),
    }
}

// ── Pointer ─────────────────────────────────────────────────

#[test]
fn test_click_on_browser() {
    let mut first = connect(0);
    first.push(aim(0, [0.0, 0.0, -18.0]));
    let mut world = world_with(vec![first, vec![button(0, true)], vec![], vec![button(0, false)]]);
    run(&mut world, 4);

    let browser = handle_of(&world, SurfaceKind::Browser);
    let events = world.sink().pointer_events();
    assert_eq!(events.len(), 3, "{:?}", events);
    // (0, 0, -18) sits 3 units above the browser center.
    assert_pointer(events[0], browser, false, 360.0, 105.0);
    assert_pointer(events[1], browser, true, 360.0, 105.0);
    assert_pointer(events[2], browser, false, 360.0, 105.0);
    assert!(world.sink().in_frame(3).is_empty());
    assert!(world.registry().get(browser).unwrap().is_pointer_active());
}

#[test]
fn test_pointer_moves_between_surfaces() {
    let mut first = connect(0);
    first.push(aim(0, [0.0, 0.0, -18.0]));
    let mut world = world_with(vec![first, vec![level(0, 7.15)]]);
    run(&mut world, 2);

    let browser = handle_of(&world, SurfaceKind::Browser);
    let url_bar = handle_of(&world, SurfaceKind::UrlBar);
    let events = world.sink().pointer_events();
    assert_eq!(events.len(), 2);
    assert_pointer(events[1], url_bar, false, 360.0, 51.5);
    assert!(!world.registry().get(browser).unwrap().is_pointer_active());
    assert!(world.registry().get(url_bar).unwrap().is_pointer_active());
}

#[test]
fn test_pointing_at_nothing_is_silent() {
    let mut first = connect(0);
    first.push(aim(0, [0.0, 0.0, 18.0]));
    let mut world = world_with(vec![first, vec![button(0, true)]]);
    run(&mut world, 2);
    assert!(world.sink().is_empty());
}

// ── Scrolling ───────────────────────────────────────────────

#[test]
fn test_touch_drag_scrolls_url_bar() {
    let mut first = connect(0);
    first.push(level(0, 7.15));
    let touch = |x, y| DeviceCommand::Touch { controller: 0, x, y };
    let mut world = world_with(vec![
        first,
        vec![touch(0.5, 0.5)],
        vec![touch(0.5, 0.6)],
        vec![touch(0.4, 0.6)],
        vec![DeviceCommand::EndTouch { controller: 0 }],
        vec![touch(0.0, 0.0)],
    ]);
    run(&mut world, 6);

    let url_bar = handle_of(&world, SurfaceKind::UrlBar);
    let scrolls = world.sink().scroll_events();
    assert_eq!(scrolls.len(), 2, "{:?}", scrolls);
    match (scrolls[0], scrolls[1]) {
        (
            WorldEvent::Scroll { surface, dx: dx0, dy: dy0, .. },
            WorldEvent::Scroll { dx: dx1, dy: dy1, .. },
        ) => {
            assert_eq!(*surface, url_bar);
            assert!(dx0.abs() < EPSILON && (dy0 - 2.0).abs() < EPSILON);
            assert!((dx1 + 2.0).abs() < EPSILON && dy1.abs() < EPSILON);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_wheel_scroll_is_one_shot() {
    let mut first = connect(0);
    first.push(aim(0, [0.0, 0.0, -18.0]));
    let mut world = world_with(vec![
        first,
        vec![DeviceCommand::Scroll { controller: 0, dx: 0.0, dy: -3.0 }],
        vec![],
    ]);
    run(&mut world, 3);

    let scrolls = world.sink().scroll_events();
    assert_eq!(scrolls.len(), 1);
    assert!(matches!(scrolls[0], WorldEvent::Scroll { dy, .. } if *dy == -3.0));
    assert!(world.sink().in_frame(3).is_empty());
}

// ── Tray ────────────────────────────────────────────────────

#[test]
fn test_tray_settings_click() {
    let mut first = connect(0);
    first.push(aim(0, [0.0, 0.45, -1.2]));
    let mut world = world_with(vec![first, vec![button(0, true)], vec![button(0, false)]]);
    run(&mut world, 3);

    assert_eq!(
        world.sink_mut().drain(),
        vec![WorldEvent::OverlayAction { code: 2 }]
    );
    assert!(world.tray().unwrap().is_visible());
}

#[test]
fn test_tray_hide_reveals_surface_behind() {
    let mut first = connect(0);
    first.push(aim(0, [-0.2, 0.45, -1.2]));
    let mut world = world_with(vec![first, vec![button(0, true)], vec![button(0, false)], vec![]]);
    run(&mut world, 3);
    assert_eq!(
        world.sink_mut().drain(),
        vec![WorldEvent::OverlayAction { code: 0 }]
    );
    assert!(!world.tray().unwrap().is_visible());

    // The same ray now carries on to the URL bar.
    run(&mut world, 1);
    let url_bar = handle_of(&world, SurfaceKind::UrlBar);
    let events = world.sink().pointer_events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], WorldEvent::Pointer { surface, .. } if *surface == url_bar));

    world.set_tray_visible(true);
    assert!(world.tray().unwrap().is_visible());
}

// ── Surfaces ────────────────────────────────────────────────

#[test]
fn test_menu_in_front_of_browser_takes_the_hit() {
    let mut first = connect(0);
    first.push(level(0, -3.0));
    let mut world = world_with(vec![first, vec![], vec![]]);
    run(&mut world, 1);

    let browser = handle_of(&world, SurfaceKind::Browser);
    let menu = world
        .add_surface(
            Placement {
                parent: browser,
                kind: SurfaceKind::MoreMenu,
                width: 200.0,
                height: 100.0,
                anchor: Vec2::new(0.5, 0.5),
                parent_anchor: Vec2::new(0.5, 0.5),
                translation: Vec3::new(0.0, 0.0, 10.0),
            },
            5,
        )
        .unwrap();
    run(&mut world, 1);

    let events = world.sink().pointer_events();
    assert_eq!(events.len(), 2);
    assert_pointer(events[0], browser, false, 360.0, 225.0);
    assert_pointer(events[1], menu, false, 100.0, 50.0);

    world.remove_surface(menu);
    run(&mut world, 1);
    let events = world.sink().pointer_events();
    assert_pointer(events[2], browser, false, 360.0, 225.0);
}

#[test]
fn test_unknown_parent_changes_nothing() {
    let mut world = world_with(vec![]);
    let placement = Placement {
        parent: SurfaceHandle(999),
        kind: SurfaceKind::MoreMenu,
        width: 100.0,
        height: 100.0,
        anchor: Vec2::new(0.5, 0.5),
        parent_anchor: Vec2::new(0.5, 0.5),
        translation: Vec3::ZERO,
    };
    assert!(world.add_surface(placement, 1).is_none());
    assert_eq!(world.registry().len(), 2);
    assert!(world.sink().is_empty());
}

// ── Controllers ─────────────────────────────────────────────

#[test]
fn test_disabled_controller_stays_silent() {
    let mut first = connect(0);
    first.push(aim(0, [0.0, 0.0, -18.0]));
    let mut world = world_with(vec![
        first,
        vec![DeviceCommand::Enable { controller: 0, enabled: false }],
        vec![aim(0, [1.0, 0.0, -18.0]), button(0, true)],
        vec![aim(0, [2.0, 0.0, -18.0])],
        vec![DeviceCommand::Enable { controller: 0, enabled: true }],
    ]);
    run(&mut world, 4);
    assert_eq!(world.sink().len(), 1);
    assert!(!world.controllers().get(0).unwrap().visual.as_ref().unwrap().visible);

    // Pose and press written while disabled apply once re-enabled.
    run(&mut world, 1);
    assert_eq!(world.sink().in_frame(5).len(), 1);
}

#[test]
fn test_two_controllers_share_model_group() {
    let mut frame = connect(0);
    frame.extend(connect(1));
    frame.push(aim(0, [0.0, 0.0, -18.0]));
    frame.push(level(1, 7.15));
    let mut world = world_with(vec![frame]);
    run(&mut world, 1);

    assert_eq!(world.controllers().model_group_count(), 1);
    let c0 = world.controllers().get(0).unwrap().visual.as_ref().unwrap();
    assert_eq!(c0.model.file_name.as_deref(), Some("controller.obj"));
    assert!(c0.pointer_beam);
    assert_eq!(world.sink().for_controller(0).len(), 1);
    assert_eq!(world.sink().for_controller(1).len(), 1);
}

#[test]
fn test_gestures_forwarded() {
    let mut world = world_with(vec![vec![
        DeviceCommand::Gesture { gesture: GestureType::SwipeRight },
        DeviceCommand::Gesture { gesture: GestureType::SwipeDown },
    ]]);
    run(&mut world, 2);
    assert_eq!(world.sink_mut().drain(), vec![WorldEvent::Gesture { code: 1 }]);
}

// ── Scripts on disk ─────────────────────────────────────────

#[test]
fn test_script_file_replay() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        models = ["controller.obj"]

        [[frame]]
        commands = [
          {{ op = "connect", controller = 0, model = 0 }},
          {{ op = "enable", controller = 0, enabled = true }},
          {{ op = "aim", controller = 0, from = [0.0, 0.0, 0.0], to = [0.0, 0.0, -18.0] }},
        ]

        [[frame]]
        repeat = 2
        commands = [{{ op = "button", controller = 0, pressed = true }}]
        "#
    )
    .unwrap();

    let device = ScriptedDevice::load(file.path()).unwrap();
    assert_eq!(device.remaining(), 3);
    let mut world = World::new(WorldConfig::default(), EventRecorder::new());
    world.register_device(Some(Box::new(device)));
    world.initialize();
    world.resume();
    run(&mut world, 3);

    assert_eq!(world.sink().pointer_events().len(), 2);
    assert_eq!(world.sink().of_type("head-pose").len(), 3);
}
