//! Windows driven end to end through the host, with the headless backend.

use approx::assert_relative_eq;
use cgmath::{Point2, Vector2};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};
use wren::digitizer;
use wren::events::PointerPhase;
use wren::headless::{Command, CommandLog, Headless};
use wren::graphics::BufferId;
use wren::{
    Color, Drawable, Error, Graphics, GraphicsError, Host, HostConfig, Layer, MouseEventKind,
    Pointer, PointerTarget, Position, Rectangle, ViewCx, ViewId, Window, WindowConfig,
    WindowHandle,
};

const DEFAULT_FILTER: &str = "warn,wren=debug";

/// Installs a test log subscriber. Accepts `RUST_LOG` filters on top of the default.
fn init_logging() {
    let mut filter = DEFAULT_FILTER.to_owned();
    if let Ok(env_filter) = std::env::var(EnvFilter::DEFAULT_ENV) {
        filter.push(',');
        filter.push_str(&env_filter);
    }
    let _ = Registry::default()
        .with(EnvFilter::new(filter))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

fn wait_until(mut f: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !f() {
        assert!(Instant::now() < deadline, "timed out");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Gives the window thread a moment to process anything still queued.
fn settle() {
    thread::sleep(Duration::from_millis(50));
}

fn presents(log: &CommandLog) -> usize {
    log.count(|c| *c == Command::Present)
}

type Events = Arc<Mutex<Vec<(PointerPhase, Position)>>>;

#[derive(Debug, Default)]
struct Recorder {
    events: Events,
}

impl Drawable for Recorder {}

impl PointerTarget for Recorder {
    fn pointer_down(&mut self, _cx: &mut ViewCx<'_>, pointer: &Pointer) {
        self.events.lock().push((PointerPhase::Down, pointer.position));
    }

    fn pointer_move(&mut self, _cx: &mut ViewCx<'_>, pointer: &Pointer) {
        self.events.lock().push((PointerPhase::Move, pointer.position));
    }

    fn pointer_up(&mut self, _cx: &mut ViewCx<'_>, pointer: &Pointer) {
        self.events.lock().push((PointerPhase::Up, pointer.position));
    }
}

/// Opens a 100×100 window and waits for its first frame.
fn open(host: &Host, handle: WindowHandle) -> (Window, CommandLog) {
    let (init, log) = Headless::init();
    let window = host
        .open_window(
            handle,
            WindowConfig::default().with_size(100., 100.).with_title("test"),
            Box::new(()),
            init,
        )
        .unwrap();
    wait_until(|| presents(&log) == 1);
    (window, log)
}

/// Adds a recording child at (10, 10), sized 50×50.
fn add_recorder(window: &Window) -> (ViewId, Events) {
    let events = Events::default();
    let recorder = Recorder {
        events: Arc::clone(&events),
    };
    let child = window
        .with_tree(move |tree| {
            let root = tree.root();
            tree.insert(
                root,
                Box::new(recorder),
                Point2::new(10., 10.),
                Vector2::new(50., 50.),
            )
        })
        .unwrap()
        .unwrap();
    (child, events)
}

fn assert_position(actual: Position, x: f64, y: f64) {
    assert_relative_eq!(actual.x, x, epsilon = 1e-9);
    assert_relative_eq!(actual.y, y, epsilon = 1e-9);
}

#[test]
fn first_frame() {
    init_logging();
    let host = Host::default();
    let (_window, log) = open(&host, WindowHandle(1));
    assert_eq!(
        log.snapshot(),
        vec![
            Command::SetProjection(Vector2::new(100., 100.)),
            Command::Clear,
            Command::SetViewTransform(wren::Transform::IDENTITY),
            Command::Present,
        ]
    );
}

#[test]
fn resize_projects_and_draws_once() {
    init_logging();
    let host = Host::default();
    let (window, log) = open(&host, WindowHandle(1));
    log.take();

    host.resize_event(
        WindowHandle(1),
        Vector2::new(200., 200.),
        Vector2::new(400., 400.),
    );
    wait_until(|| presents(&log) == 1);
    settle();

    assert_eq!(
        log.count(|c| *c == Command::SetProjection(Vector2::new(200., 200.))),
        1
    );
    assert_eq!(log.count(|c| matches!(c, Command::SetProjection(_))), 1);
    assert_eq!(presents(&log), 1);

    let size = window.with_tree(|tree| tree.size(tree.root())).unwrap();
    assert_eq!(size, Some(Vector2::new(200., 200.)));
}

#[test]
fn redraw_requests_coalesce() {
    init_logging();
    let host = Host::default();
    let (window, log) = open(&host, WindowHandle(1));
    log.take();

    window
        .with_tree(|tree| {
            for _ in 0..10 {
                tree.redraw();
            }
        })
        .unwrap();
    wait_until(|| presents(&log) == 1);
    settle();
    assert_eq!(presents(&log), 1);
}

#[test]
fn mouse_gesture_is_captured() {
    init_logging();
    let host = Host::default();
    let (window, _log) = open(&host, WindowHandle(1));
    let (_child, events) = add_recorder(&window);

    host.mouse_event(WindowHandle(1), 0.2, 0.2, MouseEventKind::Down, 0, 0);
    wait_until(|| events.lock().len() == 1);
    host.mouse_event(WindowHandle(1), 0.7, 0.7, MouseEventKind::Dragged, 0, 0);
    wait_until(|| events.lock().len() == 2);
    host.mouse_event(WindowHandle(1), 0.7, 0.7, MouseEventKind::Up, 0, 0);
    wait_until(|| events.lock().len() == 3);

    let events = events.lock().clone();
    let phases: Vec<_> = events.iter().map(|(phase, _)| *phase).collect();
    assert_eq!(
        phases,
        vec![PointerPhase::Down, PointerPhase::Move, PointerPhase::Up]
    );
    assert_position(events[0].1, 10., 10.);
    assert_position(events[1].1, 60., 60.);
    assert_position(events[2].1, 60., 60.);
}

#[test]
fn touches_reach_every_window() {
    init_logging();
    let host = Host::default();
    let (window, _log) = open(&host, WindowHandle(1));
    let (_child, events) = add_recorder(&window);
    host.set_window_frame(
        WindowHandle(1),
        Rectangle::new(Point2::new(0., 0.), Point2::new(5120., 2880.)),
    );

    // touch id 0 at a fifth of the screen, then lifted
    let [x0, x1] = 13107u16.to_le_bytes();
    let down = vec![0x00, 0x09, x0, x1, x0, x1];
    let up = vec![0x00, 0x08, x0, x1, x0, x1];
    digitizer::pump(&host, vec![down, up]);

    wait_until(|| events.lock().len() == 2);
    let events = events.lock().clone();
    assert_eq!(events[0].0, PointerPhase::Down);
    assert_eq!(events[1].0, PointerPhase::Up);
    assert_position(events[0].1, 10., 10.);
    assert_eq!(host.pointers().active(), 1);
}

#[test]
fn single_window_hosts_reject_a_second_window() {
    init_logging();
    let host = Host::new(HostConfig::default().single_window(true));
    let (first, _log) = open(&host, WindowHandle(1));

    let (init, _) = Headless::init();
    let second = host.open_window(
        WindowHandle(2),
        WindowConfig::default(),
        Box::new(()),
        init,
    );
    assert!(matches!(second, Err(Error::SingleWindowOnly)));

    first.close();
    assert!(host.windows().is_empty());
    let (_again, _log) = open(&host, WindowHandle(2));
}

#[test]
fn duplicate_handles_are_rejected() {
    init_logging();
    let host = Host::default();
    let (_window, _log) = open(&host, WindowHandle(7));
    let (init, _) = Headless::init();
    let again = host.open_window(WindowHandle(7), WindowConfig::default(), Box::new(()), init);
    assert!(matches!(again, Err(Error::DuplicateWindow(WindowHandle(7)))));
}

#[test]
fn work_items_round_trip() {
    init_logging();
    let host = Host::default();
    let (window, _log) = open(&host, WindowHandle(1));
    let (child, _events) = add_recorder(&window);

    let (len, contains) = window
        .with_tree(move |tree| (tree.len(), tree.contains(child)))
        .unwrap();
    assert_eq!(len, 2);
    assert!(contains);

    // blocking on the window from its own thread fails instead of deadlocking
    let proxy = window.proxy();
    let nested = window
        .with_tree(move |_| proxy.with_tree(|tree| tree.len()))
        .unwrap();
    assert!(matches!(nested, Err(Error::WindowThread)));
}

#[test]
fn closed_windows_reject_work() {
    init_logging();
    let host = Host::default();
    let (window, _log) = open(&host, WindowHandle(1));
    let proxy = window.proxy();
    drop(window);

    assert!(!host.windows().contains(WindowHandle(1)));
    assert!(matches!(
        proxy.with_tree(|tree| tree.len()),
        Err(Error::WindowClosed)
    ));
}

#[test]
fn graphics_failure_is_reported_by_open() {
    init_logging();
    let host = Host::default();
    let result = host.open_window(
        WindowHandle(1),
        WindowConfig::default(),
        Box::new(()),
        Box::new(|| -> Result<Box<dyn Graphics>, GraphicsError> {
            Err(GraphicsError::Context("no display".into()))
        }),
    );
    assert!(matches!(
        result,
        Err(Error::Graphics(GraphicsError::Context(_)))
    ));
    assert!(host.windows().is_empty());
}

#[test]
fn input_from_the_window_thread_does_not_block() {
    init_logging();
    let host = Arc::new(Host::default());
    let (window, _log) = open(&host, WindowHandle(1));
    let (_child, events) = add_recorder(&window);

    let input = Arc::clone(&host);
    window
        .with_tree(move |_| {
            let handle = WindowHandle(1);
            input.mouse_event(handle, 0.2, 0.2, MouseEventKind::Down, 0, 0);
            input.mouse_event(handle, 0.3, 0.3, MouseEventKind::Dragged, 0, 0);
            input.mouse_event(handle, 0.5, 0.5, MouseEventKind::Dragged, 0, 0);
            input.mouse_event(handle, 0.5, 0.5, MouseEventKind::Up, 0, 0);
        })
        .unwrap();

    wait_until(|| events.lock().len() == 3);
    settle();
    let events = events.lock().clone();
    let phases: Vec<_> = events.iter().map(|(phase, _)| *phase).collect();
    assert_eq!(
        phases,
        vec![PointerPhase::Down, PointerPhase::Move, PointerPhase::Up]
    );
    assert_position(events[1].1, 40., 40.);
}

#[test]
fn buffers_are_released_on_removal_and_close() {
    init_logging();
    let host = Host::default();
    let (window, log) = open(&host, WindowHandle(1));
    let released = |log: &CommandLog| log.count(|c| matches!(c, Command::ReleaseBuffer(_)));

    let layer = window
        .with_tree(|tree| {
            let root = tree.root();
            tree.insert(
                root,
                Box::new(Layer::new(Color::WHITE)),
                Point2::new(0., 0.),
                Vector2::new(10., 10.),
            )
        })
        .unwrap()
        .unwrap();
    wait_until(|| presents(&log) == 2);
    assert_eq!(log.count(|c| *c == Command::CreateBuffer(BufferId(1), 2)), 1);

    window
        .with_tree(move |tree| tree.remove(layer))
        .unwrap()
        .unwrap();
    wait_until(|| released(&log) == 1);
    assert_eq!(log.count(|c| *c == Command::ReleaseBuffer(BufferId(1))), 1);

    window
        .with_tree(|tree| {
            let root = tree.root();
            tree.insert(
                root,
                Box::new(Layer::new(Color::BLACK)),
                Point2::new(0., 0.),
                Vector2::new(10., 10.),
            )
        })
        .unwrap()
        .unwrap();
    wait_until(|| log.count(|c| matches!(c, Command::CreateBuffer(..))) == 2);
    window.close();
    assert_eq!(released(&log), 2);
}
