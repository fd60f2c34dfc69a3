use std::rc::Rc;
use std::time::Instant;

use anyhow::anyhow;
use scoped_input::input::{
    InputCollector, InputHandler, KeyAction, KeyCode, MouseAction, MouseButton, ScreenEdge,
};
use scoped_input::{InputConfig, ScreenConfig, logging};
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

const MENU: &str = "Menu";
const GAMEPLAY: &str = "Gameplay";
const OWNERS: [&str; 3] = ["StateSwitch", "MainMenu", "Player"];

/// Per-frame context handed to every callback
struct Frame {
    state: &'static str,
    quit: bool,
}

struct App {
    window: Option<Window>,
    input: InputHandler<Frame>,
    screen: ScreenConfig,
    frame: Frame,
    last_update: Option<Instant>,
}

impl App {
    fn new(config: &InputConfig) -> anyhow::Result<Self> {
        let mut input = InputHandler::with_config(InputCollector::new(), config)?;
        declare_bindings(&mut input)?;
        for owner in OWNERS {
            input.subscribe(MENU, owner)?;
        }
        info!(bindings = input.active_count(), "entered {MENU}");

        Ok(Self {
            window: None,
            input,
            screen: config.screen,
            frame: Frame {
                state: MENU,
                quit: false,
            },
            last_update: None,
        })
    }

    fn tick(&mut self) {
        let now = Instant::now();
        let delta_time = self
            .last_update
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_update = Some(now);

        if let Err(e) = self.input.update(&mut self.frame, delta_time) {
            error!(error = %e, "input dispatch failed");
        }
    }
}

/// Switch every demo owner from the current state to `next`
fn transition(input: &mut InputHandler<Frame>, frame: &mut Frame, next: &'static str) {
    for owner in OWNERS {
        input.unsubscribe(frame.state, owner);
    }
    for owner in OWNERS {
        if let Err(e) = input.subscribe(next, owner) {
            warn!(error = %e, owner, "subscribe failed");
        }
    }
    info!(from = frame.state, to = next, bindings = input.active_count(), "state changed");
    frame.state = next;
}

fn declare_bindings(input: &mut InputHandler<Frame>) -> scoped_input::Result<()> {
    input.begin_registration([MENU, GAMEPLAY], "StateSwitch")?;
    input.register_key(1, Rc::new(()), KeyCode::Escape, KeyAction::Pressed, |_, args| {
        let next = if args.context.state == MENU { GAMEPLAY } else { MENU };
        transition(args.handler, args.context, next);
    })?;
    input.end_registration()?;

    input.begin_registration([MENU], "MainMenu")?;
    input.register_mouse(
        1,
        Rc::new("start-button"),
        MouseAction::ButtonPressed(MouseButton::Left),
        |sender, args| {
            let name = sender.downcast_ref::<&str>().copied().unwrap_or("?");
            info!(button = name, pos = ?args.handler.mouse_position(), "menu click");
        },
    )?;
    input.register_mouse(2, Rc::new(()), MouseAction::WheelUp, |_, _| info!("menu scroll up"))?;
    input.register_mouse(3, Rc::new(()), MouseAction::WheelDown, |_, _| {
        info!("menu scroll down")
    })?;
    input.end_registration()?;

    input.begin_registration([GAMEPLAY], "Player")?;
    for (id, key) in [(1, KeyCode::W), (2, KeyCode::A), (3, KeyCode::S), (4, KeyCode::D)] {
        input.register_key(id, Rc::new(()), key, KeyAction::Down, |_, args| {
            info!(key = ?args.key, dt = args.delta_time, "move");
        })?;
    }
    input.register_mouse(5, Rc::new(()), MouseAction::Drag(MouseButton::Right), |_, args| {
        info!(delta = ?args.handler.mouse_movement(), "camera drag");
    })?;
    for (id, edge) in [
        (6, ScreenEdge::Top),
        (7, ScreenEdge::Bottom),
        (8, ScreenEdge::Left),
        (9, ScreenEdge::Right),
    ] {
        input.register_mouse(id, Rc::new(()), MouseAction::ScreenEdge(edge), move |_, _| {
            info!(?edge, "edge scroll");
        })?;
    }
    input.register_key(10, Rc::new(()), KeyCode::Q, KeyAction::Released, |_, args| {
        args.context.quit = true;
    })?;
    input.end_registration()?;

    Ok(())
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attributes = Window::default_attributes()
                .with_title("Scoped Input Demo")
                .with_inner_size(winit::dpi::LogicalSize::new(
                    self.screen.width as f64,
                    self.screen.height as f64,
                ));

            match event_loop.create_window(window_attributes) {
                Ok(window) => {
                    if let Some(collector) = self.input.source_as_mut::<InputCollector>() {
                        collector.set_scale_factor(window.scale_factor());
                    }
                    window.request_redraw();
                    self.window = Some(window);
                }
                Err(e) => {
                    error!(error = %e, "Failed to create window");
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(collector) = self.input.source_as_mut::<InputCollector>() {
            collector.handle_window_event(&event);
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = &self.window {
                    let logical = size.to_logical::<f64>(window.scale_factor());
                    let screen = ScreenConfig {
                        width: logical.width.round() as i32,
                        height: logical.height.round() as i32,
                        ..self.screen
                    };
                    // Minimized windows report a zero size
                    match self.input.set_screen(screen) {
                        Ok(()) => self.screen = screen,
                        Err(e) => warn!(error = %e, "keeping previous screen geometry"),
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                self.tick();
                if self.frame.quit {
                    event_loop.exit();
                } else if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_logging("scoped_input=info,input_demo=info,warn");

    let config = InputConfig::load_from_env().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using default configuration");
        InputConfig::default()
    });

    let event_loop =
        EventLoop::new().map_err(|e| anyhow!("Failed to create event loop: {e}"))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(&config)?;
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Failed to run event loop: {e}"))
}
