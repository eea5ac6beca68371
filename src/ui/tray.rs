//! Tray front end: a `tray-icon` menu driven by a `winit` event loop.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::error;
use tray_icon::menu::MenuEvent;
use tray_icon::{TrayIcon, TrayIconBuilder};
use winit::event::{Event, StartCause};
use winit::event_loop::{ControlFlow, EventLoop};

use crate::app::{Core, Flow, Shell};
use crate::model::UserEvent;
use crate::ui::icon::{IconVariant, create_icon};
use crate::ui::menu::{build_menu, build_tooltip, parse_menu_action};

const MENU_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(core: Core) -> Result<()> {
    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("failed to create event loop")?;
    let proxy = event_loop.create_proxy();
    let mut shell = Shell::start(core, proxy.clone());
    let menu_receiver = MenuEvent::receiver().clone();

    let icon = create_icon(IconVariant::Normal).context("failed to create tray icon image")?;
    let initial_menu = menu_for(&shell).context("failed to build initial menu")?;
    let tray_icon = TrayIconBuilder::new()
        .with_icon(icon)
        .with_icon_as_template(true)
        .with_menu(Box::new(initial_menu))
        .with_tooltip(build_tooltip(&shell.visible_apps(), None))
        .build()
        .context("failed to create tray icon")?;
    tray_icon
        .set_visible(true)
        .context("failed to show tray icon")?;

    #[allow(deprecated)]
    let run_result = event_loop.run(move |event, event_loop| match event {
        Event::NewEvents(StartCause::Init) => {
            // WaitUntil lets the loop poll for menu events
            event_loop
                .set_control_flow(ControlFlow::WaitUntil(Instant::now() + MENU_POLL_INTERVAL));
        }
        Event::NewEvents(StartCause::ResumeTimeReached { .. }) => {
            while let Ok(event) = menu_receiver.try_recv() {
                if let Some(action) = parse_menu_action(event.id().as_ref()) {
                    let _ = proxy.send_event(UserEvent::MenuAction(action));
                }
            }
            event_loop
                .set_control_flow(ControlFlow::WaitUntil(Instant::now() + MENU_POLL_INTERVAL));
        }
        Event::UserEvent(user_event) => match shell.handle(user_event) {
            Flow::Exit => event_loop.exit(),
            Flow::Changed => update_tray_display(&tray_icon, &shell),
            Flow::Continue => {}
        },
        _ => {}
    });

    run_result.context("event loop error")
}

fn menu_for(shell: &Shell) -> Result<tray_icon::menu::Menu> {
    let reconciler = shell.reconciler();
    build_menu(
        &shell.visible_apps(),
        reconciler.ignored_apps().len(),
        reconciler.default_action(),
    )
}

fn update_tray_display(tray_icon: &TrayIcon, shell: &Shell) {
    match menu_for(shell) {
        Ok(menu) => tray_icon.set_menu(Some(Box::new(menu))),
        Err(err) => error!("Failed to rebuild menu: {}", err),
    }

    let variant = if shell.needs_attention() {
        IconVariant::Attention
    } else {
        IconVariant::Normal
    };
    if let Ok(icon) = create_icon(variant) {
        let _ = tray_icon.set_icon(Some(icon));
        // Template icons are recoloured by the menu bar.
        tray_icon.set_icon_as_template(variant == IconVariant::Normal);
    }

    let tooltip = build_tooltip(&shell.visible_apps(), shell.last_feedback());
    if let Err(err) = tray_icon.set_tooltip(Some(tooltip.as_str())) {
        error!("Failed to update tooltip: {}", err);
    }
}
