use std::io::{self, Write};
use std::sync::{mpsc, Arc};

use anyhow::Context;
use aperture_core::{update, AppState, Msg};
use aperture_engine::{resolve_from_env, EngineHandle};
use aperture_logging::{shell_info, shell_warn};
use chrono::Local;

use super::config::{self, ShellConfig};
use super::effects::{EffectRunner, MsgForwarder};
use super::input;
use super::render::Renderer;

pub fn run_app() -> anyhow::Result<()> {
    let config_path = config::config_path();
    let loaded = config::load(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        _ => ShellConfig::default(),
    };

    if !aperture_logging::initialize(&config.log_settings()) {
        eprintln!("Warning: logging is disabled");
    }
    match loaded {
        Ok(Some(_)) => shell_info!("Loaded configuration from {}", config_path.display()),
        Ok(None) => shell_info!("No configuration at {}; using defaults", config_path.display()),
        Err(err) => shell_warn!("{:#}; using defaults", err),
    }

    let interpreter = resolve_from_env();
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let sink = Arc::new(MsgForwarder::new(msg_tx.clone()));
    let engine = EngineHandle::new(config.engine_config(interpreter.path), sink)
        .context("failed to start engine")?;
    let mut runner = EffectRunner::new(engine);

    input::spawn_stdin_reader(msg_tx.clone()).context("failed to start stdin reader")?;
    println!("{}", input::HELP);

    let mut state = AppState::with_settings(config.core_settings());
    let mut renderer = Renderer::default();
    let _ = msg_tx.send(Msg::Started);
    drop(msg_tx);

    while let Ok(msg) = msg_rx.recv() {
        let (next, effects) = update(state, msg);
        state = next;
        runner.run(effects);

        if state.consume_dirty() {
            let stamp = Local::now().format("%H:%M:%S").to_string();
            print_lines(&renderer.render(&state.view(), &stamp));
        }
        if state.is_shutting_down() {
            break;
        }
    }

    runner.shutdown();
    shell_info!("Shutdown complete");
    Ok(())
}

fn print_lines(lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        if writeln!(out, "{line}").is_err() {
            return;
        }
    }
    let _ = out.flush();
}
