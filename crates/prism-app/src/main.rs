// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use prism_core::{init_tracing, report_fatal};
use prism_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};
use prism_platform::WindowHost;
use prism_render::{PresentError, Presenter, PresenterOptions, ValidationMode};
use prism_render_vk::VkSession;
use tracing::{error, info};

mod config;

use config::AppCfg;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config
    #[arg(long, default_value = "prism.toml")]
    config: PathBuf,

    /// Validation layer: auto (debug builds) | on | off
    #[arg(long, value_enum, default_value_t = ValidationArg::Auto)]
    validation: ValidationArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ValidationArg {
    Auto,
    On,
    Off,
}

impl From<ValidationArg> for ValidationMode {
    fn from(v: ValidationArg) -> Self {
        match v {
            ValidationArg::Auto => ValidationMode::Auto,
            ValidationArg::On => ValidationMode::On,
            ValidationArg::Off => ValidationMode::Off,
        }
    }
}

struct App {
    cfg: AppCfg,
    options: PresenterOptions,
    // session before host: the surface must go before its window
    session: Option<VkSession>,
    host: Option<WindowHost>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(cfg: AppCfg, validation: ValidationMode) -> Self {
        let options = cfg.presenter_options(validation);
        Self {
            cfg,
            options,
            session: None,
            host: None,
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let host = WindowHost::open(event_loop, &self.cfg.window_spec()).context("window")?;
        let session = VkSession::new(host.window(), host.window(), &host, &self.options)?;
        if let Some(info) = session.chain_info() {
            info!(
                "presenting {}x{} {:?} with {} images",
                info.extent.width, info.extent.height, info.present_mode, info.image_count
            );
        }
        self.session = Some(session);
        self.host = Some(host);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.session = None;
        self.host = None;
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(host) = &self.host else {
            return;
        };
        if window_id != host.window().id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.session = None;
                self.host = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                info!("Resized → {}x{}", new_size.width, new_size.height);
                let result = match &mut self.session {
                    Some(session) => session.resize(host),
                    None => Ok(()),
                };
                if let Err(e) = result {
                    let err = anyhow::Error::new(e).context("swapchain recreation");
                    self.fail(event_loop, err);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}

fn exit_with(err: anyhow::Error) -> ! {
    if let Some(stage) = err.downcast_ref::<PresentError>().map(PresentError::stage) {
        error!("presentation bootstrap failed at stage `{stage}`");
    }
    report_fatal(&err);
    std::process::exit(1);
}

fn main() {
    init_tracing();
    let args = Args::parse();
    let cfg = AppCfg::load(&args.config);

    let event_loop = match EventLoop::new() {
        Ok(el) => el,
        Err(e) => exit_with(anyhow::Error::new(e).context("event loop")),
    };

    let mut app = App::new(cfg, args.validation.into());
    if let Err(e) = event_loop.run_app(&mut app) {
        exit_with(anyhow::Error::new(e).context("event loop"));
    }
    if let Some(err) = app.failure.take() {
        exit_with(err);
    }
    info!("clean shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let args = Args::parse_from(["prism"]);
        assert_eq!(args.config, PathBuf::from("prism.toml"));
        assert_eq!(args.validation, ValidationArg::Auto);
    }

    #[test]
    fn cli_validation_maps_to_mode() {
        let args = Args::parse_from(["prism", "--validation", "off", "--config", "x.toml"]);
        assert_eq!(ValidationMode::from(args.validation), ValidationMode::Off);
        assert_eq!(args.config, PathBuf::from("x.toml"));
        assert!(Args::try_parse_from(["prism", "--validation", "maybe"]).is_err());
    }
}
