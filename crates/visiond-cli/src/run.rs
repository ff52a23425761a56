// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! The daemon: configuration, supervisor and signal handling.

use crate::error::CliError;
use crate::utils::install_signal_handler;
use clap::Args as ClapArgs;
use serde::Serialize;
use std::path::PathBuf;
use visiond::config::Config;
use visiond::engine::GstEngine;
use visiond::format::{Encoder, PixelFormat, StreamFormat};
use visiond::pipeline::OutputSink;
use visiond::supervisor::Supervisor;
use visiond::v4l2::V4l2Query;

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// JSON configuration file; command-line flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Literal GStreamer pipeline, disables autodetection
    #[arg(long)]
    pipeline_override: Option<String>,

    /// Camera device (autodetected if not set)
    #[arg(short = 'd', long)]
    camera_device: Option<String>,

    /// Stream format requested from the camera (yuv, mjpeg, h264)
    #[arg(short, long)]
    format: Option<StreamFormat>,

    /// Encoder (h264, omx, mfc, vaapi, nvenc or a GStreamer element name)
    #[arg(short, long)]
    encoder: Option<Encoder>,

    /// Raw pixel format (YUY2, I420, ...)
    #[arg(long)]
    pixelformat: Option<PixelFormat>,

    /// Frame width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Frame height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Frames per second
    #[arg(long)]
    framerate: Option<u32>,

    /// Camera brightness control value
    #[arg(long, allow_negative_numbers = true)]
    brightness: Option<i32>,

    /// Output sink (udp, rtsp, file)
    #[arg(short, long)]
    output: Option<OutputSink>,

    /// Output host, RTSP server or file path
    #[arg(long)]
    output_dest: Option<String>,

    /// Output port for udp and rtsp
    #[arg(long)]
    output_port: Option<u16>,

    /// Seconds between pipeline construction attempts (default 30)
    #[arg(long)]
    retry: Option<u64>,

    /// GStreamer debug level (1 = error .. 9 = memdump)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
    debug: Option<u32>,

    /// Run detection once and print the pipeline instead of starting it
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    /// Reject flag values that can never produce a pipeline.
    fn validate(&self) -> Result<(), CliError> {
        let sizes = [
            ("--width", self.width),
            ("--height", self.height),
            ("--framerate", self.framerate),
        ];
        for (flag, value) in sizes {
            if value == Some(0) {
                return Err(CliError::InvalidArgs(format!("{} must be positive", flag)));
            }
        }
        if self.output_port == Some(0) {
            return Err(CliError::InvalidArgs("--output-port must not be 0".into()));
        }
        Ok(())
    }

    /// Values given on the command line, as a config overlay.
    fn overlay(&self) -> Config {
        Config {
            pipeline_override: self.pipeline_override.clone(),
            camera_device: self.camera_device.clone(),
            format: self.format,
            encoder: self.encoder.clone(),
            pixelformat: self.pixelformat.clone(),
            width: self.width,
            height: self.height,
            framerate: self.framerate,
            brightness: self.brightness,
            output: self.output,
            output_dest: self.output_dest.clone(),
            output_port: self.output_port,
            retry: self.retry,
            debug: self.debug,
        }
    }

    fn load_config(&self) -> Result<Config, CliError> {
        let base = match &self.config {
            Some(path) => {
                log::info!("Loading config file: {}", path.display());
                Config::from_file(path).map_err(|e| {
                    CliError::Configuration(format!("{}: {}", path.display(), e))
                })?
            }
            None => Config::default(),
        };
        Ok(base.merge(self.overlay()))
    }
}

#[derive(Debug, Serialize)]
struct DryRunOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    camera_device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_format: Option<StreamFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pixel_format: Option<PixelFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoder: Option<Encoder>,
    pipeline: String,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing run command: {:?}", args);

    args.validate()?;
    let config = args.load_config()?;
    log::debug!("Effective configuration: {:?}", config);

    if args.dry_run {
        return dry_run(config, json);
    }

    let term = install_signal_handler()?;
    let engine = GstEngine::new(config.debug);
    let mut supervisor =
        Supervisor::new(config, V4l2Query::new(), engine).with_termination(term);

    supervisor.run()?;
    Ok(())
}

fn dry_run(config: Config, json: bool) -> Result<(), CliError> {
    let output = match config.pipeline_override.as_deref() {
        Some(pipeline) if pipeline.trim().is_empty() => {
            return Err(CliError::Configuration(
                "manual construction requested but pipeline_override is empty".into(),
            ));
        }
        Some(pipeline) => DryRunOutput {
            camera_device: None,
            stream_format: None,
            pixel_format: None,
            encoder: None,
            pipeline: pipeline.to_string(),
        },
        None => {
            let supervisor = Supervisor::new(config, V4l2Query::new(), GstEngine::default());
            let resolved = supervisor.resolve()?;
            DryRunOutput {
                camera_device: Some(resolved.camera_device().to_string()),
                stream_format: Some(resolved.stream_format()),
                pixel_format: Some(resolved.pixel_format().clone()),
                encoder: Some(resolved.encoder().clone()),
                pipeline: resolved.launch_description(),
            }
        }
    };

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        println!("{}", output.pipeline);
    }
    Ok(())
}
