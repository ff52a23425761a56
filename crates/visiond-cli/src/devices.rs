// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Maverick Contributors

//! Capability dump of every V4L2 node, as the detection logic sees it.

use crate::error::CliError;
use clap::Args as ClapArgs;
use serde::Serialize;
use visiond::format::{detect_stream_format, StreamFormat};
use visiond::v4l2::{DeviceCapability, DeviceEnumerator, DeviceNode, DeviceProbe, V4l2Query};

#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Show only devices whose first input is a camera
    #[arg(long)]
    cameras: bool,

    /// Show controls in addition to inputs and formats
    #[arg(long)]
    controls: bool,
}

#[derive(Debug, Serialize)]
struct DevicesOutput {
    devices: Vec<DeviceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hardware_encoder: Option<DeviceNode>,
}

#[derive(Debug, Serialize)]
struct DeviceReport {
    path: DeviceNode,
    camera: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_format: Option<StreamFormat>,
    capability: DeviceCapability,
}

pub fn execute(args: Args, json: bool) -> Result<(), CliError> {
    log::debug!("Executing devices command: {:?}", args);

    let query = V4l2Query::new();
    let enumerator = DeviceEnumerator::new(&query);
    let probe = DeviceProbe::new(&query);

    let devices: Vec<DeviceReport> = enumerator
        .nodes()
        .into_iter()
        .filter_map(|node| {
            let camera = probe.is_camera(&node);
            if args.cameras && !camera {
                return None;
            }
            let capability = probe.capability(&node);
            Some(DeviceReport {
                stream_format: camera.then(|| detect_stream_format(&capability)).flatten(),
                path: node,
                camera,
                capability,
            })
        })
        .collect();

    let output = DevicesOutput {
        devices,
        hardware_encoder: enumerator.find_hardware_encoder(),
    };

    if json {
        let json_str = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e)))?;
        println!("{}", json_str);
    } else {
        print_human_readable(&output, args.controls);
    }

    Ok(())
}

fn print_human_readable(output: &DevicesOutput, show_controls: bool) {
    if output.devices.is_empty() {
        println!("No V4L2 devices found");
    }

    for report in &output.devices {
        let capability = &report.capability;
        println!(
            "{}{}",
            report.path,
            if report.camera { " (camera)" } else { "" }
        );
        println!("  Driver: {}", capability.driver());
        println!("  Card:   {}", capability.card());

        for input in capability.inputs() {
            println!("  Input {}: {} ({})", input.index, input.name, input.input_type);
        }

        if !capability.formats().is_empty() {
            println!("  Formats:");
            for format in capability.formats() {
                println!("    {}", format);
            }
        }

        if show_controls && !capability.controls().is_empty() {
            println!("  Controls:");
            for control in capability.controls() {
                println!(
                    "    {} [{}..{}] default {}",
                    control.name, control.minimum, control.maximum, control.default_value
                );
            }
        }

        if let Some(format) = report.stream_format {
            println!("  Detected stream format: {}", format);
        }
        println!();
    }

    match &output.hardware_encoder {
        Some(node) => println!("Hardware encoder: {}", node),
        None => println!("Hardware encoder: none"),
    }
}
