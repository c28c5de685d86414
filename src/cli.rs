// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Listing available cameras
//! - One-shot identification printed as text or JSON

use std::path::PathBuf;
use vision_ai::AnalysisResult;
use vision_ai::analysis::GeminiClient;
use vision_ai::app::identify_once;
use vision_ai::backends::camera::{MediaSource, PipeWireSource, StillImageSource};
use vision_ai::config::Config;

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let source = PipeWireSource::new()?;
    let cameras = source.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Location: {}", camera.location);
        if !camera.path.is_empty() {
            println!("      Target:   {}", camera.path);
        }
        println!();
    }

    Ok(())
}

/// Capture one still, identify it and print the result
pub fn identify(
    config: &Config,
    image: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = GeminiClient::new(&config.analysis)?;
    let runtime = tokio::runtime::Runtime::new()?;

    let (frame, result) = match image {
        Some(path) => {
            eprintln!("Using image: {}", path.display());
            runtime.block_on(identify_once(config, StillImageSource::new(path), analyzer))?
        }
        None => {
            eprintln!("Using {} camera, capturing...", config.camera_mode);
            runtime.block_on(identify_once(config, PipeWireSource::new()?, analyzer))?
        }
    };
    eprintln!(
        "Analyzed {}x{} still ({} bytes)",
        frame.width,
        frame.height,
        frame.data.len()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(result.as_ref())?);
    } else {
        print!("{}", format_result(&result));
    }
    Ok(())
}

/// Plain text rendering of a result
fn format_result(result: &AnalysisResult) -> String {
    let mut out = String::new();
    match &result.scientific_name {
        Some(scientific) => out.push_str(&format!("{} ({})\n", result.name, scientific)),
        None => out.push_str(&format!("{}\n", result.name)),
    }
    out.push_str(&format!("Category: {}\n\n", result.category));
    out.push_str(&format!("{}\n", result.description));

    if !result.attributes.is_empty() {
        out.push_str("\nAttributes:\n");
        for attribute in &result.attributes {
            out.push_str(&format!("  {}: {}\n", attribute.label, attribute.value));
        }
    }

    if !result.fun_facts.is_empty() {
        out.push_str("\nFun facts:\n");
        for fact in &result.fun_facts {
            out.push_str(&format!("  - {}\n", fact));
        }
    }
    out
}
