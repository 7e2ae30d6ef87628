//! Drive a running visualization session end to end: build the NYC taxi
//! pipeline, capture a screenshot, inspect the project state, and run
//! sample rows through the pipeline.
//!
//! Usage:
//! 1. Start the bridge server.
//! 2. Open the tool with external control enabled.
//! 3. `cargo run --example create_pipeline`

use std::time::Duration;

use serde_json::{json, Value};

use viz_control::{ControlClient, ControlConfig, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    let client = ControlClient::connect(ControlConfig::default()).await?;

    let outcome = run(&client).await;

    // Cleanup must run on failure paths too.
    println!("\nDisconnecting...");
    client.disconnect().await;

    if let Err(err) = outcome {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(client: &ControlClient) -> Result<()> {
    // ---
    println!("\nCreating data pipeline...");
    let pipeline = client.create_pipeline(pipeline_spec()).await?;
    let pipeline_id = pipeline["pipelineId"].as_str().unwrap_or_default().to_owned();
    println!("Pipeline created: {pipeline_id}");

    // Give the tool a moment to render.
    tokio::time::sleep(Duration::from_secs(2)).await;

    println!("\nCapturing visualization...");
    let screenshot = client.capture_visualization("png", 0.9).await?;
    let size = screenshot["data"].as_str().map_or(0, str::len);
    println!("Screenshot captured: {size} bytes");

    println!("\nGetting project state...");
    let project = client.get_current_project().await?;
    println!(
        "Project has {} nodes and {} edges",
        project["nodes"].as_array().map_or(0, Vec::len),
        project["edges"].as_array().map_or(0, Vec::len),
    );

    println!("\nTesting pipeline with sample data...");
    let test_result = client.test_pipeline(&pipeline_id, sample_rows()).await?;
    let verdict = if test_result["success"].as_bool().unwrap_or(false) {
        "Success"
    } else {
        "Failed"
    };
    println!("Test result: {verdict}");

    println!("\nPipeline creation complete!");
    Ok(())
}

/// NYC taxi pipeline: load CSV, filter, derive columns, scatterplot.
fn pipeline_spec() -> Value {
    // ---
    json!({
        "nodes": [
            {
                "id": "/file-loader",
                "type": "FileOp",
                "position": { "x": 100, "y": 100 },
                "data": {
                    "inputs": {
                        "url": "@/nyc-taxis.csv",
                        "format": "csv"
                    }
                }
            },
            {
                "id": "/filter",
                "type": "FilterOp",
                "position": { "x": 100, "y": 250 },
                "data": {
                    "inputs": {
                        "expression": "d.passenger_count > 2"
                    }
                }
            },
            {
                "id": "/map",
                "type": "MapOp",
                "position": { "x": 100, "y": 400 },
                "data": {
                    "inputs": {
                        "expression": "({ ...d, trip_duration_minutes: d.trip_duration / 60, speed_mph: (d.trip_distance / d.trip_duration) * 3600 })"
                    }
                }
            },
            {
                "id": "/scatterplot",
                "type": "ScatterplotLayerOp",
                "position": { "x": 100, "y": 550 },
                "data": {
                    "inputs": {
                        "getPosition": "d => [d.pickup_longitude, d.pickup_latitude]",
                        "getRadius": "d => Math.min(d.trip_duration_minutes * 10, 500)",
                        "getFillColor": "d => d.passenger_count > 3 ? [255, 0, 0] : [0, 0, 255]",
                        "opacity": 0.5
                    }
                }
            }
        ],
        "edges": [
            {
                "source": "/file-loader",
                "target": "/filter",
                "sourceHandle": "out.data",
                "targetHandle": "par.data"
            },
            {
                "source": "/filter",
                "target": "/map",
                "sourceHandle": "out.result",
                "targetHandle": "par.data"
            },
            {
                "source": "/map",
                "target": "/scatterplot",
                "sourceHandle": "out.result",
                "targetHandle": "par.data"
            }
        ]
    })
}

fn sample_rows() -> Value {
    // ---
    json!([
        {
            "pickup_longitude": -73.98,
            "pickup_latitude": 40.75,
            "passenger_count": 3,
            "trip_duration": 600,
            "trip_distance": 2.5
        },
        {
            "pickup_longitude": -73.97,
            "pickup_latitude": 40.76,
            "passenger_count": 4,
            "trip_duration": 900,
            "trip_distance": 3.2
        }
    ])
}
