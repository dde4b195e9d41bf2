//! Render demo - builds a small board in a temp directory and renders it

use pixelboard::update::{MemorySource, PixelUpdateRequest};
use pixelboard::{BoardConfig, GridStore, Pipeline};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let dir = std::env::temp_dir().join("pixelboard-demo");
    std::fs::create_dir_all(&dir)?;
    let grid_path = dir.join("grid.json");
    let png_path = dir.join("grid.png");

    GridStore::new(&grid_path).init(16, 8, true)?;

    // A small smiley, plus one update that is out of bounds and gets skipped
    let mut source = MemorySource::new();
    for (x, y) in [(5, 2), (10, 2), (4, 5), (5, 6), (6, 6), (7, 6), (8, 6), (9, 6), (10, 6), (11, 5)] {
        source.push(format!("{x}-{y}.json"), PixelUpdateRequest::new(x, y, "#ffcc00"));
    }
    source.push("stray.json", PixelUpdateRequest::new(16, 0, "#000000"));

    let pipeline = Pipeline::new(BoardConfig::default(), &grid_path, &png_path)?;
    let report = pipeline.run(&mut source)?;

    println!(
        "Applied {}, rejected {}; image written to {}",
        report.summary.applied,
        report.summary.rejected.len(),
        png_path.display()
    );
    if let Some(snapshot) = report.snapshot {
        println!("{}x{} px, sha256 {}", snapshot.width, snapshot.height, snapshot.digest());
    }

    Ok(())
}
