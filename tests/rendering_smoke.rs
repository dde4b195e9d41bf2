use pixelboard::rendering::{encode_png, rasterize};
use pixelboard::update::{merge, MemorySource, PixelUpdateRequest};
use pixelboard::{BoardConfig, Grid, Origin};

const S: u32 = 20;

fn no_labels() -> BoardConfig {
    BoardConfig { labels: false, ..Default::default() }
}

fn scenario_grid() -> Grid {
    let mut grid = Grid::new(2, 2);
    let mut source = MemorySource::new()
        .with("red.json", PixelUpdateRequest::new(0, 0, "#ff0000"))
        .with("green.json", PixelUpdateRequest::new(1, 1, "#00ff00"));
    merge(&mut grid, &mut source, Origin::Zero).unwrap();
    grid
}

#[test]
fn two_by_two_scenario() {
    let grid = scenario_grid();
    let pixels = serde_json::to_value(&grid).unwrap()["pixels"].clone();
    assert_eq!(pixels, serde_json::json!({"0,0": "#ff0000", "1,1": "#00ff00"}));

    let img = rasterize(&grid, &no_labels(), None).unwrap();
    assert_eq!(img.dimensions(), (2 * S, 2 * S));

    // block interiors; gridlines sit on the block edges
    for (x, y) in [(1, 1), (S / 2, S / 2), (S - 2, S - 2)] {
        assert_eq!(img.get_pixel(x, y).0, [255, 0, 0, 255], "red at {x},{y}");
        assert_eq!(img.get_pixel(x + S, y + S).0, [0, 255, 0, 255], "green at {x},{y}");
        assert_eq!(img.get_pixel(x + S, y).0, [0, 0, 0, 0], "clear at {},{y}", x + S);
        assert_eq!(img.get_pixel(x, y + S).0, [0, 0, 0, 0], "clear at {x},{}", y + S);
    }
}

#[test]
fn empty_board_has_n_plus_one_gridlines_each_way() {
    let img = rasterize(&Grid::new(2, 2), &no_labels(), None).unwrap();

    let vertical: Vec<u32> = (0..2 * S).filter(|&x| img.get_pixel(x, 5).0[3] > 0).collect();
    let horizontal: Vec<u32> = (0..2 * S).filter(|&y| img.get_pixel(5, y).0[3] > 0).collect();
    assert_eq!(vertical, [0, S, 2 * S - 1]);
    assert_eq!(horizontal, [0, S, 2 * S - 1]);
    assert_eq!(img.get_pixel(S, 5).0, [0, 0, 0, 64]);
}

#[test]
fn encoded_png_keeps_transparency() {
    let img = rasterize(&scenario_grid(), &no_labels(), None).unwrap();
    let png = encode_png(&img).unwrap();
    assert_eq!(&png[0..8], b"\x89PNG\r\n\x1a\n");

    let decoded = image::load_from_memory(&png).unwrap();
    assert!(decoded.color().has_alpha());
    let decoded = decoded.to_rgba8();
    assert_eq!(decoded.get_pixel(S + 5, 5).0, [0, 0, 0, 0]);
    assert_eq!(decoded, img);
}

#[cfg(feature = "labels")]
#[test]
fn labels_from_an_explicit_font_reach_the_image() {
    let cfg = BoardConfig {
        font_path: Some(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSansMono.ttf").into()),
        ..Default::default()
    };
    let snapshot = pixelboard::rendering::render(&Grid::new(2, 2), &cfg).unwrap();
    let labelled = image::load_from_memory(&snapshot.png_data).unwrap().to_rgba8();
    let plain = rasterize(&Grid::new(2, 2), &no_labels(), None).unwrap();

    // the "0" column label sits in the top-left cell, away from the gridlines
    let inked = (1..S).flat_map(|x| (1..S).map(move |y| (x, y))).any(|(x, y)| {
        labelled.get_pixel(x, y).0[3] > 0 && plain.get_pixel(x, y).0[3] == 0
    });
    assert!(inked, "no label ink in the first cell");
    assert_ne!(labelled, plain);
}
