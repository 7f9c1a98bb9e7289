use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context as _;
use image::{DynamicImage, GenericImageView};

use crate::grid::{Cell, GridMap};

/// Build a map from a black-and-white image, one pixel per cell. Dark
/// pixels become obstacles; the start and end markers stay at the
/// construction defaults.
pub fn parse_img(img: &DynamicImage) -> Result<GridMap, anyhow::Error> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    anyhow::ensure!(width > 0 && height > 0, "image must not be empty");

    let mut map = GridMap::new(height, width);
    for row in 0..height {
        for col in 0..width {
            let p = img.get_pixel(col as u32, row as u32);

            if p.0[0] < 128 {
                map.cells[row][col] = Cell::Blocked;
            }
        }
    }

    Ok(map)
}

/// Load a map from disk. A `.json` file is deserialized directly;
/// anything else is opened as an image and thresholded with
/// [`parse_img`].
pub fn load_map<P: AsRef<Path>>(path: P) -> Result<GridMap, anyhow::Error> {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == "json") {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse {}", path.display()))
    } else {
        let img =
            image::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        parse_img(&img)
    }
}

/// Save a map to disk as JSON.
pub fn save_map<P: AsRef<Path>>(path: P, map: &GridMap) -> Result<(), anyhow::Error> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), map)
        .with_context(|| format!("failed to write {}", path.display()))
}
