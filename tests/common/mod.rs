#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use gtdraw::dataset::DatasetLayout;
use image::{Rgb, RgbImage};

pub const WHITE: [u8; 3] = [255, 255, 255];

pub fn write_solid_jpeg(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_pixel(width, height, Rgb(color))
        .save(path)
        .expect("write jpeg file");
}

pub fn annotation_xml(boxes: &[(i32, i32, i32, i32)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<annotation>\n  <folder>images</folder>\n");
    for (xmin, ymin, xmax, ymax) in boxes {
        writeln!(
            xml,
            "  <object>\n    <name>kangaroo</name>\n    <bndbox>\n      <xmin>{xmin}</xmin>\n      <ymin>{ymin}</ymin>\n      <xmax>{xmax}</xmax>\n      <ymax>{ymax}</ymax>\n    </bndbox>\n  </object>"
        )
        .expect("write to string");
    }
    xml.push_str("</annotation>\n");
    xml
}

pub fn write_annotation(dir: &Path, stem: &str, boxes: &[(i32, i32, i32, i32)]) {
    fs::create_dir_all(dir).expect("create annotations dir");
    fs::write(dir.join(format!("{stem}.xml")), annotation_xml(boxes)).expect("write xml file");
}

/// Create `images/` and `annots/` under `root` with one white image per
/// entry; `None` boxes means no annotation file is written.
pub fn create_dataset(
    root: &Path,
    entries: &[(&str, Option<Vec<(i32, i32, i32, i32)>>)],
) -> DatasetLayout {
    let layout = DatasetLayout::from_root(root);
    fs::create_dir_all(&layout.images_dir).expect("create images dir");
    fs::create_dir_all(&layout.annotations_dir).expect("create annotations dir");

    for (stem, boxes) in entries {
        write_solid_jpeg(&layout.images_dir.join(format!("{stem}.jpg")), 100, 100, WHITE);
        if let Some(boxes) = boxes {
            write_annotation(&layout.annotations_dir, stem, boxes);
        }
    }
    layout
}

/// Mean of the three channels at (x, y).
pub fn luma(image: &RgbImage, x: u32, y: u32) -> u32 {
    let Rgb([r, g, b]) = *image.get_pixel(x, y);
    (u32::from(r) + u32::from(g) + u32::from(b)) / 3
}
