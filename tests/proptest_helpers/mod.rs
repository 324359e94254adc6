#![allow(dead_code)]

use std::fmt::Write as _;

use gtdraw::annotation::BoundingBox;
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// An ordered box (min < max on both axes) inside a `width` x `height` image.
pub fn arb_bbox_within(width: i32, height: i32) -> BoxedStrategy<BoundingBox> {
    (0..width - 1, 0..height - 1)
        .prop_flat_map(move |(xmin, ymin)| {
            (
                Just(xmin),
                Just(ymin),
                (xmin + 1)..width,
                (ymin + 1)..height,
            )
        })
        .prop_map(|(xmin, ymin, xmax, ymax)| BoundingBox::new(xmin, ymin, xmax, ymax))
        .boxed()
}

pub fn arb_boxes(max_boxes: usize) -> BoxedStrategy<Vec<BoundingBox>> {
    proptest::collection::vec(arb_bbox_within(4096, 4096), 0..=max_boxes).boxed()
}

/// Whitespace that may surround a coordinate value.
pub fn arb_padding() -> BoxedStrategy<String> {
    proptest::string::string_regex("[ \t\n]{0,3}")
        .expect("valid padding regex")
        .boxed()
}

/// Serialize boxes in a VOC-like document, one `<object>` per box.
pub fn boxes_to_xml(boxes: &[BoundingBox], padding: &str) -> String {
    let mut xml = String::from("<annotation>\n  <filename>sample.jpg</filename>\n");
    for bbox in boxes {
        write!(
            xml,
            "  <object><name>item</name><truncated>0</truncated><bndbox>\
<xmin>{p}{}{p}</xmin><ymin>{p}{}{p}</ymin><xmax>{p}{}{p}</xmax><ymax>{p}{}{p}</ymax>\
</bndbox></object>\n",
            bbox.xmin,
            bbox.ymin,
            bbox.xmax,
            bbox.ymax,
            p = padding
        )
        .expect("write to string");
    }
    xml.push_str("</annotation>\n");
    xml
}
