//! Per-image XML annotation reader.
//!
//! Every image `NNNNN.jpg` pairs with `NNNNN.xml` in the annotations
//! directory. Only the `object/bndbox` subset of the Pascal VOC layout is
//! consumed; other tags and attributes are ignored.

mod bbox;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;
use serde::Serialize;

pub use bbox::BoundingBox;

use crate::error::GtDrawError;

const ANNOTATION_EXTENSION: &str = "xml";

/// The ordered boxes parsed from one annotation document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Annotation {
    /// Boxes in document order.
    pub boxes: Vec<BoundingBox>,
}

impl Annotation {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundingBox> {
        self.boxes.iter()
    }
}

/// Path of the annotation file for an image stem.
///
/// The extension is appended rather than substituted so that stems
/// containing dots (`frame.001`) keep their full name.
pub fn annotation_path(annotations_dir: &Path, stem: &str) -> PathBuf {
    annotations_dir.join(format!("{stem}.{ANNOTATION_EXTENSION}"))
}

/// Read and parse the annotation for `stem` from `annotations_dir`.
///
/// Fails with [`GtDrawError::AnnotationNotFound`] when the XML file is
/// absent and [`GtDrawError::MalformedAnnotation`] when it cannot be
/// interpreted as a list of boxes.
pub fn read_annotation(annotations_dir: &Path, stem: &str) -> Result<Annotation, GtDrawError> {
    let path = annotation_path(annotations_dir, stem);
    if !path.is_file() {
        return Err(GtDrawError::AnnotationNotFound { path });
    }

    let bytes = fs::read(&path).map_err(GtDrawError::Io)?;
    let xml = std::str::from_utf8(&bytes).map_err(|source| GtDrawError::MalformedAnnotation {
        path: path.clone(),
        message: format!("file is not valid UTF-8: {source}"),
    })?;

    parse_annotation_str(xml, &path)
}

/// Parse an annotation document held in memory.
///
/// `path` is only used to label errors.
pub fn parse_annotation_str(xml: &str, path: &Path) -> Result<Annotation, GtDrawError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| GtDrawError::MalformedAnnotation {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let boxes = document
        .root_element()
        .children()
        .filter(|node| is_element_named(node, "object"))
        .enumerate()
        .map(|(index, object)| {
            let bndbox = single_bndbox(object, index + 1, path)?;
            parse_bndbox(bndbox, index + 1, path)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Annotation { boxes })
}

/// Parse an annotation document from bytes.
///
/// The input must be valid UTF-8. This is the entry point used by the fuzz
/// target and benchmarks.
pub fn from_annotation_xml_slice(bytes: &[u8]) -> Result<Annotation, GtDrawError> {
    let path = Path::new("<memory>");
    let xml = std::str::from_utf8(bytes).map_err(|source| GtDrawError::MalformedAnnotation {
        path: path.to_path_buf(),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    parse_annotation_str(xml, path)
}

fn single_bndbox<'a, 'input>(
    object: Node<'a, 'input>,
    ordinal: usize,
    path: &Path,
) -> Result<Node<'a, 'input>, GtDrawError> {
    let mut candidates = object
        .children()
        .filter(|node| is_element_named(node, "bndbox"));

    match (candidates.next(), candidates.next()) {
        (Some(bndbox), None) => Ok(bndbox),
        (None, _) => Err(malformed(
            path,
            format!("missing <bndbox> in <object> #{ordinal}"),
        )),
        (Some(_), Some(_)) => Err(malformed(
            path,
            format!("multiple <bndbox> elements in <object> #{ordinal}; expected exactly one"),
        )),
    }
}

fn parse_bndbox(
    bndbox: Node<'_, '_>,
    ordinal: usize,
    path: &Path,
) -> Result<BoundingBox, GtDrawError> {
    let fields = last_child_texts(bndbox);

    let coordinate = |tag: &str| -> Result<i32, GtDrawError> {
        let raw = fields.get(tag).ok_or_else(|| {
            malformed(
                path,
                format!("missing <{tag}> in <bndbox> of <object> #{ordinal}"),
            )
        })?;
        raw.parse::<i32>().map_err(|_| {
            malformed(
                path,
                format!(
                    "invalid <{tag}> value '{raw}' in <bndbox> of <object> #{ordinal}; expected integer"
                ),
            )
        })
    };

    let bbox = BoundingBox::new(
        coordinate("xmin")?,
        coordinate("ymin")?,
        coordinate("xmax")?,
        coordinate("ymax")?,
    );

    if !bbox.is_ordered() {
        return Err(malformed(
            path,
            format!(
                "box {bbox} in <object> #{ordinal} is empty or inverted; expected xmin < xmax and ymin < ymax"
            ),
        ));
    }

    Ok(bbox)
}

/// Text of each child element keyed by tag name; a repeated tag keeps its last value.
///
/// Comments and processing instructions inside an element are skipped, so
/// `<xmin>1<!-- -->0</xmin>` reads as `10`.
fn last_child_texts(node: Node<'_, '_>) -> BTreeMap<String, String> {
    node.children()
        .filter(|child| child.is_element())
        .fold(BTreeMap::new(), |mut fields, child| {
            let text: String = child
                .children()
                .filter(|part| part.is_text())
                .filter_map(|part| part.text())
                .collect();
            fields.insert(child.tag_name().name().to_owned(), text.trim().to_owned());
            fields
        })
}

fn is_element_named(node: &Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && node.tag_name().name() == tag
}

fn malformed(path: &Path, message: String) -> GtDrawError {
    GtDrawError::MalformedAnnotation {
        path: path.to_path_buf(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Result<Annotation, GtDrawError> {
        parse_annotation_str(xml, Path::new("sample.xml"))
    }

    fn malformed_message(result: Result<Annotation, GtDrawError>) -> String {
        match result {
            Err(GtDrawError::MalformedAnnotation { message, .. }) => message,
            other => panic!("expected MalformedAnnotation, got {other:?}"),
        }
    }

    #[test]
    fn parses_boxes_in_document_order() {
        let xml = r#"<annotation>
  <filename>00001.jpg</filename>
  <object>
    <name>kangaroo</name>
    <bndbox><xmin>233</xmin><ymin>89</ymin><xmax>386</xmax><ymax>262</ymax></bndbox>
  </object>
  <object>
    <name>kangaroo</name>
    <bndbox><xmin>10</xmin><ymin>20</ymin><xmax>30</xmax><ymax>40</ymax></bndbox>
  </object>
</annotation>"#;

        let annotation = parse(xml).expect("parse xml");
        assert_eq!(
            annotation.boxes,
            vec![
                BoundingBox::new(233, 89, 386, 262),
                BoundingBox::new(10, 20, 30, 40),
            ]
        );
    }

    #[test]
    fn repeated_coordinate_tag_keeps_last_value() {
        let xml = r#"<annotation><object><bndbox>
  <xmin>1</xmin><ymin>2</ymin><xmax>30</xmax><ymax>40</ymax>
  <xmin>5</xmin>
</bndbox></object></annotation>"#;

        let annotation = parse(xml).expect("parse xml");
        assert_eq!(annotation.boxes, vec![BoundingBox::new(5, 2, 30, 40)]);
    }

    #[test]
    fn comment_inside_coordinate_joins_text() {
        let xml = "<annotation><object><bndbox><xmin>1<!--x-->0</xmin><ymin>2</ymin><xmax>5<!-- tens -->0</xmax><ymax>40</ymax></bndbox></object></annotation>";
        let annotation = parse(xml).expect("parse xml");
        assert_eq!(annotation.boxes, vec![BoundingBox::new(10, 2, 50, 40)]);
    }

    #[test]
    fn zero_objects_yields_empty_annotation() {
        let xml = "<annotation><filename>a.jpg</filename><size><width>4</width></size></annotation>";
        let annotation = parse(xml).expect("parse xml");
        assert!(annotation.is_empty());
    }

    #[test]
    fn ignores_unrelated_tags_and_trims_whitespace() {
        let xml = r#"<annotation><object difficult="1">
  <pose>Unspecified</pose>
  <bndbox>
    <xmin> 10 </xmin>
    <ymin>
      12
    </ymin>
    <xmax>50</xmax>
    <ymax>60</ymax>
    <note>ignored</note>
  </bndbox>
</object></annotation>"#;

        let annotation = parse(xml).expect("parse xml");
        assert_eq!(annotation.boxes, vec![BoundingBox::new(10, 12, 50, 60)]);
    }

    #[test]
    fn missing_coordinate_is_malformed() {
        let xml = "<annotation><object><bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax></bndbox></object></annotation>";
        let message = malformed_message(parse(xml));
        assert!(message.contains("missing <ymax>"), "{message}");
    }

    #[test]
    fn non_integer_coordinate_is_malformed() {
        let xml = "<annotation><object><bndbox><xmin>1.5</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox></object></annotation>";
        let message = malformed_message(parse(xml));
        assert!(message.contains("invalid <xmin> value '1.5'"), "{message}");
    }

    #[test]
    fn object_without_bndbox_is_malformed() {
        let xml = "<annotation><object><name>cat</name></object></annotation>";
        let message = malformed_message(parse(xml));
        assert!(message.contains("missing <bndbox>"), "{message}");
    }

    #[test]
    fn object_with_two_bndboxes_is_malformed() {
        let xml = r#"<annotation><object>
  <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>
  <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>
</object></annotation>"#;
        let message = malformed_message(parse(xml));
        assert!(message.contains("multiple <bndbox>"), "{message}");
    }

    #[test]
    fn inverted_box_is_malformed() {
        let xml = "<annotation><object><bndbox><xmin>50</xmin><ymin>2</ymin><xmax>10</xmax><ymax>4</ymax></bndbox></object></annotation>";
        let message = malformed_message(parse(xml));
        assert!(message.contains("empty or inverted"), "{message}");
    }

    #[test]
    fn invalid_xml_is_malformed() {
        let message = malformed_message(parse("<annotation><object>"));
        assert!(!message.is_empty());
    }

    #[test]
    fn annotation_path_appends_extension() {
        let dir = Path::new("annots");
        assert_eq!(annotation_path(dir, "00001"), dir.join("00001.xml"));
        assert_eq!(annotation_path(dir, "frame.001"), dir.join("frame.001.xml"));
    }

    #[test]
    fn read_annotation_reports_missing_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = read_annotation(temp.path(), "00001").unwrap_err();
        match err {
            GtDrawError::AnnotationNotFound { path } => {
                assert_eq!(path, temp.path().join("00001.xml"));
            }
            other => panic!("expected AnnotationNotFound, got {other:?}"),
        }
    }

    #[test]
    fn slice_parser_rejects_invalid_utf8() {
        let message = malformed_message(from_annotation_xml_slice(&[0xff, 0xfe, 0x00]));
        assert!(message.contains("UTF-8"), "{message}");
    }
}
