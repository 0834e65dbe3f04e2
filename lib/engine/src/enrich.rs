// Attachment merging and media URL normalization
use serde_json::Value;

use fabx_core::Record;
use fabx_store::{Attachment, AttachmentKind};

const IMAGE_EXTS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];

/// Label prefixed onto merged supplementary images so clients can tell
/// them apart from the record's own photos.
const MATERIAL_PREFIX: &str = "素材:";

/// The record fields holding media URL lists.
pub const IMAGE_FIELD: &str = "image_urls";
pub const REPORT_FIELD: &str = "report_urls";

/// Media fields arrive either as comma-joined strings or as arrays;
/// normalize to a trimmed list with stray backticks removed.
pub fn normalize_url_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s
            .split(',')
            .map(|item| item.trim().replace('`', ""))
            .filter(|item| !item.is_empty())
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.trim().replace('`', ""),
                other => other.to_string(),
            })
            .filter(|item| !item.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Extension check on the path part only: label prefixes and query
/// strings don't count.
fn path_part(url: &str) -> String {
    let after_label = url.rsplit(':').next().unwrap_or(url);
    let no_query = after_label.split('?').next().unwrap_or(after_label);
    no_query.to_lowercase()
}

fn is_image(url: &str) -> bool {
    let p = path_part(url);
    IMAGE_EXTS.iter().any(|ext| p.ends_with(ext))
}

fn is_pdf(url: &str) -> bool {
    path_part(url).ends_with(".pdf")
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Re-sort a record's media fields: PDFs that ended up among the images
/// move to the report list, unknown extensions stay where they were, and
/// `extra_images` (already known to be images) are appended. Both lists
/// are deduplicated and written back as arrays.
pub fn reclassify_media(record: &mut Record, extra_images: Vec<String>) {
    let current_images = normalize_url_list(record.get(IMAGE_FIELD));
    let current_reports = normalize_url_list(record.get(REPORT_FIELD));

    let mut images: Vec<String> = Vec::new();
    let mut reports = current_reports;
    for item in current_images {
        if is_pdf(&item) {
            reports.push(item);
        } else {
            // unknown extensions stay on the image side
            images.push(item);
        }
    }
    images.extend(extra_images);

    record.set(IMAGE_FIELD, Value::from(dedup(images)));
    record.set(REPORT_FIELD, Value::from(dedup(reports)));
}

/// Merge fetched attachments into the page of records.
///
/// An attachment belongs to every record whose identifier appears in its
/// name; only image attachments are merged, each tagged with the material
/// label.
pub fn merge_attachments(records: &mut [Record], attachments: &[Attachment], code_field: &str) {
    for record in records.iter_mut() {
        let code = record.text(code_field);
        let extra: Vec<String> = if code.is_empty() {
            Vec::new()
        } else {
            attachments
                .iter()
                .filter(|a| a.kind == AttachmentKind::Image && a.name.contains(&code))
                .map(|a| format!("{MATERIAL_PREFIX}{}", a.url))
                .collect()
        };
        reclassify_media(record, extra);
    }
}

/// Whether a record carries either media field.
pub fn has_media_fields(record: &Record) -> bool {
    record.get(IMAGE_FIELD).is_some() || record.get(REPORT_FIELD).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_comma_joined_strings() {
        let v = json!("/a.jpg, `/b.png` ,, /c.pdf");
        assert_eq!(
            normalize_url_list(Some(&v)),
            vec!["/a.jpg", "/b.png", "/c.pdf"]
        );
    }

    #[test]
    fn pdfs_move_to_reports() {
        let mut record = Record::from(json!({
            "code": "6228",
            "image_urls": "/a.jpg,/spec.pdf",
            "report_urls": ["/old.pdf"],
        }));
        reclassify_media(&mut record, vec![]);
        assert_eq!(record.get(IMAGE_FIELD).unwrap(), &json!(["/a.jpg"]));
        assert_eq!(
            record.get(REPORT_FIELD).unwrap(),
            &json!(["/old.pdf", "/spec.pdf"])
        );
    }

    #[test]
    fn unknown_extensions_stay_as_images() {
        let mut record = Record::from(json!({"image_urls": "/thing.bin"}));
        reclassify_media(&mut record, vec![]);
        assert_eq!(record.get(IMAGE_FIELD).unwrap(), &json!(["/thing.bin"]));
    }

    #[test]
    fn label_prefix_does_not_break_extension_check() {
        assert!(is_image("素材:/img/6228.jpg"));
        assert!(is_image("/img/6228.JPG?v=2"));
        assert!(!is_image("/doc/6228.pdf"));
    }

    #[test]
    fn attachments_merge_by_code_and_kind() {
        let mut records = vec![Record::from(json!({"code": "6228", "image_urls": []}))];
        let attachments = vec![
            Attachment {
                name: "6228 studio".into(),
                url: "/m/6228.jpg".into(),
                kind: AttachmentKind::Image,
            },
            Attachment {
                name: "6228 runway".into(),
                url: "/m/6228.mp4".into(),
                kind: AttachmentKind::Video,
            },
            Attachment {
                name: "9155 studio".into(),
                url: "/m/9155.jpg".into(),
                kind: AttachmentKind::Image,
            },
        ];
        merge_attachments(&mut records, &attachments, "code");
        assert_eq!(
            records[0].get(IMAGE_FIELD).unwrap(),
            &json!(["素材:/m/6228.jpg"])
        );
    }

    #[test]
    fn merged_lists_are_deduplicated() {
        let mut record = Record::from(json!({"image_urls": ["/a.jpg", "/a.jpg"]}));
        reclassify_media(&mut record, vec!["/a.jpg".to_string()]);
        assert_eq!(record.get(IMAGE_FIELD).unwrap(), &json!(["/a.jpg"]));
    }
}
