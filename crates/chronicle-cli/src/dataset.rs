//! Local data files for bulk ingest and the demo
//!
//! - documents.json: `[{"id": ..., "text": ...}]`
//! - metadata.json: one metadata object per document, same order
//! - images directory: every png/jpg/jpeg/gif/bmp file
//! - sample_queries.json: `[{"query": ...}]`

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    id: Option<Value>,
    text: String,
}

#[derive(Debug, Deserialize)]
struct SampleQuery {
    query: String,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
}

/// Pair each document with its metadata entry into an ingest item
pub fn load_documents(documents: &Path, metadata: &Path) -> Result<Vec<Map<String, Value>>> {
    let documents: Vec<Document> = read_json(documents)?;
    let metadata: Vec<Map<String, Value>> = read_json(metadata)?;
    pair_documents(documents, metadata)
}

fn pair_documents(
    documents: Vec<Document>,
    metadata: Vec<Map<String, Value>>,
) -> Result<Vec<Map<String, Value>>> {
    if documents.len() != metadata.len() {
        bail!(
            "{} documents but {} metadata entries",
            documents.len(),
            metadata.len()
        );
    }

    Ok(documents
        .into_iter()
        .zip(metadata)
        .map(|(doc, mut item)| {
            item.entry("type").or_insert_with(|| json!("text"));
            if let Some(id) = doc.id {
                item.insert("id".to_string(), id);
            }
            item.insert("text".to_string(), Value::String(doc.text));
            item
        })
        .collect())
}

/// One image item per supported file in `dir`, sorted by file name
pub fn load_images(dir: &Path) -> Result<Vec<Map<String, Value>>> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {:?}", dir))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_image(name))
        .collect();
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| {
            let path = dir.join(&name).to_string_lossy().into_owned();
            image_item(&name, &path)
        })
        .collect())
}

fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Placeholder metadata for images that arrive without any
fn image_item(name: &str, path: &str) -> Map<String, Value> {
    let value = json!({
        "id": name,
        "image_path": path,
        "department": "Unknown",
        "date": "2024-01-01",
        "outcome": "unknown",
        "type": "image",
        "tags": []
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn load_queries(path: &Path) -> Result<Vec<String>> {
    let queries: Vec<SampleQuery> = read_json(path)?;
    Ok(queries.into_iter().map(|q| q.query).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: Option<Value>, text: &str) -> Document {
        Document {
            id,
            text: text.to_string(),
        }
    }

    fn meta(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_pair_documents_merges_metadata() {
        let items = pair_documents(
            vec![doc(Some(json!(7)), "Levee inspection found erosion")],
            vec![meta(json!({
                "department": "Public Works",
                "date": "2018-03-02",
                "outcome": "failure"
            }))],
        )
        .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["text"], "Levee inspection found erosion");
        assert_eq!(items[0]["id"], 7);
        assert_eq!(items[0]["type"], "text");
        assert_eq!(items[0]["department"], "Public Works");
    }

    #[test]
    fn test_pair_documents_keeps_explicit_type() {
        let items = pair_documents(
            vec![doc(None, "Scanned permit")],
            vec![meta(json!({"type": "image"}))],
        )
        .unwrap();
        assert_eq!(items[0]["type"], "image");
        assert!(items[0].get("id").is_none());
    }

    #[test]
    fn test_pair_documents_rejects_length_mismatch() {
        let result = pair_documents(vec![doc(None, "a"), doc(None, "b")], vec![Map::new()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_is_image_by_extension() {
        assert!(is_image("route.PNG"));
        assert!(is_image("levee.jpeg"));
        assert!(!is_image("notes.txt"));
        assert!(!is_image("README"));
    }

    #[test]
    fn test_load_images_uses_placeholder_metadata() {
        let dir = std::env::temp_dir().join(format!("chronicle-cli-images-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.png"), b"png").unwrap();
        fs::write(dir.join("a.jpg"), b"jpg").unwrap();
        fs::write(dir.join("skip.txt"), b"txt").unwrap();

        let items = load_images(&dir).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], "a.jpg");
        assert_eq!(items[1]["id"], "b.png");
        assert_eq!(items[0]["department"], "Unknown");
        assert_eq!(items[0]["date"], "2024-01-01");
        assert_eq!(items[0]["type"], "image");
        assert!(items[0]["image_path"].as_str().unwrap().ends_with("a.jpg"));
    }
}
