//! Key-value hand-off between the capture step and editor startup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde_json::{json, Map, Value};

use crate::capture::{CapturedImage, PageInfo};
use crate::dataurl::{decode_data_url, encode_png_data_url};
use crate::error::{EditorError, Result};

pub const CAPTURED_IMAGE_KEY: &str = "capturedImage";
pub const PAGE_INFO_KEY: &str = "pageInfo";

pub trait HandoffStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, entries: Map<String, Value>) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, Value>,
}

impl HandoffStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, entries: Map<String, Value>) -> Result<()> {
        self.entries.extend(entries);
        Ok(())
    }
}

/// Store kept as one JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|err| EditorError::io(&self.path, err))?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

impl HandoffStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, entries: Map<String, Value>) -> Result<()> {
        let mut all = self.read_all()?;
        all.extend(entries);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| EditorError::io(parent, err))?;
            }
        }
        let raw = serde_json::to_string_pretty(&Value::Object(all))?;
        fs::write(&self.path, raw).map_err(|err| EditorError::io(&self.path, err))
    }
}

/// Stores the captured image (as a PNG data URL) and its page metadata.
pub fn stash_capture(store: &mut dyn HandoffStore, captured: &CapturedImage) -> Result<()> {
    let mut entries = Map::new();
    entries.insert(
        CAPTURED_IMAGE_KEY.to_string(),
        json!(encode_png_data_url(&captured.png)),
    );
    entries.insert(PAGE_INFO_KEY.to_string(), serde_json::to_value(&captured.page)?);
    store.set(entries)?;
    info!(
        "stashed {}x{} capture of {}",
        captured.width, captured.height, captured.page.url
    );
    Ok(())
}

/// Reads the stashed capture back; `None` when nothing was stashed.
pub fn load_capture(store: &dyn HandoffStore) -> Result<Option<CapturedImage>> {
    let Some(image) = store.get(CAPTURED_IMAGE_KEY)? else {
        return Ok(None);
    };
    let url = image
        .as_str()
        .ok_or_else(|| EditorError::DataUrl(format!("{CAPTURED_IMAGE_KEY} is not a string")))?;
    let (_, bytes) = decode_data_url(url)?;
    let page = match store.get(PAGE_INFO_KEY)? {
        Some(value) => serde_json::from_value::<PageInfo>(value)?,
        None => PageInfo::default(),
    };
    CapturedImage::from_encoded(bytes, page).map(Some)
}
