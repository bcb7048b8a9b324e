use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tiny_skia::Pixmap;

use crate::error::{IllustrationError, Result};
use crate::path::PathData;
use crate::types::Color;

/// Symbolic illustration identifiers, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleId {
    Hospital,
    Patient,
    Room,
    Ambulance,
    Update,
    Dashboard,
    Admission,
    Discharge,
    Search,
    Logout,
    Staff,
    Department,
    Hero,
}

impl StyleId {
    pub const ALL: [StyleId; 13] = [
        StyleId::Hospital,
        StyleId::Patient,
        StyleId::Room,
        StyleId::Ambulance,
        StyleId::Update,
        StyleId::Dashboard,
        StyleId::Admission,
        StyleId::Discharge,
        StyleId::Search,
        StyleId::Logout,
        StyleId::Staff,
        StyleId::Department,
        StyleId::Hero,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleId::Hospital => "hospital",
            StyleId::Patient => "patient",
            StyleId::Room => "room",
            StyleId::Ambulance => "ambulance",
            StyleId::Update => "update",
            StyleId::Dashboard => "dashboard",
            StyleId::Admission => "admission",
            StyleId::Discharge => "discharge",
            StyleId::Search => "search",
            StyleId::Logout => "logout",
            StyleId::Staff => "staff",
            StyleId::Department => "department",
            StyleId::Hero => "hero",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase();
        StyleId::ALL.into_iter().find(|style| style.as_str() == key)
    }

    /// Resource file stem the artwork ships under.
    pub fn base_name(&self) -> &'static str {
        match self {
            StyleId::Hospital => "hospital",
            StyleId::Patient => "patient-svgrepo-com",
            StyleId::Room => "room",
            StyleId::Ambulance => "ambulance",
            StyleId::Update => "update",
            StyleId::Dashboard => "collection-svgrepo-com",
            StyleId::Admission => "admission",
            StyleId::Discharge => "discharge",
            StyleId::Search => "search-status-svgrepo-com",
            StyleId::Logout => "logout-svgrepo-com",
            StyleId::Staff => "staff",
            StyleId::Department => "department-svgrepo-com",
            StyleId::Hero => "rod-of-asclepius-icon-512877-512",
        }
    }
}

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One drawable outline with its resolved paint.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub path: PathData,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

/// Parsed artwork: either vector shapes or a decoded bitmap.
#[derive(Clone)]
pub struct Asset {
    width: f32,
    height: f32,
    shapes: Vec<Shape>,
    raster: Option<Arc<Pixmap>>,
}

impl Asset {
    pub fn vector(width: f32, height: f32, shapes: Vec<Shape>) -> Result<Self> {
        validate_size(width, height)?;
        Ok(Self {
            width,
            height,
            shapes,
            raster: None,
        })
    }

    pub fn raster(pixmap: Pixmap) -> Result<Self> {
        let width = pixmap.width() as f32;
        let height = pixmap.height() as f32;
        validate_size(width, height)?;
        Ok(Self {
            width,
            height,
            shapes: Vec::new(),
            raster: Some(Arc::new(pixmap)),
        })
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn raster_image(&self) -> Option<&Arc<Pixmap>> {
        self.raster.as_ref()
    }

    pub fn is_raster(&self) -> bool {
        self.raster.is_some()
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("shapes", &self.shapes.len())
            .field("raster", &self.raster.is_some())
            .finish()
    }
}

fn validate_size(width: f32, height: f32) -> Result<()> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(IllustrationError::InvalidAsset { width, height })
    }
}

/// Where illustration resources are read from.
pub trait AssetSource: Send + Sync {
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Short label used in diagnostics.
    fn describe(&self) -> String;
}

/// In-memory named resources.
#[derive(Debug, Clone, Default)]
pub struct ResourceBundle {
    resources: BTreeMap<String, Vec<u8>>,
}

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.resources.insert(name.into(), data.into());
    }

    pub fn with(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.add(name, data);
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl AssetSource for ResourceBundle {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.resources
            .get(name)
            .cloned()
            .ok_or_else(|| IllustrationError::ResourceNotFound {
                name: name.to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("bundle ({} resources)", self.resources.len())
    }
}

/// Resources resolved relative to a filesystem directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for DirectorySource {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let rel = Path::new(name);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(IllustrationError::ResourceNotFound {
                name: name.to_string(),
            });
        }
        match std::fs::read(self.root.join(rel)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(IllustrationError::ResourceNotFound {
                    name: name.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}
