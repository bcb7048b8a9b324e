mod assets;
mod canvas;
mod catalog;
mod debug;
mod error;
mod path;
pub mod raster;
mod render;
mod style;
mod svg;
mod theme;
mod types;

pub use assets::{Asset, AssetSource, DirectorySource, ResourceBundle, Shape, StyleId};
pub use canvas::{Canvas, Command, Paint};
pub use catalog::{Catalog, CatalogOptions};
use debug::DebugLogger;
pub use error::{IllustrationError, Result};
pub use path::{Matrix, PathData, PathError, PathSeg, interpret_path_data};
pub use render::{DEFAULT_MARGIN, RenderOptions, fit_transform, render_asset};
pub use style::{
    DEFAULT_STROKE_WIDTH, ResolvedStyle, decode_hex_color, harmonize_fill, harmonize_stroke,
    resolve_style,
};
pub use svg::{FALLBACK_SIZE, parse_document};
pub use theme::Theme;
pub use types::{Color, Size};

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Resource prefix used when artwork is supplied as an in-memory bundle.
pub const BUNDLE_PREFIX: &str = "illustrations/";

/// Illustration context: one lazily built catalog plus theme and layout settings.
pub struct Illustrations {
    source: Arc<dyn AssetSource>,
    catalog_options: CatalogOptions,
    render_options: RenderOptions,
    catalog: OnceLock<CatalogOutcome>,
}

// Failures kept from the single catalog build.
type CatalogOutcome = std::result::Result<Arc<Catalog>, Vec<String>>;

pub struct IllustrationsBuilder {
    source: Option<Arc<dyn AssetSource>>,
    default_prefix: &'static str,
    prefix: Option<String>,
    theme: Theme,
    margin: f32,
    debug_path: Option<PathBuf>,
}

impl Illustrations {
    pub fn builder() -> IllustrationsBuilder {
        IllustrationsBuilder::new()
    }

    /// The catalog, built exactly once on first use and shared afterwards.
    ///
    /// Concurrent callers wait for the one build in progress. An empty catalog is remembered
    /// and reported on every later call without touching the resources again.
    pub fn catalog(&self) -> Result<Arc<Catalog>> {
        let outcome = self.catalog.get_or_init(|| {
            match Catalog::load(self.source.as_ref(), &self.catalog_options) {
                Ok(catalog) => Ok(Arc::new(catalog)),
                Err(IllustrationError::EmptyCatalog { failures }) => Err(failures),
                Err(other) => Err(vec![other.to_string()]),
            }
        });
        match outcome {
            Ok(catalog) => Ok(Arc::clone(catalog)),
            Err(failures) => Err(IllustrationError::EmptyCatalog {
                failures: failures.clone(),
            }),
        }
    }

    /// Whether `style` has its own artwork rather than the fallback.
    pub fn has_asset(&self, style: StyleId) -> Result<bool> {
        Ok(self.catalog()?.has_asset(style))
    }

    pub fn renderer(&self, style: StyleId) -> Result<IllustrationRenderer> {
        Ok(IllustrationRenderer {
            catalog: self.catalog()?,
            style,
            theme: self.catalog_options.theme,
            options: self.render_options,
        })
    }

    pub fn theme(&self) -> &Theme {
        &self.catalog_options.theme
    }

    pub fn render_options(&self) -> RenderOptions {
        self.render_options
    }
}

impl IllustrationsBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            default_prefix: BUNDLE_PREFIX,
            prefix: None,
            theme: Theme::default(),
            margin: DEFAULT_MARGIN,
            debug_path: None,
        }
    }

    /// Reads artwork files directly from `dir`.
    pub fn resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source = Some(Arc::new(DirectorySource::new(dir)));
        self.default_prefix = "";
        self
    }

    pub fn bundle(mut self, bundle: ResourceBundle) -> Self {
        self.source = Some(Arc::new(bundle));
        self.default_prefix = BUNDLE_PREFIX;
        self
    }

    pub fn source(mut self, source: Arc<dyn AssetSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn resource_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    // Inset per side between the canvas edge and the artwork.
    pub fn margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    // Emit JSON-lines catalog diagnostics to this path.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<Illustrations> {
        let debug = match self.debug_path {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(ResourceBundle::new()));
        let prefix = self
            .prefix
            .unwrap_or_else(|| self.default_prefix.to_string());
        let margin = if self.margin.is_finite() {
            self.margin
        } else {
            log::warn!("ignoring non-finite margin {}", self.margin);
            DEFAULT_MARGIN
        };
        Ok(Illustrations {
            source,
            catalog_options: CatalogOptions {
                prefix,
                theme: self.theme,
                debug,
            },
            render_options: RenderOptions { margin },
            catalog: OnceLock::new(),
        })
    }
}

impl Default for IllustrationsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Draws one style from a shared catalog.
#[derive(Debug, Clone)]
pub struct IllustrationRenderer {
    catalog: Arc<Catalog>,
    style: StyleId,
    theme: Theme,
    options: RenderOptions,
}

impl IllustrationRenderer {
    pub fn style(&self) -> StyleId {
        self.style
    }

    pub fn asset(&self) -> &Asset {
        self.catalog.get(self.style)
    }

    /// Records the illustration filling the whole canvas.
    pub fn render(&self, canvas: &mut Canvas) {
        render_asset(self.asset(), canvas, &self.theme, &self.options);
    }

    pub fn render_png(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        let mut canvas = Canvas::new(Size::new(width as f32, height as f32));
        self.render(&mut canvas);
        raster::canvas_to_png(&canvas)
    }
}
