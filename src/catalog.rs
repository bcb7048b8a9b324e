use std::collections::BTreeMap;

use crate::assets::{Asset, AssetSource, StyleId};
use crate::debug::DebugLogger;
use crate::error::{IllustrationError, Result};
use crate::raster::decode_image;
use crate::svg::parse_document;
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateKind {
    Markup,
    Bitmap,
}

impl CandidateKind {
    const ORDER: [CandidateKind; 2] = [CandidateKind::Markup, CandidateKind::Bitmap];

    fn extension(self) -> &'static str {
        match self {
            CandidateKind::Markup => "svg",
            CandidateKind::Bitmap => "png",
        }
    }
}

/// Inputs to one catalog build.
#[derive(Clone, Default)]
pub struct CatalogOptions {
    pub prefix: String,
    pub theme: Theme,
    pub(crate) debug: Option<DebugLogger>,
}

impl CatalogOptions {
    pub fn new(prefix: impl Into<String>, theme: Theme) -> Self {
        Self {
            prefix: prefix.into(),
            theme,
            debug: None,
        }
    }
}

/// Immutable mapping from every style to renderable artwork.
#[derive(Debug)]
pub struct Catalog {
    assets: BTreeMap<StyleId, Asset>,
    fallback: StyleId,
}

impl Catalog {
    /// Loads every style, preferring markup over bitmaps.
    ///
    /// Individual failures are logged and bound to the fallback; only an entirely empty result
    /// is an error.
    pub fn load(source: &dyn AssetSource, options: &CatalogOptions) -> Result<Self> {
        let debug = options.debug.as_ref();
        let mut assets = BTreeMap::new();
        let mut all_failures = Vec::new();

        for style in StyleId::ALL {
            match load_style(source, options, style) {
                Ok(asset) => {
                    assets.insert(style, asset);
                    if let Some(debug) = debug {
                        debug.increment("styles.resolved", 1);
                    }
                }
                Err(failures) => {
                    log::warn!(
                        "illustration '{}' unavailable: {}",
                        style,
                        failures.join("; ")
                    );
                    if let Some(debug) = debug {
                        debug.unresolved(style.as_str(), &failures);
                        debug.increment("styles.fallback", 1);
                    }
                    all_failures.extend(failures);
                }
            }
        }

        let Some(&fallback) = assets.keys().next() else {
            log::error!(
                "no illustration assets could be loaded from {}",
                source.describe()
            );
            if let Some(debug) = debug {
                debug.emit_summary("catalog");
            }
            return Err(IllustrationError::EmptyCatalog {
                failures: all_failures,
            });
        };

        log::info!(
            "loaded {} of {} illustrations from {} (fallback: {})",
            assets.len(),
            StyleId::ALL.len(),
            source.describe(),
            fallback
        );
        if let Some(debug) = debug {
            debug.emit_summary("catalog");
        }
        Ok(Self { assets, fallback })
    }

    /// Artwork for `style`, or the fallback when it did not load.
    pub fn get(&self, style: StyleId) -> &Asset {
        match self.assets.get(&style) {
            Some(asset) => asset,
            None => &self.assets[&self.fallback],
        }
    }

    /// Whether `style` resolved its own artwork.
    pub fn has_asset(&self, style: StyleId) -> bool {
        self.assets.contains_key(&style)
    }

    pub fn resolved_styles(&self) -> impl Iterator<Item = StyleId> + '_ {
        self.assets.keys().copied()
    }

    pub fn fallback(&self) -> StyleId {
        self.fallback
    }
}

fn load_style(
    source: &dyn AssetSource,
    options: &CatalogOptions,
    style: StyleId,
) -> std::result::Result<Asset, Vec<String>> {
    let debug = options.debug.as_ref();
    let mut failures = Vec::new();
    for kind in CandidateKind::ORDER {
        let name = format!("{}{}.{}", options.prefix, style.base_name(), kind.extension());
        if let Some(debug) = debug {
            debug.increment("candidates.tried", 1);
        }
        match load_candidate(source, &name, kind, &options.theme) {
            Ok(asset) => {
                log::debug!("illustration '{style}' loaded from {name}");
                if let Some(debug) = debug {
                    debug.candidate(style.as_str(), &name, None);
                }
                return Ok(asset);
            }
            Err(err) => {
                let message = format!("{name}: {err}");
                log::debug!("illustration '{style}' candidate failed: {message}");
                if let Some(debug) = debug {
                    debug.candidate(style.as_str(), &name, Some(&err.to_string()));
                    debug.increment("candidates.failed", 1);
                }
                failures.push(message);
            }
        }
    }
    Err(failures)
}

fn load_candidate(
    source: &dyn AssetSource,
    name: &str,
    kind: CandidateKind,
    theme: &Theme,
) -> Result<Asset> {
    let bytes = source.read(name)?;
    match kind {
        CandidateKind::Markup => parse_document(&bytes, theme),
        CandidateKind::Bitmap => {
            let pixmap = decode_image(&bytes).ok_or_else(|| IllustrationError::RasterDecodeFailure {
                name: name.to_string(),
                message: "unrecognized or corrupt image data".to_string(),
            })?;
            Asset::raster(pixmap)
        }
    }
}
