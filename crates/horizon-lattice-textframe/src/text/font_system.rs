//! Font loading and face metrics for [`CosmicShaper`](super::CosmicShaper).

use std::path::Path;

use fontdb::ID as FontFaceId;
use tracing::debug;

use super::font::FontMetrics;
use crate::logging::targets;

/// Configuration for initializing the font system.
#[derive(Debug, Clone)]
pub struct FontSystemConfig {
    /// Whether to load system fonts on initialization.
    pub load_system_fonts: bool,
    /// Locale string for text shaping (e.g., "en-US").
    pub locale: String,
    pub serif_family: Option<String>,
    pub sans_serif_family: Option<String>,
    pub monospace_family: Option<String>,
}

impl Default for FontSystemConfig {
    fn default() -> Self {
        Self {
            load_system_fonts: true,
            locale: sys_locale::get_locale().unwrap_or_else(|| "en-US".to_string()),
            serif_family: None,
            sans_serif_family: None,
            monospace_family: None,
        }
    }
}

impl FontSystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to load system fonts on initialization.
    pub fn load_system_fonts(mut self, load: bool) -> Self {
        self.load_system_fonts = load;
        self
    }

    /// Set the locale for text shaping.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn serif_family(mut self, family: impl Into<String>) -> Self {
        self.serif_family = Some(family.into());
        self
    }

    pub fn sans_serif_family(mut self, family: impl Into<String>) -> Self {
        self.sans_serif_family = Some(family.into());
        self
    }

    pub fn monospace_family(mut self, family: impl Into<String>) -> Self {
        self.monospace_family = Some(family.into());
        self
    }
}

/// Owns the font database used for shaping.
///
/// `FontSystem` is not `Sync`; [`CosmicShaper`](super::CosmicShaper) keeps it
/// behind a mutex so a shaper can be shared between threads.
///
/// # Example
///
/// ```no_run
/// use horizon_lattice_textframe::text::{FontSystem, FontSystemConfig};
///
/// let mut fonts = FontSystem::with_config(FontSystemConfig::new().load_system_fonts(false));
/// fonts.load_font_file("assets/Inter-Regular.ttf").unwrap();
/// assert!(fonts.face_count() > 0);
/// ```
pub struct FontSystem {
    inner: cosmic_text::FontSystem,
}

impl FontSystem {
    /// Create a font system that loads all system fonts.
    pub fn new() -> Self {
        Self::with_config(FontSystemConfig::default())
    }

    pub fn with_config(config: FontSystemConfig) -> Self {
        let mut inner = if config.load_system_fonts {
            cosmic_text::FontSystem::new()
        } else {
            let db = fontdb::Database::new();
            cosmic_text::FontSystem::new_with_locale_and_db(config.locale.clone(), db)
        };

        let db = inner.db_mut();
        if let Some(ref family) = config.serif_family {
            db.set_serif_family(family);
        }
        if let Some(ref family) = config.sans_serif_family {
            db.set_sans_serif_family(family);
        }
        if let Some(ref family) = config.monospace_family {
            db.set_monospace_family(family);
        }

        debug!(
            target: targets::SHAPING,
            faces = db.faces().count(),
            locale = %config.locale,
            "created font system"
        );

        Self { inner }
    }

    pub(crate) fn inner_mut(&mut self) -> &mut cosmic_text::FontSystem {
        &mut self.inner
    }

    /// Load a font file from disk.
    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> Result<(), FontLoadError> {
        self.inner
            .db_mut()
            .load_font_file(path.as_ref())
            .map_err(|e| FontLoadError::IoError(e.to_string()))
    }

    /// Load font data from memory (TTF, OTF, TTC or OTC contents).
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.inner.db_mut().load_font_data(data);
    }

    pub fn face_count(&self) -> usize {
        self.inner.db().faces().count()
    }

    /// Check if a font family exists in the database.
    pub fn has_family(&self, family: &str) -> bool {
        self.inner
            .db()
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name == family))
    }

    /// Read the metrics of a face.
    ///
    /// This parses the face on every call; callers cache the result.
    pub fn face_metrics(&self, face_id: FontFaceId) -> Option<FontMetrics> {
        self.inner
            .db()
            .with_face_data(face_id, |data, face_index| {
                ttf_parser::Face::parse(data, face_index)
                    .ok()
                    .map(|face| {
                        let underline = face.underline_metrics();
                        let strikeout = face.strikeout_metrics();
                        FontMetrics {
                            units_per_em: face.units_per_em(),
                            ascent: face.ascender(),
                            descent: face.descender(),
                            line_gap: face.line_gap(),
                            underline_position: underline.map(|m| m.position).unwrap_or(0),
                            underline_thickness: underline.map(|m| m.thickness).unwrap_or(0),
                            strikeout_position: strikeout.map(|m| m.position).unwrap_or(0),
                            strikeout_thickness: strikeout.map(|m| m.thickness).unwrap_or(0),
                        }
                    })
            })
            .flatten()
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSystem")
            .field("face_count", &self.face_count())
            .finish()
    }
}

/// Error type for font loading operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FontLoadError {
    /// An I/O error occurred while loading the font.
    #[error("I/O error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_system_without_system_fonts() {
        let font_system = FontSystem::with_config(FontSystemConfig::new().load_system_fonts(false));
        assert_eq!(font_system.face_count(), 0);
        assert!(!font_system.has_family("Arial"));
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let mut font_system =
            FontSystem::with_config(FontSystemConfig::new().load_system_fonts(false));
        let result = font_system.load_font_file("/nonexistent/font.ttf");
        assert!(matches!(result, Err(FontLoadError::IoError(_))));
    }

    #[test]
    fn config_builder() {
        let config = FontSystemConfig::new()
            .load_system_fonts(false)
            .locale("fr-FR")
            .serif_family("Georgia")
            .monospace_family("Consolas");

        assert!(!config.load_system_fonts);
        assert_eq!(config.locale, "fr-FR");
        assert_eq!(config.serif_family, Some("Georgia".to_string()));
        assert_eq!(config.sans_serif_family, None);
        assert_eq!(config.monospace_family, Some("Consolas".to_string()));
    }
}
