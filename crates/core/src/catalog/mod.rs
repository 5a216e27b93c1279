//! The fixed set of named reference emotions placed in valence/arousal space.

mod builtin;

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "catalog";

/// Fewer entries than this cannot fill a top-3 ranking.
pub const MIN_ENTRIES: usize = 3;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionEntry {
    pub name: Cow<'static, str>,
    pub valence: f64,
    pub arousal: f64,
    pub emoji: Cow<'static, str>,
    pub description: Cow<'static, str>,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("catalogue has {0} entries, at least 3 are required")]
    TooFew(usize),

    #[error("catalogue entry {index} has an empty name")]
    EmptyName { index: usize },

    #[error("duplicate catalogue entry {0:?}")]
    DuplicateName(String),

    #[error("{name}: coordinate ({valence}, {arousal}) is outside [0, 1]")]
    CoordinateOutOfRange {
        name: String,
        valence: f64,
        arousal: f64,
    },

    #[error("{name}: missing {field}")]
    MissingText { name: String, field: &'static str },

    #[error("failed to read catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalogue {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Validated, immutable after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct EmotionCatalog {
    entries: Vec<EmotionEntry>,
}

impl EmotionCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: builtin::entries(),
        }
    }

    pub fn from_entries(entries: Vec<EmotionEntry>) -> Result<Self> {
        validate(&entries)?;
        Ok(Self { entries })
    }

    /// Loads a JSON array of entries.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: Vec<EmotionEntry> =
            serde_json::from_str(&json).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_entries(entries)?;
        tracing::info!(
            target: LOG_TARGET,
            path = %path.display(),
            entries = catalog.len(),
            "loaded emotion catalogue"
        );
        Ok(catalog)
    }

    pub fn get(&self, name: &str) -> Option<&EmotionEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> &[EmotionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EmotionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate(entries: &[EmotionEntry]) -> Result<()> {
    if entries.len() < MIN_ENTRIES {
        return Err(CatalogError::TooFew(entries.len()));
    }
    let mut seen = HashSet::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName { index });
        }
        if !seen.insert(name) {
            return Err(CatalogError::DuplicateName(name.to_owned()));
        }
        let in_range = |c: f64| c.is_finite() && (0.0..=1.0).contains(&c);
        if !in_range(entry.valence) || !in_range(entry.arousal) {
            return Err(CatalogError::CoordinateOutOfRange {
                name: name.to_owned(),
                valence: entry.valence,
                arousal: entry.arousal,
            });
        }
        for (field, text) in [("emoji", &entry.emoji), ("description", &entry.description)] {
            if text.trim().is_empty() {
                return Err(CatalogError::MissingText {
                    name: name.to_owned(),
                    field,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entry(name: &str, valence: f64, arousal: f64) -> EmotionEntry {
        EmotionEntry {
            name: Cow::Owned(name.to_owned()),
            valence,
            arousal,
            emoji: Cow::Borrowed("🙂"),
            description: Cow::Borrowed("something to listen to"),
        }
    }

    #[test]
    fn builtin_catalogue_is_valid_and_ordered() {
        let catalog = EmotionCatalog::builtin();
        assert_eq!(catalog.len(), 26);
        validate(catalog.entries()).unwrap();
        assert_eq!(catalog.entries()[0].name, "Ecstatic");
        assert_eq!(catalog.entries()[25].name, "Astonished");
        let neutral = catalog.get("Neutral").unwrap();
        assert_eq!((neutral.valence, neutral.arousal), (0.5, 0.5));
        assert_eq!(neutral.emoji, "🤍");
        assert!(catalog.get("Nonexistent").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = EmotionCatalog::from_entries(vec![
            entry("Calm", 0.7, 0.25),
            entry("Tense", 0.25, 0.85),
            entry("Calm", 0.1, 0.1),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateName(name) if name == "Calm"));
    }

    #[test]
    fn out_of_range_and_non_finite_coordinates_are_rejected() {
        let bad = [1.2, -0.1, f64::NAN];
        for v in bad {
            let result = EmotionCatalog::from_entries(vec![
                entry("A", 0.1, 0.1),
                entry("B", v, 0.5),
                entry("C", 0.9, 0.9),
            ]);
            assert!(matches!(result, Err(CatalogError::CoordinateOutOfRange { .. })));
        }
    }

    #[test]
    fn too_few_entries_and_blank_fields_are_rejected() {
        assert!(matches!(
            EmotionCatalog::from_entries(vec![entry("A", 0.1, 0.1), entry("B", 0.2, 0.2)]),
            Err(CatalogError::TooFew(2))
        ));
        let mut blank = entry("C", 0.3, 0.3);
        blank.description = Cow::Borrowed("  ");
        assert!(matches!(
            EmotionCatalog::from_entries(vec![entry("A", 0.1, 0.1), entry("B", 0.2, 0.2), blank]),
            Err(CatalogError::MissingText { field: "description", .. })
        ));
        assert!(matches!(
            EmotionCatalog::from_entries(vec![entry("", 0.1, 0.1), entry("B", 0.2, 0.2), entry("C", 0.3, 0.3)]),
            Err(CatalogError::EmptyName { index: 0 })
        ));
    }

    #[test]
    fn loads_catalogue_from_json_file() {
        let entries = vec![entry("Low", 0.1, 0.1), entry("Mid", 0.5, 0.5), entry("High", 0.9, 0.9)];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&entries).unwrap().as_bytes())
            .unwrap();
        let catalog = EmotionCatalog::from_json_path(file.path()).unwrap();
        assert_eq!(catalog.entries(), entries.as_slice());
    }
}
