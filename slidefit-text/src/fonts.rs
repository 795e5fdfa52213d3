//! Runtime font loading with font-ready notifications.
//!
//! Fonts loaded after a text was fitted change its metrics. The loader
//! adds faces to the shared measurer's font database and broadcasts the
//! families that became available, so shells can refit.
//!
//! ```text
//! FontLoader::load_file / load_data
//!   ├── fontdb: before/after face id diff
//!   └── broadcast::Sender<FontsReady { families }>  ──► shells
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use cosmic_text::fontdb;
use slidefit_core::FontsReady;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::measure::TextMeasurer;

const EVENT_CAPACITY: usize = 16;

#[derive(Error, Debug)]
pub enum FontLoadError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable font faces in {0}")]
    NoFaces(String),
    #[error("text measurer lock poisoned")]
    Poisoned,
}

pub struct FontLoader {
    measurer: Arc<Mutex<TextMeasurer>>,
    events: broadcast::Sender<FontsReady>,
}

impl FontLoader {
    pub fn new(measurer: Arc<Mutex<TextMeasurer>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { measurer, events }
    }

    /// Receive a [`FontsReady`] for every successful load.
    pub fn subscribe(&self) -> broadcast::Receiver<FontsReady> {
        self.events.subscribe()
    }

    /// Load a font file (TTF/OTF/TTC) and announce its families.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<FontsReady, FontLoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load(data, &path.display().to_string())
    }

    /// Load font bytes already in memory.
    pub fn load_data(&self, data: Vec<u8>) -> Result<FontsReady, FontLoadError> {
        self.load(data, "font data")
    }

    fn load(&self, data: Vec<u8>, origin: &str) -> Result<FontsReady, FontLoadError> {
        let start = Instant::now();
        let families = {
            let mut measurer = self.measurer.lock().map_err(|_| FontLoadError::Poisoned)?;
            let db = measurer.font_system_mut().db_mut();
            let before: HashSet<fontdb::ID> = db.faces().map(|face| face.id).collect();
            db.load_font_data(data);
            new_families(db, &before)
        };

        if families.is_empty() {
            log::warn!("FontLoader: {origin} contained no usable faces");
            return Err(FontLoadError::NoFaces(origin.to_owned()));
        }

        let event = FontsReady::new(families);
        log::info!(
            "FontLoader: loaded {:?} from {origin} ({:.1}ms)",
            event.families,
            start.elapsed().as_secs_f64() * 1000.0,
        );
        if self.events.send(event.clone()).is_err() {
            log::trace!("FontLoader: no subscribers for {:?}", event.families);
        }
        Ok(event)
    }
}

/// Family names of faces not present in `before`, sorted and deduplicated.
fn new_families(db: &fontdb::Database, before: &HashSet<fontdb::ID>) -> Vec<String> {
    db.faces()
        .filter(|face| !before.contains(&face.id))
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
