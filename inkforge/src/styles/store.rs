use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use log::{debug, info};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use synthesis::{HandwritingModel, HiddenState};

use super::{StyleDefinition, StyleProfile, StyleSource, StyleSummary};
use crate::{
    InkErr, Result,
    decoding::priming,
    vocab::Vocabulary,
};

type Slot = Arc<OnceCell<Arc<StyleProfile>>>;

/// Process-wide cache of loaded styles.
///
/// Profiles never expire. Concurrent loads of the same id collapse into a single fetch: the
/// first caller runs it while the rest block on the same cell. A failed load drops its cell
/// so a later call tries again and unknown ids leave nothing behind.
pub struct StyleStore {
    source: Box<dyn StyleSource>,
    model: Arc<HandwritingModel>,
    vocab: Arc<Vocabulary>,
    cache: Mutex<HashMap<String, Slot>>,
}

impl StyleStore {
    pub fn new<S: StyleSource + 'static>(
        source: S,
        model: Arc<HandwritingModel>,
        vocab: Arc<Vocabulary>,
    ) -> Self {
        Self {
            source: Box::new(source),
            model,
            vocab,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the profile of `id`, loading and priming it on first use.
    ///
    /// # Returns
    /// The shared profile or `StyleNotFound` if the source doesn't know the id.
    pub fn load(&self, id: &str) -> Result<Arc<StyleProfile>> {
        let slot = self.cache.lock().entry(id.to_string()).or_default().clone();
        let loaded = slot.get_or_try_init(|| self.fetch(id)).cloned();

        if loaded.is_err() {
            let mut cache = self.cache.lock();
            let stale = cache
                .get(id)
                .is_some_and(|cached| Arc::ptr_eq(cached, &slot) && cached.get().is_none());
            if stale {
                cache.remove(id);
            }
        }

        loaded
    }

    /// Every style id the source knows, loaded or not.
    pub fn list(&self) -> Result<BTreeSet<String>> {
        Ok(self.source.ids()?.into_iter().collect())
    }

    /// A summary of every style, ordered by id.
    pub fn catalog(&self) -> Result<Vec<StyleSummary>> {
        self.list()?
            .iter()
            .map(|id| self.load(id).map(|profile| profile.summary()))
            .collect()
    }

    /// Amount of profiles held in the cache.
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    fn fetch(&self, id: &str) -> Result<Arc<StyleProfile>> {
        debug!(style = id; "fetching style");

        let definition = self
            .source
            .fetch(id)?
            .ok_or_else(|| InkErr::StyleNotFound(id.to_string()))?;

        let profile = self.build(id, definition)?;

        info!(style = id, primed = profile.is_primed(); "loaded style");
        Ok(Arc::new(profile))
    }

    fn build(&self, id: &str, definition: StyleDefinition) -> Result<StyleProfile> {
        let invalid = |reason: &str| InkErr::InvalidStyle {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let (priming, bias) = match definition.priming {
            Some(sample) => {
                priming::check_trace(&sample.strokes).map_err(invalid)?;

                let sequence = self.vocab.encode(&sample.text);
                if sequence.is_empty() {
                    return Err(invalid("the priming text is empty"));
                }

                let bias = priming::prime(&self.model, &sample.strokes, &sequence)?;
                (Some((sample.strokes, sequence)), bias)
            }
            None => (None, HiddenState::zeros(self.model.spec())),
        };

        Ok(StyleProfile {
            id: id.to_string(),
            name: definition.name.unwrap_or_else(|| id.to_string()),
            description: definition.description.unwrap_or_default(),
            priming,
            bias,
        })
    }
}
