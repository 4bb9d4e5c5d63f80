use super::{AssetError, AssetLoader, AssetStore, LodAsset};
use crate::lod::LodKey;
use crate::scene::material::{Texture, TextureChannel};
use crate::scene::Environment;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::fmt;
use std::rc::Rc;

/// Where one LOD's files live, relative to the asset root.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LodSource {
    pub key: LodKey,
    pub mesh: String,
    pub normal_map: String,
    #[serde(default)]
    pub base_color_map: Option<String>,
    #[serde(default)]
    pub aorm_map: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Geometry,
    NormalMap,
    BaseColorMap,
    AormMap,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoadStage::Geometry => "geometry",
            LoadStage::NormalMap => "normal map",
            LoadStage::BaseColorMap => "base color map",
            LoadStage::AormMap => "AORM map",
        };
        f.write_str(label)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{stage} load failed for {key}: {source}")]
    Asset {
        key: LodKey,
        stage: LoadStage,
        #[source]
        source: AssetError,
    },
    #[error("no asset source configured for {0}")]
    UnknownLod(LodKey),
}

impl LoadError {
    pub fn key(&self) -> LodKey {
        match self {
            LoadError::Asset { key, .. } => *key,
            LoadError::UnknownLod(key) => *key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    /// The LOD is now in the store.
    Stored(LodKey),
    /// The highest-priority LOD is complete; fired once per sequencer.
    FirstReady(LodKey),
}

/// Outcome of one non-blocking step of the background sequence.
#[derive(Debug)]
pub enum LoadProgress {
    /// The fetch for this LOD is still waiting on the loader.
    Pending(LodKey),
    Stored(LodKey),
    /// The sequence stopped here; later LODs are never requested.
    Failed(LoadError),
    /// Nothing left to fetch, or the sequence already stopped.
    Idle,
}

struct FetchedLod {
    asset: LodAsset,
    defaults: Vec<(TextureChannel, Texture)>,
}

struct InFlight {
    key: LodKey,
    future: LocalBoxFuture<'static, Result<FetchedLod, LoadError>>,
}

/// Fetches LODs one at a time in priority order.
pub struct LoadSequencer {
    sources: Vec<LodSource>,
    first_ready_fired: bool,
    in_flight: Option<InFlight>,
    halted: bool,
}

impl LoadSequencer {
    pub fn new(mut sources: Vec<LodSource>) -> Self {
        sources.sort_by_key(|source| source.key);
        sources.dedup_by_key(|source| source.key);
        Self {
            sources,
            first_ready_fired: false,
            in_flight: None,
            halted: false,
        }
    }

    /// Fetches the highest-priority LOD that is not stored yet and nothing
    /// else. A failure halts the background sequence as well.
    pub async fn load_first<L: AssetLoader>(
        &mut self,
        loader: &L,
        store: &mut AssetStore,
    ) -> Result<Option<LodKey>, LoadError> {
        let Some(source) = self.sources.iter().find(|source| !store.has(source.key)) else {
            return Ok(None);
        };
        match fetch(loader, source).await {
            Ok(fetched) => {
                let key = commit(store, fetched);
                self.first_ready_fired = true;
                log::info!("{} ready ({} of {} stored)", key, store.len(), self.sources.len());
                Ok(Some(key))
            }
            Err(err) => {
                log::warn!("Stopping LOD sequence at {}: {}", err.key(), err);
                self.halted = true;
                Err(err)
            }
        }
    }

    /// Advances the background sequence without blocking: starts the next
    /// fetch when none is running and polls the running one once. Meant to
    /// be called once per frame.
    pub fn poll_next<L: AssetLoader + 'static>(
        &mut self,
        loader: &Rc<L>,
        store: &mut AssetStore,
    ) -> LoadProgress {
        if self.halted {
            return LoadProgress::Idle;
        }
        let mut in_flight = match self.in_flight.take() {
            Some(in_flight) => in_flight,
            None => {
                let Some(source) = self
                    .sources
                    .iter()
                    .find(|source| !store.has(source.key))
                    .cloned()
                else {
                    return LoadProgress::Idle;
                };
                log::debug!("Background fetch of {} started", source.key);
                let loader = Rc::clone(loader);
                InFlight {
                    key: source.key,
                    future: async move { fetch(&*loader, &source).await }.boxed_local(),
                }
            }
        };

        match in_flight.future.as_mut().now_or_never() {
            None => {
                let key = in_flight.key;
                self.in_flight = Some(in_flight);
                LoadProgress::Pending(key)
            }
            Some(Ok(fetched)) => {
                let key = commit(store, fetched);
                self.first_ready_fired = true;
                log::info!("{} ready ({} of {} stored)", key, store.len(), self.sources.len());
                LoadProgress::Stored(key)
            }
            Some(Err(err)) => {
                log::warn!("Stopping LOD sequence at {}: {}", err.key(), err);
                self.halted = true;
                LoadProgress::Failed(err)
            }
        }
    }

    /// Loads every configured LOD that is not stored yet, strictly in
    /// priority order. The first failure stops the run; whatever was stored
    /// before it stays in the store.
    pub async fn load_all<L, F>(
        &mut self,
        loader: &L,
        store: &mut AssetStore,
        mut on_event: F,
    ) -> Result<Vec<LodKey>, LoadError>
    where
        L: AssetLoader,
        F: FnMut(LoadEvent, &AssetStore),
    {
        let mut loaded = Vec::new();
        for source in &self.sources {
            if store.has(source.key) {
                continue;
            }
            let fetched = match fetch(loader, source).await {
                Ok(fetched) => fetched,
                Err(err) => {
                    log::warn!("Stopping LOD sequence at {}: {}", err.key(), err);
                    return Err(err);
                }
            };
            let key = commit(store, fetched);
            loaded.push(key);
            log::info!("{} ready ({} of {} stored)", key, store.len(), self.sources.len());
            on_event(LoadEvent::Stored(key), store);
            if !self.first_ready_fired {
                self.first_ready_fired = true;
                on_event(LoadEvent::FirstReady(key), store);
            }
        }
        Ok(loaded)
    }

    /// Re-fetches one LOD and replaces its store entry.
    pub async fn reload<L: AssetLoader>(
        &self,
        loader: &L,
        store: &mut AssetStore,
        key: LodKey,
    ) -> Result<(), LoadError> {
        let source = self
            .sources
            .iter()
            .find(|source| source.key == key)
            .ok_or(LoadError::UnknownLod(key))?;
        let fetched = fetch(loader, source).await?;
        commit(store, fetched);
        log::info!("{} reloaded", key);
        Ok(())
    }
}

/// Loads one equirectangular environment map.
pub async fn load_environment<L: AssetLoader>(
    loader: &L,
    name: &str,
    path: &str,
    intensity: f32,
) -> Result<Environment, AssetError> {
    let texture = loader.load_texture(path).await?;
    log::info!("Environment '{}' loaded from {}", name, path);
    Ok(Environment {
        name: name.to_string(),
        texture,
        intensity,
    })
}

async fn fetch<L: AssetLoader>(loader: &L, source: &LodSource) -> Result<FetchedLod, LoadError> {
    let key = source.key;
    let wrap = move |stage: LoadStage| {
        move |source: AssetError| LoadError::Asset { key, stage, source }
    };

    log::debug!("Fetching {} geometry from {}", key, source.mesh);
    let mesh = loader
        .load_mesh(&source.mesh)
        .await
        .map_err(wrap(LoadStage::Geometry))?;
    log::debug!("Fetching {} normal map from {}", key, source.normal_map);
    let normal_map = loader
        .load_texture(&source.normal_map)
        .await
        .map_err(wrap(LoadStage::NormalMap))?;

    let mut defaults = Vec::new();
    if let Some(path) = &source.base_color_map {
        let texture = loader
            .load_texture(path)
            .await
            .map_err(wrap(LoadStage::BaseColorMap))?;
        defaults.push((TextureChannel::BaseColor, texture));
    }
    if let Some(path) = &source.aorm_map {
        let texture = loader
            .load_texture(path)
            .await
            .map_err(wrap(LoadStage::AormMap))?;
        for channel in TextureChannel::AORM {
            defaults.push((channel, texture.clone()));
        }
    }

    Ok(FetchedLod {
        asset: LodAsset {
            key,
            mesh,
            normal_map,
        },
        defaults,
    })
}

fn commit(store: &mut AssetStore, fetched: FetchedLod) -> LodKey {
    let key = fetched.asset.key;
    for (channel, texture) in fetched.defaults {
        store.register_default_texture(key, channel, texture);
    }
    store.put(fetched.asset);
    key
}
