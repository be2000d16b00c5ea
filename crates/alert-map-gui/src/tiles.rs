// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use alert_map_core::tile::{TileLayerConfig, ViewportLoadTracker};
use alert_map_core::{AlertMapError, TileCoords};
use iced::widget::image;
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const TILE_CACHE_CAPACITY: usize = 512;
const TILE_TIMEOUT: Duration = Duration::from_secs(10);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// --- Tile Management ---
pub struct TileManager {
    config: TileLayerConfig,
    user_agent: String,
    tiles: Arc<Mutex<LruCache<TileCoords, image::Handle>>>,
    pending: Arc<Mutex<HashSet<TileCoords>>>,
    // Failed tiles are never requested again for the rest of the session
    failed: Arc<Mutex<HashSet<TileCoords>>>,
    visible: Mutex<Vec<TileCoords>>,
    tracker: Mutex<ViewportLoadTracker>,
}

impl TileManager {
    pub fn new(config: TileLayerConfig, user_agent: String) -> Self {
        let capacity = NonZeroUsize::new(TILE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            user_agent,
            tiles: Arc::new(Mutex::new(LruCache::new(capacity))),
            pending: Arc::new(Mutex::new(HashSet::new())),
            failed: Arc::new(Mutex::new(HashSet::new())),
            visible: Mutex::new(Vec::new()),
            tracker: Mutex::new(ViewportLoadTracker::new()),
        }
    }

    pub fn get_tile(&self, coords: TileCoords) -> Option<image::Handle> {
        lock(&self.tiles).get(&coords).cloned()
    }

    /// Whether the tile's fetch has completed, successfully or not.
    pub fn is_settled(&self, coords: &TileCoords) -> bool {
        lock(&self.tiles).contains(coords) || lock(&self.failed).contains(coords)
    }

    /// Starts a background fetch unless the tile is cached, in flight, known to
    /// fail, or the request limit is reached. Skipped tiles are asked for again on
    /// the next frame.
    pub fn request_tile(&self, coords: TileCoords) {
        if !coords.is_valid() {
            return;
        }
        {
            let mut pending = lock(&self.pending);
            if pending.contains(&coords) || pending.len() >= self.config.max_requests {
                return;
            }
            if lock(&self.tiles).contains(&coords) || lock(&self.failed).contains(&coords) {
                return;
            }
            pending.insert(coords);
        }

        let url = self.config.tile_url(coords);
        let user_agent = self.user_agent.clone();
        let tiles_arc = Arc::clone(&self.tiles);
        let pending_arc = Arc::clone(&self.pending);
        let failed_arc = Arc::clone(&self.failed);

        std::thread::spawn(move || {
            match fetch_tile(&url, &user_agent) {
                Ok(bytes) => {
                    log::debug!("Tile loaded — tile={} bytes={}", coords, bytes.len());
                    lock(&tiles_arc).put(coords, image::Handle::from_bytes(bytes));
                }
                Err(reason) => {
                    let err = AlertMapError::TileLoad { coords, reason };
                    log::warn!("{}", err);
                    lock(&failed_arc).insert(coords);
                }
            }
            lock(&pending_arc).remove(&coords);
        });
    }

    /// Records the tiles the map needs for the frame being drawn.
    pub fn set_visible(&self, coords: Vec<TileCoords>) {
        *lock(&self.visible) = coords;
    }

    /// True once per viewport, when every visible tile has settled.
    pub fn poll_viewport_load(&self) -> bool {
        let visible = lock(&self.visible).clone();
        lock(&self.tracker).observe(&visible, |c| self.is_settled(c))
    }
}

fn fetch_tile(url: &str, user_agent: &str) -> Result<Vec<u8>, String> {
    let response = ureq::get(url)
        .set("User-Agent", user_agent)
        .timeout(TILE_TIMEOUT)
        .call()
        .map_err(|e| e.to_string())?;

    let mut bytes = Vec::new();
    std::io::Read::read_to_end(&mut response.into_reader(), &mut bytes)
        .map_err(|e| e.to_string())?;
    if bytes.is_empty() {
        return Err("empty response".to_string());
    }
    Ok(bytes)
}
