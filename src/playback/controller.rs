//! Playback controller: the single owner of the audio output handle, the
//! play queue and the mounted playlist views.
//!
//! Every operation mutates state first, computes the notices for that state,
//! releases its borrows and only then runs callbacks. Callbacks may call back
//! into the controller; notices raised while a dispatch is running are queued
//! and delivered in order once the running cycle ends.

use super::model::{PlaylistId, PlaylistView, Track, TrackOrigin, TrackRef};
use super::observers::{Observers, Subscription};
use super::output::{describe_media_error, usable_duration, MediaEvent, OutputHandle};
use super::queue::{PlayQueue, QueueItem};
use super::waveform::{WaveformCache, WaveformData, WaveformDecoder};
use crate::config::PlayerConfig;
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Runs a detached future on the host's executor.
pub type Spawner = Rc<dyn Fn(LocalBoxFuture<'static, ()>)>;

pub type RenderCallback = Rc<dyn Fn(&PlaylistView)>;

/// Read-only copy of the controller state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub current_track: Option<TrackRef>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub queue: Vec<QueueItem>,
    pub queue_index: usize,
    pub queue_expanded: bool,
    pub shuffle: bool,
    pub looping: bool,
    pub mini_player_visible: bool,
}

struct RegisteredPlaylist {
    tracks: Vec<Track>,
    render: RenderCallback,
    element_id: String,
}

struct State {
    current: Option<TrackRef>,
    is_playing: bool,
    queue: PlayQueue,
    shuffle: bool,
    looping: bool,
    queue_expanded: bool,
    mini_player_visible: bool,
    playlists: HashMap<PlaylistId, RegisteredPlaylist>,
    /// Most recently mounted playlist; fills an empty queue when a track's
    /// own playlist is not registered.
    active_playlist: Option<PlaylistId>,
    /// The playing item was removed and the queue position now points at
    /// the item that followed it.
    removed_current: bool,
    last_progress: f64,
    rng: Box<dyn RngCore>,
    torn_down: bool,
}

impl State {
    fn current_playlist(&self) -> Option<PlaylistId> {
        self.current.as_ref().and_then(|c| c.playlist_id.clone())
    }

    fn track_from_queue(&self, position: usize) -> Option<TrackRef> {
        let item = self.queue.get(position)?;
        let authored = item
            .origin
            .as_ref()
            .and_then(|origin| self.playlists.get(&origin.playlist_id))
            .and_then(|playlist| playlist.tracks.get(item.original_index))
            .filter(|track| track.src == item.src);

        Some(TrackRef {
            src: item.src.clone(),
            title: item.title.clone(),
            index: item.original_index,
            playlist_id: item.origin.as_ref().map(|o| o.playlist_id.clone()),
            source_route: item.origin.as_ref().map(|o| o.source_route.clone()),
            peaks: authored.and_then(|t| t.peaks.clone()),
            duration: authored.and_then(|t| t.duration),
        })
    }

    fn view_for(&self, output: &dyn OutputHandle, playlist_id: &PlaylistId) -> PlaylistView {
        match self.current.as_ref().filter(|c| c.belongs_to(playlist_id)) {
            Some(current) => PlaylistView {
                active_index: Some(current.index),
                is_playing: self.is_playing,
                current_time: output.current_time(),
                duration: output.duration().and_then(usable_duration),
            },
            None => PlaylistView::default(),
        }
    }

    fn snapshot(&self, output: &dyn OutputHandle) -> PlaybackSnapshot {
        let loaded = self.current.is_some();
        PlaybackSnapshot {
            current_track: self.current.clone(),
            is_playing: self.is_playing,
            current_time: if loaded { output.current_time() } else { 0.0 },
            duration: if loaded {
                output.duration().and_then(usable_duration)
            } else {
                None
            },
            queue: self.queue.items().to_vec(),
            queue_index: self.queue.index(),
            queue_expanded: self.queue_expanded,
            shuffle: self.shuffle,
            looping: self.looping,
            mini_player_visible: self.mini_player_visible,
        }
    }
}

/// What an operation wants published once its mutation is complete.
#[derive(Default)]
struct Effects {
    subscribers: bool,
    playlists: Vec<PlaylistId>,
    waveform: Option<String>,
}

impl Effects {
    fn touch(&mut self, playlist_id: Option<PlaylistId>) {
        if let Some(id) = playlist_id {
            if !self.playlists.contains(&id) {
                self.playlists.push(id);
            }
        }
    }
}

enum Notice {
    Playlist(RenderCallback, PlaylistView),
    Subscribers(Rc<PlaybackSnapshot>),
}

struct Inner {
    state: RefCell<State>,
    output: RefCell<Box<dyn OutputHandle>>,
    subscribers: Observers<PlaybackSnapshot>,
    waveforms: Rc<WaveformCache>,
    spawner: Spawner,
    pending: RefCell<VecDeque<Notice>>,
    dispatching: Cell<bool>,
    config: PlayerConfig,
}

/// Cheap to clone; every clone drives the same state.
#[derive(Clone)]
pub struct PlaybackController {
    inner: Rc<Inner>,
}

impl PartialEq for PlaybackController {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PlaybackController {
    pub fn create(
        output: Box<dyn OutputHandle>,
        decoder: Box<dyn WaveformDecoder>,
        spawner: Spawner,
        config: PlayerConfig,
    ) -> Self {
        let waveforms = WaveformCache::new(
            decoder,
            config.waveform_bars,
            config.placeholder_amplitude,
        );
        let state = State {
            current: None,
            is_playing: false,
            queue: PlayQueue::new(),
            shuffle: false,
            looping: false,
            queue_expanded: false,
            mini_player_visible: false,
            playlists: HashMap::new(),
            active_playlist: None,
            removed_current: false,
            last_progress: 0.0,
            rng: Box::new(StdRng::from_entropy()),
            torn_down: false,
        };
        info!("playback controller created");

        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(state),
                output: RefCell::new(output),
                subscribers: Observers::new(),
                waveforms: Rc::new(waveforms),
                spawner,
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                config,
            }),
        }
    }

    /// Replaces the shuffle source, mostly for deterministic tests.
    pub fn with_rng(self, rng: impl RngCore + 'static) -> Self {
        self.inner.state.borrow_mut().rng = Box::new(rng);
        self
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    /// Stops playback and drops every callback. Later calls are no-ops.
    pub fn teardown(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.torn_down {
                return;
            }
            state.torn_down = true;
            state.current = None;
            state.queue.clear();
            state.playlists.clear();
            state.active_playlist = None;
            state.mini_player_visible = false;
        }
        {
            let mut output = self.inner.output.borrow_mut();
            output.pause();
            output.unload();
        }
        self.inner.subscribers.clear();
        self.inner.pending.borrow_mut().clear();
        info!("playback controller torn down");
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let state = self.inner.state.borrow();
        let output = self.inner.output.borrow();
        state.snapshot(&**output)
    }

    pub fn subscribe(&self, callback: impl Fn(&PlaybackSnapshot) + 'static) -> Subscription {
        self.inner.subscribers.subscribe(callback)
    }

    pub fn register_playlist(
        &self,
        id: impl Into<PlaylistId>,
        tracks: Vec<Track>,
        render: impl Fn(&PlaylistView) + 'static,
        element_id: impl Into<String>,
    ) {
        let id = id.into();
        let element_id = element_id.into();
        self.mutate(|state, _, effects| {
            debug!(playlist = %id, tracks = tracks.len(), "playlist mounted");
            state.playlists.insert(
                id.clone(),
                RegisteredPlaylist {
                    tracks,
                    render: Rc::new(render),
                    element_id,
                },
            );
            state.active_playlist = Some(id.clone());
            // A view remounted mid-playback should not wait for the next tick.
            if state.current.as_ref().is_some_and(|c| c.belongs_to(&id)) {
                effects.touch(Some(id.clone()));
            }
        });
    }

    pub fn unregister_playlist(&self, id: &PlaylistId) {
        self.mutate(|state, _, _| {
            if state.playlists.remove(id).is_some() {
                debug!(playlist = %id, "playlist unmounted");
            }
            if state.active_playlist.as_ref() == Some(id) {
                state.active_playlist = None;
            }
        });
    }

    pub fn playlist_element_id(&self, id: &PlaylistId) -> Option<String> {
        self.inner
            .state
            .borrow()
            .playlists
            .get(id)
            .map(|p| p.element_id.clone())
    }

    /// Plays `track` (at `index` in its playlist) and makes it current.
    ///
    /// An empty queue is filled from the originating playlist when it is
    /// registered, falling back to the most recently mounted playlist.
    /// Otherwise the track is selected in, or inserted into, the existing
    /// queue.
    pub fn play_track(&self, track: &Track, index: usize, origin: TrackOrigin) {
        self.mutate(|state, output, effects| {
            if state.queue.is_empty() {
                // The originating playlist when it is mounted, else the most
                // recently mounted one.
                let playlist_tracks = state
                    .playlists
                    .get(&origin.playlist_id)
                    .or_else(|| {
                        state
                            .active_playlist
                            .as_ref()
                            .and_then(|id| state.playlists.get(id))
                    })
                    .map(|p| p.tracks.clone())
                    .filter(|tracks| tracks.get(index).is_some_and(|t| t.src == track.src));

                match playlist_tracks {
                    Some(tracks) => {
                        let rng = if state.shuffle {
                            Some(&mut *state.rng)
                        } else {
                            None
                        };
                        state.queue.populate(&tracks, index, Some(&origin), rng);
                    }
                    None => {
                        state.queue.push(track, index, Some(&origin));
                    }
                }
            } else if let Some(position) = state.queue.position_of(&track.src) {
                state.queue.select(position);
            } else {
                state
                    .queue
                    .insert_next_and_select(track, index, Some(&origin));
            }

            let current = TrackRef::from_track(track, index, Some(&origin));
            self.load_track(state, output, effects, current);
        });
    }

    pub fn play_queue_item(&self, index: usize) {
        self.mutate(|state, output, effects| {
            if !state.queue.select(index) {
                return;
            }
            if let Some(track) = state.track_from_queue(index) {
                self.load_track(state, output, effects, track);
            }
        });
    }

    pub fn toggle_play(&self) {
        self.mutate(|state, output, _| {
            if !output.has_source() {
                return;
            }
            if state.is_playing {
                output.pause();
            } else {
                output.play();
            }
        });
    }

    /// Seeks to a fraction of the track length.
    pub fn seek(&self, percent: f64) {
        self.mutate(|state, output, effects| {
            if !percent.is_finite() {
                return;
            }
            let Some(duration) = output.duration().and_then(usable_duration) else {
                return;
            };
            let target = percent.clamp(0.0, 1.0) * duration;
            output.set_current_time(target);
            state.last_progress = target;
            effects.subscribers = true;
            effects.touch(state.current_playlist());
        });
    }

    pub fn play_next(&self) {
        self.mutate(|state, output, effects| {
            if std::mem::take(&mut state.removed_current) {
                let position = state.queue.index();
                if let Some(track) = state.track_from_queue(position) {
                    self.load_track(state, output, effects, track);
                    return;
                }
            }
            self.advance_queue(state, output, effects);
        });
    }

    fn advance_queue(&self, state: &mut State, output: &mut dyn OutputHandle, effects: &mut Effects) {
        match state.queue.advance(state.looping) {
            Some(position) => {
                if let Some(track) = state.track_from_queue(position) {
                    self.load_track(state, output, effects, track);
                }
            }
            None if !state.queue.is_empty() => {
                // End of the queue: pause but keep the track and the queue.
                debug!("queue exhausted");
                output.pause();
                effects.subscribers = true;
                effects.touch(state.current_playlist());
            }
            None => {}
        }
    }

    pub fn play_prev(&self) {
        let threshold = self.inner.config.restart_threshold_secs;
        self.mutate(|state, output, effects| {
            if state.current.is_none() {
                return;
            }
            let position = if output.current_time() > threshold {
                None
            } else {
                state.queue.retreat(state.looping)
            };

            match position.and_then(|p| state.track_from_queue(p)) {
                Some(track) => self.load_track(state, output, effects, track),
                None => {
                    output.set_current_time(0.0);
                    state.last_progress = 0.0;
                    effects.subscribers = true;
                    effects.touch(state.current_playlist());
                }
            }
        });
    }

    pub fn stop(&self) {
        self.mutate(|state, output, effects| {
            output.pause();
            output.unload();
            effects.touch(state.current_playlist());
            state.current = None;
            state.queue.clear();
            state.removed_current = false;
            state.mini_player_visible = false;
            state.last_progress = 0.0;
            effects.subscribers = true;
        });
    }

    pub fn add_to_queue(&self, track: &Track, original_index: usize, origin: Option<TrackOrigin>) {
        self.mutate(|state, _, effects| {
            state.queue.push(track, original_index, origin.as_ref());
            effects.subscribers = true;
        });
    }

    /// Replaces the queue with `tracks`, starting at `start_index`. Does not
    /// start playback.
    pub fn add_playlist_to_queue(
        &self,
        tracks: &[Track],
        start_index: usize,
        origin: Option<TrackOrigin>,
    ) {
        self.mutate(|state, _, effects| {
            let rng = if state.shuffle {
                Some(&mut *state.rng)
            } else {
                None
            };
            state
                .queue
                .populate(tracks, start_index, origin.as_ref(), rng);
            state.removed_current = false;
            effects.subscribers = true;
        });
    }

    pub fn remove_from_queue(&self, index: usize) {
        self.mutate(|state, _, effects| {
            let was_current = state.current.is_some() && index == state.queue.index();
            if state.queue.remove(index).is_some() {
                if was_current {
                    state.removed_current = index < state.queue.items().len();
                }
                effects.subscribers = true;
            }
        });
    }

    pub fn reorder_queue(&self, from: usize, to: usize) {
        self.mutate(|state, _, effects| {
            if from != to && state.queue.reorder(from, to) {
                effects.subscribers = true;
            }
        });
    }

    /// Enabling shuffle reorders the queue around the current item.
    /// Disabling it leaves the shuffled order in place.
    pub fn toggle_shuffle(&self) {
        self.mutate(|state, _, effects| {
            state.shuffle = !state.shuffle;
            if state.shuffle {
                state.queue.shuffle_around_current(&mut *state.rng);
            }
            effects.subscribers = true;
        });
    }

    pub fn toggle_loop(&self) {
        self.mutate(|state, _, effects| {
            state.looping = !state.looping;
            effects.subscribers = true;
        });
    }

    pub fn toggle_queue_expanded(&self) {
        self.mutate(|state, _, effects| {
            state.queue_expanded = !state.queue_expanded;
            effects.subscribers = true;
        });
    }

    /// Entry point for the output handle's event stream.
    pub fn handle_media_event(&self, event: MediaEvent) {
        let step = self.inner.config.progress_step_secs;
        match event {
            MediaEvent::Play | MediaEvent::Pause => {
                let playing = event == MediaEvent::Play;
                self.mutate(|state, _, effects| {
                    if state.is_playing == playing {
                        return;
                    }
                    state.is_playing = playing;
                    effects.subscribers = true;
                    effects.touch(state.current_playlist());
                });
            }
            MediaEvent::TimeUpdate => self.mutate(|state, output, effects| {
                if state.current.is_none() {
                    return;
                }
                let now = output.current_time();
                if (now - state.last_progress).abs() < step {
                    return;
                }
                state.last_progress = now;
                effects.subscribers = true;
                effects.touch(state.current_playlist());
            }),
            MediaEvent::LoadedMetadata => self.mutate(|state, output, effects| {
                let duration = output.duration().and_then(usable_duration);
                let Some(current) = state.current.as_mut() else {
                    return;
                };
                if current.duration.is_none() {
                    current.duration = duration.map(|d| d as f32);
                }
                effects.subscribers = true;
                effects.touch(state.current_playlist());
            }),
            MediaEvent::Ended => self.play_next(),
            MediaEvent::Error(code) => {
                let src = self
                    .inner
                    .state
                    .borrow()
                    .current
                    .as_ref()
                    .map(|c| c.src.clone());
                warn!(code, reason = describe_media_error(code), src = ?src, "media source failed");
            }
        }
    }

    /// Waveform for any source, decoded on first access and cached.
    pub fn waveform_data(&self, src: &str) -> LocalBoxFuture<'static, Rc<WaveformData>> {
        let cache = Rc::clone(&self.inner.waveforms);
        let src = src.to_string();
        async move { cache.get_or_load(&src).await }.boxed_local()
    }

    fn load_track(
        &self,
        state: &mut State,
        output: &mut dyn OutputHandle,
        effects: &mut Effects,
        mut track: TrackRef,
    ) {
        effects.touch(state.current_playlist());
        effects.touch(track.playlist_id.clone());

        if track.peaks.is_none() {
            match self.inner.waveforms.cached(&track.src) {
                Some(data) => {
                    track.peaks = Some(data.peaks.clone());
                    track.duration = track.duration.or(Some(data.duration));
                }
                None => effects.waveform = Some(track.src.clone()),
            }
        }

        debug!(src = %track.src, title = %track.title, "loading track");
        output.load(&track.src);
        output.play();
        state.current = Some(track);
        state.removed_current = false;
        state.mini_player_visible = true;
        state.last_progress = 0.0;
        effects.subscribers = true;
    }

    fn apply_waveform(&self, src: &str, data: &WaveformData) {
        self.mutate(|state, _, effects| {
            let Some(current) = state.current.as_mut().filter(|c| c.src == src) else {
                debug!(%src, "dropping waveform for a track that is no longer current");
                return;
            };
            current.peaks = Some(data.peaks.clone());
            if current.duration.is_none() && data.duration > 0.0 {
                current.duration = Some(data.duration);
            }
            effects.subscribers = true;
        });
    }

    fn resolve_waveform(&self, src: String) {
        let cache = Rc::clone(&self.inner.waveforms);
        let controller = Rc::downgrade(&self.inner);
        (self.inner.spawner)(
            async move {
                let data = cache.get_or_load(&src).await;
                if let Some(inner) = controller.upgrade() {
                    PlaybackController { inner }.apply_waveform(&src, &data);
                }
            }
            .boxed_local(),
        );
    }

    fn mutate(&self, op: impl FnOnce(&mut State, &mut dyn OutputHandle, &mut Effects)) {
        let (notices, waveform) = {
            let mut state = self.inner.state.borrow_mut();
            if state.torn_down {
                return;
            }
            let mut output = self.inner.output.borrow_mut();
            let mut effects = Effects::default();
            op(&mut *state, &mut **output, &mut effects);

            let mut notices = Vec::new();
            for id in &effects.playlists {
                if let Some(playlist) = state.playlists.get(id) {
                    let view = state.view_for(&**output, id);
                    notices.push(Notice::Playlist(Rc::clone(&playlist.render), view));
                }
            }
            if effects.subscribers {
                notices.push(Notice::Subscribers(Rc::new(state.snapshot(&**output))));
            }
            (notices, effects.waveform)
        };

        self.dispatch(notices);
        if let Some(src) = waveform {
            self.resolve_waveform(src);
        }
    }

    fn dispatch(&self, notices: Vec<Notice>) {
        self.inner.pending.borrow_mut().extend(notices);
        if self.inner.dispatching.replace(true) {
            return;
        }
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(notice) = next else {
                break;
            };
            match notice {
                Notice::Playlist(render, view) => render(&view),
                Notice::Subscribers(snapshot) => {
                    for callback in self.inner.subscribers.callbacks() {
                        callback(&snapshot);
                    }
                }
            }
        }
        self.inner.dispatching.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::output::mock::RecordingHandle;
    use crate::playback::waveform::spy::CountingDecoder;
    use std::collections::HashSet;
    use tokio_test::block_on;

    struct Harness {
        controller: PlaybackController,
        handle: RecordingHandle,
        spawned: Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>>,
        decodes: Rc<Cell<usize>>,
    }

    impl Harness {
        fn new() -> Self {
            let handle = RecordingHandle::default();
            let (decoder, decodes) = CountingDecoder::ok(vec![vec![0.5, -1.0, 0.25, 0.75]], 180.0);
            let spawned = Rc::new(RefCell::new(Vec::new()));
            let spawner: Spawner = {
                let spawned = Rc::clone(&spawned);
                Rc::new(move |future: LocalBoxFuture<'static, ()>| {
                    spawned.borrow_mut().push(future)
                })
            };
            let controller = PlaybackController::create(
                Box::new(handle.clone()),
                Box::new(decoder),
                spawner,
                PlayerConfig::default(),
            )
            .with_rng(StdRng::seed_from_u64(5));

            Self {
                controller,
                handle,
                spawned,
                decodes,
            }
        }

        fn run_spawned(&self) {
            let futures: Vec<_> = self.spawned.borrow_mut().drain(..).collect();
            for future in futures {
                block_on(future);
            }
        }

        fn register(&self, id: &str, tracks: &[Track]) -> Rc<RefCell<Vec<PlaylistView>>> {
            let views = Rc::new(RefCell::new(Vec::new()));
            let sink = Rc::clone(&views);
            self.controller.register_playlist(
                id,
                tracks.to_vec(),
                move |view: &PlaylistView| sink.borrow_mut().push(view.clone()),
                format!("playlist-{id}"),
            );
            views
        }

        fn play(&self, tracks: &[Track], index: usize, playlist: &str) {
            self.controller
                .play_track(&tracks[index], index, TrackOrigin::new(playlist, "/listen/music"));
        }

        fn queue_titles(&self) -> Vec<String> {
            self.controller
                .snapshot()
                .queue
                .iter()
                .map(|item| item.title.clone())
                .collect()
        }

        fn current_title(&self) -> Option<String> {
            self.controller.snapshot().current_track.map(|t| t.title)
        }
    }

    fn tracks(names: &[&str]) -> Vec<Track> {
        names
            .iter()
            .map(|name| Track::new(format!("/audio/{name}.mp3"), *name))
            .collect()
    }

    fn record_snapshots(controller: &PlaybackController) -> (Rc<RefCell<Vec<PlaybackSnapshot>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let subscription = controller.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.clone()));
        (seen, subscription)
    }

    #[test]
    fn play_track_fills_empty_queue_from_active_playlist() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C", "D"]);
        h.register("mixes", &list);

        h.play(&list, 2, "mixes");

        let snapshot = h.controller.snapshot();
        assert_eq!(h.queue_titles(), vec!["C", "D", "A", "B"]);
        assert_eq!(snapshot.queue_index, 0);
        assert_eq!(h.current_title().as_deref(), Some("C"));
        assert!(snapshot.mini_player_visible);
        assert_eq!(h.handle.src().as_deref(), Some("/audio/C.mp3"));
        assert_eq!(h.handle.last_call().as_deref(), Some("play"));
    }

    #[test]
    fn earlier_mounted_playlist_still_fills_the_queue() {
        let h = Harness::new();
        let piano = tracks(&["P1", "P2", "P3", "P4"]);
        h.register("piano", &piano);
        h.register("field", &tracks(&["F1", "F2"]));

        h.play(&piano, 0, "piano");
        assert_eq!(h.queue_titles(), vec!["P1", "P2", "P3", "P4"]);

        h.controller.play_next();
        assert_eq!(h.current_title().as_deref(), Some("P2"));
        assert_eq!(h.handle.last_call().as_deref(), Some("play"));
    }

    #[test]
    fn unregistered_origin_falls_back_to_latest_mounted_playlist() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);

        h.play(&list, 1, "gone");
        assert_eq!(h.queue_titles(), vec!["B", "C", "A"]);

        let h = Harness::new();
        h.register("mixes", &tracks(&["X", "Y"]));
        h.play(&list, 1, "gone");
        assert_eq!(h.queue_titles(), vec!["B"]);
    }

    #[test]
    fn play_track_selects_or_inserts_into_existing_queue() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");

        h.play(&list, 2, "mixes");
        assert_eq!(h.controller.snapshot().queue_index, 2);

        let extra = tracks(&["Z"]);
        h.controller
            .play_track(&extra[0], 0, TrackOrigin::new("other", "/listen/other"));
        assert_eq!(h.queue_titles(), vec!["A", "B", "C", "Z"]);
        assert_eq!(h.controller.snapshot().queue_index, 3);
        assert_eq!(h.current_title().as_deref(), Some("Z"));
    }

    #[test]
    fn is_playing_only_follows_media_events() {
        let h = Harness::new();
        let list = tracks(&["A"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        assert!(!h.controller.snapshot().is_playing);

        h.controller.handle_media_event(MediaEvent::Play);
        assert!(h.controller.snapshot().is_playing);

        h.controller.toggle_play();
        assert_eq!(h.handle.last_call().as_deref(), Some("pause"));
        assert!(h.controller.snapshot().is_playing);

        h.controller.handle_media_event(MediaEvent::Pause);
        assert!(!h.controller.snapshot().is_playing);
    }

    #[test]
    fn toggle_play_without_source_does_nothing() {
        let h = Harness::new();
        h.controller.toggle_play();
        assert!(h.handle.calls().is_empty());
    }

    #[test]
    fn play_next_stops_after_the_last_item_and_keeps_track() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");

        h.controller.play_next();
        h.controller.play_next();
        assert_eq!(h.current_title().as_deref(), Some("C"));
        assert_eq!(h.handle.last_call().as_deref(), Some("play"));

        h.controller.play_next();
        assert_eq!(h.handle.last_call().as_deref(), Some("pause"));
        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.queue_index, 2);
        assert_eq!(snapshot.queue.len(), 3);
        assert_eq!(h.current_title().as_deref(), Some("C"));

        let loads_before = h.handle.calls().iter().filter(|c| c.starts_with("load")).count();
        h.controller.play_next();
        h.controller.play_next();
        let loads_after = h.handle.calls().iter().filter(|c| c.starts_with("load")).count();
        assert_eq!(loads_before, loads_after);
        assert_eq!(h.controller.snapshot().queue_index, 2);
        assert_eq!(h.current_title().as_deref(), Some("C"));
    }

    #[test]
    fn play_next_cycles_when_looping() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        h.controller.toggle_loop();

        let mut indices = Vec::new();
        for _ in 0..6 {
            h.controller.play_next();
            indices.push(h.controller.snapshot().queue_index);
        }
        assert_eq!(indices, vec![1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn ended_event_advances_the_queue() {
        let h = Harness::new();
        let list = tracks(&["A", "B"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");

        h.controller.handle_media_event(MediaEvent::Ended);
        assert_eq!(h.current_title().as_deref(), Some("B"));
    }

    #[test]
    fn play_prev_restarts_when_past_threshold() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        h.controller.play_next();
        h.handle.set_time(5.0, Some(200.0));

        h.controller.play_prev();

        assert_eq!(h.handle.current_time(), 0.0);
        assert_eq!(h.controller.snapshot().queue_index, 1);
        assert_eq!(h.current_title().as_deref(), Some("B"));
    }

    #[test]
    fn play_prev_steps_back_then_restarts_at_head() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        h.controller.play_next();
        h.handle.set_time(1.0, Some(200.0));

        h.controller.play_prev();
        assert_eq!(h.current_title().as_deref(), Some("A"));

        h.handle.set_time(2.0, Some(200.0));
        h.controller.play_prev();
        assert_eq!(h.controller.snapshot().queue_index, 0);
        assert_eq!(h.handle.current_time(), 0.0);

        h.controller.toggle_loop();
        h.controller.play_prev();
        assert_eq!(h.controller.snapshot().queue_index, 2);
        assert_eq!(h.current_title().as_deref(), Some("C"));
    }

    #[test]
    fn seek_needs_a_known_duration() {
        let h = Harness::new();
        let list = tracks(&["A"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");

        h.controller.seek(0.5);
        assert!(!h.handle.calls().iter().any(|c| c.starts_with("seek")));

        h.handle.set_time(0.0, Some(200.0));
        h.controller.seek(0.25);
        assert_eq!(h.handle.current_time(), 50.0);

        h.controller.seek(4.0);
        assert_eq!(h.handle.current_time(), 200.0);
    }

    #[test]
    fn enabling_shuffle_pins_the_playing_item() {
        let h = Harness::new();
        for (i, track) in tracks(&["A", "B", "C", "D"]).iter().enumerate() {
            h.controller.add_to_queue(track, i, None);
        }
        h.controller.play_queue_item(2);
        assert_eq!(h.current_title().as_deref(), Some("C"));

        h.controller.toggle_shuffle();
        let snapshot = h.controller.snapshot();
        assert!(snapshot.shuffle);
        assert_eq!(snapshot.queue_index, 0);
        assert_eq!(snapshot.queue[0].title, "C");
        let rest: HashSet<String> = snapshot.queue[1..].iter().map(|i| i.title.clone()).collect();
        let expected: HashSet<String> = ["A", "B", "D"].iter().map(|s| s.to_string()).collect();
        assert_eq!(rest, expected);

        let shuffled = h.queue_titles();
        h.controller.toggle_shuffle();
        assert!(!h.controller.snapshot().shuffle);
        assert_eq!(h.queue_titles(), shuffled);
    }

    #[test]
    fn shuffled_population_starts_with_clicked_track() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C", "D", "E"]);
        h.register("mixes", &list);
        h.controller.toggle_shuffle();

        h.play(&list, 3, "mixes");

        let titles = h.queue_titles();
        assert_eq!(titles[0], "D");
        let rest: HashSet<&str> = titles[1..].iter().map(String::as_str).collect();
        assert_eq!(rest, HashSet::from(["A", "B", "C", "E"]));
    }

    #[test]
    fn add_playlist_to_queue_rotates_without_playing() {
        let h = Harness::new();
        h.controller
            .add_playlist_to_queue(&tracks(&["A", "B", "C", "D"]), 2, None);

        assert_eq!(h.queue_titles(), vec!["C", "D", "A", "B"]);
        assert_eq!(h.controller.snapshot().queue_index, 0);
        assert!(h.handle.src().is_none());
    }

    #[test]
    fn queue_edits_keep_the_current_item() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C", "D"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        h.controller.play_queue_item(2);

        h.controller.remove_from_queue(0);
        assert_eq!(h.controller.snapshot().queue_index, 1);

        h.controller.reorder_queue(1, 0);
        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.queue_index, 0);
        assert_eq!(snapshot.queue[0].title, "C");

        h.controller.remove_from_queue(0);
        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.queue_index, 0);
        assert_eq!(snapshot.queue.len(), 2);

        h.controller.remove_from_queue(10);
        assert_eq!(h.controller.snapshot().queue.len(), 2);
    }

    #[test]
    fn next_after_removing_the_playing_item_plays_its_successor() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        h.controller.play_next();
        assert_eq!(h.current_title().as_deref(), Some("B"));

        h.controller.remove_from_queue(1);
        assert_eq!(h.current_title().as_deref(), Some("B"));
        assert_eq!(h.queue_titles(), vec!["A", "C"]);

        h.controller.play_next();
        assert_eq!(h.current_title().as_deref(), Some("C"));
        assert_eq!(h.handle.src().as_deref(), Some("/audio/C.mp3"));
        assert_eq!(h.controller.snapshot().queue_index, 1);

        h.controller.play_next();
        assert_eq!(h.handle.last_call().as_deref(), Some("pause"));
        assert_eq!(h.current_title().as_deref(), Some("C"));
    }

    #[test]
    fn removing_the_playing_tail_item_exhausts_on_next() {
        let h = Harness::new();
        let list = tracks(&["A", "B"]);
        h.register("mixes", &list);
        h.play(&list, 1, "mixes");
        assert_eq!(h.queue_titles(), vec!["B", "A"]);
        h.controller.play_next();
        assert_eq!(h.current_title().as_deref(), Some("A"));

        h.controller.remove_from_queue(1);
        h.controller.play_next();
        assert_eq!(h.handle.last_call().as_deref(), Some("pause"));
        assert_eq!(h.current_title().as_deref(), Some("A"));
    }

    #[test]
    fn media_errors_leave_state_untouched() {
        let h = Harness::new();
        let list = tracks(&["A", "B"]);
        let views = h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        h.controller.handle_media_event(MediaEvent::Play);
        let (seen, _subscription) = record_snapshots(&h.controller);
        let before = h.controller.snapshot();
        let views_before = views.borrow().len();
        let calls_before = h.handle.calls();

        h.controller.handle_media_event(MediaEvent::Error(4));

        assert_eq!(h.controller.snapshot(), before);
        assert!(seen.borrow().is_empty());
        assert_eq!(views.borrow().len(), views_before);
        assert_eq!(h.handle.calls(), calls_before);
    }

    #[test]
    fn stop_tears_down_playback_and_clears_highlight() {
        let h = Harness::new();
        let list = tracks(&["A", "B"]);
        let views = h.register("mixes", &list);
        h.play(&list, 1, "mixes");
        assert_eq!(views.borrow().last().and_then(|v| v.active_index), Some(1));

        h.controller.stop();

        let snapshot = h.controller.snapshot();
        assert!(snapshot.current_track.is_none());
        assert!(snapshot.queue.is_empty());
        assert!(!snapshot.mini_player_visible);
        assert!(h.handle.src().is_none());
        assert_eq!(views.borrow().last(), Some(&PlaylistView::default()));
    }

    #[test]
    fn queue_ids_are_never_reused() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        let mut seen = HashSet::new();

        for round in 0..3 {
            h.play(&list, round % list.len(), "mixes");
            h.controller.add_to_queue(&list[0], 0, None);
            for item in h.controller.snapshot().queue {
                assert!(seen.insert(item.id()), "duplicate id {:?}", item.id());
            }
            h.controller.stop();
        }
    }

    #[test]
    fn remounted_playlist_renders_current_position_immediately() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        h.play(&list, 2, "mixes");
        h.controller.handle_media_event(MediaEvent::Play);
        h.handle.set_time(42.0, Some(120.0));

        h.controller.unregister_playlist(&PlaylistId::from("mixes"));
        let views = h.register("mixes", &list);

        let views = views.borrow();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].active_index, Some(2));
        assert!(views[0].is_playing);
        assert_eq!(views[0].current_time, 42.0);
        assert_eq!(views[0].duration, Some(120.0));
    }

    #[test]
    fn other_playlists_are_not_told_about_progress() {
        let h = Harness::new();
        let list = tracks(&["A", "B"]);
        let playing = h.register("playing", &list);
        h.play(&list, 0, "playing");
        let idle = h.register("idle", &tracks(&["X"]));

        h.handle.set_time(1.0, Some(60.0));
        h.controller.handle_media_event(MediaEvent::TimeUpdate);

        assert!(idle.borrow().is_empty());
        assert_eq!(playing.borrow().last().map(|v| v.current_time), Some(1.0));
    }

    #[test]
    fn time_updates_are_throttled() {
        let h = Harness::new();
        let list = tracks(&["A"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        let (seen, _subscription) = record_snapshots(&h.controller);

        h.handle.set_time(0.1, Some(60.0));
        h.controller.handle_media_event(MediaEvent::TimeUpdate);
        assert!(seen.borrow().is_empty());

        h.handle.set_time(0.6, Some(60.0));
        h.controller.handle_media_event(MediaEvent::TimeUpdate);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].current_time, 0.6);
    }

    #[test]
    fn unsubscribed_callbacks_stop_receiving() {
        let h = Harness::new();
        let (seen, subscription) = record_snapshots(&h.controller);
        h.controller.toggle_loop();
        subscription.unsubscribe();
        h.controller.toggle_loop();
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].looping);
    }

    #[test]
    fn reentrant_callbacks_see_consistent_ordered_state() {
        let h = Harness::new();
        let list = tracks(&["A", "B", "C"]);
        h.register("mixes", &list);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let triggered = Rc::new(Cell::new(false));

        let _first = {
            let controller = h.controller.clone();
            let triggered = Rc::clone(&triggered);
            h.controller.subscribe(move |snapshot| {
                if snapshot.queue_index == 0 && !triggered.replace(true) {
                    controller.play_next();
                }
            })
        };
        let _second = {
            let seen = Rc::clone(&seen);
            h.controller.subscribe(move |snapshot: &PlaybackSnapshot| {
                let queued = snapshot.queue.get(snapshot.queue_index).map(|i| i.src.clone());
                let current = snapshot.current_track.as_ref().map(|t| t.src.clone());
                seen.borrow_mut().push((snapshot.queue_index, queued == current));
            })
        };

        h.play(&list, 0, "mixes");

        assert_eq!(*seen.borrow(), vec![(0, true), (1, true)]);
        assert_eq!(h.current_title().as_deref(), Some("B"));
    }

    #[test]
    fn waveform_resolves_after_playback_starts() {
        let h = Harness::new();
        let list = tracks(&["A"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");

        assert_eq!(h.handle.last_call().as_deref(), Some("play"));
        assert!(h.controller.snapshot().current_track.unwrap().peaks.is_none());

        h.run_spawned();
        let track = h.controller.snapshot().current_track.unwrap();
        assert_eq!(track.peaks.map(|p| p.len()), Some(96));
        assert_eq!(track.duration, Some(180.0));
        assert_eq!(h.decodes.get(), 1);
    }

    #[test]
    fn stale_waveform_is_not_applied_to_the_new_track() {
        let h = Harness::new();
        let list = tracks(&["A", "B"]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");
        h.controller.play_next();

        let (seen, _subscription) = record_snapshots(&h.controller);
        h.run_spawned();

        assert_eq!(h.decodes.get(), 2);
        assert_eq!(seen.borrow().len(), 1);
        let track = h.controller.snapshot().current_track.unwrap();
        assert_eq!(track.title, "B");
        assert!(track.peaks.is_some());
    }

    #[test]
    fn authored_peaks_skip_decoding() {
        let h = Harness::new();
        let mut list = tracks(&["A"]);
        list[0].peaks = Some(vec![0.2, 0.4]);
        h.register("mixes", &list);
        h.play(&list, 0, "mixes");

        assert!(h.spawned.borrow().is_empty());
        assert_eq!(
            h.controller.snapshot().current_track.unwrap().peaks,
            Some(vec![0.2, 0.4])
        );
    }

    #[test]
    fn waveform_data_is_cached_per_source() {
        let h = Harness::new();
        let first = block_on(h.controller.waveform_data("/audio/A.mp3"));
        let second = block_on(h.controller.waveform_data("/audio/A.mp3"));

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(h.decodes.get(), 1);
    }

    #[test]
    fn teardown_silences_the_controller() {
        let h = Harness::new();
        let list = tracks(&["A", "B"]);
        h.register("mixes", &list);
        let (seen, _subscription) = record_snapshots(&h.controller);
        h.play(&list, 0, "mixes");
        let before = seen.borrow().len();

        h.controller.teardown();
        h.controller.play_next();
        h.controller.toggle_loop();

        assert_eq!(seen.borrow().len(), before);
        assert!(h.handle.src().is_none());
        assert!(h.controller.snapshot().queue.is_empty());
    }

    #[test]
    fn queue_panel_flag_toggles() {
        let h = Harness::new();
        h.controller.toggle_queue_expanded();
        assert!(h.controller.snapshot().queue_expanded);
        h.controller.toggle_queue_expanded();
        assert!(!h.controller.snapshot().queue_expanded);
    }
}
