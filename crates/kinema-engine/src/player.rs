//! Real-time playback and per-frame synchronization.
//!
//! [`Player`] advances the current frame from a recurring tick. Independently
//! of play state, a [`FrameSync`] subscriber recomputes visibility and
//! interpolated props whenever the current frame changes, whatever changed it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use kinema_core::value::PropMap;
use kinema_store::timeline::is_visible_at;
use kinema_store::{component_types, interpolate, Action, Store, StoreState, SubscriberId};

/// Handle of a scheduled recurring tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Source of the per-refresh tick callback (the display's frame clock).
///
/// While a request is active the host calls [`Player::tick`] once per
/// refresh with a monotonic timestamp in milliseconds.
pub trait FrameScheduler {
    fn schedule(&mut self) -> FrameRequest;
    fn cancel(&mut self, request: FrameRequest);
}

/// A scheduler driven by hand, for tests and headless runs.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    active: HashSet<FrameRequest>,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        !self.active.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule(&mut self) -> FrameRequest {
        self.next += 1;
        let request = FrameRequest(self.next);
        self.active.insert(request);
        request
    }

    fn cancel(&mut self, request: FrameRequest) {
        if self.active.remove(&request) {
            self.cancelled += 1;
        }
    }
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for Rc<RefCell<S>> {
    fn schedule(&mut self) -> FrameRequest {
        self.borrow_mut().schedule()
    }

    fn cancel(&mut self, request: FrameRequest) {
        self.borrow_mut().cancel(request)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Paused,
    Playing,
}

/// Drives the current frame forward in real time.
pub struct Player {
    store: Rc<Store>,
    scheduler: Box<dyn FrameScheduler>,
    state: PlayerState,
    request: Option<FrameRequest>,
    last_tick: Option<f64>,
    accumulated_ms: f64,
    loop_playback: bool,
    sync: Rc<RefCell<FrameSync>>,
    subscription: SubscriberId,
}

impl Player {
    /// Create a stopped player and subscribe its frame sync to `store`.
    pub fn new(store: Rc<Store>, scheduler: Box<dyn FrameScheduler>) -> Self {
        let sync = Rc::new(RefCell::new(FrameSync::new(Rc::downgrade(&store))));
        let handle = sync.clone();
        let subscription = store.subscribe(move |state| match handle.try_borrow_mut() {
            Ok(mut sync) => {
                sync.on_state(state);
            }
            Err(_) => tracing::trace!("frame sync busy; change picked up by the running pass"),
        });
        Self {
            store,
            scheduler,
            state: PlayerState::Stopped,
            request: None,
            last_tick: None,
            accumulated_ms: 0.0,
            loop_playback: true,
            sync,
            subscription,
        }
    }

    /// Whether playback wraps to frame 0 past the end (otherwise it pauses there).
    pub fn set_loop(&mut self, loop_playback: bool) {
        self.loop_playback = loop_playback;
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn current_frame(&self) -> u32 {
        self.store.with_state(|s| s.current_frame())
    }

    pub fn play(&mut self) {
        if self.state == PlayerState::Playing {
            return;
        }
        self.request = Some(self.scheduler.schedule());
        self.last_tick = None;
        self.accumulated_ms = 0.0;
        self.state = PlayerState::Playing;
        self.store.set_playing(true);
        tracing::debug!(frame = self.current_frame(), "playback started");
    }

    pub fn pause(&mut self) {
        if self.state != PlayerState::Playing {
            return;
        }
        self.cancel_request();
        self.state = PlayerState::Paused;
        self.store.set_playing(false);
    }

    /// Stop and rewind to frame 0. A no-op when already stopped.
    pub fn stop(&mut self) {
        if self.state == PlayerState::Stopped {
            return;
        }
        self.cancel_request();
        self.state = PlayerState::Stopped;
        self.store.batch(vec![
            Action::SetPlaying { playing: false },
            Action::SetCurrentFrame { frame: 0 },
        ]);
    }

    pub fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jump to `frame` (scrubbing). Frames past the end wrap to 0.
    pub fn seek(&mut self, frame: u32) {
        let end = self.store.with_state(|s| s.effective_end_frame());
        let frame = if frame > end { 0 } else { frame };
        self.store.set_current_frame(frame);
    }

    /// One refresh of the frame clock. Advances at most one frame, however
    /// long it has been since the previous tick. Returns whether it advanced.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if self.state != PlayerState::Playing {
            return false;
        }
        let Some(last) = self.last_tick.replace(now_ms) else {
            return false;
        };
        self.accumulated_ms += (now_ms - last).max(0.0);

        let (fps, current, end) = self
            .store
            .with_state(|s| (s.playback.fps, s.current_frame(), s.effective_end_frame()));
        if fps == 0 {
            return false;
        }
        if self.accumulated_ms < 1000.0 / f64::from(fps) {
            return false;
        }
        self.accumulated_ms = 0.0;

        let next = current.saturating_add(1);
        if next > end {
            if !self.loop_playback {
                self.pause();
                return false;
            }
            self.store.set_current_frame(0);
        } else {
            self.store.set_current_frame(next);
        }
        true
    }

    /// Recompute visibility and interpolated props for the current frame now.
    pub fn resync(&mut self) {
        let state = self.store.state();
        self.sync.borrow_mut().force(&state);
    }

    fn cancel_request(&mut self) {
        if let Some(request) = self.request.take() {
            self.scheduler.cancel(request);
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.cancel_request();
        self.store.unsubscribe(self.subscription);
    }
}

/// Store subscriber applying the current frame to every timeline layer.
pub struct FrameSync {
    store: Weak<Store>,
    last_frame: Option<u32>,
}

impl FrameSync {
    pub fn new(store: Weak<Store>) -> Self {
        Self {
            store,
            last_frame: None,
        }
    }

    fn on_state(&mut self, state: &StoreState) {
        let frame = state.current_frame();
        if self.last_frame == Some(frame) {
            return;
        }
        self.force(state);
    }

    fn force(&mut self, state: &StoreState) {
        let frame = state.current_frame();
        self.last_frame = Some(frame);
        let actions = frame_actions(state, frame);
        if actions.is_empty() {
            return;
        }
        let Some(store) = self.store.upgrade() else {
            return;
        };
        tracing::trace!(frame, count = actions.len(), "applying frame");
        store.batch(actions);
    }
}

/// The store updates that bring every object on a timeline layer to `frame`:
/// an `active` flip where visibility changed and a props patch with the
/// interpolated value of every keyframed property of visible objects.
///
/// Dangling ids are skipped.
pub fn frame_actions(state: &StoreState, frame: u32) -> Vec<Action> {
    let mut actions = Vec::new();
    for layer in state.layers.values().filter(|l| l.has_timeline) {
        for go_id in state.layer_game_objects(&layer.id) {
            let Some(go) = state.game_object(&go_id) else {
                continue;
            };
            let visible = is_visible_at(&layer.clips, go.born_frame_id, frame);
            if go.active != visible {
                actions.push(Action::SetGameObjectActive {
                    game_object_id: go_id.clone(),
                    active: visible,
                });
            }
            if !visible {
                continue;
            }
            for component in state.components_of(&go_id) {
                if component.is_type(component_types::TIMELINE) || !component.has_keyframes() {
                    continue;
                }
                let patch: PropMap = component
                    .key_frames
                    .iter()
                    .filter_map(|(prop, track)| {
                        interpolate(track, f64::from(frame)).map(|value| (prop.clone(), value))
                    })
                    .filter(|(prop, value)| component.props.get(prop) != Some(value))
                    .collect();
                if !patch.is_empty() {
                    actions.push(Action::UpdateProps {
                        component_id: component.id.clone(),
                        patch,
                    });
                }
            }
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinema_store::{NewGameObject, ParentRef, ProjectSettings};
    use serde_json::json;

    fn store_with_object() -> (Rc<Store>, kinema_store::GameObjectId, kinema_store::ComponentId) {
        let store = Rc::new(Store::new());
        store.create_project("p", ProjectSettings::custom(100, 100, 10, 20));
        let scene = store.create_scene("s").unwrap();
        let layer = store.create_layer(&scene, "l", true).unwrap();
        store.add_clip(&layer, 0, 20).unwrap();
        let go = store
            .create_game_object(NewGameObject::new(ParentRef::Layer(layer), "g"))
            .unwrap();
        let transform = store
            .with_state(|s| s.component_of_type(&go, component_types::TRANSFORM).map(|c| c.id.clone()))
            .unwrap();
        (store, go, transform)
    }

    #[test]
    fn test_first_tick_only_primes_the_clock() {
        let (store, _, _) = store_with_object();
        let mut player = Player::new(store.clone(), Box::new(ManualScheduler::new()));
        player.play();
        assert!(!player.tick(0.0));
        assert!(player.tick(100.0));
        assert_eq!(store.state().current_frame(), 1);
    }

    #[test]
    fn test_long_stall_advances_one_frame() {
        let (store, _, _) = store_with_object();
        let mut player = Player::new(store.clone(), Box::new(ManualScheduler::new()));
        player.play();
        player.tick(0.0);
        assert!(player.tick(5_000.0));
        assert_eq!(store.state().current_frame(), 1);
        assert!(!player.tick(5_050.0));
        assert!(player.tick(5_100.0));
        assert_eq!(store.state().current_frame(), 2);
    }

    #[test]
    fn test_wraps_after_end_frame() {
        let (store, _, _) = store_with_object();
        store.set_current_frame(19);
        let mut player = Player::new(store.clone(), Box::new(ManualScheduler::new()));
        player.play();
        player.tick(0.0);
        player.tick(100.0);
        assert_eq!(store.state().current_frame(), 0);
    }

    #[test]
    fn test_end_frame_override_wraps_early() {
        let (store, _, _) = store_with_object();
        store.set_animation_end_frame(Some(5));
        store.set_current_frame(5);
        let mut player = Player::new(store.clone(), Box::new(ManualScheduler::new()));
        player.play();
        player.tick(0.0);
        player.tick(100.0);
        assert_eq!(store.state().current_frame(), 0);
    }

    #[test]
    fn test_pause_and_stop_are_idempotent() {
        let (store, _, _) = store_with_object();
        let scheduler = Rc::new(RefCell::new(ManualScheduler::new()));
        let mut player = Player::new(store.clone(), Box::new(scheduler.clone()));
        player.stop();
        player.pause();
        assert_eq!(player.state(), PlayerState::Stopped);

        player.play();
        assert!(scheduler.borrow().is_active());
        store.set_current_frame(7);
        player.pause();
        player.pause();
        assert!(!scheduler.borrow().is_active());
        assert_eq!(scheduler.borrow().cancelled_count(), 1);
        assert_eq!(store.state().current_frame(), 7);

        player.stop();
        assert_eq!(store.state().current_frame(), 0);
        assert!(!store.state().playback.is_playing);
        assert!(!player.tick(1_000.0));
    }

    #[test]
    fn test_scrubbing_interpolates_props() {
        let (store, _, transform) = store_with_object();
        let _player = Player::new(store.clone(), Box::new(ManualScheduler::new()));
        store.set_key_frame(&transform, "x", 0, json!(0.0));
        store.set_key_frame(&transform, "x", 10, json!(100.0));
        store.set_current_frame(5);
        let x = store.with_state(|s| s.component(&transform).unwrap().props["x"].clone());
        assert_eq!(x, json!(50.0));
    }

    #[test]
    fn test_frame_actions_skip_unchanged_values() {
        let (store, _, transform) = store_with_object();
        store.set_key_frame(&transform, "x", 0, json!(0.0));
        store.set_key_frame(&transform, "x", 10, json!(10.0));
        // props already hold x = 0 at frame 0
        assert!(frame_actions(&store.state(), 0).is_empty());
        assert_eq!(frame_actions(&store.state(), 4).len(), 1);
    }
}
