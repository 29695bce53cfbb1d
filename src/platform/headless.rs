//! Recording host implementations
//!
//! No engine behind them: every command is written to a shared record that
//! the caller can inspect. Used by the demo binary and the tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use glam::Vec3;

use super::{EntityWorld, Presentation, SceneLoad, SceneLoader};
use crate::persistence::KeyValueStore;
use crate::sim::{EntityKind, GameState, Handle, Host, Paddle};

/// Everything the headless world was told
#[derive(Debug, Clone, Default)]
pub struct WorldRecord {
    /// Entities currently alive
    pub live: BTreeMap<Handle, (EntityKind, Vec3)>,
    /// Every spawn, in order
    pub spawned: Vec<(Handle, EntityKind, Vec3)>,
    /// Every despawn, in order
    pub despawned: Vec<Handle>,
    /// Bricks currently marked non-solid
    pub non_solid: BTreeSet<Handle>,
    pub paddle: Option<Paddle>,
    pub time_scale: f32,
}

impl WorldRecord {
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Live entities matching `pred`
    pub fn count_live(&self, pred: impl Fn(&EntityKind) -> bool) -> usize {
        self.live.values().filter(|(kind, _)| pred(kind)).count()
    }
}

pub type WorldLog = Rc<RefCell<WorldRecord>>;

/// Entity world that only records
#[derive(Debug, Default)]
pub struct HeadlessWorld {
    log: WorldLog,
}

impl HeadlessWorld {
    pub fn log(&self) -> WorldLog {
        Rc::clone(&self.log)
    }
}

impl EntityWorld for HeadlessWorld {
    fn spawn(&mut self, handle: Handle, kind: EntityKind, position: Vec3) {
        let mut log = self.log.borrow_mut();
        log.live.insert(handle, (kind, position));
        log.spawned.push((handle, kind, position));
    }

    fn despawn(&mut self, handle: Handle) {
        let mut log = self.log.borrow_mut();
        log.live.remove(&handle);
        log.non_solid.remove(&handle);
        log.despawned.push(handle);
    }

    fn set_solid(&mut self, handle: Handle, solid: bool) {
        let mut log = self.log.borrow_mut();
        if solid {
            log.non_solid.remove(&handle);
        } else {
            log.non_solid.insert(handle);
        }
    }

    fn update_paddle(&mut self, paddle: &Paddle) {
        self.log.borrow_mut().paddle = Some(*paddle);
    }

    fn set_time_scale(&mut self, scale: f32) {
        self.log.borrow_mut().time_scale = scale;
    }
}

/// Last value of every display command
#[derive(Debug, Clone, Default)]
pub struct ScreenRecord {
    pub score: u32,
    pub level: u32,
    pub max_score: u32,
    pub final_score: Option<(u32, u32)>,
    pub life_alpha: BTreeMap<usize, f32>,
    pub brick_strength: BTreeMap<Handle, u32>,
    /// Every screen switch, in order
    pub screens: Vec<GameState>,
    pub quit_requested: bool,
}

impl ScreenRecord {
    /// Screen currently shown
    pub fn screen(&self) -> Option<GameState> {
        self.screens.last().copied()
    }
}

pub type ScreenLog = Rc<RefCell<ScreenRecord>>;

/// Presentation sink that only records
#[derive(Debug, Default)]
pub struct HeadlessPresentation {
    log: ScreenLog,
}

impl HeadlessPresentation {
    pub fn log(&self) -> ScreenLog {
        Rc::clone(&self.log)
    }
}

impl Presentation for HeadlessPresentation {
    fn write_score(&mut self, score: u32) {
        self.log.borrow_mut().score = score;
    }

    fn write_level(&mut self, level: u32) {
        self.log.borrow_mut().level = level;
    }

    fn write_max_score(&mut self, max_score: u32) {
        self.log.borrow_mut().max_score = max_score;
    }

    fn write_final_score(&mut self, score: u32, max_score: u32) {
        self.log.borrow_mut().final_score = Some((score, max_score));
    }

    fn set_life_alpha(&mut self, index: usize, alpha: f32) {
        self.log.borrow_mut().life_alpha.insert(index, alpha);
    }

    fn set_brick_strength(&mut self, brick: Handle, strength: u32) {
        self.log.borrow_mut().brick_strength.insert(brick, strength);
    }

    fn show_screen(&mut self, state: GameState) {
        self.log.borrow_mut().screens.push(state);
    }

    fn request_quit(&mut self) {
        self.log.borrow_mut().quit_requested = true;
    }
}

/// Scene loads and unloads seen so far
#[derive(Debug, Clone, Default)]
pub struct SceneRecord {
    pub loaded: Vec<String>,
    pub unloaded: Vec<String>,
    /// Polls left per in-flight load
    pending: BTreeMap<SceneLoad, u32>,
}

impl SceneRecord {
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

pub type SceneLog = Rc<RefCell<SceneRecord>>;

/// Scene loader that completes after a fixed number of polls
#[derive(Debug, Default)]
pub struct HeadlessScenes {
    /// Polls answered `false` before a load reports completion
    latency: u32,
    next_id: u32,
    log: SceneLog,
}

impl HeadlessScenes {
    pub fn new(latency: u32) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    pub fn log(&self) -> SceneLog {
        Rc::clone(&self.log)
    }
}

impl SceneLoader for HeadlessScenes {
    fn load_async(&mut self, name: &str) -> SceneLoad {
        self.next_id += 1;
        let load = SceneLoad(self.next_id);
        let mut log = self.log.borrow_mut();
        log.loaded.push(name.to_string());
        log.pending.insert(load, self.latency);
        load
    }

    fn is_complete(&mut self, load: SceneLoad) -> bool {
        let mut log = self.log.borrow_mut();
        let pending = &mut log.pending;
        match pending.get(&load).copied() {
            Some(0) => {
                pending.remove(&load);
                true
            }
            Some(left) => {
                pending.insert(load, left - 1);
                false
            }
            // Unknown or already reported loads count as done
            None => true,
        }
    }

    fn unload(&mut self, name: &str) {
        self.log.borrow_mut().unloaded.push(name.to_string());
    }
}

/// Shared views into a headless host
#[derive(Debug, Clone)]
pub struct HeadlessLogs {
    pub world: WorldLog,
    pub screen: ScreenLog,
    pub scenes: SceneLog,
}

/// Build a complete headless `Host` around `store`
pub fn host(scene_latency: u32, store: Box<dyn KeyValueStore>) -> (Host, HeadlessLogs) {
    let world = HeadlessWorld::default();
    let presentation = HeadlessPresentation::default();
    let scenes = HeadlessScenes::new(scene_latency);
    let logs = HeadlessLogs {
        world: world.log(),
        screen: presentation.log(),
        scenes: scenes.log(),
    };
    let host = Host {
        world: Box::new(world),
        presentation: Box::new(presentation),
        scenes: Box::new(scenes),
        store,
    };
    (host, logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_completes_after_latency() {
        let mut scenes = HeadlessScenes::new(2);
        let load = scenes.load_async("MainScene");
        assert!(!scenes.is_complete(load));
        assert!(!scenes.is_complete(load));
        assert!(scenes.is_complete(load));
        assert_eq!(scenes.log().borrow().in_flight(), 0);
        assert_eq!(scenes.log().borrow().loaded, vec!["MainScene"]);
    }

    #[test]
    fn test_world_tracks_live_entities() {
        let mut world = HeadlessWorld::default();
        world.spawn(Handle(1), EntityKind::Ball, Vec3::ZERO);
        world.spawn(Handle(2), EntityKind::Wall, Vec3::ONE);
        world.set_solid(Handle(2), false);
        world.despawn(Handle(2));

        let log = world.log();
        let log = log.borrow();
        assert_eq!(log.live_count(), 1);
        assert_eq!(log.count_live(|k| *k == EntityKind::Ball), 1);
        assert!(log.non_solid.is_empty());
        assert_eq!(log.despawned, vec![Handle(2)]);
    }
}
