//! Hexboard demo application
//!
//! Loads a board from RON, then plays a scripted session against the
//! headless backend: random feed churn from a second source, a click, and a
//! drag that moves a note to the cell under the pointer on release.
//!
//! Usage: `hexboard [config.toml|config.ron]`

use std::cell::RefCell;
use std::rc::Rc;

use hex_scene::core::config::{Config, ConfigError, SceneConfig};
use hex_scene::data::{FeedBatch, Item, ItemId, ItemKind, SourceId};
use hex_scene::foundation::logging;
use hex_scene::foundation::math::Vec2;
use hex_scene::hex::{HexCoord, HexLayout};
use hex_scene::render::HeadlessBackend;
use hex_scene::scene::{HexScene, SceneError, SceneUpdate};
use rand::prelude::*;
use thiserror::Error;

// Session constants
const BOARD: &str = include_str!("../board.ron");
const FEED_TICKS: usize = 12;
const MAX_PINGS: usize = 4;
const BOARD_RADIUS: i32 = 4;

/// Demo failures
#[derive(Error, Debug)]
enum AppError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid board fixture: {0}")]
    Board(#[from] ron::error::SpannedError),
}

/// Work queued by item callbacks, applied once the gesture returns
#[derive(Debug)]
enum Command {
    Open(ItemId),
    Drop(ItemId, HexCoord),
}

struct HexboardApp {
    scene: HexScene<HeadlessBackend>,
    board: SourceId,
    feed: SourceId,
    layout: HexLayout,
    commands: Rc<RefCell<Vec<Command>>>,
    pings: Vec<ItemId>,
    next_ping: usize,
}

impl HexboardApp {
    fn new(config: SceneConfig) -> Result<Self, AppError> {
        let layout = config.layout.layout();
        let backend = HeadlessBackend::new(config.viewport.clone(), config.stacking.clone());
        let mut scene = HexScene::new(config, backend)?;
        let board = scene.add_source();
        let feed = scene.add_source();

        Ok(Self {
            scene,
            board,
            feed,
            layout,
            commands: Rc::new(RefCell::new(Vec::new())),
            pings: Vec::new(),
            next_ping: 0,
        })
    }

    /// Load the fixture, wiring pointer handlers onto every item
    fn load_board(&mut self, fixture: &str) -> Result<(), AppError> {
        let mut batch: FeedBatch = ron::from_str(fixture)?;
        batch.added = batch.added.into_iter().map(|item| self.interactive(item)).collect();

        let update = self.scene.apply(self.board, batch)?;
        self.report("board loaded", &update);
        Ok(())
    }

    fn interactive(&self, item: Item) -> Item {
        let (clicks, drops) = (Rc::clone(&self.commands), Rc::clone(&self.commands));
        let layout = self.layout;
        item.on_click(move |args| clicks.borrow_mut().push(Command::Open(args.item_id.clone())))
            .on_drag(|args| log::debug!("dragging {} by ({:.1}, {:.1})", args.item_id, args.delta.x, args.delta.y))
            .on_release(move |args| {
                let cell = layout.from_pixel(args.planar);
                drops.borrow_mut().push(Command::Drop(args.item_id.clone(), cell));
            })
    }

    /// One tick of simulated upstream activity on the feed source
    fn churn(&mut self, rng: &mut impl Rng) -> Result<(), AppError> {
        let mut batch = FeedBatch::default();

        if self.pings.len() >= MAX_PINGS || (!self.pings.is_empty() && rng.gen_bool(0.3)) {
            let index = rng.gen_range(0..self.pings.len());
            batch.removed.push(self.pings.remove(index));
        }

        let id = ItemId::new(format!("ping-{}", self.next_ping));
        self.next_ping += 1;
        let cell = HexCoord::new(
            rng.gen_range(-BOARD_RADIUS..=BOARD_RADIUS),
            rng.gen_range(-BOARD_RADIUS..=BOARD_RADIUS),
        );
        batch.added.push(self.interactive(Item::new(id.clone(), ItemKind::File).at(cell)));
        self.pings.push(id);

        let update = self.scene.apply(self.feed, batch)?;
        self.report("feed", &update);
        Ok(())
    }

    /// Press, travel along `path`, release; then apply queued commands
    fn gesture(&mut self, path: &[Vec2]) -> Result<(), AppError> {
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            return Ok(());
        };

        if !self.scene.pointer_down(first) {
            log::info!("pointer down at ({:.0}, {:.0}) hit nothing", first.x, first.y);
            return Ok(());
        }
        for &point in &path[1..] {
            self.scene.pointer_move(point);
        }
        let was_drag = self.scene.pointer_up(last);
        log::info!("gesture ended (drag: {:?})", was_drag);

        let commands: Vec<Command> = self.commands.borrow_mut().drain(..).collect();
        for command in commands {
            self.execute(command)?;
        }
        Ok(())
    }

    fn execute(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::Open(id) => {
                let item = self.scene.source(self.board).and_then(|source| source.get(&id));
                match item {
                    Some(item) => log::info!("open {} -> {:?}", id, item.payload),
                    None => log::info!("open {} (feed item)", id),
                }
            }
            Command::Drop(id, cell) => {
                let source = if self.pings.contains(&id) { self.feed } else { self.board };
                let update = self.scene.move_item(source, &id, cell)?;
                self.report(&format!("dropped {} on ({}, {})", id, cell.u, cell.v), &update);
            }
        }
        Ok(())
    }

    fn screen_of(&self, coord: HexCoord) -> Vec2 {
        self.scene.backend().project(self.layout.to_pixel(coord))
    }

    fn report(&self, what: &str, update: &SceneUpdate) {
        log::info!(
            "{}: -{} +{} nodes, {} items live, {} decorations",
            what,
            update.removed.len(),
            update.added.len(),
            self.scene.live_item_ids().len(),
            self.scene.materializer().decoration_count()
        );
        for fault in &update.faults {
            log::warn!("render fault: {}", fault);
        }
    }

    fn run(&mut self) -> Result<(), AppError> {
        let mut rng = thread_rng();
        for _ in 0..FEED_TICKS {
            self.churn(&mut rng)?;
        }

        let link = self.screen_of(HexCoord::new(2, -1));
        self.gesture(&[link])?;

        let start = self.screen_of(HexCoord::new(0, 0));
        let target = self.screen_of(HexCoord::new(3, 1));
        let path: Vec<Vec2> = (0..=8).map(|step| start + (target - start) * (step as f32 / 8.0)).collect();
        self.gesture(&path)?;

        let stats = self.scene.backend().stats();
        log::info!(
            "session done: {} created, {} disposed, {} live ({:?})",
            stats.created,
            stats.disposed,
            self.scene.materializer().len(),
            self.scene.live_item_ids()
        );
        Ok(())
    }
}

fn main() -> Result<(), AppError> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("loading scene configuration from {}", path);
            SceneConfig::load_from_file(&path)?
        }
        None => SceneConfig::default(),
    };

    let mut app = HexboardApp::new(config)?;
    app.load_board(BOARD)?;
    app.run()
}
