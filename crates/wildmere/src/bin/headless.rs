//! # Wildmere Headless Simulation
//!
//! Runs the world without a window: the player walks a fixed route across
//! several chunk borders, picks fights and mines along the way, and the
//! streaming and entity stats are logged.
//!
//! ```text
//! wildmere_headless [config.toml]
//! RUST_LOG=wildmere=debug wildmere_headless
//! ```

use std::process::ExitCode;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wildmere::gameplay::PlayerAction;
use wildmere::render::HeadlessBackend;
use wildmere::shared::{Vec3, TICK_RATE};
use wildmere::{ChunkMeshCache, Command, GameLoop, GameLoopConfig, GameWorld, WildmereConfig};

/// Waypoints, in chunk-sized steps east then north then back.
const ROUTE: [(f32, f32); 5] = [(3.0, 0.0), (6.0, 0.0), (6.0, 4.0), (0.0, 4.0), (0.0, 0.0)];

/// Radius searched for something to fight or mine.
const INTEREST_RADIUS: f32 = 12.0;

/// Give up on a waypoint after this many seconds.
const LEG_TIMEOUT_SECS: u32 = 90;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wildmere=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn load_config() -> Result<WildmereConfig, wildmere::ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => WildmereConfig::load(path),
        None => Ok(WildmereConfig::default()),
    }
}

fn main() -> ExitCode {
    init_logging();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut world = GameWorld::new(&config);
    let mut game_loop = GameLoop::new(GameLoopConfig {
        target_fps: config.simulation.target_fps,
        enable_timing_logs: true,
        fixed_step: Some(1.0 / TICK_RATE as f32),
    });
    let mut backend = HeadlessBackend::default();
    let mut meshes = ChunkMeshCache::new();
    meshes.sync(world.chunks(), &mut backend);

    world.apply(Command::SetSprint(true));
    let chunk_world = config.layout().world_size();

    for (leg, (cx, cz)) in ROUTE.iter().enumerate() {
        let waypoint = Vec3::new(cx * chunk_world + 1.0, 0.0, cz * chunk_world + 1.0);
        tracing::info!("Leg {}: heading to ({:.1}, {:.1})", leg + 1, waypoint.x, waypoint.z);
        world.apply(Command::MoveTo(waypoint));

        let mut engaged = false;
        for _ in 0..LEG_TIMEOUT_SECS * TICK_RATE {
            let report = game_loop.run_frame(&mut world, |w, _| {
                meshes.sync(w.chunks(), &mut backend);
            });
            if report.respawned {
                tracing::warn!("Player died on leg {}; resuming from origin", leg + 1);
                world.apply(Command::MoveTo(waypoint));
            }

            let player = world.player();
            let (idle, here, walking) = (
                player.action() == PlayerAction::None,
                player.position,
                player.target().is_some(),
            );
            if !idle {
                continue;
            }
            if !engaged {
                engaged = true;
                if let Some(id) = world.entities().nearest_resource(here, INTEREST_RADIUS) {
                    world.apply(Command::Mine(id));
                    continue;
                }
                if let Some(id) = world.entities().nearest_npc(here, INTEREST_RADIUS) {
                    world.apply(Command::Attack(id));
                    continue;
                }
            }
            if !walking {
                if here.distance_xz(waypoint) < 1.0 {
                    break;
                }
                world.apply(Command::MoveTo(waypoint));
            }
        }
        world.log_stats();
    }

    let stats = world.chunks().stats();
    let player = world.player();
    tracing::info!(
        "Done: {} crossings, {} chunks loaded / {} unloaded, {} resources and {} NPCs spawned",
        stats.boundary_crossings,
        stats.chunks_loaded,
        stats.chunks_unloaded,
        stats.resources_spawned,
        stats.npcs_spawned
    );
    tracing::info!(
        "Player: mining L{}, combat L{}, {} ore, {} deaths | meshes live {} (uploaded {} vertices)",
        player.skills.mining.level(),
        player.skills.combat.level(),
        player.inventory.total(),
        player.deaths(),
        backend.live_meshes(),
        backend.vertices_uploaded
    );
    game_loop.stats().log_summary();

    meshes.clear(&mut backend);
    ExitCode::SUCCESS
}
