//! # Game Loop
//!
//! Frame timing around the world tick. One call to [`GameLoop::run_frame`]:
//!
//! ```text
//! begin_frame  -> delta since last frame (or the fixed step), clamped to 0.1 s
//! world.tick   -> player, NPCs, respawn, chunk streaming
//! render(..)   -> caller syncs chunk meshes and submits entity instances
//! end_frame    -> timing recorded, frames over 33 ms logged
//! ```
//!
//! The frame counter lives here and is passed down explicitly; nothing in
//! the simulation keeps static counters.

use std::time::{Duration, Instant};

use wildmere_shared::constants::MAX_DELTA_TIME;

use crate::world::{GameWorld, TickReport};

/// Maximum allowed frame time before warning.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

/// Configuration for the game loop.
#[derive(Clone, Copy, Debug)]
pub struct GameLoopConfig {
    /// Target frames per second.
    pub target_fps: u32,
    /// Log frames slower than [`MAX_FRAME_TIME`].
    pub enable_timing_logs: bool,
    /// Tick with this many seconds instead of the measured delta.
    pub fixed_step: Option<f32>,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            enable_timing_logs: true,
            fixed_step: None,
        }
    }
}

impl GameLoopConfig {
    /// Time budget of one frame.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Logic tick time in microseconds.
    pub logic_us: u64,
    /// Render time in microseconds.
    pub render_us: u64,
    /// Frame number.
    pub frame: u64,
}

/// Per-frame inputs handed to logic and rendering.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    /// Current frame number.
    pub frame: u64,
    /// Clamped seconds since the previous frame.
    pub delta_time: f32,
    /// When the frame began.
    pub started: Instant,
}

/// Frame lifecycle and timing.
#[derive(Debug)]
pub struct GameLoop {
    config: GameLoopConfig,
    frame_count: u64,
    last_frame_time: Instant,
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a new game loop.
    #[must_use]
    pub fn new(config: GameLoopConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            last_frame_time: Instant::now(),
            stats_accumulator: FrameStatsAccumulator::new(config.frame_budget()),
        }
    }

    /// Loop configuration.
    #[must_use]
    pub const fn config(&self) -> &GameLoopConfig {
        &self.config
    }

    /// Begins a new frame.
    #[must_use]
    pub fn begin_frame(&mut self) -> FrameContext {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;

        // Clamp delta time so a stall does not teleport entities
        let measured = self.config.fixed_step.unwrap_or_else(|| delta.as_secs_f32());
        let delta_time = measured.min(MAX_DELTA_TIME);

        FrameContext {
            frame: self.frame_count,
            delta_time,
            started: now,
        }
    }

    /// Ends the current frame, recording its timing.
    pub fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats);

        if self.config.enable_timing_logs && stats.total_us > MAX_FRAME_TIME.as_micros() as u64 {
            tracing::warn!(
                "Frame {} exceeded budget: {:.2}ms (target: {:.2}ms)",
                stats.frame,
                stats.total_us as f64 / 1000.0,
                self.config.frame_budget().as_secs_f64() * 1000.0
            );
        }
    }

    /// Runs one full frame: tick the world, let `render` draw it, record
    /// timing.
    pub fn run_frame(&mut self, world: &mut GameWorld, render: impl FnOnce(&GameWorld, &FrameContext)) -> TickReport {
        let ctx = self.begin_frame();

        let logic_start = Instant::now();
        let report = world.tick(ctx.delta_time);
        let logic_us = logic_start.elapsed().as_micros() as u64;

        let render_start = Instant::now();
        render(world, &ctx);
        let render_us = render_start.elapsed().as_micros() as u64;

        self.end_frame(FrameStats {
            total_us: ctx.started.elapsed().as_micros() as u64,
            logic_us,
            render_us,
            frame: ctx.frame,
        });
        report
    }

    /// Frames completed.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of logic tick times.
    pub logic_us_sum: u64,
    /// Sum of render times.
    pub render_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    budget_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator for a frame budget.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            logic_us_sum: 0,
            render_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            budget_us: budget.as_micros() as u64,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.logic_us_sum += stats.logic_us;
        self.render_us_sum += stats.render_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        if stats.total_us > self.budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average logic time in milliseconds.
    #[must_use]
    pub fn avg_logic_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.logic_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary of the statistics.
    pub fn log_summary(&self) {
        if self.frames_recorded == 0 {
            tracing::info!("No frames recorded");
            return;
        }
        tracing::info!(
            "Frames: {} | avg {:.3} ms ({:.1} FPS) | min {:.3} ms | max {:.3} ms | logic {:.3} ms | over budget {} ({:.1}%)",
            self.frames_recorded,
            self.avg_frame_ms(),
            self.avg_fps(),
            self.min_frame_us as f64 / 1000.0,
            self.max_frame_us as f64 / 1000.0,
            self.avg_logic_ms(),
            self.frames_over_budget,
            self.over_budget_ratio() * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WildmereConfig;
    use crate::gameplay::combat::ScriptedRolls;

    #[test]
    fn test_game_loop_creation() {
        let game_loop = GameLoop::new(GameLoopConfig::default());
        assert_eq!(game_loop.frame_count(), 0);
        assert_eq!(game_loop.config().frame_budget(), Duration::from_secs_f64(1.0 / 60.0));
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut game_loop = GameLoop::new(GameLoopConfig::default());
        std::thread::sleep(Duration::from_millis(120));
        let ctx = game_loop.begin_frame();
        assert_eq!(ctx.frame, 0);
        assert!(ctx.delta_time <= MAX_DELTA_TIME);
    }

    #[test]
    fn test_fixed_step_overrides_measured_delta() {
        let mut game_loop = GameLoop::new(GameLoopConfig {
            fixed_step: Some(0.02),
            ..GameLoopConfig::default()
        });
        assert_eq!(game_loop.begin_frame().delta_time, 0.02);
    }

    #[test]
    fn test_frame_cycle() {
        let mut game_loop = GameLoop::new(GameLoopConfig::default());
        let mut world = GameWorld::with_rolls(&WildmereConfig::default(), ScriptedRolls::default());

        let mut rendered = Vec::new();
        for _ in 0..3 {
            game_loop.run_frame(&mut world, |_, ctx| rendered.push(ctx.frame));
        }
        assert_eq!(rendered, vec![0, 1, 2]);
        assert_eq!(game_loop.frame_count(), 3);
        assert_eq!(world.tick_count(), 3);
        assert_eq!(game_loop.stats().frames_recorded, 3);
    }

    #[test]
    fn test_stats_accumulator() {
        let mut acc = FrameStatsAccumulator::new(Duration::from_micros(16_666));

        for i in 0..100 {
            acc.record(FrameStats {
                total_us: 10_000 + (i * 100),
                logic_us: 5000,
                render_us: 2000,
                frame: i,
            });
        }

        assert_eq!(acc.frames_recorded, 100);
        assert!(acc.avg_fps() > 50.0);
        assert!(acc.avg_fps() < 100.0);
        // 10_000 + i*100 > 16_666 for i >= 67
        assert_eq!(acc.frames_over_budget, 33);
        assert!((acc.avg_logic_ms() - 5.0).abs() < 1e-9);
    }
}
