//! Sling Siege headless runner
//!
//! Plays scripted shots through the built-in levels and logs the outcome.
//! Usage: `sling-siege [config.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::Vec2;
    use sling_siege::SimConfig;
    use sling_siege::sim::{FrameInput, Level, LevelPhase, StaticMaps};

    /// 60 fps
    const FRAME_MS: u64 = 16;
    /// Give up on a level after this many frames
    const MAX_FRAMES: u64 = 60 * 120;

    env_logger::init();
    log::info!("Sling Siege (headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => SimConfig::from_json(&json),
            Err(e) => {
                log::warn!("Cannot read {} ({}), using defaults", path, e);
                SimConfig::default()
            }
        },
        None => SimConfig::default(),
    };

    let mut level = Level::new(StaticMaps::default(), config, 1);
    // Pull points tried in turn: steeper shots for later birds
    let pulls = [
        Vec2::new(60.0, 480.0),
        Vec2::new(55.0, 500.0),
        Vec2::new(70.0, 505.0),
        Vec2::new(50.0, 470.0),
    ];

    let mut now = 0;
    let mut shot = 0;
    let mut frames = 0;
    let mut aim_frame = 0;
    while !level.is_done() && frames < MAX_FRAMES {
        let input = match level.phase() {
            LevelPhase::Idle => {
                // Grab, drag for a few frames, then let go
                let pull = pulls[shot % pulls.len()];
                aim_frame += 1;
                match aim_frame {
                    1 => FrameInput {
                        now,
                        pointer: Some(Vec2::new(140.0, 440.0)),
                        pressed: true,
                    },
                    2..=11 => FrameInput {
                        now,
                        pointer: Some(pull),
                        pressed: true,
                    },
                    _ => {
                        shot += 1;
                        aim_frame = 0;
                        FrameInput {
                            now,
                            pointer: Some(pull),
                            pressed: false,
                        }
                    }
                }
            }
            LevelPhase::Attack | LevelPhase::Over => {
                aim_frame = 0;
                FrameInput {
                    now,
                    pointer: None,
                    pressed: false,
                }
            }
        };
        level.update(input);
        now += FRAME_MS;
        frames += 1;
    }

    let sim = level.sim();
    log::info!(
        "finished after {} shots: victory={} score={} next level={} ({} pigs, {} blocks left)",
        shot,
        level.is_victory(),
        level.score(),
        level.level_num(),
        sim.pigs().len(),
        sim.blocks().len()
    );
    println!("score: {}", level.score());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; the host drives `Level` directly
}
