//! Gap Occupiers entry point
//!
//! Native builds run headless: the scene, HUD and audio log what they are
//! told, and a scripted autopilot plays until the run ends or the tick
//! budget runs out. Usage: `gap-occupiers [settings.json] [ticks]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use gap_occupiers::audio::{AudioManager, Cue};
    use gap_occupiers::consts::SIM_DT;
    use gap_occupiers::platform::{Audio, Color, Hud, Key, KeyState, Scene};
    use gap_occupiers::sim::{AabbShape, ActorId, ActorKind};
    use gap_occupiers::{FlowState, GameFlowController, Settings};

    const DEFAULT_TICKS: u64 = 60 * 60 * 5;

    /// Tracks live actors so the autopilot can aim
    pub struct ConsoleScene {
        size: (f32, f32),
        actors: BTreeMap<ActorId, (ActorKind, AabbShape)>,
    }

    impl ConsoleScene {
        fn new(size: (f32, f32)) -> Self {
            Self {
                size,
                actors: BTreeMap::new(),
            }
        }

        /// X of the lowest enemy, the easiest target
        fn target_x(&self) -> Option<f32> {
            self.actors
                .values()
                .filter(|(kind, _)| kind.is_enemy())
                .min_by(|a, b| a.1.center.y.total_cmp(&b.1.center.y))
                .map(|(_, shape)| shape.center.x)
        }
    }

    impl Scene for ConsoleScene {
        fn add_entity(&mut self, id: ActorId, kind: ActorKind, shape: AabbShape) {
            log::trace!("+ {} #{} at {:?}", kind.label(), id.0, shape.center);
            self.actors.insert(id, (kind, shape));
        }

        fn remove_entity(&mut self, id: ActorId) {
            log::trace!("- #{}", id.0);
            self.actors.remove(&id);
        }

        fn current_field_size(&self) -> (f32, f32) {
            self.size
        }
    }

    #[derive(Default)]
    pub struct ConsoleHud;

    impl Hud for ConsoleHud {
        fn set_score(&mut self, score: u64) {
            log::info!("Score: {}", score);
        }

        fn set_lives(&mut self, lives: u32) {
            log::info!("Lives: {}", lives);
        }

        fn set_level(&mut self, level: u32) {
            log::info!("Level: {}", level);
        }

        fn show_message(&mut self, text: &str, color: Color) {
            log::info!("[{:?}] {}", (color.r, color.g, color.b), text);
        }

        fn hide_message(&mut self) {}
    }

    #[derive(Default)]
    pub struct ConsoleAudio;

    impl Audio for ConsoleAudio {
        fn play_cue(&mut self, cue: Cue) {
            log::debug!("♪ {}", cue.as_str());
        }
    }

    type Controller = GameFlowController<ConsoleScene, ConsoleHud, AudioManager<ConsoleAudio>>;

    /// Steer under the lowest enemy and keep the trigger held
    fn autopilot(controller: &Controller, keys: &mut KeyState) {
        keys.release_all();
        let Some(cannon_x) = controller.snapshot().cannon_x else {
            return;
        };
        if let Some(target) = controller.scene().target_x() {
            let dx = target - cannon_x;
            if dx.abs() > 4.0 {
                keys.press(if dx < 0.0 { Key::Left } else { Key::Right });
            }
        }
        keys.press(Key::Fire);
    }

    /// Press and release confirm over two steps
    fn confirm(controller: &mut Controller, keys: &mut KeyState) {
        keys.release_all();
        keys.press(Key::Confirm);
        controller.step(&*keys, SIM_DT);
        keys.release(Key::Confirm);
        controller.step(&*keys, SIM_DT);
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let mut args = std::env::args().skip(1);
        let settings_path = args.next().map(PathBuf::from);
        let ticks = match args.next() {
            Some(raw) => raw.parse::<u64>()?,
            None => DEFAULT_TICKS,
        };

        let settings = Settings::load_or_default(settings_path.as_deref());
        let scene = ConsoleScene::new((settings.field_width, settings.field_height));
        let audio = AudioManager::new(ConsoleAudio, &settings);
        let mut controller = GameFlowController::new(settings, scene, ConsoleHud, audio)?;

        let mut keys = KeyState::default();
        confirm(&mut controller, &mut keys);

        for _ in 0..ticks {
            if controller.state() != FlowState::Playing {
                break;
            }
            autopilot(&controller, &mut keys);
            controller.step(&keys, SIM_DT);
        }

        log::info!("Finished in state {:?}", controller.state());
        println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Gap Occupiers (headless) starting...");

    if let Err(err) = headless::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on the web; hosts drive GameFlowController themselves
}
