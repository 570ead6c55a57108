use std::{fs, path::Path, time::Duration};

use anyhow::{bail, ensure, Context, Result};
use rampart_core::{InputState, PlayerSpawn, Terrain, TerrainKind, Vec2};
use rampart_system_game_loop::{GameConfig, GameLoop};
use rampart_system_spawning::{Config, EnemyTemplate, SpawnPoint, Spawning};
use serde::Deserialize;

use crate::layout_transfer::{LayoutTower, TowerLayout};

const SUPPORTED_SCENARIO_VERSION: u32 = 1;
const BUILTIN_SCENARIO: &str = include_str!("../scenarios/default.toml");

/// Scripted session loaded from a TOML file.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Scenario {
    version: u32,
    /// Ticks simulated unless overridden on the command line.
    #[serde(default = "default_ticks")]
    pub(crate) ticks: u64,
    /// Seconds simulated per tick unless overridden on the command line.
    #[serde(default = "default_dt")]
    pub(crate) dt: f32,
    terrain: TerrainSection,
    #[serde(default)]
    game: GameConfig,
    waves: WaveSection,
    #[serde(default)]
    spawners: Vec<SpawnPoint>,
    #[serde(default)]
    towers: Vec<LayoutTower>,
    player: Option<PlayerSpawn>,
    #[serde(default)]
    input: InputScript,
}

#[derive(Clone, Debug, Deserialize)]
struct TerrainSection {
    columns: u32,
    rows: u32,
    cell_size: f32,
    #[serde(default)]
    walls: Vec<[u32; 2]>,
    #[serde(default)]
    mud: Vec<[u32; 2]>,
}

#[derive(Clone, Debug, Deserialize)]
struct WaveSection {
    spawn_interval_ms: u64,
    seed: u64,
    wave_size: Option<u32>,
    #[serde(default)]
    wave_growth: u32,
    wave_break_ms: Option<u64>,
    templates: Option<Vec<EnemyTemplate>>,
}

/// Input replayed every tick.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub(crate) struct InputScript {
    #[serde(default)]
    auto_fire: bool,
    /// Ticks spent walking in each direction of a square patrol; zero stands still.
    #[serde(default)]
    patrol_ticks: u64,
}

impl InputScript {
    /// Input for the provided tick.
    pub(crate) fn at(&self, tick: u64) -> InputState {
        let movement = match tick.checked_div(self.patrol_ticks).map(|leg| leg % 4) {
            None => Vec2::ZERO,
            Some(0) => Vec2::X,
            Some(1) => Vec2::Y,
            Some(2) => Vec2::NEG_X,
            Some(_) => Vec2::NEG_Y,
        };
        InputState {
            movement,
            aim: None,
            fire: false,
            auto_fire: self.auto_fire,
        }
    }
}

fn default_ticks() -> u64 {
    1_800
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

impl Scenario {
    /// Scenario bundled with the binary.
    pub(crate) fn builtin() -> Result<Self> {
        parse_scenario(BUILTIN_SCENARIO).context("failed to parse the built-in scenario")
    }

    /// Reads and validates a scenario file.
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        parse_scenario(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }

    /// Scripted input for the session.
    pub(crate) fn input(&self) -> InputScript {
        self.input
    }

    /// Tower placement of the scenario.
    pub(crate) fn layout(&self) -> TowerLayout {
        TowerLayout {
            columns: self.terrain.columns,
            rows: self.terrain.rows,
            towers: self.towers.clone(),
        }
    }

    /// Replaces the scenario's towers with a transferred layout.
    pub(crate) fn apply_layout(&mut self, layout: TowerLayout) -> Result<()> {
        ensure!(
            layout.columns == self.terrain.columns && layout.rows == self.terrain.rows,
            "layout is for a {}x{} grid but the scenario uses {}x{}",
            layout.columns,
            layout.rows,
            self.terrain.columns,
            self.terrain.rows
        );
        self.towers = layout.towers;
        Ok(())
    }

    /// Builds a ready-to-run session.
    pub(crate) fn build(&self) -> Result<GameLoop<Spawning>> {
        let terrain = self.terrain.build()?;
        let waves = Spawning::new(self.waves.config(), self.spawners.clone());
        let mut game = GameLoop::new(self.game, waves, ());
        let world = game.world_mut();
        world.set_terrain(Some(terrain));

        for tower in &self.towers {
            let _ = world
                .add_tower(tower.spawn(self.terrain.cell_size))
                .with_context(|| {
                    format!("failed to place tower at ({}, {})", tower.column, tower.row)
                })?;
        }
        if let Some(player) = self.player {
            let _ = world
                .spawn_player(player)
                .context("failed to place the player")?;
        }

        Ok(game)
    }
}

impl TerrainSection {
    fn build(&self) -> Result<Terrain> {
        let mut terrain = Terrain::open(self.columns, self.rows, self.cell_size);
        for (cells, kind) in [(&self.walls, TerrainKind::Wall), (&self.mud, TerrainKind::Mud)] {
            for [column, row] in cells.iter().copied() {
                if !terrain.set(column, row, kind) {
                    bail!(
                        "{kind:?} cell ({column}, {row}) lies outside the {}x{} grid",
                        self.columns,
                        self.rows
                    );
                }
            }
        }
        Ok(terrain)
    }
}

impl WaveSection {
    fn config(&self) -> Config {
        let mut config = Config::new(Duration::from_millis(self.spawn_interval_ms), self.seed);
        if let Some(size) = self.wave_size {
            config = config.with_wave_size(size, self.wave_growth);
        }
        if let Some(wave_break) = self.wave_break_ms {
            config = config.with_wave_break(Duration::from_millis(wave_break));
        }
        if let Some(templates) = &self.templates {
            config = config.with_templates(templates.clone());
        }
        config
    }
}

fn parse_scenario(contents: &str) -> Result<Scenario> {
    let scenario: Scenario =
        toml::from_str(contents).context("failed to parse scenario toml contents")?;
    if scenario.version != SUPPORTED_SCENARIO_VERSION {
        bail!(
            "unsupported scenario version {}; expected {}",
            scenario.version,
            SUPPORTED_SCENARIO_VERSION
        );
    }
    ensure!(
        scenario.terrain.columns > 0 && scenario.terrain.rows > 0,
        "terrain must have at least one column and one row"
    );
    ensure!(
        scenario.terrain.cell_size > 0.0,
        "terrain cell size must be positive"
    );
    ensure!(
        scenario.dt.is_finite() && scenario.dt > 0.0,
        "tick length must be a positive number of seconds"
    );
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        version = 1

        [terrain]
        columns = 8
        rows = 6
        cell_size = 10.0
        walls = [[3, 3]]

        [waves]
        spawn_interval_ms = 500
        seed = 7
    "#;

    #[test]
    fn builtin_scenario_is_valid() {
        let scenario = Scenario::builtin().expect("builtin scenario parses");
        let game = scenario.build().expect("builtin scenario builds");
        assert!(game.world().player().is_some());
        assert!(!game.world().towers().is_empty());
    }

    #[test]
    fn minimal_scenario_uses_defaults() {
        let scenario = parse_scenario(MINIMAL).expect("scenario parses");
        assert_eq!(scenario.ticks, 1_800);
        assert_eq!(scenario.game, GameConfig::default());

        let game = scenario.build().expect("scenario builds");
        let terrain = game.world().terrain().expect("terrain");
        assert!(terrain.is_blocked(Vec2::new(35.0, 35.0)));
        assert!(game.world().player().is_none());
    }

    #[test]
    fn rejects_unknown_versions() {
        let contents = MINIMAL.replace("version = 1", "version = 9");
        let error = parse_scenario(&contents).expect_err("version rejected");
        assert!(error.to_string().contains("unsupported scenario version 9"));
    }

    #[test]
    fn rejects_cells_outside_the_grid() {
        let contents = MINIMAL.replace("walls = [[3, 3]]", "walls = [[30, 3]]");
        let scenario = parse_scenario(&contents).expect("scenario parses");
        let error = scenario.build().expect_err("wall rejected");
        assert!(error.to_string().contains("outside the 8x6 grid"));
    }

    #[test]
    fn layout_must_match_the_grid() {
        let mut scenario = parse_scenario(MINIMAL).expect("scenario parses");
        let foreign = TowerLayout {
            columns: 9,
            rows: 6,
            towers: Vec::new(),
        };
        assert!(scenario.apply_layout(foreign).is_err());
        assert!(scenario.apply_layout(scenario.layout()).is_ok());
    }

    #[test]
    fn patrol_cycles_through_four_directions() {
        let script = InputScript {
            auto_fire: true,
            patrol_ticks: 2,
        };
        let moves: Vec<Vec2> = (0..8).map(|tick| script.at(tick).movement).collect();
        assert_eq!(
            moves,
            vec![
                Vec2::X,
                Vec2::X,
                Vec2::Y,
                Vec2::Y,
                Vec2::NEG_X,
                Vec2::NEG_X,
                Vec2::NEG_Y,
                Vec2::NEG_Y,
            ]
        );
        assert_eq!(InputScript::default().at(5).movement, Vec2::ZERO);
    }
}
