//! Arguments and helpers shared by several commands

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use garrison_core::{
    random_deployment, standard_deployment, Game, Placement, Player, Role, RuleSet, Side,
};

/// Where the rule set comes from
#[derive(Args, Clone, Debug)]
pub struct RulesArgs {
    /// Rule set preset (classic, duel)
    #[arg(long, default_value = "classic")]
    pub preset: String,

    /// Rule set JSON file (overrides --preset)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

impl RulesArgs {
    pub fn load(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(path) => RuleSet::load(path)
                .with_context(|| format!("Failed to load rule set: {}", path.display())),
            None => {
                let rules = RuleSet::preset(&self.preset)
                    .ok_or_else(|| anyhow!("Unknown preset '{}' (expected classic or duel)", self.preset))?;
                rules.validate()?;
                Ok(rules)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SideArg {
    Bottom,
    Top,
}

impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Bottom => Side::Bottom,
            SideArg::Top => Side::Top,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DeployMode {
    /// Fixed back-to-front layout
    Standard,
    /// Shuffled over the territory
    Random,
}

pub fn deployment(rules: &RuleSet, side: Side, mode: DeployMode, rng: &mut ChaCha8Rng) -> Vec<Placement> {
    match mode {
        DeployMode::Standard => standard_deployment(rules, side),
        DeployMode::Random => random_deployment(rules, side, rng),
    }
}

/// Game with both deployments committed and play started
pub fn started_game(
    rules: &RuleSet,
    players: [Player; 2],
    mode: DeployMode,
    rng: &mut ChaCha8Rng,
) -> Result<Game> {
    let [bottom, top] = players;
    let mut game = Game::new(rules.clone(), bottom, top)?;
    for side in [Side::Bottom, Side::Top] {
        game.submit_deployment(side, &deployment(rules, side, mode, rng))?;
    }
    game.start()?;
    Ok(game)
}

pub fn ai_player(side: Side, label: &str) -> Player {
    Player::new(side, label, Role::Ai)
}

/// Create RNG from seed or random
pub fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}
