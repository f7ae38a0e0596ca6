//! Deploy and validate commands
//!
//! Deployment files are the JSON form of a validated `Army`:
//! `{"side": "Bottom", "placements": [[{"row": 7, "col": 0}, "Flag"], ...]}`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use garrison_core::{validate_deployment, Army, RuleSet, Side};

use crate::common::{create_rng, deployment, DeployMode, RulesArgs, SideArg};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    #[arg(long, value_enum, default_value = "bottom")]
    pub side: SideArg,

    #[arg(long, value_enum, default_value = "standard")]
    pub deploy: DeployMode,

    /// Write to FILE instead of stdout
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub rules: RulesArgs,

    /// Deployment JSON file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Check as this side instead of the side named in the file
    #[arg(long, value_enum)]
    pub side: Option<SideArg>,
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn run_deploy(args: DeployArgs, seed: Option<u64>) -> Result<()> {
    let rules = args.rules.load()?;
    let side = Side::from(args.side);
    let mut rng = create_rng(seed);

    let placements = deployment(&rules, side, args.deploy, &mut rng);
    let army = validate_deployment(&rules, side, &placements)?;
    let json = serde_json::to_string_pretty(&army)?;

    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write deployment: {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

pub fn run_validate(args: ValidateArgs) -> Result<()> {
    let rules = args.rules.load()?;
    let army = load_army(&args.file)?;
    let side = args.side.map(Side::from).unwrap_or(army.side());

    let checked = check(&rules, side, &army)
        .with_context(|| format!("{} is not a valid {} deployment for '{}'", args.file.display(), side, rules.name))?;

    println!(
        "OK: {} units for {} on '{}'",
        checked.len(),
        side,
        rules.name
    );
    Ok(())
}

fn load_army(path: &Path) -> Result<Army> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read deployment: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse deployment: {}", path.display()))
}

fn check(rules: &RuleSet, side: Side, army: &Army) -> Result<Army> {
    Ok(validate_deployment(rules, side, army.placements())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use garrison_core::{standard_deployment, Position, Rank};

    #[test]
    fn test_army_file_round_trip_validates() {
        let rules = RuleSet::duel();
        let army = validate_deployment(&rules, Side::Top, &standard_deployment(&rules, Side::Top)).unwrap();
        let json = serde_json::to_string(&army).unwrap();
        let parsed: Army = serde_json::from_str(&json).unwrap();
        assert_eq!(check(&rules, parsed.side(), &parsed).unwrap(), army);
    }

    #[test]
    fn test_wrong_side_is_rejected() {
        let rules = RuleSet::duel();
        let army = validate_deployment(&rules, Side::Top, &standard_deployment(&rules, Side::Top)).unwrap();
        assert!(check(&rules, Side::Bottom, &army).is_err());
    }

    #[test]
    fn test_file_format() {
        let json = r#"{"side": "Bottom", "placements": [[{"row": 7, "col": 0}, "Flag"]]}"#;
        let army: Army = serde_json::from_str(json).unwrap();
        assert_eq!(army.side(), Side::Bottom);
        assert_eq!(army.placements(), &[(Position::new(7, 0), Rank::Flag)]);
    }
}
