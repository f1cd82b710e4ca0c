//! Command-line arguments for the headless driver.

use clap::{Parser, Subcommand, ValueEnum};
use std::str::FromStr;

/// SaberForge - lightsaber workbench and first-person arena
#[derive(Parser, Debug)]
#[command(name = "saberforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Write the loaded settings to saberforge.ron before running
    #[arg(long, global = true)]
    pub write_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The mode to run. No subcommand opens the maker with no actions.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Maker { actions: Vec::new() })
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the workbench and apply actions in order
    Maker {
        /// section=type, drag=dx,dy, zoom=n, power, shuffle, reset or fight
        #[arg(allow_hyphen_values = true)]
        actions: Vec<MakerAction>,
    },
    /// Enter the arena with the saved saber
    Combat {
        /// Inputs pressed on the first frame
        #[arg(value_enum)]
        actions: Vec<CombatAction>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MakerAction {
    /// `section=type`, as a menu button click.
    Select { section: String, value: String },
    /// `drag=dx,dy` in pixels.
    Drag(f32, f32),
    /// `zoom=notches`, positive moves closer.
    Zoom(f32),
    Power,
    Shuffle,
    Reset,
    Fight,
}

impl FromStr for MakerAction {
    type Err = String;

    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        let bad_number = |text: &str| format!("'{}' is not a number", text);
        match arg.split_once('=') {
            Some(("drag", value)) => {
                let (dx, dy) = value
                    .split_once(',')
                    .ok_or_else(|| format!("drag expects dx,dy, got '{}'", value))?;
                Ok(Self::Drag(
                    dx.trim().parse().map_err(|_| bad_number(dx))?,
                    dy.trim().parse().map_err(|_| bad_number(dy))?,
                ))
            }
            Some(("zoom", value)) => Ok(Self::Zoom(value.trim().parse().map_err(|_| bad_number(value))?)),
            Some((section, value)) => Ok(Self::Select {
                section: section.to_string(),
                value: value.to_string(),
            }),
            None => match arg {
                "power" => Ok(Self::Power),
                "shuffle" => Ok(Self::Shuffle),
                "reset" => Ok(Self::Reset),
                "fight" => Ok(Self::Fight),
                other => Err(format!("unknown maker action '{}'", other)),
            },
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatAction {
    /// Left click
    Swing,
    /// Space
    Jump,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("saberforge").chain(line.split_whitespace()))
    }

    #[test]
    fn no_arguments_open_the_maker() {
        let cli = parse("").unwrap();
        assert_eq!(cli.command(), Command::Maker { actions: Vec::new() });
        assert!(!cli.write_config);
    }

    #[test]
    fn maker_actions_parse_in_order() {
        let cli = parse("maker grip=wrapped pommel-color=gold drag=30,-12.5 zoom=-3 power fight").unwrap();
        assert_eq!(
            cli.command(),
            Command::Maker {
                actions: vec![
                    MakerAction::Select {
                        section: "grip".into(),
                        value: "wrapped".into()
                    },
                    MakerAction::Select {
                        section: "pommel-color".into(),
                        value: "gold".into()
                    },
                    MakerAction::Drag(30.0, -12.5),
                    MakerAction::Zoom(-3.0),
                    MakerAction::Power,
                    MakerAction::Fight,
                ]
            }
        );
    }

    #[test]
    fn combat_actions_parse() {
        assert_eq!(
            parse("combat swing jump").unwrap().command(),
            Command::Combat {
                actions: vec![CombatAction::Swing, CombatAction::Jump]
            }
        );
    }

    #[test]
    fn write_config_is_opt_in() {
        assert!(parse("--write-config").unwrap().write_config);
        assert!(parse("combat --write-config jump").unwrap().write_config);
        assert!(!parse("combat jump").unwrap().write_config);
    }

    #[test]
    fn bad_arguments_are_errors() {
        assert!(parse("arena").is_err());
        assert!(parse("maker explode").is_err());
        assert!(parse("maker drag=3").is_err());
        assert!(parse("maker zoom=close").is_err());
        assert!(parse("combat power").is_err());
    }
}
