//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Declarative REST API gateway resource trees
#[derive(Parser, Debug)]
#[command(name = "restree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Deployment stage (overrides config)
    #[arg(short, long, global = true)]
    pub stage: Option<String>,

    /// AWS region (overrides config)
    #[arg(short, long, global = true)]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the resource tree
    Tree {
        /// Blueprint file (default: from config)
        #[arg(value_hint = ValueHint::FilePath)]
        blueprint: Option<PathBuf>,
    },

    /// List every method with its full path
    Routes {
        /// Blueprint file (default: from config)
        #[arg(value_hint = ValueHint::FilePath)]
        blueprint: Option<PathBuf>,
    },

    /// List resources in creation order
    Inventory {
        /// Blueprint file (default: from config)
        #[arg(value_hint = ValueHint::FilePath)]
        blueprint: Option<PathBuf>,
    },

    /// Export the synthesized API as TOML
    Export {
        /// Blueprint file (default: from config)
        #[arg(value_hint = ValueHint::FilePath)]
        blueprint: Option<PathBuf>,
        /// Write to file instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Check a blueprint without rendering it
    Validate {
        /// Blueprint file (default: from config)
        #[arg(value_hint = ValueHint::FilePath)]
        blueprint: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}

impl Commands {
    /// Blueprint argument of commands that take one.
    pub fn blueprint(&self) -> Option<&PathBuf> {
        match self {
            Commands::Tree { blueprint }
            | Commands::Routes { blueprint }
            | Commands::Inventory { blueprint }
            | Commands::Validate { blueprint }
            | Commands::Export { blueprint, .. } => blueprint.as_ref(),
            Commands::Config { .. } | Commands::Completion { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing
    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn given_repeated_debug_flag_when_parsing_then_counts() {
        let cli = Cli::try_parse_from(["restree", "-ddd", "tree", "api.toml"]).unwrap();

        assert_eq!(cli.debug, 3);
        assert_eq!(
            cli.command.as_ref().and_then(Commands::blueprint),
            Some(&PathBuf::from("api.toml"))
        );
    }

    #[test]
    fn given_global_stage_after_subcommand_when_parsing_then_accepted() {
        let cli = Cli::try_parse_from(["restree", "routes", "--stage", "prod"]).unwrap();

        assert_eq!(cli.stage.as_deref(), Some("prod"));
        assert!(cli.command.as_ref().and_then(Commands::blueprint).is_none());
    }
}
