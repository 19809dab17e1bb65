use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "af-cli",
    about = "Compile, inspect and evaluate nested filter rule trees",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Maximum group nesting depth (overrides FILTERS_MAX_DEPTH)
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Maximum number of rules in a tree (overrides FILTERS_MAX_RULES)
    #[arg(long, global = true)]
    pub max_rules: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the constraint schema sent to query builder clients
    Schema(SchemaArgs),
    /// Compile a rule tree into a PostgreSQL WHERE fragment
    Compile(CompileArgs),
    /// Print the JSON rows a rule tree accepts
    Eval(EvalArgs),
    /// Run a rule tree against a PostgreSQL table
    Query(QueryArgs),
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Constraint definitions (JSON or YAML)
    #[arg(long)]
    pub constraints: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    /// Constraint definitions (JSON or YAML)
    #[arg(long)]
    pub constraints: PathBuf,

    /// Rule tree as submitted by a client (JSON)
    #[arg(long)]
    pub rules: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SqlTargetArgs {
    /// Table the conditions apply to
    #[arg(long, default_value = "records")]
    pub table: String,

    /// Alias used to qualify columns
    #[arg(long)]
    pub alias: Option<String>,

    /// Relationship mapping (JSON or YAML)
    #[arg(long)]
    pub relations: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    #[command(flatten)]
    pub target: SqlTargetArgs,

    /// Inline parameters into the SQL instead of listing them
    #[arg(long)]
    pub inline: bool,
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    /// JSON array of rows
    #[arg(long)]
    pub rows: PathBuf,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub tree: TreeArgs,

    #[command(flatten)]
    pub target: SqlTargetArgs,

    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    #[arg(long, default_value_t = 1)]
    pub page: i64,

    #[arg(long, default_value_t = 20)]
    pub per_page: i64,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compile() {
        let cli = Cli::try_parse_from([
            "af-cli",
            "compile",
            "--constraints",
            "defs.yaml",
            "--rules",
            "tree.json",
            "--table",
            "users",
            "--max-depth",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.max_depth, Some(4));
        match cli.command {
            Commands::Compile(args) => {
                assert_eq!(args.target.table, "users");
                assert!(!args.inline);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
