use std::path::Path;

use af_core::FiltersConfig;
use af_query_builder::{ConstraintRegistry, Group, MemorySink, QueryCompiler};
use af_sql::{compile_to_sql, FilterQueryExecutor, FilteredSelect, Pagination, RelationMap, SqlFragment, SqlSink};
use anyhow::Context;
use serde_json::{json, Value};

use crate::args::{Cli, Commands, CompileArgs, EvalArgs, QueryArgs, SchemaArgs, SqlTargetArgs, TreeArgs};
use crate::definitions::{load_registry, parse_document};

/// Environment configuration with command-line overrides applied
pub fn resolve_config(cli: &Cli) -> anyhow::Result<FiltersConfig> {
    let mut config = FiltersConfig::from_env()?;
    if let Some(max_depth) = cli.max_depth {
        anyhow::ensure!(max_depth > 0, "--max-depth must be greater than zero");
        config.limits = config.limits.with_max_depth(max_depth);
    }
    if let Some(max_rules) = cli.max_rules {
        anyhow::ensure!(max_rules > 0, "--max-rules must be greater than zero");
        config.limits = config.limits.with_max_rules(max_rules);
    }
    Ok(config)
}

pub async fn handle_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    match cli.command {
        Commands::Schema(args) => schema(args),
        Commands::Compile(args) => compile(args, &config),
        Commands::Eval(args) => eval(args, &config),
        Commands::Query(args) => query(args, &config).await,
    }
}

fn schema(args: SchemaArgs) -> anyhow::Result<()> {
    let registry = load_registry(&args.constraints)?;
    println!("{}", serde_json::to_string_pretty(&registry.to_schema())?);
    Ok(())
}

fn compile(args: CompileArgs, config: &FiltersConfig) -> anyhow::Result<()> {
    let (registry, group) = load_tree(&args.tree, config)?;
    let fragment = render(&registry, &group, &args.target, config)?;

    if fragment.is_empty() {
        println!("-- no restriction");
    } else if args.inline {
        println!("{}", fragment.to_debug_sql());
    } else {
        println!("{}", fragment.sql);
        for (i, param) in fragment.params.iter().enumerate() {
            println!("-- ${} = {}", i + 1, param);
        }
    }
    Ok(())
}

fn eval(args: EvalArgs, config: &FiltersConfig) -> anyhow::Result<()> {
    let (registry, group) = load_tree(&args.tree, config)?;
    let rows: Vec<Value> = read_json(&args.rows)?;

    let mut sink = MemorySink::new();
    if config.enabled {
        QueryCompiler::new(&registry)
            .with_limits(config.limits)
            .compile_into(&mut sink, &group)?;
    }
    let accepted = sink.filter(&rows);
    tracing::info!(total = rows.len(), accepted = accepted.len(), "Evaluated rule tree");
    println!("{}", serde_json::to_string_pretty(&accepted)?);
    Ok(())
}

async fn query(args: QueryArgs, config: &FiltersConfig) -> anyhow::Result<()> {
    let (registry, group) = load_tree(&args.tree, config)?;
    let fragment = render(&registry, &group, &args.target, config)?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&args.database_url)
        .await
        .context("connecting to database")?;

    let mut select = FilteredSelect::new(&args.target.table).json_rows();
    if let Some(alias) = &args.target.alias {
        select = select.alias(alias);
    }
    let pagination = Pagination::page(args.page, args.per_page);
    let result = FilterQueryExecutor::new(&pool)
        .execute::<(Value,)>(&select, &fragment, &pagination)
        .await?;

    let output = json!({
        "items": result.items.iter().map(|(row,)| row).collect::<Vec<_>>(),
        "total": result.total,
        "page": result.page(),
        "totalPages": result.total_pages(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_tree(args: &TreeArgs, config: &FiltersConfig) -> anyhow::Result<(ConstraintRegistry, Group)> {
    let registry = load_registry(&args.constraints)?;
    let raw = std::fs::read_to_string(&args.rules)
        .with_context(|| format!("reading {}", args.rules.display()))?;
    let group = Group::from_json_str_within(&raw, &config.limits)?;
    tracing::debug!(depth = group.depth(), rules = group.rule_count(), "Loaded rule tree");
    Ok((registry, group))
}

fn render(
    registry: &ConstraintRegistry,
    group: &Group,
    target: &SqlTargetArgs,
    config: &FiltersConfig,
) -> anyhow::Result<SqlFragment> {
    if !config.enabled {
        tracing::info!("Filtering disabled by configuration");
        return Ok(SqlFragment::default());
    }

    let mut sink = SqlSink::new(&target.table);
    if let Some(alias) = &target.alias {
        sink = sink.alias(alias);
    }
    if let Some(path) = &target.relations {
        let contents = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let relations: RelationMap = parse_document(path, &contents)?;
        sink = sink.relations(relations);
    }

    let compiler = QueryCompiler::new(registry).with_limits(config.limits);
    Ok(compile_to_sql(&compiler, group, sink)?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(serde_json::from_str(&raw)?)
}
