//! PlanLayer EXPLAIN demo
//!
//! Builds a sample plan with a shared sub-plan, runs the optimizer on it and
//! prints the plan before and after.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use planlayer::lqp::nodes::{
    ColumnDefinition, JoinNode, LimitNode, PredicateNode, SortNode, StoredTableNode, UnionNode,
};
use planlayer::lqp::{describe_plan, lqp_hash, lqp_node_count, LqpNodeRef};
use planlayer::{
    logging, Config, DataType, DescriptionMode, Expression, JoinMode, LqpCache, Optimizer,
    PredicateCondition, SetOperationMode, SortMode,
};

#[derive(Parser)]
#[command(name = "planlayer-explain")]
#[command(about = "Optimize and render a sample logical query plan")]
struct Args {
    /// Configuration file (defaults to planlayer.toml + planlayer.local.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Render detailed node descriptions
    #[arg(short, long)]
    detailed: bool,

    /// Override optimizer.max_iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    show_config: bool,

    /// Emit a JSON report instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {path}"))?,
        None => Config::load().context("loading configuration")?,
    };
    if let Some(max_iterations) = args.max_iterations {
        config.optimizer.max_iterations = max_iterations;
    }
    if args.show_config {
        print!("{}", toml::to_string_pretty(&config).context("serializing configuration")?);
        return Ok(());
    }
    logging::init(&config.logging);

    let mode = if args.detailed {
        DescriptionMode::Detailed
    } else {
        DescriptionMode::Short
    };

    let plan = sample_plan()?;
    let optimizer = Optimizer::from_config(&config.optimizer);
    tracing::info!(rules = ?optimizer.rule_names(), "optimizing sample plan");
    let optimized = optimizer.optimize(&plan)?;

    // A second translation of the same query finds the first one's entry
    let cache = LqpCache::from_config(&config.cache);
    cache.insert(&optimizer.optimize(&sample_plan()?)?, "compiled");
    let hit = cache.get(&optimized).is_some();

    if args.json {
        let report = serde_json::json!({
            "input": {
                "nodes": lqp_node_count(&plan),
                "plan": describe_plan(&plan, mode).lines().collect::<Vec<_>>(),
            },
            "optimized": {
                "nodes": lqp_node_count(&optimized),
                "plan": describe_plan(&optimized, mode).lines().collect::<Vec<_>>(),
                "hash": format!("{:#018x}", lqp_hash(&optimized)),
            },
            "rules": optimizer.rule_names(),
            "cache_hit": hit,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Input plan ({} nodes):", lqp_node_count(&plan));
    print!("{}", describe_plan(&plan, mode));
    println!();
    println!("Optimized plan ({} nodes):", lqp_node_count(&optimized));
    print!("{}", describe_plan(&optimized, mode));
    println!();
    println!("Plan hash: {:#018x}", lqp_hash(&optimized));
    println!("Cache lookup for an identical plan: {}", if hit { "hit" } else { "miss" });

    Ok(())
}

/// Orders of customers with more than 5 orders placed in a date window,
/// unioned with the top customers; the customer scan is shared.
fn sample_plan() -> Result<LqpNodeRef> {
    let customers = StoredTableNode::make(
        "customers",
        vec![
            ColumnDefinition::new("c_id", DataType::Int64, false),
            ColumnDefinition::new("c_name", DataType::String, false),
            ColumnDefinition::new("c_orders", DataType::Int32, true),
        ],
    );
    let orders = StoredTableNode::make(
        "orders",
        vec![
            ColumnDefinition::new("o_customer", DataType::Int64, false),
            ColumnDefinition::new("o_date", DataType::Int32, false),
        ],
    );
    let c = customers.output_expressions();
    let o = orders.output_expressions();

    let frequent = PredicateNode::make(
        Expression::binary(PredicateCondition::LessThan, Expression::value(5), c[2].clone())?,
        Arc::clone(&customers),
    );
    let from_date = PredicateNode::make(
        Expression::binary(
            PredicateCondition::GreaterThanEquals,
            o[1].clone(),
            Expression::value(20_240_101),
        )?,
        orders,
    );
    let in_window = PredicateNode::make(
        Expression::binary(
            PredicateCondition::LessThan,
            o[1].clone(),
            Expression::value(20_250_101),
        )?,
        from_date,
    );
    let joined = JoinNode::make(
        JoinMode::Semi,
        vec![Expression::binary(PredicateCondition::Equals, c[0].clone(), o[0].clone())?],
        frequent,
        in_window,
    );

    let top = LimitNode::make(
        10,
        SortNode::make(vec![(c[2].clone(), SortMode::Descending)], customers),
    );

    Ok(UnionNode::make(SetOperationMode::Unique, joined, top))
}
