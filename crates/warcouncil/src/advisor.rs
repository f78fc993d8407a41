//! Conversational advisor: analyze a question, retrieve reference
//! documents, and assemble the context block for the answer.

use anyhow::Result;

use warcouncil_core::context::{assemble_context, RetrievalContext};
use warcouncil_core::engine::RetrievalEngine;
use warcouncil_core::query::{analyze_query, QueryAnalysis};

use crate::config::Config;

/// Retrieve and assemble the context for one advisor question.
pub async fn advise(
    engine: &RetrievalEngine,
    query: &str,
    max_excerpt_chars: usize,
) -> Result<RetrievalContext> {
    let analysis = analyze_query(query);
    let documents = engine.retrieve(query, &analysis).await?;
    Ok(assemble_context(&documents, &analysis, max_excerpt_chars))
}

/// `council analyze`: print the interpretation of a question.
pub fn run_analyze(query: &str, json: bool) -> Result<()> {
    let analysis = analyze_query(query);
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}

fn print_analysis(analysis: &QueryAnalysis) {
    println!("intent: {}", analysis.kind());
    match analysis.tier_level {
        Some(tier) => println!("tier:   {}", tier),
        None => println!("tier:   -"),
    }
    for (label, value) in analysis.intent.describe_params() {
        println!("  {}: {}", label, value);
    }
}

/// `council ask`: print the retrieval context for a question.
pub async fn run_ask(config: &Config, query: &str, json: bool) -> Result<()> {
    let engine = crate::open_engine(config).await?;
    let context = advise(&engine, query, config.retrieval.max_excerpt_chars).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
    } else {
        print!("{}", context.render());
    }
    Ok(())
}
