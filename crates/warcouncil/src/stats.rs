//! `council stats`: summarize the configured corpus.

use anyhow::Result;
use std::collections::BTreeMap;

use warcouncil_core::corpus::CorpusStats;

use crate::config::Config;

pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let stats = crate::load_corpus(config).await?.snapshot()?.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print!("{}", format_stats(&stats, &config.corpus.path.display().to_string()));
    Ok(())
}

pub fn format_stats(stats: &CorpusStats, source: &str) -> String {
    let mut out = String::new();
    out.push_str("War Council - Corpus Stats\n");
    out.push_str("==========================\n\n");
    out.push_str(&format!("  Source:      {}\n", source));
    out.push_str(&format!("  Documents:   {}\n", stats.documents));
    out.push_str(&format!("  Dimensions:  {}\n", stats.dims));
    out.push_str(&format!("  Loaded at:   {}\n", stats.loaded_at));
    out.push_str(&format!("  Fingerprint: {}\n", stats.fingerprint));

    push_table(&mut out, "By type", "TYPE", &stats.by_type);
    push_table(&mut out, "By category", "CATEGORY", &stats.by_category);
    out
}

fn push_table(out: &mut String, title: &str, header: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    out.push_str(&format!("\n  {}:\n", title));
    out.push_str(&format!("  {:<24} {:>6}\n", header, "DOCS"));
    out.push_str(&format!("  {}\n", "-".repeat(31)));
    for (name, count) in counts {
        out.push_str(&format!("  {:<24} {:>6}\n", name, count));
    }
}
