use std::env;

use ideadb_core::config::{expand_path, Config};
use ideadb_embed::provider_from_config;
use ideadb_engine::{EngineOptions, IdeaEngine, SearchRequest};

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [top_k] [snapshot]", args[0]);
        eprintln!("Example: {} '카페 창업 지원' 5 data/ideas.json", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let top_k = args
        .get(2)
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(|| config.get_or("search.default_top_k", 5));
    let snapshot_path = expand_path(
        args.get(3)
            .cloned()
            .unwrap_or_else(|| config.get_or("data.snapshot_path", "data/ideas.json".to_string())),
    );

    println!("🔍 ideadb-search\n================");
    println!("Query: {}", query_text);
    println!("Snapshot: {}", snapshot_path.display());

    let embedder = provider_from_config(&config)?;
    let engine = IdeaEngine::new(embedder, EngineOptions::from_config(&config));
    let loaded = engine.load_snapshot(&snapshot_path)?;
    println!("📦 Loaded {} items", loaded);

    let mut request = SearchRequest::new(query_text.clone());
    request.top_k = top_k;
    request.similarity_threshold = config.get_or("search.min_similarity", 0.3);
    let response = engine.search(&request)?;

    println!("\n🔍 Found {} candidates for: \"{}\"", response.total_found, query_text);
    for result in &response.results {
        println!(
            "\n  {}. final={:.4}  sim={:.4}  pop={:.2}  id={}",
            result.rank, result.final_score, result.similarity_score, result.popularity_score, result.id
        );
        println!("     {}", result.title);
        if !result.body_snippet.is_empty() {
            println!("     📝 {}", result.body_snippet);
        }
        if !result.attributes.is_empty() {
            let facets: Vec<String> =
                result.attributes.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("     🏷️  {}", facets.join("  "));
        }
    }
    Ok(())
}
