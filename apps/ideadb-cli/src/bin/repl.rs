use std::io::{self, Write};

use ideadb_core::config::{expand_path, Config};
use ideadb_core::types::{InteractionKind, ItemInput, SearchResult};
use ideadb_embed::provider_from_config;
use ideadb_engine::{EngineOptions, IdeaEngine, SearchRequest};

fn main() -> anyhow::Result<()> {
    println!("🔍 ideadb Interactive Console");
    println!("=============================");

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let snapshot_path =
        expand_path(config.get_or("data.snapshot_path", "data/ideas.json".to_string()));
    let embedder = provider_from_config(&config)?;
    let engine = IdeaEngine::new(embedder, EngineOptions::from_config(&config));

    if snapshot_path.exists() {
        let loaded = engine.load_snapshot(&snapshot_path)?;
        println!("✅ Snapshot loaded ({} items)", loaded);
    } else {
        println!("⚠️  No snapshot at {}; starting empty", snapshot_path.display());
    }
    println!("📊 Live items: {}", engine.live_item_count());
    println!();
    print_help();

    let mut user = "local".to_string();
    loop {
        print!("ideadb> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input == "/quit" || input == "/exit" {
            break;
        } else if input == "/help" {
            print_help();
        } else if input == "/stats" {
            show_stats(&engine);
        } else if input == "/trending" {
            show_trending(&engine);
        } else if input == "/save" {
            match engine.save_snapshot(&snapshot_path) {
                Ok(n) => println!("📦 Saved {} items to {}", n, snapshot_path.display()),
                Err(e) => println!("❌ Save failed: {}", e),
            }
        } else if let Some(rest) = input.strip_prefix("/user ") {
            user = rest.trim().to_string();
            println!("Interactions now recorded as '{}'", user);
        } else if let Some(rest) = input.strip_prefix("/add ") {
            add_item(&engine, rest);
        } else if let Some(rest) = input.strip_prefix("/like ") {
            record(&engine, &user, rest.trim(), InteractionKind::Like);
        } else if let Some(rest) = input.strip_prefix("/dislike ") {
            record(&engine, &user, rest.trim(), InteractionKind::Dislike);
        } else if input.starts_with('/') {
            println!("Unknown command; try /help");
        } else {
            run_search(&engine, &user, input);
        }
    }

    println!("👋 Bye");
    Ok(())
}

fn print_help() {
    println!("🎯 Commands:");
    println!("  /help               - Show this help message");
    println!("  /stats              - Corpus engagement summary");
    println!("  /trending           - Most interacted items this week");
    println!("  /add <json>         - Add an item, e.g. /add {{\"title\":\"카페 지원\"}}");
    println!("  /like <item_id>     - Record a like");
    println!("  /dislike <item_id>  - Record a dislike");
    println!("  /user <id>          - Switch the interacting user");
    println!("  /save               - Write the snapshot to disk");
    println!("  /quit               - Exit");
    println!("  <query>             - Semantic search");
    println!();
}

fn run_search(engine: &IdeaEngine, user: &str, query: &str) {
    let mut request = SearchRequest::new(query);
    request.user_id = Some(user.to_string());
    match engine.search(&request) {
        Ok(response) => {
            println!("🔍 {} candidates, showing {}", response.total_found, response.results.len());
            print_results(&response.results);
        }
        Err(e) => println!("❌ {}", e),
    }
}

fn print_results(results: &[SearchResult]) {
    for result in results {
        println!(
            "  {}. final={:.4}  sim={:.4}  pop={:.2}  id={}",
            result.rank, result.final_score, result.similarity_score, result.popularity_score, result.id
        );
        println!("     {}", result.title);
    }
}

fn add_item(engine: &IdeaEngine, json: &str) {
    let input: ItemInput = match serde_json::from_str(json) {
        Ok(input) => input,
        Err(e) => {
            println!("❌ Not a valid item payload: {}", e);
            return;
        }
    };
    match engine.add_item(input) {
        Ok((id, neighbors)) => {
            println!("✅ Added '{}'", id);
            let near: Vec<&SearchResult> = neighbors.iter().filter(|r| r.id != id).collect();
            if !near.is_empty() {
                println!("💡 Similar existing items:");
                for r in near.iter().take(3) {
                    println!("     sim={:.4}  {}  ({})", r.similarity_score, r.title, r.id);
                }
            }
        }
        Err(e) => println!("❌ {}", e),
    }
}

fn record(engine: &IdeaEngine, user: &str, item_id: &str, kind: InteractionKind) {
    match engine.record_interaction(user, item_id, kind) {
        Ok(()) => match engine.get_item(item_id) {
            Ok(item) => println!(
                "✅ {} now at 👍{} 👎{} (popularity {:.2})",
                item.id, item.likes, item.dislikes, item.popularity_score
            ),
            Err(e) => println!("❌ {}", e),
        },
        Err(e) => println!("❌ {}", e),
    }
}

fn show_stats(engine: &IdeaEngine) {
    let stats = engine.statistics();
    println!("📊 Items: {} live", stats.total_items);
    println!("   👍 {} total likes (avg {:.1})", stats.total_likes, stats.avg_likes);
    println!("   👎 {} total dislikes (avg {:.1})", stats.total_dislikes, stats.avg_dislikes);
    if let Some(id) = &stats.most_popular {
        println!("   🏆 Most popular: {} ({:.2})", id, stats.max_popularity);
    }
    if let Some(id) = &stats.least_popular {
        println!("   🧊 Least popular: {} ({:.2})", id, stats.min_popularity);
    }
}

fn show_trending(engine: &IdeaEngine) {
    let trending = engine.trending(7, 5);
    if trending.is_empty() {
        println!("Nothing to show yet");
        return;
    }
    println!("🔥 Trending (7 days):");
    for (i, t) in trending.iter().enumerate() {
        println!(
            "  {}. {} ({} interactions, popularity {:.2})",
            i + 1,
            t.title,
            t.recent_interactions,
            t.popularity_score
        );
    }
}
