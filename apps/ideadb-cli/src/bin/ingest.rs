use std::{env, path::PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use ideadb_core::config::{expand_path, Config};
use ideadb_core::types::ItemInput;
use ideadb_embed::provider_from_config;
use ideadb_engine::{EngineOptions, IdeaEngine};

const BATCH: usize = 64;

fn main() -> anyhow::Result<()> {
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut rows_path = None; let mut snapshot_override = None; let mut fresh = false;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--fresh" => fresh = true,
        "--snapshot" => { if i + 1 < args.len() { snapshot_override = Some(args[i + 1].clone()); i += 1; } else { eprintln!("Error: --snapshot requires a path"); std::process::exit(1); } }
        _ if !args[i].starts_with('-') => rows_path = Some(PathBuf::from(&args[i])), _ => {} } i += 1; }
    let Some(rows_path) = rows_path else {
        eprintln!("Usage: ideadb-ingest <rows.jsonl> [--snapshot <path>] [--fresh]");
        std::process::exit(1);
    };
    let snapshot_path = expand_path(
        snapshot_override.unwrap_or_else(|| config.get_or("data.snapshot_path", "data/ideas.json".to_string())),
    );

    println!("ideadb Ingest\n=============");
    println!("Rows file: {}", rows_path.display());
    println!("Snapshot:  {}", snapshot_path.display());

    let embedder = provider_from_config(&config)?;
    println!("🚀 Embedding provider: {}", embedder.id());
    let engine = IdeaEngine::new(embedder, EngineOptions::from_config(&config));

    if fresh {
        println!("⚠️  Starting fresh (--fresh flag); existing snapshot will be overwritten");
    } else if snapshot_path.exists() {
        let loaded = engine.load_snapshot(&snapshot_path)?;
        println!("📦 Loaded existing snapshot ({} items)", loaded);
    }

    let raw = std::fs::read_to_string(&rows_path)?;
    let mut rows: Vec<ItemInput> = Vec::new();
    let mut malformed = 0usize;
    for line in raw.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str::<ItemInput>(line) {
            Ok(row) => rows.push(row),
            Err(_) => malformed += 1,
        }
    }
    println!("Parsed {} rows ({} malformed lines skipped)", rows.len(), malformed);

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut ingested = 0usize;
    let mut skipped = malformed;
    for batch in rows.chunks(BATCH) {
        let report = engine.ingest_batch(batch.to_vec())?;
        ingested += report.ingested;
        skipped += report.skipped;
        pb.inc(batch.len() as u64);
        pb.set_message(format!("{} ingested", ingested));
    }
    pb.finish_with_message("done");

    let saved = engine.save_snapshot(&snapshot_path)?;
    println!("\n✅ Ingest completed successfully!");
    println!("📊 Ingested {} items ({} rows skipped)", ingested, skipped);
    println!("📦 Snapshot holds {} items: {}", saved, snapshot_path.display());
    println!("\n💡 To search, use: cargo run --bin ideadb-search '<query>'");
    Ok(())
}
