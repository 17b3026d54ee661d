use anyhow::{bail, Context};
use nepsum_lib::init_logging;
use nepsum_lib::models::{Summary, SummaryReport};
use nepsum_lib::services::config_store::{AppConfig, ConfigStore};
use nepsum_lib::services::providers::{model_url, ProviderClient};
use nepsum_lib::services::sentence_segmenter::segment_sentences;
use nepsum_lib::services::text_processor::word_count;
use nepsum_lib::services::{Summarizer, SummaryOptions};
use std::io::Read;
use std::path::PathBuf;
use tracing::warn;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_usize(args: &[String], key: &str) -> anyhow::Result<Option<usize>> {
    parse_arg_value(args, key)
        .map(|v| v.parse::<usize>().with_context(|| format!("{} expects a number, got {:?}", key, v)))
        .transpose()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_input(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin failed")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("read file failed: {}", path))
}

fn load_config(args: &[String]) -> anyhow::Result<AppConfig> {
    let store = match parse_arg_value(args, "--config") {
        Some(p) => ConfigStore::from_file(PathBuf::from(p)),
        None => match ConfigStore::default_config_dir() {
            Some(dir) => ConfigStore::new(dir),
            None => return Ok(AppConfig::default()),
        },
    };
    store.load().map_err(anyhow::Error::msg)
}

fn print_summary(summary: &Summary, options: &SummaryOptions) {
    println!("Summary ({}):", summary.method);
    println!("{}", summary.text);
    println!();
    println!("Words: {}  Sentences: {}", summary.word_count, summary.sentence_count);
    if !summary.within_window {
        println!(
            "Note: could not fit the summary into {}-{} words.",
            options.target_min, options.target_max
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || has_flag(&args, "--help") {
        eprintln!(
            "Usage:\n  summarize <path|-> [--min <n>] [--max <n>] [--sentences <n>] [--provider hf] [--model <name>] [--scores] [--out <json_path>] [--config <path>]\n\nNotes:\n  - `-` reads the article from stdin.\n  - `--provider hf` calls the hosted model (token from NEPSUM_HF_TOKEN or HF_API_TOKEN) and falls back to local extraction on failure."
        );
        return Ok(());
    }

    init_logging();

    let path = args[1].clone();
    let config = load_config(&args)?;

    let mut options = SummaryOptions::from(&config.summary);
    if let Some(min) = parse_usize(&args, "--min")? {
        options.target_min = min;
    }
    if let Some(max) = parse_usize(&args, "--max")? {
        options.target_max = max;
    }
    if let Some(n) = parse_usize(&args, "--sentences")? {
        options.num_sentences = n;
    }
    let summarizer = Summarizer::new(options);
    let options = *summarizer.options();

    let text = read_input(&path)?;
    if text.trim().is_empty() {
        warn!("empty input, nothing to summarize");
        bail!("please provide some text to summarize");
    }

    let use_provider = match parse_arg_value(&args, "--provider").as_deref() {
        Some("hf") | Some("huggingface") => true,
        Some(other) => bail!("unknown provider: {}", other),
        None => config.provider.enabled,
    };

    let mut provider_error: Option<String> = None;
    let summary = if use_provider {
        let endpoint = match parse_arg_value(&args, "--model") {
            Some(model) => model_url(&model),
            None => std::env::var("NEPSUM_PROVIDER_URL").unwrap_or_else(|_| config.provider.endpoint()),
        };
        let api_key = nepsum_lib::services::providers::get_api_key();
        let client = match config.provider.proxy.as_deref() {
            Some(proxy) => ProviderClient::with_proxy(&endpoint, api_key, proxy)?,
            None => ProviderClient::with_endpoint(&endpoint, api_key)?,
        };
        let policy = config.provider.retry_policy();

        match summarizer.summarize_with_provider(&client, &text, &policy).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("provider failed, using local extraction: {}", e);
                eprintln!("Provider failed ({}); used local extraction instead.", e);
                provider_error = Some(e.to_string());
                summarizer.summarize_detailed(&text)
            }
        }
    } else {
        summarizer.summarize_detailed(&text)
    };

    print_summary(&summary, &options);

    let show_scores = has_flag(&args, "--scores");
    let scores = if show_scores { summarizer.score(&text) } else { Vec::new() };
    if show_scores {
        println!();
        println!("Sentence scores:");
        for s in &scores {
            println!(
                "[S{:03}] score={:.3} pos={:.2} len={:.2} detail={:.2} words={}  {}",
                s.original_index,
                s.score,
                s.breakdown.position,
                s.breakdown.length,
                s.breakdown.detail,
                s.sentence.word_count,
                preview(&s.sentence.text, 60)
            );
        }
    }

    if let Some(out_path) = parse_arg_value(&args, "--out") {
        let report = SummaryReport {
            source: path.clone(),
            input_words: word_count(&text),
            input_sentences: segment_sentences(&text).len(),
            target_min: options.target_min,
            target_max: options.target_max,
            summary,
            provider_error,
            scores,
        };
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&out_path, json).with_context(|| format!("write out failed: {}", out_path))?;
        println!();
        println!("Wrote JSON: {}", out_path);
    }

    Ok(())
}
