//! Arkaenia Stylist - AI fashion assistant
//!
//! Command-line driver for the stylist features.
//! Run with: cargo run --bin arkaenia-stylist -- <command>

use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context};
use arkaenia_stylist::config::product_listing;
use arkaenia_stylist::model::{Attachment, GenerationClient, ProgressEvent};
use arkaenia_stylist::settings::AiSettings;
use arkaenia_stylist::stylist::{
    demo_catalog, describe_vibe, generate_model_image, generate_outfit, search_with_attachments,
    BodyType, SkinTone,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:
  arkaenia-stylist vibe <text>
  arkaenia-stylist outfit <vibe>
  arkaenia-stylist model <product-id> <body-type> <skin-hex> [out.png]
  arkaenia-stylist search <image>... [--prompt <text>]
  arkaenia-stylist catalog
  arkaenia-stylist            (interactive vibe mode)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("catalog") {
        print_catalog();
        return Ok(());
    }
    if matches!(args.first().map(String::as_str), Some("-h" | "--help" | "help")) {
        println!("{}", USAGE);
        return Ok(());
    }

    let settings = AiSettings::from_env().context("Failed to load settings")?;
    let client = GenerationClient::gemini(settings.client_config())
        .context("Failed to build HTTP client")?;

    println!("👗 Arkaenia Stylist");
    println!("================================================");
    println!("Text model: {}", settings.text_model);
    println!("Image model: {}", settings.image_model);
    println!(
        "Retry: {} attempts (text), {} attempts (image)",
        settings.max_retries, settings.image_max_retries
    );
    println!("================================================\n");

    // Progress events are printed as they arrive
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("⏳ {}", event);
        }
    });

    let result = match args.first().map(String::as_str) {
        None => run_interactive(&client, &tx).await,
        Some(command) => run_command(&client, command, &args[1..], &tx).await,
    };

    drop(tx);
    if let Err(e) = printer.await {
        tracing::warn!("Progress printer task failed: {}", e);
    }
    result
}

async fn run_command(
    client: &GenerationClient,
    command: &str,
    args: &[String],
    progress: &mpsc::UnboundedSender<ProgressEvent>,
) -> anyhow::Result<()> {
    match command {
        "vibe" => {
            let vibe = args.join(" ");
            let text = describe_vibe(client, &vibe, progress).await?;
            println!("\n✨ {}\n", text);
        }
        "outfit" => {
            let vibe = args.join(" ");
            let outfit = generate_outfit(client, &vibe, &demo_catalog(), progress).await?;
            println!("\n✨ {}", outfit.name);
            println!("{}\n", outfit.advice);
            for product in &outfit.products {
                println!("  - {} by {} (${:.2})", product.name, product.brand, product.price);
            }
        }
        "model" => {
            let [product_id, body, skin, rest @ ..] = args else {
                bail!("{}", USAGE);
            };
            let catalog = demo_catalog();
            let product = catalog
                .iter()
                .find(|p| &p.id == product_id)
                .with_context(|| format!("Unknown product id: {}", product_id))?;
            let body_type: BodyType = body.parse()?;
            let skin_tone: SkinTone = skin.parse()?;
            let out = rest.first().map(String::as_str).unwrap_or("model.png");

            let image =
                generate_model_image(client, product, body_type, skin_tone, progress).await?;
            std::fs::write(out, image.bytes())
                .with_context(|| format!("Failed to write {}", out))?;
            println!("\n✅ Saved {} ({})", out, image.mime_type());
        }
        "search" => {
            let (paths, query) = split_prompt_flag(args);
            if paths.is_empty() {
                bail!("{}", USAGE);
            }
            let attachments = paths
                .iter()
                .map(|path| load_attachment(Path::new(path)))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let found =
                search_with_attachments(client, &query, attachments, &demo_catalog(), progress)
                    .await?;
            if found.is_empty() {
                println!("\nNo similar products found.");
            }
            for product in &found {
                println!("  - [{}] {} by {}", product.id, product.name, product.brand);
            }
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
    Ok(())
}

/// Interactive mode: describe vibes until the user quits.
async fn run_interactive(
    client: &GenerationClient,
    progress: &mpsc::UnboundedSender<ProgressEvent>,
) -> anyhow::Result<()> {
    println!("Interactive mode. Describe a vibe and press Enter.");
    println!("Type 'quit' or 'exit' to exit.\n");

    let stdin = io::stdin();
    loop {
        print!("💭 Vibe: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let vibe = line.trim();

        if vibe.is_empty() {
            continue;
        }
        if vibe == "quit" || vibe == "exit" {
            println!("Goodbye! 👋");
            break;
        }

        match describe_vibe(client, vibe, progress).await {
            Ok(text) => println!("\n✨ {}\n", text),
            Err(e) => eprintln!("\n❌ Error: {}\n", e),
        }
    }
    Ok(())
}

fn print_catalog() {
    println!("{}", product_listing(&demo_catalog()));
}

/// Split `--prompt <text>` out of the positional arguments.
fn split_prompt_flag(args: &[String]) -> (Vec<String>, String) {
    let mut paths = Vec::new();
    let mut query = String::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--prompt" {
            query = iter.by_ref().cloned().collect::<Vec<_>>().join(" ");
            break;
        }
        paths.push(arg.clone());
    }
    (paths, query)
}

fn load_attachment(path: &Path) -> anyhow::Result<Attachment> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Attachment::image(data).with_context(|| format!("Unsupported image {}", path.display()))
}
