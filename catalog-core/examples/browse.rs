//! Interactive catalog browser
//!
//! Drives a [`ProductCacheCoordinator`] against the live storefront API from
//! the terminal.
//!
//! Run: cargo run --example browse
//!
//! Commands:
//!   search <term>   search products (blank term clears)
//!   cat <id>        toggle a category filter
//!   more            load the next page
//!   clear           clear all filters
//!   cats            list categories
//!   recover         discard the cache and reload
//!   quit

use std::io::{self, Write};

use anyhow::Context;
use catalog_core::{CatalogConfig, ProductCacheCoordinator, logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init_logger_with_file(Some("info"), std::env::var("CATALOG_LOG_DIR").ok().as_deref());

    let config = CatalogConfig::from_env();
    println!("\nCatalog browser");
    println!("===============");
    println!("API: {}\n", config.api_url);

    let coordinator =
        ProductCacheCoordinator::from_config(config).context("Failed to build HTTP client")?;

    if !coordinator.initialize().await {
        println!("Initialization failed, showing what is available");
    }
    print_products(&coordinator);

    loop {
        let line = prompt("> ")?;
        let (command, arg) = line
            .split_once(' ')
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line.as_str(), ""));

        match command {
            "" => continue,
            "search" => coordinator.search(arg),
            "cat" => match arg.parse::<i64>() {
                Ok(id) => coordinator.select_category(Some(id)),
                Err(_) => {
                    println!("usage: cat <id>");
                    continue;
                }
            },
            "more" => coordinator.load_more(),
            "clear" => coordinator.clear_all_filters(),
            "cats" => {
                for category in coordinator.store().current_state().categories {
                    println!("  [{}] {}", category.id, category.name);
                }
                continue;
            }
            "recover" => {
                let ok = coordinator.force_data_recovery().await;
                println!("Recovery {}", if ok { "succeeded" } else { "failed" });
            }
            "quit" | "exit" => break,
            other => {
                println!("unknown command: {other}");
                continue;
            }
        }

        coordinator.wait_until_settled().await;
        print_products(&coordinator);
    }

    coordinator.shutdown();
    Ok(())
}

fn print_products(coordinator: &ProductCacheCoordinator) {
    let view = coordinator.store().products_view().get();
    let pagination = coordinator.store().current_state().pagination;

    println!("\n{} ({} shown)", view.category, view.products.len());
    if let Some(count) = coordinator.search_results_count() {
        println!(
            "Search \"{}\": {} results",
            coordinator.current_search_term(),
            count
        );
    }
    for product in &view.products {
        println!("  #{:<5} {:<50} {:>8.2}", product.id, product.title, product.price);
    }
    if let Some(error) = view.error {
        println!("! {error}");
    }
    if pagination.has_more {
        println!("(more available: type `more`)");
    }
    println!(
        "cache: {} products{}",
        coordinator.context().cache_len(),
        if coordinator.context().is_all_loaded() { ", complete" } else { "" }
    );
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok("quit".to_string());
    }
    Ok(input.trim().to_string())
}
