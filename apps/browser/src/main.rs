use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    DetailController, DetailSource, HttpCatalogSource, ListSource, PaginatedListController,
};
use shared::domain::{Post, Product};

mod config;

#[derive(Parser, Debug)]
#[command(name = "browser", about = "Browse posts and products from a remote catalog API")]
struct Args {
    /// Override the configured API base URL.
    #[arg(long)]
    api_base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Page through a collection and print one line per item.
    Browse {
        resource: Resource,
        /// Extra pages to pull in after the first.
        #[arg(long, default_value_t = 2)]
        pages: u32,
    },
    /// Fetch a single item by id.
    Show { resource: Resource, id: i64 },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Resource {
    Posts,
    Products,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(base_url) = args.api_base_url {
        settings.api_base_url = config::normalize_base_url(&base_url);
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.request_timeout_secs))
        .build()?;

    match args.command {
        Command::Browse {
            resource: Resource::Posts,
            pages,
        } => {
            let source = Arc::new(HttpCatalogSource::posts(http, settings.api_base_url));
            browse(
                source as Arc<dyn ListSource<Post>>,
                settings.page_size,
                pages,
                |post: &Post| {
                    format!(
                        "#{:<4} {} ({} views, {} likes)",
                        post.id.0, post.title, post.views, post.reactions.likes
                    )
                },
            )
            .await
        }
        Command::Browse {
            resource: Resource::Products,
            pages,
        } => {
            let source = Arc::new(HttpCatalogSource::products(http, settings.api_base_url));
            browse(
                source as Arc<dyn ListSource<Product>>,
                settings.page_size,
                pages,
                |product: &Product| {
                    format!(
                        "#{:<4} {} ({:.2}, rating {:.1}, stock {})",
                        product.id.0,
                        product.title,
                        product.price,
                        product.rating,
                        product.stock
                    )
                },
            )
            .await
        }
        Command::Show {
            resource: Resource::Posts,
            id,
        } => {
            let source = Arc::new(HttpCatalogSource::posts(http, settings.api_base_url));
            show(source as Arc<dyn DetailSource<Post>>, id, render_post).await
        }
        Command::Show {
            resource: Resource::Products,
            id,
        } => {
            let source = Arc::new(HttpCatalogSource::products(http, settings.api_base_url));
            show(source as Arc<dyn DetailSource<Product>>, id, render_product).await
        }
    }
}

async fn browse<T: Clone + Send + 'static>(
    source: Arc<dyn ListSource<T>>,
    page_size: u32,
    extra_pages: u32,
    line: impl Fn(&T) -> String,
) -> Result<()> {
    let controller = PaginatedListController::new(source, page_size);
    controller.load_first_page().await;
    for _ in 0..extra_pages {
        controller.load_next_page().await;
    }

    let state = controller.state().await;
    if state.has_error && state.items.is_empty() {
        anyhow::bail!("failed to load the first page; check the API base URL and retry");
    }
    for item in &state.items {
        println!("{}", line(item));
    }
    println!("{} of {} loaded", state.items.len(), state.total);
    Ok(())
}

async fn show<T: Clone + Send + 'static>(
    source: Arc<dyn DetailSource<T>>,
    id: i64,
    render: impl Fn(&T) -> String,
) -> Result<()> {
    let controller = DetailController::new(source);
    controller.load(id).await;
    match controller.state().await.item {
        Some(item) => {
            println!("{}", render(&item));
            Ok(())
        }
        None => anyhow::bail!("failed to fetch item {id}"),
    }
}

fn render_post(post: &Post) -> String {
    let tags = post
        .tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{}\n\n{}\n\n{}\nViews: {}  Likes: {}  Dislikes: {}",
        post.title, post.body, tags, post.views, post.reactions.likes, post.reactions.dislikes
    )
}

fn render_product(product: &Product) -> String {
    let brand = product.brand.as_deref().unwrap_or("unbranded");
    format!(
        "{} ({})\n{}\nPrice: {:.2}  Rating: {:.1}  Stock: {}\nThumbnail: {}",
        product.title,
        brand,
        product.description,
        product.price,
        product.rating,
        product.stock,
        product.thumbnail
    )
}
