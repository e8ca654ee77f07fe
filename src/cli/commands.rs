use crate::app::{AppContext, Result, TributaryError};
use crate::domain::{Article, Source};
use crate::store::Store;
use crate::urls::canonical_url;

pub async fn subscribe(ctx: &AppContext, url: &str, wait: bool) -> Result<()> {
    let url = canonical_url(url);
    let (source, created) = ctx.store.get_or_create_source(&url)?;

    if created {
        println!("Added source: {}", url);
    } else {
        println!("Source already exists: {}", url);
    }

    let report = ctx.poller.poll(source).await?;

    if let Some(source) = ctx.store.get_source(&url)? {
        if let Some(ref title) = source.title {
            println!("Source title: {}", title);
        }
    }
    println!(
        "Found {} entries, {} new articles",
        report.entries, report.populated
    );

    finish(ctx, wait).await;
    Ok(())
}

pub async fn poll_sources(ctx: &AppContext, wait: bool) -> Result<()> {
    let sources = ctx.store.all_sources()?;

    if sources.is_empty() {
        println!("No sources to poll");
        return Ok(());
    }

    println!("Polling {} sources...", sources.len());

    let results = ctx.poller.poll_all(sources).await;

    let mut total_new = 0;
    let mut errors = 0;

    for (url, result) in results {
        match result {
            Ok(report) => {
                total_new += report.populated;
                if report.populated > 0 {
                    println!("  {} new articles from {}", report.populated, url);
                }
            }
            Err(e) => {
                errors += 1;
                eprintln!("  Error polling {}: {}", url, e);
            }
        }
    }

    println!("Poll complete: {} new articles, {} errors", total_new, errors);

    finish(ctx, wait).await;
    Ok(())
}

pub async fn discover(ctx: &AppContext, url: &str) -> Result<()> {
    let source = Source::new(canonical_url(url));

    match ctx.discovery.discover(&source).await {
        Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        None => println!("No feed found for {}", source.url),
    }

    Ok(())
}

pub async fn fetch_article(ctx: &AppContext, url: &str) -> Result<()> {
    let mut article = ctx.articles.ensure_article(url)?;
    ctx.articles.fetch(&mut article).await?;

    if article.fetch_failed() {
        return Err(TributaryError::Extract(format!("could not fetch {}", article.url)));
    }

    println!("{}", serde_json::to_string_pretty(&article)?);
    Ok(())
}

pub async fn extract(ctx: &AppContext, url: &str) -> Result<()> {
    println!("{}", ctx.articles.preview(url).await?);
    Ok(())
}

pub fn list_sources(ctx: &AppContext) -> Result<()> {
    let sources = ctx.store.all_sources()?;

    if sources.is_empty() {
        println!("No sources");
        return Ok(());
    }

    for source in sources {
        let fetched = source
            .last_fetched
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "{} (polled {})\n  {}",
            source.display_title(),
            fetched,
            source.url
        );
    }

    Ok(())
}

pub fn list_articles(ctx: &AppContext, source_url: &str, limit: usize) -> Result<()> {
    let url = canonical_url(source_url);
    let source = ctx
        .store
        .get_source(&url)?
        .ok_or_else(|| TributaryError::SourceNotFound(url.clone()))?;

    let articles = ctx.store.articles_for_source(&source.url, limit)?;

    if articles.is_empty() {
        println!("No articles");
        return Ok(());
    }

    for article in articles {
        println!("{} {} {}", marker(&article), date(&article), source.trim_article_title(article.display_title()));
    }

    Ok(())
}

fn marker(article: &Article) -> &'static str {
    if article.fetch_failed() {
        "!"
    } else if article.parsed.is_some() {
        "●"
    } else {
        " "
    }
}

fn date(article: &Article) -> String {
    article
        .published
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "          ".to_string())
}

async fn finish(ctx: &AppContext, wait: bool) {
    let pending = ctx.queue.pending();
    if !wait || pending == 0 {
        return;
    }

    println!("Fetching {} articles...", pending);
    ctx.queue.wait_idle().await;
    println!("Done");
}
