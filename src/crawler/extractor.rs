//! Streaming link extraction
//!
//! Response bodies are fed chunk by chunk into lol_html's streaming rewriter,
//! which never builds a document tree. Every `<a href>` start or self-closing
//! tag yields one absolute URL.

use crate::crawler::fetcher::FetchedPage;
use crate::url::resolve_against;
use bytes::Bytes;
use lol_html::{element, HtmlRewriter, Settings};
use std::cell::RefCell;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

/// Body chunks buffered between the network and the tokenizer
const CHUNK_BUFFER: usize = 16;

/// Lazy, finite sequence of absolute link URLs from one page
pub type LinkStream = UnboundedReceiverStream<String>;

/// Streams `page`'s body through the tokenizer and yields resolved links
///
/// The stream ends when the body ends, a body read fails, the crawl is
/// cancelled, or the tokenizer gives up on the input. None of these are
/// reported as errors. Dropping the stream stops the work early and releases
/// the page's fetch slot.
pub fn extract_links(page: FetchedPage, base: Url) -> LinkStream {
    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Bytes>(CHUNK_BUFFER);
    let (link_tx, link_rx) = mpsc::unbounded_channel();

    // The rewriter is synchronous and not Send, so it lives on a blocking thread.
    let tokenizer_base = base.clone();
    tokio::task::spawn_blocking(move || {
        tokenize_anchors(
            std::iter::from_fn(|| chunk_rx.blocking_recv()),
            &tokenizer_base,
            |link| link_tx.send(link).is_ok(),
        );
    });

    tokio::spawn(pump_body(page, base, chunk_tx));

    UnboundedReceiverStream::new(link_rx)
}

async fn pump_body(mut page: FetchedPage, base: Url, chunks: mpsc::Sender<Bytes>) {
    loop {
        match page.chunk().await {
            Ok(Some(chunk)) => {
                if chunks.send(chunk).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(url = %base, error = %e, "body read ended early");
                break;
            }
        }
    }
}

/// Extracts links from an in-memory document with the same tokenizer
///
/// # Example
///
/// ```
/// use sumi_sitemap::crawler::extract_links_from_html;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let links = extract_links_from_html(r#"<a href="intro">Intro</a>"#, &base);
/// assert_eq!(links, vec!["https://example.com/docs/intro".to_string()]);
/// ```
pub fn extract_links_from_html(html: &str, base: &Url) -> Vec<String> {
    let mut links = Vec::new();
    tokenize_anchors(std::iter::once(html.as_bytes()), base, |link| {
        links.push(link);
        true
    });
    links
}

/// Runs the anchor tokenizer over `chunks`, calling `emit` per resolved link
///
/// Stops early when `emit` returns false.
fn tokenize_anchors<I, F>(chunks: I, base: &Url, mut emit: F)
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
    F: FnMut(String) -> bool,
{
    let hrefs = RefCell::new(Vec::new());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("a[href]", |el| {
                if let Some(href) = el.get_attribute("href") {
                    hrefs.borrow_mut().push(href);
                }
                Ok(())
            })],
            strict: false,
            ..Settings::default()
        },
        |_: &[u8]| {},
    );

    for chunk in chunks {
        if let Err(e) = rewriter.write(chunk.as_ref()) {
            tracing::debug!(base = %base, error = %e, "tokenizer stopped");
            // Links found before the error still count.
            drain(&hrefs, base, &mut emit);
            return;
        }
        if !drain(&hrefs, base, &mut emit) {
            return;
        }
    }

    if let Err(e) = rewriter.end() {
        tracing::debug!(base = %base, error = %e, "tokenizer stopped at end of input");
    }
    drain(&hrefs, base, &mut emit);
}

fn drain<F>(hrefs: &RefCell<Vec<String>>, base: &Url, emit: &mut F) -> bool
where
    F: FnMut(String) -> bool,
{
    let batch = std::mem::take(&mut *hrefs.borrow_mut());
    for href in batch {
        if let Some(link) = resolve_against(base, &href) {
            if !emit(link) {
                return false;
            }
        }
    }
    true
}
