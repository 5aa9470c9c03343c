use serde::{Deserialize, Serialize};

/// One crawled page and the same-domain pages crawled from it
///
/// Serializes as `{"url": ..., "links": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlNode {
    /// Canonical URL of the page
    pub url: String,

    /// Successfully crawled children, in the order their tasks completed
    #[serde(rename = "links", default)]
    pub children: Vec<CrawlNode>,
}

impl CrawlNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this subtree, including self
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(CrawlNode::len).sum::<usize>()
    }

    /// A node always contains at least itself
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Height of the subtree: 0 for a leaf
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// All URLs in the subtree, pre-order
    pub fn urls(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_urls(&mut out);
        out
    }

    fn collect_urls<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.url);
        for child in &self.children {
            child.collect_urls(out);
        }
    }

    /// Looks up a direct child by URL
    pub fn child(&self, url: &str) -> Option<&CrawlNode> {
        self.children.iter().find(|c| c.url == url)
    }
}
