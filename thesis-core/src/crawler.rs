//! Same-site crawler that dumps page text for ranking.
//!
//! Plain HTTP plus HTML parsing; no JavaScript rendering. Each visited page
//! contributes its headings and paragraphs in document order, followed by
//! a page-break line, to one text file per crawl. The file name carries the
//! caller's key as well as the site, so two firms on one domain never share
//! a dump.

use crate::config::CrawlerConfig;
use crate::rank::PAGE_BREAK;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid start URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Start URL has no host: {0}")]
    NoHost(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No page of {0} could be fetched")]
    NoPages(String),
}

pub type Result<T> = std::result::Result<T, CrawlError>;

/// Fetches a site and writes its text to disk.
#[async_trait]
pub trait SiteCrawler: Send + Sync {
    /// Crawls from `start_url` and returns the path of the text dump.
    ///
    /// `key` identifies the crawl (the firm id) and must be unique among
    /// crawls whose dumps are alive at the same time.
    async fn crawl(&self, key: &str, start_url: &str) -> Result<PathBuf>;
}

/// Breadth-first crawler over reqwest.
pub struct HttpCrawler {
    client: reqwest::Client,
    config: CrawlerConfig,
}

impl HttpCrawler {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, config })
    }

    async fn fetch_html(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SiteCrawler for HttpCrawler {
    async fn crawl(&self, key: &str, start_url: &str) -> Result<PathBuf> {
        let mut start = Url::parse(start_url).map_err(|source| CrawlError::InvalidUrl {
            url: start_url.to_string(),
            source,
        })?;
        start.set_query(None);
        start.set_fragment(None);

        let site = site_of(&start).ok_or_else(|| CrawlError::NoHost(start_url.to_string()))?;
        let output = dump_path(&self.config.output_dir, key, &site);

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let mut file = tokio::fs::File::create(&output).await?;

        info!(url = %start, max_pages = self.config.max_pages, "Starting crawl");

        let mut visited: HashSet<String> = HashSet::new();
        let mut seen: HashSet<String> = HashSet::from([start.to_string()]);
        let mut queue: VecDeque<Url> = VecDeque::from([start]);
        let mut written = 0usize;

        while visited.len() < self.config.max_pages {
            let Some(url) = queue.pop_front() else {
                break;
            };
            if !visited.insert(url.to_string()) {
                continue;
            }

            let html = match self.fetch_html(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(url = %url, error = %e, "Skipping page");
                    continue;
                }
            };

            let (text, links) = parse_page(&html, &url, &site, &self.config.exclude_keywords);
            file.write_all(text.as_bytes()).await?;
            written += 1;
            debug!(url = %url, links = links.len(), "Page written");

            for link in links {
                if seen.insert(link.to_string()) {
                    queue.push_back(link);
                }
            }
        }

        file.flush().await?;
        drop(file);

        if written == 0 {
            remove_dump(&output).await;
            return Err(CrawlError::NoPages(start_url.to_string()));
        }

        info!(site = %site, pages = written, path = %output.display(), "Crawl finished");
        Ok(output)
    }
}

/// Deletes a dump file, logging rather than failing.
pub async fn remove_dump(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Could not remove page dump");
    }
}

/// Host without a leading `www.`.
pub(crate) fn site_of(url: &Url) -> Option<String> {
    url.host_str().map(|host| {
        let host = host.to_lowercase();
        host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
    })
}

/// `<key>_<site>.txt` with every non-alphanumeric character folded to `_`.
pub(crate) fn dump_path(dir: &Path, key: &str, site: &str) -> PathBuf {
    let stem: String = format!("{}_{}", key, site)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("{}.txt", stem))
}

/// Renders a page and collects its crawlable links. Keeps the parsed
/// document out of the async caller.
fn parse_page(html: &str, page_url: &Url, site: &str, exclude: &[String]) -> (String, Vec<Url>) {
    let document = Html::parse_document(html);
    (render_page(&document), extract_links(&document, page_url, site, exclude))
}

/// Headings and paragraphs in document order, then the page break.
fn render_page(document: &Html) -> String {
    let mut out = String::new();

    if let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6, p") {
        for element in document.select(&selector) {
            let text = element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                continue;
            }

            if element.value().name().starts_with('h') {
                out.push('\n');
                out.push_str(&text);
                out.push('\n');
            } else {
                out.push_str(&text);
                out.push('\n');
            }
        }
    }

    out.push('\n');
    out.push_str(PAGE_BREAK);
    out.push_str("\n\n");
    out
}

/// Same-site http(s) links with query and fragment removed, minus any
/// whose URL contains an excluded keyword.
fn extract_links(document: &Html, page_url: &Url, site: &str, exclude: &[String]) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| page_url.join(href).ok())
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .filter(|url| site_of(url).as_deref() == Some(site))
        .map(|mut url| {
            url.set_query(None);
            url.set_fragment(None);
            url
        })
        .filter(|url| {
            let lower = url.as_str().to_lowercase();
            !exclude.iter().any(|kw| lower.contains(&kw.to_lowercase()))
        })
        .filter(|url| seen.insert(url.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::default_exclude_keywords;
    use std::collections::HashMap;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const HOME: &str = r#"<html><body>
        <nav><a href="/strategy?ref=nav#top">Strategy</a> <a href="/careers">Careers</a></nav>
        <h1>Example  Capital</h1>
        <p>We invest in   <b>founder-owned</b> businesses.</p>
        <p>   </p>
        <a href="https://www.example.com/portfolio">Portfolio</a>
        <a href="https://other.com/about">Elsewhere</a>
        <a href="mailto:deals@example.com">Mail</a>
        <a href="/report.pdf">Annual report</a>
    </body></html>"#;

    fn home_url() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_render_page_writes_headings_and_paragraphs() {
        let text = render_page(&Html::parse_document(HOME));
        assert_eq!(
            text,
            "\nExample Capital\nWe invest in founder-owned businesses.\n\n---PAGE BREAK---\n\n"
        );
    }

    #[test]
    fn test_extract_links_stays_on_site() {
        let links = extract_links(
            &Html::parse_document(HOME),
            &home_url(),
            "example.com",
            &default_exclude_keywords(),
        );
        let links: Vec<&str> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec!["https://example.com/strategy", "https://www.example.com/portfolio"]
        );
    }

    #[test]
    fn test_site_and_dump_path() {
        let url = Url::parse("https://WWW.Example.com/about").unwrap();
        let site = site_of(&url).unwrap();
        assert_eq!(site, "example.com");
        assert_eq!(
            dump_path(Path::new("/tmp/pages"), "42", &site),
            PathBuf::from("/tmp/pages/42_example_com.txt")
        );
        assert_eq!(
            dump_path(Path::new("/tmp/pages"), "../a b", "example.com:8080"),
            PathBuf::from("/tmp/pages/___a_b_example_com_8080.txt")
        );
    }

    /// Serves canned pages over HTTP/1.1 until the test ends.
    async fn serve(pages: HashMap<&'static str, String>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let response = match pages.get(path.as_str()) {
                    Some(body) => format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    ),
                    None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Url::parse(&format!("http://{}/", addr)).unwrap()
    }

    fn crawler(dir: &Path, max_pages: usize) -> HttpCrawler {
        HttpCrawler::new(CrawlerConfig {
            max_pages,
            output_dir: dir.to_path_buf(),
            request_timeout_secs: 5,
            ..CrawlerConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_crawl_follows_links_breadth_first() {
        let pages = HashMap::from([
            (
                "/",
                r#"<h1>Home</h1><p>Welcome.</p><a href="/focus">Focus</a><a href="/missing">Gone</a><a href="/careers">Jobs</a>"#.to_string(),
            ),
            (
                "/focus",
                r#"<h2>Focus</h2><p>Healthcare services.</p><a href="/">Home</a>"#.to_string(),
            ),
        ]);
        let base = serve(pages).await;
        let dir = tempfile::tempdir().unwrap();

        let path = crawler(dir.path(), 30).crawl("1", base.as_str()).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert_eq!(
            text,
            "\nHome\nWelcome.\n\n---PAGE BREAK---\n\n\nFocus\nHealthcare services.\n\n---PAGE BREAK---\n\n"
        );
        assert!(path.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_crawl_respects_page_limit() {
        let pages = HashMap::from([
            ("/", r#"<p>One</p><a href="/two">2</a>"#.to_string()),
            ("/two", r#"<p>Two</p>"#.to_string()),
        ]);
        let base = serve(pages).await;
        let dir = tempfile::tempdir().unwrap();

        let path = crawler(dir.path(), 1).crawl("1", base.as_str()).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert_eq!(text.matches(PAGE_BREAK).count(), 1);
        assert!(!text.contains("Two"));
    }

    #[tokio::test]
    async fn test_crawl_with_no_reachable_page_fails() {
        let base = serve(HashMap::new()).await;
        let dir = tempfile::tempdir().unwrap();

        let err = crawler(dir.path(), 5).crawl("1", base.as_str()).await.unwrap_err();

        assert!(matches!(err, CrawlError::NoPages(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_same_site_crawls_keep_separate_dumps() {
        let pages = HashMap::from([
            ("/", r#"<p>Home page</p>"#.to_string()),
            ("/fund", r#"<p>Fund page</p>"#.to_string()),
        ]);
        let base = serve(pages).await;
        let dir = tempfile::tempdir().unwrap();
        let http = crawler(dir.path(), 1);

        let first = http.crawl("1", base.as_str()).await.unwrap();
        let second = http
            .crawl("2", base.join("fund").unwrap().as_str())
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(std::fs::read_to_string(&first).unwrap().contains("Home page"));
        assert!(std::fs::read_to_string(&second).unwrap().contains("Fund page"));
    }

    #[tokio::test]
    async fn test_crawl_rejects_bad_url() {
        let dir = tempfile::tempdir().unwrap();
        let err = crawler(dir.path(), 5).crawl("1", "not a url").await.unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl { .. }));
    }
}
