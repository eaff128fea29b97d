//! Chart page download and parsing.
//!
//! The page is a list of `li.o-chart-results-list__item` rows; the row's
//! `h3` holds the title and its `span.c-label` the artist. Rows lacking
//! either are layout filler and skipped. Ranks are assigned in page order
//! over the accepted rows only.

use log::{debug, info};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use crate::{
    config::ChartConfig,
    domain::track::{ChartEntry, SongKey},
    sources::{Connector, Fetch, FetchError, client},
};

const ROW_SELECTOR: &str = "li.o-chart-results-list__item";
const TITLE_SELECTOR: &str = "h3";
const ARTIST_SELECTOR: &str = "span.c-label";

pub struct ChartClient {
    client: Client,
}

impl ChartClient {
    pub fn new(config: &ChartConfig, user_agent: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: client::build(user_agent, config.timeout_ms)?,
        })
    }

    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = client::ensure_ok(self.client.get(url).send()?)?;
        Ok(response.text()?)
    }
}

impl Connector for ChartClient {
    type Query = str;
    type Record = Vec<ChartEntry>;

    fn lookup(&self, url: &str) -> Fetch<Vec<ChartEntry>> {
        let result = self.fetch_html(url).and_then(|page| {
            let entries = parse_chart(&page)?;
            if entries.is_empty() {
                Err(FetchError::Empty)
            } else {
                Ok(entries)
            }
        });
        match &result {
            Ok(entries) => info!("parsed {} chart entries from {url}", entries.len()),
            Err(e) => info!("could not read chart page {url}: {e}"),
        }
        result.into()
    }
}

/// Extracts the ranked (title, artist) rows of a chart page
pub fn parse_chart(page: &str) -> Result<Vec<ChartEntry>, FetchError> {
    let document = Html::parse_document(page);
    let row_selector = selector(ROW_SELECTOR)?;
    let title_selector = selector(TITLE_SELECTOR)?;
    let artist_selector = selector(ARTIST_SELECTOR)?;

    let mut entries = Vec::new();
    for row in document.select(&row_selector) {
        let title = row.select(&title_selector).next().map(element_text);
        let artist = row.select(&artist_selector).next().map(element_text);

        match (title, artist) {
            (Some(title), Some(artist)) if !title.is_empty() && !artist.is_empty() => {
                entries.push(ChartEntry {
                    rank: entries.len() as u32 + 1,
                    key: SongKey::new(artist, title),
                });
            }
            _ => debug!("skipping chart row without title or artist"),
        }
    }

    Ok(entries)
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Decode(format!("bad selector {css}: {e}")))
}

/// Text content with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use rouille::Response;

    use super::*;
    use crate::sources::testing::TestServer;

    fn chart_row(title: &str, artist: &str) -> String {
        format!(
            r#"<li class="o-chart-results-list__item // lrv-u-flex-grow-1">
                 <h3 id="title-of-a-story" class="c-title  a-no-trucate">
                   {title}
                 </h3>
                 <span class="c-label  a-no-trucate a-font-primary-s">
                   {artist}
                 </span>
               </li>"#
        )
    }

    #[test]
    fn test_parse_chart_rows() {
        let page = format!(
            r#"<html><body><ul class="o-chart-results-list-row">
                 <li class="o-chart-results-list__item"><span class="c-label">1</span></li>
                 {}
                 <li class="lrv-u-width-100p">ad slot</li>
                 {}
               </ul></body></html>"#,
            chart_row("Last Christmas", "Wham!"),
            chart_row("Rockin&#039; Around The Christmas Tree", "Brenda Lee"),
        );

        let entries = parse_chart(&page).unwrap();

        assert_eq!(
            entries,
            vec![
                ChartEntry {
                    rank: 1,
                    key: SongKey::new("Wham!", "Last Christmas"),
                },
                ChartEntry {
                    rank: 2,
                    key: SongKey::new("Brenda Lee", "Rockin' Around The Christmas Tree"),
                },
            ]
        );
    }

    #[test]
    fn test_parse_chart_without_rows() {
        assert!(
            parse_chart("<html><body>Access denied</body></html>")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_parse_chart_ignores_rows_in_scripts_and_comments() {
        let page = format!(
            r#"<html><head>
                 <script>var tpl = '<li class="o-chart-results-list__item">';</script>
               </head><body>
                 <!-- <li class="o-chart-results-list__item"> -->
                 <ul>{}{}</ul>
               </body></html>"#,
            chart_row("Golden", "HUNTR/X"),
            chart_row("Ordinary", "Alex Warren"),
        );

        let entries = parse_chart(&page).unwrap();

        assert_eq!(
            entries,
            vec![
                ChartEntry {
                    rank: 1,
                    key: SongKey::new("HUNTR/X", "Golden"),
                },
                ChartEntry {
                    rank: 2,
                    key: SongKey::new("Alex Warren", "Ordinary"),
                },
            ]
        );
    }

    #[test]
    fn test_lookup_fetches_and_parses() {
        let server = TestServer::start(|request| match request.url().as_str() {
            "/charts/hot-100" => Response::html(format!(
                "<ul>{}{}</ul>",
                chart_row("Golden", "HUNTR/X"),
                chart_row("Ordinary", "Alex Warren")
            )),
            "/charts/empty" => Response::html("<ul></ul>"),
            _ => Response::empty_404(),
        });
        let client = ChartClient::new(&ChartConfig::default(), "Mozilla/5.0").unwrap();

        let entries = client
            .lookup(&format!("{}/charts/hot-100", server.base_url))
            .found()
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].key, SongKey::new("Alex Warren", "Ordinary"));

        assert_eq!(
            client.lookup(&format!("{}/charts/empty", server.base_url)),
            Fetch::Missing
        );
        assert_eq!(
            client.lookup(&format!("{}/charts/gone", server.base_url)),
            Fetch::Missing
        );
    }
}
