//! Integration tests for the crawler
//!
//! These tests use wiremock to serve synthetic search and listing pages
//! and run the full pipeline end-to-end against them.

use property_trawler::config::{Config, CrawlerConfig, OutputConfig, SearchConfig, UserAgentConfig};
use property_trawler::crawler::{collect_listings, run_crawl};
use property_trawler::PropertyRecord;
use std::collections::BTreeMap;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/browse/search";

/// Creates a test configuration crawling from the given seeds
fn create_test_config(seeds: Vec<String>, json_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: 3,
            max_concurrent_search_pages: 2,
            channel_capacity: 4,
            request_timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            json_path: json_path.to_string(),
        },
        search: SearchConfig { seeds },
    }
}

fn listing_path(id: u32) -> String {
    format!("/property/residential-property-for-sale/auction-{}.htm", id)
}

fn search_url(server: &MockServer, page: u32) -> String {
    format!("{}{}?page={}", server.uri(), SEARCH_PATH, page)
}

/// A search page linking to the given listings and next pages
fn search_page(listings: &[String], next_pages: &[u32]) -> String {
    let mut body = String::from("<html><head><title>Results</title></head><body><ul>");
    for href in listings {
        body.push_str(&format!(r#"<li><a href="{}">Listing</a></li>"#, href));
    }
    body.push_str("</ul>");
    for page in next_pages {
        body.push_str(&format!(
            r#"<a rel="next" href="{}?page={}">Next</a>"#,
            SEARCH_PATH, page
        ));
    }
    body.push_str(r#"<a href="/about">About us</a></body></html>"#);
    body
}

/// A listing page; `with_attributes` controls the attributes table
fn listing_page(id: &str, title: &str, price: &str, with_attributes: bool) -> String {
    let attributes = if with_attributes {
        r#"<table id="ListingAttributes"><tr><th>Bedrooms:</th><td>3</td></tr></table>"#
    } else {
        ""
    };
    format!(
        r#"<html><body><div id="mainContent">
        <h1 id="ListingTitle_title">{title}</h1>
        <ul><li id="ListingTitle_classifiedTitlePrice">{price}</li></ul>
        <img src="/photoserver/thumb/{id}.jpg">
        {attributes}
        <div id="ListingDescription_ListingDescription">A home.</div>
        <script type="text/template"><p>map</p></script>
        <script type="text/javascript">
            var listing = {{ listingId: {id}, lat: -41.123, lng: 174.456,
                userEnteredLocation: "12 Main St", structuredLocation: "Suburbia" }};
        </script>
        </div></body></html>"#
    )
}

async fn mount_search_page(server: &MockServer, page: u32, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, id: u32, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(listing_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_writes_json() {
    let server = MockServer::start().await;

    mount_search_page(
        &server,
        1,
        search_page(&[listing_path(101), listing_path(102)], &[2]),
        1,
    )
    .await;
    mount_search_page(&server, 2, search_page(&[listing_path(103)], &[]), 1).await;

    mount_listing(
        &server,
        101,
        listing_page("101", "Lovely Home", "$425,000.00", true),
        1,
    )
    .await;
    mount_listing(
        &server,
        102,
        listing_page("102", "Tidy Unit", "Asking $310,000", true),
        1,
    )
    .await;
    // No attributes table: fetched, but yields no record
    mount_listing(
        &server,
        103,
        listing_page("103", "Fixer Upper", "$99,000", false),
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("out/listings.json");
    let config = create_test_config(
        vec![search_url(&server, 1)],
        json_path.to_str().unwrap(),
    );

    let report = run_crawl(config).await.expect("crawl should succeed");

    assert_eq!(report.search_pages_visited, 2);
    assert_eq!(report.listing_urls_discovered, 3);
    assert_eq!(report.unique_listings, 3);
    assert_eq!(report.records_extracted, 2);
    assert_eq!(report.listing_failures, 1);
    assert_eq!(report.listings_written, 2);

    let written: BTreeMap<String, PropertyRecord> =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(written.len(), 2);

    let home = &written["101"];
    assert_eq!(home.title, "Lovely Home");
    assert_eq!(home.price, 425000.0);
    assert_eq!(home.location.latitude, -41.123);
    assert_eq!(home.location.suburb, "Suburbia");
    assert_eq!(home.attributes["Bedrooms"], "3");
    assert_eq!(home.source_url, format!("{}{}", server.uri(), listing_path(101)));
    assert!(home
        .images
        .contains(&format!("{}/photoserver/full/101.jpg", server.uri())));

    assert_eq!(written["102"].price, 310000.0);
    assert!(!written.contains_key("103"));
}

#[tokio::test]
async fn test_pagination_cycle_visits_each_page_once() {
    let server = MockServer::start().await;

    // 1 -> 2 -> 3 -> {1, 4} -> 5
    mount_search_page(&server, 1, search_page(&[listing_path(1)], &[2]), 1).await;
    mount_search_page(&server, 2, search_page(&[listing_path(2)], &[3]), 1).await;
    mount_search_page(&server, 3, search_page(&[listing_path(3)], &[1, 4]), 1).await;
    mount_search_page(&server, 4, search_page(&[listing_path(4)], &[5]), 1).await;
    mount_search_page(&server, 5, search_page(&[listing_path(5)], &[]), 1).await;

    for id in 1..=5 {
        mount_listing(
            &server,
            id,
            listing_page(&id.to_string(), "Home", "$500,000", true),
            1,
        )
        .await;
    }

    let config = create_test_config(vec![search_url(&server, 1)], "unused.json");
    let outcome = collect_listings(&config).await.unwrap();

    assert_eq!(outcome.report.search_pages_visited, 5);
    assert_eq!(outcome.listings.len(), 5);
    assert!(outcome.listings.contains_key("5"));
}

#[tokio::test]
async fn test_duplicate_listing_urls_extracted_once() {
    let server = MockServer::start().await;

    let plain = listing_path(7);
    let decorated = format!("{}?rsqid=abc", plain);
    let absolute = format!("{}{}#photos", server.uri(), plain);

    mount_search_page(
        &server,
        1,
        search_page(&[plain.clone(), decorated.clone()], &[2]),
        1,
    )
    .await;
    mount_search_page(&server, 2, search_page(&[absolute, decorated], &[]), 1).await;
    mount_listing(&server, 7, listing_page("7", "Home", "$1,000,000", true), 1).await;

    // The same seed twice is only walked once
    let config = create_test_config(
        vec![search_url(&server, 1), search_url(&server, 1)],
        "unused.json",
    );
    let outcome = collect_listings(&config).await.unwrap();

    assert_eq!(outcome.report.listing_urls_discovered, 4);
    assert_eq!(outcome.report.unique_listings, 1);
    assert_eq!(outcome.listings.len(), 1);
    assert_eq!(
        outcome.listings["7"].source_url,
        format!("{}{}", server.uri(), plain)
    );
}

#[tokio::test]
async fn test_error_page_stops_only_its_branch() {
    let server = MockServer::start().await;

    let error_page = format!(
        r#"<html><body>
            <a href="{}">Listing</a>
            <div id="ErrorOops">Sorry, something went wrong</div>
            <a rel="next" href="{}?page=3">Next</a>
        </body></html>"#,
        listing_path(11),
        SEARCH_PATH
    );
    mount_search_page(&server, 1, error_page, 1).await;
    mount_search_page(&server, 2, search_page(&[listing_path(12)], &[]), 1).await;
    mount_search_page(&server, 3, search_page(&[], &[]), 0).await;

    mount_listing(&server, 11, listing_page("11", "Home", "$1", true), 0).await;
    mount_listing(&server, 12, listing_page("12", "Home", "$2", true), 1).await;

    let config = create_test_config(
        vec![search_url(&server, 1), search_url(&server, 2)],
        "unused.json",
    );
    let outcome = collect_listings(&config).await.unwrap();

    assert_eq!(outcome.report.bad_search_pages, 1);
    assert_eq!(outcome.report.search_pages_visited, 1);
    assert_eq!(outcome.listings.keys().collect::<Vec<_>>(), vec!["12"]);
}

#[tokio::test]
async fn test_fetch_failures_do_not_stop_the_crawl() {
    let server = MockServer::start().await;

    mount_search_page(
        &server,
        1,
        search_page(&[listing_path(21), listing_path(22), listing_path(23)], &[9]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "9"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(listing_path(21)))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(listing_path(22)))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&server)
        .await;
    mount_listing(&server, 23, listing_page("23", "Home", "$750,000", true), 1).await;

    let config = create_test_config(vec![search_url(&server, 1)], "unused.json");
    let outcome = collect_listings(&config).await.unwrap();

    assert_eq!(outcome.report.search_fetch_failures, 1);
    assert_eq!(outcome.report.listing_failures, 2);
    assert_eq!(outcome.listings.len(), 1);
    assert_eq!(outcome.listings["23"].price, 750000.0);
}

#[tokio::test]
async fn test_duplicate_listing_ids_last_write_wins() {
    let server = MockServer::start().await;

    mount_search_page(
        &server,
        1,
        search_page(&[listing_path(31), listing_path(32)], &[]),
        1,
    )
    .await;
    // Two distinct pages describing the same listing id
    mount_listing(&server, 31, listing_page("30", "Home", "$100", true), 1).await;
    mount_listing(&server, 32, listing_page("30", "Home", "$200", true), 1).await;

    let config = create_test_config(vec![search_url(&server, 1)], "unused.json");
    let outcome = collect_listings(&config).await.unwrap();

    assert_eq!(outcome.report.records_extracted, 2);
    assert_eq!(outcome.report.duplicate_ids_overwritten, 1);
    assert_eq!(outcome.listings.len(), 1);
    assert!(outcome.listings.contains_key("30"));
}
