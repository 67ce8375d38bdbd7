//! Raw record fetching from the Genius lyrics provider.
//!
//! The API only lists songs; lyrics are scraped from each song's web page.
//! Scraped text is shaped like the provider's legacy text export
//! ("<Title> Lyrics" header, trailing "Embed") so the cleaning rules apply
//! unchanged. HTTP goes through `GeniusTransport` so the client can be
//! exercised without a network.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Deserialize;
use serde_json::Value;

use crate::dataset::read_raw_records;
use crate::error::{CanonResult, FetchError};
use crate::models::RawRecord;
use crate::normalize::INSTRUMENTAL_MARKER;
use crate::progress::{finish_phase, log_progress, phase_bar, Phase};

// ============================================================================
// Constants
// ============================================================================

pub const API_BASE: &str = "https://api.genius.com";

/// Largest page size the artist songs endpoint accepts.
pub const SONGS_PER_PAGE: usize = 50;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const USER_AGENT: &str = concat!("lyrics-canon/", env!("CARGO_PKG_VERSION"));

static LYRICS_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[data-lyrics-container="true"]"#).unwrap());

static LYRICS_PLACEHOLDER: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[class*="LyricsPlaceholder"]"#).unwrap());

// ============================================================================
// Source Trait
// ============================================================================

/// Anything that can produce the raw records for one artist.
pub trait SongSource {
    fn fetch_artist_songs(&self, artist: &str, max_songs: Option<usize>) -> CanonResult<Vec<RawRecord>>;
}

/// A previously saved raw dataset. The artist argument is ignored.
pub struct JsonFileSource {
    pub path: PathBuf,
}

impl SongSource for JsonFileSource {
    fn fetch_artist_songs(&self, _artist: &str, max_songs: Option<usize>) -> CanonResult<Vec<RawRecord>> {
        let mut records = read_raw_records(&self.path)?;
        if let Some(max) = max_songs {
            records.truncate(max);
        }
        Ok(records)
    }
}

// ============================================================================
// Transport
// ============================================================================

/// HTTP seam for the Genius client.
pub trait GeniusTransport {
    /// GET an authenticated API path (e.g. "/search") and return the JSON body.
    fn get_api(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError>;

    /// GET a public song page and return its HTML.
    fn get_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Map a non-success HTTP status to its fetch error.
pub fn check_status(status: u16, url: &str) -> Result<(), FetchError> {
    match status {
        200..=299 => Ok(()),
        401 | 403 => Err(FetchError::Unauthorized(status)),
        429 => Err(FetchError::RateLimited),
        _ => Err(FetchError::Status {
            status,
            url: url.to_string(),
        }),
    }
}

/// Blocking reqwest transport with bearer-token auth.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    token: String,
}

impl HttpTransport {
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }
}

impl GeniusTransport for HttpTransport {
    fn get_api(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = format!("{}{}", API_BASE, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        check_status(response.status().as_u16(), &url)?;
        response
            .json::<Value>()
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn get_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        check_status(response.status().as_u16(), url)?;
        response.text().map_err(|e| FetchError::Network(e.to_string()))
    }
}

// ============================================================================
// API Payloads
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default, rename = "type")]
    hit_type: String,
    result: SongInfo,
}

#[derive(Debug, Deserialize)]
struct ArtistSongsPayload {
    #[serde(default)]
    songs: Vec<SongInfo>,
    next_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct SongInfo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    lyrics_state: Option<String>,
    primary_artist: ArtistInfo,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtistInfo {
    id: u64,
    name: String,
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, FetchError> {
    serde_json::from_value::<ApiEnvelope<T>>(value)
        .map(|envelope| envelope.response)
        .map_err(|e| FetchError::Decode(e.to_string()))
}

// ============================================================================
// HTML Extraction
// ============================================================================

fn push_element_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            // Container headers ("12 Contributors", "Translations") are marked this way
            Node::Element(el) if el.attr("data-exclude-from-selection").is_some() => {}
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    push_element_text(child_ref, out);
                }
            }
            _ => {}
        }
    }
}

/// Extract lyric text from a song page.
/// Returns None when the page has no lyrics containers.
pub fn extract_lyrics_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let parts: Vec<String> = document
        .select(&LYRICS_CONTAINER)
        .map(|container| {
            let mut text = String::new();
            push_element_text(container, &mut text);
            text.trim().to_string()
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// True when the page shows the provider's "instrumental" placeholder.
pub fn is_instrumental_page(html: &str) -> bool {
    let document = Html::parse_document(html);
    for placeholder in document.select(&LYRICS_PLACEHOLDER) {
        if placeholder.text().any(|t| t.contains("This song is an instrumental")) {
            return true;
        }
    }
    false
}

/// Build the lyrics field for a song page in export form.
pub fn page_to_lyrics(title: &str, html: &str) -> String {
    if is_instrumental_page(html) {
        return INSTRUMENTAL_MARKER.to_string();
    }
    match extract_lyrics_text(html) {
        Some(body) => format!("{} Lyrics{}\nEmbed", title, body),
        None => String::new(),
    }
}

// ============================================================================
// Genius Client
// ============================================================================

pub struct GeniusClient<T: GeniusTransport> {
    transport: T,
    /// Pause between song page requests.
    delay: Duration,
}

impl GeniusClient<HttpTransport> {
    pub fn with_token(token: &str, timeout: Duration, delay: Duration) -> Result<Self, FetchError> {
        Ok(Self::new(HttpTransport::new(token, timeout)?, delay))
    }
}

impl<T: GeniusTransport> GeniusClient<T> {
    pub fn new(transport: T, delay: Duration) -> Self {
        Self { transport, delay }
    }

    /// Resolve an artist name to (id, provider name) via song search.
    /// Prefers a hit whose primary artist matches the name case-insensitively.
    fn resolve_artist(&self, artist: &str) -> Result<ArtistInfo, FetchError> {
        let value = self.transport.get_api("/search", &[("q", artist.to_string())])?;
        let payload: SearchPayload = decode(value)?;

        let wanted = artist.trim().to_lowercase();
        let songs: Vec<&SongInfo> = payload
            .hits
            .iter()
            .filter(|hit| hit.hit_type.is_empty() || hit.hit_type == "song")
            .map(|hit| &hit.result)
            .collect();

        songs
            .iter()
            .find(|song| song.primary_artist.name.to_lowercase() == wanted)
            .or_else(|| songs.first())
            .map(|song| song.primary_artist.clone())
            .ok_or_else(|| FetchError::ArtistNotFound(artist.to_string()))
    }

    /// Page through the artist's songs, keeping only ones they are the primary artist on.
    fn list_songs(&self, artist: &ArtistInfo, max_songs: Option<usize>) -> Result<Vec<SongInfo>, FetchError> {
        let path = format!("/artists/{}/songs", artist.id);
        let mut songs: Vec<SongInfo> = Vec::new();
        let mut page = Some(1u32);

        while let Some(current) = page {
            if max_songs.is_some_and(|max| songs.len() >= max) {
                break;
            }
            let value = self.transport.get_api(
                &path,
                &[
                    ("per_page", SONGS_PER_PAGE.to_string()),
                    ("page", current.to_string()),
                    ("sort", "popularity".to_string()),
                ],
            )?;
            let payload: ArtistSongsPayload = decode(value)?;

            songs.extend(
                payload
                    .songs
                    .into_iter()
                    .filter(|song| song.primary_artist.id == artist.id),
            );
            page = payload.next_page;
        }

        if let Some(max) = max_songs {
            songs.truncate(max);
        }
        Ok(songs)
    }

    fn fetch_lyrics(&self, song: &SongInfo) -> Result<String, FetchError> {
        // Unreleased or untranscribed songs have no lyrics to scrape
        if song.url.is_empty() || song.lyrics_state.as_deref().is_some_and(|s| s != "complete") {
            return Ok(String::new());
        }
        let html = self.transport.get_page(&song.url)?;
        Ok(page_to_lyrics(&song.title, &html))
    }
}

impl<T: GeniusTransport> SongSource for GeniusClient<T> {
    fn fetch_artist_songs(&self, artist: &str, max_songs: Option<usize>) -> CanonResult<Vec<RawRecord>> {
        let resolved = self.resolve_artist(artist)?;
        println!("Resolved artist '{}' to '{}' (id {})", artist, resolved.name, resolved.id);

        let songs = self.list_songs(&resolved, max_songs)?;
        let total = songs.len() as u64;
        let pb = phase_bar(Phase::Fetch, total);

        let mut records = Vec::with_capacity(songs.len());
        for (i, song) in songs.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            let lyrics = self.fetch_lyrics(song)?;
            records.push(RawRecord::new(song.title.clone(), lyrics));

            pb.inc(1);
            log_progress(Phase::Fetch, i as u64 + 1, total);
        }

        finish_phase(&pb, Phase::Fetch, &format!("{} songs", records.len()));
        Ok(records)
    }
}

// ============================================================================
// TESTS
// ============================================================================
