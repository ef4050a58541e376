/// Blocking HTTP client for the Amazon Video catalog.
use super::catalog_types::{DetailPageData, VideoConfig};
use super::normalize::{normalize_records, titles_to_episodes};
use super::params::Params;
use super::{CatalogError, CatalogSource, describe_api_error};
use crate::config::Config;
use crate::device::new_device_id;
use crate::model::{Episode, Title};
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, COOKIE, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Accept header sent when a page is scraped rather than queried
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;\
    q=0.9,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3";

const NOTIFIER_RESOURCES_PATH: &str = "/gp/deal/ajax/getNotifierResources.html";
const PLAYER_TOKEN_PATH: &str = "/gp/video/streaming/player-token.json";
const VIDEO_DETAIL_PATH: &str = "/gp/video/detail/";
const PLAYBACK_RESOURCES_PATH: &str = "catalog/GetPlaybackResources";

/// The catalog operation a listing request is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOperation {
    /// Listing by content type, season or search phrase
    Browse,
    /// Details for an explicit list of title ids
    GetAsinDetails,
}

impl CatalogOperation {
    fn as_str(self) -> &'static str {
        match self {
            CatalogOperation::Browse => "Browse",
            CatalogOperation::GetAsinDetails => "GetASINDetails",
        }
    }
}

/// Content types a browse request can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ContentTypeFilter {
    Movie,
    TvEpisode,
    TvSeason,
}

impl ContentTypeFilter {
    fn as_str(self) -> &'static str {
        match self {
            ContentTypeFilter::Movie => "Movie",
            ContentTypeFilter::TvEpisode => "TVEpisode",
            ContentTypeFilter::TvSeason => "TVSeason",
        }
    }
}

/// Parameters of a catalog listing request
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub operation: CatalogOperation,
    pub content_type: Option<ContentTypeFilter>,
    /// Sort order, only sent together with a content type
    pub order_by: String,
    pub results_count: Option<u32>,
    /// Collapse episodes into their seasons
    pub roll_up_to_season: bool,
    pub start_index: u32,
    pub season_ids: Vec<String>,
    pub title_ids: Vec<String>,
    /// Free-text search phrase
    pub search: Option<String>,
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            operation: CatalogOperation::Browse,
            content_type: None,
            order_by: "MostPopular".to_string(),
            results_count: None,
            roll_up_to_season: false,
            start_index: 0,
            season_ids: Vec::new(),
            title_ids: Vec::new(),
            search: None,
        }
    }
}

impl ListRequest {
    /// Episodes of the given seasons
    pub fn episodes(season_ids: &[String]) -> Self {
        Self {
            content_type: Some(ContentTypeFilter::TvEpisode),
            season_ids: season_ids.to_vec(),
            ..Self::default()
        }
    }

    /// Details of the given titles
    pub fn details(title_ids: &[String]) -> Self {
        Self {
            operation: CatalogOperation::GetAsinDetails,
            title_ids: title_ids.to_vec(),
            ..Self::default()
        }
    }

    /// Builds the query parameters, before device defaults are filled in
    pub fn to_params(&self) -> Params {
        Params::new()
            .with_opt(
                "ContentType",
                self.content_type.map(|c| c.as_str().to_string()),
            )
            .with("IncludeAll", "T")
            .with_opt("NumberOfResults", self.results_count.map(|n| n.to_string()))
            .with_opt(
                "OrderBy",
                self.content_type.map(|_| self.order_by.clone()),
            )
            .with_if(self.roll_up_to_season, "RollUpToSeason", "T")
            .with("StartIndex", self.start_index.to_string())
            .with_opt("SeasonASIN", join_ids(&self.season_ids))
            .with_opt("asinList", join_ids(&self.title_ids))
            .with_opt("SearchString", self.search.clone())
            .with("playbackInformationRequired", "true")
            .with("version", "2")
    }
}

fn join_ids(ids: &[String]) -> Option<String> {
    (!ids.is_empty()).then(|| ids.join(","))
}

/// Where to resume watching a title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeInfo {
    /// The title to play; an episode when a series was asked about
    pub id: String,
    #[serde(rename = "startTimeMillis")]
    pub start_time_millis: u64,
}

/// What a request expects back, which decides its Accept header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Accept {
    Json,
    Html,
}

/// Client for the Amazon Video catalog
///
/// All requests carry the account cookies and a desktop browser
/// User-Agent. The client is blocking; it is `Sync`, so independent
/// requests can be issued from scoped threads.
pub struct CatalogClient {
    http: Client,
    cookies: String,
    device_id: String,
    user_agent: String,
    url_root: String,
    atv_root: String,
}

impl CatalogClient {
    /// Creates a client from resolved configuration
    ///
    /// A device id is generated when the configuration doesn't carry one.
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(CatalogError::ClientBuild)?;

        let cookies = config.cookies.clone().unwrap_or_default();
        if cookies.is_empty() {
            warn!("no cookies configured; playback and resume requests will fail");
        }

        let device_id = config
            .device_id
            .clone()
            .unwrap_or_else(|| new_device_id(&config.user_agent));

        Ok(Self {
            http,
            cookies,
            device_id,
            user_agent: config.user_agent.clone(),
            url_root: config.url_root.trim_end_matches('/').to_string(),
            atv_root: format!("{}/", config.atv_root.trim_end_matches('/')),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Lists titles and normalizes them, skipping malformed records
    pub fn browse(&self, request: &ListRequest) -> Result<Vec<Title>, CatalogError> {
        let values = self.list(request)?;
        Ok(normalize_records(&values))
    }

    /// Fetches the episodes of one or more seasons in playback order
    ///
    /// Passing a series id instead of a season id yields an empty list.
    pub fn get_episodes(&self, season_ids: &[String]) -> Result<Vec<Episode>, CatalogError> {
        info!(seasons = ?season_ids, "fetching episodes");
        let values = self.list(&ListRequest::episodes(season_ids))?;
        Ok(titles_to_episodes(&values))
    }

    /// Fetches details for the given titles
    pub fn get_title_info(&self, title_ids: &[String]) -> Result<Vec<Title>, CatalogError> {
        info!(titles = ?title_ids, "fetching title details");
        self.browse(&ListRequest::details(title_ids))
    }

    /// Guesses which title to play, and where, to resume `title_id`
    ///
    /// `title_id` may be a movie, a series or an episode; for a series the
    /// returned id is the episode to continue with. This scrapes the video
    /// detail page, so it is only as reliable as that page's markup.
    pub fn guess_resume_info(&self, title_id: &str) -> Result<ResumeInfo, CatalogError> {
        let url = format!("{}{}{}", self.url_root, VIDEO_DETAIL_PATH, title_id);
        let html = self.get_text(&url, &[], Accept::Html)?;
        parse_resume_info(&html, title_id)
    }

    pub(super) fn notifier_resources_url(&self) -> String {
        format!("{}{}", self.url_root, NOTIFIER_RESOURCES_PATH)
    }

    pub(super) fn player_token_url(&self) -> String {
        format!("{}{}", self.url_root, PLAYER_TOKEN_PATH)
    }

    pub(super) fn playback_resources_url(&self) -> String {
        format!("{}{}", self.atv_root, PLAYBACK_RESOURCES_PATH)
    }

    fn catalog_url(&self, operation: CatalogOperation) -> String {
        format!("{}catalog/{}", self.atv_root, operation.as_str())
    }

    /// Starts a request with the account cookies and browser headers set
    pub(super) fn request(&self, method: reqwest::Method, url: &str, accept: Accept) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(COOKIE, &self.cookies)
            .header(USER_AGENT, &self.user_agent);

        match accept {
            Accept::Json => builder.header(ACCEPT, "application/json"),
            Accept::Html => builder.header(ACCEPT, HTML_ACCEPT),
        }
    }

    /// Sends a request and returns the body of a successful response
    pub(super) fn send(&self, builder: RequestBuilder, url: &str) -> Result<String, CatalogError> {
        debug!(%url, "catalog request");

        let response: Response = builder.send().map_err(|e| CatalogError::RequestFailed {
            url: url.to_string(),
            source: e,
        })?;

        if !response.status().is_success() {
            return Err(CatalogError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response.text().map_err(|e| CatalogError::RequestFailed {
            url: url.to_string(),
            source: e,
        })
    }

    pub(super) fn get_text(
        &self,
        url: &str,
        query: &[(String, String)],
        accept: Accept,
    ) -> Result<String, CatalogError> {
        let builder = self.request(reqwest::Method::GET, url, accept).query(query);
        self.send(builder, url)
    }

    pub(super) fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, CatalogError> {
        let body = self.get_text(url, query, Accept::Json)?;
        parse_json(&body)
    }
}

impl CatalogSource for CatalogClient {
    fn list(&self, request: &ListRequest) -> Result<Vec<Value>, CatalogError> {
        let url = self.catalog_url(request.operation);
        let query = request.to_params().filled(&self.device_id);
        let body = self.get_json(&url, &query)?;
        parse_list_response(body)
    }
}

pub(super) fn parse_json(body: &str) -> Result<Value, CatalogError> {
    serde_json::from_str(body).map_err(|e| CatalogError::ParseError(e.to_string()))
}

/// Extracts the title records from a catalog listing response
pub(super) fn parse_list_response(mut body: Value) -> Result<Vec<Value>, CatalogError> {
    if let Some(error) = body.get("error") {
        return Err(CatalogError::ApiError(describe_api_error(error)));
    }

    match body.pointer_mut("/message/body/titles").map(Value::take) {
        Some(Value::Array(titles)) => Ok(titles),
        _ => Err(CatalogError::ParseError(
            "response has no message.body.titles list".to_string(),
        )),
    }
}

/// Reads the resume target from the JSON embedded in a video detail page
fn parse_resume_info(html: &str, title_id: &str) -> Result<ResumeInfo, CatalogError> {
    let pattern = Regex::new(r#"type="application/json">(.+?)</script"#)
        .map_err(|e| CatalogError::ParseError(e.to_string()))?;

    let not_found = || CatalogError::ResumeInfoNotFound(title_id.to_string());

    let json = pattern
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(not_found)?
        .as_str();

    let data: DetailPageData =
        serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))?;

    match data.video_config {
        Some(VideoConfig {
            asin: Some(id),
            position,
        }) => Ok(ResumeInfo {
            id,
            start_time_millis: position.unwrap_or_default().max(0.0) as u64,
        }),
        _ => Err(not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_episode_request_params() {
        let params = ListRequest::episodes(&["S1".to_string(), "S2".to_string()]).to_params();

        assert_eq!(params.get("ContentType"), Some("TVEpisode"));
        assert_eq!(params.get("OrderBy"), Some("MostPopular"));
        assert_eq!(params.get("SeasonASIN"), Some("S1,S2"));
        assert_eq!(params.get("IncludeAll"), Some("T"));
        assert_eq!(params.get("StartIndex"), Some("0"));
        assert_eq!(params.get("version"), Some("2"));
        assert_eq!(params.get("asinList"), None);
        assert_eq!(params.get("RollUpToSeason"), None);
    }

    #[test]
    fn test_details_request_params() {
        let request = ListRequest::details(&["A".to_string(), "B".to_string()]);
        assert_eq!(request.operation, CatalogOperation::GetAsinDetails);

        let pairs = request.to_params().filled("dev");
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"asinList"));
        assert!(keys.contains(&"deviceID"));
        // OrderBy is only sent alongside a content type
        assert!(!keys.contains(&"OrderBy"));
        assert!(!keys.contains(&"ContentType"));
    }

    #[test]
    fn test_search_request_params() {
        let request = ListRequest {
            content_type: Some(ContentTypeFilter::TvSeason),
            roll_up_to_season: true,
            results_count: Some(50),
            search: Some("planet earth".to_string()),
            ..ListRequest::default()
        };
        let params = request.to_params();

        assert_eq!(params.get("ContentType"), Some("TVSeason"));
        assert_eq!(params.get("RollUpToSeason"), Some("T"));
        assert_eq!(params.get("NumberOfResults"), Some("50"));
        assert_eq!(params.get("SearchString"), Some("planet earth"));
    }

    #[test]
    fn test_parse_list_response() {
        let body = json!({
            "message": { "body": { "titles": [{ "titleId": "A" }, { "titleId": "B" }] } }
        });
        assert_eq!(parse_list_response(body).unwrap().len(), 2);

        let error = json!({ "error": { "errorCode": "Throttled", "message": "Slow down" } });
        assert!(matches!(
            parse_list_response(error),
            Err(CatalogError::ApiError(msg)) if msg == "Throttled: Slow down"
        ));

        assert!(matches!(
            parse_list_response(json!({ "message": {} })),
            Err(CatalogError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_resume_info() {
        let html = r#"<html><script type="application/json">{"videoConfig":{"asin":"EP5","position":61000}}</script></html>"#;

        let info = parse_resume_info(html, "SERIES").unwrap();
        assert_eq!(
            info,
            ResumeInfo {
                id: "EP5".to_string(),
                start_time_millis: 61000,
            }
        );
    }

    #[test]
    fn test_parse_resume_info_missing() {
        assert!(matches!(
            parse_resume_info("<html></html>", "X"),
            Err(CatalogError::ResumeInfoNotFound(id)) if id == "X"
        ));

        let html = r#"<script type="application/json">{"other":true}</script>"#;
        assert!(matches!(
            parse_resume_info(html, "X"),
            Err(CatalogError::ResumeInfoNotFound(_))
        ));
    }
}
