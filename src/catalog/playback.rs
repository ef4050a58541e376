//! Playback resolution
//!
//! Playing a title takes three steps: collect the playback variables
//! (customer, marketplace and a short-lived player token), ask
//! `GetPlaybackResources` for the DASH manifests, and exchange Widevine
//! challenges for licenses. The license endpoint is not a plain Widevine
//! server; challenges must be wrapped by [`CatalogClient::fetch_license`].

use super::catalog_types::{CustomerData, NotifierResources, PlaybackResources, PlayerToken};
use super::client::{Accept, CatalogClient, parse_json};
use super::params::Params;
use super::{CatalogError, describe_api_error};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Device type used for playback resource requests
const PLAYBACK_DEVICE_TYPE_ID: &str = "AOAGZA014O5RE";

/// Upper bound of the random suffix of the player-token callback name
const CALLBACK_SUFFIX_RANGE: u128 = 484;

/// A manifest offered by one CDN
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestInfo {
    /// The CDN serving this manifest, lowercased
    pub cdn: String,
    /// URL of the `.mpd` manifest
    pub url: String,
}

/// Everything needed to play a title
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackInfo {
    /// Where Widevine challenges go, via [`CatalogClient::fetch_license`]
    #[serde(rename = "licenseUrl")]
    pub license_url: String,
    pub manifests: Vec<ManifestInfo>,
}

/// A Widevine license challenge, raw or already base64 encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseChallenge<'a> {
    Bytes(&'a [u8]),
    Base64(&'a str),
}

impl LicenseChallenge<'_> {
    fn to_base64(self) -> String {
        match self {
            LicenseChallenge::Bytes(bytes) => STANDARD.encode(bytes),
            LicenseChallenge::Base64(text) => text.to_string(),
        }
    }
}

/// Resources that can be requested from `GetPlaybackResources`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResourceType {
    Widevine2License,
    PlaybackUrls,
}

impl ResourceType {
    fn as_str(self) -> &'static str {
        match self {
            ResourceType::Widevine2License => "Widevine2License",
            ResourceType::PlaybackUrls => "AudioVideoUrls,SubtitleUrls",
        }
    }
}

/// Per-session values every playback request carries
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlaybackVars {
    customer_id: String,
    device_id: String,
    marketplace_id: String,
    token: String,
}

impl CatalogClient {
    /// Resolves the license URL and DASH/CENC manifests for a movie or episode
    pub fn get_playback_info(&self, title_id: &str) -> Result<PlaybackInfo, CatalogError> {
        info!(title = %title_id, "resolving playback info");
        let vars = self.playback_vars()?;

        let license_url = self.playback_resources_with_query(playback_params(
            &vars,
            title_id,
            ResourceType::Widevine2License,
        ))?;

        let url = self.playback_resources_url();
        let query = playback_params(&vars, title_id, ResourceType::PlaybackUrls).filled(self.device_id());
        let builder = self
            .request(reqwest::Method::POST, &url, Accept::Json)
            .query(&query);
        let body = self.send(builder, &url)?;

        Ok(PlaybackInfo {
            license_url,
            manifests: parse_manifests(parse_json(&body)?)?,
        })
    }

    /// Exchanges a Widevine challenge for a license
    ///
    /// Returns the license as the base64 text the endpoint hands back.
    pub fn fetch_license(
        &self,
        license_url: &str,
        challenge: LicenseChallenge<'_>,
    ) -> Result<String, CatalogError> {
        let challenge = challenge.to_base64();
        let form = [
            ("includeHdcpTestKeyInLicense", "true"),
            ("widevine2Challenge", challenge.as_str()),
        ];

        let builder = self
            .request(reqwest::Method::POST, license_url, Accept::Json)
            .form(&form);
        let body = self.send(builder, license_url)?;

        interpret_license_response(&body)
    }

    /// Fetches customer data and a player token, concurrently
    fn playback_vars(&self) -> Result<PlaybackVars, CatalogError> {
        let callback = format!(
            "onWebToken_{}",
            ulid::Ulid::new().random() % CALLBACK_SUFFIX_RANGE
        );
        let notifier_url = self.notifier_resources_url();
        let notifier_query = Params::new().filled(self.device_id());
        let token_url = self.player_token_url();
        let token_query = Params::new().with("callback", callback.as_str()).into_pairs();

        let (notifier, token) = std::thread::scope(|scope| {
            let notifier = scope.spawn(|| self.get_json(&notifier_url, &notifier_query));
            let token = self.get_text(&token_url, &token_query, Accept::Html);
            let notifier = notifier
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (notifier, token)
        });

        let token = unwrap_player_token(&token?, &callback)?;
        let customer = parse_customer_data(notifier?)?;

        Ok(PlaybackVars {
            customer_id: customer.customer_id.ok_or(CatalogError::NotAuthorized)?,
            device_id: customer
                .device_id
                .unwrap_or_else(|| self.device_id().to_string()),
            marketplace_id: customer.marketplace_id.ok_or(CatalogError::NotAuthorized)?,
            token,
        })
    }

    fn playback_resources_with_query(&self, params: Params) -> Result<String, CatalogError> {
        let base = self.playback_resources_url();
        let query = params.filled(self.device_id());
        Url::parse_with_params(&base, &query)
            .map(String::from)
            .map_err(|e| CatalogError::InvalidUrl {
                url: base,
                reason: e.to_string(),
            })
    }
}

/// Builds the `GetPlaybackResources` parameters for one resource type
fn playback_params(vars: &PlaybackVars, title_id: &str, resource: ResourceType) -> Params {
    let urls = resource != ResourceType::Widevine2License;

    Params::new()
        .with("asin", title_id)
        .with("audioTrackId", "all")
        .with("consumptionType", "Streaming")
        .with("customerID", vars.customer_id.as_str())
        .with("desiredResources", resource.as_str())
        .with_if(urls, "deviceBitrateAdaptationsOverride", "CVBR,CBR")
        .with("deviceDrmOverride", "CENC")
        .with("deviceID", vars.device_id.as_str())
        .with_if(urls, "deviceProtocolOverride", "Http")
        .with("deviceStreamingTechnologyOverride", "DASH")
        .with("deviceTypeID", PLAYBACK_DEVICE_TYPE_ID)
        .with("firmware", "1")
        .with_if(urls, "format", "json")
        .with("gascEnabled", "false")
        .with("languageFeature", "MLFv2")
        .with("marketplaceID", vars.marketplace_id.as_str())
        .with("resourceUsage", "ImmediateConsumption")
        .with_if(urls, "supportedDRMKeyScheme", "DUAL_KEY")
        .with_if(urls, "titleDecorationScheme", "primary-content")
        .with("token", vars.token.as_str())
        .with("version", "1")
        .with("videoMaterialType", "Feature")
        // HD streams are only offered to desktop operating systems
        .with("operatingSystemName", "Mac OS X")
        .with("operatingSystemVersion", "10.14.2")
}

/// Unwraps the token from a `callback({...});` JSONP response
fn unwrap_player_token(raw: &str, callback: &str) -> Result<String, CatalogError> {
    let json = raw
        .trim()
        .strip_prefix(callback)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(';').unwrap_or(rest).strip_suffix(')'))
        .ok_or_else(|| CatalogError::ParseError("unexpected player token response".to_string()))?;

    let token: PlayerToken =
        serde_json::from_str(json).map_err(|e| CatalogError::ParseError(e.to_string()))?;

    match token.token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(CatalogError::NotAuthorized),
    }
}

fn parse_customer_data(notifier: Value) -> Result<CustomerData, CatalogError> {
    let resources: NotifierResources =
        serde_json::from_value(notifier).map_err(|e| CatalogError::ParseError(e.to_string()))?;

    resources
        .resource_data
        .and_then(|data| data.customer_data)
        .ok_or(CatalogError::NotAuthorized)
}

/// Picks the DASH manifests protected with CENC from a playback response
fn parse_manifests(body: Value) -> Result<Vec<ManifestInfo>, CatalogError> {
    if let Some(error) = body.get("error") {
        return Err(CatalogError::ApiError(describe_api_error(error)));
    }
    if let Some(error) = body.pointer("/errorsByResource/AudioVideoUrls") {
        return Err(CatalogError::ApiError(describe_api_error(error)));
    }

    let resources: PlaybackResources =
        serde_json::from_value(body).map_err(|e| CatalogError::ParseError(e.to_string()))?;
    let sets = resources
        .audio_video_urls
        .ok_or_else(|| CatalogError::ParseError("response has no audioVideoUrls".to_string()))?
        .av_cdn_url_sets;

    let manifests = sets
        .into_iter()
        .filter(|set| {
            set.streaming_technology.as_deref() == Some("DASH") && set.drm.as_deref() == Some("CENC")
        })
        .filter_map(|set| {
            let cdn = set.cdn.unwrap_or_default().to_lowercase();
            match set.av_url_info_list.into_iter().next().and_then(|info| info.url) {
                Some(url) => Some(ManifestInfo { cdn, url }),
                None => {
                    warn!(%cdn, "manifest set without a URL, skipping");
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    debug!(count = manifests.len(), "parsed manifests");
    Ok(manifests)
}

/// Extracts the license from a license endpoint response
///
/// The endpoint reports failures in several shapes: a top-level `error`,
/// a per-resource error, or a non-JSON body that may wrap a message.
fn interpret_license_response(body: &str) -> Result<String, CatalogError> {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return Err(CatalogError::ApiError(body.to_string()));
    };

    if let Some(error) = json.get("error") {
        return Err(CatalogError::ApiError(describe_api_error(error)));
    }
    if let Some(error) = json.pointer("/errorsByResource/Widevine2License") {
        return Err(CatalogError::ApiError(describe_api_error(error)));
    }
    if json.pointer("/message/statusCode").and_then(Value::as_str) == Some("ERROR") {
        let message = json
            .pointer("/message/body/message")
            .and_then(Value::as_str)
            .unwrap_or(body);
        return Err(CatalogError::ApiError(message.to_string()));
    }

    json.pointer("/widevine2License/license")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::ApiError(body.to_string()))
}
