/// Catalog API response types for deserialization.
///
/// The catalog is loose about which fields are present, so nearly every
/// field is optional here. Turning these into strict entities is the job
/// of the record normalizer.
use serde::Deserialize;

/// A single title record as returned by the catalog listing endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawTitle {
    pub title_id: Option<String>,
    pub title: Option<String>,
    /// Season or episode ordinal
    pub number: Option<u32>,
    /// MOVIE, EPISODE, SEASON or SERIES
    pub content_type: Option<String>,
    /// Parent season and series records
    pub ancestor_titles: Option<Vec<RawAncestor>>,
    pub formats: Option<Vec<RawFormat>>,
}

/// A parent record embedded in a title.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawAncestor {
    pub title_id: Option<String>,
    pub title: Option<String>,
    pub number: Option<u32>,
    pub content_type: Option<String>,
}

/// One of the video formats a title is available in.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawFormat {
    /// SD, HD or UHD
    pub video_format_type: Option<String>,
    pub images: Option<Vec<RawImage>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawImage {
    #[serde(rename = "type")]
    pub image_type: Option<String>,
    pub uri: Option<String>,
}

/// Response of `getNotifierResources.html`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct NotifierResources {
    pub resource_data: Option<ResourceData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ResourceData {
    #[serde(rename = "GBCustomerData")]
    pub customer_data: Option<CustomerData>,
}

/// The logged-in customer, as far as playback requests care.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct CustomerData {
    pub customer_id: Option<String>,
    pub marketplace_id: Option<String>,
    #[serde(rename = "deviceID")]
    pub device_id: Option<String>,
}

/// The JSON wrapped inside the player-token JSONP callback.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PlayerToken {
    pub token: Option<String>,
}

/// Response of `GetPlaybackResources` when asking for playback URLs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct PlaybackResources {
    pub audio_video_urls: Option<AudioVideoUrls>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct AudioVideoUrls {
    pub av_cdn_url_sets: Vec<AvCdnUrlSet>,
}

/// All manifests one CDN offers for a title.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct AvCdnUrlSet {
    pub cdn: Option<String>,
    /// DASH, SmoothStreaming, ...
    pub streaming_technology: Option<String>,
    /// CENC, PlayReady, ...
    pub drm: Option<String>,
    pub av_url_info_list: Vec<AvUrlInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AvUrlInfo {
    pub url: Option<String>,
}

/// The JSON blob embedded in a video detail page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct DetailPageData {
    pub video_config: Option<VideoConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct VideoConfig {
    /// The title to actually play; an episode when a series was requested
    pub asin: Option<String>,
    /// Resume position in milliseconds
    pub position: Option<f64>,
}
