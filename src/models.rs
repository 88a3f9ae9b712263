use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    comment_reactions, comments, playlist_videos, playlists, subscriptions, users,
    video_reactions, video_views, videos,
};

/// Primary keys are generated app-side, not by the database.
pub fn new_id() -> String {
    Uuid::new_v4().to_simple().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    #[serde(rename = "PUBLIC")]
    Public,
    #[serde(rename = "PRIVATE")]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Private => "PRIVATE",
        }
    }
}

#[derive(Queryable, Serialize)]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub image_url: String,
    pub banner_url: Option<String>,
    pub banner_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "users"]
pub struct NewUser<'a> {
    pub id: &'a str,
    pub external_id: &'a str,
    pub name: &'a str,
    pub image_url: &'a str,
}

#[derive(Queryable, Serialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Queryable, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub asset_status: String,
    pub asset_id: Option<String>,
    pub upload_id: String,
    pub playback_id: Option<String>,
    pub track_id: Option<String>,
    pub track_status: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_key: Option<String>,
    pub preview_url: Option<String>,
    pub preview_key: Option<String>,
    pub duration: i32,
    pub visibility: String,
    pub user_id: String,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "videos"]
pub struct NewVideo<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub asset_status: &'a str,
    pub upload_id: &'a str,
    pub user_id: &'a str,
}

#[derive(Queryable, Serialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub video_id: String,
    pub parent_id: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "comments"]
pub struct NewComment<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub video_id: &'a str,
    pub parent_id: Option<&'a str>,
    pub body: &'a str,
}

#[derive(Queryable, Serialize)]
pub struct VideoReaction {
    pub user_id: String,
    pub video_id: String,
    pub reaction_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "video_reactions"]
pub struct NewVideoReaction<'a> {
    pub user_id: &'a str,
    pub video_id: &'a str,
    pub reaction_type: &'a str,
}

#[derive(Queryable, Serialize)]
pub struct CommentReaction {
    pub user_id: String,
    pub comment_id: String,
    pub reaction_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "comment_reactions"]
pub struct NewCommentReaction<'a> {
    pub user_id: &'a str,
    pub comment_id: &'a str,
    pub reaction_type: &'a str,
}

#[derive(Queryable, Serialize)]
pub struct Subscription {
    pub viewer_id: String,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "subscriptions"]
pub struct NewSubscription<'a> {
    pub viewer_id: &'a str,
    pub creator_id: &'a str,
}

#[derive(Insertable)]
#[table_name = "video_views"]
pub struct NewVideoView<'a> {
    pub user_id: &'a str,
    pub video_id: &'a str,
}

#[derive(Queryable, Serialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "playlists"]
pub struct NewPlaylist<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub user_id: &'a str,
}

#[derive(Insertable)]
#[table_name = "playlist_videos"]
pub struct NewPlaylistVideo<'a> {
    pub playlist_id: &'a str,
    pub video_id: &'a str,
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

// Listing queries join users and fold in aggregate counts, which diesel's
// typed DSL does not express well; they run through sql_query instead and
// land on the row structs below.

use diesel::sql_types::{BigInt, Bool, Integer, Nullable, Text, Timestamptz, Varchar};

/// Select list shared by every video listing query.
pub const VIDEO_LIST_COLUMNS: &str = "\
    v.id, v.title, v.description, v.asset_status, v.playback_id, \
    v.thumbnail_url, v.preview_url, v.duration, v.visibility, v.category_id, \
    v.created_at, v.updated_at, \
    u.id AS user_id, u.name AS user_name, u.image_url AS user_image_url, \
    (SELECT count(*) FROM video_views vv WHERE vv.video_id = v.id) AS view_count, \
    (SELECT count(*) FROM video_reactions vr WHERE vr.video_id = v.id AND vr.reaction_type = 'like') AS like_count, \
    (SELECT count(*) FROM video_reactions vr WHERE vr.video_id = v.id AND vr.reaction_type = 'dislike') AS dislike_count";

pub const VIDEO_LIST_FROM: &str = "FROM videos v INNER JOIN users u ON u.id = v.user_id";

pub fn video_list_select() -> String {
    format!("SELECT {} {}", VIDEO_LIST_COLUMNS, VIDEO_LIST_FROM)
}

#[derive(QueryableByName)]
pub struct VideoListRow {
    #[sql_type = "Text"]
    pub id: String,
    #[sql_type = "Text"]
    pub title: String,
    #[sql_type = "Nullable<Text>"]
    pub description: Option<String>,
    #[sql_type = "Text"]
    pub asset_status: String,
    #[sql_type = "Nullable<Text>"]
    pub playback_id: Option<String>,
    #[sql_type = "Nullable<Text>"]
    pub thumbnail_url: Option<String>,
    #[sql_type = "Nullable<Text>"]
    pub preview_url: Option<String>,
    #[sql_type = "Integer"]
    pub duration: i32,
    #[sql_type = "Varchar"]
    pub visibility: String,
    #[sql_type = "Nullable<Text>"]
    pub category_id: Option<String>,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Timestamptz"]
    pub updated_at: DateTime<Utc>,
    #[sql_type = "Text"]
    pub user_id: String,
    #[sql_type = "Text"]
    pub user_name: String,
    #[sql_type = "Text"]
    pub user_image_url: String,
    #[sql_type = "BigInt"]
    pub view_count: i64,
    #[sql_type = "BigInt"]
    pub like_count: i64,
    #[sql_type = "BigInt"]
    pub dislike_count: i64,
}

/// A video list row with the timestamp of the viewer's own interaction
/// (watch history, liked videos).
#[derive(QueryableByName)]
pub struct TimedVideoListRow {
    #[sql_type = "Text"]
    pub id: String,
    #[sql_type = "Text"]
    pub title: String,
    #[sql_type = "Nullable<Text>"]
    pub description: Option<String>,
    #[sql_type = "Text"]
    pub asset_status: String,
    #[sql_type = "Nullable<Text>"]
    pub playback_id: Option<String>,
    #[sql_type = "Nullable<Text>"]
    pub thumbnail_url: Option<String>,
    #[sql_type = "Nullable<Text>"]
    pub preview_url: Option<String>,
    #[sql_type = "Integer"]
    pub duration: i32,
    #[sql_type = "Varchar"]
    pub visibility: String,
    #[sql_type = "Nullable<Text>"]
    pub category_id: Option<String>,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Timestamptz"]
    pub updated_at: DateTime<Utc>,
    #[sql_type = "Text"]
    pub user_id: String,
    #[sql_type = "Text"]
    pub user_name: String,
    #[sql_type = "Text"]
    pub user_image_url: String,
    #[sql_type = "BigInt"]
    pub view_count: i64,
    #[sql_type = "BigInt"]
    pub like_count: i64,
    #[sql_type = "BigInt"]
    pub dislike_count: i64,
    #[sql_type = "Timestamptz"]
    pub occurred_at: DateTime<Utc>,
}

#[derive(QueryableByName)]
pub struct VideoDetailRow {
    #[sql_type = "Text"]
    pub id: String,
    #[sql_type = "Text"]
    pub title: String,
    #[sql_type = "Nullable<Text>"]
    pub description: Option<String>,
    #[sql_type = "Text"]
    pub asset_status: String,
    #[sql_type = "Nullable<Text>"]
    pub playback_id: Option<String>,
    #[sql_type = "Nullable<Text>"]
    pub thumbnail_url: Option<String>,
    #[sql_type = "Nullable<Text>"]
    pub preview_url: Option<String>,
    #[sql_type = "Integer"]
    pub duration: i32,
    #[sql_type = "Varchar"]
    pub visibility: String,
    #[sql_type = "Nullable<Text>"]
    pub category_id: Option<String>,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Timestamptz"]
    pub updated_at: DateTime<Utc>,
    #[sql_type = "Text"]
    pub user_id: String,
    #[sql_type = "Text"]
    pub user_name: String,
    #[sql_type = "Text"]
    pub user_image_url: String,
    #[sql_type = "BigInt"]
    pub subscriber_count: i64,
    #[sql_type = "Bool"]
    pub is_subscribed: bool,
    #[sql_type = "BigInt"]
    pub view_count: i64,
    #[sql_type = "BigInt"]
    pub like_count: i64,
    #[sql_type = "BigInt"]
    pub dislike_count: i64,
    #[sql_type = "Nullable<Text>"]
    pub viewer_reaction: Option<String>,
}

#[derive(QueryableByName)]
pub struct CommentListRow {
    #[sql_type = "Text"]
    pub id: String,
    #[sql_type = "Text"]
    pub video_id: String,
    #[sql_type = "Nullable<Text>"]
    pub parent_id: Option<String>,
    #[sql_type = "Varchar"]
    pub body: String,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Timestamptz"]
    pub updated_at: DateTime<Utc>,
    #[sql_type = "Text"]
    pub user_id: String,
    #[sql_type = "Text"]
    pub user_name: String,
    #[sql_type = "Text"]
    pub user_image_url: String,
    #[sql_type = "BigInt"]
    pub like_count: i64,
    #[sql_type = "BigInt"]
    pub dislike_count: i64,
    #[sql_type = "BigInt"]
    pub reply_count: i64,
    #[sql_type = "Nullable<Text>"]
    pub viewer_reaction: Option<String>,
}

#[derive(QueryableByName)]
pub struct PlaylistListRow {
    #[sql_type = "Text"]
    pub id: String,
    #[sql_type = "Text"]
    pub name: String,
    #[sql_type = "Nullable<Varchar>"]
    pub description: Option<String>,
    #[sql_type = "Text"]
    pub user_id: String,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Timestamptz"]
    pub updated_at: DateTime<Utc>,
    #[sql_type = "BigInt"]
    pub video_count: i64,
    #[sql_type = "Nullable<Text>"]
    pub latest_video_thumbnail: Option<String>,
}

#[derive(QueryableByName)]
pub struct PlaylistForVideoRow {
    #[sql_type = "Text"]
    pub id: String,
    #[sql_type = "Text"]
    pub name: String,
    #[sql_type = "Nullable<Varchar>"]
    pub description: Option<String>,
    #[sql_type = "Text"]
    pub user_id: String,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Timestamptz"]
    pub updated_at: DateTime<Utc>,
    #[sql_type = "BigInt"]
    pub video_count: i64,
    #[sql_type = "Nullable<Text>"]
    pub latest_video_thumbnail: Option<String>,
    #[sql_type = "Bool"]
    pub contains_video: bool,
}

#[derive(QueryableByName)]
pub struct SubscriptionListRow {
    #[sql_type = "Text"]
    pub creator_id: String,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "Text"]
    pub user_name: String,
    #[sql_type = "Text"]
    pub user_image_url: String,
    #[sql_type = "BigInt"]
    pub subscriber_count: i64,
}

#[derive(QueryableByName)]
pub struct UserProfileRow {
    #[sql_type = "Text"]
    pub id: String,
    #[sql_type = "Text"]
    pub name: String,
    #[sql_type = "Text"]
    pub image_url: String,
    #[sql_type = "Nullable<Text>"]
    pub banner_url: Option<String>,
    #[sql_type = "Timestamptz"]
    pub created_at: DateTime<Utc>,
    #[sql_type = "BigInt"]
    pub video_count: i64,
    #[sql_type = "BigInt"]
    pub subscriber_count: i64,
    #[sql_type = "Bool"]
    pub is_subscribed: bool,
}

#[derive(Serialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub asset_status: String,
    pub playback_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration: i32,
    pub visibility: String,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
    pub view_count: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked_at: Option<DateTime<Utc>>,
}

impl From<VideoListRow> for VideoSummary {
    fn from(row: VideoListRow) -> Self {
        VideoSummary {
            id: row.id,
            title: row.title,
            description: row.description,
            asset_status: row.asset_status,
            playback_id: row.playback_id,
            thumbnail_url: row.thumbnail_url,
            preview_url: row.preview_url,
            duration: row.duration,
            visibility: row.visibility,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                image_url: row.user_image_url,
            },
            view_count: row.view_count,
            like_count: row.like_count,
            dislike_count: row.dislike_count,
            viewed_at: None,
            liked_at: None,
        }
    }
}

impl TimedVideoListRow {
    pub fn split(self) -> (VideoSummary, DateTime<Utc>) {
        let occurred_at = self.occurred_at;
        let summary = VideoSummary {
            id: self.id,
            title: self.title,
            description: self.description,
            asset_status: self.asset_status,
            playback_id: self.playback_id,
            thumbnail_url: self.thumbnail_url,
            preview_url: self.preview_url,
            duration: self.duration,
            visibility: self.visibility,
            category_id: self.category_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user: UserSummary {
                id: self.user_id,
                name: self.user_name,
                image_url: self.user_image_url,
            },
            view_count: self.view_count,
            like_count: self.like_count,
            dislike_count: self.dislike_count,
            viewed_at: None,
            liked_at: None,
        };
        (summary, occurred_at)
    }
}

#[derive(Serialize)]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub subscriber_count: i64,
    pub is_subscribed: bool,
}

#[derive(Serialize)]
pub struct VideoDetail {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub asset_status: String,
    pub playback_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
    pub duration: i32,
    pub visibility: String,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: ChannelSummary,
    pub view_count: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    pub viewer_reaction: Option<String>,
}

impl From<VideoDetailRow> for VideoDetail {
    fn from(row: VideoDetailRow) -> Self {
        VideoDetail {
            id: row.id,
            title: row.title,
            description: row.description,
            asset_status: row.asset_status,
            playback_id: row.playback_id,
            thumbnail_url: row.thumbnail_url,
            preview_url: row.preview_url,
            duration: row.duration,
            visibility: row.visibility,
            category_id: row.category_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: ChannelSummary {
                id: row.user_id,
                name: row.user_name,
                image_url: row.user_image_url,
                subscriber_count: row.subscriber_count,
                is_subscribed: row.is_subscribed,
            },
            view_count: row.view_count,
            like_count: row.like_count,
            dislike_count: row.dislike_count,
            viewer_reaction: row.viewer_reaction,
        }
    }
}

#[derive(Serialize)]
pub struct CommentView {
    pub id: String,
    pub video_id: String,
    pub parent_id: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
    pub like_count: i64,
    pub dislike_count: i64,
    pub reply_count: i64,
    pub viewer_reaction: Option<String>,
}

impl From<CommentListRow> for CommentView {
    fn from(row: CommentListRow) -> Self {
        CommentView {
            id: row.id,
            video_id: row.video_id,
            parent_id: row.parent_id,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                image_url: row.user_image_url,
            },
            like_count: row.like_count,
            dislike_count: row.dislike_count,
            reply_count: row.reply_count,
            viewer_reaction: row.viewer_reaction,
        }
    }
}

#[derive(Serialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub video_count: i64,
    pub latest_video_thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains_video: Option<bool>,
}

impl From<PlaylistListRow> for PlaylistSummary {
    fn from(row: PlaylistListRow) -> Self {
        PlaylistSummary {
            id: row.id,
            name: row.name,
            description: row.description,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            video_count: row.video_count,
            latest_video_thumbnail: row.latest_video_thumbnail,
            contains_video: None,
        }
    }
}

impl From<PlaylistForVideoRow> for PlaylistSummary {
    fn from(row: PlaylistForVideoRow) -> Self {
        PlaylistSummary {
            id: row.id,
            name: row.name,
            description: row.description,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            video_count: row.video_count,
            latest_video_thumbnail: row.latest_video_thumbnail,
            contains_video: Some(row.contains_video),
        }
    }
}

#[derive(Serialize)]
pub struct SubscriptionView {
    pub creator: UserSummary,
    pub subscriber_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionListRow> for SubscriptionView {
    fn from(row: SubscriptionListRow) -> Self {
        SubscriptionView {
            creator: UserSummary {
                id: row.creator_id,
                name: row.user_name,
                image_url: row.user_image_url,
            },
            subscriber_count: row.subscriber_count,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub banner_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub video_count: i64,
    pub subscriber_count: i64,
    pub is_subscribed: bool,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        UserProfile {
            id: row.id,
            name: row.name,
            image_url: row.image_url,
            banner_url: row.banner_url,
            created_at: row.created_at,
            video_count: row.video_count,
            subscriber_count: row.subscriber_count,
            is_subscribed: row.is_subscribed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_kind_round_trips_through_json() {
        let like: ReactionKind = serde_json::from_str("\"like\"").unwrap();
        assert_eq!(like, ReactionKind::Like);
        assert_eq!(like.as_str(), "like");
        assert!(serde_json::from_str::<ReactionKind>("\"love\"").is_err());
    }

    #[test]
    fn visibility_uses_upper_case_wire_values() {
        let public: Visibility = serde_json::from_str("\"PUBLIC\"").unwrap();
        assert_eq!(public.as_str(), "PUBLIC");
        assert!(serde_json::from_str::<Visibility>("\"public\"").is_err());
    }

    #[test]
    fn new_ids_are_unique_and_plain_hex() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
