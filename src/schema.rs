table! {
    categories (id) {
        id -> Text,
        name -> Text,
        description -> Text,
    }
}

table! {
    comment_reactions (user_id, comment_id) {
        user_id -> Text,
        comment_id -> Text,
        reaction_type -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    comments (id) {
        id -> Text,
        user_id -> Text,
        video_id -> Text,
        parent_id -> Nullable<Text>,
        body -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    playlist_videos (playlist_id, video_id) {
        playlist_id -> Text,
        video_id -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    playlists (id) {
        id -> Text,
        name -> Text,
        description -> Nullable<Varchar>,
        user_id -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    subscriptions (viewer_id, creator_id) {
        viewer_id -> Text,
        creator_id -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    users (id) {
        id -> Text,
        external_id -> Text,
        name -> Text,
        image_url -> Text,
        banner_url -> Nullable<Text>,
        banner_key -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    video_reactions (user_id, video_id) {
        user_id -> Text,
        video_id -> Text,
        reaction_type -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    video_views (user_id, video_id) {
        user_id -> Text,
        video_id -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    videos (id) {
        id -> Text,
        title -> Text,
        description -> Nullable<Text>,
        asset_status -> Text,
        asset_id -> Nullable<Text>,
        upload_id -> Text,
        playback_id -> Nullable<Text>,
        track_id -> Nullable<Text>,
        track_status -> Nullable<Text>,
        thumbnail_url -> Nullable<Text>,
        thumbnail_key -> Nullable<Text>,
        preview_url -> Nullable<Text>,
        preview_key -> Nullable<Text>,
        duration -> Int4,
        visibility -> Varchar,
        user_id -> Text,
        category_id -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

joinable!(videos -> users (user_id));
joinable!(videos -> categories (category_id));
joinable!(comments -> users (user_id));
joinable!(comments -> videos (video_id));
joinable!(video_views -> videos (video_id));
joinable!(video_reactions -> videos (video_id));
joinable!(comment_reactions -> comments (comment_id));
joinable!(playlists -> users (user_id));
joinable!(playlist_videos -> playlists (playlist_id));
joinable!(playlist_videos -> videos (video_id));

allow_tables_to_appear_in_same_query!(
    categories,
    comment_reactions,
    comments,
    playlist_videos,
    playlists,
    subscriptions,
    users,
    video_reactions,
    video_views,
    videos,
);
