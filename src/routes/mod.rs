pub mod categories;
pub mod comments;
pub mod playlists;
pub mod reactions;
pub mod search;
pub mod studio;
pub mod subscriptions;
pub mod suggestions;
pub mod users;
pub mod videos;
pub mod views;
pub mod webhooks;
