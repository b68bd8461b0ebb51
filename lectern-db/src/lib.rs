pub mod client;
mod comments;
mod follows;
mod groups;
mod posts;
mod record;
mod sessions;
mod users;

pub use posts::PostListing;

#[cfg(test)]
mod fixtures;
