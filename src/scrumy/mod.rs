//! Scrumy API interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Project/password credentials
//! - [`client`] - Main Scrumy client and resource helpers
//! - [`http`] - Fetch transport and error formatting
//!
//! # Example
//!
//! ```no_run
//! use scrumy_client::ScrumyClient;
//!
//! # async fn example() -> scrumy_client::Result<()> {
//! let client = ScrumyClient::new("my-project", "secret")?;
//! for sprint in client.sprints().await? {
//!     println!("{:?} has {} stories", sprint.id(), sprint.stories().await?.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod http;

#[cfg(test)]
pub(crate) mod testing;
