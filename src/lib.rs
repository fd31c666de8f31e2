//! Read-only client for the Scrumy REST API.
//!
//! Resource kinds (project, sprint, story, task, scrumer, snapshot) are
//! declared once in an embedded table. [`ScrumyClient::dispatch`] turns a
//! resource name plus a [`Selector`] into a request, and the returned
//! [`Entity`] values load their children lazily, at most once per field.
//!
//! ```no_run
//! use scrumy_client::{ScrumyClient, Selector};
//!
//! # async fn example() -> scrumy_client::Result<()> {
//! let client = ScrumyClient::new("my-project", "secret")?;
//! if let Some(sprint) = client.current_sprint().await? {
//!     for story in sprint.stories().await? {
//!         println!("{}", story.get_str("title").unwrap_or("-"));
//!     }
//! }
//! let tasks = client.dispatch("tasks", &Selector::from("42")).await?;
//! println!("{} tasks", tasks.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod report;
pub mod resource;
pub mod scrumy;

pub use error::{Result, ScrumyError};
pub use resource::{Entity, Fetched, Registry, ResourceDefinition, Selector};
pub use scrumy::auth::Credentials;
pub use scrumy::client::ScrumyClient;
pub use scrumy::http::{Fetch, FetchResponse, HttpFetcher};
