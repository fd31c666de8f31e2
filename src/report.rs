//! Sprint reports
//!
//! Builds the "regression steps" table for the current sprint: one row per
//! story with the scrumers who worked on it. Only data nested in the current
//! sprint payload is used, so a report costs a single request.

use crate::error::Result;
use crate::resource::Entity;
use crate::scrumy::client::ScrumyClient;
use serde_json::Value;
use std::io;

pub const HEADER: [&str; 2] = ["SCRUMY ITEM", "WORKED ON"];

/// Placeholder scrumer used for informational tasks
const INFO_SCRUMER: &str = "info";

/// Rows for the current sprint, optionally preceded by [`HEADER`]
pub async fn regression_steps(
    client: &ScrumyClient,
    include_header: bool,
) -> Result<Vec<Vec<String>>> {
    let Some(sprint) = client.current_sprint().await? else {
        tracing::warn!("No current sprint for {}", client.project());
        return Ok(header_rows(include_header));
    };
    sprint_rows(&sprint, include_header).await
}

/// Rows for an already fetched sprint
pub async fn sprint_rows(sprint: &Entity, include_header: bool) -> Result<Vec<Vec<String>>> {
    let mut rows = header_rows(include_header);

    if !has_nested(sprint, "stories") {
        return Ok(rows);
    }

    for story in sprint.stories().await? {
        let title = story.get_str("title").unwrap_or_default().to_string();

        if !has_nested(story, "tasks") {
            rows.push(vec![title]);
            continue;
        }

        let mut names: Vec<String> = Vec::new();
        for task in story.tasks().await? {
            if !has_nested(task, "scrumer") {
                continue;
            }
            let Some(scrumer) = task.scrumer().await? else {
                continue;
            };
            if let Some(name) = scrumer.get_str("name") {
                if name != INFO_SCRUMER && !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        rows.push(vec![title, names.join(", ")]);
    }

    Ok(rows)
}

/// Write rows as tab-separated values
pub fn write_tsv<W: io::Write>(
    rows: &[Vec<String>],
    writer: W,
) -> std::result::Result<(), csv::Error> {
    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_writer(writer);

    for row in rows {
        tsv.write_record(row)?;
    }
    tsv.flush()?;
    Ok(())
}

fn header_rows(include_header: bool) -> Vec<Vec<String>> {
    if include_header {
        vec![HEADER.iter().map(|h| h.to_string()).collect()]
    } else {
        Vec::new()
    }
}

/// True if `field` already carries nested data (no fetch needed)
fn has_nested(entity: &Entity, field: &str) -> bool {
    match entity.attr(field) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrumy::testing::MockFetcher;
    use serde_json::json;
    use std::sync::Arc;

    const CURRENT_URL: &str = "https://scrumy.com/api/scrumies/demo/sprints/current.json";

    fn client(fetcher: &MockFetcher) -> ScrumyClient {
        ScrumyClient::with_fetcher("demo", "pw", Arc::new(fetcher.clone())).unwrap()
    }

    #[tokio::test]
    async fn test_regression_steps() {
        let fetcher = MockFetcher::new().with_json(
            CURRENT_URL,
            json!({"sprint": {"id": 9, "stories": [
                {"story": {"id": 1, "title": "Checkout", "tasks": [
                    {"task": {"id": 1, "title": "a", "scrumer": {"name": "ash"}}},
                    {"task": {"id": 2, "title": "b", "scrumer": {"name": "info"}}},
                    {"task": {"id": 3, "title": "c", "scrumer": {"name": "misty"}}},
                    {"task": {"id": 4, "title": "d", "scrumer": {"name": "ash"}}}
                ]}},
                {"story": {"id": 2, "title": "Backlog grooming"}}
            ]}}),
        );
        let client = client(&fetcher);

        let rows = regression_steps(&client, true).await.unwrap();
        assert_eq!(
            rows,
            vec![
                vec!["SCRUMY ITEM".to_string(), "WORKED ON".to_string()],
                vec!["Checkout".to_string(), "ash, misty".to_string()],
                vec!["Backlog grooming".to_string()],
            ]
        );
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_regression_steps_without_header() {
        let fetcher = MockFetcher::new().with_json(CURRENT_URL, json!({"sprint": {"id": 9}}));
        let client = client(&fetcher);
        assert!(regression_steps(&client, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_scrumer_is_skipped() {
        let fetcher = MockFetcher::new().with_json(
            CURRENT_URL,
            json!({"sprint": {"id": 9, "stories": [
                {"story": {"id": 1, "title": "Docs", "tasks": [
                    {"task": {"id": 1, "title": "a", "scrumer": {}}},
                    {"task": {"id": 2, "title": "b", "scrumer": {"name": "brock"}}}
                ]}}
            ]}}),
        );
        let client = client(&fetcher);

        let rows = regression_steps(&client, false).await.unwrap();
        assert_eq!(rows, vec![vec!["Docs".to_string(), "brock".to_string()]]);
        assert_eq!(fetcher.call_count(), 1);
    }

    #[test]
    fn test_write_tsv() {
        let rows = vec![
            vec!["SCRUMY ITEM".to_string(), "WORKED ON".to_string()],
            vec!["Checkout".to_string(), "ash, misty".to_string()],
            vec!["Search".to_string()],
        ];
        let mut out = Vec::new();
        write_tsv(&rows, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "SCRUMY ITEM\tWORKED ON\nCheckout\tash, misty\nSearch\n"
        );
    }
}
