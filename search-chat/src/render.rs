//! Turning gateway responses into terminal text.

use crate::client::SessionSummary;
use colored::Colorize;
use serde_json::Value;

fn text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn details_text(details: &Value) -> String {
    match details {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Session banner, or a single-turn notice.
pub fn session_banner(body: &Value) -> Option<String> {
    let info = body.get("sessionInfo")?;

    if info["isMultiTurn"].as_bool().unwrap_or(false) {
        let session_id = text(&info["sessionId"]).unwrap_or("-");
        let short_id = session_id.rsplit('/').next().unwrap_or(session_id);
        Some(format!(
            "Session: {} | Turn: {}",
            short_id,
            info["turnNumber"].as_u64().unwrap_or(0)
        ))
    } else {
        Some("Single-turn search (no session)".to_string())
    }
}

/// Summary text followed by its citation sources.
fn summary_section(body: &Value) -> Option<String> {
    let summary = &body["summary"];
    let summary_text = text(&summary["summaryText"])?;

    let mut out = format!("{}\n{}", "Answer:".bold(), summary_text);

    if let Some(citations) = summary["summaryWithMetadata"]["citations"].as_array() {
        out.push_str(&format!("\n\n{}", "Sources:".bold()));
        for citation in citations {
            let citation_id = citation["id"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| citation["id"].to_string());
            for reference in citation["references"].as_array().into_iter().flatten() {
                let source = text(&reference["uri"])
                    .or_else(|| text(&reference["title"]))
                    .unwrap_or("unknown source");
                out.push_str(&format!("\n- {} (citation {})", source, citation_id));
            }
        }
    }

    Some(out)
}

/// Result titles, first snippets and links.
fn results_section(body: &Value) -> Option<String> {
    let results = body["results"].as_array().filter(|r| !r.is_empty())?;

    let mut out = "Results (no summary):".bold().to_string();
    for (index, result) in results.iter().enumerate() {
        let data = &result["document"]["derivedStructData"];
        out.push_str(&format!(
            "\n\n{}. {}",
            index + 1,
            text(&data["title"]).unwrap_or("Untitled")
        ));
        if let Some(snippet) = text(&data["snippets"][0]["snippet"]) {
            out.push_str(&format!("\n   Snippet: {}", snippet));
        }
        let link = text(&data["link"])
            .or_else(|| text(&result["document"]["uri"]))
            .unwrap_or("no link");
        out.push_str(&format!("\n   Link: {}", link));
    }

    Some(out)
}

/// Server-reported `{error, details}`.
pub fn error_section(body: &Value) -> Option<String> {
    let error = text(&body["error"])?;
    let mut out = format!("Server error: {}", error).red().to_string();
    if let Some(details) = body.get("details").filter(|d| !d.is_null()) {
        out.push_str(&format!("\n   Details: {}", details_text(details)));
    }
    Some(out)
}

/// Full rendering of a search response.
pub fn search_response(body: &Value) -> String {
    let main = summary_section(body)
        .or_else(|| results_section(body))
        .or_else(|| error_section(body))
        .unwrap_or_else(|| "No results, or an unexpected response format.".to_string());

    match session_banner(body) {
        Some(banner) => format!("{}\n\n{}", banner.cyan(), main),
        None => main,
    }
}

pub fn session_list(sessions: &[SessionSummary], current: Option<&str>) -> String {
    if sessions.is_empty() {
        return "No sessions yet.".to_string();
    }

    let mut out = "Sessions:".bold().to_string();
    for (index, session) in sessions.iter().enumerate() {
        let marker = if Some(session.name.as_str()) == current {
            "->"
        } else {
            "  "
        };
        out.push_str(&format!(
            "\n{} {}. {} ({} turns)\n     ID: {}",
            marker,
            index + 1,
            session.display_name,
            session.turn_count,
            session.short_id()
        ));
        if let Some(created) = session.created {
            out.push_str(&format!(
                "\n     Created: {}",
                created.format("%Y-%m-%d %H:%M:%S")
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_summary_with_citations() {
        plain();
        let body = json!({
            "sessionInfo": {"isMultiTurn": true, "sessionId": "projects/p/sessions/77", "turnNumber": 2, "queryId": "q"},
            "summary": {
                "summaryText": "Invoices are due in 30 days.",
                "summaryWithMetadata": {"citations": [
                    {"id": "1", "references": [{"uri": "gs://docs/terms.pdf"}, {"title": "Payment terms"}]}
                ]}
            }
        });

        let out = search_response(&body);

        assert!(out.starts_with("Session: 77 | Turn: 2"));
        assert!(out.contains("Invoices are due in 30 days."));
        assert!(out.contains("- gs://docs/terms.pdf (citation 1)"));
        assert!(out.contains("- Payment terms (citation 1)"));
    }

    #[test]
    fn test_results_without_summary() {
        plain();
        let body = json!({
            "sessionInfo": {"isMultiTurn": false},
            "results": [
                {"document": {"derivedStructData": {"title": "Terms", "snippets": [{"snippet": "net 30"}], "link": "gs://t"}}},
                {"document": {"uri": "gs://fallback", "derivedStructData": {}}}
            ]
        });

        let out = search_response(&body);

        assert!(out.starts_with("Single-turn search (no session)"));
        assert!(out.contains("1. Terms\n   Snippet: net 30\n   Link: gs://t"));
        assert!(out.contains("2. Untitled\n   Link: gs://fallback"));
    }

    #[test]
    fn test_error_body() {
        plain();
        let body = json!({"error": "Failed to get access token", "details": "gcloud-cli: not found"});

        let out = search_response(&body);

        assert!(out.contains("Server error: Failed to get access token"));
        assert!(out.contains("Details: gcloud-cli: not found"));
    }

    #[test]
    fn test_unexpected_shape() {
        plain();
        assert_eq!(
            search_response(&json!({"foo": 1})),
            "No results, or an unexpected response format."
        );
    }

    #[test]
    fn test_session_list_marks_current() {
        plain();
        let sessions = vec![
            SessionSummary {
                name: "projects/p/sessions/1".to_string(),
                display_name: "first".to_string(),
                turn_count: 2,
                created: None,
            },
            SessionSummary {
                name: "projects/p/sessions/2".to_string(),
                display_name: "second".to_string(),
                turn_count: 0,
                created: None,
            },
        ];

        let out = session_list(&sessions, Some("projects/p/sessions/2"));

        assert!(out.contains("   1. first (2 turns)\n     ID: 1"));
        assert!(out.contains("-> 2. second (0 turns)\n     ID: 2"));
        assert_eq!(session_list(&[], None), "No sessions yet.");
    }
}
