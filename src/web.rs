//! HTTP display surface: upload form, busy state, rendered review.
//!
//! | Route          | Purpose                                                |
//! |----------------|--------------------------------------------------------|
//! | `GET /`        | The page, rendered from the current session snapshot  |
//! | `POST /review` | `multipart/form-data` with `mode` and `resume` fields  |
//! | `GET /status`  | The snapshot as JSON                                   |
//!
//! While a submission is in flight the form is disabled, the button reads
//! "Generating..." and the page refreshes itself until the session settles.

use crate::error::ReviewError;
use crate::pipeline::input::UploadedDocument;
use crate::prompts::ReviewMode;
use crate::session::{ReviewSession, SessionSnapshot, SessionState};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, warn};

/// Default listen address for `serve`.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Default upload limit: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    session: Arc<ReviewSession>,
}

/// Build the router around a shared session.
pub fn router(session: Arc<ReviewSession>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/review", post(submit))
        .route("/status", get(status))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(AppState { session })
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.session.snapshot(), None))
}

async fn status(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

async fn submit(State(state): State<AppState>, multipart: Multipart) -> Response {
    let (document, mode) = match read_form(multipart).await {
        Ok(form) => form,
        Err((status, msg)) => {
            warn!("Rejected upload: {}", msg);
            return page(&state, status, Some(&msg));
        }
    };

    match state.session.submit(document, mode).await {
        Ok(out) => {
            info!("Served {} review of '{}'", out.mode, out.document);
            page(&state, StatusCode::OK, None)
        }
        Err(ReviewError::NoDocument) => page(
            &state,
            StatusCode::BAD_REQUEST,
            Some("Please choose a resume file first."),
        ),
        Err(ReviewError::Busy) => page(
            &state,
            StatusCode::CONFLICT,
            Some("A review is already being generated. Please wait for it to finish."),
        ),
        // The failure is recorded in the session and shown by the page.
        Err(_) => page(&state, StatusCode::BAD_GATEWAY, None),
    }
}

fn page(state: &AppState, status: StatusCode, notice: Option<&str>) -> Response {
    (status, Html(render_page(&state.session.snapshot(), notice))).into_response()
}

/// Pull `mode` and `resume` out of the form. A file input left empty arrives
/// as a zero-length part and is treated as no file; a missing `mode` is a 400.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(Option<UploadedDocument>, ReviewMode), (StatusCode, String)> {
    let mut document = None;
    let mut mode = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error("Failed to read upload", e))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();
        match field_name.as_str() {
            "mode" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| upload_error("Failed to read mode", e))?;
                mode = Some(
                    value
                        .parse::<ReviewMode>()
                        .map_err(|e| (StatusCode::BAD_REQUEST, format!("{}", e)))?,
                );
            }
            "resume" => {
                let name = field.file_name().unwrap_or("resume").to_string();
                let media_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| upload_error("Failed to read file data", e))?;
                if !data.is_empty() {
                    document = Some(UploadedDocument::new(data.to_vec(), media_type, name));
                }
            }
            _ => {}
        }
    }

    let mode = mode.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "Please choose a review mode.".to_string(),
        )
    })?;
    Ok((document, mode))
}

/// Oversized bodies keep their 413; everything else is a 400.
fn upload_error(context: &str, e: MultipartError) -> (StatusCode, String) {
    (e.status(), format!("{}: {}", context, e.body_text()))
}

// ── Rendering ────────────────────────────────────────────────────────────────

const STYLE: &str = "body{font-family:system-ui,sans-serif;background:#111;color:#eee;margin:0}\
main{max-width:42rem;margin:0 auto;padding:2rem;display:flex;flex-direction:column;gap:2rem}\
header{display:flex;align-items:baseline;gap:1rem;justify-content:center}\
header h1{font-size:1.25rem;margin:0}header p{opacity:.5;font-size:.875rem;margin:0}\
form fieldset{border:0;display:flex;flex-direction:column;gap:1rem;max-width:24rem;margin:0 auto;padding:0}\
select,input,button{font:inherit;padding:.4rem .75rem}\
button{border:0;border-radius:.5rem;color:#fff;background:linear-gradient(135deg,#f472b6,#db2777);font-weight:500}\
button:disabled{opacity:.5;cursor:not-allowed}\
.notice{border:1px solid #db2777;border-radius:.5rem;padding:.75rem}\
.review{background:#1c1c1c;border-radius:.5rem;padding:1.5rem}";

/// Render the whole page for `snapshot`, with an optional one-off notice.
pub fn render_page(snapshot: &SessionSnapshot, notice: Option<&str>) -> String {
    let busy = snapshot.state == SessionState::Submitting;
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    if busy {
        html.push_str("<meta http-equiv=\"refresh\" content=\"3\">\n");
    }
    let _ = write!(
        html,
        "<title>Resume Review</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<main>\n\
         <header><h1>Resume Review</h1><p>(or roast if you prefer)</p></header>\n"
    );

    html.push_str("<form method=\"post\" action=\"/review\" enctype=\"multipart/form-data\">\n");
    let _ = writeln!(html, "<fieldset{}>", if busy { " disabled" } else { "" });
    html.push_str("<select name=\"mode\" required>\n");
    for mode in ReviewMode::ALL {
        let _ = writeln!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            mode.as_str(),
            if mode == snapshot.mode { " selected" } else { "" },
            mode.label()
        );
    }
    html.push_str("</select>\n");
    html.push_str("<input type=\"file\" name=\"resume\" accept=\"image/*,.pdf\" required>\n");
    if let Some(ref name) = snapshot.document {
        let _ = writeln!(html, "<p class=\"file\">{}</p>", escape_html(name));
    }
    let _ = writeln!(
        html,
        "<button type=\"submit\">{}</button>",
        if busy { "Generating..." } else { "Generate Review" }
    );
    html.push_str("</fieldset>\n</form>\n");

    if let Some(msg) = notice {
        let _ = writeln!(html, "<div class=\"notice\">{}</div>", escape_html(msg));
    }
    if !busy && snapshot.last_outcome == Some(SessionState::Failed) {
        if let Some(ref err) = snapshot.last_error {
            let _ = writeln!(
                html,
                "<div class=\"notice\" role=\"alert\">The review could not be generated: {}</div>",
                escape_html(err)
            );
        }
    }
    if let Some(ref review) = snapshot.review {
        let _ = writeln!(html, "<article class=\"review\">\n{}\n</article>", review.html);
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ReviewResult;

    fn snapshot(state: SessionState) -> SessionSnapshot {
        SessionSnapshot {
            state,
            mode: ReviewMode::Roast,
            document: None,
            last_outcome: None,
            has_review: false,
            last_error: None,
            review: None,
        }
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn idle_page_has_enabled_form_and_roast_selected() {
        let html = render_page(&snapshot(SessionState::Idle), None);
        assert!(html.contains("<fieldset>"));
        assert!(html.contains("Generate Review"));
        assert!(html.contains("<option value=\"roast\" selected>"));
        assert!(html.contains("accept=\"image/*,.pdf\""));
        assert!(!html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn busy_page_disables_form() {
        let html = render_page(&snapshot(SessionState::Submitting), None);
        assert!(html.contains("<fieldset disabled>"));
        assert!(html.contains("Generating..."));
        assert!(html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn failure_and_file_name_are_escaped() {
        let mut snap = snapshot(SessionState::Idle);
        snap.document = Some("<img src=x>.pdf".into());
        snap.last_outcome = Some(SessionState::Failed);
        snap.last_error = Some("bad <thing>".into());
        let html = render_page(&snap, Some("note & more"));
        assert!(html.contains("&lt;img src=x&gt;.pdf"));
        assert!(html.contains("bad &lt;thing&gt;"));
        assert!(html.contains("note &amp; more"));
        assert!(!html.contains("<img src=x>"));
    }

    #[test]
    fn review_html_is_embedded() {
        let mut snap = snapshot(SessionState::Idle);
        snap.review = Some(ReviewResult {
            html: "<h2>Overall</h2>".into(),
            raw: String::new(),
        });
        snap.has_review = true;
        let html = render_page(&snap, None);
        assert!(html.contains("<article class=\"review\">\n<h2>Overall</h2>\n</article>"));
    }
}
