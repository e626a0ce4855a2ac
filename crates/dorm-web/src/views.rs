//! Server-rendered HTML for the login page and the dashboard.

use chrono::{DateTime, Utc};
use dorm_api::{
  dto::format_timestamp,
  stats::{NEVER, NO_STATUS},
};
use dorm_core::{cleanup_log::CleanupLogEntry, resident::Resident};
use quick_xml::escape::escape;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:2rem auto;max-width:960px;color:#222}\
table{border-collapse:collapse;width:100%;margin-bottom:2rem}\
th,td{border:1px solid #ddd;padding:.4rem .6rem;text-align:left}\
th{background:#f4f4f4}\
.error{color:#b00020}\
.stats span{display:inline-block;margin-right:2rem}\
form.login{max-width:320px}\
form.login input{display:block;width:100%;margin:.3rem 0 .8rem}";

fn layout(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
     <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
    title = escape(title),
  )
}

/// The login form, optionally with an error banner and the last username.
pub fn login_page(error: Option<&str>, username: &str) -> String {
  let mut body = String::from("<h1>Dormitory administration</h1>\n");
  if let Some(error) = error {
    body.push_str(&format!("<p class=\"error\">{}</p>\n", escape(error)));
  }
  body.push_str(&format!(
    "<form class=\"login\" method=\"post\" action=\"/login\">\n\
     <label>Username<input name=\"username\" value=\"{}\" autocomplete=\"username\" required></label>\n\
     <label>Password<input name=\"password\" type=\"password\" autocomplete=\"current-password\" required></label>\n\
     <button type=\"submit\">Log in</button>\n</form>",
    escape(username),
  ));
  layout("Log in", &body)
}

pub struct Dashboard<'a> {
  pub username:     &'a str,
  pub residents:    &'a [Resident],
  pub logs:         &'a [CleanupLogEntry],
  pub total:        usize,
  pub active:       usize,
  pub last_cleanup: Option<&'a CleanupLogEntry>,
  pub now:          DateTime<Utc>,
}

pub fn dashboard_page(d: &Dashboard<'_>) -> String {
  let mut body = format!(
    "<h1>Dormitory residents</h1>\n\
     <p>Signed in as <strong>{}</strong> | <a href=\"/logout\">Log out</a></p>\n",
    escape(d.username),
  );

  let (last_time, last_status) = match d.last_cleanup {
    Some(entry) => (format_timestamp(entry.cleanup_time), entry.status.as_str()),
    None => (NEVER.to_owned(), NO_STATUS),
  };
  body.push_str(&format!(
    "<p class=\"stats\"><span>Total residents: <strong id=\"total\">{}</strong></span>\
     <span>Active (7 days): <strong>{}</strong></span>\
     <span>Last cleanup: <strong>{}</strong> ({})</span>\
     <span>Now: {}</span></p>\n",
    d.total,
    d.active,
    escape(last_time.as_str()),
    escape(last_status),
    format_timestamp(d.now),
  ));

  body.push_str(
    "<p><button id=\"cleanup\" type=\"button\">Delete all residents now</button> \
     <span id=\"cleanup-result\"></span></p>\n",
  );

  body.push_str("<h2>Residents</h2>\n");
  if d.residents.is_empty() {
    body.push_str("<p>No residents registered.</p>\n");
  } else {
    body.push_str(
      "<table>\n<tr><th>ID</th><th>Name</th><th>Room</th><th>Registered</th><th>Last active</th></tr>\n",
    );
    for r in d.residents {
      body.push_str(&format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        r.id,
        escape(r.full_name.as_str()),
        escape(r.room_number.as_str()),
        format_timestamp(r.created_at),
        format_timestamp(r.last_active_at),
      ));
    }
    body.push_str("</table>\n");
  }

  body.push_str("<h2>Cleanup history</h2>\n");
  if d.logs.is_empty() {
    body.push_str("<p>No cleanups yet.</p>\n");
  } else {
    body.push_str(
      "<table>\n<tr><th>Time</th><th>Status</th><th>Deleted</th><th>Details</th></tr>\n",
    );
    for entry in d.logs {
      body.push_str(&format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        format_timestamp(entry.cleanup_time),
        entry.status.as_str(),
        entry.records_deleted,
        escape(entry.details.as_deref().unwrap_or_default()),
      ));
    }
    body.push_str("</table>\n");
  }

  body.push_str(CLEANUP_SCRIPT);
  layout("Dashboard", &body)
}

const CLEANUP_SCRIPT: &str = r#"<script>
document.getElementById("cleanup").addEventListener("click", async () => {
  if (!confirm("Delete every resident record?")) return;
  const out = document.getElementById("cleanup-result");
  try {
    const res = await fetch("/api/cleanup/manual", { method: "POST", credentials: "same-origin" });
    const body = await res.json();
    out.textContent = body.message || body.error || res.statusText;
    if (res.ok) setTimeout(() => location.reload(), 800);
  } catch (e) {
    out.textContent = "Request failed: " + e;
  }
});
</script>"#;

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use dorm_core::cleanup_log::CleanupStatus;

  use super::*;

  #[test]
  fn login_page_escapes_username() {
    let html = login_page(None, r#""><script>alert('x')</script>"#);
    assert!(!html.contains("<script>alert"));
    assert!(html.contains(
      "value=\"&quot;&gt;&lt;script&gt;alert(&apos;x&apos;)&lt;/script&gt;\""
    ));
  }

  #[test]
  fn login_page_shows_error_and_keeps_username() {
    let html = login_page(Some("Invalid <credentials>"), "warden");
    assert!(html.contains("Invalid &lt;credentials&gt;"));
    assert!(html.contains("value=\"warden\""));
  }

  #[test]
  fn dashboard_lists_residents_and_history() {
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let residents = vec![Resident {
      id:             7,
      full_name:      "Ali <script>".into(),
      room_number:    "101".into(),
      created_at:     now,
      last_active_at: now,
    }];
    let logs = vec![CleanupLogEntry {
      id:              1,
      cleanup_time:    now,
      records_deleted: 12,
      status:          CleanupStatus::Manual,
      details:         Some("Manual cleanup.".into()),
    }];

    let html = dashboard_page(&Dashboard {
      username:     "admin",
      residents:    &residents,
      logs:         &logs,
      total:        1,
      active:       1,
      last_cleanup: logs.first(),
      now,
    });

    assert!(html.contains("Ali &lt;script&gt;"));
    assert!(html.contains("<td>manual</td><td>12</td>"));
    assert!(html.contains("2025-03-10 12:00:00"));
    assert!(html.contains("/api/cleanup/manual"));
  }

  #[test]
  fn empty_dashboard_says_never() {
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
    let html = dashboard_page(&Dashboard {
      username:     "admin",
      residents:    &[],
      logs:         &[],
      total:        0,
      active:       0,
      last_cleanup: None,
      now,
    });
    assert!(html.contains("Last cleanup: <strong>Never</strong> (N/A)"));
    assert!(html.contains("No residents registered."));
  }
}
