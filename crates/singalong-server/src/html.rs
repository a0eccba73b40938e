//! HTML fragments served by the front door.
//!
//! Every caller-supplied value is escaped before it is interpolated.

/// Escape text for use in HTML element content and quoted attributes.
#[must_use]
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

/// The login form. `target` is posted back in a hidden field.
#[must_use]
pub fn login_form(target: &str) -> String {
    format!(
        r#"<html>
  <head></head>
  <body>
    <form method="POST" action="/authenticate">
      <input type="text" value="" name="token" />
      <input type="hidden" value="{}" name="project" />
      <button type="submit">authenticate</button>
    </form>
  </body>
</html>"#,
        escape(target)
    )
}

#[must_use]
pub fn invalid_credential(token_help_url: &str) -> String {
    format!(
        "WTF are you !!! <a href='{}' target='_blank'>get a token</a>.",
        escape(token_help_url)
    )
}

#[must_use]
pub fn unknown_group(group: &str) -> String {
    format!("WTF is group {} !!!", escape(group))
}

#[must_use]
pub fn unknown_project(project: &str) -> String {
    format!("WTF is {} !!!", escape(project))
}

#[must_use]
pub fn file_missing(path: &str) -> String {
    format!("WTF ... {}.html does not exist mate!", escape(path))
}

/// Shown for timeouts, transport errors and unexpected upstream statuses.
pub const UPSTREAM_UNAVAILABLE: &str = "upstream unavailable, try again later";
