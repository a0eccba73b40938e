//! `Link` response header parsing.
//!
//! The upstream paginates list endpoints and advertises the following page
//! through a header of the form
//! `<https://host/api/v4/groups/1/projects?page=2>; rel="next", <...>; rel="last"`.

/// Extract the URL of the `next` relation from a `Link` header value.
///
/// Entries are comma-separated; each entry is `<url>` followed by
/// `;`-separated parameters. The `rel` parameter may be quoted or bare and
/// may list several space-separated relation types. Returns `None` when no
/// entry carries the `next` relation.
#[must_use]
pub fn next_link(header: &str) -> Option<String> {
    entries(header).find_map(|entry| {
        let mut parts = entry.split(';');
        let url = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;

        let is_next = parts.any(|param| {
            let Some((key, value)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && value
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });

        (is_next && !url.is_empty()).then(|| url.to_owned())
    })
}

/// Split a header value on the commas that separate entries. Commas inside
/// `<...>` belong to the URL.
fn entries(header: &str) -> impl Iterator<Item = &str> {
    let mut in_url = false;
    header.split(move |c| match c {
        '<' => {
            in_url = true;
            false
        }
        '>' => {
            in_url = false;
            false
        }
        ',' => !in_url,
        _ => false,
    })
}
