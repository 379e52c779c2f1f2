//! Form UI
//!
//! A single server-rendered page: the question form, and below it either
//! the agent's answer (Markdown rendered to HTML) or an error banner.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

pub const PAGE_TITLE: &str = "Academic Research Multi Tool Assistant";
pub const SUMMARY_HEADER: &str = "Here's a clear summary of your requests and answers:";

const EXAMPLE_PROMPT: &str = "Summarize the most cited papers in reinforcement learning from the last two years. \
Also, translate the main findings into Spanish";

/// What to show under the form
pub enum Outcome<'a> {
    Answer(&'a str),
    Error(&'a str),
}

/// Render the full page; `query` refills the textarea
pub fn render(query: &str, outcome: Option<Outcome<'_>>) -> String {
    let result = match outcome {
        Some(Outcome::Answer(answer)) => format!(
            "<section class=\"answer\">\n<p><strong>{}</strong></p>\n{}</section>\n",
            html_escape(SUMMARY_HEADER),
            markdown_to_html(answer),
        ),
        Some(Outcome::Error(message)) => format!(
            "<section class=\"error\" role=\"alert\">{}</section>\n",
            html_escape(message)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Academic Research Assistant</title>
<style>{css}</style>
</head>
<body>
<main>
<h1>{title}</h1>
<p class="example">{example}</p>
<form method="post" action="/ask">
<label for="query">Enter your query here :</label>
<textarea id="query" name="query" rows="3">{query}</textarea>
<button type="submit">Ask Agent</button>
</form>
{result}</main>
</body>
</html>
"#,
        css = CSS,
        title = html_escape(PAGE_TITLE),
        example = html_escape(EXAMPLE_PROMPT),
        query = html_escape(query),
    )
}

/// URL schemes a rendered link or image may point at
const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Markdown to HTML. Raw HTML in the input is shown as text, not injected,
/// and link or image targets outside [`ALLOWED_SCHEMES`] are replaced by `#`.
pub fn markdown_to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Keep relative targets and allowed schemes; anything else becomes `#`.
///
/// Browsers ignore whitespace and control characters inside a scheme, so
/// those are dropped before the scheme is compared.
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let allowed = match cleaned.find(':') {
        None => true,
        Some(i) if cleaned[..i].contains(['/', '?', '#']) => true,
        Some(i) => ALLOWED_SCHEMES.contains(&&cleaned[..i]),
    };

    if allowed { url } else { CowStr::Borrowed("#") }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const CSS: &str = "
body { font-family: system-ui, sans-serif; color: #1f2937; background: #f9fafb; margin: 0; }
main { max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
.example { color: #4b5563; font-style: italic; }
form { display: flex; flex-direction: column; gap: 0.5rem; }
textarea { font: inherit; padding: 0.5rem; }
button { align-self: flex-start; padding: 0.5rem 1.25rem; background: #2563eb; color: #fff; border: 0; border-radius: 0.375rem; cursor: pointer; }
.answer { margin-top: 2rem; line-height: 1.6; }
.error { margin-top: 2rem; padding: 0.75rem 1rem; background: #fef2f2; color: #991b1b; border: 1px solid #fecaca; border-radius: 0.375rem; }
";
