use std::fmt::Write;

use crate::handlers::{Banner, SessionView};
use crate::models::ImageFormat;

const TEMPLATE: &str = include_str!("../../static/index.html");

/// Render the calorie advisor page for one session.
/// `rejection` is an upload error that never reached the session.
pub fn render(view: &SessionView, rejection: Option<&str>) -> String {
    let mut content = String::new();

    if let Some(message) = rejection {
        banner(&mut content, "error", message);
    }

    let _ = write!(
        content,
        r#"        <form class="upload" action="/upload" method="post" enctype="multipart/form-data">
            <label for="file">Upload your food image ({})</label>
            <input type="file" id="file" name="file" accept="{}">
            <noscript><button type="submit">Upload</button></noscript>
        </form>
"#,
        ImageFormat::ACCEPTED.join(", "),
        ImageFormat::ACCEPTED
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(","),
    );

    if let Some(name) = &view.image_name {
        let _ = write!(
            content,
            r#"        <figure class="preview">
            <img src="/image" alt="{}">
            <figcaption>Your Food Image</figcaption>
        </figure>
        <form id="analyze-form" action="/analyze" method="post">
            <button type="submit" id="analyze-button">Calculate Calories</button>
        </form>
        <div class="spinner" id="spinner" hidden>⏳ Analyzing your food...</div>
"#,
            escape_html(name),
        );
    }

    match &view.banner {
        Some(Banner::Success(message)) => banner(&mut content, "success", message),
        Some(Banner::Error(message)) => banner(&mut content, "error", message),
        None => {}
    }

    if let Some(body) = &view.body {
        let _ = writeln!(content, r#"        <div class="analysis">{}</div>"#, escape_html(body));
    }

    TEMPLATE.replace("{{content}}", content.trim_end())
}

fn banner(out: &mut String, kind: &str, message: &str) {
    let _ = writeln!(
        out,
        r#"        <div class="banner {}" role="alert">{}</div>"#,
        kind,
        escape_html(message)
    );
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
