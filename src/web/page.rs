use crate::marshal::{self, escape_html};
use crate::registry::RegistryEntry;

/// Render the full control page: one form row per entry, the time of the
/// previous contact and the message log.
pub fn render_page(
    title: &str,
    entries: &[RegistryEntry],
    last_contact: &str,
    messages: &[String],
) -> String {
    let title = escape_html(title);

    let form_body = if entries.is_empty() {
        r#"<p class="empty">No variables registered</p>"#.to_string()
    } else {
        let rows: Vec<String> = entries
            .iter()
            .map(|entry| {
                let rendered = marshal::render(&entry.name, entry.current());
                format!(
                    r#"<tr class="kind-{}"><th>{}</th><td>{}</td></tr>"#,
                    entry.kind, rendered.label, rendered.input
                )
            })
            .collect();
        format!("<table>\n{}\n</table>", rows.join("\n"))
    };

    let message_list = if messages.is_empty() {
        r#"<p class="empty">No messages</p>"#.to_string()
    } else {
        let items: Vec<String> = messages
            .iter()
            .map(|m| format!("<li>{}</li>", escape_html(m)))
            .collect();
        format!("<ol>\n{}\n</ol>", items.join("\n"))
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            margin: 0 auto;
            max-width: 760px;
            padding: 24px;
            color: #333;
        }}
        h1 {{ font-size: 1.8em; margin-bottom: 16px; }}
        table {{ border-collapse: collapse; width: 100%; margin-bottom: 16px; }}
        th {{ text-align: left; padding: 8px 16px 8px 0; vertical-align: top; }}
        td {{ padding: 8px 0; }}
        input[type="text"], input[type="number"], textarea {{ width: 100%; box-sizing: border-box; }}
        .dict {{ display: grid; grid-template-columns: 1fr 1fr; gap: 8px; }}
        .empty {{ color: #999; }}
        .contact {{ color: #666; font-size: 0.9em; }}
        ol {{ font-family: monospace; font-size: 0.9em; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <form method="post" action="/">
{form_body}
        <button type="submit">Submit</button>
    </form>
    <p class="contact">Last contacted: {last_contact}</p>
    <h2>Messages</h2>
{message_list}
</body>
</html>
"#,
        title = title,
        form_body = form_body,
        last_contact = escape_html(last_contact),
        message_list = message_list,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Kind, Value};

    fn entry(name: &str, live: Value, pending: Option<Value>) -> RegistryEntry {
        RegistryEntry {
            name: name.to_string(),
            kind: live.kind(),
            live,
            pending,
        }
    }

    #[test]
    fn test_empty_page() {
        let html = render_page("Rig", &[], "never", &[]);
        assert!(html.contains("<title>Rig</title>"));
        assert!(html.contains("No variables registered"));
        assert!(html.contains("Last contacted: never"));
        assert!(html.contains("No messages"));
        assert!(html.contains(r#"<form method="post" action="/">"#));
    }

    #[test]
    fn test_rows_show_pending_value() {
        let entries = vec![
            entry("count", Value::Int(1), Some(Value::Int(42))),
            entry("running", Value::Bool(true), None),
        ];
        let html = render_page("Rig", &entries, "never", &[]);

        assert!(html.contains(r#"name="count" step="1" value="42""#));
        assert!(html.contains(r#"name="running" value="on" checked"#));
        assert!(html.contains(&format!("kind-{}", Kind::Bool)));
        assert!(!html.contains("No variables registered"));
    }

    #[test]
    fn test_title_and_messages_escaped() {
        let messages = vec!["<script>alert(1)</script>".to_string()];
        let html = render_page("A & B", &[], "5 minutes ago", &messages);

        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<li>&lt;script&gt;alert(1)&lt;/script&gt;</li>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Last contacted: 5 minutes ago"));
    }
}
