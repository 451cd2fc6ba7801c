//! HTML dashboard rendering

use shared::RegistrySnapshot;

use crate::core::registry::default_stress_target;

const MAIN_CSS: &str = "body { font-family: sans-serif; margin: 0; padding: 1rem 2rem; }
.content { margin-bottom: 2rem; }
table { border-collapse: collapse; min-width: 40rem; }
th, td { text-align: left; padding: 0.25rem 0.75rem; border-bottom: 1px solid #ddd; }
form { display: flex; gap: 0.5rem; }
input[type=text] { min-width: 20rem; }
";

const THEME_CSS: &str = "body { background: #fafafa; color: #222; }
h1 { font-size: 1.25rem; color: #333; }
a { color: #0b5cad; }
.busy { color: #b35900; font-weight: bold; }
";

/// Stylesheets served under `/static/styles/:style`
pub fn stylesheet(name: &str) -> Option<&'static str> {
    match name {
        "main.css" => Some(MAIN_CSS),
        "theme.css" => Some(THEME_CSS),
        _ => None,
    }
}

pub fn render_dashboard(snapshot: &RegistrySnapshot) -> String {
    let default_target = escape_html(&default_stress_target(&snapshot.servers));
    let mut html = String::from(
        "<!doctype html>
<html>
\t<head>
\t\t<title>Learn Some System Design - LSD - Dashboard</title>
\t\t<link rel=\"stylesheet\" href=\"/static/styles/main.css\">
\t\t<link rel=\"stylesheet\" href=\"/static/styles/theme.css\">
\t</head>
\t<body>
",
    );

    html.push_str("\t\t<article class=\"content\">\n\t\t\t<h1>Instances</h1>\n\t\t\t<table>\n");
    html.push_str("\t\t\t\t<thead><tr><th>Name</th><th>Number of requests</th><th>Last ping (ms ago)</th></tr></thead>\n\t\t\t\t<tbody>\n");
    for instance in snapshot.instances.values() {
        html.push_str(&format!(
            "\t\t\t\t\t<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&instance.name),
            instance.metrics.requests,
            instance.time_since_last_ping_ms
        ));
    }
    html.push_str("\t\t\t\t</tbody>\n\t\t\t</table>\n\t\t</article>\n");

    html.push_str("\t\t<article class=\"content\">\n\t\t\t<h1>Services</h1>\n\t\t\t<table>\n");
    html.push_str("\t\t\t\t<thead><tr><th>Name</th></tr></thead>\n\t\t\t\t<tbody>\n");
    for server in &snapshot.servers {
        let endpoint = escape_html(&server.endpoint);
        html.push_str(&format!(
            "\t\t\t\t\t<tr><td><a rel=\"no-follow\" href=\"{endpoint}\">{}</a> ({endpoint})</td></tr>\n",
            escape_html(&server.service)
        ));
    }
    html.push_str("\t\t\t\t</tbody>\n\t\t\t</table>\n\t\t</article>\n");

    html.push_str("\t\t<article class=\"content\">\n\t\t\t<h1>Stressors</h1>\n\t\t\t<table>\n");
    html.push_str("\t\t\t\t<thead><tr><th>Name</th><th>Status</th><th>Trigger</th></tr></thead>\n\t\t\t\t<tbody>\n");
    for stressor in &snapshot.stressors {
        let endpoint = escape_html(&stressor.base_endpoint);
        let name = escape_html(&stressor.name);
        let status = if stressor.test_in_progress {
            "<span class=\"busy\">running</span>"
        } else {
            "idle"
        };
        html.push_str(&format!(
            "\t\t\t\t\t<tr>
\t\t\t\t\t\t<td><a rel=\"no-follow\" href=\"{endpoint}/\">{name}</a> ({endpoint})</td>
\t\t\t\t\t\t<td>{status}</td>
\t\t\t\t\t\t<td>
\t\t\t\t\t\t\t<form method=\"POST\" action=\"/actions/trigger-stressor/{name}\">
\t\t\t\t\t\t\t\t<input name=\"target.endpoint\" type=\"text\" value=\"{default_target}\">
\t\t\t\t\t\t\t\t<button type=\"submit\">Go</button>
\t\t\t\t\t\t\t</form>
\t\t\t\t\t\t</td>
\t\t\t\t\t</tr>\n"
        ));
    }
    html.push_str("\t\t\t\t</tbody>\n\t\t\t</table>\n\t\t</article>\n");

    html.push_str("\t</body>\n</html>\n");
    html
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
