// Minimal inline HTML pages. A real templating engine stays out of this
// crate; these pages exist so the OAuth flows have something to land on.

use serde_json::Value;

use crate::providers::patreon::PatreonIdentity;
use crate::providers::youtube::ChannelIdentity;
use crate::session::Session;

pub fn home_anonymous() -> String {
    layout(
        "Supporter Portal",
        "<h1>Supporter Portal</h1>\
         <p>You are not signed in.</p>\
         <p><a href=\"/login\">Sign in</a></p>",
    )
}

pub fn home_patreon(session: &Session, identity: &PatreonIdentity) -> String {
    profile_page(&session.name, "Patreon", &identity.raw)
}

pub fn home_youtube(session: &Session, channel: &ChannelIdentity) -> String {
    profile_page(&session.name, "YouTube", &channel.raw)
}

pub fn login(patreon_url: &str, youtube_url: &str) -> String {
    let body = format!(
        "<h1>Sign in</h1>\
         <ul>\
         <li><a href=\"{}\">Sign in with Patreon</a></li>\
         <li><a href=\"{}\">Sign in with YouTube</a></li>\
         </ul>",
        escape(patreon_url),
        escape(youtube_url)
    );
    layout("Sign in", &body)
}

fn profile_page(name: &str, provider_label: &str, raw: &Value) -> String {
    let pretty = serde_json::to_string_pretty(raw).unwrap_or_default();
    let body = format!(
        "<h1>{}</h1>\
         <p>Signed in with {}.</p>\
         <pre>{}</pre>\
         <p><a href=\"/login\">Switch account</a> | <a href=\"/logout\">Log out</a></p>",
        escape(name),
        provider_label,
        escape(&pretty)
    );
    layout(name, &body)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body>{}</body>\n\
         </html>",
        escape(title),
        body
    )
}

/// Escape text interpolated into HTML content or attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
