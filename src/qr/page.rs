//! Static landing page generation. The page embeds the uploaded video
//! and honors the viewing contract: the redirect control only appears
//! in the final seconds of playback, then a progress bar fills before
//! the browser navigates to the target link.

/// Seconds of remaining playback at which the redirect control appears.
const REVEAL_WINDOW_SECS: u32 = 8;
/// How long the progress bar takes to fill before redirecting.
const FILL_DURATION_MS: u32 = 5000;
const TICK_MS: u32 = 50;

#[derive(Debug, Clone)]
pub struct PageMeta {
    pub name: String,
    pub note: String,
    pub author: String,
    pub link: String,
    pub video_url: Option<String>,
}

pub fn render_page(meta: &PageMeta) -> String {
    let name = escape_html(&meta.name);
    let note = escape_html(&meta.note);
    let author = escape_html(&meta.author);
    let link_attr = escape_html(&meta.link);
    // JSON-encode for the script context so quotes and backslashes in
    // the target URL cannot break out of the string literal.
    let link_js = serde_json::to_string(&meta.link).unwrap_or_else(|_| "\"\"".into());

    let video_block = match &meta.video_url {
        Some(url) => format!(
            r#"<div class="video-wrap">
  <video id="qrVideo" playsinline>
    <source src="{}" type="video/mp4">
    Your browser does not support the video tag.
  </video>
  <div class="play-btn" id="playBtn">&#9654;</div>
</div>"#,
            escape_html(url)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{name}</title>
<style>
body {{ font-family: sans-serif; background: #fff; min-height: 100vh; display: flex; flex-direction: column; margin: 0; }}
main {{ display: flex; flex-direction: column; align-items: center; padding-bottom: 2.5rem; }}
.meta {{ width: 100%; max-width: 14rem; text-align: left; }}
.meta .name {{ font-size: .75rem; font-weight: bold; letter-spacing: .2em; margin-bottom: .125rem; }}
.meta .note {{ color: #1f2937; font-size: .75rem; margin: 0; }}
.meta .author {{ color: #6b7280; font-size: .75rem; text-align: right; margin-bottom: .5rem; }}
.video-wrap {{ position: relative; }}
video {{ width: 244px; height: 507px; border: 2px solid #000; border-radius: 20px; }}
.play-btn {{ position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%);
  display: flex; align-items: center; justify-content: center; background: #000; color: #fff;
  font-size: 32px; width: 80px; height: 80px; border-radius: 50%; cursor: pointer; }}
#redirectButtonContainer {{ display: none; flex-direction: column; justify-content: center; align-items: center; margin-top: 1.25rem; }}
#redirectButton {{ position: relative; width: 8rem; height: 4px; background: transparent; border: none; border-radius: 6px; overflow: hidden; }}
#progressFill {{ position: absolute; inset: 0; background: #dc2626; height: 4px; width: 0; }}
#redirectLink {{ letter-spacing: .3em; margin-top: .5rem; padding: .5rem; background: #fff; color: #000; border-radius: 6px; text-decoration: none; }}
</style>
</head>
<body>
<main>
<div class="meta">
  <p class="name">{name}</p>
  <p class="note">&quot;{note}&quot;</p>
  <p class="author">- {author}</p>
</div>
{video_block}
<div id="redirectButtonContainer">
  <button id="redirectButton"><span id="progressFill"></span></button>
  <a href="{link_attr}" id="redirectLink">Revolving...</a>
</div>
</main>
<script>
var targetLink = {link_js};
var video = document.getElementById("qrVideo");
var playBtn = document.getElementById("playBtn");
var container = document.getElementById("redirectButtonContainer");
var progressFill = document.getElementById("progressFill");
var revealed = false;

function startCountdown() {{
  if (revealed) return;
  revealed = true;
  container.style.display = "flex";
  var progress = 0;
  var increment = 100 / ({FILL_DURATION_MS} / {TICK_MS});
  var interval = setInterval(function () {{
    progress += increment;
    progressFill.style.width = progress + "%";
    if (progress >= 100) {{
      clearInterval(interval);
      window.location.href = targetLink;
    }}
  }}, {TICK_MS});
}}

if (video) {{
  playBtn.addEventListener("click", function () {{
    video.play();
    playBtn.style.display = "none";
  }});
  video.addEventListener("pause", function () {{ playBtn.style.display = "flex"; }});
  video.addEventListener("play", function () {{ playBtn.style.display = "none"; }});
  video.addEventListener("timeupdate", function () {{
    var remaining = video.duration - video.currentTime;
    if (remaining <= {REVEAL_WINDOW_SECS}) startCountdown();
  }});
}} else {{
  startCountdown();
}}
</script>
</body>
</html>
"#
    )
}

fn escape_html(input: &str) -> String {
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

    fn meta() -> PageMeta {
        PageMeta {
            name: "Spring drop".into(),
            note: "Limited run".into(),
            author: "Studio".into(),
            link: "https://example.com/landing?a=1&b=2".into(),
            video_url: Some("https://example.com/uploads/1700_clip.mp4".into()),
        }
    }

    #[test]
    fn page_embeds_video_and_link() {
        let html = render_page(&meta());
        assert!(html.contains("https://example.com/uploads/1700_clip.mp4"));
        assert!(html.contains("Spring drop"));
        assert!(html.contains("Limited run"));
        assert!(html.contains("Studio"));
        // href is attribute-escaped, script link is JSON-encoded
        assert!(html.contains("https://example.com/landing?a=1&amp;b=2"));
        assert!(html.contains(r#"var targetLink = "https://example.com/landing?a=1&b=2";"#));
    }

    #[test]
    fn page_carries_countdown_contract() {
        let html = render_page(&meta());
        assert!(html.contains("timeupdate"));
        assert!(html.contains("remaining <= 8"));
        assert!(html.contains("5000"));
        assert!(html.contains("window.location.href"));
    }

    #[test]
    fn page_without_video_reveals_immediately() {
        let mut m = meta();
        m.video_url = None;
        let html = render_page(&m);
        assert!(!html.contains("<video"));
        assert!(html.contains("startCountdown()"));
    }

    #[test]
    fn metadata_is_html_escaped() {
        let mut m = meta();
        m.name = "<script>alert(1)</script>".into();
        m.note = "a & b".into();
        let html = render_page(&m);
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("a &amp; b"));
    }
}
