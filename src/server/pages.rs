//! Minimal generated HTML pages.
//!
//! Everything interpolated here is a validated route or segment id or a
//! camera name, all restricted to `[A-Za-z0-9_-]`, so no escaping is needed.

use dashreel_common::{CameraType, RouteId, SegmentId};
use std::fmt::Write;

const HEAD: &str = r#"<meta name="viewport" content="initial-scale=1, width=device-width"/>
    <link href="/static/favicon.ico" rel="icon">"#;

/// Landing page.
pub fn index() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    {HEAD}
    <title>dashreel</title>
  </head>
  <body>
  <center>
    <h2>dashreel</h2>
    <a href="/footage">dashcam footage</a>
    <br><br>
    <a href="/lock">lock doors</a> - <a href="/unlock">unlock doors</a>
  </center>
  </body>
</html>
"#
    )
}

/// List of routes, in the order given.
pub fn route_list(routes: &[RouteId]) -> String {
    let mut rows = String::new();
    for route in routes {
        let _ = writeln!(rows, r#"    <a href="/footage/{route}">{route}</a><br>"#);
    }
    if routes.is_empty() {
        rows.push_str("    no routes recorded yet<br>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    {HEAD}
    <title>Dashcam Routes</title>
  </head>
  <body>
  <center>
    <a href="/">home</a>
    <br><br>
{rows}  </center>
  </body>
</html>
"#
    )
}

/// Player for one route.
///
/// Starts at the segment with `start_index` (or the first one) and advances
/// to the next segment when playback ends, wrapping at the end of the route.
pub fn route_player(
    route: &RouteId,
    segments: &[SegmentId],
    start_index: u32,
    camera: CameraType,
) -> String {
    let start = segments
        .iter()
        .position(|s| s.index() == start_index)
        .unwrap_or(0);

    let mut links = String::new();
    for segment in segments {
        let _ = writeln!(
            links,
            r#"    <a href="/footage/{route}?{},{camera}">{segment}</a><br>"#,
            segment.index()
        );
    }

    let mut switcher = Vec::new();
    for other in CameraType::ALL {
        switcher.push(format!(
            r#"<a href="/footage/{route}?{start_index},{other}">{other}</a>"#
        ));
    }
    let switcher = switcher.join(" -\n    ");

    let list = segments
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    {HEAD}
    <title>Dashcam Footage</title>
  </head>
  <body>
  <center>
    <video id="video" width="320" height="240" controls autoplay="autoplay" style="background:black">
    </video>
    <br><br>
    current segment: <span id="currentsegment"></span>
    <br>
    current view: <span id="currentview">{camera}</span>
    <br>
    <a download="{route}-{camera}.mp4" href="/footage/full/{camera}/{route}">download full route {camera}</a>
    <br><br>
    <a href="/footage">back to routes</a>
    <br><br>
    {switcher}
    <br><br>
{links}  </center>
  <script>
    var video = document.getElementById('video');
    var tracks = {{
      list: [{list}],
      index: {start},
      next: function() {{
        this.index = (this.index + 1) % this.list.length;
      }},
      src: function() {{
        return '/footage/{camera}/' + this.list[this.index];
      }}
    }};
    function play() {{
      video.src = tracks.src();
      document.getElementById('currentsegment').textContent = tracks.list[tracks.index];
      video.load();
      video.play();
    }}
    video.addEventListener('ended', function() {{
      tracks.next();
      play();
    }});
    play();
  </script>
  </body>
</html>
"#
    )
}
