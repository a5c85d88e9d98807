//! Mock HTTP server routing requests by path prefix.
//!
//! Stands in for the stats API and the splash CDN in tests. Every request
//! path is recorded in [`Hits`] in arrival order.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const SUMMONER: &str = "/api/lol/na/v1.4/summoner/by-name/";
pub const CURRENT_GAME: &str = "/observer-mode/rest/consumer/getSpectatorGameInfo/NA1/";
pub const RECENT_GAMES: &str = "/api/lol/na/v1.3/game/by-summoner/";
pub const CHAMPION: &str = "/api/lol/static-data/na/v1.2/champion/";
pub const SPLASH: &str = "/cdn/img/champion/splash/";

pub const FAKER: &str = r#"{"faker":{"id":42,"name":"Faker","summonerLevel":30}}"#;
pub const LUX: &str = r#"{"id":99,"key":"Lux","name":"Lux","title":"the Lady of Luminosity"}"#;

/// Canned response for every path starting with `prefix`.
pub struct Route {
    prefix: &'static str,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    delay: Duration,
}

impl Route {
    pub fn json(prefix: &'static str, status: u16, body: &str) -> Self {
        Self {
            prefix,
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
            delay: Duration::ZERO,
        }
    }

    /// A splash stand-in: two-tone JPEG of the given size.
    pub fn jpeg(prefix: &'static str, width: u32, height: u32) -> Self {
        Self {
            prefix,
            status: 200,
            content_type: "image/jpeg",
            body: jpeg_bytes(width, height),
            delay: Duration::ZERO,
        }
    }

    /// Holds the response back for `delay`.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |_, y| {
        if y < height / 2 {
            Rgb([240, 220, 120])
        } else {
            Rgb([30, 40, 160])
        }
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

/// Paths requested so far, in order.
pub type Hits = Arc<Mutex<Vec<String>>>;

/// Serves `routes` until aborted. Unmatched paths get an empty 404.
pub async fn routing_server(routes: Vec<Route>) -> (String, Hits, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    let hits: Hits = Arc::default();
    let routes = Arc::new(routes);

    let server_hits = Arc::clone(&hits);
    let handle = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&server_hits);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or_default()
                    .to_string();
                hits.lock().unwrap().push(path.clone());

                let (status, content_type, body, delay) =
                    match routes.iter().find(|r| path.starts_with(r.prefix)) {
                        Some(r) => (r.status, r.content_type, r.body.clone(), r.delay),
                        None => (404, "text/plain", Vec::new(), Duration::ZERO),
                    };
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                let head = format!(
                    "HTTP/1.1 {status} Mock\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (url, hits, handle)
}
