//! A small release site on a local port: the listing, one details page, a
//! redirecting download link and the tarball it lands on.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const ARCHIVE_PATH: &str = "/files/code-stable-x64-1702462158.tar.gz";

/// `VSCode-linux-x64/bin/code` plus a resource file, gzipped.
pub fn vscode_tarball() -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
    for (path, body, mode) in [
        ("VSCode-linux-x64/bin/code", &b"#!/bin/sh\necho code\n"[..], 0o755),
        ("VSCode-linux-x64/resources/app/package.json", &b"{}"[..], 0o644),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(mode);
        header.set_cksum();
        builder.append_data(&mut header, path, body).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

struct Site {
    base: String,
    archive: Vec<u8>,
}

impl Site {
    fn respond(&self, method: &str, path: &str) -> Vec<u8> {
        // HEAD is refused so that link resolution has to use GET
        if method != "GET" {
            return response("405 Method Not Allowed", "text/plain", &[], b"");
        }

        match path {
            "/updates" => response("200 OK", "text/html", &[], self.listing().as_bytes()),
            "/updates/v1_85" | "/updates/v1_84" | "/updates/v1_83" => {
                response("200 OK", "text/html", &[], self.details(path).as_bytes())
            }
            p if p.ends_with("/stable") => {
                let location = format!("Location: {}{}", self.base, ARCHIVE_PATH);
                response("302 Found", "text/plain", &[&location], b"")
            }
            ARCHIVE_PATH => response("200 OK", "application/gzip", &[], &self.archive),
            _ => response("404 Not Found", "text/plain", &[], b"not found"),
        }
    }

    fn listing(&self) -> String {
        r#"<html><body><nav id="docs-navbar"><ul>
<li><a href="/updates/v1_85">November 2023</a></li>
<li><a href="/updates/v1_84">October 2023</a></li>
<li><a href="/updates/v1_83">September 2023</a></li>
</ul></nav></body></html>"#
            .to_string()
    }

    fn details(&self, path: &str) -> String {
        let build = match path {
            "/updates/v1_85" => "1.85.2",
            "/updates/v1_84" => "1.84.2",
            _ => "1.83.1",
        };
        let mut page = String::from("<p><strong>Downloads</strong>: Linux:");
        for target in ["linux-deb-x64", "linux-x64", "linux-arm64", "linux-armhf"] {
            page.push_str(&format!(
                r#" <a href="{}/{}/{}/stable">{}</a>"#,
                self.base, build, target, target
            ));
        }
        page.push_str("</p>");
        page
    }
}

fn response(status: &str, content_type: &str, headers: &[&str], body: &[u8]) -> Vec<u8> {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        content_type,
        body.len()
    );
    for header in headers {
        head.push_str(header);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// Starts the site on `127.0.0.1` and returns its base URL. The listing is
/// at `<base>/updates`.
pub async fn serve() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let site = Arc::new(Site {
        base: base.clone(),
        archive: vscode_tarball(),
    });

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let site = site.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let mut words = request.split_whitespace();
                let method = words.next().unwrap_or_default().to_string();
                let path = words.next().unwrap_or("/").to_string();

                let _ = stream.write_all(&site.respond(&method, &path)).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    base
}
