//! Network tests for opened HTTP data sources
//!
//! A loopback `TcpListener` plays the media server, so these tests check the
//! request that actually goes out on the wire: headers, ranges, status
//! mapping and the redirect policy.

#[cfg(test)]
mod tests {
    use super::super::data_source::*;
    use super::super::error_handling::DataSourceError;
    use crate::utils::network::MAX_REDIRECTS;
    use futures_util::StreamExt;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::{mpsc, oneshot};
    use tokio_test::assert_ok;

    /// Start a server answering every request with `respond(request_head)`.
    /// Received request heads are forwarded on the returned channel.
    async fn spawn_server<F>(respond: F) -> (SocketAddr, mpsc::UnboundedReceiver<String>)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let respond = Arc::new(respond);

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let tx = tx.clone();
                let respond = Arc::clone(&respond);
                tokio::spawn(async move {
                    let head = read_head(&mut socket).await;
                    let response = respond(&head);
                    let _ = tx.send(head);
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        (addr, rx)
    }

    async fn read_head(socket: &mut TcpStream) -> String {
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
            if head.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        String::from_utf8_lossy(&head).into_owned()
    }

    fn header_values(head: &str, name: &str) -> Vec<String> {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .filter(|(key, _)| key.trim().eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim().to_string())
            .collect()
    }

    fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\n{extra_headers}Connection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn ok_response(body: &'static str) -> impl Fn(&str) -> String + Send + Sync + 'static {
        move |_| http_response("200 OK", "", body)
    }

    #[tokio::test]
    async fn test_configured_user_agent_is_sent() {
        let (addr, mut requests) = spawn_server(ok_response("ok")).await;

        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), "FromHeaders/1".to_string());
        headers.insert("X-Token".to_string(), "t".to_string());
        let factory = build_data_source_factory(Some("Resolved/1".to_string()), Some(&headers));
        let source = assert_ok!(factory.create_data_source());
        let uri = format!("http://{addr}/video.mp4");

        assert_ok!(source.open(&DataSpec::new(uri.as_str())).await);
        let head = requests.recv().await.unwrap();
        assert_eq!(header_values(&head, "user-agent"), vec!["Resolved/1"]);
        assert_eq!(header_values(&head, "x-token"), vec!["t"]);

        assert_ok!(
            source
                .open(&DataSpec::new(uri.as_str()).with_header("User-Agent", "PerRequest/1"))
                .await
        );
        let head = requests.recv().await.unwrap();
        assert_eq!(header_values(&head, "user-agent"), vec!["Resolved/1"]);
        assert_eq!(factory.user_agent(), Some("Resolved/1"));
    }

    #[tokio::test]
    async fn test_header_user_agent_sent_when_none_configured() {
        let (addr, mut requests) = spawn_server(ok_response("ok")).await;

        let mut headers = HashMap::new();
        headers.insert("user-agent".to_string(), "FromHeaders/1".to_string());
        let source = assert_ok!(build_data_source_factory(None, Some(&headers)).create_data_source());

        assert_ok!(source.open(&DataSpec::new(format!("http://{addr}/a.mp4"))).await);
        let head = requests.recv().await.unwrap();
        assert_eq!(header_values(&head, "user-agent"), vec!["FromHeaders/1"]);
    }

    #[tokio::test]
    async fn test_open_reads_body_and_sends_range() {
        let (addr, mut requests) =
            spawn_server(|_| http_response("206 Partial Content", "", "0123456789")).await;
        let source = assert_ok!(build_data_source_factory(None, None).create_data_source());

        let opened = assert_ok!(
            source
                .open(&DataSpec::new(format!("http://{addr}/clip.ts")).with_range(100, Some(10)))
                .await
        );
        assert_eq!(opened.status(), 206);
        assert_eq!(opened.content_length(), Some(10));
        assert_eq!(opened.url().path(), "/clip.ts");

        let body = assert_ok!(opened.read_to_end().await);
        assert_eq!(&body[..], b"0123456789");

        let head = requests.recv().await.unwrap();
        assert!(head.starts_with("GET /clip.ts HTTP/1.1"));
        assert_eq!(header_values(&head, "range"), vec!["bytes=100-109"]);
    }

    #[tokio::test]
    async fn test_bytes_stream_yields_whole_body() {
        let (addr, _requests) = spawn_server(ok_response("#EXTM3U\n#EXT-X-ENDLIST\n")).await;
        let source = assert_ok!(build_data_source_factory(None, None).create_data_source());
        let opened = assert_ok!(source.open(&DataSpec::new(format!("http://{addr}/index.m3u8"))).await);

        let mut stream = Box::pin(opened.bytes_stream());
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&assert_ok!(chunk));
        }
        assert_eq!(collected, b"#EXTM3U\n#EXT-X-ENDLIST\n");
    }

    #[tokio::test]
    async fn test_open_maps_error_statuses() {
        let (addr, _requests) = spawn_server(|head: &str| {
            if head.starts_with("GET /missing") {
                http_response("404 Not Found", "", "")
            } else {
                http_response("416 Range Not Satisfiable", "", "")
            }
        })
        .await;
        let source = assert_ok!(build_data_source_factory(None, None).create_data_source());

        let missing = source
            .open(&DataSpec::new(format!("http://{addr}/missing.mp4")))
            .await;
        assert!(matches!(missing, Err(DataSourceError::HttpStatus { status: 404 })));

        let past_end = source
            .open(&DataSpec::new(format!("http://{addr}/v.mp4")).with_range(10, None))
            .await;
        assert!(matches!(
            past_end,
            Err(DataSourceError::PositionOutOfRange { position: 10 })
        ));

        let from_start = source
            .open(&DataSpec::new(format!("http://{addr}/v.mp4")).with_range(0, Some(5)))
            .await;
        assert!(matches!(
            from_start,
            Err(DataSourceError::HttpStatus { status: 416 })
        ));
    }

    #[tokio::test]
    async fn test_open_maps_server_error_as_retryable() {
        let (addr, _requests) =
            spawn_server(|_| http_response("503 Service Unavailable", "", "")).await;
        let source = assert_ok!(build_data_source_factory(None, None).create_data_source());

        let err = source
            .open(&DataSpec::new(format!("http://{addr}/v.mp4")))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_redirect_chain_is_capped() {
        let (addr, mut requests) =
            spawn_server(|_| http_response("302 Found", "Location: /loop\r\n", "")).await;
        let source = assert_ok!(build_data_source_factory(None, None).create_data_source());

        let err = source
            .open(&DataSpec::new(format!("http://{addr}/start")))
            .await
            .unwrap_err();
        match err {
            DataSourceError::Client(e) => assert!(e.is_redirect()),
            other => panic!("unexpected error: {other:?}"),
        }

        let mut received = 0;
        while requests.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, MAX_REDIRECTS + 1);
    }

    #[tokio::test]
    async fn test_same_protocol_redirect_is_followed() {
        let (addr, _requests) = spawn_server(|head: &str| {
            if head.starts_with("GET /old") {
                http_response("302 Found", "Location: /new.mp4\r\n", "")
            } else {
                http_response("200 OK", "", "moved")
            }
        })
        .await;

        let mut config = build_data_source_factory(None, None).config().clone();
        config.allow_cross_protocol_redirects = false;
        let source = assert_ok!(HttpDataSourceFactory::new(config).create_data_source());

        let opened = assert_ok!(source.open(&DataSpec::new(format!("http://{addr}/old.mp4"))).await);
        assert_eq!(opened.url().path(), "/new.mp4");
        assert_eq!(&assert_ok!(opened.read_to_end().await)[..], b"moved");
    }

    /// Listener standing in for an https endpoint; reports the first byte it receives.
    async fn spawn_tls_listener() -> (SocketAddr, oneshot::Receiver<u8>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                if let Ok(byte) = socket.read_u8().await {
                    let _ = tx.send(byte);
                }
            }
        });
        (addr, rx)
    }

    #[tokio::test]
    async fn test_cross_protocol_redirect_is_followed_by_default() {
        let (tls_addr, first_byte) = spawn_tls_listener().await;
        let location = format!("Location: https://{tls_addr}/secure.mp4\r\n");
        let (addr, _requests) =
            spawn_server(move |_| http_response("302 Found", &location, "")).await;

        let source = assert_ok!(build_data_source_factory(None, None).create_data_source());
        let result = source
            .open(&DataSpec::new(format!("http://{addr}/v.mp4")))
            .await;

        // The loopback endpoint cannot complete a handshake, but the client must have tried.
        assert!(matches!(result, Err(DataSourceError::Client(_))));
        // 0x16 is a TLS handshake record
        assert_eq!(first_byte.await.unwrap(), 0x16);
    }

    #[tokio::test]
    async fn test_cross_protocol_redirect_stops_when_disallowed() {
        let (tls_addr, _first_byte) = spawn_tls_listener().await;
        let location = format!("Location: https://{tls_addr}/secure.mp4\r\n");
        let (addr, mut requests) =
            spawn_server(move |_| http_response("302 Found", &location, "")).await;

        let mut config = build_data_source_factory(None, None).config().clone();
        config.allow_cross_protocol_redirects = false;
        let source = assert_ok!(HttpDataSourceFactory::new(config).create_data_source());

        let result = source
            .open(&DataSpec::new(format!("http://{addr}/v.mp4")))
            .await;
        assert!(matches!(result, Err(DataSourceError::HttpStatus { status: 302 })));

        assert!(requests.recv().await.is_some());
        assert!(requests.try_recv().is_err());
    }
}
