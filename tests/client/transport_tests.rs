// tests/client/transport_tests.rs

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddrV4};
    use std::sync::Arc;
    use std::time::Duration;

    use qserv_client::client::transport::{url_encode, HttpPost};
    use qserv_client::client::{
        AddressCache, ClientConfig, HttpPostFactory, QueryClient, QueryContext, Transport,
        TransportTarget,
    };
    use tokio::runtime::Handle;
    use tokio::time::{sleep, timeout};
    use tracing::info;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::mock_transport::test_platform;

    const POLL: Duration = Duration::from_millis(10);
    const LIMIT: Duration = Duration::from_secs(10);

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
    }

    // 启动返回固定应答的 qserv 模拟服务器
    async fn start_qserv(route: &str, body: String) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        server
    }

    fn http_context(config: ClientConfig, cache: AddressCache) -> QueryContext {
        let factory = HttpPostFactory::from_current(&config).unwrap();
        QueryContext::new(config.shared(), Arc::new(factory))
            .with_cache(cache)
            .with_platform(test_platform())
    }

    async fn wait_transport(transport: &dyn Transport) {
        timeout(LIMIT, async {
            while !transport.is_done() {
                sleep(POLL).await;
            }
        })
        .await
        .expect("transport should finish");
    }

    #[test]
    fn test_url_encode_round_trip() {
        let samples = [
            "info/language 3\n",
            "player/name Zoë & co=100%",
            "tab\there+plus",
            "",
        ];

        for sample in samples {
            let encoded = url_encode(sample);
            assert!(!encoded.contains(' '));
            assert!(!encoded.contains('\n'));

            let body = format!("v={}", encoded);
            let decoded = url::form_urlencoded::parse(body.as_bytes())
                .next()
                .map(|(_, value)| value.into_owned())
                .unwrap();
            assert_eq!(decoded, sample);
        }
    }

    #[test]
    fn test_url_encode_form_rules() {
        assert_eq!(url_encode("info/language 0\n"), "info%2Flanguage+0%0A");
        assert_eq!(url_encode("a-b_c.d*"), "a-b_c.d*");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_query_against_mock_server() {
        init_tracing();
        info!("Starting test: test_query_against_mock_server");

        let server = start_qserv(
            "/cgi-bin/qserv.pl",
            "OK\nplayer/name Bob\nplayer/score 12\n".to_string(),
        )
        .await;

        let config = ClientConfig {
            game_server_address: format!("{}/cgi-bin/qserv.pl", server.uri()),
            ..ClientConfig::default()
        };
        let cache = AddressCache::new();
        let ctx = http_context(config, cache.clone());

        let mut client = QueryClient::new(&ctx);
        client.add_field("request gamelist\n");
        client.send();
        timeout(LIMIT, client.wait(POLL)).await.expect("query should finish");

        assert_eq!(client.status(), Some("OK"));
        let player = client.reply().unwrap().sub("player");
        assert_eq!(player.lookup("name"), Some("Bob"));
        assert_eq!(player.lookup("score"), Some("12"));

        // 成功后缓存实际连接的地址
        let port = server.address().port();
        assert_eq!(cache.get(), Some(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body = String::from_utf8(requests[0].body.clone()).unwrap();
        assert!(body.starts_with("data=request+gamelist%0A"));
        assert!(body.contains("info%2Flanguage+0%0A"));
        assert!(body.ends_with("info%2Fplatform%2Fdisplay+None%0A"));
        info!("Test completed: test_query_against_mock_server");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_form_content_type_is_sent() {
        init_tracing();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK\n"))
            .mount(&server)
            .await;

        let config = ClientConfig {
            game_server_address: server.uri(),
            ..ClientConfig::default()
        };
        let mut client = QueryClient::new(&http_context(config, AddressCache::new()));
        client.send();
        timeout(LIMIT, client.wait(POLL)).await.unwrap();

        assert_eq!(client.status(), Some("OK"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_redirect_between_mock_servers() {
        init_tracing();
        info!("Starting test: test_redirect_between_mock_servers");

        let target = start_qserv("/qserv", "OK\nwelcome 1\n".to_string()).await;
        let location = format!("{}/qserv", target.uri());
        let origin = start_qserv(
            "/cgi-bin/qserv.pl",
            format!("Redirect permanent\nlocation {}\n", location),
        )
        .await;

        let config = ClientConfig {
            game_server_address: format!("{}/cgi-bin/qserv.pl", origin.uri()),
            ..ClientConfig::default()
        };
        let ctx = http_context(config, AddressCache::new());

        let mut client = QueryClient::new(&ctx);
        client.add_field("request motd\n");
        client.send();
        timeout(LIMIT, client.wait(POLL)).await.unwrap();

        assert_eq!(client.status(), Some("OK"));
        assert_eq!(client.reply().unwrap().lookup("welcome"), Some("1"));
        assert_eq!(client.redirects(), 1);
        assert_eq!(ctx.config.read().unwrap().game_server_address, location);

        // 重定向目标收到与原请求完全相同的请求体
        let first = origin.received_requests().await.unwrap();
        let second = target.received_requests().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].body, second[0].body);
        info!("Test completed: test_redirect_between_mock_servers");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unreachable_server_finishes_without_status() {
        init_tracing();

        // 绑定后立即释放，得到一个没有监听者的端口
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let config = ClientConfig {
            game_server_address: format!("http://127.0.0.1:{}/cgi-bin/qserv.pl", port),
            http_client: qserv_client::client::config::HttpClientConfig {
                timeout: 2,
                ..Default::default()
            },
            ..ClientConfig::default()
        };
        let cache = AddressCache::new();
        let mut client = QueryClient::new(&http_context(config, cache.clone()));
        client.send();
        timeout(LIMIT, client.wait(POLL)).await.unwrap();

        assert!(client.status().is_none());
        assert!(client.reply().unwrap().is_empty());
        assert_eq!(client.received_count(), 0);
        assert!(!cache.is_armed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pinned_address_skips_name_resolution() {
        init_tracing();
        let server = start_qserv("/cgi-bin/qserv.pl", "OK\n".to_string()).await;
        let port = server.address().port();

        let target = TransportTarget {
            host: "qserv.invalid".to_string(),
            port,
            path: "/cgi-bin/qserv.pl".to_string(),
            proxied: false,
            pinned: Some(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)),
        };
        let mut transport = HttpPost::new(&target, Handle::current(), LIMIT, "qserv-test");
        assert_eq!(
            transport.url(),
            format!("http://qserv.invalid:{}/cgi-bin/qserv.pl", port)
        );

        transport.add_raw_data(b"data=");
        transport.send();
        wait_transport(&transport).await;

        assert!(transport.received_size() > 0);
        assert_eq!(transport.host_addr(), Some(Ipv4Addr::LOCALHOST));
        assert_eq!(transport.host_port(), port);
        assert_eq!(transport.sent_data(), b"data=".to_vec());

        let buffer = String::from_utf8(transport.buffer()).unwrap();
        assert!(buffer.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(buffer.ends_with("\r\n\r\nOK\n"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_proxied_request_uses_absolute_url() {
        init_tracing();
        let proxy = start_qserv("/cgi-bin/qserv.pl", "OK\n".to_string()).await;

        let target = TransportTarget {
            host: "127.0.0.1".to_string(),
            port: proxy.address().port(),
            path: "http://game.example:80/cgi-bin/qserv.pl".to_string(),
            proxied: true,
            pinned: None,
        };
        let mut transport = HttpPost::new(&target, Handle::current(), LIMIT, "qserv-test");
        assert_eq!(transport.url(), "http://game.example:80/cgi-bin/qserv.pl");

        transport.add_raw_data(b"data=");
        transport.send();
        wait_transport(&transport).await;

        assert!(transport.received_size() > 0);
        let requests = proxy.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, b"data=".to_vec());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unsent_transport_reports_nothing() {
        let target = TransportTarget {
            host: "127.0.0.1".to_string(),
            port: 9,
            path: "/".to_string(),
            proxied: false,
            pinned: None,
        };
        let transport = HttpPost::new(&target, Handle::current(), LIMIT, "qserv-test");

        assert!(!transport.is_done());
        assert!(!transport.is_connected());
        assert_eq!(transport.received_size(), 0);
        assert_eq!(transport.host_addr(), Some(Ipv4Addr::LOCALHOST));
        assert_eq!(transport.host_port(), 9);
    }
}
