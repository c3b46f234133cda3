// tests/client/endpoint_tests.rs

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, SocketAddrV4};

    use qserv_client::client::address::ServerAddress;
    use qserv_client::client::endpoint::{resolve_endpoint, ResolvedTarget};
    use qserv_client::client::ClientConfig;

    fn resolve(primary: &str, fallback: &str, proxy: &str) -> ResolvedTarget {
        resolve_endpoint(
            &ServerAddress::parse(primary),
            &ServerAddress::parse(fallback),
            &ServerAddress::parse(proxy),
        )
    }

    #[test]
    fn test_all_empty_uses_builtin_defaults() {
        let target = resolve("", "", "");
        assert_eq!(target.host, "quadra.sourceforge.net");
        assert_eq!(target.port, 80);
        assert_eq!(target.path, "/cgi-bin/qserv.pl");
        assert!(!target.proxied);
        assert_eq!(target.server.scheme(), "http");
    }

    #[test]
    fn test_primary_inherits_missing_parts_from_fallback() {
        let target = resolve("", "http://fallback.example:8000/q.pl", "");
        assert_eq!(target.host, "fallback.example");
        assert_eq!(target.port, 8000);
        assert_eq!(target.path, "/q.pl");

        // 主地址只给了主机，端口与路径来自缺省层
        let target = resolve("primary.example", "http://fallback.example:8000/q.pl", "");
        assert_eq!(target.host, "primary.example");
        assert_eq!(target.port, 8000);
        assert_eq!(target.path, "/q.pl");
    }

    #[test]
    fn test_primary_overrides_fallback() {
        let target = resolve(
            "http://primary.example:9000/cgi",
            "http://fallback.example:8000/q.pl",
            "",
        );
        assert_eq!(target.host, "primary.example");
        assert_eq!(target.port, 9000);
        assert_eq!(target.path, "/cgi");
    }

    #[test]
    fn test_proxy_uses_full_url_as_path() {
        let target = resolve("http://game.example/cgi", "", "proxy.local");
        assert!(target.proxied);
        assert_eq!(target.host, "proxy.local");
        assert_eq!(target.port, 80);
        assert_eq!(target.path, "http://game.example:80/cgi");
        assert_eq!(target.server.host(), "game.example");
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            game_server_address: "game.example:8080".to_string(),
            proxy_address: "proxy.local:3128".to_string(),
            ..ClientConfig::default()
        };
        let target = ResolvedTarget::from_config(&config);
        assert_eq!(target.host, "proxy.local");
        assert_eq!(target.port, 3128);
        assert_eq!(target.path, "http://game.example:8080/cgi-bin/qserv.pl");
    }

    #[test]
    fn test_transport_target_applies_cache() {
        let target = resolve("http://game.example:8080/cgi", "", "");

        let plain = target.transport_target(None);
        assert_eq!(plain.host, "game.example");
        assert_eq!(plain.port, 8080);
        assert_eq!(plain.pinned, None);

        let cached = SocketAddrV4::new(Ipv4Addr::new(192, 0, 2, 10), 8081);
        let pinned = target.transport_target(Some(cached));
        assert_eq!(pinned.host, "game.example");
        assert_eq!(pinned.port, 8081);
        assert_eq!(pinned.path, "/cgi");
        assert_eq!(pinned.pinned, Some(cached));
    }
}
