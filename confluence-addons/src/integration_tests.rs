//! End-to-end aggregation tests driving the public entry points against
//! an instrumented transport.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use confluence_core::ConfluenceConfig;

    use crate::addons::{get_jackettio_streams, get_mediafusion_streams};
    use crate::errors::ConfigValidationError;
    use crate::token;
    use crate::transport::MockTransport;
    use crate::types::{
        JackettioOptions, MediaFusionOptions, ServiceConfig, ServiceId, StreamRequest,
    };

    fn movie() -> StreamRequest {
        StreamRequest::movie("tt0111161")
    }

    fn stream_body(url: &str) -> String {
        format!(
            r#"{{"streams":[{{"url":"{url}","name":"MediaFusion 1080p","description":"movie.mkv"}}]}}"#
        )
    }

    #[tokio::test]
    async fn test_jackettio_without_usable_service_fails_before_any_fetch() {
        let config = ConfluenceConfig::for_testing();
        let transport = Arc::new(MockTransport::new());

        let error = get_jackettio_streams(
            &config,
            &[],
            &JackettioOptions::default(),
            &movie(),
            "jackettio-test",
            transport.clone(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            error,
            ConfigValidationError::NoServiceEnabled {
                addon: "Jackettio".to_string(),
            }
        );
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mediafusion_without_usable_service_queries_anonymously() {
        let config = ConfluenceConfig::for_testing();
        let options = MediaFusionOptions::default();
        let transport = Arc::new(MockTransport::new());

        let result = get_mediafusion_streams(
            &config,
            &[],
            &options,
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();

        assert!(result.addon_streams.is_empty());
        assert!(result.addon_errors.is_empty());

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].url,
            "https://mediafusion.elfhosted.com/stream/movie/tt0111161.json"
        );

        let anonymous = token::build_mediafusion_token(&config.mediafusion, None, &options).unwrap();
        assert_eq!(calls[0].header("encoded_user_data"), Some(anonymous.as_str()));
    }

    #[tokio::test]
    async fn test_mediafusion_override_url_sends_empty_user_data() {
        let config = ConfluenceConfig::for_testing();
        let options = MediaFusionOptions {
            override_url: Some("https://my-mediafusion.example".to_string()),
            ..Default::default()
        };
        // Services are ignored on the override path, even broken ones
        let services = [ServiceConfig::with_api_key(ServiceId::RealDebrid, "")];
        let transport = Arc::new(MockTransport::new());

        get_mediafusion_streams(
            &config,
            &services,
            &options,
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].url,
            "https://my-mediafusion.example/stream/movie/tt0111161.json"
        );
        assert_eq!(calls[0].header("encoded_user_data"), Some(""));
    }

    #[tokio::test]
    async fn test_jackettio_override_url_skips_token_segment() {
        let config = ConfluenceConfig::for_testing();
        let options = JackettioOptions {
            override_url: Some("https://my-jackettio.example/".to_string()),
            ..Default::default()
        };
        let transport = Arc::new(MockTransport::new());

        get_jackettio_streams(
            &config,
            &[],
            &options,
            &movie(),
            "jackettio-test",
            transport.clone(),
        )
        .await
        .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].url,
            "https://my-jackettio.example/stream/movie/tt0111161.json"
        );
    }

    #[tokio::test]
    async fn test_mediafusion_fans_out_per_usable_service() {
        let config = ConfluenceConfig::for_testing();
        let options = MediaFusionOptions::default();
        let services = [
            ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key"),
            ServiceConfig {
                enabled: false,
                ..ServiceConfig::with_api_key(ServiceId::Premiumize, "pm-key")
            },
            ServiceConfig::with_api_key(ServiceId::AllDebrid, "ad-key"),
            ServiceConfig::with_api_key(ServiceId::Torbox, "tb-key"),
        ];
        let transport = Arc::new(MockTransport::new());

        get_mediafusion_streams(
            &config,
            &services,
            &options,
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);

        let mut tokens: Vec<String> = calls
            .iter()
            .map(|call| call.header("encoded_user_data").unwrap().to_string())
            .collect();
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 3, "each instance must carry its own token");

        for service in [&services[0], &services[2], &services[3]] {
            let expected =
                token::build_mediafusion_token(&config.mediafusion, Some(service), &options)
                    .unwrap();
            assert!(tokens.contains(&expected.as_str().to_string()));
        }
    }

    #[tokio::test]
    async fn test_jackettio_fans_out_with_token_path_segments() {
        let config = ConfluenceConfig::for_testing();
        let services = [
            ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key"),
            ServiceConfig::with_api_key(ServiceId::AllDebrid, "ad-key"),
            // Unsupported by Jackettio, filtered instead of failing
            ServiceConfig::with_api_key(ServiceId::Easynews, "en-key"),
        ];
        let transport = Arc::new(MockTransport::new());

        get_jackettio_streams(
            &config,
            &services,
            &JackettioOptions::default(),
            &movie(),
            "jackettio-test",
            transport.clone(),
        )
        .await
        .unwrap();

        let mut urls: Vec<String> = transport.calls().iter().map(|call| call.url.clone()).collect();
        urls.sort();

        let mut expected: Vec<String> = services[..2]
            .iter()
            .map(|service| {
                let token = token::build_jackettio_token(&config.jackettio, service).unwrap();
                format!("https://jackettio.elfhosted.com/{token}/stream/movie/tt0111161.json")
            })
            .collect();
        expected.sort();

        assert_eq!(urls, expected);
    }

    #[tokio::test]
    async fn test_prioritised_service_queries_only_that_instance() {
        let config = ConfluenceConfig::for_testing();
        let options = MediaFusionOptions {
            prioritise_service: Some(ServiceId::Torbox),
            ..Default::default()
        };
        let services = [
            ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key"),
            ServiceConfig::with_api_key(ServiceId::Torbox, "tb-key"),
        ];
        let transport = Arc::new(MockTransport::new());

        get_mediafusion_streams(
            &config,
            &services,
            &options,
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);

        let expected =
            token::build_mediafusion_token(&config.mediafusion, Some(&services[1]), &options)
                .unwrap();
        assert_eq!(calls[0].header("encoded_user_data"), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_prioritised_service_unsupported_is_fatal() {
        let config = ConfluenceConfig::for_testing();
        let options = JackettioOptions {
            prioritise_service: Some(ServiceId::PikPak),
            ..Default::default()
        };
        let services = [ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key")];
        let transport = Arc::new(MockTransport::new());

        let error = get_jackettio_streams(
            &config,
            &services,
            &options,
            &movie(),
            "jackettio-test",
            transport.clone(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            error,
            ConfigValidationError::UnsupportedService {
                addon: "Jackettio".to_string(),
                service: "pikpak".to_string(),
            }
        );
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_prioritised_service_not_configured_is_fatal() {
        let config = ConfluenceConfig::for_testing();
        let options = MediaFusionOptions {
            prioritise_service: Some(ServiceId::Torbox),
            ..Default::default()
        };
        let services = [ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key")];
        let transport = Arc::new(MockTransport::new());

        let error = get_mediafusion_streams(
            &config,
            &services,
            &options,
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            error,
            ConfigValidationError::ServiceNotConfigured {
                addon: "MediaFusion".to_string(),
                service: "torbox".to_string(),
            }
        );
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_fetch() {
        let config = ConfluenceConfig::for_testing();
        let services = [
            ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key"),
            ServiceConfig::with_api_key(ServiceId::AllDebrid, ""),
        ];
        let transport = Arc::new(MockTransport::new());

        let error = get_jackettio_streams(
            &config,
            &services,
            &JackettioOptions::default(),
            &movie(),
            "jackettio-test",
            transport.clone(),
        )
        .await
        .unwrap_err();

        assert_eq!(
            error,
            ConfigValidationError::MissingCredential {
                service: "alldebrid".to_string(),
                field: "api_key".to_string(),
            }
        );
        // The healthy sibling must not have been queried either
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_upstream_failure_keeps_successes() {
        let config = ConfluenceConfig::for_testing();
        let options = MediaFusionOptions::default();
        let services = [
            ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key"),
            ServiceConfig::with_api_key(ServiceId::AllDebrid, "ad-key"),
            ServiceConfig::with_api_key(ServiceId::Premiumize, "pm-key"),
            ServiceConfig::with_api_key(ServiceId::Torbox, "tb-key"),
            ServiceConfig::with_api_key(ServiceId::Offcloud, "oc-key"),
        ];

        let service_token = |service: &ServiceConfig| {
            token::build_mediafusion_token(&config.mediafusion, Some(service), &options)
                .unwrap()
                .as_str()
                .to_string()
        };

        // Three of five instances fail, each in a different way
        let transport = Arc::new(MockTransport::new());
        transport.respond_when(
            &service_token(&services[0]),
            200,
            &stream_body("https://mf.example/ok-rd"),
        );
        transport.respond_when(
            &service_token(&services[1]),
            200,
            &stream_body("https://mf.example/ok-ad"),
        );
        transport.fail_when(&service_token(&services[2]), "connection refused");
        transport.timeout_when(&service_token(&services[3]));
        transport.respond_when(&service_token(&services[4]), 502, "");

        let result = get_mediafusion_streams(
            &config,
            &services,
            &options,
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();

        assert_eq!(transport.call_count(), 5);

        let mut urls: Vec<&str> = result
            .addon_streams
            .iter()
            .map(|stream| stream.url.as_str())
            .collect();
        urls.sort();
        assert_eq!(urls, vec!["https://mf.example/ok-ad", "https://mf.example/ok-rd"]);

        assert_eq!(result.addon_errors.len(), 3);
        assert!(
            result
                .addon_errors
                .contains(&"MediaFusion request failed: connection refused".to_string())
        );
        assert!(result.addon_errors.contains(&"MediaFusion timed out".to_string()));
        assert!(result.addon_errors.contains(&"MediaFusion returned HTTP 502".to_string()));
    }

    #[tokio::test]
    async fn test_total_upstream_failure_still_returns_result() {
        let config = ConfluenceConfig::for_testing();
        let options = JackettioOptions {
            override_name: Some("My Jackettio".to_string()),
            ..Default::default()
        };
        let services = [
            ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key"),
            ServiceConfig::with_api_key(ServiceId::AllDebrid, "ad-key"),
        ];
        let transport = Arc::new(MockTransport::new());
        transport.respond_status(503);

        let result = get_jackettio_streams(
            &config,
            &services,
            &options,
            &movie(),
            "jackettio-test",
            transport.clone(),
        )
        .await
        .unwrap();

        assert!(result.addon_streams.is_empty());
        assert_eq!(
            result.addon_errors,
            vec![
                "My Jackettio returned HTTP 503".to_string(),
                "My Jackettio returned HTTP 503".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_upstream_body_is_folded_into_errors() {
        let config = ConfluenceConfig::for_testing();
        let transport = Arc::new(MockTransport::new());
        transport.respond_ok("<html>gateway error</html>");

        let result = get_mediafusion_streams(
            &config,
            &[],
            &MediaFusionOptions::default(),
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();

        assert!(result.addon_streams.is_empty());
        assert_eq!(result.addon_errors.len(), 1);
        assert!(result.addon_errors[0].contains("MediaFusion returned a malformed response"));
    }

    #[tokio::test]
    async fn test_effective_timeout_visible_on_the_wire() {
        // Global default applies when nothing else is set
        let config = ConfluenceConfig::for_testing();
        let transport = Arc::new(MockTransport::new());
        get_mediafusion_streams(
            &config,
            &[],
            &MediaFusionOptions::default(),
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();
        assert_eq!(transport.calls()[0].timeout, Duration::from_secs(2));

        // Caller request above the ceiling is clamped
        let options = MediaFusionOptions {
            timeout: Some(Duration::from_secs(90)),
            ..Default::default()
        };
        let transport = Arc::new(MockTransport::new());
        get_mediafusion_streams(
            &config,
            &[],
            &options,
            &movie(),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();
        assert_eq!(transport.calls()[0].timeout, Duration::from_secs(50));

        // Addon section default wins over the global default
        let mut config = ConfluenceConfig::for_testing();
        config.jackettio.timeout = Some(Duration::from_secs(5));
        let services = [ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key")];
        let transport = Arc::new(MockTransport::new());
        get_jackettio_streams(
            &config,
            &services,
            &JackettioOptions::default(),
            &movie(),
            "jackettio-test",
            transport.clone(),
        )
        .await
        .unwrap();
        assert_eq!(transport.calls()[0].timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_mediafusion_payload_normalization_end_to_end() {
        let body = r#"{
            "streams": [
                {
                    "url": "https://mf.example/play/1",
                    "name": "MediaFusion | ELF 1080p ⚡",
                    "description": "📂 Breaking.Bad.S01.1080p.BluRay┈➤ Breaking.Bad.S01E02.1080p.BluRay.mkv\n💾 2.3 GB 👤 87\n🇬🇧 + 🇫🇷",
                    "behaviorHints": {
                        "filename": "Breaking.Bad.S01E02.1080p.BluRay.mkv",
                        "videoSize": 2469606195
                    }
                },
                {
                    "name": "MediaFusion",
                    "description": "🚫 Content Warning: this title is unavailable"
                }
            ]
        }"#;

        let config = ConfluenceConfig::for_testing();
        let transport = Arc::new(MockTransport::new());
        transport.respond_ok(body);

        let result = get_mediafusion_streams(
            &config,
            &[],
            &MediaFusionOptions::default(),
            &StreamRequest::series("tt0903747:1:2"),
            "mediafusion-test",
            transport.clone(),
        )
        .await
        .unwrap();

        assert_eq!(result.addon_streams.len(), 1);
        let stream = &result.addon_streams[0];
        assert_eq!(stream.url, "https://mf.example/play/1");
        assert_eq!(
            stream.filename.as_deref(),
            Some("Breaking.Bad.S01E02.1080p.BluRay.mkv")
        );
        assert_eq!(
            stream.folder_name.as_deref(),
            Some("Breaking.Bad.S01.1080p.BluRay┈➤ Breaking.Bad.S01E02.1080p.BluRay.mkv")
        );
        assert_eq!(stream.size, Some(2_469_606_195));
        assert_eq!(stream.quality.as_deref(), Some("1080p"));
        assert_eq!(stream.seeders, Some(87));
        assert_eq!(stream.languages, vec!["English", "French"]);
        assert_eq!(stream.cached, Some(true));

        assert_eq!(
            result.addon_errors,
            vec!["🚫 Content Warning: this title is unavailable".to_string()]
        );
    }

    #[tokio::test]
    async fn test_jackettio_host_override_rewrites_returned_urls() {
        let mut config = ConfluenceConfig::for_testing();
        config.jackettio.force_protocol = Some("https".to_string());
        config.jackettio.force_hostname = Some("cdn.example".to_string());

        let services = [ServiceConfig::with_api_key(ServiceId::RealDebrid, "rd-key")];
        let transport = Arc::new(MockTransport::new());
        transport.respond_ok(&stream_body("http://10.0.0.5:8080/d/abc/file.mkv"));

        let result = get_jackettio_streams(
            &config,
            &services,
            &JackettioOptions::default(),
            &movie(),
            "jackettio-test",
            transport.clone(),
        )
        .await
        .unwrap();

        assert_eq!(result.addon_streams.len(), 1);
        assert_eq!(
            result.addon_streams[0].url,
            "https://cdn.example:8080/d/abc/file.mkv"
        );
    }
}
