// Route table for the local dashboard API
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    get_preferences, health_check, live_snapshot, logs, select_series, set_capacity, set_mute,
    set_rate, toggle_mute, video,
};
use axum::Router;
use axum::routing::{get, post, put};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/live", get(live_snapshot))
        .route("/api/live/series", put(select_series))
        .route("/api/live/capacity", put(set_capacity))
        .route("/api/preferences", get(get_preferences))
        .route("/api/preferences/mute", post(toggle_mute).put(set_mute))
        .route("/api/preferences/rate", put(set_rate))
        .route("/api/logs", get(logs))
        .route("/api/video", get(video))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::live_view::tests::FakeSource;
    use crate::application::live_view::{LiveSettings, LiveView};
    use crate::application::log_view::LogView;
    use crate::application::polling::Liveness;
    use crate::application::speech::SpeechService;
    use crate::application::speech::tests::{RecordingAnnouncer, preferences};
    use crate::domain::telemetry::{Channel, EnviroSample};
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use std::time::Duration;

    struct TestServer {
        base: String,
        client: reqwest::Client,
        live_view: LiveView,
    }

    impl TestServer {
        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }
    }

    async fn serve() -> TestServer {
        let source = Arc::new(FakeSource::default());
        source.push_enviro(vec![
            EnviroSample::new(1, [Some(20.0), Some(1000.0), None, None, None, None, None]),
            EnviroSample::new(2, [Some(21.0), Some(1001.0), None, None, None, None, None]),
        ]);

        let prefs = preferences(true);
        let (announcer, _spoken) = RecordingAnnouncer::new();
        let speech = SpeechService::new(announcer, prefs.clone());
        let settings = LiveSettings {
            capacity: 30,
            series: vec![Channel::Temperature],
            imagery_rate: Duration::from_secs(1),
            cooldown_ms: 30_000,
            gauge_threshold: 10.0,
            no_signal_after: 3,
        };
        let live_view = LiveView::new(source.clone(), prefs.clone(), speech, settings).unwrap();
        live_view.enviro_cycle(&Liveness::detached()).await.unwrap();

        let state = Arc::new(AppState {
            live_view: live_view.clone(),
            log_view: LogView::new(source, 30),
            preferences: prefs,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        TestServer {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            live_view,
        }
    }

    #[tokio::test]
    async fn test_live_snapshot() {
        let server = serve().await;
        let body: Value = server
            .client
            .get(server.url("/api/live"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["cursor"], 2);
        assert_eq!(body["series"][0]["channel"], "temperature");
        assert_eq!(body["series"][0]["label"], "Temperature");
        assert_eq!(body["series"][0]["points"][1], json!({"id": 2, "value": 21.0}));
        assert_eq!(body["imagery_status"], "waiting");
    }

    #[tokio::test]
    async fn test_select_series_and_capacity() {
        let server = serve().await;

        let selected: Vec<Channel> = server
            .client
            .put(server.url("/api/live/series"))
            .json(&json!({"series": ["ammonia", "pressure"]}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(selected, vec![Channel::Pressure, Channel::Ammonia]);
        assert_eq!(server.live_view.selected_series(), selected);

        let response = server
            .client
            .put(server.url("/api/live/capacity"))
            .json(&json!({"capacity": 0}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], true);

        let response = server
            .client
            .put(server.url("/api/live/capacity"))
            .json(&json!({"capacity": 60}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(server.live_view.snapshot().capacity, 60);
    }

    #[tokio::test]
    async fn test_preferences() {
        let server = serve().await;

        let body: Value = server
            .client
            .post(server.url("/api/preferences/mute"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["muted"], false);

        for _ in 0..2 {
            let body: Value = server
                .client
                .put(server.url("/api/preferences/mute"))
                .json(&json!({"muted": true}))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            assert_eq!(body["muted"], true);
        }

        let response = server
            .client
            .put(server.url("/api/preferences/rate"))
            .json(&json!({"rate_ms": 10}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = server
            .client
            .put(server.url("/api/preferences/rate"))
            .json(&json!({"rate_ms": 250}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["rate_ms"], 250);
        assert_eq!(body["presets_ms"], json!([250, 500, 1000, 2000, 5000]));
    }

    #[tokio::test]
    async fn test_logs_and_video() {
        let server = serve().await;

        let response = server
            .client
            .get(server.url("/api/logs?start=nine"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = server
            .client
            .get(server.url("/api/logs?start=09:00&end=10:00&limit=5"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["start"], "09:00");
        assert_eq!(body["rows"], json!([]));

        let body: Value = server
            .client
            .get(server.url("/api/video"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["url"], "http://rover.local:5000/video");

        let health = server
            .client
            .get(server.url("/healthz"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(health, "ok");
    }
}
