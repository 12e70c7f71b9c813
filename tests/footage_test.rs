//! HTTP-level tests for the footage, page, door and API routes.
//!
//! Requests go through the full router via `oneshot`; the transcoder is a
//! shell script that concatenates its inputs, so bodies can be compared
//! byte for byte with the archive content.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use common::{segment_bytes, TestHarness, ROUTE};
use dashreel_common::CameraType;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn get(harness: &TestHarness, uri: &str) -> Response {
    harness
        .router()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_to_string(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Validation happens before the archive or the transcoder is touched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_length_route_is_not_found_without_side_effects() {
    let harness = TestHarness::new();
    harness.add_route(2, 64, CameraType::FCamera);

    for uri in [
        "/footage/full/fcamera/SHORT",
        "/footage/full/fcamera/AAAAAAAA--AAAAAAAAAAA",
        "/footage/AAAA",
    ] {
        let response = get(&harness, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_to_string(response).await, "route not found", "{uri}");
    }

    assert_eq!(harness.archive_calls(), 0);
    assert!(harness.spawned_pids().is_empty());
}

#[tokio::test]
async fn unknown_route_of_valid_shape_is_not_found() {
    let harness = TestHarness::new();

    let response = get(&harness, "/footage/full/fcamera/AAAAAAAAAAAAAAAAAAAA").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_string(response).await, "route not found");
    assert!(harness.spawned_pids().is_empty());
}

#[tokio::test]
async fn invalid_segment_is_rejected_before_any_lookup() {
    let harness = TestHarness::new();
    harness.add_route(1, 64, CameraType::FCamera);

    for segment in ["not-a-segment", "a--b", "a--b--x", "a%2F..--b--0", "..", "a--b--01"] {
        let response = get(&harness, &format!("/footage/fcamera/{segment}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{segment}");
        assert_eq!(body_to_string(response).await, "invalid segment", "{segment}");
    }

    assert_eq!(harness.archive_calls(), 0);
    assert!(harness.spawned_pids().is_empty());
}

#[tokio::test]
async fn invalid_camera_is_rejected() {
    let harness = TestHarness::new();
    harness.add_route(1, 64, CameraType::FCamera);

    let response = get(&harness, &format!("/footage/full/webcam/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_string(response).await, "invalid camera type");

    let response = get(&harness, &format!("/footage/rcamera/{ROUTE}--0")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_to_string(response).await, "invalid camera type");

    assert_eq!(harness.archive_calls(), 0);
    assert!(harness.spawned_pids().is_empty());
}

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_route_concatenates_segments_in_order() {
    let harness = TestHarness::new();
    let expected = harness.add_route(3, 4096, CameraType::FCamera);

    let response = get(&harness, &format!("/footage/full/fcamera/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let body = body_bytes(response).await;
    assert_eq!(body.len(), expected.len());
    assert!(body == expected, "segments out of order");

    let pids = harness.spawned_pids();
    assert_eq!(pids.len(), 1);
    assert!(common::wait_until_gone(pids[0], Duration::from_secs(2)).await);
}

#[tokio::test]
async fn route_suffix_id_streams_its_segments_in_order() {
    let harness = TestHarness::new();
    let suffix = "AAAAAAAAAAAAAAAAAAAA";
    let mut expected = Vec::new();
    for i in 0..3 {
        let data = segment_bytes(CameraType::FCamera, i, 2048);
        harness.add_segment(
            &format!("00000010--{suffix}--{i}"),
            &[("fcamera.hevc", &data), ("qcamera.ts", b"ts")],
        );
        expected.extend(data);
    }

    let response = get(&harness, &format!("/footage/full/fcamera/{suffix}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await == expected);

    let pids = harness.spawned_pids();
    assert_eq!(pids.len(), 1);
    assert!(common::wait_until_gone(pids[0], Duration::from_secs(2)).await);
}

#[tokio::test]
async fn full_route_orders_indexes_numerically() {
    let harness = TestHarness::new();
    let mut expected = Vec::new();
    for i in [0u32, 1, 2, 9, 10, 11] {
        let data = segment_bytes(CameraType::QCamera, i, 32);
        harness.add_segment(&format!("{ROUTE}--{i}"), &[("qcamera.ts", &data)]);
        expected.extend(data);
    }

    let response = get(&harness, &format!("/footage/full/qcamera/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await == expected);
}

#[tokio::test]
async fn qcamera_streams_transport_stream_files() {
    let harness = TestHarness::new();
    let expected = harness.add_route(2, 512, CameraType::QCamera);

    let response = get(&harness, &format!("/footage/full/qcamera/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await == expected);
}

#[tokio::test]
async fn chunk_size_does_not_change_the_bytes() {
    let harness = TestHarness::new();
    let expected = harness.add_route(3, 10_000, CameraType::DCamera);

    let small = body_bytes(get(&harness, &format!("/footage/full/dcamera/{ROUTE}?chunk_size=64")).await).await;
    let default = body_bytes(get(&harness, &format!("/footage/full/dcamera/{ROUTE}")).await).await;

    assert!(small == expected);
    assert!(default == expected);
}

#[tokio::test]
async fn segments_missing_the_camera_are_skipped() {
    let harness = TestHarness::new();
    let first = segment_bytes(CameraType::ECamera, 0, 128);
    let third = segment_bytes(CameraType::ECamera, 2, 128);
    harness.add_segment(&format!("{ROUTE}--0"), &[("ecamera.hevc", &first)]);
    harness.add_segment(&format!("{ROUTE}--1"), &[("qcamera.ts", b"ts")]);
    harness.add_segment(&format!("{ROUTE}--2"), &[("ecamera.hevc", &third)]);

    let response = get(&harness, &format!("/footage/full/ecamera/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await == [first, third].concat());
}

#[tokio::test]
async fn single_segment_streams_one_file() {
    let harness = TestHarness::new();
    harness.add_route(3, 256, CameraType::FCamera);

    let response = get(&harness, &format!("/footage/fcamera/{ROUTE}--1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(&format!("{ROUTE}--1-fcamera.mp4")));

    assert!(body_bytes(response).await == segment_bytes(CameraType::FCamera, 1, 256));
}

#[tokio::test]
async fn missing_camera_file_is_footage_not_found() {
    let harness = TestHarness::new();
    harness.add_segment(&format!("{ROUTE}--0"), &[("qcamera.ts", b"ts")]);

    let response = get(&harness, &format!("/footage/dcamera/{ROUTE}--0")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_string(response).await, "footage not found");

    let response = get(&harness, &format!("/footage/full/dcamera/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_string(response).await, "footage not found");

    assert!(harness.spawned_pids().is_empty());
}

#[tokio::test]
async fn unspawnable_transcoder_is_a_server_error() {
    let harness = TestHarness::with_missing_transcoder();
    harness.add_route(1, 64, CameraType::FCamera);

    let response = get(&harness, &format!("/footage/full/fcamera/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_to_string(response).await, "transcoder unavailable");
}

#[tokio::test]
async fn transcoder_failing_before_output_is_a_server_error() {
    let harness = TestHarness::with_transcoder("echo 'bad input' >&2\nexit 1");
    harness.add_route(1, 64, CameraType::FCamera);

    let response = get(&harness, &format!("/footage/full/fcamera/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_to_string(response).await, "stream failed");

    let pids = harness.spawned_pids();
    assert_eq!(pids.len(), 1);
    assert!(common::wait_until_gone(pids[0], Duration::from_secs(2)).await);
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn route_list_page_links_routes() {
    let harness = TestHarness::new();
    harness.add_route(1, 16, CameraType::QCamera);
    harness.add_segment("BBBBBBBB--BBBBBBBBBB--0", &[("qcamera.ts", b"x")]);

    let response = get(&harness, "/footage").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response).await;

    let newer = html.find("BBBBBBBB--BBBBBBBBBB").unwrap();
    let older = html.find(ROUTE).unwrap();
    assert!(newer < older, "routes should be listed newest first");
    assert!(html.contains(&format!(r#"href="/footage/{ROUTE}""#)));
}

#[tokio::test]
async fn route_page_embeds_player_for_requested_segment() {
    let harness = TestHarness::new();
    harness.add_route(3, 16, CameraType::FCamera);

    let response = get(&harness, &format!("/footage/{ROUTE}?2,fcamera")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response).await;
    assert!(html.contains("index: 2,"));
    assert!(html.contains("'/footage/fcamera/'"));
    assert!(html.contains(&format!("'{ROUTE}--2'")));
    assert!(html.contains(&format!("/footage/full/fcamera/{ROUTE}")));

    let response = get(&harness, &format!("/footage/{ROUTE}?0,webcam")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn route_page_for_unknown_route_is_not_found() {
    let harness = TestHarness::new();

    let response = get(&harness, "/footage/CCCCCCCC--CCCCCCCCCC").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_to_string(response).await, "route not found");
}

#[tokio::test]
async fn index_and_health() {
    let harness = TestHarness::new();

    let response = get(&harness, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response).await;
    assert!(html.contains(r#"href="/footage""#));
    assert!(html.contains(r#"href="/lock""#));

    let response = get(&harness, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_string(response).await, "ok");
}

// ---------------------------------------------------------------------------
// Door lock
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lock_and_unlock_write_the_parameter() {
    let harness = TestHarness::new();
    let param = harness.params_dir().join("RemoteLockDoors");

    let response = get(&harness, "/lock").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_string(response).await, "locked");
    assert_eq!(std::fs::read_to_string(&param).unwrap(), "1");

    let response = get(&harness, "/unlock").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_to_string(response).await, "unlocked");
    assert_eq!(std::fs::read_to_string(&param).unwrap(), "0");
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn api_lists_routes_and_segments() {
    let harness = TestHarness::new();
    harness.add_route(2, 16, CameraType::FCamera);
    harness.add_segment(&format!("{ROUTE}--2"), &[("qcamera.ts", b"x")]);

    let response = get(&harness, "/api/routes").await;
    assert_eq!(response.status(), StatusCode::OK);
    let routes: serde_json::Value = serde_json::from_str(&body_to_string(response).await).unwrap();
    assert_eq!(routes, serde_json::json!([ROUTE]));

    let response = get(&harness, &format!("/api/routes/{ROUTE}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail: serde_json::Value = serde_json::from_str(&body_to_string(response).await).unwrap();
    assert_eq!(detail["route"], ROUTE);

    let segments = detail["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0]["id"], format!("{ROUTE}--0"));
    assert_eq!(segments[2]["index"], 2);
    assert_eq!(segments[2]["cameras"], serde_json::json!(["qcamera"]));
    assert_eq!(segments[0]["cameras"].as_array().unwrap().len(), 4);

    let response = get(&harness, "/api/routes/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
