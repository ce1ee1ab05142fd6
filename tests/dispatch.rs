//! End-to-end dispatch tests for the request runtime.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Method, Request, Response, StatusCode};
use parking_lot::Mutex;
use serde_json::json;
use strata::{
    App, AppConfig, CacheOptions, CookieOptions, Error, HandlerOutcome, Middleware, Mode, Next,
    RequestContext, Route, RouteModule,
};

mod common;

use common::PatternMatcher;

fn app_with_route(pattern: &str, module: RouteModule) -> App {
    let mut app = App::new(AppConfig::default());
    let route = Route::new("test-route", pattern).with_module(module);
    app.set_routes(vec![route.clone()]);
    app.set_route_matcher(PatternMatcher::new(vec![route]));
    app
}

fn json_loader() -> RouteModule {
    RouteModule::default().with_loader(strata::handler(|args| async move {
        Ok(HandlerOutcome::Data(json!({"id": args.params["id"]})))
    }))
}

#[tokio::test]
async fn loader_data_is_served_as_json_when_accepted() {
    let app = app_with_route("/users/:id", json_loader());
    let response = app.handle(common::get_json("/users/42")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(common::body_string(response).await, "{\"id\":\"42\"}");
}

#[tokio::test]
async fn page_requests_get_the_render_envelope() {
    let app = app_with_route("/users/:id", json_loader());
    let response = app.handle(common::get("/users/7")).await;
    assert_eq!(
        common::body_json(response).await,
        json!({"loaderData": {"id": "7"}, "params": {"id": "7"}})
    );
}

#[tokio::test]
async fn missing_loader_yields_null_data() {
    let app = app_with_route("/empty", RouteModule::default());
    let response = app.handle(common::get_json("/empty")).await;
    assert_eq!(common::body_string(response).await, "null");
}

#[tokio::test]
async fn post_without_action_is_method_not_allowed() {
    let app = app_with_route("/items", json_loader());
    let response = app.handle(common::post("/items")).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(common::body_string(response).await, "Method Not Allowed");
}

#[tokio::test]
async fn action_handles_non_get_methods() {
    let module = RouteModule::default().with_action(strata::handler(|args| async move {
        assert_eq!(args.request.method(), Method::POST);
        Ok(HandlerOutcome::Data(json!({"created": true})))
    }));
    let app = app_with_route("/items", module);
    let response = app.handle(common::post("/items")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::body_json(response).await,
        json!({"created": true})
    );
}

#[tokio::test]
async fn method_override_selects_the_delete_handler() {
    let module = RouteModule::default()
        .with_action(strata::handler(|_| async {
            Ok(HandlerOutcome::Data(json!("generic")))
        }))
        .with_method(
            Method::DELETE,
            strata::handler(|args| async move {
                // The request itself still reads as the original POST.
                assert_eq!(args.request.method(), Method::POST);
                Ok(HandlerOutcome::Data(json!("deleted")))
            }),
        );
    let app = app_with_route("/items/:id", module);
    let response = app
        .handle(common::form_post("/items/9", "_method=DELETE"))
        .await;
    assert_eq!(common::body_json(response).await, json!("deleted"));
}

#[tokio::test]
async fn large_form_posts_reach_the_action_with_their_body() {
    let module = RouteModule::default().with_action(strata::handler(|args| async move {
        let bytes = axum::body::to_bytes(args.request.into_body(), 4 * 1024 * 1024)
            .await
            .map_err(|e| Error::handler_with_detail("failed to read body", e.to_string()))?;
        Ok(HandlerOutcome::Data(json!({"len": bytes.len()})))
    }));
    let app = app_with_route("/upload", module);

    // Too large for override inspection; the action must still see
    // every byte.
    let mut body = "data=".to_string();
    body.push_str(&"x".repeat(2 * 1024 * 1024));
    body.push_str("&_method=DELETE");
    let len = body.len();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();

    let response = app.handle(request).await;
    assert_eq!(common::body_json(response).await, json!({"len": len}));
}

#[tokio::test]
async fn loader_can_return_a_full_response() {
    let module = RouteModule::default().with_loader(strata::handler(|_| async {
        let mut response = Response::new(Body::from("raw"));
        *response.status_mut() = StatusCode::ACCEPTED;
        Ok(HandlerOutcome::Response(response))
    }));
    let app = app_with_route("/raw", module);
    let response = app.handle(common::get("/raw")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(common::body_string(response).await, "raw");
}

#[tokio::test]
async fn loader_not_found_error_becomes_404_with_data() {
    let module = RouteModule::default().with_loader(strata::handler(|_| async {
        Err(Error::not_found_with(json!({"id": "x"})))
    }));
    let app = app_with_route("/users/:id", module);
    let response = app.handle(common::get("/users/x")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        common::body_json(response).await,
        json!({"error": "Not Found", "data": {"id": "x"}})
    );
}

#[tokio::test]
async fn router_not_configured_is_500() {
    let mut app = App::new(AppConfig::default());
    app.set_routes(vec![Route::new("r", "/")]);
    let response = app.handle(common::get("/")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::body_string(response).await, "Router not configured");
}

#[tokio::test]
async fn unmatched_path_is_404() {
    let app = app_with_route("/users/:id", json_loader());
    let response = app.handle(common::get("/posts/1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(common::body_string(response).await, "Not Found");
}

#[tokio::test]
async fn unloaded_module_is_500() {
    let mut app = App::new(AppConfig::default());
    let route = Route::new("bare", "/bare");
    app.set_route_matcher(PatternMatcher::new(vec![route]));
    let response = app.handle(common::get("/bare")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        common::body_string(response).await,
        "Route module not loaded"
    );
}

#[tokio::test]
async fn base_path_is_stripped_before_matching() {
    let mut config = AppConfig::default();
    config.base_path = "/app/".to_string();
    let mut app = App::new(config);
    let route = Route::new("users", "/users/:id").with_module(json_loader());
    app.set_route_matcher(PatternMatcher::new(vec![route]));

    let response = app.handle(common::get_json("/app/users/3")).await;
    assert_eq!(common::body_json(response).await, json!({"id": "3"}));

    // Outside the base path nothing matches.
    let response = app.handle(common::get("/users/3")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

struct Recorder {
    name: &'static str,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Middleware for Recorder {
    async fn handle(
        &self,
        request: Request<Body>,
        context: RequestContext,
        next: Next<'_>,
    ) -> Result<Response<Body>, Error> {
        self.calls.lock().push(self.name);
        next.run(request, context).await
    }
}

#[tokio::test]
async fn middleware_runs_in_registration_order_before_the_handler() {
    let calls: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let mut app = app_with_route("/users/:id", json_loader());
    app.middleware(Recorder {
        name: "A",
        calls: calls.clone(),
    });
    app.middleware(Recorder {
        name: "B",
        calls: calls.clone(),
    });

    let response = app.handle(common::get_json("/users/1")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*calls.lock(), ["A", "B"]);
}

struct Gatekeeper;

#[async_trait]
impl Middleware for Gatekeeper {
    async fn handle(
        &self,
        _request: Request<Body>,
        _context: RequestContext,
        _next: Next<'_>,
    ) -> Result<Response<Body>, Error> {
        let mut response = Response::new(Body::from("denied"));
        *response.status_mut() = StatusCode::UNAUTHORIZED;
        Ok(response)
    }
}

#[tokio::test]
async fn short_circuiting_middleware_blocks_downstream_and_handler() {
    let calls: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let loader_calls = calls.clone();
    let module = RouteModule::default().with_loader(strata::handler(move |_| {
        let calls = loader_calls.clone();
        async move {
            calls.lock().push("loader");
            Ok(HandlerOutcome::None)
        }
    }));
    let mut app = app_with_route("/secret", module);
    app.middleware(Gatekeeper);
    app.middleware(Recorder {
        name: "after",
        calls: calls.clone(),
    });

    let response = app.handle(common::get("/secret")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(calls.lock().is_empty());
}

struct Authenticator;

#[async_trait]
impl Middleware for Authenticator {
    async fn handle(
        &self,
        request: Request<Body>,
        context: RequestContext,
        next: Next<'_>,
    ) -> Result<Response<Body>, Error> {
        context.set("principal", json!({"name": "ada"}));
        next.run(request, context).await
    }
}

#[tokio::test]
async fn context_state_flows_from_middleware_to_handler() {
    let module = RouteModule::default().with_loader(strata::handler(|args| async move {
        let principal = args.context.get("principal").unwrap_or(json!(null));
        Ok(HandlerOutcome::Data(principal))
    }));
    let mut app = app_with_route("/me", module);
    app.middleware(Authenticator);

    let response = app.handle(common::get_json("/me")).await;
    assert_eq!(common::body_json(response).await, json!({"name": "ada"}));
}

struct Cors;

#[async_trait]
impl Middleware for Cors {
    async fn handle(
        &self,
        request: Request<Body>,
        context: RequestContext,
        next: Next<'_>,
    ) -> Result<Response<Body>, Error> {
        context.set_response_header(
            HeaderName::from_static("access-control-allow-origin"),
            HeaderValue::from_static("*"),
        );
        next.run(request, context).await
    }
}

#[tokio::test]
async fn error_responses_still_get_context_policy() {
    let module = RouteModule::default()
        .with_loader(strata::handler(|_| async { Err(Error::handler("boom")) }));
    let mut app = app_with_route("/broken", module);
    app.middleware(Cors);

    let response = app.handle(common::get("/broken")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    // Development mode exposes the message.
    assert_eq!(
        common::body_json(response).await,
        json!({"error": "boom", "detail": null})
    );
}

#[tokio::test]
async fn production_faults_are_opaque() {
    let mut config = AppConfig::default();
    config.mode = Mode::Production;
    let mut app = App::new(config);
    let route = Route::new("broken", "/broken").with_module(
        RouteModule::default()
            .with_loader(strata::handler(|_| async { Err(Error::handler("boom")) })),
    );
    app.set_route_matcher(PatternMatcher::new(vec![route]));

    let response = app.handle(common::get("/broken")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::body_string(response).await, "Internal Server Error");
}

#[tokio::test]
async fn loader_cache_and_cookie_policy_reach_the_response() {
    let module = RouteModule::default().with_loader(strata::handler(|args| async move {
        args.context.set_cache(CacheOptions {
            max_age: Some(300),
            tags: Some(vec!["users".to_string()]),
            ..Default::default()
        });
        args.context
            .set_cookie("session", "abc", &CookieOptions::default());
        Ok(HandlerOutcome::Data(json!({"ok": true})))
    }));
    let app = app_with_route("/cached", module);

    let response = app.handle(common::get_json("/cached")).await;
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=300"
    );
    assert_eq!(response.headers()["x-cache-tags"], "users");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("session=abc"));
}

#[tokio::test]
async fn inbound_cookies_are_visible_to_handlers() {
    let module = RouteModule::default().with_loader(strata::handler(|args| async move {
        Ok(HandlerOutcome::Data(json!({
            "theme": args.context.cookie("theme"),
        })))
    }));
    let app = app_with_route("/prefs", module);

    let request = Request::builder()
        .uri("/prefs")
        .header("accept", "application/json")
        .header("cookie", "theme=dark")
        .body(Body::empty())
        .unwrap();
    let response = app.handle(request).await;
    assert_eq!(common::body_json(response).await, json!({"theme": "dark"}));
}

#[tokio::test]
async fn concurrent_requests_do_not_share_context() {
    let module = RouteModule::default().with_loader(strata::handler(|args| async move {
        let marker = args.params["id"].clone();
        args.context.set("marker", marker.clone());
        // Yield so interleaved requests would observe leakage if
        // contexts were shared.
        tokio::task::yield_now().await;
        Ok(HandlerOutcome::Data(json!({
            "stored": args.context.get("marker"),
            "expected": marker,
        })))
    }));
    let app = Arc::new(app_with_route("/race/:id", module));

    let mut tasks = Vec::new();
    for id in 0..16 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            let response = app
                .handle(common::get_json(&format!("/race/{}", id)))
                .await;
            common::body_json(response).await
        }));
    }
    for task in tasks {
        let body = task.await.unwrap();
        assert_eq!(body["stored"], body["expected"]);
    }
}
