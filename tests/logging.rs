//  LOGGING.rs
//
//  Created:
//    18 Oct 2026, 17:31:06
//  Last edited:
//    18 Oct 2026, 17:58:44
//  Auto updated?
//    Yes
//
//  Description:
//!   Tests that failed requests are logged with who made them and what
//!   class of error they ran into.
//

mod common;

use std::sync::{Arc, Mutex};

use axum::http::{Method, StatusCode};
use common::Harness;
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt as _};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};


/***** HELPERS *****/
/// The fields of a span, kept in its extensions.
#[derive(Default)]
struct SpanFields(Map<String, Value>);

/// Collects fields of events and spans.
struct FieldVisitor<'m>(&'m mut Map<String, Value>);
impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().into(), Value::String(value.into()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().into(), Value::Number(value.into()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().into(), Value::String(format!("{value:?}")));
    }
}

/// Remembers every event, together with the fields of the spans it happened in.
#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<Map<String, Value>>>>,
}
impl Capture {
    fn events(&self) -> Vec<Map<String, Value>> { self.events.lock().unwrap().clone() }
}
impl<S> Layer<S> for Capture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let span = ctx.span(id).unwrap();
        let mut fields = SpanFields::default();
        attrs.record(&mut FieldVisitor(&mut fields.0));
        span.extensions_mut().insert(fields);
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let span = ctx.span(id).unwrap();
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            values.record(&mut FieldVisitor(&mut fields.0));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = Map::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(SpanFields(span_fields)) = span.extensions().get::<SpanFields>() {
                    fields.extend(span_fields.clone());
                }
            }
        }
        event.record(&mut FieldVisitor(&mut fields));
        self.events.lock().unwrap().push(fields);
    }
}





/***** TESTS *****/
#[tokio::test]
async fn conflicts_are_logged_with_actor_and_kind() {
    let capture = Capture::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(capture.clone()));

    let harness = Harness::unlimited().await;
    let post = harness.post(&harness.alice).await;
    let path = format!("/v1/posts/{}", post.id);
    let (status, _) = harness.send_as(&harness.alice, Method::PATCH, &path, Some(json!({ "title": "Once", "version": post.version }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = harness.send_as(&harness.alice, Method::PATCH, &path, Some(json!({ "title": "Twice", "version": post.version }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let events = capture.events();
    let conflict = events.iter().find(|fields| fields.get("kind") == Some(&json!("conflict"))).expect("no conflict was logged");
    assert_eq!(conflict.get("user"), Some(&json!(harness.alice.id)));
    assert_eq!(conflict.get("path"), Some(&json!(path)));
}

#[tokio::test]
async fn client_mistakes_are_logged_as_bad_requests() {
    let capture = Capture::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(capture.clone()));

    let harness = Harness::unlimited().await;
    let (status, _) = harness.send_as(&harness.bob, Method::GET, "/v1/posts/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let events = capture.events();
    let mistake = events.iter().find(|fields| fields.get("kind") == Some(&json!("bad-request"))).expect("no bad request was logged");
    assert_eq!(mistake.get("user"), Some(&json!(harness.bob.id)));
}
