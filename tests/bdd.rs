mod common;

use axum::http::{Method, StatusCode};
use cucumber::{gherkin::Step, given, then, when, World as _};
use serde_json::{json, Map, Value};

use common::{TestApp, TestResponse};

#[derive(Debug, cucumber::World, Default)]
struct TripWorld {
    app: Option<TestApp>,
    trip_id: Option<i64>,
    last_status: Option<StatusCode>,
    last_body: Option<Value>,
}

impl TripWorld {
    fn app(&self) -> &TestApp {
        self.app.as_ref().expect("application must be started first")
    }

    fn trip_id(&self) -> i64 {
        self.trip_id.expect("a trip must be created first")
    }

    fn remember(&mut self, resp: TestResponse) {
        self.last_status = Some(resp.status);
        self.last_body = serde_json::from_str(&resp.body).ok();
    }

    async fn todo_id(&self, title: &str) -> i64 {
        let todos = self
            .app()
            .get(&format!("/api/trips/{}/todos", self.trip_id()))
            .await
            .json();
        todos
            .as_array()
            .expect("todo list")
            .iter()
            .find(|todo| todo["title"] == title)
            .and_then(|todo| todo["id"].as_i64())
            .unwrap_or_else(|| panic!("no todo titled {title:?}"))
    }
}

/// Turns a headed gherkin table into bulk-import records, dropping blank cells.
fn records_from_table(step: &Step) -> Vec<Value> {
    let table = step.table.as_ref().expect("step needs a table");
    let (header, rows) = table.rows.split_first().expect("table needs a header");
    rows.iter()
        .map(|row| {
            let record: Map<String, Value> = header
                .iter()
                .zip(row)
                .filter(|(_, cell)| !cell.is_empty())
                .map(|(key, cell)| (key.clone(), Value::String(cell.clone())))
                .collect();
            Value::Object(record)
        })
        .collect()
}

#[given("a fresh trip planner")]
async fn given_fresh_app(world: &mut TripWorld) {
    world.app = Some(TestApp::new().await.expect("test app"));
    world.trip_id = None;
}

#[given(regex = r#"^a trip to "([^"]+)" from (\d{4}-\d{2}-\d{2}) to (\d{4}-\d{2}-\d{2})$"#)]
async fn given_trip(world: &mut TripWorld, destination: String, start: String, end: String) {
    let trip_id = world.app().create_trip(&destination, &start, &end).await;
    world.trip_id = Some(trip_id);
}

#[when("I bulk add these activities:")]
async fn when_bulk_add(world: &mut TripWorld, step: &Step) {
    let uri = format!("/bulk_add_activities/{}", world.trip_id());
    let resp = world
        .app()
        .json(
            Method::POST,
            &uri,
            json!({ "activities": records_from_table(step) }),
        )
        .await;
    world.remember(resp);
}

#[then(regex = r"^the request is answered with status (\d{3})$")]
async fn then_status(world: &mut TripWorld, status: u16) {
    assert_eq!(world.last_status.map(|s| s.as_u16()), Some(status));
}

#[then(regex = r#"^the response message is "([^"]+)"$"#)]
async fn then_message(world: &mut TripWorld, message: String) {
    let body = world.last_body.as_ref().expect("json response body");
    assert_eq!(body["message"], message.as_str());
}

#[then("the trip's activities are listed as:")]
async fn then_activities_listed(world: &mut TripWorld, step: &Step) {
    let table = step.table.as_ref().expect("step needs a table");
    let expected: Vec<&str> = table.rows.iter().skip(1).map(|row| row[0].as_str()).collect();
    let listed = world
        .app()
        .get(&format!("/activities?trip_id={}", world.trip_id()))
        .await
        .json();
    let titles: Vec<&str> = listed
        .as_array()
        .expect("activity list")
        .iter()
        .filter_map(|activity| activity["title"].as_str())
        .collect();
    assert_eq!(titles, expected);
}

#[then(regex = r"^the trip has (\d+) activities$")]
async fn then_activity_count(world: &mut TripWorld, expected: usize) {
    let listed = world
        .app()
        .get(&format!("/activities?trip_id={}", world.trip_id()))
        .await
        .json();
    assert_eq!(listed.as_array().map(Vec::len), Some(expected));
}

#[when(regex = r#"^I add the to-do "([^"]+)"$"#)]
async fn when_add_todo(world: &mut TripWorld, title: String) {
    let uri = format!("/add_todo/{}", world.trip_id());
    let body = format!("title={}", title.replace(' ', "+"));
    let resp = world.app().form(&uri, &body).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
}

#[when(regex = r#"^I toggle the to-do "([^"]+)"$"#)]
async fn when_toggle_todo(world: &mut TripWorld, title: String) {
    let todo_id = world.todo_id(&title).await;
    let resp = world.app().form(&format!("/toggle_todo/{todo_id}"), "").await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
}

#[then(regex = r#"^the to-do "([^"]+)" is (open|done)$"#)]
async fn then_todo_state(world: &mut TripWorld, title: String, state: String) {
    let todos = world
        .app()
        .get(&format!("/api/trips/{}/todos", world.trip_id()))
        .await
        .json();
    let todo = todos
        .as_array()
        .expect("todo list")
        .iter()
        .find(|todo| todo["title"] == title.as_str())
        .cloned()
        .expect("todo should exist");
    assert_eq!(todo["is_completed"], state == "done");
}

#[when("I delete the trip")]
async fn when_delete_trip(world: &mut TripWorld) {
    let resp = world
        .app()
        .delete(&format!("/api/trips/{}", world.trip_id()))
        .await;
    world.remember(resp);
}

#[then("the trip can no longer be found")]
async fn then_trip_gone(world: &mut TripWorld) {
    let trip_id = world.trip_id();
    for uri in [
        format!("/api/trips/{trip_id}"),
        format!("/api/trips/{trip_id}/todos"),
        format!("/trips/{trip_id}"),
    ] {
        assert_eq!(world.app().get(&uri).await.status, StatusCode::NOT_FOUND, "{uri}");
    }
    let everything = world.app().get("/activities").await.json();
    assert_eq!(everything.as_array().map(Vec::len), Some(0));
}

#[then(regex = r"^the week from (\d{4}-\d{2}-\d{2}) shows (\d+) days with (\d+) activities on (\d{4}-\d{2}-\d{2})$")]
async fn then_week(world: &mut TripWorld, start: String, days: usize, count: usize, day: String) {
    let uri = format!(
        "/weekly_view_data/{}?start_date={start}",
        world.trip_id()
    );
    let week = world.app().get(&uri).await.json();
    let grid = week.as_object().expect("week grid");
    assert_eq!(grid.len(), days);
    assert_eq!(grid[&day].as_array().map(Vec::len), Some(count));
}

#[then(regex = r"^the map shows (\d+) markers? centred at (-?[\d.]+), (-?[\d.]+) with zoom (\d+)$")]
async fn then_map(world: &mut TripWorld, markers: usize, lat: f64, lng: f64, zoom: u8) {
    let map = world
        .app()
        .get(&format!("/api/map?trip_id={}", world.trip_id()))
        .await
        .json();
    assert_eq!(map["markers"].as_array().map(Vec::len), Some(markers));
    let center_lat = map["center"]["latitude"].as_f64().expect("latitude");
    let center_lng = map["center"]["longitude"].as_f64().expect("longitude");
    assert!((center_lat - lat).abs() < 1e-9, "{center_lat} != {lat}");
    assert!((center_lng - lng).abs() < 1e-9, "{center_lng} != {lng}");
    assert_eq!(map["zoom"].as_u64(), Some(u64::from(zoom)));
}

#[tokio::main]
async fn main() {
    TripWorld::cucumber()
        .fail_on_skipped()
        .with_default_cli()
        .run("tests/features")
        .await;
}
