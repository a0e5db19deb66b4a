//! `/desk` endpoint tests

use desk_sniffer::http::{parse_int, respond, route, BodyBuffer, DeskRoute};
use desk_sniffer::DeskMailbox;

#[test]
fn test_routes() {
    assert_eq!(route("/desk"), DeskRoute::GetHeight);
    assert_eq!(route("/desk?"), DeskRoute::GetHeight);
    assert_eq!(route("/desk?verbose=1"), DeskRoute::GetHeight);
    assert_eq!(route("/desk?height=900"), DeskRoute::SetHeight(900));
    assert_eq!(route("/desk?x=1&height=1050"), DeskRoute::SetHeight(1050));
    assert_eq!(route("/"), DeskRoute::NotFound);
    assert_eq!(route("/desk/up"), DeskRoute::NotFound);
    assert_eq!(route("/favicon.ico"), DeskRoute::NotFound);
}

#[test]
fn test_height_param_lenient() {
    assert_eq!(route("/desk?height="), DeskRoute::SetHeight(0));
    assert_eq!(route("/desk?height=abc"), DeskRoute::SetHeight(0));
    assert_eq!(route("/desk?height=85cm"), DeskRoute::SetHeight(85));
}

#[test]
fn test_negative_height_is_zero() {
    // Clamped to the minimum later, never wrapped to a huge target
    assert_eq!(route("/desk?height=-5"), DeskRoute::SetHeight(0));
    assert_eq!(route("/desk?height=-65531"), DeskRoute::SetHeight(0));
}

#[test]
fn test_parse_int() {
    assert_eq!(parse_int("42"), 42);
    assert_eq!(parse_int("  42abc"), 42);
    assert_eq!(parse_int("+7"), 7);
    assert_eq!(parse_int("-5"), 0);
    assert_eq!(parse_int(""), 0);
    assert_eq!(parse_int("99999999"), u16::MAX);
}

#[test]
fn test_set_height_posts_request() {
    let mailbox = DeskMailbox::new();
    let mut body: BodyBuffer = [0; 32];

    let response = respond(route("/desk?height=950"), &mailbox, &mut body);
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "OK");
    assert_eq!(mailbox.take_request(), Some(950));
}

#[test]
fn test_get_height_reports_last_known() {
    let mailbox = DeskMailbox::new();
    let mut body: BodyBuffer = [0; 32];

    let response = respond(DeskRoute::GetHeight, &mailbox, &mut body);
    assert_eq!(response.body, "{\"height\":0}");

    mailbox.publish_height(1050);
    let response = respond(DeskRoute::GetHeight, &mailbox, &mut body);
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "{\"height\":1050}");
    assert_eq!(mailbox.take_request(), None);
}

#[test]
fn test_not_found() {
    let mailbox = DeskMailbox::new();
    let mut body: BodyBuffer = [0; 32];

    let response = respond(route("/nope"), &mailbox, &mut body);
    assert_eq!(response.status, 404);
    assert_eq!(response.body, "Not found");
}
