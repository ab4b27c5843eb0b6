//! Calendar-level round trips and the concrete recurrence scenarios
//! (spec §8 S1-S6, all present, plus the "universal properties" list).

use chrono::NaiveDateTime;

use icalx_core::calendar::{parse_calendar, write_calendar};
use icalx_core::component::{Component, ComponentKind};
use icalx_core::config::ParserConfig;
use icalx_core::property::Property;
use icalx_core::recurrence::{expand, ExceptionMatch};
use icalx_syntax::content_line::ContentLineParams;
use icalx_syntax::line_codec::{fold, unfold};
use icalx_syntax::security::SecurityGate;
use icalx_syntax::values::{Value, ValueKind};

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn vevent_with(properties: &[(&str, &str)]) -> Component {
    let mut component = Component::new(ComponentKind::VEvent);
    for (name, raw) in properties {
        let kind = icalx_core::property::default_kind_for_property(name);
        let value = Value::parse(raw, kind, None, true, None).unwrap();
        component.add_property(Property {
            name: name.to_string(),
            params: ContentLineParams::default(),
            raw_value: raw.to_string(),
            value,
        });
    }
    component
}

// S1 -- daily count with EXDATE: EXDATE does not restore the COUNT.
#[test]
fn s1_daily_count_with_exdate() {
    let mut component = vevent_with(&[("DTSTART", "20260101T090000"), ("RRULE", "FREQ=DAILY;COUNT=3")]);
    component.add_property(Property {
        name: "EXDATE".to_string(),
        params: ContentLineParams::default(),
        raw_value: "20260102T090000".to_string(),
        value: Value::parse("20260102T090000", ValueKind::DateTime, None, true, None).unwrap(),
    });

    let occurrences = expand(&component, None).unwrap();
    let starts: Vec<_> = occurrences.iter().map(|o| o.start).collect();
    assert_eq!(starts, vec![dt("2026-01-01T09:00:00"), dt("2026-01-03T09:00:00")]);
}

// S2 -- last weekday of the month via BYSETPOS=-1.
#[test]
fn s2_last_weekday_of_month_via_set_pos() {
    let component = vevent_with(&[
        ("DTSTART", "20240101T090000"),
        ("RRULE", "FREQ=MONTHLY;COUNT=3;BYDAY=MO,TU,WE,TH,FR;BYSETPOS=-1"),
    ]);
    let starts: Vec<_> = expand(&component, None).unwrap().iter().map(|o| o.start).collect();
    assert_eq!(
        starts,
        vec![dt("2024-01-31T09:00:00"), dt("2024-02-29T09:00:00"), dt("2024-03-29T09:00:00")]
    );
}

// S3 -- Friday the 13th: DTSTART itself does not satisfy BYDAY=FR (it's a
// Tuesday), so it is not included in the expansion.
#[test]
fn s3_friday_the_13th() {
    let component = vevent_with(&[
        ("DTSTART", "19970902T090000"),
        ("RRULE", "FREQ=MONTHLY;BYDAY=FR;BYMONTHDAY=13;COUNT=5"),
    ]);
    let starts: Vec<_> = expand(&component, None).unwrap().iter().map(|o| o.start).collect();
    assert_eq!(
        starts,
        vec![
            dt("1998-02-13T09:00:00"),
            dt("1998-03-13T09:00:00"),
            dt("1998-11-13T09:00:00"),
            dt("1999-08-13T09:00:00"),
            dt("2000-10-13T09:00:00"),
        ]
    );
}

// S4 -- WKST changes which days a biweekly BYDAY=TU,SU rule lands on.
#[test]
fn s4_wkst_difference() {
    let mo = vevent_with(&[("DTSTART", "19970805T090000"), ("RRULE", "FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=MO")]);
    let starts: Vec<_> = expand(&mo, None).unwrap().iter().map(|o| o.start).collect();
    assert_eq!(
        starts,
        vec![
            dt("1997-08-05T09:00:00"),
            dt("1997-08-10T09:00:00"),
            dt("1997-08-19T09:00:00"),
            dt("1997-08-24T09:00:00"),
        ]
    );

    let su = vevent_with(&[("DTSTART", "19970805T090000"), ("RRULE", "FREQ=WEEKLY;INTERVAL=2;COUNT=4;BYDAY=TU,SU;WKST=SU")]);
    let starts: Vec<_> = expand(&su, None).unwrap().iter().map(|o| o.start).collect();
    assert_eq!(
        starts,
        vec![
            dt("1997-08-05T09:00:00"),
            dt("1997-08-17T09:00:00"),
            dt("1997-08-19T09:00:00"),
            dt("1997-08-31T09:00:00"),
        ]
    );
}

// S5 -- folding round-trip: a TEXT value with a comma, semicolon and
// backslash survives write-then-read verbatim, and every physical line
// stays within the 75-octet fold limit.
#[test]
fn s5_folding_round_trip_preserves_text_value() {
    let document = "BEGIN:VCALENDAR\r\nPRODID:-//test//\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:1\r\nDTSTAMP:20240101T000000Z\r\nDTSTART:20240101T090000Z\r\nSUMMARY:Hello\\, world\\; backslash \\\\ newline\\nend\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

    let parsed = parse_calendar(document, &ParserConfig::default()).unwrap();
    let event = &parsed.root.children()[0];
    let summary = event.get_property("SUMMARY").unwrap();
    let Value::Text(values) = &summary.value else { panic!("expected TEXT") };
    assert_eq!(values[0], "Hello, world; backslash \\ newline\nend");

    let rendered = write_calendar(&parsed.root);
    for line in rendered.split("\r\n") {
        assert!(icalx_syntax::line_codec::octet_length(line) <= 75);
    }

    let reparsed = parse_calendar(&rendered, &ParserConfig::default()).unwrap();
    let reparsed_event = &reparsed.root.children()[0];
    assert_eq!(reparsed_event.get_property("SUMMARY").unwrap().value, summary.value);
}

// S6 -- security gate: scheme rejection, XXE detection, depth cap.
#[test]
fn s6_security_gate_rejects_file_scheme() {
    let gate = SecurityGate::default();
    assert!(matches!(
        gate.validate_uri("file:///etc/passwd"),
        Err(icalx_syntax::SyntaxError::InvalidScheme { .. })
    ));
}

#[test]
fn s6_security_gate_rejects_xxe() {
    let document = "BEGIN:VCALENDAR\r\n<!ENTITY xxe SYSTEM \"file:///etc/passwd\">\r\nEND:VCALENDAR\r\n";
    assert!(parse_calendar(document, &ParserConfig::default()).is_err());
}

#[test]
fn s6_security_gate_enforces_depth_cap() {
    let config = ParserConfig::default().with_max_depth(2);
    let mut document = String::new();
    for _ in 0..3 {
        document.push_str("BEGIN:VCALENDAR\r\n");
    }
    for _ in 0..3 {
        document.push_str("END:VCALENDAR\r\n");
    }
    assert!(parse_calendar(&document, &config).is_err());

    let config_ok = ParserConfig::default().with_max_depth(3);
    assert!(parse_calendar(&document, &config_ok).is_ok());
}

// Universal property 1: unfold(fold(x)) == x for a well-formed unfolded line.
#[test]
fn universal_unfold_fold_round_trip() {
    let original = "SUMMARY:".to_string() + &"x".repeat(200);
    let folded = fold(&original);
    let unfolded = unfold(&folded).unwrap();
    assert_eq!(unfolded, vec![original]);
}

// Universal property 2: every physical folded line stays <= 75 octets.
#[test]
fn universal_fold_respects_octet_limit() {
    let original = "DESCRIPTION:".to_string() + &"y".repeat(300);
    let folded = fold(&original);
    for line in folded.split("\r\n") {
        assert!(icalx_syntax::line_codec::octet_length(line) <= 75);
    }
}

// Universal property 3: a tree written and reparsed is semantically equivalent.
#[test]
fn universal_write_then_reparse_preserves_tree() {
    let document = "BEGIN:VCALENDAR\r\nPRODID:-//test//\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:1\r\nDTSTAMP:20240101T000000Z\r\nDTSTART:20240101T090000Z\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
    let parsed = parse_calendar(document, &ParserConfig::default()).unwrap();
    let rendered = write_calendar(&parsed.root);
    let reparsed = parse_calendar(&rendered, &ParserConfig::default()).unwrap();
    assert_eq!(reparsed.root, parsed.root);
}

// Universal property 4: occurrences are strictly increasing by start time.
#[test]
fn universal_occurrences_strictly_increasing() {
    let component = vevent_with(&[("DTSTART", "20240101T090000"), ("RRULE", "FREQ=WEEKLY;COUNT=10;BYDAY=MO,WE,FR")]);
    let occurrences = expand(&component, None).unwrap();
    for pair in occurrences.windows(2) {
        assert!(pair[0].start < pair[1].start);
    }
}

// Universal property 5: EXDATE reduces the yielded count but does not
// restore it -- COUNT=5 with 2 matched EXDATEs yields 3, not 5.
#[test]
fn universal_exdate_does_not_restore_count() {
    let mut component = vevent_with(&[("DTSTART", "20240101T090000"), ("RRULE", "FREQ=DAILY;COUNT=5")]);
    for raw in ["20240102T090000", "20240104T090000"] {
        component.add_property(Property {
            name: "EXDATE".to_string(),
            params: ContentLineParams::default(),
            raw_value: raw.to_string(),
            value: Value::parse(raw, ValueKind::DateTime, None, true, None).unwrap(),
        });
    }
    let occurrences = expand(&component, None).unwrap();
    assert_eq!(occurrences.len(), 3);
}

// Universal property 7: RDATE and RRULE agreeing on an instant yield it once.
#[test]
fn universal_rdate_rrule_overlap_yields_once() {
    let mut component = vevent_with(&[("DTSTART", "20240101T090000"), ("RRULE", "FREQ=DAILY;COUNT=3")]);
    component.add_property(Property {
        name: "RDATE".to_string(),
        params: ContentLineParams::default(),
        raw_value: "20240102T090000".to_string(),
        value: Value::parse("20240102T090000", ValueKind::DateTime, None, true, None).unwrap(),
    });
    let occurrences = expand(&component, None).unwrap();
    assert_eq!(occurrences.len(), 3);
}

// Universal property 8: an unbounded rule without range_end fails.
#[test]
fn universal_unbounded_rule_without_range_end_fails() {
    let component = vevent_with(&[("DTSTART", "20240101T090000"), ("RRULE", "FREQ=DAILY")]);
    assert!(expand(&component, None).is_err());
    assert!(expand(&component, Some(dt("2024-01-10T00:00:00"))).is_ok());
}

// Universal property 9: private/loopback hosts are rejected by the URI gate.
#[test]
fn universal_uri_gate_rejects_private_hosts() {
    let gate = SecurityGate::default();
    for host in ["127.0.0.1", "10.0.0.5", "172.16.0.1", "192.168.1.1", "localhost"] {
        let uri = format!("http://{host}/");
        assert!(gate.validate_uri(&uri).is_err(), "expected {uri} to be rejected");
    }
}

// Universal property 10: exactly max_depth succeeds, max_depth+1 fails.
#[test]
fn universal_depth_cap_boundary() {
    let config = ParserConfig::default().with_max_depth(3);

    let mut exactly_at_cap = String::new();
    for _ in 0..3 {
        exactly_at_cap.push_str("BEGIN:VCALENDAR\r\n");
    }
    for _ in 0..3 {
        exactly_at_cap.push_str("END:VCALENDAR\r\n");
    }
    assert!(parse_calendar(&exactly_at_cap, &config).is_ok());

    let mut over_cap = String::new();
    for _ in 0..4 {
        over_cap.push_str("BEGIN:VCALENDAR\r\n");
    }
    for _ in 0..4 {
        over_cap.push_str("END:VCALENDAR\r\n");
    }
    assert!(parse_calendar(&over_cap, &config).is_err());
}

// Exercises the merged ExceptionMatch::DateOnly path directly, since S1
// only drives the exact-instant shape end to end.
#[test]
fn exdate_date_only_excludes_whole_day_regardless_of_time() {
    use icalx_core::recurrence::{OccurrenceIter, RecurrenceInput};
    use chrono::NaiveDate;

    let input = RecurrenceInput {
        dtstart: dt("2024-01-01T09:00:00"),
        rules: vec![icalx_syntax::values::recur::parse("FREQ=DAILY;COUNT=3").unwrap()],
        exdates: vec![ExceptionMatch::DateOnly(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())],
        rdates: vec![],
        range_end: None,
    };
    let starts: Vec<_> = OccurrenceIter::new(input).map(|o| o.start).collect();
    assert_eq!(starts, vec![dt("2024-01-01T09:00:00"), dt("2024-01-03T09:00:00")]);
}
