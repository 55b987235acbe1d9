//! Brick protocol tests against a scripted controller

use feanta_bridge::{
    brick::{command_frame, frame::frame, BrickWorker, Request, RequestType, REGISTERS},
    config::AxisScale,
    hal::MockConnector,
    journal::Level,
    Axis, BrickConfig, Journal, Reading, Worker,
};

fn ack() -> Vec<u8> {
    b"\x06".to_vec()
}

fn register_reply(text: &str) -> Vec<u8> {
    format!("{}\r\x06", text).into_bytes()
}

/// Worker over `link` that logs nowhere.
fn brick(link: &MockConnector, config: BrickConfig) -> BrickWorker<MockConnector> {
    let mut worker = BrickWorker::new(link.clone(), config);
    worker.set_logger(Journal::silent());
    worker
}

/// Extract the program text from a recorded frame.
fn program_of(frame: &[u8]) -> String {
    let len = u16::from_be_bytes([frame[6], frame[7]]) as usize;
    String::from_utf8(frame[8..8 + len - 1].to_vec()).unwrap()
}

// ============================================================================
// Framing
// ============================================================================

#[test]
fn command_frame_header() {
    let bytes = command_frame("CLOSE ALL").unwrap();
    assert_eq!(bytes[0], RequestType::Download as u8);
    assert_eq!(bytes[1], Request::GetResponse as u8);
    assert_eq!(&bytes[2..6], &[0, 0, 0, 0]);
    assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 10);
    assert_eq!(bytes.len(), 8 + 9 + 1);
}

#[test]
fn value_and_index_little_endian() {
    let bytes = frame(RequestType::Upload, Request::GetMem, 0x1234, 0xABCD, b"").unwrap();
    assert_eq!(&bytes[..6], &[0xC0, 0xB4, 0x34, 0x12, 0xCD, 0xAB]);
}

// ============================================================================
// Commands end to end
// ============================================================================

#[test]
fn every_command_sends_one_frame_per_program() {
    let cases: [(&[&str], usize); 7] = [
        (&["BRICKCAL"], 4),
        (&["BRICKMOVE", "4", "-1.5"], 2),
        (&["BRICKOFF", "3", "0.25"], 3),
        (&["BRICKHALT", "1"], 2),
        (&["BRICKLOC", "1", "2", "3"], 2),
        (&["BRICKANGLE", "-12.5"], 2),
        (&["BRICKRESET"], 2),
    ];
    for (tokens, frames) in cases {
        let link = MockConnector::new().with_replies(vec![ack(); frames]);
        let mut worker = brick(&link, BrickConfig::default());
        worker.execute(tokens).unwrap();
        assert_eq!(link.connection_count(), frames, "{:?}", tokens);
        assert_eq!(link.pending_replies(), 0, "{:?}", tokens);
    }
}

#[test]
fn programs_end_with_close_all_except_offset() {
    let link = MockConnector::new().with_replies(vec![ack(); 3]);
    let mut worker = brick(&link, BrickConfig::default());
    worker.execute(&["BRICKOFF", "1", "2"]).unwrap();
    let last = program_of(link.connections().last().unwrap());
    assert_eq!(last, "CMD \"DISABLE PLC 10\"\rCLOSE\rENABLE PLC 10");

    let link = MockConnector::new().with_replies(vec![ack(); 2]);
    let mut worker = brick(&link, BrickConfig::default());
    worker.execute(&["BRICKHALT", "4"]).unwrap();
    assert_eq!(program_of(link.connections().last().unwrap()), "CLOSE ALL");
}

#[test]
fn location_renders_decimals() {
    let link = MockConnector::new().with_replies(vec![ack(); 2]);
    let mut worker = brick(&link, BrickConfig::default());
    worker.execute(&["BRICKLOC", "1", "0.1", "-20"]).unwrap();
    assert!(program_of(&link.connections()[0]).ends_with("&1!Z1.0\r&3!A0.1\r&4!X-20.0"));
}

#[test]
fn usage_errors_name_the_command() {
    let link = MockConnector::new();
    let (journal, entries) = Journal::capture();
    let mut worker = BrickWorker::new(link.clone(), BrickConfig::default());
    worker.set_logger(journal);

    for tokens in [
        &["BRICKMOVE", "1"][..],
        &["BRICKMOVE", "x", "1"][..],
        &["BRICKOFF", "1", "fast"][..],
        &["BRICKANGLE", "inf"][..],
        &["BRICKHALT", "5"][..],
    ] {
        assert!(worker.execute(tokens).unwrap_err().is_usage());
    }
    assert_eq!(link.connection_count(), 0);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 5);
    for (level, message) in entries.iter() {
        assert_eq!(*level, Level::Warn);
        assert!(message.starts_with("Invalid call to BRICK"), "{}", message);
    }
}

// ============================================================================
// Telemetry
// ============================================================================

#[test]
fn stateframe_scales_positions_per_axis() {
    let scale = AxisScale {
        axis1: 10.0,
        axis3: 100.0,
        axis4: 1000.0,
    };
    let config = BrickConfig::default().with_scale(scale);
    let mut replies = Vec::new();
    for _ in Axis::ALL {
        for register in REGISTERS.iter() {
            replies.push(register_reply(match register.name {
                "ACTUALMPOS" => "5000",
                "INPOS" => "1",
                _ => "0",
            }));
        }
    }
    let link = MockConnector::new().with_replies(replies);
    let mut worker = brick(&link, config);

    let frame = worker.stateframe_query().unwrap().unwrap();
    assert_eq!(frame.decode_failures, 0);
    assert_eq!(link.connection_count(), 3);

    let expected = [("AXIS1", 500.0), ("AXIS3", 50.0), ("AXIS4", 5.0)];
    for (key, position) in expected {
        let record = frame.get(key).and_then(Reading::as_record).unwrap();
        assert_eq!(record["ACTUALMPOS"].as_float(), Some(position));
        assert_eq!(record["INPOS"].as_int(), Some(1));
    }
}

#[test]
fn stateframe_transport_failure() {
    let link = MockConnector::new().unresolved();
    let mut worker = brick(&link, BrickConfig::default());
    assert!(worker.stateframe_query().unwrap().is_err());
}

#[cfg(feature = "serde")]
#[test]
fn stateframe_json_has_axis_keys_at_top_level() {
    let replies = (0..Axis::ALL.len() * REGISTERS.len())
        .map(|_| register_reply("0"))
        .collect::<Vec<_>>();
    let link = MockConnector::new().with_replies(replies);
    let mut registry = feanta_bridge::WorkerRegistry::new(Journal::silent())
        .with_worker(brick(&link, BrickConfig::default()))
        .unwrap();

    let json = serde_json::to_value(registry.stateframe()).unwrap();
    for key in ["AXIS1", "AXIS3", "AXIS4"] {
        assert!(json[key]["INPOS"].is_number(), "{}", key);
    }
    assert_eq!(json["decode_failures"], 0);
    assert!(json.get("entries").is_none());
}
