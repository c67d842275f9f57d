//! Crisis screening properties across languages and input shapes.

use serde_json::{json, Value};
use solace_core::pipeline::crisis::{self, CrisisCheck};
use solace_core::pipeline::Pipeline;
use solace_core::pipeline::PipelineOutcome;

const CRISIS_PHRASES: &[&str] = &[
    "อยากตาย",
    "ฆ่าตัวตาย",
    "ไม่อยากมีชีวิต",
    "ไม่อยากอยู่แล้ว",
    "จบชีวิต",
    "ทำร้ายตัวเอง",
    "suicide",
    "kill myself",
    "want to die",
    "end my life",
    "self-harm",
    "hurt myself",
    "no reason to live",
    "自杀",
    "想死",
    "不想活",
    "活不下去",
    "结束生命",
    "结束我的生命",
    "自残",
    "轻生",
];

const SURROUNDINGS: &[(&str, &str)] = &[
    ("", ""),
    ("Honestly ", " tonight."),
    ("วันนี้ ", " จริงๆ"),
    ("我觉得 ", " 了"),
    ("LOL ", " haha"),
];

#[test]
fn test_every_phrase_detected_in_any_context() {
    for phrase in CRISIS_PHRASES {
        for (before, after) in SURROUNDINGS {
            let text = format!("{before}{phrase}{after}");
            assert!(crisis::detect_text(&text), "missed: {text}");
            assert!(crisis::handle_check(Some(&json!(text))).is_crisis());
        }
    }
}

#[test]
fn test_uppercase_english_detected() {
    for phrase in ["SUICIDE", "Kill Myself", "WANT TO DIE", "Self Harm"] {
        assert!(crisis::detect_text(phrase), "missed: {phrase}");
    }
}

#[test]
fn test_benign_messages_not_flagged() {
    for text in [
        "I had a good day",
        "ฉันเครียดเรื่องงาน",
        "我很难过",
        "My exam is tomorrow and I'm nervous",
    ] {
        assert!(!crisis::detect_text(text), "false positive: {text}");
    }
}

#[test]
fn test_total_over_arbitrary_json() {
    let values: Vec<Option<Value>> = vec![
        None,
        Some(Value::Null),
        Some(json!(0)),
        Some(json!(-1.5)),
        Some(json!(true)),
        Some(json!({ "text": "suicide" })),
        Some(json!(["想死"])),
        Some(json!("")),
        Some(json!(" \n ")),
    ];
    for value in &values {
        assert!(!crisis::detect(value.as_ref()));
        assert_eq!(crisis::handle_check(value.as_ref()), CrisisCheck::NoCrisis);
    }
}

#[test]
fn test_crisis_payload_independent_of_language() {
    let pipeline = Pipeline::default();
    let payloads: Vec<_> = ["ฉันอยากตาย", "I want to die", "我想死"]
        .iter()
        .map(|text| match pipeline.evaluate(text, Some("en"), false) {
            PipelineOutcome::Crisis(payload) => payload,
            other => panic!("expected crisis for {text}, got {other:?}"),
        })
        .collect();
    assert!(payloads.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(payloads[0], crisis::create_response());
}
