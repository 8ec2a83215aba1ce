use output_parser::decoder;
use output_parser::{
    ActionNormalizer, DecodedValue, NoopSink, OutputParser, TaskNormalizer, TextNormalizer,
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;
use serde_json::{json, Map};

fn arb_leaf() -> impl Strategy<Value = DecodedValue> {
    prop_oneof![
        Just(DecodedValue::Null),
        any::<bool>().prop_map(DecodedValue::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "\\PC{0,24}".prop_map(DecodedValue::String),
        r#"[a-zA-Z0-9 \\/"'{}\[\]:,\n\t]{0,24}"#.prop_map(DecodedValue::String),
    ]
}

fn arb_value() -> impl Strategy<Value = DecodedValue> {
    arb_leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(DecodedValue::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                .prop_map(|m| DecodedValue::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_args() -> impl Strategy<Value = Map<String, DecodedValue>> {
    prop::collection::btree_map("[a-z_]{1,10}", arb_value(), 0..6)
        .prop_map(|m| m.into_iter().collect())
}

// Text shaped like model output: braces, quotes, backslashes, fences, comments
fn arb_reply_text() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("{".to_string()),
            Just("}".to_string()),
            Just("[".to_string()),
            Just("]".to_string()),
            Just("\"".to_string()),
            Just("'".to_string()),
            Just("\\".to_string()),
            Just("```json\n".to_string()),
            Just("```".to_string()),
            Just("//".to_string()),
            Just("/*".to_string()),
            Just("*/".to_string()),
            Just("\n".to_string()),
            Just("\t".to_string()),
            Just(": ".to_string()),
            Just(", ".to_string()),
            "[a-z0-9 ]{1,6}",
            "\\PC{1,3}",
        ],
        0..40,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_args_come_back_unchanged(name in "[a-z][a-z_]{0,15}", args in arb_args()) {
        let text = json!({
            "thoughts": {"text": "calling a tool"},
            "tool": {"name": name.clone(), "args": args.clone()},
        })
        .to_string();

        let action = OutputParser::new().with_sink(NoopSink).parse(&text).unwrap();
        prop_assert_eq!(action.name, name);
        prop_assert_eq!(action.args, args);
    }

    #[test]
    fn prop_pretty_printed_args_come_back_unchanged(args in arb_args()) {
        let text = format!(
            "```json\n{}\n```",
            serde_json::to_string_pretty(&json!({"tool": {"name": "t", "args": args.clone()}})).unwrap()
        );

        let action = OutputParser::new().with_sink(NoopSink).parse(&text).unwrap();
        prop_assert_eq!(action.args, args);
    }

    #[test]
    fn prop_tasks_come_back_unchanged(tasks in prop::collection::vec(arb_value(), 0..6)) {
        let text = json!({"tasks": tasks.clone()}).to_string();
        let list = OutputParser::new().with_sink(NoopSink).parse_tasks(&text).unwrap();
        prop_assert_eq!(list.tasks, tasks);
    }

    #[test]
    fn prop_action_normalizer_is_idempotent(text in arb_reply_text()) {
        let once = ActionNormalizer.normalize(&text);
        let twice = ActionNormalizer.normalize(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_task_normalizer_is_idempotent(text in arb_reply_text()) {
        let once = TaskNormalizer.normalize(&text);
        let twice = TaskNormalizer.normalize(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_decoder_accepts_json(value in arb_value()) {
        let compact = value.to_string();
        let pretty = serde_json::to_string_pretty(&value).unwrap();
        prop_assert_eq!(decoder::decode(&compact).unwrap(), value.clone());
        prop_assert_eq!(decoder::decode(&pretty).unwrap(), value);
    }

    #[test]
    fn prop_parser_never_panics(text in arb_reply_text()) {
        let parser = OutputParser::new().with_sink(NoopSink);
        let _ = parser.parse(&text);
        let _ = parser.parse_tasks(&text);
    }
}
