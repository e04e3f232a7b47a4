use cardinal_genie::genie::{SseDecoder, StreamEvent};
use cardinal_genie::markup::extract;
use proptest::prelude::*;

fn frame(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({ "choices": [{ "delta": { "content": content } }] })
    )
}

/// Decode `body` fed as the given chunks.
fn decode_chunked(body: &[u8], cuts: &[usize]) -> Vec<StreamEvent> {
    let mut decoder = SseDecoder::new();
    let mut events = Vec::new();
    let mut start = 0;
    for &cut in cuts {
        let cut = cut.clamp(start, body.len());
        events.extend(decoder.feed(&body[start..cut]));
        start = cut;
    }
    events.extend(decoder.feed(&body[start..]));
    events.extend(decoder.finish());
    events
}

fn deltas(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Delta(text) => Some(text.as_str()),
            StreamEvent::Done => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn decoding_does_not_depend_on_chunk_boundaries(
        parts in prop::collection::vec("[a-zA-Z0-9 éü€\n`#*]{1,12}", 1..8),
        mut cuts in prop::collection::vec(0usize..400, 0..12),
    ) {
        let mut body = String::from(": keep-alive\n");
        for part in &parts {
            body.push_str(&frame(part));
        }
        body.push_str("data: {not json}\n\ndata: [DONE]\n\n");
        cuts.sort_unstable();

        let whole = decode_chunked(body.as_bytes(), &[]);
        let chunked = decode_chunked(body.as_bytes(), &cuts);

        prop_assert_eq!(&whole, &chunked);
        prop_assert_eq!(deltas(&chunked), parts.concat());
        prop_assert_eq!(
            chunked.iter().filter(|e| **e == StreamEvent::Done).count(),
            1
        );
    }

    #[test]
    fn extraction_is_idempotent(
        pieces in prop::collection::vec(
            prop_oneof![
                "[a-z #*\n]{0,20}",
                Just("```chart:bar Sales\n[{\"name\":\"A\",\"value\":1}]\n```".to_string()),
                Just("```metrics\n[{\"label\":\"ROI\",\"value\":\"150%\"}]\n```".to_string()),
                Just("```chart:pie\nnot json\n```".to_string()),
                Just("```".to_string()),
                Just("`".to_string()),
                Just("chart:line\n".to_string()),
            ],
            0..10,
        ),
    ) {
        let text = pieces.concat();
        let first = extract(&text);
        let second = extract(&first.prose);

        prop_assert_eq!(&second.prose, &first.prose);
        prop_assert!(second.charts.is_empty());
        prop_assert!(second.metrics.is_empty());
    }
}
