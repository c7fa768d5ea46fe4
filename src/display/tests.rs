use uuid::Uuid;

use super::*;
use crate::config::SettingsBuilder;
use crate::point::DataPoint;

fn sample_settings() -> Settings {
    SettingsBuilder::new().build().unwrap()
}

#[test]
fn test_setup_call_decodes_back() {
    let settings = sample_settings();
    let text = setup_call(settings.id, &settings);
    assert!(text.starts_with("window.setupLearningCurve("));
    assert!(text.ends_with(");"));

    let signals = Signal::decode_all(&Content::Javascript(text));
    assert_eq!(signals, vec![Signal::Setup { chart_id: settings.id, settings }]);
}

#[test]
fn test_append_call_decodes_back() {
    let chart_id = Uuid::new_v4();
    let points = vec![DataPoint::new(0.0, [("loss", 1.0)]), DataPoint::new(1.0, [("loss", 0.5)])];
    let text = append_call(chart_id, &points);

    let signals = Signal::decode_all(&Content::Javascript(text));
    assert_eq!(signals, vec![Signal::Append { chart_id, points }]);
}

#[test]
fn test_absent_sample_survives_the_wire() {
    let chart_id = Uuid::new_v4();
    let points = vec![DataPoint {
        x: 0.0,
        y: [("loss".to_string(), crate::point::Sample::ABSENT)].into(),
    }];
    let text = append_call(chart_id, &points);
    assert!(text.contains("\"loss\":null"));

    match Signal::decode_all(&Content::Javascript(text)).pop() {
        Some(Signal::Append { points: decoded, .. }) => {
            assert!(decoded[0].y["loss"].is_absent());
        }
        other => panic!("expected append signal, got {other:?}"),
    }
}

#[test]
fn test_freeze_script_decodes() {
    let signals = Signal::decode_all(&Content::Javascript(FREEZE_SCRIPT.to_string()));
    assert_eq!(signals, vec![Signal::Freeze]);
}

#[test]
fn test_handle_bootstrap_decodes_to_nothing() {
    let signals = Signal::decode_all(&Content::Javascript(HANDLE_BOOTSTRAP.to_string()));
    assert!(signals.is_empty());
}

#[test]
fn test_inline_script_embedding_decodes() {
    let chart_id = Uuid::new_v4();
    let points = vec![DataPoint::new(3.0, [("loss", 0.1)])];
    let markup = inline_script(&append_call(chart_id, &points));

    let signals = Signal::decode_all(&Content::Html(markup));
    assert_eq!(signals, vec![Signal::Append { chart_id, points }]);
}

#[test]
fn test_markup_with_several_scripts_decodes_in_order() {
    let settings = sample_settings();
    let markup = format!(
        "<style>{STYLE_SHEET}</style><script>{CLIENT_SHIM}</script>\
         <svg id=\"{id}\" class=\"learning-curve\"></svg>\
         <script>{setup}</script>",
        id = settings.id,
        setup = setup_call(settings.id, &settings),
    );

    let signals = Signal::decode_all(&Content::Html(markup));
    assert_eq!(signals.len(), 1);
    assert!(matches!(signals[0], Signal::Setup { chart_id, .. } if chart_id == settings.id));
}

#[test]
fn test_recording_sink_orders_events() {
    let mut sink = RecordingSink::new();
    sink.show(Content::Html("<p>scaffold</p>".to_string()));
    let mut handle = sink.open_handle(Content::Javascript(HANDLE_BOOTSTRAP.to_string()));
    handle.update(Content::Javascript("first".to_string()));
    handle.update(Content::Javascript("second".to_string()));

    let events = sink.events();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], SinkEvent::Shown(_)));
    assert!(matches!(events[1], SinkEvent::HandleOpened(_)));
    assert_eq!(events[2], SinkEvent::Updated(Content::Javascript("first".to_string())));
    assert_eq!(events[3], SinkEvent::Updated(Content::Javascript("second".to_string())));
}
