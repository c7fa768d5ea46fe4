use std::time::Duration;

use super::*;
use crate::config::ConfigError;
use crate::display::{RecordingSink, Signal};

fn observed(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

fn logs(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
    entries.iter().map(|(key, value)| ((*key).to_string(), *value)).collect()
}

fn callback(sink: RecordingSink, overrides: CurveOverrides) -> LearningCurveCallback<RecordingSink> {
    LearningCurveCallback::new(sink, overrides, 1)
        .unwrap()
        .settle_delay(Duration::ZERO)
}

fn setup_count(signals: &[Signal]) -> usize {
    signals.iter().filter(|signal| matches!(signal, Signal::Setup { .. })).count()
}

fn append_count(signals: &[Signal]) -> usize {
    signals.iter().filter(|signal| matches!(signal, Signal::Append { .. })).count()
}

#[test]
fn test_infer_mapping_prefix_rule() {
    assert_eq!(infer_mapping("loss"), MappingEntry::new("train", "loss"));
    assert_eq!(infer_mapping("val_loss"), MappingEntry::new("validation", "loss"));
    assert_eq!(infer_mapping("val_acc"), MappingEntry::new("validation", "acc"));
    assert_eq!(infer_mapping("value"), MappingEntry::new("train", "value"));
}

#[test]
fn test_infer_line_defaults() {
    assert_eq!(infer_line("train"), LineSpec::new("Train", "#F8766D"));
    assert_eq!(infer_line("validation"), LineSpec::new("Validation", "#00BFC4"));
    assert_eq!(infer_line("ema"), LineSpec::new("ema", "#333333"));
}

#[test]
fn test_infer_facet_defaults() {
    assert_eq!(infer_facet("loss"), FacetSpec::new("Loss", Limit::UNBOUNDED, Scale::Log10));
    for key in ["acc", "accuracy", "binary_accuracy", "categorical_accuracy", "sparse_categorical_accuracy"] {
        assert_eq!(
            infer_facet(key),
            FacetSpec::new("Accuracy", Limit(Some(0.0), Some(1.0)), Scale::Linear),
        );
    }
    assert_eq!(
        infer_facet("lr"),
        FacetSpec::new("Learning Rate", Limit(Some(0.0), None), Scale::Linear),
    );
    assert_eq!(infer_facet("f1"), FacetSpec::new("f1", Limit::UNBOUNDED, Scale::Linear));
}

#[test]
fn test_infer_settings_from_observed_metrics() {
    let settings = infer_settings(
        &observed(&["loss", "val_loss", "acc"]),
        &CurveOverrides::default(),
        Some(20),
    )
    .unwrap();

    assert_eq!(settings.mappings.len(), 3);
    assert_eq!(settings.mappings["val_loss"], MappingEntry::new("validation", "loss"));
    assert_eq!(settings.facet_config.len(), 2);
    assert_eq!(settings.facet_config["loss"].scale, Scale::Log10);
    assert_eq!(settings.facet_config["acc"].name, "Accuracy");
    assert_eq!(settings.line_config.len(), 2);
    assert_eq!(settings.x_axis_config.name, "Epoch");
    assert_eq!(settings.x_axis_config.limit, Limit(Some(0.0), Some(19.0)));
    // Two facets, default height formula.
    assert_eq!(settings.height, 2 * 200 + 90);
}

#[test]
fn test_infer_settings_without_epoch_budget_leaves_x_open() {
    let settings =
        infer_settings(&observed(&["loss"]), &CurveOverrides::default(), None).unwrap();
    assert_eq!(settings.x_axis_config.limit, Limit(Some(0.0), None));
}

#[test]
fn test_partial_overrides_complete_field_by_field() {
    let mut mappings = BTreeMap::new();
    mappings.insert(
        "loss".to_string(),
        MappingOverride { line: Some("ema".to_string()), facet: None },
    );
    let mut facet_config = BTreeMap::new();
    facet_config.insert(
        "loss".to_string(),
        FacetOverride { name: None, limit: Some(Limit(Some(0.0), Some(2.0))), scale: None },
    );
    let overrides = CurveOverrides {
        width: Some(800),
        x_axis_config: Some(AxisOverride { name: Some("Step".to_string()), limit: None }),
        mappings: Some(mappings),
        facet_config: Some(facet_config),
        ..CurveOverrides::default()
    };

    // The observed set is ignored once a mapping table is supplied.
    let settings = infer_settings(&observed(&["acc"]), &overrides, Some(5)).unwrap();

    assert_eq!(settings.mappings.len(), 1);
    assert_eq!(settings.mappings["loss"], MappingEntry::new("ema", "loss"));
    // The custom line key falls back to the identity style.
    assert_eq!(settings.line_config["ema"], LineSpec::new("ema", "#333333"));
    // Overridden limit, inferred name and scale.
    let facet = &settings.facet_config["loss"];
    assert_eq!(facet.name, "Loss");
    assert_eq!(facet.limit, Limit(Some(0.0), Some(2.0)));
    assert_eq!(facet.scale, Scale::Log10);
    assert_eq!(settings.x_axis_config.name, "Step");
    assert_eq!(settings.x_axis_config.limit, Limit(Some(0.0), Some(4.0)));
    assert_eq!(settings.width, 800);
}

#[test]
fn test_explicit_x_limit_is_not_pinned_to_epochs() {
    let overrides = CurveOverrides {
        x_axis_config: Some(AxisOverride {
            name: None,
            limit: Some(Limit(Some(0.0), Some(100.0))),
        }),
        ..CurveOverrides::default()
    };
    let settings = infer_settings(&observed(&["loss"]), &overrides, Some(5)).unwrap();
    assert_eq!(settings.x_axis_config.limit, Limit(Some(0.0), Some(100.0)));
}

#[test]
fn test_zero_draw_interval_is_rejected() {
    let err = LearningCurveCallback::new(RecordingSink::new(), CurveOverrides::default(), 0)
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidDrawInterval(0)));
}

#[test]
fn test_dynamic_reconfigures_on_new_metric_names() {
    let sink = RecordingSink::new();
    let mut callback = callback(sink.clone(), CurveOverrides::default());
    assert!(callback.is_dynamic());

    callback.on_train_begin(Some(4)).unwrap();
    callback.on_epoch_end(0, &logs(&[("loss", 1.0)])).unwrap();
    callback.on_epoch_end(1, &logs(&[("loss", 0.5), ("val_loss", 0.7)])).unwrap();
    // Same key set again: no third setup.
    callback.on_epoch_end(2, &logs(&[("loss", 0.4), ("val_loss", 0.6)])).unwrap();

    let signals = sink.signals();
    assert_eq!(setup_count(&signals), 2);
    let Signal::Setup { settings, .. } = signals
        .iter()
        .rev()
        .find(|signal| matches!(signal, Signal::Setup { .. }))
        .unwrap()
    else {
        unreachable!()
    };
    assert_eq!(settings.mappings.len(), 2);
    assert_eq!(settings.x_axis_config.limit, Limit(Some(0.0), Some(3.0)));
}

#[test]
fn test_fixed_mappings_configure_once() {
    let mut mappings = BTreeMap::new();
    mappings.insert("loss".to_string(), MappingOverride::default());
    let overrides = CurveOverrides { mappings: Some(mappings), ..CurveOverrides::default() };

    let sink = RecordingSink::new();
    let mut callback = callback(sink.clone(), overrides);
    assert!(!callback.is_dynamic());

    callback.on_train_begin(Some(3)).unwrap();
    callback.on_epoch_end(0, &logs(&[("loss", 1.0)])).unwrap();
    // A surprise metric does not trigger a reconfigure.
    callback.on_epoch_end(1, &logs(&[("loss", 0.5), ("val_loss", 0.8)])).unwrap();
    callback.on_train_end().unwrap();

    let signals = sink.signals();
    assert_eq!(setup_count(&signals), 1);
    assert_eq!(callback.session().settings().unwrap().mappings.len(), 1);
}

#[test]
fn test_draw_interval_throttles_flushes() {
    let sink = RecordingSink::new();
    let mut callback = LearningCurveCallback::new(sink.clone(), CurveOverrides::default(), 2)
        .unwrap()
        .settle_delay(Duration::ZERO);

    callback.on_train_begin(Some(5)).unwrap();
    for epoch in 0..5 {
        callback.on_epoch_end(epoch, &logs(&[("loss", 1.0 / (epoch + 1) as f64)])).unwrap();
    }

    // Epochs 0, 2, and 4 flush; 1 and 3 stay in the backlog.
    assert_eq!(append_count(&sink.signals()), 3);
    assert_eq!(callback.session().pending(), 0);

    callback.on_train_end().unwrap();
    // The snapshot adds the single post-finalize append.
    assert_eq!(append_count(&sink.signals()), 4);
    assert_eq!(callback.session().points().len(), 5);
}

#[test]
fn test_train_end_finalizes_session() {
    let sink = RecordingSink::new();
    let mut callback = callback(sink.clone(), CurveOverrides::default());
    callback.on_train_begin(None).unwrap();
    callback.on_epoch_end(0, &logs(&[("loss", 1.0)])).unwrap();
    callback.on_train_end().unwrap();

    assert!(callback.session().is_finalized());
    assert!(sink.signals().iter().any(|signal| matches!(signal, Signal::Freeze)));
    // A second train end stays a no-op.
    callback.on_train_end().unwrap();
}

#[test]
fn test_epoch_after_train_end_errors() {
    let mut callback = callback(RecordingSink::new(), CurveOverrides::default());
    callback.on_train_begin(None).unwrap();
    callback.on_epoch_end(0, &logs(&[("loss", 1.0)])).unwrap();
    callback.on_train_end().unwrap();

    let err = callback.on_epoch_end(1, &logs(&[("loss", 0.5)])).unwrap_err();
    assert!(matches!(err, session::SessionError::Finalized));
}
