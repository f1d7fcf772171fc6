use symswap_core::document::{Document, NodeId, Shape, SymbolDefinition};
use symswap_core::geometry::{Point2, VisibleBounds};
use symswap_engine::replace::{ItemOutcome, ReplaceOptions};
use symswap_engine::scene::{CoordinateSpace, Scene};

fn marker_document() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    doc.add_symbol(SymbolDefinition::new(
        "S",
        // 注册点偏离内容，粗放置必然偏位，逼出 delta 修正。
        VisibleBounds::new(3.0, 5.0, 11.0, -3.0),
    ));
    // A: 100×50，中心 (10, 10)。
    let a = doc.add_marker(VisibleBounds::new(-40.0, 35.0, 60.0, -15.0), "MARKS");
    let b = doc.add_marker(VisibleBounds::new(100.0, 10.0, 110.0, 0.0), "MARKS");
    if let Some(node) = doc.node_mut(b) {
        node.locked = true;
    }
    (doc, a, b)
}

#[test]
fn locked_item_is_skipped_and_original_hidden() {
    let (doc, a, b) = marker_document();
    let mut scene = Scene::with_document(doc);
    scene.select(a).unwrap();
    scene.select(b).unwrap();

    let report = scene
        .replace_selection(&ReplaceOptions::new("S", false))
        .expect("preflight passes");

    assert_eq!(report.replaced(), 1);
    assert_eq!(report.skipped(), 1);
    let instance = report.instances().next().expect("instance for A");

    // 新实例 100×50、中心 (10, 10)。
    let bounds = scene.document().visible_bounds(instance).unwrap();
    assert!((bounds.width() - 100.0).abs() < 1e-9);
    assert!((bounds.height() - 50.0).abs() < 1e-9);
    assert!((bounds.center().x() - 10.0).abs() < 1e-9);
    assert!((bounds.center().y() - 10.0).abs() < 1e-9);

    // 实例插在 A 之前，A 被隐藏但仍在文档树里。
    let order: Vec<NodeId> = scene.document().nodes().map(|(id, _)| *id).collect();
    assert_eq!(order, vec![instance, a, b]);
    assert!(scene.document().node(a).unwrap().hidden);

    // B 完全未被触碰，也没有为它创建实例。
    let locked = scene.document().node(b).unwrap();
    assert!(locked.locked);
    assert!(!locked.hidden);
    assert!(matches!(locked.shape, Shape::Marker(_)));
    assert_eq!(scene.document().nodes().count(), 3);
}

#[test]
fn delete_disposition_removes_sources_from_tree() {
    let (doc, a, _) = marker_document();
    let mut scene = Scene::with_document(doc);
    scene.select(a).unwrap();

    let report = scene
        .replace_selection(&ReplaceOptions::new("S", true))
        .unwrap();
    assert_eq!(report.replaced(), 1);
    assert!(scene.document().node(a).is_none());

    let instance = report.instances().next().unwrap();
    assert!(scene.document().node(instance).is_some());
}

#[test]
fn non_uniform_scale_is_accepted_silently() {
    let mut doc = Document::new();
    // 正方形符号压进极端扁平的目标。
    doc.add_symbol(SymbolDefinition::new(
        "Square",
        VisibleBounds::new(0.0, 10.0, 10.0, 0.0),
    ));
    let flat = doc.add_marker(VisibleBounds::new(0.0, 2.0, 200.0, 0.0), "0");
    let mut scene = Scene::with_document(doc);
    scene.select(flat).unwrap();

    let report = scene
        .replace_selection(&ReplaceOptions::new("Square", false))
        .unwrap();
    let instance = report.instances().next().unwrap();
    let bounds = scene.document().visible_bounds(instance).unwrap();
    assert!((bounds.width() - 200.0).abs() < 1e-9);
    assert!((bounds.height() - 2.0).abs() < 1e-9);
}

#[test]
fn batch_runs_in_document_space_and_restores_artboard_mode() {
    let (mut doc, a, _) = marker_document();
    doc.set_artboard_origin(Point2::new(500.0, -250.0));
    let mut scene = Scene::with_document(doc);
    assert_eq!(scene.modes().coordinate_space, CoordinateSpace::Artboard);
    scene.select(a).unwrap();

    let report = scene
        .replace_selection(&ReplaceOptions::new("S", false))
        .unwrap();
    let instance = report.instances().next().unwrap();

    // 尽管运行前处于画板坐标模式，替换仍以文档绝对坐标对齐。
    let bounds = scene.document().visible_bounds(instance).unwrap();
    assert!((bounds.center().x() - 10.0).abs() < 1e-9);
    assert!((bounds.center().y() - 10.0).abs() < 1e-9);

    // 运行结束后恢复画板模式。
    assert_eq!(scene.modes().coordinate_space, CoordinateSpace::Artboard);
}

#[test]
fn failures_are_isolated_and_recorded_in_order() {
    let mut doc = Document::new();
    doc.add_symbol(SymbolDefinition::new(
        "S",
        VisibleBounds::new(0.0, 4.0, 4.0, 0.0),
    ));
    let first = doc.add_marker(VisibleBounds::new(0.0, 10.0, 10.0, 0.0), "0");
    let broken = doc.add_path([Point2::new(5.0, 5.0)], false, "0");
    let last = doc.add_marker(VisibleBounds::new(20.0, 10.0, 30.0, 0.0), "0");
    let mut scene = Scene::with_document(doc);
    for id in [first, broken, last] {
        scene.select(id).unwrap();
    }

    let report = scene
        .replace_selection(&ReplaceOptions::new("S", false))
        .unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report.replaced(), 2);
    assert_eq!(report.failed(), 1);

    let outcomes: Vec<&ItemOutcome> = report.items().iter().map(|item| &item.outcome).collect();
    assert!(matches!(outcomes[0], ItemOutcome::Replaced { .. }));
    assert!(matches!(outcomes[1], ItemOutcome::Failed(_)));
    assert!(matches!(outcomes[2], ItemOutcome::Replaced { .. }));

    // 失败项原样保留。
    let node = scene.document().node(broken).unwrap();
    assert!(!node.hidden);
    assert!(scene.document().node(first).unwrap().hidden);
    assert!(scene.document().node(last).unwrap().hidden);
}
