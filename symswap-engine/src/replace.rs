//! 批量符号替换引擎：把每个选中节点替换为所选符号的实例，
//! 保持原节点的包围盒尺寸与中心位置不变。

use symswap_core::document::{Document, NodeId, SymbolInstance};
use symswap_core::geometry::{Point2, Vector2, VisibleBounds};
use tracing::{debug, trace};

use crate::errors::{PreflightError, ReplaceError};
use crate::scene::Scene;

/// 一次替换运行的两个参数：选用的符号与原件处置方式。
/// 在整个批处理过程中保持不变。
#[derive(Debug, Clone)]
pub struct ReplaceOptions {
    pub symbol: String,
    pub delete_originals: bool,
}

impl ReplaceOptions {
    pub fn new(symbol: impl Into<String>, delete_originals: bool) -> Self {
        Self {
            symbol: symbol.into(),
            delete_originals,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    Locked,
    Hidden,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            SkipReason::Missing => "node no longer exists",
            SkipReason::Locked => "node is locked",
            SkipReason::Hidden => "node is hidden",
        }
    }
}

/// 单个节点的处理结果。跳过不是错误：锁定或隐藏的节点原样保留。
#[derive(Debug)]
pub enum ItemOutcome {
    Replaced { instance: NodeId },
    Skipped(SkipReason),
    Failed(ReplaceError),
}

#[derive(Debug)]
pub struct ItemReport {
    pub source: NodeId,
    pub outcome: ItemOutcome,
}

/// 整个批处理的汇总结果，按快照顺序逐项记录，显式返回给调用方。
#[derive(Debug, Default)]
pub struct ReplaceReport {
    items: Vec<ItemReport>,
}

impl ReplaceReport {
    #[inline]
    pub fn items(&self) -> &[ItemReport] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn replaced(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Replaced { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Skipped(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed(_)))
            .count()
    }

    /// 本次运行新创建的实例 ID，按创建顺序。
    pub fn instances(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().filter_map(|item| match item.outcome {
            ItemOutcome::Replaced { instance } => Some(instance),
            _ => None,
        })
    }
}

impl Scene {
    /// 把当前选中集中的每个可处理节点替换为 `options.symbol` 的实例。
    ///
    /// 预检失败（选区为空、符号库为空、符号未注册）时整体中止，
    /// 文档保持零变更。预检通过后逐项处理：单项失败只记录在报告里，
    /// 不影响后续节点。迭代集在首次变更前就被冻结，新插入的实例
    /// 不会被再次处理。
    pub fn replace_selection(
        &mut self,
        options: &ReplaceOptions,
    ) -> Result<ReplaceReport, PreflightError> {
        if self.selection_len() == 0 {
            return Err(PreflightError::EmptySelection);
        }
        if self.document().symbol_count() == 0 {
            return Err(PreflightError::NoSymbols);
        }
        if self.document().symbol(&options.symbol).is_none() {
            return Err(PreflightError::UnknownSymbol(options.symbol.clone()));
        }

        let snapshot = self.selection_snapshot();
        let report = self.with_batch_modes(|scene| {
            let mut items = Vec::with_capacity(snapshot.len());
            for source in snapshot {
                let outcome = replace_one(scene, source, options);
                if let ItemOutcome::Failed(error) = &outcome {
                    scene.alert(format!("节点 {} 替换失败: {error}", source.get()));
                }
                items.push(ItemReport { source, outcome });
            }
            ReplaceReport { items }
        });

        debug!(
            symbol = %options.symbol,
            delete_originals = options.delete_originals,
            replaced = report.replaced(),
            skipped = report.skipped(),
            failed = report.failed(),
            "批量替换完成"
        );
        Ok(report)
    }
}

fn replace_one(scene: &mut Scene, source: NodeId, options: &ReplaceOptions) -> ItemOutcome {
    let Some(node) = scene.document().node(source) else {
        return ItemOutcome::Skipped(SkipReason::Missing);
    };
    if node.locked {
        return ItemOutcome::Skipped(SkipReason::Locked);
    }
    if node.hidden {
        return ItemOutcome::Skipped(SkipReason::Hidden);
    }
    let layer = node.layer.clone();

    match replace_eligible(scene, source, &layer, options) {
        Ok(instance) => ItemOutcome::Replaced { instance },
        Err(error) => ItemOutcome::Failed(error),
    }
}

/// 对单个已通过资格检查的节点执行实际替换：
/// 捕获几何、实例化、尺寸匹配、中心修正、处置原件。
///
/// 所有可失败的检查（读边界、解析符号定义）都安排在实例插入之前，
/// 因此任何一步失败都不会在文档里留下半配置的实例，源节点保持原样。
fn replace_eligible(
    scene: &mut Scene,
    source: NodeId,
    layer: &str,
    options: &ReplaceOptions,
) -> Result<NodeId, ReplaceError> {
    // 捕获源几何（批处理模式已强制文档坐标系）。
    let footprint = scene
        .visible_bounds(source)
        .ok_or(ReplaceError::MissingBounds)?;
    if footprint.is_degenerate() {
        return Err(ReplaceError::DegenerateBounds);
    }

    let definition = scene
        .document()
        .symbol(&options.symbol)
        .ok_or_else(|| ReplaceError::SymbolMissing(options.symbol.clone()))?;
    if definition.art_bounds.is_degenerate() {
        return Err(ReplaceError::DegenerateArt(options.symbol.clone()));
    }
    let instance = SymbolInstance::place(definition);

    // 紧贴源节点之前插入，保持其在绘制顺序中的层叠位置。
    let instance_id = scene
        .document_mut()
        .insert_instance_before(source, instance, layer)
        .ok_or(ReplaceError::SourceVanished)?;

    size_match(scene.document_mut(), instance_id, &footprint)?;
    let delta = center_correction(scene.document_mut(), instance_id, footprint.center())?;
    trace!(
        source = source.get(),
        instance = instance_id.get(),
        dx = delta.x(),
        dy = delta.y(),
        "实例已对齐"
    );

    // 处置原件：删除或隐藏（隐藏可由用户之后恢复）。
    if options.delete_originals {
        scene.document_mut().remove(source);
    } else if let Some(node) = scene.document_mut().node_mut(source) {
        node.hidden = true;
    }

    Ok(instance_id)
}

/// 把实例尺寸匹配到目标包围盒，并把锚点粗对齐到其左上角。
/// 非等比缩放是预期行为，不保持符号原始纵横比。
/// 粗对齐只需大致到位，精确位置交给 [`center_correction`]。
pub fn size_match(
    document: &mut Document,
    instance: NodeId,
    footprint: &VisibleBounds,
) -> Result<(), ReplaceError> {
    let inst = document
        .instance_mut(instance)
        .ok_or(ReplaceError::NotAnInstance)?;
    inst.set_size(footprint.width(), footprint.height());
    inst.set_anchor(footprint.top_left());
    Ok(())
}

/// 重新读取实例的实际可见边界，按中心差值做相对平移。
///
/// 之所以用 delta 平移而不是直接设置绝对位置，是因为符号内容的
/// 注册偏移并不统一（非对称内容、偏离的注册点都会让可见边界
/// 相对锚点发生偏移），只有从实际边界反推的相对修正才普遍成立。
/// 返回实际应用的平移量；对已对齐的实例再次调用时该值约等于零。
pub fn center_correction(
    document: &mut Document,
    instance: NodeId,
    target: Point2,
) -> Result<Vector2, ReplaceError> {
    let symbol = document
        .instance(instance)
        .ok_or(ReplaceError::NotAnInstance)?
        .symbol
        .clone();
    let placed = document
        .visible_bounds(instance)
        .ok_or(ReplaceError::SymbolMissing(symbol))?;
    let delta = placed.center().vector_to(target);
    if let Some(inst) = document.instance_mut(instance) {
        inst.translate(delta);
    }
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use symswap_core::document::SymbolDefinition;

    use super::*;

    fn badge_options() -> ReplaceOptions {
        ReplaceOptions::new("Badge", false)
    }

    #[test]
    fn replaced_instance_matches_source_footprint() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        scene.select(ids.plain).unwrap();
        let source_bounds = scene.document().visible_bounds(ids.plain).unwrap();

        let report = scene.replace_selection(&badge_options()).expect("preflight");
        assert_eq!(report.replaced(), 1);
        let instance = report.instances().next().expect("one instance");

        let bounds = scene.document().visible_bounds(instance).expect("bounds");
        assert!((bounds.width() - source_bounds.width()).abs() < 1e-9);
        assert!((bounds.height() - source_bounds.height()).abs() < 1e-9);
        let center = bounds.center();
        let expected = source_bounds.center();
        assert!((center.x() - expected.x()).abs() < 1e-9);
        assert!((center.y() - expected.y()).abs() < 1e-9);
    }

    #[test]
    fn center_correction_is_idempotent() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        scene.select(ids.plain).unwrap();
        let target = scene.document().visible_bounds(ids.plain).unwrap().center();

        let report = scene.replace_selection(&badge_options()).unwrap();
        let instance = report.instances().next().unwrap();

        let delta = center_correction(scene.document_mut(), instance, target).expect("correction");
        assert!(delta.length_squared() < 1e-18);
    }

    #[test]
    fn locked_and_hidden_nodes_are_left_untouched() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        if let Some(node) = scene.document_mut().node_mut(ids.wide) {
            node.hidden = true;
        }
        scene.select(ids.locked).unwrap();
        scene.select(ids.wide).unwrap();
        let locked_bounds = scene.document().visible_bounds(ids.locked).unwrap();
        let node_count = scene.document().nodes().count();

        let report = scene.replace_selection(&badge_options()).unwrap();
        assert_eq!(report.replaced(), 0);
        assert_eq!(report.skipped(), 2);
        assert_eq!(scene.document().nodes().count(), node_count);

        let locked_node = scene.document().node(ids.locked).expect("still present");
        assert!(locked_node.locked);
        assert!(!locked_node.hidden);
        let bounds = scene.document().visible_bounds(ids.locked).unwrap();
        assert_eq!(bounds, locked_bounds);
    }

    #[test]
    fn hide_disposition_keeps_originals_in_tree() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        scene.select(ids.plain).unwrap();
        scene.select(ids.wide).unwrap();

        let report = scene.replace_selection(&badge_options()).unwrap();
        assert_eq!(report.replaced(), 2);
        for source in [ids.plain, ids.wide] {
            let node = scene.document().node(source).expect("hidden, not removed");
            assert!(node.hidden);
        }
    }

    #[test]
    fn delete_disposition_removes_originals() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        scene.select(ids.plain).unwrap();

        let options = ReplaceOptions::new("Badge", true);
        let report = scene.replace_selection(&options).unwrap();
        assert_eq!(report.replaced(), 1);
        assert!(!scene.node_exists(ids.plain));
        let instance = report.instances().next().unwrap();
        assert!(scene.node_exists(instance));
    }

    #[test]
    fn failed_item_does_not_stop_the_batch() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        // 单点路径没有面积，边界退化，几何捕获失败。
        let degenerate = scene
            .document_mut()
            .add_path([Point2::new(1.0, 1.0)], false, "MARKS");
        scene.select(ids.plain).unwrap();
        scene.select(degenerate).unwrap();
        scene.select(ids.wide).unwrap();

        let report = scene.replace_selection(&badge_options()).unwrap();
        assert_eq!(report.replaced(), 2);
        assert_eq!(report.failed(), 1);

        // 失败项原样保留：既没有被隐藏也没有被删除。
        let node = scene.document().node(degenerate).expect("still present");
        assert!(!node.hidden);
        assert!(matches!(
            report.items()[1].outcome,
            ItemOutcome::Failed(ReplaceError::DegenerateBounds)
        ));
        // 批处理期间的告警被抑制，不排队。
        assert!(scene.take_alerts().is_empty());
    }

    #[test]
    fn degenerate_symbol_art_fails_before_insertion() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        scene.document_mut().add_symbol(SymbolDefinition::new(
            "Flat",
            VisibleBounds::new(0.0, 0.0, 10.0, 0.0),
        ));
        scene.select(ids.plain).unwrap();
        let node_count = scene.document().nodes().count();

        let options = ReplaceOptions::new("Flat", false);
        let report = scene.replace_selection(&options).unwrap();
        assert_eq!(report.failed(), 1);
        // 插入前就失败，文档里不会留下半配置的实例。
        assert_eq!(scene.document().nodes().count(), node_count);
        let node = scene.document().node(ids.plain).unwrap();
        assert!(!node.hidden);
    }

    #[test]
    fn preflight_guards_abort_without_mutation() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();

        let err = scene.replace_selection(&badge_options()).unwrap_err();
        assert!(matches!(err, PreflightError::EmptySelection));

        scene.select(ids.plain).unwrap();
        let err = scene
            .replace_selection(&ReplaceOptions::new("Nonexistent", false))
            .unwrap_err();
        assert!(matches!(err, PreflightError::UnknownSymbol(_)));

        let node = scene.document().node(ids.plain).unwrap();
        assert!(!node.hidden);
        assert_eq!(scene.document().nodes().count(), 4);
    }

    #[test]
    fn no_symbols_registered_aborts_immediately() {
        let mut scene = Scene::new();
        let marker = scene
            .document_mut()
            .add_marker(VisibleBounds::new(0.0, 10.0, 10.0, 0.0), "0");
        scene.select(marker).unwrap();

        let err = scene.replace_selection(&badge_options()).unwrap_err();
        assert!(matches!(err, PreflightError::NoSymbols));
        assert_eq!(scene.document().nodes().count(), 1);
    }

    #[test]
    fn new_instances_never_join_the_iteration_set() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        scene.select(ids.plain).unwrap();
        scene.select(ids.wide).unwrap();

        let report = scene.replace_selection(&badge_options()).unwrap();
        assert_eq!(report.len(), 2);
        let sources: Vec<NodeId> = report.items().iter().map(|item| item.source).collect();
        assert_eq!(sources, vec![ids.plain, ids.wide]);
        for instance in report.instances() {
            assert!(!sources.contains(&instance));
        }
    }

    #[test]
    fn modes_are_restored_after_the_run() {
        let mut scene = Scene::new();
        let ids = scene.populate_demo();
        let before = scene.modes();
        scene.select(ids.plain).unwrap();
        scene.replace_selection(&badge_options()).unwrap();
        assert_eq!(scene.modes(), before);
    }
}
