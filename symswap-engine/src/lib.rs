pub mod command;
pub mod replace;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("node with id {0} not found")]
        NodeNotFound(u64),
    }

    /// 预检错误：在触碰任何节点之前整体中止，文档保持零变更。
    #[derive(Debug, Error)]
    pub enum PreflightError {
        #[error("selection is empty")]
        EmptySelection,
        #[error("document has no registered symbols")]
        NoSymbols,
        #[error("symbol {0:?} is not registered")]
        UnknownSymbol(String),
    }

    /// 单项替换错误：只中止当前项，批处理继续。
    #[derive(Debug, Error)]
    pub enum ReplaceError {
        #[error("node has no readable visible bounds")]
        MissingBounds,
        #[error("node visible bounds are degenerate")]
        DegenerateBounds,
        #[error("symbol {0:?} disappeared from the registry")]
        SymbolMissing(String),
        #[error("symbol {0:?} has degenerate art bounds")]
        DegenerateArt(String),
        #[error("source node vanished during replacement")]
        SourceVanished,
        #[error("node is not a symbol instance")]
        NotAnInstance,
    }
}

pub mod scene {
    use symswap_core::document::{Document, NodeId, SymbolDefinition};
    use symswap_core::geometry::{Point2, Vector2, VisibleBounds};
    use tracing::{debug, warn};

    use crate::errors::EngineError;

    /// 宿主坐标约定。画板模式下边界按画板原点换算，
    /// 批量替换期间强制切到文档绝对坐标，避免原点差异干扰几何计算。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum CoordinateSpace {
        Artboard,
        Document,
    }

    /// 宿主交互级别：批处理期间抑制逐项告警弹窗。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AlertMode {
        Display,
        Suppress,
    }

    /// 宿主环境的环境态开关，显式建模而非散落的全局变量。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InteractionModes {
        pub coordinate_space: CoordinateSpace,
        pub alerts: AlertMode,
    }

    impl InteractionModes {
        /// 批量替换所需的模式组合。
        pub fn batch() -> Self {
            Self {
                coordinate_space: CoordinateSpace::Document,
                alerts: AlertMode::Suppress,
            }
        }
    }

    impl Default for InteractionModes {
        fn default() -> Self {
            Self {
                coordinate_space: CoordinateSpace::Artboard,
                alerts: AlertMode::Display,
            }
        }
    }

    /// 引擎层负责维护 `Document` 和运行时状态（有序选中集、交互模式等）。
    #[derive(Debug)]
    pub struct Scene {
        document: Document,
        selection: Vec<NodeId>,
        modes: InteractionModes,
        pending_alerts: Vec<String>,
    }

    #[derive(Debug, Clone, Copy)]
    pub struct DemoNodes {
        pub plain: NodeId,
        pub wide: NodeId,
        pub locked: NodeId,
        pub label: NodeId,
    }

    impl Scene {
        pub fn new() -> Self {
            Self {
                document: Document::new(),
                selection: Vec::new(),
                modes: InteractionModes::default(),
                pending_alerts: Vec::new(),
            }
        }

        /// 使用现有文档初始化场景。
        pub fn with_document(document: Document) -> Self {
            let mut scene = Self::new();
            scene.load_document(document);
            scene
        }

        /// 替换当前文档并重置运行时状态。
        pub fn load_document(&mut self, document: Document) {
            self.document = document;
            self.selection.clear();
            self.modes = InteractionModes::default();
            self.pending_alerts.clear();
        }

        /// 返回当前选中节点数量。
        #[inline]
        pub fn selection_len(&self) -> usize {
            self.selection.len()
        }

        #[inline]
        pub fn is_selected(&self, id: NodeId) -> bool {
            self.selection.contains(&id)
        }

        /// 选中指定节点并追加到选中顺序末尾；重复选中不改变顺序。
        /// 节点不存在时返回错误。
        pub fn select(&mut self, id: NodeId) -> Result<(), EngineError> {
            if !self.document.contains(id) {
                return Err(EngineError::NodeNotFound(id.get()));
            }
            if !self.selection.contains(&id) {
                self.selection.push(id);
            }
            Ok(())
        }

        /// 取消选中指定节点，返回之前是否处于选中状态。
        pub fn deselect(&mut self, id: NodeId) -> bool {
            match self.selection.iter().position(|selected| *selected == id) {
                Some(index) => {
                    self.selection.remove(index);
                    true
                }
                None => false,
            }
        }

        /// 切换节点选中状态，返回切换后的状态。
        pub fn toggle_selection(&mut self, id: NodeId) -> Result<bool, EngineError> {
            if self.is_selected(id) {
                self.deselect(id);
                Ok(false)
            } else {
                self.select(id)?;
                Ok(true)
            }
        }

        #[inline]
        pub fn clear_selection(&mut self) {
            self.selection.clear();
        }

        /// 按选中顺序迭代当前选中节点。
        #[inline]
        pub fn selection(&self) -> impl Iterator<Item = NodeId> + '_ {
            self.selection.iter().copied()
        }

        /// 冻结当前选中集为不可变快照。替换引擎只遍历该快照，
        /// 批处理过程中新插入的实例绝不会进入迭代集。
        #[inline]
        pub fn selection_snapshot(&self) -> Vec<NodeId> {
            self.selection.clone()
        }

        /// 返回当前选中节点的总包围盒（按当前坐标模式）。
        pub fn selection_bounds(&self) -> Option<VisibleBounds> {
            let mut bounds = VisibleBounds::empty();
            let mut has = false;
            for id in &self.selection {
                if let Some(node_bounds) = self.visible_bounds(*id) {
                    bounds.include_bounds(&node_bounds);
                    has = true;
                }
            }
            if has { Some(bounds) } else { None }
        }

        /// 按当前坐标模式读取节点可见边界。
        /// 画板模式下减去画板原点，文档模式下原样返回。
        pub fn visible_bounds(&self, id: NodeId) -> Option<VisibleBounds> {
            let bounds = self.document.visible_bounds(id)?;
            match self.modes.coordinate_space {
                CoordinateSpace::Document => Some(bounds),
                CoordinateSpace::Artboard => {
                    let origin = self.document.artboard_origin();
                    Some(bounds.translate(Vector2::new(-origin.x(), -origin.y())))
                }
            }
        }

        #[inline]
        pub fn modes(&self) -> InteractionModes {
            self.modes
        }

        #[inline]
        pub fn set_modes(&mut self, modes: InteractionModes) {
            self.modes = modes;
        }

        /// 作用域化的模式覆盖：进入批处理模式执行 `f`，
        /// 无论正常返回还是提前返回都恢复先前的模式。
        pub fn with_batch_modes<T>(&mut self, f: impl FnOnce(&mut Scene) -> T) -> T {
            let previous = self.modes;
            self.modes = InteractionModes::batch();
            let result = f(self);
            self.modes = previous;
            result
        }

        /// 发出用户可见告警。抑制模式下只写日志，不排队。
        pub fn alert(&mut self, message: impl Into<String>) {
            let message = message.into();
            match self.modes.alerts {
                AlertMode::Display => {
                    warn!(message = %message, "告警已入队");
                    self.pending_alerts.push(message);
                }
                AlertMode::Suppress => {
                    debug!(message = %message, "批处理期间抑制告警");
                }
            }
        }

        /// 取走当前排队的告警消息。
        pub fn take_alerts(&mut self) -> Vec<String> {
            std::mem::take(&mut self.pending_alerts)
        }

        #[inline]
        pub fn document(&self) -> &Document {
            &self.document
        }

        #[inline]
        pub fn document_mut(&mut self) -> &mut Document {
            &mut self.document
        }

        /// 为 CLI / 快速验证填充示例标记与符号库，返回关键节点 ID。
        pub fn populate_demo(&mut self) -> DemoNodes {
            self.clear_selection();

            self.document.add_symbol(SymbolDefinition::new(
                "Badge",
                VisibleBounds::new(-2.0, 8.0, 10.0, -4.0),
            ));
            self.document.add_symbol(SymbolDefinition::new(
                "Pin",
                VisibleBounds::new(0.0, 6.0, 4.0, 0.0),
            ));

            // 100×50，中心 (10, 10)。
            let plain = self
                .document
                .add_marker(VisibleBounds::new(-40.0, 35.0, 60.0, -15.0), "MARKS");
            let wide = self
                .document
                .add_marker(VisibleBounds::new(0.0, 120.0, 80.0, 100.0), "MARKS");
            let locked = self
                .document
                .add_marker(VisibleBounds::new(200.0, 20.0, 210.0, 10.0), "MARKS");
            if let Some(node) = self.document.node_mut(locked) {
                node.locked = true;
            }
            let label = self
                .document
                .add_text(Point2::new(5.0, 140.0), "站点标记", 6.0, "ANNOT");

            let ids = DemoNodes {
                plain,
                wide,
                locked,
                label,
            };

            debug!(
                plain = ids.plain.get(),
                wide = ids.wide.get(),
                locked = ids.locked.get(),
                label = ids.label.get(),
                symbols = self.document.symbol_count(),
                "已创建演示节点"
            );

            ids
        }

        pub fn node_exists(&self, id: NodeId) -> bool {
            self.document.contains(id)
        }
    }

    impl Default for Scene {
        fn default() -> Self {
            Self::new()
        }
    }

}
