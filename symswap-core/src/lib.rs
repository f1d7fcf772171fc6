pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，保持与文档坐标（单位为 pt）一致。
    #[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量，主要用于表达平移修正量（delta）。
    #[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 可见边界矩形 `[left, top, right, bottom]`，沿用宿主文档的 Y 轴向上约定：
    /// `top` 数值大于 `bottom`，因此 `height = top - bottom`（而非反过来）。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct VisibleBounds {
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    }

    impl VisibleBounds {
        #[inline]
        pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
            Self {
                left,
                top,
                right,
                bottom,
            }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                left: f64::INFINITY,
                top: f64::NEG_INFINITY,
                right: f64::NEG_INFINITY,
                bottom: f64::INFINITY,
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.left > self.right || self.bottom > self.top
        }

        #[inline]
        pub fn left(&self) -> f64 {
            self.left
        }

        #[inline]
        pub fn top(&self) -> f64 {
            self.top
        }

        #[inline]
        pub fn right(&self) -> f64 {
            self.right
        }

        #[inline]
        pub fn bottom(&self) -> f64 {
            self.bottom
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.right - self.left
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.top - self.bottom
        }

        /// 宽或高不为正时视为退化矩形，无法作为替换的几何参照。
        #[inline]
        pub fn is_degenerate(&self) -> bool {
            self.width() <= f64::EPSILON || self.height() <= f64::EPSILON
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            Point2::new(
                (self.left + self.right) / 2.0,
                (self.top + self.bottom) / 2.0,
            )
        }

        #[inline]
        pub fn top_left(&self) -> Point2 {
            Point2::new(self.left, self.top)
        }

        #[inline]
        pub fn translate(&self, offset: Vector2) -> Self {
            Self {
                left: self.left + offset.x(),
                top: self.top + offset.y(),
                right: self.right + offset.x(),
                bottom: self.bottom + offset.y(),
            }
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.left = point.x();
                self.right = point.x();
                self.top = point.y();
                self.bottom = point.y();
                return;
            }
            self.left = self.left.min(point.x());
            self.right = self.right.max(point.x());
            self.top = self.top.max(point.y());
            self.bottom = self.bottom.min(point.y());
        }

        pub fn include_bounds(&mut self, other: &VisibleBounds) {
            if other.is_empty() {
                return;
            }
            self.include_point(Point2::new(other.left, other.bottom));
            self.include_point(Point2::new(other.right, other.top));
        }
    }
}

pub mod document {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use crate::geometry::{Point2, Vector2, VisibleBounds};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct NodeId(u64);

    impl NodeId {
        #[inline]
        pub fn new(raw: u64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub is_visible: bool,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                is_visible: true,
            }
        }
    }

    /// 符号定义：注册在文档级符号库中的命名模板。
    ///
    /// `art_bounds` 为符号内容在符号局部坐标系下的可见边界，注意其左上角
    /// 不必落在局部原点上（注册点可以偏离内容），这正是实例的可见边界与
    /// 锚点出现偏差、需要 delta 平移修正的原因。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SymbolDefinition {
        pub name: String,
        pub art_bounds: VisibleBounds,
    }

    impl SymbolDefinition {
        #[inline]
        pub fn new(name: impl Into<String>, art_bounds: VisibleBounds) -> Self {
            Self {
                name: name.into(),
                art_bounds,
            }
        }
    }

    /// 符号实例：对某个 `SymbolDefinition` 的一次摆放，可独立缩放与移动。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SymbolInstance {
        pub symbol: String,
        pub anchor: Point2,
        pub width: f64,
        pub height: f64,
    }

    impl SymbolInstance {
        /// 以符号的自然尺寸在局部原点处落一个实例。
        pub fn place(definition: &SymbolDefinition) -> Self {
            Self {
                symbol: definition.name.clone(),
                anchor: Point2::new(0.0, 0.0),
                width: definition.art_bounds.width(),
                height: definition.art_bounds.height(),
            }
        }

        #[inline]
        pub fn set_size(&mut self, width: f64, height: f64) {
            self.width = width;
            self.height = height;
        }

        #[inline]
        pub fn set_anchor(&mut self, anchor: Point2) {
            self.anchor = anchor;
        }

        #[inline]
        pub fn translate(&mut self, delta: Vector2) {
            self.anchor = self.anchor.translate(delta);
        }

        /// 按当前尺寸把符号内容边界缩放后平移到锚点处。
        /// 注册点偏移会随缩放等比放大，因此锚点通常不等于可见边界左上角。
        pub fn visible_bounds(&self, definition: &SymbolDefinition) -> VisibleBounds {
            let art = definition.art_bounds;
            if art.is_degenerate() {
                return VisibleBounds::new(
                    self.anchor.x(),
                    self.anchor.y(),
                    self.anchor.x(),
                    self.anchor.y(),
                );
            }
            let sx = self.width / art.width();
            let sy = self.height / art.height();
            VisibleBounds::new(
                self.anchor.x() + art.left() * sx,
                self.anchor.y() + art.top() * sy,
                self.anchor.x() + art.right() * sx,
                self.anchor.y() + art.bottom() * sy,
            )
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub enum Shape {
        Marker(VisibleBounds),
        Path(Path),
        Text(Text),
        Instance(SymbolInstance),
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Path {
        pub points: Vec<Point2>,
        pub is_closed: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Text {
        pub insert: Point2,
        pub content: String,
        pub height: f64,
    }

    const TEXT_ADVANCE_FACTOR: f64 = 0.6;

    impl Text {
        /// 粗略估算文本可见边界：插入点为左上角，宽度按字符数推进。
        pub fn bounds(&self) -> VisibleBounds {
            let advance = self.height * TEXT_ADVANCE_FACTOR;
            let width = advance * self.content.chars().count() as f64;
            VisibleBounds::new(
                self.insert.x(),
                self.insert.y(),
                self.insert.x() + width,
                self.insert.y() - self.height,
            )
        }
    }

    /// 场景图节点：任何可被选中的图形对象。
    /// `locked` 与 `hidden` 节点对批量替换不可见，引擎会原样跳过。
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Node {
        pub shape: Shape,
        pub layer: String,
        pub locked: bool,
        pub hidden: bool,
    }

    impl Node {
        pub fn new(shape: Shape, layer: impl Into<String>) -> Self {
            Self {
                shape,
                layer: layer.into(),
                locked: false,
                hidden: false,
            }
        }
    }

    /// 文档树：按绘制顺序保存节点，并持有有序的符号注册表。
    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct Document {
        layers: HashMap<String, Layer>,
        nodes: Vec<(NodeId, Node)>,
        next_node_id: u64,
        symbols: Vec<SymbolDefinition>,
        #[serde(default)]
        artboard_origin: Point2,
    }

    impl Document {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::new(key));
        }

        pub fn add_marker(&mut self, bounds: VisibleBounds, layer: impl Into<String>) -> NodeId {
            self.push_node(Shape::Marker(bounds), layer)
        }

        pub fn add_path<I>(&mut self, points: I, is_closed: bool, layer: impl Into<String>) -> NodeId
        where
            I: IntoIterator<Item = Point2>,
        {
            let points = points.into_iter().collect();
            self.push_node(Shape::Path(Path { points, is_closed }), layer)
        }

        pub fn add_text(
            &mut self,
            insert: Point2,
            content: impl Into<String>,
            height: f64,
            layer: impl Into<String>,
        ) -> NodeId {
            self.push_node(
                Shape::Text(Text {
                    insert,
                    content: content.into(),
                    height,
                }),
                layer,
            )
        }

        fn push_node(&mut self, shape: Shape, layer: impl Into<String>) -> NodeId {
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.nodes.push((id, Node::new(shape, layer)));
            id
        }

        /// 在目标节点之前插入一个符号实例，保持原节点在绘制顺序中的层叠位置。
        /// 目标不存在时返回 `None`，文档不发生任何变化。
        pub fn insert_instance_before(
            &mut self,
            target: NodeId,
            instance: SymbolInstance,
            layer: impl Into<String>,
        ) -> Option<NodeId> {
            let index = self.nodes.iter().position(|(id, _)| *id == target)?;
            let layer = layer.into();
            self.ensure_layer(&layer);
            let id = self.next_id();
            self.nodes
                .insert(index, (id, Node::new(Shape::Instance(instance), layer)));
            Some(id)
        }

        /// 永久移除节点，返回被移除的内容。
        pub fn remove(&mut self, id: NodeId) -> Option<Node> {
            let index = self.nodes.iter().position(|(node_id, _)| *node_id == id)?;
            Some(self.nodes.remove(index).1)
        }

        #[inline]
        pub fn node(&self, id: NodeId) -> Option<&Node> {
            self.nodes
                .iter()
                .find_map(|(node_id, node)| (*node_id == id).then_some(node))
        }

        #[inline]
        pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
            self.nodes
                .iter_mut()
                .find_map(|(node_id, node)| (*node_id == id).then_some(node))
        }

        #[inline]
        pub fn contains(&self, id: NodeId) -> bool {
            self.node(id).is_some()
        }

        /// 按绘制顺序迭代节点。
        #[inline]
        pub fn nodes(&self) -> impl Iterator<Item = &(NodeId, Node)> {
            self.nodes.iter()
        }

        #[inline]
        pub fn instance(&self, id: NodeId) -> Option<&SymbolInstance> {
            match self.node(id)? {
                Node {
                    shape: Shape::Instance(instance),
                    ..
                } => Some(instance),
                _ => None,
            }
        }

        #[inline]
        pub fn instance_mut(&mut self, id: NodeId) -> Option<&mut SymbolInstance> {
            match self.node_mut(id)? {
                Node {
                    shape: Shape::Instance(instance),
                    ..
                } => Some(instance),
                _ => None,
            }
        }

        /// 注册符号定义；同名符号会被就地替换，注册顺序保持不变。
        pub fn add_symbol(&mut self, definition: SymbolDefinition) {
            if let Some(existing) = self
                .symbols
                .iter_mut()
                .find(|symbol| symbol.name == definition.name)
            {
                *existing = definition;
            } else {
                self.symbols.push(definition);
            }
        }

        #[inline]
        pub fn symbol(&self, name: &str) -> Option<&SymbolDefinition> {
            self.symbols.iter().find(|symbol| symbol.name == name)
        }

        /// 按注册顺序迭代符号库。
        #[inline]
        pub fn symbols(&self) -> impl Iterator<Item = &SymbolDefinition> {
            self.symbols.iter()
        }

        #[inline]
        pub fn symbol_count(&self) -> usize {
            self.symbols.len()
        }

        pub fn remove_symbol(&mut self, name: &str) -> Option<SymbolDefinition> {
            let index = self.symbols.iter().position(|symbol| symbol.name == name)?;
            Some(self.symbols.remove(index))
        }

        /// 当前画板原点在文档坐标系中的位置，供画板坐标模式换算使用。
        #[inline]
        pub fn artboard_origin(&self) -> Point2 {
            self.artboard_origin
        }

        #[inline]
        pub fn set_artboard_origin(&mut self, origin: Point2) {
            self.artboard_origin = origin;
        }

        /// 节点在文档坐标系下的可见边界。
        /// 实例需要解析其符号定义，定义缺失时返回 `None`。
        pub fn visible_bounds(&self, id: NodeId) -> Option<VisibleBounds> {
            let node = self.node(id)?;
            match &node.shape {
                Shape::Marker(bounds) => Some(*bounds),
                Shape::Path(path) => {
                    let mut bounds = VisibleBounds::empty();
                    for point in &path.points {
                        bounds.include_point(*point);
                    }
                    if bounds.is_empty() { None } else { Some(bounds) }
                }
                Shape::Text(text) => Some(text.bounds()),
                Shape::Instance(instance) => {
                    let definition = self.symbol(&instance.symbol)?;
                    Some(instance.visible_bounds(definition))
                }
            }
        }

        pub fn bounds(&self) -> Option<VisibleBounds> {
            let mut bounds = VisibleBounds::empty();
            let mut has = false;
            for (id, _) in &self.nodes {
                if let Some(node_bounds) = self.visible_bounds(*id) {
                    bounds.include_bounds(&node_bounds);
                    has = true;
                }
            }
            if has { Some(bounds) } else { None }
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        #[inline]
        fn next_id(&mut self) -> NodeId {
            let id = self.next_node_id;
            self.next_node_id += 1;
            NodeId(id)
        }
    }

}
