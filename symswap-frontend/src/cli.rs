use symswap_config::ReplaceConfig;
use symswap_core::document::{NodeId, Shape};
use symswap_engine::command::{CommandBus, CommandContext, CommandRequest};
use symswap_engine::scene::Scene;
use tracing::info;

use crate::errors::FrontendError;
use crate::loader::{DocumentSource, load_scene_from_env_or_demo};
use crate::resolver::{OptionsResolver, PromptContext, ScriptedResolver};

/// 命令行覆盖项：非空时优先于配置文件中的默认值。
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub symbol: Option<String>,
    pub delete_originals: Option<bool>,
}

/// 简易 CLI 演示：加载文档（或内置示例），解析替换选项，
/// 通过命令总线执行批量替换，并打印替换前后的场景概览。
pub fn run_demo(config: &ReplaceConfig, overrides: &CliOverrides) -> Result<(), FrontendError> {
    let loaded = load_scene_from_env_or_demo();
    let mut scene = loaded.scene;

    println!("符号替换 CLI 演示");
    match &loaded.source {
        DocumentSource::Json(path) => {
            println!("已从 JSON 加载文档：{}", path.display());
        }
        DocumentSource::Demo => {
            println!("已构建内置示例文档。");
        }
    }

    // 预检：与宿主模态对话框弹出前的检查一致。
    if scene.selection_len() == 0 {
        return Err(FrontendError::EmptySelection);
    }
    if scene.document().symbol_count() == 0 {
        return Err(FrontendError::NoSymbols);
    }

    let context = PromptContext::from_scene(&scene);
    println!(
        "选中图形: {}    符号: {}",
        context.selection_len,
        context.symbols.len()
    );
    println!("符号库: {}", context.symbols.join(", "));

    let mut defaults = config.clone();
    if let Some(symbol) = &overrides.symbol {
        defaults.default_symbol = Some(symbol.clone());
    }
    if let Some(delete) = overrides.delete_originals {
        defaults.delete_originals = delete;
    }
    let resolver = ScriptedResolver::from_config(&defaults);
    let Some(options) = resolver.resolve(&context)? else {
        println!("已取消，文档未作任何修改。");
        return Ok(());
    };

    let bus = CommandBus::new();
    let mut command_context = CommandContext { scene: &mut scene };
    let mut args = vec![options.symbol.clone()];
    if options.delete_originals {
        args.push("--delete".to_string());
    }
    let request = CommandRequest {
        name: "replace_with_symbol".to_string(),
        args,
    };
    let response = bus.dispatch(&request, &mut command_context);
    if response.success {
        if let Some(message) = response.message {
            println!("[命令] {message}");
        }
    } else {
        let message = response.message.unwrap_or_else(|| "未知错误".to_string());
        return Err(FrontendError::Command(message));
    }

    print_overview(command_context.scene);
    info!(
        node_count = command_context.scene.document().nodes().count(),
        "CLI 演示执行完毕"
    );
    Ok(())
}

fn print_overview(scene: &Scene) {
    let document = scene.document();
    println!("当前文档节点（按绘制顺序）：");
    for (id, node) in document.nodes() {
        let flags = node_flags(node.locked, node.hidden);
        match &node.shape {
            Shape::Marker(_) => {
                println!(
                    "  - 标记 #{}, Layer={}, {}{}",
                    id.get(),
                    node.layer,
                    bounds_description(scene, *id),
                    flags
                );
            }
            Shape::Path(path) => {
                println!(
                    "  - 路径 #{}, Layer={}, 顶点数={}, {}{}",
                    id.get(),
                    node.layer,
                    path.points.len(),
                    bounds_description(scene, *id),
                    flags
                );
            }
            Shape::Text(text) => {
                println!(
                    "  - 文字 #{}, Layer={}, 内容=\"{}\", {}{}",
                    id.get(),
                    node.layer,
                    text.content,
                    bounds_description(scene, *id),
                    flags
                );
            }
            Shape::Instance(instance) => {
                println!(
                    "  - 符号实例 #{}, Layer={}, 符号={}, 尺寸=({:.2}, {:.2}), {}{}",
                    id.get(),
                    node.layer,
                    instance.symbol,
                    instance.width,
                    instance.height,
                    bounds_description(scene, *id),
                    flags
                );
            }
        }
    }
}

fn bounds_description(scene: &Scene, id: NodeId) -> String {
    match scene.visible_bounds(id) {
        Some(bounds) => {
            let center = bounds.center();
            format!(
                "中心=({:.2}, {:.2}), 宽高=({:.2}, {:.2})",
                center.x(),
                center.y(),
                bounds.width(),
                bounds.height()
            )
        }
        None => "边界=<未定义>".to_string(),
    }
}

fn node_flags(locked: bool, hidden: bool) -> String {
    let mut flags = Vec::new();
    if locked {
        flags.push("锁定");
    }
    if hidden {
        flags.push("隐藏");
    }
    if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    }
}
